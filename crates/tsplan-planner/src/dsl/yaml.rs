//! YAML → `PlanGraph` loader.
//!
//! Example:
//! ```yaml
//! nodes:
//!   - { id: from, op: scan, bucket: telegraf }
//!   - { id: range, op: range, start: -4h, stop: now }
//!   - id: filter
//!     op: filter
//!     where:
//!       - { column: _measurement, op: "==", value: cpu }
//!       - { column: host, op: "=~", regex: "^web" }
//!   - { id: yield, op: yield }
//! edges:
//!   - [from, range]
//!   - [range, filter]
//!   - [filter, yield]
//! ```
//!
//! Scans are logical unless `kind` says otherwise; every other node is
//! physical. Times are either integer nanoseconds (absolute), `now`, or a
//! signed duration relative to now. A filter is given either as a `where`
//! list (AND-ed comparisons of `param.column` against a literal) or as a
//! full `fn` expression tree.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use tsplan_core::capability::StorageCapabilities;
use tsplan_core::config::PlannerConfig;
use tsplan_core::dag::{NodeKind, PlanGraph, PlanNode};
use tsplan_core::expr::{CmpOp, Expr, FunctionExpr};
use tsplan_core::spec::{
    DistinctSpec, FilterSpec, GroupMode, GroupSpec, OpSpec, RangeSpec, ScanSpec, YieldSpec,
};
use tsplan_core::time::{parse_duration, Bounds, Time};

#[derive(Debug, Error)]
pub enum DslError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Plan(#[from] tsplan_core::error::Error),

    #[error("node {node}: {msg}")]
    Invalid { node: String, msg: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanDoc {
    #[serde(default)]
    pub config: PlannerConfig,
    #[serde(default)]
    pub capabilities: StorageCapabilities,
    pub nodes: Vec<NodeDef>,
    #[serde(default)]
    pub edges: Vec<(String, String)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDef {
    pub id: String,
    #[serde(default)]
    pub kind: Option<NodeKind>,
    #[serde(flatten)]
    pub step: Step,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "op")]
pub enum Step {
    Scan {
        #[serde(default)]
        bucket: Option<String>,
        #[serde(default)]
        bucket_id: Option<String>,
    },

    Range {
        start: TimeDef,
        #[serde(default = "TimeDef::now")]
        stop: TimeDef,
    },

    Filter {
        #[serde(default = "default_param")]
        param: String,
        #[serde(default, rename = "where")]
        conditions: Vec<WhereDef>,
        #[serde(default, rename = "fn")]
        func: Option<FunctionExpr>,
    },

    Group {
        #[serde(default = "default_group_mode")]
        mode: GroupMode,
        #[serde(default)]
        keys: Vec<String>,
    },

    Distinct {
        #[serde(default = "default_distinct_column")]
        column: String,
    },

    Count,
    Mean,
    Sum,

    Yield {
        #[serde(default = "default_yield_name")]
        name: String,
    },

    /// Anything the optimizer has no rules for.
    Opaque { name: String },
}

/// `1700000000000000000` (absolute ns), `now`, or a duration like `-4h`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimeDef {
    Nanos(i64),
    Text(String),
}

impl TimeDef {
    fn now() -> Self {
        TimeDef::Text("now".into())
    }

    fn to_time(&self) -> Option<Time> {
        match self {
            TimeDef::Nanos(ns) => Some(Time::Absolute(*ns)),
            TimeDef::Text(s) if s.trim() == "now" => Some(Time::Relative(0)),
            TimeDef::Text(s) => parse_duration(s).map(Time::Relative),
        }
    }
}

/// `{column, op, value}` or, for regex operators, `{column, op, regex}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhereDef {
    pub column: String,
    pub op: CmpOp,
    #[serde(default)]
    pub value: Option<LiteralDef>,
    #[serde(default)]
    pub regex: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LiteralDef {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl From<LiteralDef> for Expr {
    fn from(v: LiteralDef) -> Self {
        match v {
            LiteralDef::Bool(b) => Expr::Bool(b),
            LiteralDef::Int(i) => Expr::Int(i),
            LiteralDef::Float(x) => Expr::Float(x),
            LiteralDef::String(s) => Expr::String(s),
        }
    }
}

fn default_param() -> String {
    "r".into()
}

fn default_group_mode() -> GroupMode {
    GroupMode::By
}

fn default_distinct_column() -> String {
    "_value".into()
}

fn default_yield_name() -> String {
    "_result".into()
}

#[derive(Debug, Clone)]
pub struct ParsedPlan {
    pub graph: PlanGraph,
    pub config: PlannerConfig,
    pub capabilities: StorageCapabilities,
}

/// Parse a YAML plan document into a graph plus the planner settings it
/// carries.
pub fn parse_yaml_plan(yaml_src: &str) -> Result<ParsedPlan, DslError> {
    let doc: PlanDoc = serde_yaml::from_str(yaml_src)?;
    let mut graph = PlanGraph::new();

    for def in doc.nodes {
        let spec = to_spec(&def.id, def.step)?;
        let kind = def.kind.unwrap_or(match spec {
            OpSpec::Scan(_) => NodeKind::Logical,
            _ => NodeKind::Physical,
        });
        graph.add_node(PlanNode {
            id: def.id,
            kind,
            spec,
        })?;
    }
    for (parent, child) in &doc.edges {
        graph.connect(parent, child)?;
    }

    Ok(ParsedPlan {
        graph,
        config: doc.config,
        capabilities: doc.capabilities,
    })
}

fn to_spec(node: &str, step: Step) -> Result<OpSpec, DslError> {
    let invalid = |msg: String| DslError::Invalid {
        node: node.to_string(),
        msg,
    };

    Ok(match step {
        Step::Scan { bucket, bucket_id } => {
            let scan = ScanSpec { bucket, bucket_id };
            scan.validate()?;
            OpSpec::Scan(scan)
        }
        Step::Range { start, stop } => {
            let start = start
                .to_time()
                .ok_or_else(|| invalid(format!("bad range start: {start:?}")))?;
            let stop = stop
                .to_time()
                .ok_or_else(|| invalid(format!("bad range stop: {stop:?}")))?;
            OpSpec::Range(RangeSpec::new(Bounds::new(start, stop)))
        }
        Step::Filter {
            param,
            conditions,
            func,
        } => {
            let func = match (func, conditions.is_empty()) {
                (Some(f), true) => f,
                (None, false) => {
                    let exprs = conditions
                        .into_iter()
                        .map(|c| condition(&param, c).map_err(&invalid))
                        .collect::<Result<Vec<_>, _>>()?;
                    FunctionExpr::predicate(param, exprs)
                }
                (Some(_), false) => {
                    return Err(invalid("filter takes either `where` or `fn`, not both".into()))
                }
                (None, true) => return Err(invalid("filter needs `where` or `fn`".into())),
            };
            OpSpec::Filter(FilterSpec { func })
        }
        Step::Group { mode, keys } => OpSpec::Group(GroupSpec { mode, keys }),
        Step::Distinct { column } => OpSpec::Distinct(DistinctSpec { column }),
        Step::Count => OpSpec::Count,
        Step::Mean => OpSpec::Mean,
        Step::Sum => OpSpec::Sum,
        Step::Yield { name } => OpSpec::Yield(YieldSpec { name }),
        Step::Opaque { name } => OpSpec::opaque(name),
    })
}

fn condition(param: &str, c: WhereDef) -> Result<Expr, String> {
    let rhs = match (c.value, c.regex) {
        (Some(v), None) => Expr::from(v),
        (None, Some(r)) => Expr::Regex(r),
        _ => {
            return Err(format!(
                "condition on {} needs exactly one of `value` or `regex`",
                c.column
            ))
        }
    };
    Ok(Expr::compare(c.op, Expr::member(param, c.column), rhs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nodes_and_edges() {
        let src = r#"
nodes:
  - { id: from, op: scan, bucket: telegraf }
  - { id: range, op: range, start: 5, stop: 10 }
  - { id: yield, op: yield }
edges:
  - [from, range]
  - [range, yield]
"#;
        let parsed = parse_yaml_plan(src).unwrap();
        let g = &parsed.graph;
        assert_eq!(g.len(), 3);

        let from = g.node(g.lookup("from").unwrap()).unwrap();
        assert_eq!(from.kind, NodeKind::Logical);
        assert_eq!(from.spec, OpSpec::Scan(ScanSpec::by_name("telegraf")));

        let range = g.node(g.lookup("range").unwrap()).unwrap();
        assert_eq!(range.kind, NodeKind::Physical);
        assert_eq!(
            range.spec,
            OpSpec::Range(RangeSpec::new(Bounds::absolute(5, 10)))
        );
        assert_eq!(g.edges().len(), 2);
    }

    #[test]
    fn relative_times() {
        let src = r#"
nodes:
  - { id: range, op: range, start: -4h }
"#;
        let g = parse_yaml_plan(src).unwrap().graph;
        let range = g.node(g.lookup("range").unwrap()).unwrap();
        let OpSpec::Range(r) = &range.spec else {
            panic!("expected range");
        };
        assert_eq!(r.bounds.start, Time::Relative(-4 * 3_600_000_000_000));
        assert_eq!(r.bounds.stop, Time::Relative(0));
    }

    #[test]
    fn where_list_builds_predicate() {
        let src = r#"
nodes:
  - id: f
    op: filter
    where:
      - { column: _measurement, op: "==", value: cpu }
      - { column: host, op: "=~", regex: "^web" }
"#;
        let g = parse_yaml_plan(src).unwrap().graph;
        let f = g.node(g.lookup("f").unwrap()).unwrap();
        let expected = FunctionExpr::predicate(
            "r",
            vec![
                Expr::compare(CmpOp::Eq, Expr::member("r", "_measurement"), Expr::string("cpu")),
                Expr::compare(
                    CmpOp::RegexMatch,
                    Expr::member("r", "host"),
                    Expr::Regex("^web".into()),
                ),
            ],
        );
        assert_eq!(f.spec, OpSpec::Filter(FilterSpec { func: expected }));
    }

    #[test]
    fn config_and_capabilities_are_read() {
        let src = r#"
config: { now: 42, trace: true }
capabilities: { operators: ["==", ">"] }
nodes: []
"#;
        let parsed = parse_yaml_plan(src).unwrap();
        assert_eq!(parsed.config.now, Some(42));
        assert!(parsed.config.trace);
        assert!(parsed.capabilities.supports(CmpOp::Gt));
        assert!(!parsed.capabilities.supports(CmpOp::RegexMatch));
    }

    #[test]
    fn rejects_bad_input() {
        let both = "nodes:\n  - { id: s, op: scan, bucket: a, bucket_id: b }\n";
        assert!(matches!(parse_yaml_plan(both), Err(DslError::Plan(_))));

        let bare_filter = "nodes:\n  - { id: f, op: filter }\n";
        assert!(matches!(
            parse_yaml_plan(bare_filter),
            Err(DslError::Invalid { .. })
        ));

        let bad_time = "nodes:\n  - { id: r, op: range, start: yesterday }\n";
        assert!(matches!(parse_yaml_plan(bad_time), Err(DslError::Invalid { .. })));

        let dangling = "nodes:\n  - { id: a, op: count }\nedges:\n  - [a, b]\n";
        assert!(matches!(parse_yaml_plan(dangling), Err(DslError::Plan(_))));

        assert!(matches!(parse_yaml_plan("nodes: 3"), Err(DslError::Yaml(_))));
    }
}
