//! Builders shared by the rule tests.

#![allow(dead_code)]

use tsplan_core::prelude::*;
use tsplan_planner::{RuleEngine, RunSummary};

pub fn bucket() -> ScanSpec {
    ScanSpec::by_name("telegraf")
}

pub fn logical_from() -> OpSpec {
    OpSpec::Scan(bucket())
}

pub fn physical_from() -> PhysicalScanSpec {
    PhysicalScanSpec::from_scan(bucket())
}

pub fn bounded_from(start: i64, stop: i64) -> PhysicalScanSpec {
    physical_from().with_bounds(Bounds::absolute(start, stop))
}

pub fn range(start: i64, stop: i64) -> OpSpec {
    OpSpec::Range(RangeSpec::new(Bounds::absolute(start, stop)))
}

pub fn filter(exprs: Vec<Expr>) -> OpSpec {
    OpSpec::Filter(FilterSpec {
        func: FunctionExpr::predicate("r", exprs),
    })
}

pub fn group(mode: GroupMode, keys: &[&str]) -> OpSpec {
    OpSpec::Group(GroupSpec {
        mode,
        keys: keys.iter().map(|k| k.to_string()).collect(),
    })
}

pub fn distinct(column: &str) -> OpSpec {
    OpSpec::Distinct(DistinctSpec {
        column: column.into(),
    })
}

pub fn yield_(name: &str) -> OpSpec {
    OpSpec::Yield(YieldSpec { name: name.into() })
}

/// `r.<col> == "<v>"`
pub fn eq(col: &str, v: &str) -> Expr {
    Expr::compare(CmpOp::Eq, Expr::member("r", col), Expr::string(v))
}

/// `0.5 < r._value`, which storage cannot evaluate.
pub fn value_gt_half() -> Expr {
    Expr::compare(CmpOp::Lt, Expr::Float(0.5), Expr::member("r", "_value"))
}

pub fn phys(name: &str, spec: OpSpec) -> PlanNode {
    PlanNode::physical(name, spec)
}

pub fn scan(name: &str, spec: PhysicalScanSpec) -> PlanNode {
    PlanNode::physical(name, OpSpec::PhysicalScan(spec))
}

/// Build a graph from nodes and index-based edges.
pub fn plan(nodes: Vec<PlanNode>, edges: &[(usize, usize)]) -> PlanGraph {
    let mut g = PlanGraph::new();
    let ids: Vec<NodeId> = nodes
        .into_iter()
        .map(|n| g.add_node(n).expect("add node"))
        .collect();
    for &(p, c) in edges {
        g.add_edge(ids[p], ids[c]).expect("add edge");
    }
    g
}

pub fn apply_rules(rules: &[&str], graph: &mut PlanGraph) -> RunSummary {
    RuleEngine::only(rules)
        .expect("known rules")
        .with_config(PlannerConfig::default().with_now(0))
        .run(graph)
        .expect("run rules")
}

/// Rewrite `before` with `rules` and compare against `after`, or, when
/// `after` is `None`, check that nothing changed.
pub fn check_rules(name: &str, rules: &[&str], before: PlanGraph, after: Option<PlanGraph>) {
    let mut g = before;
    let fingerprint = g.fingerprint().expect("fingerprint");
    let summary = apply_rules(rules, &mut g);
    match after {
        Some(after) => {
            assert!(summary.changed(), "{name}: expected a rewrite");
            assert_eq!(g.snapshot(), after.snapshot(), "{name}:\n{}", g.explain());
        }
        None => {
            assert!(!summary.changed(), "{name}: fired {:?}", summary.fired);
            assert_eq!(g.fingerprint().expect("fingerprint"), fingerprint, "{name}");
        }
    }
}
