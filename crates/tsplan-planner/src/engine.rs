//! Fixed-point rule engine.
//!
//! Each step walks the plan in topological order and, per node, tries the
//! rules in registration order. The first rule whose pattern matches and
//! whose `rewrite` returns an edit wins; the edit is applied and the walk
//! restarts from the top, since it may have enabled rules upstream. The run
//! ends when a full walk produces nothing.
//!
//! Rewrites only ever set a scan capability that was unset, narrow bounds,
//! or remove a node, so the shipped rules terminate. `max_iterations` caps
//! the number of rewrites for rules that don't.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tsplan_core::capability::StorageCapabilities;
use tsplan_core::config::PlannerConfig;
use tsplan_core::dag::{NodeKind, PlanGraph, PlanNode};
use tsplan_core::error::{Error, Result};
use tsplan_core::id::NodeId;

use crate::rules::{
    default_rules, merged_name, rule_by_name, Pattern, Rewrite, Rule, RuleContext,
};

/// One rule application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiredRule {
    pub rule: String,
    /// Name of the node the pattern was rooted at, before the rewrite.
    pub node: String,
}

/// Plan rendering around a single rewrite, kept when tracing is enabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTrace {
    pub rule: String,
    pub node: String,
    pub before: String,
    pub after: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Walks over the plan, including the final one that found nothing.
    pub iterations: usize,
    pub rewrites: usize,
    pub fired: Vec<FiredRule>,
    pub trace: Vec<RuleTrace>,
}

impl RunSummary {
    /// Whether any rule fired. `false` is the "no change" outcome.
    pub fn changed(&self) -> bool {
        self.rewrites > 0
    }
}

pub struct RuleEngine {
    rules: Vec<Box<dyn Rule>>,
    config: PlannerConfig,
    capabilities: StorageCapabilities,
}

impl RuleEngine {
    pub fn new(rules: Vec<Box<dyn Rule>>) -> Self {
        Self {
            rules,
            config: PlannerConfig::default(),
            capabilities: StorageCapabilities::default(),
        }
    }

    /// Engine loaded with every shipped pushdown rule.
    pub fn pushdown() -> Self {
        Self::new(default_rules())
    }

    /// Engine restricted to the named rules, in the order given.
    pub fn only(names: &[&str]) -> Result<Self> {
        let rules = names
            .iter()
            .map(|n| rule_by_name(n).ok_or_else(|| Error::Config(format!("unknown rule: {n}"))))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(rules))
    }

    pub fn with_config(mut self, config: PlannerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_capabilities(mut self, capabilities: StorageCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn add_rule<R: Rule + 'static>(&mut self, rule: R) {
        self.rules.push(Box::new(rule));
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn has_rule(&self, name: &str) -> bool {
        self.rules.iter().any(|r| r.name() == name)
    }

    /// Rewrite `graph` until no rule applies.
    pub fn run(&self, graph: &mut PlanGraph) -> Result<RunSummary> {
        let now = self.config.now.unwrap_or_else(now_nanos);
        let ctx = RuleContext {
            capabilities: &self.capabilities,
            now,
        };
        let patterns: Vec<Pattern> = self.rules.iter().map(|r| r.pattern()).collect();
        let mut summary = RunSummary::default();

        loop {
            summary.iterations += 1;
            let Some((rule, node, rewrite)) = self.next_rewrite(graph, &patterns, &ctx) else {
                break;
            };
            if summary.rewrites >= self.config.max_iterations {
                return Err(Error::FixedPoint {
                    limit: self.config.max_iterations,
                });
            }

            let node_name = graph.name(node).to_string();
            let before = self.config.trace.then(|| graph.explain());
            apply(graph, rewrite)?;

            #[cfg(debug_assertions)]
            {
                tsplan_core::verify::assert_acyclic(graph);
                tsplan_core::verify::assert_adjacency_mirrored(graph);
            }

            #[cfg(feature = "tracing")]
            tracing::debug!(rule, node = %node_name, iteration = summary.iterations, "rule fired");

            summary.rewrites += 1;
            if let Some(before) = before {
                summary.trace.push(RuleTrace {
                    rule: rule.to_string(),
                    node: node_name.clone(),
                    before,
                    after: graph.explain(),
                });
            }
            summary.fired.push(FiredRule {
                rule: rule.to_string(),
                node: node_name,
            });
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            iterations = summary.iterations,
            rewrites = summary.rewrites,
            "reached fixed point"
        );
        Ok(summary)
    }

    /// First (node, rule) pair in walk order that produces an edit.
    fn next_rewrite(
        &self,
        graph: &PlanGraph,
        patterns: &[Pattern],
        ctx: &RuleContext<'_>,
    ) -> Option<(&'static str, NodeId, Rewrite)> {
        for node in graph.topological_order() {
            let kind = graph.node(node).map(|n| n.spec.kind());
            for (rule, pattern) in self.rules.iter().zip(patterns) {
                if pattern.root_kind().is_some_and(|k| Some(k) != kind) {
                    continue;
                }
                if !pattern.matches(graph, node) {
                    continue;
                }
                if let Some(rewrite) = rule.rewrite(graph, node, ctx) {
                    return Some((rule.name(), node, rewrite));
                }
            }
        }
        None
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::pushdown()
    }
}

fn apply(graph: &mut PlanGraph, rewrite: Rewrite) -> Result<()> {
    match rewrite {
        Rewrite::Respec(edits) => {
            for (id, spec) in edits {
                graph.set_spec(id, spec, NodeKind::Physical)?;
            }
        }
        Rewrite::Merge {
            scan,
            absorbed,
            spec,
        } => {
            let name = merged_name(graph.name(scan), graph.name(absorbed));
            graph.replace(&[scan, absorbed], PlanNode::physical(name, spec))?;
        }
    }
    Ok(())
}

fn now_nanos() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as i64)
        .unwrap_or_default()
}
