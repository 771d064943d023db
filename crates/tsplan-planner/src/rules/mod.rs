//! Rewrite rules and the pieces they share.
//!
//! A rule declares a [`Pattern`] rooted at the node it rewrites (patterns
//! look *upstream*: a pattern's children match the node's predecessors) and
//! a `rewrite` that inspects the match read-only and returns the [`Rewrite`]
//! to perform, or `None` when the match is not legal. The engine owns all
//! graph mutation, so a declined rule can never leave the plan half-edited.

use tsplan_core::capability::StorageCapabilities;
use tsplan_core::dag::PlanGraph;
use tsplan_core::id::NodeId;
use tsplan_core::spec::{OpKind, OpSpec, PhysicalScanSpec};

pub mod distinct;
pub mod filter;
pub mod group;
pub mod range;
pub mod scan;

pub use distinct::ScanDistinctRule;
pub use filter::MergeScanFilterRule;
pub use group::MergeScanGroupRule;
pub use range::MergeScanRangeRule;
pub use scan::ScanConversionRule;

/// Structural pattern over a node and its predecessors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    Any,
    /// Node of `kind` whose predecessors match the children pairwise. The
    /// predecessor count must equal the number of children.
    Op(OpKind, Vec<Pattern>),
}

impl Pattern {
    pub fn leaf(kind: OpKind) -> Self {
        Pattern::Op(kind, Vec::new())
    }

    pub fn op(kind: OpKind, preds: Vec<Pattern>) -> Self {
        Pattern::Op(kind, preds)
    }

    pub fn root_kind(&self) -> Option<OpKind> {
        match self {
            Pattern::Any => None,
            Pattern::Op(kind, _) => Some(*kind),
        }
    }

    pub fn matches(&self, graph: &PlanGraph, node: NodeId) -> bool {
        match self {
            Pattern::Any => graph.contains(node),
            Pattern::Op(kind, children) => {
                let Some(n) = graph.node(node) else {
                    return false;
                };
                let preds = graph.predecessors(node);
                n.spec.kind() == *kind
                    && preds.len() == children.len()
                    && children
                        .iter()
                        .zip(preds)
                        .all(|(pat, &pred)| pat.matches(graph, pred))
            }
        }
    }
}

/// Read-only inputs a rule may consult.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub capabilities: &'a StorageCapabilities,
    /// Planning-time now (ns since epoch) for resolving relative bounds.
    pub now: i64,
}

/// A graph edit produced by a rule and applied by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Rewrite {
    /// Swap specs in place; every listed node becomes physical. Names and
    /// edges are unchanged.
    Respec(Vec<(NodeId, OpSpec)>),
    /// Fold `absorbed` (the scan's sole successor) into `scan`. The pair is
    /// replaced by one physical node carrying `spec`, named after both.
    Merge {
        scan: NodeId,
        absorbed: NodeId,
        spec: OpSpec,
    },
}

pub trait Rule: Send + Sync {
    /// Stable name, used to select rules and in logs/traces.
    fn name(&self) -> &'static str;

    fn pattern(&self) -> Pattern;

    /// Decide what to do with a pattern match rooted at `node`. `None`
    /// means no change.
    fn rewrite(&self, graph: &PlanGraph, node: NodeId, ctx: &RuleContext<'_>) -> Option<Rewrite>;
}

/// Name for the node produced by merging `downstream` into `upstream`.
/// `merged_` is not repeated when merging into an already-merged scan:
/// `merged_from_range0` + `range1` gives `merged_from_range0_range1`.
pub fn merged_name(upstream: &str, downstream: &str) -> String {
    let up = upstream.strip_prefix("merged_").unwrap_or(upstream);
    format!("merged_{up}_{downstream}")
}

/// The physical scan feeding `node`, provided `node` is its only consumer.
/// Absorbing anything into a scan that fans out would change what the
/// other consumers see.
pub(crate) fn exclusive_scan(
    graph: &PlanGraph,
    node: NodeId,
) -> Option<(NodeId, &PhysicalScanSpec)> {
    let scan = graph.sole_predecessor(node)?;
    if graph.sole_successor(scan) != Some(node) {
        return None;
    }
    let spec = graph.node(scan)?.spec.as_physical_scan()?;
    Some((scan, spec))
}

/// Every shipped rule, in the order the engine tries them.
pub fn default_rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(ScanConversionRule),
        Box::new(MergeScanRangeRule),
        Box::new(MergeScanFilterRule),
        Box::new(MergeScanGroupRule),
        Box::new(ScanDistinctRule),
    ]
}

pub fn rule_by_name(name: &str) -> Option<Box<dyn Rule>> {
    default_rules().into_iter().find(|r| r.name() == name)
}
