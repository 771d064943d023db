//! Logical scan → physical scan.

use tsplan_core::dag::PlanGraph;
use tsplan_core::id::NodeId;
use tsplan_core::spec::{OpKind, OpSpec, PhysicalScanSpec};

use super::{Pattern, Rewrite, Rule, RuleContext};

/// Binds a logical scan to a physical read with no capability set yet.
/// Fires once per scan: afterwards the spec no longer matches.
pub struct ScanConversionRule;

impl ScanConversionRule {
    pub const NAME: &'static str = "ScanConversion";
}

impl Rule for ScanConversionRule {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn pattern(&self) -> Pattern {
        Pattern::leaf(OpKind::Scan)
    }

    fn rewrite(&self, graph: &PlanGraph, node: NodeId, _ctx: &RuleContext<'_>) -> Option<Rewrite> {
        let OpSpec::Scan(scan) = &graph.node(node)?.spec else {
            return None;
        };
        let physical = PhysicalScanSpec::from_scan(scan.clone());
        Some(Rewrite::Respec(vec![(node, OpSpec::PhysicalScan(physical))]))
    }
}
