//! Fuse `range` into the scan feeding it.

use tsplan_core::capability::{START_COLUMN, STOP_COLUMN, TIME_COLUMN};
use tsplan_core::dag::PlanGraph;
use tsplan_core::id::NodeId;
use tsplan_core::spec::{OpKind, OpSpec};

use super::{exclusive_scan, Pattern, Rewrite, Rule, RuleContext};

/// `scan -> range` becomes a scan reading only the range's window. A scan
/// that already has bounds keeps their intersection with the range's.
/// Storage bounds always apply to `_time`, so a range over any other column
/// (or one writing other start/stop columns) stays where it is.
pub struct MergeScanRangeRule;

impl MergeScanRangeRule {
    pub const NAME: &'static str = "MergeScanRange";
}

impl Rule for MergeScanRangeRule {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn pattern(&self) -> Pattern {
        Pattern::op(OpKind::Range, vec![Pattern::leaf(OpKind::PhysicalScan)])
    }

    fn rewrite(&self, graph: &PlanGraph, node: NodeId, ctx: &RuleContext<'_>) -> Option<Rewrite> {
        let OpSpec::Range(range) = &graph.node(node)?.spec else {
            return None;
        };
        if range.time_column != TIME_COLUMN
            || range.start_column != START_COLUMN
            || range.stop_column != STOP_COLUMN
        {
            return None;
        }
        let (scan, scan_spec) = exclusive_scan(graph, node)?;

        let bounds = match &scan_spec.bounds {
            Some(existing) => existing.intersect(&range.bounds, ctx.now),
            None => range.bounds,
        };
        let merged = scan_spec.clone().with_bounds(bounds);
        Some(Rewrite::Merge {
            scan,
            absorbed: node,
            spec: OpSpec::PhysicalScan(merged),
        })
    }
}
