//! Keys-only reads under `distinct`.

use tsplan_core::capability::{TIME_COLUMN, VALUE_COLUMN};
use tsplan_core::dag::PlanGraph;
use tsplan_core::id::NodeId;
use tsplan_core::spec::{GroupMode, OpKind, OpSpec, PhysicalScanSpec, KEYS_ONLY};

use super::{exclusive_scan, Pattern, Rewrite, Rule, RuleContext};

/// `scan -> distinct(column)`: when the column is a group key the scan can
/// skip points entirely. The distinct node stays in place; only the scan
/// changes.
pub struct ScanDistinctRule;

impl ScanDistinctRule {
    pub const NAME: &'static str = "ScanDistinct";
}

impl Rule for ScanDistinctRule {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn pattern(&self) -> Pattern {
        Pattern::op(OpKind::Distinct, vec![Pattern::leaf(OpKind::PhysicalScan)])
    }

    fn rewrite(&self, graph: &PlanGraph, node: NodeId, _ctx: &RuleContext<'_>) -> Option<Rewrite> {
        let OpSpec::Distinct(distinct) = &graph.node(node)?.spec else {
            return None;
        };
        let (scan, scan_spec) = exclusive_scan(graph, node)?;

        if scan_spec.points_limit.is_some() || !keys_cover(scan_spec, &distinct.column) {
            return None;
        }
        let limited = scan_spec.clone().with_points_limit(KEYS_ONLY);
        Some(Rewrite::Respec(vec![(scan, OpSpec::PhysicalScan(limited))]))
    }
}

/// Whether a keys-only read of `scan` still carries `column`.
fn keys_cover(scan: &PhysicalScanSpec, column: &str) -> bool {
    match &scan.grouping {
        None => column != VALUE_COLUMN && column != TIME_COLUMN,
        Some(g) if g.keys.is_empty() => false,
        Some(g) => {
            let listed = g.keys.iter().any(|k| k == column);
            match g.mode {
                GroupMode::By => listed,
                GroupMode::Except => !listed,
                GroupMode::None => false,
            }
        }
    }
}
