//! Push indexable filter conjuncts into the scan.

use tsplan_core::dag::PlanGraph;
use tsplan_core::expr::{conjunction, FunctionExpr};
use tsplan_core::id::NodeId;
use tsplan_core::spec::{FilterSpec, OpKind, OpSpec};

use super::{exclusive_scan, Pattern, Rewrite, Rule, RuleContext};
use crate::classify::partition_predicate;

/// `scan -> filter`: conjuncts storage can answer move into the scan's
/// filter (AND-ed onto any filter already there). When every conjunct
/// moves, the filter node disappears into the scan; otherwise it stays
/// with the leftover conjuncts and both nodes keep their names.
pub struct MergeScanFilterRule;

impl MergeScanFilterRule {
    pub const NAME: &'static str = "MergeScanFilter";
}

impl Rule for MergeScanFilterRule {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn pattern(&self) -> Pattern {
        Pattern::op(OpKind::Filter, vec![Pattern::leaf(OpKind::PhysicalScan)])
    }

    fn rewrite(&self, graph: &PlanGraph, node: NodeId, ctx: &RuleContext<'_>) -> Option<Rewrite> {
        let OpSpec::Filter(filter) = &graph.node(node)?.spec else {
            return None;
        };
        let (scan, scan_spec) = exclusive_scan(graph, node)?;

        let partition = partition_predicate(&filter.func, ctx.capabilities)?;
        if partition.nothing_pushable() {
            return None;
        }
        let param = filter.func.single_param()?;

        let pushed = match &scan_spec.filter {
            None => FunctionExpr::predicate(param, partition.pushable),
            Some(existing) => {
                let target = existing.single_param()?;
                let existing_body = existing.body_expr()?.clone();
                let rebound = partition
                    .pushable
                    .into_iter()
                    .map(|e| e.rename_ident(param, target));
                let body = conjunction(std::iter::once(existing_body).chain(rebound))?;
                existing.with_body(body)
            }
        };
        let merged = scan_spec.clone().with_filter(pushed);

        match conjunction(partition.remainder) {
            None => Some(Rewrite::Merge {
                scan,
                absorbed: node,
                spec: OpSpec::PhysicalScan(merged),
            }),
            Some(rest) => Some(Rewrite::Respec(vec![
                (scan, OpSpec::PhysicalScan(merged)),
                (
                    node,
                    OpSpec::Filter(FilterSpec {
                        func: filter.func.with_body(rest),
                    }),
                ),
            ])),
        }
    }
}
