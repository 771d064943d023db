//! Fuse a `group` into the scan feeding it.

use tsplan_core::capability::{TIME_COLUMN, VALUE_COLUMN};
use tsplan_core::dag::PlanGraph;
use tsplan_core::id::NodeId;
use tsplan_core::spec::{GroupMode, OpKind, OpSpec};

use super::{exclusive_scan, Pattern, Rewrite, Rule, RuleContext};

/// `scan -> group(by: keys)` becomes a scan that groups natively. Only
/// `by` grouping on tag columns is handed to storage, and only once per
/// scan: a later group in the chain stays an engine operator.
pub struct MergeScanGroupRule;

impl MergeScanGroupRule {
    pub const NAME: &'static str = "MergeScanGroup";
}

impl Rule for MergeScanGroupRule {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn pattern(&self) -> Pattern {
        Pattern::op(OpKind::Group, vec![Pattern::leaf(OpKind::PhysicalScan)])
    }

    fn rewrite(&self, graph: &PlanGraph, node: NodeId, _ctx: &RuleContext<'_>) -> Option<Rewrite> {
        let OpSpec::Group(group) = &graph.node(node)?.spec else {
            return None;
        };
        let (scan, scan_spec) = exclusive_scan(graph, node)?;

        if scan_spec.grouping.is_some() || scan_spec.points_limit.is_some() {
            return None;
        }
        if group.mode != GroupMode::By {
            return None;
        }
        if group
            .keys
            .iter()
            .any(|k| k == TIME_COLUMN || k == VALUE_COLUMN)
        {
            return None;
        }

        let merged = scan_spec
            .clone()
            .with_grouping(group.mode, group.keys.clone());
        Some(Rewrite::Merge {
            scan,
            absorbed: node,
            spec: OpSpec::PhysicalScan(merged),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tsplan_core::capability::StorageCapabilities;
    use tsplan_core::dag::PlanNode;
    use tsplan_core::spec::{GroupSpec, Grouping, PhysicalScanSpec, ScanSpec};

    fn run(scan: PhysicalScanSpec, group: GroupSpec) -> Option<Rewrite> {
        let mut g = PlanGraph::new();
        let s = g.add_node(PlanNode::physical("from", OpSpec::PhysicalScan(scan))).unwrap();
        let n = g.add_node(PlanNode::physical("group", OpSpec::Group(group))).unwrap();
        g.add_edge(s, n).unwrap();
        let caps = StorageCapabilities::default();
        let ctx = RuleContext { capabilities: &caps, now: 0 };
        MergeScanGroupRule.rewrite(&g, n, &ctx)
    }

    fn scan() -> PhysicalScanSpec {
        PhysicalScanSpec::from_scan(ScanSpec::by_name("b"))
    }

    #[test]
    fn group_by_tags_merges() {
        let Some(Rewrite::Merge { spec, .. }) = run(scan(), GroupSpec::by(&["host", "region"])) else {
            panic!("expected merge");
        };
        assert_eq!(
            spec.as_physical_scan().unwrap().grouping,
            Some(Grouping {
                mode: GroupMode::By,
                keys: vec!["host".into(), "region".into()],
            })
        );
    }

    #[test]
    fn except_mode_declines() {
        let except = GroupSpec {
            mode: GroupMode::Except,
            keys: vec!["host".into()],
        };
        assert_eq!(run(scan(), except), None);
    }

    #[test]
    fn reserved_columns_decline() {
        assert_eq!(run(scan(), GroupSpec::by(&["host", "_time"])), None);
        assert_eq!(run(scan(), GroupSpec::by(&["_value"])), None);
    }

    #[test]
    fn second_group_is_not_merged() {
        let grouped = scan().with_grouping(GroupMode::By, vec!["host".into()]);
        assert_eq!(run(grouped, GroupSpec::by(&["region"])), None);
    }
}
