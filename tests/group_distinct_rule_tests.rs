//! Group fusion and keys-only distinct.

mod common;

use common::*;
use tsplan_core::prelude::*;

fn grouped_by(keys: &[&str]) -> PhysicalScanSpec {
    physical_from().with_grouping(GroupMode::By, keys.iter().map(|k| k.to_string()).collect())
}

#[test]
fn test_scan_distinct() {
    let before = plan(
        vec![
            scan("from", physical_from()),
            phys("distinct", distinct("_measurement")),
        ],
        &[(0, 1)],
    );
    let after = plan(
        vec![
            scan("from", physical_from().with_points_limit(KEYS_ONLY)),
            phys("distinct", distinct("_measurement")),
        ],
        &[(0, 1)],
    );
    check_rules("scan distinct", &["ScanDistinct"], before, Some(after));
}

#[test]
fn test_incompatible_group_distinct() {
    // Grouping drops _field from the keys, so no keys-only read.
    let before = plan(
        vec![
            scan("from", physical_from()),
            phys("group", group(GroupMode::By, &["_measurement"])),
            phys("distinct", distinct("_field")),
        ],
        &[(0, 1), (1, 2)],
    );
    let after = plan(
        vec![
            scan("merged_from_group", grouped_by(&["_measurement"])),
            phys("distinct", distinct("_field")),
        ],
        &[(0, 1)],
    );
    check_rules(
        "incompatible group distinct",
        &["ScanDistinct", "MergeScanGroup"],
        before,
        Some(after),
    );
}

#[test]
fn test_scan_group() {
    let before = plan(
        vec![
            scan("from", physical_from()),
            phys("group", group(GroupMode::By, &["_measurement"])),
            phys("filter", filter(vec![eq("_measurement", "cpu")])),
        ],
        &[(0, 1), (1, 2)],
    );
    let after = plan(
        vec![
            scan("merged_from_group", grouped_by(&["_measurement"])),
            phys("filter", filter(vec![eq("_measurement", "cpu")])),
        ],
        &[(0, 1)],
    );
    check_rules("scan group", &["MergeScanGroup"], before, Some(after));
}

#[test]
fn test_only_one_group_is_pushed() {
    let before = plan(
        vec![
            scan("from", physical_from()),
            phys("group", group(GroupMode::By, &["_measurement"])),
            phys("group2", group(GroupMode::By, &["_field"])),
        ],
        &[(0, 1), (1, 2)],
    );
    let after = plan(
        vec![
            scan("merged_from_group", grouped_by(&["_measurement"])),
            phys("group2", group(GroupMode::By, &["_field"])),
        ],
        &[(0, 1)],
    );
    check_rules("group group", &["MergeScanGroup"], before, Some(after));
}

#[test]
fn test_range_group_distinct_group() {
    let before = plan(
        vec![
            PlanNode::logical("from", logical_from()),
            phys("range", range(5, 10)),
            phys("group1", group(GroupMode::By, &["_measurement"])),
            phys("distinct", distinct("_measurement")),
            phys("group2", group(GroupMode::None, &[])),
        ],
        &[(0, 1), (1, 2), (2, 3), (3, 4)],
    );
    let after = plan(
        vec![
            scan(
                "merged_from_range_group1",
                bounded_from(5, 10)
                    .with_grouping(GroupMode::By, vec!["_measurement".into()])
                    .with_points_limit(KEYS_ONLY),
            ),
            phys("distinct", distinct("_measurement")),
            phys("group2", group(GroupMode::None, &[])),
        ],
        &[(0, 1), (1, 2)],
    );
    check_rules(
        "range group distinct group",
        &["ScanConversion", "MergeScanGroup", "ScanDistinct", "MergeScanRange"],
        before,
        Some(after),
    );
}

#[test]
fn test_group_except_is_not_pushed() {
    let before = plan(
        vec![
            scan("from", physical_from()),
            phys("group", group(GroupMode::Except, &["_time", "_value"])),
        ],
        &[(0, 1)],
    );
    check_rules("group except", &["MergeScanGroup"], before, None);
}

#[test]
fn test_group_on_reserved_columns_is_not_pushed() {
    for column in ["_time", "_value"] {
        let before = plan(
            vec![
                scan("from", physical_from()),
                phys("group", group(GroupMode::By, &["host", column])),
            ],
            &[(0, 1)],
        );
        check_rules(column, &["MergeScanGroup"], before, None);
    }
}

#[test]
fn test_cannot_push_group_into_shared_scan() {
    // group    count
    //     \    /
    //      from          the scan feeds two consumers: no change
    let before = plan(
        vec![
            scan("from", physical_from()),
            phys("group", group(GroupMode::By, &["host"])),
            phys("yield0", yield_("group")),
            phys("count", OpSpec::Count),
            phys("yield1", yield_("count")),
        ],
        &[(0, 1), (1, 2), (0, 3), (3, 4)],
    );
    check_rules("shared scan group", &["MergeScanGroup"], before, None);
}

#[test]
fn test_distinct_does_not_limit_shared_scan() {
    // distinct   mean
    //        \   /
    //        from        a keys-only read would starve mean of points
    let before = plan(
        vec![
            scan("from", physical_from()),
            phys("distinct", distinct("_measurement")),
            phys("yield0", yield_("distinct")),
            phys("mean", OpSpec::Mean),
            phys("yield1", yield_("mean")),
        ],
        &[(0, 1), (1, 2), (0, 3), (3, 4)],
    );
    check_rules("shared scan distinct", &["ScanDistinct"], before, None);
}
