//! YAML plan specs through the planner.

use tsplan_core::prelude::*;
use tsplan_planner::{parse_yaml_plan, DslError, PhysicalPlanner};

#[test]
fn test_yaml_plan_end_to_end() {
    let yaml = r#"
config:
  now: 36000000000000
nodes:
  - { id: from, op: scan, bucket: telegraf }
  - { id: range, op: range, start: -1h }
  - id: filter
    op: filter
    where:
      - { column: _measurement, op: "==", value: cpu }
      - { column: _value, op: ">", value: 0.5 }
  - { id: yield, op: yield }
edges:
  - [from, range]
  - [range, filter]
  - [filter, yield]
"#;
    let parsed = parse_yaml_plan(yaml).unwrap();
    let planner = PhysicalPlanner::new(parsed.config).with_capabilities(parsed.capabilities);
    let out = planner.plan(parsed.graph).unwrap();

    let scan_id = out.graph.lookup("merged_from_range").unwrap();
    let scan = out.graph.node(scan_id).unwrap().spec.as_physical_scan().unwrap();
    assert_eq!(
        scan.bounds,
        Some(Bounds::new(Time::Relative(-3_600_000_000_000), Time::Relative(0)))
    );
    assert_eq!(
        scan.filter.as_ref().map(|f| f.to_string()),
        Some(r#"(r) => r._measurement == "cpu""#.to_string())
    );

    let filter_id = out.graph.lookup("filter").unwrap();
    assert_eq!(out.graph.predecessors(filter_id), &[scan_id]);
}

#[test]
fn test_yaml_group_and_distinct() {
    let yaml = r#"
nodes:
  - { id: from, op: scan, bucket_id: aaaabbbbccccdddd }
  - { id: range, op: range, start: 0, stop: 100 }
  - { id: group, op: group, keys: [host] }
  - { id: distinct, op: distinct, column: host }
edges:
  - [from, range]
  - [range, group]
  - [group, distinct]
"#;
    let parsed = parse_yaml_plan(yaml).unwrap();
    let out = PhysicalPlanner::new(PlannerConfig::default().with_now(0))
        .plan(parsed.graph)
        .unwrap();
    let scan = out
        .graph
        .node(out.graph.lookup("merged_from_range_group").unwrap())
        .unwrap()
        .spec
        .as_physical_scan()
        .unwrap()
        .clone();
    assert!(scan.is_keys_only());
    assert_eq!(scan.grouping.unwrap().keys, vec!["host".to_string()]);
}

#[test]
fn test_yaml_full_function_filter() {
    let yaml = r#"
nodes:
  - id: f
    op: filter
    fn:
      params: [row]
      body:
        expr:
          compare:
            op: "=="
            left: { member: { object: { ident: row }, property: host } }
            right: { string: a }
"#;
    let g = parse_yaml_plan(yaml).unwrap().graph;
    let OpSpec::Filter(f) = &g.node(g.lookup("f").unwrap()).unwrap().spec else {
        panic!("expected filter");
    };
    assert_eq!(f.func.to_string(), r#"(row) => row.host == "a""#);
}

#[test]
fn test_yaml_cycle_is_rejected() {
    let yaml = r#"
nodes:
  - { id: a, op: count }
  - { id: b, op: count }
edges:
  - [a, b]
  - [b, a]
"#;
    assert!(matches!(
        parse_yaml_plan(yaml),
        Err(DslError::Plan(Error::Cycle { .. }))
    ));
}
