use criterion::{criterion_group, criterion_main, Criterion};
use tsplan_core::prelude::*;
use tsplan_planner::PhysicalPlanner;

fn host_eq(host: usize) -> Expr {
    Expr::compare(
        CmpOp::Eq,
        Expr::member("r", "host"),
        Expr::string(format!("host-{host}")),
    )
}

/// from -> range -> filter x n -> yield
fn make_chain(filters: usize) -> PlanGraph {
    let mut g = PlanGraph::new();
    let mut prev = g
        .add_node(PlanNode::logical("from", OpSpec::Scan(ScanSpec::by_name("telegraf"))))
        .unwrap();
    let range = g
        .add_node(PlanNode::physical(
            "range",
            OpSpec::Range(RangeSpec::new(Bounds::absolute(0, 1_000))),
        ))
        .unwrap();
    g.add_edge(prev, range).unwrap();
    prev = range;
    for i in 0..filters {
        let f = g
            .add_node(PlanNode::physical(
                format!("filter{i}"),
                OpSpec::Filter(FilterSpec {
                    func: FunctionExpr::predicate("r", vec![host_eq(i)]),
                }),
            ))
            .unwrap();
        g.add_edge(prev, f).unwrap();
        prev = f;
    }
    let y = g
        .add_node(PlanNode::physical(
            "yield",
            OpSpec::Yield(YieldSpec { name: "_result".into() }),
        ))
        .unwrap();
    g.add_edge(prev, y).unwrap();
    g
}

/// One bounded scan per branch, all joined into one sink.
fn make_fan_out(branches: usize) -> PlanGraph {
    let mut g = PlanGraph::new();
    let join = g
        .add_node(PlanNode::physical("join", OpSpec::opaque("union")))
        .unwrap();
    for i in 0..branches {
        let from = g
            .add_node(PlanNode::logical(
                format!("from{i}"),
                OpSpec::Scan(ScanSpec::by_name("telegraf")),
            ))
            .unwrap();
        let range = g
            .add_node(PlanNode::physical(
                format!("range{i}"),
                OpSpec::Range(RangeSpec::new(Bounds::absolute(0, 1_000))),
            ))
            .unwrap();
        let count = g
            .add_node(PlanNode::physical(format!("count{i}"), OpSpec::Count))
            .unwrap();
        g.add_edge(from, range).unwrap();
        g.add_edge(range, count).unwrap();
        g.add_edge(count, join).unwrap();
    }
    g
}

fn bench_planning(c: &mut Criterion) {
    let planner = PhysicalPlanner::new(PlannerConfig::default().with_now(0));

    let chain = make_chain(32);
    c.bench_function("plan_chain_32_filters", |b| {
        b.iter(|| {
            let _ = planner.plan(chain.clone()).unwrap();
        })
    });

    let fan_out = make_fan_out(32);
    c.bench_function("plan_fan_out_32_branches", |b| {
        b.iter(|| {
            let _ = planner.plan(fan_out.clone()).unwrap();
        })
    });
}

criterion_group!(benches, bench_planning);
criterion_main!(benches);
