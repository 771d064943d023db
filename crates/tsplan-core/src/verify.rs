//! Debug-time verification helpers for plan graphs.
//!
//! Rewrites are expected to keep the graph acyclic and its adjacency lists
//! mirrored. These checks catch a broken rewrite primitive early; they
//! should stay cheap.

use crate::dag::PlanGraph;

/// Every live node appears in the topological order (i.e. no cycle).
pub fn assert_acyclic(graph: &PlanGraph) {
    let order = graph.topological_order();
    assert_eq!(
        order.len(),
        graph.len(),
        "plan graph has a cycle:\n{}",
        graph.explain()
    );
}

/// `p -> c` is recorded on both ends, and only between live nodes.
pub fn assert_adjacency_mirrored(graph: &PlanGraph) {
    for id in graph.ids() {
        for &c in graph.successors(id) {
            assert!(graph.contains(c), "{} points at a removed node", graph.name(id));
            assert!(
                graph.predecessors(c).contains(&id),
                "edge {} -> {} missing from child's predecessors",
                graph.name(id),
                graph.name(c)
            );
        }
        for &p in graph.predecessors(id) {
            assert!(
                graph.successors(p).contains(&id),
                "edge {} -> {} missing from parent's successors",
                graph.name(p),
                graph.name(id)
            );
        }
    }
}
