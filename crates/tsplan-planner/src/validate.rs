//! Checks a planned graph must pass before it is handed to execution.

use tsplan_core::dag::PlanGraph;
use tsplan_core::error::{Error, Result};
use tsplan_core::spec::OpSpec;

/// Every read must carry a resolved time window. A physical scan without
/// bounds is rejected, as is a logical scan that was never converted.
/// All offending nodes are reported, in topological order.
pub fn validate_physical_plan(graph: &PlanGraph) -> Result<()> {
    let nodes: Vec<String> = graph
        .topological_order()
        .into_iter()
        .filter_map(|id| graph.node(id))
        .filter(|n| match &n.spec {
            OpSpec::PhysicalScan(scan) => scan.bounds.is_none(),
            OpSpec::Scan(_) => true,
            _ => false,
        })
        .map(|n| n.id.clone())
        .collect();

    if nodes.is_empty() {
        return Ok(());
    }

    #[cfg(feature = "tracing")]
    tracing::warn!(nodes = ?nodes, "plan has unbounded scans");
    Err(Error::UnboundedScan { nodes })
}
