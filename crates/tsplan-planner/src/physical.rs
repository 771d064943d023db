//! Physical planning: run the pushdown rules, then validate.
//!
//! The result is what execution consumes: every scan is physical and carries
//! bounds plus whichever of filter / grouping / points limit storage agreed
//! to evaluate.

use serde::Serialize;
use tsplan_core::capability::StorageCapabilities;
use tsplan_core::config::PlannerConfig;
use tsplan_core::dag::{PlanGraph, PlanSnapshot};
use tsplan_core::error::Result;

use crate::engine::{RuleEngine, RunSummary};
use crate::rules::ScanConversionRule;
use crate::validate::validate_physical_plan;

/// A validated plan together with how it was reached.
#[derive(Debug, Clone)]
pub struct PhysicalPlan {
    pub graph: PlanGraph,
    pub summary: RunSummary,
}

#[derive(Serialize)]
struct PhysicalPlanJson<'a> {
    plan: PlanSnapshot,
    summary: &'a RunSummary,
}

impl PhysicalPlan {
    pub fn explain(&self) -> String {
        self.graph.explain()
    }

    /// Canonical JSON of the plan snapshot and the run summary.
    pub fn to_json(&self) -> Result<String> {
        let doc = PhysicalPlanJson {
            plan: self.graph.snapshot(),
            summary: &self.summary,
        };
        Ok(serde_json::to_string_pretty(&doc)?)
    }
}

pub struct PhysicalPlanner {
    engine: RuleEngine,
}

impl PhysicalPlanner {
    /// Planner with every pushdown rule enabled.
    pub fn new(config: PlannerConfig) -> Self {
        Self {
            engine: RuleEngine::pushdown().with_config(config),
        }
    }

    /// Planner restricted to the named rules. Scan conversion is always
    /// enabled: without it no other rule can match.
    pub fn only_rules(names: &[&str], config: PlannerConfig) -> Result<Self> {
        let mut selected: Vec<&str> = Vec::with_capacity(names.len() + 1);
        if !names.contains(&ScanConversionRule::NAME) {
            selected.push(ScanConversionRule::NAME);
        }
        selected.extend_from_slice(names);
        Ok(Self {
            engine: RuleEngine::only(&selected)?.with_config(config),
        })
    }

    pub fn with_capabilities(mut self, capabilities: StorageCapabilities) -> Self {
        self.engine = self.engine.with_capabilities(capabilities);
        self
    }

    pub fn engine(&self) -> &RuleEngine {
        &self.engine
    }

    pub fn plan(&self, mut graph: PlanGraph) -> Result<PhysicalPlan> {
        let summary = self.engine.run(&mut graph)?;
        validate_physical_plan(&graph)?;
        Ok(PhysicalPlan { graph, summary })
    }
}

impl Default for PhysicalPlanner {
    fn default() -> Self {
        Self::new(PlannerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tsplan_core::dag::PlanNode;
    use tsplan_core::error::Error;
    use tsplan_core::spec::{OpSpec, RangeSpec, ScanSpec};
    use tsplan_core::time::Bounds;

    fn scan_then(next: OpSpec) -> PlanGraph {
        let mut g = PlanGraph::new();
        g.add_node(PlanNode::logical("from", OpSpec::Scan(ScanSpec::by_name("b"))))
            .unwrap();
        g.add_node(PlanNode::physical("next", next)).unwrap();
        g.connect("from", "next").unwrap();
        g
    }

    #[test]
    fn plans_and_serializes() {
        let g = scan_then(OpSpec::Range(RangeSpec::new(Bounds::absolute(5, 10))));
        let plan = PhysicalPlanner::default().plan(g).unwrap();
        assert_eq!(plan.graph.len(), 1);
        let json = plan.to_json().unwrap();
        assert!(json.contains("merged_from_next"));
        assert!(json.contains("MergeScanRange"));
    }

    #[test]
    fn missing_range_is_rejected() {
        let g = scan_then(OpSpec::Count);
        let err = PhysicalPlanner::default().plan(g).unwrap_err();
        assert!(matches!(err, Error::UnboundedScan { .. }));
    }

    #[test]
    fn only_rules_keeps_scan_conversion() {
        let p = PhysicalPlanner::only_rules(&["MergeScanRange"], PlannerConfig::default()).unwrap();
        assert_eq!(p.engine().rule_names(), vec!["ScanConversion", "MergeScanRange"]);
    }
}
