#![forbid(unsafe_code)]
//! tsplan: rule-based physical planning for a time-series query engine.
//!
//! Re-exports the plan model and the planner so callers depend on one
//! crate.

pub use tsplan_core;
pub use tsplan_planner;

pub use tsplan_core::prelude::*;
pub use tsplan_planner::{parse_yaml_plan, PhysicalPlan, PhysicalPlanner, RunSummary};
