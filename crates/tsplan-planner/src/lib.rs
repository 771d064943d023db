#![forbid(unsafe_code)]
//! tsplan-planner: logical plan graph → physical plan with storage pushdown.
//!
//! Layout:
//! - `classify`: split a filter predicate into storage-pushable conjuncts
//!   and the remainder the engine still evaluates.
//! - `rules`: the `Rule` trait, upstream patterns, and the pushdown rules
//!   (scan conversion, range / filter / group fusion, keys-only distinct).
//! - `engine`: applies rules to a fixed point.
//! - `validate`: rejects plans with unbounded reads.
//! - `physical`: planner facade tying the above together.
//! - `dsl`: YAML plan specs for fixtures and tooling.
//!
//! Planning is synchronous and owns its graph; a `PhysicalPlanner` holds no
//! mutable state and can be shared between threads.

pub mod classify;
pub mod dsl;
pub mod engine;
pub mod physical;
pub mod rules;
pub mod validate;

pub use classify::{partition_predicate, Partition};
pub use dsl::yaml::{parse_yaml_plan, DslError, ParsedPlan};
pub use engine::{FiredRule, RuleEngine, RuleTrace, RunSummary};
pub use physical::{PhysicalPlan, PhysicalPlanner};
pub use rules::{default_rules, Pattern, Rewrite, Rule, RuleContext};
pub use validate::validate_physical_plan;
