//! Textual plan specs for fixtures and tooling.

pub mod yaml;

pub use yaml::{parse_yaml_plan, DslError, ParsedPlan};
