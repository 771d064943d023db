//! Planner configuration that callers can serialize/deserialize.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Upper bound on rewrites in one planning pass. The shipped rule set
    /// always terminates well below this; hitting it means a rule keeps
    /// reporting progress without making any.
    pub max_iterations: usize,

    /// Planning-time "now" in nanoseconds since the epoch, used to resolve
    /// relative bounds. `None` samples the wall clock once per pass.
    pub now: Option<i64>,

    /// Record a before/after rendering of the plan for every rewrite.
    pub trace: bool,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_iterations: 1_000,
            now: None,
            trace: false,
        }
    }
}

impl PlannerConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `TSPLAN_MAX_ITERATIONS`: rewrite cap per planning pass
    /// - `TSPLAN_NOW`: fixed "now" (ns since epoch)
    /// - `TSPLAN_TRACE`: `1`/`true` to record rewrite traces
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("TSPLAN_MAX_ITERATIONS") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.max_iterations = v;
            }
        }

        if let Ok(s) = std::env::var("TSPLAN_NOW") {
            if let Ok(v) = s.parse::<i64>() {
                cfg.now = Some(v);
            }
        }

        if let Ok(s) = std::env::var("TSPLAN_TRACE") {
            cfg.trace = matches!(s.trim(), "1" | "true" | "yes");
        }

        cfg
    }

    pub fn with_now(mut self, now: i64) -> Self {
        self.now = Some(now);
        self
    }

    pub fn with_trace(mut self, enable: bool) -> Self {
        self.trace = enable;
        self
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }
}
