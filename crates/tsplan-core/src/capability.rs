//! Storage capability description.
//!
//! Supplied by the storage collaborator; the predicate classifier consults it
//! to decide which comparisons the index/metadata layer can evaluate. Which
//! operators are supported is storage-version dependent, so it is data here
//! rather than a hard-coded list in the planner.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::expr::CmpOp;

/// The value column. Comparisons on it need materialized points.
pub const VALUE_COLUMN: &str = "_value";
/// The timestamp column.
pub const TIME_COLUMN: &str = "_time";
pub const START_COLUMN: &str = "_start";
pub const STOP_COLUMN: &str = "_stop";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageCapabilities {
    /// Comparison operators storage evaluates natively on tag/field columns.
    pub operators: BTreeSet<CmpOp>,
    /// Columns storage cannot filter on without reading points.
    pub unindexed_columns: BTreeSet<String>,
}

impl Default for StorageCapabilities {
    fn default() -> Self {
        Self {
            operators: [
                CmpOp::Eq,
                CmpOp::NotEq,
                CmpOp::RegexMatch,
                CmpOp::RegexNotMatch,
            ]
            .into_iter()
            .collect(),
            unindexed_columns: [VALUE_COLUMN.to_string()].into_iter().collect(),
        }
    }
}

impl StorageCapabilities {
    pub fn supports(&self, op: CmpOp) -> bool {
        self.operators.contains(&op)
    }

    pub fn is_indexed(&self, column: &str) -> bool {
        !self.unindexed_columns.contains(column)
    }

    pub fn with_operator(mut self, op: CmpOp) -> Self {
        self.operators.insert(op);
        self
    }
}
