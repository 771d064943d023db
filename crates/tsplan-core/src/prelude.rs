//! Convenient re-exports for downstream crates.

pub use crate::capability::StorageCapabilities;
pub use crate::config::PlannerConfig;
pub use crate::dag::{NodeKind, PlanGraph, PlanNode};
pub use crate::error::{Error, Result};
pub use crate::expr::{CmpOp, Expr, FunctionExpr};
pub use crate::id::NodeId;
pub use crate::spec::{
    DistinctSpec, FilterSpec, GroupMode, GroupSpec, OpKind, OpSpec, PhysicalScanSpec, RangeSpec,
    ScanSpec, YieldSpec, KEYS_ONLY,
};
pub use crate::time::{Bounds, Time};
