//! Operation specs: one closed variant per operator kind.
//!
//! Specs are immutable values. Rewrites build new specs and swap them into
//! the graph; nothing mutates a spec that another branch may still observe.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::capability::{START_COLUMN, STOP_COLUMN, TIME_COLUMN};
use crate::error::{Error, Result};
use crate::expr::FunctionExpr;
use crate::time::Bounds;

/// Points limit meaning "no points, only the group key columns".
pub const KEYS_ONLY: i64 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupMode {
    None,
    By,
    Except,
}

impl fmt::Display for GroupMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GroupMode::None => "none",
            GroupMode::By => "by",
            GroupMode::Except => "except",
        })
    }
}

/// A bucket selector handed to the authorization collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketFilter {
    pub name: Option<String>,
    pub id: Option<String>,
}

/// Logical data source. Exactly one of `bucket` / `bucket_id` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSpec {
    #[serde(default)]
    pub bucket: Option<String>,
    #[serde(default)]
    pub bucket_id: Option<String>,
}

impl ScanSpec {
    pub fn by_name(bucket: impl Into<String>) -> Self {
        Self {
            bucket: Some(bucket.into()),
            bucket_id: None,
        }
    }

    pub fn by_id(bucket_id: impl Into<String>) -> Self {
        Self {
            bucket: None,
            bucket_id: Some(bucket_id.into()),
        }
    }

    /// Construction-time check: bucket name and ID are mutually exclusive
    /// and one of them must be non-empty.
    pub fn validate(&self) -> Result<()> {
        match (self.bucket.as_deref(), self.bucket_id.as_deref()) {
            (Some(_), Some(_)) => Err(Error::Spec(
                "scan cannot specify both bucket and bucket_id".into(),
            )),
            (None, None) => Err(Error::Spec(
                "scan must specify one of bucket or bucket_id".into(),
            )),
            (Some(""), None) | (None, Some("")) => {
                Err(Error::Spec("scan bucket must not be empty".into()))
            }
            _ => Ok(()),
        }
    }

    /// (read, write) bucket filters; a scan never writes.
    pub fn buckets_accessed(&self) -> (Vec<BucketFilter>, Vec<BucketFilter>) {
        let read = BucketFilter {
            name: self.bucket.clone(),
            id: self.bucket_id.clone(),
        };
        (vec![read], Vec::new())
    }
}

impl fmt::Display for ScanSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.bucket, &self.bucket_id) {
            (Some(name), _) => write!(f, "bucket={name:?}"),
            (None, Some(id)) => write!(f, "bucketID={id}"),
            (None, None) => write!(f, "bucket=?"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grouping {
    pub mode: GroupMode,
    pub keys: Vec<String>,
}

/// A scan bound to a physical read strategy. Each capability is unset
/// (`None`) until a pushdown rule sets it, and is set at most once except
/// bounds (intersected) and filter (AND-extended).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhysicalScanSpec {
    pub scan: ScanSpec,
    #[serde(default)]
    pub bounds: Option<Bounds>,
    #[serde(default)]
    pub filter: Option<FunctionExpr>,
    #[serde(default)]
    pub grouping: Option<Grouping>,
    #[serde(default)]
    pub points_limit: Option<i64>,
}

impl PhysicalScanSpec {
    pub fn from_scan(scan: ScanSpec) -> Self {
        Self {
            scan,
            ..Self::default()
        }
    }

    pub fn with_bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = Some(bounds);
        self
    }

    pub fn with_filter(mut self, filter: FunctionExpr) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_grouping(mut self, mode: GroupMode, keys: Vec<String>) -> Self {
        self.grouping = Some(Grouping { mode, keys });
        self
    }

    pub fn with_points_limit(mut self, limit: i64) -> Self {
        self.points_limit = Some(limit);
        self
    }

    pub fn is_keys_only(&self) -> bool {
        self.points_limit == Some(KEYS_ONLY)
    }
}

impl fmt::Display for PhysicalScanSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.scan)?;
        if let Some(bounds) = &self.bounds {
            write!(f, ", bounds={bounds}")?;
        }
        if let Some(filter) = &self.filter {
            write!(f, ", filter={filter}")?;
        }
        if let Some(g) = &self.grouping {
            write!(f, ", group={}[{}]", g.mode, g.keys.join(","))?;
        }
        if let Some(limit) = self.points_limit {
            write!(f, ", pointsLimit={limit}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeSpec {
    pub bounds: Bounds,
    #[serde(default = "default_time_column")]
    pub time_column: String,
    #[serde(default = "default_start_column")]
    pub start_column: String,
    #[serde(default = "default_stop_column")]
    pub stop_column: String,
}

fn default_time_column() -> String {
    TIME_COLUMN.to_string()
}

fn default_start_column() -> String {
    START_COLUMN.to_string()
}

fn default_stop_column() -> String {
    STOP_COLUMN.to_string()
}

impl RangeSpec {
    pub fn new(bounds: Bounds) -> Self {
        Self {
            bounds,
            time_column: default_time_column(),
            start_column: default_start_column(),
            stop_column: default_stop_column(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    #[serde(rename = "fn")]
    pub func: FunctionExpr,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSpec {
    pub mode: GroupMode,
    #[serde(default)]
    pub keys: Vec<String>,
}

impl GroupSpec {
    pub fn by(keys: &[&str]) -> Self {
        Self {
            mode: GroupMode::By,
            keys: keys.iter().map(|k| k.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistinctSpec {
    pub column: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YieldSpec {
    pub name: String,
}

/// Discriminant of [`OpSpec`], used by rule patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpKind {
    Scan,
    PhysicalScan,
    Range,
    Filter,
    Group,
    Distinct,
    Count,
    Mean,
    Sum,
    Yield,
    Opaque,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "op")]
pub enum OpSpec {
    Scan(ScanSpec),
    PhysicalScan(PhysicalScanSpec),
    Range(RangeSpec),
    Filter(FilterSpec),
    Group(GroupSpec),
    Distinct(DistinctSpec),
    Count,
    Mean,
    Sum,
    Yield(YieldSpec),
    /// Any in-engine operator the optimizer has no rules for (map, join, ...).
    Opaque { kind: String },
}

impl OpSpec {
    pub fn kind(&self) -> OpKind {
        match self {
            OpSpec::Scan(_) => OpKind::Scan,
            OpSpec::PhysicalScan(_) => OpKind::PhysicalScan,
            OpSpec::Range(_) => OpKind::Range,
            OpSpec::Filter(_) => OpKind::Filter,
            OpSpec::Group(_) => OpKind::Group,
            OpSpec::Distinct(_) => OpKind::Distinct,
            OpSpec::Count => OpKind::Count,
            OpSpec::Mean => OpKind::Mean,
            OpSpec::Sum => OpKind::Sum,
            OpSpec::Yield(_) => OpKind::Yield,
            OpSpec::Opaque { .. } => OpKind::Opaque,
        }
    }

    pub fn opaque(kind: impl Into<String>) -> Self {
        OpSpec::Opaque { kind: kind.into() }
    }

    pub fn as_physical_scan(&self) -> Option<&PhysicalScanSpec> {
        match self {
            OpSpec::PhysicalScan(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for OpSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpSpec::Scan(s) => write!(f, "scan({s})"),
            OpSpec::PhysicalScan(s) => write!(f, "physical_scan({s})"),
            OpSpec::Range(r) => write!(f, "range({})", r.bounds),
            OpSpec::Filter(flt) => write!(f, "filter({})", flt.func),
            OpSpec::Group(g) => write!(f, "group({}[{}])", g.mode, g.keys.join(",")),
            OpSpec::Distinct(d) => write!(f, "distinct({})", d.column),
            OpSpec::Count => write!(f, "count()"),
            OpSpec::Mean => write!(f, "mean()"),
            OpSpec::Sum => write!(f, "sum()"),
            OpSpec::Yield(y) => write!(f, "yield({})", y.name),
            OpSpec::Opaque { kind } => write!(f, "{kind}()"),
        }
    }
}
