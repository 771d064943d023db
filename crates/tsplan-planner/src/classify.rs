//! Predicate classification for filter pushdown.
//!
//! A filter body is split at its top-level ANDs. Each conjunct is either
//! something the store can evaluate from its index (a supported comparison
//! between an indexed column of the row parameter and a literal) or it stays
//! in the engine. Order is preserved on both sides, so
//! `pushable AND remainder` is equivalent to the original predicate.

use tsplan_core::capability::StorageCapabilities;
use tsplan_core::expr::{CmpOp, Expr, FunctionExpr};

/// Result of splitting a predicate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partition {
    pub pushable: Vec<Expr>,
    pub remainder: Vec<Expr>,
}

impl Partition {
    pub fn is_fully_pushable(&self) -> bool {
        self.remainder.is_empty() && !self.pushable.is_empty()
    }

    pub fn nothing_pushable(&self) -> bool {
        self.pushable.is_empty()
    }
}

/// Split a filter function. Returns `None` for functions that are never
/// pushable: statement-bodied, or not exactly one parameter.
pub fn partition_predicate(func: &FunctionExpr, caps: &StorageCapabilities) -> Option<Partition> {
    let param = func.single_param()?;
    let body = func.body_expr()?;
    Some(partition_conjuncts(param, body, caps))
}

pub fn partition_conjuncts(param: &str, body: &Expr, caps: &StorageCapabilities) -> Partition {
    let mut out = Partition::default();
    for conjunct in body.conjuncts() {
        if is_pushable(param, conjunct, caps) {
            out.pushable.push(conjunct.clone());
        } else {
            out.remainder.push(conjunct.clone());
        }
    }
    out
}

/// `param.col <op> literal` or `literal <op> param.col`, with `op` supported
/// by storage and `col` indexed.
pub fn is_pushable(param: &str, expr: &Expr, caps: &StorageCapabilities) -> bool {
    let Expr::Compare { op, left, right } = expr else {
        return false;
    };
    if !caps.supports(*op) {
        return false;
    }
    column_vs_literal(param, *op, left, right, caps) || column_vs_literal(param, *op, right, left, caps)
}

fn column_vs_literal(
    param: &str,
    op: CmpOp,
    column: &Expr,
    literal: &Expr,
    caps: &StorageCapabilities,
) -> bool {
    let Some(name) = column.member_of(param) else {
        return false;
    };
    if !caps.is_indexed(name) || !literal.is_literal() {
        return false;
    }
    // Regex operators take regex literals and nothing else does.
    let regex_op = matches!(op, CmpOp::RegexMatch | CmpOp::RegexNotMatch);
    regex_op == matches!(literal, Expr::Regex(_))
}
