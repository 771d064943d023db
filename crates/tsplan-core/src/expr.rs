//! Predicate expression tree carried by filter operators and pushed filters.
//!
//! Only the shapes the optimizer has to reason about are modelled: literals,
//! identifiers, member access on a record parameter, comparisons, and/or and
//! negation. A filter function is either expression-bodied or a statement
//! block; only the former can ever be pushed to storage.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Comparison operators appearing in predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CmpOp {
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    NotEq,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    LtEq,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    GtEq,
    #[serde(rename = "=~")]
    RegexMatch,
    #[serde(rename = "!~")]
    RegexNotMatch,
}

impl CmpOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::NotEq => "!=",
            CmpOp::Lt => "<",
            CmpOp::LtEq => "<=",
            CmpOp::Gt => ">",
            CmpOp::GtEq => ">=",
            CmpOp::RegexMatch => "=~",
            CmpOp::RegexNotMatch => "!~",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicalOp {
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Expr {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Regex(String),
    Ident(String),
    Member {
        object: Box<Expr>,
        property: String,
    },
    Compare {
        op: CmpOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Logical {
        op: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Not(Box<Expr>),
}

impl Expr {
    /// `param.property`, e.g. `r._measurement`.
    pub fn member(param: impl Into<String>, property: impl Into<String>) -> Self {
        Expr::Member {
            object: Box::new(Expr::Ident(param.into())),
            property: property.into(),
        }
    }

    pub fn string(s: impl Into<String>) -> Self {
        Expr::String(s.into())
    }

    pub fn compare(op: CmpOp, left: Expr, right: Expr) -> Self {
        Expr::Compare {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn and(left: Expr, right: Expr) -> Self {
        Expr::Logical {
            op: LogicalOp::And,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn or(left: Expr, right: Expr) -> Self {
        Expr::Logical {
            op: LogicalOp::Or,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            Expr::Bool(_) | Expr::Int(_) | Expr::Float(_) | Expr::String(_) | Expr::Regex(_)
        )
    }

    /// If this is `param.property` for the given parameter name, the property.
    pub fn member_of(&self, param: &str) -> Option<&str> {
        match self {
            Expr::Member { object, property } => match object.as_ref() {
                Expr::Ident(name) if name == param => Some(property),
                _ => None,
            },
            _ => None,
        }
    }

    /// Replace every identifier `from` with `to`.
    pub fn rename_ident(self, from: &str, to: &str) -> Expr {
        let rename = |e: Box<Expr>| Box::new(e.rename_ident(from, to));
        match self {
            Expr::Ident(name) if name == from => Expr::Ident(to.to_string()),
            Expr::Member { object, property } => Expr::Member {
                object: rename(object),
                property,
            },
            Expr::Compare { op, left, right } => Expr::Compare {
                op,
                left: rename(left),
                right: rename(right),
            },
            Expr::Logical { op, left, right } => Expr::Logical {
                op,
                left: rename(left),
                right: rename(right),
            },
            Expr::Not(inner) => Expr::Not(rename(inner)),
            other => other,
        }
    }

    /// Flatten the top-level AND chain, left to right. OR and NOT nodes are
    /// opaque here: they form a single conjunct.
    pub fn conjuncts(&self) -> Vec<&Expr> {
        let mut out = Vec::new();
        collect_conjuncts(self, &mut out);
        out
    }
}

fn collect_conjuncts<'a>(expr: &'a Expr, out: &mut Vec<&'a Expr>) {
    match expr {
        Expr::Logical {
            op: LogicalOp::And,
            left,
            right,
        } => {
            collect_conjuncts(left, out);
            collect_conjuncts(right, out);
        }
        other => out.push(other),
    }
}

/// Left-fold `exprs` with AND: `((a and b) and c)`. `None` when empty.
pub fn conjunction(exprs: impl IntoIterator<Item = Expr>) -> Option<Expr> {
    exprs.into_iter().reduce(Expr::and)
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Bool(b) => write!(f, "{b}"),
            Expr::Int(i) => write!(f, "{i}"),
            Expr::Float(x) => write!(f, "{x:?}"),
            Expr::String(s) => write!(f, "{s:?}"),
            Expr::Regex(r) => write!(f, "/{r}/"),
            Expr::Ident(name) => write!(f, "{name}"),
            Expr::Member { object, property } => write!(f, "{object}.{property}"),
            Expr::Compare { op, left, right } => write!(f, "{left} {} {right}", op.symbol()),
            Expr::Logical { op, left, right } => {
                let word = match op {
                    LogicalOp::And => "and",
                    LogicalOp::Or => "or",
                };
                write!(f, "{} {word} {}", Paren(left), Paren(right))
            }
            Expr::Not(inner) => write!(f, "not {}", Paren(inner)),
        }
    }
}

/// Parenthesize nested logical expressions when rendering.
struct Paren<'a>(&'a Expr);

impl fmt::Display for Paren<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Expr::Logical { .. } => write!(f, "({})", self.0),
            other => write!(f, "{other}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Statement {
    Assign { name: String, value: Expr },
    Return(Expr),
}

/// Body of a function expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Body {
    Expr(Expr),
    Block(Vec<Statement>),
}

/// `(params) => body`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionExpr {
    pub params: Vec<String>,
    pub body: Body,
}

impl FunctionExpr {
    /// Single-parameter, expression-bodied predicate AND-ing `exprs`.
    /// An empty list yields the constant `true`.
    pub fn predicate(param: impl Into<String>, exprs: impl IntoIterator<Item = Expr>) -> Self {
        Self {
            params: vec![param.into()],
            body: Body::Expr(conjunction(exprs).unwrap_or(Expr::Bool(true))),
        }
    }

    /// The body expression when the function is expression-bodied.
    pub fn body_expr(&self) -> Option<&Expr> {
        match &self.body {
            Body::Expr(e) => Some(e),
            Body::Block(_) => None,
        }
    }

    /// The sole parameter name, if there is exactly one.
    pub fn single_param(&self) -> Option<&str> {
        match self.params.as_slice() {
            [p] => Some(p),
            _ => None,
        }
    }

    /// Same parameters, new expression body.
    pub fn with_body(&self, body: Expr) -> Self {
        Self {
            params: self.params.clone(),
            body: Body::Expr(body),
        }
    }
}

impl fmt::Display for FunctionExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}) => ", self.params.join(", "))?;
        match &self.body {
            Body::Expr(e) => write!(f, "{e}"),
            Body::Block(stmts) => write!(f, "{{ {} statement(s) }}", stmts.len()),
        }
    }
}
