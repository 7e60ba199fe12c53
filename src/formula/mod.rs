//! Arithmetic formula support for calculator nodes.
//!
//! A calculator node carries a formula such as `peso / (altura * altura)`,
//! parsed once at graph-construction time into an [`Expr`] tree and evaluated
//! against the numeric fields accumulated so far. Parse failures are
//! configuration errors; a missing field at evaluation time is a runtime
//! anomaly handled by the caller.

use crate::error::FormulaError;
use ahash::AHashMap;
use std::collections::HashSet;
use std::fmt;

mod parser;

pub use parser::parse;

/// The expression tree of a parsed calculator formula.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Field(String),
    Sum(Box<Expr>, Box<Expr>),
    Subtract(Box<Expr>, Box<Expr>),
    Multiply(Box<Expr>, Box<Expr>),
    Divide(Box<Expr>, Box<Expr>),
    Power(Box<Expr>, Box<Expr>),
    Negate(Box<Expr>),
}

impl Expr {
    /// Evaluates the expression against a numeric field context.
    pub fn evaluate(&self, fields: &AHashMap<String, f64>) -> Result<f64, FormulaError> {
        match self {
            Expr::Number(n) => Ok(*n),
            Expr::Field(name) => fields
                .get(name)
                .copied()
                .ok_or_else(|| FormulaError::UnknownField(name.clone())),
            Expr::Sum(l, r) => Ok(l.evaluate(fields)? + r.evaluate(fields)?),
            Expr::Subtract(l, r) => Ok(l.evaluate(fields)? - r.evaluate(fields)?),
            Expr::Multiply(l, r) => Ok(l.evaluate(fields)? * r.evaluate(fields)?),
            Expr::Divide(l, r) => Ok(l.evaluate(fields)? / r.evaluate(fields)?),
            Expr::Power(l, r) => Ok(l.evaluate(fields)?.powf(r.evaluate(fields)?)),
            Expr::Negate(v) => Ok(-v.evaluate(fields)?),
        }
    }

    /// Collects the field names the expression reads.
    pub fn referenced_fields(&self, fields: &mut HashSet<String>) {
        match self {
            Expr::Number(_) => {}
            Expr::Field(name) => {
                fields.insert(name.clone());
            }
            Expr::Sum(l, r)
            | Expr::Subtract(l, r)
            | Expr::Multiply(l, r)
            | Expr::Divide(l, r)
            | Expr::Power(l, r) => {
                l.referenced_fields(fields);
                r.referenced_fields(fields);
            }
            Expr::Negate(v) => v.referenced_fields(fields),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(n) => {
                if n.fract() == 0.0 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Expr::Field(name) => write!(f, "${}", name),
            Expr::Sum(l, r) => write!(f, "({} + {})", l, r),
            Expr::Subtract(l, r) => write!(f, "({} - {})", l, r),
            Expr::Multiply(l, r) => write!(f, "({} * {})", l, r),
            Expr::Divide(l, r) => write!(f, "({} / {})", l, r),
            Expr::Power(l, r) => write!(f, "({} ^ {})", l, r),
            Expr::Negate(v) => write!(f, "(-{})", v),
        }
    }
}
