use std::cmp::Ordering;
use std::fmt;

use crate::common::{RelicError, Result};

use super::{Record, Value};

/// Comparison operator in a predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl CompareOp {
    /// Parses the operator symbols the dispatcher hands over.
    /// `!=` and `<>` are synonyms.
    pub fn parse(symbol: &str) -> Result<CompareOp> {
        match symbol {
            "=" | "==" => Ok(CompareOp::Eq),
            "!=" | "<>" => Ok(CompareOp::Ne),
            "<" => Ok(CompareOp::Lt),
            ">" => Ok(CompareOp::Gt),
            "<=" => Ok(CompareOp::Le),
            ">=" => Ok(CompareOp::Ge),
            other => Err(RelicError::InvalidPredicate(format!(
                "unsupported operator '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Gt => ">",
            CompareOp::Le => "<=",
            CompareOp::Ge => ">=",
        };
        write!(f, "{}", symbol)
    }
}

/// One simple comparison: `column op literal`.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub column: String,
    pub op: CompareOp,
    pub literal: Value,
}

impl Comparison {
    pub fn new(column: &str, op: CompareOp, literal: impl Into<Value>) -> Self {
        Self {
            column: column.to_lowercase(),
            op,
            literal: literal.into(),
        }
    }

    /// Evaluates this comparison against a record. A missing column
    /// fails the comparison. Equality uses loose cross-type coercion;
    /// ordering operators fail when the values are not comparable.
    pub fn matches(&self, record: &Record) -> bool {
        let value = match record.get(&self.column) {
            Some(v) => v,
            None => return false,
        };

        match self.op {
            CompareOp::Eq => value.loosely_eq(&self.literal),
            CompareOp::Ne => !value.loosely_eq(&self.literal),
            CompareOp::Lt => value.compare(&self.literal) == Some(Ordering::Less),
            CompareOp::Gt => value.compare(&self.literal) == Some(Ordering::Greater),
            CompareOp::Le => matches!(
                value.compare(&self.literal),
                Some(Ordering::Less) | Some(Ordering::Equal)
            ),
            CompareOp::Ge => matches!(
                value.compare(&self.literal),
                Some(Ordering::Greater) | Some(Ordering::Equal)
            ),
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.column, self.op, self.literal)
    }
}

/// An ordered, implicitly ANDed list of simple comparisons.
/// Evaluation short-circuits at the first failing comparison.
/// There is no OR support and no grouping.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Predicate {
    comparisons: Vec<Comparison>,
}

impl Predicate {
    pub fn new(comparisons: Vec<Comparison>) -> Self {
        Self { comparisons }
    }

    /// Single-comparison convenience constructor.
    pub fn simple(column: &str, op: CompareOp, literal: impl Into<Value>) -> Self {
        Self::new(vec![Comparison::new(column, op, literal)])
    }

    /// Appends another comparison (AND semantics).
    pub fn and(mut self, column: &str, op: CompareOp, literal: impl Into<Value>) -> Self {
        self.comparisons.push(Comparison::new(column, op, literal));
        self
    }

    pub fn comparisons(&self) -> &[Comparison] {
        &self.comparisons
    }

    /// True when every comparison matches, in listed order.
    pub fn matches(&self, record: &Record) -> bool {
        self.comparisons.iter().all(|c| c.matches(record))
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, comparison) in self.comparisons.iter().enumerate() {
            if i > 0 {
                write!(f, " and ")?;
            }
            write!(f, "{}", comparison)?;
        }
        Ok(())
    }
}
