//! Runtime values flowing through query evaluation.
//!
//! Every cell a query produces is a [`Value`]. Integers and decimals
//! compare and hash as the same number, so a `GROUP BY` key or a
//! `DISTINCT` row never splits on numeric representation. [`ValueType`]
//! is the compile-time mirror used for declared output columns.

use chrono::NaiveDate;
use quill_core::{Amount, Inventory, Position};
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A value produced while evaluating a query.
#[derive(Debug, Clone)]
pub enum Value {
    /// String value (accounts, payees, narrations).
    String(String),
    /// Integer value (counts, date parts).
    Integer(i64),
    /// Decimal number.
    Number(Decimal),
    /// Date value.
    Date(NaiveDate),
    /// Boolean value.
    Boolean(bool),
    /// Ordered set of strings (tags, links, collected distinct values).
    StringSet(BTreeSet<String>),
    /// A single amount.
    Amount(Amount),
    /// Units at an optional cost.
    Position(Position),
    /// A collection of positions.
    Inventory(Inventory),
    /// Absent value.
    Null,
}

/// The declared type of an output column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    /// String column.
    String,
    /// Integer column.
    Integer,
    /// Decimal column.
    Number,
    /// Date column.
    Date,
    /// Boolean column.
    Boolean,
    /// String set column.
    StringSet,
    /// Amount column.
    Amount,
    /// Position column.
    Position,
    /// Inventory column.
    Inventory,
}

impl Value {
    /// Check if this value is null.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// A short name for the value's kind, used in diagnostics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Integer(_) => "integer",
            Self::Number(_) => "number",
            Self::Date(_) => "date",
            Self::Boolean(_) => "boolean",
            Self::StringSet(_) => "set",
            Self::Amount(_) => "amount",
            Self::Position(_) => "position",
            Self::Inventory(_) => "inventory",
            Self::Null => "null",
        }
    }

    /// View this value as a decimal, if it is numeric.
    #[must_use]
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Integer(i) => Some(Decimal::from(*i)),
            Self::Number(d) => Some(*d),
            _ => None,
        }
    }

    /// Interpret this value as a condition.
    ///
    /// Only booleans and null have a truth value; everything else is a
    /// type mismatch the caller reports.
    #[must_use]
    pub const fn as_truthy(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            Self::Null => Some(false),
            _ => None,
        }
    }
}

/// Compare two values of the same kind.
///
/// Returns `None` for incomparable pairs (mixed kinds other than
/// integer/number, or amounts in different currencies).
#[must_use]
pub fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Date(x), Value::Date(y)) => Some(x.cmp(y)),
        (Value::Boolean(x), Value::Boolean(y)) => Some(x.cmp(y)),
        (Value::StringSet(x), Value::StringSet(y)) => Some(x.cmp(y)),
        (Value::Amount(x), Value::Amount(y)) if x.currency == y.currency => {
            Some(x.number.cmp(&y.number))
        }
        _ => match (a.as_decimal(), b.as_decimal()) {
            (Some(x), Some(y)) => Some(x.cmp(&y)),
            _ => None,
        },
    }
}

/// Total ordering used by ORDER BY: nulls sort last, incomparable
/// pairs keep their original order.
#[must_use]
pub fn compare_for_sort(a: &Value, b: &Value) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => compare(a, b).unwrap_or(Ordering::Equal),
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Date(a), Self::Date(b)) => a == b,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::StringSet(a), Self::StringSet(b)) => a == b,
            (Self::Amount(a), Self::Amount(b)) => a == b,
            (Self::Position(a), Self::Position(b)) => a == b,
            (Self::Inventory(a), Self::Inventory(b)) => a == b,
            (Self::Null, Self::Null) => true,
            _ => match (self.as_decimal(), other.as_decimal()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Self::String(s) => {
                state.write_u8(0);
                s.hash(state);
            }
            // Integers and numbers hash as the same decimal so that
            // hashing stays consistent with equality.
            Self::Integer(i) => {
                state.write_u8(1);
                Decimal::from(*i).hash(state);
            }
            Self::Number(d) => {
                state.write_u8(1);
                d.hash(state);
            }
            Self::Date(d) => {
                state.write_u8(2);
                d.hash(state);
            }
            Self::Boolean(b) => {
                state.write_u8(3);
                b.hash(state);
            }
            Self::StringSet(s) => {
                state.write_u8(4);
                s.hash(state);
            }
            Self::Amount(a) => {
                state.write_u8(5);
                a.hash(state);
            }
            Self::Position(p) => {
                state.write_u8(6);
                p.hash(state);
            }
            Self::Inventory(inv) => {
                state.write_u8(7);
                let mut lots: Vec<String> =
                    inv.positions().iter().map(ToString::to_string).collect();
                lots.sort_unstable();
                lots.hash(state);
            }
            Self::Null => state.write_u8(8),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Number(d) => write!(f, "{d}"),
            Self::Date(d) => write!(f, "{d}"),
            Self::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            Self::StringSet(s) => {
                for (i, item) in s.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            Self::Amount(a) => write!(f, "{a}"),
            Self::Position(p) => write!(f, "{p}"),
            Self::Inventory(inv) => write!(f, "{inv}"),
            Self::Null => Ok(()),
        }
    }
}
