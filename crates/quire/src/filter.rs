//! Row predicates.
//!
//! A [`Filter`] is a `column / operator / value` triple evaluated against a
//! data row with the help of the header row. Equality and substring tests
//! work on the canonical text of both sides; ordering operators compare
//! numerically when both sides parse as numbers and fall back to byte-wise
//! string order otherwise.

use std::cmp::Ordering;
use std::fmt;

use crate::cell::Cell;
use crate::codec::column_index;

/// Comparison operator of a [`Filter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operator {
    /// `=` or `==`
    Eq,
    /// `!=`
    Ne,
    /// `>`
    Gt,
    /// `>=`
    Gte,
    /// `<`
    Lt,
    /// `<=`
    Lte,
    /// `contains`, case-insensitive substring
    Contains,
    /// `like`, same as `contains`
    Like,
    /// Anything else. Never matches.
    Unsupported(String),
}

impl Operator {
    pub fn as_str(&self) -> &str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Contains => "contains",
            Operator::Like => "like",
            Operator::Unsupported(op) => op,
        }
    }

    /// Applies the operator to a resolved cell and the filter value.
    pub fn apply(&self, cell: &Cell, value: &Cell) -> bool {
        match self {
            Operator::Eq => cell.to_text() == value.to_text(),
            Operator::Ne => cell.to_text() != value.to_text(),
            Operator::Gt => compare(cell, value) == Ordering::Greater,
            Operator::Gte => compare(cell, value) != Ordering::Less,
            Operator::Lt => compare(cell, value) == Ordering::Less,
            Operator::Lte => compare(cell, value) != Ordering::Greater,
            Operator::Contains | Operator::Like => cell
                .to_text()
                .to_lowercase()
                .contains(&value.to_text().to_lowercase()),
            Operator::Unsupported(_) => false,
        }
    }
}

impl From<&str> for Operator {
    fn from(op: &str) -> Self {
        match op {
            "=" | "==" => Operator::Eq,
            "!=" => Operator::Ne,
            ">" => Operator::Gt,
            ">=" => Operator::Gte,
            "<" => Operator::Lt,
            "<=" => Operator::Lte,
            "contains" => Operator::Contains,
            "like" => Operator::Like,
            other => Operator::Unsupported(other.to_string()),
        }
    }
}

impl From<String> for Operator {
    fn from(op: String) -> Self {
        Operator::from(op.as_str())
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single `column / operator / value` condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub operator: Operator,
    pub value: Cell,
}

impl Filter {
    pub fn new(
        column: impl Into<String>,
        operator: impl Into<Operator>,
        value: impl Into<Cell>,
    ) -> Self {
        Self {
            column: column.into(),
            operator: operator.into(),
            value: value.into(),
        }
    }

    /// Evaluates the filter against `row`.
    ///
    /// A column missing from `header`, or a row too short to hold it, is a
    /// non-match rather than an error.
    pub fn matches(&self, row: &[Cell], header: &[Cell]) -> bool {
        column_index(header, &self.column)
            .and_then(|i| row.get(i))
            .is_some_and(|cell| self.operator.apply(cell, &self.value))
    }
}

/// True when `row` satisfies every filter. No filters always match.
pub fn matches_all(filters: &[Filter], row: &[Cell], header: &[Cell]) -> bool {
    filters.iter().all(|f| f.matches(row, header))
}

/// Numeric-first ordering of two cells.
///
/// Both sides parse as `f64`: numeric order (NaN compares equal to
/// everything). Otherwise: byte-wise order of the canonical text.
pub fn compare(a: &Cell, b: &Cell) -> Ordering {
    let a = a.to_text();
    let b = b.to_text();

    if let (Ok(x), Ok(y)) = (a.parse::<f64>(), b.parse::<f64>()) {
        return x.partial_cmp(&y).unwrap_or(Ordering::Equal);
    }

    a.as_bytes().cmp(b.as_bytes())
}
