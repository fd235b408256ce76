//! Grid cell values.
//!
//! A cell carries no column type. Whatever the remote sheet hands back (text,
//! a number, a boolean) is kept as-is and only interpreted when it is mapped
//! onto a record field or compared by a filter.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::borrow::Cow;
use std::fmt;

/// One row of cells, in column order.
pub type Row = Vec<Cell>;

/// A header-first block of rows.
pub type Grid = Vec<Row>;

/// An untyped grid scalar.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    /// No value (JSON `null` on the wire)
    #[default]
    Empty,
    /// Boolean
    Bool(bool),
    /// Integral number
    Int(i64),
    /// Floating-point number
    Number(f64),
    /// Text
    Text(String),
}

impl Cell {
    /// Creates a text cell.
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    /// Returns true for [`Cell::Empty`].
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Canonical text form used for equality, substring tests and parsing.
    ///
    /// Whole floats below 1e21 print without a fractional part, so a number
    /// that travelled as `30.0` reads as `"30"`.
    pub fn to_text(&self) -> Cow<'_, str> {
        match self {
            Cell::Empty => Cow::Borrowed(""),
            Cell::Bool(b) => Cow::Borrowed(if *b { "true" } else { "false" }),
            Cell::Int(i) => Cow::Owned(i.to_string()),
            Cell::Number(n) => Cow::Owned(format_number(*n)),
            Cell::Text(s) => Cow::Borrowed(s),
        }
    }

    /// Converts the cell to a JSON value.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Cell::Empty => JsonValue::Null,
            Cell::Bool(b) => JsonValue::Bool(*b),
            Cell::Int(i) => JsonValue::from(*i),
            Cell::Number(n) => serde_json::Number::from_f64(*n)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Cell::Text(s) => JsonValue::String(s.clone()),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{:.0}", n)
    } else {
        n.to_string()
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl From<JsonValue> for Cell {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => Cell::Empty,
            JsonValue::Bool(b) => Cell::Bool(b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Cell::Int(i),
                None => n.as_f64().map(Cell::Number).unwrap_or(Cell::Empty),
            },
            JsonValue::String(s) => Cell::Text(s),
            other => Cell::Text(other.to_string()),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<&String> for Cell {
    fn from(value: &String) -> Self {
        Cell::Text(value.clone())
    }
}

impl From<bool> for Cell {
    fn from(value: bool) -> Self {
        Cell::Bool(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<f32> for Cell {
    fn from(value: f32) -> Self {
        Cell::Number(f64::from(value))
    }
}

macro_rules! int_into_cell {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Cell {
                fn from(value: $ty) -> Self {
                    Cell::Int(i64::from(value))
                }
            }
        )*
    };
}

int_into_cell!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for Cell {
    fn from(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(i) => Cell::Int(i),
            Err(_) => Cell::Number(value as f64),
        }
    }
}

impl From<usize> for Cell {
    fn from(value: usize) -> Self {
        Cell::from(value as u64)
    }
}

impl From<isize> for Cell {
    fn from(value: isize) -> Self {
        Cell::Int(value as i64)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Cell::Empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_whole_numbers_print_without_fraction() {
        assert_eq!(Cell::Number(30.0).to_text(), "30");
        assert_eq!(Cell::Number(-2.0).to_text(), "-2");
        assert_eq!(Cell::Number(1234567.0).to_text(), "1234567");
        assert_eq!(Cell::Number(1e20).to_text(), "100000000000000000000");
        assert_eq!(Cell::Int(30).to_text(), "30");
    }

    #[test]
    fn test_fractional_numbers_keep_fraction() {
        assert_eq!(Cell::Number(95.5).to_text(), "95.5");
        assert_eq!(Cell::Number(0.1).to_text(), "0.1");
    }

    #[test]
    fn test_text_and_bool_text() {
        assert_eq!(Cell::text("Alice").to_text(), "Alice");
        assert_eq!(Cell::Bool(true).to_text(), "true");
        assert_eq!(Cell::Empty.to_text(), "");
    }

    #[test]
    fn test_from_json() {
        assert_eq!(Cell::from(json!(null)), Cell::Empty);
        assert_eq!(Cell::from(json!(true)), Cell::Bool(true));
        assert_eq!(Cell::from(json!(3)), Cell::Int(3));
        assert_eq!(Cell::from(json!(2.5)), Cell::Number(2.5));
        assert_eq!(Cell::from(json!("x")), Cell::text("x"));
        assert_eq!(Cell::from(json!([1, 2])), Cell::text("[1,2]"));
    }

    #[test]
    fn test_wire_format_is_untagged() {
        let row: Row = serde_json::from_value(json!(["ID", 1, 2.5, false, null])).unwrap();
        assert_eq!(
            row,
            vec![
                Cell::text("ID"),
                Cell::Int(1),
                Cell::Number(2.5),
                Cell::Bool(false),
                Cell::Empty
            ]
        );
        assert_eq!(serde_json::to_value(&row).unwrap(), json!(["ID", 1, 2.5, false, null]));
    }

    #[test]
    fn test_primitive_conversions() {
        assert_eq!(Cell::from(7u8), Cell::Int(7));
        assert_eq!(Cell::from(u64::MAX), Cell::Number(u64::MAX as f64));
        assert_eq!(Cell::from(Some("a")), Cell::text("a"));
        assert_eq!(Cell::from(None::<i32>), Cell::Empty);
    }
}
