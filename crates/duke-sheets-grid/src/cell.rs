//! Cell values handed to grid sinks

use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// A single value written into a grid cell
#[derive(Debug, Clone, PartialEq, Default)]
pub enum GridCell {
    /// No value
    #[default]
    Empty,
    /// Numeric value
    Number(f64),
    /// Text value
    Text(String),
    /// Boolean value
    Boolean(bool),
}

impl GridCell {
    /// Create a text cell
    pub fn text<S: Into<String>>(s: S) -> Self {
        GridCell::Text(s.into())
    }

    /// Detect the type of a raw text field.
    ///
    /// Blank fields become [`GridCell::Empty`], `true`/`false` (any case)
    /// become booleans, anything `f64` parses becomes a number.
    pub fn detect(field: &str) -> Self {
        let trimmed = field.trim();

        if trimmed.is_empty() {
            return GridCell::Empty;
        }

        if trimmed.eq_ignore_ascii_case("true") {
            return GridCell::Boolean(true);
        }
        if trimmed.eq_ignore_ascii_case("false") {
            return GridCell::Boolean(false);
        }

        if let Ok(n) = trimmed.parse::<f64>() {
            if n.is_finite() {
                return GridCell::Number(n);
            }
        }

        GridCell::Text(field.to_string())
    }

    /// Check if the cell is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, GridCell::Empty)
    }

    /// Get as number if this is a numeric cell
    pub fn as_number(&self) -> Option<f64> {
        match self {
            GridCell::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for GridCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridCell::Empty => Ok(()),
            GridCell::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            GridCell::Text(s) => f.write_str(s),
            GridCell::Boolean(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
        }
    }
}

impl From<f64> for GridCell {
    fn from(n: f64) -> Self {
        GridCell::Number(n)
    }
}

impl From<i64> for GridCell {
    fn from(n: i64) -> Self {
        GridCell::Number(n as f64)
    }
}

impl From<i32> for GridCell {
    fn from(n: i32) -> Self {
        GridCell::Number(n as f64)
    }
}

impl From<u32> for GridCell {
    fn from(n: u32) -> Self {
        GridCell::Number(n as f64)
    }
}

impl From<usize> for GridCell {
    fn from(n: usize) -> Self {
        GridCell::Number(n as f64)
    }
}

impl From<bool> for GridCell {
    fn from(b: bool) -> Self {
        GridCell::Boolean(b)
    }
}

impl From<&str> for GridCell {
    fn from(s: &str) -> Self {
        GridCell::Text(s.to_string())
    }
}

impl From<String> for GridCell {
    fn from(s: String) -> Self {
        GridCell::Text(s)
    }
}

impl<T: Into<GridCell>> From<Option<T>> for GridCell {
    fn from(value: Option<T>) -> Self {
        value.map_or(GridCell::Empty, Into::into)
    }
}

/// Rows whose values can be looked up by field name
pub trait RowFields {
    /// Value of the named field, or `None` if the row has no such field
    fn field(&self, name: &str) -> Option<GridCell>;
}

impl<V: Clone + Into<GridCell>> RowFields for HashMap<String, V> {
    fn field(&self, name: &str) -> Option<GridCell> {
        self.get(name).cloned().map(Into::into)
    }
}

impl<V: Clone + Into<GridCell>> RowFields for BTreeMap<String, V> {
    fn field(&self, name: &str) -> Option<GridCell> {
        self.get(name).cloned().map(Into::into)
    }
}
