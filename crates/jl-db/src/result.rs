//! Typed query results
//!
//! Engine values are normalized into a small set of [`Cell`] variants so
//! result sets from different queries can be compared independently of the
//! exact column types each query produced.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use duckdb::types::{TimeUnit, Value};
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

/// A single result value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Null,
    Bool(bool),
    Int(i64),
    /// Floating point and DECIMAL values
    Float(f64),
    Text(String),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
}

impl Cell {
    /// Numeric value of Int and Float cells
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Int(n) => Some(*n as f64),
            Cell::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Rank of the value class in the canonical ordering
    fn rank(&self) -> u8 {
        match self {
            Cell::Null => 0,
            Cell::Bool(_) => 1,
            Cell::Int(_) | Cell::Float(_) => 2,
            Cell::Text(_) => 3,
            Cell::Date(_) => 4,
            Cell::Time(_) => 5,
            Cell::Timestamp(_) => 6,
        }
    }

    /// Total order used to sort rows before comparison.
    ///
    /// NULL sorts first, numbers compare by value regardless of Int/Float,
    /// and values of different classes order by class.
    pub fn canonical_cmp(&self, other: &Cell) -> Ordering {
        match (self, other) {
            (Cell::Bool(a), Cell::Bool(b)) => a.cmp(b),
            (Cell::Int(a), Cell::Int(b)) => a.cmp(b),
            (Cell::Text(a), Cell::Text(b)) => a.cmp(b),
            (Cell::Date(a), Cell::Date(b)) => a.cmp(b),
            (Cell::Time(a), Cell::Time(b)) => a.cmp(b),
            (Cell::Timestamp(a), Cell::Timestamp(b)) => a.cmp(b),
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x.total_cmp(&y),
                _ => a.rank().cmp(&b.rank()),
            },
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => write!(f, "NULL"),
            Cell::Bool(b) => write!(f, "{}", b),
            Cell::Int(n) => write!(f, "{}", n),
            Cell::Float(x) => write!(f, "{}", x),
            Cell::Text(s) => write!(f, "'{}'", s),
            Cell::Date(d) => write!(f, "{}", d),
            Cell::Time(t) => write!(f, "{}", t),
            Cell::Timestamp(ts) => write!(f, "{}", ts),
        }
    }
}

/// Microseconds represented by `value` in `unit`
fn to_micros(unit: TimeUnit, value: i64) -> i64 {
    match unit {
        TimeUnit::Second => value.saturating_mul(1_000_000),
        TimeUnit::Millisecond => value.saturating_mul(1_000),
        TimeUnit::Microsecond => value,
        TimeUnit::Nanosecond => value / 1_000,
    }
}

fn timestamp_from_micros(micros: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp(
        micros.div_euclid(1_000_000),
        (micros.rem_euclid(1_000_000) * 1_000) as u32,
    )
    .map(|dt| dt.naive_utc())
}

fn time_from_micros(micros: i64) -> Option<NaiveTime> {
    let secs = u32::try_from(micros.div_euclid(1_000_000)).ok()?;
    let nanos = (micros.rem_euclid(1_000_000) * 1_000) as u32;
    NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos)
}

fn integer(n: i128) -> Cell {
    i64::try_from(n).map_or(Cell::Float(n as f64), Cell::Int)
}

impl From<Value> for Cell {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Cell::Null,
            Value::Boolean(b) => Cell::Bool(b),
            Value::TinyInt(n) => Cell::Int(n.into()),
            Value::SmallInt(n) => Cell::Int(n.into()),
            Value::Int(n) => Cell::Int(n.into()),
            Value::BigInt(n) => Cell::Int(n),
            Value::HugeInt(n) => integer(n),
            Value::UTinyInt(n) => Cell::Int(n.into()),
            Value::USmallInt(n) => Cell::Int(n.into()),
            Value::UInt(n) => Cell::Int(n.into()),
            Value::UBigInt(n) => integer(n.into()),
            Value::Float(x) => Cell::Float(x.into()),
            Value::Double(x) => Cell::Float(x),
            Value::Decimal(d) => {
                let text = d.to_string();
                text.parse::<f64>().map_or(Cell::Text(text), Cell::Float)
            }
            Value::Text(s) | Value::Enum(s) => Cell::Text(s),
            Value::Date32(days) => DateTime::from_timestamp(i64::from(days) * 86_400, 0)
                .map_or(Cell::Int(days.into()), |dt| Cell::Date(dt.date_naive())),
            Value::Time64(unit, v) => {
                time_from_micros(to_micros(unit, v)).map_or(Cell::Int(v), Cell::Time)
            }
            Value::Timestamp(unit, v) => {
                timestamp_from_micros(to_micros(unit, v)).map_or(Cell::Int(v), Cell::Timestamp)
            }
            other => Cell::Text(format!("{:?}", other)),
        }
    }
}

/// Rows returned by one query, in engine order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultSet {
    /// Output column names
    pub columns: Vec<String>,
    /// Row values, one `Vec` per row
    pub rows: Vec<Vec<Cell>>,
}

impl ResultSet {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self { columns, rows }
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column, matched case-insensitively
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.eq_ignore_ascii_case(name))
    }
}

/// Render a row as `(v1, v2, ...)`
pub fn format_row(row: &[Cell]) -> String {
    let values: Vec<String> = row.iter().map(|c| c.to_string()).collect();
    format!("({})", values.join(", "))
}

/// Compare two rows cell by cell with [`Cell::canonical_cmp`]
pub fn canonical_row_cmp(a: &[Cell], b: &[Cell]) -> Ordering {
    for (x, y) in a.iter().zip(b.iter()) {
        match x.canonical_cmp(y) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    a.len().cmp(&b.len())
}

#[cfg(test)]
#[path = "result_test.rs"]
mod tests;
