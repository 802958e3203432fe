//! Values exchanged with the server through binds and fetches.

use chrono::NaiveDateTime;
use std::fmt;

/// Handle to a server-side cursor returned by a REF CURSOR bind or column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RefCursor {
    /// Native cursor id.
    pub cursor_id: u32,
}

impl RefCursor {
    pub fn new(cursor_id: u32) -> Self {
        Self { cursor_id }
    }
}

/// A single bind or column value.
#[derive(Debug, Clone, PartialEq)]
pub enum OracleValue {
    /// NULL value.
    Null,
    /// String value (VARCHAR2, CHAR, LONG).
    String(String),
    /// Integral NUMBER that fits in i64.
    ///
    /// Every decoded NUMBER with no fractional part in i64 range comes back
    /// as `Integer`, however it was bound.
    Integer(i64),
    /// Any other NUMBER, as its exact decimal text.
    ///
    /// The server keeps the numeric value, not the spelling: decoding yields
    /// canonical text with no exponent, leading zeros or trailing fractional
    /// zeros, and integral values decode as [`OracleValue::Integer`]. So
    /// `Number("1.0")` reads back as `Integer(1)` and `Number("001.50")` as
    /// `Number("1.5")`.
    Number(String),
    /// BINARY_FLOAT / BINARY_DOUBLE value.
    Float(f64),
    /// DATE value, second precision.
    Date(NaiveDateTime),
    /// TIMESTAMP value, nanosecond precision.
    Timestamp(NaiveDateTime),
    /// Raw binary value (RAW, LONG RAW).
    Raw(Vec<u8>),
    /// Nested result set.
    Cursor(RefCursor),
}

impl OracleValue {
    /// Check if the value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, OracleValue::Null)
    }

    /// Short name of the value shape, used in conversion errors.
    pub fn kind(&self) -> &'static str {
        match self {
            OracleValue::Null => "null",
            OracleValue::String(_) => "string",
            OracleValue::Integer(_) => "integer",
            OracleValue::Number(_) => "number",
            OracleValue::Float(_) => "float",
            OracleValue::Date(_) => "date",
            OracleValue::Timestamp(_) => "timestamp",
            OracleValue::Raw(_) => "raw",
            OracleValue::Cursor(_) => "cursor",
        }
    }

    /// Try to get the value as a string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            OracleValue::String(s) => Some(s),
            OracleValue::Number(s) => Some(s),
            _ => None,
        }
    }

    /// Try to convert to i64.
    pub fn to_i64(&self) -> Option<i64> {
        match self {
            OracleValue::Integer(i) => Some(*i),
            OracleValue::Number(s) => s.parse().ok(),
            OracleValue::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }

    /// Try to convert to f64.
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            OracleValue::Integer(i) => Some(*i as f64),
            OracleValue::Number(s) => s.parse().ok(),
            OracleValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Try to get the value as a NaiveDateTime.
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            OracleValue::Date(dt) | OracleValue::Timestamp(dt) => Some(*dt),
            _ => None,
        }
    }

    /// Try to get the value as raw bytes.
    pub fn as_raw(&self) -> Option<&[u8]> {
        match self {
            OracleValue::Raw(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Try to get the value as a REF CURSOR handle.
    pub fn as_cursor(&self) -> Option<RefCursor> {
        match self {
            OracleValue::Cursor(c) => Some(*c),
            _ => None,
        }
    }
}

impl fmt::Display for OracleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OracleValue::Null => write!(f, "NULL"),
            OracleValue::String(s) => write!(f, "{}", s),
            OracleValue::Integer(i) => write!(f, "{}", i),
            OracleValue::Number(n) => write!(f, "{}", n),
            OracleValue::Float(v) => write!(f, "{}", v),
            OracleValue::Date(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            OracleValue::Timestamp(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S%.f")),
            OracleValue::Raw(bytes) => write!(f, "<RAW: {} bytes>", bytes.len()),
            OracleValue::Cursor(c) => write!(f, "<CURSOR: {}>", c.cursor_id),
        }
    }
}
