//! Conversion of fetched values into caller-owned Rust types.
//!
//! [`FromValue`] converts an already decoded [`OracleValue`]. [`FetchTarget`]
//! decodes raw column bytes straight into an existing value, reusing its
//! allocation where the target owns one.

use chrono::NaiveDateTime;

use crate::convert;
use crate::error::{Error, Result};

use super::column::Column;
use super::value::{OracleValue, RefCursor};

/// Conversion from a decoded column value.
pub trait FromValue: Sized {
    /// Convert `value` taken from `column`. NULL fails with `NullValue`
    /// unless the target can represent it.
    fn from_value(value: &OracleValue, column: &str) -> Result<Self>;
}

fn null_or_mismatch<T>(value: &OracleValue, column: &str, target: &str) -> Result<T> {
    if value.is_null() {
        return Err(Error::NullValue {
            column: column.to_string(),
        });
    }
    Err(Error::type_conversion(format!(
        "cannot convert {} value of column {} to {}",
        value.kind(),
        column,
        target
    )))
}

impl FromValue for OracleValue {
    fn from_value(value: &OracleValue, _column: &str) -> Result<Self> {
        Ok(value.clone())
    }
}

impl FromValue for String {
    fn from_value(value: &OracleValue, column: &str) -> Result<Self> {
        match value {
            OracleValue::String(s) | OracleValue::Number(s) => Ok(s.clone()),
            OracleValue::Integer(i) => Ok(i.to_string()),
            other => null_or_mismatch(other, column, "String"),
        }
    }
}

impl FromValue for i64 {
    fn from_value(value: &OracleValue, column: &str) -> Result<Self> {
        match value.to_i64() {
            Some(i) => Ok(i),
            None => null_or_mismatch(value, column, "i64"),
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: &OracleValue, column: &str) -> Result<Self> {
        match value.to_f64() {
            Some(f) => Ok(f),
            None => null_or_mismatch(value, column, "f64"),
        }
    }
}

impl FromValue for NaiveDateTime {
    fn from_value(value: &OracleValue, column: &str) -> Result<Self> {
        match value.as_datetime() {
            Some(dt) => Ok(dt),
            None => null_or_mismatch(value, column, "NaiveDateTime"),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &OracleValue, column: &str) -> Result<Self> {
        match value.as_raw() {
            Some(bytes) => Ok(bytes.to_vec()),
            None => null_or_mismatch(value, column, "Vec<u8>"),
        }
    }
}

impl FromValue for RefCursor {
    fn from_value(value: &OracleValue, column: &str) -> Result<Self> {
        match value.as_cursor() {
            Some(c) => Ok(c),
            None => null_or_mismatch(value, column, "RefCursor"),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &OracleValue, column: &str) -> Result<Self> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_value(value, column).map(Some)
        }
    }
}

/// A caller-owned destination for one column of a fetched row.
pub trait FetchTarget {
    /// Decode `raw` (NULL when `None`) from `column` into `self`.
    fn assign(&mut self, column: &Column, raw: Option<&[u8]>) -> Result<()>;
}

fn text<'a>(column: &Column, raw: &'a [u8]) -> Result<&'a str> {
    std::str::from_utf8(raw).map_err(|e| {
        Error::type_conversion(format!("column {} is not valid UTF-8: {}", column.name, e))
    })
}

fn decode_as<T: FromValue>(column: &Column, raw: Option<&[u8]>) -> Result<T> {
    let value = convert::decode_value(column.oracle_type_num, raw)?;
    T::from_value(&value, &column.name)
}

impl FetchTarget for OracleValue {
    fn assign(&mut self, column: &Column, raw: Option<&[u8]>) -> Result<()> {
        if let Some(bytes) = raw {
            match self {
                OracleValue::String(s) if column.data_type.is_text() => {
                    let decoded = text(column, bytes)?;
                    s.clear();
                    s.push_str(decoded);
                    return Ok(());
                }
                OracleValue::Raw(v) if column.data_type.is_binary() => {
                    v.clear();
                    v.extend_from_slice(bytes);
                    return Ok(());
                }
                _ => {}
            }
        }
        *self = convert::decode_value(column.oracle_type_num, raw)?;
        Ok(())
    }
}

impl FetchTarget for String {
    fn assign(&mut self, column: &Column, raw: Option<&[u8]>) -> Result<()> {
        match raw {
            Some(bytes) if column.data_type.is_text() => {
                let decoded = text(column, bytes)?;
                self.clear();
                self.push_str(decoded);
                Ok(())
            }
            _ => {
                *self = decode_as(column, raw)?;
                Ok(())
            }
        }
    }
}

impl FetchTarget for Vec<u8> {
    fn assign(&mut self, column: &Column, raw: Option<&[u8]>) -> Result<()> {
        match raw {
            Some(bytes) if column.data_type.is_binary() => {
                self.clear();
                self.extend_from_slice(bytes);
                Ok(())
            }
            _ => {
                *self = decode_as(column, raw)?;
                Ok(())
            }
        }
    }
}

impl FetchTarget for i64 {
    fn assign(&mut self, column: &Column, raw: Option<&[u8]>) -> Result<()> {
        *self = decode_as(column, raw)?;
        Ok(())
    }
}

impl FetchTarget for f64 {
    fn assign(&mut self, column: &Column, raw: Option<&[u8]>) -> Result<()> {
        *self = decode_as(column, raw)?;
        Ok(())
    }
}

impl FetchTarget for NaiveDateTime {
    fn assign(&mut self, column: &Column, raw: Option<&[u8]>) -> Result<()> {
        *self = decode_as(column, raw)?;
        Ok(())
    }
}

impl<T: FetchTarget + Default> FetchTarget for Option<T> {
    fn assign(&mut self, column: &Column, raw: Option<&[u8]>) -> Result<()> {
        match raw {
            None => *self = None,
            Some(_) => self.get_or_insert_with(T::default).assign(column, raw)?,
        }
        Ok(())
    }
}
