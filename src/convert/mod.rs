//! Converter registry.
//!
//! A static table mapping native type numbers to the functions that turn
//! native bytes into [`OracleValue`]s and back. The table is read-only; the
//! set of supported types is fixed at compile time.

pub mod binary;
pub mod date;
pub mod number;

use bytes::{BufMut, BytesMut};

use crate::error::{Error, Result};
use crate::native::constants::*;
use crate::types::{OracleValue, RefCursor};
use crate::variable::VarType;

/// Decodes non-NULL native bytes.
pub type DecodeFn = fn(&[u8]) -> Result<OracleValue>;

/// Encodes a non-NULL value, appending to the buffer.
pub type EncodeFn = fn(&OracleValue, &mut BytesMut) -> Result<()>;

/// One registry entry.
pub struct ConverterEntry {
    /// Native type number.
    pub type_num: u8,
    /// Oracle type name.
    pub name: &'static str,
    /// Logical variable type used when binding values of this type.
    pub var_type: VarType,
    /// Default buffer size in bytes.
    pub buffer_size: usize,
    pub decode: DecodeFn,
    pub encode: EncodeFn,
}

impl std::fmt::Debug for ConverterEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConverterEntry")
            .field("type_num", &self.type_num)
            .field("name", &self.name)
            .field("var_type", &self.var_type)
            .field("buffer_size", &self.buffer_size)
            .finish()
    }
}

static REGISTRY: [ConverterEntry; 11] = [
    ConverterEntry {
        type_num: ORA_TYPE_NUM_VARCHAR,
        name: "VARCHAR2",
        var_type: VarType::String,
        buffer_size: DEFAULT_STRING_SIZE,
        decode: decode_string,
        encode: encode_string,
    },
    ConverterEntry {
        type_num: ORA_TYPE_NUM_NUMBER,
        name: "NUMBER",
        var_type: VarType::Number,
        buffer_size: NUMBER_BUFFER_SIZE,
        decode: decode_number,
        encode: encode_number,
    },
    ConverterEntry {
        type_num: ORA_TYPE_NUM_LONG,
        name: "LONG",
        var_type: VarType::String,
        buffer_size: MAX_STRING_SIZE,
        decode: decode_string,
        encode: encode_string,
    },
    ConverterEntry {
        type_num: ORA_TYPE_NUM_DATE,
        name: "DATE",
        var_type: VarType::Date,
        buffer_size: DATE_BUFFER_SIZE,
        decode: decode_date,
        encode: encode_date,
    },
    ConverterEntry {
        type_num: ORA_TYPE_NUM_RAW,
        name: "RAW",
        var_type: VarType::Binary,
        buffer_size: DEFAULT_STRING_SIZE,
        decode: decode_raw,
        encode: encode_raw,
    },
    ConverterEntry {
        type_num: ORA_TYPE_NUM_LONG_RAW,
        name: "LONG RAW",
        var_type: VarType::Binary,
        buffer_size: MAX_STRING_SIZE,
        decode: decode_raw,
        encode: encode_raw,
    },
    ConverterEntry {
        type_num: ORA_TYPE_NUM_CHAR,
        name: "CHAR",
        var_type: VarType::FixedChar,
        buffer_size: DEFAULT_STRING_SIZE,
        decode: decode_string,
        encode: encode_string,
    },
    ConverterEntry {
        type_num: ORA_TYPE_NUM_BINARY_FLOAT,
        name: "BINARY_FLOAT",
        var_type: VarType::Float,
        buffer_size: BINARY_FLOAT_BUFFER_SIZE,
        decode: decode_binary_float,
        encode: encode_binary_float,
    },
    ConverterEntry {
        type_num: ORA_TYPE_NUM_BINARY_DOUBLE,
        name: "BINARY_DOUBLE",
        var_type: VarType::Float,
        buffer_size: BINARY_DOUBLE_BUFFER_SIZE,
        decode: decode_binary_double,
        encode: encode_binary_double,
    },
    ConverterEntry {
        type_num: ORA_TYPE_NUM_CURSOR,
        name: "REF CURSOR",
        var_type: VarType::Cursor,
        buffer_size: CURSOR_BUFFER_SIZE,
        decode: decode_cursor,
        encode: encode_cursor,
    },
    ConverterEntry {
        type_num: ORA_TYPE_NUM_TIMESTAMP,
        name: "TIMESTAMP",
        var_type: VarType::Timestamp,
        buffer_size: TIMESTAMP_BUFFER_SIZE,
        decode: decode_timestamp,
        encode: encode_timestamp,
    },
];

/// All registered converters.
pub fn entries() -> &'static [ConverterEntry] {
    &REGISTRY
}

/// Find the converter for a native type number.
pub fn lookup(type_num: u8) -> Result<&'static ConverterEntry> {
    REGISTRY
        .iter()
        .find(|e| e.type_num == type_num)
        .ok_or_else(|| Error::unsupported_type_num(type_num))
}

/// Decode a native cell; `None` is NULL.
pub fn decode_value(type_num: u8, raw: Option<&[u8]>) -> Result<OracleValue> {
    let entry = lookup(type_num)?;
    match raw {
        None => Ok(OracleValue::Null),
        Some(bytes) => (entry.decode)(bytes),
    }
}

/// Encode a value for a native type; `Ok(None)` is NULL.
pub fn encode_value(type_num: u8, value: &OracleValue) -> Result<Option<BytesMut>> {
    let entry = lookup(type_num)?;
    if value.is_null() {
        return Ok(None);
    }
    let mut buf = BytesMut::with_capacity(entry.buffer_size.min(64));
    (entry.encode)(value, &mut buf)?;
    Ok(Some(buf))
}

fn mismatch(value: &OracleValue, target: &str) -> Error {
    Error::type_conversion(format!("cannot bind {} value as {}", value.kind(), target))
}

fn decode_string(data: &[u8]) -> Result<OracleValue> {
    String::from_utf8(data.to_vec())
        .map(OracleValue::String)
        .map_err(|e| Error::type_conversion(format!("string is not valid UTF-8: {}", e)))
}

fn encode_string(value: &OracleValue, buf: &mut BytesMut) -> Result<()> {
    match value {
        OracleValue::String(s) => {
            buf.put_slice(s.as_bytes());
            Ok(())
        }
        other => Err(mismatch(other, "string")),
    }
}

fn decode_number(data: &[u8]) -> Result<OracleValue> {
    let text = number::decode_number(data)?;
    if !text.contains(['.', 'e']) {
        if let Ok(i) = text.parse::<i64>() {
            return Ok(OracleValue::Integer(i));
        }
    }
    Ok(OracleValue::Number(text))
}

fn encode_number(value: &OracleValue, buf: &mut BytesMut) -> Result<()> {
    match value {
        OracleValue::Integer(i) => number::encode_number(&i.to_string(), buf),
        OracleValue::Number(s) => number::encode_number(s, buf),
        OracleValue::Float(f) if f.is_finite() => number::encode_number(&f.to_string(), buf),
        OracleValue::Float(f) => Err(Error::type_conversion(format!(
            "{} has no NUMBER representation",
            f
        ))),
        other => Err(mismatch(other, "number")),
    }
}

fn float_of(value: &OracleValue) -> Result<f64> {
    match value {
        OracleValue::Float(f) => Ok(*f),
        OracleValue::Integer(i) => Ok(*i as f64),
        other => Err(mismatch(other, "float")),
    }
}

fn decode_binary_float(data: &[u8]) -> Result<OracleValue> {
    Ok(OracleValue::Float(binary::decode_binary_float(data)? as f64))
}

fn encode_binary_float(value: &OracleValue, buf: &mut BytesMut) -> Result<()> {
    binary::encode_binary_float(float_of(value)? as f32, buf);
    Ok(())
}

fn decode_binary_double(data: &[u8]) -> Result<OracleValue> {
    Ok(OracleValue::Float(binary::decode_binary_double(data)?))
}

fn encode_binary_double(value: &OracleValue, buf: &mut BytesMut) -> Result<()> {
    binary::encode_binary_double(float_of(value)?, buf);
    Ok(())
}

fn decode_date(data: &[u8]) -> Result<OracleValue> {
    Ok(OracleValue::Date(date::decode_date(data)?))
}

fn encode_date(value: &OracleValue, buf: &mut BytesMut) -> Result<()> {
    match value.as_datetime() {
        Some(dt) => date::encode_date(&dt, buf),
        None => Err(mismatch(value, "date")),
    }
}

fn decode_timestamp(data: &[u8]) -> Result<OracleValue> {
    Ok(OracleValue::Timestamp(date::decode_timestamp(data)?))
}

fn encode_timestamp(value: &OracleValue, buf: &mut BytesMut) -> Result<()> {
    match value.as_datetime() {
        Some(dt) => date::encode_timestamp(&dt, buf),
        None => Err(mismatch(value, "timestamp")),
    }
}

fn decode_raw(data: &[u8]) -> Result<OracleValue> {
    Ok(OracleValue::Raw(data.to_vec()))
}

fn encode_raw(value: &OracleValue, buf: &mut BytesMut) -> Result<()> {
    match value {
        OracleValue::Raw(bytes) => {
            buf.put_slice(bytes);
            Ok(())
        }
        other => Err(mismatch(other, "raw")),
    }
}

fn decode_cursor(data: &[u8]) -> Result<OracleValue> {
    Ok(OracleValue::Cursor(RefCursor::new(binary::decode_cursor_id(data)?)))
}

fn encode_cursor(value: &OracleValue, buf: &mut BytesMut) -> Result<()> {
    match value {
        OracleValue::Cursor(c) => {
            binary::encode_cursor_id(c.cursor_id, buf);
            Ok(())
        }
        other => Err(mismatch(other, "cursor")),
    }
}
