//! Oracle column data type with type-specific attributes.
//!
//! Nullability is a column property, not a type property.

use crate::error::{Error, Result};
use crate::native::constants::{
    ORA_TYPE_NUM_BINARY_DOUBLE, ORA_TYPE_NUM_BINARY_FLOAT, ORA_TYPE_NUM_CHAR,
    ORA_TYPE_NUM_CURSOR, ORA_TYPE_NUM_DATE, ORA_TYPE_NUM_LONG, ORA_TYPE_NUM_LONG_RAW,
    ORA_TYPE_NUM_NUMBER, ORA_TYPE_NUM_RAW, ORA_TYPE_NUM_TIMESTAMP, ORA_TYPE_NUM_VARCHAR,
};

/// Oracle data type of a result column.
#[derive(Debug, Clone, PartialEq)]
pub enum OracleType {
    /// VARCHAR2(max_size) - variable-length string.
    Varchar2 { max_size: u32 },
    /// CHAR(max_size) - fixed-length string.
    Char { max_size: u32 },
    /// LONG - legacy large text type.
    Long,
    /// NUMBER(precision, scale).
    Number { precision: i8, scale: i8 },
    /// BINARY_FLOAT - 32-bit IEEE float.
    BinaryFloat,
    /// BINARY_DOUBLE - 64-bit IEEE float.
    BinaryDouble,
    /// DATE - date and time to the second, no timezone.
    Date,
    /// TIMESTAMP(precision) - date and time with fractional seconds.
    Timestamp { precision: i8 },
    /// RAW(max_size) - binary data.
    Raw { max_size: u32 },
    /// LONG RAW - legacy large binary type.
    LongRaw,
    /// REF CURSOR - a nested result set.
    Cursor,
}

impl OracleType {
    /// Create from raw Oracle type number and metadata.
    ///
    /// Returns `Err(Error::UnsupportedType)` for types without a converter.
    pub fn from_raw(oracle_type: u8, precision: i8, scale: i8, max_size: u32) -> Result<Self> {
        match oracle_type {
            ORA_TYPE_NUM_VARCHAR => Ok(OracleType::Varchar2 { max_size }),
            ORA_TYPE_NUM_CHAR => Ok(OracleType::Char { max_size }),
            ORA_TYPE_NUM_LONG => Ok(OracleType::Long),
            ORA_TYPE_NUM_NUMBER => Ok(OracleType::Number { precision, scale }),
            ORA_TYPE_NUM_BINARY_FLOAT => Ok(OracleType::BinaryFloat),
            ORA_TYPE_NUM_BINARY_DOUBLE => Ok(OracleType::BinaryDouble),
            ORA_TYPE_NUM_DATE => Ok(OracleType::Date),
            ORA_TYPE_NUM_TIMESTAMP => Ok(OracleType::Timestamp { precision: scale }),
            ORA_TYPE_NUM_RAW => Ok(OracleType::Raw { max_size }),
            ORA_TYPE_NUM_LONG_RAW => Ok(OracleType::LongRaw),
            ORA_TYPE_NUM_CURSOR => Ok(OracleType::Cursor),
            _ => Err(Error::unsupported_type_num(oracle_type)),
        }
    }

    /// Get the Oracle type number.
    pub fn type_num(&self) -> u8 {
        match self {
            OracleType::Varchar2 { .. } => ORA_TYPE_NUM_VARCHAR,
            OracleType::Char { .. } => ORA_TYPE_NUM_CHAR,
            OracleType::Long => ORA_TYPE_NUM_LONG,
            OracleType::Number { .. } => ORA_TYPE_NUM_NUMBER,
            OracleType::BinaryFloat => ORA_TYPE_NUM_BINARY_FLOAT,
            OracleType::BinaryDouble => ORA_TYPE_NUM_BINARY_DOUBLE,
            OracleType::Date => ORA_TYPE_NUM_DATE,
            OracleType::Timestamp { .. } => ORA_TYPE_NUM_TIMESTAMP,
            OracleType::Raw { .. } => ORA_TYPE_NUM_RAW,
            OracleType::LongRaw => ORA_TYPE_NUM_LONG_RAW,
            OracleType::Cursor => ORA_TYPE_NUM_CURSOR,
        }
    }

    /// Get precision (for Number types, 0 otherwise).
    pub fn precision(&self) -> i8 {
        match self {
            OracleType::Number { precision, .. } => *precision,
            OracleType::Timestamp { precision } => *precision,
            _ => 0,
        }
    }

    /// Get scale (for Number types, 0 otherwise).
    pub fn scale(&self) -> i8 {
        match self {
            OracleType::Number { scale, .. } => *scale,
            _ => 0,
        }
    }

    /// Get max_size (for sized types, 0 otherwise).
    pub fn max_size(&self) -> u32 {
        match self {
            OracleType::Varchar2 { max_size }
            | OracleType::Char { max_size }
            | OracleType::Raw { max_size } => *max_size,
            _ => 0,
        }
    }

    /// Whether values of this type decode to strings.
    pub fn is_text(&self) -> bool {
        matches!(
            self,
            OracleType::Varchar2 { .. } | OracleType::Char { .. } | OracleType::Long
        )
    }

    /// Whether values of this type decode to raw bytes.
    pub fn is_binary(&self) -> bool {
        matches!(self, OracleType::Raw { .. } | OracleType::LongRaw)
    }
}

impl std::fmt::Display for OracleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OracleType::Varchar2 { max_size } => write!(f, "VARCHAR2({})", max_size),
            OracleType::Char { max_size } => write!(f, "CHAR({})", max_size),
            OracleType::Long => write!(f, "LONG"),
            OracleType::Number { precision, scale } => {
                if *precision == 0 && *scale == 0 {
                    write!(f, "NUMBER")
                } else if *scale == 0 {
                    write!(f, "NUMBER({})", precision)
                } else {
                    write!(f, "NUMBER({},{})", precision, scale)
                }
            }
            OracleType::BinaryFloat => write!(f, "BINARY_FLOAT"),
            OracleType::BinaryDouble => write!(f, "BINARY_DOUBLE"),
            OracleType::Date => write!(f, "DATE"),
            OracleType::Timestamp { precision } => write!(f, "TIMESTAMP({})", precision),
            OracleType::Raw { max_size } => write!(f, "RAW({})", max_size),
            OracleType::LongRaw => write!(f, "LONG RAW"),
            OracleType::Cursor => write!(f, "REF CURSOR"),
        }
    }
}
