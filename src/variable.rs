//! Bind variables.
//!
//! A [`Variable`] is a typed, reusable bind slot owning the native buffer
//! for one placeholder. Values pass through the converter registry entry of
//! the variable's type on the way in and out. The cursor owns its variables;
//! callers refer to them through a copyable [`VarRef`].

use bytes::BytesMut;
use chrono::NaiveDateTime;
use tracing::debug;

use crate::config::CursorConfig;
use crate::convert;
use crate::error::{Error, Result};
use crate::native::constants::*;
use crate::native::{BindDirection, NativeBind};
use crate::types::{OracleValue, RefCursor};

/// Logical type of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarType {
    /// Variable-length string (VARCHAR2).
    String,
    /// Fixed-length string (CHAR).
    FixedChar,
    /// Integer or decimal (NUMBER).
    Number,
    /// IEEE double (BINARY_DOUBLE).
    Float,
    /// DATE, second precision.
    Date,
    /// TIMESTAMP, nanosecond precision.
    Timestamp,
    /// RAW bytes.
    Binary,
    /// REF CURSOR.
    Cursor,
}

impl VarType {
    pub const ALL: [VarType; 8] = [
        VarType::String,
        VarType::FixedChar,
        VarType::Number,
        VarType::Float,
        VarType::Date,
        VarType::Timestamp,
        VarType::Binary,
        VarType::Cursor,
    ];

    /// Native type number the variable is bound as.
    pub fn type_num(self) -> u8 {
        match self {
            VarType::String => ORA_TYPE_NUM_VARCHAR,
            VarType::FixedChar => ORA_TYPE_NUM_CHAR,
            VarType::Number => ORA_TYPE_NUM_NUMBER,
            VarType::Float => ORA_TYPE_NUM_BINARY_DOUBLE,
            VarType::Date => ORA_TYPE_NUM_DATE,
            VarType::Timestamp => ORA_TYPE_NUM_TIMESTAMP,
            VarType::Binary => ORA_TYPE_NUM_RAW,
            VarType::Cursor => ORA_TYPE_NUM_CURSOR,
        }
    }

    /// Infer the variable type from the shape of a value.
    ///
    /// NULL carries no shape and is rejected.
    pub fn infer(value: &OracleValue) -> Result<Self> {
        match value {
            OracleValue::String(_) => Ok(VarType::String),
            OracleValue::Integer(_) | OracleValue::Number(_) => Ok(VarType::Number),
            OracleValue::Float(_) => Ok(VarType::Float),
            OracleValue::Date(_) => Ok(VarType::Date),
            OracleValue::Timestamp(_) => Ok(VarType::Timestamp),
            OracleValue::Raw(_) => Ok(VarType::Binary),
            OracleValue::Cursor(_) => Ok(VarType::Cursor),
            OracleValue::Null => Err(Error::unsupported_type(
                "NULL has no type; create a typed variable instead",
            )),
        }
    }

    fn is_variable_length(self) -> bool {
        matches!(self, VarType::String | VarType::FixedChar | VarType::Binary)
    }

    fn fixed_size(self) -> usize {
        match self {
            VarType::Number => NUMBER_BUFFER_SIZE,
            VarType::Float => BINARY_DOUBLE_BUFFER_SIZE,
            VarType::Date => DATE_BUFFER_SIZE,
            VarType::Timestamp => TIMESTAMP_BUFFER_SIZE,
            VarType::Cursor => CURSOR_BUFFER_SIZE,
            VarType::String | VarType::FixedChar | VarType::Binary => 0,
        }
    }
}

/// A typed bind slot and its native buffer.
#[derive(Debug, Clone)]
pub struct Variable {
    var_type: VarType,
    direction: BindDirection,
    data: BytesMut,
    is_null: bool,
    capacity: usize,
    resizable: bool,
    max_capacity: usize,
}

impl Variable {
    /// Create a variable holding `value`, sized to fit it.
    ///
    /// String and binary variables created this way are resizable up to
    /// `config.max_string_size`.
    pub fn from_value(
        value: &OracleValue,
        direction: BindDirection,
        config: &CursorConfig,
    ) -> Result<Self> {
        let var_type = VarType::infer(value)?;
        let mut var = Self {
            var_type,
            direction,
            data: BytesMut::new(),
            is_null: true,
            capacity: var_type.fixed_size(),
            resizable: matches!(var_type, VarType::String | VarType::Binary),
            max_capacity: config.max_string_size,
        };
        var.set_value(value)?;
        Ok(var)
    }

    /// Create a NULL variable of a given type.
    ///
    /// `size` is the buffer capacity for string and binary types; 0 selects
    /// `config.default_string_size`. Fixed-size types ignore it.
    pub fn typed(var_type: VarType, size: usize, config: &CursorConfig) -> Self {
        let capacity = match (var_type.is_variable_length(), size) {
            (true, 0) => config.default_string_size,
            (true, n) => n,
            (false, _) => var_type.fixed_size(),
        };
        Self {
            var_type,
            direction: BindDirection::InputOutput,
            data: BytesMut::with_capacity(capacity),
            is_null: true,
            capacity,
            resizable: false,
            max_capacity: capacity,
        }
    }

    /// NULL bound without a type: an empty VARCHAR2 that can grow.
    pub(crate) fn untyped_null(direction: BindDirection, config: &CursorConfig) -> Self {
        Self {
            var_type: VarType::String,
            direction,
            data: BytesMut::new(),
            is_null: true,
            capacity: 0,
            resizable: true,
            max_capacity: config.max_string_size,
        }
    }

    /// Set the bind direction.
    pub fn with_direction(mut self, direction: BindDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn var_type(&self) -> VarType {
        self.var_type
    }

    pub fn direction(&self) -> BindDirection {
        self.direction
    }

    /// Allocated buffer size in bytes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_resizable(&self) -> bool {
        self.resizable
    }

    pub fn is_null(&self) -> bool {
        self.is_null
    }

    /// Encoded value, `None` when NULL.
    pub fn raw(&self) -> Option<&[u8]> {
        if self.is_null {
            None
        } else {
            Some(&self.data)
        }
    }

    #[track_caller]
    fn ensure_capacity(&mut self, needed: usize) -> Result<()> {
        if needed <= self.capacity {
            return Ok(());
        }
        if self.resizable && needed <= self.max_capacity {
            debug!(
                var_type = ?self.var_type,
                from = self.capacity,
                to = needed,
                "resizing variable buffer"
            );
            self.capacity = needed;
            return Ok(());
        }
        Err(Error::buffer_too_small(needed, self.capacity))
    }

    /// Encode and store a value.
    #[track_caller]
    pub fn set_value(&mut self, value: &OracleValue) -> Result<()> {
        match convert::encode_value(self.var_type.type_num(), value)? {
            None => {
                self.is_null = true;
                self.data.clear();
            }
            Some(encoded) => {
                self.ensure_capacity(encoded.len())?;
                self.data = encoded;
                self.is_null = false;
            }
        }
        Ok(())
    }

    /// Decode the stored value.
    pub fn value(&self) -> Result<OracleValue> {
        convert::decode_value(self.var_type.type_num(), self.raw())
    }

    /// Copy raw native bytes (from a fetched column) into the buffer.
    #[track_caller]
    pub fn store_raw(&mut self, raw: Option<&[u8]>) -> Result<()> {
        match raw {
            None => {
                self.is_null = true;
                self.data.clear();
            }
            Some(bytes) => {
                self.ensure_capacity(bytes.len())?;
                self.data.clear();
                self.data.extend_from_slice(bytes);
                self.is_null = false;
            }
        }
        Ok(())
    }

    /// Native bind buffer for placeholder `name`.
    pub fn to_native_bind(&self, name: &str) -> NativeBind {
        NativeBind {
            name: name.to_string(),
            ora_type_num: self.var_type.type_num(),
            direction: self.direction,
            capacity: self.capacity,
            data: self.data.clone(),
            is_null: self.is_null,
            truncated: false,
        }
    }

    /// Take back the value the server wrote into an output bind.
    pub fn accept_output(&mut self, bind: &NativeBind) {
        if !self.direction.is_output() {
            return;
        }
        self.is_null = bind.is_null;
        self.data.clear();
        if !bind.is_null {
            self.data.extend_from_slice(&bind.data);
        }
    }
}

/// Handle to a variable owned by a cursor.
///
/// A handle goes stale once its variable is released; a later variable in
/// the same slot carries a different generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VarRef {
    pub(crate) cursor: u64,
    pub(crate) slot: usize,
    pub(crate) generation: u64,
}

/// A value or variable supplied for one placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum Bind {
    /// Bound through an implicit variable the cursor manages.
    Value(OracleValue),
    /// Bound through a caller-created variable.
    Var(VarRef),
}

impl From<OracleValue> for Bind {
    fn from(value: OracleValue) -> Self {
        Bind::Value(value)
    }
}

impl From<VarRef> for Bind {
    fn from(var: VarRef) -> Self {
        Bind::Var(var)
    }
}

impl From<&VarRef> for Bind {
    fn from(var: &VarRef) -> Self {
        Bind::Var(*var)
    }
}

impl From<i64> for Bind {
    fn from(v: i64) -> Self {
        Bind::Value(OracleValue::Integer(v))
    }
}

impl From<i32> for Bind {
    fn from(v: i32) -> Self {
        Bind::Value(OracleValue::Integer(v as i64))
    }
}

impl From<f64> for Bind {
    fn from(v: f64) -> Self {
        Bind::Value(OracleValue::Float(v))
    }
}

impl From<&str> for Bind {
    fn from(v: &str) -> Self {
        Bind::Value(OracleValue::String(v.to_string()))
    }
}

impl From<String> for Bind {
    fn from(v: String) -> Self {
        Bind::Value(OracleValue::String(v))
    }
}

impl From<NaiveDateTime> for Bind {
    fn from(v: NaiveDateTime) -> Self {
        Bind::Value(OracleValue::Timestamp(v))
    }
}

impl From<Vec<u8>> for Bind {
    fn from(v: Vec<u8>) -> Self {
        Bind::Value(OracleValue::Raw(v))
    }
}

impl From<RefCursor> for Bind {
    fn from(v: RefCursor) -> Self {
        Bind::Value(OracleValue::Cursor(v))
    }
}

impl<T: Into<Bind>> From<Option<T>> for Bind {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Bind::Value(OracleValue::Null))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> CursorConfig {
        CursorConfig::default()
    }

    #[test]
    fn test_infer_var_type() {
        assert_eq!(
            VarType::infer(&OracleValue::String("a".into())).unwrap(),
            VarType::String
        );
        assert_eq!(VarType::infer(&OracleValue::Integer(1)).unwrap(), VarType::Number);
        assert_eq!(VarType::infer(&OracleValue::Float(1.0)).unwrap(), VarType::Float);
        assert_eq!(VarType::infer(&OracleValue::Raw(vec![])).unwrap(), VarType::Binary);
        assert!(matches!(
            VarType::infer(&OracleValue::Null),
            Err(Error::UnsupportedType { .. })
        ));
    }

    #[test]
    fn test_integer_variable_round_trip() {
        let var = Variable::from_value(
            &OracleValue::Integer(1234567890123),
            BindDirection::Input,
            &config(),
        )
        .unwrap();
        assert_eq!(var.raw(), Some(&[0xC7, 0x02, 0x18, 0x2E, 0x44, 0x5A, 0x02, 0x18][..]));
        assert_eq!(var.value().unwrap(), OracleValue::Integer(1234567890123));
    }

    #[test]
    fn test_set_null() {
        let mut var =
            Variable::from_value(&OracleValue::Integer(5), BindDirection::Input, &config())
                .unwrap();
        var.set_value(&OracleValue::Null).unwrap();
        assert!(var.is_null());
        assert_eq!(var.value().unwrap(), OracleValue::Null);
    }

    #[test]
    fn test_typed_variable_buffer_too_small() {
        let mut var = Variable::typed(VarType::String, 5, &config());
        assert!(var.is_null());
        var.set_value(&OracleValue::String("12345".into())).unwrap();
        let (result, line) = (var.set_value(&OracleValue::String("123456".into())), line!());
        match result {
            Err(Error::BufferTooSmall {
                needed,
                available,
                location,
            }) => {
                assert_eq!(needed, 6);
                assert_eq!(available, 5);
                assert_eq!(location.line(), line);
            }
            other => panic!("Expected BufferTooSmall, got {:?}", other),
        }
        assert_eq!(var.value().unwrap(), OracleValue::String("12345".into()));
    }

    #[test]
    fn test_implicit_string_variable_grows() {
        let mut var =
            Variable::from_value(&OracleValue::String("ab".into()), BindDirection::Input, &config())
                .unwrap();
        assert!(var.is_resizable());
        assert_eq!(var.capacity(), 2);
        var.set_value(&OracleValue::String("abcdef".into())).unwrap();
        assert_eq!(var.capacity(), 6);

        let huge = OracleValue::String("x".repeat(MAX_STRING_SIZE + 1));
        assert!(matches!(
            var.set_value(&huge),
            Err(Error::BufferTooSmall { .. })
        ));
    }

    #[test]
    fn test_typed_size_zero_uses_default() {
        let var = Variable::typed(VarType::Binary, 0, &config().with_default_string_size(64));
        assert_eq!(var.capacity(), 64);
        let var = Variable::typed(VarType::Date, 1000, &config());
        assert_eq!(var.capacity(), DATE_BUFFER_SIZE);
    }

    #[test]
    fn test_type_mismatch() {
        let mut var = Variable::typed(VarType::Date, 0, &config());
        assert!(matches!(
            var.set_value(&OracleValue::String("2024-01-01".into())),
            Err(Error::TypeConversion { .. })
        ));
    }

    #[test]
    fn test_accept_output_respects_direction() {
        let mut input =
            Variable::from_value(&OracleValue::Integer(1), BindDirection::Input, &config())
                .unwrap();
        let mut output = Variable::typed(VarType::Number, 0, &config());

        let mut bind = output.to_native_bind("1");
        bind.set_output(Some([0xC1, 0x03].as_slice())).unwrap();
        input.accept_output(&bind);
        output.accept_output(&bind);

        assert_eq!(input.value().unwrap(), OracleValue::Integer(1));
        assert_eq!(output.value().unwrap(), OracleValue::Integer(2));
    }

    #[test]
    fn test_bind_conversions() {
        assert_eq!(Bind::from(7), Bind::Value(OracleValue::Integer(7)));
        assert_eq!(Bind::from("a"), Bind::Value(OracleValue::String("a".into())));
        assert_eq!(Bind::from(None::<i64>), Bind::Value(OracleValue::Null));
        assert_eq!(Bind::from(Some(2.5)), Bind::Value(OracleValue::Float(2.5)));
    }
}
