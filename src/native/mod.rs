//! Interface to the native client library.
//!
//! The cursor layer never talks to the server directly. A native client
//! implements [`NativeSession`] and [`NativeStatement`], owning the wire
//! protocol, the transport and the statement handles. The cursor hands it
//! positional bind buffers and receives column metadata and raw row cells.
//!
//! [`memory::MemoryClient`] is an in-process implementation used for tests.

pub mod constants;
pub mod memory;

use std::fmt;

use bytes::{Bytes, BytesMut};

use crate::statement::StatementType;
use crate::types::ColumnMetadata;
use constants::*;

/// Result type for native client calls.
pub type NativeResult<T> = std::result::Result<T, NativeError>;

/// One fetched row: a cell per column, `None` for NULL.
pub type NativeRow = Vec<Option<Bytes>>;

/// Error reported by the native client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeError {
    /// Oracle error number (the `nnnnn` in `ORA-nnnnn`).
    pub code: u32,
    /// Error message text.
    pub message: String,
}

impl NativeError {
    pub fn new(code: u32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for NativeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ORA-{:05}: {}", self.code, self.message)
    }
}

impl std::error::Error for NativeError {}

/// Direction of a bind parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindDirection {
    /// Value flows to the server only.
    Input,
    /// Value is produced by the server.
    Output,
    /// Value flows both ways.
    InputOutput,
}

impl BindDirection {
    /// Raw direction code as used on the wire.
    pub fn as_raw(self) -> u8 {
        match self {
            BindDirection::Input => TNS_BIND_DIR_INPUT,
            BindDirection::Output => TNS_BIND_DIR_OUTPUT,
            BindDirection::InputOutput => TNS_BIND_DIR_INPUT_OUTPUT,
        }
    }

    /// Whether the server may write into this bind.
    pub fn is_output(self) -> bool {
        !matches!(self, BindDirection::Input)
    }
}

/// A positional bind buffer handed to [`NativeStatement::execute`].
#[derive(Debug, Clone)]
pub struct NativeBind {
    /// Placeholder label (without the leading colon).
    pub name: String,
    /// Oracle type number of the buffer contents.
    pub ora_type_num: u8,
    /// Bind direction.
    pub direction: BindDirection,
    /// Allocated buffer size in bytes.
    pub capacity: usize,
    /// Encoded value.
    pub data: BytesMut,
    /// NULL indicator.
    pub is_null: bool,
    /// Set by the native client when an output value was cut to `capacity`.
    pub truncated: bool,
}

impl NativeBind {
    /// The input value, `None` when NULL.
    pub fn input(&self) -> Option<&[u8]> {
        if self.is_null {
            None
        } else {
            Some(&self.data)
        }
    }

    /// Store an output value produced by the server.
    ///
    /// Fixed-width character buffers (CHAR) are truncated to `capacity` and
    /// flagged; any other oversized value fails with ORA-06502, which is how
    /// the server reports a PL/SQL buffer that is too small.
    pub fn set_output(&mut self, value: Option<&[u8]>) -> NativeResult<()> {
        self.truncated = false;
        match value {
            None => {
                self.is_null = true;
                self.data.clear();
            }
            Some(bytes) => {
                let mut len = bytes.len();
                if len > self.capacity {
                    if self.ora_type_num != ORA_TYPE_NUM_CHAR {
                        return Err(NativeError::new(
                            ORA_ERR_VALUE_ERROR,
                            "PL/SQL: numeric or value error: character string buffer too small",
                        ));
                    }
                    len = self.capacity;
                    self.truncated = true;
                }
                self.is_null = false;
                self.data.clear();
                self.data.extend_from_slice(&bytes[..len]);
            }
        }
        Ok(())
    }
}

/// A native session: the resource that statement handles are opened on.
pub trait NativeSession: Send + Sync {
    /// Allocate a new statement handle.
    fn open_statement(&self) -> NativeResult<Box<dyn NativeStatement>>;

    /// Adopt the already-executed statement behind a REF CURSOR value.
    fn open_ref_cursor(&self, cursor_id: u32) -> NativeResult<Box<dyn NativeStatement>>;

    /// Whether the session is still usable.
    fn is_connected(&self) -> bool;

    /// Log off and release the session.
    fn close(&self) -> NativeResult<()>;
}

/// A native statement handle.
///
/// Calls are blocking. The cursor guarantees `release` is called exactly
/// once and that no other call follows it.
pub trait NativeStatement: Send {
    /// Parse statement text into the handle.
    fn prepare(&mut self, sql: &str) -> NativeResult<StatementType>;

    /// Execute the prepared statement with positional binds.
    ///
    /// Output values are written back into the binds. Returns the number of
    /// rows affected (0 for queries).
    fn execute(&mut self, binds: &mut [NativeBind]) -> NativeResult<u64>;

    /// Describe the result columns of an executed query.
    fn describe(&mut self) -> NativeResult<Vec<ColumnMetadata>>;

    /// Fetch up to `max_rows` rows. Fewer rows means the result set is done.
    fn fetch(&mut self, max_rows: usize) -> NativeResult<Vec<NativeRow>>;

    /// Release the handle.
    fn release(&mut self) -> NativeResult<()>;
}
