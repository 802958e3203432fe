//! Error types for cursor, variable and conversion operations.

use std::io;
use std::panic::Location;
use thiserror::Error;

use crate::native::NativeError;

/// Result type alias for cursor operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for cursor, bind and conversion operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error while writing dump output.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Operation on a closed cursor or a released variable.
    #[error("{resource} is closed")]
    ClosedResource { resource: &'static str },

    /// No converter exists for a value shape or native type code.
    #[error("Unsupported type: {description}")]
    UnsupportedType { description: String },

    /// Encoded value does not fit the allocated buffer.
    #[error("Buffer too small: need {needed} bytes, have {available} filed at {location}")]
    BufferTooSmall {
        needed: usize,
        available: usize,
        location: &'static Location<'static>,
    },

    /// Keyword argument name cannot be used in a call statement.
    #[error("Invalid argument name {name:?}: {reason}")]
    InvalidArgumentName { name: String, reason: String },

    /// Number of fetch targets differs from the number of columns.
    #[error("Expected {expected} fetch targets, got {actual}")]
    ArityMismatch { expected: usize, actual: usize },

    /// Binds supplied to execute do not match the statement placeholders.
    #[error("Bind mismatch: {message}")]
    BindMismatch { message: String },

    /// Native execute failed.
    #[error("Execute failed: ORA-{code:05}: {message}")]
    Execution { code: u32, message: String },

    /// Native fetch failed.
    #[error("Fetch failed: ORA-{code:05}: {message}")]
    Fetch { code: u32, message: String },

    /// Any other native client failure (prepare, describe, release).
    #[error("ORA-{code:05}: {message}")]
    Oracle { code: u32, message: String },

    /// Fetch requested but the last statement produced no result set.
    #[error("No result set: the last statement was not a query")]
    NoResultSet,

    /// Type conversion error.
    #[error("Type conversion error: {message}")]
    TypeConversion { message: String },

    /// Null value error.
    #[error("Unexpected NULL value in column {column}")]
    NullValue { column: String },

    /// Column not found.
    #[error("Column not found: {name}")]
    ColumnNotFound { name: String },

    /// Column index out of bounds.
    #[error("Column index {index} out of bounds (columns: {count})")]
    ColumnIndexOutOfBounds { index: usize, count: usize },
}

impl Error {
    /// Create a closed-resource error.
    pub fn closed(resource: &'static str) -> Self {
        Self::ClosedResource { resource }
    }

    /// Create an unsupported-type error.
    pub fn unsupported_type(description: impl Into<String>) -> Self {
        Self::UnsupportedType {
            description: description.into(),
        }
    }

    /// Create an unsupported-type error for a native type code.
    pub fn unsupported_type_num(type_num: u8) -> Self {
        Self::UnsupportedType {
            description: format!("native type code {}", type_num),
        }
    }

    /// Create a buffer-too-small error recording the caller's location.
    #[track_caller]
    pub fn buffer_too_small(needed: usize, available: usize) -> Self {
        Self::BufferTooSmall {
            needed,
            available,
            location: Location::caller(),
        }
    }

    /// Create an invalid-argument-name error.
    pub fn invalid_argument_name(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgumentName {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a bind mismatch error.
    pub fn bind_mismatch(message: impl Into<String>) -> Self {
        Self::BindMismatch {
            message: message.into(),
        }
    }

    /// Create a type conversion error.
    pub fn type_conversion(message: impl Into<String>) -> Self {
        Self::TypeConversion {
            message: message.into(),
        }
    }

    /// Wrap a native error raised by execute.
    pub fn execution(err: NativeError) -> Self {
        Self::Execution {
            code: err.code,
            message: err.message,
        }
    }

    /// Wrap a native error raised by fetch.
    pub fn fetch(err: NativeError) -> Self {
        Self::Fetch {
            code: err.code,
            message: err.message,
        }
    }

    /// Native error code carried by this error, if any.
    pub fn oracle_code(&self) -> Option<u32> {
        match self {
            Error::Execution { code, .. } | Error::Fetch { code, .. } | Error::Oracle { code, .. } => {
                Some(*code)
            }
            _ => None,
        }
    }
}

impl From<NativeError> for Error {
    fn from(err: NativeError) -> Self {
        Self::Oracle {
            code: err.code,
            message: err.message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oracle_error_display() {
        let err = Error::execution(NativeError::new(942, "table or view does not exist"));
        assert_eq!(
            err.to_string(),
            "Execute failed: ORA-00942: table or view does not exist"
        );
        assert_eq!(err.oracle_code(), Some(942));
    }

    #[test]
    fn test_buffer_too_small_records_location() {
        let err = Error::buffer_too_small(10, 4);
        match err {
            Error::BufferTooSmall {
                needed,
                available,
                location,
            } => {
                assert_eq!(needed, 10);
                assert_eq!(available, 4);
                assert!(location.file().ends_with("error.rs"));
            }
            other => panic!("Expected BufferTooSmall, got {:?}", other),
        }
    }
}
