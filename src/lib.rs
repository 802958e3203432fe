//! Cursor and bind-variable layer for Oracle database clients.
//!
//! This crate sits between application code and a native Oracle client. It
//! turns statement text and values into positional native binds, converts
//! values to and from Oracle's external byte formats, and drives the
//! execute/describe/fetch cycle of a statement handle. The native client
//! itself is reached through the [`native::NativeSession`] and
//! [`native::NativeStatement`] traits; [`native::memory::MemoryClient`]
//! implements them in process.
//!
//! # Example
//!
//! ```
//! use oracle_cursor::native::memory::{MemoryClient, Outcome};
//! use oracle_cursor::{Bind, Connection, OracleValue, Result, VarType};
//! use std::sync::Arc;
//!
//! fn main() -> Result<()> {
//!     let client = MemoryClient::new();
//!     client.register_handler("begin :1 := Add(:2, :3); end;", |binds| {
//!         binds[0].set_output(Some([0xC1, 0x06].as_slice()))?;
//!         Ok(Outcome::RowsAffected(1))
//!     });
//!
//!     let conn = Connection::open(Arc::new(client));
//!     let mut cursor = conn.new_cursor();
//!     let sum = cursor.call_func("Add", VarType::Number, &[Bind::from(2), Bind::from(3)], &[])?;
//!     assert_eq!(sum, OracleValue::Integer(5));
//!
//!     cursor.close()?;
//!     conn.close()?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod connection;
pub mod convert;
pub mod cursor;
pub mod dump;
pub mod error;
pub mod native;
pub mod statement;
pub mod types;
pub mod variable;

// Re-export main types
pub use config::CursorConfig;
pub use connection::Connection;
pub use cursor::{Cursor, CursorState, Rows};
pub use error::{Error, Result};
pub use statement::{build_call_statement, StatementType};
pub use types::{
    Column, ColumnInfo, ColumnMetadata, FetchTarget, FromValue, OracleType, OracleValue,
    RefCursor, Row,
};
pub use variable::{Bind, VarRef, VarType, Variable};
