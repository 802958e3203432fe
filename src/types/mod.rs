//! Column description model and value types.

mod column;
mod metadata;
mod oracle_type;
mod row;
mod target;
mod value;

pub use column::{Column, ColumnInfo};
pub use metadata::ColumnMetadata;
pub use oracle_type::OracleType;
pub use row::Row;
pub use target::{FetchTarget, FromValue};
pub use value::{OracleValue, RefCursor};
