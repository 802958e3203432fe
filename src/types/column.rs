//! Column and ColumnInfo types for the user-facing description.
//!
//! Built once per executed query from the raw `ColumnMetadata` the native
//! describe returns. A column is only accepted when the converter registry
//! can decode its type.

use crate::convert;
use crate::error::Result;

use super::metadata::ColumnMetadata;
use super::oracle_type::OracleType;

/// A column in a result set.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Whether NULL values are allowed.
    pub nullable: bool,
    /// Column data type.
    pub data_type: OracleType,
    /// Raw Oracle type number.
    pub oracle_type_num: u8,
}

impl Column {
    /// Create a column from metadata.
    ///
    /// Returns `Error::UnsupportedType` if no converter handles the type.
    pub fn from_metadata(meta: &ColumnMetadata) -> Result<Self> {
        convert::lookup(meta.oracle_type)?;
        Ok(Self {
            name: meta.name.clone(),
            nullable: meta.nullable,
            data_type: OracleType::from_raw(
                meta.oracle_type,
                meta.precision,
                meta.scale,
                meta.max_size,
            )?,
            oracle_type_num: meta.oracle_type,
        })
    }

    /// Declared size in bytes (0 when the type has none).
    pub fn max_size(&self) -> u32 {
        self.data_type.max_size()
    }

    pub fn precision(&self) -> i8 {
        self.data_type.precision()
    }

    pub fn scale(&self) -> i8 {
        self.data_type.scale()
    }
}

/// Shared column information for all rows in a result set.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnInfo {
    /// Column definitions, in projection order.
    pub columns: Vec<Column>,
}

impl ColumnInfo {
    /// Create new column info from columns.
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    /// Create column info from native metadata.
    ///
    /// Fails on the first column with an unsupported type; no partial
    /// description is returned.
    pub fn from_metadata(metadata: &[ColumnMetadata]) -> Result<Self> {
        let columns = metadata
            .iter()
            .map(Column::from_metadata)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { columns })
    }

    /// Get column names.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Get the number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Check if there are no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Get column by index.
    pub fn get(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    /// Find column index by name (case-insensitive).
    pub fn find_by_name(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    }
}
