//! Row type for query results.

use std::sync::Arc;

use crate::error::{Error, Result};

use super::column::{Column, ColumnInfo};
use super::target::FromValue;
use super::value::OracleValue;

/// A row of query results.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    values: Vec<OracleValue>,
    column_info: Arc<ColumnInfo>,
}

impl Row {
    /// Create a new row with values and shared column info.
    pub fn new(values: Vec<OracleValue>, column_info: Arc<ColumnInfo>) -> Self {
        Self {
            values,
            column_info,
        }
    }

    /// Get value by column index (0-based).
    pub fn get(&self, index: usize) -> Option<&OracleValue> {
        self.values.get(index)
    }

    /// Get value by column name (case-insensitive).
    pub fn get_by_name(&self, name: &str) -> Option<&OracleValue> {
        self.column_info
            .find_by_name(name)
            .and_then(|idx| self.values.get(idx))
    }

    /// Convert the value at `index` into `T`.
    pub fn get_as<T: FromValue>(&self, index: usize) -> Result<T> {
        let value = self.values.get(index).ok_or(Error::ColumnIndexOutOfBounds {
            index,
            count: self.values.len(),
        })?;
        let column = self
            .column_info
            .get(index)
            .map(|c| c.name.as_str())
            .unwrap_or_default();
        T::from_value(value, column)
    }

    /// Convert the value of the named column into `T`.
    pub fn get_as_by_name<T: FromValue>(&self, name: &str) -> Result<T> {
        let index = self
            .column_info
            .find_by_name(name)
            .ok_or_else(|| Error::ColumnNotFound {
                name: name.to_string(),
            })?;
        self.get_as(index)
    }

    /// Get the number of columns.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the row is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get all values.
    pub fn values(&self) -> &[OracleValue] {
        &self.values
    }

    /// Get column information.
    pub fn columns(&self) -> &[Column] {
        &self.column_info.columns
    }

    /// Iterate over values.
    pub fn iter(&self) -> impl Iterator<Item = &OracleValue> {
        self.values.iter()
    }
}

impl IntoIterator for Row {
    type Item = OracleValue;
    type IntoIter = std::vec::IntoIter<OracleValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

impl<'a> IntoIterator for &'a Row {
    type Item = &'a OracleValue;
    type IntoIter = std::slice::Iter<'a, OracleValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OracleType;

    fn make_test_row() -> Row {
        let info = Arc::new(ColumnInfo::new(vec![
            Column {
                name: "NAME".to_string(),
                nullable: true,
                data_type: OracleType::Varchar2 { max_size: 100 },
                oracle_type_num: 1,
            },
            Column {
                name: "VALUE".to_string(),
                nullable: true,
                data_type: OracleType::Number {
                    precision: 10,
                    scale: 0,
                },
                oracle_type_num: 2,
            },
        ]));
        Row::new(
            vec![OracleValue::String("test".to_string()), OracleValue::Null],
            info,
        )
    }

    #[test]
    fn test_row_access() {
        let row = make_test_row();
        assert_eq!(row.len(), 2);
        assert_eq!(row.get(0), Some(&OracleValue::String("test".to_string())));
        assert_eq!(row.get_by_name("value"), Some(&OracleValue::Null));
        assert_eq!(row.columns()[1].name, "VALUE");
    }

    #[test]
    fn test_row_get_as() {
        let row = make_test_row();
        assert_eq!(row.get_as::<String>(0).unwrap(), "test");
        assert_eq!(row.get_as_by_name::<Option<i64>>("value").unwrap(), None);

        match row.get_as::<i64>(1) {
            Err(Error::NullValue { column }) => assert_eq!(column, "VALUE"),
            other => panic!("Expected NullValue, got {:?}", other),
        }
        assert!(matches!(
            row.get_as::<String>(5),
            Err(Error::ColumnIndexOutOfBounds { index: 5, count: 2 })
        ));
        assert!(matches!(
            row.get_as_by_name::<String>("missing"),
            Err(Error::ColumnNotFound { .. })
        ));
    }
}
