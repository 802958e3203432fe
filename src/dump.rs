//! Row dump: a quoted, `;`-separated text table of a query result.
//!
//! ```text
//! "ID";"NAME";"CREATED"
//! 1;"alpha";"2024-03-01T12:00:00"
//! 2;;"2024-03-02T08:30:00"
//! ```

use std::io::{BufWriter, Write};

use tracing::debug;

use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::native::constants::*;
use crate::types::{Column, OracleValue};

/// Output buffer size.
const WRITE_BUFFER_SIZE: usize = 65536;

/// Rows requested per `fetch_many` call.
const DUMP_BATCH_SIZE: usize = 1000;

const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Build the query for a table, or pass a full `SELECT` through.
///
/// # Example
///
/// ```
/// use oracle_cursor::dump::build_query;
///
/// assert_eq!(build_query("emp", None, &[]), "SELECT * FROM emp");
/// assert_eq!(
///     build_query("emp", Some("deptno = 10"), &["empno", "ename"]),
///     "SELECT empno, ename FROM emp WHERE deptno = 10"
/// );
/// assert_eq!(build_query("SELECT 1 FROM dual", Some("x"), &[]), "SELECT 1 FROM dual");
/// ```
pub fn build_query(table: &str, where_clause: Option<&str>, columns: &[&str]) -> String {
    let is_select = table
        .get(..7)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("SELECT "));
    if is_select {
        return table.to_string();
    }

    let cols = if columns.is_empty() {
        "*".to_string()
    } else {
        columns.join(", ")
    };
    match where_clause.filter(|w| !w.is_empty()) {
        Some(w) => format!("SELECT {} FROM {} WHERE {}", cols, table, w),
        None => format!("SELECT {} FROM {}", cols, table),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellFormat {
    Quoted,
    Bare,
    Date,
    Timestamp,
}

impl CellFormat {
    fn for_column(column: &Column) -> Result<Self> {
        match column.oracle_type_num {
            ORA_TYPE_NUM_VARCHAR | ORA_TYPE_NUM_CHAR | ORA_TYPE_NUM_LONG => Ok(CellFormat::Quoted),
            ORA_TYPE_NUM_NUMBER | ORA_TYPE_NUM_BINARY_FLOAT | ORA_TYPE_NUM_BINARY_DOUBLE => {
                Ok(CellFormat::Bare)
            }
            ORA_TYPE_NUM_DATE => Ok(CellFormat::Date),
            ORA_TYPE_NUM_TIMESTAMP => Ok(CellFormat::Timestamp),
            other => Err(Error::unsupported_type(format!(
                "no dump format for column {} (native type code {})",
                column.name, other
            ))),
        }
    }

    fn write<W: Write>(self, w: &mut W, value: &OracleValue) -> Result<()> {
        match (self, value) {
            (_, OracleValue::Null) => {}
            (CellFormat::Quoted, OracleValue::String(s)) => write!(w, "{:?}", s)?,
            (CellFormat::Bare, v) => write!(w, "{}", v)?,
            (CellFormat::Date, v) | (CellFormat::Timestamp, v) => {
                let dt = v.as_datetime().ok_or_else(|| {
                    Error::type_conversion(format!("cannot format {} as a date", v.kind()))
                })?;
                let format = if self == CellFormat::Date {
                    DATE_FORMAT
                } else {
                    TIMESTAMP_FORMAT
                };
                write!(w, "\"{}\"", dt.format(format))?;
            }
            (CellFormat::Quoted, v) => write!(w, "{:?}", v.to_string())?,
        }
        Ok(())
    }
}

/// Write the current result set of `cursor` to `writer`.
///
/// The header holds the quoted column names. Every column must have a
/// format; otherwise nothing is written. Returns the number of data rows.
pub fn dump<W: Write>(cursor: &mut Cursor, writer: W) -> Result<usize> {
    let columns = cursor.describe()?.to_vec();
    let formats = columns
        .iter()
        .map(CellFormat::for_column)
        .collect::<Result<Vec<_>>>()?;

    let mut w = BufWriter::with_capacity(WRITE_BUFFER_SIZE, writer);
    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            w.write_all(b";")?;
        }
        write!(w, "\"{}\"", column.name)?;
    }
    w.write_all(b"\n")?;

    let mut written = 0;
    loop {
        let rows = cursor.fetch_many(DUMP_BATCH_SIZE)?;
        if rows.is_empty() {
            break;
        }
        for row in &rows {
            for (i, (format, value)) in formats.iter().zip(row.values()).enumerate() {
                if i > 0 {
                    w.write_all(b";")?;
                }
                format.write(&mut w, value)?;
            }
            w.write_all(b"\n")?;
            written += 1;
        }
    }
    w.flush()?;
    debug!(rows = written, "dump written");
    Ok(written)
}
