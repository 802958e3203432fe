//! In-process native client.
//!
//! `MemoryClient` serves scripted result sets and PL/SQL handlers through
//! the same [`NativeSession`]/[`NativeStatement`] contract a real client
//! implements. Rows are stored as [`OracleValue`]s and encoded through the
//! converter registry when fetched, so the cursor sees native bytes.
//!
//! It also keeps the handle accounting a server does: open statement
//! handles count against a maximum, releasing a handle twice is an error,
//! and every call fails once the session is closed.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use bytes::Bytes;

use super::constants::*;
use super::{NativeBind, NativeError, NativeResult, NativeRow, NativeSession, NativeStatement};
use crate::convert;
use crate::statement::{Statement, StatementType};
use crate::types::{ColumnMetadata, OracleValue};

/// Default open statement limit, matching the server's `open_cursors`.
pub const DEFAULT_MAX_OPEN_CURSORS: usize = 300;

/// A scripted result set.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    columns: Vec<ColumnMetadata>,
    rows: Vec<Vec<OracleValue>>,
    fail_at: Option<(usize, NativeError)>,
}

impl ResultSet {
    pub fn new(columns: Vec<ColumnMetadata>) -> Self {
        Self {
            columns,
            ..Default::default()
        }
    }

    /// Append one row.
    pub fn with_row(mut self, row: Vec<OracleValue>) -> Self {
        self.rows.push(row);
        self
    }

    /// Append rows.
    pub fn with_rows(mut self, rows: impl IntoIterator<Item = Vec<OracleValue>>) -> Self {
        self.rows.extend(rows);
        self
    }

    /// Fail the fetch whose batch would include row `row` (0-based).
    pub fn fail_at(mut self, row: usize, err: NativeError) -> Self {
        self.fail_at = Some((row, err));
        self
    }

    pub fn columns(&self) -> &[ColumnMetadata] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// What an executed statement produced.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// DML/PL/SQL: number of rows affected.
    RowsAffected(u64),
    /// Query: the result set to fetch from.
    Rows(ResultSet),
}

type Handler = Arc<dyn Fn(&mut [NativeBind]) -> NativeResult<Outcome> + Send + Sync>;

struct Inner {
    handlers: HashMap<String, Handler>,
    ref_cursors: HashMap<u32, ResultSet>,
    open: Vec<u64>,
    next_handle: u64,
    max_open: usize,
    releases: usize,
    prepares: usize,
    executed: Vec<String>,
    connected: bool,
}

/// In-process native session.
#[derive(Clone)]
pub struct MemoryClient {
    inner: Arc<Mutex<Inner>>,
}

impl Default for MemoryClient {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("MemoryClient")
            .field("statements", &inner.handlers.len())
            .field("open", &inner.open.len())
            .field("connected", &inner.connected)
            .finish()
    }
}

fn not_connected() -> NativeError {
    NativeError::new(ORA_ERR_NOT_CONNECTED, "ORACLE not connected")
}

fn normalize(sql: &str) -> String {
    sql.trim().trim_end_matches(';').trim_end().to_string()
}

impl MemoryClient {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                handlers: HashMap::new(),
                ref_cursors: HashMap::new(),
                open: Vec::new(),
                next_handle: 1,
                max_open: DEFAULT_MAX_OPEN_CURSORS,
                releases: 0,
                prepares: 0,
                executed: Vec::new(),
                connected: true,
            })),
        }
    }

    /// Set the open statement limit.
    pub fn with_max_open_cursors(self, max_open: usize) -> Self {
        self.lock().max_open = max_open;
        self
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        lock(&self.inner)
    }

    /// Serve `rows` for every execution of `sql`.
    pub fn register_query(&self, sql: &str, rows: ResultSet) {
        self.register_handler(sql, move |_| Ok(Outcome::Rows(rows.clone())));
    }

    /// Run `handler` for every execution of `sql`.
    ///
    /// The handler sees the positional binds and may write output values
    /// with [`NativeBind::set_output`].
    pub fn register_handler<F>(&self, sql: &str, handler: F)
    where
        F: Fn(&mut [NativeBind]) -> NativeResult<Outcome> + Send + Sync + 'static,
    {
        self.lock().handlers.insert(normalize(sql), Arc::new(handler));
    }

    /// Make `rows` available as REF CURSOR `cursor_id`.
    pub fn register_ref_cursor(&self, cursor_id: u32, rows: ResultSet) {
        self.lock().ref_cursors.insert(cursor_id, rows);
    }

    /// Number of statement handles currently open.
    pub fn open_cursors(&self) -> usize {
        self.lock().open.len()
    }

    /// Number of successful handle releases.
    pub fn release_count(&self) -> usize {
        self.lock().releases
    }

    /// Number of prepare calls.
    pub fn prepare_count(&self) -> usize {
        self.lock().prepares
    }

    /// Statement texts in execution order.
    pub fn executed_statements(&self) -> Vec<String> {
        self.lock().executed.clone()
    }

    fn new_handle(&self, result: Option<ResultSet>) -> NativeResult<Box<dyn NativeStatement>> {
        let mut inner = self.lock();
        if !inner.connected {
            return Err(not_connected());
        }
        if inner.open.len() >= inner.max_open {
            return Err(NativeError::new(
                ORA_ERR_MAX_OPEN_CURSORS,
                "maximum open cursors exceeded",
            ));
        }
        let id = inner.next_handle;
        inner.next_handle += 1;
        inner.open.push(id);
        Ok(Box::new(MemoryStatement {
            inner: Arc::clone(&self.inner),
            id,
            sql: None,
            result,
            position: 0,
            released: false,
        }))
    }
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl NativeSession for MemoryClient {
    fn open_statement(&self) -> NativeResult<Box<dyn NativeStatement>> {
        self.new_handle(None)
    }

    fn open_ref_cursor(&self, cursor_id: u32) -> NativeResult<Box<dyn NativeStatement>> {
        let rows = self
            .lock()
            .ref_cursors
            .remove(&cursor_id)
            .ok_or_else(|| NativeError::new(ORA_ERR_INVALID_CURSOR, "invalid cursor"))?;
        self.new_handle(Some(rows))
    }

    fn is_connected(&self) -> bool {
        self.lock().connected
    }

    fn close(&self) -> NativeResult<()> {
        let mut inner = self.lock();
        if !inner.connected {
            return Err(not_connected());
        }
        inner.connected = false;
        Ok(())
    }
}

struct MemoryStatement {
    inner: Arc<Mutex<Inner>>,
    id: u64,
    sql: Option<String>,
    result: Option<ResultSet>,
    position: usize,
    released: bool,
}

impl MemoryStatement {
    fn check_usable(&self) -> NativeResult<()> {
        if self.released {
            return Err(NativeError::new(ORA_ERR_INVALID_CURSOR, "invalid cursor"));
        }
        if !lock(&self.inner).connected {
            return Err(not_connected());
        }
        Ok(())
    }

    fn not_executed() -> NativeError {
        NativeError::new(ORA_ERR_NOT_EXECUTED, "statement handle not executed")
    }
}

impl NativeStatement for MemoryStatement {
    fn prepare(&mut self, sql: &str) -> NativeResult<StatementType> {
        self.check_usable()?;
        let statement_type = StatementType::from_sql(sql);
        if statement_type == StatementType::Unknown {
            return Err(NativeError::new(ORA_ERR_INVALID_SQL, "invalid SQL statement"));
        }
        lock(&self.inner).prepares += 1;
        self.sql = Some(sql.to_string());
        self.result = None;
        self.position = 0;
        Ok(statement_type)
    }

    fn execute(&mut self, binds: &mut [NativeBind]) -> NativeResult<u64> {
        self.check_usable()?;
        let sql = self.sql.clone().ok_or_else(Self::not_executed)?;
        let statement = Statement::new(sql.as_str());
        if binds.len() < statement.placeholders().len() {
            return Err(NativeError::new(
                ORA_ERR_NOT_ALL_VARIABLES_BOUND,
                "not all variables bound",
            ));
        }

        let handler = {
            let mut inner = lock(&self.inner);
            inner.executed.push(sql.clone());
            inner.handlers.get(&normalize(&sql)).cloned()
        };
        self.result = None;
        self.position = 0;

        let outcome = match handler {
            Some(handler) => (*handler)(binds)?,
            None => match statement.statement_type() {
                StatementType::Ddl => Outcome::RowsAffected(0),
                StatementType::PlSql => {
                    return Err(NativeError::new(
                        ORA_ERR_PLSQL_COMPILATION,
                        format!("line 1, column 7: PLS-00201: identifier must be declared: {}", sql),
                    ))
                }
                _ => {
                    return Err(NativeError::new(
                        ORA_ERR_TABLE_NOT_FOUND,
                        "table or view does not exist",
                    ))
                }
            },
        };

        match outcome {
            Outcome::RowsAffected(n) => Ok(n),
            Outcome::Rows(rows) => {
                self.result = Some(rows);
                Ok(0)
            }
        }
    }

    fn describe(&mut self) -> NativeResult<Vec<ColumnMetadata>> {
        self.check_usable()?;
        self.result
            .as_ref()
            .map(|rs| rs.columns.clone())
            .ok_or_else(Self::not_executed)
    }

    fn fetch(&mut self, max_rows: usize) -> NativeResult<Vec<NativeRow>> {
        self.check_usable()?;
        let rs = self.result.as_ref().ok_or_else(Self::not_executed)?;
        if let Some((row, err)) = &rs.fail_at {
            if self.position + max_rows > *row {
                return Err(err.clone());
            }
        }

        let end = rs.rows.len().min(self.position + max_rows);
        let mut batch = Vec::with_capacity(end.saturating_sub(self.position));
        for values in &rs.rows[self.position.min(end)..end] {
            let mut row: NativeRow = Vec::with_capacity(values.len());
            for (column, value) in rs.columns.iter().zip(values) {
                row.push(encode_cell(column.oracle_type, value)?);
            }
            batch.push(row);
        }
        self.position = end;
        Ok(batch)
    }

    fn release(&mut self) -> NativeResult<()> {
        if self.released {
            return Err(NativeError::new(ORA_ERR_INVALID_CURSOR, "invalid cursor"));
        }
        self.released = true;
        let mut inner = lock(&self.inner);
        inner.open.retain(|&h| h != self.id);
        inner.releases += 1;
        Ok(())
    }
}

fn encode_cell(type_num: u8, value: &OracleValue) -> NativeResult<Option<Bytes>> {
    convert::encode_value(type_num, value)
        .map(|cell| cell.map(|b| b.freeze()))
        .map_err(|e| {
            NativeError::new(
                ORA_ERR_INCONSISTENT_DATA_TYPES,
                format!("inconsistent datatypes: {}", e),
            )
        })
}
