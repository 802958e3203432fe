//! Cursor: statement execution, binding and buffered fetching.
//!
//! A [`Cursor`] owns one native statement handle, opened on first execute,
//! and the [`Variable`]s bound to it. Rows are pulled from the native client
//! `arraysize` at a time into a buffer and handed out one by one or in
//! batches.
//!
//! # Example
//!
//! ```
//! use oracle_cursor::native::memory::{MemoryClient, ResultSet};
//! use oracle_cursor::native::constants::ORA_TYPE_NUM_NUMBER;
//! use oracle_cursor::{Bind, ColumnMetadata, Connection, OracleValue};
//! use std::sync::Arc;
//!
//! # fn main() -> oracle_cursor::Result<()> {
//! let client = MemoryClient::new();
//! client.register_query(
//!     "SELECT id FROM users WHERE id > :1",
//!     ResultSet::new(vec![ColumnMetadata::new("ID", ORA_TYPE_NUM_NUMBER)])
//!         .with_row(vec![OracleValue::Integer(7)]),
//! );
//!
//! let conn = Connection::open(Arc::new(client));
//! let mut cursor = conn.new_cursor();
//! cursor.execute("SELECT id FROM users WHERE id > :1", &[Bind::from(5)], &[])?;
//! while let Some(row) = cursor.fetch_one()? {
//!     assert_eq!(row.get_as::<i64>(0)?, 7);
//! }
//! cursor.close()?;
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::CursorConfig;
use crate::convert;
use crate::error::{Error, Result};
use crate::native::constants::*;
use crate::native::{BindDirection, NativeRow, NativeSession, NativeStatement};
use crate::statement::{build_call_statement, Statement, StatementType};
use crate::types::{Column, ColumnInfo, FetchTarget, OracleValue, RefCursor, Row};
use crate::variable::{Bind, VarRef, VarType, Variable};

static NEXT_CURSOR_ID: AtomicU64 = AtomicU64::new(1);

/// Life cycle state of a cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// Created; no native handle yet.
    Unopened,
    /// Native handle open; no successful execute since the last failure.
    Open,
    /// Statement executed; rows (if any) not yet handed out.
    Executed,
    /// At least one row of the current result set handed out.
    Fetching,
    /// Closed; terminal.
    Closed,
}

struct Slot {
    var: Variable,
    /// Created by the cursor for a `Bind::Value`, not by the caller.
    implicit: bool,
    generation: u64,
}

/// A statement handle with its bind variables and fetch position.
pub struct Cursor {
    id: u64,
    session: Arc<dyn NativeSession>,
    handle: Option<Box<dyn NativeStatement>>,
    state: CursorState,
    config: CursorConfig,
    arraysize: usize,
    /// Last successfully prepared statement.
    statement: Option<Statement>,
    /// Type the native client reported when `statement` was prepared.
    statement_type: StatementType,
    vars: Vec<Option<Slot>>,
    next_generation: u64,
    binds: Vec<VarRef>,
    columns: Option<Arc<ColumnInfo>>,
    buffer: Vec<NativeRow>,
    buffer_pos: usize,
    more_rows: bool,
    rows_fetched: u64,
    rows_affected: u64,
}

fn order_binds<'b>(
    statement: &Statement,
    positional: &'b [Bind],
    named: &'b [(&str, Bind)],
) -> Result<Vec<&'b Bind>> {
    let placeholders = statement.placeholders();
    if !positional.is_empty() && !named.is_empty() {
        return Err(Error::bind_mismatch(
            "positional and named binds cannot be mixed",
        ));
    }
    if named.is_empty() {
        if positional.len() != placeholders.len() {
            return Err(Error::bind_mismatch(format!(
                "statement has {} placeholders, {} binds supplied",
                placeholders.len(),
                positional.len()
            )));
        }
        return Ok(positional.iter().collect());
    }

    // A name fills every position it labels.
    let mut ordered: Vec<Option<&Bind>> = vec![None; placeholders.len()];
    for (name, bind) in named {
        let mut matched = false;
        for pos in statement.positions_of(name) {
            if ordered[pos].replace(bind).is_some() {
                return Err(Error::bind_mismatch(format!(
                    "placeholder :{} bound twice",
                    placeholders[pos].name
                )));
            }
            matched = true;
        }
        if !matched {
            return Err(Error::bind_mismatch(format!("no placeholder named :{}", name)));
        }
    }
    ordered
        .into_iter()
        .zip(placeholders)
        .map(|(bind, p)| {
            bind.ok_or_else(|| Error::bind_mismatch(format!("placeholder :{} is not bound", p.name)))
        })
        .collect()
}

/// Whether raw bytes of a column type can be stored in a variable as is.
fn raw_compatible(column_type: u8, var_type: VarType) -> bool {
    match var_type {
        VarType::String | VarType::FixedChar => matches!(
            column_type,
            ORA_TYPE_NUM_VARCHAR | ORA_TYPE_NUM_CHAR | ORA_TYPE_NUM_LONG
        ),
        VarType::Binary => matches!(column_type, ORA_TYPE_NUM_RAW | ORA_TYPE_NUM_LONG_RAW),
        other => other.type_num() == column_type,
    }
}

fn decode_row(columns: &Arc<ColumnInfo>, raw: NativeRow) -> Result<Row> {
    if raw.len() != columns.len() {
        return Err(Error::type_conversion(format!(
            "row has {} cells for {} columns",
            raw.len(),
            columns.len()
        )));
    }
    let values = columns
        .columns
        .iter()
        .zip(&raw)
        .map(|(column, cell)| convert::decode_value(column.oracle_type_num, cell.as_deref()))
        .collect::<Result<Vec<_>>>()?;
    Ok(Row::new(values, Arc::clone(columns)))
}

impl Cursor {
    pub(crate) fn new(session: Arc<dyn NativeSession>, config: CursorConfig) -> Self {
        Self {
            id: NEXT_CURSOR_ID.fetch_add(1, Ordering::Relaxed),
            session,
            handle: None,
            state: CursorState::Unopened,
            arraysize: config.arraysize.max(1),
            config,
            statement: None,
            statement_type: StatementType::Unknown,
            vars: Vec::new(),
            next_generation: 0,
            binds: Vec::new(),
            columns: None,
            buffer: Vec::new(),
            buffer_pos: 0,
            more_rows: false,
            rows_fetched: 0,
            rows_affected: 0,
        }
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == CursorState::Closed
    }

    fn check_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(Error::closed("cursor"));
        }
        Ok(())
    }

    fn open_handle(&mut self) -> Result<&mut Box<dyn NativeStatement>> {
        if self.handle.is_none() {
            let handle = self.session.open_statement()?;
            debug!(cursor = self.id, "opened statement handle");
            self.handle = Some(handle);
            self.state = CursorState::Open;
        }
        self.handle
            .as_mut()
            .ok_or_else(|| Error::closed("statement handle"))
    }

    // Variables

    fn slot(&self, var: VarRef) -> Result<&Slot> {
        self.check_open()?;
        if var.cursor != self.id {
            return Err(Error::bind_mismatch("variable belongs to another cursor"));
        }
        self.vars
            .get(var.slot)
            .and_then(Option::as_ref)
            .filter(|slot| slot.generation == var.generation)
            .ok_or_else(|| Error::closed("variable"))
    }

    fn slot_mut(&mut self, var: VarRef) -> Result<&mut Slot> {
        self.slot(var)?;
        self.vars
            .get_mut(var.slot)
            .and_then(Option::as_mut)
            .ok_or_else(|| Error::closed("variable"))
    }

    fn insert_var(&mut self, var: Variable, implicit: bool) -> VarRef {
        let generation = self.next_generation;
        self.next_generation += 1;
        let slot = Slot {
            var,
            implicit,
            generation,
        };
        let index = match self.vars.iter().position(Option::is_none) {
            Some(free) => {
                self.vars[free] = Some(slot);
                free
            }
            None => {
                self.vars.push(Some(slot));
                self.vars.len() - 1
            }
        };
        VarRef {
            cursor: self.id,
            slot: index,
            generation,
        }
    }

    /// Free implicit variables that are not in `keep`.
    fn release_implicit_except(&mut self, keep: &[VarRef]) {
        for (index, entry) in self.vars.iter_mut().enumerate() {
            let implicit = entry.as_ref().is_some_and(|s| s.implicit);
            if implicit && !keep.iter().any(|r| r.slot == index) {
                *entry = None;
            }
        }
    }

    /// Create an IN/OUT variable holding `value`; the type follows the value.
    pub fn new_var(&mut self, value: &OracleValue) -> Result<VarRef> {
        self.check_open()?;
        let var = Variable::from_value(value, BindDirection::InputOutput, &self.config)?;
        Ok(self.insert_var(var, false))
    }

    /// Create a NULL IN/OUT variable of a given type.
    ///
    /// `size` is the capacity for string and binary types (0 = default).
    pub fn new_var_typed(&mut self, var_type: VarType, size: usize) -> Result<VarRef> {
        self.check_open()?;
        let var = Variable::typed(var_type, size, &self.config);
        Ok(self.insert_var(var, false))
    }

    /// Borrow a variable.
    pub fn var(&self, var: VarRef) -> Result<&Variable> {
        Ok(&self.slot(var)?.var)
    }

    /// Decode the current value of a variable.
    pub fn var_value(&self, var: VarRef) -> Result<OracleValue> {
        self.slot(var)?.var.value()
    }

    /// Store a new value in a variable; takes effect on the next execute.
    #[track_caller]
    pub fn set_var_value(&mut self, var: VarRef, value: &OracleValue) -> Result<()> {
        self.slot_mut(var)?.var.set_value(value)
    }

    /// Variables bound by the last execute, in placeholder order.
    pub fn bind_vars(&self) -> &[VarRef] {
        &self.binds
    }

    fn bind_one(&mut self, pos: usize, bind: &Bind, previous: &[VarRef]) -> Result<VarRef> {
        let value = match bind {
            Bind::Var(var) => {
                self.slot(*var)?;
                return Ok(*var);
            }
            Bind::Value(value) => value,
        };

        if let Some(&prev) = previous.get(pos) {
            if let Ok(slot) = self.slot_mut(prev) {
                let reusable = slot.implicit
                    && slot.var.direction() == BindDirection::Input
                    && (value.is_null() || VarType::infer(value)? == slot.var.var_type());
                if reusable {
                    slot.var.set_value(value)?;
                    return Ok(prev);
                }
            }
        }

        let var = if value.is_null() {
            Variable::untyped_null(BindDirection::Input, &self.config)
        } else {
            Variable::from_value(value, BindDirection::Input, &self.config)?
        };
        Ok(self.insert_var(var, true))
    }

    fn reset_result(&mut self) {
        self.columns = None;
        self.buffer.clear();
        self.buffer_pos = 0;
        self.more_rows = false;
        self.rows_fetched = 0;
        self.rows_affected = 0;
    }

    fn fail_execute(&mut self, err: Error) -> Error {
        self.binds.clear();
        self.release_implicit_except(&[]);
        if self.handle.is_some() {
            self.state = CursorState::Open;
        }
        err
    }

    /// Execute a statement.
    ///
    /// Binds are given either by position (one per entry of
    /// [`Statement::placeholders`]) or by name, never both. Implicit variables
    /// from the previous execute are reused when the value type matches.
    pub fn execute(&mut self, sql: &str, positional: &[Bind], named: &[(&str, Bind)]) -> Result<()> {
        self.check_open()?;
        let statement = Statement::new(sql);
        let ordered = order_binds(&statement, positional, named)?;
        self.reset_result();

        let previous = std::mem::take(&mut self.binds);
        let mut binds = Vec::with_capacity(ordered.len());
        for (pos, bind) in ordered.into_iter().enumerate() {
            match self.bind_one(pos, bind, &previous) {
                Ok(var) => binds.push(var),
                Err(err) => return Err(self.fail_execute(err)),
            }
        }
        self.release_implicit_except(&binds);

        let mut native = Vec::with_capacity(binds.len());
        for (var, placeholder) in binds.iter().zip(statement.placeholders()) {
            native.push(self.slot(*var)?.var.to_native_bind(&placeholder.name));
        }

        let needs_prepare = self.statement.as_ref().map(Statement::sql) != Some(sql);
        let id = self.id;
        let prepared_type = self.statement_type;
        let handle = match self.open_handle() {
            Ok(handle) => handle,
            Err(err) => return Err(self.fail_execute(err)),
        };
        let statement_type = if needs_prepare {
            debug!(cursor = id, sql, "preparing statement");
            match handle.prepare(sql) {
                Ok(statement_type) => statement_type,
                Err(err) => {
                    self.statement = None;
                    self.statement_type = StatementType::Unknown;
                    return Err(self.fail_execute(Error::execution(err)));
                }
            }
        } else {
            prepared_type
        };
        debug!(cursor = id, binds = native.len(), "executing statement");
        let executed = handle.execute(&mut native);
        self.statement = Some(statement);
        self.statement_type = statement_type;
        let rows_affected = match executed {
            Ok(n) => n,
            Err(err) => return Err(self.fail_execute(Error::execution(err))),
        };

        for (var, bind) in binds.iter().zip(&native) {
            if !bind.direction.is_output() {
                continue;
            }
            if bind.truncated {
                warn!(
                    cursor = id,
                    placeholder = %bind.name,
                    capacity = bind.capacity,
                    "output value truncated to buffer size"
                );
            }
            self.slot_mut(*var)?.var.accept_output(bind);
        }
        self.binds = binds;
        self.rows_affected = rows_affected;

        // The native client's classification wins over the local scan.
        if statement_type.is_query() {
            self.describe_result()?;
            self.more_rows = true;
        }
        self.state = CursorState::Executed;
        Ok(())
    }

    /// Run the single describe for the current result set.
    fn describe_result(&mut self) -> Result<()> {
        let handle = self
            .handle
            .as_mut()
            .ok_or_else(|| Error::closed("statement handle"))?;
        let described = handle
            .describe()
            .map_err(Error::from)
            .and_then(|metadata| ColumnInfo::from_metadata(&metadata));
        match described {
            Ok(info) => {
                debug!(cursor = self.id, columns = info.len(), "described result set");
                self.columns = Some(Arc::new(info));
                Ok(())
            }
            Err(err) => {
                self.columns = None;
                self.state = CursorState::Open;
                Err(err)
            }
        }
    }

    /// Call a stored function and return its result.
    ///
    /// Arguments are bound as `begin :1 := name(...); end;`; the return
    /// value lands in a variable of type `return_type`.
    pub fn call_func(
        &mut self,
        name: &str,
        return_type: VarType,
        positional: &[Bind],
        named: &[(&str, Bind)],
    ) -> Result<OracleValue> {
        self.check_open()?;
        let (sql, mut binds) =
            build_call_statement(name, Some(Bind::Value(OracleValue::Null)), positional, named)?;
        let ret = self.insert_var(Variable::typed(return_type, 0, &self.config), true);
        binds[0] = Bind::Var(ret);
        self.execute(&sql, &binds, &[])?;
        self.var_value(ret)
    }

    /// Call a stored procedure.
    pub fn call_proc(&mut self, name: &str, positional: &[Bind], named: &[(&str, Bind)]) -> Result<()> {
        self.check_open()?;
        let (sql, binds) = build_call_statement(name, None, positional, named)?;
        self.execute(&sql, &binds, &[])
    }

    /// Column description of the current result set, in projection order.
    pub fn describe(&self) -> Result<&[Column]> {
        self.check_open()?;
        self.columns
            .as_deref()
            .map(|info| info.columns.as_slice())
            .ok_or(Error::NoResultSet)
    }

    // Fetching

    fn result_columns(&self) -> Result<Arc<ColumnInfo>> {
        self.check_open()?;
        self.columns.clone().ok_or(Error::NoResultSet)
    }

    fn do_fetch(&mut self) -> Result<()> {
        // Reuse buffer capacity
        if self.buffer_pos >= self.buffer.len() {
            self.buffer.clear();
            self.buffer_pos = 0;
        }

        let handle = self.handle.as_mut().ok_or(Error::NoResultSet)?;
        let rows = handle.fetch(self.arraysize).map_err(Error::fetch)?;
        if rows.len() < self.arraysize {
            self.more_rows = false;
        }
        self.rows_fetched += rows.len() as u64;
        debug!(
            cursor = self.id,
            rows = rows.len(),
            more_rows = self.more_rows,
            "fetched batch"
        );
        self.buffer.extend(rows);
        Ok(())
    }

    fn next_native_row(&mut self) -> Result<Option<NativeRow>> {
        if self.buffer_pos >= self.buffer.len() {
            if !self.more_rows {
                self.state = CursorState::Executed;
                return Ok(None);
            }
            self.do_fetch()?;
            if self.buffer_pos >= self.buffer.len() {
                self.state = CursorState::Executed;
                return Ok(None);
            }
        }
        let row = std::mem::take(&mut self.buffer[self.buffer_pos]);
        self.buffer_pos += 1;
        self.state = CursorState::Fetching;
        Ok(Some(row))
    }

    /// Fetch the next row; `None` once the result set is exhausted.
    pub fn fetch_one(&mut self) -> Result<Option<Row>> {
        let columns = self.result_columns()?;
        match self.next_native_row()? {
            Some(raw) => decode_row(&columns, raw).map(Some),
            None => Ok(None),
        }
    }

    /// Fetch up to `n` rows. Fewer only on the last batch; empty once
    /// exhausted, on every later call too.
    pub fn fetch_many(&mut self, n: usize) -> Result<Vec<Row>> {
        let columns = self.result_columns()?;
        let mut rows = Vec::with_capacity(n.min(self.arraysize));
        while rows.len() < n {
            match self.next_native_row()? {
                Some(raw) => rows.push(decode_row(&columns, raw)?),
                None => break,
            }
        }
        Ok(rows)
    }

    /// Fetch all remaining rows.
    pub fn fetch_all(&mut self) -> Result<Vec<Row>> {
        let columns = self.result_columns()?;
        let mut rows = Vec::new();
        while let Some(raw) = self.next_native_row()? {
            rows.push(decode_row(&columns, raw)?);
        }
        Ok(rows)
    }

    /// Decode the next row into caller-owned targets, one per column.
    ///
    /// Returns `false` once the result set is exhausted.
    pub fn fetch_one_into(&mut self, targets: &mut [&mut dyn FetchTarget]) -> Result<bool> {
        let columns = self.result_columns()?;
        if targets.len() != columns.len() {
            return Err(Error::ArityMismatch {
                expected: columns.len(),
                actual: targets.len(),
            });
        }
        let Some(raw) = self.next_native_row()? else {
            return Ok(false);
        };
        for ((target, column), cell) in targets.iter_mut().zip(&columns.columns).zip(&raw) {
            target.assign(column, cell.as_deref())?;
        }
        Ok(true)
    }

    /// Copy the next row's native bytes into variables, one per column.
    #[track_caller]
    pub fn fetch_one_into_vars(&mut self, vars: &[VarRef]) -> Result<bool> {
        let columns = self.result_columns()?;
        if vars.len() != columns.len() {
            return Err(Error::ArityMismatch {
                expected: columns.len(),
                actual: vars.len(),
            });
        }
        for (var, column) in vars.iter().zip(&columns.columns) {
            let var_type = self.slot(*var)?.var.var_type();
            if !raw_compatible(column.oracle_type_num, var_type) {
                return Err(Error::type_conversion(format!(
                    "column {} ({}) cannot be fetched into a {:?} variable",
                    column.name, column.data_type, var_type
                )));
            }
        }
        let Some(raw) = self.next_native_row()? else {
            return Ok(false);
        };
        for (var, cell) in vars.iter().zip(&raw) {
            self.slot_mut(*var)?.var.store_raw(cell.as_deref())?;
        }
        Ok(true)
    }

    /// Iterate over the remaining rows.
    pub fn rows(&mut self) -> Rows<'_> {
        Rows {
            cursor: self,
            done: false,
        }
    }

    /// Adopt the result set behind a REF CURSOR value.
    pub fn open_ref_cursor(&self, ref_cursor: &RefCursor) -> Result<Cursor> {
        self.check_open()?;
        let handle = self.session.open_ref_cursor(ref_cursor.cursor_id)?;
        let mut cursor = Cursor::new(Arc::clone(&self.session), self.config);
        cursor.handle = Some(handle);
        cursor.state = CursorState::Open;
        cursor.describe_result()?;
        cursor.more_rows = true;
        cursor.state = CursorState::Executed;
        debug!(
            cursor = cursor.id,
            ref_cursor = ref_cursor.cursor_id,
            "opened ref cursor"
        );
        Ok(cursor)
    }

    /// Rows affected by the last DML, or rows fetched so far for a query.
    pub fn rowcount(&self) -> u64 {
        if self.columns.is_some() {
            self.rows_fetched
        } else {
            self.rows_affected
        }
    }

    /// Rows requested per native fetch.
    pub fn arraysize(&self) -> usize {
        self.arraysize
    }

    /// Set rows per native fetch; 0 is treated as 1.
    pub fn set_arraysize(&mut self, arraysize: usize) {
        self.arraysize = arraysize.max(1);
    }

    /// Text of the last prepared statement.
    pub fn statement(&self) -> Option<&str> {
        self.statement.as_ref().map(Statement::sql)
    }

    /// Release the native handle and every variable.
    ///
    /// Safe to call more than once; only the first call releases.
    pub fn close(&mut self) -> Result<()> {
        if self.is_closed() {
            return Ok(());
        }
        self.state = CursorState::Closed;
        self.reset_result();
        self.binds.clear();
        self.vars.clear();
        self.statement = None;
        self.statement_type = StatementType::Unknown;
        if let Some(mut handle) = self.handle.take() {
            handle.release()?;
            debug!(cursor = self.id, "released statement handle");
        }
        Ok(())
    }
}

impl Drop for Cursor {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            warn!(cursor = self.id, error = %err, "failed to release statement handle");
        }
    }
}

impl fmt::Debug for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("statement", &self.statement())
            .field("binds", &self.binds.len())
            .field("arraysize", &self.arraysize)
            .finish()
    }
}

/// Iterator over the remaining rows of a cursor.
///
/// Stops after the first error.
pub struct Rows<'a> {
    cursor: &'a mut Cursor,
    done: bool,
}

impl Iterator for Rows<'_> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.cursor.fetch_one() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}
