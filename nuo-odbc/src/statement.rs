//! The statement handle: prepared statement, result set, the three binding tables and the state
//! in between executing and fetching.

mod attributes;
mod catalog_functions;
mod data_at_exec;
mod describe;
mod procedure;

use self::data_at_exec::PutData;

pub use self::{attributes::Attributes, procedure::is_procedure_call};

use std::{cmp::min, sync::Arc};

use log::{debug, warn};
use odbc_sys::{HandleType, Len, Pointer, SqlDataType, SqlReturn};
use std::primitive::i32 as Integer;
use std::primitive::i16 as SmallInt;
use std::primitive::u16 as USmallInt;

use crate::{
    Error,
    bindings::{Bindings, DataAtExec, Indicator, ParamRole},
    connection::Session,
    handles::{
        AsHandle, CType, Descriptor, DescriptorRole, ErrorQueue, required_input_string, write_out,
    },
    marshal::{BindType, ParameterChunk, set_parameter, set_value},
    remote::{CallableStatement, PreparedStatement, ResultSet, ResultSetMetaData, ValueSource},
};

/// Columns which may be bound before the shape of the result set is known.
const MAX_COLUMNS_WITHOUT_META_DATA: u16 = 10_000;

// Options of `SQLFreeStmt`
const SQL_CLOSE: USmallInt = 0;
const SQL_UNBIND: USmallInt = 2;
const SQL_RESET_PARAMS: USmallInt = 3;

// Row status values
const SQL_ROW_SUCCESS: USmallInt = 0;
const SQL_ROW_NOROW: USmallInt = 3;
const SQL_ROW_SUCCESS_WITH_INFO: USmallInt = 6;

/// `SQL_FETCH_NEXT`
const FETCH_NEXT: SmallInt = 1;

/// The statement prepared in the database.
enum Prepared {
    Plain(Box<dyn PreparedStatement>),
    /// Invocation of a stored procedure, which may have output parameters.
    Call(Box<dyn CallableStatement>),
}

impl Prepared {
    fn statement(&mut self) -> &mut dyn PreparedStatement {
        match self {
            Prepared::Plain(statement) => statement.as_mut(),
            Prepared::Call(call) => call.as_prepared(),
        }
    }
}

/// An ODBC statement handle.
///
/// Owns at most one prepared statement and at most one result set. Replacing either releases the
/// previous one.
pub struct Statement {
    session: Arc<Session>,
    errors: ErrorQueue,
    /// Text of the last prepared statement, or the name of the last catalog function.
    sql: String,
    prepared: Option<Prepared>,
    result_set: Option<Box<dyn ResultSet>>,
    meta_data: Option<Arc<dyn ResultSetMetaData>>,
    column_count: u16,
    fetch_bindings: Bindings,
    parameters: Bindings,
    get_data_bindings: Bindings,
    attributes: Attributes,
    app_row_desc: Box<Descriptor>,
    app_param_desc: Box<Descriptor>,
    imp_row_desc: Box<Descriptor>,
    imp_param_desc: Box<Descriptor>,
    /// The result set has been read to its end.
    eof: bool,
    /// Set by `SQLCancel`, observed by the next fetch.
    cancel: bool,
    /// Update count of the last execution. `-1` once it has been reported.
    row_count: i64,
    /// Rows delivered by the last call to fetch.
    rows_per_fetch: usize,
    /// Rows delivered from the current result set.
    rows_per_select: usize,
    /// Progress of a data at execution sequence.
    put_data: PutData,
    returned_generated_keys: bool,
}

impl Statement {
    pub(crate) fn new(session: Arc<Session>) -> Self {
        Self {
            session,
            errors: ErrorQueue::default(),
            sql: String::new(),
            prepared: None,
            result_set: None,
            meta_data: None,
            column_count: 0,
            fetch_bindings: Bindings::default(),
            parameters: Bindings::default(),
            get_data_bindings: Bindings::default(),
            attributes: Attributes::default(),
            app_row_desc: Box::new(Descriptor::new(DescriptorRole::ApplicationRow)),
            app_param_desc: Box::new(Descriptor::new(DescriptorRole::ApplicationParameter)),
            imp_row_desc: Box::new(Descriptor::new(DescriptorRole::ImplementationRow)),
            imp_param_desc: Box::new(Descriptor::new(DescriptorRole::ImplementationParameter)),
            eof: false,
            cancel: false,
            row_count: -1,
            rows_per_fetch: 0,
            rows_per_select: 0,
            put_data: PutData::Idle,
            returned_generated_keys: false,
        }
    }

    /// One of the four descriptors owned by this statement.
    pub fn descriptor_mut(&mut self, role: DescriptorRole) -> &mut Descriptor {
        match role {
            DescriptorRole::ApplicationRow => &mut self.app_row_desc,
            DescriptorRole::ApplicationParameter => &mut self.app_param_desc,
            DescriptorRole::ImplementationRow => &mut self.imp_row_desc,
            DescriptorRole::ImplementationParameter => &mut self.imp_param_desc,
        }
    }

    /// Text of the statement last prepared.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// `SQLPrepare`
    ///
    /// # Safety
    ///
    /// `sql` must point to `length` bytes, or to a zero terminated string if `length` is
    /// `SQL_NTS`.
    pub unsafe fn prepare(&mut self, sql: *const u8, length: Integer) -> SqlReturn {
        self.guarded("SQLPrepare", |stmt| {
            let sql = unsafe { required_input_string(sql, length as Len) }?;
            stmt.prepare_text(&sql)
        })
    }

    /// `SQLExecDirect`
    ///
    /// # Safety
    ///
    /// See [`Self::prepare`].
    pub unsafe fn exec_direct(&mut self, sql: *const u8, length: Integer) -> SqlReturn {
        self.guarded("SQLExecDirect", |stmt| {
            let sql = unsafe { required_input_string(sql, length as Len) }?;
            stmt.prepare_text(&sql)?;
            stmt.execute_statement()
        })
    }

    /// `SQLExecute`
    pub fn execute(&mut self) -> SqlReturn {
        self.guarded("SQLExecute", |stmt| stmt.execute_statement())
    }

    /// `SQLBindCol`. A NULL `target` unbinds the column.
    ///
    /// # Safety
    ///
    /// `target` must be valid for `buffer_length` bytes (times the row array size) and
    /// `indicator` NULL or valid for a [`Len`] per row, for as long as the column stays bound.
    pub unsafe fn bind_col(
        &mut self,
        column: USmallInt,
        target_type: SmallInt,
        target: Pointer,
        buffer_length: Len,
        indicator: *mut Len,
    ) -> SqlReturn {
        self.guarded("SQLBindCol", |stmt| {
            let limit = match &stmt.meta_data {
                Some(_) => stmt.column_count,
                None => MAX_COLUMNS_WITHOUT_META_DATA,
            };
            if column == 0 || column > limit {
                return Err(Error::InvalidDescriptorIndex {
                    index: column.into(),
                });
            }
            let c_type = CType::from_raw(target_type).ok_or(Error::InvalidBufferType(target_type))?;
            debug!("SQLBindCol: column {column} type {c_type:?} buffer length {buffer_length}");
            if stmt.meta_data.is_some() {
                stmt.fetch_bindings.alloc(usize::from(stmt.column_count));
            }
            let binding = stmt.fetch_bindings.slot(column);
            binding.role = ParamRole::Output;
            binding.c_type = c_type;
            binding.pointer = target;
            binding.buffer_length = buffer_length;
            binding.indicator = indicator;
            binding.reset();
            Ok(SqlReturn::SUCCESS)
        })
    }

    /// `SQLBindParameter`
    ///
    /// # Safety
    ///
    /// `value` must be valid for `buffer_length` bytes and `indicator` NULL or valid for a
    /// [`Len`], until the statement is executed for the last time.
    #[allow(clippy::too_many_arguments)]
    pub unsafe fn bind_parameter(
        &mut self,
        parameter: USmallInt,
        io_type: SmallInt,
        value_type: SmallInt,
        parameter_type: SmallInt,
        column_size: usize,
        _decimal_digits: SmallInt,
        value: Pointer,
        buffer_length: Len,
        indicator: *mut Len,
    ) -> SqlReturn {
        self.guarded("SQLBindParameter", |stmt| {
            if parameter == 0 {
                return Err(Error::InvalidParameterNumber(parameter));
            }
            let role = ParamRole::from_raw(io_type).ok_or(Error::InvalidAttributeValue)?;
            let c_type =
                CType::from_raw(value_type).ok_or(Error::InvalidBindParameterType(value_type))?;
            if buffer_length < 0 {
                return Err(Error::InvalidStringOrBufferLength(buffer_length));
            }
            if parameter > stmt.parameters.len() {
                let mut needed = usize::from(parameter);
                if let Some(prepared) = &mut stmt.prepared {
                    let declared = prepared.statement().parameter_meta_data()?.parameter_count();
                    needed = needed.max(usize::try_from(declared).unwrap_or(0));
                }
                stmt.parameters.alloc(needed);
            }
            let binding = stmt.parameters.slot(parameter);
            binding.role = role;
            binding.c_type = c_type;
            binding.sql_type = SqlDataType(parameter_type);
            binding.pointer = value;
            binding.buffer_length = buffer_length;
            binding.column_size = column_size;
            binding.indicator = indicator;
            binding.accumulator.clear();
            binding.reset();
            debug!(
                "SQLBindParameter: parameter {parameter} {role:?} {c_type:?} column size \
                {column_size} buffer length {buffer_length}"
            );
            Ok(SqlReturn::SUCCESS)
        })
    }

    /// `SQLFetch`
    pub fn fetch(&mut self) -> SqlReturn {
        self.guarded("SQLFetch", |stmt| stmt.fetch_rows())
    }

    /// `SQLFetchScroll`. Forward only cursors only move to the next rowset.
    pub fn fetch_scroll(&mut self, orientation: SmallInt, _offset: Len) -> SqlReturn {
        self.guarded("SQLFetchScroll", |stmt| {
            if orientation != FETCH_NEXT {
                return Err(Error::FetchTypeOutOfRange(orientation));
            }
            stmt.fetch_rows()
        })
    }

    /// `SQLGetData`. Repeated calls for the same column continue where the previous one stopped.
    /// The indicator receives the number of bytes which have been available before the call.
    ///
    /// # Safety
    ///
    /// `target` must be valid for `buffer_length` bytes, `indicator` NULL or valid for a [`Len`].
    pub unsafe fn get_data(
        &mut self,
        column: USmallInt,
        target_type: SmallInt,
        target: Pointer,
        buffer_length: Len,
        indicator: *mut Len,
    ) -> SqlReturn {
        self.guarded("SQLGetData", |stmt| {
            if column == 0 {
                return Err(Error::InvalidDescriptorIndex { index: 0 });
            }
            let c_type = CType::from_raw(target_type).ok_or(Error::InvalidBufferType(target_type))?;
            let Statement {
                result_set,
                prepared,
                get_data_bindings,
                errors,
                ..
            } = stmt;
            let source: &mut dyn ValueSource = match (result_set, prepared) {
                (Some(result_set), _) => result_set.as_values(),
                (None, Some(Prepared::Call(call))) => call.as_values(),
                _ => return Err(Error::InvalidCursorState),
            };
            let binding = get_data_bindings.slot(column);
            binding.c_type = c_type;
            binding.pointer = target;
            binding.buffer_length = buffer_length;
            binding.indicator = indicator;
            set_value(binding, column, source, 0, BindType::Column, errors)
        })
    }

    /// `SQLMoreResults`
    pub fn more_results(&mut self) -> SqlReturn {
        self.guarded("SQLMoreResults", |stmt| {
            if stmt.prepared.is_none() {
                return Ok(SqlReturn::NO_DATA);
            }
            if stmt.next_result_set(false)? {
                Ok(SqlReturn::SUCCESS)
            } else {
                Ok(SqlReturn::NO_DATA)
            }
        })
    }

    /// `SQLRowCount`. Each update count is reported once, afterwards `-1`.
    ///
    /// # Safety
    ///
    /// `row_count` must be NULL or valid for writing a [`Len`].
    pub unsafe fn row_count(&mut self, row_count: *mut Len) -> SqlReturn {
        self.guarded("SQLRowCount", |stmt| {
            let value = if stmt.prepared.is_some() {
                std::mem::replace(&mut stmt.row_count, -1)
            } else {
                0
            };
            unsafe { write_out(row_count, value as Len) };
            Ok(SqlReturn::SUCCESS)
        })
    }

    /// `SQLCancel`. Takes effect with the next fetch, which fails with `HY008`. A pending data at
    /// execution sequence is abandoned right away.
    pub fn cancel(&mut self) -> SqlReturn {
        self.guarded("SQLCancel", |stmt| {
            stmt.cancel = true;
            if stmt.put_data != PutData::Idle {
                debug!("SQLCancel: abandoning data at execution sequence");
                stmt.put_data = PutData::Idle;
                stmt.parameters.reset();
            }
            Ok(SqlReturn::SUCCESS)
        })
    }

    /// `SQLCloseCursor`
    pub fn close_cursor(&mut self) -> SqlReturn {
        self.guarded("SQLCloseCursor", |stmt| {
            if stmt.result_set.is_none() {
                return Err(Error::InvalidCursorState);
            }
            stmt.release_result_set();
            Ok(SqlReturn::SUCCESS)
        })
    }

    /// `SQLFreeStmt` with `SQL_CLOSE`, `SQL_UNBIND` or `SQL_RESET_PARAMS`. Dropping the statement
    /// is up to the connection owning it.
    pub fn free_stmt(&mut self, option: USmallInt) -> SqlReturn {
        self.guarded("SQLFreeStmt", |stmt| {
            match option {
                SQL_CLOSE => stmt.release_result_set(),
                SQL_UNBIND => stmt.fetch_bindings.release(),
                SQL_RESET_PARAMS => stmt.parameters.release(),
                other => return Err(Error::InvalidOptionIdentifier(other.into())),
            }
            Ok(SqlReturn::SUCCESS)
        })
    }

    fn prepare_text(&mut self, sql: &str) -> Result<SqlReturn, Error> {
        self.release_statement()?;
        self.sql = sql.to_owned();
        debug!("SQLPrepare: {sql}");
        let remote = self.session.remote();
        if is_procedure_call(sql) {
            self.prepared = Some(Prepared::Call(remote.prepare_call(sql)?));
        } else {
            let mut statement = remote.prepare_statement(sql)?;
            if let Some(meta_data) = statement.meta_data()? {
                self.column_count = column_count(meta_data.as_ref());
                self.meta_data = Some(meta_data);
            }
            self.prepared = Some(Prepared::Plain(statement));
        }
        Ok(SqlReturn::SUCCESS)
    }

    /// Sends the bound parameters and executes, unless a parameter awaits data at execution.
    fn execute_statement(&mut self) -> Result<SqlReturn, Error> {
        let Statement {
            prepared,
            parameters,
            attributes,
            ..
        } = self;
        let statement = prepared
            .as_mut()
            .ok_or(Error::FunctionSequence)?
            .statement();
        parameters.reset();
        let parameter_meta_data = statement.parameter_meta_data()?;
        let declared = u16::try_from(parameter_meta_data.parameter_count()).unwrap_or(0);
        let bind_offset = attributes.param_bind_offset();
        let mut need_data = false;
        for number in 1..=min(declared, parameters.len()) {
            let Some(binding) = parameters.get_mut(number) else {
                continue;
            };
            if !binding.role.is_input() {
                continue;
            }
            let chunk = unsafe { ParameterChunk::bound(binding, bind_offset) }?;
            match chunk.indicator {
                Indicator::DataAtExec => {
                    binding.data_at_exec = Some(DataAtExec::Streaming);
                    need_data = true;
                }
                Indicator::DataAtExecLength(length) => {
                    binding.data_at_exec = Some(DataAtExec::Remaining(length));
                    need_data = true;
                }
                _ => {
                    let parameter_type = || Ok(parameter_meta_data.parameter_type(number.into()));
                    unsafe { set_parameter(binding, number, chunk, true, statement, parameter_type) }?
                }
            }
        }
        if need_data {
            debug!("SQLExecute: parameters need data at execution");
            self.put_data = PutData::Pending;
            return Ok(SqlReturn::NEED_DATA);
        }
        statement.set_query_timeout(attributes.query_timeout)?;
        self.run()
    }

    /// Executes the prepared statement with the parameters already set.
    fn run(&mut self) -> Result<SqlReturn, Error> {
        self.release_result_set();
        self.put_data = PutData::Idle;
        let Statement {
            prepared,
            parameters,
            errors,
            session,
            ..
        } = self;
        let prepared = prepared.as_mut().ok_or(Error::FunctionSequence)?;
        if let Prepared::Call(call) = prepared {
            for (number, binding) in parameters.iter() {
                if binding.role.is_output() {
                    call.register_out_parameter(number.into(), binding.sql_type.0.into())?;
                }
            }
        }
        let has_result_set = prepared.statement().execute()?;
        session.transaction_started();
        debug!("executed, result set: {has_result_set}");

        if let Prepared::Call(call) = prepared {
            for number in 1..=parameters.len() {
                let Some(binding) = parameters.get_mut(number) else {
                    continue;
                };
                if binding.is_bound() && binding.role.is_output() {
                    binding.reset();
                    set_value(binding, number, call.as_values(), 0, BindType::Column, errors)?;
                }
            }
        }
        self.row_count = prepared.statement().update_count()?;
        self.returned_generated_keys = false;
        if has_result_set {
            self.next_result_set(true)?;
        }
        Ok(SqlReturn::SUCCESS)
    }

    /// Moves on to the next result set. Generated keys come first, once per execution.
    fn next_result_set(&mut self, first: bool) -> Result<bool, Error> {
        self.eof = false;
        self.cancel = false;
        self.rows_per_select = 0;
        let Some(prepared) = self.prepared.as_mut() else {
            return Ok(false);
        };
        let statement = prepared.statement();
        if !self.returned_generated_keys {
            self.returned_generated_keys = true;
            if let Some(keys) = statement.generated_keys()? {
                if keys.meta_data().column_count() > 0 {
                    self.set_result_set(keys);
                    return Ok(true);
                }
            }
        }
        if !first && !statement.more_results()? {
            self.release_result_set();
            return Ok(false);
        }
        match statement.result_set()? {
            Some(result_set) => {
                self.set_result_set(result_set);
                Ok(true)
            }
            None => {
                self.release_result_set();
                Ok(false)
            }
        }
    }

    fn fetch_rows(&mut self) -> Result<SqlReturn, Error> {
        if self.result_set.is_none() {
            return Err(Error::InvalidCursorState);
        }
        if self.cancel {
            self.release_result_set();
            return Err(Error::OperationCanceled);
        }
        let Statement {
            result_set: Some(result_set),
            fetch_bindings,
            get_data_bindings,
            attributes,
            errors,
            eof,
            rows_per_fetch,
            rows_per_select,
            ..
        } = self
        else {
            return Err(Error::InvalidCursorState);
        };
        let array_size = attributes.row_array_size;
        for row in 0..array_size {
            unsafe { attributes.set_row_status(row, SQL_ROW_NOROW) };
        }
        *rows_per_fetch = 0;
        for row in 0..array_size {
            let capped = attributes.max_rows > 0 && *rows_per_select >= attributes.max_rows;
            if *eof || capped || !result_set.next()? {
                *eof = true;
                return if *rows_per_fetch > 0 {
                    Ok(SqlReturn::SUCCESS)
                } else {
                    Ok(SqlReturn::NO_DATA)
                };
            }
            fetch_bindings.reset();
            let posted = errors.len();
            for column in 1..=fetch_bindings.len() {
                let Some(binding) = fetch_bindings.get_mut(column) else {
                    continue;
                };
                if binding.is_bound() && binding.role != ParamRole::Input {
                    set_value(
                        binding,
                        column,
                        result_set.as_values(),
                        row,
                        attributes.row_bind_type,
                        errors,
                    )?;
                }
            }
            get_data_bindings.reset();
            let status = if errors.len() > posted {
                SQL_ROW_SUCCESS_WITH_INFO
            } else {
                SQL_ROW_SUCCESS
            };
            unsafe { attributes.set_row_status(row, status) };
            *rows_per_fetch += 1;
            *rows_per_select += 1;
            unsafe { attributes.set_rows_fetched(*rows_per_fetch) };
        }
        Ok(SqlReturn::SUCCESS)
    }

    fn set_result_set(&mut self, result_set: Box<dyn ResultSet>) {
        self.release_result_set();
        let meta_data = result_set.meta_data();
        self.column_count = column_count(meta_data.as_ref());
        self.meta_data = Some(meta_data);
        self.result_set = Some(result_set);
        self.eof = false;
        self.cancel = false;
    }

    fn release_result_set(&mut self) {
        if self.result_set.take().is_some() {
            self.meta_data = None;
        }
        self.get_data_bindings.release();
    }

    fn release_statement(&mut self) -> Result<(), Error> {
        self.release_result_set();
        self.meta_data = None;
        self.column_count = 0;
        self.put_data = PutData::Idle;
        if let Some(mut prepared) = self.prepared.take() {
            prepared.statement().close()?;
        }
        Ok(())
    }
}

fn column_count(meta_data: &dyn ResultSetMetaData) -> u16 {
    u16::try_from(meta_data.column_count()).unwrap_or(0)
}

impl AsHandle for Statement {
    fn handle_type(&self) -> HandleType {
        HandleType::Stmt
    }

    fn error_queue(&self) -> &ErrorQueue {
        &self.errors
    }

    fn error_queue_mut(&mut self) -> &mut ErrorQueue {
        &mut self.errors
    }
}

impl Drop for Statement {
    fn drop(&mut self) {
        if let Err(error) = self.release_statement() {
            warn!("Error closing statement '{}': {error}", self.sql);
        }
    }
}

#[cfg(test)]
mod tests;
