//! The connection handle. Opens the remote connection, owns the statements allocated on it and
//! answers the connection level attribute and info functions.

mod attributes;
mod connection_string;
mod info;
mod session;

pub use self::{
    connection_string::{ConnectionString, DRIVER_FULL_NAME, DsnStore, MemoryDsnStore, SERIALIZABLE},
    info::InfoValue,
    session::Session,
};

use std::{collections::HashMap, sync::Arc};

use log::{debug, warn};
use odbc_sys::{HandleType, Len, Pointer, SqlReturn};
use std::primitive::i32 as Integer;
use std::primitive::i16 as SmallInt;
use std::primitive::u16 as USmallInt;

use crate::{
    Error,
    handles::{AsHandle, ErrorQueue, OutputString, State, input_string, write_out},
    remote::Driver,
    statement::Statement,
};

use self::info::{
    ALL_FUNCTIONS, InfoSource, ODBC3_ALL_FUNCTIONS, all_functions, function_exists, info_value,
    odbc3_functions,
};

// Completion options of `SQLDriverConnect`
const SQL_DRIVER_NOPROMPT: USmallInt = 0;
const SQL_DRIVER_COMPLETE: USmallInt = 1;
const SQL_DRIVER_PROMPT: USmallInt = 2;
const SQL_DRIVER_COMPLETE_REQUIRED: USmallInt = 3;

// `SQLEndTran` completion types
const SQL_COMMIT: SmallInt = 0;
const SQL_ROLLBACK: SmallInt = 1;

/// Identifies a statement allocated on a [`Connection`]. Never reused by the same connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StatementId(u64);

/// An ODBC connection handle.
///
/// Attributes may be set before connecting, they are applied to the remote connection once it is
/// open.
pub struct Connection {
    driver: Arc<dyn Driver>,
    dsn_store: Arc<dyn DsnStore>,
    errors: ErrorQueue,
    /// Accumulates over calls to `SQLBrowseConnect`.
    connection_string: ConnectionString,
    session: Option<Arc<Session>>,
    statements: HashMap<StatementId, Statement>,
    next_statement: u64,
    auto_commit: bool,
    /// Isolation level requested by the application, overrides the one of the DSN.
    isolation: Option<u32>,
    read_only: bool,
    login_timeout: u32,
    async_enable: bool,
}

impl Connection {
    pub fn new(driver: Arc<dyn Driver>, dsn_store: Arc<dyn DsnStore>) -> Self {
        Self {
            driver,
            dsn_store,
            errors: ErrorQueue::default(),
            connection_string: ConnectionString::default(),
            session: None,
            statements: HashMap::new(),
            next_statement: 0,
            auto_commit: true,
            isolation: None,
            read_only: false,
            login_timeout: 0,
            async_enable: false,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    /// Attributes the connection has been opened with, after expanding the DSN.
    pub fn connection_string(&self) -> &ConnectionString {
        &self.connection_string
    }

    /// `SQLConnect`. Blank credentials are taken from the profile of the data source.
    ///
    /// # Safety
    ///
    /// Each argument must be NULL, hold the given number of bytes, or be zero terminated if its
    /// length is `SQL_NTS`.
    pub unsafe fn connect(
        &mut self,
        dsn: *const u8,
        dsn_length: SmallInt,
        user: *const u8,
        user_length: SmallInt,
        password: *const u8,
        password_length: SmallInt,
    ) -> SqlReturn {
        self.guarded("SQLConnect", |conn| {
            if conn.is_connected() {
                return Err(Error::ConnectionInUse);
            }
            let read = |text: *const u8, length: SmallInt| -> Result<String, Error> {
                let value = unsafe { input_string(text, length.into()) }?;
                Ok(value.map(|v| v.into_owned()).unwrap_or_default())
            };
            conn.connection_string.dsn = read(dsn, dsn_length)?;
            conn.connection_string.user = read(user, user_length)?;
            conn.connection_string.password = read(password, password_length)?;
            conn.connection_string.expand(conn.dsn_store.as_ref());
            conn.open()?;
            Ok(SqlReturn::SUCCESS)
        })
    }

    /// `SQLDriverConnect`. The driver never shows a dialog, so prompting is only accepted if the
    /// application passes a window.
    ///
    /// # Safety
    ///
    /// `input` must hold `input_length` bytes or be zero terminated if it is `SQL_NTS`. `output`
    /// must be NULL or valid for `output_length` bytes, `output_length_ptr` NULL or valid.
    #[allow(clippy::too_many_arguments)]
    pub unsafe fn driver_connect(
        &mut self,
        window: Pointer,
        input: *const u8,
        input_length: SmallInt,
        output: *mut u8,
        output_length: SmallInt,
        output_length_ptr: *mut SmallInt,
        completion: USmallInt,
    ) -> SqlReturn {
        self.guarded("SQLDriverConnect", |conn| {
            if conn.is_connected() {
                return Err(Error::ConnectionInUse);
            }
            match completion {
                SQL_DRIVER_NOPROMPT | SQL_DRIVER_COMPLETE | SQL_DRIVER_COMPLETE_REQUIRED => (),
                SQL_DRIVER_PROMPT if !window.is_null() => (),
                other => return Err(Error::InvalidOptionIdentifier(other.into())),
            }
            let text = unsafe { input_string(input, input_length.into()) }?.unwrap_or_default();
            conn.apply_connection_string(&text);
            conn.connection_string.expand(conn.dsn_store.as_ref());
            let completed = conn.connection_string.to_string();
            unsafe { conn.write_output(&completed, output, output_length, output_length_ptr) }?;
            conn.open()?;
            Ok(SqlReturn::SUCCESS)
        })
    }

    /// `SQLBrowseConnect`. Returns `SQL_NEED_DATA` and the attributes still missing, until the
    /// accumulated input is complete. Then connects and returns the completed connection string.
    ///
    /// # Safety
    ///
    /// See [`Self::driver_connect`].
    pub unsafe fn browse_connect(
        &mut self,
        input: *const u8,
        input_length: SmallInt,
        output: *mut u8,
        output_length: SmallInt,
        output_length_ptr: *mut SmallInt,
    ) -> SqlReturn {
        self.guarded("SQLBrowseConnect", |conn| {
            if conn.is_connected() {
                return Err(Error::ConnectionInUse);
            }
            let text = unsafe { input_string(input, input_length.into()) }?.unwrap_or_default();
            conn.apply_connection_string(&text);
            if !conn.connection_string.is_complete() {
                let prompt = conn.connection_string.browse_prompt();
                debug!("SQLBrowseConnect: still missing {prompt}");
                unsafe { conn.write_output(&prompt, output, output_length, output_length_ptr) }?;
                return Ok(SqlReturn::NEED_DATA);
            }
            conn.connection_string.expand(conn.dsn_store.as_ref());
            let completed = conn.connection_string.to_string();
            unsafe { conn.write_output(&completed, output, output_length, output_length_ptr) }?;
            conn.open()?;
            Ok(SqlReturn::SUCCESS)
        })
    }

    /// `SQLDisconnect`. Refused while a transaction is pending. Frees every statement, commits and
    /// closes the remote connection. A failure to do so is reported as a warning, the connection
    /// is closed either way.
    pub fn disconnect(&mut self) -> SqlReturn {
        self.guarded("SQLDisconnect", |conn| {
            let Some(session) = &conn.session else {
                return Err(Error::ConnectionNotOpen);
            };
            if session.is_transaction_pending() {
                return Err(Error::TransactionPending);
            }
            conn.statements.clear();
            let Some(session) = conn.session.take() else {
                return Ok(SqlReturn::SUCCESS);
            };
            let remote = session.remote();
            if let Err(error) = remote.commit().and_then(|()| remote.close()) {
                conn.errors.post_state(State::ERROR_IN_DISCONNECT, error.text);
            }
            debug!("Disconnected from '{}'", conn.connection_string.database);
            Ok(SqlReturn::SUCCESS)
        })
    }

    /// `SQLEndTran` on this connection.
    pub fn end_tran(&mut self, completion: SmallInt) -> SqlReturn {
        self.guarded("SQLEndTran", |conn| {
            conn.end_transaction(completion)?;
            Ok(SqlReturn::SUCCESS)
        })
    }

    /// Commits or rolls back. Does nothing if not connected.
    pub(crate) fn end_transaction(&mut self, completion: SmallInt) -> Result<(), Error> {
        let Some(session) = &self.session else {
            return Ok(());
        };
        match completion {
            SQL_COMMIT => session.remote().commit()?,
            SQL_ROLLBACK => session.remote().rollback()?,
            other => return Err(Error::InvalidOptionIdentifier(other.into())),
        }
        session.transaction_ended();
        Ok(())
    }

    /// `SQLGetInfo`. String items are truncated to the buffer with `01004`, numeric items are
    /// written as `SQLUSMALLINT` or `SQLUINTEGER`.
    ///
    /// # Safety
    ///
    /// `value` must be NULL or valid for `buffer_length` bytes (string items), for a `u16` or a
    /// `u32`. `string_length` must be NULL or valid.
    pub unsafe fn get_info(
        &mut self,
        info_type: USmallInt,
        value: Pointer,
        buffer_length: SmallInt,
        string_length: *mut SmallInt,
    ) -> SqlReturn {
        self.guarded("SQLGetInfo", |conn| {
            let meta_data = match &conn.session {
                Some(session) => Some(session.meta_data()?),
                None => None,
            };
            let source = InfoSource {
                dsn: &conn.connection_string.dsn,
                database: &conn.connection_string.database,
                meta_data: meta_data.as_deref(),
            };
            match info_value(info_type, &source)? {
                InfoValue::Text(text) => {
                    let out = unsafe { OutputString::new(value.cast(), buffer_length, string_length) };
                    if out.write(&text) {
                        conn.errors
                            .post_state(State::STRING_DATA_RIGHT_TRUNCATION, "String data, right truncated");
                    }
                }
                InfoValue::Short(short) => unsafe {
                    write_out(value.cast::<u16>(), short);
                    write_out(string_length, 2);
                },
                InfoValue::Long(long) => unsafe {
                    write_out(value.cast::<u32>(), long);
                    write_out(string_length, 4);
                },
            }
            Ok(SqlReturn::SUCCESS)
        })
    }

    /// `SQLGetFunctions`. `SQL_API_ALL_FUNCTIONS` fills an array of 100 entries,
    /// `SQL_API_ODBC3_ALL_FUNCTIONS` a bitmap of 250 words, any other id a single `SQL_TRUE` or
    /// `SQL_FALSE`.
    ///
    /// # Safety
    ///
    /// `supported` must be valid for as many `u16` as the requested layout has.
    pub unsafe fn get_functions(&mut self, function: USmallInt, supported: *mut u16) -> SqlReturn {
        self.guarded("SQLGetFunctions", |_| {
            if supported.is_null() {
                return Err(Error::InvalidUseOfNullPointer);
            }
            let table: &[u16] = match function {
                ALL_FUNCTIONS => all_functions(),
                ODBC3_ALL_FUNCTIONS => odbc3_functions(),
                single => {
                    unsafe { supported.write_unaligned(u16::from(function_exists(single))) };
                    return Ok(SqlReturn::SUCCESS);
                }
            };
            unsafe { std::ptr::copy_nonoverlapping(table.as_ptr(), supported, table.len()) };
            Ok(SqlReturn::SUCCESS)
        })
    }

    /// `SQLNativeSql`. The database understands the statement text as it is.
    ///
    /// # Safety
    ///
    /// `input` must hold `input_length` bytes or be zero terminated if it is `SQL_NTS`. `output`
    /// must be NULL or valid for `output_length` bytes, `output_length_ptr` NULL or valid.
    pub unsafe fn native_sql(
        &mut self,
        input: *const u8,
        input_length: Integer,
        output: *mut u8,
        output_length: Integer,
        output_length_ptr: *mut Integer,
    ) -> SqlReturn {
        self.guarded("SQLNativeSql", |conn| {
            let sql = unsafe { input_string(input, input_length as Len) }?
                .ok_or(Error::InvalidUseOfNullPointer)?;
            if output_length < 0 {
                return Err(Error::InvalidStringOrBufferLength(output_length as Len));
            }
            let out = unsafe { OutputString::new(output, output_length, output_length_ptr) };
            if out.write(&sql) {
                conn.errors
                    .post_state(State::STRING_DATA_RIGHT_TRUNCATION, "String data, right truncated");
            }
            Ok(SqlReturn::SUCCESS)
        })
    }

    /// Allocates a statement. Fails with `08003` unless connected. On failure the diagnostics are
    /// posted to this connection and the return code is passed in `Err`.
    pub fn alloc_statement(&mut self) -> Result<StatementId, SqlReturn> {
        let mut allocated = None;
        let ret = self.guarded("SQLAllocHandle", |conn| {
            let session = conn.session.clone().ok_or(Error::ConnectionNotOpen)?;
            let id = StatementId(conn.next_statement);
            conn.next_statement += 1;
            conn.statements.insert(id, Statement::new(session));
            allocated = Some(id);
            Ok(SqlReturn::SUCCESS)
        });
        allocated.ok_or(ret)
    }

    /// Statement allocated with [`Self::alloc_statement`], unless it has been freed since.
    pub fn statement_mut(&mut self, id: StatementId) -> Option<&mut Statement> {
        self.statements.get_mut(&id)
    }

    /// `SQLFreeHandle` for a statement. Closes whatever the statement has open.
    pub fn free_statement(&mut self, id: StatementId) -> SqlReturn {
        match self.statements.remove(&id) {
            Some(statement) => {
                drop(statement);
                SqlReturn::SUCCESS
            }
            None => SqlReturn::INVALID_HANDLE,
        }
    }

    fn apply_connection_string(&mut self, text: &str) {
        for key in self.connection_string.apply(text) {
            self.errors.post_state(
                State::INVALID_CONNECTION_STRING_ATTRIBUTE,
                format!("Invalid connection string attribute: {key}"),
            );
        }
    }

    /// # Safety
    ///
    /// See [`OutputString::new`].
    unsafe fn write_output(
        &mut self,
        text: &str,
        output: *mut u8,
        output_length: SmallInt,
        output_length_ptr: *mut SmallInt,
    ) -> Result<(), Error> {
        if output_length < 0 {
            return Err(Error::InvalidStringOrBufferLength(output_length.into()));
        }
        let out = unsafe { OutputString::new(output, output_length, output_length_ptr) };
        if out.write(text) {
            self.errors
                .post_state(State::STRING_DATA_RIGHT_TRUNCATION, "String data, right truncated");
        }
        Ok(())
    }

    /// Opens the remote connection with the accumulated connection string and applies the
    /// attributes set so far. The isolation level requested by the application wins over the
    /// one of the data source, which defaults to serializable.
    fn open(&mut self) -> Result<(), Error> {
        let cs = &self.connection_string;
        debug!("Connecting to '{}' as '{}'", cs.database, cs.user);
        let remote = self
            .driver
            .connect(&cs.database, &cs.properties())
            .map_err(Error::ConnectionFailed)?;
        let isolation = self
            .isolation
            .or_else(|| cs.isolation(self.dsn_store.as_ref()))
            .unwrap_or(SERIALIZABLE);
        let configured = remote
            .set_transaction_isolation(isolation)
            .and_then(|()| remote.set_auto_commit(self.auto_commit))
            .and_then(|()| {
                if self.read_only {
                    remote.set_read_only(true)
                } else {
                    Ok(())
                }
            });
        if let Err(error) = configured {
            if let Err(close) = remote.close() {
                warn!("Closing connection after failed setup: {close}");
            }
            return Err(error.into());
        }
        self.session = Some(Arc::new(Session::new(remote, self.auto_commit)));
        Ok(())
    }
}

impl AsHandle for Connection {
    fn handle_type(&self) -> HandleType {
        HandleType::Dbc
    }

    fn error_queue(&self) -> &ErrorQueue {
        &self.errors
    }

    fn error_queue_mut(&mut self) -> &mut ErrorQueue {
        &mut self.errors
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.statements.clear();
        if let Some(session) = self.session.take() {
            if let Err(error) = session.remote().close() {
                warn!("Error closing connection: {error}");
            }
        }
    }
}
