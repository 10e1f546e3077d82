use std::{collections::HashMap, mem::size_of, sync::Arc};

use log::debug;
use odbc_sys::{HandleType, Pointer, SqlReturn};
use std::primitive::i32 as Integer;
use std::primitive::i16 as SmallInt;

use crate::{
    Error,
    connection::{Connection, DsnStore},
    handles::{AsHandle, ErrorQueue, write_out},
    remote::Driver,
};

const SQL_ATTR_ODBC_VERSION: Integer = 200;
const SQL_ATTR_CONNECTION_POOLING: Integer = 201;
const SQL_ATTR_CP_MATCH: Integer = 202;
const SQL_ATTR_OUTPUT_NTS: Integer = 10001;

const SQL_OV_ODBC3: u32 = 3;
const SQL_CP_OFF: u32 = 0;
const SQL_CP_STRICT_MATCH: u32 = 0;
const SQL_TRUE: u32 = 1;

/// Identifies a connection allocated on an [`Environment`]. Never reused by the same environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

/// The environment handle. Root of every other handle, and the only one allocated without a
/// parent.
///
/// The environment owns its connections, which own their statements. Freeing the environment
/// closes everything still open.
pub struct Environment {
    driver: Arc<dyn Driver>,
    dsn_store: Arc<dyn DsnStore>,
    errors: ErrorQueue,
    connections: HashMap<ConnectionId, Connection>,
    next_connection: u64,
    odbc_version: u32,
    cp_match: u32,
}

impl Environment {
    /// `driver` opens remote connections, `dsn_store` holds the profiles of the data sources.
    pub fn new(driver: Arc<dyn Driver>, dsn_store: Arc<dyn DsnStore>) -> Self {
        Self {
            driver,
            dsn_store,
            errors: ErrorQueue::default(),
            connections: HashMap::new(),
            next_connection: 0,
            odbc_version: SQL_OV_ODBC3,
            cp_match: SQL_CP_STRICT_MATCH,
        }
    }

    /// `SQLAllocHandle` for a connection.
    pub fn alloc_connection(&mut self) -> ConnectionId {
        self.errors.clear();
        let id = ConnectionId(self.next_connection);
        self.next_connection += 1;
        let connection = Connection::new(self.driver.clone(), self.dsn_store.clone());
        self.connections.insert(id, connection);
        debug!("Allocated connection {id:?}");
        id
    }

    pub fn connection_mut(&mut self, id: ConnectionId) -> Option<&mut Connection> {
        self.connections.get_mut(&id)
    }

    /// `SQLFreeHandle` for a connection. The connection must have been disconnected.
    pub fn free_connection(&mut self, id: ConnectionId) -> SqlReturn {
        let Some(connection) = self.connections.get(&id) else {
            return SqlReturn::INVALID_HANDLE;
        };
        if connection.is_connected() {
            let connected = self.guarded("SQLFreeHandle", |_| Err(Error::FunctionSequence));
            return connected;
        }
        self.connections.remove(&id);
        SqlReturn::SUCCESS
    }

    /// `SQLEndTran` for the environment: commits or rolls back every open connection. Failures
    /// are reported on the connection they occurred on.
    pub fn end_tran(&mut self, completion: SmallInt) -> SqlReturn {
        self.errors.clear();
        let mut ret = SqlReturn::SUCCESS;
        for connection in self.connections.values_mut() {
            let outcome = connection.end_tran(completion);
            if outcome != SqlReturn::SUCCESS {
                ret = outcome;
            }
        }
        ret
    }

    /// `SQLSetEnvAttr`. Connection pooling can only be switched off, output strings are always
    /// zero terminated.
    ///
    /// # Safety
    ///
    /// `value` is never dereferenced.
    pub unsafe fn set_env_attr(
        &mut self,
        attribute: Integer,
        value: Pointer,
        _length: Integer,
    ) -> SqlReturn {
        self.guarded("SQLSetEnvAttr", |env| {
            let number = u32::try_from(value as usize).map_err(|_| Error::InvalidAttributeValue)?;
            match attribute {
                SQL_ATTR_ODBC_VERSION => env.odbc_version = number,
                SQL_ATTR_CONNECTION_POOLING if number == SQL_CP_OFF => (),
                SQL_ATTR_CP_MATCH => env.cp_match = number,
                SQL_ATTR_OUTPUT_NTS if number == SQL_TRUE => (),
                SQL_ATTR_CONNECTION_POOLING | SQL_ATTR_OUTPUT_NTS => {
                    return Err(Error::InvalidAttributeValue);
                }
                other => {
                    return Err(Error::NotImplemented(format!(
                        "environment attribute {other}"
                    )));
                }
            }
            Ok(SqlReturn::SUCCESS)
        })
    }

    /// `SQLGetEnvAttr`. Values are written as `SQLUINTEGER`.
    ///
    /// # Safety
    ///
    /// `value` must be NULL or valid for a `u32`, `length` NULL or valid for an [`Integer`].
    pub unsafe fn get_env_attr(
        &mut self,
        attribute: Integer,
        value: Pointer,
        _buffer_length: Integer,
        length: *mut Integer,
    ) -> SqlReturn {
        self.guarded("SQLGetEnvAttr", |env| {
            let number = match attribute {
                SQL_ATTR_ODBC_VERSION => env.odbc_version,
                SQL_ATTR_CONNECTION_POOLING => SQL_CP_OFF,
                SQL_ATTR_CP_MATCH => env.cp_match,
                SQL_ATTR_OUTPUT_NTS => SQL_TRUE,
                other => {
                    return Err(Error::NotImplemented(format!(
                        "environment attribute {other}"
                    )));
                }
            };
            unsafe {
                write_out(value as *mut u32, number);
                write_out(length, size_of::<u32>() as Integer);
            }
            Ok(SqlReturn::SUCCESS)
        })
    }
}

impl AsHandle for Environment {
    fn handle_type(&self) -> HandleType {
        HandleType::Env
    }

    fn error_queue(&self) -> &ErrorQueue {
        &self.errors
    }

    fn error_queue_mut(&mut self) -> &mut ErrorQueue {
        &mut self.errors
    }
}
