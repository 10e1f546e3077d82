use std::mem::size_of;

use odbc_sys::{Pointer, SqlReturn, ULen};
use std::primitive::i32 as Integer;

use crate::{
    Error,
    handles::{AsHandle, State, write_out},
};

use super::{Connection, SERIALIZABLE};

const SQL_ATTR_ASYNC_ENABLE: Integer = 4;
const SQL_ATTR_ACCESS_MODE: Integer = 101;
const SQL_ATTR_AUTOCOMMIT: Integer = 102;
const SQL_ATTR_LOGIN_TIMEOUT: Integer = 103;
const SQL_ATTR_TXN_ISOLATION: Integer = 108;

const SQL_ASYNC_ENABLE_OFF: ULen = 0;
const SQL_MODE_READ_WRITE: ULen = 0;
const SQL_MODE_READ_ONLY: ULen = 1;
const SQL_AUTOCOMMIT_ON: ULen = 1;

impl Connection {
    /// `SQLSetConnectAttr`. Every supported attribute is an integer passed in `value` itself.
    /// Attributes set before connecting are applied once the connection is open.
    ///
    /// # Safety
    ///
    /// `value` is never dereferenced.
    pub unsafe fn set_connect_attr(
        &mut self,
        attribute: Integer,
        value: Pointer,
        _length: Integer,
    ) -> SqlReturn {
        self.guarded("SQLSetConnectAttr", |conn| {
            let number = value as ULen;
            match attribute {
                SQL_ATTR_ASYNC_ENABLE => {
                    if number != SQL_ASYNC_ENABLE_OFF {
                        conn.errors.post_state(
                            State::OPTION_VALUE_CHANGED,
                            "Asynchronous execution not supported",
                        );
                    }
                    conn.async_enable = false;
                }
                SQL_ATTR_ACCESS_MODE => {
                    let read_only = match number {
                        SQL_MODE_READ_ONLY => true,
                        SQL_MODE_READ_WRITE => false,
                        _ => return Err(Error::InvalidAttributeValue),
                    };
                    if let Some(session) = &conn.session {
                        session.remote().set_read_only(read_only)?;
                    }
                    conn.read_only = read_only;
                }
                SQL_ATTR_AUTOCOMMIT => {
                    let auto_commit = number == SQL_AUTOCOMMIT_ON;
                    if let Some(session) = &conn.session {
                        session.set_auto_commit(auto_commit)?;
                    }
                    conn.auto_commit = auto_commit;
                }
                SQL_ATTR_LOGIN_TIMEOUT => {
                    conn.login_timeout = u32::try_from(number).unwrap_or(u32::MAX)
                }
                SQL_ATTR_TXN_ISOLATION => {
                    let level = u32::try_from(number).map_err(|_| Error::InvalidAttributeValue)?;
                    if let Some(session) = &conn.session {
                        if session.is_transaction_pending() {
                            return Err(Error::TransactionPending);
                        }
                        session.remote().set_transaction_isolation(level)?;
                    }
                    conn.isolation = Some(level);
                }
                other => {
                    return Err(Error::NotImplemented(format!(
                        "set connection attribute {other}"
                    )));
                }
            }
            Ok(SqlReturn::SUCCESS)
        })
    }

    /// `SQLGetConnectAttr`. Values are written as `SQLUINTEGER`.
    ///
    /// # Safety
    ///
    /// `value` must be NULL or valid for a `u32`, `length` NULL or valid for an [`Integer`].
    pub unsafe fn get_connect_attr(
        &mut self,
        attribute: Integer,
        value: Pointer,
        _buffer_length: Integer,
        length: *mut Integer,
    ) -> SqlReturn {
        self.guarded("SQLGetConnectAttr", |conn| {
            let number: u32 = match attribute {
                SQL_ATTR_ASYNC_ENABLE => conn.async_enable.into(),
                SQL_ATTR_ACCESS_MODE => conn.read_only.into(),
                SQL_ATTR_AUTOCOMMIT => conn.auto_commit.into(),
                SQL_ATTR_LOGIN_TIMEOUT => conn.login_timeout,
                SQL_ATTR_TXN_ISOLATION => match &conn.session {
                    Some(session) => session.remote().transaction_isolation()?,
                    None => conn.isolation.unwrap_or(SERIALIZABLE),
                },
                other => {
                    return Err(Error::NotImplemented(format!(
                        "get connection attribute {other}"
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
