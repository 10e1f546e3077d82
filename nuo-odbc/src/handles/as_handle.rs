use std::panic::{self, AssertUnwindSafe};

use log::debug;
use odbc_sys::{HandleType, Pointer, SqlReturn};
use std::primitive::i32 as Integer;
use std::primitive::i16 as SmallInt;

use super::{
    ErrorQueue, Record, State,
    buffer::{OutputString, write_out},
};
use crate::Error;

const SQL_DIAG_NUMBER: SmallInt = 2;
const SQL_DIAG_SQLSTATE: SmallInt = 4;
const SQL_DIAG_NATIVE: SmallInt = 5;
const SQL_DIAG_MESSAGE_TEXT: SmallInt = 6;
const SQL_DIAG_CLASS_ORIGIN: SmallInt = 8;
const SQL_DIAG_SUBCLASS_ORIGIN: SmallInt = 9;
const SQL_DIAG_CONNECTION_NAME: SmallInt = 10;
const SQL_DIAG_SERVER_NAME: SmallInt = 11;

/// Behaviour shared by every handle the driver hands out: it owns an [`ErrorQueue`], runs its
/// operations through [`AsHandle::guarded`] and answers the diagnostic functions.
pub trait AsHandle {
    /// The type of the ODBC handle, used for logging.
    fn handle_type(&self) -> HandleType;

    fn error_queue(&self) -> &ErrorQueue;

    fn error_queue_mut(&mut self) -> &mut ErrorQueue;

    /// Executes one public operation of the handle. Clears the error queue, posts the error of a
    /// failed operation, upgrades success to success with info if a warning has been posted, and
    /// catches panics, so nothing ever unwinds into the caller of the driver.
    fn guarded<F>(&mut self, function: &'static str, operation: F) -> SqlReturn
    where
        Self: Sized,
        F: FnOnce(&mut Self) -> Result<SqlReturn, Error>,
    {
        self.error_queue_mut().clear();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| operation(&mut *self)));
        let handle_type = self.handle_type();
        let queue = self.error_queue_mut();
        match outcome {
            Ok(Ok(ret)) => queue.success(ret),
            Ok(Err(error)) => {
                debug!("{function} failed on {handle_type:?} handle: {error}");
                queue.post(error.to_record());
                SqlReturn::ERROR
            }
            Err(_) => {
                queue.post_state(
                    State::GENERAL_ERROR,
                    format!("Internal driver error in {function}"),
                );
                SqlReturn::ERROR
            }
        }
    }

    /// `SQLGetDiagRec`. Consumes the oldest pending record, regardless of `rec_number`, which only
    /// needs to be positive.
    ///
    /// # Safety
    ///
    /// `state` must be NULL or valid for six bytes, `message` NULL or valid for `buffer_length`
    /// bytes, the remaining pointers NULL or valid for their type.
    unsafe fn get_diag_rec(
        &mut self,
        rec_number: SmallInt,
        state: *mut u8,
        native_error: *mut Integer,
        message: *mut u8,
        buffer_length: SmallInt,
        text_length: *mut SmallInt,
    ) -> SqlReturn {
        if rec_number < 1 || buffer_length < 0 {
            return SqlReturn::ERROR;
        }
        match self.error_queue_mut().pop() {
            Some(record) => unsafe {
                write_record(&record, state, native_error, message, buffer_length, text_length)
            },
            None => SqlReturn::NO_DATA,
        }
    }

    /// Legacy `SQLError`. Consumes the oldest pending record. Reports state `00000` if there is
    /// none.
    ///
    /// # Safety
    ///
    /// See [`AsHandle::get_diag_rec`].
    unsafe fn error(
        &mut self,
        state: *mut u8,
        native_error: *mut Integer,
        message: *mut u8,
        buffer_length: SmallInt,
        text_length: *mut SmallInt,
    ) -> SqlReturn {
        match self.error_queue_mut().pop() {
            Some(record) => unsafe {
                write_record(&record, state, native_error, message, buffer_length, text_length)
            },
            None => {
                unsafe {
                    OutputString::<SmallInt>::new(state, 6, std::ptr::null_mut()).write("00000");
                }
                SqlReturn::NO_DATA
            }
        }
    }

    /// `SQLGetDiagField`. Reads a single field of a pending record without consuming it. Record
    /// number `0` addresses the header, of which only `SQL_DIAG_NUMBER` is supported.
    ///
    /// # Safety
    ///
    /// `info` must be NULL or valid for `buffer_length` bytes (string fields) or an `Integer`
    /// (numeric fields). `string_length` must be NULL or valid.
    unsafe fn get_diag_field(
        &mut self,
        rec_number: SmallInt,
        diag_identifier: SmallInt,
        info: Pointer,
        buffer_length: SmallInt,
        string_length: *mut SmallInt,
    ) -> SqlReturn {
        let queue = self.error_queue();
        if rec_number == 0 {
            return match diag_identifier {
                SQL_DIAG_NUMBER => {
                    let count = Integer::try_from(queue.len()).unwrap_or(Integer::MAX);
                    unsafe { write_out(info as *mut Integer, count) };
                    SqlReturn::SUCCESS
                }
                _ => SqlReturn::ERROR,
            };
        }
        let Some(record) = queue.get(rec_number) else {
            return if rec_number < 0 {
                SqlReturn::ERROR
            } else {
                SqlReturn::NO_DATA
            };
        };
        let text = match diag_identifier {
            SQL_DIAG_CLASS_ORIGIN | SQL_DIAG_SUBCLASS_ORIGIN => record.state.class_origin(),
            SQL_DIAG_CONNECTION_NAME | SQL_DIAG_SERVER_NAME => "",
            SQL_DIAG_MESSAGE_TEXT => record.message.as_str(),
            SQL_DIAG_SQLSTATE => record.state.as_str(),
            SQL_DIAG_NATIVE => {
                unsafe { write_out(info as *mut Integer, record.native_error) };
                return SqlReturn::SUCCESS;
            }
            _ => return SqlReturn::ERROR,
        };
        let out = unsafe { OutputString::new(info as *mut u8, buffer_length, string_length) };
        if out.write(text) {
            SqlReturn::SUCCESS_WITH_INFO
        } else {
            SqlReturn::SUCCESS
        }
    }
}

unsafe fn write_record(
    record: &Record,
    state: *mut u8,
    native_error: *mut Integer,
    message: *mut u8,
    buffer_length: SmallInt,
    text_length: *mut SmallInt,
) -> SqlReturn {
    unsafe {
        OutputString::<SmallInt>::new(state, 6, std::ptr::null_mut()).write(record.state.as_str());
        write_out(native_error, record.native_error);
        let truncated = OutputString::new(message, buffer_length, text_length).write(&record.message);
        if truncated {
            SqlReturn::SUCCESS_WITH_INFO
        } else {
            SqlReturn::SUCCESS
        }
    }
}
