use std::{mem::size_of, ptr};

use odbc_sys::{Pointer, SqlReturn, ULen};
use std::primitive::i32 as Integer;
use std::primitive::u16 as USmallInt;

use crate::{
    Error,
    handles::{AsHandle, Descriptor, State, write_out},
    marshal::BindType,
};

use super::Statement;

const SQL_ATTR_QUERY_TIMEOUT: Integer = 0;
const SQL_ATTR_MAX_ROWS: Integer = 1;
const SQL_ATTR_NOSCAN: Integer = 2;
const SQL_ATTR_MAX_LENGTH: Integer = 3;
const SQL_ATTR_ROW_BIND_TYPE: Integer = 5;
const SQL_ATTR_CURSOR_TYPE: Integer = 6;
const SQL_ATTR_CONCURRENCY: Integer = 7;
const SQL_ATTR_ROW_NUMBER: Integer = 14;
const SQL_ATTR_PARAM_BIND_OFFSET_PTR: Integer = 17;
const SQL_ATTR_PARAM_BIND_TYPE: Integer = 18;
const SQL_ATTR_ROW_STATUS_PTR: Integer = 25;
const SQL_ATTR_ROWS_FETCHED_PTR: Integer = 26;
const SQL_ATTR_ROW_ARRAY_SIZE: Integer = 27;
const SQL_ATTR_APP_ROW_DESC: Integer = 10010;
const SQL_ATTR_APP_PARAM_DESC: Integer = 10011;
const SQL_ATTR_IMP_ROW_DESC: Integer = 10012;
const SQL_ATTR_IMP_PARAM_DESC: Integer = 10013;

const SQL_CURSOR_FORWARD_ONLY: ULen = 0;
const SQL_CONCUR_READ_ONLY: ULen = 1;

/// Statement attributes set by the application. Pointers are owned by the application.
#[derive(Debug, Clone)]
pub struct Attributes {
    /// Rows per call to fetch (`SQL_ATTR_ROW_ARRAY_SIZE`).
    pub row_array_size: usize,
    /// `SQL_ATTR_ROWS_FETCHED_PTR`
    pub rows_fetched: *mut ULen,
    /// `SQL_ATTR_ROW_STATUS_PTR`, one entry per row of the rowset.
    pub row_status: *mut USmallInt,
    /// Rows delivered from one result set at most, `0` for no limit.
    pub max_rows: usize,
    pub row_bind_type: BindType,
    pub param_bind_type: BindType,
    /// `SQL_ATTR_PARAM_BIND_OFFSET_PTR`
    pub param_bind_offset: *const ULen,
    pub query_timeout: u32,
    pub no_scan: ULen,
}

impl Default for Attributes {
    fn default() -> Self {
        Self {
            row_array_size: 1,
            rows_fetched: ptr::null_mut(),
            row_status: ptr::null_mut(),
            max_rows: 0,
            row_bind_type: BindType::Column,
            param_bind_type: BindType::Column,
            param_bind_offset: ptr::null(),
            query_timeout: 0,
            no_scan: 0,
        }
    }
}

impl Attributes {
    /// Offset added to the pointers of bound parameters.
    pub fn param_bind_offset(&self) -> usize {
        if self.param_bind_offset.is_null() {
            0
        } else {
            unsafe { self.param_bind_offset.read_unaligned() }
        }
    }

    /// # Safety
    ///
    /// The row status array must hold at least [`Self::row_array_size`] entries.
    pub unsafe fn set_row_status(&self, row: usize, status: USmallInt) {
        if !self.row_status.is_null() {
            unsafe { self.row_status.add(row).write_unaligned(status) }
        }
    }

    /// # Safety
    ///
    /// The rows fetched pointer must be NULL or valid.
    pub unsafe fn set_rows_fetched(&self, rows: usize) {
        unsafe { write_out(self.rows_fetched, rows) }
    }
}

fn descriptor_address(descriptor: &Descriptor) -> ULen {
    descriptor as *const Descriptor as ULen
}

impl Statement {
    /// `SQLSetStmtAttr`. Integer attributes are passed in `value` itself.
    ///
    /// Cursor types other than forward only and concurrency other than read only are replaced by
    /// the supported value with `01S02`.
    ///
    /// # Safety
    ///
    /// Pointer attributes must stay valid for as long as they are set.
    pub unsafe fn set_stmt_attr(
        &mut self,
        attribute: Integer,
        value: Pointer,
        _length: Integer,
    ) -> SqlReturn {
        self.guarded("SQLSetStmtAttr", |stmt| {
            let number = value as ULen;
            let attributes = &mut stmt.attributes;
            match attribute {
                SQL_ATTR_PARAM_BIND_TYPE => attributes.param_bind_type = BindType::from_raw(number),
                SQL_ATTR_PARAM_BIND_OFFSET_PTR => {
                    attributes.param_bind_offset = value as *const ULen
                }
                SQL_ATTR_ROWS_FETCHED_PTR => attributes.rows_fetched = value as *mut ULen,
                SQL_ATTR_ROW_STATUS_PTR => attributes.row_status = value as *mut USmallInt,
                SQL_ATTR_MAX_ROWS => attributes.max_rows = number,
                SQL_ATTR_ROW_ARRAY_SIZE => {
                    if number == 0 {
                        return Err(Error::InvalidAttributeValue);
                    }
                    attributes.row_array_size = number
                }
                SQL_ATTR_ROW_BIND_TYPE => attributes.row_bind_type = BindType::from_raw(number),
                SQL_ATTR_QUERY_TIMEOUT => {
                    attributes.query_timeout = u32::try_from(number).unwrap_or(u32::MAX)
                }
                SQL_ATTR_NOSCAN => attributes.no_scan = number,
                SQL_ATTR_CURSOR_TYPE => {
                    if number != SQL_CURSOR_FORWARD_ONLY {
                        stmt.errors.post_state(
                            State::OPTION_VALUE_CHANGED,
                            format!(
                                "Cursor type {number} not supported, only SQL_CURSOR_FORWARD_ONLY"
                            ),
                        );
                    }
                }
                SQL_ATTR_CONCURRENCY => {
                    if number != SQL_CONCUR_READ_ONLY {
                        stmt.errors.post_state(
                            State::OPTION_VALUE_CHANGED,
                            format!("Concurrency {number} not supported, only SQL_CONCUR_READ_ONLY"),
                        );
                    }
                }
                other => {
                    return Err(Error::NotImplemented(format!(
                        "set statement attribute {other}"
                    )));
                }
            }
            Ok(SqlReturn::SUCCESS)
        })
    }

    /// `SQLGetStmtAttr`. Every supported attribute is an integer or a pointer, written as
    /// [`ULen`].
    ///
    /// # Safety
    ///
    /// `value` must be NULL or valid for a [`ULen`], `length` NULL or valid for an [`Integer`].
    pub unsafe fn get_stmt_attr(
        &mut self,
        attribute: Integer,
        value: Pointer,
        _buffer_length: Integer,
        length: *mut Integer,
    ) -> SqlReturn {
        self.guarded("SQLGetStmtAttr", |stmt| {
            let attributes = &stmt.attributes;
            let number: ULen = match attribute {
                SQL_ATTR_APP_ROW_DESC => descriptor_address(&stmt.app_row_desc),
                SQL_ATTR_APP_PARAM_DESC => descriptor_address(&stmt.app_param_desc),
                SQL_ATTR_IMP_ROW_DESC => descriptor_address(&stmt.imp_row_desc),
                SQL_ATTR_IMP_PARAM_DESC => descriptor_address(&stmt.imp_param_desc),
                SQL_ATTR_CURSOR_TYPE => SQL_CURSOR_FORWARD_ONLY,
                SQL_ATTR_CONCURRENCY => SQL_CONCUR_READ_ONLY,
                SQL_ATTR_MAX_LENGTH => 0,
                SQL_ATTR_MAX_ROWS => attributes.max_rows,
                SQL_ATTR_ROW_NUMBER => stmt.rows_per_fetch,
                SQL_ATTR_ROW_BIND_TYPE => attributes.row_bind_type.as_raw(),
                SQL_ATTR_PARAM_BIND_TYPE => attributes.param_bind_type.as_raw(),
                SQL_ATTR_ROW_ARRAY_SIZE => attributes.row_array_size,
                SQL_ATTR_QUERY_TIMEOUT => attributes.query_timeout as ULen,
                SQL_ATTR_NOSCAN => attributes.no_scan,
                SQL_ATTR_PARAM_BIND_OFFSET_PTR => attributes.param_bind_offset as ULen,
                SQL_ATTR_ROWS_FETCHED_PTR => attributes.rows_fetched as ULen,
                SQL_ATTR_ROW_STATUS_PTR => attributes.row_status as ULen,
                other => {
                    return Err(Error::NotImplemented(format!(
                        "get statement attribute {other}"
                    )));
                }
            };
            unsafe {
                write_out(value as *mut ULen, number);
                write_out(length, size_of::<ULen>() as Integer);
            }
            Ok(SqlReturn::SUCCESS)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::Attributes;

    #[test]
    fn defaults() {
        let attributes = Attributes::default();
        assert_eq!(1, attributes.row_array_size);
        assert_eq!(0, attributes.max_rows);
        assert_eq!(0, attributes.param_bind_offset());
    }

    #[test]
    fn bind_offset_is_read_through_the_pointer() {
        let offset = 16usize;
        let attributes = Attributes {
            param_bind_offset: &offset,
            ..Attributes::default()
        };
        assert_eq!(16, attributes.param_bind_offset());
    }

    #[test]
    fn row_status_array() {
        let mut status = [9u16; 3];
        let attributes = Attributes {
            row_status: status.as_mut_ptr(),
            row_array_size: 3,
            ..Attributes::default()
        };

        unsafe {
            attributes.set_row_status(1, 0);
            attributes.set_row_status(2, 3);
        }

        assert_eq!([9, 0, 3], status);
    }
}
