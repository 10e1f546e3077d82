use odbc_sys::{HandleType, Len, Pointer, SqlReturn};
use std::primitive::i32 as Integer;
use std::primitive::i16 as SmallInt;

use super::{AsHandle, ErrorQueue, buffer::write_out};
use crate::Error;

const SQL_DESC_COUNT: SmallInt = 1001;
const SQL_DESC_OCTET_LENGTH_PTR: SmallInt = 1004;
const SQL_DESC_INDICATOR_PTR: SmallInt = 1009;
const SQL_DESC_DATA_PTR: SmallInt = 1010;

/// Which of the four descriptors of a statement this is.
///
/// * IPD Implementation parameter descriptor
/// * APD Application parameter descriptor
/// * IRD Implemenation row descriptor
/// * ARD Application row descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorRole {
    ApplicationRow,
    ApplicationParameter,
    ImplementationRow,
    ImplementationParameter,
}

/// Field level description of one column or parameter.
#[derive(Debug, Clone)]
pub struct DescRecord {
    pub name: String,
    pub data_ptr: Pointer,
    pub octet_length_ptr: *mut Len,
    pub indicator_ptr: *mut Len,
    pub sql_type: SmallInt,
    pub sub_type: SmallInt,
    pub length: Len,
    pub precision: SmallInt,
    pub scale: SmallInt,
    pub buffer_length: Len,
    pub nullable: SmallInt,
}

impl Default for DescRecord {
    fn default() -> Self {
        Self {
            name: String::new(),
            data_ptr: std::ptr::null_mut(),
            octet_length_ptr: std::ptr::null_mut(),
            indicator_ptr: std::ptr::null_mut(),
            sql_type: 0,
            sub_type: 0,
            length: 0,
            precision: 0,
            scale: 0,
            buffer_length: 0,
            nullable: 0,
        }
    }
}

/// A descriptor owned by a statement. Applications reach it through the statement attributes
/// `SQL_ATTR_APP_ROW_DESC` and friends and may inspect or alter the pointer fields of its records.
///
/// Records are addressed by their number. Record `0` is the bookmark record. Touching a record
/// beyond the current end grows the descriptor.
#[derive(Debug)]
pub struct Descriptor {
    role: DescriptorRole,
    records: Vec<DescRecord>,
    count: SmallInt,
    errors: ErrorQueue,
}

// Raw pointers in the records belong to the application, the descriptor only hands them back.
unsafe impl Send for Descriptor {}

impl Descriptor {
    pub fn new(role: DescriptorRole) -> Self {
        Self {
            role,
            records: Vec::new(),
            count: 0,
            errors: ErrorQueue::default(),
        }
    }

    pub fn role(&self) -> DescriptorRole {
        self.role
    }

    /// Number of the highest record in use (`SQL_DESC_COUNT`).
    pub fn count(&self) -> SmallInt {
        self.count
    }

    pub fn record(&self, rec_number: SmallInt) -> Option<&DescRecord> {
        self.records.get(usize::try_from(rec_number).ok()?)
    }

    /// Record `rec_number`, allocated on demand.
    pub fn record_mut(&mut self, rec_number: SmallInt) -> Result<&mut DescRecord, Error> {
        let index = usize::try_from(rec_number).map_err(|_| Error::InvalidDescriptorIndex {
            index: i32::from(rec_number),
        })?;
        if index >= self.records.len() {
            self.records.resize_with(index + 1, DescRecord::default);
        }
        self.count = self.count.max(rec_number);
        Ok(&mut self.records[index])
    }

    fn set_count(&mut self, count: SmallInt) -> Result<(), Error> {
        let new_len = usize::try_from(count).map_err(|_| Error::InvalidAttributeValue)? + 1;
        self.records.resize_with(new_len, DescRecord::default);
        self.count = count;
        Ok(())
    }

    /// `SQLSetDescField`
    ///
    /// # Safety
    ///
    /// For the pointer fields `value` must remain valid for as long as the descriptor uses it.
    pub unsafe fn set_desc_field(
        &mut self,
        rec_number: SmallInt,
        field: SmallInt,
        value: Pointer,
        buffer_length: Integer,
    ) -> SqlReturn {
        self.guarded("SQLSetDescField", |desc| {
            match field {
                SQL_DESC_COUNT => desc.set_count(value as isize as SmallInt)?,
                SQL_DESC_DATA_PTR => {
                    let record = desc.record_mut(rec_number)?;
                    record.data_ptr = value;
                    record.buffer_length = buffer_length as Len;
                }
                SQL_DESC_OCTET_LENGTH_PTR => {
                    desc.record_mut(rec_number)?.octet_length_ptr = value as *mut Len
                }
                SQL_DESC_INDICATOR_PTR => {
                    desc.record_mut(rec_number)?.indicator_ptr = value as *mut Len
                }
                _ => return Err(Error::InvalidFieldIdentifier(field)),
            }
            Ok(SqlReturn::SUCCESS)
        })
    }

    /// `SQLGetDescField`
    ///
    /// # Safety
    ///
    /// `value` must be NULL or valid for writing the field (`SmallInt` for the count, a pointer
    /// otherwise). `string_length` must be NULL or valid.
    pub unsafe fn get_desc_field(
        &mut self,
        rec_number: SmallInt,
        field: SmallInt,
        value: Pointer,
        _buffer_length: Integer,
        string_length: *mut Integer,
    ) -> SqlReturn {
        self.guarded("SQLGetDescField", |desc| {
            if field == SQL_DESC_COUNT {
                unsafe {
                    write_out(value as *mut SmallInt, desc.count);
                    write_out(string_length, size_of::<SmallInt>() as Integer);
                }
                return Ok(SqlReturn::SUCCESS);
            }
            let record = desc.record_mut(rec_number)?;
            let pointer = match field {
                SQL_DESC_DATA_PTR => record.data_ptr,
                SQL_DESC_OCTET_LENGTH_PTR => record.octet_length_ptr as Pointer,
                SQL_DESC_INDICATOR_PTR => record.indicator_ptr as Pointer,
                _ => return Err(Error::InvalidFieldIdentifier(field)),
            };
            unsafe {
                write_out(value as *mut Pointer, pointer);
                write_out(string_length, size_of::<Pointer>() as Integer);
            }
            Ok(SqlReturn::SUCCESS)
        })
    }
}

impl AsHandle for Descriptor {
    fn handle_type(&self) -> HandleType {
        HandleType::Desc
    }

    fn error_queue(&self) -> &ErrorQueue {
        &self.errors
    }

    fn error_queue_mut(&mut self) -> &mut ErrorQueue {
        &mut self.errors
    }
}
