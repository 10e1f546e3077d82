//! Result sets of the catalog functions (`SQLColumns`, `SQLGetTypeInfo`, ...).
//!
//! The database reports types in its own codes. [`MappedResultSet`] wraps the enumeration returned
//! by the database metadata and translates the `DATA_TYPE` column into ODBC codes, optionally
//! skipping every row whose type differs from the one the application asked for.

use std::sync::Arc;

use odbc_sys::SqlDataType;

use crate::{
    handles::sql_type_from_remote,
    remote::{Blob, RemoteError, RemoteTimestamp, ResultSet, ResultSetMetaData, ValueSource},
};

/// Name of the column holding type codes in catalog result sets.
const DATA_TYPE: &str = "DATA_TYPE";

/// `SQL_ALL_TYPES`
pub const ALL_TYPES: i16 = 0;

/// Catalog result set with its type codes translated to ODBC.
pub struct MappedResultSet {
    base: Box<dyn ResultSet>,
    /// `1` based index of the `DATA_TYPE` column, if there is one.
    type_column: Option<i32>,
    /// Only rows of this type are visible.
    filter: Option<SqlDataType>,
}

impl MappedResultSet {
    pub fn new(base: Box<dyn ResultSet>) -> Self {
        let type_column = base.find_column(DATA_TYPE).ok();
        Self {
            base,
            type_column,
            filter: None,
        }
    }

    /// Like [`Self::new`], but hides all rows whose `DATA_TYPE` is not `sql_type`. [`ALL_TYPES`]
    /// hides nothing.
    pub fn filtered(base: Box<dyn ResultSet>, sql_type: i16) -> Self {
        let mut mapped = Self::new(base);
        if sql_type != ALL_TYPES {
            mapped.filter = Some(SqlDataType(sql_type));
        }
        mapped
    }

    fn is_type_column(&self, index: i32) -> bool {
        self.type_column == Some(index)
    }

    fn mapped_type(&mut self, index: i32) -> Result<i16, RemoteError> {
        let raw = self.base.get_int(index)?;
        Ok(sql_type_from_remote(raw).0)
    }

    fn accepts(&mut self) -> Result<bool, RemoteError> {
        match (self.filter, self.type_column) {
            (Some(wanted), Some(column)) => Ok(self.mapped_type(column)? == wanted.0),
            _ => Ok(true),
        }
    }
}

impl ValueSource for MappedResultSet {
    fn was_null(&self) -> bool {
        self.base.was_null()
    }

    fn value_type(&self, index: i32) -> Result<i32, RemoteError> {
        self.base.value_type(index)
    }

    fn get_string(&mut self, index: i32) -> Result<String, RemoteError> {
        if self.is_type_column(index) {
            return Ok(self.mapped_type(index)?.to_string());
        }
        self.base.get_string(index)
    }

    fn get_blob(&mut self, index: i32) -> Result<Box<dyn Blob>, RemoteError> {
        self.base.get_blob(index)
    }

    fn get_short(&mut self, index: i32) -> Result<i16, RemoteError> {
        if self.is_type_column(index) {
            return self.mapped_type(index);
        }
        self.base.get_short(index)
    }

    fn get_int(&mut self, index: i32) -> Result<i32, RemoteError> {
        if self.is_type_column(index) {
            return self.mapped_type(index).map(i32::from);
        }
        self.base.get_int(index)
    }

    fn get_long(&mut self, index: i32) -> Result<i64, RemoteError> {
        if self.is_type_column(index) {
            return self.mapped_type(index).map(i64::from);
        }
        self.base.get_long(index)
    }

    fn get_float(&mut self, index: i32) -> Result<f32, RemoteError> {
        self.base.get_float(index)
    }

    fn get_double(&mut self, index: i32) -> Result<f64, RemoteError> {
        self.base.get_double(index)
    }

    fn get_byte(&mut self, index: i32) -> Result<i8, RemoteError> {
        self.base.get_byte(index)
    }

    fn get_boolean(&mut self, index: i32) -> Result<bool, RemoteError> {
        self.base.get_boolean(index)
    }

    fn get_date(&mut self, index: i32) -> Result<i64, RemoteError> {
        self.base.get_date(index)
    }

    fn get_time(&mut self, index: i32) -> Result<i64, RemoteError> {
        self.base.get_time(index)
    }

    fn get_timestamp(&mut self, index: i32) -> Result<RemoteTimestamp, RemoteError> {
        self.base.get_timestamp(index)
    }
}

impl ResultSet for MappedResultSet {
    fn next(&mut self) -> Result<bool, RemoteError> {
        while self.base.next()? {
            if self.accepts()? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn find_column(&self, name: &str) -> Result<i32, RemoteError> {
        self.base.find_column(name)
    }

    fn meta_data(&self) -> Arc<dyn ResultSetMetaData> {
        self.base.meta_data()
    }

    fn as_values(&mut self) -> &mut dyn ValueSource {
        self
    }
}
