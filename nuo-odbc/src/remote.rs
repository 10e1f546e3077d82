//! Interface of the remote SQL client library ODBC calls are translated into.
//!
//! The driver core never talks to a server itself. Everything it needs from the database is
//! expressed by the traits in this module, which follow the object model of the client library: a
//! connection hands out prepared and callable statements, executing them yields result sets, and
//! metadata objects describe columns, parameters and the database itself.
//!
//! Type codes exchanged through these traits are the `i32` codes of the client library. They agree
//! with the ODBC SQL type codes for every type both know, see [`types`] for the ones which differ.

mod error;
pub mod memory;

pub use self::error::{RemoteError, codes};

use std::sync::Arc;

/// Type codes of the client library which have no identical counterpart among the ODBC SQL type
/// codes.
pub mod types {
    /// Type of a column which is a literal `NULL` in the select list.
    pub const NULL: i32 = 0;
    pub const BOOLEAN: i32 = 16;
    pub const BLOB: i32 = 2004;
    pub const CLOB: i32 = 2005;
    pub const NCLOB: i32 = 2011;
}

/// Factory for remote connections. Stands in for the client library as a whole.
pub trait Driver: Send + Sync {
    /// Opens a connection to `database`. `properties` carry credentials and the default schema.
    fn connect(
        &self,
        database: &str,
        properties: &Properties,
    ) -> Result<Box<dyn RemoteConnection>, RemoteError>;
}

/// Key value pairs passed to [`Driver::connect`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: Vec<(String, String)>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to `value`, replacing an earlier value for the same key.
    pub fn put(&mut self, key: &str, value: &str) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value.to_owned(),
            None => self.entries.push((key.to_owned(), value.to_owned())),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// An open connection to the database.
///
/// Methods take `&self`, since statements of the same connection share it.
pub trait RemoteConnection: Send + Sync {
    fn close(&self) -> Result<(), RemoteError>;
    fn commit(&self) -> Result<(), RemoteError>;
    fn rollback(&self) -> Result<(), RemoteError>;
    fn set_auto_commit(&self, auto_commit: bool) -> Result<(), RemoteError>;
    /// `level` uses the ODBC bit values (`1` read uncommitted ... `8` serializable).
    fn set_transaction_isolation(&self, level: u32) -> Result<(), RemoteError>;
    fn transaction_isolation(&self) -> Result<u32, RemoteError>;
    fn set_read_only(&self, read_only: bool) -> Result<(), RemoteError>;
    /// Prepares an ordinary statement. Generated keys of inserts are requested from the server.
    fn prepare_statement(&self, sql: &str) -> Result<Box<dyn PreparedStatement>, RemoteError>;
    /// Prepares the invocation of a stored procedure.
    fn prepare_call(&self, sql: &str) -> Result<Box<dyn CallableStatement>, RemoteError>;
    fn meta_data(&self) -> Result<Arc<dyn DatabaseMetaData>, RemoteError>;
}

/// A prepared statement. Parameter indices are `1` based.
pub trait PreparedStatement: Send {
    fn set_null(&mut self, index: i32, sql_type: i32) -> Result<(), RemoteError>;
    fn set_string(&mut self, index: i32, value: &str) -> Result<(), RemoteError>;
    fn set_bytes(&mut self, index: i32, value: &[u8]) -> Result<(), RemoteError>;
    fn set_short(&mut self, index: i32, value: i16) -> Result<(), RemoteError>;
    fn set_int(&mut self, index: i32, value: i32) -> Result<(), RemoteError>;
    fn set_long(&mut self, index: i32, value: i64) -> Result<(), RemoteError>;
    fn set_float(&mut self, index: i32, value: f32) -> Result<(), RemoteError>;
    fn set_double(&mut self, index: i32, value: f64) -> Result<(), RemoteError>;
    fn set_byte(&mut self, index: i32, value: i8) -> Result<(), RemoteError>;

    /// `true` if the first result is a result set.
    fn execute(&mut self) -> Result<bool, RemoteError>;
    /// Number of rows affected by the last execution, `-1` if the result was a result set.
    fn update_count(&mut self) -> Result<i64, RemoteError>;
    /// Moves to the next result. `true` if it is a result set.
    fn more_results(&mut self) -> Result<bool, RemoteError>;
    fn generated_keys(&mut self) -> Result<Option<Box<dyn ResultSet>>, RemoteError>;
    fn result_set(&mut self) -> Result<Option<Box<dyn ResultSet>>, RemoteError>;
    fn parameter_meta_data(&mut self) -> Result<Arc<dyn ParameterMetaData>, RemoteError>;
    /// Shape of the result set, if the statement is known to produce one before it is executed.
    fn meta_data(&mut self) -> Result<Option<Arc<dyn ResultSetMetaData>>, RemoteError>;
    fn set_query_timeout(&mut self, seconds: u32) -> Result<(), RemoteError>;
    fn close(&mut self) -> Result<(), RemoteError>;
}

/// Stored procedure invocation. Output parameters are read through [`ValueSource`] after
/// execution.
pub trait CallableStatement: PreparedStatement + ValueSource {
    fn register_out_parameter(&mut self, index: i32, sql_type: i32) -> Result<(), RemoteError>;
    fn as_prepared(&mut self) -> &mut dyn PreparedStatement;
    fn as_values(&mut self) -> &mut dyn ValueSource;
}

/// Epoch seconds plus the sub second part of a timestamp value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RemoteTimestamp {
    pub seconds: i64,
    pub nanos: u32,
}

/// Typed access to the values of the current row of a result set, or the output parameters of a
/// callable statement. Indices are `1` based.
///
/// Getters of a `NULL` value return the zero value of their type and make [`Self::was_null`]
/// return `true` until the next getter call.
pub trait ValueSource {
    fn was_null(&self) -> bool;
    /// Type of the column or parameter at `index` as a client library type code.
    fn value_type(&self, index: i32) -> Result<i32, RemoteError>;
    fn get_string(&mut self, index: i32) -> Result<String, RemoteError>;
    fn get_blob(&mut self, index: i32) -> Result<Box<dyn Blob>, RemoteError>;
    fn get_short(&mut self, index: i32) -> Result<i16, RemoteError>;
    fn get_int(&mut self, index: i32) -> Result<i32, RemoteError>;
    fn get_long(&mut self, index: i32) -> Result<i64, RemoteError>;
    fn get_float(&mut self, index: i32) -> Result<f32, RemoteError>;
    fn get_double(&mut self, index: i32) -> Result<f64, RemoteError>;
    fn get_byte(&mut self, index: i32) -> Result<i8, RemoteError>;
    fn get_boolean(&mut self, index: i32) -> Result<bool, RemoteError>;
    /// Midnight of the date in epoch seconds.
    fn get_date(&mut self, index: i32) -> Result<i64, RemoteError>;
    /// Time of day in epoch seconds.
    fn get_time(&mut self, index: i32) -> Result<i64, RemoteError>;
    fn get_timestamp(&mut self, index: i32) -> Result<RemoteTimestamp, RemoteError>;
}

/// Large binary value. Read in pieces.
pub trait Blob {
    /// Length of the value in bytes.
    fn length(&self) -> usize;
    /// Copies the bytes starting at `offset` into `buf`. Returns the number of bytes copied.
    fn read(&self, offset: usize, buf: &mut [u8]) -> Result<usize, RemoteError>;
}

impl Blob for Vec<u8> {
    fn length(&self) -> usize {
        self.len()
    }

    fn read(&self, offset: usize, buf: &mut [u8]) -> Result<usize, RemoteError> {
        let available = self.get(offset..).unwrap_or_default();
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        Ok(n)
    }
}

/// Cursor over the rows of a query result or a catalog function. Dropping it releases it.
pub trait ResultSet: ValueSource + Send {
    /// Advances to the next row. `false` once the rows are exhausted.
    fn next(&mut self) -> Result<bool, RemoteError>;
    /// `1` based index of the column with the given name.
    fn find_column(&self, name: &str) -> Result<i32, RemoteError>;
    fn meta_data(&self) -> Arc<dyn ResultSetMetaData>;
    fn as_values(&mut self) -> &mut dyn ValueSource;
}

/// Shape of a result set. Column indices are `1` based.
pub trait ResultSetMetaData: Send + Sync {
    fn column_count(&self) -> i32;
    fn column_type(&self, column: i32) -> i32;
    fn column_name(&self, column: i32) -> String;
    fn column_label(&self, column: i32) -> String;
    fn column_type_name(&self, column: i32) -> String;
    fn precision(&self, column: i32) -> i32;
    fn scale(&self, column: i32) -> i32;
    /// Largest length of a value in this column seen so far, `0` if unknown.
    fn current_column_max_length(&self, column: i32) -> i32;
    fn is_nullable(&self, column: i32) -> bool;
    fn is_writable(&self, column: i32) -> bool;
    fn is_searchable(&self, column: i32) -> bool;
    fn is_case_sensitive(&self, column: i32) -> bool;
    fn is_auto_increment(&self, column: i32) -> bool;
    fn is_currency(&self, column: i32) -> bool;
    fn is_signed(&self, column: i32) -> bool;
    fn table_name(&self, column: i32) -> String;
    fn schema_name(&self, column: i32) -> String;
    fn catalog_name(&self, column: i32) -> String;
}

/// Shape of the parameters of a prepared statement. Parameter indices are `1` based.
pub trait ParameterMetaData: Send + Sync {
    fn parameter_count(&self) -> i32;
    fn parameter_type(&self, parameter: i32) -> i32;
    fn precision(&self, parameter: i32) -> i32;
    fn scale(&self, parameter: i32) -> i32;
    fn is_nullable(&self, parameter: i32) -> bool;
}

/// Catalog enumeration and capability queries. `None` arguments match everything.
pub trait DatabaseMetaData: Send + Sync {
    fn tables(
        &self,
        catalog: Option<&str>,
        schema: Option<&str>,
        table: Option<&str>,
        types: &[String],
    ) -> Result<Box<dyn ResultSet>, RemoteError>;
    fn columns(
        &self,
        catalog: Option<&str>,
        schema: Option<&str>,
        table: Option<&str>,
        column: Option<&str>,
    ) -> Result<Box<dyn ResultSet>, RemoteError>;
    fn primary_keys(
        &self,
        catalog: Option<&str>,
        schema: Option<&str>,
        table: Option<&str>,
    ) -> Result<Box<dyn ResultSet>, RemoteError>;
    fn index_info(
        &self,
        catalog: Option<&str>,
        schema: Option<&str>,
        table: Option<&str>,
        unique: bool,
        approximate: bool,
    ) -> Result<Box<dyn ResultSet>, RemoteError>;
    fn procedures(
        &self,
        catalog: Option<&str>,
        schema: Option<&str>,
        procedure: Option<&str>,
    ) -> Result<Box<dyn ResultSet>, RemoteError>;
    fn procedure_columns(
        &self,
        catalog: Option<&str>,
        schema: Option<&str>,
        procedure: Option<&str>,
        column: Option<&str>,
    ) -> Result<Box<dyn ResultSet>, RemoteError>;
    /// One row per supported type, with a `DATA_TYPE` column holding the type code.
    fn type_info(&self) -> Result<Box<dyn ResultSet>, RemoteError>;

    fn supports_transaction_isolation_level(&self, level: u32) -> bool;
    fn default_transaction_isolation(&self) -> u32;
    fn supports_open_cursors_across_commit(&self) -> bool;
    fn supports_open_cursors_across_rollback(&self) -> bool;
    fn supports_open_statements_across_commit(&self) -> bool;
    fn supports_open_statements_across_rollback(&self) -> bool;
    fn identifier_quote_string(&self) -> String;
    fn catalog_term(&self) -> String;
    fn schema_term(&self) -> String;
    fn procedure_term(&self) -> String;
    fn search_string_escape(&self) -> String;
    fn user_name(&self) -> String;
    fn database_product_name(&self) -> String;
    fn database_product_version(&self) -> String;
}
