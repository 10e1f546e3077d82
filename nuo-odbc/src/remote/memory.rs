//! In memory implementation of the client library interface.
//!
//! Statements are scripted by their SQL text: [`MemoryDatabase::script`] registers what
//! executing a statement yields (rows, update count, generated keys, output parameter values or
//! an error). Every execution is recorded together with the parameter values it has been
//! executed with, so ODBC call sequences can be verified without a server.

use std::{
    collections::{BTreeMap, HashMap, VecDeque},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use log::debug;

use super::{
    Blob, CallableStatement, DatabaseMetaData, Driver, ParameterMetaData, PreparedStatement,
    Properties, RemoteConnection, RemoteError, RemoteTimestamp, ResultSet, ResultSetMetaData,
    ValueSource, codes, types,
};

/// Type codes shared with ODBC, used by the memory backend.
mod sql {
    pub const CHAR: i32 = 1;
    pub const INTEGER: i32 = 4;
    pub const SMALLINT: i32 = 5;
    pub const DOUBLE: i32 = 8;
    pub const VARCHAR: i32 = 12;
    pub const BIGINT: i32 = -5;
    pub const DATE: i32 = 91;
    pub const TIME: i32 = 92;
    pub const TIMESTAMP: i32 = 93;
}

/// A single value stored in a table or passed as parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Text(String),
    Bytes(Vec<u8>),
    Boolean(bool),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Byte(i8),
    /// Epoch seconds of midnight.
    Date(i64),
    /// Epoch seconds.
    Time(i64),
    Timestamp(RemoteTimestamp),
}

impl Value {
    /// Type code of the client library for this value.
    pub fn type_code(&self) -> i32 {
        match self {
            Value::Null => types::NULL,
            Value::Text(_) => sql::VARCHAR,
            Value::Bytes(_) => types::BLOB,
            Value::Boolean(_) => types::BOOLEAN,
            Value::Short(_) => sql::SMALLINT,
            Value::Int(_) => sql::INTEGER,
            Value::Long(_) => sql::BIGINT,
            Value::Float(_) => 7,
            Value::Double(_) => sql::DOUBLE,
            Value::Byte(_) => -6,
            Value::Date(_) => sql::DATE,
            Value::Time(_) => sql::TIME,
            Value::Timestamp(_) => sql::TIMESTAMP,
        }
    }

    fn to_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Text(text) => text.clone(),
            Value::Bytes(bytes) => String::from_utf8_lossy(bytes).into_owned(),
            Value::Boolean(b) => b.to_string(),
            Value::Short(n) => n.to_string(),
            Value::Int(n) => n.to_string(),
            Value::Long(n) => n.to_string(),
            Value::Float(n) => n.to_string(),
            Value::Double(n) => n.to_string(),
            Value::Byte(n) => n.to_string(),
            Value::Date(s) | Value::Time(s) => s.to_string(),
            Value::Timestamp(ts) => ts.seconds.to_string(),
        }
    }

    fn to_f64(&self) -> Result<f64, RemoteError> {
        let n = match self {
            Value::Null => 0.0,
            Value::Boolean(b) => f64::from(u8::from(*b)),
            Value::Short(n) => f64::from(*n),
            Value::Int(n) => f64::from(*n),
            Value::Long(n) => *n as f64,
            Value::Float(n) => f64::from(*n),
            Value::Double(n) => *n,
            Value::Byte(n) => f64::from(*n),
            Value::Text(text) => text.trim().parse().map_err(|_| conversion(self))?,
            _ => return Err(conversion(self)),
        };
        Ok(n)
    }

    fn to_i64(&self) -> Result<i64, RemoteError> {
        match self {
            Value::Long(n) => Ok(*n),
            Value::Text(text) => text.trim().parse().map_err(|_| conversion(self)),
            Value::Date(s) | Value::Time(s) => Ok(*s),
            Value::Timestamp(ts) => Ok(ts.seconds),
            other => other.to_f64().map(|n| n as i64),
        }
    }
}

fn conversion(value: &Value) -> RemoteError {
    RemoteError::new(
        codes::CONVERSION_ERROR,
        format!("can't convert {value:?}"),
    )
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Text(text.to_owned())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Text(text)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Long(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Double(n)
    }
}

/// Values of one row, with typed access.
#[derive(Debug, Clone, Default)]
pub struct Row {
    values: Vec<Value>,
    types: Option<Vec<i32>>,
    was_null: bool,
}

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self {
            values,
            types: None,
            was_null: false,
        }
    }

    fn typed(values: Vec<Value>, types: Vec<i32>) -> Self {
        Self {
            values,
            types: Some(types),
            was_null: false,
        }
    }

    fn value(&mut self, index: i32) -> Result<&Value, RemoteError> {
        let value = usize::try_from(index)
            .ok()
            .and_then(|i| i.checked_sub(1))
            .and_then(|i| self.values.get(i))
            .ok_or_else(|| {
                RemoteError::new(
                    codes::INVALID_ARGUMENT,
                    format!("column index {index} out of range"),
                )
            })?;
        self.was_null = *value == Value::Null;
        Ok(value)
    }
}

impl ValueSource for Row {
    fn was_null(&self) -> bool {
        self.was_null
    }

    fn value_type(&self, index: i32) -> Result<i32, RemoteError> {
        let i = usize::try_from(index - 1)
            .map_err(|_| RemoteError::new(codes::INVALID_ARGUMENT, "column index out of range"))?;
        let declared = self.types.as_ref().and_then(|types| types.get(i)).copied();
        declared
            .or_else(|| self.values.get(i).map(Value::type_code))
            .ok_or_else(|| RemoteError::new(codes::INVALID_ARGUMENT, "column index out of range"))
    }

    fn get_string(&mut self, index: i32) -> Result<String, RemoteError> {
        Ok(self.value(index)?.to_text())
    }

    fn get_blob(&mut self, index: i32) -> Result<Box<dyn Blob>, RemoteError> {
        let bytes = match self.value(index)? {
            Value::Bytes(bytes) => bytes.clone(),
            other => other.to_text().into_bytes(),
        };
        Ok(Box::new(bytes))
    }

    fn get_short(&mut self, index: i32) -> Result<i16, RemoteError> {
        Ok(self.value(index)?.to_i64()? as i16)
    }

    fn get_int(&mut self, index: i32) -> Result<i32, RemoteError> {
        Ok(self.value(index)?.to_i64()? as i32)
    }

    fn get_long(&mut self, index: i32) -> Result<i64, RemoteError> {
        self.value(index)?.to_i64()
    }

    fn get_float(&mut self, index: i32) -> Result<f32, RemoteError> {
        Ok(self.value(index)?.to_f64()? as f32)
    }

    fn get_double(&mut self, index: i32) -> Result<f64, RemoteError> {
        self.value(index)?.to_f64()
    }

    fn get_byte(&mut self, index: i32) -> Result<i8, RemoteError> {
        Ok(self.value(index)?.to_i64()? as i8)
    }

    fn get_boolean(&mut self, index: i32) -> Result<bool, RemoteError> {
        Ok(self.value(index)?.to_f64()? != 0.0)
    }

    fn get_date(&mut self, index: i32) -> Result<i64, RemoteError> {
        self.value(index)?.to_i64()
    }

    fn get_time(&mut self, index: i32) -> Result<i64, RemoteError> {
        self.value(index)?.to_i64()
    }

    fn get_timestamp(&mut self, index: i32) -> Result<RemoteTimestamp, RemoteError> {
        match self.value(index)? {
            Value::Timestamp(ts) => Ok(*ts),
            other => Ok(RemoteTimestamp {
                seconds: other.to_i64()?,
                nanos: 0,
            }),
        }
    }
}

/// Column of a [`Table`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub label: String,
    /// Client library type code.
    pub sql_type: i32,
    pub nullable: bool,
}

impl Column {
    pub fn new(name: &str, sql_type: i32) -> Self {
        Self {
            name: name.to_owned(),
            label: name.to_owned(),
            sql_type,
            nullable: true,
        }
    }
}

/// Rows of a result set, catalog function or generated keys.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            name: String::new(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Appends a row.
    pub fn row(mut self, values: Vec<Value>) -> Self {
        self.rows.push(values);
        self
    }

    fn into_result_set(self) -> Box<dyn ResultSet> {
        Box::new(MemoryResultSet::new(self))
    }
}

/// What executing a statement yields.
#[derive(Debug, Clone, Default)]
pub struct Script {
    /// Result set of the statement, if it is a query.
    pub result: Option<Table>,
    /// Further result sets, reached with `SQLMoreResults`.
    pub more_results: Vec<Table>,
    pub update_count: i64,
    pub generated_keys: Option<Table>,
    /// Types of the parameters. If empty, every `?` in the text is a `VARCHAR` parameter.
    pub parameter_types: Vec<i32>,
    /// Values of the output parameters of a procedure call, by parameter number.
    pub out_values: Vec<Value>,
    /// Execution fails with this error.
    pub error: Option<RemoteError>,
}

impl Script {
    pub fn query(table: Table) -> Self {
        Self {
            result: Some(table),
            update_count: -1,
            ..Self::default()
        }
    }

    pub fn update(update_count: i64) -> Self {
        Self {
            update_count,
            ..Self::default()
        }
    }

    pub fn failure(error: RemoteError) -> Self {
        Self {
            error: Some(error),
            ..Self::default()
        }
    }
}

/// One execution of a statement, as recorded by the database.
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    pub sql: String,
    /// Parameter values, by number.
    pub parameters: BTreeMap<i32, Value>,
}

/// Record of an opened connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Login {
    pub database: String,
    pub properties: Properties,
}

#[derive(Debug)]
struct Shared {
    scripts: HashMap<String, Script>,
    executions: Vec<Execution>,
    logins: Vec<Login>,
    credentials: Option<(String, String)>,
    catalog: Vec<(String, String, Table)>,
    commits: usize,
    rollbacks: usize,
    auto_commit: bool,
    isolation: u32,
    read_only: bool,
    open_connections: usize,
    close_error: Option<RemoteError>,
}

impl Default for Shared {
    fn default() -> Self {
        Self {
            scripts: HashMap::new(),
            executions: Vec::new(),
            logins: Vec::new(),
            credentials: None,
            catalog: Vec::new(),
            commits: 0,
            rollbacks: 0,
            auto_commit: true,
            isolation: 8,
            read_only: false,
            open_connections: 0,
            close_error: None,
        }
    }
}

type SharedState = Arc<Mutex<Shared>>;

fn lock(shared: &SharedState) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A database living in memory. Acts as [`Driver`]. Clones share the same database.
#[derive(Debug, Clone, Default)]
pub struct MemoryDatabase {
    shared: SharedState,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers what executing `sql` yields. Unscripted statements update `0` rows.
    pub fn script(&self, sql: &str, script: Script) {
        lock(&self.shared).scripts.insert(sql.trim().to_owned(), script);
    }

    /// Connecting fails unless these credentials are passed.
    pub fn require_credentials(&self, user: &str, password: &str) {
        lock(&self.shared).credentials = Some((user.to_owned(), password.to_owned()));
    }

    /// Makes closing connections fail with `error`.
    pub fn fail_close(&self, error: RemoteError) {
        lock(&self.shared).close_error = Some(error);
    }

    /// Adds a table to the catalog.
    pub fn create_table(&self, schema: &str, name: &str, columns: Vec<Column>) {
        let table = Table {
            name: name.to_owned(),
            ..Table::new(columns)
        };
        lock(&self.shared)
            .catalog
            .push((schema.to_owned(), name.to_owned(), table));
    }

    pub fn executions(&self) -> Vec<Execution> {
        lock(&self.shared).executions.clone()
    }

    pub fn logins(&self) -> Vec<Login> {
        lock(&self.shared).logins.clone()
    }

    pub fn commits(&self) -> usize {
        lock(&self.shared).commits
    }

    pub fn rollbacks(&self) -> usize {
        lock(&self.shared).rollbacks
    }

    pub fn auto_commit(&self) -> bool {
        lock(&self.shared).auto_commit
    }

    pub fn isolation(&self) -> u32 {
        lock(&self.shared).isolation
    }

    pub fn read_only(&self) -> bool {
        lock(&self.shared).read_only
    }

    /// Number of connections opened and not yet closed.
    pub fn open_connections(&self) -> usize {
        lock(&self.shared).open_connections
    }
}

impl Driver for MemoryDatabase {
    fn connect(
        &self,
        database: &str,
        properties: &Properties,
    ) -> Result<Box<dyn RemoteConnection>, RemoteError> {
        let mut shared = lock(&self.shared);
        if let Some((user, password)) = &shared.credentials {
            if properties.get("user") != Some(user.as_str())
                || properties.get("password") != Some(password.as_str())
            {
                return Err(RemoteError::new(
                    codes::SECURITY_ERROR,
                    "Authentication failed",
                ));
            }
        }
        debug!("memory database: connect to {database}");
        shared.logins.push(Login {
            database: database.to_owned(),
            properties: properties.clone(),
        });
        shared.open_connections += 1;
        Ok(Box::new(MemoryConnection {
            shared: self.shared.clone(),
            user: properties.get("user").unwrap_or_default().to_owned(),
        }))
    }
}

/// Connection to a [`MemoryDatabase`].
#[derive(Debug)]
pub struct MemoryConnection {
    shared: SharedState,
    user: String,
}

impl MemoryConnection {
    fn statement(&self, sql: &str) -> MemoryStatement {
        let script = lock(&self.shared)
            .scripts
            .get(sql.trim())
            .cloned()
            .unwrap_or_default();
        let parameter_types = if script.parameter_types.is_empty() {
            vec![sql::VARCHAR; sql.matches('?').count()]
        } else {
            script.parameter_types.clone()
        };
        MemoryStatement {
            sql: sql.to_owned(),
            script,
            parameter_types,
            shared: self.shared.clone(),
            ..MemoryStatement::default()
        }
    }
}

impl RemoteConnection for MemoryConnection {
    fn close(&self) -> Result<(), RemoteError> {
        let mut shared = lock(&self.shared);
        if let Some(error) = shared.close_error.clone() {
            return Err(error);
        }
        shared.open_connections = shared.open_connections.saturating_sub(1);
        Ok(())
    }

    fn commit(&self) -> Result<(), RemoteError> {
        lock(&self.shared).commits += 1;
        Ok(())
    }

    fn rollback(&self) -> Result<(), RemoteError> {
        lock(&self.shared).rollbacks += 1;
        Ok(())
    }

    fn set_auto_commit(&self, auto_commit: bool) -> Result<(), RemoteError> {
        lock(&self.shared).auto_commit = auto_commit;
        Ok(())
    }

    fn set_transaction_isolation(&self, level: u32) -> Result<(), RemoteError> {
        if !matches!(level, 2 | 8) {
            return Err(RemoteError::new(
                codes::INVALID_TRANSACTION_ISOLATION,
                format!("transaction isolation level {level} is not supported"),
            ));
        }
        lock(&self.shared).isolation = level;
        Ok(())
    }

    fn transaction_isolation(&self) -> Result<u32, RemoteError> {
        Ok(lock(&self.shared).isolation)
    }

    fn set_read_only(&self, read_only: bool) -> Result<(), RemoteError> {
        lock(&self.shared).read_only = read_only;
        Ok(())
    }

    fn prepare_statement(&self, sql: &str) -> Result<Box<dyn PreparedStatement>, RemoteError> {
        Ok(Box::new(self.statement(sql)))
    }

    fn prepare_call(&self, sql: &str) -> Result<Box<dyn CallableStatement>, RemoteError> {
        Ok(Box::new(self.statement(sql)))
    }

    fn meta_data(&self) -> Result<Arc<dyn DatabaseMetaData>, RemoteError> {
        Ok(Arc::new(MemoryCatalog {
            shared: self.shared.clone(),
            user: self.user.clone(),
        }))
    }
}

/// Prepared statement or procedure call of a [`MemoryConnection`].
#[derive(Debug, Default)]
pub struct MemoryStatement {
    sql: String,
    script: Script,
    parameter_types: Vec<i32>,
    parameters: BTreeMap<i32, Value>,
    out_parameters: BTreeMap<i32, i32>,
    shared: SharedState,
    current: Option<Table>,
    pending: VecDeque<Table>,
    update_count: i64,
    out_row: Row,
    query_timeout: u32,
}

impl MemoryStatement {
    /// Value currently set for parameter `index`.
    pub fn parameter(&self, index: i32) -> Option<&Value> {
        self.parameters.get(&index)
    }

    pub fn query_timeout(&self) -> u32 {
        self.query_timeout
    }

    fn set(&mut self, index: i32, value: Value) -> Result<(), RemoteError> {
        if index < 1 {
            return Err(RemoteError::new(
                codes::INVALID_ARGUMENT,
                format!("parameter index {index} out of range"),
            ));
        }
        self.parameters.insert(index, value);
        Ok(())
    }
}

impl PreparedStatement for MemoryStatement {
    fn set_null(&mut self, index: i32, _sql_type: i32) -> Result<(), RemoteError> {
        self.set(index, Value::Null)
    }

    fn set_string(&mut self, index: i32, value: &str) -> Result<(), RemoteError> {
        self.set(index, Value::from(value))
    }

    fn set_bytes(&mut self, index: i32, value: &[u8]) -> Result<(), RemoteError> {
        self.set(index, Value::Bytes(value.to_vec()))
    }

    fn set_short(&mut self, index: i32, value: i16) -> Result<(), RemoteError> {
        self.set(index, Value::Short(value))
    }

    fn set_int(&mut self, index: i32, value: i32) -> Result<(), RemoteError> {
        self.set(index, Value::Int(value))
    }

    fn set_long(&mut self, index: i32, value: i64) -> Result<(), RemoteError> {
        self.set(index, Value::Long(value))
    }

    fn set_float(&mut self, index: i32, value: f32) -> Result<(), RemoteError> {
        self.set(index, Value::Float(value))
    }

    fn set_double(&mut self, index: i32, value: f64) -> Result<(), RemoteError> {
        self.set(index, Value::Double(value))
    }

    fn set_byte(&mut self, index: i32, value: i8) -> Result<(), RemoteError> {
        self.set(index, Value::Byte(value))
    }

    fn execute(&mut self) -> Result<bool, RemoteError> {
        if let Some(error) = &self.script.error {
            return Err(error.clone());
        }
        lock(&self.shared).executions.push(Execution {
            sql: self.sql.clone(),
            parameters: self.parameters.clone(),
        });
        self.current = self.script.result.clone();
        self.pending = self.script.more_results.iter().cloned().collect();
        self.update_count = if self.current.is_some() {
            -1
        } else {
            self.script.update_count
        };
        let types = (1..=self.script.out_values.len() as i32)
            .map(|i| {
                self.out_parameters
                    .get(&i)
                    .copied()
                    .unwrap_or_else(|| self.script.out_values[i as usize - 1].type_code())
            })
            .collect();
        self.out_row = Row::typed(self.script.out_values.clone(), types);
        Ok(self.current.is_some())
    }

    fn update_count(&mut self) -> Result<i64, RemoteError> {
        Ok(self.update_count)
    }

    fn more_results(&mut self) -> Result<bool, RemoteError> {
        self.current = self.pending.pop_front();
        Ok(self.current.is_some())
    }

    fn generated_keys(&mut self) -> Result<Option<Box<dyn ResultSet>>, RemoteError> {
        Ok(self.script.generated_keys.clone().map(Table::into_result_set))
    }

    fn result_set(&mut self) -> Result<Option<Box<dyn ResultSet>>, RemoteError> {
        Ok(self.current.take().map(Table::into_result_set))
    }

    fn parameter_meta_data(&mut self) -> Result<Arc<dyn ParameterMetaData>, RemoteError> {
        Ok(Arc::new(MemoryParameters {
            types: self.parameter_types.clone(),
        }))
    }

    fn meta_data(&mut self) -> Result<Option<Arc<dyn ResultSetMetaData>>, RemoteError> {
        Ok(self.script.result.as_ref().map(|table| {
            Arc::new(MemoryMetaData::new(table)) as Arc<dyn ResultSetMetaData>
        }))
    }

    fn set_query_timeout(&mut self, seconds: u32) -> Result<(), RemoteError> {
        self.query_timeout = seconds;
        Ok(())
    }

    fn close(&mut self) -> Result<(), RemoteError> {
        self.current = None;
        self.pending.clear();
        Ok(())
    }
}

impl ValueSource for MemoryStatement {
    fn was_null(&self) -> bool {
        self.out_row.was_null()
    }

    fn value_type(&self, index: i32) -> Result<i32, RemoteError> {
        self.out_row.value_type(index)
    }

    fn get_string(&mut self, index: i32) -> Result<String, RemoteError> {
        self.out_row.get_string(index)
    }

    fn get_blob(&mut self, index: i32) -> Result<Box<dyn Blob>, RemoteError> {
        self.out_row.get_blob(index)
    }

    fn get_short(&mut self, index: i32) -> Result<i16, RemoteError> {
        self.out_row.get_short(index)
    }

    fn get_int(&mut self, index: i32) -> Result<i32, RemoteError> {
        self.out_row.get_int(index)
    }

    fn get_long(&mut self, index: i32) -> Result<i64, RemoteError> {
        self.out_row.get_long(index)
    }

    fn get_float(&mut self, index: i32) -> Result<f32, RemoteError> {
        self.out_row.get_float(index)
    }

    fn get_double(&mut self, index: i32) -> Result<f64, RemoteError> {
        self.out_row.get_double(index)
    }

    fn get_byte(&mut self, index: i32) -> Result<i8, RemoteError> {
        self.out_row.get_byte(index)
    }

    fn get_boolean(&mut self, index: i32) -> Result<bool, RemoteError> {
        self.out_row.get_boolean(index)
    }

    fn get_date(&mut self, index: i32) -> Result<i64, RemoteError> {
        self.out_row.get_date(index)
    }

    fn get_time(&mut self, index: i32) -> Result<i64, RemoteError> {
        self.out_row.get_time(index)
    }

    fn get_timestamp(&mut self, index: i32) -> Result<RemoteTimestamp, RemoteError> {
        self.out_row.get_timestamp(index)
    }
}

impl CallableStatement for MemoryStatement {
    fn register_out_parameter(&mut self, index: i32, sql_type: i32) -> Result<(), RemoteError> {
        self.out_parameters.insert(index, sql_type);
        Ok(())
    }

    fn as_prepared(&mut self) -> &mut dyn PreparedStatement {
        self
    }

    fn as_values(&mut self) -> &mut dyn ValueSource {
        self
    }
}

/// Cursor over a [`Table`].
#[derive(Debug)]
pub struct MemoryResultSet {
    rows: VecDeque<Vec<Value>>,
    types: Vec<i32>,
    names: Vec<String>,
    current: Row,
    meta_data: Arc<MemoryMetaData>,
}

impl MemoryResultSet {
    pub fn new(table: Table) -> Self {
        let meta_data = Arc::new(MemoryMetaData::new(&table));
        Self {
            types: table.columns.iter().map(|c| c.sql_type).collect(),
            names: table.columns.iter().map(|c| c.name.clone()).collect(),
            rows: table.rows.into(),
            current: Row::default(),
            meta_data,
        }
    }
}

impl ValueSource for MemoryResultSet {
    fn was_null(&self) -> bool {
        self.current.was_null()
    }

    fn value_type(&self, index: i32) -> Result<i32, RemoteError> {
        usize::try_from(index - 1)
            .ok()
            .and_then(|i| self.types.get(i))
            .copied()
            .ok_or_else(|| RemoteError::new(codes::INVALID_ARGUMENT, "column index out of range"))
    }

    fn get_string(&mut self, index: i32) -> Result<String, RemoteError> {
        self.current.get_string(index)
    }

    fn get_blob(&mut self, index: i32) -> Result<Box<dyn Blob>, RemoteError> {
        self.current.get_blob(index)
    }

    fn get_short(&mut self, index: i32) -> Result<i16, RemoteError> {
        self.current.get_short(index)
    }

    fn get_int(&mut self, index: i32) -> Result<i32, RemoteError> {
        self.current.get_int(index)
    }

    fn get_long(&mut self, index: i32) -> Result<i64, RemoteError> {
        self.current.get_long(index)
    }

    fn get_float(&mut self, index: i32) -> Result<f32, RemoteError> {
        self.current.get_float(index)
    }

    fn get_double(&mut self, index: i32) -> Result<f64, RemoteError> {
        self.current.get_double(index)
    }

    fn get_byte(&mut self, index: i32) -> Result<i8, RemoteError> {
        self.current.get_byte(index)
    }

    fn get_boolean(&mut self, index: i32) -> Result<bool, RemoteError> {
        self.current.get_boolean(index)
    }

    fn get_date(&mut self, index: i32) -> Result<i64, RemoteError> {
        self.current.get_date(index)
    }

    fn get_time(&mut self, index: i32) -> Result<i64, RemoteError> {
        self.current.get_time(index)
    }

    fn get_timestamp(&mut self, index: i32) -> Result<RemoteTimestamp, RemoteError> {
        self.current.get_timestamp(index)
    }
}

impl ResultSet for MemoryResultSet {
    fn next(&mut self) -> Result<bool, RemoteError> {
        match self.rows.pop_front() {
            Some(values) => {
                self.current = Row::typed(values, self.types.clone());
                Ok(true)
            }
            None => {
                self.current = Row::default();
                Ok(false)
            }
        }
    }

    fn find_column(&self, name: &str) -> Result<i32, RemoteError> {
        self.names
            .iter()
            .position(|n| n.eq_ignore_ascii_case(name))
            .map(|i| i as i32 + 1)
            .ok_or_else(|| {
                RemoteError::new(codes::INVALID_ARGUMENT, format!("no column named {name}"))
            })
    }

    fn meta_data(&self) -> Arc<dyn ResultSetMetaData> {
        self.meta_data.clone()
    }

    fn as_values(&mut self) -> &mut dyn ValueSource {
        self
    }
}

/// Shape of a [`Table`].
#[derive(Debug)]
pub struct MemoryMetaData {
    table: String,
    columns: Vec<Column>,
    max_lengths: Vec<i32>,
}

impl MemoryMetaData {
    fn new(table: &Table) -> Self {
        let max_lengths = (0..table.columns.len())
            .map(|i| {
                table
                    .rows
                    .iter()
                    .filter_map(|row| row.get(i))
                    .map(|value| value.to_text().len() as i32)
                    .max()
                    .unwrap_or(0)
            })
            .collect();
        Self {
            table: table.name.clone(),
            columns: table.columns.clone(),
            max_lengths,
        }
    }

    fn column(&self, column: i32) -> Option<&Column> {
        self.columns.get(usize::try_from(column - 1).ok()?)
    }

    fn sql_type(&self, column: i32) -> i32 {
        self.column(column).map(|c| c.sql_type).unwrap_or(types::NULL)
    }
}

fn type_name(sql_type: i32) -> &'static str {
    match sql_type {
        sql::CHAR => "CHAR",
        sql::VARCHAR => "STRING",
        sql::SMALLINT => "SMALLINT",
        sql::INTEGER => "INTEGER",
        sql::BIGINT => "BIGINT",
        sql::DOUBLE => "DOUBLE",
        sql::DATE => "DATE",
        sql::TIME => "TIME",
        sql::TIMESTAMP => "TIMESTAMP",
        types::BLOB => "BLOB",
        types::CLOB => "CLOB",
        types::BOOLEAN => "BOOLEAN",
        types::NULL => "NULL",
        _ => "UNKNOWN",
    }
}

fn precision(sql_type: i32) -> i32 {
    match sql_type {
        sql::SMALLINT => 5,
        sql::INTEGER => 10,
        sql::BIGINT => 19,
        sql::DOUBLE => 15,
        sql::DATE => 10,
        sql::TIME => 8,
        sql::TIMESTAMP => 26,
        types::BOOLEAN => 1,
        _ => 0,
    }
}

impl ResultSetMetaData for MemoryMetaData {
    fn column_count(&self) -> i32 {
        self.columns.len() as i32
    }

    fn column_type(&self, column: i32) -> i32 {
        self.sql_type(column)
    }

    fn column_name(&self, column: i32) -> String {
        self.column(column).map(|c| c.name.clone()).unwrap_or_default()
    }

    fn column_label(&self, column: i32) -> String {
        self.column(column).map(|c| c.label.clone()).unwrap_or_default()
    }

    fn column_type_name(&self, column: i32) -> String {
        type_name(self.sql_type(column)).to_owned()
    }

    fn precision(&self, column: i32) -> i32 {
        match precision(self.sql_type(column)) {
            0 => self.current_column_max_length(column),
            p => p,
        }
    }

    fn scale(&self, _column: i32) -> i32 {
        0
    }

    fn current_column_max_length(&self, column: i32) -> i32 {
        usize::try_from(column - 1)
            .ok()
            .and_then(|i| self.max_lengths.get(i))
            .copied()
            .unwrap_or(0)
    }

    fn is_nullable(&self, column: i32) -> bool {
        self.column(column).is_some_and(|c| c.nullable)
    }

    fn is_writable(&self, _column: i32) -> bool {
        false
    }

    fn is_searchable(&self, column: i32) -> bool {
        self.sql_type(column) != types::BLOB
    }

    fn is_case_sensitive(&self, column: i32) -> bool {
        matches!(self.sql_type(column), sql::CHAR | sql::VARCHAR | types::CLOB)
    }

    fn is_auto_increment(&self, _column: i32) -> bool {
        false
    }

    fn is_currency(&self, _column: i32) -> bool {
        false
    }

    fn is_signed(&self, column: i32) -> bool {
        precision(self.sql_type(column)) > 1 && self.sql_type(column) < sql::DATE
    }

    fn table_name(&self, _column: i32) -> String {
        self.table.clone()
    }

    fn schema_name(&self, _column: i32) -> String {
        "USER".to_owned()
    }

    fn catalog_name(&self, _column: i32) -> String {
        String::new()
    }
}

#[derive(Debug)]
struct MemoryParameters {
    types: Vec<i32>,
}

impl ParameterMetaData for MemoryParameters {
    fn parameter_count(&self) -> i32 {
        self.types.len() as i32
    }

    fn parameter_type(&self, parameter: i32) -> i32 {
        usize::try_from(parameter - 1)
            .ok()
            .and_then(|i| self.types.get(i))
            .copied()
            .unwrap_or(sql::VARCHAR)
    }

    fn precision(&self, parameter: i32) -> i32 {
        precision(self.parameter_type(parameter))
    }

    fn scale(&self, _parameter: i32) -> i32 {
        0
    }

    fn is_nullable(&self, _parameter: i32) -> bool {
        true
    }
}

/// Catalog of a [`MemoryDatabase`].
#[derive(Debug)]
struct MemoryCatalog {
    shared: SharedState,
    user: String,
}

fn text(value: &str) -> Value {
    Value::from(value)
}

fn like(pattern: Option<&str>, name: &str) -> bool {
    match pattern {
        None | Some("%") | Some("") => true,
        Some(pattern) => pattern.eq_ignore_ascii_case(name),
    }
}

fn columns(names: &[(&str, i32)]) -> Vec<Column> {
    names
        .iter()
        .map(|(name, sql_type)| Column::new(name, *sql_type))
        .collect()
}

impl DatabaseMetaData for MemoryCatalog {
    fn tables(
        &self,
        _catalog: Option<&str>,
        schema: Option<&str>,
        table: Option<&str>,
        table_types: &[String],
    ) -> Result<Box<dyn ResultSet>, RemoteError> {
        let mut result = Table::new(columns(&[
            ("TABLE_CAT", sql::VARCHAR),
            ("TABLE_SCHEM", sql::VARCHAR),
            ("TABLE_NAME", sql::VARCHAR),
            ("TABLE_TYPE", sql::VARCHAR),
            ("REMARKS", sql::VARCHAR),
        ]));
        let wants_tables =
            table_types.is_empty() || table_types.iter().any(|t| t.trim().trim_matches('\'') == "TABLE");
        if wants_tables {
            for (s, name, _) in &lock(&self.shared).catalog {
                if like(schema, s) && like(table, name) {
                    result = result.row(vec![
                        Value::Null,
                        text(s),
                        text(name),
                        text("TABLE"),
                        Value::Null,
                    ]);
                }
            }
        }
        Ok(result.into_result_set())
    }

    fn columns(
        &self,
        _catalog: Option<&str>,
        schema: Option<&str>,
        table: Option<&str>,
        column: Option<&str>,
    ) -> Result<Box<dyn ResultSet>, RemoteError> {
        let mut result = Table::new(columns(&[
            ("TABLE_CAT", sql::VARCHAR),
            ("TABLE_SCHEM", sql::VARCHAR),
            ("TABLE_NAME", sql::VARCHAR),
            ("COLUMN_NAME", sql::VARCHAR),
            ("DATA_TYPE", sql::SMALLINT),
            ("TYPE_NAME", sql::VARCHAR),
            ("COLUMN_SIZE", sql::INTEGER),
            ("NULLABLE", sql::SMALLINT),
        ]));
        for (s, name, definition) in &lock(&self.shared).catalog {
            if !(like(schema, s) && like(table, name)) {
                continue;
            }
            for c in definition.columns.iter().filter(|c| like(column, &c.name)) {
                result = result.row(vec![
                    Value::Null,
                    text(s),
                    text(name),
                    text(&c.name),
                    Value::Int(c.sql_type),
                    text(type_name(c.sql_type)),
                    Value::Int(precision(c.sql_type)),
                    Value::Int(i32::from(c.nullable)),
                ]);
            }
        }
        Ok(result.into_result_set())
    }

    fn primary_keys(
        &self,
        _catalog: Option<&str>,
        _schema: Option<&str>,
        _table: Option<&str>,
    ) -> Result<Box<dyn ResultSet>, RemoteError> {
        Ok(Table::new(columns(&[
            ("TABLE_CAT", sql::VARCHAR),
            ("TABLE_SCHEM", sql::VARCHAR),
            ("TABLE_NAME", sql::VARCHAR),
            ("COLUMN_NAME", sql::VARCHAR),
            ("KEY_SEQ", sql::SMALLINT),
            ("PK_NAME", sql::VARCHAR),
        ]))
        .into_result_set())
    }

    fn index_info(
        &self,
        _catalog: Option<&str>,
        _schema: Option<&str>,
        _table: Option<&str>,
        _unique: bool,
        _approximate: bool,
    ) -> Result<Box<dyn ResultSet>, RemoteError> {
        Ok(Table::new(columns(&[
            ("TABLE_CAT", sql::VARCHAR),
            ("TABLE_SCHEM", sql::VARCHAR),
            ("TABLE_NAME", sql::VARCHAR),
            ("NON_UNIQUE", sql::SMALLINT),
            ("INDEX_QUALIFIER", sql::VARCHAR),
            ("INDEX_NAME", sql::VARCHAR),
            ("TYPE", sql::SMALLINT),
            ("ORDINAL_POSITION", sql::SMALLINT),
            ("COLUMN_NAME", sql::VARCHAR),
        ]))
        .into_result_set())
    }

    fn procedures(
        &self,
        _catalog: Option<&str>,
        _schema: Option<&str>,
        _procedure: Option<&str>,
    ) -> Result<Box<dyn ResultSet>, RemoteError> {
        Ok(Table::new(columns(&[
            ("PROCEDURE_CAT", sql::VARCHAR),
            ("PROCEDURE_SCHEM", sql::VARCHAR),
            ("PROCEDURE_NAME", sql::VARCHAR),
            ("REMARKS", sql::VARCHAR),
            ("PROCEDURE_TYPE", sql::SMALLINT),
        ]))
        .into_result_set())
    }

    fn procedure_columns(
        &self,
        _catalog: Option<&str>,
        _schema: Option<&str>,
        _procedure: Option<&str>,
        _column: Option<&str>,
    ) -> Result<Box<dyn ResultSet>, RemoteError> {
        Ok(Table::new(columns(&[
            ("PROCEDURE_CAT", sql::VARCHAR),
            ("PROCEDURE_SCHEM", sql::VARCHAR),
            ("PROCEDURE_NAME", sql::VARCHAR),
            ("COLUMN_NAME", sql::VARCHAR),
            ("COLUMN_TYPE", sql::SMALLINT),
            ("DATA_TYPE", sql::SMALLINT),
            ("TYPE_NAME", sql::VARCHAR),
        ]))
        .into_result_set())
    }

    fn type_info(&self) -> Result<Box<dyn ResultSet>, RemoteError> {
        let mut result = Table::new(columns(&[
            ("TYPE_NAME", sql::VARCHAR),
            ("DATA_TYPE", sql::SMALLINT),
            ("COLUMN_SIZE", sql::INTEGER),
            ("NULLABLE", sql::SMALLINT),
        ]));
        for code in [
            types::BOOLEAN,
            sql::SMALLINT,
            sql::INTEGER,
            sql::BIGINT,
            sql::DOUBLE,
            sql::CHAR,
            sql::VARCHAR,
            sql::DATE,
            sql::TIME,
            sql::TIMESTAMP,
            types::BLOB,
            types::CLOB,
        ] {
            result = result.row(vec![
                text(type_name(code)),
                Value::Int(code),
                Value::Int(precision(code)),
                Value::Int(1),
            ]);
        }
        Ok(result.into_result_set())
    }

    fn supports_transaction_isolation_level(&self, level: u32) -> bool {
        matches!(level, 2 | 8)
    }

    fn default_transaction_isolation(&self) -> u32 {
        8
    }

    fn supports_open_cursors_across_commit(&self) -> bool {
        true
    }

    fn supports_open_cursors_across_rollback(&self) -> bool {
        false
    }

    fn supports_open_statements_across_commit(&self) -> bool {
        true
    }

    fn supports_open_statements_across_rollback(&self) -> bool {
        true
    }

    fn identifier_quote_string(&self) -> String {
        "\"".to_owned()
    }

    fn catalog_term(&self) -> String {
        String::new()
    }

    fn schema_term(&self) -> String {
        "schema".to_owned()
    }

    fn procedure_term(&self) -> String {
        "procedure".to_owned()
    }

    fn search_string_escape(&self) -> String {
        "\\".to_owned()
    }

    fn user_name(&self) -> String {
        self.user.clone()
    }

    fn database_product_name(&self) -> String {
        "NuoDB".to_owned()
    }

    fn database_product_version(&self) -> String {
        "4.0".to_owned()
    }
}
