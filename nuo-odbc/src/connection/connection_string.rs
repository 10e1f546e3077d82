use std::{collections::HashMap, fmt};

use atoi::atoi;

use crate::remote::Properties;

/// Value of the `DRIVER` attribute, unless the application names another one.
pub const DRIVER_FULL_NAME: &str = "NuoDB ODBC Driver";

/// `SQL_TXN_SERIALIZABLE`, the isolation level of new connections.
pub const SERIALIZABLE: u32 = 8;

/// Source of the attributes stored with a data source name. Stands in for the `odbc.ini`
/// profile of the driver manager.
pub trait DsnStore: Send + Sync {
    /// Value of `key` in the profile of `dsn`. Missing and empty values are both `None`.
    fn attribute(&self, dsn: &str, key: &str) -> Option<String>;
}

/// [`DsnStore`] holding its profiles in memory. Keys are matched case insensitively.
#[derive(Debug, Clone, Default)]
pub struct MemoryDsnStore {
    profiles: HashMap<String, HashMap<String, String>>,
}

impl MemoryDsnStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` in the profile of `dsn`, creating the profile if necessary.
    pub fn with(mut self, dsn: &str, key: &str, value: &str) -> Self {
        self.profiles
            .entry(dsn.to_owned())
            .or_default()
            .insert(key.to_ascii_lowercase(), value.to_owned());
        self
    }
}

impl DsnStore for MemoryDsnStore {
    fn attribute(&self, dsn: &str, key: &str) -> Option<String> {
        self.profiles
            .get(dsn)?
            .get(&key.to_ascii_lowercase())
            .filter(|value| !value.is_empty())
            .cloned()
    }
}

/// Maps the `TransactionIsolation` profile attribute to its ODBC bit value.
fn isolation_level(name: &str) -> Option<u32> {
    match name.trim().to_ascii_uppercase().as_str() {
        "READ_UNCOMMITTED" => Some(1),
        "READ_COMMITTED" => Some(2),
        "REPEATABLE_READ" => Some(4),
        "SERIALIZABLE" => Some(SERIALIZABLE),
        _ => None,
    }
}

/// Everything needed to open a connection, gathered from `SQLConnect` arguments, connection
/// strings and the DSN profile.
///
/// Successive calls to [`Self::apply`] accumulate, which is what `SQLBrowseConnect` relies on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionString {
    pub dsn: String,
    /// Name of the database the client library connects to, e.g. `test@localhost:48004`.
    pub database: String,
    pub user: String,
    pub password: String,
    pub driver: String,
    pub schema: String,
}

impl Default for ConnectionString {
    fn default() -> Self {
        Self {
            dsn: String::new(),
            database: String::new(),
            user: String::new(),
            password: String::new(),
            driver: DRIVER_FULL_NAME.to_owned(),
            schema: String::new(),
        }
    }
}

impl ConnectionString {
    /// Applies the `KEY=VALUE` pairs of `text`, separated by `;`. Keys are case insensitive.
    /// Returns the keys which are not recognized.
    pub fn apply(&mut self, text: &str) -> Vec<String> {
        let mut unknown = Vec::new();
        for pair in text.split(';') {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            if key.is_empty() {
                continue;
            }
            match key.to_ascii_uppercase().as_str() {
                "DSN" => self.dsn = value.to_owned(),
                "DBNAME" | "DATABASE" => self.database = trim_braces(value),
                "UID" | "UIC" => self.user = value.to_owned(),
                "PWD" => self.password = value.to_owned(),
                "DRIVER" => self.driver = trim_braces(value),
                "SCHEMA" => self.schema = value.to_owned(),
                "ODBC" => (),
                _ => unknown.push(key.to_owned()),
            }
        }
        unknown
    }

    /// Fills blank attributes from the profile of the data source. Without an explicit database
    /// name, `Dbname` is used, or `Database[@ServerName[:Port]]`.
    pub fn expand(&mut self, store: &dyn DsnStore) {
        if self.dsn.is_empty() {
            return;
        }
        let dsn = self.dsn.clone();
        let read = |key: &str| store.attribute(&dsn, key);
        if self.database.is_empty() {
            self.database = read("Dbname").unwrap_or_default();
        }
        if self.database.is_empty() {
            if let Some(mut database) = read("Database") {
                if let Some(server) = read("ServerName") {
                    database.push('@');
                    database.push_str(&server);
                    if let Some(port) = read("Port").filter(|p| atoi::<u16>(p.as_bytes()).is_some())
                    {
                        database.push(':');
                        database.push_str(&port);
                    }
                }
                self.database = database;
            }
        }
        if self.user.is_empty() {
            self.user = read("User").unwrap_or_default();
        }
        if self.password.is_empty() {
            self.password = read("Password").unwrap_or_default();
        }
        if self.schema.is_empty() {
            self.schema = read("Schema").unwrap_or_default();
        }
    }

    /// Isolation level configured for the data source, if any.
    pub fn isolation(&self, store: &dyn DsnStore) -> Option<u32> {
        if self.dsn.is_empty() {
            return None;
        }
        store
            .attribute(&self.dsn, "TransactionIsolation")
            .and_then(|name| isolation_level(&name))
    }

    /// `true` if nothing `SQLBrowseConnect` asks for is missing.
    pub fn is_complete(&self) -> bool {
        !(self.dsn.is_empty()
            || self.user.is_empty()
            || self.password.is_empty()
            || self.driver.is_empty())
    }

    /// Output of `SQLBrowseConnect` for an incomplete connection string: the missing attributes
    /// with `?` as value. The schema is optional and marked with `*`.
    pub fn browse_prompt(&self) -> String {
        let prompt: Vec<&str> = [
            ("DSN=?", &self.dsn),
            ("UIC=?", &self.user),
            ("PWD=?", &self.password),
            ("DRIVER=?", &self.driver),
            ("*SCHEMA=?", &self.schema),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(entry, _)| entry)
        .collect();
        prompt.join(";")
    }

    /// Login properties for the client library. Blank attributes are left out.
    pub fn properties(&self) -> Properties {
        let mut properties = Properties::new();
        for (key, value) in [
            ("user", &self.user),
            ("password", &self.password),
            ("schema", &self.schema),
        ] {
            if !value.is_empty() {
                properties.put(key, value);
            }
        }
        properties
    }
}

/// Renders the completed connection string. The driver comes last.
impl fmt::Display for ConnectionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DSN={};UIC={};PWD={};SCHEMA={};DRIVER={}",
            self.dsn, self.user, self.password, self.schema, self.driver
        )
    }
}

fn trim_braces(value: &str) -> String {
    value.trim_matches(['{', '}']).to_owned()
}
