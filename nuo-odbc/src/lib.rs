//! # NuoDB ODBC driver core
//!
//! Implements the handle state machines of an ODBC driver: environments, connections and
//! statements, the binding tables of statements and the marshaling of values between application
//! buffers and a remote SQL client library.
//!
//! The remote side is described by the traits in [`remote`]. [`remote::memory`] provides an in
//! memory implementation which scripts results and records what has been sent to it.
//!
//! ```
//! use std::sync::Arc;
//! use nuo_odbc::{Environment, MemoryDsnStore, remote::memory::MemoryDatabase};
//!
//! let store = MemoryDsnStore::new().with("Local", "Database", "test");
//! let mut env = Environment::new(Arc::new(MemoryDatabase::new()), Arc::new(store));
//! let connection = env.alloc_connection();
//! assert!(!env.connection_mut(connection).unwrap().is_connected());
//! ```

mod bindings;
mod catalog;
mod connection;
mod environment;
mod error;
mod marshal;
mod statement;

pub mod handles;
pub mod remote;

pub use self::{
    bindings::{Indicator, ParamRole},
    connection::{
        Connection, ConnectionString, DRIVER_FULL_NAME, DsnStore, InfoValue, MemoryDsnStore,
        SERIALIZABLE, Session, StatementId,
    },
    environment::{ConnectionId, Environment},
    error::Error,
    statement::{Attributes, Statement, is_procedure_call},
};
// Reexports
/// Reexports `odbc-sys` as sys to enable applications to always use the same version as this crate.
pub use odbc_sys as sys;
