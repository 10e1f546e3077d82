use thiserror::Error as ThisError;

use crate::handles::State;

/// Error codes raised by the client library. Always negative.
pub mod codes {
    pub const SYNTAX_ERROR: i32 = -1;
    pub const FEATURE_NOT_YET_IMPLEMENTED: i32 = -2;
    pub const BUG_CHECK: i32 = -3;
    pub const COMPILE_ERROR: i32 = -4;
    pub const RUNTIME_ERROR: i32 = -5;
    pub const NETWORK_ERROR: i32 = -7;
    pub const CONVERSION_ERROR: i32 = -8;
    pub const TRUNCATION_ERROR: i32 = -9;
    pub const CONNECTION_ERROR: i32 = -10;
    pub const DDL_ERROR: i32 = -11;
    pub const APPLICATION_ERROR: i32 = -12;
    pub const SECURITY_ERROR: i32 = -13;
    pub const UPDATE_CONFLICT: i32 = -24;
    pub const NO_SUCH_TABLE: i32 = -25;
    pub const UNIQUE_DUPLICATE: i32 = -27;
    pub const DEADLOCK: i32 = -29;
    pub const OUT_OF_MEMORY_ERROR: i32 = -30;
    pub const LOCK_TIMEOUT: i32 = -32;
    pub const READ_ONLY_ERROR: i32 = -39;
    pub const INVALID_TRANSACTION_ISOLATION: i32 = -42;
    pub const CONSTRAINT_ERROR: i32 = -45;
    pub const OPERATION_KILLED: i32 = -48;
    pub const INVALID_ARGUMENT: i32 = -54;
    pub const INVALID_OPERATION: i32 = -55;
}

/// Failure reported by the client library: a code from [`codes`] plus a message for humans.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
#[error("{text}")]
pub struct RemoteError {
    pub code: i32,
    pub text: String,
}

impl RemoteError {
    pub fn new(code: i32, text: impl Into<String>) -> Self {
        Self {
            code,
            text: text.into(),
        }
    }

    /// The remote side cut a value short. Not fatal to the ODBC call which observed it.
    pub fn is_truncation(&self) -> bool {
        self.code == codes::TRUNCATION_ERROR
    }

    /// SQLSTATE reported to the application for this error.
    pub fn state(&self) -> State {
        let code: &[u8; 5] = match self.code {
            codes::SYNTAX_ERROR | codes::COMPILE_ERROR => b"42000",
            codes::FEATURE_NOT_YET_IMPLEMENTED => b"HYC00",
            codes::CONVERSION_ERROR => b"22018",
            codes::TRUNCATION_ERROR => b"01004",
            codes::NETWORK_ERROR | codes::CONNECTION_ERROR => b"08S01",
            codes::DDL_ERROR => b"42S01",
            codes::SECURITY_ERROR => b"28000",
            codes::UPDATE_CONFLICT | codes::DEADLOCK => b"40001",
            codes::NO_SUCH_TABLE => b"42S02",
            codes::UNIQUE_DUPLICATE | codes::CONSTRAINT_ERROR => b"23000",
            codes::OUT_OF_MEMORY_ERROR => b"HY001",
            codes::LOCK_TIMEOUT => b"HYT00",
            codes::READ_ONLY_ERROR => b"25006",
            codes::INVALID_TRANSACTION_ISOLATION => b"HY024",
            codes::OPERATION_KILLED => b"HY008",
            codes::INVALID_ARGUMENT => b"HY009",
            codes::INVALID_OPERATION => b"HY010",
            _ => b"HY000",
        };
        State(*code)
    }
}
