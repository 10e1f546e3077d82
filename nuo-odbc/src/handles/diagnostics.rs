use super::logging::log_diagnostic;
use odbc_sys::{SQLSTATE_SIZE, SqlReturn};
use std::{collections::VecDeque, fmt};

/// A buffer large enough to hold an `SQLState` for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct State(pub [u8; SQLSTATE_SIZE]);

impl State {
    /// General warning
    pub const GENERAL_WARNING: State = State(*b"01000");
    /// Closing the remote connection failed during disconnect.
    pub const ERROR_IN_DISCONNECT: State = State(*b"01002");
    /// String or binary data returned for a column resulted in the truncation of nonblank character
    /// or non-NULL binary data. If it was a string value, it was right-truncated.
    pub const STRING_DATA_RIGHT_TRUNCATION: State = State(*b"01004");
    /// A connection string contained an attribute the driver does not know.
    pub const INVALID_CONNECTION_STRING_ATTRIBUTE: State = State(*b"01S00");
    /// The driver substituted a similar value for an attribute value it does not support.
    pub const OPTION_VALUE_CHANGED: State = State(*b"01S02");
    /// Column or parameter number out of range.
    pub const INVALID_DESCRIPTOR_INDEX: State = State(*b"07009");
    pub const CONNECTION_NAME_IN_USE: State = State(*b"08002");
    pub const CONNECTION_NOT_OPEN: State = State(*b"08003");
    /// The server rejected the attempt to open a connection.
    pub const CONNECTION_REJECTED: State = State(*b"08004");
    /// StrLen_or_IndPtr was a null pointer and NULL data was retrieved.
    pub const INDICATOR_VARIABLE_REQUIRED_BUT_NOT_SUPPLIED: State = State(*b"22002");
    pub const DATETIME_FIELD_OVERFLOW: State = State(*b"22008");
    pub const INVALID_CURSOR_STATE: State = State(*b"24000");
    /// Can be returned from SQLDisconnect
    pub const INVALID_STATE_TRANSACTION: State = State(*b"25000");
    pub const GENERAL_ERROR: State = State(*b"HY000");
    pub const INVALID_APPLICATION_BUFFER_TYPE: State = State(*b"HY003");
    pub const OPERATION_CANCELED: State = State(*b"HY008");
    pub const INVALID_USE_OF_NULL_POINTER: State = State(*b"HY009");
    pub const FUNCTION_SEQUENCE_ERROR: State = State(*b"HY010");
    /// Given the specified Attribute value, an invalid value was specified in ValuePtr.
    pub const INVALID_ATTRIBUTE_VALUE: State = State(*b"HY024");
    pub const INVALID_STRING_OR_BUFFER_LENGTH: State = State(*b"HY090");
    pub const INVALID_DESCRIPTOR_FIELD_IDENTIFIER: State = State(*b"HY091");
    pub const INVALID_ATTRIBUTE_OPTION_IDENTIFIER: State = State(*b"HY092");
    pub const INFORMATION_TYPE_OUT_OF_RANGE: State = State(*b"HY096");
    pub const FETCH_TYPE_OUT_OF_RANGE: State = State(*b"HY106");
    pub const OPTIONAL_FEATURE_NOT_IMPLEMENTED: State = State(*b"HYC00");

    /// View status code as string slice for displaying. Must always succeed as ODBC status code
    /// always consist of ASCII characters.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap()
    }

    /// Class `01` states are warnings. Posting one does not fail the call.
    pub fn is_warning(&self) -> bool {
        self.0[..2] == *b"01"
    }

    /// Value of the `SQL_DIAG_CLASS_ORIGIN` and `SQL_DIAG_SUBCLASS_ORIGIN` fields.
    pub fn class_origin(&self) -> &'static str {
        if self.0[..2] == *b"IM" {
            "ODBC 3.0"
        } else {
            "ISO 9075"
        }
    }
}

/// ODBC Diagnostic Record
///
/// Use `std::fmt::Display` to render status code, native error and message in one line.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Record {
    pub state: State,
    /// Error code of the remote database, `0` for diagnostics raised by the driver itself.
    pub native_error: i32,
    pub message: String,
}

impl Record {
    pub fn new(state: State, message: impl Into<String>) -> Self {
        Self {
            state,
            native_error: 0,
            message: message.into(),
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "State: {}, Native error: {}, Message: {}",
            self.state.as_str(),
            self.native_error,
            self.message,
        )
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Pending diagnostic records of one handle, oldest first.
///
/// Every public operation of a handle starts by clearing the queue. Records posted during the call
/// stay until the application retrieves them or the next operation starts.
#[derive(Debug, Default)]
pub struct ErrorQueue {
    records: VecDeque<Record>,
}

impl ErrorQueue {
    pub fn post(&mut self, record: Record) {
        log_diagnostic(&record);
        self.records.push_back(record);
    }

    /// Posts a record raised by the driver itself.
    pub fn post_state(&mut self, state: State, message: impl Into<String>) {
        self.post(Record::new(state, message))
    }

    pub fn clear(&mut self) {
        self.records.clear()
    }

    /// Removes and returns the oldest record.
    pub fn pop(&mut self) -> Option<Record> {
        self.records.pop_front()
    }

    /// Record `rec_number` (starting with `1`) of the pending records, without consuming it.
    pub fn get(&self, rec_number: i16) -> Option<&Record> {
        let index = usize::try_from(rec_number).ok()?.checked_sub(1)?;
        self.records.get(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Upgrades a plain success to success with info, if anything has been posted during the call.
    pub fn success(&self, ret: SqlReturn) -> SqlReturn {
        if ret == SqlReturn::SUCCESS && !self.records.is_empty() {
            SqlReturn::SUCCESS_WITH_INFO
        } else {
            ret
        }
    }
}
