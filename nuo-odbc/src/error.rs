use odbc_sys::Len;
use thiserror::Error as ThisError;

use crate::{
    handles::{Record, State},
    remote::RemoteError,
};

#[derive(Debug, ThisError)]
/// Reasons for an ODBC call to fail. Operations of the handles return these internally, the
/// boundary of each handle turns them into diagnostic records (see [`Error::to_record`]) and
/// `SQL_ERROR`.
pub enum Error {
    /// Fetching, closing or reading data without an open cursor.
    #[error("Invalid cursor state")]
    InvalidCursorState,
    /// The application cancelled the statement before fetching from it.
    #[error("Operation canceled")]
    OperationCanceled,
    /// Column or descriptor record number out of range.
    #[error("Invalid descriptor index {index}")]
    InvalidDescriptorIndex { index: i32 },
    #[error("Invalid parameter number {0}")]
    InvalidParameterNumber(u16),
    /// `SQLBindCol` or `SQLGetData` with a C type the driver does not know.
    #[error("Invalid application buffer type {0}")]
    InvalidBufferType(i16),
    #[error("Invalid bind parameter type {0}")]
    InvalidBindParameterType(i16),
    #[error("Invalid string or buffer length {0}")]
    InvalidStringOrBufferLength(Len),
    /// A known C type, which the driver can not deliver column values as.
    #[error("Optional feature not implemented, type {c_type} not supported on column {column}")]
    UnsupportedFetchType { c_type: i16, column: u16 },
    /// A known C type, which the driver can not send as parameter value.
    #[error("set parameter type {c_type} not implemented, parameter {parameter}")]
    UnsupportedParameterType { c_type: i16, parameter: u16 },
    /// The buffer bound to a parameter is too small for the fixed size C type it is declared as.
    #[error("parameter {parameter}: expected buffer size of {expected}, got {actual}")]
    ParameterSize {
        parameter: u16,
        expected: usize,
        actual: Len,
    },
    #[error("Function sequence error")]
    FunctionSequence,
    #[error("No input parameter identified as needing data")]
    NoParameterNeedsData,
    #[error("Input parameter {0} is not in need of data")]
    ParameterNotInNeedOfData(u16),
    /// Describing columns of a statement which has neither been prepared nor executed.
    #[error("MetaData is not available yet")]
    MetaDataUnavailable,
    #[error("Descriptor field identifier out of range: {0}")]
    InvalidFieldIdentifier(i16),
    #[error("Column attributes descriptor type out of range: {0}")]
    InvalidColumnAttribute(u16),
    /// Recognized, but unsupported feature. The text names what has been asked for.
    #[error("Optional feature not implemented: {0}")]
    NotImplemented(String),
    #[error("Invalid attribute value")]
    InvalidAttributeValue,
    #[error("Information type out of range: {0}")]
    InvalidInfoType(u16),
    #[error("Fetch type out of range: {0}")]
    FetchTypeOutOfRange(i16),
    #[error("Invalid attribute/option identifier {0}")]
    InvalidOptionIdentifier(i32),
    #[error("Connection name in use")]
    ConnectionInUse,
    #[error("Connection not open")]
    ConnectionNotOpen,
    /// The client library refused to open the connection.
    #[error("{0}")]
    ConnectionFailed(RemoteError),
    #[error("Invalid transaction state: transaction pending")]
    TransactionPending,
    #[error("Indicator variable required but not supplied")]
    IndicatorRequired,
    #[error("Datetime field overflow: {0} seconds since epoch")]
    DatetimeOverflow(i64),
    #[error("Invalid use of null pointer")]
    InvalidUseOfNullPointer,
    /// Any failure of the client library.
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

impl Error {
    /// SQLSTATE reported for this error.
    pub fn state(&self) -> State {
        match self {
            Error::InvalidCursorState => State::INVALID_CURSOR_STATE,
            Error::OperationCanceled => State::OPERATION_CANCELED,
            Error::InvalidDescriptorIndex { .. } | Error::InvalidParameterNumber(_) => {
                State::INVALID_DESCRIPTOR_INDEX
            }
            Error::InvalidBufferType(_) | Error::InvalidBindParameterType(_) => {
                State::INVALID_APPLICATION_BUFFER_TYPE
            }
            Error::InvalidStringOrBufferLength(_) => State::INVALID_STRING_OR_BUFFER_LENGTH,
            Error::UnsupportedFetchType { .. }
            | Error::UnsupportedParameterType { .. }
            | Error::ParameterSize { .. }
            | Error::NotImplemented(_) => State::OPTIONAL_FEATURE_NOT_IMPLEMENTED,
            Error::FunctionSequence
            | Error::NoParameterNeedsData
            | Error::ParameterNotInNeedOfData(_)
            | Error::MetaDataUnavailable => State::FUNCTION_SEQUENCE_ERROR,
            Error::InvalidFieldIdentifier(_) | Error::InvalidColumnAttribute(_) => {
                State::INVALID_DESCRIPTOR_FIELD_IDENTIFIER
            }
            Error::InvalidAttributeValue => State::INVALID_ATTRIBUTE_VALUE,
            Error::InvalidInfoType(_) => State::INFORMATION_TYPE_OUT_OF_RANGE,
            Error::FetchTypeOutOfRange(_) => State::FETCH_TYPE_OUT_OF_RANGE,
            Error::InvalidOptionIdentifier(_) => State::INVALID_ATTRIBUTE_OPTION_IDENTIFIER,
            Error::ConnectionInUse => State::CONNECTION_NAME_IN_USE,
            Error::ConnectionNotOpen => State::CONNECTION_NOT_OPEN,
            Error::ConnectionFailed(_) => State::CONNECTION_REJECTED,
            Error::TransactionPending => State::INVALID_STATE_TRANSACTION,
            Error::IndicatorRequired => State::INDICATOR_VARIABLE_REQUIRED_BUT_NOT_SUPPLIED,
            Error::DatetimeOverflow(_) => State::DATETIME_FIELD_OVERFLOW,
            Error::InvalidUseOfNullPointer => State::INVALID_USE_OF_NULL_POINTER,
            Error::Remote(remote) => remote.state(),
        }
    }

    /// Error code of the database, `0` for errors raised by the driver itself.
    pub fn native_error(&self) -> i32 {
        match self {
            Error::Remote(remote) | Error::ConnectionFailed(remote) => remote.code,
            _ => 0,
        }
    }

    pub fn to_record(&self) -> Record {
        Record {
            state: self.state(),
            native_error: self.native_error(),
            message: self.to_string(),
        }
    }
}
