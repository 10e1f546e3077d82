use odbc_sys::{DATA_AT_EXEC, Len, NTS, NULL_DATA, len_data_at_exec};

use crate::Error;

/// Lengths below this value encode the total length of a value supplied at execution time.
pub const LEN_DATA_AT_EXEC_OFFSET: Len = -100;

/// Meaning of a length / indicator value supplied by the application together with a parameter
/// buffer or a chunk of `SQLPutData`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    /// The value is `NULL`.
    Null,
    /// The buffer holds a zero terminated string.
    NullTerminated,
    /// The value is going to be sent with `SQLPutData`. Its length is not known in advance.
    DataAtExec,
    /// The value is going to be sent with `SQLPutData` and has this many bytes in total.
    DataAtExecLength(usize),
    /// Number of bytes in the buffer.
    Length(usize),
}

impl Indicator {
    /// Interprets the `isize` indicator value of the ODBC C API.
    pub fn from_isize(indicator: Len) -> Result<Self, Error> {
        let indicator = match indicator {
            NULL_DATA => Indicator::Null,
            NTS => Indicator::NullTerminated,
            DATA_AT_EXEC => Indicator::DataAtExec,
            n if n <= LEN_DATA_AT_EXEC_OFFSET => {
                Indicator::DataAtExecLength((LEN_DATA_AT_EXEC_OFFSET - n) as usize)
            }
            n => Indicator::Length(
                usize::try_from(n).map_err(|_| Error::InvalidStringOrBufferLength(n))?,
            ),
        };
        Ok(indicator)
    }

    /// Creates an indicator value as required by the ODBC C API.
    pub fn to_isize(self) -> Len {
        match self {
            Indicator::Null => NULL_DATA,
            Indicator::NullTerminated => NTS,
            Indicator::DataAtExec => DATA_AT_EXEC,
            Indicator::DataAtExecLength(len) => len_data_at_exec(len as Len),
            Indicator::Length(len) => len as Len,
        }
    }

    /// `true` if the value is going to be streamed with `SQLPutData`.
    pub fn is_data_at_exec(self) -> bool {
        matches!(self, Indicator::DataAtExec | Indicator::DataAtExecLength(_))
    }
}
