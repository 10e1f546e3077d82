use std::mem::size_of;

use odbc_sys::{Date, SqlDataType, Time, Timestamp};

/// C data type of an application buffer (`SQL_C_*`).
///
/// Applications pass these as plain integers, so they are represented as a closed enum which is
/// only ever constructed from validated codes. Legacy ODBC 2 codes are kept as distinct variants,
/// since applications may read them back, but behave like their ODBC 3 counterparts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i16)]
pub enum CType {
    Char = 1,
    WChar = -8,
    Binary = -2,
    Short = 5,
    SShort = -15,
    UShort = -17,
    Long = 4,
    SLong = -16,
    ULong = -18,
    Float = 7,
    Double = 8,
    Bit = -7,
    TinyInt = -6,
    STinyInt = -26,
    UTinyInt = -28,
    SBigInt = -25,
    UBigInt = -27,
    Numeric = 2,
    Date = 9,
    Time = 10,
    Timestamp = 11,
    TypeDate = 91,
    TypeTime = 92,
    TypeTimestamp = 93,
    Guid = -11,
    /// Let the driver choose the C type matching the SQL type of the column or parameter.
    #[default]
    Default = 99,
}

/// How values of a C type are laid out in application memory. Computed once per conversion and
/// shared between the fetch and the bind direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Narrow, zero terminated text.
    Text,
    /// UTF-16 text, terminated by a zero code unit.
    WideText,
    /// Raw bytes, no terminator.
    Binary,
    /// Single value of a fixed size.
    Fixed(Fixed),
}

/// Fixed size C representations the driver converts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fixed {
    I16,
    I32,
    F32,
    F64,
    I8,
    I64,
    Bit,
    Date,
    Time,
    Timestamp,
}

impl Fixed {
    pub fn size(self) -> usize {
        match self {
            Fixed::I16 => size_of::<i16>(),
            Fixed::I32 => size_of::<i32>(),
            Fixed::F32 => size_of::<f32>(),
            Fixed::F64 => size_of::<f64>(),
            Fixed::I8 | Fixed::Bit => size_of::<u8>(),
            Fixed::I64 => size_of::<i64>(),
            Fixed::Date => size_of::<Date>(),
            Fixed::Time => size_of::<Time>(),
            Fixed::Timestamp => size_of::<Timestamp>(),
        }
    }
}

impl CType {
    pub fn from_raw(raw: i16) -> Option<CType> {
        use CType::*;
        let c_type = match raw {
            1 => Char,
            -8 => WChar,
            -2 => Binary,
            5 => Short,
            -15 => SShort,
            -17 => UShort,
            4 => Long,
            -16 => SLong,
            -18 => ULong,
            7 => Float,
            8 => Double,
            -7 => Bit,
            -6 => TinyInt,
            -26 => STinyInt,
            -28 => UTinyInt,
            -25 => SBigInt,
            -27 => UBigInt,
            2 => Numeric,
            9 => Date,
            10 => Time,
            11 => Timestamp,
            91 => TypeDate,
            92 => TypeTime,
            93 => TypeTimestamp,
            -11 => Guid,
            99 => Default,
            _ => return None,
        };
        Some(c_type)
    }

    pub fn as_raw(self) -> i16 {
        self as i16
    }

    /// Buffer layout of this C type. `None` for types the driver recognizes, but can not convert
    /// (numeric structs, GUIDs) and for [`CType::Default`], which needs to be resolved first.
    pub fn layout(self) -> Option<Layout> {
        use CType::*;
        let layout = match self {
            Char => Layout::Text,
            WChar => Layout::WideText,
            Binary => Layout::Binary,
            Short | SShort | UShort => Layout::Fixed(Fixed::I16),
            Long | SLong | ULong => Layout::Fixed(Fixed::I32),
            Float => Layout::Fixed(Fixed::F32),
            Double => Layout::Fixed(Fixed::F64),
            Bit => Layout::Fixed(Fixed::Bit),
            TinyInt | STinyInt | UTinyInt => Layout::Fixed(Fixed::I8),
            SBigInt | UBigInt => Layout::Fixed(Fixed::I64),
            Date | TypeDate => Layout::Fixed(Fixed::Date),
            Time | TypeTime => Layout::Fixed(Fixed::Time),
            Timestamp | TypeTimestamp => Layout::Fixed(Fixed::Timestamp),
            Numeric | Guid | Default => return None,
        };
        Some(layout)
    }

    /// Canonical C type for values of the given SQL type. Applied if an application binds
    /// [`CType::Default`].
    pub fn default_for(sql_type: SqlDataType) -> CType {
        match sql_type {
            SqlDataType::EXT_W_CHAR | SqlDataType::EXT_W_VARCHAR | SqlDataType::EXT_W_LONG_VARCHAR => {
                CType::WChar
            }
            SqlDataType::EXT_BIT => CType::Bit,
            SqlDataType::EXT_TINY_INT => CType::STinyInt,
            SqlDataType::SMALLINT => CType::SShort,
            SqlDataType::INTEGER => CType::SLong,
            SqlDataType::EXT_BIG_INT => CType::SBigInt,
            SqlDataType::REAL => CType::Float,
            SqlDataType::FLOAT | SqlDataType::DOUBLE => CType::Double,
            SqlDataType::EXT_BINARY
            | SqlDataType::EXT_VAR_BINARY
            | SqlDataType::EXT_LONG_VAR_BINARY => CType::Binary,
            SqlDataType::DATE => CType::TypeDate,
            SqlDataType::TIME => CType::TypeTime,
            SqlDataType::TIMESTAMP => CType::TypeTimestamp,
            // Legacy ODBC 2 codes for the temporal types
            SqlDataType(9) => CType::Date,
            SqlDataType(10) => CType::Time,
            SqlDataType(11) => CType::Timestamp,
            // Character, decimal and everything the client library describes on its own terms is
            // delivered as text.
            _ => CType::Char,
        }
    }
}
