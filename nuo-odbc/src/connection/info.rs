//! `SQLGetInfo` and `SQLGetFunctions`.
//!
//! Both answer from tables built once on first use. Items whose value depends on the database are
//! marked as such in the table and resolved against the connection when asked for.

use std::collections::HashMap;

use lazy_static::lazy_static;
use std::primitive::u16 as USmallInt;

use crate::{Error, remote::DatabaseMetaData};

/// `SQL_API_ODBC3_ALL_FUNCTIONS`
pub const ODBC3_ALL_FUNCTIONS: USmallInt = 999;
/// `SQL_API_ALL_FUNCTIONS`
pub const ALL_FUNCTIONS: USmallInt = 0;
/// Words in the bitmap returned for [`ODBC3_ALL_FUNCTIONS`].
pub const ODBC3_ALL_FUNCTIONS_SIZE: usize = 250;
/// Entries in the array returned for [`ALL_FUNCTIONS`].
pub const ALL_FUNCTIONS_SIZE: usize = 100;

const DRIVER_NAME: &str = "libNuoODBC.so";
const DRIVER_VERSION: &str = "01.00.0000";
const ODBC_VERSION: &str = "03.50.0000";
const DRIVER_ODBC_VERSION: &str = "03.50";

const KEYWORDS: &str = "BIGINT,BINARY,BLOB,BOOLEAN,BREAK,CATCH,CLOB,CONTAINING,ENUM,EXPLAIN,\
    FOR_UPDATE,GENERATED,IF,LIMIT,NCLOB,NEXT_VALUE,OFF,OFFSET,RECORD_BATCHING,REGEXP,RESTART,\
    RETURN,STARTING,STRING_TYPE,THROW,TRY,VAR,VER";

// Info types, see sqlext.h
const SQL_MAX_DRIVER_CONNECTIONS: USmallInt = 0;
const SQL_MAX_CONCURRENT_ACTIVITIES: USmallInt = 1;
const SQL_DATA_SOURCE_NAME: USmallInt = 2;
const SQL_DRIVER_NAME: USmallInt = 6;
const SQL_DRIVER_VER: USmallInt = 7;
const SQL_ODBC_API_CONFORMANCE: USmallInt = 9;
const SQL_ODBC_VER: USmallInt = 10;
const SQL_ROW_UPDATES: USmallInt = 11;
const SQL_SERVER_NAME: USmallInt = 13;
const SQL_SEARCH_PATTERN_ESCAPE: USmallInt = 14;
const SQL_DATABASE_NAME: USmallInt = 16;
const SQL_DBMS_NAME: USmallInt = 17;
const SQL_DBMS_VER: USmallInt = 18;
const SQL_ACCESSIBLE_TABLES: USmallInt = 19;
const SQL_ACCESSIBLE_PROCEDURES: USmallInt = 20;
const SQL_PROCEDURES: USmallInt = 21;
const SQL_CONCAT_NULL_BEHAVIOR: USmallInt = 22;
const SQL_CURSOR_COMMIT_BEHAVIOR: USmallInt = 23;
const SQL_CURSOR_ROLLBACK_BEHAVIOR: USmallInt = 24;
const SQL_DATA_SOURCE_READ_ONLY: USmallInt = 25;
const SQL_DEFAULT_TXN_ISOLATION: USmallInt = 26;
const SQL_EXPRESSIONS_IN_ORDERBY: USmallInt = 27;
const SQL_IDENTIFIER_CASE: USmallInt = 28;
const SQL_IDENTIFIER_QUOTE_CHAR: USmallInt = 29;
const SQL_MAX_COLUMN_NAME_LEN: USmallInt = 30;
const SQL_MAX_SCHEMA_NAME_LEN: USmallInt = 32;
const SQL_MAX_CATALOG_NAME_LEN: USmallInt = 34;
const SQL_MAX_TABLE_NAME_LEN: USmallInt = 35;
const SQL_MULT_RESULT_SETS: USmallInt = 36;
const SQL_MULTIPLE_ACTIVE_TXN: USmallInt = 37;
const SQL_SCHEMA_TERM: USmallInt = 39;
const SQL_PROCEDURE_TERM: USmallInt = 40;
const SQL_CATALOG_NAME_SEPARATOR: USmallInt = 41;
const SQL_CATALOG_TERM: USmallInt = 42;
const SQL_SCROLL_CONCURRENCY: USmallInt = 43;
const SQL_SCROLL_OPTIONS: USmallInt = 44;
const SQL_TABLE_TERM: USmallInt = 45;
const SQL_TXN_CAPABLE: USmallInt = 46;
const SQL_USER_NAME: USmallInt = 47;
const SQL_NUMERIC_FUNCTIONS: USmallInt = 49;
const SQL_STRING_FUNCTIONS: USmallInt = 50;
const SQL_SYSTEM_FUNCTIONS: USmallInt = 51;
const SQL_TIMEDATE_FUNCTIONS: USmallInt = 52;
const SQL_TXN_ISOLATION_OPTION: USmallInt = 72;
const SQL_INTEGRITY: USmallInt = 73;
const SQL_CORRELATION_NAME: USmallInt = 74;
const SQL_NON_NULLABLE_COLUMNS: USmallInt = 75;
const SQL_DRIVER_ODBC_VER: USmallInt = 77;
const SQL_LOCK_TYPES: USmallInt = 78;
const SQL_POS_OPERATIONS: USmallInt = 79;
const SQL_GETDATA_EXTENSIONS: USmallInt = 81;
const SQL_FILE_USAGE: USmallInt = 84;
const SQL_NULL_COLLATION: USmallInt = 85;
const SQL_GROUP_BY: USmallInt = 88;
const SQL_KEYWORDS: USmallInt = 89;
const SQL_ORDER_BY_COLUMNS_IN_SELECT: USmallInt = 90;
const SQL_SCHEMA_USAGE: USmallInt = 91;
const SQL_CATALOG_USAGE: USmallInt = 92;
const SQL_QUOTED_IDENTIFIER_CASE: USmallInt = 93;
const SQL_SUBQUERIES: USmallInt = 95;
const SQL_MAX_COLUMNS_IN_GROUP_BY: USmallInt = 97;
const SQL_MAX_COLUMNS_IN_INDEX: USmallInt = 98;
const SQL_MAX_COLUMNS_IN_ORDER_BY: USmallInt = 99;
const SQL_MAX_COLUMNS_IN_SELECT: USmallInt = 100;
const SQL_MAX_COLUMNS_IN_TABLE: USmallInt = 101;
const SQL_MAX_INDEX_SIZE: USmallInt = 102;
const SQL_MAX_ROW_SIZE_INCLUDES_LONG: USmallInt = 103;
const SQL_MAX_ROW_SIZE: USmallInt = 104;
const SQL_MAX_TABLES_IN_SELECT: USmallInt = 106;
const SQL_NEED_LONG_DATA_LEN: USmallInt = 111;
const SQL_CATALOG_LOCATION: USmallInt = 114;
const SQL_DYNAMIC_CURSOR_ATTRIBUTES1: USmallInt = 144;
const SQL_DYNAMIC_CURSOR_ATTRIBUTES2: USmallInt = 145;
const SQL_FORWARD_ONLY_CURSOR_ATTRIBUTES1: USmallInt = 146;
const SQL_FORWARD_ONLY_CURSOR_ATTRIBUTES2: USmallInt = 147;
const SQL_KEYSET_CURSOR_ATTRIBUTES1: USmallInt = 150;
const SQL_KEYSET_CURSOR_ATTRIBUTES2: USmallInt = 151;
const SQL_STATIC_CURSOR_ATTRIBUTES1: USmallInt = 167;
const SQL_STATIC_CURSOR_ATTRIBUTES2: USmallInt = 168;
const SQL_CATALOG_NAME: USmallInt = 10003;

// Cursor commit and rollback behaviour
const SQL_CB_DELETE: u16 = 0;
const SQL_CB_CLOSE: u16 = 1;
const SQL_CB_PRESERVE: u16 = 2;

// Transaction isolation bits
const ISOLATION_LEVELS: [u32; 4] = [1, 2, 4, 8];

// Scalar functions. Numeric
const SQL_FN_NUM_ABS: u32 = 0x1;
const SQL_FN_NUM_ACOS: u32 = 0x2;
const SQL_FN_NUM_ASIN: u32 = 0x4;
const SQL_FN_NUM_ATAN: u32 = 0x8;
const SQL_FN_NUM_ATAN2: u32 = 0x10;
const SQL_FN_NUM_CEILING: u32 = 0x20;
const SQL_FN_NUM_COS: u32 = 0x40;
const SQL_FN_NUM_COT: u32 = 0x80;
const SQL_FN_NUM_FLOOR: u32 = 0x200;
const SQL_FN_NUM_MOD: u32 = 0x800;
const SQL_FN_NUM_SIN: u32 = 0x2000;
const SQL_FN_NUM_SQRT: u32 = 0x4000;
const SQL_FN_NUM_TAN: u32 = 0x8000;
const SQL_FN_NUM_PI: u32 = 0x10000;
const SQL_FN_NUM_RAND: u32 = 0x20000;
const SQL_FN_NUM_DEGREES: u32 = 0x40000;
const SQL_FN_NUM_POWER: u32 = 0x100000;
const SQL_FN_NUM_RADIANS: u32 = 0x200000;
const SQL_FN_NUM_ROUND: u32 = 0x400000;
// String
const SQL_FN_STR_CONCAT: u32 = 0x1;
const SQL_FN_STR_LTRIM: u32 = 0x8;
const SQL_FN_STR_LENGTH: u32 = 0x10;
const SQL_FN_STR_LOCATE: u32 = 0x20;
const SQL_FN_STR_LCASE: u32 = 0x40;
const SQL_FN_STR_REPLACE: u32 = 0x100;
const SQL_FN_STR_RTRIM: u32 = 0x400;
const SQL_FN_STR_SUBSTRING: u32 = 0x800;
const SQL_FN_STR_UCASE: u32 = 0x1000;
// System
const SQL_FN_SYS_USERNAME: u32 = 0x1;
const SQL_FN_SYS_DBNAME: u32 = 0x2;
const SQL_FN_SYS_IFNULL: u32 = 0x4;
// Time and date
const SQL_FN_TD_NOW: u32 = 0x1;
const SQL_FN_TD_DAYOFMONTH: u32 = 0x4;
const SQL_FN_TD_DAYOFWEEK: u32 = 0x8;
const SQL_FN_TD_DAYOFYEAR: u32 = 0x10;
const SQL_FN_TD_MONTH: u32 = 0x20;
const SQL_FN_TD_YEAR: u32 = 0x100;
const SQL_FN_TD_HOUR: u32 = 0x400;
const SQL_FN_TD_MINUTE: u32 = 0x800;
const SQL_FN_TD_SECOND: u32 = 0x1000;
const SQL_FN_TD_CURRENT_DATE: u32 = 0x20000;
const SQL_FN_TD_CURRENT_TIME: u32 = 0x40000;
const SQL_FN_TD_CURRENT_TIMESTAMP: u32 = 0x80000;
const SQL_FN_TD_EXTRACT: u32 = 0x100000;

/// `SQL_API_*` codes of the functions this driver implements.
const SUPPORTED_FUNCTIONS: &[USmallInt] = &[
    1,    // SQLAllocConnect
    2,    // SQLAllocEnv
    3,    // SQLAllocStmt
    4,    // SQLBindCol
    5,    // SQLCancel
    6,    // SQLColAttribute(s)
    7,    // SQLConnect
    8,    // SQLDescribeCol
    9,    // SQLDisconnect
    10,   // SQLError
    11,   // SQLExecDirect
    12,   // SQLExecute
    13,   // SQLFetch
    14,   // SQLFreeConnect
    15,   // SQLFreeEnv
    16,   // SQLFreeStmt
    18,   // SQLNumResultCols
    19,   // SQLPrepare
    20,   // SQLRowCount
    23,   // SQLTransact
    40,   // SQLColumns
    41,   // SQLDriverConnect
    43,   // SQLGetData
    44,   // SQLGetFunctions
    45,   // SQLGetInfo
    47,   // SQLGetTypeInfo
    48,   // SQLParamData
    49,   // SQLPutData
    53,   // SQLStatistics
    54,   // SQLTables
    55,   // SQLBrowseConnect
    58,   // SQLDescribeParam
    61,   // SQLMoreResults
    62,   // SQLNativeSql
    63,   // SQLNumParams
    65,   // SQLPrimaryKeys
    66,   // SQLProcedureColumns
    67,   // SQLProcedures
    72,   // SQLBindParameter
    1001, // SQLAllocHandle
    1003, // SQLCloseCursor
    1005, // SQLEndTran
    1006, // SQLFreeHandle
    1007, // SQLGetConnectAttr
    1008, // SQLGetDescField
    1010, // SQLGetDiagField
    1011, // SQLGetDiagRec
    1012, // SQLGetEnvAttr
    1014, // SQLGetStmtAttr
    1016, // SQLSetConnectAttr
    1017, // SQLSetDescField
    1019, // SQLSetEnvAttr
    1020, // SQLSetStmtAttr
    1021, // SQLFetchScroll
];

/// Value of an info item, in the representation `SQLGetInfo` hands it out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InfoValue {
    Text(String),
    Short(u16),
    Long(u32),
}

/// Where the value of an info item comes from.
#[derive(Clone, Copy)]
enum Item {
    Text(&'static str),
    Short(u16),
    Long(u32),
    /// Name of the data source.
    DataSource,
    /// Name of the database connected to.
    Database,
    /// Asks the metadata of the database.
    MetaData(fn(&dyn DatabaseMetaData) -> InfoValue),
}

fn cursor_behavior(cursors_open: bool, statements_open: bool) -> InfoValue {
    InfoValue::Short(if cursors_open {
        SQL_CB_PRESERVE
    } else if statements_open {
        SQL_CB_CLOSE
    } else {
        SQL_CB_DELETE
    })
}

fn isolation_options(meta_data: &dyn DatabaseMetaData) -> InfoValue {
    let mask = ISOLATION_LEVELS
        .into_iter()
        .filter(|&level| meta_data.supports_transaction_isolation_level(level))
        .fold(0, |mask, level| mask | level);
    InfoValue::Long(mask)
}

fn build_items() -> HashMap<USmallInt, Item> {
    use Item::{Long, MetaData, Short, Text};

    HashMap::from([
        (SQL_MAX_DRIVER_CONNECTIONS, Short(0)),
        (SQL_MAX_CONCURRENT_ACTIVITIES, Short(0)),
        (SQL_DATA_SOURCE_NAME, Item::DataSource),
        (SQL_DRIVER_NAME, Text(DRIVER_NAME)),
        (SQL_DRIVER_VER, Text(DRIVER_VERSION)),
        (SQL_ODBC_API_CONFORMANCE, Short(2)),
        (SQL_ODBC_VER, Text(ODBC_VERSION)),
        (SQL_ROW_UPDATES, Text("N")),
        (SQL_SERVER_NAME, Item::DataSource),
        (
            SQL_SEARCH_PATTERN_ESCAPE,
            MetaData(|m| InfoValue::Text(m.search_string_escape())),
        ),
        (SQL_DATABASE_NAME, Item::Database),
        (
            SQL_DBMS_NAME,
            MetaData(|m| InfoValue::Text(m.database_product_name())),
        ),
        (
            SQL_DBMS_VER,
            MetaData(|m| InfoValue::Text(m.database_product_version())),
        ),
        (SQL_ACCESSIBLE_TABLES, Text("N")),
        (SQL_ACCESSIBLE_PROCEDURES, Text("Y")),
        (SQL_PROCEDURES, Text("Y")),
        (SQL_CONCAT_NULL_BEHAVIOR, Short(0)),
        (
            SQL_CURSOR_COMMIT_BEHAVIOR,
            MetaData(|m| {
                cursor_behavior(
                    m.supports_open_cursors_across_commit(),
                    m.supports_open_statements_across_commit(),
                )
            }),
        ),
        (
            SQL_CURSOR_ROLLBACK_BEHAVIOR,
            MetaData(|m| {
                cursor_behavior(
                    m.supports_open_cursors_across_rollback(),
                    m.supports_open_statements_across_rollback(),
                )
            }),
        ),
        (SQL_DATA_SOURCE_READ_ONLY, Text("N")),
        (
            SQL_DEFAULT_TXN_ISOLATION,
            MetaData(|m| InfoValue::Long(m.default_transaction_isolation())),
        ),
        (SQL_EXPRESSIONS_IN_ORDERBY, Text("Y")),
        (SQL_IDENTIFIER_CASE, Short(1)),
        (
            SQL_IDENTIFIER_QUOTE_CHAR,
            MetaData(|m| InfoValue::Text(m.identifier_quote_string())),
        ),
        (SQL_MAX_COLUMN_NAME_LEN, Short(128)),
        (SQL_MAX_SCHEMA_NAME_LEN, Short(128)),
        (SQL_MAX_CATALOG_NAME_LEN, Short(0)),
        (SQL_MAX_TABLE_NAME_LEN, Short(128)),
        (SQL_MULT_RESULT_SETS, Text("Y")),
        (SQL_MULTIPLE_ACTIVE_TXN, Text("Y")),
        (SQL_SCHEMA_TERM, MetaData(|m| InfoValue::Text(m.schema_term()))),
        (
            SQL_PROCEDURE_TERM,
            MetaData(|m| InfoValue::Text(m.procedure_term())),
        ),
        (SQL_CATALOG_NAME_SEPARATOR, Text(".")),
        (SQL_CATALOG_TERM, MetaData(|m| InfoValue::Text(m.catalog_term()))),
        (SQL_SCROLL_CONCURRENCY, Long(1)),
        (SQL_SCROLL_OPTIONS, Long(1)),
        (SQL_TABLE_TERM, Text("table")),
        (SQL_TXN_CAPABLE, Short(2)),
        (SQL_USER_NAME, MetaData(|m| InfoValue::Text(m.user_name()))),
        (
            SQL_NUMERIC_FUNCTIONS,
            Long(
                SQL_FN_NUM_ABS
                    | SQL_FN_NUM_ACOS
                    | SQL_FN_NUM_ASIN
                    | SQL_FN_NUM_ATAN
                    | SQL_FN_NUM_ATAN2
                    | SQL_FN_NUM_CEILING
                    | SQL_FN_NUM_COS
                    | SQL_FN_NUM_COT
                    | SQL_FN_NUM_DEGREES
                    | SQL_FN_NUM_FLOOR
                    | SQL_FN_NUM_MOD
                    | SQL_FN_NUM_PI
                    | SQL_FN_NUM_POWER
                    | SQL_FN_NUM_RADIANS
                    | SQL_FN_NUM_RAND
                    | SQL_FN_NUM_ROUND
                    | SQL_FN_NUM_SIN
                    | SQL_FN_NUM_SQRT
                    | SQL_FN_NUM_TAN,
            ),
        ),
        (
            SQL_STRING_FUNCTIONS,
            Long(
                SQL_FN_STR_CONCAT
                    | SQL_FN_STR_LCASE
                    | SQL_FN_STR_LENGTH
                    | SQL_FN_STR_LOCATE
                    | SQL_FN_STR_LTRIM
                    | SQL_FN_STR_REPLACE
                    | SQL_FN_STR_RTRIM
                    | SQL_FN_STR_SUBSTRING
                    | SQL_FN_STR_UCASE,
            ),
        ),
        (
            SQL_SYSTEM_FUNCTIONS,
            Long(SQL_FN_SYS_USERNAME | SQL_FN_SYS_DBNAME | SQL_FN_SYS_IFNULL),
        ),
        (
            SQL_TIMEDATE_FUNCTIONS,
            Long(
                SQL_FN_TD_NOW
                    | SQL_FN_TD_DAYOFMONTH
                    | SQL_FN_TD_DAYOFWEEK
                    | SQL_FN_TD_DAYOFYEAR
                    | SQL_FN_TD_MONTH
                    | SQL_FN_TD_YEAR
                    | SQL_FN_TD_HOUR
                    | SQL_FN_TD_MINUTE
                    | SQL_FN_TD_SECOND
                    | SQL_FN_TD_CURRENT_DATE
                    | SQL_FN_TD_CURRENT_TIME
                    | SQL_FN_TD_CURRENT_TIMESTAMP
                    | SQL_FN_TD_EXTRACT,
            ),
        ),
        (SQL_TXN_ISOLATION_OPTION, MetaData(isolation_options)),
        (SQL_INTEGRITY, Text("Y")),
        (SQL_CORRELATION_NAME, Short(2)),
        (SQL_NON_NULLABLE_COLUMNS, Short(1)),
        (SQL_DRIVER_ODBC_VER, Text(DRIVER_ODBC_VERSION)),
        (SQL_LOCK_TYPES, Long(0)),
        (SQL_POS_OPERATIONS, Long(0)),
        (SQL_GETDATA_EXTENSIONS, Long(0)),
        (SQL_FILE_USAGE, Short(0)),
        (SQL_NULL_COLLATION, Short(2)),
        (SQL_GROUP_BY, Short(1)),
        (SQL_KEYWORDS, Text(KEYWORDS)),
        (SQL_ORDER_BY_COLUMNS_IN_SELECT, Text("N")),
        (SQL_SCHEMA_USAGE, Long(0x1f)),
        (SQL_CATALOG_USAGE, Long(0)),
        (SQL_QUOTED_IDENTIFIER_CASE, Short(4)),
        (SQL_SUBQUERIES, Long(0x1f)),
        (SQL_MAX_COLUMNS_IN_GROUP_BY, Short(0)),
        (SQL_MAX_COLUMNS_IN_INDEX, Short(0)),
        (SQL_MAX_COLUMNS_IN_ORDER_BY, Short(0)),
        (SQL_MAX_COLUMNS_IN_SELECT, Short(0)),
        (SQL_MAX_COLUMNS_IN_TABLE, Short(0)),
        (SQL_MAX_INDEX_SIZE, Long(0)),
        (SQL_MAX_ROW_SIZE_INCLUDES_LONG, Text("Y")),
        (SQL_MAX_ROW_SIZE, Long(0)),
        (SQL_MAX_TABLES_IN_SELECT, Short(0)),
        (SQL_NEED_LONG_DATA_LEN, Text("N")),
        (SQL_CATALOG_LOCATION, Short(0)),
        (SQL_DYNAMIC_CURSOR_ATTRIBUTES1, Long(0)),
        (SQL_DYNAMIC_CURSOR_ATTRIBUTES2, Long(0)),
        (SQL_FORWARD_ONLY_CURSOR_ATTRIBUTES1, Long(0)),
        (SQL_FORWARD_ONLY_CURSOR_ATTRIBUTES2, Long(0)),
        (SQL_KEYSET_CURSOR_ATTRIBUTES1, Long(0)),
        (SQL_KEYSET_CURSOR_ATTRIBUTES2, Long(0)),
        (SQL_STATIC_CURSOR_ATTRIBUTES1, Long(0)),
        (SQL_STATIC_CURSOR_ATTRIBUTES2, Long(0)),
        (SQL_CATALOG_NAME, Text("N")),
    ])
}

/// Answers to `SQLGetFunctions`, in both layouts the driver manager may ask for.
struct Functions {
    array: [USmallInt; ALL_FUNCTIONS_SIZE],
    bitmap: [USmallInt; ODBC3_ALL_FUNCTIONS_SIZE],
}

impl Functions {
    fn new() -> Self {
        let mut array = [0; ALL_FUNCTIONS_SIZE];
        let mut bitmap = [0; ODBC3_ALL_FUNCTIONS_SIZE];
        for &function in SUPPORTED_FUNCTIONS {
            if let Some(entry) = array.get_mut(usize::from(function)) {
                *entry = 1;
            }
            bitmap[usize::from(function >> 4)] |= 1 << (function & 0xf);
        }
        Self { array, bitmap }
    }

    fn exists(&self, function: USmallInt) -> bool {
        self.bitmap
            .get(usize::from(function >> 4))
            .is_some_and(|word| word & (1 << (function & 0xf)) != 0)
    }
}

lazy_static! {
    static ref ITEMS: HashMap<USmallInt, Item> = build_items();
    static ref FUNCTIONS: Functions = Functions::new();
}

/// Items which may be asked for before a connection is established.
fn is_available_unconnected(info_type: USmallInt) -> bool {
    matches!(
        info_type,
        SQL_ODBC_VER | SQL_DRIVER_ODBC_VER | SQL_ODBC_API_CONFORMANCE
    )
}

/// What a connection knows about itself, for resolving info items.
pub struct InfoSource<'a> {
    pub dsn: &'a str,
    pub database: &'a str,
    /// `None` while not connected.
    pub meta_data: Option<&'a dyn DatabaseMetaData>,
}

/// Value of the info item `info_type`.
pub fn info_value(info_type: USmallInt, source: &InfoSource<'_>) -> Result<InfoValue, Error> {
    let item = ITEMS
        .get(&info_type)
        .ok_or(Error::InvalidInfoType(info_type))?;
    if source.meta_data.is_none() && !is_available_unconnected(info_type) {
        return Err(Error::ConnectionNotOpen);
    }
    let value = match *item {
        Item::Text(text) => InfoValue::Text(text.to_owned()),
        Item::Short(value) => InfoValue::Short(value),
        Item::Long(value) => InfoValue::Long(value),
        Item::DataSource => InfoValue::Text(source.dsn.to_owned()),
        Item::Database => InfoValue::Text(source.database.to_owned()),
        Item::MetaData(query) => match source.meta_data {
            Some(meta_data) => query(meta_data),
            None => return Err(Error::ConnectionNotOpen),
        },
    };
    Ok(value)
}

/// The array answering `SQL_API_ALL_FUNCTIONS`. `1` for every supported function below `100`.
pub fn all_functions() -> &'static [USmallInt; ALL_FUNCTIONS_SIZE] {
    &FUNCTIONS.array
}

/// The bitmap answering `SQL_API_ODBC3_ALL_FUNCTIONS`.
pub fn odbc3_functions() -> &'static [USmallInt; ODBC3_ALL_FUNCTIONS_SIZE] {
    &FUNCTIONS.bitmap
}

pub fn function_exists(function: USmallInt) -> bool {
    FUNCTIONS.exists(function)
}
