use odbc_sys::SqlDataType;

use crate::remote::types;

/// Maps a type code of the client library to the SQL type reported to ODBC applications. Large
/// objects become their long variable length counterparts, everything else shares its code with
/// ODBC.
pub fn sql_type_from_remote(remote: i32) -> SqlDataType {
    match remote {
        types::BLOB => SqlDataType::EXT_LONG_VAR_BINARY,
        types::CLOB => SqlDataType::EXT_LONG_VARCHAR,
        types::NCLOB => SqlDataType::EXT_W_LONG_VARCHAR,
        types::BOOLEAN => SqlDataType::EXT_BIT,
        other => SqlDataType(i16::try_from(other).unwrap_or(SqlDataType::VARCHAR.0)),
    }
}

/// Like [`sql_type_from_remote`], but for describing result set columns. Literal `NULL` columns
/// have no type of their own, they are published as `VARCHAR`.
pub fn column_sql_type(remote: i32) -> SqlDataType {
    if remote == types::NULL {
        SqlDataType::VARCHAR
    } else {
        sql_type_from_remote(remote)
    }
}

/// `true` for SQL types whose values are character data.
pub fn is_character(sql_type: SqlDataType) -> bool {
    matches!(
        sql_type,
        SqlDataType::CHAR
            | SqlDataType::VARCHAR
            | SqlDataType::EXT_LONG_VARCHAR
            | SqlDataType::EXT_W_CHAR
            | SqlDataType::EXT_W_VARCHAR
            | SqlDataType::EXT_W_LONG_VARCHAR
    )
}
