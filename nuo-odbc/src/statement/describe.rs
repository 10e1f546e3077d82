//! Shape of result sets and parameters: `SQLNumResultCols`, `SQLDescribeCol`,
//! `SQLColAttribute(s)`, `SQLNumParams` and `SQLDescribeParam`.

use std::sync::Arc;

use odbc_sys::{Len, Pointer, SqlDataType, SqlReturn, ULen};
use std::primitive::i16 as SmallInt;
use std::primitive::u16 as USmallInt;

use crate::{
    Error,
    handles::{AsHandle, OutputString, State, clamp_small_int, column_sql_type, write_out},
    remote::ResultSetMetaData,
};

use super::Statement;

// Field identifiers shared by `SQLColAttributes` and `SQLColAttribute`
const SQL_COLUMN_COUNT: USmallInt = 0;
const SQL_COLUMN_NAME: USmallInt = 1;
const SQL_COLUMN_TYPE: USmallInt = 2;
const SQL_COLUMN_LENGTH: USmallInt = 3;
const SQL_COLUMN_PRECISION: USmallInt = 4;
const SQL_COLUMN_SCALE: USmallInt = 5;
const SQL_COLUMN_DISPLAY_SIZE: USmallInt = 6;
const SQL_COLUMN_NULLABLE: USmallInt = 7;
const SQL_COLUMN_UNSIGNED: USmallInt = 8;
const SQL_COLUMN_MONEY: USmallInt = 9;
const SQL_COLUMN_UPDATABLE: USmallInt = 10;
const SQL_COLUMN_AUTO_INCREMENT: USmallInt = 11;
const SQL_COLUMN_CASE_SENSITIVE: USmallInt = 12;
const SQL_COLUMN_SEARCHABLE: USmallInt = 13;
const SQL_COLUMN_TYPE_NAME: USmallInt = 14;
const SQL_COLUMN_TABLE_NAME: USmallInt = 15;
const SQL_COLUMN_OWNER_NAME: USmallInt = 16;
const SQL_COLUMN_QUALIFIER_NAME: USmallInt = 17;
const SQL_COLUMN_LABEL: USmallInt = 18;
const SQL_DESC_BASE_COLUMN_NAME: USmallInt = 22;
const SQL_DESC_BASE_TABLE_NAME: USmallInt = 23;
const SQL_DESC_COUNT: USmallInt = 1001;
const SQL_DESC_TYPE: USmallInt = 1002;
const SQL_DESC_LENGTH: USmallInt = 1003;
const SQL_DESC_PRECISION: USmallInt = 1005;
const SQL_DESC_SCALE: USmallInt = 1006;
const SQL_DESC_NULLABLE: USmallInt = 1008;
const SQL_DESC_NAME: USmallInt = 1011;
const SQL_DESC_UNNAMED: USmallInt = 1012;
const SQL_DESC_OCTET_LENGTH: USmallInt = 1013;

const SQL_NO_NULLS: SmallInt = 0;
const SQL_NULLABLE: SmallInt = 1;
const SQL_NAMED: Len = 0;
const SQL_UNNAMED: Len = 1;
const SQL_ATTR_READONLY: Len = 0;
const SQL_ATTR_WRITE: Len = 1;
const SQL_PRED_NONE: Len = 0;
const SQL_PRED_SEARCHABLE: Len = 3;

/// Value of a column attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ColumnAttribute {
    Text(String),
    Number(Len),
}

impl From<bool> for ColumnAttribute {
    fn from(value: bool) -> Self {
        ColumnAttribute::Number(value.into())
    }
}

impl From<i32> for ColumnAttribute {
    fn from(value: i32) -> Self {
        ColumnAttribute::Number(value as Len)
    }
}

/// Label of the column, falling back to its name.
fn display_name(meta_data: &dyn ResultSetMetaData, column: i32) -> String {
    let label = meta_data.column_label(column);
    if label.is_empty() {
        meta_data.column_name(column)
    } else {
        label
    }
}

/// Type as reported by the column attributes. Character columns without any known length are
/// published as long character data.
fn attribute_type(meta_data: &dyn ResultSetMetaData, column: i32) -> Len {
    let sql_type = column_sql_type(meta_data.column_type(column));
    let unbounded = matches!(sql_type, SqlDataType::CHAR | SqlDataType::VARCHAR)
        && meta_data.current_column_max_length(column) == 0;
    if unbounded {
        SqlDataType::EXT_LONG_VARCHAR.0.into()
    } else {
        sql_type.0.into()
    }
}

fn nullability(nullable: bool) -> SmallInt {
    if nullable { SQL_NULLABLE } else { SQL_NO_NULLS }
}

/// `SQLColAttribute`, ODBC 3.
fn odbc3_attribute(
    meta_data: &dyn ResultSetMetaData,
    column: i32,
    field: USmallInt,
) -> Result<ColumnAttribute, Error> {
    use ColumnAttribute::{Number, Text};
    let attribute = match field {
        SQL_COLUMN_LABEL | SQL_COLUMN_NAME | SQL_DESC_NAME => Text(display_name(meta_data, column)),
        SQL_DESC_BASE_COLUMN_NAME => Text(meta_data.column_name(column)),
        SQL_DESC_UNNAMED => {
            if meta_data.column_label(column).is_empty() && meta_data.column_name(column).is_empty()
            {
                Number(SQL_UNNAMED)
            } else {
                Number(SQL_NAMED)
            }
        }
        SQL_COLUMN_UNSIGNED => (!meta_data.is_signed(column)).into(),
        SQL_COLUMN_UPDATABLE => {
            if meta_data.is_writable(column) {
                Number(SQL_ATTR_WRITE)
            } else {
                Number(SQL_ATTR_READONLY)
            }
        }
        SQL_COLUMN_COUNT | SQL_DESC_COUNT => meta_data.column_count().into(),
        SQL_DESC_TYPE | SQL_COLUMN_TYPE => Number(attribute_type(meta_data, column)),
        SQL_COLUMN_LENGTH | SQL_DESC_LENGTH | SQL_DESC_OCTET_LENGTH | SQL_COLUMN_DISPLAY_SIZE => {
            meta_data.current_column_max_length(column).into()
        }
        SQL_COLUMN_PRECISION | SQL_DESC_PRECISION => meta_data.precision(column).into(),
        SQL_COLUMN_SCALE | SQL_DESC_SCALE => meta_data.scale(column).into(),
        SQL_COLUMN_NULLABLE | SQL_DESC_NULLABLE => {
            Number(nullability(meta_data.is_nullable(column)).into())
        }
        SQL_COLUMN_MONEY => meta_data.is_currency(column).into(),
        SQL_COLUMN_AUTO_INCREMENT => meta_data.is_auto_increment(column).into(),
        SQL_COLUMN_CASE_SENSITIVE => meta_data.is_case_sensitive(column).into(),
        SQL_COLUMN_SEARCHABLE => {
            if meta_data.is_searchable(column) {
                Number(SQL_PRED_SEARCHABLE)
            } else {
                Number(SQL_PRED_NONE)
            }
        }
        SQL_COLUMN_TYPE_NAME => Text(meta_data.column_type_name(column)),
        SQL_COLUMN_TABLE_NAME | SQL_DESC_BASE_TABLE_NAME => Text(meta_data.table_name(column)),
        SQL_COLUMN_OWNER_NAME => Text(meta_data.schema_name(column)),
        SQL_COLUMN_QUALIFIER_NAME => Text(meta_data.catalog_name(column)),
        other => return Err(Error::InvalidColumnAttribute(other)),
    };
    Ok(attribute)
}

/// `SQLColAttributes`, ODBC 2.
fn odbc2_attribute(
    meta_data: &dyn ResultSetMetaData,
    column: i32,
    field: USmallInt,
) -> Result<ColumnAttribute, Error> {
    use ColumnAttribute::{Number, Text};
    let attribute = match field {
        SQL_COLUMN_LABEL | SQL_COLUMN_NAME => Text(display_name(meta_data, column)),
        SQL_COLUMN_UNSIGNED => (!meta_data.is_signed(column)).into(),
        SQL_COLUMN_UPDATABLE => meta_data.is_writable(column).into(),
        SQL_COLUMN_COUNT => meta_data.column_count().into(),
        SQL_COLUMN_TYPE => Number(attribute_type(meta_data, column)),
        SQL_COLUMN_LENGTH | SQL_DESC_OCTET_LENGTH | SQL_COLUMN_DISPLAY_SIZE => {
            meta_data.current_column_max_length(column).into()
        }
        SQL_COLUMN_PRECISION => meta_data.precision(column).into(),
        SQL_COLUMN_SCALE => meta_data.scale(column).into(),
        SQL_COLUMN_NULLABLE => meta_data.is_nullable(column).into(),
        SQL_COLUMN_AUTO_INCREMENT => meta_data.is_auto_increment(column).into(),
        SQL_COLUMN_CASE_SENSITIVE => meta_data.is_case_sensitive(column).into(),
        SQL_COLUMN_SEARCHABLE => meta_data.is_searchable(column).into(),
        SQL_COLUMN_TYPE_NAME => Text(meta_data.column_type_name(column)),
        SQL_COLUMN_TABLE_NAME => Text(meta_data.table_name(column)),
        other => return Err(Error::InvalidColumnAttribute(other)),
    };
    Ok(attribute)
}

impl Statement {
    fn result_meta_data(&self) -> Result<Arc<dyn ResultSetMetaData>, Error> {
        self.meta_data.clone().ok_or(Error::MetaDataUnavailable)
    }

    /// Columns of the current result set, `0` if there is none.
    pub fn num_result_cols(&self) -> Result<SmallInt, Error> {
        Ok(match &self.meta_data {
            Some(meta_data) => {
                clamp_small_int(usize::try_from(meta_data.column_count()).unwrap_or(0))
            }
            None => 0,
        })
    }

    /// `SQLNumResultCols`
    ///
    /// # Safety
    ///
    /// `columns` must be NULL or valid for writing.
    pub unsafe fn sql_num_result_cols(&mut self, columns: *mut SmallInt) -> SqlReturn {
        self.guarded("SQLNumResultCols", |stmt| {
            let count = stmt.num_result_cols()?;
            unsafe { write_out(columns, count) };
            Ok(SqlReturn::SUCCESS)
        })
    }

    /// `SQLDescribeCol`. The name reported is the label of the column, or its name if it has no
    /// label.
    ///
    /// # Safety
    ///
    /// Every pointer must be NULL or valid, `name` for `buffer_length` bytes.
    #[allow(clippy::too_many_arguments)]
    pub unsafe fn describe_col(
        &mut self,
        column: USmallInt,
        name: *mut u8,
        buffer_length: SmallInt,
        name_length: *mut SmallInt,
        data_type: *mut SmallInt,
        column_size: *mut ULen,
        decimal_digits: *mut SmallInt,
        nullable: *mut SmallInt,
    ) -> SqlReturn {
        self.guarded("SQLDescribeCol", |stmt| {
            let meta_data = stmt.result_meta_data()?;
            let index = i32::from(column);
            let out = unsafe { OutputString::new(name, buffer_length, name_length) };
            if out.write(&display_name(meta_data.as_ref(), index)) {
                stmt.errors.post_state(
                    State::STRING_DATA_RIGHT_TRUNCATION,
                    "String data, right truncated",
                );
            }
            unsafe {
                write_out(data_type, column_sql_type(meta_data.column_type(index)).0);
                write_out(
                    column_size,
                    ULen::try_from(meta_data.precision(index)).unwrap_or(0),
                );
                write_out(
                    decimal_digits,
                    SmallInt::try_from(meta_data.scale(index)).unwrap_or(0),
                );
                write_out(nullable, nullability(meta_data.is_nullable(index)));
            }
            Ok(SqlReturn::SUCCESS)
        })
    }

    /// `SQLColAttribute`. Text attributes go to `buffer`, numeric ones to `numeric`.
    ///
    /// # Safety
    ///
    /// Every pointer must be NULL or valid, `buffer` for `buffer_length` bytes.
    pub unsafe fn col_attribute(
        &mut self,
        column: USmallInt,
        field: USmallInt,
        buffer: Pointer,
        buffer_length: SmallInt,
        string_length: *mut SmallInt,
        numeric: *mut Len,
    ) -> SqlReturn {
        self.guarded("SQLColAttribute", |stmt| {
            let meta_data = stmt.result_meta_data()?;
            let attribute = odbc3_attribute(meta_data.as_ref(), column.into(), field)?;
            unsafe { stmt.write_attribute(attribute, buffer, buffer_length, string_length, numeric) };
            Ok(SqlReturn::SUCCESS)
        })
    }

    /// `SQLColAttributes`, the ODBC 2 variant of [`Self::col_attribute`].
    ///
    /// # Safety
    ///
    /// See [`Self::col_attribute`].
    pub unsafe fn col_attributes(
        &mut self,
        column: USmallInt,
        field: USmallInt,
        buffer: Pointer,
        buffer_length: SmallInt,
        string_length: *mut SmallInt,
        numeric: *mut Len,
    ) -> SqlReturn {
        self.guarded("SQLColAttributes", |stmt| {
            let meta_data = stmt.result_meta_data()?;
            let attribute = odbc2_attribute(meta_data.as_ref(), column.into(), field)?;
            unsafe { stmt.write_attribute(attribute, buffer, buffer_length, string_length, numeric) };
            Ok(SqlReturn::SUCCESS)
        })
    }

    unsafe fn write_attribute(
        &mut self,
        attribute: ColumnAttribute,
        buffer: Pointer,
        buffer_length: SmallInt,
        string_length: *mut SmallInt,
        numeric: *mut Len,
    ) {
        match attribute {
            ColumnAttribute::Text(text) => {
                let out = unsafe { OutputString::new(buffer.cast(), buffer_length, string_length) };
                if out.write(&text) {
                    self.errors.post_state(
                        State::STRING_DATA_RIGHT_TRUNCATION,
                        "String data, right truncated",
                    );
                }
            }
            ColumnAttribute::Number(value) => unsafe { write_out(numeric, value) },
        }
    }

    /// `SQLNumParams`
    ///
    /// # Safety
    ///
    /// `count` must be NULL or valid for writing.
    pub unsafe fn num_params(&mut self, count: *mut SmallInt) -> SqlReturn {
        self.guarded("SQLNumParams", |stmt| {
            let prepared = stmt.prepared.as_mut().ok_or(Error::FunctionSequence)?;
            let declared = prepared.statement().parameter_meta_data()?.parameter_count();
            let declared = clamp_small_int(usize::try_from(declared).unwrap_or(0));
            unsafe { write_out(count, declared) };
            Ok(SqlReturn::SUCCESS)
        })
    }

    /// `SQLDescribeParam`
    ///
    /// # Safety
    ///
    /// Every pointer must be NULL or valid for writing.
    pub unsafe fn describe_param(
        &mut self,
        parameter: USmallInt,
        data_type: *mut SmallInt,
        parameter_size: *mut ULen,
        decimal_digits: *mut SmallInt,
        nullable: *mut SmallInt,
    ) -> SqlReturn {
        self.guarded("SQLDescribeParam", |stmt| {
            let prepared = stmt.prepared.as_mut().ok_or(Error::FunctionSequence)?;
            let meta_data = prepared.statement().parameter_meta_data()?;
            let index = i32::from(parameter);
            if index == 0 || index > meta_data.parameter_count() {
                return Err(Error::InvalidParameterNumber(parameter));
            }
            unsafe {
                write_out(data_type, column_sql_type(meta_data.parameter_type(index)).0);
                write_out(
                    parameter_size,
                    ULen::try_from(meta_data.precision(index)).unwrap_or(0),
                );
                write_out(
                    decimal_digits,
                    SmallInt::try_from(meta_data.scale(index)).unwrap_or(0),
                );
                write_out(nullable, nullability(meta_data.is_nullable(index)));
            }
            Ok(SqlReturn::SUCCESS)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use odbc_sys::SqlDataType;

    use crate::{
        Error,
        remote::{
            ResultSet, ResultSetMetaData,
            memory::{Column, MemoryResultSet, Table},
        },
    };

    use super::{
        ColumnAttribute, SQL_COLUMN_CASE_SENSITIVE, SQL_COLUMN_COUNT, SQL_COLUMN_UNSIGNED,
        SQL_DESC_NAME, SQL_DESC_TYPE, odbc2_attribute, odbc3_attribute,
    };

    fn meta_data() -> Arc<dyn ResultSetMetaData> {
        let table = Table::new(vec![Column::new("ID", 4), Column::new("NAME", 12)]);
        MemoryResultSet::new(table).meta_data()
    }

    #[test]
    fn character_columns_without_length_are_long() {
        let meta_data = meta_data();

        let attribute = odbc3_attribute(meta_data.as_ref(), 2, SQL_DESC_TYPE).unwrap();

        assert_eq!(
            ColumnAttribute::Number(SqlDataType::EXT_LONG_VARCHAR.0.into()),
            attribute
        );
        assert_eq!(
            ColumnAttribute::Number(4),
            odbc3_attribute(meta_data.as_ref(), 1, SQL_DESC_TYPE).unwrap()
        );
    }

    #[test]
    fn name_and_count() {
        let meta_data = meta_data();

        assert_eq!(
            ColumnAttribute::Text("NAME".to_owned()),
            odbc3_attribute(meta_data.as_ref(), 2, SQL_DESC_NAME).unwrap()
        );
        assert_eq!(
            ColumnAttribute::Number(2),
            odbc2_attribute(meta_data.as_ref(), 1, SQL_COLUMN_COUNT).unwrap()
        );
    }

    #[test]
    fn odbc2_unsigned_and_case_sensitive_follow_the_column() {
        let meta_data = meta_data();

        let unsigned = odbc2_attribute(meta_data.as_ref(), 1, SQL_COLUMN_UNSIGNED).unwrap();
        let case_sensitive =
            odbc2_attribute(meta_data.as_ref(), 1, SQL_COLUMN_CASE_SENSITIVE).unwrap();

        assert_eq!(ColumnAttribute::from(!meta_data.is_signed(1)), unsigned);
        assert_eq!(
            ColumnAttribute::from(meta_data.is_case_sensitive(1)),
            case_sensitive
        );
    }

    #[test]
    fn unknown_field() {
        let meta_data = meta_data();

        let error = odbc3_attribute(meta_data.as_ref(), 1, 4711).unwrap_err();

        assert!(matches!(error, Error::InvalidColumnAttribute(4711)));
    }
}
