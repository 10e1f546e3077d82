//! Catalog functions. Each one replaces whatever the statement held with a result set enumerated
//! by the database metadata.

use std::borrow::Cow;

use log::debug;
use odbc_sys::SqlReturn;
use std::primitive::i16 as SmallInt;
use std::primitive::u16 as USmallInt;

use crate::{
    Error,
    catalog::MappedResultSet,
    handles::{AsHandle, input_string},
    remote::{DatabaseMetaData, ResultSet},
};

use super::Statement;

/// `SQL_INDEX_UNIQUE`
const INDEX_UNIQUE: USmallInt = 0;
/// `SQL_QUICK`
const QUICK: USmallInt = 0;

/// # Safety
///
/// See [`input_string`].
unsafe fn argument<'a>(text: *const u8, length: SmallInt) -> Result<Option<Cow<'a, str>>, Error> {
    unsafe { input_string(text, length.into()) }
}

/// Splits the table type list of `SQLTables`, e.g. `'TABLE','VIEW'`, into its entries.
fn table_types(list: &str) -> Vec<String> {
    list.split(',')
        .map(|entry| entry.trim().trim_matches('\'').to_owned())
        .filter(|entry| !entry.is_empty())
        .collect()
}

impl Statement {
    fn catalog_result_set(
        &mut self,
        function: &str,
        enumerate: impl FnOnce(&dyn DatabaseMetaData) -> Result<Box<dyn ResultSet>, Error>,
    ) -> Result<SqlReturn, Error> {
        self.release_statement()?;
        self.sql = function.to_owned();
        debug!("{function}");
        let meta_data = self.session.meta_data()?;
        let result_set = enumerate(meta_data.as_ref())?;
        self.set_result_set(result_set);
        Ok(SqlReturn::SUCCESS)
    }

    /// `SQLTables`. `table_type` is a comma separated list, entries may be quoted.
    ///
    /// # Safety
    ///
    /// Every argument must be NULL or hold the given number of bytes or be zero terminated.
    #[allow(clippy::too_many_arguments)]
    pub unsafe fn tables(
        &mut self,
        catalog: *const u8,
        catalog_length: SmallInt,
        schema: *const u8,
        schema_length: SmallInt,
        table: *const u8,
        table_length: SmallInt,
        table_type: *const u8,
        table_type_length: SmallInt,
    ) -> SqlReturn {
        self.guarded("SQLTables", |stmt| {
            let catalog = unsafe { argument(catalog, catalog_length) }?;
            let schema = unsafe { argument(schema, schema_length) }?;
            let table = unsafe { argument(table, table_length) }?;
            let types = unsafe { argument(table_type, table_type_length) }?
                .map(|list| table_types(&list))
                .unwrap_or_default();
            stmt.catalog_result_set("SQLTables", |meta_data| {
                Ok(meta_data.tables(
                    catalog.as_deref(),
                    schema.as_deref(),
                    table.as_deref(),
                    &types,
                )?)
            })
        })
    }

    /// `SQLColumns`. Type codes in `DATA_TYPE` are reported in ODBC terms.
    ///
    /// # Safety
    ///
    /// See [`Self::tables`].
    #[allow(clippy::too_many_arguments)]
    pub unsafe fn columns(
        &mut self,
        catalog: *const u8,
        catalog_length: SmallInt,
        schema: *const u8,
        schema_length: SmallInt,
        table: *const u8,
        table_length: SmallInt,
        column: *const u8,
        column_length: SmallInt,
    ) -> SqlReturn {
        self.guarded("SQLColumns", |stmt| {
            let catalog = unsafe { argument(catalog, catalog_length) }?;
            let schema = unsafe { argument(schema, schema_length) }?;
            let table = unsafe { argument(table, table_length) }?;
            let column = unsafe { argument(column, column_length) }?;
            stmt.catalog_result_set("SQLColumns", |meta_data| {
                let columns = meta_data.columns(
                    catalog.as_deref(),
                    schema.as_deref(),
                    table.as_deref(),
                    column.as_deref(),
                )?;
                Ok(Box::new(MappedResultSet::new(columns)))
            })
        })
    }

    /// `SQLStatistics`
    ///
    /// # Safety
    ///
    /// See [`Self::tables`].
    #[allow(clippy::too_many_arguments)]
    pub unsafe fn statistics(
        &mut self,
        catalog: *const u8,
        catalog_length: SmallInt,
        schema: *const u8,
        schema_length: SmallInt,
        table: *const u8,
        table_length: SmallInt,
        unique: USmallInt,
        reserved: USmallInt,
    ) -> SqlReturn {
        self.guarded("SQLStatistics", |stmt| {
            let catalog = unsafe { argument(catalog, catalog_length) }?;
            let schema = unsafe { argument(schema, schema_length) }?;
            let table = unsafe { argument(table, table_length) }?;
            stmt.catalog_result_set("SQLStatistics", |meta_data| {
                Ok(meta_data.index_info(
                    catalog.as_deref(),
                    schema.as_deref(),
                    table.as_deref(),
                    unique == INDEX_UNIQUE,
                    reserved == QUICK,
                )?)
            })
        })
    }

    /// `SQLPrimaryKeys`
    ///
    /// # Safety
    ///
    /// See [`Self::tables`].
    pub unsafe fn primary_keys(
        &mut self,
        catalog: *const u8,
        catalog_length: SmallInt,
        schema: *const u8,
        schema_length: SmallInt,
        table: *const u8,
        table_length: SmallInt,
    ) -> SqlReturn {
        self.guarded("SQLPrimaryKeys", |stmt| {
            let catalog = unsafe { argument(catalog, catalog_length) }?;
            let schema = unsafe { argument(schema, schema_length) }?;
            let table = unsafe { argument(table, table_length) }?;
            stmt.catalog_result_set("SQLPrimaryKeys", |meta_data| {
                Ok(meta_data.primary_keys(catalog.as_deref(), schema.as_deref(), table.as_deref())?)
            })
        })
    }

    /// `SQLForeignKeys` is not supported. Fails with `HYC00` after releasing the statement.
    pub fn foreign_keys(&mut self) -> SqlReturn {
        self.guarded("SQLForeignKeys", |stmt| {
            stmt.release_statement()?;
            Err(Error::NotImplemented("getCrossReference".to_owned()))
        })
    }

    /// `SQLProcedures`
    ///
    /// # Safety
    ///
    /// See [`Self::tables`].
    pub unsafe fn procedures(
        &mut self,
        catalog: *const u8,
        catalog_length: SmallInt,
        schema: *const u8,
        schema_length: SmallInt,
        procedure: *const u8,
        procedure_length: SmallInt,
    ) -> SqlReturn {
        self.guarded("SQLProcedures", |stmt| {
            let catalog = unsafe { argument(catalog, catalog_length) }?;
            let schema = unsafe { argument(schema, schema_length) }?;
            let procedure = unsafe { argument(procedure, procedure_length) }?;
            stmt.catalog_result_set("SQLProcedures", |meta_data| {
                Ok(meta_data.procedures(
                    catalog.as_deref(),
                    schema.as_deref(),
                    procedure.as_deref(),
                )?)
            })
        })
    }

    /// `SQLProcedureColumns`. Type codes in `DATA_TYPE` are reported in ODBC terms.
    ///
    /// # Safety
    ///
    /// See [`Self::tables`].
    #[allow(clippy::too_many_arguments)]
    pub unsafe fn procedure_columns(
        &mut self,
        catalog: *const u8,
        catalog_length: SmallInt,
        schema: *const u8,
        schema_length: SmallInt,
        procedure: *const u8,
        procedure_length: SmallInt,
        column: *const u8,
        column_length: SmallInt,
    ) -> SqlReturn {
        self.guarded("SQLProcedureColumns", |stmt| {
            let catalog = unsafe { argument(catalog, catalog_length) }?;
            let schema = unsafe { argument(schema, schema_length) }?;
            let procedure = unsafe { argument(procedure, procedure_length) }?;
            let column = unsafe { argument(column, column_length) }?;
            stmt.catalog_result_set("SQLProcedureColumns", |meta_data| {
                let columns = meta_data.procedure_columns(
                    catalog.as_deref(),
                    schema.as_deref(),
                    procedure.as_deref(),
                    column.as_deref(),
                )?;
                Ok(Box::new(MappedResultSet::new(columns)))
            })
        })
    }

    /// `SQLGetTypeInfo`. `SQL_ALL_TYPES` lists every type, any other code only the types mapping
    /// to it.
    pub fn get_type_info(&mut self, data_type: SmallInt) -> SqlReturn {
        self.guarded("SQLGetTypeInfo", |stmt| {
            stmt.catalog_result_set("SQLGetTypeInfo", |meta_data| {
                Ok(Box::new(MappedResultSet::filtered(meta_data.type_info()?, data_type)))
            })
        })
    }
}
