//! `SQLParamData` and `SQLPutData`: parameter values supplied after `SQLExecute` returned
//! `SQL_NEED_DATA`.

use log::debug;
use odbc_sys::{Len, Pointer, SqlReturn};

use crate::{
    Error,
    bindings::{DataAtExec, Indicator},
    handles::{AsHandle, State, write_out},
    marshal::{ParameterChunk, set_parameter},
};

use super::Statement;

/// Where a statement stands within a data at execution sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PutData {
    #[default]
    Idle,
    /// Execution is waiting for data, no parameter has been handed out by `SQLParamData` yet.
    Pending,
    /// `SQLPutData` applies to this parameter.
    Supplying(u16),
}

impl Statement {
    /// `SQLParamData`. Completes the parameter handed out before, then hands out the next one
    /// awaiting data by writing the pointer it has been bound with to `value`. Executes the
    /// statement once no parameter is left.
    ///
    /// # Safety
    ///
    /// `value` must be NULL or valid for writing a [`Pointer`].
    pub unsafe fn param_data(&mut self, value: *mut Pointer) -> SqlReturn {
        self.guarded("SQLParamData", |stmt| {
            let start = match stmt.put_data {
                PutData::Idle => return Err(Error::NoParameterNeedsData),
                PutData::Pending => 1,
                PutData::Supplying(number) => {
                    stmt.complete_put_data(number)?;
                    number + 1
                }
            };
            for number in start..=stmt.parameters.len() {
                let Some(binding) = stmt.parameters.get(number) else {
                    continue;
                };
                if binding.data_at_exec.is_some() {
                    debug!("SQLParamData: parameter {number} needs data");
                    unsafe { write_out(value, binding.pointer) };
                    stmt.put_data = PutData::Supplying(number);
                    return Ok(SqlReturn::NEED_DATA);
                }
            }
            let Statement {
                prepared,
                attributes,
                ..
            } = stmt;
            if let Some(prepared) = prepared {
                prepared.statement().set_query_timeout(attributes.query_timeout)?;
            }
            stmt.run()
        })
    }

    /// `SQLPutData`. Successive calls for the same parameter append to its value. With a length
    /// announced at bind time, bytes beyond it are dropped with `01004`.
    ///
    /// # Safety
    ///
    /// `data` must be valid for `length` bytes, or zero terminated for `SQL_NTS`.
    pub unsafe fn put_data(&mut self, data: Pointer, length: Len) -> SqlReturn {
        self.guarded("SQLPutData", |stmt| {
            let PutData::Supplying(number) = stmt.put_data else {
                return Err(Error::NoParameterNeedsData);
            };
            let Statement {
                prepared,
                parameters,
                errors,
                ..
            } = stmt;
            let statement = prepared
                .as_mut()
                .ok_or(Error::FunctionSequence)?
                .statement();
            let binding = parameters
                .get_mut(number)
                .ok_or(Error::ParameterNotInNeedOfData(number))?;
            let mode = binding
                .data_at_exec
                .ok_or(Error::ParameterNotInNeedOfData(number))?;
            let mut indicator = Indicator::from_isize(length)?;
            match (mode, indicator) {
                (DataAtExec::Remaining(_), Indicator::NullTerminated) => {
                    // A terminated string is the whole value
                    binding.data_at_exec = Some(DataAtExec::Remaining(0));
                }
                (DataAtExec::Remaining(left), Indicator::Length(len)) => {
                    if len > left {
                        errors.post_state(
                            State::STRING_DATA_RIGHT_TRUNCATION,
                            format!(
                                "String data, right truncated: parameter {number} expected {left} \
                                more bytes, got {len}"
                            ),
                        );
                    }
                    let accepted = len.min(left);
                    indicator = Indicator::Length(accepted);
                    binding.data_at_exec = Some(DataAtExec::Remaining(left - accepted));
                }
                _ => (),
            }
            let chunk = ParameterChunk {
                pointer: data as *const u8,
                indicator,
            };
            let parameter_meta_data = statement.parameter_meta_data()?;
            let parameter_type = || Ok(parameter_meta_data.parameter_type(number.into()));
            let force_reset = binding.count == 0;
            unsafe { set_parameter(binding, number, chunk, force_reset, statement, parameter_type) }?;
            binding.count += 1;
            Ok(SqlReturn::SUCCESS)
        })
    }

    /// Parameter `number` gets no more data. Without any call to `SQLPutData` it is NULL.
    fn complete_put_data(&mut self, number: u16) -> Result<(), Error> {
        let Statement {
            prepared,
            parameters,
            ..
        } = self;
        let Some(binding) = parameters.get_mut(number) else {
            return Ok(());
        };
        if binding.count == 0 {
            let statement = prepared
                .as_mut()
                .ok_or(Error::FunctionSequence)?
                .statement();
            statement.set_null(number.into(), binding.sql_type.0.into())?;
        }
        binding.data_at_exec = None;
        Ok(())
    }
}
