use std::{ffi::CStr, ptr, slice};

use odbc_sys::{Date, Len, SqlDataType, Time, Timestamp};

use crate::{
    Error,
    bindings::{Binding, Indicator},
    handles::{CType, Fixed, Layout, is_character},
    remote::PreparedStatement,
};

use super::effective_c_type;

/// A parameter value, or a piece of it, as the application supplies it: the start of the buffer
/// and its length / indicator.
#[derive(Debug, Clone, Copy)]
pub struct ParameterChunk {
    pub pointer: *const u8,
    pub indicator: Indicator,
}

impl ParameterChunk {
    /// The value bound to `binding` with `SQLBindParameter`. `bind_offset` is the value of
    /// `SQL_ATTR_PARAM_BIND_OFFSET_PTR`, added to both the data and the indicator pointer.
    ///
    /// Without an indicator the length is derived from the binding: character data is read up
    /// to its terminating zero (but no further than the column size), binary and temporal data
    /// span the column size and everything else the buffer length.
    ///
    /// # Safety
    ///
    /// The buffers bound must still be valid.
    pub unsafe fn bound(binding: &Binding, bind_offset: usize) -> Result<Self, Error> {
        let pointer = if binding.pointer.is_null() {
            ptr::null()
        } else {
            unsafe { (binding.pointer as *const u8).add(bind_offset) }
        };
        let indicator = if binding.indicator.is_null() {
            unsafe { implied_indicator(binding, pointer) }
        } else {
            let raw = unsafe {
                ((binding.indicator as *const u8).add(bind_offset) as *const Len).read_unaligned()
            };
            Indicator::from_isize(raw)?
        };
        Ok(Self { pointer, indicator })
    }
}

unsafe fn implied_indicator(binding: &Binding, pointer: *const u8) -> Indicator {
    let text = binding.c_type == CType::Char
        || (binding.c_type == CType::Default && is_character(binding.sql_type));
    if text {
        if pointer.is_null() {
            return Indicator::Length(0);
        }
        if binding.column_size == 0 {
            return Indicator::NullTerminated;
        }
        let max = binding.column_size;
        let len = (0..max)
            .take_while(|&i| unsafe { *pointer.add(i) } != 0)
            .count();
        return Indicator::Length(len);
    }
    match binding.sql_type {
        SqlDataType::EXT_BINARY
        | SqlDataType::EXT_VAR_BINARY
        | SqlDataType::EXT_LONG_VAR_BINARY
        | SqlDataType::DATE
        | SqlDataType::TIME
        | SqlDataType::TIMESTAMP => Indicator::Length(binding.column_size),
        _ => Indicator::Length(usize::try_from(binding.buffer_length).unwrap_or(0)),
    }
}

/// Sends `chunk` to parameter `parameter` of `statement`.
///
/// Character and binary data is appended to the accumulator of the binding, unless
/// `force_reset` is set, and the accumulated value is sent as a whole. This way chunks supplied
/// with `SQLPutData` add up to one value. `parameter_type` reports the type of the parameter in
/// client library codes and is only consulted for [`CType::Default`].
///
/// # Safety
///
/// `chunk` must describe valid memory.
pub unsafe fn set_parameter(
    binding: &mut Binding,
    parameter: u16,
    chunk: ParameterChunk,
    force_reset: bool,
    statement: &mut dyn PreparedStatement,
    parameter_type: impl FnOnce() -> Result<i32, Error>,
) -> Result<(), Error> {
    let index = i32::from(parameter);
    let c_type = effective_c_type(binding.c_type, parameter_type)?;

    if chunk.pointer.is_null() || chunk.indicator == Indicator::Null {
        statement.set_null(index, i32::from(binding.sql_type.0))?;
        return Ok(());
    }

    let unsupported = Error::UnsupportedParameterType {
        c_type: c_type.as_raw(),
        parameter,
    };
    // Bit parameters are not supported
    let layout = c_type
        .layout()
        .filter(|layout| *layout != Layout::Fixed(Fixed::Bit))
        .ok_or(unsupported)?;
    match layout {
        Layout::Text | Layout::WideText | Layout::Binary => {
            let bytes = unsafe { chunk_bytes(chunk, layout) };
            if force_reset {
                binding.accumulator.clear();
            }
            binding.accumulator.extend_from_slice(bytes);
            let value = &binding.accumulator;
            match layout {
                Layout::Text => statement.set_string(index, &String::from_utf8_lossy(value))?,
                Layout::Binary => statement.set_bytes(index, value)?,
                _ => {
                    let units: Vec<u16> = value
                        .chunks_exact(2)
                        .map(|pair| u16::from_ne_bytes([pair[0], pair[1]]))
                        .collect();
                    statement.set_string(index, &String::from_utf16_lossy(&units))?
                }
            }
        }
        Layout::Fixed(fixed) => {
            check_parameter_size(binding, parameter, fixed)?;
            unsafe { set_fixed(statement, index, fixed, chunk.pointer)? }
        }
    }
    Ok(())
}

/// A buffer length given for a fixed size type must be able to hold it.
fn check_parameter_size(binding: &Binding, parameter: u16, fixed: Fixed) -> Result<(), Error> {
    let expected = fixed.size();
    match usize::try_from(binding.buffer_length) {
        Ok(actual) if actual > 0 && actual < expected => Err(Error::ParameterSize {
            parameter,
            expected,
            actual: binding.buffer_length,
        }),
        _ => Ok(()),
    }
}

unsafe fn chunk_bytes<'a>(chunk: ParameterChunk, layout: Layout) -> &'a [u8] {
    let len = match chunk.indicator {
        Indicator::Length(len) => len,
        Indicator::NullTerminated if layout == Layout::WideText => {
            let units = chunk.pointer as *const u16;
            let mut n = 0;
            while unsafe { units.add(n).read_unaligned() } != 0 {
                n += 1;
            }
            n * 2
        }
        Indicator::NullTerminated => unsafe { CStr::from_ptr(chunk.pointer.cast()) }
            .to_bytes()
            .len(),
        Indicator::Null | Indicator::DataAtExec | Indicator::DataAtExecLength(_) => 0,
    };
    let len = if layout == Layout::WideText {
        len - len % 2
    } else {
        len
    };
    unsafe { slice::from_raw_parts(chunk.pointer, len) }
}

unsafe fn set_fixed(
    statement: &mut dyn PreparedStatement,
    index: i32,
    fixed: Fixed,
    pointer: *const u8,
) -> Result<(), Error> {
    unsafe {
        match fixed {
            Fixed::I16 => statement.set_short(index, (pointer as *const i16).read_unaligned())?,
            Fixed::I32 => statement.set_int(index, (pointer as *const i32).read_unaligned())?,
            Fixed::F32 => statement.set_float(index, (pointer as *const f32).read_unaligned())?,
            Fixed::F64 => statement.set_double(index, (pointer as *const f64).read_unaligned())?,
            Fixed::I8 | Fixed::Bit => {
                statement.set_byte(index, (pointer as *const i8).read_unaligned())?
            }
            Fixed::I64 => statement.set_long(index, (pointer as *const i64).read_unaligned())?,
            Fixed::Date => {
                let text = format_date(&(pointer as *const Date).read_unaligned());
                statement.set_string(index, &text)?
            }
            Fixed::Time => {
                let text = format_time(&(pointer as *const Time).read_unaligned());
                statement.set_string(index, &text)?
            }
            Fixed::Timestamp => {
                let text = format_timestamp(&(pointer as *const Timestamp).read_unaligned());
                statement.set_string(index, &text)?
            }
        }
    }
    Ok(())
}

fn format_date(date: &Date) -> String {
    format!("{:04}-{:02}-{:02}", date.year, date.month, date.day)
}

fn format_time(time: &Time) -> String {
    format!("{:02}:{:02}:{:02}", time.hour, time.minute, time.second)
}

fn format_timestamp(ts: &Timestamp) -> String {
    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
        ts.year, ts.month, ts.day, ts.hour, ts.minute, ts.second
    )
}

#[cfg(test)]
mod tests {
    use odbc_sys::{Date, Len, NTS, NULL_DATA, SqlDataType, Timestamp};

    use crate::{
        Error,
        bindings::{Binding, Indicator},
        handles::CType,
        remote::memory::{MemoryStatement, Value},
    };

    use super::{ParameterChunk, set_parameter};

    fn send(
        binding: &mut Binding,
        chunk: ParameterChunk,
        force_reset: bool,
        statement: &mut MemoryStatement,
    ) -> Result<(), Error> {
        unsafe { set_parameter(binding, 1, chunk, force_reset, statement, || Ok(12)) }
    }

    fn chunk(bytes: &[u8]) -> ParameterChunk {
        ParameterChunk {
            pointer: bytes.as_ptr(),
            indicator: Indicator::Length(bytes.len()),
        }
    }

    #[test]
    fn chunks_accumulate() {
        let mut statement = MemoryStatement::default();
        let mut binding = Binding {
            c_type: CType::Char,
            ..Binding::default()
        };

        send(&mut binding, chunk(b"hel"), true, &mut statement).unwrap();
        send(&mut binding, chunk(b"lo"), false, &mut statement).unwrap();

        assert_eq!(Some(&Value::from("hello")), statement.parameter(1));

        send(&mut binding, chunk(b"bye"), true, &mut statement).unwrap();
        assert_eq!(Some(&Value::from("bye")), statement.parameter(1));
    }

    #[test]
    fn null_pointer_or_indicator_sends_null() {
        let mut statement = MemoryStatement::default();
        let mut binding = Binding {
            c_type: CType::SLong,
            sql_type: SqlDataType::INTEGER,
            ..Binding::default()
        };
        let value = 5i32;
        let null = ParameterChunk {
            pointer: (&value as *const i32).cast(),
            indicator: Indicator::from_isize(NULL_DATA).unwrap(),
        };

        send(&mut binding, null, true, &mut statement).unwrap();

        assert_eq!(Some(&Value::Null), statement.parameter(1));
    }

    #[test]
    fn null_terminated_text() {
        let mut statement = MemoryStatement::default();
        let mut binding = Binding {
            c_type: CType::Char,
            ..Binding::default()
        };
        let text = b"abc\0def";
        let nts = ParameterChunk {
            pointer: text.as_ptr(),
            indicator: Indicator::from_isize(NTS).unwrap(),
        };

        send(&mut binding, nts, true, &mut statement).unwrap();

        assert_eq!(Some(&Value::from("abc")), statement.parameter(1));
    }

    #[test]
    fn wide_text_is_converted() {
        let mut statement = MemoryStatement::default();
        let mut binding = Binding {
            c_type: CType::WChar,
            ..Binding::default()
        };
        let text: Vec<u16> = "grüße\0".encode_utf16().collect();
        let nts = ParameterChunk {
            pointer: text.as_ptr().cast(),
            indicator: Indicator::NullTerminated,
        };

        send(&mut binding, nts, true, &mut statement).unwrap();

        assert_eq!(Some(&Value::from("grüße")), statement.parameter(1));
    }

    #[test]
    fn temporal_structs_are_sent_as_text() {
        let mut statement = MemoryStatement::default();
        let mut binding = Binding {
            c_type: CType::TypeTimestamp,
            ..Binding::default()
        };
        let ts = Timestamp {
            year: 2021,
            month: 3,
            day: 7,
            hour: 4,
            minute: 5,
            second: 6,
            fraction: 0,
        };
        let value = ParameterChunk {
            pointer: (&ts as *const Timestamp).cast(),
            indicator: Indicator::Length(0),
        };

        send(&mut binding, value, true, &mut statement).unwrap();
        assert_eq!(Some(&Value::from("2021-03-07 04:05:06")), statement.parameter(1));

        binding.c_type = CType::TypeDate;
        let date = Date {
            year: 99,
            month: 12,
            day: 1,
        };
        let value = ParameterChunk {
            pointer: (&date as *const Date).cast(),
            indicator: Indicator::Length(0),
        };
        send(&mut binding, value, true, &mut statement).unwrap();
        assert_eq!(Some(&Value::from("0099-12-01")), statement.parameter(1));
    }

    #[test]
    fn default_c_type_uses_parameter_type() {
        let mut statement = MemoryStatement::default();
        let mut binding = Binding::default();
        let value = 3.5f64;
        let chunk = ParameterChunk {
            pointer: (&value as *const f64).cast(),
            indicator: Indicator::Length(8),
        };

        unsafe { set_parameter(&mut binding, 1, chunk, true, &mut statement, || Ok(8)) }
            .unwrap();

        assert_eq!(Some(&Value::Double(3.5)), statement.parameter(1));
    }

    #[test]
    fn bit_parameters_are_not_implemented() {
        let mut statement = MemoryStatement::default();
        let mut binding = Binding {
            c_type: CType::Bit,
            ..Binding::default()
        };

        let error = send(&mut binding, chunk(&[1]), true, &mut statement).unwrap_err();

        assert!(matches!(
            error,
            Error::UnsupportedParameterType {
                c_type: -7,
                parameter: 1
            }
        ));
    }

    #[test]
    fn too_small_buffer_for_fixed_size_type() {
        let mut statement = MemoryStatement::default();
        let mut binding = Binding {
            c_type: CType::SBigInt,
            buffer_length: 4,
            ..Binding::default()
        };
        let value = 1i64;
        let chunk = ParameterChunk {
            pointer: (&value as *const i64).cast(),
            indicator: Indicator::Length(4),
        };

        let error = send(&mut binding, chunk, true, &mut statement).unwrap_err();

        assert_eq!(
            "parameter 1: expected buffer size of 8, got 4",
            error.to_string()
        );
    }

    #[test]
    fn implied_length_of_bound_text_stops_at_column_size() {
        let mut text = *b"abcdef\0";
        let binding = Binding {
            pointer: text.as_mut_ptr().cast(),
            c_type: CType::Char,
            column_size: 4,
            ..Binding::default()
        };

        let chunk = unsafe { ParameterChunk::bound(&binding, 0) }.unwrap();

        assert_eq!(Indicator::Length(4), chunk.indicator);
    }

    #[test]
    fn bind_offset_applies_to_indicator() {
        let values = [0i32, 7];
        let indicators: [Len; 2] = [0, NULL_DATA];
        let binding = Binding {
            pointer: values.as_ptr() as *mut _,
            indicator: indicators.as_ptr() as *mut Len,
            c_type: CType::SLong,
            ..Binding::default()
        };

        let chunk = unsafe { ParameterChunk::bound(&binding, 8) }.unwrap();

        assert_eq!(Indicator::Null, chunk.indicator);
    }
}
