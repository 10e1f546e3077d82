use std::{cmp::min, ptr, slice};

use chrono::{Datelike, Local, NaiveDateTime, TimeZone, Timelike};
use log::trace;
use odbc_sys::{Date, SqlReturn, Time, Timestamp};
use widestring::U16String;

use crate::{
    Error,
    bindings::{Binding, Indicator},
    handles::{ErrorQueue, Fixed, Layout, State, write_out},
    remote::{RemoteTimestamp, ValueSource},
};

use super::{BindType, Destination, effective_c_type};

/// Outcome of moving (a piece of) a value into the buffer.
struct Delivered {
    /// Bytes of the value which had not been delivered before this call.
    remaining: usize,
    /// Every byte of the value has been delivered by earlier calls.
    exhausted: bool,
}

/// Moves the value of `column` from `source` into the buffer bound by `binding`, for row `row` of
/// an array laid out according to `bind_type`.
///
/// Character and binary values are delivered in chunks over repeated calls, `binding` tracks the
/// progress. The indicator always receives the number of bytes available before the call, or
/// `SQL_NULL_DATA`. Once a value has been delivered completely the next call returns
/// `SQL_NO_DATA` and resets the binding.
///
/// Truncation is posted to `errors` as `01004`, the caller reports success with info.
pub fn set_value(
    binding: &mut Binding,
    column: u16,
    source: &mut dyn ValueSource,
    row: usize,
    bind_type: BindType,
    errors: &mut ErrorQueue,
) -> Result<SqlReturn, Error> {
    trace!(
        "set_value on column {column} type {:?} buffer length {} offset {} row {row}",
        binding.c_type, binding.buffer_length, binding.offset
    );
    let index = i32::from(column);
    let c_type = effective_c_type(binding.c_type, || Ok(source.value_type(index)?))?;
    let layout = c_type.layout().ok_or(Error::UnsupportedFetchType {
        c_type: c_type.as_raw(),
        column,
    })?;
    if !matches!(layout, Layout::Fixed(_)) && binding.buffer_length < 0 {
        return Err(Error::InvalidStringOrBufferLength(binding.buffer_length));
    }
    let dest = Destination::locate(binding, layout, row, bind_type);

    match convert(binding, column, source, &dest, errors) {
        Ok(ret) => Ok(ret),
        Err(Error::Remote(remote)) if remote.is_truncation() => {
            errors.post(Error::Remote(remote).to_record());
            Ok(SqlReturn::SUCCESS)
        }
        Err(error) => Err(error),
    }
}

fn convert(
    binding: &mut Binding,
    column: u16,
    source: &mut dyn ValueSource,
    dest: &Destination,
    errors: &mut ErrorQueue,
) -> Result<SqlReturn, Error> {
    let index = i32::from(column);
    let delivered = match dest.layout {
        Layout::Text => {
            let value = source.get_string(index)?;
            deliver_chunk(binding, column, dest, value.len(), 1, errors, |offset, buf| {
                buf.copy_from_slice(&value.as_bytes()[offset..offset + buf.len()]);
                Ok(())
            })?
        }
        Layout::WideText => {
            let value = U16String::from_str(&source.get_string(index)?);
            let bytes: Vec<u8> = value
                .as_slice()
                .iter()
                .flat_map(|unit| unit.to_ne_bytes())
                .collect();
            deliver_chunk(binding, column, dest, bytes.len(), 2, errors, |offset, buf| {
                buf.copy_from_slice(&bytes[offset..offset + buf.len()]);
                Ok(())
            })?
        }
        Layout::Binary => {
            let blob = source.get_blob(index)?;
            deliver_chunk(binding, column, dest, blob.length(), 0, errors, |offset, buf| {
                blob.read(offset, buf)?;
                Ok(())
            })?
        }
        Layout::Fixed(fixed) => {
            write_fixed(fixed, source, index, dest.data)?;
            Delivered {
                remaining: fixed.size(),
                exhausted: binding.count > 0,
            }
        }
    };

    if source.was_null() {
        if binding.count > 0 {
            binding.reset();
            return Ok(SqlReturn::NO_DATA);
        }
        if dest.indicator.is_null() {
            return Err(Error::IndicatorRequired);
        }
        unsafe { write_out(dest.indicator, Indicator::Null.to_isize()) };
        binding.count += 1;
        return Ok(SqlReturn::SUCCESS);
    }

    unsafe { write_out(dest.indicator, Indicator::Length(delivered.remaining).to_isize()) };
    if delivered.exhausted {
        binding.reset();
        Ok(SqlReturn::NO_DATA)
    } else {
        binding.count += 1;
        Ok(SqlReturn::SUCCESS)
    }
}

/// Copies the next piece of a variable length value of `total` bytes into the buffer.
/// `terminator` is the size of the zero terminating the piece (`0` for binary data).
fn deliver_chunk(
    binding: &mut Binding,
    column: u16,
    dest: &Destination,
    total: usize,
    terminator: usize,
    errors: &mut ErrorQueue,
    read: impl FnOnce(usize, &mut [u8]) -> Result<(), Error>,
) -> Result<Delivered, Error> {
    let remaining = total.saturating_sub(binding.offset);
    let room = if dest.data.is_null() {
        0
    } else {
        dest.capacity.saturating_sub(terminator)
    };
    let mut n = min(room, remaining);
    if terminator > 1 {
        n -= n % terminator;
    }
    if n > 0 {
        let buf = unsafe { slice::from_raw_parts_mut(dest.data, n) };
        read(binding.offset, buf)?;
    }
    if remaining > n {
        errors.post_state(
            State::STRING_DATA_RIGHT_TRUNCATION,
            format!("Data truncated on column {column}, need length {remaining} only have {n}"),
        );
    }
    binding.offset += n;
    let terminate = terminator > 0
        && !dest.data.is_null()
        && dest.capacity >= terminator
        && (n > 0 || binding.count == 0);
    if terminate {
        unsafe { ptr::write_bytes(dest.data.add(n), 0, terminator) };
    }
    Ok(Delivered {
        remaining,
        exhausted: remaining == 0 && binding.count > 0,
    })
}

fn write_fixed(
    fixed: Fixed,
    source: &mut dyn ValueSource,
    index: i32,
    data: *mut u8,
) -> Result<(), Error> {
    unsafe {
        match fixed {
            Fixed::I16 => write_out(data as *mut i16, source.get_short(index)?),
            Fixed::I32 => write_out(data as *mut i32, source.get_int(index)?),
            Fixed::F32 => write_out(data as *mut f32, source.get_float(index)?),
            Fixed::F64 => write_out(data as *mut f64, source.get_double(index)?),
            Fixed::I8 => write_out(data as *mut i8, source.get_byte(index)?),
            Fixed::I64 => write_out(data as *mut i64, source.get_long(index)?),
            Fixed::Bit => write_out(data, u8::from(source.get_boolean(index)?)),
            Fixed::Date => {
                let local = local_time(source.get_date(index)?, 0)?;
                write_out(data as *mut Date, date_struct(&local))
            }
            Fixed::Time => {
                let local = local_time(source.get_time(index)?, 0)?;
                write_out(data as *mut Time, time_struct(&local))
            }
            Fixed::Timestamp => {
                let RemoteTimestamp { seconds, nanos } = source.get_timestamp(index)?;
                let local = local_time(seconds, nanos)?;
                write_out(data as *mut Timestamp, timestamp_struct(&local, nanos))
            }
        }
    }
    Ok(())
}

/// Epoch seconds in the local time zone of the process.
fn local_time(seconds: i64, nanos: u32) -> Result<NaiveDateTime, Error> {
    Local
        .timestamp_opt(seconds, nanos % 1_000_000_000)
        .earliest()
        .map(|time| time.naive_local())
        .ok_or(Error::DatetimeOverflow(seconds))
}

fn date_struct(local: &NaiveDateTime) -> Date {
    Date {
        year: local.year() as i16,
        month: local.month() as u16,
        day: local.day() as u16,
    }
}

fn time_struct(local: &NaiveDateTime) -> Time {
    Time {
        hour: local.hour() as u16,
        minute: local.minute() as u16,
        second: local.second() as u16,
    }
}

fn timestamp_struct(local: &NaiveDateTime, nanos: u32) -> Timestamp {
    Timestamp {
        year: local.year() as i16,
        month: local.month() as u16,
        day: local.day() as u16,
        hour: local.hour() as u16,
        minute: local.minute() as u16,
        second: local.second() as u16,
        // ODBC counts the fraction in nanoseconds, which is what the client library reports
        fraction: nanos,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Local, TimeZone, Timelike};
    use odbc_sys::{Len, NULL_DATA, SqlReturn, Timestamp};

    use crate::{
        Error,
        bindings::Binding,
        handles::{CType, ErrorQueue, State},
        marshal::BindType,
        remote::{
            RemoteTimestamp,
            memory::{Row, Value},
        },
    };

    use super::set_value;

    fn get_data(
        binding: &mut Binding,
        row: &mut Row,
        errors: &mut ErrorQueue,
    ) -> Result<SqlReturn, Error> {
        set_value(binding, 1, row, 0, BindType::Column, errors)
    }

    fn text_binding(buffer: &mut [u8], indicator: &mut Len) -> Binding {
        Binding {
            pointer: buffer.as_mut_ptr().cast(),
            indicator,
            buffer_length: buffer.len() as Len,
            c_type: CType::Char,
            ..Binding::default()
        }
    }

    #[test]
    fn two_byte_buffer_receives_first_character() {
        let mut row = Row::new(vec![Value::from("hello")]);
        let mut buffer = [b'x'; 2];
        let mut indicator = 0;
        let mut binding = text_binding(&mut buffer, &mut indicator);
        let mut errors = ErrorQueue::default();

        let ret = get_data(&mut binding, &mut row, &mut errors).unwrap();

        assert_eq!(SqlReturn::SUCCESS, ret);
        assert_eq!(errors.success(ret), SqlReturn::SUCCESS_WITH_INFO);
        assert_eq!(b"h\0", &buffer);
        assert_eq!(5, indicator);
        assert_eq!(State::STRING_DATA_RIGHT_TRUNCATION, errors.pop().unwrap().state);
    }

    #[test]
    fn chunks_concatenate_to_the_value() {
        let mut row = Row::new(vec![Value::from("hello world")]);
        let mut buffer = [0u8; 4];
        let mut indicator = 0;
        let mut binding = text_binding(&mut buffer, &mut indicator);
        let mut collected = Vec::new();
        let mut indicators = Vec::new();

        loop {
            let mut errors = ErrorQueue::default();
            let ret = get_data(&mut binding, &mut row, &mut errors).unwrap();
            if ret == SqlReturn::NO_DATA {
                break;
            }
            let indicator = unsafe { *binding.indicator };
            indicators.push(indicator);
            let n = (indicator as usize).min(3);
            collected.extend_from_slice(unsafe {
                std::slice::from_raw_parts(binding.pointer as *const u8, n)
            });
            assert_eq!(indicator > 3, !errors.is_empty());
        }

        assert_eq!(b"hello world", collected.as_slice());
        assert_eq!(vec![11, 8, 5, 2], indicators);
        assert_eq!(0, binding.offset);
    }

    #[test]
    fn exact_fit_then_no_data() {
        let mut row = Row::new(vec![Value::from("abc")]);
        let mut buffer = [0u8; 4];
        let mut indicator = 0;
        let mut binding = text_binding(&mut buffer, &mut indicator);
        let mut errors = ErrorQueue::default();

        assert_eq!(SqlReturn::SUCCESS, get_data(&mut binding, &mut row, &mut errors).unwrap());
        assert!(errors.is_empty());
        assert_eq!(b"abc\0", &buffer);
        assert_eq!(
            SqlReturn::NO_DATA,
            get_data(&mut binding, &mut row, &mut errors).unwrap()
        );
    }

    #[test]
    fn empty_string_is_terminated_and_has_length_zero() {
        let mut row = Row::new(vec![Value::from("")]);
        let mut buffer = [b'x'; 4];
        let mut indicator = -7;
        let mut binding = text_binding(&mut buffer, &mut indicator);
        let mut errors = ErrorQueue::default();

        let ret = get_data(&mut binding, &mut row, &mut errors).unwrap();

        assert_eq!(SqlReturn::SUCCESS, ret);
        assert_eq!(0, buffer[0]);
        assert_eq!(0, indicator);
    }

    #[test]
    fn probing_with_zero_capacity_reports_length() {
        let mut row = Row::new(vec![Value::from("hello")]);
        let mut indicator = 0;
        let mut binding = Binding {
            indicator: &mut indicator,
            c_type: CType::Char,
            ..Binding::default()
        };
        let mut errors = ErrorQueue::default();

        let ret = get_data(&mut binding, &mut row, &mut errors).unwrap();

        assert_eq!(SqlReturn::SUCCESS, ret);
        assert_eq!(5, indicator);
        assert_eq!(1, errors.len());
    }

    #[test]
    fn wide_text_reserves_two_bytes_for_terminator() {
        let mut row = Row::new(vec![Value::from("héllo")]);
        let mut buffer = [0xffu16; 3];
        let mut indicator = 0;
        let mut binding = Binding {
            pointer: buffer.as_mut_ptr().cast(),
            indicator: &mut indicator,
            buffer_length: 5,
            c_type: CType::WChar,
            ..Binding::default()
        };
        let mut errors = ErrorQueue::default();

        get_data(&mut binding, &mut row, &mut errors).unwrap();

        assert_eq!(['h' as u16, 0, 0xffff], buffer);
        assert_eq!(10, indicator);
        assert_eq!(2, binding.offset);
    }

    #[test]
    fn binary_is_not_terminated() {
        let mut row = Row::new(vec![Value::Bytes(vec![1, 2, 3, 4, 5])]);
        let mut buffer = [0u8; 3];
        let mut indicator = 0;
        let mut binding = Binding {
            pointer: buffer.as_mut_ptr().cast(),
            indicator: &mut indicator,
            buffer_length: 3,
            c_type: CType::Binary,
            ..Binding::default()
        };
        let mut errors = ErrorQueue::default();

        get_data(&mut binding, &mut row, &mut errors).unwrap();
        assert_eq!([1, 2, 3], buffer);
        assert_eq!(5, indicator);

        get_data(&mut binding, &mut row, &mut errors).unwrap();
        assert_eq!([4, 5], buffer[..2]);
        assert_eq!(2, indicator);
    }

    #[test]
    fn null_overrides_length() {
        let mut row = Row::new(vec![Value::Null]);
        let mut value = 42i32;
        let mut indicator = 0;
        let mut binding = Binding {
            pointer: (&mut value as *mut i32).cast(),
            indicator: &mut indicator,
            c_type: CType::SLong,
            ..Binding::default()
        };
        let mut errors = ErrorQueue::default();

        let ret = get_data(&mut binding, &mut row, &mut errors).unwrap();

        assert_eq!(SqlReturn::SUCCESS, ret);
        assert_eq!(NULL_DATA, indicator);
    }

    #[test]
    fn null_without_indicator_is_an_error() {
        let mut row = Row::new(vec![Value::Null]);
        let mut buffer = [0u8; 8];
        let mut binding = Binding {
            pointer: buffer.as_mut_ptr().cast(),
            buffer_length: 8,
            c_type: CType::Char,
            ..Binding::default()
        };
        let mut errors = ErrorQueue::default();

        let result = get_data(&mut binding, &mut row, &mut errors);

        assert!(matches!(result, Err(Error::IndicatorRequired)));
    }

    #[test]
    fn fixed_size_values_are_delivered_once() {
        let mut row = Row::new(vec![Value::Int(7)]);
        let mut value = 0i64;
        let mut indicator = 0;
        let mut binding = Binding {
            pointer: (&mut value as *mut i64).cast(),
            indicator: &mut indicator,
            c_type: CType::SBigInt,
            ..Binding::default()
        };
        let mut errors = ErrorQueue::default();

        assert_eq!(SqlReturn::SUCCESS, get_data(&mut binding, &mut row, &mut errors).unwrap());
        assert_eq!(7, value);
        assert_eq!(8, indicator);
        assert_eq!(SqlReturn::NO_DATA, get_data(&mut binding, &mut row, &mut errors).unwrap());
    }

    #[test]
    fn default_c_type_follows_column_type() {
        let mut row = Row::new(vec![Value::Double(2.5)]);
        let mut value = 0f64;
        let mut binding = Binding {
            pointer: (&mut value as *mut f64).cast(),
            c_type: CType::Default,
            ..Binding::default()
        };
        let mut errors = ErrorQueue::default();

        get_data(&mut binding, &mut row, &mut errors).unwrap();

        assert_eq!(2.5, value);
    }

    #[test]
    fn timestamp_in_local_time() {
        let seconds = 1_600_000_000;
        let mut row = Row::new(vec![Value::Timestamp(RemoteTimestamp {
            seconds,
            nanos: 250_000_000,
        })]);
        let mut value = Timestamp::default();
        let mut binding = Binding {
            pointer: (&mut value as *mut Timestamp).cast(),
            c_type: CType::TypeTimestamp,
            ..Binding::default()
        };
        let mut errors = ErrorQueue::default();

        get_data(&mut binding, &mut row, &mut errors).unwrap();

        let expected = Local.timestamp_opt(seconds, 0).unwrap();
        assert_eq!(expected.year() as i16, value.year);
        assert_eq!(expected.day() as u16, value.day);
        assert_eq!(expected.hour() as u16, value.hour);
        assert_eq!(expected.second() as u16, value.second);
        assert_eq!(250_000_000, value.fraction);
    }

    #[test]
    fn unsupported_c_type_names_column() {
        let mut row = Row::new(vec![Value::Int(1)]);
        let mut binding = Binding {
            c_type: CType::Numeric,
            ..Binding::default()
        };
        let mut errors = ErrorQueue::default();

        let error = get_data(&mut binding, &mut row, &mut errors).unwrap_err();

        assert_eq!(State::OPTIONAL_FEATURE_NOT_IMPLEMENTED, error.state());
    }

    #[test]
    fn negative_buffer_length_is_rejected() {
        let mut row = Row::new(vec![Value::from("a")]);
        let mut binding = Binding {
            buffer_length: -1,
            c_type: CType::Char,
            ..Binding::default()
        };
        let mut errors = ErrorQueue::default();

        let error = get_data(&mut binding, &mut row, &mut errors).unwrap_err();

        assert_eq!(State::INVALID_STRING_OR_BUFFER_LENGTH, error.state());
    }
}
