//! Conversion between the typed values of the client library and the raw buffers of the
//! application.
//!
//! [`set_value`] moves a column value (or an output parameter) into an application buffer,
//! [`set_parameter`] moves the contents of an application buffer into a parameter of a prepared
//! statement. Both resolve the C type of the binding into a [`Layout`] once and locate the
//! destination with a [`Destination`] before converting.

mod bind;
mod fetch;

pub use self::{
    bind::{ParameterChunk, set_parameter},
    fetch::set_value,
};

use std::mem::size_of;

use odbc_sys::Len;

use crate::{
    Error,
    bindings::Binding,
    handles::{CType, Layout, sql_type_from_remote},
};

/// `SQL_ATTR_ROW_BIND_TYPE` / `SQL_ATTR_PARAM_BIND_TYPE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BindType {
    /// Every column has its own array of values (`SQL_BIND_BY_COLUMN`).
    #[default]
    Column,
    /// Values of one row are stored together in a struct of this size.
    Row(usize),
}

impl BindType {
    pub fn from_raw(raw: usize) -> Self {
        if raw == 0 {
            BindType::Column
        } else {
            BindType::Row(raw)
        }
    }

    pub fn as_raw(self) -> usize {
        match self {
            BindType::Column => 0,
            BindType::Row(size) => size,
        }
    }
}

/// C type the value is actually converted to. Replaces [`CType::Default`] by the canonical C type
/// of the SQL type, which `source_type` reports in client library codes.
pub fn effective_c_type(
    c_type: CType,
    source_type: impl FnOnce() -> Result<i32, Error>,
) -> Result<CType, Error> {
    if c_type == CType::Default {
        Ok(CType::default_for(sql_type_from_remote(source_type()?)))
    } else {
        Ok(c_type)
    }
}

/// Location of one value in application memory, computed once per conversion.
#[derive(Debug, Clone, Copy)]
pub struct Destination {
    pub layout: Layout,
    pub data: *mut u8,
    pub indicator: *mut Len,
    /// Capacity of the buffer in bytes for variable length layouts.
    pub capacity: usize,
}

impl Destination {
    /// Locates the value of `row` for `binding` in an array of values laid out according to
    /// `bind_type`.
    pub fn locate(binding: &Binding, layout: Layout, row: usize, bind_type: BindType) -> Self {
        let capacity = usize::try_from(binding.buffer_length).unwrap_or(0);
        let data = binding.pointer as *mut u8;
        let (data_offset, indicator_offset) = match bind_type {
            BindType::Column => {
                let element = match layout {
                    Layout::Fixed(fixed) => fixed.size(),
                    Layout::Text | Layout::WideText | Layout::Binary => capacity,
                };
                (element * row, size_of::<Len>() * row)
            }
            BindType::Row(row_size) => (row_size * row, row_size * row),
        };
        let indicator = if binding.indicator.is_null() {
            binding.indicator
        } else {
            unsafe { (binding.indicator as *mut u8).add(indicator_offset) as *mut Len }
        };
        let data = if data.is_null() {
            data
        } else {
            unsafe { data.add(data_offset) }
        };
        Destination {
            layout,
            data,
            indicator,
            capacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use odbc_sys::Len;

    use crate::{
        bindings::Binding,
        handles::{CType, Fixed, Layout},
    };

    use super::{BindType, Destination, effective_c_type};

    #[test]
    fn column_wise_arrays() {
        let mut texts = [0u8; 30];
        let mut indicators = [0 as Len; 3];
        let binding = Binding {
            pointer: texts.as_mut_ptr().cast(),
            indicator: indicators.as_mut_ptr(),
            buffer_length: 10,
            ..Binding::default()
        };

        let dest = Destination::locate(&binding, Layout::Text, 2, BindType::Column);

        assert_eq!(unsafe { texts.as_mut_ptr().add(20) }, dest.data);
        assert_eq!(unsafe { indicators.as_mut_ptr().add(2) }, dest.indicator);
        assert_eq!(10, dest.capacity);
    }

    #[test]
    fn column_wise_fixed_size_values_ignore_buffer_length() {
        let mut values = [0i32; 4];
        let binding = Binding {
            pointer: values.as_mut_ptr().cast(),
            buffer_length: 100,
            ..Binding::default()
        };

        let dest = Destination::locate(&binding, Layout::Fixed(Fixed::I32), 3, BindType::Column);

        assert_eq!(unsafe { values.as_mut_ptr().add(3) } as *mut u8, dest.data);
        assert!(dest.indicator.is_null());
    }

    #[test]
    fn row_wise_structs() {
        let mut rows = [0u8; 64];
        let binding = Binding {
            pointer: unsafe { rows.as_mut_ptr().add(4) }.cast(),
            indicator: unsafe { rows.as_mut_ptr().add(8) }.cast(),
            ..Binding::default()
        };

        let dest = Destination::locate(&binding, Layout::Fixed(Fixed::I32), 2, BindType::Row(16));

        assert_eq!(unsafe { rows.as_mut_ptr().add(36) }, dest.data);
        assert_eq!(unsafe { rows.as_mut_ptr().add(40) }, dest.indicator as *mut u8);
    }

    #[test]
    fn row_wise_text_keeps_its_capacity() {
        let mut rows = [0u8; 72];
        let binding = Binding {
            pointer: rows.as_mut_ptr().cast(),
            indicator: unsafe { rows.as_mut_ptr().add(16) }.cast(),
            buffer_length: 16,
            ..Binding::default()
        };

        let dest = Destination::locate(&binding, Layout::Text, 2, BindType::Row(24));

        assert_eq!(unsafe { rows.as_mut_ptr().add(48) }, dest.data);
        assert_eq!(unsafe { rows.as_mut_ptr().add(64) }, dest.indicator as *mut u8);
        assert_eq!(16, dest.capacity);
    }

    #[test]
    fn default_resolves_through_source_type() {
        let c_type = effective_c_type(CType::Default, || Ok(4)).unwrap();
        assert_eq!(CType::SLong, c_type);

        let c_type = effective_c_type(CType::Char, || unreachable!()).unwrap();
        assert_eq!(CType::Char, c_type);
    }
}
