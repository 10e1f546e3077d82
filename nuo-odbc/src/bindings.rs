//! Binding slots and the growable tables holding them.
//!
//! A statement owns three independent tables: one for the columns bound with `SQLBindCol`, one
//! for the parameters bound with `SQLBindParameter` and one for the ad hoc slots of `SQLGetData`.
//! All of them are addressed with the `1` based column or parameter number of the ODBC API.

mod indicator;

pub use self::indicator::{Indicator, LEN_DATA_AT_EXEC_OFFSET};

use odbc_sys::{Len, Pointer, SqlDataType, ULen};

use crate::handles::CType;

/// Direction of a parameter (`SQL_PARAM_INPUT` ...). Column bindings are always
/// [`ParamRole::Output`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParamRole {
    #[default]
    Input,
    InputOutput,
    Output,
}

impl ParamRole {
    pub fn from_raw(raw: i16) -> Option<Self> {
        match raw {
            1 => Some(ParamRole::Input),
            2 => Some(ParamRole::InputOutput),
            4 => Some(ParamRole::Output),
            _ => None,
        }
    }

    /// The application supplies a value for the parameter.
    pub fn is_input(self) -> bool {
        self != ParamRole::Output
    }

    /// The parameter delivers a value back to the application.
    pub fn is_output(self) -> bool {
        self != ParamRole::Input
    }
}

/// State of a value supplied at execution time with `SQLPutData`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataAtExec {
    /// Chunks are accepted until the application moves on to the next parameter.
    Streaming,
    /// This many bytes are still expected.
    Remaining(usize),
}

/// One column or parameter binding: the application buffer and the progress of the current
/// transfer.
#[derive(Debug, Clone)]
pub struct Binding {
    pub pointer: Pointer,
    /// Length / indicator buffer of the application. May be NULL.
    pub indicator: *mut Len,
    /// Chunks of a character or binary parameter sent so far.
    pub accumulator: Vec<u8>,
    /// Capacity of the buffer in bytes.
    pub buffer_length: Len,
    /// Declared column size of a parameter.
    pub column_size: ULen,
    /// `Some` only while a data at execution transfer for this slot is in progress.
    pub data_at_exec: Option<DataAtExec>,
    /// Bytes of the current value already delivered by earlier `SQLGetData` calls.
    pub offset: usize,
    /// Number of calls which delivered (parts of) the current value.
    pub count: u32,
    pub role: ParamRole,
    pub c_type: CType,
    pub sql_type: SqlDataType,
}

impl Default for Binding {
    fn default() -> Self {
        Self {
            pointer: std::ptr::null_mut(),
            indicator: std::ptr::null_mut(),
            accumulator: Vec::new(),
            buffer_length: 0,
            column_size: 0,
            data_at_exec: None,
            offset: 0,
            count: 0,
            role: ParamRole::default(),
            c_type: CType::default(),
            sql_type: SqlDataType::UNKNOWN_TYPE,
        }
    }
}

// The raw pointers are application buffers, which the application guarantees to outlive the
// binding.
unsafe impl Send for Binding {}

impl Binding {
    /// Forgets the progress of the current transfer. Buffers and types stay bound.
    pub fn reset(&mut self) {
        self.offset = 0;
        self.count = 0;
        self.data_at_exec = None;
    }

    /// `true` if the application bound a buffer to this slot.
    pub fn is_bound(&self) -> bool {
        !self.pointer.is_null()
    }
}

/// Growable table of [`Binding`]s addressed by `1` based numbers.
#[derive(Debug, Default)]
pub struct Bindings {
    slots: Vec<Binding>,
}

impl Bindings {
    /// Grows the table to hold at least `count` slots. Existing slots keep their contents. Never
    /// shrinks.
    pub fn alloc(&mut self, count: usize) {
        if count > self.slots.len() {
            self.slots.resize_with(count, Binding::default);
        }
    }

    /// Slot `number`. `None` for `0` or numbers beyond the end of the table.
    pub fn get(&self, number: u16) -> Option<&Binding> {
        self.slots.get(usize::from(number).checked_sub(1)?)
    }

    pub fn get_mut(&mut self, number: u16) -> Option<&mut Binding> {
        self.slots.get_mut(usize::from(number).checked_sub(1)?)
    }

    /// Slot `number`, growing the table if necessary. `number` must not be `0`.
    pub fn slot(&mut self, number: u16) -> &mut Binding {
        self.alloc(usize::from(number));
        &mut self.slots[usize::from(number) - 1]
    }

    /// Resets the transfer progress of every slot.
    pub fn reset(&mut self) {
        self.slots.iter_mut().for_each(Binding::reset)
    }

    /// Drops all slots.
    pub fn release(&mut self) {
        self.slots.clear()
    }

    /// Number of slots.
    pub fn len(&self) -> u16 {
        u16::try_from(self.slots.len()).unwrap_or(u16::MAX)
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Numbers and slots in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (u16, &Binding)> {
        (1..).zip(self.slots.iter())
    }
}
