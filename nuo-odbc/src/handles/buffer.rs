use std::{borrow::Cow, cmp::min, ptr, slice};

use odbc_sys::{Len, NTS};

use crate::Error;

/// Clamps a usize between `0` and `i16::MAX`.
pub fn clamp_small_int(n: usize) -> i16 {
    min(n, i16::MAX as usize) as i16
}

/// Writes `value` to `target`, unless `target` is NULL. Output arguments of ODBC functions are
/// optional and not necessarily aligned.
///
/// # Safety
///
/// `target` must be NULL or valid for writing a `T`.
pub unsafe fn write_out<T>(target: *mut T, value: T) {
    if !target.is_null() {
        unsafe { target.write_unaligned(value) }
    }
}

/// Copies `text` into a narrow character buffer of `buffer_length` bytes, terminating it with a
/// zero if there is room for one. Returns `true` if the text had to be truncated.
///
/// # Safety
///
/// `buffer` must be NULL or valid for writes of `buffer_length` bytes.
pub unsafe fn copy_nul_terminated(text: &[u8], buffer: *mut u8, buffer_length: usize) -> bool {
    if buffer.is_null() || buffer_length == 0 {
        return !text.is_empty();
    }
    let n = min(text.len(), buffer_length - 1);
    unsafe {
        ptr::copy_nonoverlapping(text.as_ptr(), buffer, n);
        *buffer.add(n) = 0;
    }
    n < text.len()
}

/// Output string argument of an ODBC function: a buffer, its capacity in bytes, and where to put
/// the length of the complete string.
#[derive(Debug, Clone, Copy)]
pub struct OutputString<L> {
    pub buffer: *mut u8,
    pub buffer_length: usize,
    pub length: *mut L,
}

impl<L: TryFrom<usize>> OutputString<L> {
    /// # Safety
    ///
    /// `buffer` must be NULL or valid for `buffer_length` bytes and `length` must be NULL or valid
    /// for writing an `L`.
    pub unsafe fn new(buffer: *mut u8, buffer_length: impl TryInto<usize>, length: *mut L) -> Self {
        Self {
            buffer,
            buffer_length: buffer_length.try_into().unwrap_or(0),
            length,
        }
    }

    /// Writes `text` and its length. `true` if it has been truncated.
    pub fn write(&self, text: &str) -> bool {
        unsafe {
            if let Ok(len) = L::try_from(text.len()) {
                write_out(self.length, len);
            }
            copy_nul_terminated(text.as_bytes(), self.buffer, self.buffer_length)
        }
    }
}

/// Reads a narrow string argument. `length` is either the length in bytes or [`NTS`]. A NULL
/// pointer yields `None`.
///
/// # Safety
///
/// `text` must be NULL, or point to `length` valid bytes, or to a zero terminated string if
/// `length` is [`NTS`].
pub unsafe fn input_string<'a>(text: *const u8, length: Len) -> Result<Option<Cow<'a, str>>, Error> {
    if text.is_null() {
        return Ok(None);
    }
    let bytes: &'a [u8] = if length == NTS {
        unsafe { std::ffi::CStr::from_ptr(text.cast()).to_bytes() }
    } else {
        let length = usize::try_from(length).map_err(|_| Error::InvalidStringOrBufferLength(length))?;
        unsafe { slice::from_raw_parts(text, length) }
    };
    Ok(Some(String::from_utf8_lossy(bytes)))
}

/// Like [`input_string`], but for arguments which are not optional.
///
/// # Safety
///
/// See [`input_string`].
pub unsafe fn required_input_string<'a>(text: *const u8, length: Len) -> Result<Cow<'a, str>, Error> {
    unsafe { input_string(text, length) }?.ok_or(Error::InvalidUseOfNullPointer)
}
