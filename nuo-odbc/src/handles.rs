//! Building blocks shared by all handles the driver hands out.
//!
//! Two decisions are already baked into this module:
//!
//! * Diagnostics are queued per handle and additionally logged with `log`.
//! * Every operation runs through [`AsHandle::guarded`], so no error or panic escapes a handle.

mod as_handle;
mod buffer;
mod c_type;
mod data_type;
mod descriptor;
mod diagnostics;
mod logging;

pub use {
    as_handle::AsHandle,
    buffer::{
        OutputString, clamp_small_int, copy_nul_terminated, input_string, required_input_string,
        write_out,
    },
    c_type::{CType, Fixed, Layout},
    data_type::{column_sql_type, is_character, sql_type_from_remote},
    descriptor::{DescRecord, Descriptor, DescriptorRole},
    diagnostics::{ErrorQueue, Record, State},
    logging::log_diagnostic,
};
