use super::Record;
use log::{Level, debug, warn};

/// Emits a log record for a diagnostic posted to a handle. Warnings (class `01`) are only of
/// interest while debugging, everything else is logged as a warning, since the application may
/// never ask for it.
pub fn log_diagnostic(record: &Record) {
    if log::max_level() < Level::Warn {
        // Early return to safe work formatting the record in case we would not log anything.
        return;
    }

    if record.state.is_warning() {
        debug!("{}", record);
    } else {
        warn!("{}", record);
    }
}
