//! Canonical logging macros
//!
//! Every list call and item command is bracketed by a start event and
//! exactly one of end / end_error.

/// Log the start of an operation
///
/// ```
/// # use reminder_core::log_op_start;
/// log_op_start!("list_all");
/// log_op_start!("list_all", limit = 20, cursor = 0);
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr) => {{
        $crate::__tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::reminder_core_types::schema::EVENT_START,
        );
    }};
    ($op:expr, $($field:tt)*) => {{
        $crate::__tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::reminder_core_types::schema::EVENT_START,
            $($field)*
        );
    }};
}

/// Log the successful end of an operation
///
/// ```
/// # use reminder_core::log_op_end;
/// log_op_end!("list_all", duration_ms = 3);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr) => {{
        $crate::__tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::reminder_core_types::schema::EVENT_END,
            duration_ms = $duration,
        );
    }};
    ($op:expr, duration_ms = $duration:expr, $($field:tt)*) => {{
        $crate::__tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::reminder_core_types::schema::EVENT_END,
            duration_ms = $duration,
            $($field)*
        );
    }};
}

/// Log an operation error
///
/// The error is converted into `ExError` so that kind and code are always
/// present on the event.
///
/// ```
/// # use reminder_core::{log_op_error, errors::ReminderError};
/// let err = ReminderError::InvalidLimit { limit: 0 };
/// log_op_error!("list_all", err, duration_ms = 1);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        $crate::__tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::reminder_core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?ex_err.kind(),
            err_code = ex_err.code(),
        );
    }};
    ($op:expr, $err:expr, duration_ms = $duration:expr, $($field:tt)*) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        $crate::__tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::reminder_core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?ex_err.kind(),
            err_code = ex_err.code(),
            $($field)*
        );
    }};
}
