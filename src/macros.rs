// SPDX-License-Identifier: Apache-2.0 OR MIT
// Logging macros: inject the call site and forward format arguments

/// Log a message at an explicit severity
///
/// # Examples
/// ```ignore
/// log!(logger, Severity::Warn, "queue depth {}", depth);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.log($level, file!(), line!(), format_args!($($arg)+))
    };
}

/// Log a message with debug severity
#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Severity::Debug, $($arg)+)
    };
}

/// Log a message with info severity
#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Severity::Info, $($arg)+)
    };
}

/// Log a message with warn severity
#[macro_export]
macro_rules! log_warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Severity::Warn, $($arg)+)
    };
}

/// Log a message with error severity
#[macro_export]
macro_rules! log_error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Severity::Error, $($arg)+)
    };
}

/// Log a message with fatal severity
#[macro_export]
macro_rules! log_fatal {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Severity::Fatal, $($arg)+)
    };
}

/// Log to the default global file logger
///
/// Does nothing if the global log file cannot be opened; the open failure
/// is reported through the sink error channel instead.
///
/// # Examples
/// ```ignore
/// glog!(Severity::Info, "worker {} started", id);
/// ```
#[macro_export]
macro_rules! glog {
    ($level:expr, $($arg:tt)+) => {
        if let Ok(logger) = $crate::default_file_logger() {
            logger.log($level, file!(), line!(), format_args!($($arg)+));
        }
    };
}

/// Log to a specific global file logger
#[macro_export]
macro_rules! glog_to {
    ($file:expr, $level:expr, $($arg:tt)+) => {
        if let Ok(logger) = $crate::file_logger($file) {
            logger.log($level, file!(), line!(), format_args!($($arg)+));
        }
    };
}

/// Log to the global console logger
#[macro_export]
macro_rules! glog_console {
    ($level:expr, $($arg:tt)+) => {
        $crate::console_logger().log($level, file!(), line!(), format_args!($($arg)+))
    };
}
