// SPDX-License-Identifier: Apache-2.0 OR MIT
// High-throughput, low-latency application logging
//
// Producer threads render records up front and enqueue them on a lock-free
// ring buffer; a dedicated drain thread batches them out, stamps and
// sanitizes each line, and writes to a pluggable sink. The producer path
// targets sub-100ns so logging can live inside latency-sensitive code; on
// overload records are dropped rather than blocking the producer.

mod config;
mod logger;
#[macro_use]
mod macros;
mod record;
mod registry;
mod ring;
mod severity;
mod sink;

// Public exports
pub use config::{load_configuration, Config, ConfigError};
pub use logger::{Logger, DEFAULT_MAX_FILE_SIZE, DEFAULT_QUEUE_CAPACITY};
pub use record::LogRecord;
pub use registry::{
    console_logger, default_file_logger, file_logger, reset_file_logger, set_default_log_file,
    set_global_level, set_log_file_path, DEFAULT_LOG_FILE,
};
pub use ring::RingBuffer;
pub use severity::{ParseSeverityError, Severity};
pub use sink::{set_error_handler, ConsoleSink, FileSink, LogError, LogSink, FILE_BUFFER_SIZE};
