// SPDX-License-Identifier: Apache-2.0 OR MIT
// Byte sinks for the drain side of the logger
//
// A sink receives fully rendered lines. I/O failures never propagate into
// the producer hot path: they go to the error channel and the record is
// considered lost.

use nix::errno::Errno;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use thiserror::Error;

/// User-space buffer size for the file sink
pub const FILE_BUFFER_SIZE: usize = 1024 * 1024;

/// Errors surfaced at logger construction
#[derive(Error, Debug)]
pub enum LogError {
    #[error("failed to open log file {path}: {source}")]
    Open {
        path: PathBuf,
        source: io::Error,
    },
}

/// Destination for rendered log lines
pub trait LogSink: Send {
    /// Write all bytes in order (partial writes are retried internally)
    fn write(&mut self, bytes: &[u8]);

    /// Write a single `\n`
    fn write_newline(&mut self);

    /// Hand every previously written byte to the underlying device
    fn flush(&mut self);
}

type ErrorHandler = Box<dyn Fn(&io::Error) + Send + Sync>;

static ERROR_HANDLER: RwLock<Option<ErrorHandler>> = RwLock::new(None);

/// Install a process-wide callback for sink I/O errors.
///
/// Without one, errors are reported on stderr. Write failures are
/// best-effort either way: the affected record is lost and the drain
/// thread keeps going.
pub fn set_error_handler(handler: impl Fn(&io::Error) + Send + Sync + 'static) {
    if let Ok(mut slot) = ERROR_HANDLER.write() {
        *slot = Some(Box::new(handler));
    }
}

pub(crate) fn report_io_error(context: &str, err: &io::Error) {
    if let Ok(slot) = ERROR_HANDLER.read() {
        if let Some(handler) = slot.as_ref() {
            handler(err);
            return;
        }
    }
    eprintln!("ringlog: {context}: {err}");
}

/// Buffered append-mode file sink
#[derive(Debug)]
pub struct FileSink {
    writer: BufWriter<File>,
}

impl FileSink {
    /// Open `path` for append, creating it if absent.
    pub fn open(path: &Path) -> Result<Self, LogError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| LogError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self {
            writer: BufWriter::with_capacity(FILE_BUFFER_SIZE, file),
        })
    }
}

impl LogSink for FileSink {
    fn write(&mut self, bytes: &[u8]) {
        if let Err(err) = self.writer.write_all(bytes) {
            report_io_error("file sink write", &err);
        }
    }

    fn write_newline(&mut self) {
        if let Err(err) = self.writer.write_all(b"\n") {
            report_io_error("file sink write", &err);
        }
    }

    fn flush(&mut self) {
        if let Err(err) = self.writer.flush() {
            report_io_error("file sink flush", &err);
        }
    }
}

/// Unbuffered sink on the stdout descriptor
///
/// Bypasses the stdlib's line buffer with direct `write(2)` calls, so there
/// is no user-space buffer and `flush` has nothing to do.
pub struct ConsoleSink;

impl LogSink for ConsoleSink {
    fn write(&mut self, bytes: &[u8]) {
        write_stdout(bytes);
    }

    fn write_newline(&mut self) {
        write_stdout(b"\n");
    }

    fn flush(&mut self) {}
}

fn write_stdout(mut bytes: &[u8]) {
    while !bytes.is_empty() {
        match nix::unistd::write(io::stdout(), bytes) {
            Ok(0) => break,
            Ok(n) => bytes = &bytes[n..],
            Err(Errno::EINTR) => continue,
            Err(errno) => {
                report_io_error("console sink write", &io::Error::from(errno));
                break;
            }
        }
    }
}
