// Asynchronous logging engine: producers enqueue pre-rendered records on a
// lock-free ring, a dedicated drain thread batches them out and writes to
// the sink.

use crate::record::LogRecord;
use crate::ring::RingBuffer;
use crate::severity::Severity;
use crate::sink::{report_io_error, ConsoleSink, FileSink, LogError, LogSink};
use std::fmt::{self, Write as _};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Default ring capacity in records
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Default rotation threshold in bytes
pub const DEFAULT_MAX_FILE_SIZE: usize = 1024 * 1024;

const EMPTY_POLL_INTERVAL: Duration = Duration::from_millis(5);
const EMPTY_WAIT_DEADLINE: Duration = Duration::from_millis(500);

/// Sink handle and rotation accounting, guarded together by one mutex.
struct SinkState {
    sink: Box<dyn LogSink>,
    current_size: usize,
}

struct Shared {
    ring: RingBuffer<LogRecord>,
    level: AtomicU8,
    stop: AtomicBool,
    dropped: AtomicU64,
    max_file_size: usize,
    /// Rotation target; None for console and custom sinks, which never rotate.
    path: Option<PathBuf>,
    sink: Mutex<SinkState>,
    queue_lock: Mutex<()>,
    nonempty: Condvar,
    empty_lock: Mutex<()>,
    empty: Condvar,
}

/// Asynchronous logger
///
/// `log` is wait-free in the common case: a relaxed level check, message
/// rendering, one CAS-claimed ring slot, and a condvar notify. When the ring
/// is full the record is dropped rather than blocking the producer; size the
/// ring for the worst-case burst or call `sync` between bursts if loss
/// matters.
pub struct Logger {
    shared: Arc<Shared>,
    drain: Option<JoinHandle<()>>,
}

impl Logger {
    /// Open a file-backed logger with default queue capacity and rotation
    /// threshold. Failure to open the file is the one fatal error here.
    pub fn new(path: impl AsRef<Path>, level: Severity) -> Result<Self, LogError> {
        Self::with_capacity(path, level, DEFAULT_QUEUE_CAPACITY, DEFAULT_MAX_FILE_SIZE)
    }

    /// Open a file-backed logger with explicit queue capacity (records) and
    /// rotation threshold (bytes).
    pub fn with_capacity(
        path: impl AsRef<Path>,
        level: Severity,
        queue_capacity: usize,
        max_file_size: usize,
    ) -> Result<Self, LogError> {
        let path = path.as_ref().to_path_buf();
        let sink = FileSink::open(&path)?;
        Ok(Self::start(
            Box::new(sink),
            level,
            queue_capacity,
            max_file_size,
            Some(path),
        ))
    }

    /// Logger writing directly to the stdout descriptor
    pub fn console(level: Severity) -> Self {
        Self::with_sink(Box::new(ConsoleSink), level, DEFAULT_QUEUE_CAPACITY)
    }

    /// Logger on a caller-provided sink. No rotation is performed.
    pub fn with_sink(sink: Box<dyn LogSink>, level: Severity, queue_capacity: usize) -> Self {
        Self::start(sink, level, queue_capacity, DEFAULT_MAX_FILE_SIZE, None)
    }

    fn start(
        sink: Box<dyn LogSink>,
        level: Severity,
        queue_capacity: usize,
        max_file_size: usize,
        path: Option<PathBuf>,
    ) -> Self {
        let shared = Arc::new(Shared {
            ring: RingBuffer::new(queue_capacity),
            level: AtomicU8::new(level.as_u8()),
            stop: AtomicBool::new(false),
            dropped: AtomicU64::new(0),
            max_file_size,
            path,
            sink: Mutex::new(SinkState {
                sink,
                current_size: 0,
            }),
            queue_lock: Mutex::new(()),
            nonempty: Condvar::new(),
            empty_lock: Mutex::new(()),
            empty: Condvar::new(),
        });

        let drain_shared = Arc::clone(&shared);
        let drain = thread::spawn(move || drain_loop(&drain_shared));

        Self {
            shared,
            drain: Some(drain),
        }
    }

    /// Emit a record. Below-threshold levels return immediately; a full ring
    /// drops the record and bumps the drop counter.
    #[inline]
    pub fn log(&self, level: Severity, file: &'static str, line: u32, args: fmt::Arguments<'_>) {
        if level.as_u8() < self.shared.level.load(Ordering::Relaxed) {
            return;
        }

        let record = LogRecord::new(level, file, line, render_message(args));
        match self.shared.ring.try_enqueue(record) {
            Ok(()) => {
                // Taking the queue lock pairs the notify with the drain
                // thread's predicate check, so the wakeup cannot be lost.
                let _guard = lock(&self.shared.queue_lock);
                self.shared.nonempty.notify_one();
            }
            Err(_record) => {
                self.shared.dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Replace the minimum severity. Effect is eventual: producers mid-call
    /// may emit one more record at the previous threshold.
    pub fn set_level(&self, level: Severity) {
        self.shared.level.store(level.as_u8(), Ordering::Relaxed);
    }

    /// Current minimum severity
    pub fn level(&self) -> Severity {
        Severity::from_u8(self.shared.level.load(Ordering::Relaxed)).unwrap_or(Severity::Debug)
    }

    /// Drain the ring on the calling thread and flush the sink.
    ///
    /// On return, every record enqueued before the call that was not
    /// concurrently consumed by the drain thread has been written and
    /// flushed. The calling thread and the drain thread race on the ring as
    /// ordinary MPMC consumers; both outcomes are correct.
    pub fn sync(&self) {
        while let Some(record) = self.shared.ring.try_dequeue() {
            self.shared.process(&record);
        }
        lock(&self.shared.sink).sink.flush();

        let _guard = lock(&self.shared.empty_lock);
        self.shared.empty.notify_all();
    }

    /// Wait until the ring is observed empty, up to a 500 ms deadline.
    /// Returns regardless of queue state at that point.
    pub fn wait_until_empty(&self) {
        let deadline = Instant::now() + EMPTY_WAIT_DEADLINE;
        let mut guard = lock(&self.shared.empty_lock);
        while !self.shared.ring.is_empty() {
            if Instant::now() >= deadline {
                break;
            }
            let (next, _) = self
                .shared
                .empty
                .wait_timeout(guard, EMPTY_POLL_INTERVAL)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            guard = next;
        }
    }

    /// Records dropped at the producer because the ring was full
    pub fn dropped_records(&self) -> u64 {
        self.shared.dropped.load(Ordering::Relaxed)
    }

    /// Bytes of record text written to the active file since the last
    /// rotation (test hook for rotation accounting)
    pub fn current_file_size(&self) -> usize {
        lock(&self.shared.sink).current_size
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        self.sync();
        self.shared.stop.store(true, Ordering::Relaxed);
        {
            let _guard = lock(&self.shared.queue_lock);
            self.shared.nonempty.notify_all();
        }
        if let Some(handle) = self.drain.take() {
            let _ = handle.join();
        }
        // The file sink's buffer would flush on drop anyway; doing it
        // explicitly routes any error through the error channel.
        lock(&self.shared.sink).sink.flush();
    }
}

impl Shared {
    /// Render one record and write it: timestamp, rotate-if-needed, write
    /// line + newline, account the pre-newline byte count.
    fn process(&self, record: &LogRecord) {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let line = record.render(&timestamp);

        let mut state = lock(&self.sink);
        if self.path.is_some() && state.current_size + line.len() > self.max_file_size {
            self.rotate(&mut state);
        }
        state.sink.write(line.as_bytes());
        state.sink.write_newline();
        state.current_size += line.len();
    }

    /// Replace the file sink with a fresh append-mode sink on the same path.
    /// Append keeps existing content; truncation loses data and is not a
    /// policy of this engine.
    fn rotate(&self, state: &mut MutexGuard<'_, SinkState>) {
        let Some(path) = self.path.as_deref() else {
            return;
        };
        match FileSink::open(path) {
            Ok(sink) => {
                state.sink.flush();
                state.sink = Box::new(sink);
                state.current_size = 0;
            }
            Err(LogError::Open { source, .. }) => {
                // Keep writing through the old sink rather than lose records.
                report_io_error("log rotation", &source);
            }
        }
    }
}

/// Drain-thread body: wait for records or stop, batch-drain the ring under
/// the queue lock, then format and write the batch without it so producers
/// are never stalled behind sink I/O.
fn drain_loop(shared: &Shared) {
    let mut batch: Vec<LogRecord> = Vec::new();
    let mut guard = lock(&shared.queue_lock);
    loop {
        guard = shared
            .nonempty
            .wait_while(guard, |_| {
                !shared.stop.load(Ordering::Relaxed) && shared.ring.is_empty()
            })
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if shared.stop.load(Ordering::Relaxed) {
            break;
        }

        while let Some(record) = shared.ring.try_dequeue() {
            batch.push(record);
        }
        drop(guard);

        for record in batch.drain(..) {
            shared.process(&record);
        }
        guard = lock(&shared.queue_lock);
    }
}

/// Expand the caller's format arguments into the owned message. A failing
/// `Display`/`Debug` impl yields a placeholder instead of losing the record.
fn render_message(args: fmt::Arguments<'_>) -> String {
    if let Some(literal) = args.as_str() {
        return literal.to_owned();
    }
    let mut message = String::new();
    if message.write_fmt(args).is_err() {
        message.clear();
        let _ = write!(message, "[FORMAT ERROR: formatter returned an error]");
    }
    message
}

/// A producer that panicked while holding a lock must not wedge the drain
/// thread, so lock poisoning is ignored throughout.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
