// SPDX-License-Identifier: Apache-2.0 OR MIT
// Process-global logger registry keyed by resolved file path
//
// A thin helper over the engine: the same resolved path always yields the
// same engine, and entries can be dropped for test reinitialization. The
// engine itself knows nothing about the registry.

use crate::logger::Logger;
use crate::severity::Severity;
use crate::sink::{report_io_error, LogError};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, OnceLock};

/// File name used by `default_file_logger` until overridden
pub const DEFAULT_LOG_FILE: &str = "global_logfile.log";

/// Severity new registry engines start at
const DEFAULT_LEVEL: Severity = Severity::Debug;

struct Registry {
    file_loggers: HashMap<PathBuf, Arc<Logger>>,
    console: Option<Arc<Logger>>,
    /// Directory prefix applied to file logger lookups
    log_file_path: PathBuf,
    default_file: String,
}

fn registry() -> &'static Mutex<Registry> {
    static REGISTRY: OnceLock<Mutex<Registry>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        Mutex::new(Registry {
            file_loggers: HashMap::new(),
            console: None,
            log_file_path: PathBuf::from("."),
            default_file: DEFAULT_LOG_FILE.to_string(),
        })
    })
}

fn lock_registry() -> std::sync::MutexGuard<'static, Registry> {
    registry()
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Get (or create) the engine for `name`, resolved against the configured
/// log file path. The same resolved path always returns the same engine.
pub fn file_logger(name: &str) -> Result<Arc<Logger>, LogError> {
    let mut registry = lock_registry();
    let path = registry.log_file_path.join(name);
    if let Some(logger) = registry.file_loggers.get(&path) {
        return Ok(Arc::clone(logger));
    }
    let logger = match Logger::new(&path, DEFAULT_LEVEL) {
        Ok(logger) => Arc::new(logger),
        Err(err) => {
            if let LogError::Open { source, .. } = &err {
                report_io_error("global logger open", source);
            }
            return Err(err);
        }
    };
    registry.file_loggers.insert(path, Arc::clone(&logger));
    Ok(logger)
}

/// Engine for the configured default log file
pub fn default_file_logger() -> Result<Arc<Logger>, LogError> {
    let name = lock_registry().default_file.clone();
    file_logger(&name)
}

/// Lazily-created singleton engine on the stdout descriptor
pub fn console_logger() -> Arc<Logger> {
    let mut registry = lock_registry();
    if let Some(logger) = &registry.console {
        return Arc::clone(logger);
    }
    let logger = Arc::new(Logger::console(DEFAULT_LEVEL));
    registry.console = Some(Arc::clone(&logger));
    logger
}

/// Set the directory prefix applied to subsequent `file_logger` lookups.
/// Existing engines keep their paths.
pub fn set_log_file_path(path: impl Into<PathBuf>) {
    lock_registry().log_file_path = path.into();
}

/// Replace the default log file name used by `default_file_logger`
pub fn set_default_log_file(name: impl Into<String>) {
    lock_registry().default_file = name.into();
}

/// Set the minimum severity of the default file logger
pub fn set_global_level(level: Severity) {
    if let Ok(logger) = default_file_logger() {
        logger.set_level(level);
    }
}

/// Drop the registry entry for `name` (resolved against the current log
/// file path), letting tests start over with a fresh engine. The engine
/// shuts down once the last external handle goes away.
pub fn reset_file_logger(name: &str) {
    let mut registry = lock_registry();
    let path = registry.log_file_path.join(name);
    registry.file_loggers.remove(&path);
}
