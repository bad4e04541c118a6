// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Configuration file loading for the global logging registry.
//!
//! Line-oriented `key=value` format:
//! - `verbosity` — one of DEBUG, INFO, WARN, ERROR, FATAL; unrecognized
//!   values fall back to DEBUG
//! - `logFilePath` — directory prefix applied to subsequent logger lookups
//!
//! Unknown keys, blank lines, and lines without `=` are skipped.

use crate::registry::{set_global_level, set_log_file_path};
use crate::severity::Severity;
use std::path::{Path, PathBuf};

/// Parsed configuration values
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Config {
    pub verbosity: Option<Severity>,
    pub log_file_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a file. Failure to open the file is fatal to
    /// the caller; running engines are unaffected.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(path.to_path_buf(), e.to_string()))?;
        Ok(Self::parse(&content))
    }

    /// Parse configuration from a string. Parsing never fails: unknown keys
    /// are ignored and unknown verbosity names default to DEBUG.
    pub fn parse(content: &str) -> Self {
        let mut config = Config::default();
        for line in content.lines() {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            match key.trim() {
                "verbosity" => {
                    config.verbosity = Some(value.trim().parse().unwrap_or(Severity::Debug));
                }
                "logFilePath" => {
                    config.log_file_path = Some(PathBuf::from(value.trim()));
                }
                _ => {}
            }
        }
        config
    }

    /// Apply the parsed values to the global registry. The path prefix is
    /// set first so the default logger is created under it.
    pub fn apply(&self) {
        if let Some(path) = &self.log_file_path {
            set_log_file_path(path.clone());
        }
        if let Some(level) = self.verbosity {
            set_global_level(level);
        }
    }
}

/// Load a configuration file and apply it to the global registry.
pub fn load_configuration(path: impl AsRef<Path>) -> Result<(), ConfigError> {
    Config::load_from_file(path.as_ref())?.apply();
    Ok(())
}

/// Errors from configuration loading
#[derive(Debug)]
pub enum ConfigError {
    IoError(PathBuf, String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(path, msg) => {
                write!(
                    f,
                    "could not open configuration file {}: {}",
                    path.display(),
                    msg
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {}
