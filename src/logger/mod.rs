//! Structured logging for walletwatch
//!
//! - Standard log levels (Error/Warning/Info/Debug/Verbose)
//! - Per-tag debug control via `--debug <tag,...>`
//! - Dual output: colored console + plain log file
//!
//! ## Usage
//!
//! ```rust
//! use walletwatch::logger::{self, LogTag};
//!
//! logger::warning(LogTag::Sources, "indexed source timed out, using raw data");
//! logger::info(LogTag::Monitor, "cycle #3 complete");
//! logger::debug(LogTag::Pricing, "batch 1/4 returned 97 quotes"); // only with --debug pricing
//! ```

mod config;
mod core;
mod file;
mod format;
mod levels;
mod special;
mod tags;

use std::path::Path;

pub use config::{get_logger_config, set_logger_config, LoggerConfig};
pub use levels::LogLevel;
pub use special::{log_value_change, short_mint};
pub use tags::LogTag;

/// Install the configuration and, when given, open the log file.
///
/// Call once at startup before services start. Logging before `init` uses
/// defaults (info level, console only).
pub fn init(config: LoggerConfig, log_file: Option<&Path>) -> std::io::Result<()> {
    set_logger_config(config);
    if let Some(path) = log_file {
        file::init_file_logging(path)?;
    }
    Ok(())
}

/// Start (or redirect) file output once the log path is known
pub fn set_log_file(path: &Path) -> std::io::Result<()> {
    file::init_file_logging(path)
}

/// Always shown
pub fn error(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Error, message);
}

/// Degraded operation that needs attention but is not fatal
pub fn warning(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Warning, message);
}

pub fn info(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Info, message);
}

/// Only shown when debug is enabled for `tag`
pub fn debug(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Debug, message);
}

/// Only shown with `--verbose`
pub fn verbose(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Verbose, message);
}

pub fn flush() {
    file::flush_file_logging();
}

/// Flush and close the log file (shutdown)
pub fn shutdown() {
    file::close_file_logging();
}
