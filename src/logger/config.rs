/// Logger configuration
///
/// A single process-wide setting; every log call reads it under a shared lock.
use super::levels::LogLevel;
use super::tags::LogTag;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Messages above this level are dropped (Debug/Verbose also need their tag enabled)
    pub min_level: LogLevel,
    /// Tags with debug output enabled (`--debug wallet,pricing`)
    pub debug_tags: HashSet<String>,
    /// Tags with verbose output enabled
    pub verbose_tags: HashSet<String>,
    /// When non-empty, only these tags log below Error
    pub enabled_tags: HashSet<String>,
    /// Print to stdout in addition to the log file
    pub console: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Info,
            debug_tags: HashSet::new(),
            verbose_tags: HashSet::new(),
            enabled_tags: HashSet::new(),
            console: true,
        }
    }
}

impl LoggerConfig {
    /// Build from CLI-style flags. Unknown debug tags are ignored.
    pub fn from_flags(quiet: bool, verbose: bool, debug: &[String]) -> Self {
        let mut config = Self::default();

        let debug_tags: HashSet<String> = debug
            .iter()
            .filter_map(|key| LogTag::from_debug_key(key))
            .map(|tag| tag.to_debug_key())
            .collect();

        if !debug_tags.is_empty() {
            config.min_level = LogLevel::Debug;
            config.debug_tags = debug_tags;
        }
        if verbose {
            config.min_level = LogLevel::Verbose;
        }
        if quiet {
            config.min_level = LogLevel::Warning;
        }

        config
    }

    pub fn debug_enabled_for(&self, tag: &LogTag) -> bool {
        self.min_level >= LogLevel::Debug && self.debug_tags.contains(&tag.to_debug_key())
    }

    pub fn verbose_enabled_for(&self, tag: &LogTag) -> bool {
        self.verbose_tags.contains(&tag.to_debug_key())
    }
}

static LOGGER_CONFIG: Lazy<RwLock<LoggerConfig>> = Lazy::new(|| RwLock::new(LoggerConfig::default()));

pub fn get_logger_config() -> LoggerConfig {
    LOGGER_CONFIG.read().clone()
}

pub fn set_logger_config(config: LoggerConfig) {
    *LOGGER_CONFIG.write() = config;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_flags() {
        let config = LoggerConfig::from_flags(false, false, &["pricing".into(), "bogus".into()]);
        assert_eq!(config.min_level, LogLevel::Debug);
        assert!(config.debug_tags.contains("pricing"));
        assert_eq!(config.debug_tags.len(), 1);

        let quiet = LoggerConfig::from_flags(true, true, &[]);
        assert_eq!(quiet.min_level, LogLevel::Warning);

        let default = LoggerConfig::from_flags(false, false, &[]);
        assert_eq!(default.min_level, LogLevel::Info);
    }
}
