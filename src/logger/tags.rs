/// Log tags identify the subsystem a message comes from.
///
/// Each tag has a debug key (`wallet`, `pricing`, ...) used by `--debug <tag>`
/// and a fixed-width label for console alignment.

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LogTag {
    System,
    Config,
    Wallet,
    Sources,
    Pricing,
    Valuation,
    Alerts,
    Monitor,
    Reports,
    Cache,
    Other(String),
}

impl LogTag {
    /// All named tags, used to validate `--debug` values
    pub const ALL: [LogTag; 10] = [
        LogTag::System,
        LogTag::Config,
        LogTag::Wallet,
        LogTag::Sources,
        LogTag::Pricing,
        LogTag::Valuation,
        LogTag::Alerts,
        LogTag::Monitor,
        LogTag::Reports,
        LogTag::Cache,
    ];

    /// Lowercase key matched against debug/verbose/enabled tag sets
    pub fn to_debug_key(&self) -> String {
        match self {
            LogTag::Other(s) => s.to_lowercase(),
            tag => tag.to_plain_string().to_lowercase(),
        }
    }

    /// Uncolored label written to the log file
    pub fn to_plain_string(&self) -> String {
        match self {
            LogTag::System => "SYSTEM".to_string(),
            LogTag::Config => "CONFIG".to_string(),
            LogTag::Wallet => "WALLET".to_string(),
            LogTag::Sources => "SOURCES".to_string(),
            LogTag::Pricing => "PRICING".to_string(),
            LogTag::Valuation => "VALUATION".to_string(),
            LogTag::Alerts => "ALERTS".to_string(),
            LogTag::Monitor => "MONITOR".to_string(),
            LogTag::Reports => "REPORTS".to_string(),
            LogTag::Cache => "CACHE".to_string(),
            LogTag::Other(s) => s.to_uppercase(),
        }
    }

    pub fn from_debug_key(key: &str) -> Option<LogTag> {
        let key = key.trim().to_lowercase();
        Self::ALL.iter().find(|tag| tag.to_debug_key() == key).cloned()
    }
}
