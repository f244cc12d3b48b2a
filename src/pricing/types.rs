/// Price quote types
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Qualitative reliability tag attached to a quote by the oracle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
    #[default]
    Unknown,
}

impl ConfidenceLevel {
    /// Lenient parse: anything unrecognized is `Unknown`
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("high") => ConfidenceLevel::High,
            Some("medium") => ConfidenceLevel::Medium,
            Some("low") => ConfidenceLevel::Low,
            _ => ConfidenceLevel::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceLevel::High => "high",
            ConfidenceLevel::Medium => "medium",
            ConfidenceLevel::Low => "low",
            ConfidenceLevel::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceSource {
    Jupiter,
    /// In-process oracle (fixtures, replays)
    Static,
}

/// One entry as returned by an oracle, before validation
#[derive(Debug, Clone, PartialEq)]
pub struct RawQuote {
    pub mint: String,
    /// Decimal string as sent upstream; may be empty
    pub price: String,
    pub confidence: ConfidenceLevel,
}

impl RawQuote {
    pub fn new(mint: &str, price: &str, confidence: ConfidenceLevel) -> Self {
        Self {
            mint: mint.to_string(),
            price: price.to_string(),
            confidence,
        }
    }
}

/// Validated quote handed to valuation
#[derive(Debug, Clone, PartialEq)]
pub struct PriceQuote {
    pub mint: String,
    pub price: f64,
    pub confidence: ConfidenceLevel,
    pub source: PriceSource,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_parse() {
        assert_eq!(ConfidenceLevel::parse(Some("High")), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::parse(Some("medium")), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::parse(Some(" low ")), ConfidenceLevel::Low);
        assert_eq!(ConfidenceLevel::parse(Some("??")), ConfidenceLevel::Unknown);
        assert_eq!(ConfidenceLevel::parse(None), ConfidenceLevel::Unknown);
    }
}
