/// Portfolio data model: holdings, snapshots, alerts
use crate::constants::{UNKNOWN_NAME, UNKNOWN_SYMBOL};
use crate::pricing::ConfidenceLevel;
use crate::utils::format_usd;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

/// A position in one mint, for one wallet or aggregated across wallets
#[derive(Debug, Clone, PartialEq)]
pub struct Holding {
    pub mint: String,
    /// UI amount (descaled by decimals)
    pub amount: f64,
    pub decimals: u8,
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub value: f64,
    pub confidence: ConfidenceLevel,
    /// Percent per second against the previous valuation of this mint
    pub change_rate: f64,
}

impl Holding {
    /// Freshly acquired balance, not yet priced
    pub fn unpriced(mint: &str, amount: f64, decimals: u8, symbol: &str, name: &str) -> Self {
        Self {
            mint: mint.to_string(),
            amount,
            decimals,
            symbol: symbol.to_string(),
            name: name.to_string(),
            price: 0.0,
            value: 0.0,
            confidence: ConfidenceLevel::Unknown,
            change_rate: 0.0,
        }
    }

    /// Raw-source balance with sentinel metadata
    pub fn unknown(mint: &str, amount: f64, decimals: u8) -> Self {
        Self::unpriced(mint, amount, decimals, UNKNOWN_SYMBOL, UNKNOWN_NAME)
    }

    pub fn has_known_symbol(&self) -> bool {
        !self.symbol.is_empty() && self.symbol != UNKNOWN_SYMBOL
    }

    /// Symbol for reports: falls back to the name, then "Unknown"
    pub fn display_symbol(&self) -> &str {
        if self.has_known_symbol() {
            &self.symbol
        } else if !self.name.is_empty() && self.name != UNKNOWN_NAME {
            &self.name
        } else {
            "Unknown"
        }
    }
}

/// Timestamped capture of all valued holdings; the unit of alert history
#[derive(Debug, Clone, PartialEq)]
pub struct ValuationSnapshot {
    pub timestamp: DateTime<Utc>,
    pub total_value: f64,
    pub holdings: HashMap<String, Holding>,
}

impl ValuationSnapshot {
    pub fn from_holdings(timestamp: DateTime<Utc>, holdings: &[Holding]) -> Self {
        let total_value = holdings.iter().map(|h| h.value).sum();
        let holdings = holdings
            .iter()
            .map(|h| (h.mint.clone(), h.clone()))
            .collect();
        Self {
            timestamp,
            total_value,
            holdings,
        }
    }

    /// At least one holding with positive price and value
    pub fn has_valid_holdings(&self) -> bool {
        self.holdings.values().any(|h| h.price > 0.0 && h.value > 0.0)
    }

    pub fn holding(&self, mint: &str) -> Option<&Holding> {
        self.holdings.get(mint)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertKind {
    Price,
    Value,
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertKind::Price => write!(f, "price"),
            AlertKind::Value => write!(f, "value"),
        }
    }
}

/// Threshold crossing for one mint over one window
#[derive(Debug, Clone, PartialEq)]
pub struct AlertEvent {
    pub kind: AlertKind,
    pub mint: String,
    pub symbol: String,
    pub window: Duration,
    pub change_percent: f64,
    pub threshold_percent: f64,
    /// Prices for a price alert, values for a value alert
    pub before_value: f64,
    pub after_value: f64,
    pub timestamp: DateTime<Utc>,
}

impl AlertEvent {
    /// One-line description used by the alert log and console
    pub fn message(&self) -> String {
        let direction = if self.change_percent >= 0.0 { "up" } else { "down" };
        let (before, after) = match self.kind {
            AlertKind::Price => (format!("${:.8}", self.before_value), format!("${:.8}", self.after_value)),
            AlertKind::Value => (format_usd(self.before_value), format_usd(self.after_value)),
        };
        format!(
            "{} {} alert ({}): {} {:.2}% in {}s (threshold {:.2}%), {} -> {}",
            self.symbol,
            self.kind,
            self.mint,
            direction,
            self.change_percent.abs(),
            self.window.as_secs(),
            self.threshold_percent,
            before,
            after
        )
    }
}

/// Portfolio total against the previous snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct StatusLine {
    pub timestamp: DateTime<Utc>,
    pub total_value: f64,
    pub change_percent: f64,
    pub change_rate_per_sec: f64,
    pub interval_secs: f64,
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({:+.4}%/s | total change {:+.2}% | interval {:.0}s) [{}]",
            format_usd(self.total_value),
            self.change_rate_per_sec,
            self.change_percent,
            self.interval_secs,
            self.timestamp.format("%H:%M:%S")
        )
    }
}
