/// Error handling for the monitoring core
///
/// One enum covers the whole pipeline. Stages decide locally whether an error is
/// dropped (parse/validation), degraded around (one source, one batch) or propagated
/// as a cycle failure (all wallets failed, zero quotes).
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Configuration error: {0}")] Config(String),

    #[error("Network error: {0}")] Network(String),

    #[error("HTTP {status} from {endpoint}")] Http {
        status: u16,
        endpoint: String,
    },

    #[error("RPC error: {0}")] Rpc(String),

    #[error("Parse error: {0}")] Parse(String),

    #[error("Timeout error: operation timed out after {seconds} seconds")] Timeout {
        seconds: u64,
    },

    #[error("All {wallets} wallets failed, first error: {first_error}")] AllWalletsFailed {
        wallets: usize,
        first_error: String,
    },

    #[error("No valid price quotes obtained for {requested} mints")] NoQuotes {
        requested: usize,
    },

    #[error("Operation cancelled by shutdown")]
    Cancelled,

    #[error("IO error: {0}")] Io(#[from] std::io::Error),

    #[error("CSV error: {0}")] Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")] Serialization(#[from] serde_json::Error),
}

impl MonitorError {
    /// Transient failures worth another attempt
    pub fn is_recoverable(&self) -> bool {
        match self {
            MonitorError::Network(_) => true,
            MonitorError::Http { status, .. } => *status == 429 || *status >= 500,
            MonitorError::Rpc(_) => true,
            MonitorError::Timeout { .. } => true,
            _ => false,
        }
    }

    /// Failures that should stop the process instead of waiting for the next tick
    pub fn is_critical(&self) -> bool {
        matches!(self, MonitorError::Config(_))
    }
}

impl From<reqwest::Error> for MonitorError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            MonitorError::Network(format!("request timed out: {}", err))
        } else if err.is_decode() {
            MonitorError::Parse(err.to_string())
        } else if let Some(status) = err.status() {
            MonitorError::Http {
                status: status.as_u16(),
                endpoint: err
                    .url()
                    .map(|u| u.path().to_string())
                    .unwrap_or_default(),
            }
        } else {
            MonitorError::Network(err.to_string())
        }
    }
}

pub type MonitorResult<T> = Result<T, MonitorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(MonitorError::Network("reset".into()).is_recoverable());
        assert!(MonitorError::Http { status: 503, endpoint: "/".into() }.is_recoverable());
        assert!(!MonitorError::Http { status: 404, endpoint: "/".into() }.is_recoverable());
        assert!(!MonitorError::NoQuotes { requested: 3 }.is_recoverable());
        assert!(MonitorError::Config("missing key".into()).is_critical());
        assert!(!MonitorError::Timeout { seconds: 30 }.is_critical());
    }

    #[test]
    fn test_display() {
        let err = MonitorError::AllWalletsFailed {
            wallets: 2,
            first_error: "timeout".into(),
        };
        assert_eq!(err.to_string(), "All 2 wallets failed, first error: timeout");
    }
}
