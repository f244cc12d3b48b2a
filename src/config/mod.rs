//! Configuration: TOML file with embedded defaults, plus credentials from the
//! environment.
//!
//! The loaded `Config` is passed explicitly to the components that need it;
//! there is no global configuration instance.

pub mod macros;
pub mod schemas;
pub mod utils;

pub use schemas::*;
pub use utils::{load_config_from_path, save_config_to_path, validate_address, CONFIG_FILE_PATH};

use crate::errors::{MonitorError, MonitorResult};

/// Upstream credentials for the balance sources
#[derive(Debug, Clone)]
pub struct SourceCredentials {
    pub endpoint: String,
    pub api_key: String,
}

impl SourceCredentials {
    /// Read credentials from the variables named in `[sources]`.
    ///
    /// Missing or empty values are a fatal configuration error.
    pub fn from_env(sources: &SourcesConfig) -> MonitorResult<Self> {
        let read = |name: &str| {
            std::env::var(name)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| MonitorError::Config(format!("Missing required environment variable {}", name)))
        };

        Ok(Self {
            endpoint: read(&sources.rpc_endpoint_env)?,
            api_key: read(&sources.api_key_env)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credentials_are_fatal() {
        let sources = SourcesConfig {
            rpc_endpoint_env: "WALLETWATCH_TEST_UNSET_ENDPOINT".to_string(),
            api_key_env: "WALLETWATCH_TEST_UNSET_KEY".to_string(),
            ..SourcesConfig::default()
        };
        let err = SourceCredentials::from_env(&sources).unwrap_err();
        assert!(err.is_critical());
    }
}
