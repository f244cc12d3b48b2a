/// Configuration utilities - loading, saving and wallet list management
use super::schemas::{Config, TokenEntry, WalletEntry};
use crate::errors::{MonitorError, MonitorResult};
use crate::logger::{self, LogTag};
use std::path::Path;

/// Default configuration file path
pub const CONFIG_FILE_PATH: &str = "data/config.toml";

/// Load configuration from a TOML file.
///
/// A missing file is not an error: defaults are used and a warning is logged.
/// A file that exists but does not parse is a configuration error.
pub fn load_config_from_path(path: &Path) -> MonitorResult<Config> {
    if !path.exists() {
        logger::warning(
            LogTag::Config,
            &format!("Config file '{}' not found, using default values", path.display()),
        );
        return Ok(Config::default());
    }

    let contents = std::fs::read_to_string(path)?;
    toml::from_str::<Config>(&contents).map_err(|e| {
        MonitorError::Config(format!("Failed to parse config file '{}': {}", path.display(), e))
    })
}

/// Write the configuration back to disk, creating parent directories
pub fn save_config_to_path(config: &Config, path: &Path) -> MonitorResult<()> {
    let contents = toml::to_string_pretty(config)
        .map_err(|e| MonitorError::Config(format!("Failed to serialize config: {}", e)))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, contents)?;
    Ok(())
}

/// A Solana address is base58 for exactly 32 bytes
pub fn validate_address(address: &str) -> MonitorResult<()> {
    let bytes = bs58::decode(address)
        .into_vec()
        .map_err(|e| MonitorError::Config(format!("Invalid address '{}': {}", address, e)))?;
    if bytes.len() != 32 {
        return Err(MonitorError::Config(format!(
            "Invalid address '{}': decodes to {} bytes, expected 32",
            address,
            bytes.len()
        )));
    }
    Ok(())
}

impl Config {
    pub fn wallet_addresses(&self) -> Vec<String> {
        self.wallets.iter().map(|w| w.address.clone()).collect()
    }

    pub fn add_wallet(&mut self, address: &str, label: &str) -> MonitorResult<()> {
        validate_address(address)?;
        if self.wallets.iter().any(|w| w.address == address) {
            return Err(MonitorError::Config(format!("Wallet {} already configured", address)));
        }
        self.wallets.push(WalletEntry {
            address: address.to_string(),
            label: label.to_string(),
        });
        Ok(())
    }

    /// Returns whether a wallet was removed
    pub fn remove_wallet(&mut self, address: &str) -> bool {
        let before = self.wallets.len();
        self.wallets.retain(|w| w.address != address);
        self.wallets.len() != before
    }

    /// Returns whether the wallet was found
    pub fn update_wallet_label(&mut self, address: &str, label: &str) -> bool {
        match self.wallets.iter_mut().find(|w| w.address == address) {
            Some(wallet) => {
                wallet.label = label.to_string();
                true
            }
            None => false,
        }
    }

    pub fn add_token(&mut self, address: &str, symbol: &str, name: &str, decimals: u8) -> MonitorResult<()> {
        validate_address(address)?;
        self.tokens.retain(|t| t.address != address);
        self.tokens.push(TokenEntry {
            address: address.to_string(),
            symbol: symbol.to_string(),
            name: name.to_string(),
            decimals,
        });
        Ok(())
    }

    pub fn token_entry(&self, mint: &str) -> Option<&TokenEntry> {
        self.tokens.iter().find(|t| t.address == mint)
    }

    /// Label for log lines, falling back to the address
    pub fn wallet_label<'a>(&'a self, address: &'a str) -> &'a str {
        self.wallets
            .iter()
            .find(|w| w.address == address && !w.label.is_empty())
            .map(|w| w.label.as_str())
            .unwrap_or(address)
    }
}
