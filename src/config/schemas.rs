/// Configuration schemas - all config structures defined once with defaults
///
/// Each section is declared with `config_struct!`, so a config file only needs
/// the keys it wants to override.
use crate::config_struct;
use crate::constants::{JUPITER_PRICE_ENDPOINT, USDC_MINT};
use std::path::PathBuf;
use std::time::Duration;

// ============================================================================
// TRACKED WALLETS AND KNOWN TOKENS
// ============================================================================

config_struct! {
    /// One tracked wallet
    pub struct WalletEntry {
        address: String = String::new(),
        label: String = String::new(),
    }
}

config_struct! {
    /// Locally known token metadata, used when upstream sources have none
    pub struct TokenEntry {
        address: String = String::new(),
        symbol: String = String::new(),
        name: String = String::new(),
        decimals: u8 = 0,
    }
}

// ============================================================================
// BALANCE SOURCES
// ============================================================================

config_struct! {
    /// Indexed search + raw enumeration balance sources
    pub struct SourcesConfig {
        /// Environment variable holding the RPC endpoint
        rpc_endpoint_env: String = "HELIUS_RPC_ENDPOINT".to_string(),
        /// Environment variable holding the API key
        api_key_env: String = "HELIUS_API_KEY".to_string(),
        /// Shared deadline for both source fetches of one wallet
        fetch_timeout_secs: u64 = 30,
        /// Attempts per source within the deadline
        max_attempts: u32 = 2,
        retry_base_delay_ms: u64 = 1000,
        /// Wallets fetched at the same time
        max_concurrent_wallets: usize = 2,
        jitter_min_ms: u64 = 500,
        jitter_max_ms: u64 = 1500,
    }
}

impl SourcesConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

// ============================================================================
// PRICE LOOKUP
// ============================================================================

config_struct! {
    /// Price oracle configuration
    pub struct PricingConfig {
        endpoint: String = JUPITER_PRICE_ENDPOINT.to_string(),
        /// Quote currency mint
        vs_token: String = USDC_MINT.to_string(),
        /// Upstream limit on ids per request
        batch_size: usize = 100,
        max_attempts: u32 = 5,
        /// First retry waits this long, doubling per attempt
        backoff_base_secs: u64 = 2,
        /// Pause between consecutive batches
        batch_delay_ms: u64 = 100,
        request_timeout_secs: u64 = 30,
        min_price_usd: f64 = 1e-9,
        max_price_usd: f64 = 1e12,
        /// Treat "unknown" confidence like "low"
        reject_unknown_confidence: bool = false,
    }
}

// ============================================================================
// VALUATION
// ============================================================================

config_struct! {
    pub struct ValuationConfig {
        /// Ranked output is truncated to this many holdings
        top_n: usize = 50,
    }
}

// ============================================================================
// ALERTS
// ============================================================================

config_struct! {
    /// Multi-window alert engine
    pub struct AlertsConfig {
        threshold_percent: f64 = 5.0,
        windows_secs: Vec<u64> = vec![30, 60, 300],
        /// Extra age admitted past each window to absorb polling jitter
        tolerance_secs: u64 = 5,
        /// Snapshots kept in the history ring
        history_capacity: usize = 300,
        /// Moves above this percentage are logged even below the threshold
        log_change_percent: f64 = 1.0,
    }
}

impl AlertsConfig {
    pub fn windows(&self) -> Vec<Duration> {
        self.windows_secs.iter().map(|s| Duration::from_secs(*s)).collect()
    }

    pub fn tolerance(&self) -> Duration {
        Duration::from_secs(self.tolerance_secs)
    }
}

// ============================================================================
// MONITOR SCHEDULER
// ============================================================================

config_struct! {
    pub struct MonitorConfig {
        /// Price refresh tick
        interval_secs: u64 = 20,
        /// Full balance re-acquisition
        refresh_interval_secs: u64 = 300,
        /// Upper bound for one tick
        cycle_timeout_secs: u64 = 60,
    }
}

impl MonitorConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }

    pub fn cycle_timeout(&self) -> Duration {
        Duration::from_secs(self.cycle_timeout_secs.max(1))
    }
}

// ============================================================================
// REPORT SINKS
// ============================================================================

config_struct! {
    pub struct ReportsConfig {
        dir: String = "reports".to_string(),
        csv_file: String = "monitor.csv".to_string(),
        alert_file: String = "alert.log".to_string(),
        log_file: String = "walletwatch.log".to_string(),
    }
}

impl ReportsConfig {
    pub fn csv_path(&self) -> PathBuf {
        PathBuf::from(&self.dir).join(&self.csv_file)
    }

    pub fn alert_path(&self) -> PathBuf {
        PathBuf::from(&self.dir).join(&self.alert_file)
    }

    pub fn log_path(&self) -> PathBuf {
        PathBuf::from(&self.dir).join(&self.log_file)
    }
}

// ============================================================================
// TOKEN METADATA CACHE
// ============================================================================

config_struct! {
    pub struct MetadataCacheConfig {
        ttl_secs: u64 = 60,
        capacity: usize = 5000,
    }
}

// ============================================================================
// ROOT CONFIGURATION
// ============================================================================

config_struct! {
    /// Root configuration structure containing all sub-configurations
    pub struct Config {
        wallets: Vec<WalletEntry> = Vec::new(),
        tokens: Vec<TokenEntry> = Vec::new(),
        sources: SourcesConfig = SourcesConfig::default(),
        pricing: PricingConfig = PricingConfig::default(),
        valuation: ValuationConfig = ValuationConfig::default(),
        alerts: AlertsConfig = AlertsConfig::default(),
        monitor: MonitorConfig = MonitorConfig::default(),
        reports: ReportsConfig = ReportsConfig::default(),
        metadata: MetadataCacheConfig = MetadataCacheConfig::default(),
    }
}
