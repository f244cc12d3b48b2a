//! Wallet balance acquisition
//!
//! - `helius`: the `BalanceSource` trait and its Helius JSON-RPC implementation
//! - `merge`: per-wallet source reconciliation and cross-wallet aggregation
//! - `fetcher`: deadlines, retries and bounded fan-out around the sources

pub mod fetcher;
pub mod helius;
pub mod merge;
pub mod types;

pub use fetcher::{acquire_holdings, fetch_all_wallets, fetch_wallet_holdings, FetchSettings};
pub use helius::{BalanceSource, HeliusClient};
pub use merge::{aggregate_by_mint, enrich_metadata, inject_native_balance, merge_sources};
pub use types::{IndexedAsset, IndexedBalances, RawBalanceRecord, WalletHoldings};
