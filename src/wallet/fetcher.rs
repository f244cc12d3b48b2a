/// Concurrent balance acquisition
///
/// Per wallet both sources race under one shared deadline; across wallets a
/// semaphore bounds fan-out and each admitted fetch starts after a random
/// jitter so requests do not land on the upstream at the same instant.
use super::helius::BalanceSource;
use super::merge::{aggregate_by_mint, enrich_metadata, inject_native_balance, merge_sources};
use super::types::WalletHoldings;
use crate::cache::TokenMetadataCache;
use crate::config::{SourcesConfig, TokenEntry};
use crate::errors::{MonitorError, MonitorResult};
use crate::logger::{self, LogTag};
use crate::portfolio::Holding;
use crate::retry::RetryPolicy;
use crate::utils::{format_address_short, random_jitter, ShutdownSignal};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;

/// Acquisition tuning, derived from `[sources]`
#[derive(Debug, Clone)]
pub struct FetchSettings {
    /// Shared deadline for both source calls of one wallet
    pub deadline: Duration,
    pub retry: RetryPolicy,
    pub max_concurrent: usize,
    pub jitter_min_ms: u64,
    pub jitter_max_ms: u64,
}

impl From<&SourcesConfig> for FetchSettings {
    fn from(config: &SourcesConfig) -> Self {
        Self {
            deadline: config.fetch_timeout(),
            retry: RetryPolicy::exponential(
                config.max_attempts,
                Duration::from_millis(config.retry_base_delay_ms)
            ),
            max_concurrent: config.max_concurrent_wallets.max(1),
            jitter_min_ms: config.jitter_min_ms,
            jitter_max_ms: config.jitter_max_ms,
        }
    }
}

async fn before_deadline<T>(
    deadline: Instant,
    seconds: u64,
    future: impl std::future::Future<Output = MonitorResult<T>>
) -> MonitorResult<T> {
    match tokio::time::timeout_at(deadline, future).await {
        Ok(result) => result,
        Err(_) => Err(MonitorError::Timeout { seconds }),
    }
}

/// Fetch and merge the holdings of one wallet.
///
/// Fails only when both sources fail; a single failing source degrades the
/// result to whatever the other one returned.
pub async fn fetch_wallet_holdings(
    source: &dyn BalanceSource,
    wallet: &str,
    settings: &FetchSettings
) -> MonitorResult<Vec<Holding>> {
    let deadline = Instant::now() + settings.deadline;
    let seconds = settings.deadline.as_secs();
    let short = format_address_short(wallet);

    let indexed_label = format!("searchAssets {}", short);
    let raw_label = format!("getTokenAccountsByOwner {}", short);

    let (indexed, raw) = tokio::join!(
        before_deadline(
            deadline,
            seconds,
            settings.retry.run_until_ok(LogTag::Sources, &indexed_label, |_| source.fetch_indexed(wallet))
        ),
        before_deadline(
            deadline,
            seconds,
            settings.retry.run_until_ok(LogTag::Sources, &raw_label, |_| source.fetch_raw(wallet))
        )
    );

    let (indexed, raw) = match (indexed, raw) {
        (Ok(indexed), Ok(raw)) => (indexed, raw),
        (Ok(indexed), Err(raw_err)) => {
            logger::warning(
                LogTag::Sources,
                &format!("Raw token account source failed for {}, using indexed data only: {}", short, raw_err)
            );
            (indexed, Vec::new())
        }
        (Err(indexed_err), Ok(raw)) => {
            logger::warning(
                LogTag::Sources,
                &format!("Indexed asset source failed for {}, using raw data only: {}", short, indexed_err)
            );
            (Default::default(), raw)
        }
        (Err(indexed_err), Err(raw_err)) => {
            logger::error(
                LogTag::Sources,
                &format!("Both balance sources failed for {}: indexed: {}; raw: {}", short, indexed_err, raw_err)
            );
            return Err(indexed_err);
        }
    };

    let mut holdings = merge_sources(&raw, &indexed.assets);
    inject_native_balance(&mut holdings, indexed.native_lamports);

    logger::debug(
        LogTag::Wallet,
        &format!(
            "{}: {} raw accounts + {} indexed assets -> {} holdings",
            short,
            raw.len(),
            indexed.assets.len(),
            holdings.len()
        )
    );
    Ok(holdings)
}

/// Fetch every wallet with bounded concurrency.
///
/// Results come back in input order. Failed wallets are logged and skipped;
/// only a total failure is an error. Shutdown aborts outstanding fetches.
pub async fn fetch_all_wallets(
    source: Arc<dyn BalanceSource>,
    wallets: &[String],
    settings: &FetchSettings,
    shutdown: &ShutdownSignal
) -> MonitorResult<Vec<WalletHoldings>> {
    if wallets.is_empty() {
        return Ok(Vec::new());
    }

    logger::info(
        LogTag::Wallet,
        &format!(
            "Fetching balances for {} wallets ({} at a time)",
            wallets.len(),
            settings.max_concurrent
        )
    );

    let semaphore = Arc::new(Semaphore::new(settings.max_concurrent.max(1)));
    let mut tasks = JoinSet::new();

    for (index, wallet) in wallets.iter().enumerate() {
        let semaphore = semaphore.clone();
        let source = source.clone();
        let settings = settings.clone();
        let wallet = wallet.clone();

        tasks.spawn(async move {
            let result = match semaphore.acquire_owned().await {
                Ok(_permit) => {
                    tokio::time::sleep(random_jitter(settings.jitter_min_ms, settings.jitter_max_ms)).await;
                    fetch_wallet_holdings(source.as_ref(), &wallet, &settings).await
                }
                Err(_) => Err(MonitorError::Cancelled),
            };
            (index, wallet, result)
        });
    }

    let mut succeeded: Vec<(usize, WalletHoldings)> = Vec::with_capacity(wallets.len());
    let mut first_error: Option<String> = None;

    loop {
        let joined = tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                tasks.abort_all();
                logger::warning(LogTag::Wallet, "Shutdown requested, aborting balance fetches");
                return Err(MonitorError::Cancelled);
            }
            joined = tasks.join_next() => joined,
        };

        let Some(joined) = joined else {
            break;
        };

        match joined {
            Ok((index, wallet, Ok(holdings))) => {
                succeeded.push((index, WalletHoldings { wallet, holdings }));
            }
            Ok((_, wallet, Err(e))) => {
                logger::error(
                    LogTag::Wallet,
                    &format!("Failed to fetch wallet {}: {}", format_address_short(&wallet), e)
                );
                first_error.get_or_insert_with(|| e.to_string());
            }
            Err(e) => {
                logger::error(LogTag::Wallet, &format!("Wallet fetch task failed: {}", e));
                first_error.get_or_insert_with(|| e.to_string());
            }
        }
    }

    if succeeded.is_empty() {
        return Err(MonitorError::AllWalletsFailed {
            wallets: wallets.len(),
            first_error: first_error.unwrap_or_default(),
        });
    }

    if succeeded.len() < wallets.len() {
        logger::warning(
            LogTag::Wallet,
            &format!(
                "Continuing with {}/{} wallets after partial failure",
                succeeded.len(),
                wallets.len()
            )
        );
    }

    succeeded.sort_by_key(|(index, _)| *index);
    Ok(
        succeeded
            .into_iter()
            .map(|(_, holdings)| holdings)
            .collect()
    )
}

/// Full acquisition: fetch, aggregate across wallets, fill unknown metadata
pub async fn acquire_holdings(
    source: Arc<dyn BalanceSource>,
    wallets: &[String],
    settings: &FetchSettings,
    metadata: &TokenMetadataCache,
    tokens: &[TokenEntry],
    shutdown: &ShutdownSignal
) -> MonitorResult<Vec<Holding>> {
    let per_wallet = fetch_all_wallets(source, wallets, settings, shutdown).await?;
    let mut holdings = aggregate_by_mint(per_wallet.iter().map(|w| w.holdings.as_slice()));
    enrich_metadata(&mut holdings, metadata, tokens);

    logger::info(
        LogTag::Wallet,
        &format!("Acquired {} distinct tokens across {} wallets", holdings.len(), per_wallet.len())
    );
    Ok(holdings)
}
