/// Batched price lookup with retry and validation
///
/// Mints are de-duplicated and split into oracle-sized batches. Each batch is
/// retried until it yields at least one entry; a batch that never does
/// contributes nothing and the lookup carries on with the other batches.
/// With a deadline, every remaining batch gets an equal share of the time left,
/// so one hanging batch cannot starve the others.
use super::jupiter::PriceOracle;
use super::types::{ConfidenceLevel, PriceQuote, PriceSource, RawQuote};
use crate::cache::TokenMetadataCache;
use crate::config::PricingConfig;
use crate::errors::{MonitorError, MonitorResult};
use crate::logger::{self, short_mint, LogTag};
use crate::retry::RetryPolicy;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

pub struct PriceService {
    oracle: Arc<dyn PriceOracle>,
    config: PricingConfig,
    retry: RetryPolicy,
    metadata: Option<Arc<TokenMetadataCache>>,
}

impl PriceService {
    pub fn new(oracle: Arc<dyn PriceOracle>, config: &PricingConfig) -> Self {
        Self {
            oracle,
            config: config.clone(),
            retry: RetryPolicy::exponential(
                config.max_attempts,
                Duration::from_secs(config.backoff_base_secs)
            ),
            metadata: None,
        }
    }

    /// Accepted prices are written back to this cache
    pub fn with_metadata_cache(mut self, cache: Arc<TokenMetadataCache>) -> Self {
        self.metadata = Some(cache);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Quote every mint that the oracle can price.
    ///
    /// Absent mints are unpriced this cycle. Errors only when nothing at all
    /// could be priced for a non-empty request.
    pub async fn get_prices(&self, mints: &[String]) -> MonitorResult<HashMap<String, PriceQuote>> {
        self.get_prices_within(mints, None).await
    }

    /// `get_prices` bounded by `deadline`. Batches still running when their
    /// share of the budget is spent count as failed; quotes gathered so far
    /// are kept.
    pub async fn get_prices_within(
        &self,
        mints: &[String],
        deadline: Option<Instant>
    ) -> MonitorResult<HashMap<String, PriceQuote>> {
        let unique = dedup_mints(mints);
        if unique.is_empty() {
            return Ok(HashMap::new());
        }

        let batch_size = self.config.batch_size.max(1);
        let batches: Vec<&[String]> = unique.chunks(batch_size).collect();
        let batch_count = batches.len();
        let source = self.oracle.source();

        let mut accepted = HashMap::with_capacity(unique.len());
        let mut rejected = 0usize;
        let mut failed_batches = 0usize;

        for (i, batch) in batches.into_iter().enumerate() {
            let label = format!("price batch {}/{}", i + 1, batch_count);
            let attempts = self.retry.run(
                LogTag::Pricing,
                &label,
                |_| self.oracle.fetch_batch(batch),
                |quotes: &HashMap<String, RawQuote>| !quotes.is_empty()
            );
            let result = match deadline {
                Some(deadline) => {
                    let share = deadline.saturating_duration_since(Instant::now()) /
                    ((batch_count - i) as u32);
                    match tokio::time::timeout(share, attempts).await {
                        Ok(result) => result,
                        Err(_) => Err(MonitorError::Timeout { seconds: share.as_secs() }),
                    }
                }
                None => attempts.await,
            };

            match result {
                Ok(raw_quotes) => {
                    if raw_quotes.is_empty() {
                        failed_batches += 1;
                    }
                    let now = Utc::now();
                    for mint in batch {
                        let Some(raw) = raw_quotes.get(mint) else {
                            continue;
                        };
                        match validate_quote(mint, raw, &self.config, source, now) {
                            Ok(quote) => {
                                accepted.insert(mint.clone(), quote);
                            }
                            Err(reason) => {
                                rejected += 1;
                                logger::debug(
                                    LogTag::Pricing,
                                    &format!("Rejected quote for {}: {}", short_mint(mint), reason)
                                );
                            }
                        }
                    }
                }
                Err(e) => {
                    failed_batches += 1;
                    logger::error(
                        LogTag::Pricing,
                        &format!("{} failed ({} mints unpriced): {}", label, batch.len(), e)
                    );
                }
            }

            if i + 1 < batch_count && self.config.batch_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.config.batch_delay_ms)).await;
            }
        }

        logger::info(
            LogTag::Pricing,
            &format!(
                "Priced {}/{} tokens ({} rejected, {}/{} batches empty or failed)",
                accepted.len(),
                unique.len(),
                rejected,
                failed_batches,
                batch_count
            )
        );

        if accepted.is_empty() {
            return Err(MonitorError::NoQuotes { requested: unique.len() });
        }

        if let Some(cache) = &self.metadata {
            for quote in accepted.values() {
                cache.update_price(&quote.mint, quote.price);
            }
        }

        Ok(accepted)
    }
}

/// First occurrence order, empty ids dropped
fn dedup_mints(mints: &[String]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(mints.len());
    let mut unique = Vec::with_capacity(mints.len());
    for mint in mints {
        if !mint.is_empty() && seen.insert(mint.as_str()) {
            unique.push(mint.clone());
        }
    }
    unique
}

/// Check one raw quote; the error explains the rejection
pub fn validate_quote(
    mint: &str,
    raw: &RawQuote,
    config: &PricingConfig,
    source: PriceSource,
    timestamp: DateTime<Utc>
) -> Result<PriceQuote, String> {
    let text = raw.price.trim();
    if text.is_empty() {
        return Err("empty price".to_string());
    }
    let price: f64 = text.parse().map_err(|_| format!("unparsable price '{}'", text))?;
    if !price.is_finite() || price < config.min_price_usd || price > config.max_price_usd {
        return Err(
            format!(
                "price {} outside [{}, {}]",
                price,
                config.min_price_usd,
                config.max_price_usd
            )
        );
    }

    match raw.confidence {
        ConfidenceLevel::Low => {
            return Err("low confidence".to_string());
        }
        ConfidenceLevel::Unknown if config.reject_unknown_confidence => {
            return Err("unknown confidence".to_string());
        }
        _ => {}
    }

    Ok(PriceQuote {
        mint: mint.to_string(),
        price,
        confidence: raw.confidence,
        source,
        timestamp,
    })
}
