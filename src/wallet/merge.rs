/// Balance reconciliation
///
/// Per wallet: the indexed source wins for every mint it reports, the raw source
/// fills in the rest with sentinel metadata. Across wallets: amounts are summed
/// per mint before any pricing happens.
use super::types::{IndexedAsset, RawBalanceRecord};
use crate::cache::TokenMetadataCache;
use crate::config::TokenEntry;
use crate::constants::{LAMPORTS_PER_SOL, SOL_DECIMALS, SOL_MINT, UNKNOWN_SYMBOL};
use crate::logger::{self, LogTag};
use crate::portfolio::Holding;
use std::collections::HashMap;

/// Holdings keyed by mint with first-insertion order preserved
#[derive(Default)]
struct OrderedHoldings {
    order: Vec<Holding>,
    index: HashMap<String, usize>,
}

impl OrderedHoldings {
    fn get(&self, mint: &str) -> Option<&Holding> {
        self.order.get(*self.index.get(mint)?)
    }

    fn get_mut(&mut self, mint: &str) -> Option<&mut Holding> {
        let idx = *self.index.get(mint)?;
        self.order.get_mut(idx)
    }

    fn contains(&self, mint: &str) -> bool {
        self.index.contains_key(mint)
    }

    /// Insert, or add the amount to an existing entry
    fn add(&mut self, holding: Holding) {
        if let Some(existing) = self.get_mut(&holding.mint) {
            existing.amount += holding.amount;
            return;
        }
        self.index.insert(holding.mint.clone(), self.order.len());
        self.order.push(holding);
    }

    fn into_vec(self) -> Vec<Holding> {
        self.order
    }
}

/// Merge both sources of one wallet.
///
/// Output order: raw-source order first, then mints only the indexed source
/// reported, in indexed order. Mints are pairwise distinct.
pub fn merge_sources(raw: &[RawBalanceRecord], indexed: &[IndexedAsset]) -> Vec<Holding> {
    let mut indexed_by_mint = OrderedHoldings::default();
    for asset in indexed {
        indexed_by_mint.add(
            Holding::unpriced(&asset.mint, asset.amount, asset.decimals, &asset.symbol, &asset.name)
        );
    }

    let mut merged = OrderedHoldings::default();
    for record in raw {
        if let Some(from_index) = indexed_by_mint.get(&record.mint) {
            if !merged.contains(&record.mint) {
                merged.add(from_index.clone());
            }
            continue;
        }
        merged.add(Holding::unknown(&record.mint, record.ui_amount(), record.decimals));
    }

    for holding in indexed_by_mint.into_vec() {
        if !merged.contains(&holding.mint) {
            merged.add(holding);
        }
    }

    merged.into_vec()
}

/// Add the native SOL balance as a wrapped-SOL entry, summing with an existing one
pub fn inject_native_balance(holdings: &mut Vec<Holding>, lamports: u64) {
    if lamports == 0 {
        return;
    }
    let amount = (lamports as f64) / (LAMPORTS_PER_SOL as f64);

    if let Some(existing) = holdings.iter_mut().find(|h| h.mint == SOL_MINT) {
        existing.amount += amount;
        if !existing.has_known_symbol() {
            existing.symbol = "SOL".to_string();
            existing.name = "Solana".to_string();
            existing.decimals = SOL_DECIMALS;
        }
        return;
    }

    holdings.push(Holding::unpriced(SOL_MINT, amount, SOL_DECIMALS, "SOL", "Solana"));
}

/// Combine per-wallet holdings by mint.
///
/// Only amounts are summed. First-seen metadata is kept unless it is the
/// unknown sentinel and a later wallet knows the token.
pub fn aggregate_by_mint<'a, I>(per_wallet: I) -> Vec<Holding> where I: IntoIterator<Item = &'a [Holding]> {
    let mut combined = OrderedHoldings::default();

    for holdings in per_wallet {
        for holding in holdings {
            match combined.get_mut(&holding.mint) {
                Some(existing) => {
                    existing.amount += holding.amount;
                    if !existing.has_known_symbol() && holding.has_known_symbol() {
                        existing.symbol = holding.symbol.clone();
                        existing.name = holding.name.clone();
                        existing.decimals = holding.decimals;
                    }
                }
                None => combined.add(holding.clone()),
            }
        }
    }

    combined.into_vec()
}

/// Fill sentinel metadata from the cache, then from configured tokens.
///
/// Known metadata flows the other way and refreshes the cache.
pub fn enrich_metadata(holdings: &mut [Holding], cache: &TokenMetadataCache, tokens: &[TokenEntry]) {
    let mut enriched = 0;

    for holding in holdings.iter_mut() {
        if holding.has_known_symbol() {
            cache.upsert_metadata(&holding.mint, &holding.symbol, &holding.name, holding.decimals);
            continue;
        }

        if let Some(meta) = cache.get(&holding.mint).filter(|m| m.symbol != UNKNOWN_SYMBOL) {
            holding.symbol = meta.symbol;
            holding.name = meta.name;
            enriched += 1;
            continue;
        }

        if let Some(entry) = tokens.iter().find(|t| t.address == holding.mint) {
            holding.symbol = entry.symbol.clone();
            holding.name = entry.name.clone();
            cache.upsert_metadata(&entry.address, &entry.symbol, &entry.name, entry.decimals);
            enriched += 1;
        }
    }

    if enriched > 0 {
        logger::debug(LogTag::Wallet, &format!("Filled metadata for {} unknown tokens", enriched));
    }
}
