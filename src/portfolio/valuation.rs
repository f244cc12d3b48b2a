/// Valuation and ranking
use super::types::Holding;
use crate::pricing::{ConfidenceLevel, PriceQuote};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};

/// Previous valuation per mint: (value, timestamp)
#[derive(Debug, Default, Clone)]
pub struct ValuationBaseline {
    entries: HashMap<String, (f64, DateTime<Utc>)>,
}

impl ValuationBaseline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn previous(&self, mint: &str) -> Option<(f64, DateTime<Utc>)> {
        self.entries.get(mint).copied()
    }

    pub fn record(&mut self, mint: &str, value: f64, timestamp: DateTime<Utc>) {
        self.entries.insert(mint.to_string(), (value, timestamp));
    }

    /// Forget every mint not in `mints`
    pub fn retain_mints<'a, I>(&mut self, mints: I) where I: IntoIterator<Item = &'a str> {
        let keep: HashSet<&str> = mints.into_iter().collect();
        self.entries.retain(|mint, _| keep.contains(mint.as_str()));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Percent change per second; 0 whenever the ratio is undefined
pub fn change_rate(previous_value: f64, current_value: f64, elapsed_secs: f64) -> f64 {
    if elapsed_secs <= 0.0 || previous_value <= 0.0 || !elapsed_secs.is_finite() {
        return 0.0;
    }
    let change_percent = ((current_value - previous_value) / previous_value) * 100.0;
    let rate = change_percent / elapsed_secs;
    if rate.is_finite() { rate } else { 0.0 }
}

fn elapsed_secs(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    ((to - from).num_milliseconds() as f64) / 1000.0
}

/// Price, value and rank the tracked holdings.
///
/// Holdings without an acceptable quote are dropped. The baseline is updated
/// for every valued mint, including those cut by `top_n`.
pub fn value_holdings(
    holdings: &[Holding],
    quotes: &HashMap<String, PriceQuote>,
    baseline: &mut ValuationBaseline,
    now: DateTime<Utc>,
    top_n: usize
) -> Vec<Holding> {
    let mut valued: Vec<Holding> = Vec::with_capacity(holdings.len());

    for holding in holdings {
        let Some(quote) = quotes.get(&holding.mint) else {
            continue;
        };
        if quote.price <= 0.0 || quote.confidence == ConfidenceLevel::Low {
            continue;
        }

        let mut priced = holding.clone();
        priced.price = quote.price;
        priced.value = priced.amount * quote.price;
        priced.confidence = quote.confidence;
        priced.change_rate = match baseline.previous(&priced.mint) {
            Some((previous_value, at)) => change_rate(previous_value, priced.value, elapsed_secs(at, now)),
            None => 0.0,
        };

        baseline.record(&priced.mint, priced.value, now);
        valued.push(priced);
    }

    valued.sort_by(|a, b| b.value.total_cmp(&a.value));
    valued.truncate(top_n);
    valued
}
