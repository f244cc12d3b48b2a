/// Per-source balance records
///
/// Both record types are ephemeral: produced by one source call and consumed
/// by the merge step.
use crate::portfolio::Holding;

/// Token account entry from the raw enumeration source
#[derive(Debug, Clone, PartialEq)]
pub struct RawBalanceRecord {
    pub mint: String,
    /// Smallest-unit amount
    pub raw_amount: u64,
    pub decimals: u8,
}

impl RawBalanceRecord {
    pub fn ui_amount(&self) -> f64 {
        descale(self.raw_amount as f64, self.decimals)
    }
}

/// Fungible asset from the indexed search source, already descaled
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedAsset {
    pub mint: String,
    pub amount: f64,
    pub decimals: u8,
    pub symbol: String,
    pub name: String,
}

/// Indexed search result for one wallet
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexedBalances {
    pub assets: Vec<IndexedAsset>,
    /// Native SOL balance in lamports
    pub native_lamports: u64,
    /// Asset count reported upstream (may exceed `assets.len()` when items were dropped)
    pub total: u64,
}

/// Merged holdings of one wallet
#[derive(Debug, Clone, PartialEq)]
pub struct WalletHoldings {
    pub wallet: String,
    pub holdings: Vec<Holding>,
}

/// Smallest units to UI amount
pub fn descale(raw: f64, decimals: u8) -> f64 {
    if decimals == 0 {
        raw
    } else {
        raw / 10f64.powi(decimals as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descale() {
        let record = RawBalanceRecord {
            mint: "m".to_string(),
            raw_amount: 1_500_000,
            decimals: 6,
        };
        assert_eq!(record.ui_amount(), 1.5);
        assert_eq!(descale(42.0, 0), 42.0);
    }
}
