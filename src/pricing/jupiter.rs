/// Jupiter price API client
///
/// API Documentation: https://station.jup.ag/docs/apis/price-api-v2
///
/// GET {endpoint}?ids=a,b,c&vsToken=<mint>&showExtraInfo=true
/// Response `data` maps mint -> entry; entries for unknown mints are `null`.
use super::types::{ConfidenceLevel, PriceSource, RawQuote};
use crate::config::PricingConfig;
use crate::errors::{MonitorError, MonitorResult};
use crate::logger::{self, LogTag};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Anything that can quote a batch of mints
#[async_trait]
pub trait PriceOracle: Send + Sync {
    /// Quote up to one batch of mints. Mints without a quote are simply absent.
    async fn fetch_batch(&self, mints: &[String]) -> MonitorResult<HashMap<String, RawQuote>>;

    fn source(&self) -> PriceSource;
}

// ============================================================================
// RESPONSE TYPES
// ============================================================================

#[derive(Debug, Deserialize)]
struct JupiterPriceResponse {
    #[serde(default)]
    data: HashMap<String, Option<JupiterPriceEntry>>,
}

#[derive(Debug, Deserialize)]
struct JupiterPriceEntry {
    #[serde(default)]
    id: Option<String>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    /// Usually a decimal string; tolerate a bare number
    #[serde(default)]
    price: Option<Value>,
    #[serde(rename = "extraInfo", default)]
    extra_info: Option<JupiterExtraInfo>,
}

#[derive(Debug, Deserialize)]
struct JupiterExtraInfo {
    #[serde(rename = "confidenceLevel", default)]
    confidence_level: Option<String>,
}

impl JupiterPriceEntry {
    fn into_raw_quote(self, key: &str) -> RawQuote {
        let price = match self.price {
            Some(Value::String(s)) => s,
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        };
        let confidence = ConfidenceLevel::parse(
            self.extra_info.as_ref().and_then(|e| e.confidence_level.as_deref())
        );
        RawQuote {
            mint: self.id.filter(|id| !id.is_empty()).unwrap_or_else(|| key.to_string()),
            price,
            confidence,
        }
    }
}

// ============================================================================
// CLIENT IMPLEMENTATION
// ============================================================================

pub struct JupiterPriceClient {
    client: Client,
    endpoint: String,
    vs_token: String,
}

impl JupiterPriceClient {
    pub fn new(config: &PricingConfig) -> MonitorResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| MonitorError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            vs_token: config.vs_token.clone(),
        })
    }
}

#[async_trait]
impl PriceOracle for JupiterPriceClient {
    async fn fetch_batch(&self, mints: &[String]) -> MonitorResult<HashMap<String, RawQuote>> {
        if mints.is_empty() {
            return Ok(HashMap::new());
        }

        let start = Instant::now();
        let ids = mints.join(",");

        let response = self.client
            .get(&self.endpoint)
            .query(
                &[
                    ("ids", ids.as_str()),
                    ("vsToken", self.vs_token.as_str()),
                    ("showExtraInfo", "true"),
                ]
            )
            .header("Accept", "application/json")
            .send().await
            .map_err(MonitorError::from)?;

        if !response.status().is_success() {
            return Err(MonitorError::Http {
                status: response.status().as_u16(),
                endpoint: self.endpoint.clone(),
            });
        }

        let body: JupiterPriceResponse = response.json().await.map_err(MonitorError::from)?;
        let quotes = parse_price_response(body);

        logger::debug(
            LogTag::Pricing,
            &format!(
                "Jupiter returned {}/{} quotes in {}ms",
                quotes.len(),
                mints.len(),
                start.elapsed().as_millis()
            )
        );
        Ok(quotes)
    }

    fn source(&self) -> PriceSource {
        PriceSource::Jupiter
    }
}

fn parse_price_response(body: JupiterPriceResponse) -> HashMap<String, RawQuote> {
    body.data
        .into_iter()
        .filter_map(|(key, entry)| {
            let entry = entry?;
            if let Some(kind) = entry.kind.as_deref() {
                logger::verbose(LogTag::Pricing, &format!("{} priced via {}", key, kind));
            }
            let quote = entry.into_raw_quote(&key);
            Some((key, quote))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_price_response() {
        let body: JupiterPriceResponse = serde_json
            ::from_str(
                r#"{
                "data": {
                    "MintA": {
                        "id": "MintA",
                        "type": "derivedPrice",
                        "price": "1.2345",
                        "extraInfo": { "confidenceLevel": "high" }
                    },
                    "MintB": { "id": "MintB", "type": "derivedPrice", "price": 0.5 },
                    "MintC": null
                },
                "timeTaken": 0.003
            }"#
            )
            .unwrap();

        let quotes = parse_price_response(body);
        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes["MintA"], RawQuote::new("MintA", "1.2345", ConfidenceLevel::High));
        assert_eq!(quotes["MintB"].price, "0.5");
        assert_eq!(quotes["MintB"].confidence, ConfidenceLevel::Unknown);
    }
}
