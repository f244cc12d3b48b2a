/// Helius balance sources
///
/// Two JSON-RPC calls against the same endpoint:
/// 1. `searchAssets` (DAS index) - fungible assets with metadata + native balance
/// 2. `getTokenAccountsByOwner` (raw enumeration) - SPL token accounts, amounts only
///
/// Individual records that fail to parse are dropped with a warning; only
/// transport, status and JSON-RPC errors fail the call.
use super::types::{descale, IndexedAsset, IndexedBalances, RawBalanceRecord};
use crate::config::{SourceCredentials, SourcesConfig};
use crate::constants::TOKEN_PROGRAM_ID;
use crate::errors::{MonitorError, MonitorResult};
use crate::logger::{self, LogTag};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use url::Url;

/// Capability shared by every balance backend
#[async_trait]
pub trait BalanceSource: Send + Sync {
    /// Indexed asset search (amounts descaled, metadata included)
    async fn fetch_indexed(&self, wallet: &str) -> MonitorResult<IndexedBalances>;

    /// Raw token account enumeration
    async fn fetch_raw(&self, wallet: &str) -> MonitorResult<Vec<RawBalanceRecord>>;
}

pub struct HeliusClient {
    client: Client,
    endpoint: Url,
    api_key: String,
    request_id: AtomicU64,
}

impl HeliusClient {
    pub fn new(credentials: SourceCredentials, timeout: Duration) -> MonitorResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MonitorError::Config(format!("Failed to create HTTP client: {}", e)))?;

        let endpoint = Url::parse(credentials.endpoint.trim())
            .map_err(|e| MonitorError::Config(format!("Invalid RPC endpoint URL: {}", e)))?;

        Ok(Self {
            client,
            endpoint,
            api_key: credentials.api_key,
            request_id: AtomicU64::new(1),
        })
    }

    /// Credentials from the environment; missing values are fatal
    pub fn from_config(sources: &SourcesConfig) -> MonitorResult<Self> {
        let credentials = SourceCredentials::from_env(sources)?;
        Self::new(credentials, sources.fetch_timeout())
    }

    /// POST one JSON-RPC request and return its `result`
    async fn rpc_call(&self, method: &str, params: Value) -> MonitorResult<Value> {
        let id = self.request_id.fetch_add(1, Ordering::Relaxed);
        let body =
            json!({
            "jsonrpc": "2.0",
            "id": format!("walletwatch-{}", id),
            "method": method,
            "params": params,
        });

        let response = self.client
            .post(self.endpoint.clone())
            .query(&[("api-key", self.api_key.as_str())])
            .header("Content-Type", "application/json")
            .json(&body)
            .send().await
            .map_err(MonitorError::from)?;

        if !response.status().is_success() {
            return Err(MonitorError::Http {
                status: response.status().as_u16(),
                endpoint: method.to_string(),
            });
        }

        let payload: Value = response.json().await.map_err(MonitorError::from)?;
        extract_result(method, payload)
    }
}

#[async_trait]
impl BalanceSource for HeliusClient {
    async fn fetch_indexed(&self, wallet: &str) -> MonitorResult<IndexedBalances> {
        let params =
            json!({
            "ownerAddress": wallet,
            "tokenType": "fungible",
            "displayOptions": { "showNativeBalance": true },
        });
        let result = self.rpc_call("searchAssets", params).await?;
        let balances = parse_search_assets(&result);

        logger::debug(
            LogTag::Sources,
            &format!(
                "searchAssets {}: {} assets (total {}), native {} lamports",
                wallet,
                balances.assets.len(),
                balances.total,
                balances.native_lamports
            )
        );
        Ok(balances)
    }

    async fn fetch_raw(&self, wallet: &str) -> MonitorResult<Vec<RawBalanceRecord>> {
        let params =
            json!([
            wallet,
            { "programId": TOKEN_PROGRAM_ID },
            { "encoding": "jsonParsed" },
        ]);
        let result = self.rpc_call("getTokenAccountsByOwner", params).await?;
        let records = parse_token_accounts(&result);

        logger::debug(
            LogTag::Sources,
            &format!("getTokenAccountsByOwner {}: {} token accounts", wallet, records.len())
        );
        Ok(records)
    }
}

/// Split a JSON-RPC envelope into its `result` or an `Rpc` error
pub(crate) fn extract_result(method: &str, mut payload: Value) -> MonitorResult<Value> {
    if let Some(error) = payload.get("error").filter(|e| !e.is_null()) {
        let code = error
            .get("code")
            .and_then(|c| c.as_i64())
            .unwrap_or_default();
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("unknown error");
        return Err(MonitorError::Rpc(format!("{} failed ({}): {}", method, code, message)));
    }

    match payload.get_mut("result") {
        Some(result) => Ok(result.take()),
        None => Err(MonitorError::Parse(format!("{} response has no result", method))),
    }
}

fn str_field<'a>(value: &'a Value, path: &[&str]) -> Option<&'a str> {
    path.iter()
        .try_fold(value, |v, key| v.get(key))
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
}

/// Amount that may arrive as a JSON number or a decimal string
fn amount_field(value: Option<&Value>) -> Option<f64> {
    let amount = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    amount.filter(|v| v.is_finite() && *v >= 0.0)
}

pub(crate) fn parse_search_assets(result: &Value) -> IndexedBalances {
    let native_lamports = result
        .get("nativeBalance")
        .and_then(|n| n.get("lamports"))
        .and_then(|l| l.as_u64())
        .unwrap_or(0);
    let total = result
        .get("total")
        .and_then(|t| t.as_u64())
        .unwrap_or(0);

    let items = result
        .get("items")
        .and_then(|i| i.as_array())
        .map(|a| a.as_slice())
        .unwrap_or(&[]);

    let mut assets = Vec::with_capacity(items.len());
    for item in items {
        let Some(mint) = str_field(item, &["id"]) else {
            logger::warning(LogTag::Sources, "searchAssets item without id, skipping");
            continue;
        };

        let token_info = item.get("token_info").unwrap_or(&Value::Null);
        let decimals = token_info
            .get("decimals")
            .and_then(|d| d.as_u64())
            .unwrap_or(0)
            .min(u8::MAX as u64) as u8;

        let Some(raw_balance) = amount_field(token_info.get("balance")) else {
            logger::warning(
                LogTag::Sources,
                &format!("Unable to parse indexed balance for {}: {:?}", mint, token_info.get("balance"))
            );
            continue;
        };

        let symbol = str_field(token_info, &["symbol"])
            .or_else(|| str_field(item, &["content", "metadata", "symbol"]))
            .unwrap_or_default();
        let name = str_field(token_info, &["name"])
            .or_else(|| str_field(item, &["content", "metadata", "name"]))
            .unwrap_or_default();

        assets.push(IndexedAsset {
            mint: mint.to_string(),
            amount: descale(raw_balance, decimals),
            decimals,
            symbol: symbol.to_string(),
            name: name.to_string(),
        });
    }

    IndexedBalances {
        assets,
        native_lamports,
        total,
    }
}

pub(crate) fn parse_token_accounts(result: &Value) -> Vec<RawBalanceRecord> {
    let accounts = result
        .get("value")
        .and_then(|v| v.as_array())
        .map(|a| a.as_slice())
        .unwrap_or(&[]);

    let mut records = Vec::with_capacity(accounts.len());
    for account in accounts {
        let info = ["account", "data", "parsed", "info"]
            .iter()
            .try_fold(account, |v, key| v.get(key));
        let Some(info) = info else {
            logger::warning(LogTag::Sources, "Token account without parsed info, skipping");
            continue;
        };

        let Some(mint) = str_field(info, &["mint"]) else {
            continue;
        };
        let token_amount = info.get("tokenAmount").unwrap_or(&Value::Null);
        let amount_str = token_amount
            .get("amount")
            .and_then(|a| a.as_str())
            .unwrap_or_default();

        let raw_amount = match amount_str.parse::<u64>() {
            Ok(amount) => amount,
            Err(e) => {
                logger::warning(
                    LogTag::Sources,
                    &format!("Unable to parse token amount '{}' for {}: {}", amount_str, mint, e)
                );
                continue;
            }
        };
        let decimals = token_amount
            .get("decimals")
            .and_then(|d| d.as_u64())
            .unwrap_or(0)
            .min(u8::MAX as u64) as u8;

        records.push(RawBalanceRecord {
            mint: mint.to_string(),
            raw_amount,
            decimals,
        });
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_endpoint_is_config_error() {
        let credentials = SourceCredentials {
            endpoint: "not a url".to_string(),
            api_key: "key".to_string(),
        };
        let err = HeliusClient::new(credentials, Duration::from_secs(5)).err().unwrap();
        assert!(err.is_critical());
    }

    #[test]
    fn test_parse_search_assets() {
        let result =
            json!({
            "total": 3,
            "nativeBalance": { "lamports": 2_500_000_000u64 },
            "items": [
                {
                    "id": "MintA",
                    "token_info": { "balance": 1_500_000, "decimals": 6, "symbol": "AAA", "name": "Token A" }
                },
                {
                    "id": "MintB",
                    "content": { "metadata": { "symbol": "BBB", "name": "Token B" } },
                    "token_info": { "balance": "250", "decimals": 2 }
                },
                {
                    "id": "MintC",
                    "token_info": { "balance": "not-a-number", "decimals": 0 }
                }
            ]
        });

        let parsed = parse_search_assets(&result);
        assert_eq!(parsed.native_lamports, 2_500_000_000);
        assert_eq!(parsed.total, 3);
        assert_eq!(parsed.assets.len(), 2);
        assert_eq!(parsed.assets[0].amount, 1.5);
        assert_eq!(parsed.assets[0].symbol, "AAA");
        assert_eq!(parsed.assets[1].amount, 2.5);
        assert_eq!(parsed.assets[1].symbol, "BBB");
        assert_eq!(parsed.assets[1].name, "Token B");
    }

    #[test]
    fn test_parse_token_accounts() {
        let result =
            json!({
            "value": [
                { "account": { "data": { "parsed": { "info": {
                    "mint": "MintA",
                    "tokenAmount": { "amount": "1000000", "decimals": 6 }
                } } } } },
                { "account": { "data": { "parsed": { "info": {
                    "mint": "MintB",
                    "tokenAmount": { "amount": "-5", "decimals": 6 }
                } } } } },
                { "account": { "data": "base64blob" } }
            ]
        });

        let records = parse_token_accounts(&result);
        assert_eq!(
            records,
            vec![RawBalanceRecord { mint: "MintA".to_string(), raw_amount: 1_000_000, decimals: 6 }]
        );
    }

    #[test]
    fn test_rpc_error_envelope() {
        let payload = json!({ "jsonrpc": "2.0", "error": { "code": -32602, "message": "invalid owner" } });
        match extract_result("searchAssets", payload) {
            Err(MonitorError::Rpc(msg)) => assert!(msg.contains("invalid owner")),
            other => panic!("unexpected {:?}", other),
        }

        let ok = json!({ "jsonrpc": "2.0", "result": { "value": [] } });
        assert_eq!(extract_result("getTokenAccountsByOwner", ok).unwrap(), json!({ "value": [] }));
    }
}
