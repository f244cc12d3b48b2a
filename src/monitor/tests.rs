use super::*;
use crate::cache::CacheConfig;
use crate::config::{AlertsConfig, PricingConfig};
use crate::portfolio::{AlertEvent, AlertKind, StatusLine};
use crate::pricing::{ConfidenceLevel, PriceOracle, PriceSource, RawQuote};
use crate::retry::RetryPolicy;
use crate::wallet::{IndexedAsset, IndexedBalances, RawBalanceRecord};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

/// Same assets for every wallet; replaceable mid-test
struct StubBalances {
    assets: Mutex<Vec<IndexedAsset>>,
}

impl StubBalances {
    fn new(assets: &[(&str, f64)]) -> Self {
        let stub = Self { assets: Mutex::new(Vec::new()) };
        stub.set(assets);
        stub
    }

    fn set(&self, assets: &[(&str, f64)]) {
        *self.assets.lock() = assets
            .iter()
            .map(|(mint, amount)| IndexedAsset {
                mint: mint.to_string(),
                amount: *amount,
                decimals: 6,
                symbol: mint.to_string(),
                name: mint.to_string(),
            })
            .collect();
    }
}

#[async_trait]
impl BalanceSource for StubBalances {
    async fn fetch_indexed(&self, _wallet: &str) -> MonitorResult<IndexedBalances> {
        let assets = self.assets.lock().clone();
        Ok(IndexedBalances {
            total: assets.len() as u64,
            assets,
            native_lamports: 0,
        })
    }

    async fn fetch_raw(&self, _wallet: &str) -> MonitorResult<Vec<RawBalanceRecord>> {
        Ok(Vec::new())
    }
}

/// Mutable price table; optionally stalls every request, or stalls and then
/// fails every batch containing one mint
struct StubOracle {
    prices: Mutex<HashMap<String, f64>>,
    stall: Option<Duration>,
    slow_failure: Option<(String, Duration)>,
}

impl StubOracle {
    fn new(prices: &[(&str, f64)]) -> Self {
        Self {
            prices: Mutex::new(
                prices
                    .iter()
                    .map(|(m, p)| (m.to_string(), *p))
                    .collect()
            ),
            stall: None,
            slow_failure: None,
        }
    }

    fn set(&self, mint: &str, price: f64) {
        self.prices.lock().insert(mint.to_string(), price);
    }
}

#[async_trait]
impl PriceOracle for StubOracle {
    async fn fetch_batch(&self, mints: &[String]) -> MonitorResult<HashMap<String, RawQuote>> {
        if let Some(stall) = self.stall {
            tokio::time::sleep(stall).await;
        }
        if let Some((mint, stall)) = &self.slow_failure {
            if mints.contains(mint) {
                tokio::time::sleep(*stall).await;
                return Err(MonitorError::Network(format!("{} batch reset", mint)));
            }
        }
        let prices = self.prices.lock().clone();
        Ok(
            mints
                .iter()
                .filter_map(|m| {
                    prices.get(m).map(|p| (m.clone(), RawQuote::new(m, &p.to_string(), ConfidenceLevel::High)))
                })
                .collect()
        )
    }

    fn source(&self) -> PriceSource {
        PriceSource::Static
    }
}

#[derive(Default)]
struct RecordingObserver {
    updates: Mutex<Vec<Vec<Holding>>>,
    alerts: Mutex<Vec<AlertEvent>>,
    statuses: Mutex<Vec<StatusLine>>,
}

impl PortfolioObserver for RecordingObserver {
    fn on_update(&self, holdings: &[Holding]) {
        self.updates.lock().push(holdings.to_vec());
    }

    fn on_alert(&self, event: &AlertEvent) {
        self.alerts.lock().push(event.clone());
    }

    fn on_status(&self, status: &StatusLine) {
        self.statuses.lock().push(status.clone());
    }
}

fn settings() -> MonitorSettings {
    MonitorSettings {
        wallets: vec!["wallet-1".to_string(), "wallet-2".to_string()],
        tokens: Vec::new(),
        interval: Duration::from_secs(20),
        refresh_interval: Duration::from_secs(300),
        cycle_timeout: Duration::from_secs(60),
        top_n: 50,
        fetch: FetchSettings {
            deadline: Duration::from_secs(30),
            retry: RetryPolicy::exponential(2, Duration::from_millis(10)),
            max_concurrent: 2,
            jitter_min_ms: 0,
            jitter_max_ms: 0,
        },
    }
}

fn build(
    settings: MonitorSettings,
    balances: Arc<StubBalances>,
    oracle: Arc<StubOracle>,
    observer: Arc<RecordingObserver>
) -> Monitor {
    let metadata = Arc::new(TokenMetadataCache::new(CacheConfig::custom(60, 100)));
    let pricing = PricingConfig {
        batch_delay_ms: 0,
        ..PricingConfig::default()
    };
    let prices = PriceService::new(oracle, &pricing)
        .with_retry(RetryPolicy::exponential(2, Duration::from_millis(10)))
        .with_metadata_cache(metadata.clone());

    Monitor::new(
        settings,
        AlertEngine::new(&AlertsConfig::default()),
        balances,
        prices,
        metadata,
        observer
    )
}

#[tokio::test(start_paused = true)]
async fn test_bootstrap_aggregates_wallets_and_reports() {
    let balances = Arc::new(StubBalances::new(&[("X", 50.0), ("Y", 1.0)]));
    let oracle = Arc::new(StubOracle::new(&[("X", 1.0), ("Y", 10.0)]));
    let observer = Arc::new(RecordingObserver::default());

    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("monitor.csv");
    let mut monitor = build(settings(), balances, oracle, observer.clone()).with_csv_sink(
        CsvSink::open(&csv_path).unwrap()
    );

    let report = monitor.bootstrap(&ShutdownSignal::new()).await.unwrap();
    assert_eq!(monitor.state(), MonitorState::Idle);
    assert_eq!(monitor.tracked().len(), 2);
    assert_eq!(report.valued, 2);
    // Two wallets hold 50 X and 1 Y each
    assert_eq!(report.total_value, 100.0 + 20.0);
    assert!(report.status.is_none());

    let updates = observer.updates.lock();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0][0].mint, "X");
    assert_eq!(updates[0][0].amount, 100.0);

    let mut reader = csv::Reader::from_path(&csv_path).unwrap();
    assert_eq!(reader.records().count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_value_alert_flows_to_sinks_and_observer() {
    let balances = Arc::new(StubBalances::new(&[("X", 50.0)]));
    let oracle = Arc::new(StubOracle::new(&[("X", 1.0)]));
    let observer = Arc::new(RecordingObserver::default());

    let dir = tempfile::tempdir().unwrap();
    let alert_path = dir.path().join("alert.log");
    let mut monitor = build(settings(), balances, oracle.clone(), observer.clone()).with_alert_log(
        AlertLogSink::open(&alert_path).unwrap()
    );
    monitor.bootstrap(&ShutdownSignal::new()).await.unwrap();

    let t0 = Utc::now();
    monitor.run_cycle(t0).await.unwrap();
    oracle.set("X", 1.06);
    let report = monitor.run_cycle(t0 + chrono::Duration::seconds(31)).await.unwrap();

    // Price and value both move 6% over the 30 s window
    assert_eq!(report.alerts.len(), 2);
    assert!(report.alerts.iter().all(|a| a.window == Duration::from_secs(30)));
    assert!(report.alerts.iter().any(|a| a.kind == AlertKind::Value));
    assert!(report.status.is_some());

    assert_eq!(observer.alerts.lock().len(), 2);
    assert_eq!(monitor.alert_engine().alert_log().len(), 2);
    let logged = std::fs::read_to_string(&alert_path).unwrap();
    assert_eq!(logged.lines().count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_no_quotes_fails_cycle_without_output() {
    let balances = Arc::new(StubBalances::new(&[("X", 50.0)]));
    let oracle = Arc::new(StubOracle::new(&[]));
    let observer = Arc::new(RecordingObserver::default());
    let mut monitor = build(settings(), balances, oracle, observer.clone());

    let err = monitor.bootstrap(&ShutdownSignal::new()).await.unwrap_err();
    assert!(matches!(err, MonitorError::NoQuotes { requested: 1 }));
    assert_eq!(monitor.state(), MonitorState::Idle);
    assert_eq!(monitor.tracked().len(), 1);
    assert!(observer.updates.lock().is_empty());
    assert!(observer.statuses.lock().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_stalled_oracle_ends_cycle_within_timeout() {
    let balances = Arc::new(StubBalances::new(&[("X", 50.0)]));
    let mut oracle = StubOracle::new(&[("X", 1.0)]);
    oracle.stall = Some(Duration::from_secs(120));
    let observer = Arc::new(RecordingObserver::default());
    let mut monitor = build(settings(), balances, Arc::new(oracle), observer.clone());
    monitor.replace_tracked(vec![Holding::unpriced("X", 1.0, 6, "X", "X")]);

    let started = Instant::now();
    let err = monitor.run_cycle(Utc::now()).await.unwrap_err();
    // Pricing gives up before the cycle deadline, leaving headroom
    assert!(matches!(err, MonitorError::NoQuotes { requested: 1 }));
    let elapsed = Instant::now() - started;
    assert!(elapsed >= Duration::from_secs(58) && elapsed < Duration::from_secs(60));
    assert_eq!(monitor.state(), MonitorState::Idle);
    assert!(observer.updates.lock().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_run_ticks_refreshes_and_shuts_down() {
    let balances = Arc::new(StubBalances::new(&[("X", 1.0)]));
    let oracle = Arc::new(StubOracle::new(&[("X", 2.0), ("Z", 3.0)]));
    let observer = Arc::new(RecordingObserver::default());

    let mut config = settings();
    config.refresh_interval = Duration::from_secs(50);
    let mut monitor = build(config, balances.clone(), oracle, observer.clone());
    monitor.bootstrap(&ShutdownSignal::new()).await.unwrap();
    assert_eq!(observer.updates.lock().len(), 1);

    // The refresh at t=50 picks up a new token
    balances.set(&[("X", 1.0), ("Z", 1.0)]);

    let shutdown = Arc::new(ShutdownSignal::new());
    let signal = shutdown.clone();
    let handle = tokio::spawn(async move {
        let result = monitor.run(signal).await;
        (monitor, result)
    });

    tokio::time::sleep(Duration::from_secs(65)).await;
    shutdown.trigger();
    let (monitor, result) = handle.await.unwrap();
    result.unwrap();

    assert_eq!(monitor.state(), MonitorState::ShuttingDown);
    assert_eq!(monitor.tracked().len(), 2);

    let updates = observer.updates.lock();
    // Bootstrap plus ticks at 20, 40 and 60 s
    assert_eq!(updates.len(), 4);
    assert_eq!(updates[2].len(), 1);
    assert_eq!(updates[3].len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_slow_failing_batch_does_not_fail_cycle() {
    for order in [["A", "B"], ["B", "A"]] {
        let balances = Arc::new(StubBalances::new(&[]));
        let mut oracle = StubOracle::new(&[("A", 2.0), ("B", 3.0)]);
        oracle.slow_failure = Some(("B".to_string(), Duration::from_secs(30)));
        let observer = Arc::new(RecordingObserver::default());

        // Production pricing defaults: 5 attempts, 2 s backoff base
        let metadata = Arc::new(TokenMetadataCache::new(CacheConfig::custom(60, 100)));
        let pricing = PricingConfig {
            batch_size: 1,
            batch_delay_ms: 0,
            ..PricingConfig::default()
        };
        let prices = PriceService::new(Arc::new(oracle), &pricing);
        let mut monitor = Monitor::new(
            settings(),
            AlertEngine::new(&AlertsConfig::default()),
            balances,
            prices,
            metadata,
            observer.clone()
        );
        monitor.replace_tracked(
            order
                .iter()
                .map(|m| Holding::unpriced(m, 1.0, 6, m, m))
                .collect()
        );

        let started = Instant::now();
        let report = monitor.run_cycle(Utc::now()).await.unwrap();
        assert!(Instant::now() - started < Duration::from_secs(60));
        assert_eq!(report.valued, 1);
        assert_eq!(report.total_value, 2.0);
        assert_eq!(observer.updates.lock()[0][0].mint, "A");
        assert_eq!(monitor.state(), MonitorState::Idle);
    }
}

#[tokio::test(start_paused = true)]
async fn test_balance_refresh_prunes_baseline() {
    let balances = Arc::new(StubBalances::new(&[("X", 1.0), ("Y", 1.0)]));
    let oracle = Arc::new(StubOracle::new(&[("X", 2.0), ("Y", 3.0)]));
    let observer = Arc::new(RecordingObserver::default());
    let mut monitor = build(settings(), balances, oracle, observer);

    monitor.bootstrap(&ShutdownSignal::new()).await.unwrap();
    assert_eq!(monitor.baseline().len(), 2);

    monitor.replace_tracked(vec![Holding::unpriced("X", 2.0, 6, "X", "X")]);
    assert_eq!(monitor.baseline().len(), 1);
    assert!(monitor.baseline().previous("X").is_some());
    assert!(monitor.baseline().previous("Y").is_none());
}
