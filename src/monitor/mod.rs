//! Polling scheduler
//!
//! The `Monitor` owns all hot-path state (tracked holdings, valuation baseline,
//! alert engine, sinks) and drives one cycle per interval tick:
//!
//! price -> value -> snapshot -> alerts -> sinks/observer
//!
//! Balance re-acquisition runs in a separate task at a slower cadence and hands
//! the new holding set back over a channel; that task never touches monitor state.

mod state;

#[cfg(test)]
mod tests;

pub use state::{CycleReport, MonitorState};

use crate::cache::TokenMetadataCache;
use crate::config::{Config, TokenEntry};
use crate::errors::{MonitorError, MonitorResult};
use crate::logger::{self, LogTag};
use crate::portfolio::{
    value_holdings,
    AlertEngine,
    Holding,
    PortfolioObserver,
    ValuationBaseline,
    ValuationSnapshot,
};
use crate::pricing::PriceService;
use crate::reports::{AlertLogSink, CsvSink};
use crate::retry::with_deadline;
use crate::utils::{check_shutdown_or_delay, format_usd, ShutdownSignal};
use crate::wallet::{acquire_holdings, BalanceSource, FetchSettings};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};

/// Part of the cycle deadline kept free for valuation and sink writes
const PRICING_HEADROOM: Duration = Duration::from_secs(2);

/// Scheduler parameters, resolved from the config file and CLI
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    pub wallets: Vec<String>,
    pub tokens: Vec<TokenEntry>,
    pub interval: Duration,
    pub refresh_interval: Duration,
    pub cycle_timeout: Duration,
    pub top_n: usize,
    pub fetch: FetchSettings,
}

impl MonitorSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            wallets: config.wallet_addresses(),
            tokens: config.tokens.clone(),
            interval: config.monitor.interval(),
            refresh_interval: config.monitor.refresh_interval(),
            cycle_timeout: config.monitor.cycle_timeout(),
            top_n: config.valuation.top_n,
            fetch: FetchSettings::from(&config.sources),
        }
    }
}

/// Everything the background refresh task needs, cloned off the monitor
struct RefreshTask {
    balances: Arc<dyn BalanceSource>,
    metadata: Arc<TokenMetadataCache>,
    wallets: Vec<String>,
    tokens: Vec<TokenEntry>,
    fetch: FetchSettings,
    interval: Duration,
}

impl RefreshTask {
    /// First acquisition happens one interval after start
    async fn run(self, shutdown: Arc<ShutdownSignal>, updates: mpsc::Sender<Vec<Holding>>) {
        logger::debug(
            LogTag::Monitor,
            &format!("Balance refresh task started (every {}s)", self.interval.as_secs())
        );

        loop {
            if check_shutdown_or_delay(&shutdown, self.interval).await {
                break;
            }

            let result = acquire_holdings(
                self.balances.clone(),
                &self.wallets,
                &self.fetch,
                &self.metadata,
                &self.tokens,
                &shutdown
            ).await;

            match result {
                Ok(holdings) => {
                    if updates.send(holdings).await.is_err() {
                        break;
                    }
                }
                Err(MonitorError::Cancelled) => {
                    break;
                }
                Err(e) => {
                    logger::error(
                        LogTag::Wallet,
                        &format!("Balance refresh failed, keeping previous holdings: {}", e)
                    );
                }
            }
        }

        logger::debug(LogTag::Monitor, "Balance refresh task stopped");
    }
}

pub struct Monitor {
    settings: MonitorSettings,
    balances: Arc<dyn BalanceSource>,
    prices: PriceService,
    metadata: Arc<TokenMetadataCache>,
    observer: Arc<dyn PortfolioObserver>,
    tracked: Vec<Holding>,
    baseline: ValuationBaseline,
    alerts: AlertEngine,
    csv: Option<CsvSink>,
    alert_log: Option<AlertLogSink>,
    state: MonitorState,
    cycle: u64,
}

impl Monitor {
    pub fn new(
        settings: MonitorSettings,
        alerts: AlertEngine,
        balances: Arc<dyn BalanceSource>,
        prices: PriceService,
        metadata: Arc<TokenMetadataCache>,
        observer: Arc<dyn PortfolioObserver>
    ) -> Self {
        metadata.seed(&settings.tokens);
        Self {
            settings,
            balances,
            prices,
            metadata,
            observer,
            tracked: Vec::new(),
            baseline: ValuationBaseline::new(),
            alerts,
            csv: None,
            alert_log: None,
            state: MonitorState::Idle,
            cycle: 0,
        }
    }

    pub fn with_csv_sink(mut self, sink: CsvSink) -> Self {
        self.csv = Some(sink);
        self
    }

    pub fn with_alert_log(mut self, sink: AlertLogSink) -> Self {
        self.alert_log = Some(sink);
        self
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn tracked(&self) -> &[Holding] {
        &self.tracked
    }

    pub fn alert_engine(&self) -> &AlertEngine {
        &self.alerts
    }

    pub fn baseline(&self) -> &ValuationBaseline {
        &self.baseline
    }

    /// Swap in a new tracked set; baseline entries of dropped mints go with it
    pub fn replace_tracked(&mut self, holdings: Vec<Holding>) {
        if holdings.len() != self.tracked.len() {
            logger::info(
                LogTag::Monitor,
                &format!("Tracked token set changed: {} -> {}", self.tracked.len(), holdings.len())
            );
        }
        self.baseline.retain_mints(holdings.iter().map(|h| h.mint.as_str()));
        self.tracked = holdings;
    }

    /// Initial acquisition and first valuation. The acquired set becomes the
    /// tracked set.
    pub async fn bootstrap(&mut self, shutdown: &ShutdownSignal) -> MonitorResult<CycleReport> {
        logger::info(
            LogTag::Monitor,
            &format!("Bootstrapping {} wallets", self.settings.wallets.len())
        );

        let holdings = acquire_holdings(
            self.balances.clone(),
            &self.settings.wallets,
            &self.settings.fetch,
            &self.metadata,
            &self.settings.tokens,
            shutdown
        ).await?;
        self.replace_tracked(holdings);

        self.run_cycle(Utc::now()).await
    }

    /// One bounded tick. The state is back to `Idle` afterwards, whatever the outcome.
    pub async fn run_cycle(&mut self, now: DateTime<Utc>) -> MonitorResult<CycleReport> {
        self.state = MonitorState::Polling;
        self.cycle += 1;
        let timeout = self.settings.cycle_timeout;
        let pricing_deadline =
            Instant::now() + timeout.saturating_sub(PRICING_HEADROOM.min(timeout / 4));

        let result = with_deadline(timeout, self.execute_cycle(now, pricing_deadline)).await;

        self.state = MonitorState::Idle;
        result
    }

    async fn execute_cycle(
        &mut self,
        now: DateTime<Utc>,
        pricing_deadline: Instant
    ) -> MonitorResult<CycleReport> {
        let started = std::time::Instant::now();

        if self.tracked.is_empty() {
            logger::warning(LogTag::Monitor, "No tracked holdings, nothing to price");
            return Ok(CycleReport {
                cycle: self.cycle,
                timestamp: now,
                valued: 0,
                total_value: 0.0,
                alerts: Vec::new(),
                status: None,
            });
        }

        let mints: Vec<String> = self.tracked
            .iter()
            .map(|h| h.mint.clone())
            .collect();
        let quotes = self.prices.get_prices_within(&mints, Some(pricing_deadline)).await?;

        let valued = value_holdings(&self.tracked, &quotes, &mut self.baseline, now, self.settings.top_n);
        let snapshot = ValuationSnapshot::from_holdings(now, &valued);
        let total_value = snapshot.total_value;

        let status = self.alerts.status_line(&snapshot);
        let events = self.alerts.tick(snapshot);

        for event in &events {
            if let Some(sink) = self.alert_log.as_mut() {
                if let Err(e) = sink.write_event(event) {
                    logger::error(LogTag::Reports, &format!("Failed to write alert log: {}", e));
                }
            }
            self.observer.on_alert(event);
        }

        self.observer.on_update(&valued);
        if let Some(status) = &status {
            logger::info(LogTag::Valuation, &status.to_string());
            self.observer.on_status(status);
        }

        if let Some(sink) = self.csv.as_mut() {
            if let Err(e) = sink.write_holdings(&valued, now) {
                logger::error(LogTag::Reports, &format!("Failed to write CSV report: {}", e));
            }
        }

        logger::info(
            LogTag::Monitor,
            &format!(
                "Cycle #{} completed: {}/{} tokens valued, total {}, {} alerts in {}ms",
                self.cycle,
                valued.len(),
                self.tracked.len(),
                format_usd(total_value),
                events.len(),
                started.elapsed().as_millis()
            )
        );

        Ok(CycleReport {
            cycle: self.cycle,
            timestamp: now,
            valued: valued.len(),
            total_value,
            alerts: events,
            status,
        })
    }

    /// Drive cycles until shutdown. Call after `bootstrap`; the first tick
    /// fires one interval from now.
    pub async fn run(&mut self, shutdown: Arc<ShutdownSignal>) -> MonitorResult<()> {
        let (updates_tx, mut updates_rx) = mpsc::channel::<Vec<Holding>>(4);
        let refresh = RefreshTask {
            balances: self.balances.clone(),
            metadata: self.metadata.clone(),
            wallets: self.settings.wallets.clone(),
            tokens: self.settings.tokens.clone(),
            fetch: self.settings.fetch.clone(),
            interval: self.settings.refresh_interval,
        };
        let refresh_handle = tokio::spawn(refresh.run(shutdown.clone(), updates_tx));

        let mut ticker = tokio::time::interval(self.settings.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // Consume the immediate first tick
        ticker.tick().await;

        logger::info(
            LogTag::Monitor,
            &format!(
                "Monitoring {} tokens every {}s (balance refresh every {}s)",
                self.tracked.len(),
                self.settings.interval.as_secs(),
                self.settings.refresh_interval.as_secs()
            )
        );

        let mut outcome = Ok(());
        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                Some(holdings) = updates_rx.recv() => {
                    self.replace_tracked(holdings);
                }
                _ = ticker.tick() => {
                    if shutdown.is_triggered() {
                        break;
                    }
                    let cycle = tokio::select! {
                        biased;
                        _ = shutdown.cancelled() => None,
                        result = self.run_cycle(Utc::now()) => Some(result),
                    };
                    match cycle {
                        None => break,
                        Some(Ok(_)) => {}
                        Some(Err(e)) if e.is_critical() => {
                            logger::error(LogTag::Monitor, &format!("Stopping monitor: {}", e));
                            outcome = Err(e);
                            break;
                        }
                        Some(Err(e)) => {
                            logger::error(LogTag::Monitor, &format!("Cycle #{} failed: {}", self.cycle, e));
                        }
                    }
                }
            }
        }

        self.state = MonitorState::ShuttingDown;
        logger::info(LogTag::Monitor, "Monitor shutting down...");

        drop(updates_rx);
        let refresh_abort = refresh_handle.abort_handle();
        if tokio::time::timeout(Duration::from_secs(5), refresh_handle).await.is_err() {
            logger::warning(LogTag::Monitor, "Balance refresh task did not stop in time, aborting");
            refresh_abort.abort();
        }

        self.flush_sinks();
        outcome
    }

    pub fn flush_sinks(&mut self) {
        if let Some(sink) = self.csv.as_mut() {
            if let Err(e) = sink.flush() {
                logger::error(LogTag::Reports, &format!("Failed to flush CSV report: {}", e));
            }
        }
        if let Some(sink) = self.alert_log.as_mut() {
            if let Err(e) = sink.flush() {
                logger::error(LogTag::Reports, &format!("Failed to flush alert log: {}", e));
            }
        }
    }
}
