/// Multi-window alert engine
///
/// Each tick the current snapshot is compared, per holding and per window,
/// against the newest historical snapshot whose age falls inside
/// `[window, window + tolerance]`. Price and value moves are judged
/// independently against one percentage threshold.
use super::history::SnapshotHistory;
use super::types::{AlertEvent, AlertKind, Holding, StatusLine, ValuationSnapshot};
use crate::config::AlertsConfig;
use crate::logger::{self, log_value_change, LogTag};
use std::time::Duration;

pub struct AlertEngine {
    history: SnapshotHistory,
    windows: Vec<Duration>,
    tolerance: Duration,
    threshold_percent: f64,
    log_change_percent: f64,
    log: Vec<AlertEvent>,
}

fn percent_change(before: f64, after: f64) -> Option<f64> {
    if before <= 0.0 {
        return None;
    }
    let change = ((after - before) / before) * 100.0;
    change.is_finite().then_some(change)
}

impl AlertEngine {
    pub fn new(config: &AlertsConfig) -> Self {
        Self {
            history: SnapshotHistory::new(config.history_capacity),
            windows: config.windows(),
            tolerance: config.tolerance(),
            threshold_percent: config.threshold_percent,
            log_change_percent: config.log_change_percent,
            log: Vec::new(),
        }
    }

    /// Append a snapshot; empty or worthless snapshots are ignored
    pub fn record(&mut self, snapshot: ValuationSnapshot) -> bool {
        if !snapshot.has_valid_holdings() {
            logger::debug(LogTag::Alerts, "Skipping snapshot without valued holdings");
            return false;
        }
        self.history.push(snapshot);
        true
    }

    /// Alerts for `current` against history. Does not modify the alert log.
    pub fn evaluate(&self, current: &ValuationSnapshot) -> Vec<AlertEvent> {
        let mut events = Vec::new();

        let mut holdings: Vec<&Holding> = current.holdings
            .values()
            .filter(|h| h.value > 0.0)
            .collect();
        // Stable event order across runs
        holdings.sort_by(|a, b| b.value.total_cmp(&a.value).then_with(|| a.mint.cmp(&b.mint)));

        for holding in holdings {
            for window in &self.windows {
                let Some(past) = self.history.find_in_window(current.timestamp, *window, self.tolerance) else {
                    continue;
                };
                let Some(previous) = past.holding(&holding.mint).filter(|p| p.value > 0.0) else {
                    continue;
                };

                let price_change = percent_change(previous.price, holding.price);
                let value_change = percent_change(previous.value, holding.value);

                let notable = |change: Option<f64>| change.map_or(false, |c| c.abs() > self.log_change_percent);
                if notable(price_change) || notable(value_change) {
                    log_value_change(
                        holding.display_symbol(),
                        &holding.mint,
                        *window,
                        price_change.unwrap_or(0.0),
                        value_change.unwrap_or(0.0),
                        holding.price,
                        previous.price
                    );
                }

                if let Some(change) = price_change.filter(|c| c.abs() >= self.threshold_percent) {
                    events.push(self.event(AlertKind::Price, holding, *window, change, previous.price, holding.price, current));
                }
                if let Some(change) = value_change.filter(|c| c.abs() >= self.threshold_percent) {
                    events.push(self.event(AlertKind::Value, holding, *window, change, previous.value, holding.value, current));
                }
            }
        }

        events
    }

    #[allow(clippy::too_many_arguments)]
    fn event(
        &self,
        kind: AlertKind,
        holding: &Holding,
        window: Duration,
        change_percent: f64,
        before_value: f64,
        after_value: f64,
        current: &ValuationSnapshot
    ) -> AlertEvent {
        AlertEvent {
            kind,
            mint: holding.mint.clone(),
            symbol: holding.display_symbol().to_string(),
            window,
            change_percent,
            threshold_percent: self.threshold_percent,
            before_value,
            after_value,
            timestamp: current.timestamp,
        }
    }

    /// Record, evaluate, and append the resulting events to the alert log
    pub fn tick(&mut self, snapshot: ValuationSnapshot) -> Vec<AlertEvent> {
        let events = self.evaluate(&snapshot);
        self.record(snapshot);

        for event in &events {
            logger::warning(LogTag::Alerts, &event.message());
        }
        self.log.extend(events.iter().cloned());
        events
    }

    /// Portfolio total against the newest recorded snapshot older than `current`
    pub fn status_line(&self, current: &ValuationSnapshot) -> Option<StatusLine> {
        let previous = self.history
            .iter_newest_first()
            .find(|s| s.timestamp < current.timestamp)?;

        let interval_secs = ((current.timestamp - previous.timestamp).num_milliseconds() as f64) / 1000.0;
        let change_percent = percent_change(previous.total_value, current.total_value).unwrap_or(0.0);
        let change_rate_per_sec = if interval_secs > 0.0 { change_percent / interval_secs } else { 0.0 };

        Some(StatusLine {
            timestamp: current.timestamp,
            total_value: current.total_value,
            change_percent,
            change_rate_per_sec,
            interval_secs,
        })
    }

    pub fn alert_log(&self) -> &[AlertEvent] {
        &self.log
    }

    pub fn history(&self) -> &SnapshotHistory {
        &self.history
    }
}
