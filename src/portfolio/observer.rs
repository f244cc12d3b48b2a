use super::types::{AlertEvent, Holding, StatusLine};

/// Receives monitor output once per tick
pub trait PortfolioObserver: Send + Sync {
    /// Ranked, valued holdings of the current tick
    fn on_update(&self, holdings: &[Holding]);

    fn on_alert(&self, _event: &AlertEvent) {}

    fn on_status(&self, _status: &StatusLine) {}
}
