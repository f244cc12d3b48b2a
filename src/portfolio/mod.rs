//! Portfolio valuation, history and alerting
//!
//! Pure, single-owner state: the monitor driver owns the baseline and the
//! alert engine and passes them by reference into each tick.

pub mod alerts;
pub mod display;
pub mod history;
pub mod observer;
pub mod types;
pub mod valuation;

pub use alerts::AlertEngine;
pub use display::{aggregate_by_symbol, render_report, ConsoleObserver, ReportVerbosity};
pub use history::SnapshotHistory;
pub use observer::PortfolioObserver;
pub use types::{AlertEvent, AlertKind, Holding, StatusLine, ValuationSnapshot};
pub use valuation::{change_rate, value_holdings, ValuationBaseline};
