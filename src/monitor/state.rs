use crate::portfolio::{AlertEvent, StatusLine};
use chrono::{DateTime, Utc};
use std::fmt;

/// Scheduler lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Idle,
    /// A cycle is pricing and valuing
    Polling,
    ShuttingDown,
}

impl fmt::Display for MonitorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorState::Idle => write!(f, "idle"),
            MonitorState::Polling => write!(f, "polling"),
            MonitorState::ShuttingDown => write!(f, "shutting down"),
        }
    }
}

/// Outcome of one completed cycle
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub cycle: u64,
    pub timestamp: DateTime<Utc>,
    /// Holdings that made it into the ranked output
    pub valued: usize,
    pub total_value: f64,
    pub alerts: Vec<AlertEvent>,
    /// None for the first recorded snapshot
    pub status: Option<StatusLine>,
}
