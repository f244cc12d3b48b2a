/// Console portfolio report
///
/// Ranked holdings table with a total row, plus a per-symbol summary.
use super::observer::PortfolioObserver;
use super::types::{AlertEvent, Holding, StatusLine};
use crate::utils::{format_amount, format_price, format_usd};
use chrono::{DateTime, Local, Utc};
use colored::*;
use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, Table};
use std::collections::HashMap;

/// Render the ranked holdings table
pub fn render_report(holdings: &[Holding], now: DateTime<Utc>) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(["#", "Symbol", "Amount", "Value", "Confidence", "Mint", "Price"]);

    let mut total = 0.0;
    for (index, holding) in holdings.iter().enumerate() {
        total += holding.value;
        table.add_row([
            Cell::new(index + 1),
            Cell::new(holding.display_symbol()),
            Cell::new(format_amount(holding.amount)).set_alignment(CellAlignment::Right),
            Cell::new(format_usd(holding.value)).set_alignment(CellAlignment::Right),
            Cell::new(holding.confidence.as_str()),
            Cell::new(&holding.mint),
            Cell::new(format_price(holding.price)).set_alignment(CellAlignment::Right),
        ]);
    }

    table.add_row([
        Cell::new(""),
        Cell::new("TOTAL"),
        Cell::new(""),
        Cell::new(format_usd(total)).set_alignment(CellAlignment::Right),
        Cell::new(""),
        Cell::new(""),
        Cell::new(""),
    ]);

    format!(
        "Portfolio report {} ({} tokens)\n{}",
        now.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S"),
        holdings.len(),
        table
    )
}

/// Total value per display symbol, highest first
pub fn aggregate_by_symbol(holdings: &[Holding]) -> Vec<(String, f64)> {
    let mut totals: HashMap<String, f64> = HashMap::new();
    for holding in holdings {
        *totals.entry(holding.display_symbol().to_string()).or_insert(0.0) += holding.value;
    }

    let mut sorted: Vec<(String, f64)> = totals.into_iter().collect();
    sorted.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    sorted
}

pub fn render_symbol_summary(holdings: &[Holding]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(["Symbol", "Value"]);
    for (symbol, value) in aggregate_by_symbol(holdings) {
        table.add_row([Cell::new(symbol), Cell::new(format_usd(value)).set_alignment(CellAlignment::Right)]);
    }
    table.to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportVerbosity {
    /// Full table every tick
    Full,
    /// Per-symbol totals, status line and alerts
    Summary,
    Silent,
}

/// Prints reports to stdout
pub struct ConsoleObserver {
    verbosity: ReportVerbosity,
}

impl ConsoleObserver {
    pub fn new(verbosity: ReportVerbosity) -> Self {
        Self { verbosity }
    }
}

impl PortfolioObserver for ConsoleObserver {
    fn on_update(&self, holdings: &[Holding]) {
        match self.verbosity {
            ReportVerbosity::Full => println!("{}", render_report(holdings, Utc::now())),
            ReportVerbosity::Summary => println!("{}", render_symbol_summary(holdings)),
            ReportVerbosity::Silent => {}
        }
    }

    fn on_alert(&self, event: &AlertEvent) {
        if self.verbosity != ReportVerbosity::Silent {
            println!("{} {}", "ALERT".red().bold(), event.message());
        }
    }

    fn on_status(&self, status: &StatusLine) {
        if self.verbosity == ReportVerbosity::Silent {
            return;
        }
        let line = status.to_string();
        if status.change_percent > 0.0 {
            println!("{}", line.green());
        } else if status.change_percent < 0.0 {
            println!("{}", line.red());
        } else {
            println!("{}", line);
        }
    }
}
