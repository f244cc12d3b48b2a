//! Special logging helpers for portfolio movements

use super::tags::LogTag;
use crate::logger;
use colored::*;
use std::time::Duration;

/// Log a price/value move of one holding over a lookback window.
///
/// Direction is colored; the message is routed through the normal filters at
/// info level so it lands in the log file as well.
pub fn log_value_change(
    symbol: &str,
    mint: &str,
    window: Duration,
    price_change_percent: f64,
    value_change_percent: f64,
    current_price: f64,
    previous_price: f64,
) {
    let colorize = |pct: f64| {
        let text = format!("{:+.2}%", pct);
        if pct > 0.0 {
            text.green().bold()
        } else if pct < 0.0 {
            text.red().bold()
        } else {
            text.white().bold()
        }
    };

    logger::info(
        LogTag::Alerts,
        &format!(
            "{} ({}) over {}s: price {} (${:.8} -> ${:.8}), value {}",
            symbol.bold(),
            short_mint(mint),
            window.as_secs(),
            colorize(price_change_percent),
            previous_price,
            current_price,
            colorize(value_change_percent)
        ),
    );
}

/// First 8 characters of a mint for compact log lines
pub fn short_mint(mint: &str) -> &str {
    match mint.char_indices().nth(8) {
        Some((idx, _)) => &mint[..idx],
        None => mint,
    }
}
