use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Notify;

/// Process-wide stop request shared by the scheduler and its workers.
///
/// The flag makes the request sticky: a task that starts waiting after
/// `trigger` was called still sees it.
#[derive(Debug, Default)]
pub struct ShutdownSignal {
    triggered: AtomicBool,
    notify: Notify,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.triggered.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }

    /// Resolves once shutdown has been requested
    pub async fn cancelled(&self) {
        loop {
            let notified = self.notify.notified();
            if self.is_triggered() {
                return;
            }
            notified.await;
        }
    }
}

/// Waits for either shutdown signal or delay. Returns true if shutdown was triggered.
pub async fn check_shutdown_or_delay(shutdown: &ShutdownSignal, duration: Duration) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(duration) => shutdown.is_triggered(),
        _ = shutdown.cancelled() => true,
    }
}

/// Random delay in `[min_ms, max_ms]` used to spread out upstream requests
pub fn random_jitter(min_ms: u64, max_ms: u64) -> Duration {
    if max_ms <= min_ms {
        return Duration::from_millis(min_ms);
    }
    Duration::from_millis(rand::thread_rng().gen_range(min_ms..=max_ms))
}

/// Shorten an address for display: first 4 and last 4 characters
pub fn format_address_short(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 12 {
        return address.to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// USD amount with thousands separators and two decimals
pub fn format_usd(value: f64) -> String {
    let negative = value < 0.0;
    let cents = (value.abs() * 100.0).round() as u128;
    let whole = (cents / 100).to_string();
    let frac = cents % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}${}.{:02}", if negative { "-" } else { "" }, grouped, frac)
}

/// Token amount with precision scaled to magnitude
pub fn format_amount(amount: f64) -> String {
    if amount == 0.0 {
        "0".to_string()
    } else if amount.abs() >= 1_000.0 {
        format!("{:.2}", amount)
    } else if amount.abs() >= 1.0 {
        format!("{:.4}", amount)
    } else {
        format!("{:.8}", amount)
    }
}

/// Price with enough significant digits for sub-cent tokens
pub fn format_price(price: f64) -> String {
    if price >= 1.0 {
        format!("${:.4}", price)
    } else if price >= 0.0001 {
        format!("${:.6}", price)
    } else {
        format!("${:.10}", price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_formatting() {
        assert_eq!(format_usd(1234567.891), "$1,234,567.89");
        assert_eq!(format_usd(0.5), "$0.50");
        assert_eq!(format_usd(-42.0), "-$42.00");
        assert_eq!(format_address_short("9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM"), "9WzD...AWWM");
        assert_eq!(format_amount(0.0), "0");
        assert_eq!(format_price(150.0), "$150.0000");
    }

    #[test]
    fn test_jitter_bounds() {
        for _ in 0..50 {
            let d = random_jitter(500, 1500);
            assert!(d >= Duration::from_millis(500) && d <= Duration::from_millis(1500));
        }
        assert_eq!(random_jitter(700, 100), Duration::from_millis(700));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_interrupts_delay() {
        let signal = Arc::new(ShutdownSignal::new());
        let waiter = signal.clone();
        let handle = tokio::spawn(async move {
            check_shutdown_or_delay(&waiter, Duration::from_secs(3600)).await
        });

        tokio::task::yield_now().await;
        signal.trigger();
        assert!(handle.await.unwrap());

        // Sticky: later waiters return immediately
        signal.cancelled().await;
        assert!(check_shutdown_or_delay(&signal, Duration::from_secs(3600)).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_elapses_without_shutdown() {
        let signal = ShutdownSignal::new();
        assert!(!check_shutdown_or_delay(&signal, Duration::from_millis(10)).await);
    }
}
