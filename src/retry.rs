/// Bounded retry with exponential backoff
///
/// One policy type shared by balance acquisition and price lookup. An attempt
/// is repeated when it fails with a recoverable error or when it succeeds but
/// the caller's `is_done` predicate rejects the result (for example an empty
/// price batch). Non-recoverable errors end the loop immediately.
use crate::errors::{MonitorError, MonitorResult};
use crate::logger::{self, LogTag};
use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub factor: f64,
}

impl RetryPolicy {
    /// Doubling backoff
    pub fn exponential(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            factor: 2.0,
        }
    }

    /// Delay after the given failed attempt (1-based): `base * factor^(attempt-1)`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        self.base_delay.mul_f64(self.factor.powi(exponent))
    }

    /// Run `operation` until `is_done` accepts a result or attempts run out.
    ///
    /// Returns the last result: an accepted value, the last non-accepted value,
    /// or the last error.
    pub async fn run<T, F, Fut, P>(
        &self,
        tag: LogTag,
        label: &str,
        mut operation: F,
        is_done: P
    ) -> MonitorResult<T>
        where F: FnMut(u32) -> Fut, Fut: Future<Output = MonitorResult<T>>, P: Fn(&T) -> bool
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            let result = operation(attempt).await;

            let retry_reason = match &result {
                Ok(value) if is_done(value) => {
                    if attempt > 1 {
                        logger::debug(tag.clone(), &format!("{} succeeded on attempt {}", label, attempt));
                    }
                    return result;
                }
                Ok(_) => "empty result".to_string(),
                Err(e) if !e.is_recoverable() => {
                    return result;
                }
                Err(e) => e.to_string(),
            };

            if attempt >= max_attempts {
                logger::warning(
                    tag,
                    &format!("{} gave up after {} attempts: {}", label, attempt, retry_reason)
                );
                return result;
            }

            let delay = self.delay_for(attempt);
            logger::debug(
                tag.clone(),
                &format!(
                    "{} attempt {}/{} failed ({}), retrying in {}ms",
                    label,
                    attempt,
                    max_attempts,
                    retry_reason,
                    delay.as_millis()
                )
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// `run` without a result predicate: any `Ok` ends the loop
    pub async fn run_until_ok<T, F, Fut>(&self, tag: LogTag, label: &str, operation: F) -> MonitorResult<T>
        where F: FnMut(u32) -> Fut, Fut: Future<Output = MonitorResult<T>>
    {
        self.run(tag, label, operation, |_| true).await
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::exponential(3, Duration::from_secs(1))
    }
}

/// Timeout helper mapping elapsed deadlines to `MonitorError::Timeout`
pub async fn with_deadline<T, Fut>(deadline: Duration, future: Fut) -> MonitorResult<T>
    where Fut: Future<Output = MonitorResult<T>>
{
    match tokio::time::timeout(deadline, future).await {
        Ok(result) => result,
        Err(_) => Err(MonitorError::Timeout { seconds: deadline.as_secs() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_backoff_schedule() {
        let policy = RetryPolicy::exponential(5, Duration::from_secs(2));
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
        assert_eq!(policy.delay_for(4), Duration::from_secs(16));
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_transient_errors() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::exponential(3, Duration::from_millis(10));

        let result = policy.run_until_ok(LogTag::Sources, "fetch", |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 3 { Err(MonitorError::Network("reset".into())) } else { Ok(attempt) }
            }
        }).await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_returns_last_error() {
        let policy = RetryPolicy::exponential(2, Duration::from_millis(10));
        let result: MonitorResult<()> = policy.run_until_ok(LogTag::Pricing, "batch", |_| async {
            Err(MonitorError::Http { status: 503, endpoint: "/price".into() })
        }).await;
        assert!(matches!(result, Err(MonitorError::Http { status: 503, .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_recoverable_stops_immediately() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::exponential(5, Duration::from_millis(10));
        let result: MonitorResult<()> = policy.run_until_ok(LogTag::Pricing, "batch", |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(MonitorError::Parse("bad json".into())) }
        }).await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_predicate_retries_empty_results() {
        let policy = RetryPolicy::exponential(4, Duration::from_millis(10));
        let result = policy.run(
            LogTag::Pricing,
            "batch",
            |attempt| async move { Ok(if attempt >= 2 { vec![attempt] } else { Vec::new() }) },
            |v: &Vec<u32>| !v.is_empty()
        ).await;
        assert_eq!(result.unwrap(), vec![2]);

        let exhausted = policy.run(
            LogTag::Pricing,
            "batch",
            |_| async { Ok(Vec::<u32>::new()) },
            |v: &Vec<u32>| !v.is_empty()
        ).await;
        assert_eq!(exhausted.unwrap(), Vec::<u32>::new());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline() {
        let result: MonitorResult<()> = with_deadline(Duration::from_secs(1), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        }).await;
        assert!(matches!(result, Err(MonitorError::Timeout { seconds: 1 })));
    }
}
