//! Scan throttling.
//!
//! Work is run in fixed-size batches: every future in a batch is polled
//! concurrently, and the runner sleeps between batches, optionally backing
//! off. A concurrency of 1 gives strictly sequential evaluation with a delay
//! between calls.

use std::future::Future;
use std::time::Duration;

use common::config::ScanConfig;
use futures_util::future::join_all;
use tokio::time::sleep;

/// Concurrency limit plus backoff between batches.
///
/// The first pause is `pause`; each later one is multiplied by `backoff`
/// and capped at `max_pause`. A factor of 1.0 gives a fixed pause.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanPolicy {
    /// Futures in flight per batch (at least 1).
    pub concurrency: usize,
    /// Sleep after the first batch. Not applied after the last batch.
    pub pause: Duration,
    /// Growth factor for successive pauses (at least 1.0).
    pub backoff: f64,
    pub max_pause: Duration,
}

impl ScanPolicy {
    pub fn new(concurrency: usize, pause: Duration) -> Self {
        Self {
            concurrency: concurrency.max(1),
            pause,
            backoff: 1.0,
            max_pause: pause,
        }
    }

    pub fn sequential(delay: Duration) -> Self {
        Self::new(1, delay)
    }

    /// Grow the pause by `factor` after every batch, never beyond `max_pause`.
    pub fn with_backoff(mut self, factor: f64, max_pause: Duration) -> Self {
        self.backoff = if factor.is_finite() { factor.max(1.0) } else { 1.0 };
        self.max_pause = max_pause.max(self.pause);
        self
    }

    /// Pause after the `n`th completed batch (zero-based).
    pub fn pause_after(&self, n: usize) -> Duration {
        if self.pause.is_zero() {
            return Duration::ZERO;
        }
        let exponent = i32::try_from(n).unwrap_or(i32::MAX);
        let scaled_ns = self.pause.as_nanos() as f64 * self.backoff.powi(exponent);
        if !scaled_ns.is_finite() || scaled_ns >= self.max_pause.as_nanos() as f64 {
            self.max_pause
        } else {
            Duration::from_nanos(scaled_ns.round() as u64)
        }
    }

    /// Grid scans: small concurrent batches.
    pub fn grid(cfg: &ScanConfig) -> Self {
        Self::new(cfg.grid_concurrency, Duration::from_millis(cfg.grid_batch_pause_ms))
            .with_backoff(cfg.backoff_factor, Duration::from_millis(cfg.max_pause_ms))
    }

    /// Route scans: one waypoint at a time.
    pub fn route(cfg: &ScanConfig) -> Self {
        Self::sequential(Duration::from_millis(cfg.route_delay_ms))
            .with_backoff(cfg.backoff_factor, Duration::from_millis(cfg.max_pause_ms))
    }
}

/// Map `items` through `task` under `policy`. Output order matches input order.
pub async fn run_throttled<T, F, Fut>(items: Vec<T>, policy: ScanPolicy, task: F) -> Vec<Fut::Output>
where
    F: Fn(T) -> Fut,
    Fut: Future,
{
    let concurrency = policy.concurrency.max(1);
    let mut results = Vec::with_capacity(items.len());
    let mut pending = items.into_iter().peekable();
    let mut batches = 0;

    while pending.peek().is_some() {
        let batch: Vec<Fut> = pending.by_ref().take(concurrency).map(&task).collect();
        results.extend(join_all(batch).await);

        let pause = policy.pause_after(batches);
        batches += 1;
        if pending.peek().is_some() && !pause.is_zero() {
            sleep(pause).await;
        }
    }
    results
}
