//! Rate limiter for the forecast providers.
//!
//! Applied to network calls only; cache hits never wait.

use governor::{Quota, RateLimiter as GovLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;

type DirectLimiter = GovLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Shared token bucket across all upstream endpoints.
#[derive(Debug, Clone)]
pub struct UpstreamLimiter {
    limiter: Arc<DirectLimiter>,
}

impl UpstreamLimiter {
    /// Create with a per-second request quota. Zero is raised to one.
    pub fn per_second(requests_per_sec: u32) -> Self {
        let rate = NonZeroU32::new(requests_per_sec).unwrap_or(NonZeroU32::MIN);

        Self {
            limiter: Arc::new(GovLimiter::direct(Quota::per_second(rate))),
        }
    }

    /// Wait until a request slot is available.
    pub async fn wait(&self) {
        self.limiter.until_ready().await;
    }

    /// Try to acquire a slot without waiting. Returns true if acquired.
    pub fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }
}

impl Default for UpstreamLimiter {
    fn default() -> Self {
        Self::per_second(10)
    }
}
