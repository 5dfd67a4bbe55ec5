//! Randomized request spacing
//!
//! The remote service rate-limits per IP. Requests are spaced by a base
//! delay plus random jitter so traffic never arrives in bursts.

use rand::Rng;
use std::time::Duration;
use tracing::debug;

/// Base delay plus uniform random jitter in `[0, jitter]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    base: Duration,
    jitter: Duration,
}

impl Pacing {
    pub fn new(base: Duration, jitter: Duration) -> Self {
        Self { base, jitter }
    }

    pub fn from_millis(base_ms: u64, jitter_ms: u64) -> Self {
        Self::new(Duration::from_millis(base_ms), Duration::from_millis(jitter_ms))
    }

    /// No spacing at all
    pub fn none() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    pub fn base(&self) -> Duration {
        self.base
    }

    /// Longest delay `next_delay` can return
    pub fn max_delay(&self) -> Duration {
        self.base + self.jitter
    }

    /// Draw the next spacing interval
    pub fn next_delay(&self) -> Duration {
        let jitter_ms = self.jitter.as_millis() as u64;
        if jitter_ms == 0 {
            return self.base;
        }
        self.base + Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
    }

    /// Sleep for one spacing interval
    pub async fn wait(&self) {
        let delay = self.next_delay();
        if delay.is_zero() {
            return;
        }
        debug!("Pacing: waiting {:?}", delay);
        tokio::time::sleep(delay).await;
    }
}
