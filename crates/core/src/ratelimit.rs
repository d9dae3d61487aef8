//! Aggregate request pacing for batch generation.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{Instant, sleep_until};

/// Spaces acquisitions evenly across all clones.
///
/// A limiter built with `per_minute(n)` hands out one slot every `60s / n`.
/// Clones share the schedule, so workers holding clones respect the limit in
/// aggregate. `per_minute(0)` never waits.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    interval: Option<Duration>,
    next_slot: Arc<Mutex<Option<Instant>>>,
}

impl RateLimiter {
    pub fn per_minute(requests: u32) -> Self {
        let interval = (requests > 0).then(|| Duration::from_secs(60) / requests);
        Self { interval, next_slot: Arc::new(Mutex::new(None)) }
    }

    pub fn unlimited() -> Self {
        Self::per_minute(0)
    }

    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    /// Waits until the caller's slot comes up.
    pub async fn acquire(&self) {
        let Some(interval) = self.interval else {
            return;
        };

        let slot = {
            let mut next = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = match *next {
                Some(reserved) if reserved > now => reserved,
                _ => now,
            };
            *next = Some(slot + interval);
            slot
        };

        sleep_until(slot).await;
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::unlimited()
    }
}
