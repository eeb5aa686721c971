//! Minimum-interval request gate.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Serializes outbound calls of one client: each call waits until
/// `min_interval` has elapsed since the previous call's start, then records
/// its own start time. Not a token bucket; there is never more than one
/// pending caller making progress.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_start: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_start: Mutex::new(None),
        }
    }

    /// Block until the gate opens. Holding the lock across the sleep keeps
    /// concurrent callers strictly serialized.
    pub async fn wait(&self) {
        let mut last = self.last_start.lock().await;
        if let Some(previous) = *last {
            let ready_at = previous + self.min_interval;
            if Instant::now() < ready_at {
                tokio::time::sleep_until(ready_at).await;
            }
        }
        *last = Some(Instant::now());
    }
}
