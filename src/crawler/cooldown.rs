//! Fixed-interval rate limiting for paper API calls
//!
//! Unlike a token bucket, the cooldown starts counting when a call
//! *finishes*: the next call may only begin once `interval` has passed since
//! the previous one completed, whether it succeeded or failed.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Minimum delay between consecutive calls, shared by every clone
#[derive(Debug, Clone)]
pub struct Cooldown {
    interval: Duration,
    last_finished: Arc<Mutex<Option<Instant>>>,
}

impl Cooldown {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_finished: Arc::new(Mutex::new(None)),
        }
    }

    /// A cooldown that never waits (tests, local mirrors)
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Runs `call` once the cooldown since the previous call has elapsed
    ///
    /// Calls are serialized: the lock is held for the whole call, so callers
    /// sharing this cooldown never overlap and always observe the interval.
    pub async fn run<F, T>(&self, call: F) -> T
    where
        F: Future<Output = T>,
    {
        let mut last_finished = self.last_finished.lock().await;

        if let Some(finished) = *last_finished {
            let ready_at = finished + self.interval;
            if ready_at > Instant::now() {
                tracing::trace!("Cooling down for {:?}", ready_at - Instant::now());
                tokio::time::sleep_until(ready_at).await;
            }
        }

        let output = call.await;
        *last_finished = Some(Instant::now());
        output
    }
}
