use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Fixed minimum-delay gate between requests to one site.
pub struct RateLimiter {
    delay: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_request: Mutex::new(None),
        }
    }

    /// Wait until `delay` has passed since the previous call returned.
    pub async fn wait(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(prev) = *last {
            let since_last = prev.elapsed();
            if since_last < self.delay {
                tokio::time::sleep(self.delay - since_last).await;
            }
        }
        *last = Some(Instant::now());
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}
