use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use rand::Rng;

/// Exponential backoff with jitter: attempt `i` waits `min(max_delay, 2^i + jitter)`.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Delay after failed attempt `attempt` (0-based), `jitter` in `[0, 1)` seconds.
    pub fn delay_for(&self, attempt: u32, jitter: f64) -> Duration {
        let base = 2f64.powi(attempt.min(31) as i32);
        let secs = (base + jitter.clamp(0.0, 1.0)).min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(secs)
    }
}

/// Run `op` until it succeeds or the policy's attempts are used up.
///
/// Exhaustion is not an error: it is logged and reported as `None`.
pub async fn retry_with_backoff<T, E, F, Fut>(policy: &RetryPolicy, url: &str, mut op: F) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    for attempt in 0..policy.max_attempts {
        match op().await {
            Ok(value) => return Some(value),
            Err(e) if attempt + 1 < policy.max_attempts => {
                let jitter = rand::thread_rng().gen_range(0.0..1.0);
                let wait = policy.delay_for(attempt, jitter);
                tracing::warn!(
                    url,
                    attempt = attempt + 1,
                    "Request failed: {}. Retrying in {:.2}s...",
                    e,
                    wait.as_secs_f64()
                );
                tokio::time::sleep(wait).await;
            }
            Err(e) => {
                tracing::error!(url, "Failed after {} attempts: {}", policy.max_attempts, e);
            }
        }
    }
    None
}
