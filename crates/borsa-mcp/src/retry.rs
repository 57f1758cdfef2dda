//! Jittered retry for calls against the Borsa MCP endpoint
//!
//! The public server drops connections under load, so `connect` and the
//! catalog fetch replay transient failures with capped, jittered backoff.
//! Which errors count as transient is decided by [`MCPError::is_transient`].

use crate::error::MCPError;
use std::hash::{BuildHasher, Hasher, RandomState};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

type Result<T> = std::result::Result<T, MCPError>;

/// How transient server failures are replayed
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub attempts: u32,

    /// Delay before the first replay; doubles on each further retry
    pub base_delay: Duration,

    /// Ceiling the doubled delay never exceeds (before jitter)
    pub cap: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_millis(200),
            cap: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Policy that never replays; the first error is final
    pub fn single_shot() -> Self {
        Self {
            attempts: 1,
            base_delay: Duration::ZERO,
            cap: Duration::ZERO,
        }
    }

    /// Delay before retry number `retries` (0-based), jittered.
    ///
    /// Doubling capped at `cap`, then up to half the value again as
    /// random jitter so parallel clients do not hammer the server in
    /// lockstep after an outage.
    fn delay(&self, retries: u32) -> Duration {
        let exp = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(retries))
            .min(self.cap);
        if exp.is_zero() {
            return exp;
        }
        let spread = (exp.as_millis() / 2).max(1) as u64;
        let jitter_ms = RandomState::new().build_hasher().finish() % spread;
        exp + Duration::from_millis(jitter_ms)
    }

    /// Run `call` until it succeeds, returns a non-transient error, or
    /// the attempt budget runs out. `op` names the call for the logs.
    pub async fn execute<F, Fut, T>(&self, op: &str, mut call: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut retries = 0u32;
        loop {
            match call().await {
                Ok(value) => {
                    if retries > 0 {
                        debug!(op, retries, "Succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(e) if e.is_transient() && retries + 1 < self.attempts => {
                    let delay = self.delay(retries);
                    warn!(
                        op,
                        attempt = retries + 1,
                        attempts = self.attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Transient failure, will retry"
                    );
                    sleep(delay).await;
                    retries += 1;
                }
                Err(e) => {
                    warn!(op, retries, error = %e, "Giving up");
                    return Err(e);
                }
            }
        }
    }
}
