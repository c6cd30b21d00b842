//! Bounded polling for page landmarks.
//!
//! Pages load asynchronously, so "the page is ready" means "a named landmark element
//! is present". [`poll_until`] re-runs a check with exponential backoff until it
//! yields a value or the policy's timeout elapses.

use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::debug;

/// Delay before the second check.
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(250);
/// Upper bound for a single delay between checks.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Exponential backoff bounded by an overall timeout.
pub struct BackoffPolicy {
    pub initial_delay: Duration,
    pub factor: u32,
    pub max_delay: Duration,
    pub timeout: Duration,
}

impl BackoffPolicy {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            initial_delay: DEFAULT_INITIAL_DELAY,
            factor: 2,
            max_delay: DEFAULT_MAX_DELAY,
            timeout,
        }
    }

    /// Delay after the `attempt`-th failed check (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let multiplier = self.factor.max(1).saturating_pow(exponent);
        self.initial_delay
            .saturating_mul(multiplier)
            .min(self.max_delay)
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::with_timeout(Duration::from_secs(crate::config::DEFAULT_PAGE_TIMEOUT_SECS))
    }
}

#[derive(Debug, Error)]
pub enum WaitError<E> {
    #[error("timed out after {waited:?} waiting for {landmark} ({attempts} attempts)")]
    Timeout {
        landmark: String,
        waited: Duration,
        attempts: u32,
    },

    /// The check failed in a way that retrying cannot fix.
    #[error("{0}")]
    Check(E),
}

/// Runs `check` until it returns `Ok(Some(_))`, an error, or the timeout elapses.
///
/// `Ok(None)` means "landmark not there yet" and triggers another attempt.
pub fn poll_until<T, E, F>(
    landmark: &str,
    policy: &BackoffPolicy,
    mut check: F,
) -> Result<T, WaitError<E>>
where
    F: FnMut() -> Result<Option<T>, E>,
{
    let started = Instant::now();
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        if let Some(value) = check().map_err(WaitError::Check)? {
            debug!(landmark, attempts, "Landmark available");
            return Ok(value);
        }

        let waited = started.elapsed();
        if waited >= policy.timeout {
            return Err(WaitError::Timeout {
                landmark: landmark.to_string(),
                waited,
                attempts,
            });
        }

        let delay = policy.delay_for(attempts).min(policy.timeout - waited);
        debug!(landmark, attempts, ?delay, "Landmark not yet available");
        thread::sleep(delay);
    }
}
