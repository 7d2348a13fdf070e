//! Bounded retry with exponential backoff for LLM and search calls.
//!
//! Only errors that report [`AppError::is_retryable`] are repeated. An
//! optional deadline caps the total time spent: each attempt and each backoff
//! sleep is cut short when the deadline passes, yielding [`AppError::Timeout`].

use crate::types::{AppError, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Retry configuration
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt (default: 2)
    pub max_retries: u32,

    /// Delay before the first retry (default: 500ms)
    pub initial_backoff: Duration,

    /// Upper bound for any single delay (default: 8 seconds)
    pub max_backoff: Duration,

    /// Growth factor between consecutive delays (default: 2)
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(8),
            multiplier: 2,
        }
    }
}

impl RetryPolicy {
    /// Set the number of retries
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set the initial backoff delay
    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    /// No delay between attempts (useful for testing)
    pub fn without_backoff(mut self) -> Self {
        self.initial_backoff = Duration::ZERO;
        self
    }

    /// Total attempts including the first one
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Delay before retry number `retry` (1-based)
    pub fn backoff_for(&self, retry: u32) -> Duration {
        let factor = self.multiplier.saturating_pow(retry.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// retry budget is spent.
    pub async fn run<T, F, Fut>(
        &self,
        label: &str,
        deadline: Option<Instant>,
        mut op: F,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let outcome = match deadline {
                Some(deadline) => match tokio::time::timeout_at(deadline, op()).await {
                    Ok(result) => result,
                    Err(_) => {
                        return Err(AppError::Timeout(format!(
                            "{} hit the run deadline",
                            label
                        )));
                    }
                },
                None => op().await,
            };

            match outcome {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.max_attempts() => {
                    let delay = self.backoff_for(attempt);
                    tracing::warn!(
                        call = label,
                        attempt,
                        max_attempts = self.max_attempts(),
                        error = %e,
                        "Call failed, retrying in {:?}",
                        delay
                    );

                    if let Some(deadline) = deadline {
                        if Instant::now() + delay >= deadline {
                            return Err(AppError::Timeout(format!(
                                "{} cannot retry before the run deadline",
                                label
                            )));
                        }
                    }
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
