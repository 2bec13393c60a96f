//! Bounded retry with exponential backoff for `GetFindings` calls.

use std::time::Duration;

use securityhub_core::api::ApiError;

/// Error codes Security Hub (and the AWS front end) use for throttling.
const THROTTLING_CODES: &[&str] = &[
    "TooManyRequestsException",
    "ThrottlingException",
    "Throttling",
    "ThrottledException",
    "RequestThrottledException",
    "RequestLimitExceeded",
    "LimitExceededException",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per request, including the first one.
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(20),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no retries.
    pub fn disabled() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Sleep before retry number `retry` (0-based), doubling up to the cap.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry);
        self.initial_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }

    /// Whether another attempt is allowed after `attempt` (1-based) failed
    /// with `error`.
    pub fn should_retry(&self, attempt: u32, error: &ApiError) -> bool {
        attempt < self.max_attempts && is_retryable(error)
    }
}

/// Throttling, server-side failures and transport errors are transient.
pub fn is_retryable(error: &ApiError) -> bool {
    match error {
        ApiError::Service { status, code, .. } => {
            *status == 429 || *status >= 500 || THROTTLING_CODES.contains(&code.as_str())
        }
        ApiError::Transport(_) => true,
        _ => false,
    }
}
