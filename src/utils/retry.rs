//! Retry utilities with exponential backoff for resilient API calls.

use std::time::Duration;
use tokio::time::{sleep, timeout};

use crate::tracker::TrackerError;

/// Configuration for retry behavior
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first one
    pub max_attempts: u32,
    /// Initial delay between retries
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
    /// Maximum total time to spend on retries (including delays)
    pub max_total_time: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            backoff_multiplier: 2.0,
            max_total_time: Duration::from_secs(120),
        }
    }
}

impl RetryConfig {
    /// Retry up to `retries` times after the first attempt
    pub fn with_retries(retries: u32) -> Self {
        Self {
            max_attempts: retries.saturating_add(1),
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt` (1-based), before error hints
    fn backoff(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return self.initial_delay;
        }
        let exp_delay = self.initial_delay.as_secs_f64()
            * self.backoff_multiplier.powf(attempt as f64 - 1.0);
        Duration::from_secs_f64(exp_delay.min(self.max_delay.as_secs_f64()))
    }
}

/// Transient errors that should trigger a retry
#[derive(Debug, Clone, PartialEq)]
pub enum TransientError {
    /// Network connectivity issues or 5xx responses
    Network,
    /// Rate limit exceeded (with optional retry-after seconds)
    RateLimit(Option<u64>),
    /// Request timeout
    Timeout,
}

impl TransientError {
    /// Check if a TrackerError represents a transient error
    pub fn from_tracker_error(err: &TrackerError) -> Option<Self> {
        match err {
            TrackerError::RateLimit(retry_after) => Some(TransientError::RateLimit(*retry_after)),
            TrackerError::Network(msg) => {
                if msg.to_lowercase().contains("timed out") {
                    Some(TransientError::Timeout)
                } else {
                    Some(TransientError::Network)
                }
            }
            _ => None,
        }
    }

    /// Get the recommended delay for this error
    pub fn recommended_delay(&self) -> Duration {
        match self {
            TransientError::RateLimit(Some(seconds)) => Duration::from_secs(*seconds + 1),
            TransientError::RateLimit(None) => Duration::from_secs(61),
            TransientError::Timeout => Duration::from_secs(2),
            TransientError::Network => Duration::from_secs(2),
        }
    }
}

/// Execute an async operation with retry logic
///
/// Transient failures ([`TrackerError::Network`], [`TrackerError::RateLimit`])
/// are retried with exponential backoff, never waiting longer than
/// `config.max_delay` between attempts. Any other error is returned
/// immediately.
pub async fn with_retry<T, F, Fut>(config: RetryConfig, operation: F) -> Result<T, TrackerError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, TrackerError>>,
{
    let mut attempts = 0;
    let mut total_elapsed = Duration::ZERO;
    let mut operation = operation;

    loop {
        attempts += 1;

        let error = match timeout(config.max_total_time, operation()).await {
            Ok(Ok(result)) => {
                if attempts > 1 {
                    tracing::info!(
                        "Operation succeeded on attempt {} after {} transient failures",
                        attempts,
                        attempts - 1
                    );
                }
                return Ok(result);
            }
            Ok(Err(error)) => error,
            Err(_) => TrackerError::Network("Operation timed out".to_string()),
        };

        let Some(transient) = TransientError::from_tracker_error(&error) else {
            return Err(error);
        };

        let delay = config
            .backoff(attempts)
            .max(transient.recommended_delay())
            .min(config.max_delay);
        total_elapsed += delay;

        if attempts >= config.max_attempts || total_elapsed >= config.max_total_time {
            tracing::warn!(
                "Operation failed after {} attempts (total elapsed: {:?}): {}",
                attempts,
                total_elapsed,
                error
            );
            return Err(error);
        }

        tracing::debug!(
            "Transient error on attempt {}: {:?}, retrying in {:?}",
            attempts,
            transient,
            delay
        );
        sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn fast_config(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            initial_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(20),
            backoff_multiplier: 2.0,
            max_total_time: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn test_retry_success_first_try() {
        let call_count = Rc::new(RefCell::new(0));

        let result = {
            let call_count = call_count.clone();
            with_retry(RetryConfig::default(), move || {
                let call_count = call_count.clone();
                async move {
                    *call_count.borrow_mut() += 1;
                    Ok("success")
                }
            })
        }
        .await;

        assert_eq!(result.unwrap(), "success");
        assert_eq!(*call_count.borrow(), 1);
    }

    #[tokio::test]
    async fn test_retry_success_after_failures() {
        let call_count = Rc::new(RefCell::new(0));

        let result = {
            let call_count = call_count.clone();
            with_retry(fast_config(4), move || {
                let call_count = call_count.clone();
                async move {
                    *call_count.borrow_mut() += 1;
                    let count = *call_count.borrow();
                    if count < 3 {
                        Err(TrackerError::Network("temporary error".to_string()))
                    } else {
                        Ok("success")
                    }
                }
            })
        }
        .await;

        assert_eq!(result.unwrap(), "success");
        assert_eq!(*call_count.borrow(), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_attempts() {
        let call_count = Rc::new(RefCell::new(0));

        let result: Result<(), TrackerError> = {
            let call_count = call_count.clone();
            with_retry(fast_config(2), move || {
                let call_count = call_count.clone();
                async move {
                    *call_count.borrow_mut() += 1;
                    Err(TrackerError::RateLimit(None))
                }
            })
        }
        .await;

        assert_eq!(result, Err(TrackerError::RateLimit(None)));
        assert_eq!(*call_count.borrow(), 2);
    }

    #[tokio::test]
    async fn test_retry_returns_permanent_error() {
        let call_count = Rc::new(RefCell::new(0));

        let result: Result<&str, TrackerError> = {
            let call_count = call_count.clone();
            with_retry(fast_config(5), move || {
                let call_count = call_count.clone();
                async move {
                    *call_count.borrow_mut() += 1;
                    Err(TrackerError::NotFound("issue".to_string()))
                }
            })
        }
        .await;

        assert!(matches!(result, Err(TrackerError::NotFound(_))));
        assert_eq!(*call_count.borrow(), 1);
    }

    #[test]
    fn test_transient_error_detection() {
        assert_eq!(
            TransientError::from_tracker_error(&TrackerError::RateLimit(Some(3))),
            Some(TransientError::RateLimit(Some(3)))
        );
        assert_eq!(
            TransientError::from_tracker_error(&TrackerError::Network("connection refused".into())),
            Some(TransientError::Network)
        );
        assert_eq!(
            TransientError::from_tracker_error(&TrackerError::Network("request timed out".into())),
            Some(TransientError::Timeout)
        );
        assert!(TransientError::from_tracker_error(&TrackerError::Parse("bad".into())).is_none());
        assert!(
            TransientError::from_tracker_error(&TrackerError::Unauthorized("no key".into())).is_none()
        );
    }

    #[test]
    fn test_recommended_delay() {
        assert_eq!(
            TransientError::RateLimit(Some(30)).recommended_delay(),
            Duration::from_secs(31)
        );
        assert_eq!(
            TransientError::RateLimit(None).recommended_delay(),
            Duration::from_secs(61)
        );
        assert_eq!(TransientError::Network.recommended_delay(), Duration::from_secs(2));
    }

    #[test]
    fn test_with_retries() {
        assert_eq!(RetryConfig::with_retries(0).max_attempts, 1);
        assert_eq!(RetryConfig::with_retries(3).max_attempts, 4);
    }
}
