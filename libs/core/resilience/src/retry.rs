use std::error::Error;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, warn};

use crate::classify::{self, ErrorClassification};

/// Retry configuration for calls against remote dependencies
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, including the first one
    pub max_attempts: u32,

    /// Delay before the second attempt in milliseconds
    pub initial_delay_ms: u64,

    /// Upper bound for any single delay in milliseconds
    pub max_delay_ms: u64,

    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,

    /// Whether to randomize delays to spread out concurrent retries
    pub use_jitter: bool,
}

impl RetryConfig {
    /// Create a new retry configuration with defaults
    ///
    /// Defaults:
    /// - max_attempts: 3
    /// - initial_delay_ms: 500
    /// - max_delay_ms: 30000
    /// - backoff_multiplier: 2.0
    /// - use_jitter: false
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_initial_delay(mut self, delay_ms: u64) -> Self {
        self.initial_delay_ms = delay_ms;
        self
    }

    pub fn with_max_delay(mut self, delay_ms: u64) -> Self {
        self.max_delay_ms = delay_ms;
        self
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    pub fn with_jitter(mut self) -> Self {
        self.use_jitter = true;
        self
    }

    /// Delay that follows `current`, capped at `max_delay_ms`.
    pub fn next_delay(&self, current_ms: u64) -> u64 {
        ((current_ms as f64 * self.backoff_multiplier) as u64).min(self.max_delay_ms)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 500,
            max_delay_ms: 30_000,
            backoff_multiplier: 2.0,
            use_jitter: false,
        }
    }
}

/// Decides whether a failure of type `E` should be retried.
pub trait TransientClassifier<E: ?Sized> {
    fn is_transient(&self, error: &E) -> bool;
}

impl<E: ?Sized, F> TransientClassifier<E> for F
where
    F: Fn(&E) -> bool,
{
    fn is_transient(&self, error: &E) -> bool {
        self(error)
    }
}

/// Classifier backed by [`classify::is_transient`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ErrorChainClassifier;

impl<E> TransientClassifier<E> for ErrorChainClassifier
where
    E: Error + 'static,
{
    fn is_transient(&self, error: &E) -> bool {
        classify::is_transient(error)
    }
}

/// Executes async operations with exponential backoff, retrying only
/// failures the supplied classifier accepts as transient.
///
/// Delays use `tokio::time::sleep`, so a retrying call parks its own task
/// and never blocks a runtime worker. There is no shared retry budget:
/// concurrent callers back off independently.
#[derive(Debug, Clone, Default)]
pub struct TransientFailureRetrier {
    config: RetryConfig,
}

impl TransientFailureRetrier {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Run `operation` until it succeeds, fails non-transiently, or
    /// `max_attempts` is reached. The last error is returned unchanged.
    ///
    /// # Example
    /// ```ignore
    /// let retrier = TransientFailureRetrier::default();
    /// let body = retrier
    ///     .execute_with_retry("fetch collection", &ErrorChainClassifier, || client.get(url).send())
    ///     .await?;
    /// ```
    pub async fn execute_with_retry<F, Fut, T, E, C>(
        &self,
        operation_name: &str,
        classifier: &C,
        mut operation: F,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Error + 'static,
        C: TransientClassifier<E> + ?Sized,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut delay = self.config.initial_delay_ms;
        let mut attempt = 0;

        loop {
            attempt += 1;

            let failure = match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(
                            operation = operation_name,
                            attempt, "Operation succeeded after retry"
                        );
                    }
                    return Ok(value);
                }
                Err(failure) => failure,
            };

            let classification: ErrorClassification = classify::classify(&failure);

            if !classifier.is_transient(&failure) {
                warn!(
                    operation = operation_name,
                    attempt,
                    max_attempts,
                    %classification,
                    "Operation failed with non-transient error, not retrying"
                );
                return Err(failure);
            }

            if attempt >= max_attempts {
                error!(
                    operation = operation_name,
                    max_attempts,
                    %classification,
                    "Operation failed after all attempts, giving up"
                );
                return Err(failure);
            }

            let sleep_ms = if self.config.use_jitter {
                apply_jitter(delay)
            } else {
                delay
            };

            warn!(
                operation = operation_name,
                attempt,
                max_attempts,
                delay_ms = sleep_ms,
                %classification,
                "Operation failed with transient error, retrying"
            );

            tokio::time::sleep(Duration::from_millis(sleep_ms)).await;
            delay = self.config.next_delay(delay);
        }
    }
}

/// Retry with default settings and the cause-chain classifier.
pub async fn execute_with_retry<F, Fut, T, E>(operation_name: &str, operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Error + 'static,
{
    TransientFailureRetrier::default()
        .execute_with_retry(operation_name, &ErrorChainClassifier, operation)
        .await
}

/// Apply jitter to a delay value
///
/// Uses a random value between 50% and 100% of the original delay
fn apply_jitter(delay: u64) -> u64 {
    use std::collections::hash_map::RandomState;
    use std::hash::BuildHasher;

    let random_factor =
        (RandomState::new().hash_one(std::time::SystemTime::now()) % 50) as f64 / 100.0 + 0.5;

    (delay as f64 * random_factor) as u64
}
