//! Retry and failure classification shared by every outbound client.
//!
//! ```text
//! caller ──► TransientFailureRetrier::execute_with_retry
//!                 │  attempt 1..=max_attempts
//!                 ├─ Ok  ─────────────────────────────► value
//!                 └─ Err ─► TransientClassifier
//!                              ├─ non-transient ──────► error (no sleep)
//!                              └─ transient ─► sleep(backoff) ─► next attempt
//! ```
//!
//! `classify` turns any `std::error::Error` chain into an
//! [`ErrorClassification`] label such as `"429 Rate Limited"`.

pub mod classify;
pub mod retry;

pub use classify::{ErrorClassification, chain_message, classify, is_malformed_identifier, is_transient};
pub use retry::{
    ErrorChainClassifier, RetryConfig, TransientClassifier, TransientFailureRetrier,
    execute_with_retry,
};
