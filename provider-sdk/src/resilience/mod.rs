//! Resilience patterns for provider clients

mod retry;

pub use retry::{RetryConfig, RetryExecutor};
