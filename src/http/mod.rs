//! HTTP layer: shared client and the warm-up retry policy.

pub mod client;
pub mod retry;

pub use client::HttpClient;
pub use retry::{Delay, RetryConfig, TimerDelay};
