//! Retry policy for the image service's warm-up responses.
//!
//! The policy is a small state machine:
//!
//! ```text
//! Attempting(n) ──success──────────────▶ Succeeded
//!               ──fatal────────────────▶ FailedFatal
//!               ──retryable, n < max──▶ Attempting(n + 1)   (after one delay)
//!               ──retryable, n = max──▶ FailedExhausted
//! ```

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{PipelineError, PipelineResult};

/// Status the image service returns while its model is loading.
pub const WARMING_UP_STATUS: u16 = 503;

/// Configuration for retry behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Fixed delay between attempts.
    pub delay: Duration,
    /// HTTP status codes that trigger a retry. Everything else is fatal.
    pub retryable_statuses: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::warm_up()
    }
}

impl RetryConfig {
    /// 3 attempts, 20 s apart, retrying only on 503.
    pub fn warm_up() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(20),
            retryable_statuses: vec![WARMING_UP_STATUS],
        }
    }

    pub fn is_retryable(&self, status: u16) -> bool {
        self.retryable_statuses.contains(&status)
    }
}

// ─── Delay ───────────────────────────────────────────────────────────────────

/// Injectable sleep, so loops can be driven without wall-clock waits.
#[async_trait]
pub trait Delay: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real timer-backed delay.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimerDelay;

#[async_trait]
impl Delay for TimerDelay {
    async fn sleep(&self, duration: Duration) {
        futures_timer::Delay::new(duration).await;
    }
}

// ─── State machine ───────────────────────────────────────────────────────────

/// Classification of one attempt's response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    Retryable,
    Fatal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    /// About to make (or making) the n-th attempt, 1-based.
    Attempting(u32),
    Succeeded,
    FailedFatal,
    FailedExhausted,
}

impl RetryState {
    pub fn start(max_attempts: u32) -> Self {
        if max_attempts == 0 {
            Self::FailedExhausted
        } else {
            Self::Attempting(1)
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Attempting(_))
    }

    /// Transition on the outcome of the current attempt.
    /// Terminal states are absorbing.
    pub fn advance(self, outcome: AttemptOutcome, max_attempts: u32) -> Self {
        match (self, outcome) {
            (Self::Attempting(_), AttemptOutcome::Success) => Self::Succeeded,
            (Self::Attempting(_), AttemptOutcome::Fatal) => Self::FailedFatal,
            (Self::Attempting(n), AttemptOutcome::Retryable) if n < max_attempts => {
                Self::Attempting(n + 1)
            }
            (Self::Attempting(_), AttemptOutcome::Retryable) => Self::FailedExhausted,
            (terminal, _) => terminal,
        }
    }
}

/// Result of a single attempt as seen by [`retry_on_status`].
#[derive(Debug)]
pub enum Attempt<T> {
    Done(T),
    Retry { status: u16 },
}

/// Run `attempt` under `config`, sleeping through `delay` between retryable
/// responses. An `Err` from `attempt` is fatal and returned as-is. Running
/// out of attempts yields [`PipelineError::ServiceUnavailable`].
///
/// No delay follows the final attempt.
pub async fn retry_on_status<T, F, Fut>(
    config: &RetryConfig,
    delay: &dyn Delay,
    service: &str,
    mut attempt: F,
) -> PipelineResult<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = PipelineResult<Attempt<T>>>,
{
    let mut state = RetryState::start(config.max_attempts);

    while let RetryState::Attempting(n) = state {
        match attempt(n).await? {
            Attempt::Done(value) => return Ok(value),
            Attempt::Retry { status } => {
                state = state.advance(AttemptOutcome::Retryable, config.max_attempts);
                if !state.is_terminal() {
                    tracing::warn!(
                        attempt = n,
                        max = config.max_attempts,
                        status,
                        delay_secs = config.delay.as_secs(),
                        "{} is warming up, retrying",
                        service
                    );
                    delay.sleep(config.delay).await;
                } else {
                    tracing::warn!(attempt = n, status, "{} still unavailable, giving up", service);
                }
            }
        }
    }

    Err(PipelineError::ServiceUnavailable {
        service: service.to_string(),
        attempts: config.max_attempts,
    })
}
