//! Bounded status polling
//!
//! Used by adapters whose provider completes work asynchronously: the caller
//! supplies a closure that fetches the job's status once and reports whether
//! it reached a terminal state. The loop sleeps `interval` between fetches and
//! gives up after exactly `max_attempts` fetches.
//!
//! The loop owns no background task. Dropping the returned future (client
//! disconnect, request timeout) cancels the pending sleep and stops polling.

use std::future::Future;
use std::time::Duration;

/// Interval and attempt budget for a poll loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    interval: Duration,
    max_attempts: u32,
}

impl PollPolicy {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(2);
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 30;

    /// Create a policy
    ///
    /// A zero attempt budget is raised to one so the job is checked at least
    /// once.
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_INTERVAL, Self::DEFAULT_MAX_ATTEMPTS)
    }
}

/// Result of one status check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStep<T> {
    /// Job is still queued or running
    Pending,
    /// Job reached a terminal state
    Done(T),
}

/// Why a poll loop ended without a value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollError<E> {
    /// The status check itself failed (or reported a failed job)
    Check { attempt: u32, error: E },
    /// Every attempt came back pending
    Exhausted { attempts: u32 },
}

/// Successful poll outcome with the number of fetches it took
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Polled<T> {
    pub value: T,
    pub attempts: u32,
}

/// Run `check` until it reports [`PollStep::Done`], fails, or the attempt
/// budget runs out
///
/// `check` receives the 1-based attempt number. No sleep follows the final
/// attempt.
pub async fn poll_until<T, E, F, Fut>(
    policy: PollPolicy,
    mut check: F,
) -> Result<Polled<T>, PollError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<PollStep<T>, E>>,
{
    for attempt in 1..=policy.max_attempts {
        match check(attempt).await {
            Ok(PollStep::Done(value)) => {
                return Ok(Polled {
                    value,
                    attempts: attempt,
                });
            }
            Ok(PollStep::Pending) => {
                tracing::debug!(
                    attempt,
                    max_attempts = policy.max_attempts,
                    "Job still pending"
                );
                if attempt < policy.max_attempts {
                    tokio::time::sleep(policy.interval).await;
                }
            }
            Err(error) => return Err(PollError::Check { attempt, error }),
        }
    }

    Err(PollError::Exhausted {
        attempts: policy.max_attempts,
    })
}
