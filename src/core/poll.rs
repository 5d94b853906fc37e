//! Bounded polling for job-style upstreams: ask, wait a fixed interval, ask
//! again, give up after a fixed number of attempts.

use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            max_attempts: 10,
        }
    }
}

/// What one check learned about the job.
#[derive(Debug)]
pub enum PollStep<T, E> {
    Ready(T),
    Failed(E),
    Pending,
}

#[derive(Debug, PartialEq, Eq)]
pub enum PollError<E> {
    /// The check reported a terminal failure.
    Failed(E),
    /// Still pending after `attempts` checks.
    Exhausted { attempts: u32 },
}

/// Calls `check` up to `policy.max_attempts` times, sleeping
/// `policy.interval` between pending results. The check receives the
/// 1-based attempt number.
pub async fn poll_until<T, E, F, Fut>(policy: PollPolicy, mut check: F) -> Result<T, PollError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = PollStep<T, E>>,
{
    for attempt in 1..=policy.max_attempts {
        match check(attempt).await {
            PollStep::Ready(value) => return Ok(value),
            PollStep::Failed(err) => return Err(PollError::Failed(err)),
            PollStep::Pending => {
                if attempt < policy.max_attempts {
                    tokio::time::sleep(policy.interval).await;
                }
            }
        }
    }
    Err(PollError::Exhausted {
        attempts: policy.max_attempts,
    })
}
