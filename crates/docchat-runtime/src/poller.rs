//! Drives a remote asynchronous run to a terminal state.
//!
//! Adaptive-delay polling: poll at a small base interval, and after an
//! initial grace count of polls grow the interval by a fixed step up to a
//! cap. A hard wall-clock deadline bounds the whole wait; exceeding it
//! abandons the turn. The remote run is left outstanding in that case —
//! nothing here cancels it, which is a known resource-leak risk that is
//! logged when it happens.

use std::future::Future;
use std::time::Duration;

use docchat_client::types::{RunObject, RunStatus};
use docchat_client::{AgentsClient, ClientError};
use docchat_core::ids::{RunId, ThreadId};
use metrics::counter;
use tracing::{debug, warn};

use crate::errors::OrchestratorError;

/// Delay and deadline tuning for one polling loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollProfile {
    /// Initial interval between polls.
    pub base_delay: Duration,
    /// Amount added to the interval per poll once the grace count is spent.
    pub step: Duration,
    /// Interval cap.
    pub max_delay: Duration,
    /// Number of polls at the base interval before the interval grows.
    pub grace_polls: u32,
    /// Hard wall-clock limit for the whole wait.
    pub deadline: Duration,
}

impl PollProfile {
    /// Tuning for a new-conversation turn. First turns do index builds and
    /// thread setup server-side, so the window is generous.
    #[must_use]
    pub fn new_conversation() -> Self {
        Self {
            base_delay: Duration::from_secs(2),
            step: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            grace_polls: 5,
            deadline: Duration::from_secs(300),
        }
    }

    /// Tuning for a continuation turn.
    #[must_use]
    pub fn continuation() -> Self {
        Self {
            base_delay: Duration::from_secs(1),
            step: Duration::from_secs(1),
            max_delay: Duration::from_secs(5),
            grace_polls: 3,
            deadline: Duration::from_secs(120),
        }
    }
}

/// Poll `run` on `thread` until it reaches a terminal state.
///
/// `Completed` resolves to the final run object; `Failed` and `Cancelled`
/// resolve to [`OrchestratorError::RunFailed`] carrying the remote error
/// message when one is present.
pub async fn wait_for_run(
    agents: &AgentsClient,
    thread: &ThreadId,
    run: &RunId,
    profile: &PollProfile,
) -> Result<RunObject, OrchestratorError> {
    let outcome = drive(profile, || agents.get_run(thread, run)).await;
    if matches!(outcome, Err(OrchestratorError::RunTimeout { .. })) {
        warn!(
            thread_id = %thread,
            run_id = %run,
            "poll deadline exceeded; remote run left outstanding"
        );
    }
    outcome
}

/// Polling loop over an arbitrary status fetch.
///
/// Separated from [`wait_for_run`] so tests can drive it under paused time.
async fn drive<F, Fut>(profile: &PollProfile, mut fetch: F) -> Result<RunObject, OrchestratorError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<RunObject, ClientError>>,
{
    let started = tokio::time::Instant::now();
    let mut delay = profile.base_delay;
    let mut polls: u32 = 0;

    loop {
        if started.elapsed() >= profile.deadline {
            counter!("run_poll_timeouts_total").increment(1);
            return Err(OrchestratorError::RunTimeout {
                deadline_secs: profile.deadline.as_secs(),
            });
        }

        tokio::time::sleep(delay).await;
        let run = fetch().await?;
        counter!("run_polls_total").increment(1);

        if run.status.is_terminal() {
            debug!(run_id = %run.id, status = ?run.status, polls, "run reached terminal state");
            return match run.status {
                RunStatus::Completed => Ok(run),
                _ => Err(OrchestratorError::RunFailed {
                    message: run.last_error.map(|e| e.message),
                }),
            };
        }

        polls += 1;
        if polls > profile.grace_polls {
            delay = (delay + profile.step).min(profile.max_delay);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
