//! Task polling: tracks each accepted action to a terminal state.
//!
//! Each handle gets its own supervised poll loop; a slow target never
//! delays result availability for a fast one. Deadlines come from the
//! per-operation timeout table. A task still running at its deadline is
//! reported as [`TaskStatus::Timeout`], the remote task is left running
//! and no cancel call is ever issued (Proxmox task semantics do not
//! guarantee cancel-ability). Transient poll errors are retried a bounded
//! number of times with doubling backoff; this is the only retry policy
//! in the engine, actions themselves are never retried.

use std::sync::Arc;
use std::time::Duration;

use tokio::{task::JoinSet, time::Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::core::domain::{
    api::{ClusterApi, RemoteTaskState},
    model::{config::EngineConfig, task::{TaskHandle, TaskStatus}},
};

/// The terminal outcome of polling one handle.
#[derive(Debug)]
pub struct PollOutcome {
    /// The target's position in the resolver's output order.
    pub index: usize,
    /// Terminal status (`Success`, `Failure` or `Timeout`).
    pub status: TaskStatus,
}

/// Polls a set of task handles concurrently until each terminates.
pub struct TaskPoller<C: ClusterApi + 'static> {
    api: Arc<C>,
    poll_interval: Duration,
    poll_retries: u32,
    poll_retry_backoff: Duration,
    cancel: CancellationToken,
}

impl<C: ClusterApi + 'static> TaskPoller<C> {
    pub fn new(api: Arc<C>, config: &EngineConfig, cancel: CancellationToken) -> Self {
        Self {
            api,
            poll_interval: config.poll_interval,
            poll_retries: config.poll_retries,
            poll_retry_backoff: config.poll_retry_backoff,
            cancel,
        }
    }

    /// Tracks every handle to a terminal state.
    ///
    /// Outcomes are returned as they complete, not in submission order;
    /// the aggregator reorders by index. On cancellation, handles that
    /// have not yet terminated report `Timeout` without further polls.
    pub async fn poll_all(&self, handles: Vec<(usize, TaskHandle, Duration)>) -> Vec<PollOutcome> {
        let mut join_set = JoinSet::new();

        for (index, handle, deadline) in handles {
            let api = Arc::clone(&self.api);
            let cancel = self.cancel.clone();
            let interval = self.poll_interval;
            let retries = self.poll_retries;
            let backoff = self.poll_retry_backoff;
            join_set.spawn(async move {
                let status =
                    poll_one(api.as_ref(), &handle, deadline, interval, retries, backoff, cancel)
                        .await;
                PollOutcome { index, status }
            });
        }

        let mut outcomes = Vec::new();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(join_error) => warn!(%join_error, "poll task panicked"),
            }
        }
        outcomes
    }
}

/// Polls a single handle until terminal state, deadline or cancellation.
async fn poll_one<C: ClusterApi>(
    api: &C,
    handle: &TaskHandle,
    deadline: Duration,
    interval: Duration,
    retries: u32,
    backoff: Duration,
    cancel: CancellationToken,
) -> TaskStatus {
    let deadline_at = Instant::now() + deadline;

    loop {
        if cancel.is_cancelled() {
            debug!(upid = %handle, "interrupted, leaving task running");
            return TaskStatus::Timeout;
        }

        match poll_with_retries(api, handle, retries, backoff, &cancel).await {
            Ok(RemoteTaskState::Succeeded) => return TaskStatus::Success,
            Ok(RemoteTaskState::Failed(reason)) => return TaskStatus::Failure(reason),
            Ok(RemoteTaskState::Running) => {}
            Err(status) => return status,
        }

        if Instant::now() >= deadline_at {
            debug!(upid = %handle, "deadline elapsed, task left running");
            return TaskStatus::Timeout;
        }

        tokio::select! {
            _ = cancel.cancelled() => return TaskStatus::Timeout,
            _ = tokio::time::sleep_until(deadline_at.min(Instant::now() + interval)) => {}
        }
    }
}

/// One status query with bounded retries on transient transport errors.
///
/// Returns `Err(TaskStatus::Failure)` once retries are exhausted, or
/// `Err(TaskStatus::Timeout)` if cancellation arrives mid-backoff.
async fn poll_with_retries<C: ClusterApi>(
    api: &C,
    handle: &TaskHandle,
    retries: u32,
    backoff: Duration,
    cancel: &CancellationToken,
) -> Result<RemoteTaskState, TaskStatus> {
    let mut delay = backoff;
    let mut attempt = 0;

    loop {
        match api.poll_task(handle).await {
            Ok(state) => return Ok(state),
            Err(error) => {
                attempt += 1;
                if attempt > retries {
                    warn!(upid = %handle, %error, "polling unreachable, giving up");
                    return Err(TaskStatus::Failure(format!(
                        "polling unreachable: {}",
                        error
                    )));
                }
                debug!(upid = %handle, %error, attempt, "transient poll error, retrying");
                tokio::select! {
                    _ = cancel.cancelled() => return Err(TaskStatus::Timeout),
                    _ = tokio::time::sleep(delay) => {}
                }
                delay *= 2;
            }
        }
    }
}
