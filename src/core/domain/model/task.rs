//! Task tracking and per-target result types.
//!
//! A [`TaskHandle`] references an asynchronous action the cluster API has
//! accepted (a Proxmox UPID, scoped to the node that executes it). Handles
//! live only for the command that created them and are never persisted.

use std::fmt;

use crate::core::domain::model::{operation::Operation, target::ResolvedTarget};

/// One action to submit: a resolved target plus the operation (with its
/// parameters) to perform on it. Built by the dispatcher, one per target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRequest {
    /// The resource acted on.
    pub target: ResolvedTarget,
    /// The operation, carrying its own parameters.
    pub operation: Operation,
}

/// Reference to an accepted asynchronous action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskHandle {
    /// The node executing the task; polls must be addressed to it.
    pub node: String,
    /// The Proxmox task identifier (UPID string).
    pub upid: String,
}

impl fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.upid)
    }
}

/// The state a tracked task is in, as seen by the poller.
///
/// Transitions are monotone: once a task leaves `Running` it never goes
/// back, and terminal states (`Success`, `Failure`) never change again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    /// The task has been accepted and has not finished yet.
    Running,
    /// The task finished with exit status OK.
    Success,
    /// The task finished unsuccessfully, or dispatch was rejected outright.
    Failure(String),
    /// The task was still running when the deadline elapsed. The remote
    /// task is left alone; this means "still running, check later", not a
    /// definitive failure.
    Timeout,
}

impl TaskStatus {
    /// Whether no further transition can occur.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TaskStatus::Running)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Running => f.write_str("running"),
            TaskStatus::Success => f.write_str("success"),
            TaskStatus::Failure(reason) => write!(f, "failed: {}", reason),
            TaskStatus::Timeout => f.write_str("timeout (still running, check cluster)"),
        }
    }
}

/// The final outcome for one target. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetResult {
    /// The target this result belongs to.
    pub target: ResolvedTarget,
    /// Terminal status reached via dispatch or polling.
    pub status: TaskStatus,
}

/// Overall exit-status signal for the CLI layer.
///
/// Each variant maps to a distinct process exit code so scripts chaining
/// batch commands can tell partial failure from full success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// Every target succeeded.
    AllSucceeded,
    /// At least one target failed or timed out.
    PartialFailure,
    /// The user declined the confirmation prompt.
    Aborted,
}

impl ExitStatus {
    /// The process exit code for this outcome.
    pub fn code(&self) -> i32 {
        match self {
            ExitStatus::AllSucceeded => 0,
            ExitStatus::PartialFailure => 2,
            ExitStatus::Aborted => 130,
        }
    }
}

/// The consolidated outcome of a batch command.
///
/// Results are ordered exactly as the resolver produced the targets,
/// independent of completion order, so reporting is deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    results: Vec<TargetResult>,
}

impl BatchReport {
    pub(crate) fn new(results: Vec<TargetResult>) -> Self {
        Self { results }
    }

    /// The ordered per-target detail list.
    pub fn results(&self) -> &[TargetResult] {
        &self.results
    }

    /// Number of targets that succeeded.
    pub fn succeeded(&self) -> usize {
        self.count(|s| matches!(s, TaskStatus::Success))
    }

    /// Number of targets that failed (at dispatch or while polled).
    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, TaskStatus::Failure(_)))
    }

    /// Number of targets whose tasks were still running at the deadline.
    pub fn timed_out(&self) -> usize {
        self.count(|s| matches!(s, TaskStatus::Timeout))
    }

    /// The exit-status signal derived from the per-target outcomes.
    pub fn exit_status(&self) -> ExitStatus {
        if self.failed() > 0 || self.timed_out() > 0 {
            ExitStatus::PartialFailure
        } else {
            ExitStatus::AllSucceeded
        }
    }

    fn count(&self, pred: impl Fn(&TaskStatus) -> bool) -> usize {
        self.results.iter().filter(|r| pred(&r.status)).count()
    }
}
