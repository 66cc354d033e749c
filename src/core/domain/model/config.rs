//! Engine configuration.
//!
//! Everything tunable about the batch pipeline lives here as plain values
//! with sensible defaults; there is no global state. Timeout defaults are
//! a configurable table per operation kind, not hard-coded constants.

use std::time::Duration;

use crate::core::domain::model::operation::Operation;

/// Client-side rate limiting applied to every API request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Sustained requests per second.
    pub requests_per_second: u32,
    /// Burst capacity above the sustained rate.
    pub burst_size: u32,
}

/// Per-operation deadlines for task completion.
///
/// Power transitions get short deadlines; removal can involve disk
/// cleanup and gets a longer one. Every operation maps to exactly one
/// entry via [`TimeoutTable::for_operation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeoutTable {
    /// Deadline for start/resume.
    pub start: Duration,
    /// Deadline for stop/shutdown/reboot/suspend.
    pub power_down: Duration,
    /// Deadline for guest removal.
    pub remove: Duration,
}

impl TimeoutTable {
    /// The deadline applying to one operation.
    pub fn for_operation(&self, operation: &Operation) -> Duration {
        match operation {
            Operation::Start | Operation::Resume => self.start,
            Operation::Stop { .. }
            | Operation::Shutdown { .. }
            | Operation::Reboot { .. }
            | Operation::Suspend => self.power_down,
            Operation::Remove { .. } => self.remove,
        }
    }
}

impl Default for TimeoutTable {
    fn default() -> Self {
        Self {
            start: Duration::from_secs(120),
            power_down: Duration::from_secs(120),
            remove: Duration::from_secs(300),
        }
    }
}

/// Tunables for the batch pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Interval between status polls for one task.
    pub poll_interval: Duration,
    /// Per-operation task deadlines.
    pub timeouts: TimeoutTable,
    /// Maximum concurrently in-flight action submissions. Matches typical
    /// cluster API connection limits; excess targets queue for a slot.
    pub max_in_flight: usize,
    /// How many times a transient poll error is retried before the target
    /// is marked failed. Actions themselves are never retried.
    pub poll_retries: u32,
    /// Delay before the first poll retry; doubles per attempt.
    pub poll_retry_backoff: Duration,
    /// Optional client-side request rate limit.
    pub rate_limit: Option<RateLimitConfig>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            timeouts: TimeoutTable::default(),
            max_in_flight: 10,
            poll_retries: 3,
            poll_retry_backoff: Duration::from_millis(500),
            rate_limit: None,
        }
    }
}
