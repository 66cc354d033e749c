use thiserror::Error;

/// The main error type for batch engine operations.
///
/// This enum covers the failures that abort a whole command: transport and
/// authentication problems, API rejections that happen before a task is
/// created, resolution failures, and a declined confirmation. Per-target
/// poll outcomes (`Failure`, `Timeout`) are not errors; they are carried
/// in [`TaskStatus`](crate::TaskStatus) so that one target's fate never
/// aborts its siblings.
#[derive(Error, Debug)]
pub enum PveError {
    /// Transport-level failure: the node or cluster endpoint could not be
    /// reached, or its response could not be parsed.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Authentication failure (invalid credentials or an expired ticket
    /// that could not be refreshed).
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// The API rejected a request before creating a task (permission
    /// denied, invalid parameters, resource locked, ...).
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Target resolution failed. Fatal for the whole command: if any
    /// explicit identifier is invalid, the user's intended scope cannot
    /// be trusted and no partial target set is acted upon.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// The user declined the batch confirmation prompt.
    #[error("Aborted by user")]
    Aborted,
}

/// Failures while expanding a target specification into concrete resources.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// An identifier in the spec could not be parsed.
    #[error("Invalid target ID: '{0}'")]
    InvalidId(String),

    /// An explicit identifier does not exist in the inventory snapshot.
    #[error("Target '{0}' not found in cluster")]
    UnknownTarget(String),

    /// A bare numeric identifier matches both a VM and a container.
    /// The resolver never guesses; a `vm:`/`ct:` qualifier is required.
    #[error("Target '{0}' is ambiguous: both a VM and a container use this ID (qualify with 'vm:' or 'ct:')")]
    AmbiguousTarget(String),

    /// Interactive selection yielded zero items but the command requires
    /// at least one target.
    #[error("Selection is empty")]
    EmptySelection,
}

/// Type alias for Results that may fail with a PveError.
pub type PveResult<T> = Result<T, PveError>;
