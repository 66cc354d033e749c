//! Management operations and their per-operation parameters.
//!
//! Each operation carries its own strongly-typed parameter fields instead
//! of an open-ended map; the API layer turns them into the request body
//! expected by the corresponding Proxmox endpoint.

use std::fmt;

use serde::Serialize;

/// An asynchronous management action that can be issued against a guest.
///
/// The engine never special-cases idempotent responses (e.g. stopping an
/// already-stopped guest): the API is the source of truth for "already in
/// desired state" and reports such submissions as success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Start the guest.
    Start,
    /// Hard-stop the guest.
    Stop {
        /// Seconds to wait before the stop is forced on the cluster side.
        timeout: Option<u32>,
    },
    /// Gracefully shut the guest down via ACPI / the guest agent.
    Shutdown {
        /// Seconds to wait for the guest to power off.
        timeout: Option<u32>,
        /// Hard-stop the guest if the graceful shutdown times out.
        force_stop: bool,
    },
    /// Reboot the guest.
    Reboot {
        /// Seconds to wait for the shutdown phase.
        timeout: Option<u32>,
    },
    /// Suspend the guest.
    Suspend,
    /// Resume a suspended guest.
    Resume,
    /// Delete the guest.
    Remove {
        /// Also remove the vmid from backup jobs and HA resources.
        purge: bool,
        /// Also destroy disks that are not referenced in the config.
        destroy_unreferenced: bool,
    },
}

impl Operation {
    /// Whether this operation needs the confirmation gate.
    ///
    /// Start is the only operation that passes the gate silently;
    /// everything else changes running state in a way the user should
    /// acknowledge, including Resume (it wakes a guest somebody suspended
    /// on purpose).
    pub fn is_destructive(&self) -> bool {
        !matches!(self, Operation::Start)
    }

    /// The `status/{...}` endpoint suffix for this operation, or `None`
    /// for operations that use a different HTTP shape (Remove is a DELETE
    /// on the guest itself).
    pub(crate) fn status_endpoint(&self) -> Option<&'static str> {
        match self {
            Operation::Start => Some("start"),
            Operation::Stop { .. } => Some("stop"),
            Operation::Shutdown { .. } => Some("shutdown"),
            Operation::Reboot { .. } => Some("reboot"),
            Operation::Suspend => Some("suspend"),
            Operation::Resume => Some("resume"),
            Operation::Remove { .. } => None,
        }
    }

    /// Imperative label for prompts and log lines.
    pub fn verb(&self) -> &'static str {
        match self {
            Operation::Start => "Start",
            Operation::Stop { .. } => "Hard stop",
            Operation::Shutdown { .. } => "Shutdown",
            Operation::Reboot { .. } => "Reboot",
            Operation::Suspend => "Suspend",
            Operation::Resume => "Resume",
            Operation::Remove { .. } => "Delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

/// Request body for stop/shutdown/reboot endpoints.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct GuestPowerParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,
    #[serde(rename = "forceStop", skip_serializing_if = "Option::is_none")]
    pub force_stop: Option<u8>,
}

impl GuestPowerParams {
    pub fn new(timeout: Option<u32>, force_stop: bool) -> Option<Self> {
        if timeout.is_none() && !force_stop {
            return None;
        }
        Some(Self {
            timeout,
            force_stop: force_stop.then_some(1),
        })
    }
}
