//! Target specification and resolved target types.
//!
//! A batch command starts from a [`TargetSpec`] (what the user typed) and
//! ends with an ordered set of [`ResolvedTarget`] values (concrete cluster
//! resources). Resolution happens once, against a single inventory
//! snapshot, before anything is dispatched.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::domain::error::ResolveError;

/// The kind of cluster resource a target refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// A QEMU virtual machine.
    Vm,
    /// An LXC container.
    Container,
    /// A cluster node.
    Node,
    /// A storage entity.
    Storage,
    /// A resource pool.
    Pool,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ResourceKind::Vm => "VM",
            ResourceKind::Container => "CT",
            ResourceKind::Node => "node",
            ResourceKind::Storage => "storage",
            ResourceKind::Pool => "pool",
        };
        f.write_str(label)
    }
}

/// A single identifier from a target list, before resolution.
///
/// Guest identifiers may carry a kind qualifier (`vm:105`, `ct:105`) to
/// disambiguate numeric IDs shared between a VM and a container. A bare
/// numeric ID that matches both kinds fails resolution instead of picking
/// one silently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetQuery {
    /// The identifier as given (vmid for guests, name for other kinds).
    pub id: String,
    /// Optional kind qualifier parsed from a `vm:`/`ct:` prefix.
    pub kind: Option<ResourceKind>,
}

impl TargetQuery {
    /// Parses one element of an ID list.
    ///
    /// Accepts bare vmids (`"100"`) and qualified forms (`"vm:100"`,
    /// `"ct:200"`). Whitespace around the element is ignored.
    pub fn parse(raw: &str) -> Result<Self, ResolveError> {
        let trimmed = raw.trim();
        let (kind, id) = match trimmed.split_once(':') {
            Some(("vm", rest)) => (Some(ResourceKind::Vm), rest),
            Some(("ct", rest)) => (Some(ResourceKind::Container), rest),
            Some(_) => return Err(ResolveError::InvalidId(trimmed.to_string())),
            None => (None, trimmed),
        };
        if id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()) {
            return Err(ResolveError::InvalidId(trimmed.to_string()));
        }
        Ok(Self {
            id: id.to_string(),
            kind,
        })
    }
}

/// What the user asked a batch command to act on.
///
/// Immutable once parsed. Interactive menus are out of scope; a finished
/// multi-select arrives here as [`TargetSpec::Selection`].
///
/// Specs address guests only: every identifier is a numeric vmid and tag
/// filters match guests. Nodes, storage and pools appear in the
/// [`ResourceKind`] model for inventory reporting, but no spec form
/// produces them as action targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSpec {
    /// An explicit list of already-parsed identifiers.
    Ids(Vec<TargetQuery>),
    /// A raw comma-separated identifier string (e.g. `"100,101,102"`).
    List(String),
    /// All guests carrying the given tag.
    Tag(String),
    /// The outcome of an interactive multi-select.
    Selection(Vec<TargetQuery>),
}

/// A concrete addressable cluster resource produced by the resolver.
///
/// `kind` + `id` + `node` uniquely identify the resource for the lifetime
/// of the command. Read-only after resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    /// Resource kind.
    pub kind: ResourceKind,
    /// Identifier (vmid for guests, name for nodes/storage/pools).
    pub id: String,
    /// The node hosting the resource; actions and task polls go there.
    pub node: String,
    /// Human-readable name for reporting.
    pub name: String,
}

impl fmt::Display for ResolvedTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.id)
    }
}
