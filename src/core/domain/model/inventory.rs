//! Inventory snapshot of cluster resources.
//!
//! The resolver works against a snapshot fetched once per command from the
//! `/cluster/resources` endpoint. The response is a heterogeneous list of
//! resources (VMs, containers, storage, nodes, pools), each identified by a
//! `type` field; we model it as an enum for type safety. The snapshot is
//! never re-queried mid-resolution, so a target set stays consistent even
//! if cluster state changes concurrently.

use serde::{Deserialize, Serialize};

use crate::core::domain::model::target::ResourceKind;

/// A resource discovered in the Proxmox cluster.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClusterResource {
    /// A QEMU virtual machine.
    Qemu(GuestResource),
    /// An LXC container.
    Lxc(GuestResource),
    /// A storage entity.
    Storage(StorageResource),
    /// A node in the cluster.
    Node(NodeResource),
    /// A resource pool.
    Pool(PoolResource),
    /// Resource types this client does not act on (e.g. `sdn`).
    #[serde(other)]
    Other,
}

/// A QEMU VM or LXC container as listed by `/cluster/resources`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GuestResource {
    /// The guest identifier (unique per cluster).
    pub vmid: u32,
    /// The Proxmox node where this guest resides.
    pub node: String,
    /// Human-readable name (may be absent).
    #[serde(default)]
    pub name: Option<String>,
    /// Guest status (e.g. `running`, `stopped`).
    pub status: String,
    /// Semicolon-separated tags string, as Proxmox stores it.
    #[serde(default)]
    pub tags: Option<String>,
}

impl GuestResource {
    /// The individual tags on this guest.
    pub fn tag_list(&self) -> Vec<&str> {
        self.tags
            .as_deref()
            .unwrap_or("")
            .split(';')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect()
    }
}

/// A storage entity.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StorageResource {
    /// Storage identifier (e.g. `local`, `nfs-storage`).
    pub storage: String,
    /// The node exposing this storage.
    pub node: String,
    /// Storage status (e.g. `available`).
    #[serde(default)]
    pub status: Option<String>,
}

/// A node in the cluster.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NodeResource {
    /// Node name.
    pub node: String,
    /// Node status (e.g. `online`, `offline`).
    #[serde(default)]
    pub status: Option<String>,
}

/// A resource pool.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PoolResource {
    /// Pool identifier.
    pub pool: String,
}

/// Everything the resolver needs to know about the cluster, fetched once
/// per command invocation and passed by reference into the resolver. No
/// process-wide cache: the snapshot's lifetime is the command's lifetime.
#[derive(Debug, Clone, Default)]
pub struct InventorySnapshot {
    resources: Vec<ClusterResource>,
}

impl InventorySnapshot {
    /// Builds a snapshot from a `/cluster/resources` response.
    pub fn new(resources: Vec<ClusterResource>) -> Self {
        Self { resources }
    }

    /// All guests (VMs and containers) in the cluster.
    pub fn guests(&self) -> impl Iterator<Item = (ResourceKind, &GuestResource)> {
        self.resources.iter().filter_map(|r| match r {
            ClusterResource::Qemu(g) => Some((ResourceKind::Vm, g)),
            ClusterResource::Lxc(g) => Some((ResourceKind::Container, g)),
            _ => None,
        })
    }

    /// Guests matching a numeric identifier, across both guest kinds.
    pub fn guests_by_vmid(&self, vmid: u32) -> Vec<(ResourceKind, &GuestResource)> {
        self.guests().filter(|(_, g)| g.vmid == vmid).collect()
    }

    /// Guests carrying the given tag.
    pub fn guests_with_tag<'a>(
        &'a self,
        tag: &'a str,
    ) -> impl Iterator<Item = (ResourceKind, &'a GuestResource)> {
        self.guests()
            .filter(move |(_, g)| g.tag_list().contains(&tag))
    }

    /// All node names in the cluster.
    pub fn node_names(&self) -> Vec<&str> {
        self.resources
            .iter()
            .filter_map(|r| match r {
                ClusterResource::Node(n) => Some(n.node.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Every distinct tag used by any guest, sorted.
    pub fn known_tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self
            .guests()
            .flat_map(|(_, g)| g.tag_list().into_iter().map(str::to_string).collect::<Vec<_>>())
            .collect();
        tags.sort();
        tags.dedup();
        tags
    }
}
