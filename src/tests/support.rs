//! Shared test doubles and fixtures for the batch engine tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::{
    ActionRequest, ClusterApi, ClusterResource, GuestResource, InventorySnapshot, PveError,
    PveResult, RemoteTaskState, TaskHandle,
};

/// How the fake API treats one target, keyed by vmid.
#[derive(Debug, Clone)]
pub enum TargetBehavior {
    /// Reject the submission outright (no task is created).
    RejectDispatch(String),
    /// Report `running` for this many polls, then succeed.
    SucceedAfter(u32),
    /// Report `running` for this many polls, then fail with the reason.
    FailAfter(u32, String),
    /// Never leave the running state.
    RunForever,
    /// Return transport errors for this many polls, then succeed.
    PollErrorsThenSucceed(u32),
    /// Every poll is a transport error.
    PollErrorsForever,
}

/// Scripted in-memory implementation of the cluster API contract.
pub struct FakeApi {
    inventory: InventorySnapshot,
    behaviors: HashMap<String, TargetBehavior>,
    submissions: Mutex<Vec<String>>,
    poll_counts: Mutex<HashMap<String, u32>>,
}

impl FakeApi {
    pub fn new(inventory: InventorySnapshot) -> Self {
        Self {
            inventory,
            behaviors: HashMap::new(),
            submissions: Mutex::new(Vec::new()),
            poll_counts: Mutex::new(HashMap::new()),
        }
    }

    pub fn behavior(mut self, vmid: u32, behavior: TargetBehavior) -> Self {
        self.behaviors.insert(vmid.to_string(), behavior);
        self
    }

    /// The vmids whose submissions reached the API, in arrival order.
    pub fn submissions(&self) -> Vec<String> {
        self.submissions.lock().unwrap().clone()
    }

    fn behavior_for(&self, id: &str) -> TargetBehavior {
        self.behaviors
            .get(id)
            .cloned()
            .unwrap_or(TargetBehavior::SucceedAfter(0))
    }
}

#[async_trait]
impl ClusterApi for FakeApi {
    async fn fetch_inventory(&self) -> PveResult<InventorySnapshot> {
        Ok(self.inventory.clone())
    }

    async fn submit_action(&self, request: &ActionRequest) -> PveResult<TaskHandle> {
        self.submissions
            .lock()
            .unwrap()
            .push(request.target.id.clone());

        match self.behavior_for(&request.target.id) {
            TargetBehavior::RejectDispatch(message) => Err(PveError::Api {
                status: 500,
                message,
            }),
            _ => Ok(TaskHandle {
                node: request.target.node.clone(),
                upid: request.target.id.clone(),
            }),
        }
    }

    async fn poll_task(&self, handle: &TaskHandle) -> PveResult<RemoteTaskState> {
        let count = {
            let mut counts = self.poll_counts.lock().unwrap();
            let entry = counts.entry(handle.upid.clone()).or_insert(0);
            *entry += 1;
            *entry
        };

        match self.behavior_for(&handle.upid) {
            TargetBehavior::RejectDispatch(_) => {
                unreachable!("rejected targets are never polled")
            }
            TargetBehavior::SucceedAfter(n) => {
                if count > n {
                    Ok(RemoteTaskState::Succeeded)
                } else {
                    Ok(RemoteTaskState::Running)
                }
            }
            TargetBehavior::FailAfter(n, reason) => {
                if count > n {
                    Ok(RemoteTaskState::Failed(reason))
                } else {
                    Ok(RemoteTaskState::Running)
                }
            }
            TargetBehavior::RunForever => Ok(RemoteTaskState::Running),
            TargetBehavior::PollErrorsThenSucceed(n) => {
                if count > n {
                    Ok(RemoteTaskState::Succeeded)
                } else {
                    Err(PveError::Connection("connection reset".to_string()))
                }
            }
            TargetBehavior::PollErrorsForever => {
                Err(PveError::Connection("connection reset".to_string()))
            }
        }
    }
}

/// A QEMU guest entry for inventory fixtures.
pub fn qemu(vmid: u32, node: &str, name: &str, status: &str, tags: Option<&str>) -> ClusterResource {
    ClusterResource::Qemu(GuestResource {
        vmid,
        node: node.to_string(),
        name: Some(name.to_string()),
        status: status.to_string(),
        tags: tags.map(str::to_string),
    })
}

/// An LXC guest entry for inventory fixtures.
pub fn lxc(vmid: u32, node: &str, name: &str, status: &str, tags: Option<&str>) -> ClusterResource {
    ClusterResource::Lxc(GuestResource {
        vmid,
        node: node.to_string(),
        name: Some(name.to_string()),
        status: status.to_string(),
        tags: tags.map(str::to_string),
    })
}

/// A three-VM inventory on two nodes, the common fixture.
pub fn default_inventory() -> InventorySnapshot {
    InventorySnapshot::new(vec![
        qemu(100, "pve1", "web-01", "running", Some("prod;web")),
        qemu(101, "pve1", "web-02", "running", Some("prod;web")),
        qemu(102, "pve2", "db-01", "stopped", Some("prod;db")),
    ])
}
