//! The contract the batch engine requires from the transport layer.
//!
//! The engine treats the cluster API as three operations: fetch an
//! inventory snapshot (once per command), submit an action (safe to call
//! concurrently for different targets), and poll a task handle (cheap,
//! side-effect-free, callable repeatedly). The shipped implementation is
//! [`ApiClient`](crate::core::infrastructure::api_client::ApiClient);
//! tests and embedders can substitute their own.

use async_trait::async_trait;

use crate::core::domain::{
    error::PveResult,
    model::{
        inventory::InventorySnapshot,
        task::{ActionRequest, TaskHandle},
    },
};

/// The state of a remote task as reported by one status poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteTaskState {
    /// The task is still executing.
    Running,
    /// The task stopped with exit status OK.
    Succeeded,
    /// The task stopped unsuccessfully.
    Failed(String),
}

/// Request/response contract against the cluster management API.
#[async_trait]
pub trait ClusterApi: Send + Sync {
    /// Fetches a snapshot of all cluster resources. Called once per
    /// command invocation, by the resolver.
    async fn fetch_inventory(&self) -> PveResult<InventorySnapshot>;

    /// Submits one asynchronous action. On acceptance the API returns a
    /// task handle; a rejection before a task is created surfaces as an
    /// error local to this target.
    async fn submit_action(&self, request: &ActionRequest) -> PveResult<TaskHandle>;

    /// Queries the current state of an accepted task.
    async fn poll_task(&self, handle: &TaskHandle) -> PveResult<RemoteTaskState>;
}
