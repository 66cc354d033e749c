//! Action dispatch: parallel submission of one action per target.
//!
//! Submission is best effort per target, never all-or-nothing: a rejected
//! submission degrades that target's result and leaves its siblings alone.
//! In-flight submissions are capped by a semaphore so a large target set
//! cannot overwhelm the API endpoint; excess targets queue for a slot.

use std::sync::Arc;

use tokio::{sync::Semaphore, task::JoinSet};
use tracing::{debug, warn};

use crate::core::domain::{
    api::ClusterApi,
    error::PveError,
    model::{
        operation::Operation,
        target::ResolvedTarget,
        task::{ActionRequest, TaskHandle},
    },
};

/// What happened when one target's action was submitted.
#[derive(Debug)]
pub struct DispatchOutcome {
    /// The target's position in the resolver's output order.
    pub index: usize,
    /// The target the action was submitted for.
    pub target: ResolvedTarget,
    /// A task handle on acceptance, or the immediate rejection.
    pub result: Result<TaskHandle, PveError>,
}

/// Submits one management action per resolved target.
pub struct ActionDispatcher<C: ClusterApi + 'static> {
    api: Arc<C>,
    max_in_flight: usize,
}

impl<C: ClusterApi + 'static> ActionDispatcher<C> {
    pub fn new(api: Arc<C>, max_in_flight: usize) -> Self {
        Self {
            api,
            max_in_flight: max_in_flight.max(1),
        }
    }

    /// Fans the operation out across all targets.
    ///
    /// Submission of one target's action never blocks another's beyond
    /// the in-flight ceiling. The returned outcomes are ordered by the
    /// targets' resolution order, one entry per target.
    pub async fn dispatch(
        &self,
        targets: &[ResolvedTarget],
        operation: &Operation,
    ) -> Vec<DispatchOutcome> {
        let semaphore = Arc::new(Semaphore::new(self.max_in_flight));
        let mut join_set = JoinSet::new();

        for (index, target) in targets.iter().cloned().enumerate() {
            let api = Arc::clone(&self.api);
            let semaphore = Arc::clone(&semaphore);
            let request = ActionRequest {
                target,
                operation: operation.clone(),
            };
            join_set.spawn(async move {
                // The semaphore is never closed while we hold it.
                let _permit = semaphore.acquire_owned().await.expect("semaphore closed");
                debug!(target = %request.target, operation = %request.operation, "submitting action");
                let result = api.submit_action(&request).await;
                if let Err(error) = &result {
                    warn!(target = %request.target, %error, "submission rejected");
                }
                DispatchOutcome {
                    index,
                    target: request.target,
                    result,
                }
            });
        }

        let mut outcomes = Vec::with_capacity(targets.len());
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(join_error) => {
                    // A panicked submission task must not take the batch
                    // down; there is no outcome to attribute, so surface
                    // it loudly and keep joining.
                    warn!(%join_error, "submission task panicked");
                }
            }
        }
        outcomes.sort_by_key(|o| o.index);
        outcomes
    }
}
