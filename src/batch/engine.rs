//! The batch pipeline: Resolver, Gate, Dispatcher, Poller, Aggregator.
//!
//! One engine run manages one user command's fan-out/fan-in lifecycle:
//! resolve targets against a fresh inventory snapshot, confirm once,
//! submit one action per target, track every accepted task to a terminal
//! state and fold everything into a single ordered report. Nothing
//! survives the run; task handles are never persisted.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{
    batch::{
        aggregator::ResultAggregator,
        confirm::{ConfirmPrompt, ConfirmationGate, GateDecision},
        dispatcher::ActionDispatcher,
        poller::TaskPoller,
        resolver::TargetResolver,
    },
    core::domain::{
        api::ClusterApi,
        error::{PveError, PveResult},
        model::{
            config::EngineConfig,
            operation::Operation,
            target::TargetSpec,
            task::{BatchReport, TaskStatus},
        },
    },
};

/// Per-command knobs that are not engine configuration.
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Suppress the confirmation gate (the `--yes` flag).
    pub skip_confirmation: bool,
}

/// Coordinates one batch command from target spec to final report.
pub struct BatchEngine<C: ClusterApi + 'static> {
    api: Arc<C>,
    config: EngineConfig,
    cancel: CancellationToken,
}

impl<C: ClusterApi + 'static> BatchEngine<C> {
    pub fn new(api: Arc<C>, config: EngineConfig) -> Self {
        Self {
            api,
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Uses the given token for interrupt handling (e.g. wired to Ctrl-C
    /// by the CLI layer). Cancelling it stops new poll requests promptly;
    /// targets without a terminal state report `Timeout` and already
    /// dispatched remote actions are left untouched.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Runs the full pipeline for one command.
    ///
    /// # Errors
    /// - [`PveError::Resolve`] if the target spec cannot be expanded;
    ///   resolution errors are fatal and nothing is dispatched.
    /// - [`PveError::Aborted`] if the user declines the confirmation.
    /// - [`PveError::Connection`]/[`PveError::Authentication`] if the
    ///   inventory fetch itself fails.
    ///
    /// Dispatch and poll failures are not errors: they surface as
    /// per-target `Failure`/`Timeout` entries in the report.
    pub async fn run<P: ConfirmPrompt + ?Sized>(
        &self,
        spec: &TargetSpec,
        operation: &Operation,
        prompt: &P,
        options: &BatchOptions,
    ) -> PveResult<BatchReport> {
        // Resolution: one snapshot per command, fetched here and never
        // re-queried mid-resolution.
        let inventory = self.api.fetch_inventory().await?;
        let targets = TargetResolver::new(&inventory).resolve(spec)?;
        info!(count = targets.len(), operation = %operation, "targets resolved");

        // One decision for the whole batch.
        let gate = ConfirmationGate::new(prompt);
        if gate.check(&targets, operation, options.skip_confirmation) == GateDecision::Aborted {
            info!("batch aborted at confirmation");
            return Err(PveError::Aborted);
        }

        let mut aggregator = ResultAggregator::new(targets.clone());

        // Fan-out: submit everything, bounded by the in-flight ceiling.
        let dispatcher = ActionDispatcher::new(Arc::clone(&self.api), self.config.max_in_flight);
        let outcomes = dispatcher.dispatch(&targets, operation).await;

        let deadline = self.config.timeouts.for_operation(operation);
        let mut handles = Vec::new();
        for outcome in outcomes {
            match outcome.result {
                Ok(handle) => handles.push((outcome.index, handle, deadline)),
                Err(error) => {
                    // Immediate rejection: terminal for this target only.
                    aggregator.record(outcome.index, TaskStatus::Failure(error.to_string()));
                }
            }
        }
        debug!(accepted = handles.len(), "dispatch complete");

        // Fan-in: poll accepted tasks concurrently, join all before
        // rendering anything.
        let poller = TaskPoller::new(Arc::clone(&self.api), &self.config, self.cancel.clone());
        for outcome in poller.poll_all(handles).await {
            aggregator.record(outcome.index, outcome.status);
        }

        let report = aggregator.finish();
        info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            timed_out = report.timed_out(),
            "batch complete"
        );
        Ok(report)
    }
}
