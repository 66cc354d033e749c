//! Confirmation gate for destructive batch commands.
//!
//! One yes/no decision covers the whole batch; there is never one prompt
//! per target. The actual prompt rendering lives behind [`ConfirmPrompt`]
//! so the interactive layer (out of scope here) can plug in.

use tracing::debug;

use crate::core::domain::model::{operation::Operation, target::ResolvedTarget};

/// Asks the user a single yes/no question.
#[cfg_attr(test, mockall::automock)]
pub trait ConfirmPrompt: Send + Sync {
    /// Returns `true` if the user confirmed.
    fn confirm(&self, message: &str) -> bool;
}

/// A prompt that always confirms, for non-interactive callers.
pub struct AlwaysConfirm;

impl ConfirmPrompt for AlwaysConfirm {
    fn confirm(&self, _message: &str) -> bool {
        true
    }
}

/// Outcome of the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Dispatch may run.
    Proceed,
    /// The user declined; the pipeline halts with the cancellation code.
    Aborted,
}

/// Gates the dispatcher behind explicit user confirmation.
pub struct ConfirmationGate<'a, P: ConfirmPrompt + ?Sized> {
    prompt: &'a P,
}

impl<'a, P: ConfirmPrompt + ?Sized> ConfirmationGate<'a, P> {
    pub fn new(prompt: &'a P) -> Self {
        Self { prompt }
    }

    /// Decides whether the batch may proceed.
    ///
    /// Passes through silently when `skip` is set or the operation is
    /// non-destructive; otherwise blocks on one decision for the whole
    /// target set.
    pub fn check(
        &self,
        targets: &[ResolvedTarget],
        operation: &Operation,
        skip: bool,
    ) -> GateDecision {
        if skip || !operation.is_destructive() {
            debug!(skip, destructive = operation.is_destructive(), "confirmation skipped");
            return GateDecision::Proceed;
        }

        let message = batch_prompt(targets, operation);
        if self.prompt.confirm(&message) {
            GateDecision::Proceed
        } else {
            GateDecision::Aborted
        }
    }
}

/// Builds the prompt text, e.g. `"Shutdown 3 targets (100, 101, 102)?"`.
fn batch_prompt(targets: &[ResolvedTarget], operation: &Operation) -> String {
    if let [single] = targets {
        return format!("{} {}?", operation.verb(), single);
    }
    let ids: Vec<&str> = targets.iter().map(|t| t.id.as_str()).collect();
    format!(
        "{} {} targets ({})?",
        operation.verb(),
        targets.len(),
        ids.join(", ")
    )
}
