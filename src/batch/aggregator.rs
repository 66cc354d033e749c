//! Result aggregation: fan-in of dispatch and poll outcomes.
//!
//! The aggregator owns the only mutable copy of the result table. Each
//! target has exactly one slot, indexed by the resolver's output order,
//! and each slot is written exactly once by whichever stage terminated
//! that target. The final report therefore lists every resolved target,
//! in resolution order, regardless of completion order.

use crate::core::domain::model::{
    target::ResolvedTarget,
    task::{BatchReport, TargetResult, TaskStatus},
};

/// Collects per-target outcomes into an ordered [`BatchReport`].
pub struct ResultAggregator {
    targets: Vec<ResolvedTarget>,
    slots: Vec<Option<TaskStatus>>,
}

impl ResultAggregator {
    /// Creates one slot per resolved target.
    pub fn new(targets: Vec<ResolvedTarget>) -> Self {
        let slots = vec![None; targets.len()];
        Self { targets, slots }
    }

    /// Records the terminal status for the target at `index`.
    ///
    /// A slot is written at most once; a second write for the same index
    /// is ignored so that terminal states never regress.
    pub fn record(&mut self, index: usize, status: TaskStatus) {
        debug_assert!(status.is_terminal());
        if let Some(slot) = self.slots.get_mut(index) {
            if slot.is_none() {
                *slot = Some(status);
            }
        }
    }

    /// Consumes the table and produces the ordered report.
    ///
    /// Every target appears exactly once. A slot no stage wrote (which
    /// would take a panicked pipeline task) degrades to `Failure` rather
    /// than dropping the target from the report.
    pub fn finish(self) -> BatchReport {
        let results = self
            .targets
            .into_iter()
            .zip(self.slots)
            .map(|(target, slot)| TargetResult {
                target,
                status: slot
                    .unwrap_or_else(|| TaskStatus::Failure("no result recorded".to_string())),
            })
            .collect();
        BatchReport::new(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::domain::model::target::ResourceKind;

    fn target(id: &str) -> ResolvedTarget {
        ResolvedTarget {
            kind: ResourceKind::Vm,
            id: id.to_string(),
            node: "pve1".to_string(),
            name: format!("vm-{}", id),
        }
    }

    #[test]
    fn second_write_to_a_slot_never_overrides_the_first_terminal_status() {
        let mut aggregator = ResultAggregator::new(vec![target("100")]);
        aggregator.record(0, TaskStatus::Success);
        aggregator.record(0, TaskStatus::Failure("late write".to_string()));

        let report = aggregator.finish();
        assert_eq!(report.results()[0].status, TaskStatus::Success);
    }

    #[test]
    fn out_of_range_index_is_ignored() {
        let mut aggregator = ResultAggregator::new(vec![target("100")]);
        aggregator.record(5, TaskStatus::Success);
        aggregator.record(0, TaskStatus::Timeout);

        let report = aggregator.finish();
        assert_eq!(report.results().len(), 1);
        assert_eq!(report.results()[0].status, TaskStatus::Timeout);
    }

    #[test]
    fn unwritten_slots_degrade_to_failure_instead_of_vanishing() {
        let aggregator = ResultAggregator::new(vec![target("100"), target("101")]);

        let report = aggregator.finish();
        assert_eq!(report.results().len(), 2);
        assert!(report
            .results()
            .iter()
            .all(|r| matches!(&r.status, TaskStatus::Failure(reason) if reason.contains("no result"))));
    }
}
