use crate::batch::confirm::{ConfirmationGate, MockConfirmPrompt};
use crate::{GateDecision, Operation, ResolvedTarget, ResourceKind};

fn targets(ids: &[u32]) -> Vec<ResolvedTarget> {
    ids.iter()
        .map(|id| ResolvedTarget {
            kind: ResourceKind::Vm,
            id: id.to_string(),
            node: "pve1".to_string(),
            name: format!("vm-{}", id),
        })
        .collect()
}

#[test]
fn one_prompt_covers_the_whole_batch() {
    let mut prompt = MockConfirmPrompt::new();
    prompt
        .expect_confirm()
        .withf(|message| message == "Hard stop 3 targets (100, 101, 102)?")
        .times(1)
        .return_const(true);

    let gate = ConfirmationGate::new(&prompt);
    let decision = gate.check(
        &targets(&[100, 101, 102]),
        &Operation::Stop { timeout: None },
        false,
    );
    assert_eq!(decision, GateDecision::Proceed);
}

#[test]
fn single_target_prompt_names_the_target() {
    let mut prompt = MockConfirmPrompt::new();
    prompt
        .expect_confirm()
        .withf(|message| message == "Delete VM 100?")
        .times(1)
        .return_const(true);

    let gate = ConfirmationGate::new(&prompt);
    let decision = gate.check(
        &targets(&[100]),
        &Operation::Remove {
            purge: true,
            destroy_unreferenced: false,
        },
        false,
    );
    assert_eq!(decision, GateDecision::Proceed);
}

#[test]
fn declining_aborts() {
    let mut prompt = MockConfirmPrompt::new();
    prompt.expect_confirm().times(1).return_const(false);

    let gate = ConfirmationGate::new(&prompt);
    let decision = gate.check(&targets(&[100]), &Operation::Suspend, false);
    assert_eq!(decision, GateDecision::Aborted);
}

#[test]
fn start_never_prompts() {
    let mut prompt = MockConfirmPrompt::new();
    prompt.expect_confirm().times(0);

    let gate = ConfirmationGate::new(&prompt);
    assert_eq!(
        gate.check(&targets(&[100, 101]), &Operation::Start, false),
        GateDecision::Proceed
    );
}

#[test]
fn resume_prompts_like_other_state_changes() {
    let mut prompt = MockConfirmPrompt::new();
    prompt
        .expect_confirm()
        .withf(|message| message == "Resume VM 100?")
        .times(1)
        .return_const(true);

    let gate = ConfirmationGate::new(&prompt);
    assert_eq!(
        gate.check(&targets(&[100]), &Operation::Resume, false),
        GateDecision::Proceed
    );
}

#[test]
fn skip_flag_bypasses_destructive_prompt() {
    let mut prompt = MockConfirmPrompt::new();
    prompt.expect_confirm().times(0);

    let gate = ConfirmationGate::new(&prompt);
    assert_eq!(
        gate.check(&targets(&[100]), &Operation::Reboot { timeout: None }, true),
        GateDecision::Proceed
    );
}
