//! Admin-log mirroring rules and failed-step semantics.

use onboarding_core::audit::AuditStore;
use onboarding_core::catalog::SimCatalog;
use onboarding_core::controller::{ControllerState, SessionController};
use onboarding_core::runner::RunState;
use onboarding_core::scenario::ScenarioId;
use onboarding_core::types::Tier;

fn make_controller(seed: u64) -> SessionController {
    let audit = AuditStore::in_memory().unwrap();
    audit.migrate().unwrap();
    SessionController::new(SimCatalog::default_test(), audit, seed)
}

/// Recovery runs mirror exactly one audit record: the incentive
/// authorization, carrying the verdict and lead score.
#[test]
fn recovery_mirrors_incentive_authorization() {
    let mut controller = make_controller(42);
    let id = controller
        .start("salaried_professional", Tier::T1, ScenarioId::Standard)
        .unwrap();
    controller.run_to_completion().unwrap();

    let entries = controller.audit().admin_for_session(&id).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].event, "incentive_authorized");
    assert_eq!(entries[0].data["lead_score"], 63);
    assert_eq!(entries[0].data["compliance"]["is_compliant"], true);
    assert_eq!(entries[0].data["incentive"]["amount"], 500.0);
}

/// Assistance runs mirror every timeline event under its phase name, in
/// emission order.
#[test]
fn assistance_mirrors_every_event() {
    let mut controller = make_controller(42);
    let id = controller
        .start("freelancer", Tier::T2, ScenarioId::IdleTimeout)
        .unwrap();
    controller.run_to_completion().unwrap();

    let entries = controller.audit().admin_for_session(&id).unwrap();
    let names: Vec<&str> = entries.iter().map(|e| e.event.as_str()).collect();
    assert_eq!(
        names,
        ["detection", "analysis", "intervention", "resolution", "resolution"]
    );
    for pair in entries.windows(2) {
        assert!(pair[0].at <= pair[1].at, "admin log out of order");
    }
}

/// Session registry tracks the terminal status.
#[test]
fn session_status_follows_run() {
    let mut controller = make_controller(42);
    let id = controller
        .start("freelancer", Tier::T2, ScenarioId::KycConfusion)
        .unwrap();
    assert_eq!(
        controller.audit().session_status(&id).unwrap().as_deref(),
        Some("running")
    );
    controller.run_to_completion().unwrap();
    assert_eq!(
        controller.audit().session_status(&id).unwrap().as_deref(),
        Some("complete")
    );
}

/// A step whose effect cannot be applied marks the run failed, keeping
/// everything emitted before the failure. The session never lingers in
/// an ambiguous non-running state.
#[test]
fn failed_step_leaves_explicit_failed_state() {
    let audit = AuditStore::in_memory().unwrap();
    audit.migrate().unwrap();
    // Sabotage the audit surface so the first mirrored event errors.
    audit.raw_batch("DROP TABLE admin_log;").unwrap();
    let mut controller = SessionController::new(SimCatalog::default_test(), audit, 42);

    controller
        .start("freelancer", Tier::T2, ScenarioId::IdleTimeout)
        .unwrap();
    let err = controller.run_to_completion();
    assert!(err.is_err(), "broken audit surface should fail the run");

    assert_eq!(controller.state(), ControllerState::Failed);
    assert!(!controller.is_running());
    assert_eq!(controller.last_outcome(), Some(RunState::Failed));

    // The prefix emitted before the failing step is retained.
    let run = controller.run().expect("failed run retained for inspection");
    assert!(!run.journal.messages().is_empty());
}
