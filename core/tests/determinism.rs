//! Two controllers seeded identically must replay bit-identical runs:
//! same transcripts, same branch outcomes, same verdicts.

use onboarding_core::audit::AuditStore;
use onboarding_core::catalog::SimCatalog;
use onboarding_core::controller::SessionController;
use onboarding_core::scenario::ScenarioId;
use onboarding_core::snapshot::SessionSnapshot;
use onboarding_core::types::Tier;

fn make_controller(seed: u64) -> SessionController {
    let audit = AuditStore::in_memory().unwrap();
    audit.migrate().unwrap();
    SessionController::new(SimCatalog::default_test(), audit, seed)
}

fn transcript(seed: u64, scenario: ScenarioId) -> (Vec<String>, Vec<String>) {
    let mut controller = make_controller(seed);
    controller
        .start("salaried_professional", Tier::T1, scenario)
        .unwrap();
    controller.run_to_completion().unwrap();
    let snapshot = SessionSnapshot::capture(&controller).unwrap();

    let messages = snapshot
        .messages
        .iter()
        .map(|m| m.content.clone())
        .collect();
    let events = snapshot
        .events
        .iter()
        .map(|e| format!("{}|{}", e.title, e.description))
        .collect();
    (messages, events)
}

/// The chance branch in channel-failure is the only randomness in a run;
/// identical seeds must resolve it identically, end to end.
#[test]
fn identical_seeds_replay_identical_runs() {
    const SEED: u64 = 0x0FFE_5EED;

    let (messages_a, events_a) = transcript(SEED, ScenarioId::ChannelFailure);
    let (messages_b, events_b) = transcript(SEED, ScenarioId::ChannelFailure);

    assert_eq!(messages_a, messages_b, "conversation diverged between runs");
    assert_eq!(events_a, events_b, "timeline diverged between runs");
}

/// Determinism holds for every scenario, not just the branching one.
#[test]
fn all_scenarios_deterministic() {
    for scenario in ScenarioId::all() {
        let a = transcript(7, scenario);
        let b = transcript(7, scenario);
        assert_eq!(a, b, "{scenario} diverged between identically seeded runs");
    }
}

/// Across many seeds both channel-failure branches actually occur; the
/// draw is random across seeds, deterministic within one.
#[test]
fn chance_branch_varies_across_seeds() {
    let mut saw_fallback = false;
    let mut saw_primary = false;
    for seed in 0..32u64 {
        let (_, events) = transcript(seed, ScenarioId::ChannelFailure);
        if events.iter().any(|e| e.starts_with("Fallback Channel Selected")) {
            saw_fallback = true;
        }
        if events.iter().any(|e| e.starts_with("Outreach Channel Selected")) {
            saw_primary = true;
        }
    }
    assert!(saw_fallback, "no seed in 0..32 hit the fallback branch");
    assert!(saw_primary, "no seed in 0..32 hit the primary branch");
}
