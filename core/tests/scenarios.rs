//! Scenario script walks: emitted sequences, branch behavior, mid-run
//! tier mutation, and form/metrics effects.

use onboarding_core::audit::AuditStore;
use onboarding_core::catalog::SimCatalog;
use onboarding_core::controller::SessionController;
use onboarding_core::form::FieldStatus;
use onboarding_core::journal::{EventPhase, EventStatus, Speaker};
use onboarding_core::runner::RunState;
use onboarding_core::scenario::ScenarioId;
use onboarding_core::snapshot::SessionSnapshot;
use onboarding_core::types::Tier;

// ── Test helpers ────────────────────────────────────────────────────────────

fn make_controller(seed: u64) -> SessionController {
    let audit = AuditStore::in_memory().unwrap();
    audit.migrate().unwrap();
    SessionController::new(SimCatalog::default_test(), audit, seed)
}

fn run(
    controller: &mut SessionController,
    persona: &str,
    tier: Tier,
    scenario: ScenarioId,
) -> SessionSnapshot {
    controller.start(persona, tier, scenario).unwrap();
    assert_eq!(controller.run_to_completion().unwrap(), RunState::Complete);
    SessionSnapshot::capture(controller).unwrap()
}

// ── Drop-off recovery ────────────────────────────────────────────────────────

/// The standard recovery run emits the full six-event timeline in order
/// and a six-turn conversation, with the T1 offer woven in.
#[test]
fn standard_recovery_full_transcript() {
    let mut controller = make_controller(42);
    let snapshot = run(
        &mut controller,
        "salaried_professional",
        Tier::T1,
        ScenarioId::Standard,
    );

    let titles: Vec<&str> = snapshot.events.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(
        titles,
        [
            "Drop-off Detected",
            "Lead Scoring Complete",
            "Incentive Authorization",
            "Outreach Channel Selected",
            "Recovery Link Sent",
            "Recovery Success",
        ]
    );
    assert_eq!(snapshot.events[0].phase, EventPhase::Trigger);
    assert_eq!(snapshot.events[0].status, EventStatus::Warning);
    assert_eq!(snapshot.events[5].phase, EventPhase::Outcome);

    // Income 60,000 at T1: round(60 * 1.5 * 0.7) = 63.
    assert!(snapshot.events[1].description.contains("63/500"));
    assert!(snapshot.events[1].description.contains("T1 tier"));

    // Score 63 picks the first option: ₹500 cashback, within the ₹1000 cap.
    let verdict = snapshot.incentive.expect("offer should be selected");
    assert_eq!(verdict.incentive.amount, 500.0);
    assert!(verdict.is_compliant);
    assert!(snapshot.events[2].description.contains("within ₹1000 limit"));

    let speakers: Vec<Speaker> = snapshot.messages.iter().map(|m| m.speaker).collect();
    assert_eq!(
        speakers,
        [
            Speaker::System,
            Speaker::Agent,
            Speaker::User,
            Speaker::Agent,
            Speaker::User,
            Speaker::Agent,
        ]
    );
    assert!(snapshot.messages[0].content.contains("Rohan Mehta"));
    assert!(snapshot.messages[0].content.contains("WhatsApp"));
    assert!(snapshot.messages[1].content.starts_with("Hi Rohan,"));
    assert!(snapshot.messages[3]
        .content
        .contains("₹500 cashback credited on account activation"));
}

/// Journal ordering holds across a whole run: ids strictly increase and
/// timestamps never go backwards.
#[test]
fn journal_order_and_timestamps_monotonic() {
    let mut controller = make_controller(42);
    let snapshot = run(
        &mut controller,
        "salaried_professional",
        Tier::T1,
        ScenarioId::Standard,
    );

    for pair in snapshot.messages.windows(2) {
        assert!(pair[0].id < pair[1].id);
        assert!(pair[0].at <= pair[1].at);
    }
    for pair in snapshot.events.windows(2) {
        assert!(pair[0].id < pair[1].id);
        assert!(pair[0].at <= pair[1].at);
    }
}

/// The tier-upgrade scenario is the one supported cross-step mutation:
/// a T2 run ends at T1, with the upgrade recorded on the timeline.
#[test]
fn tier_upgrade_mutates_session_tier() {
    let mut controller = make_controller(42);
    let snapshot = run(&mut controller, "freelancer", Tier::T2, ScenarioId::TierUpgrade);

    let session = snapshot.session.expect("session retained after completion");
    assert_eq!(session.tier, Tier::T1);

    let upgrade = snapshot
        .events
        .iter()
        .find(|e| e.title == "Tier Upgrade Initiated")
        .expect("upgrade event emitted");
    assert_eq!(upgrade.phase, EventPhase::Decision);
    assert!(upgrade
        .description
        .contains("upgraded from T2 to T1 during recovery conversation"));

    // The offer was authorized before the upgrade, against T2's menu.
    let verdict = snapshot.incentive.expect("offer selected");
    assert_eq!(verdict.tier, Tier::T2);
    assert_eq!(verdict.incentive.amount, 150.0);
}

/// Doc-issues runs surface the document artifact findings and talk about
/// the upload trouble.
#[test]
fn doc_issues_exposes_document_artifacts() {
    let mut controller = make_controller(42);
    let snapshot = run(
        &mut controller,
        "salaried_professional",
        Tier::T1,
        ScenarioId::DocIssues,
    );

    let artifacts = snapshot.document_artifacts.expect("doc findings present");
    assert_eq!(artifacts.issues.len(), 3);
    assert_eq!(artifacts.recommendations.len(), 3);
    assert!(snapshot.messages[2].content.contains("document upload"));

    // Other scenarios carry no artifacts.
    controller.reset().unwrap();
    let other = run(
        &mut controller,
        "salaried_professional",
        Tier::T1,
        ScenarioId::Standard,
    );
    assert!(other.document_artifacts.is_none());
}

/// When the catalog has no offer for the tier, the run still completes:
/// the authorization step records "no offer" and every incentive-
/// dependent message falls back to its offer-free variant.
#[test]
fn missing_offer_branches_around_incentive_steps() {
    let mut catalog = SimCatalog::default_test();
    catalog.incentives.clear();
    let audit = AuditStore::in_memory().unwrap();
    audit.migrate().unwrap();
    let mut controller = SessionController::new(catalog, audit, 42);

    controller
        .start("salaried_professional", Tier::T1, ScenarioId::Standard)
        .unwrap();
    assert_eq!(controller.run_to_completion().unwrap(), RunState::Complete);
    let snapshot = SessionSnapshot::capture(&controller).unwrap();

    assert!(snapshot.incentive.is_none());
    let decision = snapshot
        .events
        .iter()
        .find(|e| e.title == "No Incentive Available")
        .expect("no-offer decision recorded");
    assert_eq!(decision.status, EventStatus::NeedsReview);

    for message in &snapshot.messages {
        assert!(
            !message.content.contains('₹'),
            "offer-free run mentioned an amount: {}",
            message.content
        );
    }
    assert!(snapshot.admin_log.is_empty(), "nothing to audit without an offer");
}

/// Channel-failure runs resolve the chance draw one way or the other,
/// never both.
#[test]
fn channel_failure_resolves_exactly_one_branch() {
    for seed in [1u64, 2, 3, 4, 5, 6, 7, 8] {
        let mut controller = make_controller(seed);
        let snapshot = run(
            &mut controller,
            "salaried_professional",
            Tier::T1,
            ScenarioId::ChannelFailure,
        );

        let fallback = snapshot
            .events
            .iter()
            .any(|e| e.title == "Fallback Channel Selected");
        let primary = snapshot
            .events
            .iter()
            .any(|e| e.title == "Outreach Channel Selected");
        assert!(fallback != primary, "seed {seed} resolved both or neither branch");

        if fallback {
            assert!(snapshot
                .events
                .iter()
                .any(|e| e.title == "Primary Channel Unreachable"
                    && e.trigger.as_deref() == Some("channel_timeout")));
            assert!(snapshot.messages[0].content.contains("via SMS"));
        } else {
            assert!(snapshot.messages[0].content.contains("via WhatsApp"));
        }
    }
}

// ── In-progress assistance ───────────────────────────────────────────────────

/// Idle-timeout walk: the PAN field moves focus → idle(partial) →
/// completed, and the metrics reflect one completion and two assists.
#[test]
fn idle_timeout_completes_pan_field() {
    let mut controller = make_controller(42);
    let snapshot = run(&mut controller, "freelancer", Tier::T2, ScenarioId::IdleTimeout);

    assert_eq!(snapshot.fields.len(), 5);
    assert_eq!(snapshot.current_field.as_deref(), Some("pan"));
    let pan = snapshot.fields.iter().find(|f| f.id == "pan").unwrap();
    assert_eq!(pan.status, FieldStatus::Completed);
    assert_eq!(pan.value, "ABCDE1234F");

    assert_eq!(snapshot.metrics.fields_completed, 1);
    assert_eq!(snapshot.metrics.errors_encountered, 0);
    assert_eq!(snapshot.metrics.assists_provided, 2);

    let detection = snapshot
        .events
        .iter()
        .find(|e| e.title == "Idle Timeout Detected")
        .unwrap();
    assert_eq!(detection.trigger.as_deref(), Some("idle_30s"));

    // Assistance agent turns carry the intervention flag.
    assert!(snapshot
        .messages
        .iter()
        .any(|m| m.speaker == Speaker::Agent && m.assistance));
}

/// Form-errors walk: two validation failures then an auto-corrected
/// completion, counted in the metrics.
#[test]
fn form_errors_counts_two_errors_then_completion() {
    let mut controller = make_controller(42);
    let snapshot = run(&mut controller, "freelancer", Tier::T2, ScenarioId::FormErrors);

    let email = snapshot.fields.iter().find(|f| f.id == "email").unwrap();
    assert_eq!(email.status, FieldStatus::Completed);
    assert_eq!(email.value, "john.doe@gmail.com");

    assert_eq!(snapshot.metrics.errors_encountered, 2);
    assert_eq!(snapshot.metrics.fields_completed, 1);
    assert_eq!(snapshot.metrics.assists_provided, 2);

    let repeated = snapshot
        .events
        .iter()
        .find(|e| e.title == "Repeated Errors")
        .unwrap();
    assert_eq!(repeated.trigger.as_deref(), Some("multiple_errors"));
}

/// KYC-confusion walk: hesitation detection, a needs-review analysis,
/// and a guided resolution with no form mutation at all.
#[test]
fn kyc_confusion_leaves_form_untouched() {
    let mut controller = make_controller(42);
    let snapshot = run(&mut controller, "freelancer", Tier::T2, ScenarioId::KycConfusion);

    assert!(snapshot
        .fields
        .iter()
        .all(|f| f.status == FieldStatus::Idle && f.value.is_empty()));
    assert_eq!(snapshot.metrics.fields_completed, 0);
    assert_eq!(snapshot.metrics.errors_encountered, 0);

    let analysis = snapshot
        .events
        .iter()
        .find(|e| e.title == "Confusion Pattern Detected")
        .unwrap();
    assert_eq!(analysis.status, EventStatus::NeedsReview);
    assert!(snapshot
        .events
        .iter()
        .any(|e| e.title == "KYC Method Selected"));
}

/// Document-issues walk: two upload-failure detections then the mobile
/// scanner resolution.
#[test]
fn document_issues_emits_failure_detections() {
    let mut controller = make_controller(42);
    let snapshot = run(
        &mut controller,
        "freelancer",
        Tier::T2,
        ScenarioId::DocumentIssues,
    );

    let detections: Vec<&str> = snapshot
        .events
        .iter()
        .filter(|e| e.phase == EventPhase::Detection)
        .map(|e| e.title.as_str())
        .collect();
    assert_eq!(detections, ["Upload Failure", "Retry Pattern"]);

    assert!(snapshot
        .events
        .iter()
        .any(|e| e.title == "Alternative Solution Provided"));
    assert!(snapshot
        .messages
        .last()
        .unwrap()
        .content
        .contains("excellent progress"));
}

/// Snapshots serialize to JSON for the presentation layer.
#[test]
fn snapshot_serializes() {
    let mut controller = make_controller(42);
    let snapshot = run(
        &mut controller,
        "salaried_professional",
        Tier::T1,
        ScenarioId::Standard,
    );
    let json = serde_json::to_string(&snapshot).unwrap();
    assert!(json.contains("\"is_running\":false"));
    assert!(json.contains("Recovery Success"));
}
