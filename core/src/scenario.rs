//! Scenario scripts.
//!
//! One builder per scenario id. Scenario selection happens once, before a
//! run starts, so scenario-dependent structure is resolved here at build
//! time; runtime branches cover only what genuinely varies per run:
//! offer availability and seeded chance draws.
//!
//! Delays model the real-world pace of each beat: an agent analysing, a
//! customer typing, a document failing validation.

use crate::form::FieldStatus;
use crate::journal::{EventPhase, EventStatus, Speaker};
use crate::scoring::DROP_OFF_PENALTY;
use crate::script::{BranchWhen, ScriptStep, StepAction, Template};
use crate::types::{SimMillis, Tier};
use serde::{Deserialize, Serialize};

/// Probability that the first outreach attempt on the preferred channel
/// goes unanswered in the channel-failure scenario.
pub const CHANNEL_FAILURE_PROB: f64 = 0.35;

/// Which simulator a scenario belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulatorKind {
    Recovery,
    Assistance,
}

impl SimulatorKind {
    pub fn session_prefix(&self) -> &'static str {
        match self {
            Self::Recovery   => "DR",
            Self::Assistance => "IP",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioId {
    // ── Drop-off recovery ──────────────────────────
    Standard,
    TierUpgrade,
    DocIssues,
    ChannelFailure,
    // ── In-progress assistance ─────────────────────
    IdleTimeout,
    FormErrors,
    KycConfusion,
    DocumentIssues,
}

impl ScenarioId {
    pub fn all() -> [ScenarioId; 8] {
        [
            Self::Standard,
            Self::TierUpgrade,
            Self::DocIssues,
            Self::ChannelFailure,
            Self::IdleTimeout,
            Self::FormErrors,
            Self::KycConfusion,
            Self::DocumentIssues,
        ]
    }

    pub fn simulator(&self) -> SimulatorKind {
        match self {
            Self::Standard | Self::TierUpgrade | Self::DocIssues | Self::ChannelFailure => {
                SimulatorKind::Recovery
            }
            Self::IdleTimeout | Self::FormErrors | Self::KycConfusion | Self::DocumentIssues => {
                SimulatorKind::Assistance
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard       => "standard",
            Self::TierUpgrade    => "tier_upgrade",
            Self::DocIssues      => "doc_issues",
            Self::ChannelFailure => "channel_failure",
            Self::IdleTimeout    => "idle_timeout",
            Self::FormErrors     => "form_errors",
            Self::KycConfusion   => "kyc_confusion",
            Self::DocumentIssues => "document_issues",
        }
    }

    /// Operator-facing label.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Standard       => "Standard Drop-off Recovery",
            Self::TierUpgrade    => "Mid-Journey Tier Upgrade",
            Self::DocIssues      => "Document Validation Issues",
            Self::ChannelFailure => "Channel Communication Failure",
            Self::IdleTimeout    => "Idle Timeout Detection",
            Self::FormErrors     => "Form Validation Errors",
            Self::KycConfusion   => "KYC Process Confusion",
            Self::DocumentIssues => "Document Upload Issues",
        }
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = crate::error::SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| crate::error::SimError::UnknownScenario { id: s.to_string() })
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build the full step list for a scenario.
pub fn build_script(scenario: ScenarioId) -> Vec<ScriptStep> {
    match scenario {
        ScenarioId::Standard
        | ScenarioId::TierUpgrade
        | ScenarioId::DocIssues
        | ScenarioId::ChannelFailure => recovery_script(scenario),
        ScenarioId::IdleTimeout      => assistance_script(idle_timeout_body()),
        ScenarioId::FormErrors       => assistance_script(form_errors_body()),
        ScenarioId::KycConfusion     => assistance_script(kyc_confusion_body()),
        ScenarioId::DocumentIssues   => assistance_script(document_issues_body()),
    }
}

// ── Step constructors ──────────────────────────────────────────────

fn step(delay_ms: SimMillis, action: StepAction) -> ScriptStep {
    ScriptStep { delay_ms, action }
}

fn system(delay_ms: SimMillis, text: &'static str) -> ScriptStep {
    step(delay_ms, StepAction::Say {
        speaker: Speaker::System,
        assistance: false,
        text: Template(text),
    })
}

fn agent(delay_ms: SimMillis, text: &'static str) -> ScriptStep {
    step(delay_ms, StepAction::Say {
        speaker: Speaker::Agent,
        assistance: false,
        text: Template(text),
    })
}

/// Agent turn produced by an assistance intervention (flagged in the UI).
fn assist(delay_ms: SimMillis, text: &'static str) -> ScriptStep {
    step(delay_ms, StepAction::Say {
        speaker: Speaker::Agent,
        assistance: true,
        text: Template(text),
    })
}

fn user(delay_ms: SimMillis, text: &'static str) -> ScriptStep {
    step(delay_ms, StepAction::Say {
        speaker: Speaker::User,
        assistance: false,
        text: Template(text),
    })
}

fn note(
    delay_ms: SimMillis,
    phase: EventPhase,
    status: EventStatus,
    title: &'static str,
    description: &'static str,
) -> ScriptStep {
    step(delay_ms, StepAction::Note {
        phase,
        status,
        title,
        description: Template(description),
        trigger: None,
        audit: None,
    })
}

/// Assistance-simulator event: carries a trigger tag and is mirrored to
/// the admin log under its phase name.
fn audited_note(
    delay_ms: SimMillis,
    phase: EventPhase,
    status: EventStatus,
    title: &'static str,
    description: &'static str,
    trigger: Option<&'static str>,
) -> ScriptStep {
    step(delay_ms, StepAction::Note {
        phase,
        status,
        title,
        description: Template(description),
        trigger,
        audit: Some(phase.as_str()),
    })
}

fn branch(
    delay_ms: SimMillis,
    when: BranchWhen,
    then: Vec<ScriptStep>,
    otherwise: Vec<ScriptStep>,
) -> ScriptStep {
    step(delay_ms, StepAction::Branch { when, then, otherwise })
}

// ── Drop-off recovery ──────────────────────────────────────────────

fn recovery_script(scenario: ScenarioId) -> Vec<ScriptStep> {
    let mut steps = vec![
        note(
            1000,
            EventPhase::Trigger,
            EventStatus::Warning,
            "Drop-off Detected",
            "Customer {name} abandoned application at KYC verification step",
        ),
        step(1500, StepAction::ComputeScore { penalty: DROP_OFF_PENALTY }),
        note(
            0,
            EventPhase::Analysis,
            EventStatus::Success,
            "Lead Scoring Complete",
            "Calculated lead score: {score}/500. Customer classified as {tier} tier",
        ),
        step(1000, StepAction::AuthorizeIncentive { scenario_key: "drop_off_recovery" }),
    ];

    // Channel selection. The channel-failure scenario models an unanswered
    // first attempt with a seeded chance draw and an SMS fallback.
    if scenario == ScenarioId::ChannelFailure {
        steps.push(branch(
            800,
            BranchWhen::Chance(CHANNEL_FAILURE_PROB),
            vec![
                step(0, StepAction::Note {
                    phase: EventPhase::Action,
                    status: EventStatus::Warning,
                    title: "Primary Channel Unreachable",
                    description: Template(
                        "No response on {channel} after first contact attempt",
                    ),
                    trigger: Some("channel_timeout"),
                    audit: None,
                }),
                step(400, StepAction::SetChannel { channel: "SMS" }),
                note(
                    0,
                    EventPhase::Decision,
                    EventStatus::Success,
                    "Fallback Channel Selected",
                    "Switched outreach to SMS after primary channel failure",
                ),
            ],
            vec![note(
                0,
                EventPhase::Decision,
                EventStatus::Success,
                "Outreach Channel Selected",
                "Chosen {channel} based on persona preferences",
            )],
        ));
    } else {
        steps.push(note(
            800,
            EventPhase::Decision,
            EventStatus::Success,
            "Outreach Channel Selected",
            "Chosen {channel} based on persona preferences",
        ));
    }

    steps.push(system(1000, "Initiating drop-off recovery for {name} via {channel}"));
    steps.push(agent(
        1500,
        "Hi {first_name}, I noticed you were opening a savings account with us earlier. \
         Is there anything I can help you complete the process?",
    ));

    // Customer reply and the offer beat differ per scenario.
    match scenario {
        ScenarioId::DocIssues => {
            steps.push(user(
                2000,
                "Hi, yes I was having trouble with the document upload. The KYC \
                 verification kept failing and I wasn't sure what to do.",
            ));
            steps.push(branch(
                2500,
                BranchWhen::OfferAvailable,
                vec![agent(
                    0,
                    "I understand the frustration with document uploads. Let me help you \
                     with that right now. I can also offer you a {incentive_desc} to make \
                     up for the inconvenience.",
                )],
                vec![agent(
                    0,
                    "I understand the frustration with document uploads. Let me help you \
                     with that right now and make sure it goes through this time.",
                )],
            ));
        }
        ScenarioId::TierUpgrade => {
            steps.push(user(
                2000,
                "Hello, I started the application but I'm wondering if I qualify for any \
                 premium accounts given my banking relationship.",
            ));
            steps.push(branch(
                2500,
                BranchWhen::OfferAvailable,
                vec![agent(
                    0,
                    "Great question! Based on your profile, you actually qualify for our \
                     Premium Banking. I can upgrade your application and offer you a \
                     {incentive_desc} as a welcome benefit.",
                )],
                vec![agent(
                    0,
                    "Great question! Based on your profile, you actually qualify for our \
                     Premium Banking. I can upgrade your application right away.",
                )],
            ));
            steps.push(step(1000, StepAction::UpgradeTier { to: Tier::T1 }));
            steps.push(note(
                0,
                EventPhase::Decision,
                EventStatus::Success,
                "Tier Upgrade Initiated",
                "Customer upgraded from {prev_tier} to {tier} during recovery conversation",
            ));
        }
        _ => {
            steps.push(user(
                2000,
                "Hi there, yes I was in the middle of it but got busy with work. Planning \
                 to complete it later.",
            ));
            steps.push(branch(
                2500,
                BranchWhen::OfferAvailable,
                vec![agent(
                    0,
                    "No worries! To help you complete it quickly, I can offer you a \
                     {incentive_desc}. Would you like to finish your application now? I \
                     can assist you step by step.",
                )],
                vec![agent(
                    0,
                    "No worries! Let me help you pick up right where you left off. It \
                     only takes a few minutes to finish, and I can assist you step by step.",
                )],
            ));
        }
    }

    steps.push(user(
        2000,
        "That sounds great! Yes, I'd like to complete it now. Thank you for the offer.",
    ));
    steps.push(branch(
        1500,
        BranchWhen::OfferAvailable,
        vec![agent(
            0,
            "Perfect! I'm sending you a personalized link to continue right where you \
             left off. All your previous information is saved. The {incentive_desc} will \
             be automatically applied once your account is active.",
        )],
        vec![agent(
            0,
            "Perfect! I'm sending you a personalized link to continue right where you \
             left off. All your previous information is saved.",
        )],
    ));
    steps.push(note(
        1000,
        EventPhase::Action,
        EventStatus::Success,
        "Recovery Link Sent",
        "Personalized resumption link sent with pre-filled data",
    ));
    steps.push(note(
        800,
        EventPhase::Outcome,
        EventStatus::Success,
        "Recovery Success",
        "Customer re-engaged and ready to complete application",
    ));

    steps
}

// ── In-progress assistance ─────────────────────────────────────────

/// Shared frame: start banner, scenario body, closing reassurance.
fn assistance_script(body: Vec<ScriptStep>) -> Vec<ScriptStep> {
    let mut steps = vec![system(0, "In-progress assistance simulation started for {name}")];
    steps.extend(body);
    steps.push(assist(
        1500,
        "Great! You're making excellent progress. I'll be here if you need any more help \
         completing your application.",
    ));
    steps.push(audited_note(
        0,
        EventPhase::Resolution,
        EventStatus::Success,
        "Assistance Complete",
        "Customer successfully resolved issue and continued application",
        None,
    ));
    steps
}

fn idle_timeout_body() -> Vec<ScriptStep> {
    vec![
        step(0, StepAction::SetField {
            field: "pan",
            status: FieldStatus::Focus,
            value: None,
            issues: &[],
        }),
        system(2000, "User started filling PAN number field..."),
        step(3000, StepAction::SetField {
            field: "pan",
            status: FieldStatus::Idle,
            value: Some("ABCDE"),
            issues: &[],
        }),
        system(0, "User input detected: \"ABCDE\" (partial PAN)"),
        audited_note(
            2000,
            EventPhase::Detection,
            EventStatus::Warning,
            "Idle Timeout Detected",
            "User has been inactive on PAN field for 30+ seconds with partial input",
            Some("idle_30s"),
        ),
        audited_note(
            1000,
            EventPhase::Analysis,
            EventStatus::Success,
            "Intervention Analysis",
            "AI determined user may need help with PAN format",
            None,
        ),
        audited_note(
            1500,
            EventPhase::Intervention,
            EventStatus::Success,
            "Assistance Triggered",
            "Contextual help bubble displayed with PAN format guidance",
            None,
        ),
        assist(
            0,
            "Hi! I noticed you're entering your PAN number. Just a friendly reminder that \
             the format is 5 letters, 4 digits, 1 letter (e.g., ABCDE1234F). Need any help?",
        ),
        user(2000, "Oh thank you! I wasn't sure about the format. Let me complete it now."),
        step(1500, StepAction::SetField {
            field: "pan",
            status: FieldStatus::Completed,
            value: Some("ABCDE1234F"),
            issues: &[],
        }),
        audited_note(
            0,
            EventPhase::Resolution,
            EventStatus::Success,
            "Field Completed",
            "PAN field successfully completed with valid format",
            None,
        ),
        assist(
            0,
            "Perfect! Your PAN is now validated. Would you like me to guide you through \
             the next steps?",
        ),
    ]
}

fn form_errors_body() -> Vec<ScriptStep> {
    vec![
        step(1000, StepAction::SetField {
            field: "email",
            status: FieldStatus::Focus,
            value: None,
            issues: &[],
        }),
        system(0, "User focused on email field"),
        step(2000, StepAction::SetField {
            field: "email",
            status: FieldStatus::Error,
            value: Some("invalid-email"),
            issues: &["Invalid email format"],
        }),
        audited_note(
            0,
            EventPhase::Detection,
            EventStatus::Warning,
            "Validation Error Detected",
            "Invalid email format entered: \"invalid-email\"",
            Some("validation_error"),
        ),
        step(1500, StepAction::SetField {
            field: "email",
            status: FieldStatus::Error,
            value: Some("user@invalid"),
            issues: &["Invalid email format"],
        }),
        audited_note(
            0,
            EventPhase::Detection,
            EventStatus::Warning,
            "Repeated Errors",
            "Second consecutive validation error on email field",
            Some("multiple_errors"),
        ),
        audited_note(
            1000,
            EventPhase::Intervention,
            EventStatus::Success,
            "Smart Help Activated",
            "AI provided enhanced email format guidance with examples",
            None,
        ),
        assist(
            0,
            "I see you're having trouble with the email format. Here are some valid \
             examples: user@gmail.com, name@company.co.in. Would you like me to help you \
             format it correctly?",
        ),
        user(2500, "Yes please! I want to use my Gmail address: john.doe.gmail.com"),
        assist(
            1500,
            "I think you meant john.doe@gmail.com (with @ symbol). Let me auto-correct \
             that for you!",
        ),
        step(0, StepAction::SetField {
            field: "email",
            status: FieldStatus::Completed,
            value: Some("john.doe@gmail.com"),
            issues: &[],
        }),
        audited_note(
            0,
            EventPhase::Resolution,
            EventStatus::Success,
            "Auto-correction Applied",
            "Email auto-corrected and validated successfully",
            None,
        ),
    ]
}

fn kyc_confusion_body() -> Vec<ScriptStep> {
    vec![
        system(1000, "User reached KYC method selection screen"),
        audited_note(
            3000,
            EventPhase::Detection,
            EventStatus::Warning,
            "Decision Hesitation",
            "User viewing KYC options for 2+ minutes without selection",
            Some("kyc_hesitation"),
        ),
        audited_note(
            1500,
            EventPhase::Analysis,
            EventStatus::NeedsReview,
            "Confusion Pattern Detected",
            "User behavior indicates uncertainty about KYC options",
            None,
        ),
        assist(
            0,
            "I notice you're looking at the KYC options. Would you like me to explain \
             the differences? Most customers like you choose Aadhaar OTP for quick \
             verification.",
        ),
        user(2000, "Yes, I'm not sure which one is best for me. What do you recommend?"),
        assist(
            2000,
            "Based on your profile, I'd recommend Aadhaar OTP e-KYC - it's instant, \
             secure, and takes just 2-3 minutes. You'll get instant account activation! \
             Shall I help you with that?",
        ),
        user(1500, "That sounds perfect! Please guide me through it."),
        audited_note(
            0,
            EventPhase::Resolution,
            EventStatus::Success,
            "KYC Method Selected",
            "Customer chose Aadhaar OTP with AI guidance",
            None,
        ),
    ]
}

fn document_issues_body() -> Vec<ScriptStep> {
    vec![
        system(1000, "User attempting document upload..."),
        audited_note(
            2000,
            EventPhase::Detection,
            EventStatus::Warning,
            "Upload Failure",
            "Document upload failed - file size too large (5.2MB)",
            Some("file_size_error"),
        ),
        audited_note(
            1000,
            EventPhase::Detection,
            EventStatus::Warning,
            "Retry Pattern",
            "User attempted upload 3 times with same large file",
            Some("repeated_failures"),
        ),
        audited_note(
            1500,
            EventPhase::Intervention,
            EventStatus::Success,
            "Smart Resolution",
            "AI detected file size issue and provided compression guidance",
            None,
        ),
        assist(
            0,
            "I see your document upload is failing because the file is too large (5.2MB). \
             Our system accepts files up to 2MB. I can guide you to compress it or use our \
             mobile scanner for better quality. Which would you prefer?",
        ),
        user(2500, "I didn't know about the size limit! Can you help me compress it?"),
        assist(
            1500,
            "Absolutely! You can use any online PDF compressor like SmallPDF or ILovePDF. \
             Alternatively, our mobile app has a built-in scanner that creates \
             optimal-sized files. Would you like the mobile app link?",
        ),
        user(2000, "Yes, the mobile app sounds easier. Please send the link."),
        audited_note(
            0,
            EventPhase::Resolution,
            EventStatus::Success,
            "Alternative Solution Provided",
            "Customer provided mobile app link for document scanning",
            None,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_scenario_builds_a_nonempty_script() {
        for scenario in ScenarioId::all() {
            assert!(!build_script(scenario).is_empty(), "{scenario} built empty script");
        }
    }

    #[test]
    fn scenario_ids_round_trip_through_strings() {
        for scenario in ScenarioId::all() {
            let parsed: ScenarioId = scenario.as_str().parse().unwrap();
            assert_eq!(parsed, scenario);
        }
        assert!("no_such_scenario".parse::<ScenarioId>().is_err());
    }

    #[test]
    fn recovery_and_assistance_prefixes() {
        assert_eq!(ScenarioId::Standard.simulator().session_prefix(), "DR");
        assert_eq!(ScenarioId::IdleTimeout.simulator().session_prefix(), "IP");
    }
}
