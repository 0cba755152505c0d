//! Serializable view of a controller's observable state.
//!
//! The presentation layer polls this instead of reaching into run
//! internals. Everything is captured in log order; consumers must render
//! without reordering.

use serde::Serialize;

use crate::audit::AdminLogEntry;
use crate::controller::{ControllerState, SessionController};
use crate::error::SimResult;
use crate::form::{FormField, Metrics};
use crate::incentive::ComplianceVerdict;
use crate::journal::{Message, TimelineEvent};
use crate::runner::RunState;
use crate::scenario::ScenarioId;
use crate::scoring;
use crate::session::SessionDetails;
use crate::types::{PersonaId, SessionId, Tier};

#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub state:              ControllerState,
    pub is_running:         bool,
    pub last_outcome:       Option<RunState>,
    pub session:            Option<SessionInfo>,
    pub messages:           Vec<Message>,
    pub events:             Vec<TimelineEvent>,
    pub fields:             Vec<FormField>,
    pub current_field:      Option<String>,
    pub metrics:            Metrics,
    pub incentive:          Option<ComplianceVerdict>,
    pub score_breakdown:    Option<ScoreBreakdown>,
    pub document_artifacts: Option<DocumentArtifacts>,
    pub admin_log:          Vec<AdminLogEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub session_id:   SessionId,
    pub persona_id:   PersonaId,
    pub persona_name: String,
    pub tier:         Tier,
    pub scenario:     ScenarioId,
    pub started_at:   chrono::DateTime<chrono::Utc>,
    pub details:      SessionDetails,
}

/// The lead-scoring panel. `display_score` carries the zero floor; the
/// raw score is kept alongside for operator tooling.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreBreakdown {
    pub base_score:       i64,
    pub tier_multiplier:  f64,
    pub drop_off_penalty: f64,
    pub lead_score:       i64,
    pub display_score:    i64,
    pub scale:            i64,
}

/// Static document findings shown for the doc-issues recovery scenario.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentArtifacts {
    pub issues:          Vec<String>,
    pub recommendations: Vec<String>,
}

impl DocumentArtifacts {
    pub fn for_scenario(scenario: ScenarioId) -> Option<Self> {
        match scenario {
            ScenarioId::DocIssues => Some(Self {
                issues: vec![
                    "PAN OCR: Confidence 65% (Below 80% threshold)".to_string(),
                    "Image quality: Poor lighting detected".to_string(),
                    "Format: JPG instead of recommended PDF".to_string(),
                ],
                recommendations: vec![
                    "Use mobile scanner for better quality".to_string(),
                    "Ensure proper lighting".to_string(),
                    "Convert to PDF format".to_string(),
                ],
            }),
            _ => None,
        }
    }
}

impl SessionSnapshot {
    /// Capture the controller's current observable state.
    pub fn capture(controller: &SessionController) -> SimResult<Self> {
        let state = controller.state();
        let is_running = controller.is_running();
        let last_outcome = controller.last_outcome();

        let Some(run) = controller.run() else {
            return Ok(Self {
                state,
                is_running,
                last_outcome,
                session: None,
                messages: Vec::new(),
                events: Vec::new(),
                fields: Vec::new(),
                current_field: None,
                metrics: Metrics::default(),
                incentive: None,
                score_breakdown: None,
                document_artifacts: None,
                admin_log: Vec::new(),
            });
        };

        let session = &run.session;
        let score_breakdown = match &session.details {
            SessionDetails::Recovery { lead_score, .. } => Some(ScoreBreakdown {
                base_score: scoring::base_score(session.persona.income),
                tier_multiplier: session.tier.multiplier(),
                drop_off_penalty: scoring::DROP_OFF_PENALTY,
                lead_score: *lead_score,
                display_score: scoring::display_score(*lead_score),
                scale: scoring::SCORE_SCALE,
            }),
            SessionDetails::Assistance { .. } => None,
        };

        Ok(Self {
            state,
            is_running,
            last_outcome,
            session: Some(SessionInfo {
                session_id: session.session_id.clone(),
                persona_id: session.persona.id.clone(),
                persona_name: session.persona.name.clone(),
                tier: session.tier,
                scenario: session.scenario,
                started_at: session.started_at,
                details: session.details.clone(),
            }),
            messages: run.journal.messages().to_vec(),
            events: run.journal.events().to_vec(),
            fields: run.form.fields().to_vec(),
            current_field: run.form.current_field().map(str::to_string),
            metrics: run.metrics,
            incentive: run.verdict().cloned(),
            score_breakdown,
            document_artifacts: DocumentArtifacts::for_scenario(session.scenario),
            admin_log: controller.audit().admin_for_session(&session.session_id)?,
        })
    }
}
