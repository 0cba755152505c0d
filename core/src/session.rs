//! The session record for a single run.
//!
//! Created by the controller at start, replaced (never mutated) on reset.
//! The run token is the identity every in-flight step is tagged with;
//! effects from a step whose token no longer matches the active session
//! are dropped, never applied.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::catalog::PersonaConfig;
use crate::scenario::ScenarioId;
use crate::types::{SessionId, Tier};

#[derive(Debug, Clone)]
pub struct Session {
    pub session_id: SessionId,
    /// Opaque per-run identity, distinct from the display id.
    pub run_token:  Uuid,
    pub persona:    PersonaConfig,
    /// Mutable mid-run only via the tier-upgrade step.
    pub tier:       Tier,
    pub scenario:   ScenarioId,
    pub started_at: DateTime<Utc>,
    pub details:    SessionDetails,
}

/// Kind-specific session fields.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionDetails {
    Recovery {
        lead_score: i64,
        drop_off_point: String,
        time_since_drop_off: String,
        previous_attempts: u32,
    },
    Assistance {
        current_step: String,
        completion_percentage: u8,
    },
}

impl Session {
    pub fn new(
        persona: PersonaConfig,
        tier: Tier,
        scenario: ScenarioId,
        started_at: DateTime<Utc>,
        details: SessionDetails,
    ) -> Self {
        let session_id = format!(
            "{}_{}",
            scenario.simulator().session_prefix(),
            started_at.timestamp_millis()
        );
        Self {
            session_id,
            run_token: Uuid::new_v4(),
            persona,
            tier,
            scenario,
            started_at,
            details,
        }
    }
}
