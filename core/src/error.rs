use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Persona '{id}' not found in catalog")]
    PersonaNotFound { id: String },

    #[error("Unknown scenario '{id}'")]
    UnknownScenario { id: String },

    #[error("Unknown tier '{value}' (expected T1 or T2)")]
    UnknownTier { value: String },

    #[error("Session '{session_id}' is already running")]
    SessionAlreadyRunning { session_id: String },

    #[error("Run watchdog expired for '{session_id}' after {budget_ms}ms of simulated time")]
    WatchdogExpired { session_id: String, budget_ms: u64 },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type SimResult<T> = Result<T, SimError>;
