//! The simulation session controller.
//!
//! RULES:
//!   - Exactly one session may be running per controller instance;
//!     start() while running is rejected, never interleaved.
//!   - The controller exclusively owns the active run's session, journal,
//!     form state, and admin-log rows; all are cleared (not merged) on
//!     reset or when a new run starts.
//!   - Step execution is two-phase: begin_step() schedules (advances the
//!     simulated clock), commit_step() applies effects. A commit whose
//!     run token no longer matches the active session is dropped, so a
//!     step that "resolves" after a reset can never append to the logs.
//!   - A run always ends in an explicit terminal state: complete, failed,
//!     or cancelled.

use chrono::Utc;
use uuid::Uuid;

use crate::audit::AuditStore;
use crate::catalog::SimCatalog;
use crate::error::{SimError, SimResult};
use crate::form::FormState;
use crate::rng::{RngBank, RngSlot};
use crate::runner::{RunState, ScriptRunner, RUN_BUDGET_MS};
use crate::scenario::{self, ScenarioId, SimulatorKind};
use crate::scoring;
use crate::script::{ScriptStep, ScriptVars};
use crate::session::{Session, SessionDetails};
use crate::types::{SessionId, Tier};

/// Controller lifecycle as seen by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerState {
    Idle,
    Running,
    Complete,
    Failed,
    Cancelled,
}

/// A scheduled step whose delay has elapsed but whose effects have not
/// been applied yet. Tagged with the run it belongs to.
pub struct PendingStep {
    token: Uuid,
    step:  ScriptStep,
}

impl PendingStep {
    /// The simulated delay this step was scheduled after. Drivers pacing
    /// at wall-clock speed sleep on this between begin and commit.
    pub fn delay_ms(&self) -> crate::types::SimMillis {
        self.step.delay_ms
    }
}

/// What committing (or advancing) one step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Effects applied; `remaining` steps still scheduled.
    Applied { remaining: usize },
    /// The step belonged to a run that is no longer active; dropped.
    Stale,
    /// Nothing to do: no running session.
    Idle,
}

pub struct SessionController {
    catalog:      SimCatalog,
    audit:        AuditStore,
    rng_bank:     RngBank,
    master_seed:  u64,
    run:          Option<ScriptRunner>,
    last_outcome: Option<RunState>,
}

impl SessionController {
    pub fn new(catalog: SimCatalog, audit: AuditStore, master_seed: u64) -> Self {
        Self {
            catalog,
            audit,
            rng_bank: RngBank::new(master_seed),
            master_seed,
            run: None,
            last_outcome: None,
        }
    }

    pub fn audit(&self) -> &AuditStore {
        &self.audit
    }

    pub fn is_running(&self) -> bool {
        matches!(&self.run, Some(run) if run.state == RunState::Running)
    }

    pub fn state(&self) -> ControllerState {
        match &self.run {
            None => ControllerState::Idle,
            Some(run) => match run.state {
                RunState::Running   => ControllerState::Running,
                RunState::Complete  => ControllerState::Complete,
                RunState::Failed    => ControllerState::Failed,
                RunState::Cancelled => ControllerState::Cancelled,
            },
        }
    }

    /// Terminal state of the most recently ended run, if any.
    pub fn last_outcome(&self) -> Option<RunState> {
        self.last_outcome
    }

    /// The active (or retained, if finished) run. Exposed for snapshots
    /// and tests; mutation stays inside the controller.
    pub fn run(&self) -> Option<&ScriptRunner> {
        self.run.as_ref()
    }

    /// Set the pacing hint on the active run's clock. Simulated time is
    /// unaffected; only drivers sleeping between steps read this.
    pub fn set_speed(&mut self, speed: crate::clock::SimSpeed) {
        if let Some(run) = &mut self.run {
            run.clock.set_speed(speed);
        }
    }

    /// Begin a new run. Rejected while a run is in progress; a finished
    /// run is cleared and replaced.
    pub fn start(
        &mut self,
        persona_id: &str,
        tier: Tier,
        scenario: ScenarioId,
    ) -> SimResult<SessionId> {
        if let Some(run) = &self.run {
            if run.state == RunState::Running {
                return Err(SimError::SessionAlreadyRunning {
                    session_id: run.session.session_id.clone(),
                });
            }
        }
        if let Some(old) = self.run.take() {
            self.audit.clear_session(&old.session.session_id)?;
        }

        let persona = self
            .catalog
            .persona(persona_id)
            .cloned()
            .ok_or_else(|| SimError::PersonaNotFound { id: persona_id.to_string() })?;

        let started_at = Utc::now();
        let details = match scenario.simulator() {
            SimulatorKind::Recovery => SessionDetails::Recovery {
                lead_score: scoring::lead_score(persona.income, tier, scoring::DROP_OFF_PENALTY),
                drop_off_point: "kyc_verification".to_string(),
                time_since_drop_off: "2 hours".to_string(),
                previous_attempts: 1,
            },
            SimulatorKind::Assistance => SessionDetails::Assistance {
                current_step: "form_filling".to_string(),
                completion_percentage: 45,
            },
        };
        let form = match scenario.simulator() {
            SimulatorKind::Recovery   => FormState::empty(),
            SimulatorKind::Assistance => FormState::standard(started_at),
        };

        let session = Session::new(persona, tier, scenario, started_at, details);
        let session_id = session.session_id.clone();

        let mut vars = ScriptVars::new();
        vars.set("name", session.persona.name.clone());
        vars.set("first_name", session.persona.first_name().to_string());
        vars.set("channel", session.persona.preferred_channel.clone());
        vars.set("tier", tier.as_str());
        vars.set("prev_tier", tier.as_str());

        self.audit.insert_session(
            &session_id,
            &session.persona.id,
            tier.as_str(),
            scenario.as_str(),
            self.master_seed,
            started_at,
        )?;

        let steps = scenario::build_script(scenario);
        let rng = self.rng_bank.for_slot(RngSlot::Script);
        log::info!(
            "session {session_id}: started persona={} tier={tier} scenario={scenario} steps={}",
            session.persona.id,
            steps.len()
        );

        self.run = Some(ScriptRunner::new(session, steps, vars, rng, form));
        Ok(session_id)
    }

    /// Schedule the next step: advance the simulated clock past its delay
    /// and hand it back tagged with the run token. Returns None when no
    /// run is in progress or the script is drained.
    pub fn begin_step(&mut self) -> SimResult<Option<PendingStep>> {
        let Some(run) = &mut self.run else {
            return Ok(None);
        };
        if run.state != RunState::Running {
            return Ok(None);
        }
        let Some(step) = run.take_step() else {
            return Ok(None);
        };

        if run.clock.elapsed_ms + step.delay_ms > RUN_BUDGET_MS {
            run.state = RunState::Failed;
            run.clock.pause();
            self.last_outcome = Some(RunState::Failed);
            let session_id = run.session.session_id.clone();
            let _ = self.audit.update_session_status(&session_id, RunState::Failed.as_str());
            log::warn!("session {session_id}: watchdog expired at {}ms", run.clock.elapsed_ms);
            return Err(SimError::WatchdogExpired { session_id, budget_ms: RUN_BUDGET_MS });
        }

        run.clock.advance(step.delay_ms);
        Ok(Some(PendingStep { token: run.session.run_token, step }))
    }

    /// Apply a scheduled step's effects, unless the run it belongs to is
    /// no longer the active one.
    pub fn commit_step(&mut self, pending: PendingStep) -> SimResult<StepOutcome> {
        let Some(run) = &mut self.run else {
            log::debug!("stale step suppressed: no active session");
            return Ok(StepOutcome::Stale);
        };
        if run.session.run_token != pending.token || run.state != RunState::Running {
            log::debug!(
                "session {}: stale step suppressed (token mismatch or ended run)",
                run.session.session_id
            );
            return Ok(StepOutcome::Stale);
        }

        if let Err(e) = run.execute(pending.step.action, &self.catalog, &self.audit) {
            run.state = RunState::Failed;
            run.clock.pause();
            self.last_outcome = Some(RunState::Failed);
            let session_id = run.session.session_id.clone();
            let _ = self.audit.update_session_status(&session_id, RunState::Failed.as_str());
            log::error!("session {session_id}: step failed: {e}");
            return Err(e);
        }

        let remaining = run.remaining_steps();
        if remaining == 0 {
            run.state = RunState::Complete;
            run.clock.pause();
            self.last_outcome = Some(RunState::Complete);
            self.audit
                .update_session_status(&run.session.session_id, RunState::Complete.as_str())?;
            log::info!(
                "session {}: complete at {}ms",
                run.session.session_id,
                run.clock.elapsed_ms
            );
        }
        Ok(StepOutcome::Applied { remaining })
    }

    /// Execute exactly one step end to end.
    pub fn advance(&mut self) -> SimResult<StepOutcome> {
        match self.begin_step()? {
            Some(pending) => self.commit_step(pending),
            None => Ok(StepOutcome::Idle),
        }
    }

    /// Drain the script. Returns the terminal state.
    pub fn run_to_completion(&mut self) -> SimResult<RunState> {
        while let Some(pending) = self.begin_step()? {
            self.commit_step(pending)?;
        }
        match &self.run {
            Some(run) => Ok(run.state),
            None => Ok(RunState::Cancelled),
        }
    }

    /// Cancel any in-progress run and clear all of its state: session,
    /// journal, form fields, and admin-log rows. Pending steps scheduled
    /// before the reset commit to nothing afterwards.
    pub fn reset(&mut self) -> SimResult<()> {
        if let Some(run) = self.run.take() {
            let outcome = match run.state {
                RunState::Running => RunState::Cancelled,
                terminal => terminal,
            };
            self.last_outcome = Some(outcome);
            self.audit.clear_session(&run.session.session_id)?;
            log::info!("session {}: reset ({})", run.session.session_id, outcome.as_str());
        }
        Ok(())
    }
}
