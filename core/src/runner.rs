//! Script execution for a single run.
//!
//! RULES:
//!   - Steps execute strictly sequentially; there is never more than one
//!     in-flight step per session.
//!   - Every effect flows through execute() so journal order equals step
//!     order equals simulated-clock order.
//!   - Branches splice their chosen side into the front of the queue;
//!     the script stays a forward-only walk with no loops.
//!   - A failed step leaves the run `failed` with everything emitted so
//!     far retained.

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::VecDeque;

use crate::audit::{AdminLogEntry, AuditStore};
use crate::catalog::SimCatalog;
use crate::clock::SimClock;
use crate::error::SimResult;
use crate::form::{FieldStatus, FormState, Metrics};
use crate::incentive::{self, ComplianceVerdict};
use crate::journal::{EventPhase, EventStatus, Journal};
use crate::rng::RunRng;
use crate::scoring;
use crate::script::{BranchWhen, ScriptStep, ScriptVars, StepAction};
use crate::session::Session;
use crate::types::SimMillis;

/// Upper bound on a run's total simulated time. Scripts sum to well under
/// a minute; hitting this means a runaway script, and the run is failed
/// explicitly instead of stalling forever.
pub const RUN_BUDGET_MS: SimMillis = 120_000;

/// Run lifecycle once started. `Running` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Running,
    Complete,
    Failed,
    Cancelled,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running   => "running",
            Self::Complete  => "complete",
            Self::Failed    => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

/// One run's full execution state. Owned by the controller; retained
/// after completion so the final journal stays observable until reset.
pub struct ScriptRunner {
    pub session: Session,
    pub clock:   SimClock,
    pub state:   RunState,
    pub journal: Journal,
    pub form:    FormState,
    pub metrics: Metrics,
    steps:   VecDeque<ScriptStep>,
    vars:    ScriptVars,
    rng:     RunRng,
    score:   Option<i64>,
    verdict: Option<ComplianceVerdict>,
}

impl ScriptRunner {
    pub fn new(
        session: Session,
        steps: Vec<ScriptStep>,
        vars: ScriptVars,
        rng: RunRng,
        form: FormState,
    ) -> Self {
        let clock = SimClock::new(session.session_id.clone(), session.started_at);
        Self {
            session,
            clock,
            state: RunState::Running,
            journal: Journal::new(),
            form,
            metrics: Metrics::default(),
            steps: VecDeque::from(steps),
            vars,
            rng,
            score: None,
            verdict: None,
        }
    }

    pub fn remaining_steps(&self) -> usize {
        self.steps.len()
    }

    /// Pop the next scheduled step, or None when the script is drained.
    pub fn take_step(&mut self) -> Option<ScriptStep> {
        self.steps.pop_front()
    }

    pub fn verdict(&self) -> Option<&ComplianceVerdict> {
        self.verdict.as_ref()
    }

    /// Apply one step's action. The clock has already been advanced past
    /// the step's delay by the caller.
    pub fn execute(
        &mut self,
        action: StepAction,
        catalog: &SimCatalog,
        audit: &AuditStore,
    ) -> SimResult<()> {
        let now = self.clock.now();
        let elapsed = self.clock.elapsed_ms;

        match action {
            StepAction::Say { speaker, assistance, text } => {
                let content = text.render(&self.vars);
                log::debug!("t={elapsed}ms say: {speaker:?}: {content}");
                self.journal.append_message(speaker, content, now, assistance);
            }

            StepAction::Note { phase, status, title, description, trigger, audit: audit_tag } => {
                let description = description.render(&self.vars);
                log::debug!("t={elapsed}ms event: [{}] {title}", phase.as_str());
                self.journal.append_event(
                    phase,
                    title.to_string(),
                    description.clone(),
                    status,
                    trigger.map(str::to_string),
                    now,
                );
                if let Some(event_name) = audit_tag {
                    audit.append_admin(&AdminLogEntry {
                        id: None,
                        session_id: self.session.session_id.clone(),
                        at: now,
                        event: event_name.to_string(),
                        data: json!({
                            "title": title,
                            "description": description,
                            "status": status,
                            "trigger": trigger,
                        }),
                    })?;
                }
                if phase == EventPhase::Resolution {
                    self.metrics.assists_provided += 1;
                }
            }

            StepAction::ComputeScore { penalty } => {
                let score = scoring::lead_score(self.session.persona.income, self.session.tier, penalty);
                log::info!(
                    "t={elapsed}ms score: {score} (income={}, tier={})",
                    self.session.persona.income,
                    self.session.tier
                );
                self.vars.set("score", score.to_string());
                self.score = Some(score);
            }

            StepAction::AuthorizeIncentive { scenario_key } => {
                let score = self.score.unwrap_or_else(|| {
                    scoring::lead_score(
                        self.session.persona.income,
                        self.session.tier,
                        scoring::DROP_OFF_PENALTY,
                    )
                });
                match incentive::select_incentive(catalog, self.session.tier, scenario_key, score) {
                    Some(verdict) => {
                        let amount = verdict.incentive.amount;
                        self.vars.set("incentive_desc", verdict.incentive.description.clone());
                        self.vars.set("incentive_type", verdict.incentive.incentive_type.clone());
                        self.vars.set("incentive_amount", format!("{amount:.0}"));
                        self.vars.set("max_incentive", format!("{:.0}", verdict.max_allowed));

                        let (status, description) = if verdict.is_compliant {
                            log::info!(
                                "t={elapsed}ms incentive: approved {} ₹{amount:.0} (max ₹{:.0})",
                                verdict.incentive.incentive_type,
                                verdict.max_allowed
                            );
                            (
                                EventStatus::Success,
                                format!(
                                    "Approved {} worth ₹{amount:.0} (within ₹{:.0} limit)",
                                    verdict.incentive.incentive_type, verdict.max_allowed
                                ),
                            )
                        } else {
                            log::warn!(
                                "t={elapsed}ms incentive: {} ₹{amount:.0} exceeds tier ceiling ₹{:.0}",
                                verdict.incentive.incentive_type,
                                verdict.max_allowed
                            );
                            (
                                EventStatus::Warning,
                                format!(
                                    "Selected {} worth ₹{amount:.0} exceeds the ₹{:.0} limit and requires supervisor review",
                                    verdict.incentive.incentive_type, verdict.max_allowed
                                ),
                            )
                        };
                        self.journal.append_event(
                            EventPhase::Decision,
                            "Incentive Authorization".to_string(),
                            description,
                            status,
                            None,
                            now,
                        );
                        audit.append_admin(&AdminLogEntry {
                            id: None,
                            session_id: self.session.session_id.clone(),
                            at: now,
                            event: "incentive_authorized".to_string(),
                            data: json!({
                                "tier": self.session.tier,
                                "incentive": verdict.incentive,
                                "compliance": {
                                    "max_allowed": verdict.max_allowed,
                                    "is_compliant": verdict.is_compliant,
                                    "reason": verdict.reason,
                                },
                                "lead_score": score,
                            }),
                        })?;
                        self.verdict = Some(verdict);
                    }
                    None => {
                        log::info!(
                            "t={elapsed}ms incentive: no offer configured for {} {scenario_key}",
                            self.session.tier
                        );
                        self.journal.append_event(
                            EventPhase::Decision,
                            "No Incentive Available".to_string(),
                            format!(
                                "No offer configured for tier {}; continuing without incentive",
                                self.session.tier
                            ),
                            EventStatus::NeedsReview,
                            None,
                            now,
                        );
                    }
                }
            }

            StepAction::SetChannel { channel } => {
                log::info!("t={elapsed}ms channel: switched to {channel}");
                self.vars.set("channel", channel);
            }

            StepAction::UpgradeTier { to } => {
                let previous = self.session.tier;
                self.session.tier = to;
                self.vars.set("prev_tier", previous.as_str());
                self.vars.set("tier", to.as_str());
                log::info!("t={elapsed}ms tier: upgraded {previous} -> {to}");
            }

            StepAction::SetField { field, status, value, issues } => {
                match self.form.apply(field, status, value, issues, now) {
                    Some(FieldStatus::Completed) => self.metrics.fields_completed += 1,
                    Some(FieldStatus::Error)     => self.metrics.errors_encountered += 1,
                    Some(_) => {}
                    None => log::warn!("t={elapsed}ms field: unknown id '{field}'"),
                }
            }

            StepAction::Branch { when, then, otherwise } => {
                let condition = match when {
                    BranchWhen::OfferAvailable => self.verdict.is_some(),
                    BranchWhen::Chance(p)      => self.rng.chance(p),
                };
                log::debug!("t={elapsed}ms branch: {when:?} -> {condition}");
                let chosen = if condition { then } else { otherwise };
                for sub_step in chosen.into_iter().rev() {
                    self.steps.push_front(sub_step);
                }
            }
        }

        self.metrics.active_time_secs = self.clock.elapsed_ms / 1000;
        Ok(())
    }
}
