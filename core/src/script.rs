//! Script steps — the unit of execution for a scenario run.
//!
//! A script is an ordered list of timed steps. Steps are plain data, not
//! callbacks: the runner consumes them one at a time, advancing the
//! session clock by each step's delay before applying its action. Branches
//! carry their sub-sequences inline; the chosen side is spliced into the
//! front of the remaining queue, so a run stays a single linear walk with
//! no loops and no backward transitions.

use crate::form::FieldStatus;
use crate::journal::{EventPhase, EventStatus, Speaker};
use crate::types::{SimMillis, Tier};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct ScriptStep {
    pub delay_ms: SimMillis,
    pub action:   StepAction,
}

#[derive(Debug, Clone)]
pub enum StepAction {
    /// Append a conversation turn.
    Say {
        speaker:    Speaker,
        assistance: bool,
        text:       Template,
    },

    /// Append a timeline event. `audit` names the admin-log event the
    /// emission is mirrored under; None means not audit-worthy.
    Note {
        phase:       EventPhase,
        status:      EventStatus,
        title:       &'static str,
        description: Template,
        trigger:     Option<&'static str>,
        audit:       Option<&'static str>,
    },

    /// Run the scoring engine and store the result for later steps.
    ComputeScore { penalty: f64 },

    /// Run the incentive selector for the stored score, record the
    /// compliance verdict, and emit the authorization decision event.
    AuthorizeIncentive { scenario_key: &'static str },

    /// Switch the outreach channel (channel-failure fallback).
    SetChannel { channel: &'static str },

    /// The single supported cross-step mutation: mid-run tier change.
    UpgradeTier { to: Tier },

    /// Mutate a form field in place (assistance simulator).
    SetField {
        field:  &'static str,
        status: FieldStatus,
        value:  Option<&'static str>,
        issues: &'static [&'static str],
    },

    /// Pick one of two sub-sequences to run next. The losing side is
    /// discarded; the winning side runs with its own delays.
    Branch {
        when:      BranchWhen,
        then:      Vec<ScriptStep>,
        otherwise: Vec<ScriptStep>,
    },
}

#[derive(Debug, Clone, Copy)]
pub enum BranchWhen {
    /// True when the incentive selector produced an offer for this run.
    OfferAvailable,
    /// Seeded-RNG draw: true with the given probability.
    Chance(f64),
}

/// A message or event description with `{key}` placeholders resolved
/// against the run's variables at emission time. Unresolved placeholders
/// are left verbatim, which makes a missing variable visible in the log
/// instead of silently blank.
#[derive(Debug, Clone, Copy)]
pub struct Template(pub &'static str);

impl Template {
    pub fn render(&self, vars: &ScriptVars) -> String {
        let mut out = String::with_capacity(self.0.len());
        let mut rest = self.0;
        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let tail = &rest[open + 1..];
            match tail.find('}') {
                Some(close) => {
                    let key = &tail[..close];
                    match vars.get(key) {
                        Some(value) => out.push_str(value),
                        None => {
                            out.push('{');
                            out.push_str(key);
                            out.push('}');
                        }
                    }
                    rest = &tail[close + 1..];
                }
                None => {
                    out.push_str(&rest[open..]);
                    rest = "";
                }
            }
        }
        out.push_str(rest);
        out
    }
}

/// Session-scoped variables written by compute/mutate steps and read by
/// templates: persona name, channel, score, incentive details, tier.
#[derive(Debug, Default)]
pub struct ScriptVars {
    map: HashMap<&'static str, String>,
}

impl ScriptVars {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: &'static str, value: impl Into<String>) {
        self.map.insert(key, value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_resolve_from_vars() {
        let mut vars = ScriptVars::new();
        vars.set("first_name", "Rohan");
        vars.set("channel", "WhatsApp");
        let text = Template("Hi {first_name}, reaching you via {channel}.").render(&vars);
        assert_eq!(text, "Hi Rohan, reaching you via WhatsApp.");
    }

    #[test]
    fn unresolved_placeholders_stay_verbatim() {
        let vars = ScriptVars::new();
        assert_eq!(Template("score: {score}").render(&vars), "score: {score}");
    }

    #[test]
    fn unterminated_brace_is_literal() {
        let vars = ScriptVars::new();
        assert_eq!(Template("brace {oops").render(&vars), "brace {oops");
    }
}
