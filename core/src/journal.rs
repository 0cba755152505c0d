//! The session journal — every observable emission of a run.
//!
//! RULE: the journal is append-only. Entries get a monotonic id and a
//! timestamp from the session clock at append time; there are no edit or
//! delete operations. Append order is chronological order, and consumers
//! must render in that order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::LogId;

/// Who produced a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    User,
    Agent,
    System,
}

/// A single conversation turn. Immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id:         LogId,
    pub speaker:    Speaker,
    pub content:    String,
    pub at:         DateTime<Utc>,
    /// Set on agent turns produced by an assistance intervention.
    pub assistance: bool,
}

/// Timeline event phase. Recovery runs emit the trigger → outcome phases;
/// assistance runs emit detection → resolution. One discriminated enum so
/// consumers can exhaustively match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventPhase {
    // ── Drop-off recovery ──────────────────────────
    Trigger,
    Decision,
    Action,
    Outcome,
    // ── In-progress assistance ─────────────────────
    Detection,
    Intervention,
    Resolution,
    // ── Shared ─────────────────────────────────────
    Analysis,
}

impl EventPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trigger      => "trigger",
            Self::Decision     => "decision",
            Self::Action       => "action",
            Self::Outcome      => "outcome",
            Self::Detection    => "detection",
            Self::Intervention => "intervention",
            Self::Resolution   => "resolution",
            Self::Analysis     => "analysis",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Success,
    Warning,
    NeedsReview,
    Blocked,
}

/// A timeline event. Same lifecycle rules as Message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub id:          LogId,
    pub phase:       EventPhase,
    pub title:       String,
    pub description: String,
    pub at:          DateTime<Utc>,
    pub status:      EventStatus,
    /// Machine tag naming what fired the event, e.g. `idle_30s`.
    pub trigger:     Option<String>,
}

/// Append-only record of one run's messages and events.
///
/// Messages and events share a single id counter, so ids are globally
/// ordered across both sequences within a session.
#[derive(Debug, Default)]
pub struct Journal {
    next_id:  LogId,
    messages: Vec<Message>,
    events:   Vec<TimelineEvent>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_message(
        &mut self,
        speaker: Speaker,
        content: String,
        at: DateTime<Utc>,
        assistance: bool,
    ) {
        let id = self.take_id();
        self.messages.push(Message { id, speaker, content, at, assistance });
    }

    pub fn append_event(
        &mut self,
        phase: EventPhase,
        title: String,
        description: String,
        status: EventStatus,
        trigger: Option<String>,
        at: DateTime<Utc>,
    ) {
        let id = self.take_id();
        self.events.push(TimelineEvent { id, phase, title, description, at, status, trigger });
    }

    /// Full ordered message sequence.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Full ordered event sequence.
    pub fn events(&self) -> &[TimelineEvent] {
        &self.events
    }

    fn take_id(&mut self) -> LogId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    /// Appends come back in submission order with strictly increasing ids
    /// and non-decreasing timestamps.
    #[test]
    fn append_order_preserved() {
        let mut journal = Journal::new();
        for i in 0..10u64 {
            journal.append_message(Speaker::System, format!("m{i}"), at(i as i64 * 100), false);
        }

        let contents: Vec<&str> =
            journal.messages().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["m0", "m1", "m2", "m3", "m4", "m5", "m6", "m7", "m8", "m9"]);

        for pair in journal.messages().windows(2) {
            assert!(pair[0].id < pair[1].id);
            assert!(pair[0].at <= pair[1].at);
        }
    }

    /// Messages and events share one id counter, so interleaved appends
    /// are globally ordered.
    #[test]
    fn ids_shared_across_messages_and_events() {
        let mut journal = Journal::new();
        journal.append_message(Speaker::Agent, "hello".into(), at(0), false);
        journal.append_event(
            EventPhase::Trigger,
            "t".into(),
            "d".into(),
            EventStatus::Warning,
            None,
            at(10),
        );
        journal.append_message(Speaker::User, "hi".into(), at(20), false);

        assert_eq!(journal.messages()[0].id, 0);
        assert_eq!(journal.events()[0].id, 1);
        assert_eq!(journal.messages()[1].id, 2);
    }
}
