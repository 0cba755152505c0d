//! Session clock — owns simulated time, pacing, and pause.
//!
//! Script steps advance simulated time by their declared delay; the clock
//! never reads the wall clock after session start. Entry timestamps are
//! derived as `started_at + elapsed`, which keeps them strictly
//! non-decreasing in append order.

use crate::types::{SessionId, SimMillis};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimClock {
    pub session_id: SessionId,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: SimMillis,
    pub speed:      SimSpeed,
    pub paused:     bool,
}

impl SimClock {
    pub fn new(session_id: SessionId, started_at: DateTime<Utc>) -> Self {
        Self {
            session_id,
            started_at,
            elapsed_ms: 0,
            speed: SimSpeed::Instant,
            paused: false,
        }
    }

    /// Advance simulated time by one step delay. Returns the new elapsed
    /// total. Panics if called while paused — callers must check.
    pub fn advance(&mut self, delay_ms: SimMillis) -> SimMillis {
        assert!(!self.paused, "advance() called on paused clock");
        self.elapsed_ms += delay_ms;
        self.elapsed_ms
    }

    /// The current simulated instant.
    pub fn now(&self) -> DateTime<Utc> {
        self.started_at + Duration::milliseconds(self.elapsed_ms as i64)
    }

    pub fn pause(&mut self)  { self.paused = true;  }
    pub fn resume(&mut self) { self.paused = false; }

    pub fn set_speed(&mut self, speed: SimSpeed) {
        self.speed = speed;
    }

    /// How long a driver should actually sleep for a step delay.
    pub fn real_delay_ms(&self, delay_ms: SimMillis) -> SimMillis {
        match self.speed {
            SimSpeed::Instant  => 0,
            SimSpeed::Realtime => delay_ms,
            SimSpeed::Fast     => delay_ms / 10,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SimSpeed {
    Instant,  // no wall-clock pacing (tests, headless runs)
    Realtime, // pace steps at their scripted delays
    Fast,     // 10x
}
