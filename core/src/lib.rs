//! Scripted scenario simulator for digital-bank onboarding journeys.
//!
//! Given a persona, tier, and scenario, the engine executes an ordered
//! script of timed steps that emit chat messages, timeline events, and
//! form-field changes, branching on a computed lead score, offer
//! availability, or a seeded random draw.
//!
//! RULES:
//!   - One session per controller; steps execute strictly sequentially.
//!   - All randomness flows through the RngBank; identical seeds replay
//!     identical runs.
//!   - The journal is append-only and ordered; audit-worthy emissions are
//!     mirrored to the SQLite admin log.
//!   - Every run ends in an explicit terminal state.

pub mod audit;
pub mod catalog;
pub mod clock;
pub mod controller;
pub mod error;
pub mod form;
pub mod incentive;
pub mod journal;
pub mod rng;
pub mod runner;
pub mod scenario;
pub mod scoring;
pub mod script;
pub mod session;
pub mod snapshot;
pub mod types;
