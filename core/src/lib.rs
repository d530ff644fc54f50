//! Dispute enforcement core.
//!
//! Turns user-reported facts ("the bureau said X on date Y") and
//! system-detected events into legally significant state transitions:
//! statutory deadlines, new violations, reinsertion detection,
//! cross-entity contradiction patterns, and an irreversible escalation
//! lifecycle backed by an append-only paper trail.
//!
//! Authority separation: user actions enter through `engine::DisputeEngine`
//! and are stamped USER; the scheduler's breach and stall converters are
//! the only writers of SYSTEM-authored responses.

pub mod clock;
pub mod deadline;
pub mod dispute;
pub mod engine;
pub mod entity;
pub mod error;
pub mod escalation;
pub mod guardrail;
pub mod ledger;
pub mod patterns;
pub mod reinsertion;
pub mod report;
pub mod response;
pub mod scheduler;
pub mod store;
pub mod types;
pub mod violation;
