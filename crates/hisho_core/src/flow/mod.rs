//! Guided-entry conversation flows.
//!
//! # Responsibility
//! - Drive the fixed field-per-message collection sequences for profile,
//!   schedule and meal registration.
//! - Keep validation table-driven: each (flow, step) pairs a prompt with a
//!   validator and the re-prompt used on rejection.
//!
//! # Invariants
//! - A rejected answer leaves the step index and buffer unchanged.
//! - The buffer is discarded on finalize or cancel, never reused.

mod engine;
mod state;
mod steps;

pub use engine::{advance, first_prompt, FlowOutcome};
pub use state::{FlowState, FlowType};
pub use steps::{steps_for, FlowStep};
