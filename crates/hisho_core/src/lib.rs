//! Core domain logic for Hisho, a personal-assistant backend.
//! This crate is the single source of truth for business invariants.

pub mod db;
pub mod flow;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod session;

pub use flow::{FlowState, FlowType};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::command::{ActionType, Command, CommandRequest, Mode, UndoRequest};
pub use model::meal::{Meal, MealId};
pub use model::profile::Profile;
pub use model::schedule::{Schedule, ScheduleId, ScheduleStatus};
pub use model::ValidationError;
pub use repo::{RepoError, RepoResult};
pub use service::assistant::{AssistantService, FlowReply};
pub use service::executor::{CommandOutcome, EntityRecord};
pub use service::undo::UndoOutcome;
pub use service::AssistantError;
pub use session::{SessionContext, SessionRegistry};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
