//! Per-session context and registry.
//!
//! # Responsibility
//! - Carry session identity and the active guided flow, passed explicitly
//!   into every command/flow operation.
//! - Serialize access per session through closure check-out.
//!
//! # Invariants
//! - At most one flow is active per session.
//! - A flow's buffer lives only inside the active `FlowState` and dies with
//!   it on finalize or cancel.

use crate::flow::FlowState;
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Explicit session state handed to command and flow operations.
#[derive(Debug, Default)]
pub struct SessionContext {
    key: String,
    flow: Option<FlowState>,
}

impl SessionContext {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            flow: None,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn flow(&self) -> Option<&FlowState> {
        self.flow.as_ref()
    }

    pub fn set_flow(&mut self, state: FlowState) {
        self.flow = Some(state);
    }

    pub fn take_flow(&mut self) -> Option<FlowState> {
        self.flow.take()
    }

    /// Drops any active flow and its buffer. Returns whether one was active.
    pub fn clear_flow(&mut self) -> bool {
        self.flow.take().is_some()
    }
}

/// Keyed store of session contexts with serialized access.
///
/// The mutex guarantees at most one in-flight operation per session (the
/// lock is coarser than strictly required, covering all sessions).
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Mutex<BTreeMap<String, SessionContext>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` against the session for `key`, creating it on first use.
    pub fn with_session<R>(&self, key: &str, f: impl FnOnce(&mut SessionContext) -> R) -> R {
        let mut sessions = match self.sessions.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let session = sessions
            .entry(key.to_string())
            .or_insert_with(|| SessionContext::new(key));
        f(session)
    }

    pub fn len(&self) -> usize {
        match self.sessions.lock() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::SessionRegistry;
    use crate::flow::{FlowState, FlowType};

    #[test]
    fn with_session_creates_and_reuses_contexts() {
        let registry = SessionRegistry::new();
        registry.with_session("a", |session| {
            assert_eq!(session.key(), "a");
            session.set_flow(FlowState::new(FlowType::Profile));
        });
        registry.with_session("a", |session| {
            assert!(session.flow().is_some());
        });
        registry.with_session("b", |session| {
            assert!(session.flow().is_none());
        });
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn clear_flow_reports_whether_one_was_active() {
        let registry = SessionRegistry::new();
        registry.with_session("a", |session| {
            assert!(!session.clear_flow());
            session.set_flow(FlowState::new(FlowType::Meal));
            assert!(session.clear_flow());
            assert!(session.flow().is_none());
        });
    }
}
