//! Flow identity and per-flow collection state.

use crate::model::command::Mode;
use serde_json::{Map, Value};

/// Which guided flow is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowType {
    Profile,
    Schedule,
    Meal,
}

impl FlowType {
    /// The entity kind this flow finalizes into.
    pub fn mode(self) -> Mode {
        match self {
            Self::Profile => Mode::Profile,
            Self::Schedule => Mode::Schedule,
            Self::Meal => Mode::Meal,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Profile => "profile",
            Self::Schedule => "schedule",
            Self::Meal => "meal",
        }
    }
}

/// One session's in-progress guided collection.
#[derive(Debug, Clone)]
pub struct FlowState {
    flow: FlowType,
    step: usize,
    buffer: Map<String, Value>,
}

impl FlowState {
    pub fn new(flow: FlowType) -> Self {
        Self {
            flow,
            step: 0,
            buffer: Map::new(),
        }
    }

    pub fn flow_type(&self) -> FlowType {
        self.flow
    }

    pub fn step(&self) -> usize {
        self.step
    }

    /// Stores an accepted answer; `Null` marks an optional field left empty.
    pub(crate) fn put(&mut self, field: &str, value: Value) {
        if !value.is_null() {
            self.buffer.insert(field.to_string(), value);
        }
    }

    pub(crate) fn advance_step(&mut self) {
        self.step += 1;
    }

    pub(crate) fn step_back(&mut self) {
        self.step = self.step.saturating_sub(1);
    }

    /// The collected record as the flat field map the add contract expects.
    pub(crate) fn to_data(&self) -> Value {
        Value::Object(self.buffer.clone())
    }
}
