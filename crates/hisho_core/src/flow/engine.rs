//! Flow transition engine.
//!
//! Pure state-machine logic: one message in, one transition out. Storage and
//! finalization side effects belong to the assistant service.

use super::state::{FlowState, FlowType};
use super::steps::steps_for;
use serde_json::Value;

/// Result of feeding one user message into an active flow.
#[derive(Debug)]
pub enum FlowOutcome {
    /// Answer accepted; ask the next question.
    Continue {
        state: FlowState,
        prompt: &'static str,
    },
    /// Answer rejected; same step, corrective message.
    Retry {
        state: FlowState,
        reprompt: &'static str,
    },
    /// All fields collected. `data` matches the add contract for the flow's
    /// entity kind; `state` is returned so a failed finalize can be retried
    /// at the last step without losing earlier answers.
    Complete { state: FlowState, data: Value },
}

/// The question that opens a freshly started flow.
pub fn first_prompt(flow: FlowType) -> &'static str {
    steps_for(flow)[0].prompt
}

/// Validates one message against the current step and transitions.
pub fn advance(mut state: FlowState, message: &str) -> FlowOutcome {
    let steps = steps_for(state.flow_type());
    let step = &steps[state.step()];

    let Some(value) = (step.parse)(message) else {
        return FlowOutcome::Retry {
            reprompt: step.reprompt,
            state,
        };
    };

    state.put(step.field, value);
    state.advance_step();

    if state.step() < steps.len() {
        let prompt = steps[state.step()].prompt;
        FlowOutcome::Continue { state, prompt }
    } else {
        let data = state.to_data();
        FlowOutcome::Complete { state, data }
    }
}
