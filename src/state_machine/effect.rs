//! Effects produced by state transitions

use crate::state_machine::state::{ConfirmDecision, CustomerProfile};
use crate::transcript::Origin;
use std::time::Duration;

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Commit a message to the transcript, revealed after `delay`
    AppendMessage {
        origin: Origin,
        text: String,
        delay: Duration,
    },

    /// Ask the order service to interpret free text
    RequestInterpretation {
        order_text: String,
        profile: CustomerProfile,
    },

    /// Tell the order service the customer's decision
    RequestConfirmation {
        order_id: String,
        decision: ConfirmDecision,
    },

    /// Notify observers that step or profile changed
    NotifyStateChange,
}

impl Effect {
    pub fn user_message(text: impl Into<String>) -> Self {
        Effect::AppendMessage {
            origin: Origin::User,
            text: text.into(),
            delay: Duration::ZERO,
        }
    }

    pub fn assistant_message(text: impl Into<String>, delay: Duration) -> Self {
        Effect::AppendMessage {
            origin: Origin::Assistant,
            text: text.into(),
            delay,
        }
    }
}
