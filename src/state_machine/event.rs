//! Events that can occur in a conversation

use crate::state_machine::state::{ConfirmDecision, Interpretation};

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // Session events
    Start,

    // User events
    UserMessage { text: String },

    // Service events
    InterpretationComplete { interpretation: Interpretation },
    /// The confirmer returned, successfully or not
    ConfirmationComplete { decision: ConfirmDecision },
}
