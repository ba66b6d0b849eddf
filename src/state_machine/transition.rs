//! Pure state transition function
//!
//! Given the same state, context and event this always produces the same new
//! state and effects. All I/O happens in the runtime that executes effects.

use super::replies;
use super::state::{ConfirmDecision, ConvState, Interpretation, ServiceCall, SessionContext, Step};
use super::{Effect, Event};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: ConvState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ConvState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Session has not been started")]
    NotStarted,
    #[error("Session already started")]
    AlreadyStarted,
    #[error("A service request is already in progress")]
    ServiceBusy,
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// How the customer answered the confirmation prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConfirmationReply {
    Affirmative,
    Negative,
    Unclear,
}

/// Classify a reply case-insensitively; affirmative wins when both appear
pub(crate) fn classify_confirmation(text: &str) -> ConfirmationReply {
    let lower = text.to_lowercase();
    if lower.contains("yes") || lower.contains("confirm") {
        return ConfirmationReply::Affirmative;
    }
    let bare_negative = lower
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| matches!(word, "nah" | "n"));
    if lower.contains("no") || lower.contains("cancel") || bare_negative {
        ConfirmationReply::Negative
    } else {
        ConfirmationReply::Unclear
    }
}

pub fn transition(
    state: &ConvState,
    context: &SessionContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    let timing = context.timing;

    match event {
        // ============================================================
        // Session start
        // ============================================================
        Event::Start => {
            if state.step != Step::Greeting {
                return Err(TransitionError::AlreadyStarted);
            }
            let new_state = ConvState {
                step: Step::CollectingName,
                ..state.clone()
            };
            Ok(TransitionResult::new(new_state)
                .with_effect(Effect::assistant_message(replies::GREETING, timing.short))
                .with_effect(Effect::NotifyStateChange))
        }

        // ============================================================
        // User messages
        // ============================================================
        Event::UserMessage { text } => {
            if state.is_awaiting_service() {
                return Err(TransitionError::ServiceBusy);
            }
            handle_user_message(state, context, text)
        }

        // ============================================================
        // Interpretation results
        // ============================================================
        Event::InterpretationComplete { interpretation } => {
            if state.step != Step::AwaitingOrderText
                || state.in_flight != Some(ServiceCall::Interpreting)
            {
                return Err(TransitionError::InvalidTransition(format!(
                    "Interpretation result while {:?} (in flight: {:?})",
                    state.step, state.in_flight
                )));
            }

            match interpretation {
                Interpretation::Accepted(order) => {
                    let summary = replies::order_summary(&order);
                    let new_state = ConvState {
                        step: Step::AwaitingOrderConfirmation,
                        pending_order: Some(order),
                        in_flight: None,
                        ..state.clone()
                    };
                    Ok(TransitionResult::new(new_state)
                        .with_effect(Effect::assistant_message(summary, std::time::Duration::ZERO))
                        .with_effect(Effect::assistant_message(
                            replies::CONFIRM_PROMPT,
                            timing.short,
                        ))
                        .with_effect(Effect::NotifyStateChange))
                }
                Interpretation::Rejected { reason } => {
                    let new_state = ConvState {
                        in_flight: None,
                        ..state.clone()
                    };
                    Ok(TransitionResult::new(new_state)
                        .with_effect(Effect::assistant_message(reason, std::time::Duration::ZERO))
                        .with_effect(Effect::assistant_message(
                            replies::menu_retry(&context.catalog),
                            timing.short,
                        ))
                        .with_effect(Effect::NotifyStateChange))
                }
            }
        }

        // ============================================================
        // Confirmation acknowledgements
        // ============================================================
        Event::ConfirmationComplete { decision } => {
            if state.step != Step::AwaitingOrderConfirmation
                || state.in_flight != Some(ServiceCall::Confirming { decision })
            {
                return Err(TransitionError::InvalidTransition(format!(
                    "Confirmation result ({decision:?}) while {:?} (in flight: {:?})",
                    state.step, state.in_flight
                )));
            }
            Ok(match decision {
                ConfirmDecision::Yes => complete_order(state, context),
                ConfirmDecision::No => decline_order(state, context),
            })
        }
    }
}

fn handle_user_message(
    state: &ConvState,
    context: &SessionContext,
    text: String,
) -> Result<TransitionResult, TransitionError> {
    let timing = context.timing;
    let echo = Effect::user_message(text.clone());

    match state.step {
        Step::Greeting => Err(TransitionError::NotStarted),

        Step::CollectingName => {
            let ack = replies::name_ack(&text);
            let mut new_state = state.clone();
            new_state.profile.name = Some(text);
            new_state.step = Step::CollectingEmail;
            Ok(TransitionResult::new(new_state)
                .with_effect(echo)
                .with_effect(Effect::assistant_message(ack, timing.standard))
                .with_effect(Effect::NotifyStateChange))
        }

        // Invalid email -> same step, nothing stored
        Step::CollectingEmail if !text.contains('@') => Ok(TransitionResult::new(state.clone())
            .with_effect(echo)
            .with_effect(Effect::assistant_message(
                replies::INVALID_EMAIL,
                timing.standard,
            ))),

        Step::CollectingEmail => {
            let mut new_state = state.clone();
            new_state.profile.email = Some(text);
            new_state.step = Step::CollectingAddress;
            Ok(TransitionResult::new(new_state)
                .with_effect(echo)
                .with_effect(Effect::assistant_message(replies::ASK_ADDRESS, timing.standard))
                .with_effect(Effect::NotifyStateChange))
        }

        Step::CollectingAddress => {
            let mut new_state = state.clone();
            new_state.profile.address = Some(text);
            new_state.step = Step::AwaitingOrderText;
            Ok(TransitionResult::new(new_state)
                .with_effect(echo)
                .with_effect(Effect::assistant_message(
                    replies::menu_intro(&context.catalog),
                    timing.standard,
                ))
                .with_effect(Effect::assistant_message(
                    replies::ORDER_INSTRUCTIONS,
                    timing.short,
                ))
                .with_effect(Effect::NotifyStateChange))
        }

        Step::AwaitingOrderText => {
            let new_state = ConvState {
                in_flight: Some(ServiceCall::Interpreting),
                ..state.clone()
            };
            let profile = state.profile.clone();
            Ok(TransitionResult::new(new_state)
                .with_effect(echo)
                .with_effect(Effect::NotifyStateChange)
                .with_effect(Effect::RequestInterpretation {
                    order_text: text,
                    profile,
                }))
        }

        Step::AwaitingOrderConfirmation => {
            let decision = match classify_confirmation(&text) {
                ConfirmationReply::Affirmative => ConfirmDecision::Yes,
                ConfirmationReply::Negative => ConfirmDecision::No,
                ConfirmationReply::Unclear => {
                    return Ok(TransitionResult::new(state.clone())
                        .with_effect(echo)
                        .with_effect(Effect::assistant_message(
                            replies::CONFIRM_REPROMPT,
                            timing.standard,
                        )));
                }
            };

            let order_id = state
                .pending_order
                .as_ref()
                .and_then(|o| o.external_order_id.clone());

            let Some(order_id) = order_id else {
                // Nothing to acknowledge upstream
                let result = match decision {
                    ConfirmDecision::Yes => complete_order(state, context),
                    ConfirmDecision::No => decline_order(state, context),
                };
                return Ok(prepend(echo, result));
            };

            let new_state = ConvState {
                in_flight: Some(ServiceCall::Confirming { decision }),
                ..state.clone()
            };
            Ok(TransitionResult::new(new_state)
                .with_effect(echo)
                .with_effect(Effect::NotifyStateChange)
                .with_effect(Effect::RequestConfirmation { order_id, decision }))
        }

        Step::Complete => Ok(TransitionResult::new(state.clone())
            .with_effect(echo)
            .with_effect(Effect::assistant_message(
                replies::ALREADY_COMPLETE,
                timing.standard,
            ))),
    }
}

fn complete_order(state: &ConvState, context: &SessionContext) -> TransitionResult {
    let reply = replies::order_confirmed(state.profile.email.as_deref());
    let new_state = ConvState {
        step: Step::Complete,
        pending_order: None,
        confirmed_order: state.pending_order.clone(),
        in_flight: None,
        ..state.clone()
    };
    TransitionResult::new(new_state)
        .with_effect(Effect::assistant_message(reply, context.timing.standard))
        .with_effect(Effect::NotifyStateChange)
}

fn decline_order(state: &ConvState, context: &SessionContext) -> TransitionResult {
    let new_state = ConvState {
        step: Step::AwaitingOrderText,
        pending_order: None,
        in_flight: None,
        ..state.clone()
    };
    TransitionResult::new(new_state)
        .with_effect(Effect::assistant_message(
            replies::ORDER_INSTEAD,
            context.timing.standard,
        ))
        .with_effect(Effect::NotifyStateChange)
}

fn prepend(effect: Effect, mut result: TransitionResult) -> TransitionResult {
    result.effects.insert(0, effect);
    result
}
