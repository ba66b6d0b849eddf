//! Property-based tests for the state machine
//!
//! These tests drive whole sessions through random inputs, answering every
//! service request immediately, and check invariants after every step.

use super::state::*;
use super::transition::*;
use super::*;
use crate::menu::MenuCatalog;
use crate::transcript::Origin;
use proptest::prelude::*;
use std::sync::Arc;

// ============================================================================
// Test Helpers
// ============================================================================

fn test_context() -> SessionContext {
    SessionContext::new(
        "test-session",
        Arc::new(MenuCatalog::default()),
        RevealTiming::default(),
    )
}

/// One simulated customer action plus how the service will answer it
#[derive(Debug, Clone)]
enum Input {
    Text(String),
    /// Text while the service answers with this order (or rejects)
    Order {
        text: String,
        outcome: ServiceOutcome,
    },
}

#[derive(Debug, Clone)]
enum ServiceOutcome {
    Accept { quantity: u32, order_id: Option<String> },
    Reject(String),
}

impl ServiceOutcome {
    fn interpretation(&self, catalog: &MenuCatalog) -> Interpretation {
        match self {
            ServiceOutcome::Accept { quantity, order_id } => {
                let item = &catalog.items()[0];
                Interpretation::Accepted(PendingOrder::new(
                    vec![LineItem::new(item, *quantity)],
                    order_id.clone(),
                ))
            }
            ServiceOutcome::Reject(reason) => Interpretation::rejected(reason.clone()),
        }
    }
}

/// Apply a user message and settle any service request it triggers
fn drive(
    state: &ConvState,
    ctx: &SessionContext,
    text: String,
    outcome: &ServiceOutcome,
) -> Result<(ConvState, Vec<Effect>), TransitionError> {
    let mut result = transition(state, ctx, Event::UserMessage { text })?;
    let mut effects = std::mem::take(&mut result.effects);
    let mut state = result.new_state;

    let follow_up = effects.iter().find_map(|e| match e {
        Effect::RequestInterpretation { .. } => Some(Event::InterpretationComplete {
            interpretation: outcome.interpretation(&ctx.catalog),
        }),
        Effect::RequestConfirmation { decision, .. } => {
            Some(Event::ConfirmationComplete { decision: *decision })
        }
        _ => None,
    });

    if let Some(event) = follow_up {
        let next = transition(&state, ctx, event)?;
        state = next.new_state;
        effects.extend(next.effects);
    }
    Ok((state, effects))
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_text() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z ]{1,20}",
        "[a-z]{1,8}@[a-z]{1,8}\\.com",
        Just("yes please".to_string()),
        Just("nah".to_string()),
        Just("no".to_string()),
        Just("maybe".to_string()),
        Just("221B Baker Street".to_string()),
    ]
}

fn arb_outcome() -> impl Strategy<Value = ServiceOutcome> {
    prop_oneof![
        (1u32..10, proptest::option::of("[a-z0-9]{6}")).prop_map(|(quantity, order_id)| {
            ServiceOutcome::Accept { quantity, order_id }
        }),
        "[a-zA-Z ]{1,20}".prop_map(ServiceOutcome::Reject),
    ]
}

fn arb_input() -> impl Strategy<Value = Input> {
    prop_oneof![
        arb_text().prop_map(Input::Text),
        (arb_text(), arb_outcome()).prop_map(|(text, outcome)| Input::Order { text, outcome }),
    ]
}

fn arb_invalid_email() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 .-]{0,30}"
}

// ============================================================================
// State Validity Checkers
// ============================================================================

fn is_valid_state(state: &ConvState) -> bool {
    let pending_ok =
        state.pending_order.is_some() == (state.step == Step::AwaitingOrderConfirmation);
    let order_ok = state.pending_order.iter().all(|o| {
        !o.line_items.is_empty()
            && o.line_items.iter().all(|l| l.quantity >= 1)
            && o.total == o.line_items.iter().map(|l| l.line_subtotal).sum::<u64>()
    });
    state.profile.is_consistent_with(state.step)
        && pending_ok
        && order_ok
        && state.in_flight.is_none()
}

fn started() -> ConvState {
    transition(&ConvState::default(), &test_context(), Event::Start)
        .unwrap()
        .new_state
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // Invariant 1: every settled state is consistent with its step
    #[test]
    fn prop_sessions_stay_consistent(inputs in proptest::collection::vec(arb_input(), 0..25)) {
        let ctx = test_context();
        let mut state = started();
        let default_outcome = ServiceOutcome::Reject("nope".to_string());

        for input in inputs {
            let (text, outcome) = match input {
                Input::Text(text) => (text, default_outcome.clone()),
                Input::Order { text, outcome } => (text, outcome),
            };
            let (next, effects) = drive(&state, &ctx, text.clone(), &outcome)
                .map_err(|e| TestCaseError::fail(format!("transition failed: {e}")))?;

            prop_assert!(is_valid_state(&next), "Invalid state: {:?}", next);

            // Every submission echoes the user and gets a visible reply
            prop_assert_eq!(&effects[0], &Effect::user_message(text));
            prop_assert!(effects.iter().any(|e| matches!(
                e,
                Effect::AppendMessage { origin: Origin::Assistant, .. }
            )), "expected an assistant AppendMessage effect");

            state = next;
        }
    }

    // Invariant 2: profile fields are never rolled back
    #[test]
    fn prop_profile_is_monotonic(inputs in proptest::collection::vec((arb_text(), arb_outcome()), 0..25)) {
        let ctx = test_context();
        let mut state = started();

        for (text, outcome) in inputs {
            let (next, _) = drive(&state, &ctx, text, &outcome).unwrap();
            for (before, after) in [
                (&state.profile.name, &next.profile.name),
                (&state.profile.email, &next.profile.email),
                (&state.profile.address, &next.profile.address),
            ] {
                if before.is_some() {
                    prop_assert_eq!(before, after);
                }
            }
            state = next;
        }
    }

    // Invariant 3: invalid emails never advance or store anything
    #[test]
    fn prop_invalid_email_is_idempotent(attempts in proptest::collection::vec(arb_invalid_email(), 1..10)) {
        let ctx = test_context();
        let mut state = transition(
            &started(),
            &ctx,
            Event::UserMessage { text: "Jordan".to_string() },
        )
        .unwrap()
        .new_state;
        let before = state.clone();

        for text in attempts {
            let result = transition(&state, &ctx, Event::UserMessage { text }).unwrap();
            state = result.new_state;
            prop_assert_eq!(&state, &before);
        }
        prop_assert_eq!(state.step, Step::CollectingEmail);
        prop_assert!(state.profile.email.is_none());
    }

    // Invariant 4: Complete absorbs everything
    #[test]
    fn prop_complete_is_absorbing(texts in proptest::collection::vec(arb_text(), 1..10)) {
        let ctx = test_context();
        let state = ConvState {
            step: Step::Complete,
            profile: CustomerProfile {
                name: Some("Jordan".to_string()),
                email: Some("j@x.io".to_string()),
                address: Some("Somewhere".to_string()),
                phone: None,
            },
            ..ConvState::default()
        };

        for text in texts {
            let result = transition(&state, &ctx, Event::UserMessage { text }).unwrap();
            prop_assert_eq!(&result.new_state, &state);
            prop_assert!(!result.effects.iter().any(|e| matches!(
                e,
                Effect::RequestInterpretation { .. } | Effect::RequestConfirmation { .. }
            )), "expected no interpretation/confirmation request effects");
        }
    }

    // Invariant 5: a session with a call in flight rejects new input
    #[test]
    fn prop_in_flight_rejects_messages(text in arb_text(), confirming in any::<bool>()) {
        let state = if confirming {
            ConvState {
                step: Step::AwaitingOrderConfirmation,
                in_flight: Some(ServiceCall::Confirming { decision: ConfirmDecision::Yes }),
                ..ConvState::default()
            }
        } else {
            ConvState {
                step: Step::AwaitingOrderText,
                in_flight: Some(ServiceCall::Interpreting),
                ..ConvState::default()
            }
        };
        let result = transition(&state, &test_context(), Event::UserMessage { text });
        prop_assert_eq!(result.unwrap_err(), TransitionError::ServiceBusy);
    }

    // Invariant 6: accepted totals are quantity times unit price
    #[test]
    fn prop_accepted_total_matches_catalog(quantity in 1u32..50) {
        let ctx = test_context();
        let state = ConvState {
            step: Step::AwaitingOrderText,
            in_flight: Some(ServiceCall::Interpreting),
            ..ConvState::default()
        };
        let outcome = ServiceOutcome::Accept { quantity, order_id: None };
        let result = transition(
            &state,
            &ctx,
            Event::InterpretationComplete { interpretation: outcome.interpretation(&ctx.catalog) },
        )
        .unwrap();
        let order = result.new_state.pending_order.unwrap();
        prop_assert_eq!(order.line_items.len(), 1);
        prop_assert_eq!(order.total, u64::from(quantity) * ctx.catalog.items()[0].unit_price);
    }
}
