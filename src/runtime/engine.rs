//! Conversation engine
//!
//! Owns one session's state and transcript. Every event goes through the pure
//! transition function; the engine executes the resulting effects. Service
//! calls come back out as a `ServiceRequest` so the caller decides whether to
//! await them inline or run them on another task.

use super::traits::{OrderConfirmer, OrderInterpreter};
use super::{SessionError, SessionEvent, SessionSnapshot};
use crate::order_service::InterpretRequest;
use crate::state_machine::replies::SERVICE_FAILURE;
use crate::state_machine::{
    transition, ConfirmDecision, ConvState, CustomerProfile, Effect, Event, Interpretation,
    PendingOrder, SessionContext, Step,
};
use crate::transcript::{Message, Transcript};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::future::Future;
use tokio::sync::{broadcast, watch};

/// An order service call the session is waiting on
#[derive(Debug, Clone)]
pub enum ServiceRequest {
    Interpret(InterpretRequest),
    Confirm {
        order_id: String,
        decision: ConfirmDecision,
    },
}

pub struct ConversationEngine<I, C>
where
    I: OrderInterpreter,
    C: OrderConfirmer,
{
    context: SessionContext,
    state: ConvState,
    transcript: Transcript,
    interpreter: I,
    confirmer: C,
    /// Mirrors `state.is_awaiting_service()` for observers on other tasks
    awaiting_tx: watch::Sender<bool>,
    broadcast_tx: Option<broadcast::Sender<SessionEvent>>,
}

impl<I, C> ConversationEngine<I, C>
where
    I: OrderInterpreter,
    C: OrderConfirmer,
{
    pub fn new(context: SessionContext, interpreter: I, confirmer: C) -> Self {
        let (awaiting_tx, _) = watch::channel(false);
        Self {
            context,
            state: ConvState::default(),
            transcript: Transcript::new(),
            interpreter,
            confirmer,
            awaiting_tx,
            broadcast_tx: None,
        }
    }

    /// Publish revealed messages and state changes on `tx`
    pub fn with_broadcast(mut self, tx: broadcast::Sender<SessionEvent>) -> Self {
        self.broadcast_tx = Some(tx);
        self
    }

    pub fn session_id(&self) -> &str {
        &self.context.session_id
    }

    #[allow(dead_code)] // Used in tests
    pub fn state(&self) -> &ConvState {
        &self.state
    }

    #[allow(dead_code)] // Used in tests
    pub fn step(&self) -> Step {
        self.state.step
    }

    #[allow(dead_code)] // Used in tests
    pub fn profile(&self) -> &CustomerProfile {
        &self.state.profile
    }

    #[allow(dead_code)] // Used in tests
    pub fn pending_order(&self) -> Option<&PendingOrder> {
        self.state.pending_order.as_ref()
    }

    /// Visible messages, oldest first
    #[allow(dead_code)] // Used in tests
    pub fn transcript(&self) -> &[Message] {
        self.transcript.messages()
    }

    /// Messages committed but not yet visible
    #[allow(dead_code)] // Used in tests
    pub fn pending_reveals(&self) -> usize {
        self.transcript.pending_count()
    }

    pub fn is_awaiting_service(&self) -> bool {
        self.state.is_awaiting_service()
    }

    /// Observe the awaiting-service flag from another task
    pub fn subscribe_awaiting(&self) -> watch::Receiver<bool> {
        self.awaiting_tx.subscribe()
    }

    pub fn next_reveal_at(&self) -> Option<DateTime<Utc>> {
        self.transcript.next_reveal_at()
    }

    /// Reveal every message due at `now`
    pub fn reveal_due(&mut self, now: DateTime<Utc>) -> Vec<Message> {
        let revealed = self.transcript.reveal_due(now);
        for message in &revealed {
            self.publish_message(message);
        }
        revealed
    }

    /// Reveal everything still queued, ignoring delays
    #[allow(dead_code)] // Used in tests
    pub fn flush_reveals(&mut self) -> Vec<Message> {
        let revealed = self.transcript.flush();
        for message in &revealed {
            self.publish_message(message);
        }
        revealed
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.context.session_id.clone(),
            step: self.state.step,
            profile: self.state.profile.clone(),
            pending_order: self.state.pending_order.clone(),
            confirmed_order: self.state.confirmed_order.clone(),
            awaiting_service: self.state.is_awaiting_service(),
            transcript: self.transcript.messages().to_vec(),
        }
    }

    /// Greet the customer and begin collecting their name
    pub fn start(&mut self) {
        if self.state.step != Step::Greeting {
            tracing::warn!(session_id = %self.context.session_id, "Session already started");
            return;
        }
        // Start never requests a service call
        let _ = self.process_event(Event::Start);
    }

    /// Apply customer text without waiting on the order service.
    ///
    /// Input is turned away with `Busy` while a call is outstanding, before
    /// anything reaches the transcript. Returns the call to make, if any.
    pub fn accept_input(
        &mut self,
        text: impl Into<String>,
    ) -> Result<Option<ServiceRequest>, SessionError> {
        if self.state.is_awaiting_service() {
            return Err(SessionError::Busy);
        }
        if self.state.step == Step::Greeting {
            self.start();
        }
        Ok(self.process_event(Event::UserMessage { text: text.into() }))
    }

    /// Feed the outcome of a service call back in
    pub fn complete_service_call(&mut self, event: Event) -> Option<ServiceRequest> {
        self.process_event(event)
    }

    /// Handle one line of customer input, awaiting any service call inline.
    ///
    /// Step and profile are final when this returns; assistant replies may
    /// still be waiting for their reveal.
    pub async fn submit(&mut self, text: impl Into<String>) -> Result<(), SessionError> {
        let mut request = self.accept_input(text)?;
        while let Some(current) = request {
            let event = perform_request(
                &self.interpreter,
                &self.confirmer,
                &self.context.session_id,
                current,
            )
            .await;
            request = self.process_event(event);
        }
        Ok(())
    }

    fn process_event(&mut self, event: Event) -> Option<ServiceRequest> {
        let result = match transition(&self.state, &self.context, event) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(
                    session_id = %self.context.session_id,
                    step = self.state.step.as_str(),
                    error = %e,
                    "Transition rejected"
                );
                self.publish(SessionEvent::Error {
                    message: e.to_string(),
                });
                return None;
            }
        };

        self.state = result.new_state;
        self.awaiting_tx.send_replace(self.state.is_awaiting_service());

        let mut request = None;
        for effect in result.effects {
            if let Some(generated) = self.execute_effect(effect) {
                request = Some(generated);
            }
        }
        request
    }

    /// Execute an effect, handing service calls back to the caller
    fn execute_effect(&mut self, effect: Effect) -> Option<ServiceRequest> {
        match effect {
            Effect::AppendMessage {
                origin,
                text,
                delay,
            } => {
                if let Some(message) = self.transcript.commit(text, origin, delay, Utc::now()) {
                    self.publish_message(&message);
                }
                None
            }

            Effect::RequestInterpretation {
                order_text,
                profile,
            } => Some(ServiceRequest::Interpret(InterpretRequest {
                order_text,
                profile,
                catalog: self.context.catalog.clone(),
            })),

            Effect::RequestConfirmation { order_id, decision } => {
                Some(ServiceRequest::Confirm { order_id, decision })
            }

            Effect::NotifyStateChange => {
                tracing::info!(
                    session_id = %self.context.session_id,
                    step = self.state.step.as_str(),
                    awaiting_service = self.state.is_awaiting_service(),
                    "Session state changed"
                );
                if self.state.step.is_terminal() {
                    tracing::info!(
                        session_id = %self.context.session_id,
                        order_id = ?self.state.confirmed_order.as_ref().and_then(|o| o.external_order_id.as_deref()),
                        "Order complete"
                    );
                }
                let state = serde_json::to_value(&self.state).unwrap_or(Value::Null);
                self.publish(SessionEvent::StateChange { state });
                None
            }
        }
    }

    fn publish_message(&self, message: &Message) {
        self.publish(SessionEvent::Message {
            message: message.clone(),
        });
    }

    fn publish(&self, event: SessionEvent) {
        if let Some(tx) = &self.broadcast_tx {
            // No subscribers is fine
            let _ = tx.send(event);
        }
    }
}

impl<I, C> ConversationEngine<I, C>
where
    I: OrderInterpreter + Clone + 'static,
    C: OrderConfirmer + Clone + 'static,
{
    /// Detached future for `request`, safe to spawn onto another task
    pub fn service_call(
        &self,
        request: ServiceRequest,
    ) -> impl Future<Output = Event> + Send + 'static {
        let interpreter = self.interpreter.clone();
        let confirmer = self.confirmer.clone();
        let session_id = self.context.session_id.clone();
        async move { perform_request(&interpreter, &confirmer, &session_id, request).await }
    }
}

/// Run one service call and turn its outcome into the event that resolves it
async fn perform_request<I, C>(
    interpreter: &I,
    confirmer: &C,
    session_id: &str,
    request: ServiceRequest,
) -> Event
where
    I: OrderInterpreter,
    C: OrderConfirmer,
{
    match request {
        ServiceRequest::Interpret(request) => {
            let interpretation = match interpreter.interpret(&request).await {
                Ok(interpretation) => interpretation,
                Err(e) => {
                    tracing::warn!(
                        session_id,
                        kind = e.kind.as_str(),
                        error = %e,
                        "Interpretation failed, treating as rejection"
                    );
                    Interpretation::rejected(SERVICE_FAILURE)
                }
            };
            Event::InterpretationComplete { interpretation }
        }

        ServiceRequest::Confirm { order_id, decision } => {
            // Outcome never blocks the conversation
            if let Err(e) = confirmer.confirm(&order_id, decision).await {
                tracing::warn!(
                    session_id,
                    order_id = %order_id,
                    decision = decision.as_str(),
                    error = %e,
                    "Confirmation not acknowledged"
                );
            }
            Event::ConfirmationComplete { decision }
        }
    }
}
