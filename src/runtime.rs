//! Runtime for live sessions
//!
//! Each session runs in its own task that owns a `ConversationEngine`. The
//! manager only keeps handles: a command sender, the event broadcast and a
//! watch on the awaiting-service flag.
//!
//! Order service calls run on a spawned task, so the session keeps answering
//! snapshots and revealing messages while a call is outstanding. A session
//! with no commands for the idle timeout stops and is dropped from the map.

mod engine;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use engine::{ConversationEngine, ServiceRequest};
pub use traits::*;

use crate::menu::MenuCatalog;
use crate::order_service::{HttpOrderService, LoggingService};
use crate::state_machine::{
    CustomerProfile, Event, PendingOrder, RevealTiming, SessionContext, Step,
};
use crate::transcript::Message;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot, watch, RwLock};

/// Type alias for the production manager with the HTTP order service
pub type ProductionManager =
    SessionManager<LoggingService<HttpOrderService>, LoggingService<HttpOrderService>>;

/// Point-in-time view of a session
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub step: Step,
    pub profile: CustomerProfile,
    pub pending_order: Option<PendingOrder>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmed_order: Option<PendingOrder>,
    pub awaiting_service: bool,
    pub transcript: Vec<Message>,
}

/// Events sent to stream subscribers
#[derive(Debug, Clone)]
pub enum SessionEvent {
    Init { snapshot: SessionSnapshot },
    Message { message: Message },
    StateChange { state: serde_json::Value },
    Error { message: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Session not found: {0}")]
    NotFound(String),
    #[error("Session is waiting on the order service")]
    Busy,
    #[error("Session task has stopped")]
    Closed,
}

enum SessionCommand {
    Submit {
        text: String,
        reply: oneshot::Sender<Result<SessionSnapshot, SessionError>>,
    },
    Snapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
}

/// Handle to interact with a running session
#[derive(Clone)]
pub struct SessionHandle {
    session_id: String,
    command_tx: mpsc::Sender<SessionCommand>,
    broadcast_tx: broadcast::Sender<SessionEvent>,
    awaiting_rx: watch::Receiver<bool>,
}

impl SessionHandle {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn is_awaiting_service(&self) -> bool {
        *self.awaiting_rx.borrow()
    }

    /// Submit customer text, returning the snapshot once the step has settled.
    ///
    /// The session task decides `Busy`, so of two racing submits exactly one
    /// reaches the order service.
    pub async fn submit(&self, text: impl Into<String>) -> Result<SessionSnapshot, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.command_tx
            .send(SessionCommand::Submit {
                text: text.into(),
                reply,
            })
            .await
            .map_err(|_| SessionError::Closed)?;
        rx.await.map_err(|_| SessionError::Closed)?
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.command_tx
            .send(SessionCommand::Snapshot { reply })
            .await
            .map_err(|_| SessionError::Closed)?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.broadcast_tx.subscribe()
    }
}

/// Manager for all live sessions
pub struct SessionManager<I, C>
where
    I: OrderInterpreter + 'static,
    C: OrderConfirmer + 'static,
{
    interpreter: Arc<I>,
    confirmer: Arc<C>,
    catalog: Arc<MenuCatalog>,
    timing: RevealTiming,
    idle_timeout: Duration,
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

/// Default time a session may sit without commands before it stops
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

impl<I, C> SessionManager<I, C>
where
    I: OrderInterpreter + 'static,
    C: OrderConfirmer + 'static,
{
    pub fn new(
        interpreter: Arc<I>,
        confirmer: Arc<C>,
        catalog: Arc<MenuCatalog>,
        timing: RevealTiming,
    ) -> Self {
        Self {
            interpreter,
            confirmer,
            catalog,
            timing,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Stop sessions that receive no commands for `idle_timeout`
    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    pub fn catalog(&self) -> &Arc<MenuCatalog> {
        &self.catalog
    }

    /// Start a new session and return its handle
    pub async fn create(&self) -> SessionHandle {
        let session_id = uuid::Uuid::new_v4().to_string();
        let context = SessionContext::new(&session_id, self.catalog.clone(), self.timing);

        let (command_tx, command_rx) = mpsc::channel(32);
        let (broadcast_tx, _) = broadcast::channel(128);

        let engine = ConversationEngine::new(
            context,
            Arc::clone(&self.interpreter),
            Arc::clone(&self.confirmer),
        )
        .with_broadcast(broadcast_tx.clone());

        let handle = SessionHandle {
            session_id: session_id.clone(),
            command_tx,
            broadcast_tx,
            awaiting_rx: engine.subscribe_awaiting(),
        };

        {
            let mut sessions = self.sessions.write().await;
            sessions.retain(|_, h| !h.command_tx.is_closed());
            sessions.insert(session_id.clone(), handle.clone());
        }

        tokio::spawn(run_session(engine, command_rx, self.idle_timeout));
        tracing::info!(session_id = %session_id, "Session created");

        handle
    }

    pub async fn get(&self, session_id: &str) -> Result<SessionHandle, SessionError> {
        let handle = self.sessions.read().await.get(session_id).cloned();
        match handle {
            Some(handle) if !handle.command_tx.is_closed() => Ok(handle),
            Some(_) => {
                self.sessions.write().await.remove(session_id);
                tracing::debug!(session_id, "Removed stopped session");
                Err(SessionError::NotFound(session_id.to_string()))
            }
            None => Err(SessionError::NotFound(session_id.to_string())),
        }
    }

    /// Number of sessions whose task is still running
    #[allow(dead_code)] // Used in tests
    pub async fn session_count(&self) -> usize {
        self.sessions
            .read()
            .await
            .values()
            .filter(|h| !h.command_tx.is_closed())
            .count()
    }
}

/// Session task: apply commands in order, run service calls off-loop and
/// reveal messages when due
async fn run_session<I, C>(
    mut engine: ConversationEngine<Arc<I>, Arc<C>>,
    mut command_rx: mpsc::Receiver<SessionCommand>,
    idle_timeout: Duration,
) where
    I: OrderInterpreter + 'static,
    C: OrderConfirmer + 'static,
{
    engine.start();

    // At most one call is in flight; its submitter waits in `pending_reply`
    let (done_tx, mut done_rx) = mpsc::channel::<Event>(1);
    let mut pending_reply: Option<oneshot::Sender<Result<SessionSnapshot, SessionError>>> = None;
    let mut idle_deadline = tokio::time::Instant::now() + idle_timeout;

    loop {
        let next_reveal = engine.next_reveal_at();
        tokio::select! {
            command = command_rx.recv() => {
                let Some(command) = command else { break };
                idle_deadline = tokio::time::Instant::now() + idle_timeout;
                match command {
                    SessionCommand::Submit { text, reply } => {
                        match engine.accept_input(text) {
                            Err(e) => {
                                let _ = reply.send(Err(e));
                            }
                            Ok(Some(request)) => {
                                spawn_call(&engine, request, &done_tx);
                                pending_reply = Some(reply);
                            }
                            Ok(None) => {
                                engine.reveal_due(Utc::now());
                                let _ = reply.send(Ok(engine.snapshot()));
                            }
                        }
                    }
                    SessionCommand::Snapshot { reply } => {
                        engine.reveal_due(Utc::now());
                        let _ = reply.send(engine.snapshot());
                    }
                }
            }
            Some(event) = done_rx.recv() => {
                idle_deadline = tokio::time::Instant::now() + idle_timeout;
                if let Some(request) = engine.complete_service_call(event) {
                    spawn_call(&engine, request, &done_tx);
                } else {
                    engine.reveal_due(Utc::now());
                    if let Some(reply) = pending_reply.take() {
                        let _ = reply.send(Ok(engine.snapshot()));
                    }
                }
            }
            () = sleep_until(next_reveal) => {
                engine.reveal_due(Utc::now());
            }
            () = tokio::time::sleep_until(idle_deadline), if !engine.is_awaiting_service() => {
                tracing::info!(
                    session_id = %engine.session_id(),
                    idle_secs = idle_timeout.as_secs(),
                    "Session idle, stopping"
                );
                break;
            }
        }
    }

    tracing::info!(session_id = %engine.session_id(), "Session task finished");
}

fn spawn_call<I, C>(
    engine: &ConversationEngine<Arc<I>, Arc<C>>,
    request: ServiceRequest,
    done_tx: &mpsc::Sender<Event>,
) where
    I: OrderInterpreter + 'static,
    C: OrderConfirmer + 'static,
{
    let call = engine.service_call(request);
    let done_tx = done_tx.clone();
    tokio::spawn(async move {
        // The session may have stopped meanwhile
        let _ = done_tx.send(call.await).await;
    });
}

async fn sleep_until(at: Option<DateTime<Utc>>) {
    match at {
        Some(at) => {
            let wait = (at - Utc::now()).to_std().unwrap_or(Duration::ZERO);
            tokio::time::sleep(wait).await;
        }
        None => std::future::pending().await,
    }
}
