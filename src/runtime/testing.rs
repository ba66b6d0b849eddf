//! Mock implementations for testing
//!
//! These mocks enable engine and session tests without a real order service.

use super::traits::{OrderConfirmer, OrderInterpreter};
use crate::order_service::{InterpretRequest, ServiceError};
use crate::state_machine::{ConfirmDecision, Interpretation, LineItem, PendingOrder};
use crate::menu::MenuCatalog;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

// ============================================================================
// Mock Interpreter
// ============================================================================

/// Interpreter that returns queued results and records every request
#[derive(Default)]
pub struct MockInterpreter {
    responses: Mutex<VecDeque<Result<Interpretation, ServiceError>>>,
    pub requests: Mutex<Vec<InterpretRequest>>,
}

#[allow(dead_code)]
impl MockInterpreter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue(&self, result: Result<Interpretation, ServiceError>) {
        self.responses.lock().unwrap().push_back(result);
    }

    /// Queue an accepted order of `quantity` x `item`
    pub fn queue_accept(&self, item: &str, quantity: u32, order_id: Option<&str>) {
        let catalog = MenuCatalog::default();
        let menu_item = catalog.find_by_name(item).unwrap();
        let order = PendingOrder::new(
            vec![LineItem::new(menu_item, quantity)],
            order_id.map(String::from),
        );
        self.queue(Ok(Interpretation::Accepted(order)));
    }

    pub fn queue_reject(&self, reason: &str) {
        self.queue(Ok(Interpretation::rejected(reason)));
    }

    pub fn queue_error(&self, error: ServiceError) {
        self.queue(Err(error));
    }

    pub fn recorded_requests(&self) -> Vec<InterpretRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl OrderInterpreter for MockInterpreter {
    async fn interpret(&self, request: &InterpretRequest) -> Result<Interpretation, ServiceError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ServiceError::network("No mock response queued")))
    }
}

// ============================================================================
// Mock Confirmer
// ============================================================================

/// Confirmer that succeeds unless told to fail, recording every call
#[derive(Default)]
pub struct MockConfirmer {
    failures: Mutex<VecDeque<ServiceError>>,
    pub calls: Mutex<Vec<(String, ConfirmDecision)>>,
}

#[allow(dead_code)]
impl MockConfirmer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next call fail
    pub fn fail_next(&self, error: ServiceError) {
        self.failures.lock().unwrap().push_back(error);
    }

    pub fn recorded_calls(&self) -> Vec<(String, ConfirmDecision)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl OrderConfirmer for MockConfirmer {
    async fn confirm(&self, order_id: &str, decision: ConfirmDecision) -> Result<(), ServiceError> {
        self.calls
            .lock()
            .unwrap()
            .push((order_id.to_string(), decision));
        match self.failures.lock().unwrap().pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

// ============================================================================
// Gated Interpreter (for observing in-flight state)
// ============================================================================

/// Interpreter that blocks until released, for observing in-flight state
pub struct GatedInterpreter {
    inner: MockInterpreter,
    /// Notified when a request starts
    pub request_started: Arc<Notify>,
    /// Notify to let the pending request finish
    pub release: Arc<Notify>,
}

impl GatedInterpreter {
    pub fn new(inner: MockInterpreter) -> Self {
        Self {
            inner,
            request_started: Arc::new(Notify::new()),
            release: Arc::new(Notify::new()),
        }
    }
}

#[async_trait]
impl OrderInterpreter for GatedInterpreter {
    async fn interpret(&self, request: &InterpretRequest) -> Result<Interpretation, ServiceError> {
        self.request_started.notify_one();
        self.release.notified().await;
        self.inner.interpret(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_machine::CustomerProfile;

    fn request() -> InterpretRequest {
        InterpretRequest {
            order_text: "cake".to_string(),
            profile: CustomerProfile::default(),
            catalog: Arc::new(MenuCatalog::default()),
        }
    }

    #[tokio::test]
    async fn test_mock_interpreter() {
        let mock = MockInterpreter::new();
        mock.queue_reject("Item not found");

        let result = mock.interpret(&request()).await.unwrap();
        assert_eq!(result, Interpretation::rejected("Item not found"));

        // Second call should fail (no more responses)
        assert!(mock.interpret(&request()).await.is_err());
        assert_eq!(mock.recorded_requests().len(), 2);
    }

    #[tokio::test]
    async fn test_mock_confirmer() {
        let mock = MockConfirmer::new();
        mock.fail_next(ServiceError::timeout("slow"));

        assert!(mock.confirm("a", ConfirmDecision::Yes).await.is_err());
        assert!(mock.confirm("b", ConfirmDecision::No).await.is_ok());
        assert_eq!(
            mock.recorded_calls(),
            vec![
                ("a".to_string(), ConfirmDecision::Yes),
                ("b".to_string(), ConfirmDecision::No)
            ]
        );
    }
}
