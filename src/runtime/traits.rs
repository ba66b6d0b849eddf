//! Trait abstractions for the order service boundary
//!
//! These traits enable testing the engine with mock implementations.

use crate::order_service::{InterpretRequest, ServiceError};
use crate::state_machine::{ConfirmDecision, Interpretation};
use async_trait::async_trait;
use std::sync::Arc;

/// Turns free-text orders into structured interpretations
#[async_trait]
pub trait OrderInterpreter: Send + Sync {
    /// Interpret one order. Rejections are `Ok`; `Err` means the call itself
    /// failed.
    async fn interpret(&self, request: &InterpretRequest) -> Result<Interpretation, ServiceError>;
}

/// Records the customer's yes/no decision for an interpreted order
#[async_trait]
pub trait OrderConfirmer: Send + Sync {
    async fn confirm(&self, order_id: &str, decision: ConfirmDecision) -> Result<(), ServiceError>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: OrderInterpreter + ?Sized> OrderInterpreter for Arc<T> {
    async fn interpret(&self, request: &InterpretRequest) -> Result<Interpretation, ServiceError> {
        (**self).interpret(request).await
    }
}

#[async_trait]
impl<T: OrderConfirmer + ?Sized> OrderConfirmer for Arc<T> {
    async fn confirm(&self, order_id: &str, decision: ConfirmDecision) -> Result<(), ServiceError> {
        (**self).confirm(order_id, decision).await
    }
}
