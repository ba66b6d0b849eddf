//! Conversation state types

use crate::menu::{MenuCatalog, MenuItem};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Step
// ============================================================================

/// Stage of the guided conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    #[default]
    Greeting,
    CollectingName,
    CollectingEmail,
    CollectingAddress,
    /// Menu shown, waiting for a free-text order
    AwaitingOrderText,
    AwaitingOrderConfirmation,
    /// Terminal: absorbs all further input
    Complete,
}

impl Step {
    pub fn is_terminal(self) -> bool {
        matches!(self, Step::Complete)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Step::Greeting => "greeting",
            Step::CollectingName => "collecting_name",
            Step::CollectingEmail => "collecting_email",
            Step::CollectingAddress => "collecting_address",
            Step::AwaitingOrderText => "awaiting_order_text",
            Step::AwaitingOrderConfirmation => "awaiting_order_confirmation",
            Step::Complete => "complete",
        }
    }
}

// ============================================================================
// Customer profile
// ============================================================================

/// Details gathered from the customer, filled in step order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CustomerProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Never collected by the flow; carried for the order service
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl CustomerProfile {
    /// Whether the fields present match what `step` requires
    #[allow(dead_code)] // Used in tests
    pub fn is_consistent_with(&self, step: Step) -> bool {
        let has = [
            self.name.is_some(),
            self.email.is_some(),
            self.address.is_some(),
        ];
        let required = match step {
            Step::Greeting | Step::CollectingName => 0,
            Step::CollectingEmail => 1,
            Step::CollectingAddress => 2,
            Step::AwaitingOrderText | Step::AwaitingOrderConfirmation | Step::Complete => 3,
        };
        has.iter().enumerate().all(|(i, present)| *present == (i < required))
    }
}

// ============================================================================
// Orders
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    pub unit_price: u64,
    pub quantity: u32,
    pub line_subtotal: u64,
}

impl LineItem {
    pub fn new(item: &MenuItem, quantity: u32) -> Self {
        Self {
            name: item.name.clone(),
            unit_price: item.unit_price,
            quantity,
            line_subtotal: item.unit_price * u64::from(quantity),
        }
    }
}

/// An interpreted order waiting for the customer's decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingOrder {
    pub line_items: Vec<LineItem>,
    pub total: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_order_id: Option<String>,
}

impl PendingOrder {
    pub fn new(line_items: Vec<LineItem>, external_order_id: Option<String>) -> Self {
        let total = line_items.iter().map(|l| l.line_subtotal).sum();
        Self {
            line_items,
            total,
            external_order_id,
        }
    }
}

/// Normalized result of interpreting a free-text order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interpretation {
    Accepted(PendingOrder),
    Rejected { reason: String },
}

impl Interpretation {
    pub fn rejected(reason: impl Into<String>) -> Self {
        Interpretation::Rejected {
            reason: reason.into(),
        }
    }
}

// ============================================================================
// In-flight service calls
// ============================================================================

/// Customer's answer to the confirmation prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmDecision {
    Yes,
    No,
}

impl ConfirmDecision {
    pub fn as_str(self) -> &'static str {
        match self {
            ConfirmDecision::Yes => "yes",
            ConfirmDecision::No => "no",
        }
    }
}

/// The one outstanding service request a session may have
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServiceCall {
    Interpreting,
    Confirming { decision: ConfirmDecision },
}

// ============================================================================
// Conversation State
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ConvState {
    pub step: Step,
    pub profile: CustomerProfile,
    /// Present only while awaiting the customer's confirmation
    pub pending_order: Option<PendingOrder>,
    /// The order accepted on reaching `Complete`
    pub confirmed_order: Option<PendingOrder>,
    pub in_flight: Option<ServiceCall>,
}

impl ConvState {
    pub fn is_awaiting_service(&self) -> bool {
        self.in_flight.is_some()
    }
}

// ============================================================================
// Context
// ============================================================================

/// Simulated composition delays for assistant messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealTiming {
    pub standard: Duration,
    pub short: Duration,
}

impl Default for RevealTiming {
    fn default() -> Self {
        Self {
            standard: Duration::from_millis(1000),
            short: Duration::from_millis(500),
        }
    }
}

impl RevealTiming {
    /// No delays at all, used where reveal timing is irrelevant
    #[allow(dead_code)] // Used in tests
    pub fn instant() -> Self {
        Self {
            standard: Duration::ZERO,
            short: Duration::ZERO,
        }
    }
}

/// Context for a session (immutable configuration)
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub session_id: String,
    pub catalog: Arc<MenuCatalog>,
    pub timing: RevealTiming,
}

impl SessionContext {
    pub fn new(session_id: impl Into<String>, catalog: Arc<MenuCatalog>, timing: RevealTiming) -> Self {
        Self {
            session_id: session_id.into(),
            catalog,
            timing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_consistency() {
        let mut profile = CustomerProfile::default();
        assert!(profile.is_consistent_with(Step::CollectingName));
        assert!(!profile.is_consistent_with(Step::CollectingEmail));

        profile.name = Some("Jordan".to_string());
        assert!(profile.is_consistent_with(Step::CollectingEmail));
        assert!(!profile.is_consistent_with(Step::CollectingName));

        profile.email = Some("j@example.com".to_string());
        profile.address = Some("221B Baker Street".to_string());
        assert!(profile.is_consistent_with(Step::AwaitingOrderText));
        assert!(profile.is_consistent_with(Step::Complete));
    }

    #[test]
    fn test_pending_order_totals() {
        let catalog = MenuCatalog::default();
        let cake = catalog.find_by_name("Chocolate Cake").unwrap();
        let tart = catalog.find_by_name("Mango Tart").unwrap();
        let order = PendingOrder::new(vec![LineItem::new(cake, 2), LineItem::new(tart, 1)], None);
        assert_eq!(order.line_items[0].line_subtotal, 70_000);
        assert_eq!(order.total, 98_000);
    }

    #[test]
    fn test_state_serializes_snake_case() {
        let state = ConvState {
            step: Step::AwaitingOrderConfirmation,
            in_flight: Some(ServiceCall::Confirming {
                decision: ConfirmDecision::Yes,
            }),
            ..ConvState::default()
        };
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["step"], "awaiting_order_confirmation");
        assert_eq!(json["in_flight"]["type"], "confirming");
        assert_eq!(json["in_flight"]["decision"], "yes");
    }
}
