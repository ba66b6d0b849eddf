//! Request types for the order service

use crate::menu::{to_major_units, MenuCatalog, MenuItem};
use crate::state_machine::{ConfirmDecision, CustomerProfile};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Interpretation request in domain terms
#[derive(Debug, Clone)]
pub struct InterpretRequest {
    pub order_text: String,
    pub profile: CustomerProfile,
    pub catalog: Arc<MenuCatalog>,
}

/// Wire body for the interpret call
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterpretBody<'a> {
    pub order_text: &'a str,
    pub customer_details: &'a CustomerProfile,
    pub menu_items: Vec<WireMenuItem<'a>>,
}

impl<'a> InterpretBody<'a> {
    pub fn from_request(request: &'a InterpretRequest) -> Self {
        Self {
            order_text: &request.order_text,
            customer_details: &request.profile,
            menu_items: request.catalog.items().iter().map(WireMenuItem::from).collect(),
        }
    }
}

/// Menu item as the service expects it: price in rupees
#[derive(Debug, Serialize)]
pub struct WireMenuItem<'a> {
    pub name: &'a str,
    pub price: Value,
    pub emoji: &'a str,
}

impl<'a> From<&'a MenuItem> for WireMenuItem<'a> {
    fn from(item: &'a MenuItem) -> Self {
        // Whole rupees go out as integers
        let price = if item.unit_price % 100 == 0 {
            Value::from(item.unit_price / 100)
        } else {
            Value::from(to_major_units(item.unit_price))
        };
        Self {
            name: &item.name,
            price,
            emoji: &item.glyph,
        }
    }
}

/// Wire body for the confirm call
#[derive(Debug, Serialize)]
pub struct ConfirmBody<'a> {
    pub order_id: &'a str,
    pub confirm: &'static str,
}

impl<'a> ConfirmBody<'a> {
    pub fn new(order_id: &'a str, decision: ConfirmDecision) -> Self {
        Self {
            order_id,
            confirm: decision.as_str(),
        }
    }
}
