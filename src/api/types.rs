//! API request and response types

use crate::menu::{format_price, MenuItem};
use serde::{Deserialize, Serialize};

/// Request to submit customer text
#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub text: String,
}

/// Response listing the menu
#[derive(Debug, Serialize)]
pub struct MenuResponse {
    pub items: Vec<MenuItemResponse>,
}

/// A menu item with its price ready for display
#[derive(Debug, Serialize)]
pub struct MenuItemResponse {
    pub name: String,
    /// Price in paise
    pub unit_price: u64,
    pub display_price: String,
    pub glyph: String,
}

impl From<&MenuItem> for MenuItemResponse {
    fn from(item: &MenuItem) -> Self {
        Self {
            name: item.name.clone(),
            unit_price: item.unit_price,
            display_price: format_price(item.unit_price),
            glyph: item.glyph.clone(),
        }
    }
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
