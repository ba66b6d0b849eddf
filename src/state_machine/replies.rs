//! Assistant reply text

use crate::menu::{format_price, MenuCatalog};
use crate::state_machine::state::PendingOrder;
use std::fmt::Write;

pub const GREETING: &str = "Hi 👋 I'm Orderly, your smart order assistant. I'll help you place your order quickly and correctly. Can I have your name, please?";
pub const INVALID_EMAIL: &str = "Please provide a valid email address.";
pub const ASK_ADDRESS: &str = "Thanks! What's your delivery address?";
pub const ORDER_INSTRUCTIONS: &str = "What would you like to order today?\n\nYou can order by telling me something like: \"2 chocolate cakes and 1 mango tart\"";
pub const CONFIRM_PROMPT: &str =
    "Would you like to confirm this order? (Reply \"yes\" to confirm or \"no\" to change it)";
pub const CONFIRM_REPROMPT: &str =
    "Sorry, I didn't catch that. Please reply \"yes\" to confirm your order or \"no\" to change it.";
pub const ORDER_INSTEAD: &str = "No problem! What would you like to order instead?";
pub const ALREADY_COMPLETE: &str = "Your order is already confirmed! If you need to place another order, please start a new conversation.";

/// Rejection text when the service gave no reason of its own
pub const NOT_UNDERSTOOD: &str = "Sorry, I couldn't understand your order.";
/// Rejection text for transport failures and unrecognized responses
pub const SERVICE_FAILURE: &str =
    "Sorry, there was an error processing your order. Please try again.";

pub fn name_ack(name: &str) -> String {
    format!("Great {name}! Could you share your email so I can send your confirmation?")
}

pub fn menu_intro(catalog: &MenuCatalog) -> String {
    format!("Perfect! Here's today's menu:\n\n{}", catalog.render())
}

pub fn menu_retry(catalog: &MenuCatalog) -> String {
    format!(
        "Here are our available items:\n\n{}\n\nPlease try ordering again.",
        catalog.render()
    )
}

pub fn order_summary(order: &PendingOrder) -> String {
    let mut out = String::from("Perfect 🎉 Your order is:");
    for line in &order.line_items {
        let _ = write!(
            out,
            "\n{} × {} — {}",
            line.quantity,
            line.name,
            format_price(line.line_subtotal)
        );
    }
    let _ = write!(out, "\nTotal: {}", format_price(order.total));
    if let Some(order_id) = &order.external_order_id {
        let _ = write!(out, "\nOrder ID: {order_id}");
    }
    out.push_str("\nThank you for choosing us!");
    out
}

pub fn order_confirmed(email: Option<&str>) -> String {
    let email = email.unwrap_or("your email address");
    format!(
        "Wonderful! 🎉 Your order has been confirmed. You'll receive an email at {email} shortly with the details. Thank you for choosing us! 🙌"
    )
}
