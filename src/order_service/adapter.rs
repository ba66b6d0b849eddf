//! Normalizes raw interpret responses
//!
//! The service answers with an array whose first element carries either a
//! valid order (`status: "valid"`, an `items` string such as
//! `"Chocolate Cake x 2 = 700"`, `totalPrice`, `order_id`) or a rejection
//! reason under `customerMessage` or `message`. This is the only place that
//! looks at that shape.

use crate::menu::{to_major_units, MenuCatalog};
use crate::state_machine::replies::{NOT_UNDERSTOOD, SERVICE_FAILURE};
use crate::state_machine::{Interpretation, LineItem, PendingOrder};
use serde_json::{Map, Value};

/// Tolerance when comparing the service's total with ours
const TOTAL_EPSILON: f64 = 0.005;

pub fn normalize_interpretation(value: &Value, catalog: &MenuCatalog) -> Interpretation {
    let Some(first) = value
        .as_array()
        .and_then(|entries| entries.first())
        .and_then(Value::as_object)
    else {
        tracing::warn!(response = %value, "Unrecognized interpret response shape");
        return Interpretation::rejected(SERVICE_FAILURE);
    };

    if first.get("status").and_then(Value::as_str) != Some("valid") {
        return Interpretation::rejected(rejection_reason(first));
    }

    let Some(lines) = first
        .get("items")
        .and_then(Value::as_str)
        .and_then(|items| parse_line_items(items, catalog))
    else {
        tracing::info!(items = ?first.get("items"), "Valid interpretation with unusable items");
        return Interpretation::rejected(rejection_reason(first));
    };

    let order = PendingOrder::new(lines, order_id(first));

    if let Some(service_total) = first.get("totalPrice").and_then(Value::as_f64) {
        let ours = to_major_units(order.total);
        if (service_total - ours).abs() > TOTAL_EPSILON {
            tracing::debug!(
                service_total,
                catalog_total = ours,
                "Service total differs from catalog total"
            );
        }
    }

    Interpretation::Accepted(order)
}

/// Parse `"<Name> x <qty> = ..."` or `"<qty> x <Name> = ..."` segments
/// separated by newlines or `;`
fn parse_line_items(items: &str, catalog: &MenuCatalog) -> Option<Vec<LineItem>> {
    let mut lines = Vec::new();
    for segment in items
        .split(['\n', ';'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        let description = segment.split(" = ").next().unwrap_or(segment);
        let (left, right) = description.split_once(" x ")?;
        let (item, quantity) = match catalog.find_by_name(left) {
            Some(item) => (item, right),
            None => (catalog.find_by_name(right)?, left),
        };
        let quantity: u32 = quantity.trim().parse().ok().filter(|q| *q >= 1)?;
        lines.push(LineItem::new(item, quantity));
    }
    if lines.is_empty() {
        None
    } else {
        Some(lines)
    }
}

fn rejection_reason(entry: &Map<String, Value>) -> String {
    ["customerMessage", "message"]
        .iter()
        .filter_map(|key| entry.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|reason| !reason.is_empty())
        .map_or_else(|| NOT_UNDERSTOOD.to_string(), str::to_string)
}

fn order_id(entry: &Map<String, Value>) -> Option<String> {
    match entry.get("order_id")? {
        Value::String(id) if !id.trim().is_empty() => Some(id.trim().to_string()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}
