//! Static menu catalog
//!
//! The catalog is built once at startup and shared read-only between
//! sessions. Prices are held in minor currency units (paise).

use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Minor units per rupee
const MINOR_PER_MAJOR: u64 = 100;

/// A single orderable item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub name: String,
    /// Unit price in paise, always positive
    pub unit_price: u64,
    pub glyph: String,
}

impl MenuItem {
    pub fn new(name: impl Into<String>, unit_price: u64, glyph: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unit_price,
            glyph: glyph.into(),
        }
    }
}

/// Ordered, immutable list of menu items
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuCatalog {
    items: Vec<MenuItem>,
}

impl MenuCatalog {
    /// Build a catalog. Items with a zero price or a name already present are
    /// dropped so the name stays a unique key.
    pub fn new(items: impl IntoIterator<Item = MenuItem>) -> Self {
        let mut kept: Vec<MenuItem> = Vec::new();
        for item in items {
            if item.unit_price == 0 {
                tracing::warn!(item = %item.name, "Skipping menu item with zero price");
                continue;
            }
            if kept.iter().any(|k| k.name == item.name) {
                tracing::warn!(item = %item.name, "Skipping duplicate menu item");
                continue;
            }
            kept.push(item);
        }
        Self { items: kept }
    }

    pub fn items(&self) -> &[MenuItem] {
        &self.items
    }

    /// Exact lookup after trimming surrounding whitespace
    pub fn find_by_name(&self, name: &str) -> Option<&MenuItem> {
        let name = name.trim();
        self.items.iter().find(|item| item.name == name)
    }

    /// Render the menu the way the assistant presents it
    pub fn render(&self) -> String {
        self.items
            .iter()
            .map(|item| {
                format!(
                    "{} {} — {}",
                    item.glyph,
                    item.name,
                    format_price(item.unit_price)
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

impl Default for MenuCatalog {
    fn default() -> Self {
        Self::new([
            MenuItem::new("Chocolate Cake", 35_000, "🍫"),
            MenuItem::new("Blueberry Cheesecake", 42_000, "🫐"),
            MenuItem::new("Mango Tart", 28_000, "🥭"),
            MenuItem::new("Red Velvet Cake", 40_000, "❤️🎂"),
            MenuItem::new("Carrot Cake", 30_000, "🥕🍰"),
            MenuItem::new("Coffee & Walnut Cake", 38_000, "☕️🌰"),
            MenuItem::new("Strawberry Cheesecake", 42_000, "🍓🍰"),
            MenuItem::new("Chocolate Tart", 26_000, "🍫🍮"),
            MenuItem::new("Fruit Tart", 35_000, "🍑🥝🍓"),
        ])
    }
}

/// Format an amount of paise as rupees, dropping a zero fractional part
pub fn format_price(minor_units: u64) -> String {
    let major = minor_units / MINOR_PER_MAJOR;
    let minor = minor_units % MINOR_PER_MAJOR;
    let mut out = format!("₹{major}");
    if minor != 0 {
        let _ = write!(out, ".{minor:02}");
    }
    out
}

/// Convert paise to the major-unit figure the order service works in
#[allow(clippy::cast_precision_loss)] // menu prices are far below 2^52
pub fn to_major_units(minor_units: u64) -> f64 {
    minor_units as f64 / MINOR_PER_MAJOR as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_by_name_trims() {
        let catalog = MenuCatalog::default();
        let item = catalog.find_by_name("  Mango Tart \n").unwrap();
        assert_eq!(item.unit_price, 28_000);
        assert!(catalog.find_by_name("mango tart").is_none());
        assert!(catalog.find_by_name("Mango").is_none());
    }

    #[test]
    fn test_render_lists_every_item_in_order() {
        let catalog = MenuCatalog::default();
        let rendered = catalog.render();
        let mut last = 0;
        for item in catalog.items() {
            let pos = rendered.find(&item.name).unwrap();
            assert!(pos >= last, "{} out of order", item.name);
            last = pos;
        }
        assert!(rendered.starts_with("🍫 Chocolate Cake — ₹350"));
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(35_000), "₹350");
        assert_eq!(format_price(35_050), "₹350.50");
        assert_eq!(format_price(5), "₹0.05");
    }

    #[test]
    fn test_duplicates_and_free_items_dropped() {
        let catalog = MenuCatalog::new([
            MenuItem::new("Scone", 10_000, "🥐"),
            MenuItem::new("Scone", 12_000, "🥐"),
            MenuItem::new("Water", 0, "💧"),
        ]);
        assert_eq!(catalog.items().len(), 1);
        assert_eq!(catalog.items()[0].unit_price, 10_000);
    }
}
