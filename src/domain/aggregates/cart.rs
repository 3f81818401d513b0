//! Cart Aggregate

use chrono::{DateTime, Utc};
use serde::Serialize;
use crate::domain::value_objects::Money;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CartLine {
    pub id: i64,
    pub session_id: String,
    pub product_id: i64,
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
}

/// A cart line joined with the product columns a cart screen shows.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CartEntry {
    pub line: CartLine,
    pub product_name: String,
    pub price: Money,
    pub image_ref: Option<String>,
    pub description: String,
}

impl CartEntry {
    pub fn line_total(&self) -> Money { self.price.times(self.line.quantity) }
}

/// Cart contents plus the aggregates shown next to them.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CartSummary {
    pub entries: Vec<CartEntry>,
    pub item_count: i64,
    pub total_quantity: i64,
    /// `None` when the cart is empty.
    pub total_price: Option<Money>,
}

impl CartSummary {
    pub fn from_entries(entries: Vec<CartEntry>) -> Self {
        let item_count = entries.len() as i64;
        let total_quantity = entries.iter().map(|e| e.line.quantity).sum();
        let total_price = if entries.is_empty() { None } else { Some(entries.iter().map(CartEntry::line_total).sum()) };
        Self { entries, item_count, total_quantity, total_price }
    }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}
