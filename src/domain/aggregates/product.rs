//! Product Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::domain::value_objects::Money;

pub const DEFAULT_CATEGORY: &str = "General";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub image_ref: Option<String>,
    pub stock: i64,
    pub category: String,
    /// Soft-delete marker. Inactive products are hidden from browsing.
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Product {
    pub fn is_in_stock(&self) -> bool { self.stock > 0 }
    pub fn can_supply(&self, quantity: i64) -> bool { self.stock >= quantity }
}

/// Catalog entry that has not been stored yet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Money,
    pub image_ref: Option<String>,
    pub stock: i64,
    pub category: String,
    pub active: bool,
}

impl NewProduct {
    pub fn new(name: impl Into<String>, price: Money) -> Self {
        Self {
            name: name.into(), description: String::new(), price, image_ref: None,
            stock: 0, category: DEFAULT_CATEGORY.to_string(), active: true,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self { self.description = description.into(); self }
    pub fn stock(mut self, stock: i64) -> Self { self.stock = stock; self }
    pub fn category(mut self, category: impl Into<String>) -> Self { self.category = category.into(); self }
    pub fn image_ref(mut self, image_ref: impl Into<String>) -> Self { self.image_ref = Some(image_ref.into()); self }
    pub fn inactive(mut self) -> Self { self.active = false; self }
}

/// Browse filter. Blank values mean "no filter".
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ProductFilter {
    pub category: Option<String>,
    pub query: Option<String>,
}

impl ProductFilter {
    pub fn category(category: impl Into<String>) -> Self { Self { category: Some(category.into()), query: None } }
    pub fn search(query: impl Into<String>) -> Self { Self { category: None, query: Some(query.into()) } }

    pub fn with_category(mut self, category: impl Into<String>) -> Self { self.category = Some(category.into()); self }

    /// Trims the text query and drops blank fields.
    pub fn sanitized(&self) -> ProductFilter {
        let query = self.query.as_deref().map(str::trim).filter(|q| !q.is_empty()).map(str::to_string);
        let category = self.category.as_deref().filter(|c| !c.trim().is_empty()).map(str::to_string);
        ProductFilter { category, query }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_new_product_defaults() {
        let p = NewProduct::new("Cable", Money::new(Decimal::new(500, 2)).unwrap());
        assert_eq!(p.category, DEFAULT_CATEGORY);
        assert!(p.active);
        assert_eq!(p.stock, 0);
        assert!(!p.stock(3).inactive().active);
    }

    #[test]
    fn test_filter_sanitized() {
        let f = ProductFilter { category: Some("  ".into()), query: Some("  mouse ".into()) }.sanitized();
        assert_eq!(f.category, None);
        assert_eq!(f.query.as_deref(), Some("mouse"));
        assert_eq!(ProductFilter::search("   ").sanitized(), ProductFilter::default());
    }
}
