//! Storefront Core
//!
//! Catalog, per-session carts, transactional checkout and a contact inbox on
//! top of an embedded SQLite database.
//!
//! ## Features
//! - Product catalog with category/text filters and paging
//! - Session-scoped shopping carts
//! - All-or-nothing checkout that never oversells stock
//! - Order history and status tracking
//! - Contact form inbox
//! - Live views that re-emit when the underlying tables change
//!
//! ```no_run
//! use storefront_core::{CartSession, CustomerDetails, StoreConfig, Storefront};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let shop = Storefront::open(StoreConfig::from_env()?).await?;
//! let session = CartSession::default();
//! shop.add_to_cart(&session, 1, 2).await?;
//! let order = shop.checkout(&session, CustomerDetails::new("Ana Maria", "ana@example.com", None)).await?;
//! println!("placed {}", order.order_number);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod live;
pub mod service;
pub mod telemetry;
pub mod validation;

pub use config::StoreConfig;
pub use db::Database;
pub use domain::aggregates::{
    CartEntry, CartLine, CartSummary, Contact, NewContact, NewOrder, NewOrderLine, NewProduct, Order, OrderLine,
    OrderLineWithProduct, OrderStatus, Product, ProductFilter,
};
pub use domain::events::StoreEvent;
pub use domain::value_objects::{CartSession, Money, OrderNumber, Page, PageRequest};
pub use error::{CartError, CheckoutError, ContactError, StoreError, StoreResult, ValidationError};
pub use live::LiveStream;
pub use service::Storefront;
pub use validation::{ContactForm, CustomerDetails};
