//! Use cases
//!
//! The commands the presentation layer issues, plus the live views it renders.
//! Stores handle single-table work; anything that needs input checks, several
//! tables or rollback lives here.

mod cart;
mod checkout;
mod contact;

use crate::config::StoreConfig;
use crate::db::Database;
use crate::domain::aggregates::{CartSummary, Contact, Order, Product, ProductFilter};
use crate::domain::value_objects::{CartSession, Page, PageRequest};
use crate::live::LiveStream;

/// Entry point for a storefront: one per process, cheap to clone.
#[derive(Clone)]
pub struct Storefront {
    db: Database,
    config: StoreConfig,
}

impl Storefront {
    pub fn new(db: Database, config: StoreConfig) -> Self { Self { db, config } }

    /// Connects using `config` and runs migrations.
    pub async fn open(config: StoreConfig) -> crate::error::StoreResult<Self> {
        let db = Database::connect(&config).await?;
        Ok(Self::new(db, config))
    }

    pub fn database(&self) -> &Database { &self.db }
    pub fn config(&self) -> &StoreConfig { &self.config }

    pub fn watch_cart(&self, session: &CartSession) -> LiveStream<CartSummary> {
        self.db.cart(session).watch()
    }

    /// Active products matching `filter`, one page at a time. `page` is 1-based;
    /// the page size comes from config.
    pub fn watch_products(&self, filter: ProductFilter, page: u32) -> LiveStream<Page<Product>> {
        self.db.products().watch_active(filter, PageRequest::new(page, self.config.page_size))
    }

    pub fn watch_orders(&self) -> LiveStream<Vec<Order>> { self.db.orders().watch_all() }

    pub fn watch_contacts(&self) -> LiveStream<Vec<Contact>> { self.db.contacts().watch_all() }
}
