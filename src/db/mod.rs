//! Database Module
//!
//! Owns the SQLite connection pool and the change bus, and hands out the
//! per-table stores.

pub mod cart_store;
pub mod contact_store;
pub mod order_store;
pub mod product_store;
mod row;

pub use cart_store::CartStore;
pub use contact_store::ContactStore;
pub use order_store::OrderStore;
pub use product_store::ProductStore;

use crate::config::StoreConfig;
use crate::domain::events::StoreEvent;
use crate::domain::value_objects::CartSession;
use crate::error::{StoreError, StoreResult};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::str::FromStr;
use tokio::sync::broadcast;

const EVENT_CAPACITY: usize = 256;

/// Process-scoped store handle. Clones share the pool and the change bus.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
    events: broadcast::Sender<StoreEvent>,
}

impl Database {
    /// Opens (creating if missing) the database and applies pending migrations.
    pub async fn connect(config: &StoreConfig) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(&config.database_url)
            .map_err(|e| StoreError::Config(format!("Invalid database url: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(config.busy_timeout);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        tracing::info!(
            url = %config.database_url,
            busy_timeout_ms = config.busy_timeout.as_millis() as u64,
            "Database connection established"
        );

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");

        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Ok(Self { pool, events })
    }

    pub fn pool(&self) -> &SqlitePool { &self.pool }

    pub fn products(&self) -> ProductStore { ProductStore::new(self.clone()) }
    pub fn cart(&self, session: &CartSession) -> CartStore { CartStore::new(self.clone(), session.clone()) }
    pub fn orders(&self) -> OrderStore { OrderStore::new(self.clone()) }
    pub fn contacts(&self) -> ContactStore { ContactStore::new(self.clone()) }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> { self.events.subscribe() }

    /// Starts a write transaction that holds the writer lock from its first
    /// statement, so reads inside it cannot be invalidated by another writer.
    pub async fn begin_write(&self) -> StoreResult<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin_with("BEGIN IMMEDIATE").await?)
    }

    pub(crate) fn publish(&self, event: StoreEvent) {
        // No receivers is fine.
        let _ = self.events.send(event);
    }

    pub async fn close(&self) { self.pool.close().await }
}
