//! Cart Store
//!
//! One store per cart session. At most one line per product: adding a product
//! that is already in the cart bumps the existing line.

use super::row;
use super::Database;
use crate::domain::aggregates::{CartEntry, CartLine, CartSummary};
use crate::domain::events::StoreEvent;
use crate::domain::value_objects::{CartSession, Money};
use crate::error::{StoreError, StoreResult};
use crate::live::{live_query, LiveStream};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqliteExecutor};

const LINE_COLUMNS: &str = "id, session_id, product_id, quantity, created_at";

impl<'r> FromRow<'r, SqliteRow> for CartLine {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            session_id: row.try_get("session_id")?,
            product_id: row.try_get("product_id")?,
            quantity: row.try_get("quantity")?,
            created_at: row::timestamp(row, "created_at")?,
        })
    }
}

impl<'r> FromRow<'r, SqliteRow> for CartEntry {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            line: CartLine::from_row(row)?,
            product_name: row.try_get("product_name")?,
            price: row::money(row, "price_cents")?,
            image_ref: row.try_get("image_ref")?,
            description: row.try_get("description")?,
        })
    }
}

// =============================================================================
// Executor-level operations (usable inside a transaction)
// =============================================================================

/// Lines of `session` joined with their products, in insertion order.
pub(crate) async fn entries<'e, E: SqliteExecutor<'e>>(executor: E, session: &str) -> StoreResult<Vec<CartEntry>> {
    let entries = sqlx::query_as::<_, CartEntry>(
        "SELECT c.id, c.session_id, c.product_id, c.quantity, c.created_at, \
                p.name AS product_name, p.price_cents, p.image_ref, p.description \
         FROM cart_items c INNER JOIN products p ON p.id = c.product_id \
         WHERE c.session_id = ? ORDER BY c.id",
    )
    .bind(session)
    .fetch_all(executor)
    .await?;
    Ok(entries)
}

pub(crate) async fn clear<'e, E: SqliteExecutor<'e>>(executor: E, session: &str) -> StoreResult<u64> {
    let result = sqlx::query("DELETE FROM cart_items WHERE session_id = ?")
        .bind(session)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

// =============================================================================
// Cart Store
// =============================================================================

#[derive(Clone)]
pub struct CartStore {
    db: Database,
    session: CartSession,
}

impl CartStore {
    pub fn new(db: Database, session: CartSession) -> Self { Self { db, session } }

    pub fn session(&self) -> &CartSession { &self.session }

    /// Inserts a line, or adds `quantity` to the existing line for `product_id`.
    pub async fn add_or_increment(&self, product_id: i64, quantity: i64) -> StoreResult<CartLine> {
        if quantity < 1 {
            return Err(StoreError::Invalid(format!("quantity must be at least 1 (got {quantity})")));
        }
        let line = sqlx::query_as::<_, CartLine>(&format!(
            "INSERT INTO cart_items (session_id, product_id, quantity, created_at) VALUES (?, ?, ?, ?) \
             ON CONFLICT (session_id, product_id) DO UPDATE SET quantity = cart_items.quantity + excluded.quantity \
             RETURNING {LINE_COLUMNS}"
        ))
        .bind(self.session.as_str())
        .bind(product_id)
        .bind(quantity)
        .bind(row::now_millis())
        .fetch_one(self.db.pool())
        .await
        .map_err(|e| {
            if StoreError::is_foreign_key_violation(&e) {
                StoreError::NotFound(format!("Product {product_id} not found"))
            } else {
                StoreError::Database(e)
            }
        })?;
        self.changed();
        Ok(line)
    }

    pub async fn set_quantity(&self, line_id: i64, quantity: i64) -> StoreResult<()> {
        if quantity < 1 {
            return Err(StoreError::Invalid(format!("quantity must be at least 1 (got {quantity})")));
        }
        let rows = sqlx::query("UPDATE cart_items SET quantity = ? WHERE id = ? AND session_id = ?")
            .bind(quantity)
            .bind(line_id)
            .bind(self.session.as_str())
            .execute(self.db.pool())
            .await?;
        if rows.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("Cart line {line_id} not found")));
        }
        self.changed();
        Ok(())
    }

    pub async fn remove_line(&self, line_id: i64) -> StoreResult<()> {
        let rows = sqlx::query("DELETE FROM cart_items WHERE id = ? AND session_id = ?")
            .bind(line_id)
            .bind(self.session.as_str())
            .execute(self.db.pool())
            .await?;
        if rows.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("Cart line {line_id} not found")));
        }
        self.changed();
        Ok(())
    }

    /// Returns whether a line was removed.
    pub async fn remove_by_product(&self, product_id: i64) -> StoreResult<bool> {
        let rows = sqlx::query("DELETE FROM cart_items WHERE product_id = ? AND session_id = ?")
            .bind(product_id)
            .bind(self.session.as_str())
            .execute(self.db.pool())
            .await?;
        let removed = rows.rows_affected() > 0;
        if removed {
            self.changed();
        }
        Ok(removed)
    }

    /// Returns the number of lines removed.
    pub async fn clear(&self) -> StoreResult<u64> {
        let removed = clear(self.db.pool(), self.session.as_str()).await?;
        self.changed();
        Ok(removed)
    }

    pub async fn find_line(&self, line_id: i64) -> StoreResult<Option<CartLine>> {
        let line = sqlx::query_as::<_, CartLine>(&format!(
            "SELECT {LINE_COLUMNS} FROM cart_items WHERE id = ? AND session_id = ?"
        ))
        .bind(line_id)
        .bind(self.session.as_str())
        .fetch_optional(self.db.pool())
        .await?;
        Ok(line)
    }

    pub async fn find_line_by_product(&self, product_id: i64) -> StoreResult<Option<CartLine>> {
        let line = sqlx::query_as::<_, CartLine>(&format!(
            "SELECT {LINE_COLUMNS} FROM cart_items WHERE product_id = ? AND session_id = ?"
        ))
        .bind(product_id)
        .bind(self.session.as_str())
        .fetch_optional(self.db.pool())
        .await?;
        Ok(line)
    }

    pub async fn list_with_product_info(&self) -> StoreResult<Vec<CartEntry>> {
        entries(self.db.pool(), self.session.as_str()).await
    }

    pub async fn item_count(&self) -> StoreResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM cart_items WHERE session_id = ?")
            .bind(self.session.as_str())
            .fetch_one(self.db.pool())
            .await?;
        Ok(count)
    }

    pub async fn total_quantity(&self) -> StoreResult<i64> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(quantity), 0) FROM cart_items WHERE session_id = ?",
        )
        .bind(self.session.as_str())
        .fetch_one(self.db.pool())
        .await?;
        Ok(total)
    }

    /// Sum of price × quantity at current product prices; `None` for an empty cart.
    pub async fn total_price(&self) -> StoreResult<Option<Money>> {
        let cents = sqlx::query_scalar::<_, Option<i64>>(
            "SELECT SUM(p.price_cents * c.quantity) FROM cart_items c \
             INNER JOIN products p ON p.id = c.product_id WHERE c.session_id = ?",
        )
        .bind(self.session.as_str())
        .fetch_one(self.db.pool())
        .await?;
        Ok(cents.map(Money::from_cents))
    }

    pub async fn summary(&self) -> StoreResult<CartSummary> {
        Ok(CartSummary::from_entries(self.list_with_product_info().await?))
    }

    /// Live cart contents and aggregates for this session.
    pub fn watch(&self) -> LiveStream<CartSummary> {
        let store = self.clone();
        let session = self.session.as_str().to_string();
        live_query(
            self.db.subscribe(),
            move |event| event.touches_cart(&session),
            move || {
                let store = store.clone();
                async move { store.summary().await }
            },
        )
    }

    fn changed(&self) {
        self.db.publish(StoreEvent::CartChanged { session: self.session.as_str().to_string() });
    }
}
