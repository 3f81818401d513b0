//! Order Store
//!
//! Orders and their lines. Orders are written by checkout; afterwards only the
//! status changes.

use super::row;
use super::Database;
use crate::domain::aggregates::{NewOrder, NewOrderLine, Order, OrderLine, OrderLineWithProduct, OrderStatus};
use crate::domain::events::StoreEvent;
use crate::error::{StoreError, StoreResult};
use crate::live::{live_query, LiveStream};
use chrono::{DateTime, Days, NaiveTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqliteExecutor};

const ORDER_COLUMNS: &str =
    "id, order_number, customer_name, customer_email, customer_phone, total_cents, status, notes, created_at";
const LINE_COLUMNS: &str = "id, order_id, product_id, quantity, unit_price_cents, subtotal_cents, created_at";

impl<'r> FromRow<'r, SqliteRow> for Order {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let status: String = row.try_get("status")?;
        Ok(Self {
            id: row.try_get("id")?,
            order_number: row.try_get::<String, _>("order_number")?.into(),
            customer_name: row.try_get("customer_name")?,
            customer_email: row.try_get("customer_email")?,
            customer_phone: row.try_get("customer_phone")?,
            total: row::money(row, "total_cents")?,
            status: status.parse().map_err(|e| sqlx::Error::ColumnDecode {
                index: "status".to_string(),
                source: Box::new(e),
            })?,
            notes: row.try_get("notes")?,
            created_at: row::timestamp(row, "created_at")?,
        })
    }
}

impl<'r> FromRow<'r, SqliteRow> for OrderLine {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            order_id: row.try_get("order_id")?,
            product_id: row.try_get("product_id")?,
            quantity: row.try_get("quantity")?,
            unit_price: row::money(row, "unit_price_cents")?,
            subtotal: row::money(row, "subtotal_cents")?,
            created_at: row::timestamp(row, "created_at")?,
        })
    }
}

impl<'r> FromRow<'r, SqliteRow> for OrderLineWithProduct {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            line: OrderLine::from_row(row)?,
            product_name: row.try_get("product_name")?,
            image_ref: row.try_get("image_ref")?,
        })
    }
}

/// `[start, end)` of the UTC calendar day containing `at`, in Unix millis.
pub(crate) fn utc_day_bounds(at: DateTime<Utc>) -> (i64, i64) {
    let day = at.date_naive();
    let start = day.and_time(NaiveTime::MIN).and_utc();
    let end = day
        .checked_add_days(Days::new(1))
        .map(|d| d.and_time(NaiveTime::MIN).and_utc())
        .unwrap_or(start);
    (start.timestamp_millis(), end.timestamp_millis())
}

// =============================================================================
// Executor-level operations (usable inside a transaction)
// =============================================================================

pub(crate) async fn count_created_on_day<'e, E: SqliteExecutor<'e>>(executor: E, at: DateTime<Utc>) -> StoreResult<i64> {
    let (start, end) = utc_day_bounds(at);
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders WHERE created_at >= ? AND created_at < ?")
        .bind(start)
        .bind(end)
        .fetch_one(executor)
        .await?;
    Ok(count)
}

/// Highest sequence already issued under `stem` (`<prefix>-<YYYYMMDD>-`), or 0.
/// Deleted orders leave gaps rather than freeing their numbers for reuse.
pub(crate) async fn last_sequence<'e, E: SqliteExecutor<'e>>(executor: E, stem: &str) -> StoreResult<i64> {
    let stem_len = stem.chars().count() as i64;
    let last = sqlx::query_scalar::<_, i64>(
        "SELECT COALESCE(MAX(CAST(substr(order_number, ?1 + 1) AS INTEGER)), 0) FROM orders \
         WHERE substr(order_number, 1, ?1) = ?2",
    )
    .bind(stem_len)
    .bind(stem)
    .fetch_one(executor)
    .await?;
    Ok(last)
}

/// Inserts an order with status `pending`, returning its id.
pub(crate) async fn insert<'e, E: SqliteExecutor<'e>>(executor: E, order: &NewOrder) -> StoreResult<i64> {
    let total_cents = order
        .total
        .to_cents()
        .map_err(|e| StoreError::Invalid(format!("order total {}: {e}", order.total)))?;
    let result = sqlx::query(
        "INSERT INTO orders (order_number, customer_name, customer_email, customer_phone, total_cents, status, notes, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(order.order_number.as_str())
    .bind(&order.customer_name)
    .bind(&order.customer_email)
    .bind(&order.customer_phone)
    .bind(total_cents)
    .bind(OrderStatus::Pending.as_str())
    .bind(&order.notes)
    .bind(order.created_at.timestamp_millis())
    .execute(executor)
    .await?;
    Ok(result.last_insert_rowid())
}

pub(crate) async fn insert_line<'e, E: SqliteExecutor<'e>>(
    executor: E,
    order_id: i64,
    line: &NewOrderLine,
    created_at: DateTime<Utc>,
) -> StoreResult<i64> {
    let unit = line.unit_price.to_cents().map_err(|e| StoreError::Invalid(format!("unit price: {e}")))?;
    let subtotal = line.subtotal().to_cents().map_err(|e| StoreError::Invalid(format!("subtotal: {e}")))?;
    let result = sqlx::query(
        "INSERT INTO order_items (order_id, product_id, quantity, unit_price_cents, subtotal_cents, created_at) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(order_id)
    .bind(line.product_id)
    .bind(line.quantity)
    .bind(unit)
    .bind(subtotal)
    .bind(created_at.timestamp_millis())
    .execute(executor)
    .await?;
    Ok(result.last_insert_rowid())
}

pub(crate) async fn find_by_id<'e, E: SqliteExecutor<'e>>(executor: E, id: i64) -> StoreResult<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?"))
        .bind(id)
        .fetch_optional(executor)
        .await?;
    Ok(order)
}

// =============================================================================
// Order Store
// =============================================================================

#[derive(Clone)]
pub struct OrderStore {
    db: Database,
}

impl OrderStore {
    pub fn new(db: Database) -> Self { Self { db } }

    /// Creates an order and its lines in one transaction.
    pub async fn create(&self, order: &NewOrder, lines: &[NewOrderLine]) -> StoreResult<Order> {
        let mut tx = self.db.pool().begin().await?;
        let id = insert(&mut *tx, order).await?;
        for line in lines {
            insert_line(&mut *tx, id, line, order.created_at).await?;
        }
        let created = find_by_id(&mut *tx, id)
            .await?
            .ok_or_else(|| StoreError::Internal(format!("Order {id} vanished after insert")))?;
        tx.commit().await?;
        self.db.publish(StoreEvent::OrdersChanged);
        Ok(created)
    }

    /// Adds lines to an existing order in bulk.
    pub async fn insert_lines(&self, order_id: i64, lines: &[NewOrderLine]) -> StoreResult<Vec<i64>> {
        let mut tx = self.db.pool().begin().await?;
        let now = Utc::now();
        let mut ids = Vec::with_capacity(lines.len());
        for line in lines {
            ids.push(insert_line(&mut *tx, order_id, line, now).await?);
        }
        tx.commit().await?;
        self.db.publish(StoreEvent::OrdersChanged);
        Ok(ids)
    }

    pub async fn find_by_id(&self, id: i64) -> StoreResult<Option<Order>> {
        find_by_id(self.db.pool(), id).await
    }

    pub async fn find_by_number(&self, order_number: &str) -> StoreResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE order_number = ?"))
            .bind(order_number)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(order)
    }

    pub async fn list_all(&self) -> StoreResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(self.db.pool())
        .await?;
        Ok(orders)
    }

    pub async fn list_by_customer_email(&self, email: &str) -> StoreResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE customer_email = ? ORDER BY created_at DESC, id DESC"
        ))
        .bind(email)
        .fetch_all(self.db.pool())
        .await?;
        Ok(orders)
    }

    pub async fn list_by_status(&self, status: OrderStatus) -> StoreResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE status = ? ORDER BY created_at DESC, id DESC"
        ))
        .bind(status.as_str())
        .fetch_all(self.db.pool())
        .await?;
        Ok(orders)
    }

    pub async fn update_status(&self, id: i64, status: OrderStatus) -> StoreResult<()> {
        let rows = sqlx::query("UPDATE orders SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id)
            .execute(self.db.pool())
            .await?;
        if rows.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("Order {id} not found")));
        }
        tracing::debug!(order_id = id, status = %status, "Order status updated");
        self.db.publish(StoreEvent::OrdersChanged);
        Ok(())
    }

    /// Deletes an order together with its lines.
    pub async fn delete(&self, id: i64) -> StoreResult<()> {
        let rows = sqlx::query("DELETE FROM orders WHERE id = ?").bind(id).execute(self.db.pool()).await?;
        if rows.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("Order {id} not found")));
        }
        self.db.publish(StoreEvent::OrdersChanged);
        Ok(())
    }

    pub async fn count(&self) -> StoreResult<i64> {
        Ok(sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders").fetch_one(self.db.pool()).await?)
    }

    pub async fn count_by_status(&self, status: OrderStatus) -> StoreResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders WHERE status = ?")
            .bind(status.as_str())
            .fetch_one(self.db.pool())
            .await?;
        Ok(count)
    }

    /// Orders created on the current UTC calendar day.
    pub async fn count_today(&self) -> StoreResult<i64> {
        count_created_on_day(self.db.pool(), Utc::now()).await
    }

    pub async fn lines(&self, order_id: i64) -> StoreResult<Vec<OrderLine>> {
        let lines = sqlx::query_as::<_, OrderLine>(&format!(
            "SELECT {LINE_COLUMNS} FROM order_items WHERE order_id = ? ORDER BY id"
        ))
        .bind(order_id)
        .fetch_all(self.db.pool())
        .await?;
        Ok(lines)
    }

    pub async fn lines_with_product(&self, order_id: i64) -> StoreResult<Vec<OrderLineWithProduct>> {
        let lines = sqlx::query_as::<_, OrderLineWithProduct>(
            "SELECT i.id, i.order_id, i.product_id, i.quantity, i.unit_price_cents, i.subtotal_cents, i.created_at, \
                    p.name AS product_name, p.image_ref \
             FROM order_items i INNER JOIN products p ON p.id = i.product_id \
             WHERE i.order_id = ? ORDER BY i.id",
        )
        .bind(order_id)
        .fetch_all(self.db.pool())
        .await?;
        Ok(lines)
    }

    /// Live order history, newest first.
    pub fn watch_all(&self) -> LiveStream<Vec<Order>> {
        let store = self.clone();
        live_query(
            self.db.subscribe(),
            |event| *event == StoreEvent::OrdersChanged,
            move || {
                let store = store.clone();
                async move { store.list_all().await }
            },
        )
    }
}
