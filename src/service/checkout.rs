//! Checkout
//!
//! Turns a session's cart into an order in one write transaction:
//!
//! 1. read the cart joined with current prices (the price snapshot),
//! 2. reserve stock line by line with the conditional decrement,
//! 3. number the order after the last one issued this UTC day,
//! 4. write the order and its lines, then empty the cart.
//!
//! Any failure rolls the whole transaction back, so stock, orders and the cart
//! are left exactly as they were.

use super::Storefront;
use crate::db::{cart_store, order_store, product_store, Database};
use crate::domain::aggregates::{CartEntry, NewOrder, NewOrderLine, Order};
use crate::domain::events::StoreEvent;
use crate::domain::value_objects::{CartSession, Money, OrderNumber};
use crate::error::{CheckoutError, StoreError};
use crate::validation::{CheckInput, CustomerDetails};
use chrono::Utc;
use sqlx::SqliteConnection;

impl Storefront {
    /// Places an order for everything in `session`'s cart.
    ///
    /// Customer details are checked before storage is touched; a bad field is
    /// reported as [`CheckoutError::Validation`]. Once the transaction has
    /// started it runs to commit or rollback even if the caller stops waiting.
    pub async fn checkout(&self, session: &CartSession, customer: CustomerDetails) -> Result<Order, CheckoutError> {
        let customer = customer.normalized();
        customer.check()?;

        let db = self.db.clone();
        let session = session.clone();
        let prefix = self.config.order_number_prefix.clone();
        let task = tokio::spawn(async move { place_order(&db, &session, &customer, &prefix).await });

        match task.await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(error = %e, "Checkout task did not finish");
                Err(CheckoutError::Failed(StoreError::Internal(format!("checkout task failed: {e}"))))
            }
        }
    }
}

async fn place_order(
    db: &Database,
    session: &CartSession,
    customer: &CustomerDetails,
    prefix: &str,
) -> Result<Order, CheckoutError> {
    let mut tx = db.begin_write().await.map_err(log_failure)?;

    match run(&mut tx, session, customer, prefix).await {
        Ok(order) => {
            tx.commit().await.map_err(|e| log_failure(e.into()))?;
            db.publish(StoreEvent::ProductsChanged);
            db.publish(StoreEvent::CartChanged { session: session.as_str().to_string() });
            db.publish(StoreEvent::OrdersChanged);
            tracing::info!(
                order_number = %order.order_number,
                total = %order.total,
                session = session.as_str(),
                "Order placed"
            );
            Ok(order)
        }
        Err(err) => {
            if let Err(e) = tx.rollback().await {
                tracing::error!(error = %e, "Checkout rollback failed");
            }
            match &err {
                CheckoutError::Failed(cause) => tracing::error!(error = %cause, session = session.as_str(), "Checkout failed"),
                other => tracing::warn!(reason = %other, session = session.as_str(), "Checkout rejected"),
            }
            Err(err)
        }
    }
}

async fn run(
    conn: &mut SqliteConnection,
    session: &CartSession,
    customer: &CustomerDetails,
    prefix: &str,
) -> Result<Order, CheckoutError> {
    let entries = cart_store::entries(&mut *conn, session.as_str()).await?;
    if entries.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    for entry in &entries {
        reserve(&mut *conn, entry).await?;
    }

    let total: Money = entries.iter().map(CartEntry::line_total).sum();
    let now = Utc::now();
    let stem = OrderNumber::day_stem(prefix, now.date_naive());
    let sequence = order_store::last_sequence(&mut *conn, &stem).await? + 1;

    let order = NewOrder {
        order_number: OrderNumber::allocate(prefix, now.date_naive(), sequence),
        customer_name: customer.name.clone(),
        customer_email: customer.email.clone(),
        customer_phone: customer.phone.clone(),
        total,
        notes: None,
        created_at: now,
    };
    let order_id = order_store::insert(&mut *conn, &order).await?;

    for entry in &entries {
        let line = NewOrderLine { product_id: entry.line.product_id, quantity: entry.line.quantity, unit_price: entry.price };
        order_store::insert_line(&mut *conn, order_id, &line, now).await?;
    }

    cart_store::clear(&mut *conn, session.as_str()).await?;

    order_store::find_by_id(&mut *conn, order_id)
        .await?
        .ok_or_else(|| CheckoutError::Failed(StoreError::Internal(format!("order {order_id} vanished before commit"))))
}

async fn reserve(conn: &mut SqliteConnection, entry: &CartEntry) -> Result<(), CheckoutError> {
    let product_id = entry.line.product_id;
    let requested = entry.line.quantity;
    if product_store::decrement_stock_if_available(&mut *conn, product_id, requested).await? == 1 {
        return Ok(());
    }
    match product_store::find_by_id(&mut *conn, product_id).await? {
        Some(product) => Err(CheckoutError::InsufficientStock { product_id, requested, available: product.stock }),
        None => Err(CheckoutError::ProductNotFound(product_id)),
    }
}

fn log_failure(err: StoreError) -> CheckoutError {
    tracing::error!(error = %err, "Checkout storage failure");
    CheckoutError::Failed(err)
}
