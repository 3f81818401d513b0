//! Product Store

use super::row;
use super::Database;
use crate::domain::aggregates::{NewProduct, Product, ProductFilter};
use crate::domain::events::StoreEvent;
use crate::domain::value_objects::{Money, Page, PageRequest};
use crate::error::{StoreError, StoreResult};
use crate::live::{live_query, LiveStream};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, QueryBuilder, Row, Sqlite, SqliteExecutor};

const COLUMNS: &str = "id, name, description, price_cents, image_ref, stock, category, active, created_at";

impl<'r> FromRow<'r, SqliteRow> for Product {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            price: row::money(row, "price_cents")?,
            image_ref: row.try_get("image_ref")?,
            stock: row.try_get("stock")?,
            category: row.try_get("category")?,
            active: row.try_get("active")?,
            created_at: row::timestamp(row, "created_at")?,
        })
    }
}

// =============================================================================
// Executor-level operations (usable inside a transaction)
// =============================================================================

pub(crate) async fn find_by_id<'e, E: SqliteExecutor<'e>>(executor: E, id: i64) -> StoreResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(&format!("SELECT {COLUMNS} FROM products WHERE id = ?"))
        .bind(id)
        .fetch_optional(executor)
        .await?;
    Ok(product)
}

/// `stock = stock - quantity` only where `stock >= quantity`, as one statement.
/// Returns the number of rows changed: 1 on success, 0 when stock is short or
/// the product does not exist. `quantity` must be at least 1.
pub(crate) async fn decrement_stock_if_available<'e, E: SqliteExecutor<'e>>(
    executor: E,
    id: i64,
    quantity: i64,
) -> StoreResult<u64> {
    if quantity < 1 {
        return Err(StoreError::Invalid(format!("quantity must be at least 1 (got {quantity})")));
    }
    let result = sqlx::query("UPDATE products SET stock = stock - ?1 WHERE id = ?2 AND stock >= ?1")
        .bind(quantity)
        .bind(id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

async fn insert_one<'e, E: SqliteExecutor<'e>>(executor: E, product: &NewProduct) -> StoreResult<i64> {
    let price_cents = cents(&product.price)?;
    check_new(product)?;
    let result = sqlx::query(
        "INSERT INTO products (name, description, price_cents, image_ref, stock, category, active, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&product.name)
    .bind(&product.description)
    .bind(price_cents)
    .bind(&product.image_ref)
    .bind(product.stock)
    .bind(&product.category)
    .bind(product.active)
    .bind(row::now_millis())
    .execute(executor)
    .await?;
    Ok(result.last_insert_rowid())
}

fn check_new(product: &NewProduct) -> StoreResult<()> {
    if product.name.trim().is_empty() {
        return Err(StoreError::Invalid("product name cannot be empty".into()));
    }
    if product.stock < 0 {
        return Err(StoreError::Invalid(format!("stock cannot be negative ({})", product.stock)));
    }
    Ok(())
}

fn cents(price: &Money) -> StoreResult<i64> {
    price.to_cents().map_err(|e| StoreError::Invalid(format!("price {price}: {e}")))
}

fn push_active_filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: &ProductFilter) {
    qb.push(" FROM products WHERE active = 1");
    if let Some(category) = &filter.category {
        qb.push(" AND category = ").push_bind(category.clone());
    }
    if let Some(query) = &filter.query {
        qb.push(" AND name LIKE ").push_bind(row::like_pattern(query)).push(" ESCAPE '\\'");
    }
}

// =============================================================================
// Product Store
// =============================================================================

#[derive(Clone)]
pub struct ProductStore {
    db: Database,
}

impl ProductStore {
    pub fn new(db: Database) -> Self { Self { db } }

    /// Point lookup; inactive products are returned too.
    pub async fn find_by_id(&self, id: i64) -> StoreResult<Option<Product>> {
        find_by_id(self.db.pool(), id).await
    }

    /// Active products matching `filter`, newest first.
    pub async fn list_active(&self, filter: &ProductFilter) -> StoreResult<Vec<Product>> {
        let filter = filter.sanitized();
        let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {COLUMNS}"));
        push_active_filter(&mut qb, &filter);
        qb.push(" ORDER BY created_at DESC, id DESC");
        Ok(qb.build_query_as::<Product>().fetch_all(self.db.pool()).await?)
    }

    pub async fn list_active_page(&self, filter: &ProductFilter, page: PageRequest) -> StoreResult<Page<Product>> {
        let filter = filter.sanitized();

        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*)");
        push_active_filter(&mut count, &filter);
        let total: i64 = count.build_query_scalar().fetch_one(self.db.pool()).await?;

        let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {COLUMNS}"));
        push_active_filter(&mut qb, &filter);
        qb.push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(page.per_page as i64)
            .push(" OFFSET ")
            .push_bind(page.offset());
        let data = qb.build_query_as::<Product>().fetch_all(self.db.pool()).await?;

        Ok(Page { data, total, page: page.page, per_page: page.per_page })
    }

    /// Distinct categories among active products, sorted.
    pub async fn list_categories(&self) -> StoreResult<Vec<String>> {
        let categories = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT category FROM products WHERE active = 1 ORDER BY category",
        )
        .fetch_all(self.db.pool())
        .await?;
        Ok(categories)
    }

    pub async fn insert(&self, product: NewProduct) -> StoreResult<i64> {
        let id = insert_one(self.db.pool(), &product).await?;
        self.db.publish(StoreEvent::ProductsChanged);
        Ok(id)
    }

    /// Inserts all or nothing.
    pub async fn insert_many(&self, products: Vec<NewProduct>) -> StoreResult<Vec<i64>> {
        let mut tx = self.db.pool().begin().await?;
        let mut ids = Vec::with_capacity(products.len());
        for product in &products {
            ids.push(insert_one(&mut *tx, product).await?);
        }
        tx.commit().await?;
        self.db.publish(StoreEvent::ProductsChanged);
        Ok(ids)
    }

    /// Overwrites every mutable column of the stored row with `product`.
    pub async fn update(&self, product: &Product) -> StoreResult<()> {
        if product.stock < 0 {
            return Err(StoreError::Invalid(format!("stock cannot be negative ({})", product.stock)));
        }
        let rows = sqlx::query(
            "UPDATE products SET name = ?, description = ?, price_cents = ?, image_ref = ?, stock = ?, \
             category = ?, active = ? WHERE id = ?",
        )
        .bind(&product.name)
        .bind(&product.description)
        .bind(cents(&product.price)?)
        .bind(&product.image_ref)
        .bind(product.stock)
        .bind(&product.category)
        .bind(product.active)
        .bind(product.id)
        .execute(self.db.pool())
        .await?;
        if rows.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("Product {} not found", product.id)));
        }
        self.db.publish(StoreEvent::ProductsChanged);
        Ok(())
    }

    /// Hard delete. Cart lines go with it; order lines block it.
    pub async fn delete(&self, id: i64) -> StoreResult<()> {
        let rows = sqlx::query("DELETE FROM products WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await
            .map_err(|e| {
                if StoreError::is_foreign_key_violation(&e) {
                    StoreError::Conflict(format!("Product {id} is referenced by existing orders"))
                } else {
                    StoreError::Database(e)
                }
            })?;
        if rows.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("Product {id} not found")));
        }
        self.db.publish(StoreEvent::ProductsChanged);
        Ok(())
    }

    /// Unconditional overwrite. Checkout never uses this.
    pub async fn set_stock(&self, id: i64, stock: i64) -> StoreResult<()> {
        if stock < 0 {
            return Err(StoreError::Invalid(format!("stock cannot be negative ({stock})")));
        }
        let rows = sqlx::query("UPDATE products SET stock = ? WHERE id = ?")
            .bind(stock)
            .bind(id)
            .execute(self.db.pool())
            .await?;
        if rows.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("Product {id} not found")));
        }
        self.db.publish(StoreEvent::ProductsChanged);
        Ok(())
    }

    pub async fn decrement_stock_if_available(&self, id: i64, quantity: i64) -> StoreResult<u64> {
        let rows = decrement_stock_if_available(self.db.pool(), id, quantity).await?;
        if rows > 0 {
            self.db.publish(StoreEvent::ProductsChanged);
        }
        Ok(rows)
    }

    /// Live paginated listing of active products.
    pub fn watch_active(&self, filter: ProductFilter, page: PageRequest) -> LiveStream<Page<Product>> {
        let store = self.clone();
        live_query(
            self.db.subscribe(),
            |event| *event == StoreEvent::ProductsChanged,
            move || {
                let store = store.clone();
                let filter = filter.clone();
                async move { store.list_active_page(&filter, page).await }
            },
        )
    }
}
