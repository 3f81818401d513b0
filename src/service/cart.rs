//! Add to cart

use super::Storefront;
use crate::domain::aggregates::CartLine;
use crate::domain::value_objects::CartSession;
use crate::error::{CartError, StoreError};
use crate::validation::check_quantity;

impl Storefront {
    /// Adds `quantity` of a product to the cart, merging with an existing line.
    ///
    /// The stock check here is a point-in-time hint for the shopper; stock is
    /// only reserved at checkout.
    pub async fn add_to_cart(&self, session: &CartSession, product_id: i64, quantity: i64) -> Result<CartLine, CartError> {
        check_quantity(quantity, self.config.min_quantity, self.config.max_quantity)?;

        let product = self
            .db
            .products()
            .find_by_id(product_id)
            .await
            .map_err(log_store_error)?
            .ok_or(CartError::ProductNotFound(product_id))?;
        if !product.can_supply(quantity) {
            return Err(CartError::InsufficientStock { product_id, requested: quantity, available: product.stock });
        }

        let line = self.db.cart(session).add_or_increment(product_id, quantity).await.map_err(|e| match e {
            // Deleted between the lookup and the insert.
            StoreError::NotFound(_) => CartError::ProductNotFound(product_id),
            other => log_store_error(other),
        })?;
        tracing::debug!(product_id, quantity, line_quantity = line.quantity, session = session.as_str(), "Added to cart");
        Ok(line)
    }
}

fn log_store_error(err: StoreError) -> CartError {
    tracing::error!(error = %err, "Cart update failed");
    CartError::Store(err)
}
