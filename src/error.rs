//! Error types

use thiserror::Error;

// =============================================================================
// Storage
// =============================================================================

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid value: {0}")]
    Invalid(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl StoreError {
    /// SQLite reports a RESTRICT parent delete as SQLITE_CONSTRAINT_TRIGGER (1811),
    /// which sqlx does not classify as a foreign key error; a child insert is 787.
    pub(crate) fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
        let sqlx::Error::Database(db) = err else { return false };
        db.kind() == sqlx::error::ErrorKind::ForeignKeyViolation
            || matches!(db.code().as_deref(), Some("787" | "1811"))
            || db.message().contains("FOREIGN KEY constraint failed")
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

// =============================================================================
// Input validation
// =============================================================================

/// Bad input shape, detected before storage is touched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field: field.into(), message: message.into() }
    }
}

// =============================================================================
// Use cases
// =============================================================================

#[derive(Error, Debug)]
pub enum CheckoutError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Your cart is empty")]
    EmptyCart,

    #[error("Not enough stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock { product_id: i64, requested: i64, available: i64 },

    #[error("Product {0} no longer exists")]
    ProductNotFound(i64),

    #[error("Checkout could not be completed: {0}")]
    Failed(#[source] StoreError),
}

impl From<StoreError> for CheckoutError {
    fn from(err: StoreError) -> Self { CheckoutError::Failed(err) }
}

impl From<sqlx::Error> for CheckoutError {
    fn from(err: sqlx::Error) -> Self { CheckoutError::Failed(StoreError::Database(err)) }
}

#[derive(Error, Debug)]
pub enum CartError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("The requested product does not exist")]
    ProductNotFound(i64),

    #[error("Not enough stock. Available: {available}")]
    InsufficientStock { product_id: i64, requested: i64, available: i64 },

    #[error("Could not update the cart: {0}")]
    Store(#[from] StoreError),
}

#[derive(Error, Debug)]
pub enum ContactError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Could not send the message: {0}")]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_user_facing() {
        let err = CheckoutError::InsufficientStock { product_id: 7, requested: 2, available: 1 };
        assert_eq!(err.to_string(), "Not enough stock for product 7: requested 2, available 1");
        assert_eq!(CheckoutError::EmptyCart.to_string(), "Your cart is empty");
        let err: CheckoutError = ValidationError::new("email", "Please enter a valid email").into();
        assert_eq!(err.to_string(), "Please enter a valid email");
    }

    #[test]
    fn test_store_error_wraps_into_failed() {
        let err: CheckoutError = StoreError::Internal("boom".into()).into();
        assert!(matches!(err, CheckoutError::Failed(StoreError::Internal(_))));
    }
}
