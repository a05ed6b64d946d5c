use common::ProductId;
use domain::ProductError;
use thiserror::Error;

/// Errors that can occur when interacting with a catalog or order store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The product does not exist in this store.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// A conditional stock decrement was rejected.
    #[error(
        "Insufficient stock for product {product_id}: requested {requested}, in stock {in_stock}"
    )]
    InsufficientStock {
        product_id: ProductId,
        requested: u32,
        in_stock: u32,
    },

    /// The product being saved breaks a catalog rule.
    #[error("Invalid product: {0}")]
    InvalidProduct(#[from] ProductError),

    /// The backing store cannot be reached or refused the operation.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A stored record could not be mapped back to an entity.
    #[error("Corrupt record: {0}")]
    Corrupt(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A filesystem error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Returns true for errors that mean "the store could not answer", as
    /// opposed to a definite answer such as not-found or insufficient stock.
    pub fn is_unavailable(&self) -> bool {
        !matches!(
            self,
            StoreError::ProductNotFound(_)
                | StoreError::InsufficientStock { .. }
                | StoreError::InvalidProduct(_)
        )
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
