use async_trait::async_trait;
use common::{ProductId, SupplierId};
use domain::{NewProduct, Product};

use crate::{Result, StoreError};

/// Contract every supplier catalog backend must satisfy.
///
/// Implementations must be thread-safe (Send + Sync) and
/// `conditional_decrement_stock` must be linearizable per product: the check
/// and the write happen as one atomic step inside the store, so concurrent
/// decrements can never drive stock below zero.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Short label used in logs, e.g. `"memory:f1"`.
    fn name(&self) -> &str;

    /// Looks up a product by id.
    async fn find_by_id(&self, product_id: &ProductId) -> Result<Option<Product>>;

    /// Returns every product in this store.
    async fn find_all(&self) -> Result<Vec<Product>>;

    /// Returns the products of one supplier.
    async fn find_by_supplier(&self, supplier_id: &SupplierId) -> Result<Vec<Product>>;

    /// Returns the products of one category.
    async fn find_by_category(&self, category: &str) -> Result<Vec<Product>>;

    /// Inserts or replaces a product, assigning an id when absent.
    async fn save(&self, product: NewProduct) -> Result<Product>;

    /// Atomically subtracts `quantity` if the product is available with at
    /// least that much stock.
    ///
    /// Returns the new stock level, `InsufficientStock` when the guard fails,
    /// or `ProductNotFound`.
    async fn conditional_decrement_stock(&self, product_id: &ProductId, quantity: u32)
    -> Result<u32>;

    /// Atomically adds `quantity` back. Used to compensate a decrement.
    async fn increment_stock(&self, product_id: &ProductId, quantity: u32) -> Result<u32>;
}

/// Extension trait providing convenience methods for catalog stores.
#[async_trait]
pub trait CatalogStoreExt: CatalogStore {
    /// Loads a product, turning absence into `ProductNotFound`.
    async fn get_product(&self, product_id: &ProductId) -> Result<Product> {
        self.find_by_id(product_id)
            .await?
            .ok_or_else(|| StoreError::ProductNotFound(product_id.clone()))
    }

    /// Checks if a product exists.
    async fn product_exists(&self, product_id: &ProductId) -> Result<bool> {
        Ok(self.find_by_id(product_id).await?.is_some())
    }
}

// Blanket implementation for all CatalogStore implementations
impl<T: CatalogStore + ?Sized> CatalogStoreExt for T {}
