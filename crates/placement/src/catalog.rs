//! Catalog read and create operations over the routed stores.

use std::collections::BTreeMap;
use std::sync::Arc;

use common::{ProductId, SupplierId};
use domain::{NewProduct, Product};
use store::RoutingTable;

use crate::error::Result;

/// Catalog queries that either target one supplier's store or span every
/// distinct store in the routing table.
#[derive(Debug, Clone)]
pub struct CatalogService {
    routing: Arc<RoutingTable>,
}

impl CatalogService {
    pub fn new(routing: Arc<RoutingTable>) -> Self {
        Self { routing }
    }

    /// Lists every product of every store, sorted by id. A product id present
    /// in several stores is reported once, from the first store holding it.
    #[tracing::instrument(skip(self))]
    pub async fn get_all_products(&self) -> Result<Vec<Product>> {
        let mut merged: BTreeMap<ProductId, Product> = BTreeMap::new();
        for store in self.routing.stores() {
            for product in store.find_all().await? {
                merged.entry(product.id().clone()).or_insert(product);
            }
        }
        Ok(merged.into_values().collect())
    }

    /// Finds a product by id, searching the stores in routing order.
    #[tracing::instrument(skip(self))]
    pub async fn get_product(&self, product_id: &ProductId) -> Result<Option<Product>> {
        for store in self.routing.stores() {
            if let Some(product) = store.find_by_id(product_id).await? {
                return Ok(Some(product));
            }
        }
        Ok(None)
    }

    /// Lists a supplier's products from that supplier's store.
    #[tracing::instrument(skip(self))]
    pub async fn get_products_by_supplier(&self, supplier_id: &SupplierId) -> Result<Vec<Product>> {
        let store = self.routing.resolve(supplier_id);
        Ok(store.find_by_supplier(supplier_id).await?)
    }

    /// Lists the products of one category across every store.
    #[tracing::instrument(skip(self))]
    pub async fn get_products_by_category(&self, category: &str) -> Result<Vec<Product>> {
        let mut products = Vec::new();
        for store in self.routing.stores() {
            products.extend(store.find_by_category(category).await?);
        }
        products.sort_by(|a, b| a.id().cmp(b.id()));
        Ok(products)
    }

    /// Saves a product into its supplier's store.
    #[tracing::instrument(skip(self, product), fields(supplier_id = %product.supplier_id))]
    pub async fn create_product(&self, product: NewProduct) -> Result<Product> {
        let store = self.routing.resolve(&product.supplier_id);
        let saved = store.save(product).await?;

        tracing::info!(
            product_id = %saved.id(),
            store = store.name(),
            "product saved"
        );
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlacementError;
    use domain::Money;
    use store::{CatalogStore, InMemoryCatalogStore};

    fn product(id: &str, supplier: &str, category: &str) -> Product {
        NewProduct::new(format!("Product {id}"), Money::from_cents(100), 1, supplier)
            .with_id(id)
            .with_category(category)
            .into_product(ProductId::generate())
    }

    fn setup() -> (CatalogService, InMemoryCatalogStore, InMemoryCatalogStore) {
        let f1 = InMemoryCatalogStore::with_products(
            "memory:f1",
            [product("P1", "f1", "Electronics"), product("P3", "f1", "Audio")],
        );
        let f2 = InMemoryCatalogStore::with_products("memory:f2", [product("P2", "f2", "Electronics")]);
        let routing = RoutingTable::builder(Arc::new(InMemoryCatalogStore::named("memory:default")))
            .route("f1", Arc::new(f1.clone()))
            .route("f2", Arc::new(f2.clone()))
            .build();
        (CatalogService::new(Arc::new(routing)), f1, f2)
    }

    #[tokio::test]
    async fn test_get_all_products_merges_stores() {
        let (service, _, _) = setup();
        let ids: Vec<String> = service
            .get_all_products()
            .await
            .unwrap()
            .iter()
            .map(|p| p.id().to_string())
            .collect();
        assert_eq!(ids, vec!["P1", "P2", "P3"]);
    }

    #[tokio::test]
    async fn test_get_product_searches_every_store() {
        let (service, _, _) = setup();
        let found = service.get_product(&ProductId::new("P2")).await.unwrap();
        assert_eq!(found.unwrap().supplier_id().as_str(), "f2");
        assert!(service.get_product(&ProductId::new("P9")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_by_supplier_and_category() {
        let (service, _, _) = setup();
        let f1 = service
            .get_products_by_supplier(&SupplierId::new("f1"))
            .await
            .unwrap();
        assert_eq!(f1.len(), 2);

        let electronics = service.get_products_by_category("Electronics").await.unwrap();
        assert_eq!(electronics.len(), 2);
        assert!(service.get_products_by_supplier(&SupplierId::new("f7")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_product_routes_to_supplier_store() {
        let (service, _, f2) = setup();
        let saved = service
            .create_product(NewProduct::new("Phone", Money::from_cents(900_000), 4, "f2"))
            .await
            .unwrap();

        assert!(f2.find_by_id(saved.id()).await.unwrap().is_some());

        let invalid = service
            .create_product(NewProduct::new("", Money::from_cents(1), 1, "f2"))
            .await;
        assert!(matches!(invalid, Err(PlacementError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_listing() {
        let (service, f1, _) = setup();
        f1.set_unavailable(true).await;
        let result = service.get_all_products().await;
        assert!(matches!(result, Err(PlacementError::StoreUnavailable(_))));
    }
}
