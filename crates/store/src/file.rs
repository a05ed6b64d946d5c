use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use common::{ProductId, SupplierId};
use domain::{NewProduct, Product};
use tokio::sync::Mutex;

use crate::{CatalogStore, Result, StoreError};

/// Catalog store persisted as a JSON array in a single file.
///
/// The whole catalog is held in memory behind a mutex. Every mutation
/// rewrites the file through a temporary sibling and a rename, so readers of
/// the file never see a partial write. The mutex makes each
/// read-modify-write atomic within the process.
#[derive(Debug)]
pub struct JsonFileCatalogStore {
    name: String,
    path: PathBuf,
    products: Mutex<BTreeMap<ProductId, Product>>,
}

impl JsonFileCatalogStore {
    /// Opens the store at `path`, creating an empty catalog if the file does
    /// not exist yet.
    pub async fn open(path: impl Into<PathBuf>, name: impl Into<String>) -> Result<Self> {
        let path = path.into();
        let products = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.is_empty() => BTreeMap::new(),
            Ok(bytes) => {
                let list: Vec<Product> = serde_json::from_slice(&bytes)?;
                list.into_iter().map(|p| (p.id().clone(), p)).collect()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    tokio::fs::create_dir_all(parent).await?;
                }
                BTreeMap::new()
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!(path = %path.display(), products = products.len(), "Opened JSON catalog");

        Ok(Self {
            name: name.into(),
            path,
            products: Mutex::new(products),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, products: &BTreeMap<ProductId, Product>) -> Result<()> {
        let list: Vec<&Product> = products.values().collect();
        let bytes = serde_json::to_vec_pretty(&list)?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    async fn select(&self, filter: impl Fn(&Product) -> bool) -> Result<Vec<Product>> {
        let products = self.products.lock().await;
        Ok(products.values().filter(|p| filter(p)).cloned().collect())
    }

    /// Applies `update` to one product and persists the result. The in-memory
    /// copy only changes once the file write succeeded.
    async fn update_stock(
        &self,
        product_id: &ProductId,
        update: impl FnOnce(&Product) -> Result<Product>,
    ) -> Result<u32> {
        let mut products = self.products.lock().await;
        let current = products
            .get(product_id)
            .ok_or_else(|| StoreError::ProductNotFound(product_id.clone()))?;
        let updated = update(current)?;
        let new_stock = updated.stock();

        let previous = products.insert(product_id.clone(), updated);
        if let Err(e) = self.persist(&products).await {
            if let Some(previous) = previous {
                products.insert(product_id.clone(), previous);
            }
            return Err(e);
        }
        Ok(new_stock)
    }
}

#[async_trait]
impl CatalogStore for JsonFileCatalogStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn find_by_id(&self, product_id: &ProductId) -> Result<Option<Product>> {
        Ok(self.products.lock().await.get(product_id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Product>> {
        self.select(|_| true).await
    }

    async fn find_by_supplier(&self, supplier_id: &SupplierId) -> Result<Vec<Product>> {
        self.select(|p| p.supplier_id() == supplier_id).await
    }

    async fn find_by_category(&self, category: &str) -> Result<Vec<Product>> {
        self.select(|p| p.category() == Some(category)).await
    }

    async fn save(&self, product: NewProduct) -> Result<Product> {
        product.validate()?;
        let product = product.into_product(ProductId::generate());

        let mut products = self.products.lock().await;
        let previous = products.insert(product.id().clone(), product.clone());
        if let Err(e) = self.persist(&products).await {
            match previous {
                Some(previous) => products.insert(product.id().clone(), previous),
                None => products.remove(product.id()),
            };
            return Err(e);
        }
        Ok(product)
    }

    async fn conditional_decrement_stock(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<u32> {
        self.update_stock(product_id, |current| {
            current
                .decrease_stock(quantity)
                .map_err(|_| StoreError::InsufficientStock {
                    product_id: product_id.clone(),
                    requested: quantity,
                    in_stock: current.stock(),
                })
        })
        .await
    }

    async fn increment_stock(&self, product_id: &ProductId, quantity: u32) -> Result<u32> {
        self.update_stock(product_id, |current| Ok(current.increase_stock(quantity)))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::Money;
    use tempfile::TempDir;

    fn mouse() -> NewProduct {
        NewProduct::new("Wireless Mouse", Money::from_cents(15_000), 3, "f2")
            .with_id("P2")
            .with_category("Accessories")
    }

    #[tokio::test]
    async fn open_missing_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileCatalogStore::open(dir.path().join("nested/f2.json"), "json:f2")
            .await
            .unwrap();
        assert!(store.find_all().await.unwrap().is_empty());
        assert_eq!(store.name(), "json:f2");
    }

    #[tokio::test]
    async fn writes_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("f2.json");

        {
            let store = JsonFileCatalogStore::open(&path, "json:f2").await.unwrap();
            store.save(mouse()).await.unwrap();
            assert_eq!(
                store
                    .conditional_decrement_stock(&ProductId::new("P2"), 2)
                    .await
                    .unwrap(),
                1
            );
        }

        let reopened = JsonFileCatalogStore::open(&path, "json:f2").await.unwrap();
        let product = reopened
            .find_by_id(&ProductId::new("P2"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(product.stock(), 1);
        assert_eq!(product.category(), Some("Accessories"));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn decrement_guard_and_increment() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileCatalogStore::open(dir.path().join("f2.json"), "json:f2")
            .await
            .unwrap();
        store.save(mouse()).await.unwrap();
        let id = ProductId::new("P2");

        let result = store.conditional_decrement_stock(&id, 4).await;
        assert!(matches!(result, Err(StoreError::InsufficientStock { in_stock: 3, .. })));

        assert_eq!(store.conditional_decrement_stock(&id, 3).await.unwrap(), 0);
        assert!(!store.find_by_id(&id).await.unwrap().unwrap().is_available());

        assert_eq!(store.increment_stock(&id, 3).await.unwrap(), 3);
        assert!(store.find_by_id(&id).await.unwrap().unwrap().is_available());
    }

    #[tokio::test]
    async fn queries_filter_by_supplier_and_category() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileCatalogStore::open(dir.path().join("c.json"), "json")
            .await
            .unwrap();
        store.save(mouse()).await.unwrap();
        store
            .save(NewProduct::new("Headphones", Money::from_cents(25_000), 5, "f3").with_category("Audio"))
            .await
            .unwrap();

        assert_eq!(store.find_by_supplier(&SupplierId::new("f2")).await.unwrap().len(), 1);
        assert_eq!(store.find_by_category("Audio").await.unwrap().len(), 1);
        assert_eq!(store.find_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn corrupt_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, b"{ not json").unwrap();

        let result = JsonFileCatalogStore::open(&path, "json").await;
        assert!(matches!(result, Err(StoreError::Serialization(_))));
    }
}
