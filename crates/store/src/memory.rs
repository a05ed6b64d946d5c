use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use common::{CustomerId, OrderId, ProductId, SupplierId};
use domain::{NewProduct, Order, Product};
use tokio::sync::RwLock;

use crate::{CatalogStore, OrderStore, Result, StoreError};

#[derive(Debug, Default)]
struct InMemoryCatalogState {
    products: BTreeMap<ProductId, Product>,
    unavailable: bool,
    failing_decrements: HashSet<ProductId>,
    fail_on_increment: bool,
    decrements: usize,
    increments: usize,
}

/// In-memory catalog store.
///
/// Serves as a real backend for single-process deployments and as the fake
/// used in tests: failures can be injected per operation. All mutations run
/// under the write lock, which makes the conditional decrement atomic.
#[derive(Debug, Clone)]
pub struct InMemoryCatalogStore {
    name: Arc<str>,
    state: Arc<RwLock<InMemoryCatalogState>>,
}

impl Default for InMemoryCatalogStore {
    fn default() -> Self {
        Self::named("memory")
    }
}

impl InMemoryCatalogStore {
    /// Creates a new empty in-memory catalog store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new empty store with a log label.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Arc::from(name.into()),
            state: Arc::default(),
        }
    }

    /// Creates a store pre-populated with the given products.
    pub fn with_products(name: impl Into<String>, products: impl IntoIterator<Item = Product>) -> Self {
        let state = InMemoryCatalogState {
            products: products
                .into_iter()
                .map(|p| (p.id().clone(), p))
                .collect(),
            ..Default::default()
        };
        Self {
            name: Arc::from(name.into()),
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Returns the current stock of a product.
    pub async fn stock_of(&self, product_id: &ProductId) -> Option<u32> {
        self.state
            .read()
            .await
            .products
            .get(product_id)
            .map(Product::stock)
    }

    /// Overwrites a product's stock, bypassing the guard. Simulates a
    /// concurrent writer.
    pub async fn force_stock(&self, product_id: &ProductId, stock: u32) {
        let mut state = self.state.write().await;
        if let Some(product) = state.products.get(product_id) {
            let updated = product.with_stock(stock);
            state.products.insert(product_id.clone(), updated);
        }
    }

    /// Makes every operation fail with `Unavailable`.
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.state.write().await.unavailable = unavailable;
    }

    /// Makes decrements of one product fail with `Unavailable`.
    pub async fn fail_decrement_of(&self, product_id: impl Into<ProductId>) {
        self.state
            .write()
            .await
            .failing_decrements
            .insert(product_id.into());
    }

    /// Makes every increment (compensation) fail with `Unavailable`.
    pub async fn set_fail_on_increment(&self, fail: bool) {
        self.state.write().await.fail_on_increment = fail;
    }

    /// Returns the number of successful decrements.
    pub async fn decrement_count(&self) -> usize {
        self.state.read().await.decrements
    }

    /// Returns the number of successful increments.
    pub async fn increment_count(&self) -> usize {
        self.state.read().await.increments
    }

    fn check_reachable(&self, state: &InMemoryCatalogState) -> Result<()> {
        if state.unavailable {
            return Err(StoreError::Unavailable(format!(
                "{} is not reachable",
                self.name
            )));
        }
        Ok(())
    }

    async fn select(&self, filter: impl Fn(&Product) -> bool) -> Result<Vec<Product>> {
        let state = self.state.read().await;
        self.check_reachable(&state)?;
        Ok(state
            .products
            .values()
            .filter(|p| filter(p))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalogStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn find_by_id(&self, product_id: &ProductId) -> Result<Option<Product>> {
        let state = self.state.read().await;
        self.check_reachable(&state)?;
        Ok(state.products.get(product_id).cloned())
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

        let mut state = self.state.write().await;
        self.check_reachable(&state)?;

        let product = product.into_product(ProductId::generate());
        state.products.insert(product.id().clone(), product.clone());
        Ok(product)
    }

    async fn conditional_decrement_stock(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<u32> {
        let mut state = self.state.write().await;
        self.check_reachable(&state)?;
        if state.failing_decrements.contains(product_id) {
            return Err(StoreError::Unavailable(format!(
                "{} rejected the stock update for {product_id}",
                self.name
            )));
        }

        let current = state
            .products
            .get(product_id)
            .ok_or_else(|| StoreError::ProductNotFound(product_id.clone()))?;

        let updated = current
            .decrease_stock(quantity)
            .map_err(|_| StoreError::InsufficientStock {
                product_id: product_id.clone(),
                requested: quantity,
                in_stock: current.stock(),
            })?;

        let new_stock = updated.stock();
        state.products.insert(product_id.clone(), updated);
        state.decrements += 1;
        Ok(new_stock)
    }

    async fn increment_stock(&self, product_id: &ProductId, quantity: u32) -> Result<u32> {
        let mut state = self.state.write().await;
        self.check_reachable(&state)?;
        if state.fail_on_increment {
            return Err(StoreError::Unavailable(format!(
                "{} rejected the stock restore for {product_id}",
                self.name
            )));
        }

        let updated = state
            .products
            .get(product_id)
            .ok_or_else(|| StoreError::ProductNotFound(product_id.clone()))?
            .increase_stock(quantity);

        let new_stock = updated.stock();
        state.products.insert(product_id.clone(), updated);
        state.increments += 1;
        Ok(new_stock)
    }
}

#[derive(Debug, Default)]
struct InMemoryOrderState {
    orders: HashMap<OrderId, Order>,
    fail_on_save: bool,
}

/// In-memory order store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderStore {
    state: Arc<RwLock<InMemoryOrderState>>,
}

impl InMemoryOrderStore {
    /// Creates a new empty in-memory order store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    /// Configures the store to fail every save.
    pub async fn set_fail_on_save(&self, fail: bool) {
        self.state.write().await.fail_on_save = fail;
    }

    async fn select(&self, filter: impl Fn(&Order) -> bool) -> Result<Vec<Order>> {
        let state = self.state.read().await;
        let mut orders: Vec<Order> = state
            .orders
            .values()
            .filter(|o| filter(o))
            .cloned()
            .collect();
        orders.sort_by(|a, b| {
            a.created_at()
                .cmp(&b.created_at())
                .then(a.id().as_uuid().cmp(&b.id().as_uuid()))
        });
        Ok(orders)
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn find_by_id(&self, order_id: OrderId) -> Result<Option<Order>> {
        Ok(self.state.read().await.orders.get(&order_id).cloned())
    }

    async fn find_by_customer(&self, customer_id: &CustomerId) -> Result<Vec<Order>> {
        self.select(|o| o.customer_id() == customer_id).await
    }

    async fn find_all(&self) -> Result<Vec<Order>> {
        self.select(|_| true).await
    }

    async fn save(&self, order: &Order) -> Result<Order> {
        let mut state = self.state.write().await;
        if state.fail_on_save {
            return Err(StoreError::Unavailable(
                "order store rejected the write".to_string(),
            ));
        }
        state.orders.insert(order.id(), order.clone());
        Ok(order.clone())
    }
}
