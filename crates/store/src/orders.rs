use async_trait::async_trait;
use common::{CustomerId, OrderId};
use domain::Order;

use crate::Result;

/// Contract for durable order persistence.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Looks up an order by id.
    async fn find_by_id(&self, order_id: OrderId) -> Result<Option<Order>>;

    /// Returns a customer's orders, oldest first.
    async fn find_by_customer(&self, customer_id: &CustomerId) -> Result<Vec<Order>>;

    /// Returns every order, oldest first.
    async fn find_all(&self) -> Result<Vec<Order>>;

    /// Inserts the order or updates its status and timestamp.
    ///
    /// Lines are written once, on first insert.
    async fn save(&self, order: &Order) -> Result<Order>;
}
