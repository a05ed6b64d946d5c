//! Order line snapshot.

use common::{ProductId, SupplierId};
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::product::Product;

/// A line of an order.
///
/// Captures the product's name and unit price at order time so later
/// catalog changes never alter order history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// The product identifier.
    pub product_id: ProductId,

    /// Supplier whose catalog store holds the product.
    pub supplier_id: SupplierId,

    /// Product name at order time.
    pub product_name: String,

    /// Quantity ordered.
    pub quantity: u32,

    /// Price per unit at order time.
    pub unit_price: Money,
}

impl OrderItem {
    /// Creates a new order item.
    pub fn new(
        product_id: impl Into<ProductId>,
        supplier_id: impl Into<SupplierId>,
        product_name: impl Into<String>,
        quantity: u32,
        unit_price: Money,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            supplier_id: supplier_id.into(),
            product_name: product_name.into(),
            quantity,
            unit_price,
        }
    }

    /// Captures a line from the current catalog snapshot.
    ///
    /// The supplier is the one the line was routed by, not necessarily the
    /// one recorded on the product.
    pub fn snapshot(product: &Product, supplier_id: SupplierId, quantity: u32) -> Self {
        Self {
            product_id: product.id().clone(),
            supplier_id,
            product_name: product.name().to_string(),
            quantity,
            unit_price: product.price(),
        }
    }

    /// Returns the total price for this line (quantity * unit_price).
    pub fn total_price(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }

    /// Returns the line total, or `None` if it overflows.
    pub fn checked_total_price(&self) -> Option<Money> {
        self.unit_price.checked_multiply(self.quantity)
    }
}
