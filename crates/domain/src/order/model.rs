//! Order entity.

use chrono::{DateTime, Utc};
use common::{CustomerId, OrderId};
use serde::{Deserialize, Serialize};

use super::{OrderError, OrderItem, OrderStatus};
use crate::money::Money;

/// A customer order.
///
/// The item list is fixed at creation; only `status` and `updated_at`
/// change afterwards. Transitions return a new snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    customer_id: CustomerId,
    items: Vec<OrderItem>,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    shipping_address: String,
}

impl Order {
    /// Creates a new `Pending` order.
    pub fn place(
        customer_id: CustomerId,
        items: Vec<OrderItem>,
        shipping_address: impl Into<String>,
    ) -> Result<Self, OrderError> {
        if items.is_empty() {
            return Err(OrderError::NoItems);
        }
        if let Some(item) = items.iter().find(|item| item.quantity == 0) {
            return Err(OrderError::InvalidQuantity {
                product_id: item.product_id.to_string(),
                quantity: item.quantity,
            });
        }
        if checked_total(&items).is_none() {
            return Err(OrderError::TotalOverflow);
        }

        let now = Utc::now();
        Ok(Self {
            id: OrderId::new(),
            customer_id,
            items,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
            shipping_address: shipping_address.into(),
        })
    }

    /// Rebuilds an order from stored fields.
    pub fn restore(
        id: OrderId,
        customer_id: CustomerId,
        items: Vec<OrderItem>,
        status: OrderStatus,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        shipping_address: impl Into<String>,
    ) -> Self {
        Self {
            id,
            customer_id,
            items,
            status,
            created_at,
            updated_at,
            shipping_address: shipping_address.into(),
        }
    }
}

// Query methods
impl Order {
    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn customer_id(&self) -> &CustomerId {
        &self.customer_id
    }

    /// Returns the lines in their original order.
    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn shipping_address(&self) -> &str {
        &self.shipping_address
    }

    /// Returns the sum of `unit_price * quantity` over all lines.
    ///
    /// Cannot overflow for an order built by `place`.
    pub fn calculate_total(&self) -> Money {
        self.items.iter().map(OrderItem::total_price).sum()
    }

    /// Returns the total quantity of all lines.
    pub fn total_quantity(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}

// Transitions
impl Order {
    /// Confirms a pending order.
    pub fn confirm(&self) -> Result<Order, OrderError> {
        if !self.status.can_confirm() {
            return Err(OrderError::InvalidStateTransition {
                current_status: self.status,
                action: "confirm",
            });
        }
        Ok(self.transitioned(OrderStatus::Confirmed))
    }

    /// Cancels the order unless it has already shipped or been delivered.
    pub fn cancel(&self) -> Result<Order, OrderError> {
        if !self.status.can_cancel() {
            return Err(OrderError::InvalidStateTransition {
                current_status: self.status,
                action: "cancel",
            });
        }
        Ok(self.transitioned(OrderStatus::Cancelled))
    }

    /// Administrative overwrite of the status. Does not consult the
    /// transition graph.
    pub fn with_status(&self, status: OrderStatus) -> Order {
        self.transitioned(status)
    }

    fn transitioned(&self, status: OrderStatus) -> Order {
        Order {
            status,
            updated_at: Utc::now(),
            ..self.clone()
        }
    }
}

fn checked_total(items: &[OrderItem]) -> Option<Money> {
    items.iter().try_fold(Money::zero(), |acc, item| {
        acc.checked_add(item.checked_total_price()?)
    })
}
