//! Order entity and related types.

mod item;
mod model;
mod state;

pub use item::OrderItem;
pub use model::Order;
pub use state::{OrderStatus, UnknownStatus};

use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// Order is not in a status that allows the requested action.
    #[error("Invalid state transition: cannot {action} from {current_status} status")]
    InvalidStateTransition {
        current_status: OrderStatus,
        action: &'static str,
    },

    /// Invalid quantity.
    #[error("Invalid quantity for {product_id}: {quantity} (must be greater than 0)")]
    InvalidQuantity { product_id: String, quantity: u32 },

    /// Order has no items.
    #[error("Order has no items")]
    NoItems,

    /// The order total does not fit in a money amount.
    #[error("Order total overflows")]
    TotalOverflow,
}
