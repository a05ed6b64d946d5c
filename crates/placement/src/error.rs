//! Placement error types.

use common::{OrderId, ProductId};
use domain::{OrderError, OrderStatus, ProductError};
use store::StoreError;
use thiserror::Error;

use crate::saga::CommittedLine;

/// Errors surfaced by the placement workflow and the catalog service.
#[derive(Debug, Error)]
pub enum PlacementError {
    /// A requested product does not exist in its supplier's store.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// The order does not exist.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The product cannot cover the requested quantity.
    #[error(
        "Insufficient stock for product {product_id}: requested {requested}, in stock {in_stock}"
    )]
    InsufficientStock {
        product_id: ProductId,
        requested: u32,
        in_stock: u32,
    },

    /// The order's current status forbids the action.
    #[error("Cannot {action} order in {current_status} status")]
    InvalidStateTransition {
        current_status: OrderStatus,
        action: &'static str,
    },

    /// A backing store could not be reached.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// A placement failed and some committed stock could not be restored.
    /// Requires operator attention.
    #[error("Compensation failed after '{cause}': {} line(s) not restored", .unreverted.len())]
    CompensationFailed {
        cause: String,
        unreverted: Vec<CommittedLine>,
    },

    /// The request is malformed.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Unexpected internal failure.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PlacementError {
    /// Returns true only for failures that leave stores inconsistent and
    /// need manual repair.
    pub fn is_operator_alert(&self) -> bool {
        matches!(self, PlacementError::CompensationFailed { .. })
    }

    /// Returns a short stable label, used as a metrics tag.
    pub fn kind(&self) -> &'static str {
        match self {
            PlacementError::ProductNotFound(_) => "product_not_found",
            PlacementError::OrderNotFound(_) => "order_not_found",
            PlacementError::InsufficientStock { .. } => "insufficient_stock",
            PlacementError::InvalidStateTransition { .. } => "invalid_state_transition",
            PlacementError::StoreUnavailable(_) => "store_unavailable",
            PlacementError::CompensationFailed { .. } => "compensation_failed",
            PlacementError::InvalidRequest(_) => "invalid_request",
            PlacementError::Internal(_) => "internal",
        }
    }
}

impl From<StoreError> for PlacementError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ProductNotFound(product_id) => PlacementError::ProductNotFound(product_id),
            StoreError::InsufficientStock {
                product_id,
                requested,
                in_stock,
            } => PlacementError::InsufficientStock {
                product_id,
                requested,
                in_stock,
            },
            StoreError::InvalidProduct(e) => PlacementError::InvalidRequest(e.to_string()),
            other => PlacementError::StoreUnavailable(other.to_string()),
        }
    }
}

impl From<OrderError> for PlacementError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::InvalidStateTransition {
                current_status,
                action,
            } => PlacementError::InvalidStateTransition {
                current_status,
                action,
            },
            other => PlacementError::InvalidRequest(other.to_string()),
        }
    }
}

impl From<ProductError> for PlacementError {
    fn from(err: ProductError) -> Self {
        match err {
            ProductError::InsufficientStock {
                product_id,
                requested,
                in_stock,
            } => PlacementError::InsufficientStock {
                product_id,
                requested,
                in_stock,
            },
            other => PlacementError::InvalidRequest(other.to_string()),
        }
    }
}

/// Convenience type alias for placement results.
pub type Result<T> = std::result::Result<T, PlacementError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_map_to_business_or_unavailable() {
        let not_found: PlacementError = StoreError::ProductNotFound(ProductId::new("P1")).into();
        assert!(matches!(not_found, PlacementError::ProductNotFound(_)));

        let short: PlacementError = StoreError::InsufficientStock {
            product_id: ProductId::new("P1"),
            requested: 3,
            in_stock: 1,
        }
        .into();
        assert!(matches!(
            short,
            PlacementError::InsufficientStock { requested: 3, in_stock: 1, .. }
        ));

        let down: PlacementError = StoreError::Unavailable("f1 offline".into()).into();
        assert!(matches!(down, PlacementError::StoreUnavailable(ref m) if m.contains("f1 offline")));

        let invalid: PlacementError = StoreError::InvalidProduct(ProductError::NameRequired).into();
        assert!(matches!(invalid, PlacementError::InvalidRequest(_)));
    }

    #[test]
    fn test_order_errors_keep_transition_details() {
        let err: PlacementError = OrderError::InvalidStateTransition {
            current_status: OrderStatus::Shipped,
            action: "cancel",
        }
        .into();
        assert_eq!(err.to_string(), "Cannot cancel order in SHIPPED status");

        let empty: PlacementError = OrderError::NoItems.into();
        assert!(matches!(empty, PlacementError::InvalidRequest(_)));
    }

    #[test]
    fn test_only_compensation_failure_alerts_operator() {
        let failed = PlacementError::CompensationFailed {
            cause: "Store unavailable: f2".into(),
            unreverted: vec![CommittedLine {
                product_id: ProductId::new("P1"),
                supplier_id: "f1".into(),
                quantity: 2,
            }],
        };
        assert!(failed.is_operator_alert());
        assert_eq!(failed.kind(), "compensation_failed");
        assert!(failed.to_string().contains("1 line(s) not restored"));

        assert!(!PlacementError::StoreUnavailable("x".into()).is_operator_alert());
        assert!(!PlacementError::Internal("x".into()).is_operator_alert());
    }
}
