//! Placement request types.

use common::{ProductId, SupplierId};
use serde::{Deserialize, Serialize};

/// One line of an order request.
///
/// The supplier is the routing key: it selects which catalog store holds
/// the product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineRequest {
    pub product_id: ProductId,
    pub supplier_id: SupplierId,
    pub quantity: u32,
}

impl OrderLineRequest {
    pub fn new(
        product_id: impl Into<ProductId>,
        supplier_id: impl Into<SupplierId>,
        quantity: u32,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            supplier_id: supplier_id.into(),
            quantity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_from_request_body() {
        let line: OrderLineRequest =
            serde_json::from_str(r#"{"product_id":"P1","supplier_id":"f1","quantity":2}"#).unwrap();
        assert_eq!(line, OrderLineRequest::new("P1", "f1", 2));
    }
}
