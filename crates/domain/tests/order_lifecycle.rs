//! Integration tests for products and orders working together.

use common::{CustomerId, ProductId, SupplierId};
use domain::{Money, NewProduct, Order, OrderError, OrderItem, OrderStatus, Product, ProductError};

fn laptop(stock: u32) -> Product {
    NewProduct::new("Laptop Pro X1", Money::from_units(1_500_000), stock, "f1")
        .with_id("P1")
        .with_category("Electronics")
        .into_product(ProductId::generate())
}

fn phone(stock: u32) -> Product {
    NewProduct::new("Smartphone Ultra S23", Money::from_units(900_000), stock, "f2")
        .with_id("P4")
        .into_product(ProductId::generate())
}

mod order_lifecycle {
    use super::*;

    #[test]
    fn placed_order_snapshots_product_data() {
        let mut product = laptop(50);
        let item = OrderItem::snapshot(&product, SupplierId::new("f1"), 2);
        product = product.decrease_stock(2).unwrap();

        let order = Order::place(CustomerId::new("client1"), vec![item], "1 Main St").unwrap();

        assert_eq!(product.stock(), 48);
        assert_eq!(order.items()[0].product_name, "Laptop Pro X1");
        assert_eq!(order.items()[0].unit_price, Money::from_units(1_500_000));
        assert_eq!(order.calculate_total(), Money::from_units(3_000_000));
    }

    #[test]
    fn confirmed_order_moves_through_fulfilment() {
        let order = Order::place(
            CustomerId::new("client1"),
            vec![OrderItem::snapshot(&phone(5), SupplierId::new("f2"), 1)],
            "1 Main St",
        )
        .unwrap();
        assert_eq!(order.status(), OrderStatus::Pending);

        let confirmed = order.confirm().unwrap();
        let shipped = confirmed.with_status(OrderStatus::Shipped);
        let delivered = shipped.with_status(OrderStatus::Delivered);

        assert!(OrderStatus::Confirmed.can_transition_to(OrderStatus::Processing));
        assert!(shipped.status().can_transition_to(OrderStatus::Delivered));
        assert!(delivered.status().is_terminal());
        assert_eq!(order.status(), OrderStatus::Pending);
    }

    #[test]
    fn shipped_order_cannot_be_cancelled() {
        let order = Order::place(
            CustomerId::new("client1"),
            vec![OrderItem::snapshot(&laptop(5), SupplierId::new("f1"), 1)],
            "1 Main St",
        )
        .unwrap()
        .confirm()
        .unwrap()
        .with_status(OrderStatus::Shipped);

        let err = order.cancel().unwrap_err();

        assert_eq!(
            err,
            OrderError::InvalidStateTransition {
                current_status: OrderStatus::Shipped,
                action: "cancel",
            }
        );
        assert_eq!(order.status(), OrderStatus::Shipped);
    }

    #[test]
    fn total_spans_suppliers() {
        let items = vec![
            OrderItem::snapshot(&laptop(5), SupplierId::new("f1"), 1),
            OrderItem::snapshot(&phone(5), SupplierId::new("f2"), 2),
        ];

        let order = Order::place(CustomerId::new("client1"), items, "1 Main St").unwrap();

        assert_eq!(order.calculate_total(), Money::from_units(3_300_000));
        assert_eq!(order.total_quantity(), 3);
    }
}

mod stock_rules {
    use super::*;

    #[test]
    fn selling_last_unit_marks_unavailable() {
        let product = laptop(1);

        let sold_out = product.decrease_stock(1).unwrap();

        assert_eq!(sold_out.stock(), 0);
        assert!(!sold_out.is_available());
        assert!(!sold_out.can_sell(1));
        assert!(sold_out.increase_stock(3).is_available());
    }

    #[test]
    fn overselling_is_rejected_without_mutation() {
        let product = laptop(2);

        let err = product.decrease_stock(3).unwrap_err();

        assert_eq!(
            err,
            ProductError::InsufficientStock {
                product_id: ProductId::new("P1"),
                requested: 3,
                in_stock: 2,
            }
        );
        assert_eq!(product.stock(), 2);
    }
}
