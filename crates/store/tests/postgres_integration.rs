//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency and run
//! serially because each one truncates the shared tables.
//! Run with:
//!
//! ```bash
//! cargo test -p store --test postgres_integration
//! ```

use std::sync::Arc;

use common::{CustomerId, ProductId, SupplierId};
use domain::{Money, NewProduct, Order, OrderItem, OrderStatus};
use futures_util::future::join_all;
use serial_test::serial;
use sqlx::PgPool;
use store::{CatalogStore, OrderStore, PostgresCatalogStore, PostgresOrderStore, StoreError};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            store::run_migrations(&temp_pool).await.unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh pool with cleared tables
async fn get_test_pool() -> PgPool {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE order_items, orders, products")
        .execute(&pool)
        .await
        .unwrap();

    pool
}

fn laptop(stock: u32) -> NewProduct {
    NewProduct::new("Laptop Pro X1", Money::from_cents(1_500_000), stock, "f1")
        .with_id("P1")
        .with_description("14 inch")
        .with_category("Electronics")
}

#[tokio::test]
#[serial]
async fn save_and_find_product() {
    let catalog = PostgresCatalogStore::new(get_test_pool().await, "postgres:f1");

    let saved = catalog.save(laptop(50)).await.unwrap();
    let loaded = catalog.find_by_id(saved.id()).await.unwrap().unwrap();

    assert_eq!(loaded, saved);
    assert_eq!(loaded.description(), Some("14 inch"));
    assert!(catalog.find_by_id(&ProductId::new("nope")).await.unwrap().is_none());
}

#[tokio::test]
#[serial]
async fn save_upserts_existing_product() {
    let catalog = PostgresCatalogStore::new(get_test_pool().await, "postgres:f1");

    catalog.save(laptop(50)).await.unwrap();
    catalog.save(laptop(7)).await.unwrap();

    assert_eq!(catalog.find_all().await.unwrap().len(), 1);
    let loaded = catalog.find_by_id(&ProductId::new("P1")).await.unwrap().unwrap();
    assert_eq!(loaded.stock(), 7);
}

#[tokio::test]
#[serial]
async fn query_by_supplier_and_category() {
    let catalog = PostgresCatalogStore::new(get_test_pool().await, "postgres");

    catalog.save(laptop(5)).await.unwrap();
    catalog
        .save(NewProduct::new("Mouse", Money::from_cents(15_000), 200, "f2").with_category("Accessories"))
        .await
        .unwrap();

    let f1 = catalog.find_by_supplier(&SupplierId::new("f1")).await.unwrap();
    assert_eq!(f1.len(), 1);
    assert_eq!(f1[0].id().as_str(), "P1");

    let accessories = catalog.find_by_category("Accessories").await.unwrap();
    assert_eq!(accessories.len(), 1);
    assert_eq!(accessories[0].supplier_id().as_str(), "f2");
}

#[tokio::test]
#[serial]
async fn conditional_decrement_guards_stock() {
    let catalog = PostgresCatalogStore::new(get_test_pool().await, "postgres:f1");
    catalog.save(laptop(3)).await.unwrap();
    let id = ProductId::new("P1");

    assert_eq!(catalog.conditional_decrement_stock(&id, 2).await.unwrap(), 1);

    let result = catalog.conditional_decrement_stock(&id, 2).await;
    assert!(matches!(
        result,
        Err(StoreError::InsufficientStock {
            requested: 2,
            in_stock: 1,
            ..
        })
    ));

    assert_eq!(catalog.conditional_decrement_stock(&id, 1).await.unwrap(), 0);
    let product = catalog.find_by_id(&id).await.unwrap().unwrap();
    assert!(!product.is_available());

    let missing = catalog
        .conditional_decrement_stock(&ProductId::new("missing"), 1)
        .await;
    assert!(matches!(missing, Err(StoreError::ProductNotFound(_))));
}

#[tokio::test]
#[serial]
async fn increment_restores_availability() {
    let catalog = PostgresCatalogStore::new(get_test_pool().await, "postgres:f1");
    catalog.save(laptop(0)).await.unwrap();
    let id = ProductId::new("P1");

    assert_eq!(catalog.increment_stock(&id, 2).await.unwrap(), 2);
    assert!(catalog.find_by_id(&id).await.unwrap().unwrap().is_available());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[serial]
async fn concurrent_decrements_never_oversell() {
    let catalog = Arc::new(PostgresCatalogStore::new(get_test_pool().await, "postgres:f1"));
    catalog.save(laptop(10)).await.unwrap();

    let attempts = (0..25).map(|_| {
        let catalog = Arc::clone(&catalog);
        async move {
            catalog
                .conditional_decrement_stock(&ProductId::new("P1"), 3)
                .await
        }
    });
    let results = join_all(attempts).await;

    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(succeeded, 3);
    let product = catalog.find_by_id(&ProductId::new("P1")).await.unwrap().unwrap();
    assert_eq!(product.stock(), 1);
}

#[tokio::test]
#[serial]
async fn order_round_trip_with_status_update() {
    let orders = PostgresOrderStore::new(get_test_pool().await);
    let customer = CustomerId::new("client1");

    let order = Order::place(
        customer.clone(),
        vec![
            OrderItem::new("P1", "f1", "Laptop Pro X1", 2, Money::from_cents(1_500_000)),
            OrderItem::new("P2", "f2", "Mouse", 1, Money::from_cents(15_000)),
        ],
        "1 Main St",
    )
    .unwrap()
    .confirm()
    .unwrap();

    orders.save(&order).await.unwrap();
    let loaded = orders.find_by_id(order.id()).await.unwrap().unwrap();
    assert_eq!(loaded.items(), order.items());
    assert_eq!(loaded.status(), OrderStatus::Confirmed);
    assert_eq!(loaded.calculate_total().cents(), 3_015_000);

    let shipped = loaded.with_status(OrderStatus::Shipped);
    orders.save(&shipped).await.unwrap();

    let reloaded = orders.find_by_id(order.id()).await.unwrap().unwrap();
    assert_eq!(reloaded.status(), OrderStatus::Shipped);
    assert_eq!(reloaded.items().len(), 2);

    assert_eq!(orders.find_by_customer(&customer).await.unwrap().len(), 1);
    assert_eq!(orders.find_all().await.unwrap().len(), 1);
    assert!(
        orders
            .find_by_customer(&CustomerId::new("someone-else"))
            .await
            .unwrap()
            .is_empty()
    );
}
