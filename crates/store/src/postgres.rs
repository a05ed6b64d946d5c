use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{CustomerId, OrderId, ProductId, SupplierId};
use domain::{Money, NewProduct, Order, OrderItem, OrderStatus, Product};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{CatalogStore, OrderStore, Result, StoreError};

/// Runs the database migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    Ok(())
}

fn to_u32(value: i64, column: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| StoreError::Corrupt(format!("{column} out of range: {value}")))
}

const PRODUCT_COLUMNS: &str =
    "id, name, description, price_cents, stock, supplier_id, category, available";

/// PostgreSQL-backed catalog store.
///
/// Stock updates are single guarded `UPDATE ... RETURNING` statements, so
/// the check and the write are one atomic step in the database.
#[derive(Debug, Clone)]
pub struct PostgresCatalogStore {
    name: String,
    pool: PgPool,
}

impl PostgresCatalogStore {
    /// Creates a new PostgreSQL catalog store.
    pub fn new(pool: PgPool, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pool,
        }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn row_to_product(row: PgRow) -> Result<Product> {
        Ok(Product::restore(
            ProductId::new(row.try_get::<String, _>("id")?),
            row.try_get::<String, _>("name")?,
            row.try_get("description")?,
            Money::from_cents(row.try_get("price_cents")?),
            to_u32(row.try_get("stock")?, "stock")?,
            SupplierId::new(row.try_get::<String, _>("supplier_id")?),
            row.try_get("category")?,
        ))
    }

    async fn fetch_products(&self, sql: &str, bind: Option<&str>) -> Result<Vec<Product>> {
        let mut query = sqlx::query(sql);
        if let Some(value) = bind {
            query = query.bind(value);
        }
        let rows = query.fetch_all(&self.pool).await?;
        rows.into_iter().map(Self::row_to_product).collect()
    }
}

#[async_trait]
impl CatalogStore for PostgresCatalogStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn find_by_id(&self, product_id: &ProductId) -> Result<Option<Product>> {
        let row: Option<PgRow> =
            sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"))
                .bind(product_id.as_str())
                .fetch_optional(&self.pool)
                .await?;

        row.map(Self::row_to_product).transpose()
    }

    async fn find_all(&self) -> Result<Vec<Product>> {
        self.fetch_products(
            &format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id"),
            None,
        )
        .await
    }

    async fn find_by_supplier(&self, supplier_id: &SupplierId) -> Result<Vec<Product>> {
        self.fetch_products(
            &format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE supplier_id = $1 ORDER BY id"),
            Some(supplier_id.as_str()),
        )
        .await
    }

    async fn find_by_category(&self, category: &str) -> Result<Vec<Product>> {
        self.fetch_products(
            &format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE category = $1 ORDER BY id"),
            Some(category),
        )
        .await
    }

    async fn save(&self, product: NewProduct) -> Result<Product> {
        product.validate()?;
        let product = product.into_product(ProductId::generate());

        sqlx::query(
            r#"
            INSERT INTO products (id, name, description, price_cents, stock, supplier_id, category, available)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                price_cents = EXCLUDED.price_cents,
                stock = EXCLUDED.stock,
                supplier_id = EXCLUDED.supplier_id,
                category = EXCLUDED.category,
                available = EXCLUDED.available
            "#,
        )
        .bind(product.id().as_str())
        .bind(product.name())
        .bind(product.description())
        .bind(product.price().cents())
        .bind(i64::from(product.stock()))
        .bind(product.supplier_id().as_str())
        .bind(product.category())
        .bind(product.is_available())
        .execute(&self.pool)
        .await?;

        Ok(product)
    }

    async fn conditional_decrement_stock(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<u32> {
        let updated: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE products
            SET stock = stock - $2, available = (stock - $2) > 0
            WHERE id = $1 AND available AND stock >= $2
            RETURNING stock
            "#,
        )
        .bind(product_id.as_str())
        .bind(i64::from(quantity))
        .fetch_optional(&self.pool)
        .await?;

        if let Some(stock) = updated {
            return to_u32(stock, "stock");
        }

        // Guard failed: tell a missing product apart from a short one.
        let current: Option<i64> = sqlx::query_scalar("SELECT stock FROM products WHERE id = $1")
            .bind(product_id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        match current {
            None => Err(StoreError::ProductNotFound(product_id.clone())),
            Some(in_stock) => Err(StoreError::InsufficientStock {
                product_id: product_id.clone(),
                requested: quantity,
                in_stock: to_u32(in_stock, "stock")?,
            }),
        }
    }

    async fn increment_stock(&self, product_id: &ProductId, quantity: u32) -> Result<u32> {
        let updated: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE products
            SET stock = stock + $2, available = (stock + $2) > 0
            WHERE id = $1
            RETURNING stock
            "#,
        )
        .bind(product_id.as_str())
        .bind(i64::from(quantity))
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(stock) => to_u32(stock, "stock"),
            None => Err(StoreError::ProductNotFound(product_id.clone())),
        }
    }
}

/// PostgreSQL-backed order store.
#[derive(Debug, Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    /// Creates a new PostgreSQL order store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn row_to_item(row: &PgRow) -> Result<OrderItem> {
        Ok(OrderItem::new(
            row.try_get::<String, _>("product_id")?,
            row.try_get::<String, _>("supplier_id")?,
            row.try_get::<String, _>("product_name")?,
            to_u32(row.try_get("quantity")?, "quantity")?,
            Money::from_cents(row.try_get("unit_price_cents")?),
        ))
    }

    /// Loads the lines of the given orders and assembles the entities,
    /// preserving the order of `rows`.
    async fn assemble(&self, rows: Vec<PgRow>) -> Result<Vec<Order>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = rows
            .iter()
            .map(|row| row.try_get::<Uuid, _>("id"))
            .collect::<std::result::Result<_, _>>()?;

        let item_rows = sqlx::query(
            r#"
            SELECT order_id, product_id, supplier_id, product_name, quantity, unit_price_cents
            FROM order_items
            WHERE order_id = ANY($1)
            ORDER BY order_id, line_no
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut items: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
        for row in &item_rows {
            let order_id: Uuid = row.try_get("order_id")?;
            items.entry(order_id).or_default().push(Self::row_to_item(row)?);
        }

        rows.into_iter()
            .map(|row| {
                let id: Uuid = row.try_get("id")?;
                let status: String = row.try_get("status")?;
                let status: OrderStatus = status
                    .parse()
                    .map_err(|e| StoreError::Corrupt(format!("order {id}: {e}")))?;

                Ok(Order::restore(
                    OrderId::from_uuid(id),
                    CustomerId::new(row.try_get::<String, _>("customer_id")?),
                    items.remove(&id).unwrap_or_default(),
                    status,
                    row.try_get::<DateTime<Utc>, _>("created_at")?,
                    row.try_get::<DateTime<Utc>, _>("updated_at")?,
                    row.try_get::<String, _>("shipping_address")?,
                ))
            })
            .collect()
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    async fn find_by_id(&self, order_id: OrderId) -> Result<Option<Order>> {
        let rows = sqlx::query(
            r#"
            SELECT id, customer_id, status, created_at, updated_at, shipping_address
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        Ok(self.assemble(rows).await?.into_iter().next())
    }

    async fn find_by_customer(&self, customer_id: &CustomerId) -> Result<Vec<Order>> {
        let rows = sqlx::query(
            r#"
            SELECT id, customer_id, status, created_at, updated_at, shipping_address
            FROM orders
            WHERE customer_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(customer_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        self.assemble(rows).await
    }

    async fn find_all(&self) -> Result<Vec<Order>> {
        let rows = sqlx::query(
            r#"
            SELECT id, customer_id, status, created_at, updated_at, shipping_address
            FROM orders
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        self.assemble(rows).await
    }

    async fn save(&self, order: &Order) -> Result<Order> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO orders (id, customer_id, status, created_at, updated_at, shipping_address)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(order.id().as_uuid())
        .bind(order.customer_id().as_str())
        .bind(order.status().as_str())
        .bind(order.created_at())
        .bind(order.updated_at())
        .bind(order.shipping_address())
        .execute(&mut *tx)
        .await?
        .rows_affected()
            == 1;

        if inserted {
            for (line_no, item) in order.items().iter().enumerate() {
                sqlx::query(
                    r#"
                    INSERT INTO order_items (order_id, line_no, product_id, supplier_id, product_name, quantity, unit_price_cents)
                    VALUES ($1, $2, $3, $4, $5, $6, $7)
                    "#,
                )
                .bind(order.id().as_uuid())
                .bind(line_no as i32)
                .bind(item.product_id.as_str())
                .bind(item.supplier_id.as_str())
                .bind(&item.product_name)
                .bind(i64::from(item.quantity))
                .bind(item.unit_price.cents())
                .execute(&mut *tx)
                .await?;
            }
        } else {
            sqlx::query("UPDATE orders SET status = $2, updated_at = $3 WHERE id = $1")
                .bind(order.id().as_uuid())
                .bind(order.status().as_str())
                .bind(order.updated_at())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(order.clone())
    }
}
