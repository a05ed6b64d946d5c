//! Demo catalog loaded at startup.

use common::{ProductId, SupplierId};
use domain::{Money, NewProduct};
use placement::{CatalogService, Result};
use store::{CatalogStoreExt, RoutingTable};

struct DemoProduct {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    price_units: i64,
    stock: u32,
    supplier: &'static str,
    category: &'static str,
}

const DEMO_CATALOG: &[DemoProduct] = &[
    DemoProduct {
        id: "P1",
        name: "Laptop Pro X1",
        description: "High performance laptop",
        price_units: 1_500_000,
        stock: 50,
        supplier: "f1",
        category: "Electronics",
    },
    DemoProduct {
        id: "P2",
        name: "Gaming Mouse RGB",
        description: "16000 DPI gaming mouse",
        price_units: 15_000,
        stock: 200,
        supplier: "f1",
        category: "Accessories",
    },
    DemoProduct {
        id: "P3",
        name: "Mechanical Keyboard",
        description: "Cherry MX Red switches",
        price_units: 5_000,
        stock: 100,
        supplier: "f1",
        category: "Accessories",
    },
    DemoProduct {
        id: "P4",
        name: "Smartphone Ultra S23",
        description: "6.7 inch AMOLED display",
        price_units: 900_000,
        stock: 75,
        supplier: "f2",
        category: "Electronics",
    },
    DemoProduct {
        id: "P5",
        name: "Bluetooth Headset Pro",
        description: "Active noise cancelling",
        price_units: 12_000,
        stock: 150,
        supplier: "f2",
        category: "Audio",
    },
    DemoProduct {
        id: "P6",
        name: "Tablet Tab 10",
        description: "10 inch, 128GB",
        price_units: 450_000,
        stock: 60,
        supplier: "f2",
        category: "Electronics",
    },
];

/// Saves the demo products into their suppliers' stores. Products already
/// present are left untouched. Returns the number of products created.
pub async fn seed_demo_catalog(catalog: &CatalogService, routing: &RoutingTable) -> Result<usize> {
    let mut created = 0;
    for demo in DEMO_CATALOG {
        let supplier_id = SupplierId::new(demo.supplier);
        let product_id = ProductId::new(demo.id);
        if routing.resolve(&supplier_id).product_exists(&product_id).await? {
            continue;
        }

        catalog
            .create_product(
                NewProduct::new(demo.name, Money::from_units(demo.price_units), demo.stock, supplier_id)
                    .with_id(product_id)
                    .with_description(demo.description)
                    .with_category(demo.category),
            )
            .await?;
        created += 1;
    }

    tracing::info!(created, "Demo catalog seeded");
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::Stores;

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let stores = Stores::in_memory();
        let catalog = CatalogService::new(stores.routing.clone());

        assert_eq!(seed_demo_catalog(&catalog, &stores.routing).await.unwrap(), 6);
        assert_eq!(seed_demo_catalog(&catalog, &stores.routing).await.unwrap(), 0);

        let f2 = catalog
            .get_products_by_supplier(&SupplierId::new("f2"))
            .await
            .unwrap();
        assert_eq!(f2.len(), 3);
        assert_eq!(catalog.get_all_products().await.unwrap().len(), 6);
    }
}
