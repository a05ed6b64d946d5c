//! Catalog product entity and its stock rules.

use common::{ProductId, SupplierId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::money::Money;

/// Errors raised by product rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProductError {
    /// Not enough stock (or the product is unavailable) for the requested quantity.
    #[error("Insufficient stock for product {product_id}: requested {requested}, in stock {in_stock}")]
    InsufficientStock {
        product_id: ProductId,
        requested: u32,
        in_stock: u32,
    },

    /// Product name must not be blank.
    #[error("Product name is required")]
    NameRequired,

    /// Price must not be negative.
    #[error("Invalid price: {price} (must not be negative)")]
    InvalidPrice { price: i64 },
}

/// A product of one supplier's catalog.
///
/// Products are value snapshots: every stock mutation returns a new
/// `Product` and leaves the receiver untouched. `available` always equals
/// `stock > 0` for snapshots produced by this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    name: String,
    #[serde(default)]
    description: Option<String>,
    price: Money,
    stock: u32,
    supplier_id: SupplierId,
    #[serde(default)]
    category: Option<String>,
    available: bool,
}

impl Product {
    /// Rebuilds a product from stored fields. Availability is derived from stock.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: ProductId,
        name: impl Into<String>,
        description: Option<String>,
        price: Money,
        stock: u32,
        supplier_id: SupplierId,
        category: Option<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            description,
            price,
            stock,
            supplier_id,
            category,
            available: stock > 0,
        }
    }

    pub fn id(&self) -> &ProductId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn price(&self) -> Money {
        self.price
    }

    pub fn stock(&self) -> u32 {
        self.stock
    }

    pub fn supplier_id(&self) -> &SupplierId {
        &self.supplier_id
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    /// Returns true if `quantity` units can be sold right now.
    pub fn can_sell(&self, quantity: u32) -> bool {
        self.available && self.stock >= quantity
    }

    /// Returns the snapshot after selling `quantity` units.
    ///
    /// Local mirror of the store-side conditional decrement; the store result
    /// is authoritative.
    pub fn decrease_stock(&self, quantity: u32) -> Result<Product, ProductError> {
        if !self.can_sell(quantity) {
            return Err(ProductError::InsufficientStock {
                product_id: self.id.clone(),
                requested: quantity,
                in_stock: self.stock,
            });
        }
        Ok(self.with_stock(self.stock - quantity))
    }

    /// Returns the snapshot after putting `quantity` units back.
    pub fn increase_stock(&self, quantity: u32) -> Product {
        self.with_stock(self.stock.saturating_add(quantity))
    }

    /// Returns a copy with the given stock level and availability re-derived.
    pub fn with_stock(&self, stock: u32) -> Product {
        Product {
            stock,
            available: stock > 0,
            ..self.clone()
        }
    }
}

/// Input for creating or replacing a catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    /// Existing identity to upsert; a fresh one is assigned when absent.
    pub id: Option<ProductId>,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub stock: u32,
    pub supplier_id: SupplierId,
    pub category: Option<String>,
}

impl NewProduct {
    pub fn new(
        name: impl Into<String>,
        price: Money,
        stock: u32,
        supplier_id: impl Into<SupplierId>,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: None,
            price,
            stock,
            supplier_id: supplier_id.into(),
            category: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<ProductId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Checks the catalog rules for a new product.
    pub fn validate(&self) -> Result<(), ProductError> {
        if self.name.trim().is_empty() {
            return Err(ProductError::NameRequired);
        }
        if self.price.is_negative() {
            return Err(ProductError::InvalidPrice {
                price: self.price.cents(),
            });
        }
        Ok(())
    }

    /// Builds the product snapshot, using the existing id or the given fallback.
    pub fn into_product(self, fallback_id: ProductId) -> Product {
        Product::restore(
            self.id.unwrap_or(fallback_id),
            self.name,
            self.description,
            self.price,
            self.stock,
            self.supplier_id,
            self.category,
        )
    }
}

impl From<Product> for NewProduct {
    fn from(product: Product) -> Self {
        Self {
            id: Some(product.id),
            name: product.name,
            description: product.description,
            price: product.price,
            stock: product.stock,
            supplier_id: product.supplier_id,
            category: product.category,
        }
    }
}
