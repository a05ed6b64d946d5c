//! Catalog endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{ProductId, SupplierId};
use domain::{Money, NewProduct, Product};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::ApiError;

// -- Request types --

#[derive(Deserialize)]
pub struct CreateProductRequest {
    pub id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub stock: u32,
    pub supplier_id: String,
    pub category: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub price: String,
    pub price_cents: i64,
    pub stock: u32,
    pub supplier_id: String,
    pub category: Option<String>,
    pub available: bool,
}

impl From<&Product> for ProductResponse {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id().to_string(),
            name: product.name().to_string(),
            description: product.description().map(str::to_string),
            price: product.price().to_string(),
            price_cents: product.price().cents(),
            stock: product.stock(),
            supplier_id: product.supplier_id().to_string(),
            category: product.category().map(str::to_string),
            available: product.is_available(),
        }
    }
}

fn to_responses(products: &[Product]) -> Vec<ProductResponse> {
    products.iter().map(ProductResponse::from).collect()
}

// -- Handlers --

/// `GET /products`: every product of every store.
#[tracing::instrument(skip(state))]
pub async fn list(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let products = state.catalog.get_all_products().await?;
    Ok(Json(to_responses(&products)))
}

/// `GET /products/{id}`
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = state
        .catalog
        .get_product(&ProductId::new(id.as_str()))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Product {id} not found")))?;
    Ok(Json(ProductResponse::from(&product)))
}

/// `GET /products/supplier/{supplier_id}`
#[tracing::instrument(skip(state))]
pub async fn by_supplier(
    State(state): State<Arc<AppState>>,
    Path(supplier_id): Path<String>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let products = state
        .catalog
        .get_products_by_supplier(&SupplierId::new(supplier_id))
        .await?;
    Ok(Json(to_responses(&products)))
}

/// `GET /products/category/{category}`
#[tracing::instrument(skip(state))]
pub async fn by_category(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let products = state.catalog.get_products_by_category(&category).await?;
    Ok(Json(to_responses(&products)))
}

/// `POST /products`: create or replace a product in its supplier's store.
#[tracing::instrument(skip(state, req), fields(supplier_id = %req.supplier_id))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    if req.supplier_id.trim().is_empty() {
        return Err(ApiError::BadRequest("supplier_id is required".to_string()));
    }

    let mut product = NewProduct::new(
        req.name,
        Money::from_cents(req.price_cents),
        req.stock,
        req.supplier_id,
    );
    product.id = req.id.filter(|id| !id.trim().is_empty()).map(ProductId::new);
    product.description = req.description;
    product.category = req.category;

    let saved = state.catalog.create_product(product).await?;
    Ok((StatusCode::CREATED, Json(ProductResponse::from(&saved))))
}
