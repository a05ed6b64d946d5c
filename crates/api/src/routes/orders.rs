//! Order placement and management endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use chrono::{DateTime, Utc};
use common::{CustomerId, OrderId};
use domain::{Order, OrderItem, OrderStatus};
use placement::OrderLineRequest;
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::ApiError;

/// Header carrying the authenticated customer identity.
pub const CUSTOMER_HEADER: &str = "x-customer-id";

// -- Request types --

#[derive(Deserialize)]
pub struct PlaceOrderRequest {
    pub items: Vec<OrderLineRequest>,
    pub shipping_address: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateQuery {
    pub status: String,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub customer_id: String,
    pub status: String,
    pub items: Vec<OrderItemResponse>,
    pub total: String,
    pub total_cents: i64,
    pub shipping_address: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct OrderItemResponse {
    pub product_id: String,
    pub supplier_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub total_cents: i64,
}

impl From<&OrderItem> for OrderItemResponse {
    fn from(item: &OrderItem) -> Self {
        Self {
            product_id: item.product_id.to_string(),
            supplier_id: item.supplier_id.to_string(),
            product_name: item.product_name.clone(),
            quantity: item.quantity,
            unit_price_cents: item.unit_price.cents(),
            total_cents: item.total_price().cents(),
        }
    }
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        let total = order.calculate_total();
        Self {
            id: order.id().to_string(),
            customer_id: order.customer_id().to_string(),
            status: order.status().to_string(),
            items: order.items().iter().map(OrderItemResponse::from).collect(),
            total: total.to_string(),
            total_cents: total.cents(),
            shipping_address: order.shipping_address().to_string(),
            created_at: order.created_at(),
            updated_at: order.updated_at(),
        }
    }
}

// -- Handlers --

/// `POST /orders`: place an order for the calling customer.
#[tracing::instrument(skip(state, headers, req))]
pub async fn place(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let customer_id = customer_from_headers(&headers)?;
    let order = state
        .placement
        .place_order(customer_id, req.items, req.shipping_address)
        .await?;
    Ok((StatusCode::CREATED, Json(OrderResponse::from(&order))))
}

/// `GET /orders/{id}`
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state
        .placement
        .get_order_by_id(order_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Order {id} not found")))?;
    Ok(Json(OrderResponse::from(&order)))
}

/// `GET /orders/mine`: the calling customer's orders.
#[tracing::instrument(skip(state, headers))]
pub async fn mine(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let customer_id = customer_from_headers(&headers)?;
    let orders = state.placement.get_orders_by_customer(&customer_id).await?;
    Ok(Json(orders.iter().map(OrderResponse::from).collect()))
}

/// `POST /orders/{id}/cancel`
#[tracing::instrument(skip(state))]
pub async fn cancel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state.placement.cancel_order(order_id).await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// `PATCH /orders/{id}/status?status=SHIPPED`: administrative status overwrite.
#[tracing::instrument(skip(state))]
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<StatusUpdateQuery>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let status: OrderStatus = query
        .status
        .parse()
        .map_err(|e: domain::UnknownStatus| ApiError::BadRequest(e.to_string()))?;
    let order = state.placement.update_order_status(order_id, status).await?;
    Ok(Json(OrderResponse::from(&order)))
}

fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid order ID: {e}")))?;
    Ok(OrderId::from_uuid(uuid))
}

fn customer_from_headers(headers: &HeaderMap) -> Result<CustomerId, ApiError> {
    headers
        .get(CUSTOMER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(CustomerId::new)
        .ok_or_else(|| ApiError::Unauthorized(format!("missing {CUSTOMER_HEADER} header")))
}
