//! HTTP API for the supplier catalog and order placement system.
//!
//! Provides REST endpoints for the merged catalog and for placing and
//! managing orders, with structured logging (tracing) and Prometheus
//! metrics.

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod routes;
pub mod seed;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, patch, post};
use metrics_exporter_prometheus::PrometheusHandle;
use placement::{CatalogService, OrderPlacement};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use bootstrap::Stores;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub placement: OrderPlacement,
    pub catalog: CatalogService,
}

impl AppState {
    /// Builds the services over the given stores.
    pub fn from_stores(stores: Stores) -> Self {
        Self {
            placement: OrderPlacement::new(stores.routing.clone(), stores.orders),
            catalog: CatalogService::new(stores.routing),
        }
    }
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/products",
            get(routes::products::list).post(routes::products::create),
        )
        .route("/products/{id}", get(routes::products::get))
        .route(
            "/products/supplier/{supplier_id}",
            get(routes::products::by_supplier),
        )
        .route(
            "/products/category/{category}",
            get(routes::products::by_category),
        )
        .route("/orders", post(routes::orders::place))
        .route("/orders/mine", get(routes::orders::mine))
        .route("/orders/{id}", get(routes::orders::get))
        .route("/orders/{id}/cancel", post(routes::orders::cancel))
        .route("/orders/{id}/status", patch(routes::orders::update_status))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates application state over in-memory stores for suppliers `f1` and `f2`.
pub fn create_default_state() -> Arc<AppState> {
    Arc::new(AppState::from_stores(Stores::in_memory()))
}
