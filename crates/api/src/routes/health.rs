//! Health check endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Distinct catalog stores behind the routing table, default included.
    pub catalog_stores: usize,
    pub routed_suppliers: Vec<String>,
}

/// `GET /health`: liveness plus the routing table layout.
pub async fn check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let routing = state.placement.routing();
    Json(HealthResponse {
        status: "ok",
        catalog_stores: routing.stores().len(),
        routed_suppliers: routing.suppliers().map(ToString::to_string).collect(),
    })
}
