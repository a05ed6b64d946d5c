//! API server entry point.

use std::sync::Arc;

use api::bootstrap::build_stores;
use api::config::{Config, LogFormat};
use api::{AppState, seed};
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

fn describe_metrics() {
    metrics::describe_counter!("placement_orders_total", "Order placement attempts");
    metrics::describe_counter!("placement_orders_confirmed", "Orders placed and persisted");
    metrics::describe_counter!(
        "placement_orders_failed",
        "Order placements that failed, by reason"
    );
    metrics::describe_counter!(
        "placement_compensations_total",
        "Placements that restored committed stock"
    );
    metrics::describe_counter!(
        "placement_compensation_failed_total",
        "Compensations that left stock unrestored"
    );
    metrics::describe_counter!(
        "store_stock_decrements_total",
        "Successful stock decrements, by catalog store"
    );
    metrics::describe_histogram!(
        "placement_duration_seconds",
        "Time spent placing an order"
    );
}

#[tokio::main]
async fn main() {
    // 1. Load configuration
    let config = Config::from_env().expect("invalid configuration");

    // 2. Initialize tracing
    init_tracing(&config);

    // 3. Install Prometheus metrics recorder
    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");
    describe_metrics();

    // 4. Open stores and build the routing table
    let stores = build_stores(&config)
        .await
        .expect("failed to open catalog stores");
    tracing::info!(routing = ?stores.routing, "routing table built");
    let state = Arc::new(AppState::from_stores(stores));

    // 5. Load the demo catalog
    if config.seed_demo_data {
        seed::seed_demo_catalog(&state.catalog, state.placement.routing())
            .await
            .expect("failed to seed demo catalog");
    }

    // 6. Build the application
    let app = api::create_app(state, metrics_handle);

    // 7. Start server
    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("server shut down gracefully");
}
