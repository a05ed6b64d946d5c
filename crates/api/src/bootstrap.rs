//! Store wiring from configuration.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use store::{
    CatalogStore, InMemoryCatalogStore, InMemoryOrderStore, JsonFileCatalogStore, OrderStore,
    PostgresCatalogStore, PostgresOrderStore, RoutingTable, StoreError,
};
use thiserror::Error;

use crate::config::{Config, ConfigError, StoreBackend};

/// Errors raised while opening the configured stores.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Database connection failed: {0}")]
    Database(#[from] sqlx::Error),
}

/// The routing table and order store the application runs on.
pub struct Stores {
    pub routing: Arc<RoutingTable>,
    pub orders: Arc<dyn OrderStore>,
}

impl Stores {
    /// In-memory stores for `f1` and `f2` plus an in-memory default.
    pub fn in_memory() -> Self {
        let routing = RoutingTable::builder(Arc::new(InMemoryCatalogStore::named("memory:default")))
            .route("f1", Arc::new(InMemoryCatalogStore::named("memory:f1")))
            .route("f2", Arc::new(InMemoryCatalogStore::named("memory:f2")))
            .build();
        Self {
            routing: Arc::new(routing),
            orders: Arc::new(InMemoryOrderStore::new()),
        }
    }
}

/// Opens every configured store and builds the routing table.
///
/// All PostgreSQL-backed suppliers share one store over one pool, and a
/// JSON file is opened at most once however many keys resolve to it.
/// Orders live in PostgreSQL when `DATABASE_URL` is set, in memory otherwise.
pub async fn build_stores(config: &Config) -> Result<Stores, BootstrapError> {
    let pool = match &config.database_url {
        Some(url) => Some(connect(url).await?),
        None => None,
    };
    let mut opener = StoreOpener {
        config,
        postgres: pool.as_ref().map(|pool| {
            Arc::new(PostgresCatalogStore::new(pool.clone(), "postgres")) as Arc<dyn CatalogStore>
        }),
        json_files: HashMap::new(),
    };

    let default_store = opener.open(config.default_store, "default").await?;
    let mut builder = RoutingTable::builder(default_store);
    for route in &config.supplier_stores {
        let store = opener.open(route.backend, route.supplier_id.as_str()).await?;
        builder = builder.route(route.supplier_id.clone(), store);
    }

    let orders: Arc<dyn OrderStore> = match pool {
        Some(pool) => Arc::new(PostgresOrderStore::new(pool)),
        None => Arc::new(InMemoryOrderStore::new()),
    };

    Ok(Stores {
        routing: Arc::new(builder.build()),
        orders,
    })
}

async fn connect(url: &str) -> Result<PgPool, BootstrapError> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(url)
        .await?;
    store::run_migrations(&pool).await?;
    tracing::info!("Connected to PostgreSQL and applied migrations");
    Ok(pool)
}

/// Opens catalog stores, sharing the ones backed by the same resource.
struct StoreOpener<'a> {
    config: &'a Config,
    postgres: Option<Arc<dyn CatalogStore>>,
    json_files: HashMap<PathBuf, Arc<dyn CatalogStore>>,
}

impl StoreOpener<'_> {
    async fn open(&mut self, backend: StoreBackend, key: &str) -> Result<Arc<dyn CatalogStore>, BootstrapError> {
        let name = format!("{}:{key}", backend.as_str());
        let store: Arc<dyn CatalogStore> = match backend {
            StoreBackend::Memory => Arc::new(InMemoryCatalogStore::named(name)),
            StoreBackend::Json => {
                let path = self.config.catalog_dir.join(format!("{key}.json"));
                match self.json_files.get(&path) {
                    Some(store) => Arc::clone(store),
                    None => {
                        let store: Arc<dyn CatalogStore> =
                            Arc::new(JsonFileCatalogStore::open(path.clone(), name).await?);
                        self.json_files.insert(path, Arc::clone(&store));
                        store
                    }
                }
            }
            StoreBackend::Postgres => {
                Arc::clone(self.postgres.as_ref().ok_or(ConfigError::MissingDatabaseUrl)?)
            }
        };
        tracing::debug!(key, store = store.name(), "Catalog store opened");
        Ok(store)
    }
}
