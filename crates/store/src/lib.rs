//! Storage layer for supplier catalogs and orders.
//!
//! - [`CatalogStore`]: contract every supplier catalog backend satisfies
//! - [`OrderStore`]: contract for order persistence
//! - [`RoutingTable`]: supplier key to catalog store mapping
//! - Adapters: in-memory, JSON flat file, PostgreSQL

pub mod catalog;
pub mod error;
pub mod file;
pub mod memory;
pub mod orders;
pub mod postgres;
pub mod routing;

pub use catalog::{CatalogStore, CatalogStoreExt};
pub use error::{Result, StoreError};
pub use file::JsonFileCatalogStore;
pub use memory::{InMemoryCatalogStore, InMemoryOrderStore};
pub use orders::OrderStore;
pub use postgres::{PostgresCatalogStore, PostgresOrderStore, run_migrations};
pub use routing::{RoutingTable, RoutingTableBuilder};
