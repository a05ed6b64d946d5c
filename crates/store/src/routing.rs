//! Supplier routing table.
//!
//! Maps a supplier key to the catalog store that owns that supplier's
//! products. The table is assembled once at startup and never changes
//! afterwards, so it can be shared behind an `Arc` without locking.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use common::SupplierId;

use crate::CatalogStore;

/// Immutable mapping from supplier key to catalog store, with a fallback.
#[derive(Clone)]
pub struct RoutingTable {
    routes: BTreeMap<SupplierId, Arc<dyn CatalogStore>>,
    default_store: Arc<dyn CatalogStore>,
}

impl RoutingTable {
    /// Starts building a table around the given fallback store.
    pub fn builder(default_store: Arc<dyn CatalogStore>) -> RoutingTableBuilder {
        RoutingTableBuilder {
            routes: BTreeMap::new(),
            default_store,
        }
    }

    /// Returns the store for `supplier_id`, or the default store when the
    /// key is not mapped. Never fails.
    pub fn resolve(&self, supplier_id: &SupplierId) -> Arc<dyn CatalogStore> {
        match self.routes.get(supplier_id) {
            Some(store) => {
                tracing::debug!(%supplier_id, store = store.name(), "Routed supplier");
                Arc::clone(store)
            }
            None => {
                tracing::warn!(
                    %supplier_id,
                    store = self.default_store.name(),
                    "No store mapped for supplier, using default store"
                );
                Arc::clone(&self.default_store)
            }
        }
    }

    /// Returns true if the supplier has an explicit route.
    pub fn is_mapped(&self, supplier_id: &SupplierId) -> bool {
        self.routes.contains_key(supplier_id)
    }

    /// Returns the mapped supplier keys in sorted order.
    pub fn suppliers(&self) -> impl Iterator<Item = &SupplierId> {
        self.routes.keys()
    }

    pub fn default_store(&self) -> &Arc<dyn CatalogStore> {
        &self.default_store
    }

    /// Returns every distinct store, mapped ones first in key order, the
    /// default last. A store shared by several keys appears once.
    pub fn stores(&self) -> Vec<Arc<dyn CatalogStore>> {
        let mut distinct: Vec<Arc<dyn CatalogStore>> = Vec::new();
        for store in self
            .routes
            .values()
            .chain(std::iter::once(&self.default_store))
        {
            if !distinct.iter().any(|seen| same_store(seen, store)) {
                distinct.push(Arc::clone(store));
            }
        }
        distinct
    }
}

impl fmt::Debug for RoutingTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let routes: BTreeMap<&str, &str> = self
            .routes
            .iter()
            .map(|(k, v)| (k.as_str(), v.name()))
            .collect();
        f.debug_struct("RoutingTable")
            .field("routes", &routes)
            .field("default_store", &self.default_store.name())
            .finish()
    }
}

/// Builder for a [`RoutingTable`]. Consumed by [`RoutingTableBuilder::build`].
pub struct RoutingTableBuilder {
    routes: BTreeMap<SupplierId, Arc<dyn CatalogStore>>,
    default_store: Arc<dyn CatalogStore>,
}

impl RoutingTableBuilder {
    /// Routes a supplier to a store. A later route for the same key wins.
    pub fn route(mut self, supplier_id: impl Into<SupplierId>, store: Arc<dyn CatalogStore>) -> Self {
        let supplier_id = supplier_id.into();
        if self.routes.insert(supplier_id.clone(), store).is_some() {
            tracing::warn!(%supplier_id, "Supplier route replaced");
        }
        self
    }

    /// Finalizes the table.
    pub fn build(self) -> RoutingTable {
        tracing::info!(
            routes = self.routes.len(),
            default_store = self.default_store.name(),
            "Routing table built"
        );
        RoutingTable {
            routes: self.routes,
            default_store: self.default_store,
        }
    }
}

fn same_store(a: &Arc<dyn CatalogStore>, b: &Arc<dyn CatalogStore>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryCatalogStore;

    fn store(name: &str) -> Arc<dyn CatalogStore> {
        Arc::new(InMemoryCatalogStore::named(name))
    }

    #[test]
    fn mapped_key_resolves_to_its_store() {
        let f1 = store("memory:f1");
        let table = RoutingTable::builder(store("default"))
            .route("f1", Arc::clone(&f1))
            .route("f2", store("memory:f2"))
            .build();

        assert_eq!(table.resolve(&SupplierId::new("f1")).name(), "memory:f1");
        assert_eq!(table.resolve(&SupplierId::new("f2")).name(), "memory:f2");
        assert!(same_store(&table.resolve(&SupplierId::new("f1")), &f1));
        assert!(table.is_mapped(&SupplierId::new("f1")));
    }

    #[test]
    fn unmapped_key_falls_back_to_default() {
        let table = RoutingTable::builder(store("default"))
            .route("f1", store("memory:f1"))
            .build();

        assert_eq!(table.resolve(&SupplierId::new("f9")).name(), "default");
        assert_eq!(table.resolve(&SupplierId::new("")).name(), "default");
        assert!(!table.is_mapped(&SupplierId::new("f9")));
    }

    #[test]
    fn resolve_is_deterministic() {
        let table = RoutingTable::builder(store("default"))
            .route("f1", store("memory:f1"))
            .build();

        let first = table.resolve(&SupplierId::new("f1"));
        for _ in 0..10 {
            assert!(same_store(&first, &table.resolve(&SupplierId::new("f1"))));
        }
    }

    #[test]
    fn later_route_replaces_earlier() {
        let table = RoutingTable::builder(store("default"))
            .route("f1", store("first"))
            .route("f1", store("second"))
            .build();

        assert_eq!(table.resolve(&SupplierId::new("f1")).name(), "second");
        assert_eq!(table.suppliers().count(), 1);
    }

    #[test]
    fn stores_are_distinct() {
        let shared = store("shared");
        let table = RoutingTable::builder(Arc::clone(&shared))
            .route("f1", Arc::clone(&shared))
            .route("f2", store("memory:f2"))
            .route("f3", Arc::clone(&shared))
            .build();

        let names: Vec<String> = table.stores().iter().map(|s| s.name().to_string()).collect();
        assert_eq!(names, vec!["shared", "memory:f2"]);
    }

    #[test]
    fn debug_lists_routes() {
        let table = RoutingTable::builder(store("default"))
            .route("f1", store("memory:f1"))
            .build();
        let debug = format!("{table:?}");
        assert!(debug.contains("memory:f1"));
        assert!(debug.contains("default"));
    }
}
