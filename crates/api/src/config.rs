//! Application configuration loaded from environment variables.

use std::path::PathBuf;
use std::str::FromStr;

use common::SupplierId;
use thiserror::Error;

/// Errors raised while reading configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid PORT: {0}")]
    InvalidPort(String),

    #[error("Invalid LOG_FORMAT: {0} (expected 'pretty' or 'json')")]
    InvalidLogFormat(String),

    #[error("Unknown store backend '{0}' (expected 'memory', 'json' or 'postgres')")]
    UnknownBackend(String),

    #[error("Malformed SUPPLIER_STORES entry '{0}' (expected 'supplier=backend')")]
    MalformedSupplierEntry(String),

    #[error("Supplier '{0}' is mapped more than once")]
    DuplicateSupplier(String),

    #[error("DATABASE_URL is required when a postgres store is configured")]
    MissingDatabaseUrl,
}

/// Storage technology behind a catalog store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Json,
    Postgres,
}

impl StoreBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreBackend::Memory => "memory",
            StoreBackend::Json => "json",
            StoreBackend::Postgres => "postgres",
        }
    }
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "json" => Ok(StoreBackend::Json),
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// One `supplier=backend` route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupplierStore {
    pub supplier_id: SupplierId,
    pub backend: StoreBackend,
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `pretty` or `json` (default: `pretty`)
/// - `DATABASE_URL`: PostgreSQL URL, required by `postgres` stores
/// - `CATALOG_DIR`: directory of the JSON catalog files (default: `./data`)
/// - `SUPPLIER_STORES`: routes as `f1=memory,f2=json` (default: `f1=memory,f2=memory`)
/// - `DEFAULT_STORE`: backend of the fallback store (default: `memory`)
/// - `SEED_DEMO_DATA`: load the demo catalog at startup (default: `true`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub database_url: Option<String>,
    pub catalog_dir: PathBuf,
    pub supplier_stores: Vec<SupplierStore>,
    pub default_store: StoreBackend,
    pub seed_demo_data: bool,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = match lookup("PORT") {
            Some(p) => p.trim().parse().map_err(|_| ConfigError::InvalidPort(p))?,
            None => defaults.port,
        };

        let log_format = match lookup("LOG_FORMAT") {
            Some(f) => match f.trim().to_ascii_lowercase().as_str() {
                "pretty" | "text" => LogFormat::Pretty,
                "json" => LogFormat::Json,
                _ => return Err(ConfigError::InvalidLogFormat(f)),
            },
            None => defaults.log_format,
        };

        let supplier_stores = match lookup("SUPPLIER_STORES") {
            Some(raw) => parse_supplier_stores(&raw)?,
            None => defaults.supplier_stores,
        };

        let default_store = match lookup("DEFAULT_STORE") {
            Some(raw) => raw.parse()?,
            None => defaults.default_store,
        };

        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        let config = Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port,
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            log_format,
            database_url,
            catalog_dir: lookup("CATALOG_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.catalog_dir),
            supplier_stores,
            default_store,
            seed_demo_data: lookup("SEED_DEMO_DATA")
                .map(|v| !matches!(v.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no"))
                .unwrap_or(defaults.seed_demo_data),
        };

        if config.needs_database() && config.database_url.is_none() {
            return Err(ConfigError::MissingDatabaseUrl);
        }
        Ok(config)
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns true if any catalog store is backed by PostgreSQL.
    pub fn needs_database(&self) -> bool {
        self.default_store == StoreBackend::Postgres
            || self
                .supplier_stores
                .iter()
                .any(|s| s.backend == StoreBackend::Postgres)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            database_url: None,
            catalog_dir: PathBuf::from("./data"),
            supplier_stores: vec![
                SupplierStore {
                    supplier_id: SupplierId::new("f1"),
                    backend: StoreBackend::Memory,
                },
                SupplierStore {
                    supplier_id: SupplierId::new("f2"),
                    backend: StoreBackend::Memory,
                },
            ],
            default_store: StoreBackend::Memory,
            seed_demo_data: true,
        }
    }
}

/// Parses `f1=memory, f2=json`. Empty entries are skipped.
pub fn parse_supplier_stores(raw: &str) -> Result<Vec<SupplierStore>, ConfigError> {
    let mut stores: Vec<SupplierStore> = Vec::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (supplier, backend) = entry
            .split_once('=')
            .map(|(s, b)| (s.trim(), b.trim()))
            .filter(|(s, b)| !s.is_empty() && !b.is_empty())
            .ok_or_else(|| ConfigError::MalformedSupplierEntry(entry.to_string()))?;

        if stores.iter().any(|s| s.supplier_id.as_str() == supplier) {
            return Err(ConfigError::DuplicateSupplier(supplier.to_string()));
        }
        stores.push(SupplierStore {
            supplier_id: SupplierId::new(supplier),
            backend: backend.parse()?,
        });
    }
    Ok(stores)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_values() {
        let config = load(&[]).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.catalog_dir, PathBuf::from("./data"));
        assert_eq!(config.supplier_stores.len(), 2);
        assert_eq!(config.default_store, StoreBackend::Memory);
        assert!(config.seed_demo_data);
        assert!(!config.needs_database());
    }

    #[test]
    fn test_addr_formatting() {
        let config = load(&[("HOST", "127.0.0.1"), ("PORT", "8080")]).unwrap();
        assert_eq!(config.addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_invalid_port() {
        assert_eq!(
            load(&[("PORT", "http")]).unwrap_err(),
            ConfigError::InvalidPort("http".into())
        );
    }

    #[test]
    fn test_supplier_stores_parsing() {
        let stores = parse_supplier_stores(" f1=memory , f2=JSON,,f3=postgres").unwrap();
        assert_eq!(stores.len(), 3);
        assert_eq!(stores[1].supplier_id.as_str(), "f2");
        assert_eq!(stores[1].backend, StoreBackend::Json);
        assert_eq!(stores[2].backend, StoreBackend::Postgres);

        assert!(parse_supplier_stores("").unwrap().is_empty());
    }

    #[test]
    fn test_supplier_stores_errors() {
        assert_eq!(
            parse_supplier_stores("f1").unwrap_err(),
            ConfigError::MalformedSupplierEntry("f1".into())
        );
        assert_eq!(
            parse_supplier_stores("f1=mongo").unwrap_err(),
            ConfigError::UnknownBackend("mongo".into())
        );
        assert_eq!(
            parse_supplier_stores("f1=memory,f1=json").unwrap_err(),
            ConfigError::DuplicateSupplier("f1".into())
        );
    }

    #[test]
    fn test_postgres_requires_database_url() {
        assert_eq!(
            load(&[("SUPPLIER_STORES", "f1=postgres")]).unwrap_err(),
            ConfigError::MissingDatabaseUrl
        );

        let config = load(&[
            ("SUPPLIER_STORES", "f1=postgres"),
            ("DATABASE_URL", "postgres://localhost/catalog"),
        ])
        .unwrap();
        assert!(config.needs_database());
    }

    #[test]
    fn test_log_format_and_seed_flag() {
        let config = load(&[("LOG_FORMAT", "json"), ("SEED_DEMO_DATA", "false")]).unwrap();
        assert_eq!(config.log_format, LogFormat::Json);
        assert!(!config.seed_demo_data);

        assert!(matches!(
            load(&[("LOG_FORMAT", "xml")]),
            Err(ConfigError::InvalidLogFormat(_))
        ));
    }
}
