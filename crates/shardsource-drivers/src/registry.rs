//! Driver registry for managing available database drivers

use shardsource_core::{DataSourceError, DatabaseDriver, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of available database drivers, keyed by driver identifier
pub struct DriverRegistry {
    drivers: HashMap<String, Arc<dyn DatabaseDriver>>,
}

impl DriverRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            drivers: HashMap::new(),
        }
    }

    /// Create a registry with all built-in drivers registered
    pub fn with_defaults() -> Self {
        #[allow(unused_mut)]
        let mut registry = Self::new();

        #[cfg(feature = "sqlite")]
        registry.register(Arc::new(crate::sqlite::SqliteDriver::new()));

        registry
    }

    /// Register a driver under its own name
    pub fn register(&mut self, driver: Arc<dyn DatabaseDriver>) {
        let name = driver.name().to_string();
        self.register_as(&name, driver);
    }

    /// Register a driver under an additional identifier
    ///
    /// Useful when configuration refers to drivers by a legacy or
    /// vendor-qualified name.
    pub fn register_as(&mut self, identifier: &str, driver: Arc<dyn DatabaseDriver>) {
        tracing::info!(driver = %identifier, "registering database driver");
        self.drivers.insert(identifier.to_string(), driver);
    }

    /// Get a driver by identifier
    pub fn get(&self, name: &str) -> Option<Arc<dyn DatabaseDriver>> {
        let driver = self.drivers.get(name).cloned();
        if driver.is_none() {
            tracing::warn!(driver = %name, "driver not found in registry");
        }
        driver
    }

    /// Get a driver by identifier, failing with a driver error when unknown
    pub fn require(&self, name: &str) -> Result<Arc<dyn DatabaseDriver>> {
        self.get(name)
            .ok_or_else(|| DataSourceError::Driver(format!("Unknown driver: {}", name)))
    }

    /// List all registered driver identifiers
    pub fn list(&self) -> Vec<&str> {
        self.drivers.keys().map(|s| s.as_str()).collect()
    }

    /// Check if a driver is registered
    pub fn has(&self, name: &str) -> bool {
        self.drivers.contains_key(name)
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use shardsource_core::{Connection, ConnectionConfig};

    struct NullDriver;

    #[async_trait]
    impl DatabaseDriver for NullDriver {
        fn name(&self) -> &'static str {
            "null"
        }

        async fn connect(&self, _config: &ConnectionConfig) -> Result<Arc<dyn Connection>> {
            Err(DataSourceError::NotSupported("null driver".into()))
        }

        async fn test_connection(&self, _config: &ConnectionConfig) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_register_and_alias() {
        let mut registry = DriverRegistry::new();
        assert!(!registry.has("null"));

        let driver: Arc<dyn DatabaseDriver> = Arc::new(NullDriver);
        registry.register(driver.clone());
        registry.register_as("org.example.NullDriver", driver);

        assert!(registry.has("null"));
        assert!(registry.has("org.example.NullDriver"));
        assert_eq!(registry.list().len(), 2);
        assert_eq!(
            registry.get("org.example.NullDriver").map(|d| d.name()),
            Some("null")
        );
    }

    #[test]
    fn test_require_unknown_driver() {
        let registry = DriverRegistry::new();
        let err = registry.require("oracle").err().expect("unknown driver");
        assert!(matches!(err, DataSourceError::Driver(ref msg) if msg.contains("oracle")));
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn test_defaults_include_sqlite() {
        assert!(DriverRegistry::with_defaults().has("sqlite"));
    }
}
