//! Shared helpers for datasource integration tests

use std::collections::HashMap;
use std::sync::{Arc, Once};

use shardsource_connection::{DataSource, PoolRegistry};
use shardsource_core::{DataSourceDescriptor, Result};
use shardsource_drivers::DriverRegistry;

/// Install a test-friendly tracing subscriber once per test binary
pub fn initialize_logging() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::from_default_env()
                    .add_directive("shardsource=debug".parse().unwrap())
                    .add_directive("shardsource_connection=debug".parse().unwrap()),
            )
            .with_test_writer()
            .finish();

        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}

pub fn properties(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Build a SQLite-backed datasource over its own pool registry
pub fn sqlite_datasource(pairs: &[(&str, &str)]) -> Result<(DataSource, Arc<PoolRegistry>)> {
    initialize_logging();

    let mut props = properties(pairs);
    props.entry("driver".into()).or_insert_with(|| "sqlite".into());

    let registry = Arc::new(PoolRegistry::new());
    let descriptor = DataSourceDescriptor::from_properties(props)?;
    let datasource =
        DataSource::with_registry(descriptor, &DriverRegistry::with_defaults(), registry.clone())?;
    Ok((datasource, registry))
}
