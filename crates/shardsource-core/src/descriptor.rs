//! Datasource configuration descriptors
//!
//! A descriptor is the validated, immutable form of the flat property bag a
//! configuration layer supplies for one logical datasource.

use std::collections::HashMap;

use serde::Deserialize;

use crate::{DataSourceError, Result};

/// Property keys recognized in a datasource property bag
pub mod keys {
    pub const URL: &str = "url";
    pub const DRIVER: &[&str] = &["driverClassName", "driver"];
    pub const POOL: &[&str] = &["poolname", "pool"];
    pub const USE_SHARDING: &str = "useSharding";
    pub const USERNAME: &[&str] = &["username", "user"];
    pub const PASSWORD: &str = "password";
}

/// Validated configuration for one logical datasource
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "HashMap<String, String>")]
pub struct DataSourceDescriptor {
    url_template: String,
    driver: String,
    pool_name: Option<String>,
    sharding_enabled: bool,
    username: Option<String>,
    password: Option<String>,
    properties: HashMap<String, String>,
}

impl DataSourceDescriptor {
    /// Build a descriptor from a property bag
    ///
    /// Fails when `url` or the driver identifier is missing or empty, or when
    /// a pool key is present without a name. Every property, recognized or
    /// not, is kept in the bag for the pool provider.
    pub fn from_properties(properties: HashMap<String, String>) -> Result<Self> {
        let url_template = properties
            .get(keys::URL)
            .filter(|url| !url.trim().is_empty())
            .cloned()
            .ok_or_else(|| {
                DataSourceError::Configuration(
                    "no valid 'url' is defined in the datasource properties".into(),
                )
            })?;

        let driver = first_of(&properties, keys::DRIVER)
            .filter(|driver| !driver.trim().is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                DataSourceError::Configuration(
                    "no valid 'driverClassName' or 'driver' is defined in the datasource properties"
                        .into(),
                )
            })?;

        let pool_name = match first_of(&properties, keys::POOL) {
            Some(name) if name.trim().is_empty() => {
                return Err(DataSourceError::Configuration(
                    "pooling is requested but the pool name is empty".into(),
                ));
            }
            Some(name) => Some(name.to_string()),
            None => None,
        };

        let sharding_enabled = properties
            .get(keys::USE_SHARDING)
            .is_some_and(|flag| flag.trim().eq_ignore_ascii_case("true"));

        if sharding_enabled && !url_template.contains(crate::SHARDING_KEY_PLACEHOLDER) {
            tracing::warn!(
                driver = %driver,
                "sharding is enabled but the url does not reference the sharding key"
            );
        }

        let username = first_of(&properties, keys::USERNAME)
            .filter(|user| !user.is_empty())
            .map(str::to_string);
        let password = properties.get(keys::PASSWORD).cloned();

        Ok(Self {
            url_template,
            driver,
            pool_name,
            sharding_enabled,
            username,
            password,
            properties,
        })
    }

    /// Convenience constructor over key/value pairs
    pub fn from_pairs<K, V, I>(pairs: I) -> Result<Self>
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self::from_properties(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn url_template(&self) -> &str {
        &self.url_template
    }

    pub fn driver(&self) -> &str {
        &self.driver
    }

    pub fn pool_name(&self) -> Option<&str> {
        self.pool_name.as_deref()
    }

    pub fn sharding_enabled(&self) -> bool {
        self.sharding_enabled
    }

    /// Default username
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Default password
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// The full property bag
    pub fn properties(&self) -> &HashMap<String, String> {
        &self.properties
    }

    /// Look up a single property
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}

impl TryFrom<HashMap<String, String>> for DataSourceDescriptor {
    type Error = DataSourceError;

    fn try_from(properties: HashMap<String, String>) -> Result<Self> {
        Self::from_properties(properties)
    }
}

fn first_of<'a>(properties: &'a HashMap<String, String>, aliases: &[&str]) -> Option<&'a str> {
    aliases
        .iter()
        .find_map(|key| properties.get(*key))
        .map(String::as_str)
}
