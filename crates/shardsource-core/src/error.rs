//! Error types for shardsource

use thiserror::Error;

/// Core error type for datasource resolution
#[derive(Error, Debug)]
pub enum DataSourceError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Failed to create pool '{identity}': {source}")]
    PoolCreation {
        identity: String,
        #[source]
        source: Box<DataSourceError>,
    },

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Driver error: {0}")]
    Driver(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Not supported: {0}")]
    NotSupported(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("{0}")]
    Other(String),
}

impl DataSourceError {
    /// Wrap a pool provider failure with the identity it was building
    pub fn pool_creation(identity: impl Into<String>, source: DataSourceError) -> Self {
        Self::PoolCreation {
            identity: identity.into(),
            source: Box::new(source),
        }
    }

    /// Pool identity carried by this error, if any
    pub fn pool_identity(&self) -> Option<&str> {
        match self {
            Self::PoolCreation { identity, .. } => Some(identity),
            _ => None,
        }
    }
}

/// Result type alias for datasource operations
pub type Result<T> = std::result::Result<T, DataSourceError>;
