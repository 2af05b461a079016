//! Pool identities

use std::fmt;

use crate::ShardingKey;

/// Key under which a connection pool is registered and reused
///
/// A configured pool name and a shard-derived identity live in separate
/// namespaces: `Named("A")` and `Shard("A")` never share a pool.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PoolIdentity {
    /// The pool name from configuration
    Named(String),
    /// Derived from a sharding key's string form
    Shard(String),
}

impl PoolIdentity {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    pub fn shard(key: &ShardingKey) -> Self {
        Self::Shard(key.to_string())
    }

    /// The identity string
    pub fn as_str(&self) -> &str {
        match self {
            Self::Named(name) | Self::Shard(name) => name,
        }
    }

    pub fn is_shard(&self) -> bool {
        matches!(self, Self::Shard(_))
    }
}

impl fmt::Display for PoolIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
