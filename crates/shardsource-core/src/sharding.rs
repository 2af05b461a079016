//! Sharding keys
//!
//! A sharding key names the partition a connection should target. It is an
//! opaque typed value; the resolver only ever looks at its string form.

use crate::{DataSourceError, Result, Value};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Type tag attached to a sharding subkey
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShardingKeyType {
    Char,
    Varchar,
    Integer,
    BigInt,
    Numeric,
    Date,
    Timestamp,
}

/// An immutable sharding key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShardingKey {
    value: Value,
    value_type: ShardingKeyType,
}

impl ShardingKey {
    /// Create a key directly from a value and its type tag
    pub fn new(value: impl Into<Value>, value_type: ShardingKeyType) -> Self {
        Self {
            value: value.into(),
            value_type,
        }
    }

    /// Start building a key
    pub fn builder() -> ShardingKeyBuilder {
        ShardingKeyBuilder::default()
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn value_type(&self) -> ShardingKeyType {
        self.value_type
    }
}

impl fmt::Display for ShardingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value.fmt(f)
    }
}

/// Builder producing a [`ShardingKey`] from a subkey and its type
///
/// Only the last subkey given is kept.
#[derive(Debug, Clone, Default)]
pub struct ShardingKeyBuilder {
    subkey: Option<(Value, ShardingKeyType)>,
}

impl ShardingKeyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the subkey value and its type tag
    pub fn subkey(mut self, value: impl Into<Value>, value_type: ShardingKeyType) -> Self {
        self.subkey = Some((value.into(), value_type));
        self
    }

    /// Build the key
    ///
    /// Fails when no subkey was supplied or the subkey is NULL, since such a
    /// key has no string form to route on.
    pub fn build(self) -> Result<ShardingKey> {
        match self.subkey {
            Some((value, _)) if value.is_null() => Err(DataSourceError::Configuration(
                "sharding key subkey must not be NULL".into(),
            )),
            Some((value, value_type)) => Ok(ShardingKey { value, value_type }),
            None => Err(DataSourceError::Configuration(
                "sharding key requires a subkey".into(),
            )),
        }
    }
}
