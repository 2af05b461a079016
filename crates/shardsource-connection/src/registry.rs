//! Process-wide pool registry
//!
//! Maps a [`PoolIdentity`] to the pool handle created for it. Creation runs at
//! most once per identity: callers racing on the same identity serialize on a
//! lock scoped to that identity, while unrelated identities create in
//! parallel. Created handles live in a concurrent map, so lookups after
//! creation never touch the creation locks.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, LazyLock};

use dashmap::DashMap;
use parking_lot::Mutex;
use shardsource_core::{PoolIdentity, Result};

use crate::pool::ConnectionPool;

static GLOBAL_REGISTRY: LazyLock<Arc<PoolRegistry>> =
    LazyLock::new(|| Arc::new(PoolRegistry::new()));

/// Registry of pool handles keyed by identity
///
/// Entries are never replaced or evicted; tearing a pool down is done through
/// the handle itself.
pub struct PoolRegistry<H = ConnectionPool> {
    pools: DashMap<PoolIdentity, H>,
    creation_locks: Mutex<HashMap<PoolIdentity, Arc<tokio::sync::Mutex<()>>>>,
}

impl PoolRegistry<ConnectionPool> {
    /// The registry shared by every datasource that does not bring its own
    pub fn global() -> Arc<PoolRegistry> {
        GLOBAL_REGISTRY.clone()
    }
}

impl<H: Clone + Send + Sync + 'static> PoolRegistry<H> {
    pub fn new() -> Self {
        Self {
            pools: DashMap::new(),
            creation_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Look up an already-created handle
    pub fn get(&self, identity: &PoolIdentity) -> Option<H> {
        self.pools.get(identity).map(|entry| entry.value().clone())
    }

    /// Return the handle for `identity`, running `create` if there is none yet
    ///
    /// Concurrent callers for the same identity wait for the one running
    /// `create` and then observe its handle. A failed `create` records
    /// nothing, so the next caller tries again.
    pub async fn get_or_create<F, Fut>(&self, identity: &PoolIdentity, create: F) -> Result<H>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<H>>,
    {
        if let Some(handle) = self.get(identity) {
            tracing::trace!(identity = %identity, "reusing registered pool");
            return Ok(handle);
        }

        let lock = self.creation_lock(identity);
        let guard = lock.lock().await;

        if let Some(handle) = self.get(identity) {
            tracing::debug!(identity = %identity, "pool created by a concurrent caller");
            drop(guard);
            self.release_creation_lock(identity, lock);
            return Ok(handle);
        }

        match create().await {
            Ok(handle) => {
                self.pools.insert(identity.clone(), handle.clone());
                // Late waiters still hold a clone of the lock and re-check the map.
                self.creation_locks.lock().remove(identity);

                tracing::info!(
                    identity = %identity,
                    shard = identity.is_shard(),
                    "pool registered"
                );
                Ok(handle)
            }
            Err(e) => {
                tracing::warn!(identity = %identity, error = %e, "pool creation failed");
                drop(guard);
                self.release_creation_lock(identity, lock);
                Err(e)
            }
        }
    }

    fn creation_lock(&self, identity: &PoolIdentity) -> Arc<tokio::sync::Mutex<()>> {
        self.creation_locks
            .lock()
            .entry(identity.clone())
            .or_default()
            .clone()
    }

    /// Give up this caller's clone of the creation lock, dropping the map
    /// entry when no other caller holds it
    ///
    /// A caller already holding a clone must find the same lock as any later
    /// caller. Clones of a mapped lock are taken in `creation_lock` and given
    /// back here, both under the map lock, so the count check cannot race.
    fn release_creation_lock(
        &self,
        identity: &PoolIdentity,
        lock: Arc<tokio::sync::Mutex<()>>,
    ) {
        let mut locks = self.creation_locks.lock();
        let unshared = locks
            .get(identity)
            .is_some_and(|current| Arc::ptr_eq(current, &lock))
            && Arc::strong_count(&lock) == 2;
        if unshared {
            locks.remove(identity);
        }
        drop(lock);
    }

    pub fn contains(&self, identity: &PoolIdentity) -> bool {
        self.pools.contains_key(identity)
    }

    /// Identities with a registered pool
    pub fn identities(&self) -> Vec<PoolIdentity> {
        self.pools.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }
}

impl<H: Clone + Send + Sync + 'static> Default for PoolRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}
