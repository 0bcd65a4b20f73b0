//! Cache store abstraction and the in-process implementation.
//!
//! A store is a map from namespace name to partition, and each partition is a
//! map from [`CacheKey`] to a cached value. The invalidation engine only needs
//! to enumerate partition names, enumerate a partition's keys and remove keys;
//! the read path additionally gets and inserts values.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, RwLock};

use dashmap::DashMap;
use thiserror::Error;
use tracing::debug;

use super::keys::CacheKey;
use super::lock::{rw_read, rw_write};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("cache partition `{0}` does not exist")]
    MissingPartition(String),
    #[error("cache backend failure: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }
}

/// One named partition of the cache.
pub trait CachePartition: Send + Sync {
    type Value: Clone + Send + Sync;

    fn name(&self) -> &str;

    fn keys(&self) -> Result<Vec<CacheKey>, StoreError>;

    fn get(&self, key: &CacheKey) -> Result<Option<Self::Value>, StoreError>;

    fn insert(&self, key: CacheKey, value: Self::Value) -> Result<(), StoreError>;

    /// Remove a single entry; returns whether it was present.
    fn remove(&self, key: &CacheKey) -> Result<bool, StoreError>;

    /// Drop every entry; returns how many were removed.
    fn clear(&self) -> Result<usize, StoreError>;
}

/// Namespace-to-partition map backing the cache.
pub trait CacheStore: Send + Sync {
    type Partition: CachePartition;

    fn partition_names(&self) -> Result<BTreeSet<String>, StoreError>;

    /// Return the partition for `name`, creating an empty one if needed.
    fn partition(&self, name: &str) -> Result<Arc<Self::Partition>, StoreError>;

    /// Return the partition for `name` without creating it.
    fn lookup(&self, name: &str) -> Result<Option<Arc<Self::Partition>>, StoreError>;
}

/// Partition held in process memory.
#[derive(Debug)]
pub struct InMemoryPartition<V> {
    name: String,
    entries: RwLock<HashMap<CacheKey, V>>,
}

impl<V> InMemoryPartition<V> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries, &self.name, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        rw_read(&self.entries, &self.name, "contains").contains_key(key)
    }
}

impl<V: Clone + Send + Sync> CachePartition for InMemoryPartition<V> {
    type Value = V;

    fn name(&self) -> &str {
        &self.name
    }

    fn keys(&self) -> Result<Vec<CacheKey>, StoreError> {
        Ok(rw_read(&self.entries, &self.name, "keys")
            .keys()
            .cloned()
            .collect())
    }

    fn get(&self, key: &CacheKey) -> Result<Option<V>, StoreError> {
        Ok(rw_read(&self.entries, &self.name, "get").get(key).cloned())
    }

    fn insert(&self, key: CacheKey, value: V) -> Result<(), StoreError> {
        rw_write(&self.entries, &self.name, "insert").insert(key, value);
        Ok(())
    }

    fn remove(&self, key: &CacheKey) -> Result<bool, StoreError> {
        Ok(rw_write(&self.entries, &self.name, "remove")
            .remove(key)
            .is_some())
    }

    fn clear(&self) -> Result<usize, StoreError> {
        let mut entries = rw_write(&self.entries, &self.name, "clear");
        let removed = entries.len();
        entries.clear();
        Ok(removed)
    }
}

/// Process-wide store of in-memory partitions.
#[derive(Debug)]
pub struct InMemoryCacheStore<V> {
    partitions: DashMap<String, Arc<InMemoryPartition<V>>>,
}

impl<V> InMemoryCacheStore<V> {
    pub fn new() -> Self {
        Self {
            partitions: DashMap::new(),
        }
    }

    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }
}

impl<V> Default for InMemoryCacheStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone + Send + Sync> CacheStore for InMemoryCacheStore<V> {
    type Partition = InMemoryPartition<V>;

    fn partition_names(&self) -> Result<BTreeSet<String>, StoreError> {
        Ok(self
            .partitions
            .iter()
            .map(|entry| entry.key().clone())
            .collect())
    }

    fn partition(&self, name: &str) -> Result<Arc<InMemoryPartition<V>>, StoreError> {
        if let Some(existing) = self.partitions.get(name) {
            return Ok(Arc::clone(existing.value()));
        }

        let entry = self
            .partitions
            .entry(name.to_string())
            .or_insert_with(|| {
                debug!(namespace = name, "Created cache partition");
                Arc::new(InMemoryPartition::new(name))
            });
        Ok(Arc::clone(entry.value()))
    }

    fn lookup(&self, name: &str) -> Result<Option<Arc<InMemoryPartition<V>>>, StoreError> {
        Ok(self
            .partitions
            .get(name)
            .map(|entry| Arc::clone(entry.value())))
    }
}
