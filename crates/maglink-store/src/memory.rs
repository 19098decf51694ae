//! In-memory conditional store
//!
//! Backend for tests and local development. Condition evaluation and the
//! mutation it guards happen under the map's per-key entry lock, so
//! concurrent callers race exactly as they would against a remote
//! conditional store: one wins, the rest observe a failed condition.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::attr::Item;
use crate::condition::Condition;
use crate::error::{StoreError, StoreResult};
use crate::store::ConditionalStore;

/// In-memory conditional key-value store
#[derive(Default, Clone)]
pub struct MemoryStore {
    items: Arc<DashMap<Vec<u8>, Item>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Read an item without any condition, for test assertions
    pub fn get(&self, key: &[u8]) -> Option<Item> {
        self.items.get(key).map(|r| r.value().clone())
    }

    /// Insert an item unconditionally, for seeding test fixtures
    pub fn insert_raw(&self, key: impl Into<Vec<u8>>, item: Item) {
        self.items.insert(key.into(), item);
    }
}

#[async_trait]
impl ConditionalStore for MemoryStore {
    async fn put(&self, key: &[u8], item: Item, condition: &Condition) -> StoreResult<()> {
        // entry() holds the shard lock for the key across check and write
        match self.items.entry(key.to_vec()) {
            Entry::Occupied(mut occupied) => {
                if !condition.eval(Some(occupied.get())) {
                    return Err(StoreError::ConditionFailed);
                }
                occupied.insert(item);
            }
            Entry::Vacant(vacant) => {
                if !condition.eval(None) {
                    return Err(StoreError::ConditionFailed);
                }
                vacant.insert(item);
            }
        }
        Ok(())
    }

    async fn update(&self, key: &[u8], assign: Item, condition: &Condition) -> StoreResult<Item> {
        match self.items.entry(key.to_vec()) {
            Entry::Occupied(mut occupied) => {
                if !condition.eval(Some(occupied.get())) {
                    return Err(StoreError::ConditionFailed);
                }
                let previous = occupied.get().clone();
                occupied.get_mut().extend(assign);
                Ok(previous)
            }
            Entry::Vacant(_) => Err(StoreError::ConditionFailed),
        }
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("items", &self.items.len())
            .finish()
    }
}
