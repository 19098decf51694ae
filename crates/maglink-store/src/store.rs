//! Conditional store trait

use async_trait::async_trait;

use crate::attr::Item;
use crate::condition::Condition;
use crate::error::StoreResult;

/// Conditional key-value store keyed by a single primary key.
///
/// Both operations evaluate their condition atomically with the mutation;
/// implementations must guarantee that no other write for the same key is
/// interleaved between evaluation and application. A failed condition is
/// reported as [`StoreError::ConditionFailed`](crate::StoreError), distinct
/// from backend failures.
#[async_trait]
pub trait ConditionalStore: Send + Sync {
    /// Replace the item at `key` with `item` iff `condition` holds over
    /// the current state (which may be absent).
    async fn put(&self, key: &[u8], item: Item, condition: &Condition) -> StoreResult<()>;

    /// Merge `assign` into the existing item at `key` iff `condition`
    /// holds, returning the pre-update image.
    ///
    /// A condition over an absent item that happens to hold still fails
    /// the update: there is nothing to mutate or return.
    async fn update(&self, key: &[u8], assign: Item, condition: &Condition) -> StoreResult<Item>;
}
