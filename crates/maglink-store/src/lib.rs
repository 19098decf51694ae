//! Maglink Store - conditional key-value store contract
//!
//! The auth core enforces every concurrency invariant through a single
//! server-evaluated conditional write, never through read-then-write
//! sequences. This crate defines that contract:
//!
//! - [`AttrValue`] / [`Item`]: loosely-typed stored items, so readers can
//!   (and must) validate shapes on the way out
//! - [`Condition`]: the predicate evaluated against the current item state
//! - [`ConditionalStore`]: `put` / `update` with a distinguishable
//!   condition-failed signal
//! - [`MemoryStore`]: an in-memory backend with per-key atomicity, used by
//!   tests and local development

pub mod attr;
pub mod condition;
pub mod error;
pub mod memory;
pub mod store;

pub use attr::{AttrValue, Item};
pub use condition::Condition;
pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use store::ConditionalStore;
