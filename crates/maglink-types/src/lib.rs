//! Maglink Types - Shared domain types
//!
//! This crate contains domain types used across maglink crates:
//! - User identity and issued secrets
//! - Magic-link token records
//! - Issue/consume outcomes exposed at the lifecycle boundary

pub mod identity;
pub mod record;

pub use identity::*;
pub use record::*;
