//! Port contracts for assignment persistence.
//!
//! Ports define infrastructure-agnostic interfaces used by assignment
//! services.

pub mod store;

pub use store::{EntityStore, StoreError, StoreResult};
