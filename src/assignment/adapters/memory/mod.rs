//! In-memory entity store for assignment tests.

mod store;

pub use store::{InMemoryEntityStore, InjectedCommitFailure};
