//! `PostgreSQL` adapters for assignment persistence.

mod models;
mod schema;
mod store;

pub use store::{AssignmentPgPool, PostgresEntityStore};
