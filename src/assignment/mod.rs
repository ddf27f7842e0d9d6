//! Bidirectional task-user assignment tracking.
//!
//! Tasks and users hold two sides of one relation: a task points at no
//! more than one assignee, and every user carries the set of incomplete
//! tasks assigned to it. The coordinator keeps both sides consistent by
//! computing compensating writes for every mutation and committing the
//! whole write plan as one atomic transaction. The module follows
//! hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Validation and coordination services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
