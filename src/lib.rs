//! Taskroster: transactional task-user assignment tracking.
//!
//! This crate maintains bidirectional referential integrity between a
//! task's assignment pointer and a user's pending-task membership set
//! across independent create, update, and delete operations, under
//! concurrent access, without ever exposing a state where the two sides
//! disagree.
//!
//! # Architecture
//!
//! Taskroster follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (database, memory)
//!
//! # Modules
//!
//! - [`assignment`]: Assignment consistency validation and coordination

pub mod assignment;
