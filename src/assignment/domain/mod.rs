//! Domain model for bidirectional task-user assignment tracking.
//!
//! The assignment domain models tasks, users, the scalar assignment
//! relation between them, and the write plans that keep both sides of the
//! relation consistent, while keeping all infrastructure concerns outside
//! of the domain boundary.

mod error;
mod ids;
mod plan;
mod task;
mod user;

pub use error::AssignmentDomainError;
pub use ids::{TaskId, UserId};
pub use plan::{Write, WritePlan, pending_diff, task_compensations};
pub use task::{
    Assignment, DEFAULT_DESCRIPTION, PersistedTaskData, Task, TaskName, UNASSIGNED_NAME,
};
pub use user::{EmailAddress, PersistedUserData, User, UserName};
