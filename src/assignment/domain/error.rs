//! Error types for assignment domain construction.

use thiserror::Error;

/// Errors returned while constructing domain task and user values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AssignmentDomainError {
    /// The task name is empty after trimming.
    #[error("task name must not be empty")]
    EmptyTaskName,

    /// The user name is empty after trimming.
    #[error("user name must not be empty")]
    EmptyUserName,

    /// The email address is empty after trimming.
    #[error("email address must not be empty")]
    EmptyEmail,
}
