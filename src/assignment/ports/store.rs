//! Entity store port for task and user persistence.

use crate::assignment::domain::{EmailAddress, Task, TaskId, User, UserId, WritePlan};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for entity store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Durable document storage for task and user records.
///
/// Lookups are point or filtered reads with no isolation guarantee
/// between calls; [`EntityStore::commit`] is the only mutation entry
/// point and applies a whole [`WritePlan`] atomically — either every
/// write commits or none does, and concurrent commits touching the same
/// documents are serialized against each other.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Finds a task by identifier.
    ///
    /// Returns `None` when the task does not exist.
    async fn find_task(&self, id: TaskId) -> StoreResult<Option<Task>>;

    /// Finds every task whose identifier appears in `ids`.
    ///
    /// Missing identifiers are silently absent from the result; callers
    /// needing per-id verdicts compare against the requested set.
    async fn find_tasks(&self, ids: &[TaskId]) -> StoreResult<Vec<Task>>;

    /// Finds a user by identifier.
    ///
    /// Returns `None` when the user does not exist.
    async fn find_user(&self, id: UserId) -> StoreResult<Option<User>>;

    /// Finds a user by email address.
    ///
    /// Returns `None` when no user holds the address.
    async fn find_user_by_email(&self, email: &EmailAddress) -> StoreResult<Option<User>>;

    /// Applies the whole plan as one atomic, isolated transaction.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateEmail`] when a user write violates
    /// the email unique constraint, [`StoreError::TransactionFailed`]
    /// when the commit loses to a concurrent transaction or is otherwise
    /// rolled back, or [`StoreError::Backend`] for other persistence
    /// failures. In every error case no write from the plan is visible.
    async fn commit(&self, plan: WritePlan) -> StoreResult<()>;
}

/// Errors returned by entity store implementations.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// A user write violated the email unique constraint.
    #[error("email already in use: {0}")]
    DuplicateEmail(EmailAddress),

    /// The transaction was rolled back; no write was applied. The caller
    /// may retry the whole logical operation.
    #[error("transaction failed: {0}")]
    TransactionFailed(Arc<dyn std::error::Error + Send + Sync>),

    /// Persistence-layer failure other than a rolled-back transaction.
    #[error("storage error: {0}")]
    Backend(Arc<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    /// Wraps a commit-time failure.
    pub fn transaction(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::TransactionFailed(Arc::new(err))
    }

    /// Wraps a persistence failure.
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(Arc::new(err))
    }
}

impl From<diesel::result::Error> for StoreError {
    fn from(err: diesel::result::Error) -> Self {
        use diesel::result::{DatabaseErrorKind, Error as DieselError};
        // Unique violations are mapped with their semantic payload at the
        // write site; here only commit-time conflicts are distinguished.
        match &err {
            DieselError::DatabaseError(DatabaseErrorKind::SerializationFailure, _) => {
                Self::transaction(err)
            }
            _ => Self::backend(err),
        }
    }
}
