//! Read-only validation of proposed assignments.
//!
//! The validator checks a proposed assignment against the current store
//! state and returns structured verdicts carrying the offending
//! identifiers. It never mutates state and never uses errors for
//! control flow beyond reporting a rejection.

use crate::assignment::{
    domain::{Task, TaskId, User, UserId},
    ports::{EntityStore, StoreError},
};
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;

/// Result type for validator operations.
pub type ValidatorResult<T> = Result<T, ValidatorError>;

/// Rejection verdicts produced by assignment validation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// The proposed assignee does not exist.
    #[error("assigned user not found: {0}")]
    AssigneeNotFound(UserId),

    /// The caller-supplied display name does not match the assignee.
    #[error("assigned user name '{provided}' does not match '{expected}'")]
    AssigneeNameMismatch {
        /// The name supplied by the caller.
        provided: String,
        /// The resolved user's actual name.
        expected: String,
    },

    /// One or more claimed tasks do not exist.
    #[error("one or more pending tasks not found: {}", format_ids(.0))]
    TasksNotFound(Vec<TaskId>),

    /// One or more claimed tasks are already completed.
    #[error("one or more pending tasks already completed: {}", format_ids(.0))]
    TasksAlreadyCompleted(Vec<TaskId>),

    /// One or more claimed tasks are assigned to another user.
    #[error("one or more tasks already assigned to another user: {}", format_ids(.0))]
    TasksAssignedElsewhere(Vec<TaskId>),
}

fn format_ids(ids: &[TaskId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors returned by validator operations.
#[derive(Debug, Clone, Error)]
pub enum ValidatorError {
    /// The proposed assignment was rejected.
    #[error(transparent)]
    Rejected(#[from] ValidationError),

    /// A store lookup failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Read-only assignment validator over an entity store.
#[derive(Debug)]
pub struct AssignmentValidator<S> {
    store: Arc<S>,
}

impl<S> Clone for AssignmentValidator<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> AssignmentValidator<S>
where
    S: EntityStore,
{
    /// Creates a validator reading from the given store.
    #[must_use]
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Resolves a proposed assignee to its current user record.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::AssigneeNotFound`] when the user does
    /// not exist, or a store error when the lookup fails.
    pub async fn resolve_assignee(&self, user_id: UserId) -> ValidatorResult<User> {
        let user = self.store.find_user(user_id).await?;
        user.ok_or_else(|| ValidationError::AssigneeNotFound(user_id).into())
    }

    /// Validates a batch of tasks a user wants to claim.
    ///
    /// Every claimed task must exist, be incomplete, and be unassigned or
    /// already assigned to `owner` (idempotent re-claim). Checks run in
    /// that order and the first failing check rejects the whole batch
    /// with the offending identifiers.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::TasksNotFound`],
    /// [`ValidationError::TasksAlreadyCompleted`], or
    /// [`ValidationError::TasksAssignedElsewhere`] with the offending id
    /// list, or a store error when the lookup fails.
    pub async fn validate_task_batch(
        &self,
        task_ids: &BTreeSet<TaskId>,
        owner: Option<UserId>,
    ) -> ValidatorResult<Vec<Task>> {
        let ids: Vec<TaskId> = task_ids.iter().copied().collect();
        let tasks = self.store.find_tasks(&ids).await?;

        let found: BTreeSet<TaskId> = tasks.iter().map(Task::id).collect();
        let missing: Vec<TaskId> = ids.iter().filter(|id| !found.contains(id)).copied().collect();
        if !missing.is_empty() {
            return Err(ValidationError::TasksNotFound(missing).into());
        }

        let completed: Vec<TaskId> = tasks
            .iter()
            .filter(|task| task.completed())
            .map(Task::id)
            .collect();
        if !completed.is_empty() {
            return Err(ValidationError::TasksAlreadyCompleted(completed).into());
        }

        let conflicting: Vec<TaskId> = tasks
            .iter()
            .filter(|task| {
                task.assignment()
                    .assignee()
                    .is_some_and(|holder| Some(holder) != owner)
            })
            .map(Task::id)
            .collect();
        if !conflicting.is_empty() {
            return Err(ValidationError::TasksAssignedElsewhere(conflicting).into());
        }

        Ok(tasks)
    }
}

/// Checks a caller-supplied display name against the resolved user.
///
/// The cached name on a task is a derived projection; a claim that
/// disagrees with the resolved user is a hard rejection so stale or
/// spoofed denormalized data is never written.
///
/// # Errors
///
/// Returns [`ValidationError::AssigneeNameMismatch`] on inequality.
pub fn check_claimed_name(claimed: &str, user: &User) -> Result<(), ValidationError> {
    if claimed != user.name().as_str() {
        return Err(ValidationError::AssigneeNameMismatch {
            provided: claimed.to_owned(),
            expected: user.name().as_str().to_owned(),
        });
    }
    Ok(())
}
