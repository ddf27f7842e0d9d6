//! Transactional coordination of task-user assignment mutations.
//!
//! For every mutation entry point the coordinator derives the minimal
//! set of compensating writes to the other entity and submits the
//! primary write plus the compensations as one atomic write plan. No
//! state between committed plans ever shows a task pointing at a user
//! who does not list it, or a user listing a task that does not point
//! back.

use crate::assignment::{
    domain::{
        Assignment, AssignmentDomainError, DEFAULT_DESCRIPTION, EmailAddress, PersistedTaskData,
        PersistedUserData, Task, TaskId, TaskName, User, UserId, UserName, Write, WritePlan,
        pending_diff, task_compensations,
    },
    ports::{EntityStore, StoreError},
    services::validator::{
        AssignmentValidator, ValidationError, ValidatorError, check_claimed_name,
    },
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Caller-proposed assignee for a task write.
///
/// The claimed display name must match the resolved user's actual name;
/// the cached name written to the task is always re-derived from the
/// user record, never taken from the claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssigneeClaim {
    /// Proposed assignee identifier.
    pub user_id: UserId,
    /// Caller-supplied copy of the assignee's display name.
    pub user_name: String,
}

impl AssigneeClaim {
    /// Creates an assignee claim.
    #[must_use]
    pub fn new(user_id: UserId, user_name: impl Into<String>) -> Self {
        Self {
            user_id,
            user_name: user_name.into(),
        }
    }
}

/// Field payload for creating or replacing a task.
///
/// Update semantics are full replacement: an omitted description resets
/// to the default and an omitted completion flag resets to `false`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFields {
    name: String,
    deadline: DateTime<Utc>,
    description: Option<String>,
    completed: bool,
    assignee: Option<AssigneeClaim>,
}

impl TaskFields {
    /// Creates a payload with the required task fields.
    #[must_use]
    pub fn new(name: impl Into<String>, deadline: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            deadline,
            description: None,
            completed: false,
            assignee: None,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the completion flag.
    #[must_use]
    pub const fn with_completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }

    /// Sets the proposed assignee.
    #[must_use]
    pub fn with_assignee(mut self, user_id: UserId, claimed_name: impl Into<String>) -> Self {
        self.assignee = Some(AssigneeClaim::new(user_id, claimed_name));
        self
    }
}

/// Field payload for creating or replacing a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserFields {
    name: String,
    email: String,
    pending_tasks: BTreeSet<TaskId>,
}

impl UserFields {
    /// Creates a payload with the required user fields.
    #[must_use]
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            pending_tasks: BTreeSet::new(),
        }
    }

    /// Sets the requested pending-task membership set.
    #[must_use]
    pub fn with_pending_tasks(mut self, tasks: impl IntoIterator<Item = TaskId>) -> Self {
        self.pending_tasks = tasks.into_iter().collect();
        self
    }
}

/// Service-level errors for assignment coordination.
#[derive(Debug, Clone, Error)]
pub enum AssignmentError {
    /// Domain construction failed on a required field.
    #[error(transparent)]
    Domain(#[from] AssignmentDomainError),

    /// The proposed assignment was rejected by validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The targeted task does not exist.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// The targeted user does not exist.
    #[error("user not found: {0}")]
    UserNotFound(UserId),

    /// The email address is already held by another user.
    #[error("email already in use: {0}")]
    DuplicateEmail(EmailAddress),

    /// The store failed; a commit failure means no write was applied and
    /// the whole operation may be retried.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AssignmentError {
    /// Maps a commit failure, surfacing unique-constraint violations as
    /// the conflict they represent.
    fn from_commit(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail(email) => Self::DuplicateEmail(email),
            other => Self::Store(other),
        }
    }
}

impl From<ValidatorError> for AssignmentError {
    fn from(err: ValidatorError) -> Self {
        match err {
            ValidatorError::Rejected(verdict) => Self::Validation(verdict),
            ValidatorError::Store(store) => Self::Store(store),
        }
    }
}

/// Result type for assignment coordination operations.
pub type AssignmentResult<T> = Result<T, AssignmentError>;

/// Assignment consistency coordinator.
///
/// All reads happen before the plan is built; the plan is then committed
/// as a single transaction, so no transaction stays open across an
/// unrelated suspension point.
#[derive(Debug)]
pub struct AssignmentCoordinator<S, C>
where
    S: EntityStore,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    validator: AssignmentValidator<S>,
    clock: Arc<C>,
}

impl<S, C> Clone for AssignmentCoordinator<S, C>
where
    S: EntityStore,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            validator: self.validator.clone(),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<S, C> AssignmentCoordinator<S, C>
where
    S: EntityStore,
    C: Clock + Send + Sync,
{
    /// Creates a coordinator over the given store and clock.
    #[must_use]
    pub fn new(store: Arc<S>, clock: Arc<C>) -> Self {
        let validator = AssignmentValidator::new(Arc::clone(&store));
        Self {
            store,
            validator,
            clock,
        }
    }

    /// Returns the validator used by this coordinator.
    #[must_use]
    pub const fn validator(&self) -> &AssignmentValidator<S> {
        &self.validator
    }

    /// Creates a task, adding it to the assignee's pending set in the
    /// same transaction when assigned and incomplete.
    ///
    /// # Errors
    ///
    /// Returns [`AssignmentError`] when a required field is invalid, the
    /// assignee cannot be resolved, the claimed name mismatches, or the
    /// commit fails. No writes apply on any error.
    pub async fn create_task(&self, fields: TaskFields) -> AssignmentResult<Task> {
        let name = TaskName::new(fields.name)?;
        let assignment = self.resolve_assignment(fields.assignee).await?;

        let mut task = Task::new(name, fields.deadline, &*self.clock)
            .with_completed(fields.completed)
            .with_assignment(assignment);
        if let Some(description) = fields.description {
            task = task.with_description(description);
        }

        let mut plan = WritePlan::new();
        plan.push(Write::PutTask(task.clone()));
        if let Some(user_id) = task.assignment().assignee() {
            if !task.completed() {
                plan.push(Write::AddPendingTask {
                    user_id,
                    task_id: task.id(),
                });
            }
        }

        self.store.commit(plan).await?;
        debug!(task_id = %task.id(), assigned = task.assignment().is_assigned(), "task created");
        Ok(task)
    }

    /// Replaces a task's mutable fields, compensating both the previous
    /// and the next assignee's pending sets in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns [`AssignmentError::TaskNotFound`] when the task does not
    /// exist, a validation error when the new assignment is rejected, or
    /// a store error when the commit fails. No writes apply on any error.
    pub async fn update_task(&self, id: TaskId, fields: TaskFields) -> AssignmentResult<Task> {
        let current = self
            .store
            .find_task(id)
            .await?
            .ok_or(AssignmentError::TaskNotFound(id))?;

        let name = TaskName::new(fields.name)?;
        let assignment = self.resolve_assignment(fields.assignee).await?;

        let mut plan: WritePlan = task_compensations(
            current.assignment(),
            &assignment,
            fields.completed,
            id,
        )
        .into_iter()
        .collect();

        let updated = Task::from_persisted(PersistedTaskData {
            id,
            name,
            description: fields
                .description
                .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_owned()),
            deadline: fields.deadline,
            completed: fields.completed,
            assignment,
            created_at: current.created_at(),
        });
        plan.push(Write::PutTask(updated.clone()));

        self.store.commit(plan).await?;
        debug!(task_id = %id, completed = updated.completed(), "task updated");
        Ok(updated)
    }

    /// Deletes a task, removing it from its assignee's pending set in
    /// the same transaction.
    ///
    /// # Errors
    ///
    /// Returns [`AssignmentError::TaskNotFound`] when the task does not
    /// exist, or a store error when the commit fails.
    pub async fn delete_task(&self, id: TaskId) -> AssignmentResult<()> {
        let task = self
            .store
            .find_task(id)
            .await?
            .ok_or(AssignmentError::TaskNotFound(id))?;

        let mut plan = WritePlan::new();
        if let Some(user_id) = task.assignment().assignee() {
            plan.push(Write::RemovePendingTask {
                user_id,
                task_id: id,
            });
        }
        plan.push(Write::DeleteTask(id));

        self.store.commit(plan).await?;
        debug!(task_id = %id, "task deleted");
        Ok(())
    }

    /// Creates a user, claiming every requested pending task in the same
    /// transaction.
    ///
    /// Email uniqueness is not pre-checked: the store's unique
    /// constraint is the authority, avoiding a race between check and
    /// insert; a violation surfaces as
    /// [`AssignmentError::DuplicateEmail`].
    ///
    /// # Errors
    ///
    /// Returns [`AssignmentError`] when a required field is invalid, any
    /// requested task is missing, completed, or already assigned, the
    /// email is taken, or the commit fails. No writes apply on any error.
    pub async fn create_user(&self, fields: UserFields) -> AssignmentResult<User> {
        let name = UserName::new(fields.name)?;
        let email = EmailAddress::new(fields.email)?;
        let pending = fields.pending_tasks;

        if !pending.is_empty() {
            // A brand-new user owns nothing yet, so any existing
            // assignment on a requested task is a conflict.
            self.validator.validate_task_batch(&pending, None).await?;
        }

        let user = User::new(name, email, &*self.clock).with_pending_tasks(pending.clone());

        let mut plan = WritePlan::new();
        plan.push(Write::PutUser(user.clone()));
        if !pending.is_empty() {
            plan.push(Write::AssignTasks {
                task_ids: pending.iter().copied().collect(),
                user_id: user.id(),
                user_name: user.name().clone(),
            });
        }

        self.store
            .commit(plan)
            .await
            .map_err(AssignmentError::from_commit)?;
        debug!(user_id = %user.id(), claimed = pending.len(), "user created");
        Ok(user)
    }

    /// Replaces a user's fields, claiming and releasing tasks to match
    /// the requested pending set in the same transaction. A rename also
    /// refreshes the cached display name on every task still pointing
    /// at the user, completed tasks included.
    ///
    /// Submitting the same pending set twice is idempotent: the second
    /// run computes an empty membership diff and rewrites identical
    /// state.
    ///
    /// # Errors
    ///
    /// Returns [`AssignmentError::UserNotFound`] when the user does not
    /// exist, [`AssignmentError::DuplicateEmail`] when another user holds
    /// the new address (pre-checked, with the store constraint as final
    /// authority at commit), a validation error when any newly claimed
    /// task is rejected, or a store error when the commit fails. No
    /// writes apply on any error.
    pub async fn update_user(&self, id: UserId, fields: UserFields) -> AssignmentResult<User> {
        let current = self
            .store
            .find_user(id)
            .await?
            .ok_or(AssignmentError::UserNotFound(id))?;

        let name = UserName::new(fields.name)?;
        let email = EmailAddress::new(fields.email)?;

        if let Some(holder) = self.store.find_user_by_email(&email).await? {
            if holder.id() != id {
                return Err(AssignmentError::DuplicateEmail(email));
            }
        }

        let new_pending = fields.pending_tasks;
        let (to_add, to_remove) = pending_diff(current.pending_tasks(), &new_pending);

        if !to_add.is_empty() {
            let to_add_set: BTreeSet<TaskId> = to_add.iter().copied().collect();
            self.validator
                .validate_task_batch(&to_add_set, Some(id))
                .await?;
        }

        let updated = User::from_persisted(PersistedUserData {
            id,
            name,
            email,
            pending_tasks: new_pending,
            created_at: current.created_at(),
        });

        let mut plan = WritePlan::new();
        if !to_add.is_empty() {
            plan.push(Write::AssignTasks {
                task_ids: to_add.clone(),
                user_id: id,
                user_name: updated.name().clone(),
            });
        }
        // A rename must reach the cached display name on every task
        // still pointing at the user, completed tasks included.
        if updated.name() != current.name() {
            plan.push(Write::RefreshAssigneeName {
                user_id: id,
                user_name: updated.name().clone(),
            });
        }
        if !to_remove.is_empty() {
            plan.push(Write::UnassignTasks {
                task_ids: to_remove.clone(),
            });
        }
        plan.push(Write::PutUser(updated.clone()));

        self.store
            .commit(plan)
            .await
            .map_err(AssignmentError::from_commit)?;
        debug!(
            user_id = %id,
            claimed = to_add.len(),
            released = to_remove.len(),
            "user updated"
        );
        Ok(updated)
    }

    /// Deletes a user, resetting every task it holds to the unassigned
    /// sentinel in the same transaction.
    ///
    /// The unassignment filter is the union of tasks pointing at the
    /// user and tasks listed in its pending set, covering any drift
    /// between the two sides of the relation.
    ///
    /// # Errors
    ///
    /// Returns [`AssignmentError::UserNotFound`] when the user does not
    /// exist, or a store error when the commit fails.
    pub async fn delete_user(&self, id: UserId) -> AssignmentResult<()> {
        let user = self
            .store
            .find_user(id)
            .await?
            .ok_or(AssignmentError::UserNotFound(id))?;

        let mut plan = WritePlan::new();
        plan.push(Write::UnassignUser {
            user_id: id,
            pending: user.pending_tasks().iter().copied().collect(),
        });
        plan.push(Write::DeleteUser(id));

        self.store.commit(plan).await?;
        debug!(user_id = %id, "user deleted");
        Ok(())
    }

    /// Resolves a caller-proposed assignee claim to an assignment.
    ///
    /// No claim means no assignee, which is trivially valid; a claim is
    /// resolved against the store and its display name checked, and the
    /// cached name in the resulting assignment is taken from the
    /// resolved user record.
    async fn resolve_assignment(
        &self,
        claim: Option<AssigneeClaim>,
    ) -> AssignmentResult<Assignment> {
        match claim {
            None => Ok(Assignment::Unassigned),
            Some(claim) => {
                let user = self.validator.resolve_assignee(claim.user_id).await?;
                check_claimed_name(&claim.user_name, &user)?;
                Ok(Assignment::to_user(user.id(), user.name().clone()))
            }
        }
    }
}
