//! User aggregate root and validated user scalar types.

use super::{AssignmentDomainError, TaskId, UserId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Validated non-empty user display name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserName(String);

impl UserName {
    /// Creates a validated user name.
    ///
    /// # Errors
    ///
    /// Returns [`AssignmentDomainError::EmptyUserName`] when the value is
    /// empty after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, AssignmentDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AssignmentDomainError::EmptyUserName);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the user name as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for UserName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validated non-empty email address, unique across all users.
///
/// Uniqueness is enforced by the entity store, not by this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Creates a validated email address.
    ///
    /// # Errors
    ///
    /// Returns [`AssignmentDomainError::EmptyEmail`] when the value is
    /// empty after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, AssignmentDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AssignmentDomainError::EmptyEmail);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the email address as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// User aggregate root.
///
/// `pending_tasks` is the membership side of the assignment relation:
/// the set of incomplete tasks currently assigned to this user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    id: UserId,
    name: UserName,
    email: EmailAddress,
    pending_tasks: BTreeSet<TaskId>,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted user aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedUserData {
    /// Persisted user identifier.
    pub id: UserId,
    /// Persisted user name.
    pub name: UserName,
    /// Persisted email address.
    pub email: EmailAddress,
    /// Persisted pending-task membership set.
    pub pending_tasks: BTreeSet<TaskId>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Creates a new user with an empty pending-task set.
    #[must_use]
    pub fn new(name: UserName, email: EmailAddress, clock: &impl Clock) -> Self {
        Self {
            id: UserId::new(),
            name,
            email,
            pending_tasks: BTreeSet::new(),
            created_at: clock.utc(),
        }
    }

    /// Reconstructs a user from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedUserData) -> Self {
        Self {
            id: data.id,
            name: data.name,
            email: data.email,
            pending_tasks: data.pending_tasks,
            created_at: data.created_at,
        }
    }

    /// Replaces the pending-task membership set.
    #[must_use]
    pub fn with_pending_tasks(mut self, pending_tasks: BTreeSet<TaskId>) -> Self {
        self.pending_tasks = pending_tasks;
        self
    }

    /// Returns the user identifier.
    #[must_use]
    pub const fn id(&self) -> UserId {
        self.id
    }

    /// Returns the user name.
    #[must_use]
    pub const fn name(&self) -> &UserName {
        &self.name
    }

    /// Returns the email address.
    #[must_use]
    pub const fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Returns the pending-task membership set.
    #[must_use]
    pub const fn pending_tasks(&self) -> &BTreeSet<TaskId> {
        &self.pending_tasks
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Adds a task to the membership set. Idempotent.
    ///
    /// Used by store adapters applying targeted set patches; the
    /// coordinator computes membership through write plans instead.
    pub fn add_pending_task(&mut self, task_id: TaskId) {
        self.pending_tasks.insert(task_id);
    }

    /// Removes a task from the membership set. Idempotent.
    pub fn remove_pending_task(&mut self, task_id: TaskId) {
        self.pending_tasks.remove(&task_id);
    }
}
