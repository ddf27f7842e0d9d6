//! Task aggregate root and the assignment relation it carries.

use super::{AssignmentDomainError, TaskId, UserId, user::UserName};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Display name recorded for a task with no assignee.
pub const UNASSIGNED_NAME: &str = "unassigned";

/// Description recorded for a task created without one.
pub const DEFAULT_DESCRIPTION: &str = "No description";

/// Validated non-empty task name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskName(String);

impl TaskName {
    /// Creates a validated task name.
    ///
    /// # Errors
    ///
    /// Returns [`AssignmentDomainError::EmptyTaskName`] when the value is
    /// empty after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, AssignmentDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AssignmentDomainError::EmptyTaskName);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the task name as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for TaskName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for TaskName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Scalar assignment relation carried by each task.
///
/// The assigned user name is a denormalized cache of the assignee's
/// current name, re-derived on every mutation that touches the
/// assignment. It is never trusted from caller input beyond the one-time
/// equality check performed by the validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Assignment {
    /// No user holds the task.
    Unassigned,
    /// Exactly one user holds the task.
    Assigned {
        /// Identifier of the assignee.
        user_id: UserId,
        /// Cached copy of the assignee's name.
        user_name: UserName,
    },
}

impl Assignment {
    /// Creates an assignment to the given user.
    #[must_use]
    pub const fn to_user(user_id: UserId, user_name: UserName) -> Self {
        Self::Assigned { user_id, user_name }
    }

    /// Returns the assignee identifier, if any.
    #[must_use]
    pub const fn assignee(&self) -> Option<UserId> {
        match self {
            Self::Unassigned => None,
            Self::Assigned { user_id, .. } => Some(*user_id),
        }
    }

    /// Returns the display name for the assignment, the
    /// [`UNASSIGNED_NAME`] sentinel when no user holds the task.
    #[must_use]
    pub fn display_name(&self) -> &str {
        match self {
            Self::Unassigned => UNASSIGNED_NAME,
            Self::Assigned { user_name, .. } => user_name.as_str(),
        }
    }

    /// Returns `true` when a user holds the task.
    #[must_use]
    pub const fn is_assigned(&self) -> bool {
        matches!(self, Self::Assigned { .. })
    }
}

/// Task aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    name: TaskName,
    description: String,
    deadline: DateTime<Utc>,
    completed: bool,
    assignment: Assignment,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted task aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted task name.
    pub name: TaskName,
    /// Persisted description.
    pub description: String,
    /// Persisted deadline.
    pub deadline: DateTime<Utc>,
    /// Persisted completion flag.
    pub completed: bool,
    /// Persisted assignment relation.
    pub assignment: Assignment,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Creates a new unassigned, incomplete task with the default
    /// description.
    #[must_use]
    pub fn new(name: TaskName, deadline: DateTime<Utc>, clock: &impl Clock) -> Self {
        Self {
            id: TaskId::new(),
            name,
            description: DEFAULT_DESCRIPTION.to_owned(),
            deadline,
            completed: false,
            assignment: Assignment::Unassigned,
            created_at: clock.utc(),
        }
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            name: data.name,
            description: data.description,
            deadline: data.deadline,
            completed: data.completed,
            assignment: data.assignment,
            created_at: data.created_at,
        }
    }

    /// Replaces the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Replaces the completion flag.
    #[must_use]
    pub const fn with_completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }

    /// Replaces the assignment relation.
    #[must_use]
    pub fn with_assignment(mut self, assignment: Assignment) -> Self {
        self.assignment = assignment;
        self
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the task name.
    #[must_use]
    pub const fn name(&self) -> &TaskName {
        &self.name
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the deadline.
    #[must_use]
    pub const fn deadline(&self) -> DateTime<Utc> {
        self.deadline
    }

    /// Returns `true` when the task is completed.
    #[must_use]
    pub const fn completed(&self) -> bool {
        self.completed
    }

    /// Returns the assignment relation.
    #[must_use]
    pub const fn assignment(&self) -> &Assignment {
        &self.assignment
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Overwrites the assignment relation in place.
    ///
    /// Used by store adapters applying targeted assignment patches; the
    /// coordinator computes full replacement tasks instead.
    pub fn set_assignment(&mut self, assignment: Assignment) {
        self.assignment = assignment;
    }
}
