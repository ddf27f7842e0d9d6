//! Diesel row models and domain conversions for assignment persistence.

use super::schema::{tasks, users};
use crate::assignment::{
    domain::{
        Assignment, EmailAddress, PersistedTaskData, PersistedUserData, Task, TaskId, TaskName,
        User, UserId, UserName,
    },
    ports::{StoreError, StoreResult},
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Row model for task records.
#[derive(Debug, Clone, Queryable, QueryableByName, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Task name.
    pub name: String,
    /// Free-text description.
    pub description: String,
    /// Deadline timestamp.
    pub deadline: DateTime<Utc>,
    /// Completion flag.
    pub completed: bool,
    /// Assignee identifier, null when unassigned.
    pub assigned_user: Option<uuid::Uuid>,
    /// Cached assignee display name, sentinel when unassigned.
    pub assigned_user_name: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Row model for user records.
#[derive(Debug, Clone, Queryable, QueryableByName, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRow {
    /// User identifier.
    pub id: uuid::Uuid,
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Identifiers of incomplete tasks assigned to this user.
    pub pending_tasks: Vec<uuid::Uuid>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Converts a domain task to its row representation.
#[must_use]
pub fn task_to_row(task: &Task) -> TaskRow {
    let (assigned_user, assigned_user_name) = match task.assignment() {
        Assignment::Unassigned => (None, task.assignment().display_name().to_owned()),
        Assignment::Assigned { user_id, user_name } => {
            (Some(user_id.into_inner()), user_name.as_str().to_owned())
        }
    };

    TaskRow {
        id: task.id().into_inner(),
        name: task.name().as_str().to_owned(),
        description: task.description().to_owned(),
        deadline: task.deadline(),
        completed: task.completed(),
        assigned_user,
        assigned_user_name,
        created_at: task.created_at(),
    }
}

/// Reconstructs a domain task from its row representation.
///
/// # Errors
///
/// Returns a backend error when a persisted scalar fails domain
/// validation, which indicates row corruption.
pub fn row_to_task(row: TaskRow) -> StoreResult<Task> {
    let name = TaskName::new(row.name).map_err(StoreError::backend)?;
    let assignment = match row.assigned_user {
        None => Assignment::Unassigned,
        Some(user_id) => {
            let user_name = UserName::new(row.assigned_user_name).map_err(StoreError::backend)?;
            Assignment::to_user(UserId::from_uuid(user_id), user_name)
        }
    };

    Ok(Task::from_persisted(PersistedTaskData {
        id: TaskId::from_uuid(row.id),
        name,
        description: row.description,
        deadline: row.deadline,
        completed: row.completed,
        assignment,
        created_at: row.created_at,
    }))
}

/// Converts a domain user to its row representation.
#[must_use]
pub fn user_to_row(user: &User) -> UserRow {
    UserRow {
        id: user.id().into_inner(),
        name: user.name().as_str().to_owned(),
        email: user.email().as_str().to_owned(),
        pending_tasks: user
            .pending_tasks()
            .iter()
            .map(|task_id| task_id.into_inner())
            .collect(),
        created_at: user.created_at(),
    }
}

/// Reconstructs a domain user from its row representation.
///
/// # Errors
///
/// Returns a backend error when a persisted scalar fails domain
/// validation, which indicates row corruption.
pub fn row_to_user(row: UserRow) -> StoreResult<User> {
    let name = UserName::new(row.name).map_err(StoreError::backend)?;
    let email = EmailAddress::new(row.email).map_err(StoreError::backend)?;

    Ok(User::from_persisted(PersistedUserData {
        id: UserId::from_uuid(row.id),
        name,
        email,
        pending_tasks: row.pending_tasks.into_iter().map(TaskId::from_uuid).collect(),
        created_at: row.created_at,
    }))
}
