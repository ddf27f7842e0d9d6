//! `PostgreSQL` entity store implementation.
//!
//! Lookups run as plain reads; [`EntityStore::commit`] applies the whole
//! write plan inside one database transaction, so the plan is atomic and
//! isolated from concurrent commits touching the same rows.

use super::{
    models::{TaskRow, UserRow, row_to_task, row_to_user, task_to_row, user_to_row},
    schema::{tasks, users},
};
use crate::assignment::{
    domain::{
        EmailAddress, Task, TaskId, UNASSIGNED_NAME, User, UserId, UserName, Write, WritePlan,
    },
    ports::{EntityStore, StoreError, StoreResult},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by assignment adapters.
pub type AssignmentPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed entity store.
#[derive(Debug, Clone)]
pub struct PostgresEntityStore {
    pool: AssignmentPgPool,
}

impl PostgresEntityStore {
    /// Creates a new store from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: AssignmentPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut PgConnection) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(StoreError::backend)?;
            f(&mut connection)
        })
        .await
        .map_err(StoreError::backend)?
    }
}

#[async_trait]
impl EntityStore for PostgresEntityStore {
    async fn find_task(&self, id: TaskId) -> StoreResult<Option<Task>> {
        self.run_blocking(move |connection| {
            let row = tasks::table
                .filter(tasks::id.eq(id.into_inner()))
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()
                .map_err(StoreError::backend)?;
            row.map(row_to_task).transpose()
        })
        .await
    }

    async fn find_tasks(&self, ids: &[TaskId]) -> StoreResult<Vec<Task>> {
        let lookup: Vec<uuid::Uuid> = ids.iter().map(|id| id.into_inner()).collect();
        self.run_blocking(move |connection| {
            let rows = tasks::table
                .filter(tasks::id.eq_any(lookup))
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)
                .map_err(StoreError::backend)?;
            rows.into_iter().map(row_to_task).collect()
        })
        .await
    }

    async fn find_user(&self, id: UserId) -> StoreResult<Option<User>> {
        self.run_blocking(move |connection| {
            let row = users::table
                .filter(users::id.eq(id.into_inner()))
                .select(UserRow::as_select())
                .first::<UserRow>(connection)
                .optional()
                .map_err(StoreError::backend)?;
            row.map(row_to_user).transpose()
        })
        .await
    }

    async fn find_user_by_email(&self, email: &EmailAddress) -> StoreResult<Option<User>> {
        let lookup = email.as_str().to_owned();
        self.run_blocking(move |connection| {
            let row = users::table
                .filter(users::email.eq(lookup))
                .select(UserRow::as_select())
                .first::<UserRow>(connection)
                .optional()
                .map_err(StoreError::backend)?;
            row.map(row_to_user).transpose()
        })
        .await
    }

    async fn commit(&self, plan: WritePlan) -> StoreResult<()> {
        self.run_blocking(move |connection| {
            connection.transaction::<(), StoreError, _>(|tx_conn| {
                for write in plan.into_writes() {
                    apply_write(tx_conn, write)?;
                }
                Ok(())
            })
        })
        .await
    }
}

fn apply_write(connection: &mut PgConnection, write: Write) -> StoreResult<()> {
    match write {
        Write::PutTask(task) => put_task(connection, &task),
        Write::DeleteTask(id) => {
            diesel::delete(tasks::table.filter(tasks::id.eq(id.into_inner())))
                .execute(connection)?;
            Ok(())
        }
        Write::PutUser(user) => put_user(connection, &user),
        Write::DeleteUser(id) => {
            diesel::delete(users::table.filter(users::id.eq(id.into_inner())))
                .execute(connection)?;
            Ok(())
        }
        Write::AddPendingTask { user_id, task_id } => {
            add_pending_task(connection, user_id, task_id)
        }
        Write::RemovePendingTask { user_id, task_id } => {
            remove_pending_task(connection, user_id, task_id)
        }
        Write::AssignTasks {
            task_ids,
            user_id,
            user_name,
        } => assign_tasks(connection, &task_ids, user_id, &user_name),
        Write::UnassignTasks { task_ids } => unassign_tasks(connection, &task_ids),
        Write::RefreshAssigneeName { user_id, user_name } => {
            refresh_assignee_name(connection, user_id, &user_name)
        }
        Write::UnassignUser { user_id, pending } => unassign_user(connection, user_id, &pending),
    }
}

fn put_task(connection: &mut PgConnection, task: &Task) -> StoreResult<()> {
    let row = task_to_row(task);
    diesel::insert_into(tasks::table)
        .values(&row)
        .on_conflict(tasks::id)
        .do_update()
        .set(&row)
        .execute(connection)?;
    Ok(())
}

fn put_user(connection: &mut PgConnection, user: &User) -> StoreResult<()> {
    let row = user_to_row(user);
    diesel::insert_into(users::table)
        .values(&row)
        .on_conflict(users::id)
        .do_update()
        .set(&row)
        .execute(connection)
        .map_err(|err| match err {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
                if is_email_unique_violation(info.as_ref()) =>
            {
                StoreError::DuplicateEmail(user.email().clone())
            }
            other => StoreError::from(other),
        })?;
    Ok(())
}

fn add_pending_task(
    connection: &mut PgConnection,
    user_id: UserId,
    task_id: TaskId,
) -> StoreResult<()> {
    // Guarded array_append keeps set semantics without rewriting the row.
    diesel::sql_query(concat!(
        "UPDATE users SET pending_tasks = array_append(pending_tasks, $2) ",
        "WHERE id = $1 AND NOT ($2 = ANY(pending_tasks))",
    ))
    .bind::<diesel::sql_types::Uuid, _>(user_id.into_inner())
    .bind::<diesel::sql_types::Uuid, _>(task_id.into_inner())
    .execute(connection)?;
    Ok(())
}

fn remove_pending_task(
    connection: &mut PgConnection,
    user_id: UserId,
    task_id: TaskId,
) -> StoreResult<()> {
    diesel::sql_query(
        "UPDATE users SET pending_tasks = array_remove(pending_tasks, $2) WHERE id = $1",
    )
    .bind::<diesel::sql_types::Uuid, _>(user_id.into_inner())
    .bind::<diesel::sql_types::Uuid, _>(task_id.into_inner())
    .execute(connection)?;
    Ok(())
}

fn assign_tasks(
    connection: &mut PgConnection,
    task_ids: &[TaskId],
    user_id: UserId,
    user_name: &UserName,
) -> StoreResult<()> {
    let ids: Vec<uuid::Uuid> = task_ids.iter().map(|id| id.into_inner()).collect();
    diesel::update(tasks::table.filter(tasks::id.eq_any(ids)))
        .set((
            tasks::assigned_user.eq(Some(user_id.into_inner())),
            tasks::assigned_user_name.eq(user_name.as_str()),
        ))
        .execute(connection)?;
    Ok(())
}

fn unassign_tasks(connection: &mut PgConnection, task_ids: &[TaskId]) -> StoreResult<()> {
    let ids: Vec<uuid::Uuid> = task_ids.iter().map(|id| id.into_inner()).collect();
    diesel::update(tasks::table.filter(tasks::id.eq_any(ids)))
        .set((
            tasks::assigned_user.eq(None::<uuid::Uuid>),
            tasks::assigned_user_name.eq(UNASSIGNED_NAME),
        ))
        .execute(connection)?;
    Ok(())
}

fn refresh_assignee_name(
    connection: &mut PgConnection,
    user_id: UserId,
    user_name: &UserName,
) -> StoreResult<()> {
    diesel::update(tasks::table.filter(tasks::assigned_user.eq(Some(user_id.into_inner()))))
        .set(tasks::assigned_user_name.eq(user_name.as_str()))
        .execute(connection)?;
    Ok(())
}

fn unassign_user(
    connection: &mut PgConnection,
    user_id: UserId,
    pending: &[TaskId],
) -> StoreResult<()> {
    let ids: Vec<uuid::Uuid> = pending.iter().map(|id| id.into_inner()).collect();
    diesel::update(
        tasks::table.filter(
            tasks::assigned_user
                .eq(Some(user_id.into_inner()))
                .or(tasks::id.eq_any(ids)),
        ),
    )
    .set((
        tasks::assigned_user.eq(None::<uuid::Uuid>),
        tasks::assigned_user_name.eq(UNASSIGNED_NAME),
    ))
    .execute(connection)?;
    Ok(())
}

fn is_email_unique_violation(info: &dyn DatabaseErrorInformation) -> bool {
    info.constraint_name()
        .is_some_and(|name| name == "idx_users_email_unique")
}
