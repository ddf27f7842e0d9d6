//! Thread-safe in-memory entity store.
//!
//! Commits stage the whole write plan against a copy of the state and
//! publish it only when every write succeeds, so a failing plan —
//! including one failed deliberately through
//! [`InMemoryEntityStore::fail_next_commit_after`] — leaves the
//! published state untouched.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use thiserror::Error;

use crate::assignment::{
    domain::{Assignment, EmailAddress, Task, TaskId, User, UserId, Write, WritePlan},
    ports::{EntityStore, StoreError, StoreResult},
};

/// Injected commit failure used by atomicity tests.
#[derive(Debug, Clone, Error)]
#[error("injected commit failure after {0} writes")]
pub struct InjectedCommitFailure(usize);

#[derive(Debug, Default, Clone)]
struct StoreState {
    tasks: HashMap<TaskId, Task>,
    users: HashMap<UserId, User>,
}

/// Thread-safe in-memory entity store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEntityStore {
    state: Arc<RwLock<StoreState>>,
    commit_fault: Arc<RwLock<Option<usize>>>,
}

impl InMemoryEntityStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms a one-shot fault: the next commit fails after applying
    /// `writes` writes to its staged state, publishing nothing.
    ///
    /// # Panics
    ///
    /// Panics when the fault lock is poisoned; the store is a test
    /// fixture and a poisoned fixture cannot produce a meaningful test.
    pub fn fail_next_commit_after(&self, writes: usize) {
        let mut fault = self
            .commit_fault
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *fault = Some(writes);
    }

    /// Returns every stored task. Test support.
    ///
    /// # Errors
    ///
    /// Returns a backend error when the state lock is poisoned.
    pub fn all_tasks(&self) -> StoreResult<Vec<Task>> {
        let state = read_state(&self.state)?;
        Ok(state.tasks.values().cloned().collect())
    }

    /// Returns every stored user. Test support.
    ///
    /// # Errors
    ///
    /// Returns a backend error when the state lock is poisoned.
    pub fn all_users(&self) -> StoreResult<Vec<User>> {
        let state = read_state(&self.state)?;
        Ok(state.users.values().cloned().collect())
    }

    fn take_commit_fault(&self) -> StoreResult<Option<usize>> {
        let mut fault = self
            .commit_fault
            .write()
            .map_err(|err| StoreError::backend(std::io::Error::other(err.to_string())))?;
        Ok(fault.take())
    }
}

fn read_state(
    state: &Arc<RwLock<StoreState>>,
) -> StoreResult<std::sync::RwLockReadGuard<'_, StoreState>> {
    state
        .read()
        .map_err(|err| StoreError::backend(std::io::Error::other(err.to_string())))
}

fn apply_write(state: &mut StoreState, write: Write) -> StoreResult<()> {
    match write {
        Write::PutTask(task) => {
            state.tasks.insert(task.id(), task);
        }
        Write::DeleteTask(id) => {
            state.tasks.remove(&id);
        }
        Write::PutUser(user) => {
            let duplicate = state
                .users
                .values()
                .any(|held| held.id() != user.id() && held.email() == user.email());
            if duplicate {
                return Err(StoreError::DuplicateEmail(user.email().clone()));
            }
            state.users.insert(user.id(), user);
        }
        Write::DeleteUser(id) => {
            state.users.remove(&id);
        }
        Write::AddPendingTask { user_id, task_id } => {
            // Update-with-no-match is a no-op, document-store style.
            if let Some(user) = state.users.get_mut(&user_id) {
                user.add_pending_task(task_id);
            }
        }
        Write::RemovePendingTask { user_id, task_id } => {
            if let Some(user) = state.users.get_mut(&user_id) {
                user.remove_pending_task(task_id);
            }
        }
        Write::AssignTasks {
            task_ids,
            user_id,
            user_name,
        } => {
            for task_id in task_ids {
                if let Some(task) = state.tasks.get_mut(&task_id) {
                    task.set_assignment(Assignment::to_user(user_id, user_name.clone()));
                }
            }
        }
        Write::UnassignTasks { task_ids } => {
            for task_id in task_ids {
                if let Some(task) = state.tasks.get_mut(&task_id) {
                    task.set_assignment(Assignment::Unassigned);
                }
            }
        }
        Write::RefreshAssigneeName { user_id, user_name } => {
            for task in state.tasks.values_mut() {
                if task.assignment().assignee() == Some(user_id) {
                    task.set_assignment(Assignment::to_user(user_id, user_name.clone()));
                }
            }
        }
        Write::UnassignUser { user_id, pending } => {
            for task in state.tasks.values_mut() {
                let held = task.assignment().assignee() == Some(user_id)
                    || pending.contains(&task.id());
                if held {
                    task.set_assignment(Assignment::Unassigned);
                }
            }
        }
    }
    Ok(())
}

#[async_trait]
impl EntityStore for InMemoryEntityStore {
    async fn find_task(&self, id: TaskId) -> StoreResult<Option<Task>> {
        let state = read_state(&self.state)?;
        Ok(state.tasks.get(&id).cloned())
    }

    async fn find_tasks(&self, ids: &[TaskId]) -> StoreResult<Vec<Task>> {
        let state = read_state(&self.state)?;
        Ok(ids
            .iter()
            .filter_map(|id| state.tasks.get(id).cloned())
            .collect())
    }

    async fn find_user(&self, id: UserId) -> StoreResult<Option<User>> {
        let state = read_state(&self.state)?;
        Ok(state.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &EmailAddress) -> StoreResult<Option<User>> {
        let state = read_state(&self.state)?;
        Ok(state
            .users
            .values()
            .find(|user| user.email() == email)
            .cloned())
    }

    async fn commit(&self, plan: WritePlan) -> StoreResult<()> {
        let fault = self.take_commit_fault()?;
        let mut state = self
            .state
            .write()
            .map_err(|err| StoreError::backend(std::io::Error::other(err.to_string())))?;

        let mut staged = state.clone();
        for (applied, write) in plan.into_writes().into_iter().enumerate() {
            if fault == Some(applied) {
                return Err(StoreError::transaction(InjectedCommitFailure(applied)));
            }
            apply_write(&mut staged, write)?;
        }

        *state = staged;
        Ok(())
    }
}
