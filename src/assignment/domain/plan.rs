//! Write plans and compensation helpers.
//!
//! Every mutation is expressed as an explicit list of writes computed
//! before the transaction opens: the primary entity write plus the
//! compensating writes that keep the other side of the assignment
//! relation consistent. The entity store applies a whole plan atomically.

use super::{Assignment, Task, TaskId, User, UserId, user::UserName};
use std::collections::BTreeSet;

/// A single write within an atomic plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Write {
    /// Inserts or fully replaces a task document.
    PutTask(Task),
    /// Removes a task document.
    DeleteTask(TaskId),
    /// Inserts or fully replaces a user document.
    PutUser(User),
    /// Removes a user document.
    DeleteUser(UserId),
    /// Adds a task to a user's pending set. Targeted set-add, idempotent,
    /// a no-op when the user does not exist.
    AddPendingTask {
        /// User whose pending set grows.
        user_id: UserId,
        /// Task gaining membership.
        task_id: TaskId,
    },
    /// Removes a task from a user's pending set. Targeted set-remove,
    /// idempotent, a no-op when the user does not exist.
    RemovePendingTask {
        /// User whose pending set shrinks.
        user_id: UserId,
        /// Task losing membership.
        task_id: TaskId,
    },
    /// Points every listed task at the given user, refreshing the cached
    /// display name.
    AssignTasks {
        /// Tasks being claimed.
        task_ids: Vec<TaskId>,
        /// The claiming user.
        user_id: UserId,
        /// The claiming user's current name.
        user_name: UserName,
    },
    /// Resets every listed task to the unassigned sentinel.
    UnassignTasks {
        /// Tasks being released.
        task_ids: Vec<TaskId>,
    },
    /// Rewrites the cached display name on every task pointing at the
    /// given user, completed tasks included.
    RefreshAssigneeName {
        /// The renamed user.
        user_id: UserId,
        /// The user's current name.
        user_name: UserName,
    },
    /// Resets every task held by the given user to the unassigned
    /// sentinel: tasks pointing at the user plus any listed in the user's
    /// pending set, the union covering drift between the two sides.
    UnassignUser {
        /// The user being discharged.
        user_id: UserId,
        /// The user's pending set at plan time.
        pending: Vec<TaskId>,
    },
}

/// Ordered list of writes applied as one atomic transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WritePlan {
    writes: Vec<Write>,
}

impl WritePlan {
    /// Creates an empty plan.
    #[must_use]
    pub const fn new() -> Self {
        Self { writes: Vec::new() }
    }

    /// Appends a write to the plan.
    pub fn push(&mut self, write: Write) {
        self.writes.push(write);
    }

    /// Appends every write from the iterator.
    pub fn extend(&mut self, writes: impl IntoIterator<Item = Write>) {
        self.writes.extend(writes);
    }

    /// Returns the planned writes in application order.
    #[must_use]
    pub fn writes(&self) -> &[Write] {
        &self.writes
    }

    /// Returns `true` when the plan carries no writes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Consumes the plan, yielding the writes in application order.
    #[must_use]
    pub fn into_writes(self) -> Vec<Write> {
        self.writes
    }
}

impl FromIterator<Write> for WritePlan {
    fn from_iter<I: IntoIterator<Item = Write>>(iter: I) -> Self {
        Self {
            writes: iter.into_iter().collect(),
        }
    }
}

/// Computes the membership compensations required by a task mutation.
///
/// The previous holder loses membership when the task changes hands or
/// completes; the next holder gains membership only while the task is
/// incomplete. Both writes apply when reassigning between two users.
#[must_use]
pub fn task_compensations(
    previous: &Assignment,
    next: &Assignment,
    completed: bool,
    task_id: TaskId,
) -> Vec<Write> {
    let mut writes = Vec::new();

    if let Some(old) = previous.assignee() {
        if next.assignee() != Some(old) || completed {
            writes.push(Write::RemovePendingTask {
                user_id: old,
                task_id,
            });
        }
    }

    if let Some(new) = next.assignee() {
        if !completed {
            writes.push(Write::AddPendingTask {
                user_id: new,
                task_id,
            });
        }
    }

    writes
}

/// Computes the membership difference between two pending-task sets.
///
/// Returns the tasks to claim and the tasks to release, in stable id
/// order.
#[must_use]
pub fn pending_diff(
    old: &BTreeSet<TaskId>,
    new: &BTreeSet<TaskId>,
) -> (Vec<TaskId>, Vec<TaskId>) {
    let to_add = new.difference(old).copied().collect();
    let to_remove = old.difference(new).copied().collect();
    (to_add, to_remove)
}
