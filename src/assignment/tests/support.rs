//! Shared fixtures and assertions for assignment tests.

use crate::assignment::{
    adapters::memory::InMemoryEntityStore,
    domain::{Task, TaskId, User, UserId},
    services::{AssignmentCoordinator, TaskFields, UserFields},
};
use chrono::{DateTime, Duration, Utc};
use mockable::DefaultClock;
use rstest::fixture;
use std::collections::HashMap;
use std::sync::Arc;

/// Coordinator type used throughout the assignment tests.
pub type TestCoordinator = AssignmentCoordinator<InMemoryEntityStore, DefaultClock>;

/// Test harness pairing a coordinator with direct store access.
#[derive(Clone)]
pub struct Harness {
    /// Coordinator under test.
    pub coordinator: TestCoordinator,
    /// Store handle for direct inspection and fault injection.
    pub store: Arc<InMemoryEntityStore>,
}

/// Provides a fresh coordinator over an empty in-memory store.
#[fixture]
pub fn harness() -> Harness {
    let store = Arc::new(InMemoryEntityStore::new());
    let coordinator = AssignmentCoordinator::new(Arc::clone(&store), Arc::new(DefaultClock));
    Harness { coordinator, store }
}

/// Returns a deadline a week out from now.
pub fn deadline() -> DateTime<Utc> {
    Utc::now() + Duration::days(7)
}

/// Creates a user through the coordinator.
pub async fn seed_user(harness: &Harness, name: &str, email: &str) -> User {
    harness
        .coordinator
        .create_user(UserFields::new(name, email))
        .await
        .expect("user creation should succeed")
}

/// Creates an unassigned task through the coordinator.
pub async fn seed_task(harness: &Harness, name: &str) -> Task {
    harness
        .coordinator
        .create_task(TaskFields::new(name, deadline()))
        .await
        .expect("task creation should succeed")
}

/// Creates a task assigned to the given user through the coordinator.
pub async fn seed_assigned_task(harness: &Harness, name: &str, assignee: &User) -> Task {
    harness
        .coordinator
        .create_task(
            TaskFields::new(name, deadline())
                .with_assignee(assignee.id(), assignee.name().as_str()),
        )
        .await
        .expect("assigned task creation should succeed")
}

/// Fetches a task directly from the store.
pub fn stored_task(harness: &Harness, id: TaskId) -> Option<Task> {
    harness
        .store
        .all_tasks()
        .expect("task listing should succeed")
        .into_iter()
        .find(|task| task.id() == id)
}

/// Fetches a user directly from the store.
pub fn stored_user(harness: &Harness, id: UserId) -> Option<User> {
    harness
        .store
        .all_users()
        .expect("user listing should succeed")
        .into_iter()
        .find(|user| user.id() == id)
}

/// Asserts the bidirectional assignment invariant over the whole store.
///
/// Every incomplete assigned task must appear in exactly its assignee's
/// pending set with a current cached name, and every pending-set member
/// must exist, point back at the holding user, and be incomplete.
pub fn assert_assignment_invariant(store: &InMemoryEntityStore) {
    let tasks = store.all_tasks().expect("task listing should succeed");
    let users = store.all_users().expect("user listing should succeed");
    let users_by_id: HashMap<UserId, &User> = users.iter().map(|user| (user.id(), user)).collect();
    let tasks_by_id: HashMap<TaskId, &Task> = tasks.iter().map(|task| (task.id(), task)).collect();

    for task in &tasks {
        let Some(assignee) = task.assignment().assignee() else {
            continue;
        };
        let user = users_by_id
            .get(&assignee)
            .unwrap_or_else(|| panic!("task {} assigned to missing user {assignee}", task.id()));
        assert_eq!(
            task.assignment().display_name(),
            user.name().as_str(),
            "cached display name out of date for task {}",
            task.id()
        );
        if !task.completed() {
            assert!(
                user.pending_tasks().contains(&task.id()),
                "incomplete task {} missing from assignee {assignee} pending set",
                task.id()
            );
        }
    }

    for user in &users {
        for task_id in user.pending_tasks() {
            let task = tasks_by_id
                .get(task_id)
                .unwrap_or_else(|| panic!("user {} lists missing task {task_id}", user.id()));
            assert_eq!(
                task.assignment().assignee(),
                Some(user.id()),
                "task {task_id} listed by user {} but assigned elsewhere",
                user.id()
            );
            assert!(
                !task.completed(),
                "completed task {task_id} still listed by user {}",
                user.id()
            );
        }
    }
}
