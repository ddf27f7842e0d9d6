//! Validator verdict tests against the in-memory store.

use crate::assignment::{
    domain::TaskId,
    services::{TaskFields, UserFields, ValidationError, ValidatorError, check_claimed_name},
    tests::support::{Harness, deadline, harness, seed_assigned_task, seed_task, seed_user},
};
use rstest::rstest;
use std::collections::BTreeSet;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn resolve_assignee_returns_existing_user(harness: Harness) {
    let user = seed_user(&harness, "Ada", "ada@example.com").await;

    let resolved = harness
        .coordinator
        .validator()
        .resolve_assignee(user.id())
        .await
        .expect("lookup should succeed");

    assert_eq!(resolved, user);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn resolve_assignee_rejects_missing_user(harness: Harness) {
    let missing = crate::assignment::domain::UserId::new();

    let result = harness
        .coordinator
        .validator()
        .resolve_assignee(missing)
        .await;

    assert!(matches!(
        result,
        Err(ValidatorError::Rejected(ValidationError::AssigneeNotFound(id))) if id == missing
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn claimed_name_must_match_resolved_user(harness: Harness) {
    let user = seed_user(&harness, "Ada", "ada@example.com").await;

    assert!(check_claimed_name("Ada", &user).is_ok());

    let result = check_claimed_name("Grace", &user);
    assert!(matches!(
        result,
        Err(ValidationError::AssigneeNameMismatch { provided, expected })
            if provided == "Grace" && expected == "Ada"
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn batch_rejects_missing_tasks_with_their_ids(harness: Harness) {
    let existing = seed_task(&harness, "Real task").await;
    let missing = TaskId::new();
    let batch: BTreeSet<TaskId> = [existing.id(), missing].into_iter().collect();

    let result = harness
        .coordinator
        .validator()
        .validate_task_batch(&batch, None)
        .await;

    assert!(matches!(
        result,
        Err(ValidatorError::Rejected(ValidationError::TasksNotFound(ids))) if ids == vec![missing]
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn batch_rejects_completed_tasks(harness: Harness) {
    let task = seed_task(&harness, "Done already").await;
    harness
        .coordinator
        .update_task(
            task.id(),
            TaskFields::new("Done already", deadline()).with_completed(true),
        )
        .await
        .expect("completion should succeed");
    let batch: BTreeSet<TaskId> = [task.id()].into_iter().collect();

    let result = harness
        .coordinator
        .validator()
        .validate_task_batch(&batch, None)
        .await;

    assert!(matches!(
        result,
        Err(ValidatorError::Rejected(ValidationError::TasksAlreadyCompleted(ids)))
            if ids == vec![task.id()]
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn batch_rejects_tasks_held_by_another_user(harness: Harness) {
    let holder = seed_user(&harness, "Ada", "ada@example.com").await;
    let task = seed_assigned_task(&harness, "Claimed", &holder).await;
    let batch: BTreeSet<TaskId> = [task.id()].into_iter().collect();

    let claimant = seed_user(&harness, "Grace", "grace@example.com").await;
    let result = harness
        .coordinator
        .validator()
        .validate_task_batch(&batch, Some(claimant.id()))
        .await;

    assert!(matches!(
        result,
        Err(ValidatorError::Rejected(ValidationError::TasksAssignedElsewhere(ids)))
            if ids == vec![task.id()]
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn batch_allows_tasks_already_held_by_owner(harness: Harness) {
    let holder = seed_user(&harness, "Ada", "ada@example.com").await;
    let task = seed_assigned_task(&harness, "Mine", &holder).await;
    let batch: BTreeSet<TaskId> = [task.id()].into_iter().collect();

    let tasks = harness
        .coordinator
        .validator()
        .validate_task_batch(&batch, Some(holder.id()))
        .await
        .expect("idempotent re-claim should pass");

    assert_eq!(tasks.len(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn batch_without_owner_rejects_any_held_task(harness: Harness) {
    let holder = seed_user(&harness, "Ada", "ada@example.com").await;
    let task = seed_assigned_task(&harness, "Held", &holder).await;
    let batch: BTreeSet<TaskId> = [task.id()].into_iter().collect();

    let result = harness
        .coordinator
        .validator()
        .validate_task_batch(&batch, None)
        .await;

    assert!(matches!(
        result,
        Err(ValidatorError::Rejected(ValidationError::TasksAssignedElsewhere(_)))
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn empty_pending_request_is_trivially_valid(harness: Harness) {
    let created = harness
        .coordinator
        .create_user(UserFields::new("Ada", "ada@example.com"))
        .await
        .expect("creation with no pending tasks should succeed");

    assert!(created.pending_tasks().is_empty());
}
