//! Coordinator tests for the user mutation entry points.

use crate::assignment::{
    domain::{UNASSIGNED_NAME, UserId},
    services::{AssignmentError, TaskFields, UserFields, ValidationError},
    tests::support::{
        Harness, assert_assignment_invariant, deadline, harness, seed_assigned_task, seed_task,
        seed_user, stored_task, stored_user,
    },
};
use rstest::rstest;
use std::collections::BTreeSet;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn create_user_claims_requested_tasks(harness: Harness) {
    let first = seed_task(&harness, "First").await;
    let second = seed_task(&harness, "Second").await;

    let user = harness
        .coordinator
        .create_user(
            UserFields::new("Ada", "ada@example.com")
                .with_pending_tasks([first.id(), second.id()]),
        )
        .await
        .expect("creation should succeed");

    for task_id in [first.id(), second.id()] {
        let task = stored_task(&harness, task_id).expect("task should exist");
        assert_eq!(task.assignment().assignee(), Some(user.id()));
        assert_eq!(task.assignment().display_name(), "Ada");
    }
    assert_eq!(user.pending_tasks().len(), 2);
    assert_assignment_invariant(&harness.store);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn create_user_rejects_already_held_tasks_without_writes(harness: Harness) {
    let holder = seed_user(&harness, "Ada", "ada@example.com").await;
    let task = seed_assigned_task(&harness, "Held", &holder).await;

    let result = harness
        .coordinator
        .create_user(UserFields::new("Grace", "grace@example.com").with_pending_tasks([task.id()]))
        .await;

    assert!(matches!(
        result,
        Err(AssignmentError::Validation(ValidationError::TasksAssignedElsewhere(ids)))
            if ids == vec![task.id()]
    ));
    let untouched = stored_task(&harness, task.id()).expect("task should exist");
    assert_eq!(untouched.assignment().assignee(), Some(holder.id()));
    assert_eq!(harness.store.all_users().expect("listing").len(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn create_user_rejects_duplicate_email_at_commit(harness: Harness) {
    let _ = seed_user(&harness, "Ada", "shared@example.com").await;

    let result = harness
        .coordinator
        .create_user(UserFields::new("Grace", "shared@example.com"))
        .await;

    assert!(matches!(result, Err(AssignmentError::DuplicateEmail(_))));
    assert_eq!(harness.store.all_users().expect("listing").len(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn update_user_claims_and_releases_to_match_request(harness: Harness) {
    let user = seed_user(&harness, "Ada", "ada@example.com").await;
    let kept = seed_assigned_task(&harness, "Kept", &user).await;
    let dropped = seed_assigned_task(&harness, "Dropped", &user).await;
    let gained = seed_task(&harness, "Gained").await;

    let updated = harness
        .coordinator
        .update_user(
            user.id(),
            UserFields::new("Ada", "ada@example.com")
                .with_pending_tasks([kept.id(), gained.id()]),
        )
        .await
        .expect("update should succeed");

    let expected: BTreeSet<_> = [kept.id(), gained.id()].into_iter().collect();
    assert_eq!(updated.pending_tasks(), &expected);

    let released = stored_task(&harness, dropped.id()).expect("task should exist");
    assert_eq!(released.assignment().assignee(), None);
    assert_eq!(released.assignment().display_name(), UNASSIGNED_NAME);

    let claimed = stored_task(&harness, gained.id()).expect("task should exist");
    assert_eq!(claimed.assignment().assignee(), Some(user.id()));
    assert_assignment_invariant(&harness.store);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn resubmitting_the_same_pending_set_is_idempotent(harness: Harness) {
    let user = seed_user(&harness, "Ada", "ada@example.com").await;
    let task = seed_assigned_task(&harness, "Stable", &user).await;
    let fields =
        UserFields::new("Ada", "ada@example.com").with_pending_tasks([task.id()]);

    let first = harness
        .coordinator
        .update_user(user.id(), fields.clone())
        .await
        .expect("first update should succeed");
    let second = harness
        .coordinator
        .update_user(user.id(), fields)
        .await
        .expect("second update should succeed");

    assert_eq!(first, second);
    assert_eq!(
        stored_user(&harness, user.id()).expect("user should exist"),
        second
    );
    assert_assignment_invariant(&harness.store);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn renaming_a_user_refreshes_cached_task_names(harness: Harness) {
    let user = seed_user(&harness, "Ada", "ada@example.com").await;
    let task = seed_assigned_task(&harness, "Branded", &user).await;

    harness
        .coordinator
        .update_user(
            user.id(),
            UserFields::new("Ada Lovelace", "ada@example.com")
                .with_pending_tasks([task.id()]),
        )
        .await
        .expect("rename should succeed");

    let refreshed = stored_task(&harness, task.id()).expect("task should exist");
    assert_eq!(refreshed.assignment().display_name(), "Ada Lovelace");
    assert_assignment_invariant(&harness.store);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn renaming_a_user_refreshes_names_on_completed_tasks(harness: Harness) {
    let user = seed_user(&harness, "Ada", "ada@example.com").await;
    let task = seed_assigned_task(&harness, "Finished work", &user).await;
    harness
        .coordinator
        .update_task(
            task.id(),
            TaskFields::new("Finished work", deadline())
                .with_completed(true)
                .with_assignee(user.id(), "Ada"),
        )
        .await
        .expect("completion should succeed");

    harness
        .coordinator
        .update_user(user.id(), UserFields::new("Ada Lovelace", "ada@example.com"))
        .await
        .expect("rename should succeed");

    // The completed task still points at the user and must carry the
    // new name.
    let refreshed = stored_task(&harness, task.id()).expect("task should exist");
    assert_eq!(refreshed.assignment().assignee(), Some(user.id()));
    assert_eq!(refreshed.assignment().display_name(), "Ada Lovelace");
    assert_assignment_invariant(&harness.store);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn update_user_rejects_email_held_by_another(harness: Harness) {
    let _ = seed_user(&harness, "Ada", "ada@example.com").await;
    let grace = seed_user(&harness, "Grace", "grace@example.com").await;

    let result = harness
        .coordinator
        .update_user(grace.id(), UserFields::new("Grace", "ada@example.com"))
        .await;

    assert!(matches!(result, Err(AssignmentError::DuplicateEmail(_))));
    let unchanged = stored_user(&harness, grace.id()).expect("user should exist");
    assert_eq!(unchanged.email().as_str(), "grace@example.com");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn update_user_keeps_its_own_email(harness: Harness) {
    let user = seed_user(&harness, "Ada", "ada@example.com").await;

    let updated = harness
        .coordinator
        .update_user(user.id(), UserFields::new("Ada", "ada@example.com"))
        .await
        .expect("no-op email update should succeed");

    assert_eq!(updated.email().as_str(), "ada@example.com");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn update_user_rejects_completed_task_claims(harness: Harness) {
    let user = seed_user(&harness, "Ada", "ada@example.com").await;
    let task = seed_task(&harness, "Finished").await;
    harness
        .coordinator
        .update_task(
            task.id(),
            TaskFields::new("Finished", deadline()).with_completed(true),
        )
        .await
        .expect("completion should succeed");

    let result = harness
        .coordinator
        .update_user(
            user.id(),
            UserFields::new("Ada", "ada@example.com").with_pending_tasks([task.id()]),
        )
        .await;

    assert!(matches!(
        result,
        Err(AssignmentError::Validation(ValidationError::TasksAlreadyCompleted(ids)))
            if ids == vec![task.id()]
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn conflicting_claim_is_rejected_with_no_writes(harness: Harness) {
    let ada = seed_user(&harness, "Ada", "ada@example.com").await;
    let grace = seed_user(&harness, "Grace", "grace@example.com").await;
    let task = seed_assigned_task(&harness, "Contested", &ada).await;

    let result = harness
        .coordinator
        .update_user(
            grace.id(),
            UserFields::new("Grace", "grace@example.com").with_pending_tasks([task.id()]),
        )
        .await;

    assert!(matches!(
        result,
        Err(AssignmentError::Validation(ValidationError::TasksAssignedElsewhere(ids)))
            if ids == vec![task.id()]
    ));
    let untouched = stored_task(&harness, task.id()).expect("task should exist");
    assert_eq!(untouched.assignment().assignee(), Some(ada.id()));
    let unchanged = stored_user(&harness, grace.id()).expect("user should exist");
    assert!(unchanged.pending_tasks().is_empty());
    assert_assignment_invariant(&harness.store);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn update_rejects_missing_user(harness: Harness) {
    let missing = UserId::new();

    let result = harness
        .coordinator
        .update_user(missing, UserFields::new("Ghost", "ghost@example.com"))
        .await;

    assert!(matches!(
        result,
        Err(AssignmentError::UserNotFound(id)) if id == missing
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deleting_a_user_unassigns_every_held_task(harness: Harness) {
    let user = seed_user(&harness, "Ada", "ada@example.com").await;
    let first = seed_assigned_task(&harness, "First", &user).await;
    let second = seed_assigned_task(&harness, "Second", &user).await;

    harness
        .coordinator
        .delete_user(user.id())
        .await
        .expect("deletion should succeed");

    assert!(stored_user(&harness, user.id()).is_none());
    for task_id in [first.id(), second.id()] {
        let task = stored_task(&harness, task_id).expect("task should survive");
        assert_eq!(task.assignment().assignee(), None);
        assert_eq!(task.assignment().display_name(), UNASSIGNED_NAME);
    }
    assert_assignment_invariant(&harness.store);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn delete_rejects_missing_user(harness: Harness) {
    let missing = UserId::new();

    let result = harness.coordinator.delete_user(missing).await;

    assert!(matches!(
        result,
        Err(AssignmentError::UserNotFound(id)) if id == missing
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn blank_user_fields_are_domain_errors(harness: Harness) {
    let empty_name = harness
        .coordinator
        .create_user(UserFields::new("  ", "ada@example.com"))
        .await;
    assert!(matches!(empty_name, Err(AssignmentError::Domain(_))));

    let empty_email = harness
        .coordinator
        .create_user(UserFields::new("Ada", "   "))
        .await;
    assert!(matches!(empty_email, Err(AssignmentError::Domain(_))));
}
