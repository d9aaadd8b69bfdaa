// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Conversation-store integration tests against the Firestore emulator.
//!
//! Run with: FIRESTORE_EMULATOR_HOST=localhost:8080 cargo test

use chrono::Utc;
use learnhub::models::Message;

mod common;

fn unique(prefix: &str) -> String {
    format!("{}-{}", prefix, uuid::Uuid::new_v4().simple())
}

#[tokio::test]
async fn test_find_or_create_chatroom_is_idempotent_across_argument_order() {
    require_emulator!();
    let db = common::test_db().await;

    let a = unique("alice");
    let b = unique("bob");

    let first = db.find_or_create_chatroom(&a, &b).await.unwrap();
    let second = db.find_or_create_chatroom(&b, &a).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(first.unread_counts.len(), 2);
    assert_eq!(first.unread_for(&a), Some(0));
    assert_eq!(first.unread_for(&b), Some(0));
}

#[tokio::test]
async fn test_unread_increment_and_reset_roundtrip() {
    require_emulator!();
    let db = common::test_db().await;

    let a = unique("alice");
    let b = unique("bob");
    let room = db.find_or_create_chatroom(&a, &b).await.unwrap();

    assert!(db.increment_unread(&room.id, &b).await.unwrap());
    assert!(db.increment_unread(&room.id, &b).await.unwrap());

    let reloaded = db.get_chatroom(&room.id).await.unwrap().unwrap();
    assert_eq!(reloaded.unread_for(&b), Some(2));
    assert_eq!(reloaded.unread_for(&a), Some(0));

    assert!(db.reset_unread(&room.id, &b).await.unwrap());
    let reloaded = db.get_chatroom(&room.id).await.unwrap().unwrap();
    assert_eq!(reloaded.unread_for(&b), Some(0));
}

#[tokio::test]
async fn test_unread_mutation_on_unknown_chatroom_is_noop() {
    require_emulator!();
    let db = common::test_db().await;

    assert!(!db.increment_unread("missing-room", "nobody").await.unwrap());
    assert!(!db.reset_unread("missing-room", "nobody").await.unwrap());
}

#[tokio::test]
async fn test_message_history_is_ordered() {
    require_emulator!();
    let db = common::test_db().await;

    let a = unique("alice");
    let b = unique("bob");
    let room = db.find_or_create_chatroom(&a, &b).await.unwrap();

    for content in ["one", "two", "three"] {
        let message = Message::new(&a, &room.id, content, Utc::now());
        db.append_message(&message).await.unwrap();
    }

    let history = db.messages_for_chatroom(&room.id).await.unwrap();
    let contents: Vec<&str> = history.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["one", "two", "three"]);
}

#[tokio::test]
async fn test_purchase_ledger_conflict_and_renewal() {
    require_emulator!();
    let db = common::test_db().await;
    let user = unique("user");
    let course = unique("course");
    let now = Utc::now();

    use learnhub::models::PurchaseOutcome;

    let outcome = db
        .record_purchase_atomic(&user, &course, "ref-1", now, 1)
        .await
        .unwrap();
    assert_eq!(outcome, PurchaseOutcome::Recorded);

    // second purchase while the window is active conflicts
    let outcome = db
        .record_purchase_atomic(&user, &course, "ref-2", now, 1)
        .await
        .unwrap();
    assert_eq!(outcome, PurchaseOutcome::AlreadyEntitled);

    // replaying the original reference is an idempotent no-op
    let outcome = db
        .record_purchase_atomic(&user, &course, "ref-1", now, 1)
        .await
        .unwrap();
    assert_eq!(outcome, PurchaseOutcome::AlreadyProcessed);

    // renewal after the window lapses appends
    let later = now + chrono::Duration::days(31);
    let outcome = db
        .record_purchase_atomic(&user, &course, "ref-3", later, 1)
        .await
        .unwrap();
    assert_eq!(outcome, PurchaseOutcome::Recorded);

    let ledger = db.get_entitlement(&user).await.unwrap().unwrap();
    assert_eq!(ledger.purchased_courses[0].windows.len(), 2);
}

#[tokio::test]
async fn test_progress_note_flow() {
    require_emulator!();
    let db = common::test_db().await;
    let user = unique("user");

    // lazy creation on first write, set semantics on duplicates
    assert!(db.add_note(&user, "c1", "l1", "note A").await.unwrap());
    assert!(!db.add_note(&user, "c1", "l1", "note A").await.unwrap());
    db.set_lecture_mark(&user, "c1", "l1", true).await.unwrap();

    let progress = db.get_progress(&user).await.unwrap().unwrap();
    let course = progress.course("c1").unwrap();
    assert!(course.lectures[0].marked);
    assert_eq!(course.lectures[0].notes, vec!["note A".to_string()]);

    // out-of-range delete is NotFound and leaves the list unchanged
    let err = db.delete_note(&user, "c1", "l1", 7).await.unwrap_err();
    assert!(matches!(err, learnhub::error::AppError::NotFound(_)));
    let progress = db.get_progress(&user).await.unwrap().unwrap();
    assert_eq!(progress.course("c1").unwrap().lectures[0].notes.len(), 1);

    db.delete_note(&user, "c1", "l1", 0).await.unwrap();
    let progress = db.get_progress(&user).await.unwrap().unwrap();
    assert!(progress.course("c1").unwrap().lectures[0].notes.is_empty());
}
