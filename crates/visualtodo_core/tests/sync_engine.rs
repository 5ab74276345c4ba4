mod common;

use chrono::{TimeZone, Utc};
use common::{FakeImageEndpoint, FakeRecordStore, Harness, SlowLocalStore, USER};
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use visualtodo_core::sync::notice::OFFLINE_NOTICE;
use visualtodo_core::{
    notice_channel, Connectivity, LocalStore, NoticeLevel, RemoteError, SyncEngine, Todo, TodoId,
    TodoPatch,
};

fn todo(id: &str, text: &str) -> Todo {
    let created = Utc.with_ymd_and_hms(2026, 1, 10, 8, 0, 0).unwrap();
    Todo::with_id(TodoId::from(id), text, created).unwrap()
}

#[tokio::test]
async fn load_returns_remote_collection_and_marks_online() {
    let harness = Harness::online();
    harness
        .records
        .seed(USER, vec![todo("a", "Buy milk"), todo("b", "Walk dog")]);

    let loaded = harness.engine.load().await;

    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded[0].text, "Buy milk");
    assert_eq!(harness.engine.connectivity(), Connectivity::Online);
}

#[tokio::test]
async fn load_failure_falls_back_to_local_mirror() {
    let harness = Harness::new(FakeRecordStore::failing(), FakeImageEndpoint::new());
    let completed_at = Utc.with_ymd_and_hms(2026, 1, 12, 18, 30, 0).unwrap();
    let mut old = todo("2", "Old");
    old.apply_patch(
        TodoPatch {
            completed: Some(true),
            completed_at: Some(Some(completed_at)),
            ..TodoPatch::default()
        },
        completed_at,
    );
    harness
        .local
        .set(
            &harness.engine.backup_key(),
            &serde_json::to_string(&vec![old.clone()]).unwrap(),
        )
        .unwrap();

    let loaded = harness.engine.load().await;

    assert_eq!(loaded, vec![old]);
    assert_eq!(loaded[0].completed_at, Some(completed_at));
    assert_eq!(harness.engine.connectivity(), Connectivity::Offline);
}

#[tokio::test]
async fn load_failure_without_mirror_is_empty() {
    let harness = Harness::new(FakeRecordStore::failing(), FakeImageEndpoint::new());

    assert!(harness.engine.load().await.is_empty());
    assert_eq!(harness.engine.connectivity(), Connectivity::Offline);
}

#[tokio::test]
async fn unreadable_mirror_is_treated_as_absent() {
    let harness = Harness::new(FakeRecordStore::failing(), FakeImageEndpoint::new());
    harness
        .local
        .set(&harness.engine.backup_key(), "{not json")
        .unwrap();

    assert!(harness.engine.load().await.is_empty());
}

#[tokio::test]
async fn persist_success_writes_remote_and_mirror() {
    let mut harness = Harness::online();
    let todos = vec![todo("a", "Buy milk")];

    let outcome = harness.engine.persist(todos.clone()).await;

    assert_eq!(outcome, Connectivity::Online);
    assert_eq!(harness.records.stored(USER), Some(todos.clone()));
    let mirrored = harness
        .local
        .get(&harness.engine.backup_key())
        .unwrap()
        .unwrap();
    assert_eq!(serde_json::from_str::<Vec<Todo>>(&mirrored).unwrap(), todos);
    assert!(harness.drain_notices().is_empty());
}

#[tokio::test]
async fn persist_failure_goes_offline_and_keeps_local_copy() {
    let mut harness = Harness::new(FakeRecordStore::failing(), FakeImageEndpoint::new());
    let todos = vec![todo("a", "Buy milk")];

    let outcome = harness.engine.persist(todos.clone()).await;

    assert_eq!(outcome, Connectivity::Offline);
    assert_eq!(harness.engine.connectivity(), Connectivity::Offline);
    assert_eq!(harness.records.stored(USER), None);
    let mirrored = harness
        .local
        .get(&harness.engine.backup_key())
        .unwrap()
        .unwrap();
    assert_eq!(serde_json::from_str::<Vec<Todo>>(&mirrored).unwrap(), todos);

    let notices = harness.drain_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Warning);
    assert_eq!(notices[0].message, OFFLINE_NOTICE);
}

#[tokio::test]
async fn next_successful_persist_brings_engine_back_online() {
    let harness = Harness::new(FakeRecordStore::failing(), FakeImageEndpoint::new());
    let mut watcher = harness.engine.watch_connectivity();

    harness.engine.persist(vec![todo("a", "Buy milk")]).await;
    assert!(watcher.has_changed().unwrap());
    assert_eq!(*watcher.borrow_and_update(), Connectivity::Offline);

    harness.records.set_failing(false);
    harness.engine.persist(vec![todo("a", "Buy milk")]).await;
    assert_eq!(*watcher.borrow_and_update(), Connectivity::Online);
}

#[tokio::test]
async fn overlapping_persists_keep_the_last_write_to_finish() {
    let harness = Harness::online();
    let first = vec![todo("a", "Buy milk")];
    let second = vec![todo("b", "Walk dog"), todo("a", "Buy milk")];
    harness
        .records
        .delay_writes_of_len(first.len(), Duration::from_millis(80));

    let slow = harness.engine.spawn_persist(first.clone());
    let fast = harness.engine.spawn_persist(second.clone());
    assert_eq!(fast.await.unwrap(), Connectivity::Online);
    assert_eq!(slow.await.unwrap(), Connectivity::Online);

    assert_eq!(harness.records.writes(), vec![second, first.clone()]);
    assert_eq!(harness.records.stored(USER), Some(first));
}

#[tokio::test]
async fn health_probe_updates_connectivity() {
    let harness = Harness::online();
    harness.records.set_failing(true);
    assert_eq!(harness.engine.health().await, Connectivity::Offline);

    harness.records.set_failing(false);
    assert_eq!(harness.engine.health().await, Connectivity::Online);
}

#[tokio::test]
async fn upload_rejects_malformed_payload_before_calling_endpoint() {
    let harness = Harness::online();

    let err = harness
        .engine
        .upload_image("data:image/png;base64,%%%")
        .await
        .unwrap_err();

    assert!(matches!(err, RemoteError::InvalidImage(_)));
    assert_eq!(harness.images.uploads(), 0);
}

#[tokio::test]
async fn refresh_image_url_resigns_path() {
    let harness = Harness::online();

    let url = harness
        .engine
        .refresh_image_url("user_test0001/todo-image-1.jpg")
        .await
        .unwrap();

    assert_eq!(
        url,
        "https://images.test/user_test0001/todo-image-1.jpg?token=fresh"
    );
}

#[tokio::test]
async fn mirror_is_keyed_per_user() {
    let harness = Harness::online();
    assert_eq!(harness.engine.backup_key(), format!("todos-backup:{USER}"));
}

#[tokio::test]
async fn slow_local_mirror_does_not_stall_the_runtime() {
    let local = SlowLocalStore::new(Duration::from_millis(300));
    let (notice_tx, _notices) = notice_channel();
    let engine = SyncEngine::new(
        USER,
        FakeRecordStore::new(),
        FakeImageEndpoint::new(),
        local.clone(),
        notice_tx,
        Handle::current(),
    );

    let persist = engine.spawn_persist(vec![todo("a", "Buy milk")]);
    let started = Instant::now();
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(started.elapsed() < Duration::from_millis(200));

    assert_eq!(persist.await.unwrap(), Connectivity::Online);
    assert!(local.get(&engine.backup_key()).unwrap().is_some());
}
