#![allow(clippy::unwrap_used, clippy::expect_used)]

use fieldreport_core::AnswerValue;
use fieldreport_session::{
    ConversationSession, FileSessionStore, InMemorySessionStore, SessionStatus, SessionStore,
};

/// Helper: create a FileSessionStore in a temp directory.
async fn temp_store() -> (FileSessionStore, tempfile::TempDir) {
    let tmp = tempfile::tempdir().unwrap();
    let store = FileSessionStore::new(tmp.path().join("sessions"))
        .await
        .unwrap();
    (store, tmp)
}

#[tokio::test]
async fn test_put_and_get_session() {
    let (store, _tmp) = temp_store().await;
    let session = ConversationSession::new("1001");

    store.put(&session).await.unwrap();

    let loaded = store.get("1001").await.unwrap().unwrap();
    assert_eq!(loaded.user_id, "1001");
    assert_eq!(loaded.current_step, 0);
    assert!(loaded.answers.is_empty());
}

#[tokio::test]
async fn test_get_nonexistent_returns_none() {
    let (store, _tmp) = temp_store().await;
    assert!(store.get("nobody").await.unwrap().is_none());
}

#[tokio::test]
async fn test_put_overwrites_in_place() {
    let (store, _tmp) = temp_store().await;
    let mut session = ConversationSession::new("1001");
    store.put(&session).await.unwrap();

    session.set_answer("object", AnswerValue::Text("Warehouse".into()));
    session.advance(3);
    store.put(&session).await.unwrap();

    let loaded = store.get("1001").await.unwrap().unwrap();
    assert_eq!(loaded.current_step, 1);
    assert_eq!(
        loaded.answer("object"),
        Some(&AnswerValue::Text("Warehouse".into()))
    );
    assert_eq!(store.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_remove_session() {
    let (store, _tmp) = temp_store().await;
    store.put(&ConversationSession::new("1001")).await.unwrap();
    store.remove("1001").await.unwrap();
    assert!(store.get("1001").await.unwrap().is_none());

    // Removing again is fine.
    store.remove("1001").await.unwrap();
}

#[tokio::test]
async fn test_list_returns_user_ids_even_when_sanitized() {
    let (store, _tmp) = temp_store().await;
    store.put(&ConversationSession::new("-100200")).await.unwrap();
    store.put(&ConversationSession::new("user/with:odd")).await.unwrap();

    let mut ids = store.list().await.unwrap();
    ids.sort();
    assert_eq!(ids, vec!["-100200".to_string(), "user/with:odd".to_string()]);

    let odd = store.get("user/with:odd").await.unwrap().unwrap();
    assert_eq!(odd.user_id, "user/with:odd");
}

#[tokio::test]
async fn test_file_store_persists_across_instances() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("sessions");
    {
        let store = FileSessionStore::new(dir.clone()).await.unwrap();
        let mut session = ConversationSession::new("7");
        session.advance(1);
        store.put(&session).await.unwrap();
    }
    let store = FileSessionStore::new(dir).await.unwrap();
    let loaded = store.get("7").await.unwrap().unwrap();
    assert_eq!(loaded.status, SessionStatus::AwaitingConfirmation);
}

#[tokio::test]
async fn test_corrupt_file_is_a_session_error() {
    let (store, tmp) = temp_store().await;
    std::fs::write(tmp.path().join("sessions").join("9.json"), "{not json").unwrap();
    let err = store.get("9").await.unwrap_err();
    assert!(err.to_string().contains("Session error"));
}

#[tokio::test]
async fn test_put_replaces_file_without_leftovers() {
    let (store, tmp) = temp_store().await;
    let dir = tmp.path().join("sessions");
    std::fs::write(dir.join("5.json"), "{truncated").unwrap();

    store.put(&ConversationSession::new("5")).await.unwrap();

    let names: Vec<String> = std::fs::read_dir(&dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["5.json".to_string()]);
    assert_eq!(store.get("5").await.unwrap().unwrap().current_step, 0);
}

#[tokio::test]
async fn test_memory_store_basic_lifecycle() {
    let store = InMemorySessionStore::new();
    store.put(&ConversationSession::new("a")).await.unwrap();
    store.put(&ConversationSession::new("b")).await.unwrap();
    assert_eq!(store.list().await.unwrap().len(), 2);

    store.remove("a").await.unwrap();
    assert!(store.get("a").await.unwrap().is_none());
    assert!(store.get("b").await.unwrap().is_some());
}
