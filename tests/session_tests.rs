use ducktherapy::session::{MessageKind, SessionStore};
use serde_json::json;

#[tokio::test]
async fn messages_are_appended_in_order_with_lazy_session_creation() {
    let store = SessionStore::new();
    assert!(store.get("s1").await.is_none());

    store
        .append_message("s1", MessageKind::User, "你好呀", None, Some("basic_chat_flow"))
        .await;
    store
        .append_message("s1", MessageKind::Assistant, "鸭鸭在呢", None, Some("basic_chat_flow"))
        .await;

    let session = store.get("s1").await.unwrap();
    assert_eq!(session.session_id, "s1");
    assert_eq!(session.messages.len(), 2);
    assert_eq!(session.messages[0].kind, MessageKind::User);
    assert_eq!(session.messages[0].text, "你好呀");
    assert_eq!(session.messages[1].kind, MessageKind::Assistant);
    assert_eq!(session.messages[1].workflow_used.as_deref(), Some("basic_chat_flow"));
    assert!(session.last_activity >= session.created_at);
}

#[tokio::test]
async fn emotion_history_is_tracked_separately_from_messages() {
    let store = SessionStore::new();
    store.append_emotion("s1", json!({ "sentiment": "negative" })).await;
    store.append_emotion("s1", json!({ "sentiment": "positive" })).await;

    let session = store.get("s1").await.unwrap();
    assert!(session.messages.is_empty());
    assert_eq!(session.emotion_history.len(), 2);
    assert_eq!(session.emotion_history[1].analysis["sentiment"], "positive");
}

#[tokio::test]
async fn info_reports_counts_without_bodies() {
    let store = SessionStore::new();
    store.append_message("s1", MessageKind::User, "嗨", None, None).await;
    store.append_emotion("s1", json!({ "sentiment": "neutral" })).await;

    let summary = store.info("s1").await.unwrap();
    assert_eq!(summary.message_count, 1);
    assert_eq!(summary.emotion_count, 1);
    assert!(store.info("missing").await.is_none());
}

#[tokio::test]
async fn clear_empties_history_but_keeps_the_session() {
    let store = SessionStore::new();
    store.append_message("s1", MessageKind::User, "嗨", None, None).await;
    let created_at = store.get("s1").await.unwrap().created_at;

    assert!(store.clear("s1").await);
    let session = store.get("s1").await.unwrap();
    assert!(session.messages.is_empty());
    assert!(session.emotion_history.is_empty());
    assert_eq!(session.created_at, created_at);
    assert!(session.last_activity >= created_at);

    assert!(!store.clear("missing").await);
}

#[tokio::test]
async fn delete_removes_the_session_entirely() {
    let store = SessionStore::new();
    store.append_message("s1", MessageKind::User, "嗨", None, None).await;

    assert!(store.delete("s1").await);
    assert!(store.get("s1").await.is_none());
    assert!(!store.delete("s1").await);
    assert_eq!(store.len().await, 0);
}

#[tokio::test]
async fn list_orders_by_most_recent_activity() {
    let store = SessionStore::new();
    store.append_message("old", MessageKind::User, "第一条", None, None).await;
    store.append_message("new", MessageKind::User, "第二条", None, None).await;
    // Touching the older session moves it back to the front.
    store.append_message("old", MessageKind::User, "第三条", None, None).await;

    let summaries = store.list().await;
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].session_id, "old");
    assert_eq!(summaries[1].session_id, "new");
    assert_eq!(summaries[0].message_count, 2);
}
