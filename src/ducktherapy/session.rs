//! In-memory session ledger.
//!
//! Everything lives in one process: a `RwLock<HashMap>` keyed by session id.
//! Sessions are created lazily on first append and survive until `delete` —
//! there is deliberately no persistence layer behind this.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize)]
pub struct StoredMessage {
    pub id: Uuid,
    pub kind: MessageKind,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emotion_analysis: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow_used: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmotionEntry {
    pub timestamp: DateTime<Utc>,
    pub analysis: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub messages: Vec<StoredMessage>,
    pub emotion_history: Vec<EmotionEntry>,
}

impl Session {
    fn new(session_id: &str) -> Self {
        let now = Utc::now();
        Session {
            session_id: session_id.to_string(),
            created_at: now,
            last_activity: now,
            messages: Vec::new(),
            emotion_history: Vec::new(),
        }
    }
}

/// Counts and timestamps without message bodies.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub message_count: usize,
    pub emotion_count: usize,
}

impl SessionSummary {
    fn of(session: &Session) -> Self {
        SessionSummary {
            session_id: session.session_id.clone(),
            created_at: session.created_at,
            last_activity: session.last_activity,
            message_count: session.messages.len(),
            emotion_count: session.emotion_history.len(),
        }
    }
}

#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        SessionStore::default()
    }

    /// Append a message, creating the session if needed.  Returns the
    /// message id.
    pub async fn append_message(
        &self,
        session_id: &str,
        kind: MessageKind,
        text: &str,
        emotion_analysis: Option<Value>,
        workflow_used: Option<&str>,
    ) -> Uuid {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| Session::new(session_id));
        let id = Uuid::new_v4();
        session.messages.push(StoredMessage {
            id,
            kind,
            text: text.to_string(),
            timestamp: Utc::now(),
            emotion_analysis,
            workflow_used: workflow_used.map(String::from),
        });
        session.last_activity = Utc::now();
        id
    }

    pub async fn append_emotion(&self, session_id: &str, analysis: Value) {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| Session::new(session_id));
        session.emotion_history.push(EmotionEntry {
            timestamp: Utc::now(),
            analysis,
        });
        session.last_activity = Utc::now();
    }

    pub async fn get(&self, session_id: &str) -> Option<Session> {
        self.sessions.read().await.get(session_id).cloned()
    }

    pub async fn info(&self, session_id: &str) -> Option<SessionSummary> {
        self.sessions.read().await.get(session_id).map(SessionSummary::of)
    }

    /// Empty a session's history but keep the session itself (and its
    /// creation time), touching last_activity.
    pub async fn clear(&self, session_id: &str) -> bool {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(session_id) {
            Some(session) => {
                session.messages.clear();
                session.emotion_history.clear();
                session.last_activity = Utc::now();
                true
            }
            None => false,
        }
    }

    pub async fn delete(&self, session_id: &str) -> bool {
        self.sessions.write().await.remove(session_id).is_some()
    }

    /// Summaries of every session, most recently active first.
    pub async fn list(&self) -> Vec<SessionSummary> {
        let sessions = self.sessions.read().await;
        let mut summaries: Vec<SessionSummary> = sessions.values().map(SessionSummary::of).collect();
        summaries.sort_by(|a, b| b.last_activity.cmp(&a.last_activity));
        summaries
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
