//! In-memory session storage
//!
//! Holds one DialogueEngine per conversation. Nothing outlives the process.
//! The store lock also serializes turns, so a session never sees two
//! messages at once.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::conversation::Turn;

use super::catalog::ResponseCatalog;
use super::context::ConversationContext;
use super::engine::{DialogueEngine, Reply};
use super::rules::RuleSet;

/// Summary of a live session
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub session_id: Uuid,
    pub turns: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

struct Session {
    engine: DialogueEngine,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Session {
    fn info(&self, session_id: Uuid) -> SessionInfo {
        SessionInfo {
            session_id,
            turns: self.engine.history().len(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Errors from session operations
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Session not found: {0}")]
    NotFound(Uuid),

    #[error("Session limit reached ({0} live sessions)")]
    LimitReached(usize),
}

/// Store of live conversations sharing one catalog and rule set
pub struct SessionStore {
    catalog: Arc<ResponseCatalog>,
    rules: Arc<RuleSet>,
    seed: Option<u64>,
    max_sessions: Option<usize>,
    sessions: Mutex<HashMap<Uuid, Session>>,
}

impl SessionStore {
    /// Create a store. With a seed, every new session picks replies reproducibly.
    pub fn new(catalog: ResponseCatalog, seed: Option<u64>) -> Self {
        Self {
            catalog: Arc::new(catalog),
            rules: Arc::new(RuleSet::standard()),
            seed,
            max_sessions: None,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Refuse new sessions once `max` are live
    pub fn with_max_sessions(mut self, max: usize) -> Self {
        self.max_sessions = Some(max);
        self
    }

    /// Start a new conversation and return its id and greeting history
    pub async fn create(&self) -> Result<(Uuid, Vec<Turn>), SessionError> {
        let mut sessions = self.sessions.lock().await;
        if let Some(max) = self.max_sessions {
            if sessions.len() >= max {
                tracing::warn!(max, "Session limit reached");
                return Err(SessionError::LimitReached(max));
            }
        }

        let id = Uuid::new_v4();
        let engine =
            DialogueEngine::from_parts(Arc::clone(&self.catalog), Arc::clone(&self.rules), self.seed);
        let history = engine.history().to_vec();
        let now = Utc::now();

        sessions.insert(
            id,
            Session {
                engine,
                created_at: now,
                updated_at: now,
            },
        );

        tracing::info!(session_id = %id, "Session created");
        Ok((id, history))
    }

    /// Run one turn in a session
    pub async fn send(&self, id: Uuid, message: &str) -> Result<Reply, SessionError> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions.get_mut(&id).ok_or(SessionError::NotFound(id))?;

        let reply = session.engine.respond(message);
        session.touch();

        tracing::debug!(session_id = %id, source = %reply.source, "Turn completed");
        Ok(reply)
    }

    /// Snapshot of a session's history
    pub async fn history(&self, id: Uuid) -> Result<Vec<Turn>, SessionError> {
        let sessions = self.sessions.lock().await;
        let session = sessions.get(&id).ok_or(SessionError::NotFound(id))?;
        Ok(session.engine.history().to_vec())
    }

    /// Snapshot of what has been inferred about the user
    pub async fn context(&self, id: Uuid) -> Result<ConversationContext, SessionError> {
        let sessions = self.sessions.lock().await;
        let session = sessions.get(&id).ok_or(SessionError::NotFound(id))?;
        Ok(session.engine.context().clone())
    }

    /// Reset a session to its greeting, returning the new history
    pub async fn reset(&self, id: Uuid) -> Result<Vec<Turn>, SessionError> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions.get_mut(&id).ok_or(SessionError::NotFound(id))?;

        session.engine.reset();
        session.touch();

        tracing::info!(session_id = %id, "Session reset");
        Ok(session.engine.history().to_vec())
    }

    /// Drop a session entirely
    pub async fn delete(&self, id: Uuid) -> Result<(), SessionError> {
        self.sessions
            .lock()
            .await
            .remove(&id)
            .ok_or(SessionError::NotFound(id))?;

        tracing::info!(session_id = %id, "Session deleted");
        Ok(())
    }

    /// Drop sessions with no activity for `max_idle`; returns how many went
    pub async fn evict_idle(&self, max_idle: Duration) -> usize {
        let cutoff = Utc::now() - max_idle;
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, session| session.updated_at > cutoff);

        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::info!(evicted, remaining = sessions.len(), "Evicted idle sessions");
        }
        evicted
    }

    /// Live sessions, most recently active first
    pub async fn list(&self) -> Vec<SessionInfo> {
        let sessions = self.sessions.lock().await;
        let mut infos: Vec<SessionInfo> = sessions
            .iter()
            .map(|(id, session)| session.info(*id))
            .collect();
        infos.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        infos
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(ResponseCatalog::default(), None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::RiskTolerance;
    use crate::core::engine::ReplySource;

    #[tokio::test]
    async fn test_session_lifecycle() {
        let store = SessionStore::default();
        let (id, history) = store.create().await.unwrap();
        assert_eq!(history.len(), 1);

        let reply = store.send(id, "I prefer safe investments").await.unwrap();
        assert_eq!(reply.source, ReplySource::Rule("risk_tolerance"));

        let context = store.context(id).await.unwrap();
        assert_eq!(context.risk_tolerance, Some(RiskTolerance::Conservative));
        assert_eq!(store.history(id).await.unwrap().len(), 3);

        let history = store.reset(id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert!(store.context(id).await.unwrap().is_empty());

        store.delete(id).await.unwrap();
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = SessionStore::default();
        let (a, _) = store.create().await.unwrap();
        let (b, _) = store.create().await.unwrap();

        store.send(a, "I'm an aggressive investor").await.unwrap();

        assert!(store.context(b).await.unwrap().is_empty());
        assert_eq!(store.history(b).await.unwrap().len(), 1);
        assert_eq!(store.list().await.len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let store = SessionStore::default();
        let id = Uuid::new_v4();

        assert!(matches!(store.send(id, "hi").await, Err(SessionError::NotFound(_))));
        assert!(matches!(store.reset(id).await, Err(SessionError::NotFound(_))));
        assert!(store.delete(id).await.is_err());
    }

    #[tokio::test]
    async fn test_idle_sessions_are_evicted() {
        let store = SessionStore::default();
        for _ in 0..5 {
            store.create().await.unwrap();
        }

        assert_eq!(store.evict_idle(Duration::hours(1)).await, 0);
        assert_eq!(store.len().await, 5);

        assert_eq!(store.evict_idle(Duration::zero()).await, 5);
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_active_session_survives_eviction() {
        let store = SessionStore::default();
        let (stale, _) = store.create().await.unwrap();
        let (active, _) = store.create().await.unwrap();

        {
            let mut sessions = store.sessions.lock().await;
            sessions.get_mut(&stale).unwrap().updated_at = Utc::now() - Duration::hours(2);
        }
        store.send(active, "hello").await.unwrap();

        assert_eq!(store.evict_idle(Duration::hours(1)).await, 1);
        assert!(store.history(active).await.is_ok());
        assert!(matches!(store.history(stale).await, Err(SessionError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_session_limit() {
        let store = SessionStore::default().with_max_sessions(2);
        let (first, _) = store.create().await.unwrap();
        store.create().await.unwrap();

        assert!(matches!(store.create().await, Err(SessionError::LimitReached(2))));
        assert_eq!(store.len().await, 2);

        store.delete(first).await.unwrap();
        assert!(store.create().await.is_ok());
    }

    #[test]
    fn test_seeded_sessions_repeat_replies() {
        let store = SessionStore::new(ResponseCatalog::default(), Some(9));

        let replies = tokio_test::block_on(async {
            let (a, _) = store.create().await.unwrap();
            let (b, _) = store.create().await.unwrap();
            let first = store.send(a, "no idea").await.unwrap().text;
            let second = store.send(b, "no idea").await.unwrap().text;
            (first, second)
        });

        assert_eq!(replies.0, replies.1);
    }
}
