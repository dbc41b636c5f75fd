//! In-memory session store for tests, demos, and single-process use.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::session::{Session, DEFAULT_RETAIN_SECS};

use super::r#trait::{ExpiryPolicy, SessionFilter, SessionPatch, SessionStore};

/// In-memory session store
///
/// Passive expiry is modeled as a lazy sweep: documents due for purging
/// under the declared policies are dropped at the start of every operation.
/// That is enough because passive expiry is advisory hygiene; the engine
/// never relies on its timing.
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, Session>>>,
    policies: Vec<ExpiryPolicy>,
}

impl InMemorySessionStore {
    /// Create a store with the standard two expiry policies and the
    /// default verified-session retention
    pub fn new() -> Self {
        Self::with_policies(vec![
            ExpiryPolicy::PendingDeadline,
            ExpiryPolicy::VerifiedRetention {
                retain_secs: DEFAULT_RETAIN_SECS,
            },
        ])
    }

    /// Create a store with explicit expiry policies
    pub fn with_policies(policies: Vec<ExpiryPolicy>) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            policies,
        }
    }

    /// Number of documents currently held, after a sweep
    pub async fn len(&self) -> usize {
        self.sweep().await;
        self.sessions.read().await.len()
    }

    /// Whether the store holds no documents
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn sweep(&self) {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, session| {
            !self
                .policies
                .iter()
                .any(|policy| policy.should_purge(session, now))
        });
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn insert(&self, session: Session) -> Result<Uuid, String> {
        self.sweep().await;
        let id = session.id;
        let mut sessions = self.sessions.write().await;

        if sessions.contains_key(&id) {
            return Err(format!("duplicate session id: {}", id));
        }
        sessions.insert(id, session);
        Ok(id)
    }

    async fn find_one(&self, filter: &SessionFilter) -> Result<Option<Session>, String> {
        self.sweep().await;
        let now = Utc::now();
        let sessions = self.sessions.read().await;
        Ok(sessions
            .values()
            .find(|session| filter.matches(session, now))
            .cloned())
    }

    async fn update(&self, id: Uuid, patch: SessionPatch) -> Result<bool, String> {
        self.sweep().await;
        let mut sessions = self.sessions.write().await;

        if let Some(session) = sessions.get_mut(&id) {
            patch.apply(session);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn remove_where(&self, filter: &SessionFilter) -> Result<u64, String> {
        self.sweep().await;
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;

        let before = sessions.len();
        sessions.retain(|_, session| !filter.matches(session, now));
        Ok((before - sessions.len()) as u64)
    }
}
