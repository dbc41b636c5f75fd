//! Session store trait and its filter/patch vocabulary.
//!
//! The engine treats the store as a plain document collection: insert,
//! find-one, patch-by-id, and delete-by-filter. The two passive expiry
//! policies are declared at store construction time and are advisory
//! storage hygiene only; the engine re-checks deadlines itself.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entities::session::Session;

/// Passive store-side expiry policy, declared at collection creation time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryPolicy {
    /// Purge documents once their `expire_at` deadline has passed
    PendingDeadline,

    /// Purge documents once `verify_at` plus the retention has passed
    VerifiedRetention { retain_secs: i64 },
}

impl ExpiryPolicy {
    /// Evaluates whether `session` should be purged under this policy
    pub fn should_purge(&self, session: &Session, now: DateTime<Utc>) -> bool {
        match self {
            ExpiryPolicy::PendingDeadline => matches!(
                (session.verify_at, session.expire_at),
                (None, Some(deadline)) if now > deadline
            ),
            ExpiryPolicy::VerifiedRetention { retain_secs } => matches!(
                session.verify_at,
                Some(verified) if now > verified + chrono::Duration::seconds(*retain_secs)
            ),
        }
    }
}

/// Filter over session documents
///
/// Unset fields match everything; a default filter matches every document.
#[derive(Debug, Clone, Default)]
pub struct SessionFilter {
    /// Match a specific document id
    pub id: Option<Uuid>,
    /// Match a verification scope
    pub scope_key: Option<String>,
    /// Match the owning caller identity
    pub owner: Option<String>,
    /// Match only sessions still awaiting verification with a live deadline
    pub pending_only: bool,
}

impl SessionFilter {
    /// Filter by document id
    pub fn by_id(id: Uuid) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    /// Filter by verification scope
    pub fn by_scope(scope_key: impl Into<String>) -> Self {
        Self {
            scope_key: Some(scope_key.into()),
            ..Self::default()
        }
    }

    /// Restrict to sessions owned by `owner`
    pub fn owned_by(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// Restrict to pending sessions
    pub fn pending(mut self) -> Self {
        self.pending_only = true;
        self
    }

    /// Evaluates the filter against a session at time `now`
    pub fn matches(&self, session: &Session, now: DateTime<Utc>) -> bool {
        if let Some(id) = self.id {
            if session.id != id {
                return false;
            }
        }
        if let Some(scope_key) = &self.scope_key {
            if &session.scope_key != scope_key {
                return false;
            }
        }
        if let Some(owner) = &self.owner {
            if &session.owner != owner {
                return false;
            }
        }
        if self.pending_only {
            let live = matches!(session.expire_at, Some(deadline) if deadline > now);
            if session.verify_at.is_some() || !live {
                return false;
            }
        }
        true
    }
}

/// Partial update applied to a single session document
#[derive(Debug, Clone, Default)]
pub struct SessionPatch {
    /// Set `verify_at` to this timestamp
    pub verify_at: Option<DateTime<Utc>>,
    /// Unset the pending deadline
    pub clear_expire_at: bool,
    /// Unset the stored token
    pub clear_token: bool,
}

impl SessionPatch {
    /// The verification patch: set `verify_at = now`, clear `expire_at`
    /// and `token`
    pub fn verified_now() -> Self {
        Self {
            verify_at: Some(Utc::now()),
            clear_expire_at: true,
            clear_token: true,
        }
    }

    /// Applies the patch to a session in place
    pub fn apply(&self, session: &mut Session) {
        if let Some(verify_at) = self.verify_at {
            session.verify_at = Some(verify_at);
        }
        if self.clear_expire_at {
            session.expire_at = None;
        }
        if self.clear_token {
            session.token = None;
        }
    }
}

/// Document store interface the verification engine depends on
///
/// Implementations are expected to apply the `ExpiryPolicy` declarations
/// they were created with as an eventual background concern. Read-modify-
/// write across `find_one` and `update` is not assumed atomic; the engine
/// treats a lost update as an ordinary negative outcome.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Insert a new session document, returning its id
    async fn insert(&self, session: Session) -> Result<Uuid, String>;

    /// Find the first document matching `filter`
    async fn find_one(&self, filter: &SessionFilter) -> Result<Option<Session>, String>;

    /// Apply `patch` to the document with `id`
    ///
    /// Returns `false` if no such document exists.
    async fn update(&self, id: Uuid, patch: SessionPatch) -> Result<bool, String>;

    /// Remove every document matching `filter`, returning the count removed
    async fn remove_where(&self, filter: &SessionFilter) -> Result<u64, String>;
}
