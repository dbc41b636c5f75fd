//! Verification session entity for challenge-response confirmation flows.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default lifetime of a pending session in seconds (5 minutes)
pub const DEFAULT_EXPIRY_SECS: i64 = 5 * 60;

/// Default retention of a verified session in seconds (5 minutes)
pub const DEFAULT_RETAIN_SECS: i64 = 5 * 60;

/// Default length of a generated token
pub const DEFAULT_TOKEN_LENGTH: usize = 6;

/// A single challenge-response verification session
///
/// A session is *pending* while `verify_at` is absent and `expire_at` is
/// present and in the future. Successful verification sets `verify_at`
/// exactly once and clears `token` and `expire_at`; from then on the
/// document is immutable until the store's retention purge removes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Unique identifier, assigned at creation
    pub id: Uuid,

    /// Identifier of the verification scope; at most one pending session
    /// may exist per scope at any time
    pub scope_key: String,

    /// Identity of the authenticated caller who requested the token
    pub owner: String,

    /// The secret the user must echo back; present only while pending
    pub token: Option<String>,

    /// Name of the delivery factor the token was sent through
    pub factor: String,

    /// Timestamp when the session was created
    pub created_at: DateTime<Utc>,

    /// Pending-session deadline; cleared on verification
    pub expire_at: Option<DateTime<Utc>>,

    /// Timestamp of successful verification; absence means pending
    pub verify_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Creates a new pending session
    ///
    /// # Arguments
    ///
    /// * `scope_key` - Verification scope the session belongs to
    /// * `owner` - Identity of the requesting caller
    /// * `token` - The generated one-time token
    /// * `factor` - Name of the delivery factor used
    /// * `expiry_secs` - Seconds until the session stops being verifiable
    ///
    /// # Returns
    ///
    /// A new pending `Session` with `expire_at = now + expiry_secs`
    pub fn new(
        scope_key: impl Into<String>,
        owner: impl Into<String>,
        token: impl Into<String>,
        factor: impl Into<String>,
        expiry_secs: i64,
    ) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4(),
            scope_key: scope_key.into(),
            owner: owner.into(),
            token: Some(token.into()),
            factor: factor.into(),
            created_at: now,
            expire_at: Some(now + Duration::seconds(expiry_secs)),
            verify_at: None,
        }
    }

    /// Checks if the session has been successfully verified
    pub fn is_verified(&self) -> bool {
        self.verify_at.is_some()
    }

    /// Checks if the pending deadline has passed
    ///
    /// A session without an `expire_at` that is not verified is treated
    /// as expired: it cannot be a live challenge.
    pub fn is_expired(&self) -> bool {
        if self.is_verified() {
            return false;
        }
        match self.expire_at {
            Some(deadline) => Utc::now() > deadline,
            None => true,
        }
    }

    /// Checks if the session is pending
    ///
    /// # Returns
    ///
    /// `true` iff `verify_at` is absent and `expire_at` is present and in
    /// the future
    pub fn is_pending(&self) -> bool {
        !self.is_verified() && !self.is_expired()
    }

    /// Marks the session as verified
    ///
    /// Sets `verify_at` and clears `token` and `expire_at`. The transition
    /// happens exactly once; calling this on an already-verified session is
    /// a no-op.
    ///
    /// # Returns
    ///
    /// `true` if the state changed, `false` if the session was already
    /// verified
    pub fn mark_verified(&mut self) -> bool {
        if self.is_verified() {
            return false;
        }
        self.verify_at = Some(Utc::now());
        self.expire_at = None;
        self.token = None;
        true
    }

    /// Gets the time remaining until the pending deadline
    ///
    /// # Returns
    ///
    /// A `Duration` until expiry, or zero if expired or verified
    pub fn time_until_expiry(&self) -> Duration {
        let now = Utc::now();
        match self.expire_at {
            Some(deadline) if deadline > now => deadline - now,
            _ => Duration::zero(),
        }
    }
}
