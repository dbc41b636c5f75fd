//! Verification engine: session lifecycle and challenge-response state machine.

use constant_time_eq::constant_time_eq;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing;
use uuid::Uuid;

use crate::domain::entities::contact::ContactProfile;
use crate::domain::entities::session::Session;
use crate::errors::{AffirmError, AffirmResult};
use crate::repositories::session::{SessionFilter, SessionPatch, SessionStore};
use crate::services::governor::{FixedWindowGovernor, GovernorConfig, RequestGovernor};

use super::config::AffirmConfig;
use super::generator::{SecureTokenGenerator, TokenGenerator};
use super::registry::{FactorEntry, FactorRegistry};
use super::traits::{ContactResolver, DeliveryFactor};

/// The fixed, enumerable set of engine operations
///
/// Transport adapters bind each of these to an endpoint, namespaced per
/// engine instance via [`AffirmService::operation_name`].
pub const OPERATIONS: [&str; 5] = [
    "requestToken",
    "verifyToken",
    "invalidateSession",
    "assertOpenSession",
    "verifyContact",
];

/// Verification engine for challenge-response confirmation sessions
///
/// Holds no mutable state of its own beyond the factor registry (which is
/// administrative); the session store is the only shared mutable resource.
pub struct AffirmService<S: SessionStore, R: ContactResolver> {
    /// Unique identifier of this engine instance, used to namespace
    /// operation names so independent engines can coexist
    instance_id: String,
    /// Session document store
    store: Arc<S>,
    /// Contact profile resolver
    contacts: Arc<R>,
    /// Registered delivery factors
    factors: FactorRegistry,
    /// One-time token source
    generator: Arc<dyn TokenGenerator>,
    /// Per-identity request throttle
    governor: Arc<dyn RequestGovernor>,
    /// Engine configuration
    config: AffirmConfig,
}

impl<S: SessionStore, R: ContactResolver> AffirmService<S, R> {
    /// Create a new verification engine
    ///
    /// Uses the default secure alphanumeric token generator and a
    /// fixed-window governor built from `config`; swap either with
    /// [`Self::with_generator`] / [`Self::with_governor`].
    ///
    /// # Arguments
    ///
    /// * `instance_id` - Unique identifier for this engine instance
    /// * `store` - Session store implementation
    /// * `contacts` - Contact profile resolver
    /// * `config` - Engine configuration
    pub fn new(
        instance_id: impl Into<String>,
        store: Arc<S>,
        contacts: Arc<R>,
        config: AffirmConfig,
    ) -> Self {
        let governor = Arc::new(FixedWindowGovernor::new(GovernorConfig {
            limit: config.request_limit,
            window_secs: config.request_window_secs,
        }));

        Self {
            instance_id: instance_id.into(),
            store,
            contacts,
            factors: FactorRegistry::new(),
            generator: Arc::new(SecureTokenGenerator::new(config.token_length)),
            governor,
            config,
        }
    }

    /// Replace the token generator
    pub fn with_generator(mut self, generator: Arc<dyn TokenGenerator>) -> Self {
        self.generator = generator;
        self
    }

    /// Replace the request governor
    pub fn with_governor(mut self, governor: Arc<dyn RequestGovernor>) -> Self {
        self.governor = governor;
        self
    }

    /// Unique identifier of this engine instance
    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Namespaced name of an operation, e.g. `TokenAffirm:billing/requestToken`
    pub fn operation_name(&self, operation: &str) -> String {
        format!("{}:{}/{}", self.config.profile, self.instance_id, operation)
    }

    /// Register a delivery factor; re-registering a name overwrites it
    ///
    /// Administrative call, not expected to race with in-flight requests.
    pub async fn add_factor(
        &self,
        name: impl Into<String>,
        sender: Arc<dyn DeliveryFactor>,
        settings: Option<serde_json::Value>,
    ) {
        self.factors.add_factor(name, sender, settings).await;
    }

    /// Request a one-time token for `scope_key`, delivered out-of-band
    ///
    /// Any pending session for the scope is superseded first, so at most
    /// one open challenge exists per scope. The supersede-then-insert pair
    /// is not atomic against a concurrent request for the same scope; it is
    /// a best-effort single-flight policy, not a hard guarantee.
    ///
    /// # Arguments
    ///
    /// * `owner` - Authenticated identity requesting the token
    /// * `scope_key` - Opaque verification scope supplied by the caller
    ///
    /// # Returns
    ///
    /// The id of the created session; the token itself is never returned,
    /// only sent through the resolved delivery factor. On delivery failure
    /// or timeout the session is rolled back before the error is surfaced.
    pub async fn request_token(&self, owner: &str, scope_key: &str) -> AffirmResult<Uuid> {
        self.guard(owner, "requestToken").await?;

        let profile = self.resolve_contact(owner).await?;
        let entry = self.factors.resolve(&profile.factor).await.ok_or_else(|| {
            AffirmError::UnsupportedFactor {
                factor: profile.factor.clone(),
            }
        })?;

        // Supersede-on-reissue: only one open challenge per scope.
        let superseded = self
            .store
            .remove_where(&SessionFilter::by_scope(scope_key).pending())
            .await
            .map_err(|message| AffirmError::Store { message })?;
        if superseded > 0 {
            tracing::info!(
                scope_key = scope_key,
                superseded = superseded,
                event = "session_superseded",
                "Invalidated previous pending session for scope"
            );
        }

        let token = self.generator.generate();
        let session = Session::new(
            scope_key,
            owner,
            token.clone(),
            profile.factor.clone(),
            self.config.expiry_secs,
        );
        let session_id = self
            .store
            .insert(session)
            .await
            .map_err(|message| AffirmError::Store { message })?;

        tracing::info!(
            scope_key = scope_key,
            factor = %profile.factor,
            session_id = %session_id,
            event = "token_issued",
            "Created pending verification session"
        );

        self.deliver(session_id, &profile, &entry, &token).await?;
        Ok(session_id)
    }

    /// Verify a token against the pending session for `scope_key`
    ///
    /// # Returns
    ///
    /// `Ok(true)` exactly once per session, on a correct, timely, unused
    /// token from the session's owner. Absent session, expired deadline,
    /// token mismatch, and already-verified session all yield `Ok(false)`
    /// without distinguishing which check failed.
    pub async fn verify_token(
        &self,
        caller: &str,
        scope_key: &str,
        token: &str,
    ) -> AffirmResult<bool> {
        self.guard(caller, "verifyToken").await?;

        // Pending-only lookup: a retained verified document may share the
        // scope with a freshly reissued challenge and must never shadow it.
        let filter = SessionFilter::by_scope(scope_key).owned_by(caller).pending();
        let session = self
            .store
            .find_one(&filter)
            .await
            .map_err(|message| AffirmError::Store { message })?;

        let session = match session {
            Some(session) => session,
            None => return Ok(false),
        };
        // Deadline re-check: passive store expiry is advisory only.
        if session.is_expired() {
            return Ok(false);
        }
        let stored = match &session.token {
            Some(stored) => stored,
            None => return Ok(false),
        };
        if !token_matches(stored, token) {
            tracing::warn!(
                scope_key = scope_key,
                session_id = %session.id,
                event = "token_mismatch",
                "Verification attempt with wrong token"
            );
            return Ok(false);
        }

        let updated = self
            .store
            .update(session.id, SessionPatch::verified_now())
            .await
            .map_err(|message| AffirmError::Store { message })?;
        if !updated {
            // The document vanished between the read and the write
            // (concurrent invalidate or passive purge).
            return Ok(false);
        }

        tracing::info!(
            scope_key = scope_key,
            session_id = %session.id,
            event = "session_verified",
            "Session verified"
        );
        Ok(true)
    }

    /// Invalidate the pending session for `scope_key`, if any
    ///
    /// Idempotent cancellation primitive. Verified sessions are never
    /// removed here; they age out through the store's retention policy.
    ///
    /// # Returns
    ///
    /// The number of sessions removed (0 or 1)
    pub async fn invalidate_session(&self, caller: &str, scope_key: &str) -> AffirmResult<u64> {
        self.guard(caller, "invalidateSession").await?;

        let removed = self
            .store
            .remove_where(&SessionFilter::by_scope(scope_key).pending())
            .await
            .map_err(|message| AffirmError::Store { message })?;

        if removed > 0 {
            tracing::info!(
                scope_key = scope_key,
                removed = removed,
                event = "session_invalidated",
                "Pending session invalidated"
            );
        }
        Ok(removed)
    }

    /// Check whether a pending, unexpired session exists for `scope_key`
    ///
    /// Lets callers decide whether a fresh token request is needed.
    pub async fn assert_open_session(&self, caller: &str, scope_key: &str) -> AffirmResult<bool> {
        self.guard(caller, "assertOpenSession").await?;

        let session = self
            .store
            .find_one(&SessionFilter::by_scope(scope_key).owned_by(caller).pending())
            .await
            .map_err(|message| AffirmError::Store { message })?;

        Ok(session.map(|session| session.is_pending()).unwrap_or(false))
    }

    /// Return the contact profile a token would be delivered to
    ///
    /// Pure resolver passthrough; no session side effects.
    pub async fn verify_contact(&self, owner: &str) -> AffirmResult<ContactProfile> {
        self.guard(owner, "verifyContact").await?;
        self.resolve_contact(owner).await
    }

    /// Authentication and rate-limit guard shared by every operation
    async fn guard(&self, identity: &str, operation: &str) -> AffirmResult<()> {
        if identity.is_empty() {
            return Err(AffirmError::Unauthenticated);
        }

        let name = self.operation_name(operation);
        let allowed = self
            .governor
            .check(identity, &name)
            .await
            .map_err(|message| AffirmError::Internal { message })?;

        if !allowed {
            let retry_after_secs = self
                .governor
                .reset_in(identity, &name)
                .await
                .ok()
                .flatten()
                .unwrap_or(self.config.request_window_secs);
            return Err(AffirmError::RateLimited {
                operation: operation.to_string(),
                retry_after_secs,
            });
        }
        Ok(())
    }

    async fn resolve_contact(&self, owner: &str) -> AffirmResult<ContactProfile> {
        let profile = self
            .contacts
            .resolve(owner, &self.config.profile)
            .await
            .map_err(|message| AffirmError::Internal { message })?;

        match profile {
            Some(profile) if profile.is_well_formed() => Ok(profile),
            _ => Err(AffirmError::UnknownContact {
                owner: owner.to_string(),
            }),
        }
    }

    /// Invoke the delivery capability under the configured deadline
    ///
    /// The send future is raced against the timeout; whichever loses is
    /// dropped, so a late completion after the timeout has already rolled
    /// the session back cannot resurrect it.
    async fn deliver(
        &self,
        session_id: Uuid,
        profile: &ContactProfile,
        entry: &FactorEntry,
        token: &str,
    ) -> AffirmResult<()> {
        let timeout_ms = self.config.delivery_timeout_ms;
        let send = entry.sender.send(
            &profile.contact,
            token,
            &profile.factor,
            entry.settings.as_ref(),
        );

        match timeout(Duration::from_millis(timeout_ms), send).await {
            Ok(Ok(message_id)) => {
                tracing::info!(
                    session_id = %session_id,
                    factor = %profile.factor,
                    message_id = %message_id,
                    event = "token_delivered",
                    "Token delivered"
                );
                Ok(())
            }
            Ok(Err(message)) => {
                tracing::warn!(
                    session_id = %session_id,
                    factor = %profile.factor,
                    error = %message,
                    event = "delivery_failed",
                    "Delivery capability errored, rolling session back"
                );
                self.rollback(session_id).await;
                Err(AffirmError::DeliveryFailed {
                    factor: profile.factor.clone(),
                    message,
                })
            }
            Err(_) => {
                tracing::warn!(
                    session_id = %session_id,
                    factor = %profile.factor,
                    timeout_ms = timeout_ms,
                    event = "delivery_timeout",
                    "Delivery deadline elapsed, rolling session back"
                );
                self.rollback(session_id).await;
                Err(AffirmError::DeliveryTimeout {
                    factor: profile.factor.clone(),
                    timeout_ms,
                })
            }
        }
    }

    /// Remove a session that must not stay pending after a failed send
    async fn rollback(&self, session_id: Uuid) {
        let result = self
            .store
            .remove_where(&SessionFilter::by_id(session_id).pending())
            .await;
        if let Err(message) = result {
            tracing::error!(
                session_id = %session_id,
                error = %message,
                event = "rollback_failed",
                "Failed to remove session after delivery failure"
            );
        }
    }
}

/// Constant-time token comparison
///
/// Length is checked first; the comparison itself does not leak how much
/// of a correct prefix the attempt had.
fn token_matches(stored: &str, provided: &str) -> bool {
    if stored.len() != provided.len() {
        return false;
    }
    constant_time_eq(stored.as_bytes(), provided.as_bytes())
}
