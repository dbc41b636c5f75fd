//! Error types for the verification engine.
//!
//! Negative verification outcomes (absent session, expired session, wrong
//! token, already-verified session) are ordinary `Ok(false)` returns, never
//! errors, so callers cannot enumerate which check rejected them. The
//! variants here cover everything else that can go wrong with an operation.

use thiserror::Error;

/// Errors surfaced by engine operations
#[derive(Error, Debug)]
pub enum AffirmError {
    /// No caller identity was supplied; fatal to the call, never retried
    #[error("caller identity required")]
    Unauthenticated,

    /// The owner's contact profile is missing or malformed
    #[error("contact profile for {owner} is missing or malformed")]
    UnknownContact { owner: String },

    /// The resolved factor has no registered delivery capability
    #[error("factor not supported: {factor}")]
    UnsupportedFactor { factor: String },

    /// The delivery capability reported an error; the session was rolled
    /// back before this was surfaced
    #[error("delivery via {factor} failed: {message}")]
    DeliveryFailed { factor: String, message: String },

    /// The delivery capability exceeded its deadline; the session was
    /// rolled back before this was surfaced
    #[error("delivery via {factor} timed out after {timeout_ms}ms")]
    DeliveryTimeout { factor: String, timeout_ms: u64 },

    /// The request governor rejected the call; back off before retrying
    #[error("rate limit exceeded for {operation}, retry in {retry_after_secs}s")]
    RateLimited {
        operation: String,
        retry_after_secs: u64,
    },

    /// The session store failed
    #[error("session store error: {message}")]
    Store { message: String },

    /// A non-store collaborator failed
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl AffirmError {
    /// Stable machine-readable code for transport adapters
    pub fn error_code(&self) -> &'static str {
        match self {
            AffirmError::Unauthenticated => "UNAUTHENTICATED",
            AffirmError::UnknownContact { .. } => "UNKNOWN_CONTACT",
            AffirmError::UnsupportedFactor { .. } => "UNSUPPORTED_FACTOR",
            AffirmError::DeliveryFailed { .. } => "DELIVERY_FAILED",
            AffirmError::DeliveryTimeout { .. } => "DELIVERY_TIMEOUT",
            AffirmError::RateLimited { .. } => "RATE_LIMITED",
            AffirmError::Store { .. } => "STORE_ERROR",
            AffirmError::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    /// Whether the caller should back off and retry later
    ///
    /// Only rate-limit rejections qualify; delivery failures are terminal
    /// for the request and need a fresh `request_token` call.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AffirmError::RateLimited { .. })
    }
}

pub type AffirmResult<T> = Result<T, AffirmError>;
