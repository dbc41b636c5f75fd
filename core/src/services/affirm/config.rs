//! Configuration for the verification engine

use serde::{Deserialize, Serialize};

use crate::domain::entities::session::{
    DEFAULT_EXPIRY_SECS, DEFAULT_RETAIN_SECS, DEFAULT_TOKEN_LENGTH,
};

fn default_expiry_secs() -> i64 {
    DEFAULT_EXPIRY_SECS
}

fn default_retain_secs() -> i64 {
    DEFAULT_RETAIN_SECS
}

fn default_delivery_timeout_ms() -> u64 {
    1000
}

fn default_request_limit() -> u32 {
    1
}

fn default_request_window_secs() -> u64 {
    10
}

fn default_profile() -> String {
    "TokenAffirm".to_string()
}

fn default_token_length() -> usize {
    DEFAULT_TOKEN_LENGTH
}

/// Configuration for the verification engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AffirmConfig {
    /// Seconds a pending session stays verifiable
    #[serde(default = "default_expiry_secs")]
    pub expiry_secs: i64,

    /// Seconds a verified session is retained before the store purges it
    #[serde(default = "default_retain_secs")]
    pub retain_secs: i64,

    /// Deadline for the delivery capability, in milliseconds; tune to the
    /// channel (an SMS gateway needs more headroom than a chat webhook)
    #[serde(default = "default_delivery_timeout_ms")]
    pub delivery_timeout_ms: u64,

    /// Maximum invocations per operation per identity within the window
    #[serde(default = "default_request_limit")]
    pub request_limit: u32,

    /// Rate-limit window in seconds
    #[serde(default = "default_request_window_secs")]
    pub request_window_secs: u64,

    /// Profile namespace under which the caller's contact metadata lives;
    /// also prefixes namespaced operation names
    #[serde(default = "default_profile")]
    pub profile: String,

    /// Length of generated tokens
    #[serde(default = "default_token_length")]
    pub token_length: usize,
}

impl Default for AffirmConfig {
    fn default() -> Self {
        Self {
            expiry_secs: default_expiry_secs(),
            retain_secs: default_retain_secs(),
            delivery_timeout_ms: default_delivery_timeout_ms(),
            request_limit: default_request_limit(),
            request_window_secs: default_request_window_secs(),
            profile: default_profile(),
            token_length: default_token_length(),
        }
    }
}
