//! Fixed-window request governor.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing;

use super::RequestGovernor;

/// Identity predicate deciding whether an identity is subject to limiting
pub type IdentityPredicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

fn default_limit() -> u32 {
    1
}

fn default_window_secs() -> u64 {
    10
}

/// Governor configuration: at most `limit` invocations per
/// (identity, operation) pair within each `window_secs` window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernorConfig {
    /// Maximum invocations per window
    #[serde(default = "default_limit")]
    pub limit: u32,

    /// Window length in seconds
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            window_secs: default_window_secs(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Bucket {
    window_start: Instant,
    count: u32,
}

/// In-memory fixed-window governor
///
/// Counters are bucketed per (identity, operation) pair; a bucket resets
/// when its window elapses. All state sits behind one mutex, and nothing
/// awaits while holding it, so concurrent increments from simultaneous
/// requests serialize correctly.
pub struct FixedWindowGovernor {
    config: GovernorConfig,
    applies: IdentityPredicate,
    buckets: Mutex<HashMap<(String, String), Bucket>>,
}

// Stale buckets are pruned once the map crosses this size.
const PRUNE_THRESHOLD: usize = 1024;

impl FixedWindowGovernor {
    /// Create a governor limiting every identity
    pub fn new(config: GovernorConfig) -> Self {
        Self {
            config,
            applies: Arc::new(|_| true),
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Replace the identity predicate
    ///
    /// Identities for which the predicate returns `false` bypass the
    /// governor entirely and are never counted.
    pub fn with_predicate(mut self, applies: IdentityPredicate) -> Self {
        self.applies = applies;
        self
    }

    fn window(&self) -> Duration {
        Duration::from_secs(self.config.window_secs)
    }
}

#[async_trait]
impl RequestGovernor for FixedWindowGovernor {
    async fn check(&self, identity: &str, operation: &str) -> Result<bool, String> {
        if !(self.applies)(identity) {
            return Ok(true);
        }

        let now = Instant::now();
        let window = self.window();
        let mut buckets = self
            .buckets
            .lock()
            .map_err(|_| "governor state poisoned".to_string())?;

        if buckets.len() > PRUNE_THRESHOLD {
            buckets.retain(|_, bucket| now.duration_since(bucket.window_start) < window);
        }

        let bucket = buckets
            .entry((identity.to_string(), operation.to_string()))
            .or_insert(Bucket {
                window_start: now,
                count: 0,
            });

        if now.duration_since(bucket.window_start) >= window {
            bucket.window_start = now;
            bucket.count = 0;
        }
        bucket.count += 1;

        let allowed = bucket.count <= self.config.limit;
        if !allowed {
            tracing::warn!(
                identity = identity,
                operation = operation,
                count = bucket.count,
                limit = self.config.limit,
                event = "rate_limit_exceeded",
                "Request rejected by governor"
            );
        }
        Ok(allowed)
    }

    async fn reset_in(&self, identity: &str, operation: &str) -> Result<Option<u64>, String> {
        let now = Instant::now();
        let window = self.window();
        let buckets = self
            .buckets
            .lock()
            .map_err(|_| "governor state poisoned".to_string())?;

        Ok(buckets
            .get(&(identity.to_string(), operation.to_string()))
            .and_then(|bucket| {
                let elapsed = now.duration_since(bucket.window_start);
                window.checked_sub(elapsed).map(|left| left.as_secs())
            }))
    }
}
