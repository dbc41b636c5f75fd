//! Per-identity request throttling for engine operations.

mod window;

pub use window::{FixedWindowGovernor, GovernorConfig};

use async_trait::async_trait;

/// Rate-limiting seam for engine operations
///
/// `check` both records the invocation and reports whether it stayed within
/// the limit, so a rejected call still counts against the window.
#[async_trait]
pub trait RequestGovernor: Send + Sync {
    /// Record an invocation of `operation` by `identity` and report whether
    /// it is allowed
    async fn check(&self, identity: &str, operation: &str) -> Result<bool, String>;

    /// Seconds until the current window for this (identity, operation) pair
    /// resets, if one is open
    async fn reset_in(&self, identity: &str, operation: &str) -> Result<Option<u64>, String>;
}
