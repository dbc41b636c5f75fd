//! Traits for delivery channel and contact profile integration

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::entities::contact::ContactProfile;

/// Out-of-band delivery capability for a single factor
///
/// The engine enforces the delivery deadline; implementations may block
/// indefinitely and are raced against a timeout at the call site.
#[async_trait]
pub trait DeliveryFactor: Send + Sync {
    /// Deliver `token` to `contact` via this channel
    ///
    /// `settings` is the opaque per-factor configuration supplied at
    /// registration time.
    ///
    /// # Returns
    ///
    /// A provider message id on success
    async fn send(
        &self,
        contact: &str,
        token: &str,
        factor: &str,
        settings: Option<&Value>,
    ) -> Result<String, String>;
}

/// Resolver for a caller's registered contact profile
#[async_trait]
pub trait ContactResolver: Send + Sync {
    /// Look up the `{contact, factor}` profile stored for `owner` under
    /// `namespace`
    ///
    /// # Returns
    ///
    /// `Ok(None)` when no profile is registered; `Err` only for resolver
    /// infrastructure failure
    async fn resolve(&self, owner: &str, namespace: &str)
        -> Result<Option<ContactProfile>, String>;
}
