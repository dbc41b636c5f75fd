//! Named registry of delivery factors.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing;

use super::traits::DeliveryFactor;

/// A registered factor: the send capability plus optional channel settings
#[derive(Clone)]
pub struct FactorEntry {
    /// The delivery capability invoked to send tokens
    pub sender: Arc<dyn DeliveryFactor>,
    /// Opaque settings handed back to the capability on every send
    pub settings: Option<Value>,
}

/// Mapping from factor name to delivery capability
///
/// Registration is administrative, not part of the request hot path. The
/// send capability itself is guaranteed by the `DeliveryFactor` trait, so
/// registration only needs the name.
pub struct FactorRegistry {
    factors: RwLock<HashMap<String, FactorEntry>>,
}

impl FactorRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            factors: RwLock::new(HashMap::new()),
        }
    }

    /// Register a factor under `name`
    ///
    /// Re-registering an existing name overwrites it; last write wins.
    pub async fn add_factor(
        &self,
        name: impl Into<String>,
        sender: Arc<dyn DeliveryFactor>,
        settings: Option<Value>,
    ) {
        let name = name.into();
        let mut factors = self.factors.write().await;
        if factors.contains_key(&name) {
            tracing::info!(
                factor = %name,
                event = "factor_replaced",
                "Overwriting existing delivery factor"
            );
        }
        factors.insert(name, FactorEntry { sender, settings });
    }

    /// Look up the factor registered under `name`
    pub async fn resolve(&self, name: &str) -> Option<FactorEntry> {
        self.factors.read().await.get(name).cloned()
    }

    /// Whether a factor is registered under `name`
    pub async fn contains(&self, name: &str) -> bool {
        self.factors.read().await.contains_key(name)
    }

    /// Names of all registered factors
    pub async fn names(&self) -> Vec<String> {
        self.factors.read().await.keys().cloned().collect()
    }
}

impl Default for FactorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
