//! Console Delivery Factor
//!
//! A delivery factor for development and testing that logs tokens instead
//! of sending them through a real channel.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use ta_core::services::affirm::DeliveryFactor;

/// Console delivery factor for development and testing
///
/// This implementation:
/// - Logs delivered tokens to console
/// - Generates mock message IDs
/// - Tracks delivery count for testing
/// - Can simulate failures
#[derive(Clone)]
pub struct ConsoleDelivery {
    /// Counter for tracking number of deliveries
    delivery_count: Arc<AtomicU64>,
    /// Whether to simulate failures (for testing)
    simulate_failure: bool,
    /// Whether to print tokens to console
    console_output: bool,
}

impl ConsoleDelivery {
    /// Create a new console delivery factor
    pub fn new() -> Self {
        Self {
            delivery_count: Arc::new(AtomicU64::new(0)),
            simulate_failure: false,
            console_output: true,
        }
    }

    /// Create a console delivery factor with configurable options
    pub fn with_options(console_output: bool, simulate_failure: bool) -> Self {
        Self {
            delivery_count: Arc::new(AtomicU64::new(0)),
            simulate_failure,
            console_output,
        }
    }

    /// Get the total number of tokens delivered
    pub fn delivery_count(&self) -> u64 {
        self.delivery_count.load(Ordering::SeqCst)
    }

    /// Reset the delivery counter
    pub fn reset_counter(&self) {
        self.delivery_count.store(0, Ordering::SeqCst);
    }
}

impl Default for ConsoleDelivery {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeliveryFactor for ConsoleDelivery {
    async fn send(
        &self,
        contact: &str,
        token: &str,
        factor: &str,
        _settings: Option<&Value>,
    ) -> Result<String, String> {
        let masked_contact = mask_contact(contact);

        // Simulate failure if configured
        if self.simulate_failure {
            warn!(
                contact = %masked_contact,
                factor = factor,
                "Console delivery simulating failure"
            );
            return Err("simulated delivery failure".to_string());
        }

        let message_id = format!("console_{}", Uuid::new_v4());
        let count = self.delivery_count.fetch_add(1, Ordering::SeqCst) + 1;

        if self.console_output {
            // Console output for development - shows the full token
            println!("\n{}", "=".repeat(60));
            println!("CONSOLE DELIVERY - TOKEN #{}", count);
            println!("{}", "=".repeat(60));
            println!("To: {} (masked: {})", contact, masked_contact);
            println!("Via: {}", factor);
            println!("Message ID: {}", message_id);
            println!("Token: {}", token);
            println!("{}\n", "=".repeat(60));
        }

        // Structured logging, token deliberately omitted
        info!(
            target: "delivery",
            provider = "console",
            contact = %masked_contact,
            factor = factor,
            message_id = %message_id,
            event = "token_sent",
            "Token delivered via console factor"
        );

        Ok(message_id)
    }
}

/// Mask a contact address for logging
///
/// Keeps the first and last two characters; contacts of four characters or
/// fewer are fully masked.
pub fn mask_contact(contact: &str) -> String {
    let chars: Vec<char> = contact.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{}{}{}", head, "*".repeat(chars.len() - 4), tail)
}
