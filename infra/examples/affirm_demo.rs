//! Example demonstrating a full step-up confirmation flow
//!
//! This example wires the verification engine from the core crate to the
//! console delivery factor, an in-memory session store, and a static
//! contact resolver.
//!
//! Run with: cargo run --example affirm_demo

use async_trait::async_trait;
use std::sync::Arc;

use ta_core::domain::entities::contact::ContactProfile;
use ta_core::repositories::session::{InMemorySessionStore, SessionFilter, SessionStore};
use ta_core::services::affirm::{AffirmConfig, AffirmService, ContactResolver};
use ta_infra::ConsoleDelivery;

/// Resolver serving one hard-coded profile, standing in for the
/// application's user store
struct DemoResolver;

#[async_trait]
impl ContactResolver for DemoResolver {
    async fn resolve(
        &self,
        owner: &str,
        _namespace: &str,
    ) -> Result<Option<ContactProfile>, String> {
        if owner == "alice" {
            Ok(Some(ContactProfile::new("alice@example.com", "console")))
        } else {
            Ok(None)
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let store = Arc::new(InMemorySessionStore::new());
    // Looser pacing than the default one-call-per-10s so the demo can walk
    // through several verify attempts back to back.
    let config = AffirmConfig {
        request_limit: 10,
        ..AffirmConfig::default()
    };
    let service = AffirmService::new("demo", store.clone(), Arc::new(DemoResolver), config);
    service
        .add_factor("console", Arc::new(ConsoleDelivery::new()), None)
        .await;

    println!("--- requesting a confirmation token for scope \"order-42\" ---");
    let session_id = service.request_token("alice", "order-42").await?;
    println!("session created: {session_id}");
    println!(
        "open session for scope: {}",
        service.assert_open_session("alice", "order-42").await?
    );

    // A real caller reads the token off the out-of-band channel; the demo
    // peeks into the store instead.
    let token = store
        .find_one(&SessionFilter::by_scope("order-42"))
        .await
        .map_err(|e| format!("store error: {e}"))?
        .and_then(|session| session.token)
        .ok_or("no pending session")?;

    println!("--- verifying with a wrong token ---");
    println!(
        "verified: {}",
        service.verify_token("alice", "order-42", "nope00").await?
    );

    println!("--- verifying with the delivered token ---");
    println!(
        "verified: {}",
        service.verify_token("alice", "order-42", &token).await?
    );

    println!("--- replaying the same token ---");
    println!(
        "verified: {}",
        service.verify_token("alice", "order-42", &token).await?
    );

    Ok(())
}
