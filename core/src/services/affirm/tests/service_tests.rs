//! Unit tests for the verification engine

use std::sync::Arc;

use crate::domain::entities::contact::ContactProfile;
use crate::errors::AffirmError;
use crate::repositories::session::{InMemorySessionStore, SessionFilter, SessionStore};
use crate::services::affirm::{AffirmConfig, AffirmService};

use super::mocks::{DeliveryMode, MockContactResolver, MockDelivery};

const ALICE: &str = "alice";
const CONTACT: &str = "alice@example.com";
const SCOPE: &str = "s1";

fn test_config() -> AffirmConfig {
    AffirmConfig {
        // High enough that the governor never interferes unless a test
        // lowers it on purpose.
        request_limit: 100,
        delivery_timeout_ms: 100,
        ..AffirmConfig::default()
    }
}

type TestService = AffirmService<InMemorySessionStore, MockContactResolver>;

async fn service_with(
    mode: DeliveryMode,
    config: AffirmConfig,
) -> (TestService, Arc<InMemorySessionStore>, Arc<MockDelivery>) {
    let store = Arc::new(InMemorySessionStore::new());
    let resolver = Arc::new(MockContactResolver::new().with_profile(ALICE, CONTACT, "default"));
    let delivery = Arc::new(MockDelivery::new(mode));

    let service = AffirmService::new("test", store.clone(), resolver, config);
    service
        .add_factor("default", delivery.clone(), None)
        .await;

    (service, store, delivery)
}

#[tokio::test]
async fn test_request_and_verify_round_trip() {
    let (service, _, delivery) = service_with(DeliveryMode::Succeed, test_config()).await;

    service.request_token(ALICE, SCOPE).await.unwrap();
    let token = delivery.sent_token(CONTACT).expect("token was delivered");

    assert!(service.verify_token(ALICE, SCOPE, &token).await.unwrap());

    // Single verification: the same token never verifies twice.
    assert!(!service.verify_token(ALICE, SCOPE, &token).await.unwrap());
}

#[tokio::test]
async fn test_request_token_never_returns_the_token() {
    let (service, store, delivery) = service_with(DeliveryMode::Succeed, test_config()).await;

    let session_id = service.request_token(ALICE, SCOPE).await.unwrap();
    let token = delivery.sent_token(CONTACT).unwrap();

    assert_ne!(session_id.to_string(), token);
    let stored = store
        .find_one(&SessionFilter::by_id(session_id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.token.as_deref(), Some(token.as_str()));
    assert_eq!(stored.factor, "default");
}

#[tokio::test]
async fn test_supersede_on_reissue_leaves_one_pending() {
    let (service, store, delivery) = service_with(DeliveryMode::Succeed, test_config()).await;

    service.request_token(ALICE, SCOPE).await.unwrap();
    let first_token = delivery.sent_token(CONTACT).unwrap();

    service.request_token(ALICE, SCOPE).await.unwrap();
    let second_token = delivery.sent_token(CONTACT).unwrap();

    assert_ne!(first_token, second_token);
    assert_eq!(store.len().await, 1);

    // Only the most recent session for the scope is verifiable.
    assert!(!service
        .verify_token(ALICE, SCOPE, &first_token)
        .await
        .unwrap());
    assert!(service
        .verify_token(ALICE, SCOPE, &second_token)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_reissue_after_verify_opens_a_fresh_challenge() {
    let (service, store, delivery) = service_with(DeliveryMode::Succeed, test_config()).await;

    // HashMap iteration order is arbitrary, so repeat across scopes to
    // make sure the retained verified document never shadows the new
    // pending one in scope lookups.
    for round in 0..20 {
        let scope = format!("reissue-{round}");

        service.request_token(ALICE, &scope).await.unwrap();
        let first = delivery.sent_token(CONTACT).unwrap();
        assert!(service.verify_token(ALICE, &scope, &first).await.unwrap());

        // The verified document is retained; a new request must coexist
        // with it under the same scope.
        service.request_token(ALICE, &scope).await.unwrap();
        let second = delivery.sent_token(CONTACT).unwrap();
        assert_ne!(first, second);

        assert!(service.assert_open_session(ALICE, &scope).await.unwrap());
        assert!(service.verify_token(ALICE, &scope, &second).await.unwrap());

        // Both documents for the scope are now verified.
        let pending = store
            .find_one(&SessionFilter::by_scope(&scope).pending())
            .await
            .unwrap();
        assert!(pending.is_none());
    }
}

#[tokio::test]
async fn test_wrong_token_rejected_without_mutation() {
    let (service, _, delivery) = service_with(DeliveryMode::Succeed, test_config()).await;

    service.request_token(ALICE, SCOPE).await.unwrap();
    let token = delivery.sent_token(CONTACT).unwrap();

    assert!(!service.verify_token(ALICE, SCOPE, "000000").await.unwrap());

    // The session is untouched; the correct token still verifies.
    assert!(service.assert_open_session(ALICE, SCOPE).await.unwrap());
    assert!(service.verify_token(ALICE, SCOPE, &token).await.unwrap());
}

#[tokio::test]
async fn test_expired_session_fails_even_with_correct_token() {
    let config = AffirmConfig {
        expiry_secs: 0,
        ..test_config()
    };
    let (service, _, delivery) = service_with(DeliveryMode::Succeed, config).await;

    service.request_token(ALICE, SCOPE).await.unwrap();
    let token = delivery.sent_token(CONTACT).unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(10)).await;

    assert!(!service.verify_token(ALICE, SCOPE, &token).await.unwrap());
    assert!(!service.assert_open_session(ALICE, SCOPE).await.unwrap());
}

#[tokio::test]
async fn test_verify_requires_owning_caller() {
    let (service, _, delivery) = service_with(DeliveryMode::Succeed, test_config()).await;

    service.request_token(ALICE, SCOPE).await.unwrap();
    let token = delivery.sent_token(CONTACT).unwrap();

    assert!(!service.verify_token("bob", SCOPE, &token).await.unwrap());
    assert!(service.verify_token(ALICE, SCOPE, &token).await.unwrap());
}

#[tokio::test]
async fn test_verify_token_absent_scope_is_false() {
    let (service, _, _) = service_with(DeliveryMode::Succeed, test_config()).await;

    assert!(!service
        .verify_token(ALICE, "no-such-scope", "a1b2c3")
        .await
        .unwrap());
}

#[tokio::test]
async fn test_invalidate_is_idempotent_and_spares_verified() {
    let (service, store, delivery) = service_with(DeliveryMode::Succeed, test_config()).await;

    // Absent session: zero count.
    assert_eq!(service.invalidate_session(ALICE, SCOPE).await.unwrap(), 0);

    // Pending session: removed once, second call reports zero.
    service.request_token(ALICE, SCOPE).await.unwrap();
    assert_eq!(service.invalidate_session(ALICE, SCOPE).await.unwrap(), 1);
    assert_eq!(service.invalidate_session(ALICE, SCOPE).await.unwrap(), 0);

    // Verified session: never removed.
    let session_id = service.request_token(ALICE, SCOPE).await.unwrap();
    let token = delivery.sent_token(CONTACT).unwrap();
    assert!(service.verify_token(ALICE, SCOPE, &token).await.unwrap());
    assert_eq!(service.invalidate_session(ALICE, SCOPE).await.unwrap(), 0);

    let kept = store
        .find_one(&SessionFilter::by_id(session_id))
        .await
        .unwrap()
        .unwrap();
    assert!(kept.is_verified());
}

#[tokio::test]
async fn test_delivery_failure_rolls_back_session() {
    let (service, store, delivery) = service_with(DeliveryMode::Fail, test_config()).await;

    let error = service.request_token(ALICE, SCOPE).await.unwrap_err();
    match error {
        AffirmError::DeliveryFailed { factor, message } => {
            assert_eq!(factor, "default");
            assert!(message.contains("delivery channel error"));
        }
        other => panic!("expected DeliveryFailed, got {other:?}"),
    }

    assert_eq!(delivery.sent_count(), 0);
    assert!(!service.assert_open_session(ALICE, SCOPE).await.unwrap());
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_delivery_timeout_rolls_back_session() {
    let config = AffirmConfig {
        delivery_timeout_ms: 50,
        ..test_config()
    };
    let (service, store, _) = service_with(DeliveryMode::Hang, config).await;

    let error = service.request_token(ALICE, SCOPE).await.unwrap_err();
    match error {
        AffirmError::DeliveryTimeout { factor, timeout_ms } => {
            assert_eq!(factor, "default");
            assert_eq!(timeout_ms, 50);
        }
        other => panic!("expected DeliveryTimeout, got {other:?}"),
    }

    assert!(!service.assert_open_session(ALICE, SCOPE).await.unwrap());
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_unknown_contact() {
    let (service, _, _) = service_with(DeliveryMode::Succeed, test_config()).await;

    let error = service.request_token("mallory", SCOPE).await.unwrap_err();
    assert!(matches!(error, AffirmError::UnknownContact { owner } if owner == "mallory"));
}

#[tokio::test]
async fn test_malformed_contact_profile_is_unknown() {
    let store = Arc::new(InMemorySessionStore::new());
    let resolver = Arc::new(MockContactResolver::new().with_profile("carol", "", "default"));
    let service = AffirmService::new("test", store, resolver, test_config());

    let error = service.request_token("carol", SCOPE).await.unwrap_err();
    assert!(matches!(error, AffirmError::UnknownContact { .. }));
}

#[tokio::test]
async fn test_resolver_failure_is_internal() {
    let store = Arc::new(InMemorySessionStore::new());
    let resolver = Arc::new(MockContactResolver::failing());
    let service = AffirmService::new("test", store, resolver, test_config());

    let error = service.request_token(ALICE, SCOPE).await.unwrap_err();
    assert!(matches!(error, AffirmError::Internal { .. }));
}

#[tokio::test]
async fn test_unsupported_factor() {
    let store = Arc::new(InMemorySessionStore::new());
    let resolver =
        Arc::new(MockContactResolver::new().with_profile(ALICE, CONTACT, "carrier-pigeon"));
    let service = AffirmService::new("test", store, resolver, test_config());
    service
        .add_factor(
            "default",
            Arc::new(MockDelivery::new(DeliveryMode::Succeed)),
            None,
        )
        .await;

    let error = service.request_token(ALICE, SCOPE).await.unwrap_err();
    assert!(matches!(error, AffirmError::UnsupportedFactor { factor } if factor == "carrier-pigeon"));
}

#[tokio::test]
async fn test_unauthenticated_caller() {
    let (service, _, _) = service_with(DeliveryMode::Succeed, test_config()).await;

    let error = service.request_token("", SCOPE).await.unwrap_err();
    assert!(matches!(error, AffirmError::Unauthenticated));

    let error = service.verify_token("", SCOPE, "a1b2c3").await.unwrap_err();
    assert!(matches!(error, AffirmError::Unauthenticated));
}

#[tokio::test]
async fn test_rate_limited_is_distinct_from_session_failures() {
    let config = AffirmConfig {
        request_limit: 1,
        request_window_secs: 60,
        ..test_config()
    };
    let (service, _, _) = service_with(DeliveryMode::Succeed, config).await;

    service.request_token(ALICE, SCOPE).await.unwrap();

    let error = service.request_token(ALICE, SCOPE).await.unwrap_err();
    match error {
        AffirmError::RateLimited {
            operation,
            retry_after_secs,
        } => {
            assert_eq!(operation, "requestToken");
            assert!(retry_after_secs <= 60);
        }
        other => panic!("expected RateLimited, got {other:?}"),
    }

    // Operations are limited independently; the session from the first
    // request is still live.
    assert!(service.assert_open_session(ALICE, SCOPE).await.unwrap());
}

#[tokio::test]
async fn test_verify_contact_passthrough() {
    let (service, store, _) = service_with(DeliveryMode::Succeed, test_config()).await;

    let profile = service.verify_contact(ALICE).await.unwrap();
    assert_eq!(profile, ContactProfile::new(CONTACT, "default"));

    // No session side effects.
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_assert_open_session_lifecycle() {
    let (service, _, delivery) = service_with(DeliveryMode::Succeed, test_config()).await;

    assert!(!service.assert_open_session(ALICE, SCOPE).await.unwrap());

    service.request_token(ALICE, SCOPE).await.unwrap();
    assert!(service.assert_open_session(ALICE, SCOPE).await.unwrap());
    // Scoped to the owner: another caller sees no open session.
    assert!(!service.assert_open_session("bob", SCOPE).await.unwrap());

    let token = delivery.sent_token(CONTACT).unwrap();
    assert!(service.verify_token(ALICE, SCOPE, &token).await.unwrap());
    assert!(!service.assert_open_session(ALICE, SCOPE).await.unwrap());
}

#[tokio::test]
async fn test_operation_names_are_namespaced_per_instance() {
    let (service, _, _) = service_with(DeliveryMode::Succeed, test_config()).await;

    assert_eq!(
        service.operation_name("requestToken"),
        "TokenAffirm:test/requestToken"
    );
    assert_eq!(crate::services::affirm::OPERATIONS.len(), 5);
}
