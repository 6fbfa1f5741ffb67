//! Tests for the credential broker: retry budget, caching, invalidation,
//! and serialized validation

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use vintner_exec::{CredentialBroker, SecretCallback, SecretValidator, VintnerError};

fn counting_collector(secret: &str, calls: Arc<AtomicUsize>) -> SecretCallback {
    let secret = secret.to_string();
    Arc::new(move |_attempt, _prior| {
        let secret = secret.clone();
        calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move { Ok(Some(secret)) })
    })
}

fn cancelling_collector() -> SecretCallback {
    Arc::new(|_attempt, _prior| Box::pin(async move { Ok(None) }))
}

fn counting_validator(expected: &str, probes: Arc<AtomicUsize>) -> SecretValidator {
    let expected = expected.to_string();
    Arc::new(move |candidate: String| {
        let expected = expected.clone();
        probes.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move { Ok(candidate == expected) })
    })
}

#[tokio::test]
async fn test_three_invalid_secrets_fail_permanently() {
    let collections = Arc::new(AtomicUsize::new(0));
    let probes = Arc::new(AtomicUsize::new(0));
    let broker = CredentialBroker::with_validator(
        counting_collector("wrong", collections.clone()),
        counting_validator("hunter2", probes.clone()),
    );

    let err = broker.get_secret().await.unwrap_err();
    assert!(matches!(err, VintnerError::Authentication(_)));
    assert_eq!(probes.load(Ordering::SeqCst), 3);
    assert_eq!(collections.load(Ordering::SeqCst), 3);

    // Permanently failed: no fourth validation, no further prompting
    let err = broker.get_secret().await.unwrap_err();
    assert!(matches!(err, VintnerError::Authentication(_)));
    assert_eq!(probes.load(Ordering::SeqCst), 3);
    assert_eq!(collections.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_valid_secret_in_fresh_session_succeeds_first_try() {
    let collections = Arc::new(AtomicUsize::new(0));
    let probes = Arc::new(AtomicUsize::new(0));
    let broker = CredentialBroker::with_validator(
        counting_collector("hunter2", collections.clone()),
        counting_validator("hunter2", probes.clone()),
    );

    let secret = broker.get_secret().await.unwrap();
    assert_eq!(secret.expose(), "hunter2");
    assert_eq!(probes.load(Ordering::SeqCst), 1);

    // Cached: subsequent calls neither re-prompt nor re-validate
    let again = broker.get_secret().await.unwrap();
    assert_eq!(again.expose(), "hunter2");
    assert_eq!(collections.load(Ordering::SeqCst), 1);
    assert_eq!(probes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_collector_reports_prior_failure() {
    let seen: Arc<std::sync::Mutex<Vec<(u32, Option<String>)>>> =
        Arc::new(std::sync::Mutex::new(Vec::new()));
    let collector: SecretCallback = {
        let seen = seen.clone();
        Arc::new(move |attempt, prior| {
            seen.lock().unwrap().push((attempt, prior));
            Box::pin(async move { Ok(Some("nope".to_string())) })
        })
    };
    let broker = CredentialBroker::with_validator(
        collector,
        counting_validator("hunter2", Arc::new(AtomicUsize::new(0))),
    );

    broker.get_secret().await.unwrap_err();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 3);
    assert_eq!(seen[0].0, 1);
    assert!(seen[0].1.is_none());
    assert!(seen[1].1.is_some());
    assert!(seen[2].1.is_some());
}

#[tokio::test]
async fn test_cancelled_collection_is_authentication_error() {
    let broker = CredentialBroker::with_validator(
        cancelling_collector(),
        counting_validator("hunter2", Arc::new(AtomicUsize::new(0))),
    );

    let err = broker.get_secret().await.unwrap_err();
    assert!(matches!(err, VintnerError::Authentication(_)));
}

#[tokio::test]
async fn test_invalidate_forces_recollection() {
    let collections = Arc::new(AtomicUsize::new(0));
    let probes = Arc::new(AtomicUsize::new(0));
    let broker = CredentialBroker::with_validator(
        counting_collector("hunter2", collections.clone()),
        counting_validator("hunter2", probes.clone()),
    );

    broker.get_secret().await.unwrap();
    broker.invalidate().await;
    broker.get_secret().await.unwrap();

    assert_eq!(collections.load(Ordering::SeqCst), 2);
    assert_eq!(probes.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_concurrent_callers_validate_once() {
    let collections = Arc::new(AtomicUsize::new(0));
    let probes = Arc::new(AtomicUsize::new(0));
    let slow_validator: SecretValidator = {
        let probes = probes.clone();
        Arc::new(move |_candidate: String| {
            probes.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(true)
            })
        })
    };
    let broker = Arc::new(CredentialBroker::with_validator(
        counting_collector("hunter2", collections.clone()),
        slow_validator,
    ));

    let (a, b) = futures::join!(broker.get_secret(), broker.get_secret());
    assert_eq!(a.unwrap().expose(), "hunter2");
    assert_eq!(b.unwrap().expose(), "hunter2");

    // The first caller won; the second waited and reused its result
    assert_eq!(collections.load(Ordering::SeqCst), 1);
    assert_eq!(probes.load(Ordering::SeqCst), 1);
}
