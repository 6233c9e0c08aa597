//! Shared retry utility for the platform handlers.
//!
//! Two layers: a fixed-attempt-count loop for a single credential step
//! (any step may fail up to 3 times, each retry with a fresh proxy
//! session id), and a top-level search loop that re-acquires credentials
//! between attempts instead of merely sleeping and repeating the same
//! call.

use std::future::Future;
use std::pin::Pin;

use pricely_core::{Platform, ProductListing};

use crate::error::PlatformError;

/// Generates a fresh sticky-session id for the proxy client, a new one
/// per attempt.
#[must_use]
pub(crate) fn fresh_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Run one credential-acquisition step up to `attempts` times, generating a
/// fresh session id before each try. Returns
/// [`PlatformError::CredentialAcquisition`] with the last failure's reason
/// once exhausted.
pub(crate) async fn step_with_retries<T, F, Fut>(
    platform: Platform,
    step: &str,
    attempts: u32,
    mut op: F,
) -> Result<T, PlatformError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, PlatformError>>,
{
    let mut last_reason = String::new();
    for _ in 0..attempts.max(1) {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => last_reason = err.to_string(),
        }
    }
    Err(PlatformError::CredentialAcquisition {
        platform,
        step: step.to_string(),
        reason: last_reason,
    })
}

type AttemptFuture<'a> =
    Pin<Box<dyn Future<Output = Result<(Vec<ProductListing>, pricely_core::PlatformCredential), PlatformError>> + Send + 'a>>;

/// Top-level search retry loop (: "up to 3 attempts per search;
/// attempt 1 uses supplied credentials; on failure, re-acquire and retry").
///
/// `NonServiceable` short-circuits immediately without consuming further
/// attempts, matching §7's propagation policy.
pub(crate) async fn run_with_retry<'a, F>(
    platform: Platform,
    max_attempts: u32,
    mut attempt_fn: F,
) -> Result<(Vec<ProductListing>, pricely_core::PlatformCredential), PlatformError>
where
    F: FnMut(u32) -> AttemptFuture<'a>,
{
    let mut last_err = None;
    for attempt_no in 1..=max_attempts.max(1) {
        match attempt_fn(attempt_no).await {
            Ok(ok) => return Ok(ok),
            Err(err @ PlatformError::NonServiceable) => return Err(err),
            Err(err) => {
                tracing::warn!(
                    platform = platform.as_str(),
                    attempt_no,
                    max_attempts,
                    error = %err,
                    "platform search attempt failed"
                );
                last_err = Some(err);
            }
        }
    }
    Err(last_err.expect("loop runs at least once since max_attempts is clamped to >= 1"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn step_with_retries_succeeds_after_transient_failures() {
        use std::sync::atomic::{AtomicU32, Ordering};
        let calls = AtomicU32::new(0);
        let result = step_with_retries(Platform::Dmart, "test-step", 3, || async {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err(PlatformError::Parse {
                    reason: "transient".to_string(),
                })
            } else {
                Ok(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn step_with_retries_surfaces_credential_acquisition_error_on_exhaustion() {
        let result: Result<(), PlatformError> =
            step_with_retries(Platform::Dmart, "test-step", 3, || async {
                Err(PlatformError::Parse {
                    reason: "always fails".to_string(),
                })
            })
            .await;
        assert!(matches!(
            result,
            Err(PlatformError::CredentialAcquisition { step, .. }) if step == "test-step"
        ));
    }

    #[tokio::test]
    async fn run_with_retry_does_not_retry_non_serviceable() {
        use std::sync::atomic::{AtomicU32, Ordering};
        let calls = AtomicU32::new(0);
        let result = run_with_retry(Platform::Dmart, 3, |_attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async { Err(PlatformError::NonServiceable) })
        })
        .await;
        assert!(matches!(result, Err(PlatformError::NonServiceable)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
