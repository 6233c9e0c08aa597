//! Request-id tagging and admin-session auth. Admin routes compare a
//! bearer token against `AppConfig::admin_session_secret` in constant
//! time to avoid leaking the secret's length/prefix through timing.

use axum::extract::{Request, State};
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use subtle::ConstantTimeEq;
use uuid::Uuid;

use pricely_content::ContentStore;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Extract or generate a request ID: prefer `x-request-id`, else mint a
/// UUIDv4. Stashed as a request extension and echoed on the response.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }

    res
}

fn bearer_token(req: &Request) -> Option<&str> {
    req.headers().get(axum::http::header::AUTHORIZATION)?.to_str().ok()?.strip_prefix("Bearer ")
}

fn admin_session_matches(expected: &str, presented: &str) -> bool {
    expected.as_bytes().ct_eq(presented.as_bytes()).into()
}

/// Require a `Authorization: Bearer <ADMIN_SESSION_SECRET>` header on every
/// mutating admin route (§6). Public GETs never pass through this layer.
pub async fn require_admin_session<C: ContentStore + 'static>(
    State(state): State<AppState<C>>,
    req: Request,
    next: Next,
) -> Response {
    let request_id = req.extensions().get::<RequestId>().cloned();
    let presented = bearer_token(&req).map(ToString::to_string);

    let authorized = presented.is_some_and(|token| admin_session_matches(&state.config.admin_session_secret, &token));

    if !authorized {
        let id = request_id.map_or_else(|| "unknown".to_string(), |r| r.0);
        return ApiError::unauthorized(id).into_response();
    }

    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_tokens_compare_equal() {
        assert!(admin_session_matches("secret", "secret"));
    }

    #[test]
    fn mismatched_tokens_compare_unequal() {
        assert!(!admin_session_matches("secret", "not-secret"));
    }
}
