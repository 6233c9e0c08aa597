//! `/login`, `/signup`, `/send-otp`, `/confirm-otp` (§4.7, §6).
//!
//! `send-otp`/`confirm-otp` are stubs returning `501 Not Implemented`,
//! matching the `pass`-bodied routes in the original `app.py` — see
//! §10.6 for why these are not reimplemented as real OTP delivery.

use axum::extract::{Extension, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use pricely_content::{login as content_login, signup as content_signup, ContentStore};

use crate::error::{ApiError, ApiResponse};
use crate::middleware::RequestId;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub mobile: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub mobile: String,
    pub password: String,
}

pub async fn login<C: ContentStore>(
    State(state): State<AppState<C>>,
    Extension(request_id): Extension<RequestId>,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if body.mobile.trim().is_empty() || body.password.is_empty() {
        return Err(ApiError::bad_request(request_id.0, "mobile and password are required"));
    }

    let user = content_login(&*state.content, &body.mobile, &body.password)
        .await
        .map_err(|e| ApiError::from_content_error(request_id.0, &e))?;

    Ok(ApiResponse::ok(user))
}

pub async fn signup<C: ContentStore>(
    State(state): State<AppState<C>>,
    Extension(request_id): Extension<RequestId>,
    Json(body): Json<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if body.name.trim().is_empty() || body.mobile.trim().is_empty() || body.password.is_empty() {
        return Err(ApiError::bad_request(request_id.0, "name, mobile, and password are required"));
    }

    let user = content_signup(&*state.content, &body.name, &body.mobile, &body.password)
        .await
        .map_err(|e| ApiError::from_content_error(request_id.0, &e))?;

    Ok(ApiResponse::ok(user))
}

pub async fn send_otp(Extension(request_id): Extension<RequestId>) -> ApiError {
    ApiError::not_implemented(request_id.0)
}

pub async fn confirm_otp(Extension(request_id): Extension<RequestId>) -> ApiError {
    ApiError::not_implemented(request_id.0)
}
