//! `POST /autocomplete` (§4.7, §6).

use axum::extract::{Extension, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use pricely_content::ContentStore;

use crate::error::ApiError;
use crate::error::ApiResponse;
use crate::middleware::RequestId;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AutocompleteRequest {
    pub query: String,
}

pub async fn autocomplete<C: ContentStore>(
    State(state): State<AppState<C>>,
    Extension(request_id): Extension<RequestId>,
    Json(body): Json<AutocompleteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if body.query.trim().is_empty() {
        return Err(ApiError::bad_request(request_id.0, "query must not be empty"));
    }

    let suggestions = state.geocoder.autocomplete(&body.query).await.map_err(|error| {
        tracing::error!(error = %error, "autocomplete call failed");
        ApiError::internal(request_id.0)
    })?;

    Ok(ApiResponse::ok(suggestions))
}
