//! Admin CRUD surface (§4.8, §6, §10.6): public reads, admin-session-gated
//! writes, over the generic `ContentStore` table contract. `customer_analytics`
//! is not a raw table — it's a small aggregate computed over `users` — but
//! the read is still gated behind admin auth since it exposes customer data.

use axum::extract::{Extension, Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use serde_json::Value;

use pricely_content::{is_known_table, ContentStore, Row};

use crate::error::{ApiError, ApiResponse};
use crate::middleware::RequestId;
use crate::state::AppState;

/// Tables reachable through `/api/{table}` — a subset of
/// [`pricely_content::KNOWN_TABLES`]: `users` is session-internal and not
/// part of the admin content surface §6 names.
const ADMIN_TABLES: &[&str] = &["offers", "slideshow", "daily_needs", "trending_products", "daily_needs_items", "bg_image"];

fn require_admin_table(request_id: &str, table: &str) -> Result<(), ApiError> {
    if ADMIN_TABLES.contains(&table) && is_known_table(table) {
        Ok(())
    } else {
        Err(ApiError::bad_request(request_id.to_string(), format!("unknown table: {table}")))
    }
}

pub async fn list_rows<C: ContentStore>(
    State(state): State<AppState<C>>,
    Extension(request_id): Extension<RequestId>,
    Path(table): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin_table(&request_id.0, &table)?;
    let rows = state.content.select(&table, &Row::new()).await.map_err(|e| ApiError::from_content_error(request_id.0, &e))?;
    Ok(ApiResponse::ok(rows))
}

pub async fn create_row<C: ContentStore>(
    State(state): State<AppState<C>>,
    Extension(request_id): Extension<RequestId>,
    Path(table): Path<String>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin_table(&request_id.0, &table)?;
    let Value::Object(fields) = body else {
        return Err(ApiError::bad_request(request_id.0, "request body must be a JSON object"));
    };
    let row: Row = fields.into_iter().collect();
    let inserted =
        state.content.insert(&table, row).await.map_err(|e| ApiError::from_content_error(request_id.0, &e))?;
    Ok(ApiResponse::ok(inserted))
}

pub async fn update_row<C: ContentStore>(
    State(state): State<AppState<C>>,
    Extension(request_id): Extension<RequestId>,
    Path((table, id)): Path<(String, i64)>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin_table(&request_id.0, &table)?;
    let Value::Object(fields) = body else {
        return Err(ApiError::bad_request(request_id.0, "request body must be a JSON object"));
    };
    let new_values: Row = fields.into_iter().collect();
    let mut match_map = Row::new();
    match_map.insert("id".to_string(), Value::from(id));

    let updated = state
        .content
        .update(&table, &match_map, new_values)
        .await
        .map_err(|e| ApiError::from_content_error(request_id.0, &e))?;
    Ok(ApiResponse::ok(updated))
}

pub async fn delete_row<C: ContentStore>(
    State(state): State<AppState<C>>,
    Extension(request_id): Extension<RequestId>,
    Path((table, id)): Path<(String, i64)>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin_table(&request_id.0, &table)?;
    let mut match_map = Row::new();
    match_map.insert("id".to_string(), Value::from(id));

    let deleted = state
        .content
        .delete(&table, &match_map)
        .await
        .map_err(|e| ApiError::from_content_error(request_id.0, &e))?;
    Ok(ApiResponse::ok(deleted))
}

#[derive(Debug, Serialize)]
struct CustomerAnalytics {
    total_users: usize,
    premium_users: usize,
}

pub async fn customer_analytics<C: ContentStore>(
    State(state): State<AppState<C>>,
    Extension(request_id): Extension<RequestId>,
) -> Result<impl IntoResponse, ApiError> {
    let users =
        state.content.select("users", &Row::new()).await.map_err(|e| ApiError::from_content_error(request_id.0, &e))?;
    let premium_users = users.iter().filter(|row| row.get("is_premium").and_then(Value::as_bool).unwrap_or(false)).count();

    Ok(ApiResponse::ok(CustomerAnalytics { total_users: users.len(), premium_users }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_table_is_rejected_before_touching_the_store() {
        let err = require_admin_table("req-1", "admin_users").unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn users_table_is_not_admin_reachable() {
        assert!(require_admin_table("req-1", "users").is_err());
    }

    #[test]
    fn known_admin_table_is_accepted() {
        assert!(require_admin_table("req-1", "offers").is_ok());
    }
}
