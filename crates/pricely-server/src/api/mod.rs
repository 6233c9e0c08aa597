pub mod admin;
pub mod api_key;
pub mod auth;
pub mod autocomplete;
pub mod search;

use axum::http::{header, HeaderName, Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use pricely_content::ContentStore;

use crate::middleware::{request_id, require_admin_session};
use crate::state::AppState;

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, HeaderName::from_static("x-request-id")])
}

/// Table routes split public-GET from admin-gated mutation, mirroring the
/// original's `if 'admin_username' not in session` guard per handler (§10.6).
fn admin_router<C: ContentStore + 'static>(state: AppState<C>) -> Router<AppState<C>> {
    let public = Router::new().route("/api/{table}", get(admin::list_rows));

    // `customer_analytics` is GET but admin-gated (§10.6 decision): it
    // exposes customer data, unlike the rest of the public-read tables.
    let admin_gated = Router::new()
        .route("/api/{table}", post(admin::create_row))
        .route("/api/{table}/{id}", put(admin::update_row).delete(admin::delete_row))
        .route("/api/customer_analytics", get(admin::customer_analytics))
        .layer(axum::middleware::from_fn_with_state(state, require_admin_session::<C>));

    public.merge(admin_gated)
}

pub fn build_app<C: ContentStore + 'static>(state: AppState<C>) -> Router {
    let routes = Router::new()
        .route("/healthz", get(health))
        .route("/get-search-results", post(search::get_search_results))
        .route("/autocomplete", post(autocomplete::autocomplete))
        .route("/login", post(auth::login))
        .route("/signup", post(auth::signup))
        .route("/send-otp", post(auth::send_otp))
        .route("/confirm-otp", post(auth::confirm_otp))
        .route("/get-api-key", post(api_key::get_api_key))
        .merge(admin_router(state.clone()));

    routes
        .layer(ServiceBuilder::new().layer(build_cors()).layer(axum::middleware::from_fn(request_id)))
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({"status": "ok"})))
}
