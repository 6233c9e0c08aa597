//! `POST /get-api-key` (§6, §10.6) — time-obfuscated map-provider key.

use axum::extract::{Extension, State};
use axum::response::IntoResponse;
use chrono::Timelike;
use rand::seq::SliceRandom;

use pricely_content::ContentStore;
use pricely_core::api_key::encode_api_key;

use crate::error::ApiResponse;
use crate::middleware::RequestId;
use crate::state::AppState;

fn hour_12(now: chrono::DateTime<chrono::Local>) -> u32 {
    let hour24 = now.hour();
    let hour12 = hour24 % 12;
    if hour12 == 0 {
        12
    } else {
        hour12
    }
}

pub async fn get_api_key<C: ContentStore>(
    State(state): State<AppState<C>>,
    Extension(_request_id): Extension<RequestId>,
) -> impl IntoResponse {
    let key = state
        .config
        .map_provider_api_keys
        .choose(&mut rand::rng())
        .expect("AppConfig guarantees at least one map provider key");
    let encoded = encode_api_key(key, hour_12(chrono::Local::now()));
    ApiResponse::ok(encoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn midnight_maps_to_twelve() {
        let midnight = chrono::Local.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(hour_12(midnight), 12);
    }

    #[test]
    fn afternoon_hour_wraps_into_12h_format() {
        let afternoon = chrono::Local.with_ymd_and_hms(2026, 1, 1, 15, 0, 0).unwrap();
        assert_eq!(hour_12(afternoon), 3);
    }
}
