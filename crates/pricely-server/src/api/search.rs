//! `POST /get-search-results` (§6) — bit-exact response schema.

use axum::extract::{Extension, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use pricely_content::ContentStore;
use pricely_core::{credentials_from_wire, credentials_to_wire, Offer, ProductGroup};

use crate::error::ApiError;
use crate::middleware::RequestId;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub item_name: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub credentials: Value,
}

#[derive(Debug, Serialize)]
struct OfferWire {
    store: &'static str,
    price: Option<i64>,
    quantity: String,
    url: String,
}

impl From<&Offer> for OfferWire {
    fn from(offer: &Offer) -> Self {
        Self { store: offer.store.as_str(), price: offer.price, quantity: offer.quantity.clone(), url: offer.url.clone() }
    }
}

#[derive(Debug, Serialize)]
struct GroupWire {
    name: String,
    image: String,
    price: Vec<OfferWire>,
}

impl From<&ProductGroup> for GroupWire {
    fn from(group: &ProductGroup) -> Self {
        Self {
            name: group.representative_name.clone(),
            image: group.representative_image.clone(),
            price: group.offers.iter().map(OfferWire::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct SearchResultWire {
    groups: Vec<GroupWire>,
    credentials: Value,
}

pub async fn get_search_results<C: ContentStore>(
    State(state): State<AppState<C>>,
    Extension(request_id): Extension<RequestId>,
    Json(body): Json<SearchRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if body.item_name.trim().is_empty() {
        return Err(ApiError::bad_request(request_id.0, "item_name must not be empty"));
    }
    if !(-90.0..=90.0).contains(&body.lat) || !(-180.0..=180.0).contains(&body.lon) {
        return Err(ApiError::bad_request(request_id.0, "lat/lon out of range"));
    }

    let credentials = credentials_from_wire(&body.credentials);

    let result = state
        .orchestrator
        .compare_from_coords(&body.item_name, body.lat, body.lon, credentials)
        .await
        .map_err(|e| ApiError::from_engine_error(request_id.0.clone(), &e))?;

    let wire = SearchResultWire {
        groups: result.groups.iter().map(GroupWire::from).collect(),
        credentials: Value::Object(credentials_to_wire(&result.credentials)),
    };

    Ok(crate::error::ApiResponse::ok(wire))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offer_wire_preserves_store_name_casing() {
        let offer = Offer {
            store: pricely_core::Platform::Dmart,
            price: Some(100),
            quantity: "1 kg".to_string(),
            url: "https://example.test".to_string(),
        };
        let wire = OfferWire::from(&offer);
        assert_eq!(wire.store, "Dmart");
    }
}
