//! Swiggy Instamart handler.

use std::collections::HashMap;

use serde_json::Value;

use pricely_core::{LocationDescriptor, Platform, PlatformCredential, ProductListing};
use pricely_proxy::{cookie_header, ProxyClient, ProxyMethod};

use crate::error::PlatformError;
use crate::retry::{fresh_session_id, run_with_retry, step_with_retries};

const BASE_URL: &str = "https://www.swiggy.com";
const STEP_ATTEMPTS: u32 = 3;
const NOT_DELIVERABLE_MESSAGE: &str = "Sorry! We do not deliver to this location yet.";

pub async fn search(
    proxy: &ProxyClient,
    query: &str,
    location: &LocationDescriptor,
    credential: Option<PlatformCredential>,
    max_attempts: u32,
) -> (Vec<ProductListing>, Option<PlatformCredential>) {
    if let Some(cred) = &credential {
        if cred.is_non_serviceable() {
            return (Vec::new(), Some(cred.clone()));
        }
    }

    let result = run_with_retry(Platform::Instamart, max_attempts, |attempt_no| {
        let supplied = if attempt_no == 1 { credential.clone() } else { None };
        let query = query.to_string();
        let location = location.clone();
        Box::pin(async move {
            let cred = match supplied {
                Some(c) => c,
                None => acquire_credentials(proxy, &location).await?,
            };
            if cred.is_non_serviceable() {
                return Err(PlatformError::NonServiceable);
            }
            try_search(proxy, &query, cred).await
        })
    })
    .await;

    match result {
        Ok((listings, cred)) => (listings, Some(cred)),
        Err(PlatformError::NonServiceable) => (
            Vec::new(),
            Some(PlatformCredential::Instamart {
                cookies: HashMap::new(),
                primary_store_id: String::new(),
                secondary_store_id: None,
                non_serviceable: true,
            }),
        ),
        Err(err) => {
            tracing::error!(platform = "Instamart", error = %err, "search exhausted all attempts");
            (Vec::new(), credential)
        }
    }
}

async fn acquire_credentials(
    proxy: &ProxyClient,
    location: &LocationDescriptor,
) -> Result<PlatformCredential, PlatformError> {
    let mut cookies: HashMap<String, String> = HashMap::new();

    let root = step_with_retries(Platform::Instamart, "search_page", STEP_ATTEMPTS, || async {
        let session = fresh_session_id();
        proxy
            .request(
                ProxyMethod::Get,
                &format!("{BASE_URL}/instamart/search/"),
                &HashMap::new(),
                None,
                Some(&session),
            )
            .await
            .map_err(PlatformError::from)
    })
    .await?;
    cookies.extend(root.cookie_delta);

    let select_location_body = serde_json::json!({
        "lat": location.lat,
        "lng": location.lon,
        "address": location.formatted_address,
    })
    .to_string();
    let select_response = step_with_retries(Platform::Instamart, "select_location", STEP_ATTEMPTS, || async {
        let session = fresh_session_id();
        let mut headers = HashMap::new();
        headers.insert("cookie".to_string(), cookie_header(&cookies));
        proxy
            .request(
                ProxyMethod::Post,
                &format!("{BASE_URL}/api/instamart/home/select-location"),
                &headers,
                Some(&select_location_body),
                Some(&session),
            )
            .await
            .map_err(PlatformError::from)
    })
    .await?;
    cookies.extend(select_response.cookie_delta.clone());

    let parsed: Value =
        serde_json::from_str(&select_response.body).map_err(|e| PlatformError::CredentialAcquisition {
            platform: Platform::Instamart,
            step: "select_location".to_string(),
            reason: e.to_string(),
        })?;

    let message = parsed.get("message").and_then(Value::as_str).unwrap_or_default();
    if message == NOT_DELIVERABLE_MESSAGE {
        return Ok(PlatformCredential::Instamart {
            cookies,
            primary_store_id: String::new(),
            secondary_store_id: None,
            non_serviceable: true,
        });
    }

    let primary_store_id = parsed
        .pointer("/data/storeId")
        .and_then(Value::as_str)
        .ok_or_else(|| PlatformError::CredentialAcquisition {
            platform: Platform::Instamart,
            step: "select_location".to_string(),
            reason: "response carried no data.storeId".to_string(),
        })?
        .to_string();
    let secondary_store_id = parsed
        .pointer("/data/storesDetails/1/id")
        .and_then(Value::as_str)
        .map(str::to_string);

    let user_location = percent_encoding::utf8_percent_encode(
        &serde_json::json!({
            "lat": location.lat,
            "lng": location.lon,
            "address": location.formatted_address,
        })
        .to_string(),
        percent_encoding::NON_ALPHANUMERIC,
    )
    .to_string();
    cookies.insert("userLocation".to_string(), user_location);

    Ok(PlatformCredential::Instamart {
        cookies,
        primary_store_id,
        secondary_store_id,
        non_serviceable: false,
    })
}

async fn try_search(
    proxy: &ProxyClient,
    query: &str,
    cred: PlatformCredential,
) -> Result<(Vec<ProductListing>, PlatformCredential), PlatformError> {
    let PlatformCredential::Instamart {
        cookies,
        primary_store_id,
        secondary_store_id,
        non_serviceable,
    } = cred
    else {
        return Err(PlatformError::Parse {
            reason: "search called with non-Instamart credential".to_string(),
        });
    };

    let encoded_query = percent_encoding::utf8_percent_encode(query, percent_encoding::NON_ALPHANUMERIC);
    let mut url = format!(
        "{BASE_URL}/api/instamart/search?storeId={primary_store_id}&primary={primary_store_id}&query={encoded_query}"
    );
    if let Some(secondary) = &secondary_store_id {
        url.push_str(&format!("&secondary={secondary}"));
    }
    let body = serde_json::json!({"facets": {}, "sortAttribute": ""}).to_string();

    let mut headers = HashMap::new();
    headers.insert("cookie".to_string(), cookie_header(&cookies));
    let session = fresh_session_id();
    let response = proxy
        .request(ProxyMethod::Post, &url, &headers, Some(&body), Some(&session))
        .await?;
    if response.status >= 400 {
        return Err(PlatformError::UpstreamStatus { code: response.status });
    }

    let parsed: Value =
        serde_json::from_str(&response.body).map_err(|e| PlatformError::Parse { reason: e.to_string() })?;
    let listings = parse_listings(&parsed);

    let mut refreshed_cookies = cookies;
    refreshed_cookies.extend(response.cookie_delta);

    Ok((
        listings,
        PlatformCredential::Instamart {
            cookies: refreshed_cookies,
            primary_store_id,
            secondary_store_id,
            non_serviceable,
        },
    ))
}

fn parse_listings(root: &Value) -> Vec<ProductListing> {
    let Some(widgets) = root.pointer("/data/widgets").and_then(Value::as_array) else {
        return Vec::new();
    };
    let Some(first_widget_data) = widgets.first().and_then(|w| w.get("data")).and_then(Value::as_array) else {
        return Vec::new();
    };

    let mut listings = Vec::new();
    for item in first_widget_data {
        let Some(variations) = item.get("variations").and_then(Value::as_array) else {
            continue;
        };
        for variation in variations {
            let in_stock = variation
                .pointer("/inventory/in_stock")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            if !in_stock {
                continue;
            }
            let Some(name) = variation.get("display_name").and_then(Value::as_str) else {
                continue;
            };
            let price_raw = variation
                .pointer("/price/offer_price")
                .map(|v| match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .unwrap_or_default();
            let image = variation.get("images").and_then(Value::as_array).and_then(|imgs| imgs.first()).and_then(Value::as_str).unwrap_or_default();
            let id = variation.get("id").and_then(Value::as_str).unwrap_or_default();
            let quantity = variation.get("quantity").and_then(Value::as_str).unwrap_or_default();

            listings.push(ProductListing {
                platform: Platform::Instamart,
                name: name.to_string(),
                price_minor: pricely_core::quantity::parse_price_minor(&price_raw),
                image_url: image.to_string(),
                product_url: format!("{BASE_URL}/instamart/item/{id}"),
                raw_quantity: quantity.to_string(),
            });
        }
    }
    listings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_listings_filters_out_of_stock_variations() {
        let root = serde_json::json!({"data": {"widgets": [{"data": [
            {"variations": [
                {"id": "v1", "display_name": "Toor Dal 1kg", "price": {"offer_price": "120"}, "images": ["img1"], "quantity": "1 kg", "inventory": {"in_stock": true}},
                {"id": "v2", "display_name": "Sugar 1kg", "price": {"offer_price": "45"}, "images": ["img2"], "quantity": "1 kg", "inventory": {"in_stock": false}}
            ]}
        ]}}});
        let listings = parse_listings(&root);
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].name, "Toor Dal 1kg");
        assert_eq!(listings[0].price_minor, Some(120));
    }
}
