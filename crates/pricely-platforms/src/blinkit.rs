//! Blinkit handler.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use pricely_core::{LocationDescriptor, Platform, PlatformCredential, ProductListing};
use pricely_proxy::{cookie_header, ProxyClient, ProxyMethod};

use crate::error::PlatformError;
use crate::retry::{fresh_session_id, run_with_retry, step_with_retries};

const BASE_URL: &str = "https://blinkit.com";
const STEP_ATTEMPTS: u32 = 3;

pub async fn search(
    proxy: &ProxyClient,
    query: &str,
    location: &LocationDescriptor,
    credential: Option<PlatformCredential>,
    max_attempts: u32,
) -> (Vec<ProductListing>, Option<PlatformCredential>) {
    let result = run_with_retry(Platform::Blinkit, max_attempts, |attempt_no| {
        let supplied = if attempt_no == 1 { credential.clone() } else { None };
        let query = query.to_string();
        let location = location.clone();
        Box::pin(async move {
            let cred = match supplied {
                Some(c) => c,
                None => acquire_credentials(proxy, &location).await?,
            };
            try_search(proxy, &query, cred).await
        })
    })
    .await;

    match result {
        Ok((listings, cred)) => (listings, Some(cred)),
        Err(err) => {
            tracing::error!(platform = "Blinkit", error = %err, "search exhausted all attempts");
            (Vec::new(), credential)
        }
    }
}

fn request_key_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#""requestKey"\s*:\s*"([^"]+)""#).expect("static requestKey regex is valid"))
}

fn app_version_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#""appVersion"\s*:\s*"([^"]+)""#).expect("static appVersion regex is valid"))
}

async fn acquire_credentials(
    proxy: &ProxyClient,
    location: &LocationDescriptor,
) -> Result<PlatformCredential, PlatformError> {
    let empty_headers = HashMap::new();

    // GET storefront root -> requestKey, appVersion, device_id cookie.
    let root = step_with_retries(Platform::Blinkit, "root", STEP_ATTEMPTS, || async {
        let session = fresh_session_id();
        proxy
            .request(ProxyMethod::Get, BASE_URL, &empty_headers, None, Some(&session))
            .await
            .map_err(PlatformError::from)
    })
    .await?;

    let request_key = request_key_pattern()
        .captures(&root.body)
        .map(|c| c[1].to_string())
        .ok_or_else(|| PlatformError::CredentialAcquisition {
            platform: Platform::Blinkit,
            step: "root".to_string(),
            reason: "no requestKey found in storefront page".to_string(),
        })?;
    let app_version = app_version_pattern()
        .captures(&root.body)
        .map(|c| c[1].to_string())
        .unwrap_or_default();
    let device_id = root
        .cookie_delta
        .get("device_id")
        .cloned()
        .ok_or_else(|| PlatformError::CredentialAcquisition {
            platform: Platform::Blinkit,
            step: "root".to_string(),
            reason: "no device_id cookie in storefront response".to_string(),
        })?;

    let mut cookies = root.cookie_delta;

    // GET auth_key endpoint with req_key header.
    let auth_key_response = step_with_retries(Platform::Blinkit, "auth_key", STEP_ATTEMPTS, || async {
        let session = fresh_session_id();
        let mut headers = HashMap::new();
        headers.insert("req_key".to_string(), request_key.clone());
        headers.insert("cookie".to_string(), cookie_header(&cookies));
        proxy
            .request(
                ProxyMethod::Get,
                &format!("{BASE_URL}/v2/accounts/auth_key/"),
                &headers,
                None,
                Some(&session),
            )
            .await
            .map_err(PlatformError::from)
    })
    .await?;
    cookies.extend(auth_key_response.cookie_delta.clone());

    let parsed: Value = serde_json::from_str(&auth_key_response.body).map_err(|e| PlatformError::CredentialAcquisition {
        platform: Platform::Blinkit,
        step: "auth_key".to_string(),
        reason: e.to_string(),
    })?;
    if parsed.get("success").and_then(Value::as_bool) != Some(true) {
        return Err(PlatformError::CredentialAcquisition {
            platform: Platform::Blinkit,
            step: "auth_key".to_string(),
            reason: "auth_key response did not report success".to_string(),
        });
    }
    let auth_key = parsed
        .get("auth_key")
        .and_then(Value::as_str)
        .ok_or_else(|| PlatformError::CredentialAcquisition {
            platform: Platform::Blinkit,
            step: "auth_key".to_string(),
            reason: "response carried no auth_key".to_string(),
        })?
        .to_string();

    cookies.insert("gr_1_lat".to_string(), location.lat.to_string());
    cookies.insert("gr_1_lon".to_string(), location.lon.to_string());
    cookies.insert("gr_1_locality".to_string(), location.formatted_address.clone());
    cookies.insert("gr_1_landmark".to_string(), location.formatted_address.clone());

    Ok(PlatformCredential::Blinkit {
        device_id,
        app_version,
        auth_key,
        cookies,
        lat: location.lat,
        lon: location.lon,
    })
}

async fn try_search(
    proxy: &ProxyClient,
    query: &str,
    cred: PlatformCredential,
) -> Result<(Vec<ProductListing>, PlatformCredential), PlatformError> {
    let PlatformCredential::Blinkit {
        device_id,
        app_version,
        auth_key,
        cookies,
        lat,
        lon,
    } = cred
    else {
        return Err(PlatformError::Parse {
            reason: "search called with non-Blinkit credential".to_string(),
        });
    };

    let encoded_query = percent_encoding::utf8_percent_encode(query, percent_encoding::NON_ALPHANUMERIC);
    let url = format!("{BASE_URL}/v6/search/products?start=0&size=30&search_type=6&q={encoded_query}");

    let mut headers = HashMap::new();
    headers.insert("auth_key".to_string(), auth_key.clone());
    headers.insert("device_id".to_string(), device_id.clone());
    headers.insert("lat".to_string(), lat.to_string());
    headers.insert("lon".to_string(), lon.to_string());
    headers.insert("app_version".to_string(), app_version.clone());
    headers.insert("session_uuid".to_string(), fresh_session_id());
    headers.insert("platform".to_string(), "android".to_string());
    headers.insert("cookie".to_string(), cookie_header(&cookies));

    let session = fresh_session_id();
    let response = proxy
        .request(ProxyMethod::Get, &url, &headers, None, Some(&session))
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
        PlatformCredential::Blinkit {
            device_id,
            app_version,
            auth_key,
            cookies: refreshed_cookies,
            lat,
            lon,
        },
    ))
}

fn slugify(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

fn parse_listings(root: &Value) -> Vec<ProductListing> {
    let Some(objects) = root.get("objects").and_then(Value::as_array) else {
        return Vec::new();
    };

    objects
        .iter()
        .skip(1)
        .filter_map(parse_one_object)
        .collect()
}

fn parse_one_object(object: &Value) -> Option<ProductListing> {
    let inventory = object
        .pointer("/tracking/widget_meta/inventory")
        .and_then(Value::as_i64)
        .unwrap_or(0);
    if inventory <= 0 {
        return None;
    }

    let name = object
        .pointer("/tracking/widget_meta/name")
        .and_then(Value::as_str)?
        .to_string();
    let id = object
        .pointer("/tracking/widget_meta/id")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let price_raw = object
        .pointer("/tracking/widget_meta/price")
        .map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .unwrap_or_default();
    let image = object
        .pointer("/data/product/rfc_actions_v2/default/0/remove_from_cart/cart_item/image")
        .and_then(Value::as_str)
        .unwrap_or_default();

    Some(ProductListing {
        platform: Platform::Blinkit,
        price_minor: pricely_core::quantity::parse_price_minor(&price_raw),
        image_url: image.to_string(),
        product_url: format!("{BASE_URL}/prn/{}/prid/{id}", slugify(&name)),
        raw_quantity: String::new(),
        name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_lowercases_and_joins_with_dashes() {
        assert_eq!(slugify("Aashirvaad Atta 5 kg"), "aashirvaad-atta-5-kg");
    }

    #[test]
    fn parse_listings_skips_index_zero_and_out_of_inventory() {
        let root = serde_json::json!({"objects": [
            {"tracking": {"widget_meta": {"name": "header", "inventory": 0}}},
            {
                "tracking": {"widget_meta": {"name": "Milk 1L", "id": "p1", "price": "55", "inventory": 10}},
                "data": {"product": {"rfc_actions_v2": {"default": [{"remove_from_cart": {"cart_item": {"image": "https://img/milk.jpg"}}}]}}}
            },
            {"tracking": {"widget_meta": {"name": "Out of stock", "id": "p2", "price": "10", "inventory": 0}}}
        ]});
        let listings = parse_listings(&root);
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].name, "Milk 1L");
        assert_eq!(listings[0].price_minor, Some(55));
        assert_eq!(listings[0].product_url, "https://blinkit.com/prn/milk-1l/prid/p1");
    }
}
