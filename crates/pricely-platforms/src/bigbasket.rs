//! BigBasket handler.
//!
//! State machine `INIT -> COOKIES_OK -> CSRF_OK -> ADDRESS_SET ->
//! BUILDID_KNOWN -> READY`, expressed as a linear sequence of fallible
//! steps rather than a long-lived state object, .

use std::collections::HashMap;

use regex::Regex;
use serde_json::Value;

use pricely_core::{LocationDescriptor, Platform, PlatformCredential, ProductListing};
use pricely_proxy::{cookie_header, ProxyClient, ProxyMethod};

use crate::error::PlatformError;
use crate::retry::{fresh_session_id, run_with_retry, step_with_retries};

const BASE_URL: &str = "https://www.bigbasket.com";
const STEP_ATTEMPTS: u32 = 3;
const AVAILABLE_STATUS: &str = "001";

/// Search BigBasket for `query` near `location`, reusing `credential` when
/// present ( common contract).
pub async fn search(
    proxy: &ProxyClient,
    query: &str,
    location: &LocationDescriptor,
    credential: Option<PlatformCredential>,
    max_attempts: u32,
) -> (Vec<ProductListing>, Option<PlatformCredential>) {
    let result = run_with_retry(Platform::Bigbasket, max_attempts, |attempt_no| {
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
            tracing::error!(platform = "Bigbasket", error = %err, "search exhausted all attempts");
            (Vec::new(), credential)
        }
    }
}

async fn acquire_credentials(
    proxy: &ProxyClient,
    location: &LocationDescriptor,
) -> Result<PlatformCredential, PlatformError> {
    let mut cookies: HashMap<String, String> = HashMap::new();
    let mut headers: HashMap<String, String> = HashMap::new();

    // INIT -> COOKIES_OK
    let root = step_with_retries(Platform::Bigbasket, "cookies", STEP_ATTEMPTS, || async {
        let session = fresh_session_id();
        proxy
            .request(ProxyMethod::Get, BASE_URL, &headers, None, Some(&session))
            .await
            .map_err(PlatformError::from)
    })
    .await?;
    cookies.extend(root.cookie_delta);

    // COOKIES_OK -> CSRF_OK: monotonically increasing `_` timestamp param.
    let timestamp = chrono::Utc::now().timestamp_millis();
    let header_url = format!("{BASE_URL}/header-api/?_={timestamp}");
    let csrf_response = step_with_retries(Platform::Bigbasket, "csrf", STEP_ATTEMPTS, || async {
        let session = fresh_session_id();
        let mut request_headers = headers.clone();
        request_headers.insert("cookie".to_string(), cookie_header(&cookies));
        proxy
            .request(ProxyMethod::Get, &header_url, &request_headers, None, Some(&session))
            .await
            .map_err(PlatformError::from)
    })
    .await?;
    cookies.extend(csrf_response.cookie_delta);
    let csrf_token = cookies.get("csurftoken").cloned().ok_or_else(|| {
        PlatformError::CredentialAcquisition {
            platform: Platform::Bigbasket,
            step: "csrf".to_string(),
            reason: "response carried no csurftoken cookie".to_string(),
        }
    })?;
    headers.insert("x-csurftoken".to_string(), csrf_token);

    // CSRF_OK -> ADDRESS_SET
    let address_body = serde_json::json!({
        "lat": location.lat,
        "long": location.lon,
        "contact_zipcode": location.postal_code,
    })
    .to_string();
    let address_response = step_with_retries(Platform::Bigbasket, "address", STEP_ATTEMPTS, || async {
        let session = fresh_session_id();
        let mut request_headers = headers.clone();
        request_headers.insert("cookie".to_string(), cookie_header(&cookies));
        proxy
            .request(
                ProxyMethod::Put,
                &format!("{BASE_URL}/member-api/v1/current-delivery-address/"),
                &request_headers,
                Some(&address_body),
                Some(&session),
            )
            .await
            .map_err(PlatformError::from)
    })
    .await?;
    cookies.extend(address_response.cookie_delta);

    // ADDRESS_SET -> BUILDID_KNOWN
    let root_again = step_with_retries(Platform::Bigbasket, "buildid", STEP_ATTEMPTS, || async {
        let session = fresh_session_id();
        let mut request_headers = headers.clone();
        request_headers.insert("cookie".to_string(), cookie_header(&cookies));
        proxy
            .request(ProxyMethod::Get, BASE_URL, &request_headers, None, Some(&session))
            .await
            .map_err(PlatformError::from)
    })
    .await?;
    let build_id = extract_build_id(&root_again.body).ok_or_else(|| PlatformError::CredentialAcquisition {
        platform: Platform::Bigbasket,
        step: "buildid".to_string(),
        reason: "no buildId found in storefront page config".to_string(),
    })?;

    Ok(PlatformCredential::Bigbasket {
        auth_cookies: cookies,
        headers,
        build_id,
        lat: location.lat,
        lon: location.lon,
    })
}

fn build_id_pattern() -> &'static Regex {
    use std::sync::OnceLock;
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#""buildId"\s*:\s*"([^"]+)""#).expect("static buildId regex is valid"))
}

fn extract_build_id(page_body: &str) -> Option<String> {
    build_id_pattern()
        .captures(page_body)
        .map(|caps| caps[1].to_string())
}

async fn try_search(
    proxy: &ProxyClient,
    query: &str,
    cred: PlatformCredential,
) -> Result<(Vec<ProductListing>, PlatformCredential), PlatformError> {
    let PlatformCredential::Bigbasket {
        auth_cookies,
        headers,
        build_id,
        lat,
        lon,
    } = cred
    else {
        return Err(PlatformError::Parse {
            reason: "search called with non-Bigbasket credential".to_string(),
        });
    };

    let encoded_query = percent_encoding::utf8_percent_encode(query, percent_encoding::NON_ALPHANUMERIC);
    let url = format!("{BASE_URL}/_next/data/{build_id}/ps.json?q={encoded_query}&nc=as&listing=ps");

    let mut request_headers = headers.clone();
    request_headers.insert("cookie".to_string(), cookie_header(&auth_cookies));
    let session = fresh_session_id();
    let response = proxy
        .request(ProxyMethod::Get, &url, &request_headers, None, Some(&session))
        .await?;

    // A 404 means the buildId has gone stale; surface this so the caller
    // re-acquires a fresh one on the next attempt.
    if response.status == 404 {
        return Err(PlatformError::UpstreamStatus { code: 404 });
    }
    if response.status >= 400 {
        return Err(PlatformError::UpstreamStatus { code: response.status });
    }

    let parsed: Value = serde_json::from_str(&response.body)
        .map_err(|e| PlatformError::Parse { reason: e.to_string() })?;
    let listings = parse_listings(&parsed);

    let mut refreshed_cookies = auth_cookies;
    refreshed_cookies.extend(response.cookie_delta);

    Ok((
        listings,
        PlatformCredential::Bigbasket {
            auth_cookies: refreshed_cookies,
            headers,
            build_id,
            lat,
            lon,
        },
    ))
}

fn parse_listings(root: &Value) -> Vec<ProductListing> {
    let Some(products) = root
        .pointer("/pageProps/SSRData/tabs/0/product_info/products")
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };

    let mut listings = Vec::new();
    for product in products {
        push_if_available(product, &mut listings);
        if let Some(children) = product.get("children").and_then(Value::as_array) {
            for child in children {
                push_if_available(child, &mut listings);
            }
        }
    }
    listings
}

fn push_if_available(product: &Value, out: &mut Vec<ProductListing>) {
    let avail_status = product.pointer("/availability/avail_status").and_then(Value::as_str);
    if avail_status != Some(AVAILABLE_STATUS) {
        return;
    }
    let Some(name) = product.get("desc").and_then(Value::as_str) else {
        return;
    };
    let price_raw = product
        .pointer("/pricing/discount/prim_price/sp")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let image = product
        .pointer("/images/0/s")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let path = product.get("absolute_url").and_then(Value::as_str).unwrap_or_default();
    let weight = product.get("w").and_then(Value::as_str).unwrap_or_default();

    out.push(ProductListing {
        platform: Platform::Bigbasket,
        name: name.to_string(),
        price_minor: pricely_core::quantity::parse_price_minor(price_raw),
        image_url: image.to_string(),
        product_url: format!("{BASE_URL}{path}"),
        raw_quantity: weight.to_string(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricely_core::ParsedQuantity;

    fn parse_raw_quantity(raw: &str) -> Option<ParsedQuantity> {
        pricely_core::quantity::parse_quantity(raw)
    }

    #[test]
    fn extract_build_id_finds_quoted_value() {
        let page = r#"<script>{"buildId":"abc123","other":"x"}</script>"#;
        assert_eq!(extract_build_id(page), Some("abc123".to_string()));
    }

    #[test]
    fn extract_build_id_returns_none_without_match() {
        assert_eq!(extract_build_id("no build id here"), None);
    }

    #[test]
    fn parse_listings_skips_unavailable_products() {
        let root = serde_json::json!({
            "pageProps": {"SSRData": {"tabs": [{"product_info": {"products": [
                {
                    "availability": {"avail_status": "001"},
                    "desc": "Aashirvaad Atta 5 kg",
                    "pricing": {"discount": {"prim_price": {"sp": "275"}}},
                    "images": [{"s": "https://img/1.jpg"}],
                    "absolute_url": "/pd/aashirvaad-atta",
                    "w": "5 kg"
                },
                {
                    "availability": {"avail_status": "003"},
                    "desc": "Out of stock item",
                    "pricing": {"discount": {"prim_price": {"sp": "100"}}},
                    "images": [{"s": "https://img/2.jpg"}],
                    "absolute_url": "/pd/oos",
                    "w": "1 kg"
                }
            ]}}]}}
        });
        let listings = parse_listings(&root);
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].name, "Aashirvaad Atta 5 kg");
        assert_eq!(listings[0].price_minor, Some(275));
        assert_eq!(
            listings[0].product_url,
            "https://www.bigbasket.com/pd/aashirvaad-atta"
        );
        assert_eq!(parse_raw_quantity(&listings[0].raw_quantity).unwrap().value, 5000.0);
    }

    #[test]
    fn parse_listings_returns_empty_on_missing_products_array() {
        let root = serde_json::json!({"pageProps": {}});
        assert!(parse_listings(&root).is_empty());
    }
}
