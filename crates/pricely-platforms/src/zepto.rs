//! Zepto handler.

use std::collections::HashMap;

use serde_json::Value;

use pricely_core::{LocationDescriptor, Platform, PlatformCredential, ProductListing};
use pricely_proxy::{cookie_header, ProxyClient, ProxyMethod};

use crate::error::PlatformError;
use crate::retry::{fresh_session_id, run_with_retry, step_with_retries};

const BASE_URL: &str = "https://www.zeptonow.com";
const STEP_ATTEMPTS: u32 = 3;
const SEARCHED_PRODUCTS_PREFIX: &str = "SEARCHED_PRODUCTS";

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

    let result = run_with_retry(Platform::Zepto, max_attempts, |attempt_no| {
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
            Some(PlatformCredential::Zepto {
                store_id: String::new(),
                device_id: String::new(),
                session_id: String::new(),
                xsrf_token: String::new(),
                non_serviceable: true,
            }),
        ),
        Err(err) => {
            tracing::error!(platform = "Zepto", error = %err, "search exhausted all attempts");
            (Vec::new(), credential)
        }
    }
}

async fn acquire_credentials(
    proxy: &ProxyClient,
    location: &LocationDescriptor,
) -> Result<PlatformCredential, PlatformError> {
    let mut cookies = HashMap::new();
    cookies.insert("user_position".to_string(), format!("{},{}", location.lat, location.lon));
    cookies.insert("latitude".to_string(), location.lat.to_string());
    cookies.insert("longitude".to_string(), location.lon.to_string());

    let response = step_with_retries(Platform::Zepto, "search_page", STEP_ATTEMPTS, || async {
        let session = fresh_session_id();
        let mut headers = HashMap::new();
        headers.insert("cookie".to_string(), cookie_header(&cookies));
        proxy
            .request(ProxyMethod::Get, &format!("{BASE_URL}/search"), &headers, None, Some(&session))
            .await
            .map_err(PlatformError::from)
    })
    .await?;

    cookies.extend(response.cookie_delta.clone());

    let serviceability = response
        .cookie_delta
        .get("serviceability")
        .and_then(|raw| serde_json::from_str::<Value>(raw).ok());
    let serviceable = serviceability
        .as_ref()
        .and_then(|v| v.pointer("/primaryStore/serviceable"))
        .and_then(Value::as_bool)
        .unwrap_or(true);

    let device_id = cookies.get("device_id").cloned().unwrap_or_default();
    let session_id = cookies.get("session_id").cloned().unwrap_or_default();
    let xsrf_token = cookies.get("XSRF-TOKEN").cloned().unwrap_or_default();

    let store_id = serviceability
        .as_ref()
        .and_then(|v| v.pointer("/primaryStore/id"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_default();

    Ok(PlatformCredential::Zepto {
        store_id,
        device_id,
        session_id,
        xsrf_token,
        non_serviceable: !serviceable,
    })
}

async fn try_search(
    proxy: &ProxyClient,
    query: &str,
    cred: PlatformCredential,
) -> Result<(Vec<ProductListing>, PlatformCredential), PlatformError> {
    let PlatformCredential::Zepto {
        store_id,
        device_id,
        session_id,
        xsrf_token,
        non_serviceable,
    } = cred
    else {
        return Err(PlatformError::Parse {
            reason: "search called with non-Zepto credential".to_string(),
        });
    };

    let intent_id = uuid::Uuid::new_v4().to_string();
    let user_session_id = fresh_session_id();
    let body = serde_json::json!({
        "query": query,
        "pageNumber": 1,
        "intentId": intent_id,
        "mode": "AUTOSUGGEST",
        "userSessionId": user_session_id,
    })
    .to_string();

    let mut headers = HashMap::new();
    headers.insert("storeid".to_string(), store_id.clone());
    headers.insert("deviceid".to_string(), device_id.clone());
    headers.insert("sessionid".to_string(), session_id.clone());
    headers.insert("x-xsrf-token".to_string(), xsrf_token.clone());
    headers.insert("store_etas".to_string(), "{}".to_string());

    let session = fresh_session_id();
    let response = proxy
        .request(
            ProxyMethod::Post,
            &format!("{BASE_URL}/api/v3/search"),
            &headers,
            Some(&body),
            Some(&session),
        )
        .await?;
    if response.status >= 400 {
        return Err(PlatformError::UpstreamStatus { code: response.status });
    }

    let parsed: Value =
        serde_json::from_str(&response.body).map_err(|e| PlatformError::Parse { reason: e.to_string() })?;
    let listings = parse_listings(&parsed);

    Ok((
        listings,
        PlatformCredential::Zepto {
            store_id,
            device_id,
            session_id,
            xsrf_token,
            non_serviceable,
        },
    ))
}

fn parse_listings(root: &Value) -> Vec<ProductListing> {
    let Some(widgets) = root.pointer("/layout/widgets").and_then(Value::as_array) else {
        return Vec::new();
    };

    let mut listings = Vec::new();
    for widget in widgets {
        let widget_name = widget.get("widgetName").and_then(Value::as_str).unwrap_or_default();
        if !widget_name.starts_with(SEARCHED_PRODUCTS_PREFIX) {
            continue;
        }
        let Some(items) = widget.get("data").and_then(Value::as_array) else {
            continue;
        };
        for item in items {
            if let Some(listing) = parse_one_item(item) {
                listings.push(listing);
            }
        }
    }
    listings
}

fn parse_one_item(item: &Value) -> Option<ProductListing> {
    let out_of_stock = item.get("outOfStock").and_then(Value::as_bool).unwrap_or(false);
    if out_of_stock {
        return None;
    }

    let name = item.get("name").and_then(Value::as_str)?;
    let price_minor_paise = item.get("superSaverSellingPrice").and_then(Value::as_i64);
    let image = item.get("imageUrl").and_then(Value::as_str).unwrap_or_default();
    let id = item.get("productId").and_then(Value::as_str).unwrap_or_default();
    let quantity = item.get("quantity").and_then(Value::as_str).unwrap_or_default();

    Some(ProductListing {
        platform: Platform::Zepto,
        name: name.to_string(),
        price_minor: price_minor_paise.map(|p| p / 100),
        image_url: image.to_string(),
        product_url: format!("{BASE_URL}/pn/{id}"),
        raw_quantity: quantity.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_listings_only_reads_searched_products_widgets() {
        let root = serde_json::json!({"layout": {"widgets": [
            {"widgetName": "BANNER", "data": [{"name": "ignored", "productId": "x", "superSaverSellingPrice": 100}]},
            {"widgetName": "SEARCHED_PRODUCTS_V2", "data": [
                {"name": "Amul Milk 1L", "productId": "p1", "superSaverSellingPrice": 6450, "imageUrl": "https://img/milk.jpg", "quantity": "1 l", "outOfStock": false},
                {"name": "Curd 400g", "productId": "p2", "superSaverSellingPrice": 3000, "outOfStock": true}
            ]}
        ]}});
        let listings = parse_listings(&root);
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].name, "Amul Milk 1L");
        assert_eq!(listings[0].price_minor, Some(64));
        assert_eq!(listings[0].product_url, "https://www.zeptonow.com/pn/p1");
    }
}
