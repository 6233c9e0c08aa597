//! DMart handler.

use std::collections::HashMap;

use serde_json::Value;

use pricely_core::{LocationDescriptor, Platform, PlatformCredential, ProductListing};
use pricely_proxy::{ProxyClient, ProxyMethod};

use crate::error::PlatformError;
use crate::retry::{fresh_session_id, run_with_retry, step_with_retries};

const BASE_URL: &str = "https://www.dmart.in";
const STEP_ATTEMPTS: u32 = 3;
const STORE_ID: &str = "10680";

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

    let result = run_with_retry(Platform::Dmart, max_attempts, |attempt_no| {
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
            let PlatformCredential::Dmart { place_id, .. } = &cred else {
                return Err(PlatformError::Parse {
                    reason: "search called with non-Dmart credential".to_string(),
                });
            };
            let place_id = place_id.clone();
            try_search(proxy, &query, place_id).await
        })
    })
    .await;

    match result {
        Ok((listings, cred)) => (listings, Some(cred)),
        Err(PlatformError::NonServiceable) => (
            Vec::new(),
            Some(PlatformCredential::Dmart {
                place_id: location.place_id.clone(),
                serviceable: false,
            }),
        ),
        Err(err) => {
            tracing::error!(platform = "Dmart", error = %err, "search exhausted all attempts");
            (Vec::new(), credential)
        }
    }
}

async fn acquire_credentials(
    proxy: &ProxyClient,
    location: &LocationDescriptor,
) -> Result<PlatformCredential, PlatformError> {
    let body = serde_json::json!({ "uniqueId": location.place_id }).to_string();

    let response = step_with_retries(Platform::Dmart, "pincode_details", STEP_ATTEMPTS, || async {
        let session = fresh_session_id();
        proxy
            .request(
                ProxyMethod::Post,
                &format!("{BASE_URL}/api/v2/pincodes/details"),
                &HashMap::new(),
                Some(&body),
                Some(&session),
            )
            .await
            .map_err(PlatformError::from)
    })
    .await?;

    let parsed: Value = serde_json::from_str(&response.body).map_err(|e| PlatformError::CredentialAcquisition {
        platform: Platform::Dmart,
        step: "pincode_details".to_string(),
        reason: e.to_string(),
    })?;

    let serviceable = parsed.get("isPincodeServiceable").and_then(Value::as_str) == Some("true");

    Ok(PlatformCredential::Dmart {
        place_id: location.place_id.clone(),
        serviceable,
    })
}

async fn try_search(
    proxy: &ProxyClient,
    query: &str,
    place_id: String,
) -> Result<(Vec<ProductListing>, PlatformCredential), PlatformError> {
    let encoded_query = percent_encoding::utf8_percent_encode(query, percent_encoding::NON_ALPHANUMERIC);
    let url = format!(
        "{BASE_URL}/api/v3/search/{encoded_query}?page=1&size=100&channel=web&storeId={STORE_ID}"
    );

    let session = fresh_session_id();
    let response = proxy
        .request(ProxyMethod::Get, &url, &HashMap::new(), None, Some(&session))
        .await?;
    if response.status >= 400 {
        return Err(PlatformError::UpstreamStatus { code: response.status });
    }

    let parsed: Value =
        serde_json::from_str(&response.body).map_err(|e| PlatformError::Parse { reason: e.to_string() })?;
    let listings = parse_listings(&parsed);

    Ok((
        listings,
        PlatformCredential::Dmart {
            place_id,
            serviceable: true,
        },
    ))
}

fn parse_listings(root: &Value) -> Vec<ProductListing> {
    let Some(products) = root.get("products").and_then(Value::as_array) else {
        return Vec::new();
    };

    products.iter().filter_map(parse_one_product).collect()
}

fn parse_one_product(product: &Value) -> Option<ProductListing> {
    let sku = product.pointer("/sKUs/0")?;

    let name = sku.get("displayName").and_then(Value::as_str)?;
    let price_raw = sku
        .get("offerPrice")
        .map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .unwrap_or_default();
    let image_key = sku.get("productImageKey").and_then(Value::as_str).unwrap_or_default();
    let img_code = sku.get("imgCode").and_then(Value::as_str).unwrap_or_default();
    let seo_token = sku.get("seo_token_ntk").and_then(Value::as_str).unwrap_or_default();
    let weight = sku.get("weightDisplayVal").and_then(Value::as_str).unwrap_or_default();

    Some(ProductListing {
        platform: Platform::Dmart,
        name: name.to_string(),
        price_minor: pricely_core::quantity::parse_price_minor(&price_raw),
        image_url: format!("{image_key}{img_code}"),
        product_url: format!("{BASE_URL}/product/{seo_token}"),
        raw_quantity: weight.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_listings_reads_first_sku_per_product() {
        let root = serde_json::json!({"products": [
            {"sKUs": [{
                "displayName": "Tata Salt 1 kg",
                "offerPrice": "28",
                "productImageKey": "https://cdn/img/",
                "imgCode": "tata-salt.jpg",
                "seo_token_ntk": "tata-salt-1kg",
                "weightDisplayVal": "1 kg"
            }]}
        ]});
        let listings = parse_listings(&root);
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].name, "Tata Salt 1 kg");
        assert_eq!(listings[0].price_minor, Some(28));
        assert_eq!(listings[0].image_url, "https://cdn/img/tata-salt.jpg");
        assert_eq!(listings[0].product_url, "https://www.dmart.in/product/tata-salt-1kg");
    }

    #[test]
    fn parse_listings_skips_products_with_no_skus() {
        let root = serde_json::json!({"products": [{"sKUs": []}]});
        assert!(parse_listings(&root).is_empty());
    }
}
