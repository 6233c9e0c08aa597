//! Matching & ranking engine (§4.6).
//!
//! Groups listings from every platform handler into candidate real-world
//! products, scores each group against the search query, and returns the
//! top [`ranking::MAX_GROUPS`] ranked by closeness to the query and store
//! coverage. Name similarity is computed via batched embeddings when the
//! [`EmbeddingClient`] is reachable, falling back to a lexical score
//! (§4.6 "Fallback when embeddings are unavailable") otherwise.

mod grouping;
mod lexical;
mod ranking;

pub use grouping::{PRICE_TOLERANCE, QUANTITY_TOLERANCE};
pub use lexical::lexical_similarity;
pub use ranking::MAX_GROUPS;

use std::collections::HashMap;

use pricely_core::quantity::parse_quantity;
use pricely_core::{Offer, ParsedQuantity, ProductGroup, ProductListing};
use pricely_embeddings::{cosine_similarity, EmbeddingClient};

/// Name-similarity threshold when embeddings are available.
pub const EMBEDDING_NAME_THRESHOLD: f64 = 0.90;
/// Name-similarity threshold for the lexical fallback path.
pub const LEXICAL_NAME_THRESHOLD: f64 = 0.80;

/// Group `listings` for `query`, rank them, and return at most
/// [`MAX_GROUPS`]. Never fails: an embedding-client error degrades to the
/// lexical fallback rather than aborting the comparison.
pub async fn match_and_rank(
    listings: Vec<ProductListing>,
    query: &str,
    embeddings: &EmbeddingClient,
) -> Vec<ProductGroup> {
    if listings.is_empty() {
        return Vec::new();
    }

    let quantities: Vec<Option<ParsedQuantity>> =
        listings.iter().map(|listing| parse_quantity(&listing.raw_quantity)).collect();

    match embed_query_and_names(embeddings, query, &listings).await {
        Ok((query_vector, name_vectors)) => {
            let name_sim = |i: usize, j: usize| match (&name_vectors[i], &name_vectors[j]) {
                (Some(a), Some(b)) => cosine_similarity(a, b),
                _ => 0.0,
            };
            let groups = grouping::group_indices(&listings, &quantities, name_sim, EMBEDDING_NAME_THRESHOLD);
            let scored = groups
                .into_iter()
                .map(|indices| {
                    let query_similarity = match name_vectors[indices[0]].as_deref() {
                        Some(representative_vector) => cosine_similarity(&query_vector, representative_vector),
                        None => 0.0,
                    };
                    build_group(&listings, &indices, &quantities, query_similarity)
                })
                .collect();
            ranking::rank_and_truncate(scored)
        }
        Err(error) => {
            tracing::warn!(error = %error, "embedding client unavailable, falling back to lexical matching");
            let name_sim = |i: usize, j: usize| lexical_similarity(&listings[i].name, &listings[j].name);
            let groups = grouping::group_indices(&listings, &quantities, name_sim, LEXICAL_NAME_THRESHOLD);
            let scored = groups
                .into_iter()
                .map(|indices| build_group(&listings, &indices, &quantities, 0.0))
                .collect();
            ranking::rank_and_truncate(scored)
        }
    }
}

/// Embed the query plus every listing name in a single batch request,
/// deduplicating identical names so a repeated listing costs one embedding
/// call rather than one per occurrence.
async fn embed_query_and_names(
    embeddings: &EmbeddingClient,
    query: &str,
    listings: &[ProductListing],
) -> Result<(Vec<f32>, Vec<Option<Vec<f32>>>), pricely_embeddings::EmbeddingClientError> {
    let mut unique_names: Vec<&str> = Vec::new();
    let mut seen_at: HashMap<String, usize> = HashMap::new();
    let mut per_listing_unique_index = Vec::with_capacity(listings.len());

    for listing in listings {
        let key = listing.name.trim().to_lowercase();
        let index = *seen_at.entry(key).or_insert_with(|| {
            unique_names.push(listing.name.as_str());
            unique_names.len() - 1
        });
        per_listing_unique_index.push(index);
    }

    let mut texts: Vec<&str> = Vec::with_capacity(unique_names.len() + 1);
    texts.push(query);
    texts.extend(unique_names.iter().copied());

    let mut vectors = embeddings.embed_many(&texts).await?;
    let name_vectors_unique = vectors.split_off(1);
    let query_vector = vectors.into_iter().next().flatten().unwrap_or_default();

    let per_listing_vectors = per_listing_unique_index
        .into_iter()
        .map(|index| name_vectors_unique.get(index).cloned().flatten())
        .collect();

    Ok((query_vector, per_listing_vectors))
}

fn build_group(
    listings: &[ProductListing],
    indices: &[usize],
    quantities: &[Option<ParsedQuantity>],
    query_similarity: f64,
) -> ProductGroup {
    let representative = &listings[indices[0]];
    let offers: Vec<Offer> = indices
        .iter()
        .map(|&i| Offer {
            store: listings[i].platform,
            price: listings[i].price_minor,
            quantity: listings[i].raw_quantity.clone(),
            url: listings[i].product_url.clone(),
        })
        .collect();

    let min_price = offers.iter().filter_map(|offer| offer.price).min();
    let min_quantity_value = indices
        .iter()
        .filter_map(|&i| quantities[i])
        .map(|q| q.value)
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |m| m.min(v))));

    ProductGroup {
        representative_name: representative.name.clone(),
        representative_image: representative.image_url.clone(),
        store_count: offers.len(),
        offers,
        min_price,
        min_quantity_value,
        query_similarity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricely_core::Platform;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn listing(platform: Platform, name: &str, price: i64, quantity: &str) -> ProductListing {
        ProductListing {
            platform,
            name: name.to_string(),
            price_minor: Some(price),
            image_url: String::new(),
            product_url: format!("https://example.test/{name}"),
            raw_quantity: quantity.to_string(),
        }
    }

    fn embedding_for(text: &str) -> Vec<f32> {
        if text.to_lowercase().contains("atta") {
            vec![1.0, 0.0]
        } else if text.to_lowercase().contains("salt") {
            vec![0.0, 1.0]
        } else {
            vec![0.5, 0.5]
        }
    }

    #[tokio::test]
    async fn identical_sku_across_stores_groups_and_ranks_first() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(move |request: &wiremock::Request| {
                let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
                let inputs: Vec<String> =
                    body["input"].as_array().unwrap().iter().map(|v| v.as_str().unwrap().to_string()).collect();
                let data: Vec<serde_json::Value> = inputs
                    .iter()
                    .enumerate()
                    .map(|(i, text)| serde_json::json!({"embedding": embedding_for(text), "index": i}))
                    .collect();
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": data}))
            })
            .mount(&server)
            .await;

        let client = EmbeddingClient::with_endpoint(
            format!("{}/v1/embeddings", server.uri()),
            "test-model",
            "test-key",
        );

        let listings = vec![
            listing(Platform::Bigbasket, "Aashirvaad Atta 5kg", 250, "5 kg"),
            listing(Platform::Blinkit, "Aashirvaad Atta 5kg", 255, "5 kg"),
            listing(Platform::Zepto, "Tata Salt 1kg", 28, "1 kg"),
        ];

        let groups = match_and_rank(listings, "atta", &client).await;
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].store_count, 2);
        assert!(groups[0].query_similarity > groups[1].query_similarity);
    }

    #[tokio::test]
    async fn embedding_failure_falls_back_to_lexical_matching() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = EmbeddingClient::with_endpoint(
            format!("{}/v1/embeddings", server.uri()),
            "test-model",
            "test-key",
        );

        let listings = vec![
            listing(Platform::Bigbasket, "Aashirvaad Atta 5kg", 250, "5 kg"),
            listing(Platform::Blinkit, "Aashirvaad Atta 5kg", 255, "5 kg"),
        ];

        let groups = match_and_rank(listings, "atta", &client).await;
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].store_count, 2);
    }

    #[tokio::test]
    async fn empty_input_returns_no_groups() {
        let client = EmbeddingClient::new("unused-key");
        let groups = match_and_rank(Vec::new(), "atta", &client).await;
        assert!(groups.is_empty());
    }
}
