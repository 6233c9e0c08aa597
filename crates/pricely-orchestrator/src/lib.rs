//! Orchestrator (§4.5): reverse-geocodes, fans out to the five platform
//! handlers under a shared deadline, and hands the merged listings to the
//! matching engine.

pub mod error;

pub use error::EngineError;

use std::time::Duration;

use pricely_core::{CredentialBundle, LocationDescriptor, Platform, ProductListing, SearchResult};
use pricely_embeddings::EmbeddingClient;
use pricely_geocoder::GeocoderClient;
use pricely_proxy::ProxyClient;

const DEFAULT_DEADLINE_SECS: u64 = 45;
const DEFAULT_PLATFORM_MAX_ATTEMPTS: u32 = 3;

pub struct Orchestrator {
    proxy: ProxyClient,
    geocoder: GeocoderClient,
    embeddings: EmbeddingClient,
    deadline: Duration,
    platform_max_attempts: u32,
}

impl Orchestrator {
    #[must_use]
    pub fn new(proxy: ProxyClient, geocoder: GeocoderClient, embeddings: EmbeddingClient) -> Self {
        Self {
            proxy,
            geocoder,
            embeddings,
            deadline: Duration::from_secs(DEFAULT_DEADLINE_SECS),
            platform_max_attempts: DEFAULT_PLATFORM_MAX_ATTEMPTS,
        }
    }

    #[must_use]
    pub fn with_settings(
        proxy: ProxyClient,
        geocoder: GeocoderClient,
        embeddings: EmbeddingClient,
        deadline: Duration,
        platform_max_attempts: u32,
    ) -> Self {
        Self {
            proxy,
            geocoder,
            embeddings,
            deadline,
            platform_max_attempts,
        }
    }

    /// Reverse-geocode `(lat, lon)` and run [`Self::compare`]. Geocode
    /// failure is fatal for the whole call (§4.5 step 1).
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Geocode`] when the reverse-geocode call fails.
    pub async fn compare_from_coords(
        &self,
        query: &str,
        lat: f64,
        lon: f64,
        credentials: CredentialBundle,
    ) -> Result<SearchResult, EngineError> {
        let location = self.geocoder.reverse(lat, lon).await?;
        Ok(self.compare(query, &location, credentials).await)
    }

    /// Fan out to all five platform handlers under the shared deadline,
    /// merge the results, and rank them. Platform failures (including the
    /// deadline firing) never fail the call: they simply contribute no
    /// listings and retain whatever credential was already on file.
    pub async fn compare(
        &self,
        query: &str,
        location: &LocationDescriptor,
        credentials: CredentialBundle,
    ) -> SearchResult {
        let mut refreshed = credentials.clone();
        let deadline = tokio::time::Instant::now() + self.deadline;
        let mut join_handles = Vec::with_capacity(Platform::ALL.len());

        for platform in Platform::ALL {
            let proxy = self.proxy.clone();
            let query = query.to_string();
            let location = location.clone();
            let credential = credentials.get(&platform).cloned();
            let max_attempts = self.platform_max_attempts;

            let handle = tokio::spawn(async move {
                pricely_platforms::search(platform, &proxy, &query, &location, credential, max_attempts).await
            });
            join_handles.push((platform, handle));
        }

        // Race every handle against the same deadline independently, rather
        // than the whole join_all, so platforms that finish before the
        // deadline still contribute even when a sibling times out (§5:
        // "the partial aggregate is still returned").
        let results = futures::future::join_all(join_handles.into_iter().map(|(platform, handle)| {
            let abort_handle = handle.abort_handle();
            async move {
                match tokio::time::timeout_at(deadline, handle).await {
                    Ok(joined) => (platform, joined.ok()),
                    Err(_) => {
                        abort_handle.abort();
                        (platform, None)
                    }
                }
            }
        }))
        .await;

        let mut listings: Vec<ProductListing> = Vec::new();

        for (platform, result) in results {
            match result {
                Some((platform_listings, credential)) => {
                    tracing::info!(
                        platform = platform.as_str(),
                        listing_count = platform_listings.len(),
                        "platform handler completed"
                    );
                    listings.extend(platform_listings);
                    if let Some(credential) = credential {
                        refreshed.insert(platform, credential);
                    }
                }
                None => {
                    tracing::warn!(
                        platform = platform.as_str(),
                        "platform task did not complete before the deadline"
                    );
                }
            }
        }

        let groups = pricely_matching::match_and_rank(listings, query, &self.embeddings).await;

        SearchResult {
            groups,
            credentials: refreshed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration as StdDuration;
    use wiremock::matchers::any;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn location() -> LocationDescriptor {
        LocationDescriptor {
            lat: 12.9,
            lon: 77.6,
            formatted_address: "Bengaluru".to_string(),
            postal_code: "560001".to_string(),
            place_id: "place-1".to_string(),
        }
    }

    fn orchestrator(proxy_uri: &str, deadline: StdDuration) -> Orchestrator {
        let proxy = ProxyClient::new(proxy_uri, "test-key");
        let geocoder = GeocoderClient::new(vec!["unused-key".to_string()]);
        let embeddings = EmbeddingClient::new("unused-key");
        Orchestrator::with_settings(proxy, geocoder, embeddings, deadline, 1)
    }

    #[tokio::test]
    async fn all_platforms_failing_yields_empty_groups_and_retained_credentials() {
        let server = MockServer::start().await;
        Mock::given(any()).respond_with(ResponseTemplate::new(500)).mount(&server).await;

        let orchestrator = orchestrator(&server.uri(), StdDuration::from_secs(5));
        let result = orchestrator.compare("atta", &location(), HashMap::new()).await;

        assert!(result.groups.is_empty());
    }

    #[tokio::test]
    async fn deadline_firing_cancels_outstanding_tasks_without_erroring() {
        let server = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(200).set_delay(StdDuration::from_millis(500)))
            .mount(&server)
            .await;

        let orchestrator = orchestrator(&server.uri(), StdDuration::from_millis(10));
        let credentials = HashMap::new();
        let result = orchestrator.compare("atta", &location(), credentials).await;

        assert!(result.groups.is_empty());
        assert!(result.credentials.is_empty());
    }
}
