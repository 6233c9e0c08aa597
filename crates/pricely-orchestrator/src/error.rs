use thiserror::Error;

/// Unifies every engine-level error reachable from [`crate::compare`] into
/// one vocabulary. `ContentError` is deliberately not a
/// variant here: `pricely-content` does not depend on this crate, so a
/// `#[from]` conversion for it would require a dependency cycle. The HTTP
/// layer's own error type wraps both `EngineError` and `ContentError`
/// instead, since it is the one crate that already depends on both.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("geocoding failed: {0}")]
    Geocode(#[from] pricely_geocoder::GeocoderError),

    #[error("embedding request failed: {0}")]
    Embedding(#[from] pricely_embeddings::EmbeddingClientError),
}
