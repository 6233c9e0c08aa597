use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeocoderError {
    #[error("geocoder transport error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("geocoder reported non-OK status: {reason}")]
    Remote { reason: String },
}
