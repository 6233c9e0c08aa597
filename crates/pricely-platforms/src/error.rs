use thiserror::Error;

use pricely_core::Platform;

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("network error: {0}")]
    Network(#[from] pricely_proxy::ProxyError),

    #[error("upstream returned status {code}")]
    UpstreamStatus { code: u16 },

    #[error("failed to parse upstream response: {reason}")]
    Parse { reason: String },

    #[error("credential acquisition failed for {platform:?} at step \"{step}\": {reason}")]
    CredentialAcquisition {
        platform: Platform,
        step: String,
        reason: String,
    },

    #[error("location is not serviceable by this platform")]
    NonServiceable,
}
