use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("proxy transport error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("proxy returned non-success status {status} for {url}")]
    UpstreamStatus { status: u16, url: String },
}
