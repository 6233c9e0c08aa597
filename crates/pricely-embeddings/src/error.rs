use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbeddingClientError {
    #[error("embedding transport error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("embedding API reported an error: {reason}")]
    Remote { reason: String },

    #[error("embedding API returned {got} vectors for {expected} inputs with no index tags")]
    ShapeMismatch { expected: usize, got: usize },
}
