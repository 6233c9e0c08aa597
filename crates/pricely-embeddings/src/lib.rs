pub mod client;
pub mod error;

pub use client::{cosine_similarity, EmbeddingClient};
pub use error::EmbeddingClientError;
