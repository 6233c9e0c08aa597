//! Embedding client.
//!
//! Issues a single batch request against an index-tagged embeddings API
//! and returns vectors in the same order as the input texts.

use serde::{Deserialize, Serialize};

use crate::error::EmbeddingClientError;

const DEFAULT_EMBED_URL: &str = "https://api.openai.com/v1/embeddings";
const DEFAULT_MODEL: &str = "text-embedding-3-small";

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct EmbedResponse {
    #[serde(default)]
    data: Vec<EmbedDatum>,
    #[serde(default)]
    error: Option<EmbedError>,
}

#[derive(Deserialize)]
struct EmbedDatum {
    embedding: Vec<f32>,
    #[serde(default)]
    index: Option<usize>,
}

#[derive(Deserialize)]
struct EmbedError {
    message: String,
}

pub struct EmbeddingClient {
    http: reqwest::Client,
    url: String,
    model: String,
    api_key: String,
}

impl EmbeddingClient {
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_endpoint(DEFAULT_EMBED_URL, DEFAULT_MODEL, api_key)
    }

    #[must_use]
    pub fn with_endpoint(
        url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
            model: model.into(),
            api_key: api_key.into(),
        }
    }

    /// Embed a single string ( `embed_one`).
    ///
    /// # Errors
    ///
    /// Returns [`EmbeddingClientError`] on transport failure, a remote error
    /// payload, or a malformed batch response.
    pub async fn embed_one(&self, text: &str) -> Result<Vec<f32>, EmbeddingClientError> {
        let mut vectors = self.embed_many(&[text]).await?;
        Ok(vectors.remove(0).unwrap_or_default())
    }

    /// Embed a batch of strings in a single request ( `embed_many`).
    ///
    /// Batching preserves input order. When the backend tags each result
    /// with its input `index`, that index takes precedence over positional
    /// order; a missing tag falls back to position. A listing whose vector
    /// the backend omitted entirely comes back as `None`, matching §4.6's
    /// "mark missing" when the backend returns fewer vectors than inputs.
    ///
    /// # Errors
    ///
    /// Returns [`EmbeddingClientError::Network`] on transport failure,
    /// [`EmbeddingClientError::Remote`] when the API reports an error
    /// payload, and [`EmbeddingClientError::ShapeMismatch`] when the
    /// response carries no index tags and its length disagrees with the
    /// input length (so positional mapping would be unsafe).
    pub async fn embed_many(
        &self,
        texts: &[&str],
    ) -> Result<Vec<Option<Vec<f32>>>, EmbeddingClientError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbedRequest {
            model: &self.model,
            input: texts,
        };

        let response = self
            .http
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?
            .json::<EmbedResponse>()
            .await?;

        if let Some(error) = response.error {
            return Err(EmbeddingClientError::Remote {
                reason: error.message,
            });
        }

        let tagged = !response.data.is_empty() && response.data.iter().all(|d| d.index.is_some());

        if tagged {
            let mut out: Vec<Option<Vec<f32>>> = vec![None; texts.len()];
            for datum in response.data {
                if let Some(index) = datum.index {
                    if index < out.len() {
                        out[index] = Some(datum.embedding);
                    }
                }
            }
            return Ok(out);
        }

        if response.data.len() != texts.len() {
            return Err(EmbeddingClientError::ShapeMismatch {
                expected: texts.len(),
                got: response.data.len(),
            });
        }

        Ok(response.data.into_iter().map(|d| Some(d.embedding)).collect())
    }
}

/// Cosine similarity with explicit norms: zero if either norm is
/// zero.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let len = a.len().min(b.len());
    let mut dot = 0.0_f64;
    let mut norm_a = 0.0_f64;
    let mut norm_b = 0.0_f64;
    for i in 0..len {
        let (av, bv) = (f64::from(a[i]), f64::from(b[i]));
        dot += av * bv;
        norm_a += av * av;
        norm_b += bv * bv;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn cosine_similarity_of_identical_vectors_is_one() {
        let v = vec![1.0_f32, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn cosine_similarity_with_zero_vector_is_zero() {
        let zero = vec![0.0_f32, 0.0, 0.0];
        let other = vec![1.0_f32, 2.0, 3.0];
        assert_eq!(cosine_similarity(&zero, &other), 0.0);
    }

    #[test]
    fn cosine_similarity_of_orthogonal_vectors_is_zero() {
        let a = vec![1.0_f32, 0.0];
        let b = vec![0.0_f32, 1.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-9);
    }

    #[tokio::test]
    async fn embed_many_preserves_order_via_index_tags() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [
                    {"embedding": [0.0, 1.0], "index": 1},
                    {"embedding": [1.0, 0.0], "index": 0}
                ]
            })))
            .mount(&server)
            .await;

        let client = EmbeddingClient::with_endpoint(server.uri(), "test-model", "key");
        let result = client.embed_many(&["first", "second"]).await.unwrap();
        assert_eq!(result[0], Some(vec![1.0, 0.0]));
        assert_eq!(result[1], Some(vec![0.0, 1.0]));
    }

    #[tokio::test]
    async fn embed_many_falls_back_to_positional_order_without_tags() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [
                    {"embedding": [1.0, 0.0]},
                    {"embedding": [0.0, 1.0]}
                ]
            })))
            .mount(&server)
            .await;

        let client = EmbeddingClient::with_endpoint(server.uri(), "test-model", "key");
        let result = client.embed_many(&["first", "second"]).await.unwrap();
        assert_eq!(result[0], Some(vec![1.0, 0.0]));
        assert_eq!(result[1], Some(vec![0.0, 1.0]));
    }

    #[tokio::test]
    async fn embed_many_reports_shape_mismatch_without_tags_or_matching_length() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{"embedding": [1.0, 0.0]}]
            })))
            .mount(&server)
            .await;

        let client = EmbeddingClient::with_endpoint(server.uri(), "test-model", "key");
        let err = client.embed_many(&["first", "second"]).await.unwrap_err();
        assert!(matches!(
            err,
            EmbeddingClientError::ShapeMismatch {
                expected: 2,
                got: 1
            }
        ));
    }

    #[tokio::test]
    async fn embed_many_surfaces_remote_error_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "error": {"message": "rate limited"}
            })))
            .mount(&server)
            .await;

        let client = EmbeddingClient::with_endpoint(server.uri(), "test-model", "key");
        let err = client.embed_many(&["first"]).await.unwrap_err();
        assert!(matches!(err, EmbeddingClientError::Remote { reason } if reason == "rate limited"));
    }

    #[tokio::test]
    async fn embed_many_with_no_inputs_returns_empty() {
        let client = EmbeddingClient::new("key");
        let result = client.embed_many(&[]).await.unwrap();
        assert!(result.is_empty());
    }
}
