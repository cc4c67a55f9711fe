//! Embedding providers and the bounded-retry requester.
//!
//! [`EmbeddingProvider`] is the seam to the external inference service: one
//! text in, one fixed-dimension vector out. [`EmbeddingRequester`] wraps a
//! provider with the pipeline's only internal retry loop; every other
//! recovery path belongs to the external execution engine.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::types::IngestError;

/// Total attempts made by [`EmbeddingRequester::embed`] before giving up.
pub const DEFAULT_MAX_ATTEMPTS: usize = 3;

const COHERE_EMBED_URL: &str = "https://api.cohere.com/v2/embed";
const COHERE_INPUT_TYPE: &str = "search_document";

/// A single failed embedding call, before retry classification.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct ProviderError(pub String);

/// External embedding inference service: one text, one vector.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Short identifier used in logs.
    fn id(&self) -> &str;

    /// Computes one fixed-dimension vector for `text`.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError>;
}

// ── Cohere provider ────────────────────────────────────────────────────

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    texts: Vec<&'a str>,
    input_type: &'a str,
    embedding_types: Vec<&'a str>,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: EmbedVectors,
}

#[derive(Deserialize)]
struct EmbedVectors {
    float: Vec<Vec<f32>>,
}

/// Embedding client for the Cohere `/v2/embed` endpoint.
///
/// The API credential comes from configuration (read from the process
/// environment at startup) and is sent as a bearer header; the model
/// identifier is fixed per client.
pub struct CohereEmbedder {
    client: Client,
    endpoint: String,
    model: String,
}

impl CohereEmbedder {
    pub fn new(api_key: &str, model: impl Into<String>) -> Result<Self, IngestError> {
        let key = api_key.trim();
        if key.is_empty() {
            return Err(IngestError::Config("missing Cohere API key".into()));
        }

        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {key}"))
            .map_err(|_| IngestError::Config("Cohere API key is not a valid header value".into()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .use_rustls_tls()
            .build()
            .map_err(|err| IngestError::Config(format!("failed to build embedding client: {err}")))?;

        Ok(Self {
            client,
            endpoint: COHERE_EMBED_URL.to_string(),
            model: model.into(),
        })
    }

    /// Overrides the endpoint, for tests against a local mock server.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl EmbeddingProvider for CohereEmbedder {
    fn id(&self) -> &str {
        "cohere"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let request = EmbedRequest {
            model: &self.model,
            texts: vec![text],
            input_type: COHERE_INPUT_TYPE,
            embedding_types: vec!["float"],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|err| ProviderError(err.to_string()))?
            .error_for_status()
            .map_err(|err| ProviderError(err.to_string()))?;

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|err| ProviderError(format!("malformed embed response: {err}")))?;

        let vector = parsed
            .embeddings
            .float
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError("embed response contained no vectors".into()))?;
        if vector.is_empty() {
            return Err(ProviderError("embed response vector has zero dimensions".into()));
        }
        Ok(vector)
    }
}

// ── Mock provider ──────────────────────────────────────────────────────

/// Deterministic offline provider: hashes the input text into a
/// fixed-dimension vector. Identical text always produces an identical
/// vector, which makes pipeline tests and replay checks reproducible.
#[derive(Debug, Clone)]
pub struct MockEmbeddingProvider {
    dimensions: usize,
}

impl MockEmbeddingProvider {
    pub fn new() -> Self {
        Self { dimensions: 8 }
    }

    #[must_use]
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = dimensions;
        self
    }
}

impl Default for MockEmbeddingProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    fn id(&self) -> &str {
        "mock"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        use std::hash::{DefaultHasher, Hash, Hasher};

        let mut vector = Vec::with_capacity(self.dimensions);
        for lane in 0..self.dimensions {
            let mut hasher = DefaultHasher::new();
            (text, lane).hash(&mut hasher);
            vector.push((hasher.finish() % 10_000) as f32 / 10_000.0);
        }
        Ok(vector)
    }
}

// ── Retry wrapper ──────────────────────────────────────────────────────

/// Injectable delay, so unit tests can record backoffs instead of sleeping.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Default sleeper backed by the tokio timer.
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Wraps a provider with the bounded retry/backoff loop.
pub struct EmbeddingRequester {
    provider: Arc<dyn EmbeddingProvider>,
    sleeper: Arc<dyn Sleeper>,
    max_attempts: usize,
}

impl EmbeddingRequester {
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            provider,
            sleeper: Arc::new(TokioSleeper),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        debug_assert!(max_attempts >= 1, "at least one attempt is required");
        self.max_attempts = max_attempts;
        self
    }

    /// Computes one embedding, retrying failed attempts with backoff.
    ///
    /// A failed attempt `k` (zero-based) that is not the last is followed by
    /// a wait of `2^k + jitter` seconds, jitter uniform in `[0, 1)`: one
    /// second and change before the second attempt, two and change before
    /// the third. Non-final failures are logged at warn level and discarded.
    /// When every attempt has failed the last provider error surfaces as
    /// [`IngestError::EmbeddingFailed`].
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, IngestError> {
        let mut last_error: Option<ProviderError> = None;

        for attempt in 0..self.max_attempts {
            if attempt > 0 {
                let backoff = Duration::from_secs_f64(
                    f64::from(1u32 << (attempt - 1)) + rand::random::<f64>(),
                );
                self.sleeper.sleep(backoff).await;
            }

            match self.provider.embed(text).await {
                Ok(vector) => {
                    debug!(
                        provider = self.provider.id(),
                        dimensions = vector.len(),
                        "generated embedding"
                    );
                    return Ok(vector);
                }
                Err(err) => {
                    warn!(
                        provider = self.provider.id(),
                        attempt = attempt + 1,
                        max_attempts = self.max_attempts,
                        error = %err,
                        "embedding attempt failed"
                    );
                    last_error = Some(err);
                }
            }
        }

        Err(IngestError::EmbeddingFailed {
            attempts: self.max_attempts,
            reason: last_error
                .map(|err| err.to_string())
                .unwrap_or_else(|| "no attempts were made".into()),
        })
    }
}
