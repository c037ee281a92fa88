// SPDX-FileCopyrightText: 2026 Skippy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP embedding gateway for OpenAI-compatible `/embeddings` endpoints.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use skippy_config::model::EmbeddingConfig;
use skippy_core::{
    AdapterType, EmbeddingAdapter, EmbeddingInput, EmbeddingOutput, HealthStatus, PluginAdapter,
    SkippyError,
};

/// Environment variable consulted when `embedding.api_key` is unset.
pub const API_KEY_ENV: &str = "SKIPPY_EMBEDDING_API_KEY";

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

/// Embedding adapter backed by a remote embeddings API.
#[derive(Debug, Clone)]
pub struct HttpEmbedder {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    dimensions: usize,
}

impl HttpEmbedder {
    /// Build a client from config. `dimensions` is the vector size every
    /// response must have.
    pub fn new(config: &EmbeddingConfig, dimensions: usize) -> Result<Self, SkippyError> {
        let api_key = resolve_api_key(&config.api_key)?;

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {api_key}"))
                .map_err(|e| SkippyError::Config(format!("invalid API key header value: {e}")))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SkippyError::EmbeddingUnavailable {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", config.api_base.trim_end_matches('/')),
            model: config.model.clone(),
            dimensions,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn request(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, SkippyError> {
        let body = EmbeddingRequest {
            model: &self.model,
            input: texts,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| SkippyError::EmbeddingUnavailable {
                message: if e.is_timeout() {
                    "embedding request timed out".to_string()
                } else {
                    format!("embedding request failed: {e}")
                },
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "embedding API returned an error");
            return Err(SkippyError::embedding(format!(
                "API returned {status}: {body}"
            )));
        }

        let parsed: EmbeddingResponse =
            response
                .json()
                .await
                .map_err(|e| SkippyError::EmbeddingUnavailable {
                    message: format!("failed to parse embedding response: {e}"),
                    source: Some(Box::new(e)),
                })?;

        let mut data = parsed.data;
        if data.len() != texts.len() {
            return Err(SkippyError::embedding(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                data.len()
            )));
        }
        data.sort_by_key(|d| d.index);

        data.into_iter()
            .map(|d| {
                if d.embedding.len() == self.dimensions {
                    Ok(d.embedding)
                } else {
                    Err(SkippyError::embedding(format!(
                        "expected {}-dimensional embedding, got {}",
                        self.dimensions,
                        d.embedding.len()
                    )))
                }
            })
            .collect()
    }
}

#[async_trait]
impl PluginAdapter for HttpEmbedder {
    fn name(&self) -> &str {
        "http-embedder"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Embedding
    }

    async fn health_check(&self) -> Result<HealthStatus, SkippyError> {
        // Probing the API would be billed, so only the client is checked.
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), SkippyError> {
        debug!("HTTP embedder shutting down");
        Ok(())
    }
}

#[async_trait]
impl EmbeddingAdapter for HttpEmbedder {
    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, SkippyError> {
        if input.texts.is_empty() {
            return Ok(EmbeddingOutput {
                embeddings: Vec::new(),
                dimensions: self.dimensions,
            });
        }
        let embeddings = self.request(&input.texts).await?;
        debug!(count = embeddings.len(), model = %self.model, "embeddings generated");
        Ok(EmbeddingOutput {
            embeddings,
            dimensions: self.dimensions,
        })
    }
}

/// Resolves the API key from config or environment.
pub fn resolve_api_key(config_key: &Option<String>) -> Result<String, SkippyError> {
    if let Some(key) = config_key
        && !key.is_empty()
    {
        return Ok(key.clone());
    }

    std::env::var(API_KEY_ENV).map_err(|_| {
        SkippyError::Config(format!(
            "embedding API key not found. Set embedding.api_key in config or {API_KEY_ENV}."
        ))
    })
}
