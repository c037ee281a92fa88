// SPDX-FileCopyrightText: 2026 Skippy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic embedding adapter for tests.
//!
//! `MockEmbedder` hashes lowercase word tokens into a fixed number of
//! buckets and L2-normalizes the counts, so texts sharing words are similar
//! and texts sharing none are (almost always) orthogonal. Exact texts can be
//! pinned to hand-made vectors, and failures can be injected.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use skippy_core::{
    AdapterType, EmbeddingAdapter, EmbeddingInput, EmbeddingOutput, HealthStatus, PluginAdapter,
    SkippyError,
};

fn fnv1a(token: &str) -> u64 {
    token.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, b| {
        (hash ^ u64::from(b)).wrapping_mul(0x0000_0100_0000_01b3)
    })
}

/// Hashed, normalized bag-of-words vector. All zeros when `text` has no words.
pub fn bag_of_words(text: &str, dimensions: usize) -> Vec<f32> {
    let mut vector = vec![0.0f32; dimensions];
    if dimensions == 0 {
        return vector;
    }
    let lower = text.to_lowercase();
    for token in lower.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()) {
        let bucket = (fnv1a(token) % dimensions as u64) as usize;
        vector[bucket] += 1.0;
    }
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        vector.iter_mut().for_each(|v| *v /= norm);
    }
    vector
}

/// A mock embedding gateway.
pub struct MockEmbedder {
    dimensions: usize,
    overrides: HashMap<String, Vec<f32>>,
    failures_remaining: AtomicUsize,
    fail_always: bool,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            overrides: HashMap::new(),
            failures_remaining: AtomicUsize::new(0),
            fail_always: false,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Return `vector` whenever exactly `text` is embedded.
    pub fn with_embedding(mut self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        self.overrides.insert(text.into(), vector);
        self
    }

    /// Fail the first `n` calls with `EmbeddingUnavailable`.
    pub fn with_failures(self, n: usize) -> Self {
        self.failures_remaining.store(n, Ordering::SeqCst);
        self
    }

    /// Fail every call with `EmbeddingUnavailable`.
    pub fn unavailable(mut self) -> Self {
        self.fail_always = true;
        self
    }

    /// Sleep this long inside every call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Number of `embed` calls so far, including failed ones.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The vector this embedder produces for `text`.
    pub fn vector_for(&self, text: &str) -> Vec<f32> {
        self.overrides
            .get(text)
            .cloned()
            .unwrap_or_else(|| bag_of_words(text, self.dimensions))
    }
}

#[async_trait]
impl PluginAdapter for MockEmbedder {
    fn name(&self) -> &str {
        "mock-embedder"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Embedding
    }

    async fn health_check(&self) -> Result<HealthStatus, SkippyError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), SkippyError> {
        Ok(())
    }
}

#[async_trait]
impl EmbeddingAdapter for MockEmbedder {
    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, SkippyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let injected = self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if self.fail_always || injected {
            return Err(SkippyError::embedding("mock embedder unavailable"));
        }

        Ok(EmbeddingOutput {
            embeddings: input.texts.iter().map(|t| self.vector_for(t)).collect(),
            dimensions: self.dimensions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dot(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn bag_of_words_is_normalized_and_case_insensitive() {
        let a = bag_of_words("My dog is named Max", 256);
        let b = bag_of_words("my DOG is named max!", 256);
        assert_eq!(a, b);
        assert!((dot(&a, &a) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn no_words_gives_zero_vector() {
        assert!(bag_of_words("?!", 16).iter().all(|v| *v == 0.0));
        assert!(bag_of_words("anything", 0).is_empty());
    }

    #[tokio::test]
    async fn overrides_take_precedence() {
        let embedder = MockEmbedder::new(3).with_embedding("pinned", vec![0.0, 1.0, 0.0]);
        let output = embedder
            .embed(EmbeddingInput {
                texts: vec!["pinned".into()],
            })
            .await
            .unwrap();
        assert_eq!(output.embeddings[0], vec![0.0, 1.0, 0.0]);
    }

    #[tokio::test]
    async fn injected_failures_run_out() {
        let embedder = MockEmbedder::new(8).with_failures(2);
        let input = || EmbeddingInput {
            texts: vec!["hello".into()],
        };
        assert!(embedder.embed(input()).await.is_err());
        assert!(embedder.embed(input()).await.is_err());
        assert!(embedder.embed(input()).await.is_ok());
        assert_eq!(embedder.calls(), 3);
    }

    #[tokio::test]
    async fn unavailable_always_fails() {
        let embedder = MockEmbedder::new(8).unavailable();
        let err = embedder
            .embed(EmbeddingInput {
                texts: vec!["hello".into()],
            })
            .await
            .unwrap_err();
        assert!(matches!(err, SkippyError::EmbeddingUnavailable { .. }));
    }
}
