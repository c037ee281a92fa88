// SPDX-FileCopyrightText: 2026 Skippy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Skippy memory core.

use thiserror::Error;

/// The primary error type used across the memory core and its adapters.
#[derive(Debug, Error)]
pub enum SkippyError {
    /// The embedding gateway failed or returned an unusable vector.
    ///
    /// Transient: callers may retry with backoff. A fact is never stored
    /// without a valid embedding.
    #[error("embedding unavailable: {message}")]
    EmbeddingUnavailable {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The persistent store could not complete the operation.
    ///
    /// Transient. The operation either committed fully or not at all.
    #[error("store unavailable: {source}")]
    StoreUnavailable {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A person merge was rejected (self-merge, already absorbed, owner mismatch).
    #[error("merge conflict: {reason}")]
    MergeConflict { reason: String },

    /// A referenced fact or person does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Caller supplied an argument that violates a data-model invariant.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Configuration errors (invalid TOML, out-of-range thresholds).
    #[error("configuration error: {0}")]
    Config(String),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SkippyError {
    /// Shorthand for an [`SkippyError::EmbeddingUnavailable`] without a source.
    pub fn embedding(message: impl Into<String>) -> Self {
        SkippyError::EmbeddingUnavailable {
            message: message.into(),
            source: None,
        }
    }

    /// Whether retrying the same call later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SkippyError::EmbeddingUnavailable { .. }
                | SkippyError::StoreUnavailable { .. }
                | SkippyError::Timeout { .. }
        )
    }
}
