// SPDX-FileCopyrightText: 2026 Skippy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Skippy semantic memory subsystem.
//!
//! This crate provides the error type, the adapter traits through which the
//! memory core consumes its external capabilities (embedding and fact
//! extraction), and the plain data types that cross crate boundaries.

pub mod error;
pub mod recording;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::SkippyError;
pub use types::{
    AdapterType, CandidateFact, ConversationTurn, EmbeddingInput, EmbeddingOutput, FactCategory,
    HealthStatus, PersonMention, TurnMessage,
};

pub use traits::{EmbeddingAdapter, FactExtractor, PluginAdapter};
