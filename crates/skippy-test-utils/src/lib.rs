// SPDX-FileCopyrightText: 2026 Skippy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Skippy integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without external services.
//!
//! # Components
//!
//! - [`MockEmbedder`] - Hashed bag-of-words embeddings with pinned vectors and injected failures
//! - [`MockExtractor`] - Fact extractor with scripted answers
//! - [`TestHarness`] - Temp SQLite database with a matching configuration

pub mod harness;
pub mod mock_embedder;
pub mod mock_extractor;

pub use harness::{TEST_DIMENSIONS, TestHarness};
pub use mock_embedder::{MockEmbedder, bag_of_words};
pub use mock_extractor::{MockExtractor, candidate, person_candidate};
