// SPDX-FileCopyrightText: 2026 Skippy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter traits for the capabilities the memory core consumes.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod embedding;
pub mod extraction;

pub use adapter::PluginAdapter;
pub use embedding::EmbeddingAdapter;
pub use extraction::FactExtractor;
