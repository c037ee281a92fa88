// SPDX-FileCopyrightText: 2026 Skippy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fact domain types for the semantic memory store.

use serde::{Deserialize, Serialize};
use skippy_core::FactCategory;

/// A durable, embeddable unit of information about an owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fact {
    /// Unique identifier for this fact.
    pub id: String,
    /// Owner namespace the fact belongs to.
    pub owner_id: String,
    /// Standalone statement of the fact.
    pub text: String,
    /// Embedding of the text as first stored. Reinforcement never replaces it.
    #[serde(skip)]
    pub embedding: Vec<f32>,
    /// Confidence in `[0, 1]`. Only reinforcement changes it.
    pub confidence: f64,
    /// Times the fact was restated after it was first stored.
    pub reinforcement_count: i64,
    pub status: FactStatus,
    pub category: FactCategory,
    /// Person the fact is about.
    pub person_ref: Option<String>,
    /// Conversation the fact was first extracted from.
    pub conversation_id: Option<String>,
    /// ISO 8601 creation timestamp.
    pub created_at: String,
    /// ISO 8601 last-update timestamp.
    pub updated_at: String,
}

/// Lifecycle status of a fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactStatus {
    /// Visible to dedup and retrieval.
    Active,
    /// Soft-deleted; kept for audit.
    Archived,
}

impl FactStatus {
    /// Convert to string for SQLite storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            FactStatus::Active => "active",
            FactStatus::Archived => "archived",
        }
    }

    /// Parse from SQLite string.
    pub fn from_str_value(s: &str) -> Self {
        match s {
            "archived" => FactStatus::Archived,
            _ => FactStatus::Active,
        }
    }
}

/// A fact to be upserted.
#[derive(Debug, Clone, PartialEq)]
pub struct FactDraft {
    pub owner_id: String,
    pub text: String,
    pub category: FactCategory,
    /// Seed confidence for a new fact; the configured default when `None`.
    pub confidence: Option<f64>,
    pub person_ref: Option<String>,
    pub conversation_id: Option<String>,
}

impl FactDraft {
    pub fn new(owner_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            text: text.into(),
            category: FactCategory::Fact,
            confidence: None,
            person_ref: None,
            conversation_id: None,
        }
    }

    pub fn with_category(mut self, category: FactCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn with_person(mut self, person_id: impl Into<String>) -> Self {
        self.person_ref = Some(person_id.into());
        self
    }

    pub fn with_conversation(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }
}

/// Result of [`MemoryStore::upsert`](crate::MemoryStore::upsert).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactUpsertResult {
    /// The inserted fact, or the existing fact that was reinforced.
    pub fact_id: String,
    pub was_new: bool,
    /// Confidence after the upsert.
    pub confidence: f64,
    /// Reinforcement count after the upsert.
    pub reinforcement_count: i64,
    /// Similarity of the closest existing fact, if the owner had any.
    pub top_similarity: Option<f64>,
    /// Person the stored fact points at after the upsert.
    pub person_ref: Option<String>,
}

/// A fact with its cosine similarity to a query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredFact {
    pub fact: Fact,
    pub similarity: f64,
}

/// Convert f32 vector to bytes for SQLite BLOB storage.
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    vec.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Convert SQLite BLOB back to f32 vector. Trailing partial chunks are dropped.
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

/// Cosine similarity of two vectors, accumulated in f64.
///
/// Returns 0.0 for vectors of different length or when either has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
