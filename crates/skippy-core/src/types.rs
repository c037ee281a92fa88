// SPDX-FileCopyrightText: 2026 Skippy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the adapter traits and the memory core.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of external capability an adapter provides.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Embedding,
    Extraction,
    Storage,
}

// --- Embedding types ---

/// Input for an embedding adapter.
#[derive(Debug, Clone)]
pub struct EmbeddingInput {
    /// Texts to embed, one vector per entry.
    pub texts: Vec<String>,
}

/// Output from an embedding adapter.
#[derive(Debug, Clone)]
pub struct EmbeddingOutput {
    /// One vector per input text, in input order.
    pub embeddings: Vec<Vec<f32>>,
    /// Dimensionality of every vector in `embeddings`.
    pub dimensions: usize,
}

// --- Extraction types ---

/// Semantic category of a stored fact.
///
/// The taxonomy is closed but advisory: unknown labels from an extractor
/// fall back to [`FactCategory::Fact`] rather than being rejected.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FactCategory {
    Family,
    Person,
    Preference,
    Project,
    Technical,
    RecurringEvent,
    #[default]
    Fact,
}

impl FactCategory {
    /// Convert to string for SQLite storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            FactCategory::Family => "family",
            FactCategory::Person => "person",
            FactCategory::Preference => "preference",
            FactCategory::Project => "project",
            FactCategory::Technical => "technical",
            FactCategory::RecurringEvent => "recurring_event",
            FactCategory::Fact => "fact",
        }
    }

    /// Parse from a stored or extracted label. Unknown labels map to `Fact`.
    pub fn from_str_value(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().replace(' ', "_").as_str() {
            "family" => FactCategory::Family,
            "person" => FactCategory::Person,
            "preference" => FactCategory::Preference,
            "project" => FactCategory::Project,
            "technical" => FactCategory::Technical,
            "recurring_event" => FactCategory::RecurringEvent,
            _ => FactCategory::Fact,
        }
    }

    /// Whether facts in this category are about a specific individual.
    pub fn is_person_related(&self) -> bool {
        matches!(self, FactCategory::Family | FactCategory::Person)
    }
}

/// A person named by an extracted fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonMention {
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// A durable fact proposed by an extractor, before dedup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateFact {
    /// Standalone restatement of the fact.
    pub text: String,
    #[serde(default)]
    pub category: FactCategory,
    /// Extractor confidence in `[0, 1]`; seeds the stored confidence.
    pub confidence: f64,
    /// Person the fact is about, if any.
    #[serde(default)]
    pub person: Option<PersonMention>,
}

/// One prior message of the conversation, for extractor context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnMessage {
    pub role: String,
    pub content: String,
}

/// A single user/assistant exchange handed to the fact evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub owner_id: String,
    pub conversation_id: String,
    pub user_text: String,
    pub assistant_text: String,
    /// Earlier messages, oldest first.
    #[serde(default)]
    pub history: Vec<TurnMessage>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fact_category_storage_strings() {
        assert_eq!(FactCategory::RecurringEvent.as_str(), "recurring_event");
        assert_eq!(
            FactCategory::from_str_value("recurring_event"),
            FactCategory::RecurringEvent
        );
        assert_eq!(
            FactCategory::from_str_value("Recurring Event"),
            FactCategory::RecurringEvent
        );
        assert_eq!(FactCategory::from_str_value("FAMILY"), FactCategory::Family);
    }

    #[test]
    fn unknown_category_falls_back_to_fact() {
        assert_eq!(FactCategory::from_str_value("gossip"), FactCategory::Fact);
        assert_eq!(FactCategory::from_str_value(""), FactCategory::Fact);
    }

    #[test]
    fn display_matches_storage_string() {
        for category in [
            FactCategory::Family,
            FactCategory::Person,
            FactCategory::Preference,
            FactCategory::Project,
            FactCategory::Technical,
            FactCategory::RecurringEvent,
            FactCategory::Fact,
        ] {
            assert_eq!(category.to_string(), category.as_str());
        }
    }

    #[test]
    fn person_related_categories() {
        assert!(FactCategory::Family.is_person_related());
        assert!(FactCategory::Person.is_person_related());
        assert!(!FactCategory::Technical.is_person_related());
    }

    #[test]
    fn candidate_fact_deserializes_with_defaults() {
        let fact: CandidateFact =
            serde_json::from_str(r#"{"text": "User likes tea", "confidence": 0.7}"#).unwrap();
        assert_eq!(fact.category, FactCategory::Fact);
        assert!(fact.person.is_none());
    }
}
