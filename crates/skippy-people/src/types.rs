// SPDX-FileCopyrightText: 2026 Skippy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Person records and identity-resolution result types.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Lifecycle state of a person row. People are never deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonStatus {
    Active,
    /// Merged into another person; see [`Person::absorbed_into`].
    Absorbed,
}

impl PersonStatus {
    /// Convert to string for SQLite storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            PersonStatus::Active => "active",
            PersonStatus::Absorbed => "absorbed",
        }
    }

    /// Parse from SQLite string.
    pub fn from_str_value(s: &str) -> Option<Self> {
        match s {
            "active" => Some(PersonStatus::Active),
            "absorbed" => Some(PersonStatus::Absorbed),
            _ => None,
        }
    }
}

/// A canonical person record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: String,
    pub owner_id: String,
    pub canonical_name: String,
    pub aliases: Vec<String>,
    /// Ids of every person folded into this one, transitively.
    pub merged_from: Vec<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    /// Stored (undecayed) importance.
    pub importance_score: f64,
    pub last_mentioned: String,
    pub mention_count: i64,
    pub status: PersonStatus,
    pub absorbed_into: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Person {
    /// Canonical name followed by every alias.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.canonical_name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }
}

/// Confidence bucket of an identity match, strongest first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MatchTier {
    ExactPhone,
    ExactEmail,
    ExactName,
    /// Token-set score at or above the high threshold; auto-linked.
    FuzzyHigh,
    /// Token-set score in the suggestion band; not linked.
    FuzzyLow,
    NoMatch,
}

impl MatchTier {
    /// Whether a match in this tier links the mention to the person.
    pub fn is_linked(&self) -> bool {
        !matches!(self, MatchTier::FuzzyLow | MatchTier::NoMatch)
    }
}

/// Outcome of resolving a person mention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonResolution {
    /// The matched person for linked tiers, the suggested person for
    /// `fuzzy_low`, `None` for `no_match`.
    pub person_id: Option<String>,
    pub tier: MatchTier,
    /// 0-100.
    pub match_score: f64,
    /// Name or alias of the person that produced the score.
    pub matched_name: Option<String>,
}

impl PersonResolution {
    pub(crate) fn no_match(best_score: f64) -> Self {
        Self {
            person_id: None,
            tier: MatchTier::NoMatch,
            match_score: best_score,
            matched_name: None,
        }
    }

    /// The linked person id, if the tier auto-links.
    pub fn linked_person(&self) -> Option<&str> {
        if self.tier.is_linked() {
            self.person_id.as_deref()
        } else {
            None
        }
    }
}

/// Result of [`IdentityResolver::merge`](crate::IdentityResolver::merge).
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    /// The survivor after the merge.
    pub survivor: Person,
    pub absorbed_id: String,
    /// Facts repointed from the absorbed person to the survivor.
    pub facts_repointed: usize,
}

/// Why two people were flagged as likely duplicates.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum DuplicateReason {
    SharedPhone,
    SharedEmail,
    SimilarName { score: f64 },
}

/// A pair of people inside a [`DuplicateCluster`] and why they matched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateLink {
    pub a: String,
    pub b: String,
    pub reason: DuplicateReason,
}

/// People that are probably the same individual.
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateCluster {
    /// Oldest first, so `people[0]` is the natural merge survivor.
    pub people: Vec<Person>,
    pub links: Vec<DuplicateLink>,
}

/// A person with their importance decayed to a point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedPerson {
    pub person: Person,
    pub decayed_score: f64,
}
