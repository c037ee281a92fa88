// SPDX-FileCopyrightText: 2026 Skippy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Person identity for the Skippy memory core.
//!
//! Resolves free-text person mentions to canonical person records through a
//! tiered cascade (exact phone, exact email, exact name, fuzzy token-set
//! match), owns the person lifecycle including transactional merges, and
//! tracks a per-person importance score that decays on read.

pub mod fuzzy;
pub mod importance;
pub mod resolver;
pub mod types;

pub use importance::{ImportanceScorer, bump_in, decayed_score};
pub use resolver::{
    IdentityResolver, MAX_REDIRECTS, ResolvedMention, classify, follow_absorbed,
    resolve_or_create_in,
};
pub use types::{
    DuplicateCluster, DuplicateLink, DuplicateReason, MatchTier, MergeOutcome, Person,
    PersonResolution, PersonStatus, RankedPerson,
};
