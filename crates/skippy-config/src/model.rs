// SPDX-FileCopyrightText: 2026 Skippy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Skippy memory core.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Skippy configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SkippyConfig {
    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Fact dedup, reinforcement and retrieval settings.
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Person identity resolution settings.
    #[serde(default)]
    pub identity: IdentityConfig,

    /// Person importance scoring settings.
    #[serde(default)]
    pub importance: ImportanceConfig,

    /// Embedding gateway settings.
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Fact evaluator settings.
    #[serde(default)]
    pub evaluator: EvaluatorConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("skippy").join("skippy.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("skippy.db"))
        .to_string_lossy()
        .to_string()
}

fn default_wal_mode() -> bool {
    true
}

/// Semantic memory configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryConfig {
    /// Minimum cosine similarity (inclusive) for a new fact to count as a
    /// restatement of an existing one.
    #[serde(default = "default_dedup_threshold")]
    pub dedup_threshold: f64,

    /// Confidence added to a fact each time it is reinforced (capped at 1.0).
    #[serde(default = "default_reinforce_step")]
    pub reinforce_step: f64,

    /// Number of nearest neighbours considered during dedup.
    #[serde(default = "default_dedup_candidates")]
    pub dedup_candidates: usize,

    /// Required dimensionality of every stored embedding.
    #[serde(default = "default_embedding_dimensions")]
    pub embedding_dimensions: usize,

    /// Confidence used when an extractor omits one.
    #[serde(default = "default_confidence")]
    pub default_confidence: f64,

    /// Default number of facts returned by retrieval.
    #[serde(default = "default_retrieval_limit")]
    pub retrieval_limit: usize,

    /// Default minimum cosine similarity (inclusive) for retrieval.
    #[serde(default = "default_retrieval_min_similarity")]
    pub retrieval_min_similarity: f64,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            dedup_threshold: default_dedup_threshold(),
            reinforce_step: default_reinforce_step(),
            dedup_candidates: default_dedup_candidates(),
            embedding_dimensions: default_embedding_dimensions(),
            default_confidence: default_confidence(),
            retrieval_limit: default_retrieval_limit(),
            retrieval_min_similarity: default_retrieval_min_similarity(),
        }
    }
}

fn default_dedup_threshold() -> f64 {
    0.80
}

fn default_reinforce_step() -> f64 {
    0.05
}

fn default_dedup_candidates() -> usize {
    5
}

fn default_embedding_dimensions() -> usize {
    1536
}

fn default_confidence() -> f64 {
    0.5
}

fn default_retrieval_limit() -> usize {
    5
}

fn default_retrieval_min_similarity() -> f64 {
    0.15
}

/// What the fact evaluator does with a `fuzzy_low` identity suggestion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AmbiguousPolicy {
    /// Store the fact unlinked and log the suggestion.
    #[default]
    Skip,
    /// Accept the suggested person.
    Link,
    /// Create a new person for the candidate name.
    Create,
}

/// Identity resolution configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IdentityConfig {
    /// Token-set score (0-100) at or above which a name auto-links.
    #[serde(default = "default_fuzzy_high_threshold")]
    pub fuzzy_high_threshold: f64,

    /// Token-set score (0-100) at or above which a name is suggested.
    #[serde(default = "default_fuzzy_low_threshold")]
    pub fuzzy_low_threshold: f64,

    /// Evaluator behaviour for ambiguous (`fuzzy_low`) matches.
    #[serde(default)]
    pub ambiguous_policy: AmbiguousPolicy,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            fuzzy_high_threshold: default_fuzzy_high_threshold(),
            fuzzy_low_threshold: default_fuzzy_low_threshold(),
            ambiguous_policy: AmbiguousPolicy::default(),
        }
    }
}

fn default_fuzzy_high_threshold() -> f64 {
    85.0
}

fn default_fuzzy_low_threshold() -> f64 {
    70.0
}

/// Person importance configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ImportanceConfig {
    /// Importance assigned to a newly created person.
    #[serde(default = "default_baseline_score")]
    pub baseline_score: f64,

    /// Amount added to the stored score on each mention.
    #[serde(default = "default_bump_increment")]
    pub bump_increment: f64,

    /// Upper bound of the stored score.
    #[serde(default = "default_max_score")]
    pub max_score: f64,

    /// Half-life of the read-time decay, in days.
    #[serde(default = "default_half_life_days")]
    pub half_life_days: f64,

    /// Bonus added to the survivor's score on merge.
    #[serde(default = "default_merge_bonus")]
    pub merge_bonus: f64,
}

impl Default for ImportanceConfig {
    fn default() -> Self {
        Self {
            baseline_score: default_baseline_score(),
            bump_increment: default_bump_increment(),
            max_score: default_max_score(),
            half_life_days: default_half_life_days(),
            merge_bonus: default_merge_bonus(),
        }
    }
}

fn default_baseline_score() -> f64 {
    25.0
}

fn default_bump_increment() -> f64 {
    5.0
}

fn default_max_score() -> f64 {
    100.0
}

fn default_half_life_days() -> f64 {
    30.0
}

fn default_merge_bonus() -> f64 {
    10.0
}

/// Embedding gateway configuration (OpenAI-compatible `/embeddings` API).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EmbeddingConfig {
    /// Base URL of the embeddings API.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// API key. `None` requires the `SKIPPY_EMBEDDING_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Embedding model name.
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            api_key: None,
            model: default_embedding_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// Fact evaluator configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EvaluatorConfig {
    /// Retries after a transient embedding failure.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial retry delay in milliseconds; doubles on each attempt.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Upserts (and therefore embedding calls) allowed in flight at once.
    #[serde(default = "default_max_concurrent_upserts")]
    pub max_concurrent_upserts: usize,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            max_concurrent_upserts: default_max_concurrent_upserts(),
        }
    }
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    250
}

fn default_max_concurrent_upserts() -> usize {
    4
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
