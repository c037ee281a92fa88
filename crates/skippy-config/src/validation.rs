// SPDX-FileCopyrightText: 2026 Skippy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks the cross-field and range constraints serde attributes cannot
//! express: thresholds within their scales, tier ordering, positive sizes.

use crate::diagnostic::ConfigError;
use crate::model::SkippyConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every violation instead of stopping at the first.
pub fn validate_config(config: &SkippyConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    let memory = &config.memory;
    for (key, value) in [
        ("memory.dedup_threshold", memory.dedup_threshold),
        ("memory.reinforce_step", memory.reinforce_step),
        ("memory.default_confidence", memory.default_confidence),
        (
            "memory.retrieval_min_similarity",
            memory.retrieval_min_similarity,
        ),
    ] {
        if !(0.0..=1.0).contains(&value) {
            fail(format!("{key} must be within [0, 1], got {value}"));
        }
    }
    if memory.dedup_candidates < 1 {
        fail("memory.dedup_candidates must be at least 1".to_string());
    }
    if memory.embedding_dimensions == 0 {
        fail("memory.embedding_dimensions must be greater than 0".to_string());
    }
    if memory.retrieval_limit == 0 {
        fail("memory.retrieval_limit must be at least 1".to_string());
    }

    let identity = &config.identity;
    if !(0.0..=100.0).contains(&identity.fuzzy_low_threshold)
        || !(0.0..=100.0).contains(&identity.fuzzy_high_threshold)
    {
        fail(format!(
            "identity fuzzy thresholds must be within [0, 100], got low={} high={}",
            identity.fuzzy_low_threshold, identity.fuzzy_high_threshold
        ));
    } else if identity.fuzzy_low_threshold >= identity.fuzzy_high_threshold {
        fail(format!(
            "identity.fuzzy_low_threshold ({}) must be below identity.fuzzy_high_threshold ({})",
            identity.fuzzy_low_threshold, identity.fuzzy_high_threshold
        ));
    }

    let importance = &config.importance;
    if importance.half_life_days <= 0.0 {
        fail(format!(
            "importance.half_life_days must be positive, got {}",
            importance.half_life_days
        ));
    }
    if importance.max_score <= 0.0 {
        fail(format!(
            "importance.max_score must be positive, got {}",
            importance.max_score
        ));
    }
    if importance.baseline_score < 0.0 || importance.baseline_score > importance.max_score {
        fail(format!(
            "importance.baseline_score ({}) must be within [0, importance.max_score ({})]",
            importance.baseline_score, importance.max_score
        ));
    }
    if importance.bump_increment < 0.0 || importance.merge_bonus < 0.0 {
        fail("importance.bump_increment and importance.merge_bonus must be non-negative".to_string());
    }

    if config.embedding.model.trim().is_empty() {
        fail("embedding.model must not be empty".to_string());
    }
    if config.embedding.timeout_secs == 0 {
        fail("embedding.timeout_secs must be at least 1".to_string());
    }

    if config.evaluator.max_concurrent_upserts < 1 {
        fail("evaluator.max_concurrent_upserts must be at least 1".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_error(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn default_config_validates() {
        let config = SkippyConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn empty_database_path_fails_validation() {
        let mut config = SkippyConfig::default();
        config.storage.database_path = "  ".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "database_path"));
    }

    #[test]
    fn dedup_threshold_out_of_range_fails() {
        let mut config = SkippyConfig::default();
        config.memory.dedup_threshold = 1.2;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "memory.dedup_threshold"));
    }

    #[test]
    fn inverted_fuzzy_tiers_fail() {
        let mut config = SkippyConfig::default();
        config.identity.fuzzy_low_threshold = 90.0;
        config.identity.fuzzy_high_threshold = 85.0;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "fuzzy_low_threshold"));
    }

    #[test]
    fn zero_half_life_fails() {
        let mut config = SkippyConfig::default();
        config.importance.half_life_days = 0.0;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "half_life_days"));
    }

    #[test]
    fn baseline_above_max_fails() {
        let mut config = SkippyConfig::default();
        config.importance.baseline_score = 150.0;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "baseline_score"));
    }

    #[test]
    fn collects_every_violation() {
        let mut config = SkippyConfig::default();
        config.memory.embedding_dimensions = 0;
        config.memory.dedup_candidates = 0;
        config.evaluator.max_concurrent_upserts = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn partial_toml_is_validated_against_defaults() {
        let toml_str = r#"
[importance]
baseline_score = 120.0

[evaluator]
max_retries = 5
"#;
        let config: SkippyConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.evaluator.max_retries, 5);
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(has_error(&errors, "baseline_score"));
    }
}
