// SPDX-FileCopyrightText: 2026 Skippy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `skippy config check` command implementation.
//!
//! Reaching this command means the configuration already loaded and
//! validated; it prints the effective values with the API key redacted and
//! reports whether an embedding key can be found.

use std::io::IsTerminal;

use serde::Serialize;

use skippy_config::model::SkippyConfig;
use skippy_memory::embedder::resolve_api_key;

/// Structured output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct CheckResponse {
    pub valid: bool,
    pub embedding_key_found: bool,
    pub config: SkippyConfig,
}

/// Copy of `config` safe to print.
fn redacted(config: &SkippyConfig) -> SkippyConfig {
    let mut config = config.clone();
    if config.embedding.api_key.is_some() {
        config.embedding.api_key = Some("***".to_string());
    }
    config
}

/// Run the `skippy config check` command.
pub fn run_check(config: &SkippyConfig, json: bool, plain: bool) {
    let key_found = resolve_api_key(&config.embedding.api_key).is_ok();

    if json {
        let response = CheckResponse {
            valid: true,
            embedding_key_found: key_found,
            config: redacted(config),
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&response).unwrap_or_else(|_| "{}".to_string())
        );
        return;
    }

    let use_color = !plain && std::io::stdout().is_terminal();
    println!();
    println!("  skippy config check");
    println!("  {}", "-".repeat(35));
    if use_color {
        use colored::Colorize;
        println!("    Config:     {} valid", "✓".green());
        if key_found {
            println!("    API key:    {} found", "✓".green());
        } else {
            println!("    API key:    {} missing (recall will fail)", "!".yellow());
        }
    } else {
        println!("    Config:     [OK] valid");
        if key_found {
            println!("    API key:    [OK] found");
        } else {
            println!("    API key:    [WARN] missing (recall will fail)");
        }
    }
    println!("    Database:   {}", config.storage.database_path);
    println!("    Embeddings: {} ({} dims)", config.embedding.model, config.memory.embedding_dimensions);
    println!(
        "    Dedup:      >= {:.2} over {} neighbours, +{:.2} per reinforcement",
        config.memory.dedup_threshold, config.memory.dedup_candidates, config.memory.reinforce_step
    );
    println!(
        "    Identity:   fuzzy {}/{}, ambiguous -> {:?}",
        config.identity.fuzzy_high_threshold,
        config.identity.fuzzy_low_threshold,
        config.identity.ambiguous_policy
    );
    println!(
        "    Importance: half-life {} days, +{} per mention",
        config.importance.half_life_days, config.importance.bump_increment
    );
    println!();
}
