// SPDX-FileCopyrightText: 2026 Skippy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./skippy.toml` > `~/.config/skippy/skippy.toml` > `/etc/skippy/skippy.toml`
//! with environment variable overrides via `SKIPPY_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::SkippyConfig;

/// Top-level config sections, used to map `SKIPPY_<SECTION>_<KEY>` env vars.
pub(crate) const SECTIONS: &[&str] = &[
    "storage",
    "memory",
    "identity",
    "importance",
    "embedding",
    "evaluator",
    "logging",
];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/skippy/skippy.toml` (system-wide)
/// 3. `~/.config/skippy/skippy.toml` (user XDG config)
/// 4. `./skippy.toml` (local directory)
/// 5. `SKIPPY_*` environment variables
pub fn load_config() -> Result<SkippyConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<SkippyConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SkippyConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<SkippyConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SkippyConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(SkippyConfig::default()))
        .merge(Toml::file("/etc/skippy/skippy.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("skippy/skippy.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("skippy.toml"))
        .merge(env_provider())
}

/// Map a lowercased, prefix-stripped env var name onto a dotted config key.
///
/// Only the leading section name is split off, so `memory_embedding_dimensions`
/// becomes `memory.embedding_dimensions` rather than `memory.embedding.dimensions`.
pub(crate) fn map_env_key(key: &str) -> String {
    for section in SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|r| r.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

fn env_provider() -> Env {
    Env::prefixed("SKIPPY_").map(|key| map_env_key(key.as_str()).into())
}
