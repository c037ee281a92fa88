// SPDX-FileCopyrightText: 2026 Skippy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `skippy recall` command implementation.
//!
//! Embeds the query through the configured gateway and prints the owner's
//! most similar active facts.

use std::io::IsTerminal;
use std::sync::Arc;

use serde::Serialize;

use skippy_config::model::SkippyConfig;
use skippy_core::SkippyError;
use skippy_memory::{HttpEmbedder, MemoryStore, ScoredFact};
use skippy_storage::Database;

/// Structured recall output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct RecallResponse {
    pub owner_id: String,
    pub query: String,
    pub limit: usize,
    pub min_similarity: f64,
    pub facts: Vec<ScoredFact>,
}

/// Run the `skippy recall` command.
pub async fn run_recall(
    config: &SkippyConfig,
    owner_id: &str,
    query: &str,
    limit: Option<usize>,
    min_similarity: Option<f64>,
    json: bool,
    plain: bool,
) -> Result<(), SkippyError> {
    let limit = limit.unwrap_or(config.memory.retrieval_limit);
    let min_similarity = min_similarity.unwrap_or(config.memory.retrieval_min_similarity);

    let db = Database::open(&config.storage).await?;
    let embedder = HttpEmbedder::new(&config.embedding, config.memory.embedding_dimensions)?;
    let store = MemoryStore::new(db, Arc::new(embedder), config.memory.clone());

    let facts = store
        .retrieve(owner_id, query, limit, min_similarity)
        .await?;

    if json {
        let response = RecallResponse {
            owner_id: owner_id.to_string(),
            query: query.to_string(),
            limit,
            min_similarity,
            facts,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&response).unwrap_or_else(|_| "{}".to_string())
        );
    } else {
        let use_color = !plain && std::io::stdout().is_terminal();
        print_recall(query, &facts, use_color);
    }
    Ok(())
}

/// One fact as a single display line.
fn fact_line(hit: &ScoredFact) -> String {
    let mut line = format!(
        "{:.3}  [{}] {} (confidence {:.2}, reinforced {}x)",
        hit.similarity,
        hit.fact.category,
        hit.fact.text,
        hit.fact.confidence,
        hit.fact.reinforcement_count
    );
    if let Some(person) = &hit.fact.person_ref {
        line.push_str(&format!(" -> {person}"));
    }
    line
}

fn print_recall(query: &str, facts: &[ScoredFact], use_color: bool) {
    println!();
    println!("  skippy recall: {query}");
    println!("  {}", "-".repeat(35));

    if facts.is_empty() {
        if use_color {
            use colored::Colorize;
            println!("    {}", "no matching facts".dimmed());
        } else {
            println!("    no matching facts");
        }
        println!();
        return;
    }

    for hit in facts {
        if use_color {
            use colored::Colorize;
            let line = fact_line(hit);
            let (score, rest) = line.split_at(5);
            println!("    {}{}", score.cyan(), rest);
        } else {
            println!("    {}", fact_line(hit));
        }
    }
    println!();
}
