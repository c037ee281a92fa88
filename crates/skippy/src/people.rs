// SPDX-FileCopyrightText: 2026 Skippy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `skippy people` subcommands: resolve, merge, duplicates, list, facts.

use std::io::IsTerminal;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use skippy_config::model::SkippyConfig;
use skippy_core::SkippyError;
use skippy_memory::{Fact, HttpEmbedder, MemoryStore};
use skippy_people::{
    DuplicateCluster, DuplicateLink, IdentityResolver, Person, PersonResolution, RankedPerson,
};
use skippy_storage::Database;

/// Structured merge output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct MergeResponse {
    pub survivor: Person,
    pub absorbed_id: String,
    pub facts_repointed: usize,
}

/// One duplicate group for `--json` mode.
#[derive(Debug, Serialize)]
pub struct ClusterOutput {
    pub people: Vec<PersonSummary>,
    pub links: Vec<DuplicateLink>,
}

#[derive(Debug, Serialize)]
pub struct PersonSummary {
    pub id: String,
    pub canonical_name: String,
    pub aliases: Vec<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub mention_count: i64,
}

impl From<&Person> for PersonSummary {
    fn from(person: &Person) -> Self {
        Self {
            id: person.id.clone(),
            canonical_name: person.canonical_name.clone(),
            aliases: person.aliases.clone(),
            phone: person.phone.clone(),
            email: person.email.clone(),
            mention_count: person.mention_count,
        }
    }
}

impl From<&DuplicateCluster> for ClusterOutput {
    fn from(cluster: &DuplicateCluster) -> Self {
        Self {
            people: cluster.people.iter().map(PersonSummary::from).collect(),
            links: cluster.links.clone(),
        }
    }
}

/// One ranked person for `--json` mode.
#[derive(Debug, Serialize)]
pub struct RankedOutput {
    #[serde(flatten)]
    pub person: PersonSummary,
    pub importance: f64,
    pub stored_importance: f64,
    pub last_mentioned: String,
}

impl From<&RankedPerson> for RankedOutput {
    fn from(ranked: &RankedPerson) -> Self {
        Self {
            person: PersonSummary::from(&ranked.person),
            importance: ranked.decayed_score,
            stored_importance: ranked.person.importance_score,
            last_mentioned: ranked.person.last_mentioned.clone(),
        }
    }
}

async fn open_resolver(config: &SkippyConfig) -> Result<IdentityResolver, SkippyError> {
    let db = Database::open(&config.storage).await?;
    Ok(IdentityResolver::new(
        db,
        config.identity.clone(),
        config.importance.clone(),
    ))
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn print_header(title: &str) {
    println!();
    println!("  skippy people {title}");
    println!("  {}", "-".repeat(35));
}

/// Run `skippy people resolve`.
pub async fn run_resolve(
    config: &SkippyConfig,
    owner_id: &str,
    name: &str,
    phone: Option<&str>,
    email: Option<&str>,
    json: bool,
    plain: bool,
) -> Result<(), SkippyError> {
    let resolver = open_resolver(config).await?;
    let resolution = resolver.resolve(owner_id, name, phone, email).await?;

    if json {
        print_json(&resolution);
        return Ok(());
    }

    let use_color = !plain && std::io::stdout().is_terminal();
    print_header("resolve");
    println!("    Mention:  {name}");
    println!("    {}", resolution_line(&resolution, use_color));
    println!();
    Ok(())
}

fn resolution_line(resolution: &PersonResolution, use_color: bool) -> String {
    let tier = resolution.tier.to_string();
    let target = match (&resolution.person_id, &resolution.matched_name) {
        (Some(id), Some(matched)) => format!("{matched} ({id})"),
        (Some(id), None) => id.clone(),
        _ => "-".to_string(),
    };
    let verb = if resolution.tier.is_linked() {
        "linked to"
    } else if resolution.person_id.is_some() {
        "suggests"
    } else {
        "no match"
    };

    if use_color {
        use colored::Colorize;
        let tier = if resolution.tier.is_linked() {
            tier.green()
        } else if resolution.person_id.is_some() {
            tier.yellow()
        } else {
            tier.red()
        };
        format!(
            "Tier:     {tier} (score {:.1}), {verb} {target}",
            resolution.match_score
        )
    } else {
        format!(
            "Tier:     {tier} (score {:.1}), {verb} {target}",
            resolution.match_score
        )
    }
}

/// Run `skippy people merge`.
pub async fn run_merge(
    config: &SkippyConfig,
    survivor_id: &str,
    absorbed_id: &str,
    json: bool,
    plain: bool,
) -> Result<(), SkippyError> {
    let resolver = open_resolver(config).await?;
    let outcome = resolver.merge(survivor_id, absorbed_id).await?;

    if json {
        print_json(&MergeResponse {
            survivor: outcome.survivor,
            absorbed_id: outcome.absorbed_id,
            facts_repointed: outcome.facts_repointed,
        });
        return Ok(());
    }

    let use_color = !plain && std::io::stdout().is_terminal();
    print_header("merge");
    if use_color {
        use colored::Colorize;
        println!(
            "    {} {} merged into {} ({})",
            "✓".green(),
            outcome.absorbed_id,
            outcome.survivor.canonical_name.bold(),
            outcome.survivor.id
        );
    } else {
        println!(
            "    [OK] {} merged into {} ({})",
            outcome.absorbed_id, outcome.survivor.canonical_name, outcome.survivor.id
        );
    }
    println!("    Facts repointed: {}", outcome.facts_repointed);
    println!("    Aliases:         {}", outcome.survivor.aliases.join(", "));
    println!();
    Ok(())
}

/// Run `skippy people duplicates`.
pub async fn run_duplicates(
    config: &SkippyConfig,
    owner_id: &str,
    threshold: f64,
    json: bool,
    plain: bool,
) -> Result<(), SkippyError> {
    let resolver = open_resolver(config).await?;
    let clusters = resolver.find_duplicates(owner_id, threshold).await?;

    if json {
        let output: Vec<ClusterOutput> = clusters.iter().map(ClusterOutput::from).collect();
        print_json(&output);
        return Ok(());
    }

    let use_color = !plain && std::io::stdout().is_terminal();
    print_header("duplicates");
    if clusters.is_empty() {
        println!("    no likely duplicates");
    }
    for (i, cluster) in clusters.iter().enumerate() {
        println!("    Group {}:", i + 1);
        for person in &cluster.people {
            if use_color {
                use colored::Colorize;
                println!("      {} {}", person.canonical_name.bold(), person.id.dimmed());
            } else {
                println!("      {} {}", person.canonical_name, person.id);
            }
        }
    }
    println!();
    Ok(())
}

/// Run `skippy people list`.
pub async fn run_list(
    config: &SkippyConfig,
    owner_id: &str,
    json: bool,
    plain: bool,
) -> Result<(), SkippyError> {
    let resolver = open_resolver(config).await?;
    let ranked = resolver.list_people(owner_id, Utc::now()).await?;

    if json {
        let output: Vec<RankedOutput> = ranked.iter().map(RankedOutput::from).collect();
        print_json(&output);
        return Ok(());
    }

    let use_color = !plain && std::io::stdout().is_terminal();
    print_header("list");
    if ranked.is_empty() {
        println!("    no people");
    }
    for entry in &ranked {
        let score = format!("{:6.2}", entry.decayed_score);
        if use_color {
            use colored::Colorize;
            println!(
                "    {}  {} ({} mentions) {}",
                score.cyan(),
                entry.person.canonical_name.bold(),
                entry.person.mention_count,
                entry.person.id.dimmed()
            );
        } else {
            println!(
                "    {score}  {} ({} mentions) {}",
                entry.person.canonical_name, entry.person.mention_count, entry.person.id
            );
        }
    }
    println!();
    Ok(())
}

/// Run `skippy people facts`.
///
/// Fact queries live on the store, so the embedding section must be
/// configured even though no text is embedded here.
pub async fn run_facts(
    config: &SkippyConfig,
    owner_id: &str,
    person_id: &str,
    limit: usize,
    json: bool,
    plain: bool,
) -> Result<(), SkippyError> {
    let db = Database::open(&config.storage).await?;
    let embedder = HttpEmbedder::new(&config.embedding, config.memory.embedding_dimensions)?;
    let store = MemoryStore::new(db, Arc::new(embedder), config.memory.clone());
    let facts = store.facts_for_person(owner_id, person_id, limit).await?;

    if json {
        print_json(&facts);
        return Ok(());
    }

    let use_color = !plain && std::io::stdout().is_terminal();
    print_header("facts");
    if facts.is_empty() {
        println!("    no facts linked to {person_id}");
    }
    for fact in &facts {
        println!("    {}", fact_line(fact, use_color));
    }
    println!();
    Ok(())
}

fn fact_line(fact: &Fact, use_color: bool) -> String {
    let category = format!("[{}]", fact.category);
    if use_color {
        use colored::Colorize;
        format!("{} {} ({:.2})", category.cyan(), fact.text, fact.confidence)
    } else {
        format!("{category} {} ({:.2})", fact.text, fact.confidence)
    }
}
