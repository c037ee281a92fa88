// SPDX-FileCopyrightText: 2026 Skippy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Skippy - semantic memory core for a personal assistant.
//!
//! This binary inspects and maintains a memory database: recall facts,
//! resolve and merge people, and check configuration.

mod config_check;
mod people;
mod recall;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use skippy_config::model::SkippyConfig;

/// Skippy - semantic memory core for a personal assistant.
#[derive(Parser, Debug)]
#[command(name = "skippy", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output structured JSON.
    #[arg(long, global = true)]
    json: bool,

    /// Disable colors.
    #[arg(long, global = true)]
    plain: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Retrieve the facts most relevant to a query.
    Recall {
        /// Owner whose memory is searched.
        owner: String,
        /// Free-text query.
        query: String,
        /// Maximum number of facts (defaults to `memory.retrieval_limit`).
        #[arg(long)]
        limit: Option<usize>,
        /// Inclusive similarity floor (defaults to `memory.retrieval_min_similarity`).
        #[arg(long)]
        min_similarity: Option<f64>,
    },
    /// Inspect and maintain person records.
    People {
        #[command(subcommand)]
        action: PeopleCommand,
    },
    /// Manage Skippy configuration.
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum PeopleCommand {
    /// Match a mention against known people without creating anything.
    Resolve {
        owner: String,
        name: String,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    /// Merge one person into another, repointing their facts.
    Merge {
        /// Person that remains.
        survivor: String,
        /// Person folded into the survivor.
        absorbed: String,
    },
    /// List likely duplicate people.
    Duplicates {
        owner: String,
        /// Token-set name score (0-100) that flags a pair.
        #[arg(long, default_value_t = 85.0)]
        threshold: f64,
    },
    /// List active people by decayed importance.
    List { owner: String },
    /// Show the facts linked to a person.
    Facts {
        owner: String,
        person_id: String,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate configuration and print the effective values.
    Check,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => skippy_config::load_and_validate_path(path),
        None => skippy_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            skippy_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.logging.level);
    skippy_core::recording::register_metrics();

    if let Err(e) = run(cli, config).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: SkippyConfig) -> Result<(), skippy_core::SkippyError> {
    match cli.command {
        Commands::Recall {
            owner,
            query,
            limit,
            min_similarity,
        } => {
            recall::run_recall(
                &config,
                &owner,
                &query,
                limit,
                min_similarity,
                cli.json,
                cli.plain,
            )
            .await
        }
        Commands::People { action } => match action {
            PeopleCommand::Resolve {
                owner,
                name,
                phone,
                email,
            } => {
                people::run_resolve(
                    &config,
                    &owner,
                    &name,
                    phone.as_deref(),
                    email.as_deref(),
                    cli.json,
                    cli.plain,
                )
                .await
            }
            PeopleCommand::Merge { survivor, absorbed } => {
                people::run_merge(&config, &survivor, &absorbed, cli.json, cli.plain).await
            }
            PeopleCommand::Duplicates { owner, threshold } => {
                people::run_duplicates(&config, &owner, threshold, cli.json, cli.plain).await
            }
            PeopleCommand::List { owner } => {
                people::run_list(&config, &owner, cli.json, cli.plain).await
            }
            PeopleCommand::Facts {
                owner,
                person_id,
                limit,
            } => people::run_facts(&config, &owner, &person_id, limit, cli.json, cli.plain).await,
        },
        Commands::Config {
            action: ConfigCommand::Check,
        } => {
            config_check::run_check(&config, cli.json, cli.plain);
            Ok(())
        }
    }
}

/// Initialize the tracing subscriber. Logs go to stderr so stdout stays
/// parseable in `--json` mode.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "skippy={log_level},skippy_memory={log_level},skippy_people={log_level},skippy_storage={log_level},warn"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}
