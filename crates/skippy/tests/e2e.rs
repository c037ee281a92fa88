// SPDX-FileCopyrightText: 2026 Skippy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for the `skippy` binary.
//!
//! Each test seeds an isolated temp database through the library crates,
//! then runs the compiled binary against it with a config file and reads
//! its `--json` output. Recall talks to a wiremock embeddings endpoint.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::Arc;

use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use skippy_config::model::SkippyConfig;
use skippy_core::FactCategory;
use skippy_memory::{FactDraft, MemoryStore};
use skippy_people::IdentityResolver;
use skippy_storage::Database;
use skippy_test_utils::MockEmbedder;

const DOG_FACT: &str = "User has a dog named Max";
const JAZZ_FACT: &str = "User likes jazz";
const SUMMER_FACT: &str = "Summer runs marathons";

struct Workspace {
    _dir: tempfile::TempDir,
    config_path: PathBuf,
}

fn write_config(dir: &Path, api_base: &str) -> PathBuf {
    let db_path = dir.join("memory.db");
    let config_path = dir.join("skippy.toml");
    let toml = format!(
        r#"
[storage]
database_path = "{}"

[memory]
embedding_dimensions = 4

[embedding]
api_base = "{api_base}"
api_key = "sk-test"

[logging]
level = "warn"
"#,
        db_path.display()
    );
    std::fs::write(&config_path, toml).unwrap();
    config_path
}

fn load(config_path: &Path) -> SkippyConfig {
    skippy_config::load_and_validate_path(config_path).expect("test config should validate")
}

/// Seed two likely-duplicate people and three facts. Returns the people ids
/// (older first).
async fn seed(config: &SkippyConfig) -> (String, String) {
    let db = Database::open(&config.storage).await.unwrap();
    let resolver = IdentityResolver::new(
        db.clone(),
        config.identity.clone(),
        config.importance.clone(),
    );
    let summer = resolver
        .create_person("nolan", "Summer Hollars", Some("555-123-4567"), None)
        .await
        .unwrap();
    let summer_h = resolver
        .create_person("nolan", "Summer H", Some("(555) 123 4567"), None)
        .await
        .unwrap();

    let embedder = MockEmbedder::new(4)
        .with_embedding(DOG_FACT, vec![1.0, 0.0, 0.0, 0.0])
        .with_embedding(JAZZ_FACT, vec![0.0, 1.0, 0.0, 0.0])
        .with_embedding(SUMMER_FACT, vec![0.0, 0.0, 1.0, 0.0]);
    let store = MemoryStore::new(db, Arc::new(embedder), config.memory.clone());
    store
        .upsert(FactDraft::new("nolan", DOG_FACT).with_category(FactCategory::Family))
        .await
        .unwrap();
    store
        .upsert(FactDraft::new("nolan", JAZZ_FACT).with_category(FactCategory::Preference))
        .await
        .unwrap();
    store
        .upsert(
            FactDraft::new("nolan", SUMMER_FACT)
                .with_category(FactCategory::Person)
                .with_person(summer_h.id.clone()),
        )
        .await
        .unwrap();

    (summer.id, summer_h.id)
}

async fn workspace(api_base: &str) -> (Workspace, String, String) {
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(dir.path(), api_base);
    let (a, b) = seed(&load(&config_path)).await;
    (
        Workspace {
            _dir: dir,
            config_path,
        },
        a,
        b,
    )
}

/// Run the binary off the async runtime so a wiremock server can answer it.
async fn skippy(config_path: &Path, args: &[&str]) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_skippy"));
    command
        .arg("--config")
        .arg(config_path)
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove("SKIPPY_EMBEDDING_API_KEY");
    tokio::task::spawn_blocking(move || command.output())
        .await
        .unwrap()
        .expect("binary should run")
}

fn json_stdout(output: &Output) -> Value {
    assert!(
        output.status.success(),
        "skippy failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn config_check_reports_effective_values() {
    let (ws, _, _) = workspace("http://127.0.0.1:9/v1").await;
    let value = json_stdout(&skippy(&ws.config_path, &["--json", "config", "check"]).await);

    assert_eq!(value["valid"], true);
    assert_eq!(value["embedding_key_found"], true);
    assert_eq!(value["config"]["memory"]["embedding_dimensions"], 4);
    assert_eq!(value["config"]["embedding"]["api_key"], "***");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn invalid_config_exits_nonzero() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("skippy.toml");
    std::fs::write(&config_path, "[memory]\ndedup_threshold = 1.5\n").unwrap();

    let output = skippy(&config_path, &["config", "check"]).await;
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn resolve_reports_tier_without_creating() {
    let (ws, summer, _) = workspace("http://127.0.0.1:9/v1").await;

    let exact = json_stdout(
        &skippy(&ws.config_path, &["--json", "people", "resolve", "nolan", "summer hollars"]).await,
    );
    assert_eq!(exact["tier"], "exact_name");
    assert_eq!(exact["person_id"], summer.as_str());

    let by_phone = json_stdout(
        &skippy(
            &ws.config_path,
            &["--json", "people", "resolve", "nolan", "Someone", "--phone", "+1 555 999 0000"],
        )
        .await,
    );
    assert_eq!(by_phone["tier"], "no_match");

    let listed = json_stdout(&skippy(&ws.config_path, &["--json", "people", "list", "nolan"]).await);
    assert_eq!(listed.as_array().unwrap().len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn duplicates_then_merge_repoints_facts() {
    let (ws, summer, summer_h) = workspace("http://127.0.0.1:9/v1").await;

    let clusters =
        json_stdout(&skippy(&ws.config_path, &["--json", "people", "duplicates", "nolan"]).await);
    let clusters = clusters.as_array().unwrap();
    assert_eq!(clusters.len(), 1);
    assert_eq!(clusters[0]["people"][0]["id"], summer.as_str());
    assert_eq!(clusters[0]["people"][1]["id"], summer_h.as_str());

    let merged = json_stdout(
        &skippy(&ws.config_path, &["--json", "people", "merge", &summer, &summer_h]).await,
    );
    assert_eq!(merged["absorbed_id"], summer_h.as_str());
    assert_eq!(merged["facts_repointed"], 1);
    assert_eq!(merged["survivor"]["mention_count"], 2);
    assert!(
        merged["survivor"]["aliases"]
            .as_array()
            .unwrap()
            .contains(&json!("Summer H"))
    );

    let facts = json_stdout(
        &skippy(&ws.config_path, &["--json", "people", "facts", "nolan", &summer]).await,
    );
    assert_eq!(facts[0]["text"], SUMMER_FACT);

    let listed = json_stdout(&skippy(&ws.config_path, &["--json", "people", "list", "nolan"]).await);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let again = skippy(&ws.config_path, &["people", "merge", &summer, &summer_h]).await;
    assert!(!again.status.success());
    assert!(String::from_utf8_lossy(&again.stderr).contains("error:"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn recall_ranks_facts_through_the_embedding_gateway() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"index": 0, "embedding": [0.9, 0.1, 0.0, 0.0]}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (ws, _, _) = workspace(&format!("{}/v1", server.uri())).await;
    let value = json_stdout(
        &skippy(&ws.config_path, &["--json", "recall", "nolan", "tell me about pets"]).await,
    );

    let facts = value["facts"].as_array().unwrap();
    assert_eq!(facts.len(), 1, "jazz (0.11) falls below the 0.15 floor");
    assert_eq!(facts[0]["fact"]["text"], DOG_FACT);
    assert!(facts[0]["similarity"].as_f64().unwrap() > 0.99);
    assert_eq!(value["limit"], 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn recall_fails_when_gateway_is_down() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let (ws, _, _) = workspace(&format!("{}/v1", server.uri())).await;
    let output = skippy(&ws.config_path, &["recall", "nolan", "pets"]).await;
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("503"));
}
