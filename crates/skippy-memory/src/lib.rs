// SPDX-FileCopyrightText: 2026 Skippy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Semantic memory for the Skippy assistant.
//!
//! Stores durable facts about an owner as embeddings in SQLite, collapses
//! restatements of a known fact into reinforcement, and links facts to the
//! people they are about.
//!
//! ## Architecture
//!
//! - **SimilarityIndex**: brute-force cosine search over an owner's active facts
//! - **MemoryStore**: embed, dedup-or-insert, retrieval and fact maintenance
//! - **HttpEmbedder**: OpenAI-compatible embedding gateway
//! - **FactEvaluator**: candidate extraction, person linking, retried upserts
//! - **SemanticMemory**: the facade callers talk to

pub mod embedder;
pub mod evaluator;
pub mod index;
pub mod store;
pub mod types;

use std::sync::Arc;

use tokio::task::JoinHandle;

use skippy_config::model::SkippyConfig;
use skippy_core::{ConversationTurn, EmbeddingAdapter, FactExtractor, SkippyError};
use skippy_people::{IdentityResolver, ImportanceScorer, MergeOutcome, PersonResolution};
use skippy_storage::Database;

pub use embedder::HttpEmbedder;
pub use evaluator::{CompletionBackend, FactEvaluator, LlmExtractor, parse_evaluation_response};
pub use index::SimilarityIndex;
pub use store::MemoryStore;
pub use types::*;

/// Entry point for the memory core.
///
/// Cloning is cheap; clones share the store, the database connection and
/// the evaluator's upsert limit.
#[derive(Clone)]
pub struct SemanticMemory {
    store: Arc<MemoryStore>,
    resolver: IdentityResolver,
    scorer: ImportanceScorer,
    evaluator: Arc<FactEvaluator>,
}

impl SemanticMemory {
    pub fn new(
        db: Database,
        embedder: Arc<dyn EmbeddingAdapter>,
        extractor: Arc<dyn FactExtractor>,
        config: &SkippyConfig,
    ) -> Self {
        let store = Arc::new(MemoryStore::new(
            db.clone(),
            embedder,
            config.memory.clone(),
        ));
        let resolver = IdentityResolver::new(
            db.clone(),
            config.identity.clone(),
            config.importance.clone(),
        );
        let scorer = ImportanceScorer::new(db, config.importance.clone());
        let evaluator = Arc::new(FactEvaluator::new(
            extractor,
            Arc::clone(&store),
            resolver.clone(),
            scorer.clone(),
            config.evaluator.clone(),
        ));
        Self {
            store,
            resolver,
            scorer,
            evaluator,
        }
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    pub fn resolver(&self) -> &IdentityResolver {
        &self.resolver
    }

    pub fn scorer(&self) -> &ImportanceScorer {
        &self.scorer
    }

    /// Extract and store the durable facts of one exchange.
    pub async fn evaluate_turn(
        &self,
        owner_id: &str,
        user_text: &str,
        assistant_text: &str,
        conversation_id: &str,
    ) -> Result<Vec<FactUpsertResult>, SkippyError> {
        let turn = ConversationTurn {
            owner_id: owner_id.to_string(),
            conversation_id: conversation_id.to_string(),
            user_text: user_text.to_string(),
            assistant_text: assistant_text.to_string(),
            history: Vec::new(),
        };
        self.evaluator.evaluate_turn(&turn).await
    }

    /// Evaluate a turn (with history) on a background task.
    pub fn spawn_evaluation(
        &self,
        turn: ConversationTurn,
    ) -> JoinHandle<Result<Vec<FactUpsertResult>, SkippyError>> {
        self.evaluator.spawn(turn)
    }

    /// Facts relevant to `query`, best first.
    pub async fn retrieve_relevant(
        &self,
        owner_id: &str,
        query: &str,
        limit: usize,
        min_similarity: f64,
    ) -> Result<Vec<ScoredFact>, SkippyError> {
        self.store
            .retrieve(owner_id, query, limit, min_similarity)
            .await
    }

    /// Match a person mention without creating anything.
    pub async fn resolve_person(
        &self,
        owner_id: &str,
        name: &str,
        phone: Option<&str>,
        email: Option<&str>,
    ) -> Result<PersonResolution, SkippyError> {
        self.resolver.resolve(owner_id, name, phone, email).await
    }

    /// Merge `absorbed_id` into `survivor_id`, repointing their facts.
    pub async fn merge_person(
        &self,
        survivor_id: &str,
        absorbed_id: &str,
    ) -> Result<MergeOutcome, SkippyError> {
        self.resolver.merge(survivor_id, absorbed_id).await
    }
}
