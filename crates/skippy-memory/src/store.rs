// SPDX-FileCopyrightText: 2026 Skippy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed fact store with embedding dedup and reinforcement.
//!
//! An upsert embeds outside the database, then runs the nearest-neighbour
//! lookup and the insert-or-reinforce write inside one `BEGIN IMMEDIATE`
//! transaction on the single connection thread. Concurrent upserts of the
//! same fact are therefore linearized: the first inserts, the rest reinforce.

use std::sync::Arc;

use rusqlite::{Connection, TransactionBehavior, params};
use tracing::debug;
use uuid::Uuid;

use skippy_config::model::MemoryConfig;
use skippy_core::{EmbeddingAdapter, EmbeddingInput, SkippyError, recording};
use skippy_people::follow_absorbed;
use skippy_storage::{Database, map_tr_err, now_timestamp};

use crate::index::{FACT_COLUMNS, SimilarityIndex, load_fact, row_to_fact};
use crate::types::{Fact, FactDraft, FactStatus, FactUpsertResult, ScoredFact};

/// Reject vectors that must never be stored: wrong dimension, non-finite
/// components, or all zeros.
pub fn validate_embedding(embedding: &[f32], dimensions: usize) -> Result<(), SkippyError> {
    if embedding.len() != dimensions {
        return Err(SkippyError::embedding(format!(
            "expected {dimensions}-dimensional embedding, got {}",
            embedding.len()
        )));
    }
    if embedding.iter().any(|v| !v.is_finite()) {
        return Err(SkippyError::embedding("embedding contains non-finite values"));
    }
    if embedding.iter().all(|v| *v == 0.0) {
        return Err(SkippyError::embedding("embedding is a zero vector"));
    }
    Ok(())
}

/// Follow `absorbed_into` from `person_id` to the live person of `owner_id`.
fn live_person(
    conn: &Connection,
    owner_id: &str,
    person_id: &str,
) -> rusqlite::Result<Result<String, SkippyError>> {
    let person = match follow_absorbed(conn, person_id)? {
        Ok(p) => p,
        Err(e) => return Ok(Err(e)),
    };
    if person.owner_id != owner_id {
        return Ok(Err(SkippyError::InvalidInput(format!(
            "person {} does not belong to owner {owner_id}",
            person.id
        ))));
    }
    Ok(Ok(person.id))
}

/// Work run inside an upsert's transaction before the fact is written.
///
/// It returns the person the fact should point at plus a value handed back
/// to the caller once the transaction commits. An `Err` rolls back every
/// write it made.
pub(crate) type LinkResult<T> = rusqlite::Result<Result<(Option<String>, T), SkippyError>>;

/// Persistent store for facts.
pub struct MemoryStore {
    db: Database,
    embedder: Arc<dyn EmbeddingAdapter>,
    config: MemoryConfig,
}

impl MemoryStore {
    pub fn new(db: Database, embedder: Arc<dyn EmbeddingAdapter>, config: MemoryConfig) -> Self {
        Self {
            db,
            embedder,
            config,
        }
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    /// Embed one text and validate the vector.
    ///
    /// Every gateway failure surfaces as `EmbeddingUnavailable`.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, SkippyError> {
        let output = self
            .embedder
            .embed(EmbeddingInput {
                texts: vec![text.to_string()],
            })
            .await
            .map_err(|e| match e {
                e @ SkippyError::EmbeddingUnavailable { .. } => e,
                other => SkippyError::EmbeddingUnavailable {
                    message: format!("{} failed", self.embedder.name()),
                    source: Some(Box::new(other)),
                },
            })?;

        let embedding = output
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| SkippyError::embedding("gateway returned no vectors"))?;
        validate_embedding(&embedding, self.config.embedding_dimensions)?;
        Ok(embedding)
    }

    /// Store a fact, or reinforce the owner's closest existing fact when its
    /// similarity reaches the dedup threshold (inclusive).
    ///
    /// Nothing is written unless a valid embedding was obtained.
    pub async fn upsert(&self, draft: FactDraft) -> Result<FactUpsertResult, SkippyError> {
        let draft = self.prepare(draft)?;
        let embedding = self.embed(&draft.text).await?;
        self.write_unlinked(draft, embedding).await
    }

    /// [`upsert`](Self::upsert) with an embedding the caller already has.
    pub async fn upsert_embedded(
        &self,
        draft: FactDraft,
        embedding: Vec<f32>,
    ) -> Result<FactUpsertResult, SkippyError> {
        let draft = self.prepare(draft)?;
        validate_embedding(&embedding, self.config.embedding_dimensions)?;
        self.write_unlinked(draft, embedding).await
    }

    async fn write_unlinked(
        &self,
        draft: FactDraft,
        embedding: Vec<f32>,
    ) -> Result<FactUpsertResult, SkippyError> {
        let person_ref = draft.person_ref.clone();
        let (result, ()) = self
            .write(draft, embedding, move |_| Ok(Ok((person_ref, ()))))
            .await?;
        Ok(result)
    }

    /// Trim the text, check the owner and settle the confidence.
    pub(crate) fn prepare(&self, mut draft: FactDraft) -> Result<FactDraft, SkippyError> {
        draft.text = draft.text.trim().to_string();
        if draft.text.is_empty() {
            return Err(SkippyError::InvalidInput(
                "fact text must not be empty".to_string(),
            ));
        }
        if draft.owner_id.trim().is_empty() {
            return Err(SkippyError::InvalidInput(
                "owner id must not be empty".to_string(),
            ));
        }
        draft.confidence = Some(
            draft
                .confidence
                .filter(|c| c.is_finite())
                .unwrap_or(self.config.default_confidence)
                .clamp(0.0, 1.0),
        );
        Ok(draft)
    }

    /// Run `link`, then dedup-or-insert `draft`, all in one immediate
    /// transaction. `draft` must come from [`prepare`](Self::prepare) and
    /// `embedding` must be valid.
    pub(crate) async fn write<T, F>(
        &self,
        draft: FactDraft,
        embedding: Vec<f32>,
        link: F,
    ) -> Result<(FactUpsertResult, T), SkippyError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> LinkResult<T> + Send + 'static,
    {
        let threshold = self.config.dedup_threshold;
        let step = self.config.reinforce_step;
        let k = self.config.dedup_candidates.max(1);
        let confidence = draft.confidence.unwrap_or(self.config.default_confidence);
        let owner_id = draft.owner_id.clone();

        let (result, linked) = self
            .db
            .connection()
            .call(
                move |conn| -> Result<Result<(FactUpsertResult, T), SkippyError>, rusqlite::Error> {
                    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
                    let (requested, linked) = match link(&tx)? {
                        Ok(linked) => linked,
                        Err(e) => return Ok(Err(e)),
                    };
                    let person_ref = match requested.as_deref() {
                        Some(id) => match live_person(&tx, &draft.owner_id, id)? {
                            Ok(live) => Some(live),
                            Err(e) => return Ok(Err(e)),
                        },
                        None => None,
                    };
                    let now = now_timestamp();

                    let outcome = {
                        let index = SimilarityIndex::new(&tx);
                        let neighbours = index.nearest(&draft.owner_id, &embedding, k)?;
                        let top_similarity = neighbours.first().map(|n| n.similarity);

                        match neighbours.first() {
                            Some(best) if best.similarity >= threshold => {
                                let reinforced = index.reinforce(
                                    &best.fact.id,
                                    step,
                                    person_ref.as_deref(),
                                    &now,
                                )?;
                                FactUpsertResult {
                                    fact_id: best.fact.id.clone(),
                                    was_new: false,
                                    confidence: reinforced.confidence,
                                    reinforcement_count: reinforced.reinforcement_count,
                                    top_similarity,
                                    person_ref: reinforced.person_ref,
                                }
                            }
                            _ => {
                                let fact = Fact {
                                    id: Uuid::new_v4().to_string(),
                                    owner_id: draft.owner_id,
                                    text: draft.text,
                                    embedding,
                                    confidence,
                                    reinforcement_count: 0,
                                    status: FactStatus::Active,
                                    category: draft.category,
                                    person_ref,
                                    conversation_id: draft.conversation_id,
                                    created_at: now.clone(),
                                    updated_at: now,
                                };
                                index.insert(&fact)?;
                                FactUpsertResult {
                                    fact_id: fact.id,
                                    was_new: true,
                                    confidence: fact.confidence,
                                    reinforcement_count: 0,
                                    top_similarity,
                                    person_ref: fact.person_ref,
                                }
                            }
                        }
                    };
                    tx.commit()?;
                    Ok(Ok((outcome, linked)))
                },
            )
            .await
            .map_err(map_tr_err)??;

        recording::record_fact_upsert(result.was_new);
        debug!(
            owner_id = %owner_id,
            fact_id = %result.fact_id,
            was_new = result.was_new,
            similarity = ?result.top_similarity,
            reinforcement_count = result.reinforcement_count,
            "fact upserted"
        );
        Ok((result, linked))
    }

    /// Active facts of `owner_id` with similarity to `query` at or above
    /// `min_similarity`, best first, at most `limit`.
    pub async fn retrieve(
        &self,
        owner_id: &str,
        query: &str,
        limit: usize,
        min_similarity: f64,
    ) -> Result<Vec<ScoredFact>, SkippyError> {
        if limit == 0 || query.trim().is_empty() {
            return Ok(Vec::new());
        }
        let embedding = self.embed(query.trim()).await?;
        let owner = owner_id.to_string();

        let facts = self
            .db
            .connection()
            .call(move |conn| {
                SimilarityIndex::new(conn).search(&owner, &embedding, limit, min_similarity)
            })
            .await
            .map_err(map_tr_err)?;

        debug!(owner_id, hits = facts.len(), "facts retrieved");
        Ok(facts)
    }

    /// Fetch a fact by id, in any status.
    pub async fn get(&self, fact_id: &str) -> Result<Option<Fact>, SkippyError> {
        let id = fact_id.to_string();
        self.db
            .connection()
            .call(move |conn| load_fact(conn, &id))
            .await
            .map_err(map_tr_err)
    }

    /// Soft-delete a fact. Archiving an archived fact is a no-op.
    pub async fn archive(&self, fact_id: &str) -> Result<Fact, SkippyError> {
        let id = fact_id.to_string();
        self.db
            .connection()
            .call(move |conn| -> Result<Result<Fact, SkippyError>, rusqlite::Error> {
                let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
                tx.execute(
                    "UPDATE facts SET status = 'archived', updated_at = ?2 \
                     WHERE id = ?1 AND status = 'active'",
                    params![id, now_timestamp()],
                )?;
                let fact = load_fact(&tx, &id)?;
                tx.commit()?;
                Ok(fact.ok_or(SkippyError::NotFound { entity: "fact", id }))
            })
            .await
            .map_err(map_tr_err)?
    }

    /// Point a fact at a person, replacing any existing link.
    ///
    /// An absorbed person is followed to its survivor.
    pub async fn link_person(&self, fact_id: &str, person_id: &str) -> Result<Fact, SkippyError> {
        let id = fact_id.to_string();
        let person = person_id.to_string();
        self.db
            .connection()
            .call(move |conn| -> Result<Result<Fact, SkippyError>, rusqlite::Error> {
                let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
                let Some(fact) = load_fact(&tx, &id)? else {
                    return Ok(Err(SkippyError::NotFound { entity: "fact", id }));
                };
                let live = match live_person(&tx, &fact.owner_id, &person)? {
                    Ok(live) => live,
                    Err(e) => return Ok(Err(e)),
                };
                tx.execute(
                    "UPDATE facts SET person_ref = ?2, updated_at = ?3 WHERE id = ?1",
                    params![id, live, now_timestamp()],
                )?;
                let updated = load_fact(&tx, &id)?;
                tx.commit()?;
                Ok(updated.ok_or(SkippyError::NotFound { entity: "fact", id }))
            })
            .await
            .map_err(map_tr_err)?
    }

    /// Clear a fact's person link.
    pub async fn unlink_person(&self, fact_id: &str) -> Result<Fact, SkippyError> {
        let id = fact_id.to_string();
        self.db
            .connection()
            .call(move |conn| -> Result<Result<Fact, SkippyError>, rusqlite::Error> {
                let changed = conn.execute(
                    "UPDATE facts SET person_ref = NULL, updated_at = ?2 WHERE id = ?1",
                    params![id, now_timestamp()],
                )?;
                if changed == 0 {
                    return Ok(Err(SkippyError::NotFound { entity: "fact", id }));
                }
                Ok(load_fact(conn, &id)?.ok_or(SkippyError::NotFound { entity: "fact", id }))
            })
            .await
            .map_err(map_tr_err)?
    }

    /// Active facts about a person: `person` facts first, then `family`,
    /// then the rest; confidence and recency descending within each group.
    pub async fn facts_for_person(
        &self,
        owner_id: &str,
        person_id: &str,
        limit: usize,
    ) -> Result<Vec<Fact>, SkippyError> {
        let owner = owner_id.to_string();
        let person = person_id.to_string();
        self.db
            .connection()
            .call(move |conn| -> Result<Vec<Fact>, rusqlite::Error> {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {FACT_COLUMNS} FROM facts \
                     WHERE owner_id = ?1 AND person_ref = ?2 AND status = 'active' \
                     ORDER BY CASE category WHEN 'person' THEN 0 WHEN 'family' THEN 1 ELSE 2 END, \
                     confidence DESC, created_at DESC, rowid DESC \
                     LIMIT ?3"
                ))?;
                let facts = stmt
                    .query_map(params![owner, person, limit as i64], row_to_fact)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(facts)
            })
            .await
            .map_err(map_tr_err)
    }

    /// Number of active facts stored for `owner_id`.
    pub async fn active_count(&self, owner_id: &str) -> Result<usize, SkippyError> {
        let owner = owner_id.to_string();
        let count = self
            .db
            .connection()
            .call(move |conn| -> Result<i64, rusqlite::Error> {
                conn.query_row(
                    "SELECT COUNT(*) FROM facts WHERE owner_id = ?1 AND status = 'active'",
                    params![owner],
                    |row| row.get(0),
                )
            })
            .await
            .map_err(map_tr_err)?;
        Ok(count.max(0) as usize)
    }
}
