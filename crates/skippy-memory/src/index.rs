// SPDX-FileCopyrightText: 2026 Skippy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Brute-force cosine similarity index over the `facts` table.
//!
//! The index borrows a connection (or an open transaction) so that the
//! nearest-neighbour read and the write that depends on it can share one
//! `BEGIN IMMEDIATE` transaction.

use rusqlite::{Connection, OptionalExtension, Row, params};
use skippy_core::FactCategory;
use tracing::warn;

use crate::types::{Fact, FactStatus, ScoredFact, blob_to_vec, cosine_similarity, vec_to_blob};

pub(crate) const FACT_COLUMNS: &str = "id, owner_id, text, embedding, confidence, \
     reinforcement_count, status, category, person_ref, conversation_id, created_at, updated_at";

pub(crate) fn row_to_fact(row: &Row<'_>) -> rusqlite::Result<Fact> {
    let blob: Vec<u8> = row.get(3)?;
    let status: String = row.get(6)?;
    let category: String = row.get(7)?;
    Ok(Fact {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        text: row.get(2)?,
        embedding: blob_to_vec(&blob),
        confidence: row.get(4)?,
        reinforcement_count: row.get(5)?,
        status: FactStatus::from_str_value(&status),
        category: FactCategory::from_str_value(&category),
        person_ref: row.get(8)?,
        conversation_id: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

pub(crate) fn load_fact(conn: &Connection, fact_id: &str) -> rusqlite::Result<Option<Fact>> {
    conn.query_row(
        &format!("SELECT {FACT_COLUMNS} FROM facts WHERE id = ?1"),
        params![fact_id],
        row_to_fact,
    )
    .optional()
}

/// Counters of a fact after reinforcement.
#[derive(Debug, Clone, PartialEq)]
pub struct Reinforced {
    pub confidence: f64,
    pub reinforcement_count: i64,
    pub person_ref: Option<String>,
}

/// Vector view of one owner's active facts.
pub struct SimilarityIndex<'c> {
    conn: &'c Connection,
}

impl<'c> SimilarityIndex<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// The `k` active facts of `owner_id` most similar to `query`, best first.
    pub fn nearest(
        &self,
        owner_id: &str,
        query: &[f32],
        k: usize,
    ) -> rusqlite::Result<Vec<ScoredFact>> {
        self.search(owner_id, query, k, f64::NEG_INFINITY)
    }

    /// Active facts of `owner_id` with similarity `>= min_similarity`.
    ///
    /// Ordered by similarity descending; ties go to the most recently
    /// updated fact.
    pub fn search(
        &self,
        owner_id: &str,
        query: &[f32],
        limit: usize,
        min_similarity: f64,
    ) -> rusqlite::Result<Vec<ScoredFact>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let mut stmt = self.conn.prepare(&format!(
            "SELECT {FACT_COLUMNS} FROM facts WHERE owner_id = ?1 AND status = 'active'"
        ))?;
        let facts = stmt
            .query_map(params![owner_id], row_to_fact)?
            .collect::<Result<Vec<_>, _>>()?;

        let mut scored: Vec<ScoredFact> = facts
            .into_iter()
            .filter_map(|fact| {
                if fact.embedding.len() != query.len() {
                    warn!(
                        fact_id = %fact.id,
                        stored = fact.embedding.len(),
                        query = query.len(),
                        "skipping fact with mismatched embedding dimension"
                    );
                    return None;
                }
                let similarity = cosine_similarity(query, &fact.embedding);
                (similarity >= min_similarity).then_some(ScoredFact { fact, similarity })
            })
            .collect();

        scored.sort_by(|a, b| {
            b.similarity
                .total_cmp(&a.similarity)
                .then_with(|| b.fact.updated_at.cmp(&a.fact.updated_at))
                .then_with(|| a.fact.id.cmp(&b.fact.id))
        });
        scored.truncate(limit);
        Ok(scored)
    }

    /// Store a new fact with its embedding.
    pub fn insert(&self, fact: &Fact) -> rusqlite::Result<()> {
        self.conn.execute(
            "INSERT INTO facts (id, owner_id, text, embedding, confidence, reinforcement_count, \
             status, category, person_ref, conversation_id, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                fact.id,
                fact.owner_id,
                fact.text,
                vec_to_blob(&fact.embedding),
                fact.confidence,
                fact.reinforcement_count,
                fact.status.as_str(),
                fact.category.as_str(),
                fact.person_ref,
                fact.conversation_id,
                fact.created_at,
                fact.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Count one restatement of `fact_id`.
    ///
    /// Confidence grows by `step` up to 1.0. `person_ref` only fills an
    /// empty link. Text and embedding are left untouched.
    pub fn reinforce(
        &self,
        fact_id: &str,
        step: f64,
        person_ref: Option<&str>,
        now: &str,
    ) -> rusqlite::Result<Reinforced> {
        self.conn.query_row(
            "UPDATE facts SET reinforcement_count = reinforcement_count + 1, \
             confidence = MIN(1.0, confidence + ?2), \
             person_ref = COALESCE(person_ref, ?3), \
             updated_at = ?4 \
             WHERE id = ?1 \
             RETURNING confidence, reinforcement_count, person_ref",
            params![fact_id, step, person_ref, now],
            |row| {
                Ok(Reinforced {
                    confidence: row.get(0)?,
                    reinforcement_count: row.get(1)?,
                    person_ref: row.get(2)?,
                })
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skippy_storage::Database;

    fn fact(id: &str, owner: &str, embedding: Vec<f32>, updated_at: &str) -> Fact {
        Fact {
            id: id.to_string(),
            owner_id: owner.to_string(),
            text: format!("fact {id}"),
            embedding,
            confidence: 0.5,
            reinforcement_count: 0,
            status: FactStatus::Active,
            category: FactCategory::Fact,
            person_ref: None,
            conversation_id: None,
            created_at: updated_at.to_string(),
            updated_at: updated_at.to_string(),
        }
    }

    async fn seeded() -> Database {
        let db = Database::open_in_memory().await.unwrap();
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                let index = SimilarityIndex::new(conn);
                index.insert(&fact("a", "nolan", vec![1.0, 0.0], "2026-01-01T00:00:00.000Z"))?;
                index.insert(&fact("b", "nolan", vec![0.6, 0.8], "2026-01-02T00:00:00.000Z"))?;
                index.insert(&fact("c", "nolan", vec![0.0, 1.0], "2026-01-03T00:00:00.000Z"))?;
                index.insert(&fact("d", "other", vec![1.0, 0.0], "2026-01-04T00:00:00.000Z"))?;
                index.insert(&fact("e", "nolan", vec![1.0, 0.0, 0.0], "2026-01-05T00:00:00.000Z"))?;
                Ok(())
            })
            .await
            .unwrap();
        db
    }

    #[tokio::test]
    async fn nearest_orders_by_similarity_within_owner() {
        let db = seeded().await;
        let ids = db
            .connection()
            .call(|conn| -> Result<Vec<String>, rusqlite::Error> {
                let hits = SimilarityIndex::new(conn).nearest("nolan", &[1.0, 0.0], 10)?;
                Ok(hits.into_iter().map(|h| h.fact.id).collect())
            })
            .await
            .unwrap();
        // "d" belongs to another owner, "e" has the wrong dimension.
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn search_applies_inclusive_floor_and_limit() {
        let db = seeded().await;
        let hits = db
            .connection()
            .call(|conn| SimilarityIndex::new(conn).search("nolan", &[1.0, 0.0], 10, 0.6))
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert!((hits[1].similarity - 0.6).abs() < 1e-6);

        let limited = db
            .connection()
            .call(|conn| SimilarityIndex::new(conn).search("nolan", &[1.0, 0.0], 1, 0.0))
            .await
            .unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].fact.id, "a");
    }

    #[tokio::test]
    async fn ties_go_to_most_recently_updated() {
        let db = Database::open_in_memory().await.unwrap();
        let ids = db
            .connection()
            .call(|conn| -> Result<Vec<String>, rusqlite::Error> {
                let index = SimilarityIndex::new(conn);
                index.insert(&fact("old", "nolan", vec![1.0, 0.0], "2026-01-01T00:00:00.000Z"))?;
                index.insert(&fact("new", "nolan", vec![2.0, 0.0], "2026-02-01T00:00:00.000Z"))?;
                let hits = index.nearest("nolan", &[1.0, 0.0], 2)?;
                Ok(hits.into_iter().map(|h| h.fact.id).collect())
            })
            .await
            .unwrap();
        assert_eq!(ids, vec!["new", "old"]);
    }

    #[tokio::test]
    async fn reinforce_caps_confidence_and_keeps_existing_person() {
        let db = seeded().await;
        let (first, second) = db
            .connection()
            .call(|conn| -> Result<(Reinforced, Reinforced), rusqlite::Error> {
                conn.execute(
                    "INSERT INTO people (id, owner_id, canonical_name, importance_score, \
                     last_mentioned, created_at, updated_at) \
                     VALUES ('p-1', 'nolan', 'Summer', 25.0, 'x', 'x', 'x'), \
                            ('p-2', 'nolan', 'Dan', 25.0, 'x', 'x', 'x')",
                    [],
                )?;
                let index = SimilarityIndex::new(conn);
                let first = index.reinforce("a", 0.7, Some("p-1"), "2026-03-01T00:00:00.000Z")?;
                let second = index.reinforce("a", 0.7, Some("p-2"), "2026-03-02T00:00:00.000Z")?;
                Ok((first, second))
            })
            .await
            .unwrap();
        assert!((first.confidence - 1.0).abs() < 1e-12);
        assert_eq!(first.reinforcement_count, 1);
        assert_eq!(second.reinforcement_count, 2);
        assert_eq!(second.person_ref.as_deref(), Some("p-1"));
    }
}
