// SPDX-FileCopyrightText: 2026 Skippy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Person importance: a stored score bumped on every mention and decayed
//! exponentially at read time. Nothing sweeps scores in the background.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, TransactionBehavior, params};
use tracing::debug;

use skippy_config::model::ImportanceConfig;
use skippy_core::SkippyError;
use skippy_storage::{Database, format_timestamp, map_tr_err, parse_timestamp};

use crate::resolver::{follow_absorbed, load_person};
use crate::types::{Person, PersonStatus};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// `score * 0.5^(elapsed_days / half_life_days)`.
///
/// A `now` earlier than `last_mentioned` counts as zero elapsed time.
pub fn decayed_score(
    score: f64,
    last_mentioned: DateTime<Utc>,
    now: DateTime<Utc>,
    half_life_days: f64,
) -> f64 {
    let elapsed_days = (now - last_mentioned).num_milliseconds().max(0) as f64 / MILLIS_PER_DAY;
    score * 0.5f64.powf(elapsed_days / half_life_days)
}

/// Record a mention of `person_id` at `now` on `conn`. The caller owns the
/// transaction.
///
/// The stored score grows by the configured increment (capped at
/// `max_score`), `mention_count` grows by one and `last_mentioned` becomes
/// `now`. An absorbed person's survivor is bumped instead.
pub fn bump_in(
    conn: &Connection,
    person_id: &str,
    now: DateTime<Utc>,
    config: &ImportanceConfig,
) -> rusqlite::Result<Result<Person, SkippyError>> {
    let mut person = match follow_absorbed(conn, person_id)? {
        Ok(p) if p.status == PersonStatus::Active => p,
        Ok(_) => {
            return Ok(Err(SkippyError::NotFound {
                entity: "person",
                id: person_id.to_string(),
            }));
        }
        Err(e) => return Ok(Err(e)),
    };

    let stamp = format_timestamp(now);
    person.importance_score =
        (person.importance_score + config.bump_increment).min(config.max_score);
    person.mention_count += 1;
    person.last_mentioned = stamp.clone();
    person.updated_at = stamp;

    conn.execute(
        "UPDATE people SET importance_score = ?1, mention_count = ?2, \
         last_mentioned = ?3, updated_at = ?4 WHERE id = ?5",
        params![
            person.importance_score,
            person.mention_count,
            person.last_mentioned,
            person.updated_at,
            person.id
        ],
    )?;
    Ok(Ok(person))
}

/// Bumps and decays person importance.
#[derive(Clone)]
pub struct ImportanceScorer {
    db: Database,
    config: ImportanceConfig,
}

impl ImportanceScorer {
    pub fn new(db: Database, config: ImportanceConfig) -> Self {
        Self { db, config }
    }

    pub fn config(&self) -> &ImportanceConfig {
        &self.config
    }

    /// Decayed importance of an already-loaded person at `now`.
    ///
    /// An unparseable `last_mentioned` is treated as "just mentioned".
    pub fn score_at(&self, person: &Person, now: DateTime<Utc>) -> f64 {
        match parse_timestamp(&person.last_mentioned) {
            Some(last) => decayed_score(
                person.importance_score,
                last,
                now,
                self.config.half_life_days,
            ),
            None => person.importance_score,
        }
    }

    /// Record a mention of `person_id` now.
    pub async fn bump(&self, person_id: &str) -> Result<Person, SkippyError> {
        self.bump_at(person_id, Utc::now()).await
    }

    /// Record a mention at `now` in its own transaction. See [`bump_in`].
    pub async fn bump_at(
        &self,
        person_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Person, SkippyError> {
        let requested = person_id.to_string();
        let config = self.config.clone();

        let person = self
            .db
            .connection()
            .call(move |conn| -> Result<Result<Person, SkippyError>, rusqlite::Error> {
                let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
                let bumped = bump_in(&tx, &requested, now, &config)?;
                if bumped.is_ok() {
                    tx.commit()?;
                }
                Ok(bumped)
            })
            .await
            .map_err(map_tr_err)??;

        debug!(
            person_id = %person.id,
            score = person.importance_score,
            mentions = person.mention_count,
            "importance bumped"
        );
        Ok(person)
    }

    /// Decayed importance of `person_id` at `now`.
    pub async fn decayed(&self, person_id: &str, now: DateTime<Utc>) -> Result<f64, SkippyError> {
        let id = person_id.to_string();
        let person = self
            .db
            .connection()
            .call(move |conn| load_person(conn, &id))
            .await
            .map_err(map_tr_err)?
            .ok_or_else(|| SkippyError::NotFound {
                entity: "person",
                id: person_id.to_string(),
            })?;
        Ok(self.score_at(&person, now))
    }
}
