// SPDX-FileCopyrightText: 2026 Skippy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identity resolution and person lifecycle.
//!
//! A mention is matched against the owner's active people through a tier
//! cascade (phone, email, exact name, fuzzy name); the first tier that
//! qualifies wins. Merges fold one person into another inside a single
//! immediate transaction and repoint the absorbed person's facts.

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, TransactionBehavior, params};
use tracing::{debug, info};

use skippy_config::model::{AmbiguousPolicy, IdentityConfig, ImportanceConfig};
use skippy_core::{PersonMention, SkippyError, recording};
use skippy_storage::{Database, map_tr_err, now_timestamp};

use crate::fuzzy::{normalize_email, normalize_name, normalize_phone, token_set_ratio};
use crate::importance::ImportanceScorer;
use crate::types::{
    DuplicateCluster, DuplicateLink, DuplicateReason, MatchTier, MergeOutcome, Person,
    PersonResolution, PersonStatus, RankedPerson,
};

/// Phone or email values shorter than this never count as shared.
const MIN_CONTACT_LEN: usize = 4;

pub(crate) const PERSON_COLUMNS: &str = "id, owner_id, canonical_name, aliases, merged_from, \
     phone, email, importance_score, last_mentioned, mention_count, status, absorbed_into, \
     created_at, updated_at";

fn json_list(row: &rusqlite::Row, idx: usize) -> Result<Vec<String>, rusqlite::Error> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn to_json(list: &[String]) -> Result<String, rusqlite::Error> {
    serde_json::to_string(list).map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}

pub(crate) fn row_to_person(row: &rusqlite::Row) -> Result<Person, rusqlite::Error> {
    let status: String = row.get(10)?;
    Ok(Person {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        canonical_name: row.get(2)?,
        aliases: json_list(row, 3)?,
        merged_from: json_list(row, 4)?,
        phone: row.get(5)?,
        email: row.get(6)?,
        importance_score: row.get(7)?,
        last_mentioned: row.get(8)?,
        mention_count: row.get(9)?,
        status: PersonStatus::from_str_value(&status).unwrap_or(PersonStatus::Active),
        absorbed_into: row.get(11)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

pub(crate) fn load_person(
    conn: &rusqlite::Connection,
    id: &str,
) -> Result<Option<Person>, rusqlite::Error> {
    conn.query_row(
        &format!("SELECT {PERSON_COLUMNS} FROM people WHERE id = ?1"),
        params![id],
        row_to_person,
    )
    .optional()
}

/// `absorbed_into` redirects followed before a chain counts as broken.
pub const MAX_REDIRECTS: usize = 16;

/// Follow `absorbed_into` from `person_id` to the first person that was not
/// merged away. At most [`MAX_REDIRECTS`] hops are followed.
pub fn follow_absorbed(
    conn: &rusqlite::Connection,
    person_id: &str,
) -> rusqlite::Result<Result<Person, SkippyError>> {
    let mut current = person_id.to_string();
    for _ in 0..=MAX_REDIRECTS {
        match load_person(conn, &current)? {
            Some(Person {
                status: PersonStatus::Absorbed,
                absorbed_into: Some(next),
                ..
            }) => current = next,
            Some(person) => return Ok(Ok(person)),
            None => {
                return Ok(Err(SkippyError::NotFound {
                    entity: "person",
                    id: current,
                }));
            }
        }
    }
    Ok(Err(SkippyError::Internal(format!(
        "absorbed_into chain from {person_id} exceeds {MAX_REDIRECTS} hops"
    ))))
}

/// Active people of an owner, oldest first.
fn load_active_people(
    conn: &rusqlite::Connection,
    owner_id: &str,
) -> Result<Vec<Person>, rusqlite::Error> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PERSON_COLUMNS} FROM people WHERE owner_id = ?1 AND status = 'active' \
         ORDER BY created_at ASC, rowid ASC"
    ))?;
    let rows = stmt.query_map(params![owner_id], row_to_person)?;
    rows.collect()
}

fn insert_person(conn: &rusqlite::Connection, person: &Person) -> Result<(), rusqlite::Error> {
    conn.execute(
        &format!(
            "INSERT INTO people ({PERSON_COLUMNS}) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)"
        ),
        params![
            person.id,
            person.owner_id,
            person.canonical_name,
            to_json(&person.aliases)?,
            to_json(&person.merged_from)?,
            person.phone,
            person.email,
            person.importance_score,
            person.last_mentioned,
            person.mention_count,
            person.status.as_str(),
            person.absorbed_into,
            person.created_at,
            person.updated_at,
        ],
    )?;
    Ok(())
}

/// Persist every mutable column of an existing person.
fn update_person(conn: &rusqlite::Connection, person: &Person) -> Result<(), rusqlite::Error> {
    conn.execute(
        "UPDATE people SET canonical_name = ?1, aliases = ?2, merged_from = ?3, phone = ?4, \
         email = ?5, importance_score = ?6, last_mentioned = ?7, mention_count = ?8, \
         status = ?9, absorbed_into = ?10, updated_at = ?11 WHERE id = ?12",
        params![
            person.canonical_name,
            to_json(&person.aliases)?,
            to_json(&person.merged_from)?,
            person.phone,
            person.email,
            person.importance_score,
            person.last_mentioned,
            person.mention_count,
            person.status.as_str(),
            person.absorbed_into,
            person.updated_at,
            person.id,
        ],
    )?;
    Ok(())
}

/// Add `name` to `aliases` unless it equals the canonical name or an
/// existing alias (case- and whitespace-insensitive).
fn push_alias(aliases: &mut Vec<String>, canonical_name: &str, name: &str) -> bool {
    let key = normalize_name(name);
    if key.is_empty()
        || key == normalize_name(canonical_name)
        || aliases.iter().any(|a| normalize_name(a) == key)
    {
        return false;
    }
    aliases.push(name.trim().to_string());
    true
}

fn push_unique(ids: &mut Vec<String>, id: &str) {
    if !ids.iter().any(|existing| existing == id) {
        ids.push(id.to_string());
    }
}

/// Match a mention against `people` (active, oldest first).
///
/// Tiers are tried strongest first: normalized phone, email, exact name or
/// alias, then the best token-set score against any name. Equal scores go to
/// the oldest person.
pub fn classify(
    people: &[Person],
    name: &str,
    phone: Option<&str>,
    email: Option<&str>,
    config: &IdentityConfig,
) -> PersonResolution {
    let exact = |person: &Person, tier: MatchTier| PersonResolution {
        person_id: Some(person.id.clone()),
        tier,
        match_score: 100.0,
        matched_name: Some(person.canonical_name.clone()),
    };

    let phone = phone.map(normalize_phone).filter(|p| !p.is_empty());
    if let Some(phone) = &phone
        && let Some(person) = people
            .iter()
            .find(|p| p.phone.as_deref().map(normalize_phone).as_ref() == Some(phone))
    {
        return exact(person, MatchTier::ExactPhone);
    }

    let email = email.map(normalize_email).filter(|e| !e.is_empty());
    if let Some(email) = &email
        && let Some(person) = people
            .iter()
            .find(|p| p.email.as_deref().map(normalize_email).as_ref() == Some(email))
    {
        return exact(person, MatchTier::ExactEmail);
    }

    let wanted = normalize_name(name);
    if wanted.is_empty() {
        return PersonResolution::no_match(0.0);
    }

    for person in people {
        if let Some(hit) = person.names().find(|n| normalize_name(n) == wanted) {
            return PersonResolution {
                person_id: Some(person.id.clone()),
                tier: MatchTier::ExactName,
                match_score: 100.0,
                matched_name: Some(hit.to_string()),
            };
        }
    }

    let mut best: Option<(&Person, &str, f64)> = None;
    for person in people {
        for candidate in person.names() {
            let score = token_set_ratio(name, candidate);
            if best.is_none_or(|(_, _, top)| score > top) {
                best = Some((person, candidate, score));
            }
        }
    }

    match best {
        Some((person, matched, score)) if score >= config.fuzzy_low_threshold => {
            let tier = if score >= config.fuzzy_high_threshold {
                MatchTier::FuzzyHigh
            } else {
                MatchTier::FuzzyLow
            };
            PersonResolution {
                person_id: Some(person.id.clone()),
                tier,
                match_score: score,
                matched_name: Some(matched.to_string()),
            }
        }
        Some((_, _, score)) => PersonResolution::no_match(score),
        None => PersonResolution::no_match(0.0),
    }
}

/// Fold `absorbed` into `survivor` in memory.
///
/// Names and ids are unioned, mention counts summed, missing contact details
/// filled, and the survivor's score set to `max(a, b) + merge_bonus`.
pub fn fold_into(survivor: &mut Person, absorbed: &Person, config: &ImportanceConfig, now: &str) {
    let canonical = survivor.canonical_name.clone();
    for name in absorbed.names() {
        push_alias(&mut survivor.aliases, &canonical, name);
    }
    for id in std::iter::once(&absorbed.id).chain(absorbed.merged_from.iter()) {
        push_unique(&mut survivor.merged_from, id);
    }
    if survivor.phone.is_none() {
        survivor.phone = absorbed.phone.clone();
    }
    if survivor.email.is_none() {
        survivor.email = absorbed.email.clone();
    }
    survivor.importance_score = (survivor.importance_score.max(absorbed.importance_score)
        + config.merge_bonus)
        .min(config.max_score);
    survivor.mention_count += absorbed.mention_count;
    if absorbed.last_mentioned > survivor.last_mentioned {
        survivor.last_mentioned = absorbed.last_mentioned.clone();
    }
    survivor.updated_at = now.to_string();
}

/// Load a person that may take part in a merge: it must exist and be active.
fn load_mergeable(
    conn: &rusqlite::Connection,
    id: &str,
) -> Result<Result<Person, SkippyError>, rusqlite::Error> {
    Ok(match load_person(conn, id)? {
        Some(p) if p.status == PersonStatus::Absorbed => Err(SkippyError::MergeConflict {
            reason: format!(
                "person {id} was already merged into {}",
                p.absorbed_into.as_deref().unwrap_or("another person")
            ),
        }),
        Some(p) => Ok(p),
        None => Err(SkippyError::NotFound {
            entity: "person",
            id: id.to_string(),
        }),
    })
}

fn new_person(
    owner_id: &str,
    name: &str,
    phone: Option<&str>,
    email: Option<&str>,
    baseline_score: f64,
) -> Person {
    let now = now_timestamp();
    Person {
        id: uuid::Uuid::new_v4().to_string(),
        owner_id: owner_id.to_string(),
        canonical_name: name.trim().to_string(),
        aliases: Vec::new(),
        merged_from: Vec::new(),
        phone: phone.map(str::trim).filter(|p| !p.is_empty()).map(str::to_string),
        email: email.map(normalize_email).filter(|e| !e.is_empty()),
        importance_score: baseline_score,
        last_mentioned: now.clone(),
        mention_count: 1,
        status: PersonStatus::Active,
        absorbed_into: None,
        created_at: now.clone(),
        updated_at: now,
    }
}

/// The person a mention was attached to, after policy was applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMention {
    pub resolution: PersonResolution,
    /// Person to link the fact to, if any.
    pub person_id: Option<String>,
    /// Whether `person_id` was created by this call.
    pub created: bool,
}

/// Resolve a mention against `owner_id`'s people on `conn` and create a
/// person when nothing matches. The caller owns the transaction.
///
/// A `fuzzy_high` link records the mention's spelling as an alias of the
/// matched person, so the next mention resolves by exact name.
pub fn resolve_or_create_in(
    conn: &rusqlite::Connection,
    owner_id: &str,
    mention: &PersonMention,
    policy: AmbiguousPolicy,
    config: &IdentityConfig,
    baseline_score: f64,
) -> rusqlite::Result<ResolvedMention> {
    let people = load_active_people(conn, owner_id)?;
    let resolution = classify(
        &people,
        &mention.name,
        mention.phone.as_deref(),
        mention.email.as_deref(),
        config,
    );

    let create = match resolution.tier {
        MatchTier::NoMatch => !normalize_name(&mention.name).is_empty(),
        MatchTier::FuzzyLow => policy == AmbiguousPolicy::Create,
        _ => false,
    };
    if create {
        let person = new_person(
            owner_id,
            &mention.name,
            mention.phone.as_deref(),
            mention.email.as_deref(),
            baseline_score,
        );
        insert_person(conn, &person)?;
        return Ok(ResolvedMention {
            resolution,
            person_id: Some(person.id),
            created: true,
        });
    }

    let person_id = match resolution.tier {
        MatchTier::FuzzyLow if policy == AmbiguousPolicy::Link => resolution.person_id.clone(),
        _ => resolution.linked_person().map(str::to_string),
    };

    if resolution.tier == MatchTier::FuzzyHigh
        && let Some(id) = person_id.as_deref()
        && let Some(mut person) = people.into_iter().find(|p| p.id == id)
    {
        let canonical = person.canonical_name.clone();
        if push_alias(&mut person.aliases, &canonical, &mention.name) {
            person.updated_at = now_timestamp();
            update_person(conn, &person)?;
            debug!(person_id = %person.id, alias = %mention.name.trim(), "alias learned");
        }
    }

    Ok(ResolvedMention {
        resolution,
        person_id,
        created: false,
    })
}

/// Resolves person mentions and owns the person lifecycle.
#[derive(Clone)]
pub struct IdentityResolver {
    db: Database,
    config: IdentityConfig,
    importance: ImportanceConfig,
}

impl IdentityResolver {
    pub fn new(db: Database, config: IdentityConfig, importance: ImportanceConfig) -> Self {
        Self {
            db,
            config,
            importance,
        }
    }

    pub fn config(&self) -> &IdentityConfig {
        &self.config
    }

    /// Match a mention against the owner's active people. Never writes.
    pub async fn resolve(
        &self,
        owner_id: &str,
        name: &str,
        phone: Option<&str>,
        email: Option<&str>,
    ) -> Result<PersonResolution, SkippyError> {
        let owner = owner_id.to_string();
        let people = self
            .db
            .connection()
            .call(move |conn| load_active_people(conn, &owner))
            .await
            .map_err(map_tr_err)?;

        let resolution = classify(&people, name, phone, email, &self.config);
        debug!(
            owner_id,
            name,
            tier = %resolution.tier,
            score = resolution.match_score,
            "person resolved"
        );
        Ok(resolution)
    }

    /// Resolve a mention and create a person when nothing matches, in one
    /// transaction so concurrent first mentions of a name create one person.
    ///
    /// `fuzzy_low` suggestions follow `policy`. See [`resolve_or_create_in`].
    pub async fn resolve_or_create(
        &self,
        owner_id: &str,
        mention: &PersonMention,
        policy: AmbiguousPolicy,
    ) -> Result<ResolvedMention, SkippyError> {
        let owner = owner_id.to_string();
        let candidate = mention.clone();
        let config = self.config.clone();
        let baseline = self.importance.baseline_score;

        let resolved = self
            .db
            .connection()
            .call(move |conn| -> Result<ResolvedMention, rusqlite::Error> {
                let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
                let resolved =
                    resolve_or_create_in(&tx, &owner, &candidate, policy, &config, baseline)?;
                tx.commit()?;
                Ok(resolved)
            })
            .await
            .map_err(map_tr_err)?;

        if resolved.created {
            recording::record_person_created();
            info!(owner_id, name = %mention.name, person_id = ?resolved.person_id, "person created");
        }
        Ok(resolved)
    }

    /// Create a person with baseline importance and one mention.
    pub async fn create_person(
        &self,
        owner_id: &str,
        name: &str,
        phone: Option<&str>,
        email: Option<&str>,
    ) -> Result<Person, SkippyError> {
        if name.trim().is_empty() {
            return Err(SkippyError::InvalidInput(
                "canonical name must not be empty".to_string(),
            ));
        }
        let person = new_person(owner_id, name, phone, email, self.importance.baseline_score);
        let row = person.clone();
        self.db
            .connection()
            .call(move |conn| insert_person(conn, &row))
            .await
            .map_err(map_tr_err)?;

        recording::record_person_created();
        info!(owner_id, person_id = %person.id, name = %person.canonical_name, "person created");
        Ok(person)
    }

    /// Fetch a person by id, including absorbed ones.
    pub async fn get(&self, person_id: &str) -> Result<Option<Person>, SkippyError> {
        let id = person_id.to_string();
        self.db
            .connection()
            .call(move |conn| load_person(conn, &id))
            .await
            .map_err(map_tr_err)
    }

    /// Merge `absorbed_id` into `survivor_id`.
    ///
    /// All-or-nothing: the survivor absorbs names, ids, counts and contact
    /// details, every fact pointing at the absorbed person is repointed, and
    /// the absorbed row is marked `absorbed` (never deleted).
    pub async fn merge(
        &self,
        survivor_id: &str,
        absorbed_id: &str,
    ) -> Result<MergeOutcome, SkippyError> {
        if survivor_id == absorbed_id {
            return Err(SkippyError::MergeConflict {
                reason: format!("cannot merge person {survivor_id} into itself"),
            });
        }

        let survivor_id = survivor_id.to_string();
        let absorbed_id = absorbed_id.to_string();
        let config = self.importance.clone();

        let outcome = self
            .db
            .connection()
            .call(
                move |conn| -> Result<Result<MergeOutcome, SkippyError>, rusqlite::Error> {
                    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

                    let mut survivor = match load_mergeable(&tx, &survivor_id)? {
                        Ok(p) => p,
                        Err(e) => return Ok(Err(e)),
                    };
                    let absorbed = match load_mergeable(&tx, &absorbed_id)? {
                        Ok(p) => p,
                        Err(e) => return Ok(Err(e)),
                    };

                    if survivor.owner_id != absorbed.owner_id {
                        return Ok(Err(SkippyError::MergeConflict {
                            reason: "people belong to different owners".to_string(),
                        }));
                    }

                    let now = now_timestamp();
                    fold_into(&mut survivor, &absorbed, &config, &now);
                    update_person(&tx, &survivor)?;

                    let facts_repointed = tx.execute(
                        "UPDATE facts SET person_ref = ?1, updated_at = ?3 WHERE person_ref = ?2",
                        params![survivor.id, absorbed.id, now],
                    )?;
                    tx.execute(
                        "UPDATE people SET absorbed_into = ?1, updated_at = ?3 \
                         WHERE absorbed_into = ?2",
                        params![survivor.id, absorbed.id, now],
                    )?;
                    tx.execute(
                        "UPDATE people SET status = 'absorbed', absorbed_into = ?1, \
                         updated_at = ?3 WHERE id = ?2",
                        params![survivor.id, absorbed.id, now],
                    )?;
                    tx.commit()?;

                    Ok(Ok(MergeOutcome {
                        survivor,
                        absorbed_id: absorbed.id,
                        facts_repointed,
                    }))
                },
            )
            .await
            .map_err(map_tr_err)??;

        recording::record_person_merged();
        info!(
            survivor_id = %outcome.survivor.id,
            absorbed_id = %outcome.absorbed_id,
            facts_repointed = outcome.facts_repointed,
            "people merged"
        );
        Ok(outcome)
    }

    /// Add an alias to an active person. Duplicates are ignored.
    pub async fn add_alias(&self, person_id: &str, alias: &str) -> Result<Person, SkippyError> {
        if alias.trim().is_empty() {
            return Err(SkippyError::InvalidInput("alias must not be empty".to_string()));
        }
        let alias = alias.to_string();
        self.edit_active(person_id, move |person| {
            let canonical = person.canonical_name.clone();
            push_alias(&mut person.aliases, &canonical, &alias);
        })
        .await
    }

    /// Remove an alias (case-insensitive). Removing an absent alias is a no-op.
    pub async fn remove_alias(&self, person_id: &str, alias: &str) -> Result<Person, SkippyError> {
        let key = normalize_name(alias);
        self.edit_active(person_id, move |person| {
            person.aliases.retain(|a| normalize_name(a) != key);
        })
        .await
    }

    async fn edit_active<F>(&self, person_id: &str, edit: F) -> Result<Person, SkippyError>
    where
        F: FnOnce(&mut Person) + Send + 'static,
    {
        let id = person_id.to_string();
        self.db
            .connection()
            .call(move |conn| -> Result<Result<Person, SkippyError>, rusqlite::Error> {
                let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
                let mut person = match load_person(&tx, &id)? {
                    Some(p) if p.status == PersonStatus::Active => p,
                    Some(p) => {
                        return Ok(Err(SkippyError::InvalidInput(format!(
                            "person {id} was merged into {}",
                            p.absorbed_into.as_deref().unwrap_or("another person")
                        ))));
                    }
                    None => {
                        return Ok(Err(SkippyError::NotFound {
                            entity: "person",
                            id,
                        }));
                    }
                };
                edit(&mut person);
                person.updated_at = now_timestamp();
                update_person(&tx, &person)?;
                tx.commit()?;
                Ok(Ok(person))
            })
            .await
            .map_err(map_tr_err)?
    }

    /// Group the owner's active people that look like the same individual:
    /// a shared phone number or email, or canonical names scoring at least
    /// `threshold` on token-set similarity.
    pub async fn find_duplicates(
        &self,
        owner_id: &str,
        threshold: f64,
    ) -> Result<Vec<DuplicateCluster>, SkippyError> {
        let owner = owner_id.to_string();
        let people = self
            .db
            .connection()
            .call(move |conn| load_active_people(conn, &owner))
            .await
            .map_err(map_tr_err)?;
        Ok(cluster_duplicates(people, threshold))
    }

    /// Active people ordered by importance decayed to `now`, highest first.
    pub async fn list_people(
        &self,
        owner_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<RankedPerson>, SkippyError> {
        let owner = owner_id.to_string();
        let people = self
            .db
            .connection()
            .call(move |conn| load_active_people(conn, &owner))
            .await
            .map_err(map_tr_err)?;

        let scorer = ImportanceScorer::new(self.db.clone(), self.importance.clone());
        let mut ranked: Vec<RankedPerson> = people
            .into_iter()
            .map(|person| RankedPerson {
                decayed_score: scorer.score_at(&person, now),
                person,
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.decayed_score
                .total_cmp(&a.decayed_score)
                .then_with(|| a.person.canonical_name.cmp(&b.person.canonical_name))
        });
        Ok(ranked)
    }
}

fn duplicate_reason(a: &Person, b: &Person, threshold: f64) -> Option<DuplicateReason> {
    let contact = |value: &Option<String>, normalize: fn(&str) -> String| {
        value
            .as_deref()
            .map(normalize)
            .filter(|v| v.len() >= MIN_CONTACT_LEN)
    };

    if let Some(phone) = contact(&a.phone, normalize_phone)
        && contact(&b.phone, normalize_phone).as_ref() == Some(&phone)
    {
        return Some(DuplicateReason::SharedPhone);
    }
    if let Some(email) = contact(&a.email, normalize_email)
        && contact(&b.email, normalize_email).as_ref() == Some(&email)
    {
        return Some(DuplicateReason::SharedEmail);
    }
    let score = token_set_ratio(&a.canonical_name, &b.canonical_name);
    (score >= threshold).then_some(DuplicateReason::SimilarName { score })
}

fn find_root(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

/// Union pairwise duplicate links into clusters. `people` must be oldest first.
fn cluster_duplicates(people: Vec<Person>, threshold: f64) -> Vec<DuplicateCluster> {
    let mut parent: Vec<usize> = (0..people.len()).collect();
    let mut links = Vec::new();

    for i in 0..people.len() {
        for j in (i + 1)..people.len() {
            if let Some(reason) = duplicate_reason(&people[i], &people[j], threshold) {
                links.push((i, j, reason));
                let (ri, rj) = (find_root(&mut parent, i), find_root(&mut parent, j));
                if ri != rj {
                    parent[rj.max(ri)] = ri.min(rj);
                }
            }
        }
    }

    let mut clusters: Vec<(usize, Vec<usize>, Vec<DuplicateLink>)> = Vec::new();
    for i in 0..people.len() {
        let root = find_root(&mut parent, i);
        match clusters.iter_mut().find(|(r, _, _)| *r == root) {
            Some((_, members, _)) => members.push(i),
            None => clusters.push((root, vec![i], Vec::new())),
        }
    }
    for (i, j, reason) in links {
        let root = find_root(&mut parent, i);
        if let Some((_, _, cluster_links)) = clusters.iter_mut().find(|(r, _, _)| *r == root) {
            cluster_links.push(DuplicateLink {
                a: people[i].id.clone(),
                b: people[j].id.clone(),
                reason,
            });
        }
    }

    clusters
        .into_iter()
        .filter(|(_, members, _)| members.len() > 1)
        .map(|(_, members, links)| DuplicateCluster {
            people: members.into_iter().map(|i| people[i].clone()).collect(),
            links,
        })
        .collect()
}
