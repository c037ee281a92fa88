// SPDX-FileCopyrightText: 2026 Skippy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turn evaluation: extract candidate facts, attach people, upsert.
//!
//! Extraction itself is delegated to a [`FactExtractor`]. For LLM-backed
//! extractors, [`parse_evaluation_response`] turns the model's JSON answer
//! into candidate facts and [`LlmExtractor`] wires the two together.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::Connection;
use serde::Deserialize;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use skippy_config::model::{AmbiguousPolicy, EvaluatorConfig, IdentityConfig, ImportanceConfig};
use skippy_core::{
    AdapterType, CandidateFact, ConversationTurn, FactCategory, FactExtractor, HealthStatus,
    PersonMention, PluginAdapter, SkippyError, recording,
};
use skippy_people::{
    IdentityResolver, ImportanceScorer, MatchTier, ResolvedMention, bump_in, resolve_or_create_in,
};

use crate::store::{LinkResult, MemoryStore};
use crate::types::{FactDraft, FactUpsertResult};

/// Characters of user text kept in failure logs.
const LOG_TEXT_CHARS: usize = 80;

/// Confidence assumed when a model answer omits one.
const DEFAULT_EXTRACTED_CONFIDENCE: f64 = 0.5;

#[derive(Debug, Deserialize)]
struct EvaluationEntry {
    #[serde(default)]
    should_store: bool,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    extracted_fact: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    person: Option<PersonField>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PersonField {
    Name(String),
    Mention(PersonMention),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EvaluationPayload {
    Many(Vec<EvaluationEntry>),
    One(EvaluationEntry),
}

/// Slice from the first `{` or `[` to the last matching closer.
fn json_slice(s: &str) -> Option<&str> {
    let start = s.find(['{', '['])?;
    let close = if s[start..].starts_with('[') { ']' } else { '}' };
    let end = s.rfind(close)?;
    (end > start).then(|| &s[start..=end])
}

/// Parse a model's evaluation answer into candidate facts.
///
/// Accepts a single object or an array of objects of the shape
/// `{should_store, reason, extracted_fact, category, confidence, person?}`,
/// optionally wrapped in a fenced code block or surrounding prose. Entries
/// that decline storage or carry no fact are dropped. Malformed input yields
/// an empty list.
pub fn parse_evaluation_response(response: &str) -> Vec<CandidateFact> {
    let Some(json_str) = json_slice(response.trim()) else {
        debug!("evaluation response contains no JSON");
        return Vec::new();
    };

    let entries = match serde_json::from_str::<EvaluationPayload>(json_str) {
        Ok(EvaluationPayload::Many(entries)) => entries,
        Ok(EvaluationPayload::One(entry)) => vec![entry],
        Err(e) => {
            warn!("Failed to parse evaluation response: {e}");
            debug!("Raw response: {response}");
            return Vec::new();
        }
    };

    entries
        .into_iter()
        .filter_map(|entry| {
            let text = entry
                .extracted_fact
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())?;
            if !entry.should_store {
                debug!(reason = ?entry.reason, "evaluation declined storage");
                return None;
            }
            let person = match entry.person {
                Some(PersonField::Name(name)) => Some(PersonMention {
                    name,
                    phone: None,
                    email: None,
                }),
                Some(PersonField::Mention(mention)) => Some(mention),
                None => None,
            }
            .filter(|p| !p.name.trim().is_empty());

            Some(CandidateFact {
                text: text.to_string(),
                category: entry
                    .category
                    .as_deref()
                    .map(FactCategory::from_str_value)
                    .unwrap_or_default(),
                confidence: entry
                    .confidence
                    .filter(|c| c.is_finite())
                    .unwrap_or(DEFAULT_EXTRACTED_CONFIDENCE)
                    .clamp(0.0, 1.0),
                person,
            })
        })
        .collect()
}

/// Produces the raw evaluation answer for a turn, usually by calling an LLM.
#[async_trait]
pub trait CompletionBackend: Send + Sync + 'static {
    async fn complete(&self, turn: &ConversationTurn) -> Result<String, SkippyError>;
}

/// [`FactExtractor`] that parses a [`CompletionBackend`]'s JSON answer.
pub struct LlmExtractor {
    backend: Arc<dyn CompletionBackend>,
}

impl LlmExtractor {
    pub fn new(backend: Arc<dyn CompletionBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl PluginAdapter for LlmExtractor {
    fn name(&self) -> &str {
        "llm-extractor"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Extraction
    }

    async fn health_check(&self) -> Result<HealthStatus, SkippyError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), SkippyError> {
        Ok(())
    }
}

#[async_trait]
impl FactExtractor for LlmExtractor {
    async fn extract(&self, turn: &ConversationTurn) -> Result<Vec<CandidateFact>, SkippyError> {
        let response = self.backend.complete(turn).await?;
        Ok(parse_evaluation_response(&response))
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

/// Resolve-or-create the mentioned person and bump an existing one, on the
/// upsert's connection.
fn person_link(
    owner_id: String,
    mention: Option<PersonMention>,
    policy: AmbiguousPolicy,
    identity: IdentityConfig,
    importance: ImportanceConfig,
) -> impl FnOnce(&Connection) -> LinkResult<Option<ResolvedMention>> + Send + 'static {
    move |conn| {
        let Some(mention) = mention else {
            return Ok(Ok((None, None)));
        };
        let resolved = resolve_or_create_in(
            conn,
            &owner_id,
            &mention,
            policy,
            &identity,
            importance.baseline_score,
        )?;
        if !resolved.created
            && let Some(id) = resolved.person_id.as_deref()
            && let Err(e) = bump_in(conn, id, Utc::now(), &importance)?
        {
            return Ok(Err(e));
        }
        Ok(Ok((resolved.person_id.clone(), Some(resolved))))
    }
}

/// Turns conversation turns into stored facts.
pub struct FactEvaluator {
    extractor: Arc<dyn FactExtractor>,
    store: Arc<MemoryStore>,
    resolver: IdentityResolver,
    scorer: ImportanceScorer,
    policy: AmbiguousPolicy,
    config: EvaluatorConfig,
    permits: Arc<Semaphore>,
}

impl FactEvaluator {
    pub fn new(
        extractor: Arc<dyn FactExtractor>,
        store: Arc<MemoryStore>,
        resolver: IdentityResolver,
        scorer: ImportanceScorer,
        config: EvaluatorConfig,
    ) -> Self {
        let policy = resolver.config().ambiguous_policy;
        let permits = Arc::new(Semaphore::new(config.max_concurrent_upserts.max(1)));
        Self {
            extractor,
            store,
            resolver,
            scorer,
            policy,
            config,
            permits,
        }
    }

    /// Extract facts from `turn` and upsert each one, in extraction order.
    ///
    /// Stops at the first candidate that still fails after retries; facts
    /// stored before it stay stored.
    pub async fn evaluate_turn(
        &self,
        turn: &ConversationTurn,
    ) -> Result<Vec<FactUpsertResult>, SkippyError> {
        let candidates = self.extractor.extract(turn).await?;
        if candidates.is_empty() {
            debug!(
                owner_id = %turn.owner_id,
                conversation_id = %turn.conversation_id,
                "no durable facts in turn"
            );
            return Ok(Vec::new());
        }

        let mut results = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            if let Some(result) = self.store_candidate(turn, candidate).await? {
                results.push(result);
            }
        }

        info!(
            owner_id = %turn.owner_id,
            conversation_id = %turn.conversation_id,
            stored = results.iter().filter(|r| r.was_new).count(),
            reinforced = results.iter().filter(|r| !r.was_new).count(),
            "turn evaluated"
        );
        Ok(results)
    }

    /// Run [`evaluate_turn`](Self::evaluate_turn) on a background task.
    ///
    /// Failures are logged with the owner, conversation and truncated user
    /// text, and returned through the handle.
    pub fn spawn(
        self: &Arc<Self>,
        turn: ConversationTurn,
    ) -> JoinHandle<Result<Vec<FactUpsertResult>, SkippyError>> {
        let evaluator = Arc::clone(self);
        tokio::spawn(async move {
            let result = evaluator.evaluate_turn(&turn).await;
            if let Err(e) = &result {
                recording::record_evaluation_failure(e.is_transient());
                error!(
                    owner_id = %turn.owner_id,
                    conversation_id = %turn.conversation_id,
                    text = %truncate_chars(&turn.user_text, LOG_TEXT_CHARS),
                    transient = e.is_transient(),
                    error = %e,
                    "background turn evaluation failed"
                );
            }
            result
        })
    }

    /// Embed first, with retries, so an unreachable gateway leaves no trace.
    /// Resolving the person, writing the fact and bumping the person then
    /// commit together or not at all.
    async fn store_candidate(
        &self,
        turn: &ConversationTurn,
        candidate: CandidateFact,
    ) -> Result<Option<FactUpsertResult>, SkippyError> {
        if candidate.text.trim().is_empty() {
            debug!("skipping empty candidate fact");
            return Ok(None);
        }

        let draft = self.store.prepare(
            FactDraft::new(turn.owner_id.clone(), candidate.text)
                .with_category(candidate.category)
                .with_confidence(candidate.confidence)
                .with_conversation(turn.conversation_id.clone()),
        )?;
        let owner_id = draft.owner_id.as_str();

        let embedding = self
            .with_retry(owner_id, "embedding", || self.store.embed(&draft.text))
            .await?;

        let (result, resolved) = self
            .with_retry(owner_id, "fact upsert", || {
                let link = person_link(
                    owner_id.to_string(),
                    candidate.person.clone(),
                    self.policy,
                    self.resolver.config().clone(),
                    self.scorer.config().clone(),
                );
                self.store.write(draft.clone(), embedding.clone(), link)
            })
            .await?;

        if let (Some(resolved), Some(mention)) = (&resolved, &candidate.person) {
            self.log_person(owner_id, mention, resolved);
        }
        Ok(Some(result))
    }

    fn log_person(&self, owner_id: &str, mention: &PersonMention, resolved: &ResolvedMention) {
        if resolved.created {
            recording::record_person_created();
            info!(owner_id, name = %mention.name, person_id = ?resolved.person_id, "person created");
        } else if resolved.resolution.tier == MatchTier::FuzzyLow && resolved.person_id.is_none() {
            info!(
                owner_id,
                name = %mention.name,
                suggested = ?resolved.resolution.person_id,
                score = resolved.resolution.match_score,
                "ambiguous person mention; fact stored unlinked"
            );
        } else {
            debug!(owner_id, person_id = ?resolved.person_id, "person mention linked");
        }
    }

    /// Run `op` under an upsert permit, retrying transient failures with
    /// exponential backoff up to `max_retries` times.
    async fn with_retry<T, F, Fut>(
        &self,
        owner_id: &str,
        what: &'static str,
        mut op: F,
    ) -> Result<T, SkippyError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SkippyError>>,
    {
        let mut attempt = 0u32;
        loop {
            let outcome = {
                let _permit = self
                    .permits
                    .acquire()
                    .await
                    .map_err(|e| SkippyError::Internal(format!("upsert semaphore closed: {e}")))?;
                op().await
            };

            match outcome {
                Err(e) if e.is_transient() && attempt < self.config.max_retries => {
                    let delay = Duration::from_millis(
                        self.config
                            .retry_backoff_ms
                            .saturating_mul(1u64 << attempt.min(16)),
                    );
                    warn!(
                        owner_id,
                        attempt = attempt + 1,
                        max_retries = self.config.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "{what} failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}
