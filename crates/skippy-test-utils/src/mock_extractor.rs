// SPDX-FileCopyrightText: 2026 Skippy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock fact extractor returning pre-configured candidates.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use skippy_core::{
    AdapterType, CandidateFact, ConversationTurn, FactCategory, FactExtractor, HealthStatus,
    PersonMention, PluginAdapter, SkippyError,
};

/// Candidate without a person.
pub fn candidate(text: &str, category: FactCategory, confidence: f64) -> CandidateFact {
    CandidateFact {
        text: text.to_string(),
        category,
        confidence,
        person: None,
    }
}

/// Candidate about the named person.
pub fn person_candidate(
    text: &str,
    category: FactCategory,
    confidence: f64,
    name: &str,
) -> CandidateFact {
    CandidateFact {
        person: Some(PersonMention {
            name: name.to_string(),
            phone: None,
            email: None,
        }),
        ..candidate(text, category, confidence)
    }
}

type Scripted = Result<Vec<CandidateFact>, String>;

/// A mock extractor.
///
/// Each `extract` call pops the next scripted answer from a FIFO queue.
/// When the queue is empty the turn yields no candidates.
pub struct MockExtractor {
    answers: Arc<Mutex<VecDeque<Scripted>>>,
    seen: Arc<Mutex<Vec<ConversationTurn>>>,
}

impl MockExtractor {
    pub fn new() -> Self {
        Self {
            answers: Arc::new(Mutex::new(VecDeque::new())),
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Pre-load one answer per expected call.
    pub fn with_answers(answers: Vec<Vec<CandidateFact>>) -> Self {
        Self {
            answers: Arc::new(Mutex::new(answers.into_iter().map(Ok).collect())),
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub async fn push_answer(&self, candidates: Vec<CandidateFact>) {
        self.answers.lock().await.push_back(Ok(candidates));
    }

    /// Make the next call fail with `SkippyError::Internal`.
    pub async fn push_failure(&self, message: &str) {
        self.answers.lock().await.push_back(Err(message.to_string()));
    }

    /// Turns passed to `extract`, oldest first.
    pub async fn seen_turns(&self) -> Vec<ConversationTurn> {
        self.seen.lock().await.clone()
    }
}

impl Default for MockExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockExtractor {
    fn name(&self) -> &str {
        "mock-extractor"
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
impl FactExtractor for MockExtractor {
    async fn extract(&self, turn: &ConversationTurn) -> Result<Vec<CandidateFact>, SkippyError> {
        self.seen.lock().await.push(turn.clone());
        match self.answers.lock().await.pop_front() {
            Some(Ok(candidates)) => Ok(candidates),
            Some(Err(message)) => Err(SkippyError::Internal(message)),
            None => Ok(Vec::new()),
        }
    }
}
