// SPDX-FileCopyrightText: 2026 Skippy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fact extraction capability.

use async_trait::async_trait;

use crate::error::SkippyError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{CandidateFact, ConversationTurn};

/// Decides whether a conversation turn holds durable facts and extracts them.
///
/// Usually backed by an LLM. An empty vector means "nothing worth storing".
#[async_trait]
pub trait FactExtractor: PluginAdapter {
    async fn extract(&self, turn: &ConversationTurn) -> Result<Vec<CandidateFact>, SkippyError>;
}
