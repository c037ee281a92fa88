// SPDX-FileCopyrightText: 2026 Skippy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for integration testing.
//!
//! `TestHarness` opens a migrated SQLite database in a temp directory and
//! pairs it with a configuration sized for the mock embedder.

use std::sync::Arc;

use skippy_config::model::{SkippyConfig, StorageConfig};
use skippy_core::{EmbeddingAdapter, SkippyError};
use skippy_storage::Database;

use crate::mock_embedder::MockEmbedder;

/// Embedding size used by harness-built stores.
pub const TEST_DIMENSIONS: usize = 256;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    config: SkippyConfig,
    embedder: Option<MockEmbedder>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        let mut config = SkippyConfig::default();
        config.memory.embedding_dimensions = TEST_DIMENSIONS;
        config.evaluator.retry_backoff_ms = 1;
        Self {
            config,
            embedder: None,
        }
    }

    /// Adjust the configuration before the database is opened.
    pub fn configure(mut self, f: impl FnOnce(&mut SkippyConfig)) -> Self {
        f(&mut self.config);
        self
    }

    /// Use a pre-configured mock embedder instead of the default one.
    pub fn with_embedder(mut self, embedder: MockEmbedder) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Build the test harness, creating the temp database.
    pub async fn build(self) -> Result<TestHarness, SkippyError> {
        let temp_dir = tempfile::TempDir::new().map_err(|e| SkippyError::StoreUnavailable {
            source: Box::new(e),
        })?;
        let db_path = temp_dir.path().join("test.db");

        let mut config = self.config;
        config.storage = StorageConfig {
            database_path: db_path.to_string_lossy().to_string(),
            wal_mode: true,
        };
        let db = Database::open(&config.storage).await?;

        let dimensions = config.memory.embedding_dimensions;
        let embedder = Arc::new(
            self.embedder
                .unwrap_or_else(|| MockEmbedder::new(dimensions)),
        );

        Ok(TestHarness {
            db,
            config,
            embedder,
            _temp_dir: temp_dir,
        })
    }
}

/// A temp database plus the configuration and mock embedder to go with it.
pub struct TestHarness {
    /// Migrated database, deleted with the harness.
    pub db: Database,
    pub config: SkippyConfig,
    pub embedder: Arc<MockEmbedder>,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Harness with default test configuration.
    pub async fn new() -> Result<Self, SkippyError> {
        Self::builder().build().await
    }

    /// The mock embedder as a trait object.
    pub fn embedding_adapter(&self) -> Arc<dyn EmbeddingAdapter> {
        self.embedder.clone()
    }
}
