// SPDX-FileCopyrightText: 2026 Skippy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All statements run on tokio-rusqlite's single background thread, so every
//! `call` closure observes a consistent view and closures never interleave.
//! Do NOT open a second connection to the same file for writes.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tokio_rusqlite::Connection;
use tracing::{debug, info};

use skippy_config::model::StorageConfig;
use skippy_core::{AdapterType, HealthStatus, PluginAdapter, SkippyError};

use crate::migrations::run_migrations;

const BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Map a tokio-rusqlite failure onto the workspace error type.
pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> SkippyError {
    SkippyError::StoreUnavailable {
        source: Box::new(e),
    }
}

/// Handle to the migrated SQLite database.
///
/// Cloning is cheap; clones share the same background connection thread.
#[derive(Clone)]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (creating if needed) the database file described by `config`,
    /// apply PRAGMAs and run pending migrations.
    pub async fn open(config: &StorageConfig) -> Result<Self, SkippyError> {
        let path = Path::new(&config.database_path);
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| SkippyError::StoreUnavailable {
                source: Box::new(e),
            })?;
        }

        let conn = Connection::open(path)
            .await
            .map_err(|e| SkippyError::StoreUnavailable {
                source: Box::new(e),
            })?;
        let db = Self { conn };
        db.prepare(config.wal_mode).await?;
        info!(path = %config.database_path, wal = config.wal_mode, "database opened");
        Ok(db)
    }

    /// Open a private in-memory database with the full schema applied.
    pub async fn open_in_memory() -> Result<Self, SkippyError> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| SkippyError::StoreUnavailable {
                source: Box::new(e),
            })?;
        let db = Self { conn };
        db.prepare(false).await?;
        Ok(db)
    }

    /// The underlying tokio-rusqlite connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    async fn prepare(&self, wal_mode: bool) -> Result<(), SkippyError> {
        self.conn
            .call(move |conn| -> Result<Result<(), SkippyError>, rusqlite::Error> {
                if wal_mode {
                    let mode: String = conn.pragma_update_and_check(
                        None,
                        "journal_mode",
                        "WAL",
                        |row| row.get(0),
                    )?;
                    debug!(journal_mode = %mode, "journal mode set");
                }
                conn.execute_batch(
                    "PRAGMA foreign_keys = ON;
                     PRAGMA synchronous = NORMAL;",
                )?;
                conn.busy_timeout(BUSY_TIMEOUT)?;
                Ok(run_migrations(conn))
            })
            .await
            .map_err(map_tr_err)?
    }

    /// Flush the WAL into the main database file.
    pub async fn checkpoint(&self) -> Result<(), SkippyError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

#[async_trait]
impl PluginAdapter for Database {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, SkippyError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), SkippyError> {
        self.checkpoint().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn make_config(path: &Path) -> StorageConfig {
        StorageConfig {
            database_path: path.to_string_lossy().to_string(),
            wal_mode: true,
        }
    }

    async fn table_names(db: &Database) -> Vec<String> {
        db.connection()
            .call(|conn| -> Result<Vec<String>, rusqlite::Error> {
                let mut stmt = conn.prepare(
                    "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
                )?;
                let rows = stmt.query_map([], |row| row.get(0))?;
                rows.collect()
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn in_memory_database_has_schema() {
        let db = Database::open_in_memory().await.unwrap();
        let tables = table_names(&db).await;
        assert!(tables.contains(&"facts".to_string()));
        assert!(tables.contains(&"people".to_string()));
    }

    #[tokio::test]
    async fn open_creates_file_and_parent_dirs() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("nested").join("skippy.db");
        let _db = Database::open(&make_config(&db_path)).await.unwrap();
        assert!(db_path.exists(), "database file should be created");
    }

    #[tokio::test]
    async fn open_enables_wal_and_foreign_keys() {
        let dir = tempdir().unwrap();
        let db = Database::open(&make_config(&dir.path().join("wal.db")))
            .await
            .unwrap();
        let (journal, fk): (String, i64) = db
            .connection()
            .call(|conn| -> Result<(String, i64), rusqlite::Error> {
                let journal = conn.query_row("PRAGMA journal_mode", [], |r| r.get(0))?;
                let fk = conn.query_row("PRAGMA foreign_keys", [], |r| r.get(0))?;
                Ok((journal, fk))
            })
            .await
            .unwrap();
        assert_eq!(journal.to_lowercase(), "wal");
        assert_eq!(fk, 1);
    }

    #[tokio::test]
    async fn reopening_is_idempotent() {
        let dir = tempdir().unwrap();
        let config = make_config(&dir.path().join("again.db"));
        drop(Database::open(&config).await.unwrap());
        let db = Database::open(&config).await.unwrap();
        assert!(table_names(&db).await.contains(&"facts".to_string()));
    }

    #[tokio::test]
    async fn fact_person_ref_must_reference_a_person() {
        let db = Database::open_in_memory().await.unwrap();
        let result = db
            .connection()
            .call(|conn| -> Result<usize, rusqlite::Error> {
                conn.execute(
                    "INSERT INTO facts (id, owner_id, text, embedding, confidence, person_ref, created_at, updated_at)
                     VALUES ('f1', 'o1', 't', x'00000000', 0.5, 'missing', '2026-01-01T00:00:00.000Z', '2026-01-01T00:00:00.000Z')",
                    [],
                )
            })
            .await;
        assert!(result.is_err(), "dangling person_ref should violate the foreign key");
    }

    #[tokio::test]
    async fn adapter_reports_healthy() {
        let db = Database::open_in_memory().await.unwrap();
        assert_eq!(db.name(), "sqlite");
        assert_eq!(db.adapter_type(), AdapterType::Storage);
        assert_eq!(db.health_check().await.unwrap(), HealthStatus::Healthy);
        db.shutdown().await.unwrap();
    }
}
