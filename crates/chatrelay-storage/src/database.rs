// SPDX-FileCopyrightText: 2026 Chatrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connection setup, PRAGMAs and lifecycle.
//!
//! Every statement runs on tokio-rusqlite's single background thread, which
//! serializes writes.

use std::path::Path;
use std::time::Duration;

use chatrelay_core::RelayError;
use tracing::{debug, info};

use crate::migrations;

pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> RelayError {
    RelayError::Storage {
        source: Box::new(e),
    }
}

/// An open, migrated SQLite database.
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (or create) the database file, apply PRAGMAs and migrations.
    pub async fn open(path: impl AsRef<Path>, wal_mode: bool) -> Result<Self, RelayError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(RelayError::storage)?;
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| RelayError::Storage {
                source: Box::new(e),
            })?;
        let db = Self { conn };
        db.prepare(wal_mode).await?;
        info!(path = %path.display(), wal_mode, "database opened");
        Ok(db)
    }

    /// Private in-memory database, mainly for tests.
    pub async fn open_in_memory() -> Result<Self, RelayError> {
        let conn = tokio_rusqlite::Connection::open_in_memory()
            .await
            .map_err(|e| RelayError::Storage {
                source: Box::new(e),
            })?;
        let db = Self { conn };
        db.prepare(false).await?;
        Ok(db)
    }

    async fn prepare(&self, wal_mode: bool) -> Result<(), RelayError> {
        let journal_mode = self
            .conn
            .call(move |conn| {
                conn.busy_timeout(Duration::from_secs(5))?;
                let mode = if wal_mode {
                    let mode: String = conn.pragma_update_and_check(
                        None,
                        "journal_mode",
                        "WAL",
                        |row| row.get(0),
                    )?;
                    conn.pragma_update(None, "synchronous", "NORMAL")?;
                    mode
                } else {
                    conn.pragma_query_value(None, "journal_mode", |row| row.get(0))?
                };
                Ok(mode)
            })
            .await
            .map_err(map_tr_err)?;
        debug!(journal_mode = %journal_mode, "database pragmas applied");

        let applied = self
            .conn
            .call(|conn| -> Result<Result<usize, RelayError>, rusqlite::Error> {
                Ok(migrations::run_migrations(conn))
            })
            .await
            .map_err(map_tr_err)??;
        if applied > 0 {
            info!(applied, "database migrations applied");
        }
        Ok(())
    }

    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Current journal mode as reported by SQLite (`wal`, `delete`, `memory`).
    pub async fn journal_mode(&self) -> Result<String, RelayError> {
        self.conn
            .call(|conn| conn.pragma_query_value(None, "journal_mode", |row| row.get(0)))
            .await
            .map_err(map_tr_err)
    }

    /// Checkpoint the WAL so the main file holds every committed row.
    pub async fn checkpoint(&self) -> Result<(), RelayError> {
        self.conn
            .call(|conn| conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);"))
            .await
            .map_err(map_tr_err)
    }
}
