// SPDX-FileCopyrightText: 2026 Chatrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the MessageLog trait.

use async_trait::async_trait;
use rusqlite::params;
use tracing::debug;

use chatrelay_config::StorageConfig;
use chatrelay_core::traits::{MessageLog, PluginAdapter};
use chatrelay_core::types::{AdapterType, HealthStatus, Message, SessionId};
use chatrelay_core::RelayError;

use crate::database::{Database, map_tr_err};

/// Append-only message log in the `messages` table.
///
/// Rows are ordered by their autoincrement `seq`, which is the order in
/// which `append` calls reached the database thread.
pub struct SqliteMessageLog {
    db: Database,
}

impl SqliteMessageLog {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn open(config: &StorageConfig) -> Result<Self, RelayError> {
        let db = Database::open(&config.database_path, config.wal_mode).await?;
        Ok(Self::new(db))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub async fn count(&self) -> Result<u64, RelayError> {
        self.db
            .connection()
            .call(|conn| {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))?;
                Ok(count as u64)
            })
            .await
            .map_err(map_tr_err)
    }

    /// Flush the WAL before exit.
    pub async fn close(&self) -> Result<(), RelayError> {
        self.db.checkpoint().await?;
        debug!("message log closed");
        Ok(())
    }
}

#[async_trait]
impl PluginAdapter for SqliteMessageLog {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, RelayError> {
        let probe = self
            .db
            .connection()
            .call(|conn| conn.execute_batch("SELECT 1;"))
            .await
            .map_err(map_tr_err);
        Ok(match probe {
            Ok(()) => HealthStatus::Healthy,
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        })
    }
}

#[async_trait]
impl MessageLog for SqliteMessageLog {
    async fn append(&self, message: &Message) -> Result<(), RelayError> {
        let msg = message.clone();
        self.db
            .connection()
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO messages (text, sender, timestamp, session_id)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![
                        msg.text,
                        msg.sender,
                        msg.timestamp,
                        msg.session_id.map(|s| s.0),
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    async fn recent(&self, limit: usize) -> Result<Vec<Message>, RelayError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.db
            .connection()
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT text, sender, timestamp, session_id FROM messages
                     ORDER BY seq DESC LIMIT ?1",
                )?;
                let rows = stmt.query_map(params![limit], |row| {
                    Ok(Message {
                        text: row.get(0)?,
                        sender: row.get(1)?,
                        timestamp: row.get(2)?,
                        session_id: row.get::<_, Option<String>>(3)?.map(SessionId),
                    })
                })?;
                let mut messages = rows.collect::<Result<Vec<_>, _>>()?;
                messages.reverse();
                Ok(messages)
            })
            .await
            .map_err(map_tr_err)
    }
}
