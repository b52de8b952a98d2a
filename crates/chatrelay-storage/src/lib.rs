// SPDX-FileCopyrightText: 2026 Chatrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for the chatrelay message log.
//!
//! WAL-mode SQLite with embedded refinery migrations and a single-writer
//! connection via `tokio-rusqlite`.

pub mod database;
pub mod log;
pub mod migrations;

pub use database::Database;
pub use log::SqliteMessageLog;
