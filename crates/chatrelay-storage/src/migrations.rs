// SPDX-FileCopyrightText: 2026 Chatrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded database migrations using refinery.
//!
//! SQL files under `migrations/` are compiled into the binary and applied
//! when the database is opened. Refinery records applied versions in its own
//! `refinery_schema_history` table.

use chatrelay_core::RelayError;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Apply all pending migrations. Returns how many were applied.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<usize, RelayError> {
    let report = embedded::migrations::runner()
        .run(conn)
        .map_err(RelayError::storage)?;
    Ok(report.applied_migrations().len())
}
