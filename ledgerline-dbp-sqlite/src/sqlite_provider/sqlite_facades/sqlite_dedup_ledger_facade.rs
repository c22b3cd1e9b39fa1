/*
    Copyright 2025 MydriaTech AB

    Licensed under the Apache License 2.0 with Free world makers exception
    1.0.0 (the "License"); you may not use this file except in compliance with
    the License. You should have obtained a copy of the License with the source
    or binary distribution in file named

        LICENSE-Apache-2.0-with-FWM-Exception-1.0.0

    Unless required by applicable law or agreed to in writing, software
    distributed under the License is distributed on an "AS IS" BASIS,
    WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
    See the License for the specific language governing permissions and
    limitations under the License.
*/

//! SQLite implementation of [DedupLedgerFacade].

use crate::SqliteDatabaseProvider;
use ledgerline_dbp::dbp::facades::DedupLedgerFacade;
use ledgerline_dbp::ingest::IngestError;
use rusqlite::ErrorCode;
use rusqlite::OptionalExtension;
use rusqlite::params;
use std::sync::Arc;

/// SQLite implementation of [DedupLedgerFacade].
pub struct SqliteDedupLedgerFacade {
    sqlite_provider: Arc<SqliteDatabaseProvider>,
}

impl SqliteDedupLedgerFacade {
    /// Return a new instance.
    pub fn new(sqlite_provider: &Arc<SqliteDatabaseProvider>) -> Self {
        Self {
            sqlite_provider: Arc::clone(sqlite_provider),
        }
    }

    /// Return `true` if the error is caused by the `(topic, event_id)` primary
    /// key already being present. Other constraint failures are faults.
    fn is_unique_violation(e: &rusqlite::Error) -> bool {
        matches!(
            e,
            rusqlite::Error::SqliteFailure(failure, _)
                if failure.code == ErrorCode::ConstraintViolation
                    && failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
        )
    }
}

#[async_trait::async_trait]
impl DedupLedgerFacade for SqliteDedupLedgerFacade {
    async fn is_duplicate(&self, topic: &str, event_id: &str) -> Result<bool, IngestError> {
        let topic = topic.to_owned();
        let event_id = event_id.to_owned();
        self.sqlite_provider
            .run_blocking(move |conn| {
                conn.query_row(
                    "SELECT 1 FROM processed_events WHERE topic = ?1 AND event_id = ?2",
                    params![topic, event_id],
                    |_row| Ok(()),
                )
                .optional()
                .map(|found| found.is_some())
                .map_err(|e| SqliteDatabaseProvider::storage_fault("Failed to query ledger", e))
            })
            .await
    }

    async fn mark_processed(&self, topic: &str, event_id: &str) -> Result<bool, IngestError> {
        let topic = topic.to_owned();
        let event_id = event_id.to_owned();
        let processed_at = i64::try_from(ledgerline_dbp::time::get_timestamp_micros())
            .unwrap_or(i64::MAX);
        self.sqlite_provider
            .run_blocking(move |conn| {
                // Plain INSERT in autocommit mode: the primary key decides the
                // winner and the commit is synced before execute returns.
                match conn.execute(
                    "INSERT INTO processed_events (topic, event_id, processed_at) VALUES (?1, ?2, ?3)",
                    params![topic, event_id, processed_at],
                ) {
                    Ok(_) => {
                        if log::log_enabled!(log::Level::Trace) {
                            log::trace!("Marked as processed: topic={topic}, event_id={event_id}");
                        }
                        Ok(true)
                    }
                    Err(e) if Self::is_unique_violation(&e) => {
                        log::debug!("Already marked: topic={topic}, event_id={event_id}");
                        Ok(false)
                    }
                    Err(e) => Err(SqliteDatabaseProvider::storage_fault(
                        "Failed to mark event as processed",
                        e,
                    )),
                }
            })
            .await
    }

    async fn clear(&self) -> Result<(), IngestError> {
        self.sqlite_provider
            .run_blocking(|conn| {
                conn.execute("DELETE FROM processed_events", [])
                    .map_err(|e| SqliteDatabaseProvider::storage_fault("Failed to clear ledger", e))
            })
            .await
            .map(|removed| log::warn!("Deduplication ledger cleared. {removed} entries removed."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn insert(conn: &Connection, topic: Option<&str>, event_id: &str) -> rusqlite::Result<usize> {
        conn.execute(
            "INSERT INTO processed_events (topic, event_id, processed_at) VALUES (?1, ?2, 0)",
            params![topic, event_id],
        )
    }

    #[test]
    fn test_only_primary_key_conflicts_are_duplicates() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE processed_events (
                topic TEXT NOT NULL,
                event_id TEXT NOT NULL CHECK (length(event_id) < 8),
                processed_at INTEGER NOT NULL,
                PRIMARY KEY (topic, event_id)
            );",
        )
        .unwrap();
        insert(&conn, Some("t"), "e").unwrap();
        let duplicate = insert(&conn, Some("t"), "e").unwrap_err();
        assert!(SqliteDedupLedgerFacade::is_unique_violation(&duplicate));
        let not_null = insert(&conn, None, "e").unwrap_err();
        assert!(!SqliteDedupLedgerFacade::is_unique_violation(&not_null));
        let check = insert(&conn, Some("t"), "too-long-id").unwrap_err();
        assert!(!SqliteDedupLedgerFacade::is_unique_violation(&check));
        assert!(!SqliteDedupLedgerFacade::is_unique_violation(
            &rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE),
                None,
            )
        ));
    }
}
