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

//! SQLite implementation of [LedgerQueryFacade].

use crate::SqliteDatabaseProvider;
use ledgerline_dbp::dbp::facades::LedgerQueryFacade;
use ledgerline_dbp::ingest::DedupKey;
use ledgerline_dbp::ingest::IngestError;
use rusqlite::params;
use std::sync::Arc;

/// SQLite implementation of [LedgerQueryFacade].
pub struct SqliteLedgerQueryFacade {
    sqlite_provider: Arc<SqliteDatabaseProvider>,
}

impl SqliteLedgerQueryFacade {
    /// Return a new instance.
    pub fn new(sqlite_provider: &Arc<SqliteDatabaseProvider>) -> Self {
        Self {
            sqlite_provider: Arc::clone(sqlite_provider),
        }
    }

    fn dedup_key_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DedupKey> {
        Ok(DedupKey::from((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
        )))
    }

    fn list_events_fault(e: rusqlite::Error) -> IngestError {
        SqliteDatabaseProvider::storage_fault("Failed to list events", e)
    }
}

#[async_trait::async_trait]
impl LedgerQueryFacade for SqliteLedgerQueryFacade {
    async fn list_topics(&self) -> Result<Vec<String>, IngestError> {
        self.sqlite_provider
            .run_blocking(|conn| {
                let mut stmt = conn
                    .prepare("SELECT DISTINCT topic FROM processed_events ORDER BY topic")
                    .map_err(|e| SqliteDatabaseProvider::storage_fault("Failed to list topics", e))?;
                let topics = stmt
                    .query_map([], |row| row.get::<_, String>(0))
                    .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
                    .map_err(|e| SqliteDatabaseProvider::storage_fault("Failed to list topics", e));
                topics
            })
            .await
    }

    async fn list_events(
        &self,
        topic_filter: Option<&str>,
    ) -> Result<Vec<DedupKey>, IngestError> {
        let topic_filter = topic_filter.map(str::to_owned);
        self.sqlite_provider
            .run_blocking(move |conn| {
                let dedup_keys = if let Some(topic) = topic_filter {
                    let mut stmt = conn
                        .prepare(
                            "SELECT topic, event_id FROM processed_events WHERE topic = ?1 ORDER BY processed_at, event_id",
                        )
                        .map_err(Self::list_events_fault)?;
                    let rows = stmt
                        .query_map(params![topic], Self::dedup_key_from_row)
                        .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>());
                    rows
                } else {
                    let mut stmt = conn
                        .prepare(
                            "SELECT topic, event_id FROM processed_events ORDER BY processed_at, topic, event_id",
                        )
                        .map_err(Self::list_events_fault)?;
                    let rows = stmt
                        .query_map([], Self::dedup_key_from_row)
                        .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>());
                    rows
                };
                dedup_keys.map_err(Self::list_events_fault)
            })
            .await
    }

    async fn count(&self) -> Result<u64, IngestError> {
        self.sqlite_provider
            .run_blocking(|conn| {
                conn.query_row("SELECT COUNT(*) FROM processed_events", [], |row| {
                    row.get::<_, i64>(0)
                })
                .map(|count| u64::try_from(count).unwrap_or_default())
                .map_err(|e| SqliteDatabaseProvider::storage_fault("Failed to count ledger", e))
            })
            .await
    }
}
