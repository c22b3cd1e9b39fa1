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

//! Durable SQLite implementation of [DatabaseProvider].

mod sqlite_facades;
mod sqlite_schema;

use self::sqlite_facades::SqliteProviderFacades;
use ledgerline_dbp::dbp::DatabaseProvider;
use ledgerline_dbp::ingest::IngestError;
use ledgerline_dbp::ingest::IngestErrorKind;
use parking_lot::Mutex;
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Durable SQLite implementation of [DatabaseProvider].
pub struct SqliteDatabaseProvider {
    /// Single connection. SQLite serializes writers, this mutex serializes
    /// the threads of this process.
    conn: Arc<Mutex<Connection>>,
    /// Where the ledger lives. `:memory:` for ephemeral instances.
    location: String,
}

impl SqliteDatabaseProvider {
    /// Time a writer waits for another process holding the database lock.
    const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

    /// Open or create the ledger file at `path`.
    ///
    /// Missing parent directories are created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Arc<Self>, IngestError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                IngestErrorKind::StorageFault.error_with_msg(format!(
                    "Failed to create directory '{}': {e}",
                    parent.display()
                ))
            })?;
        }
        let conn = Connection::open(path).map_err(|e| {
            IngestErrorKind::StorageFault.error_with_msg(format!(
                "Failed to open SQLite database '{}': {e}",
                path.display()
            ))
        })?;
        // WAL lets readers proceed during writes. FULL sync makes each commit
        // durable before the insert returns.
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=FULL;")
            .map_err(|e| Self::storage_fault("Failed to set PRAGMA", e))?;
        Self::with_connection(conn, &path.display().to_string())
    }

    /// Open an ephemeral in-memory SQLite database.
    pub fn open_in_memory() -> Result<Arc<Self>, IngestError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Self::storage_fault("Failed to open in-memory SQLite", e))?;
        Self::with_connection(conn, ":memory:")
    }

    fn with_connection(conn: Connection, location: &str) -> Result<Arc<Self>, IngestError> {
        conn.busy_timeout(Self::BUSY_TIMEOUT)
            .map_err(|e| Self::storage_fault("Failed to set busy timeout", e))?;
        sqlite_schema::init_schema(&conn)
            .map_err(|e| Self::storage_fault("Failed to init schema", e))?;
        Ok(Arc::new(Self {
            conn: Arc::new(Mutex::new(conn)),
            location: location.to_owned(),
        }))
    }

    /// Get [DatabaseProvider] instance.
    pub fn as_database_provider(self: &Arc<Self>) -> DatabaseProvider {
        DatabaseProvider::new(Arc::new(SqliteProviderFacades::new(self)))
    }

    /// Where the ledger is stored.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Run a blocking database operation on the blocking thread pool while
    /// holding the connection lock.
    async fn run_blocking<T, F>(&self, op: F) -> Result<T, IngestError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, IngestError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || op(&conn.lock()))
            .await
            .map_err(|e| {
                IngestErrorKind::StorageFault
                    .error_with_msg(format!("Ledger operation was aborted: {e}"))
            })?
    }

    /// Map a SQLite error into a [IngestErrorKind::StorageFault].
    fn storage_fault(context: &str, e: rusqlite::Error) -> IngestError {
        IngestErrorKind::StorageFault.error_with_msg(format!("{context}: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerline_dbp::dbp::facades::DatabaseProviderFacades;
    use ledgerline_dbp::ingest::DedupKey;

    fn initialize_env_logger() {
        env_logger::builder()
            .is_test(true)
            .filter_level(log::LevelFilter::Debug)
            .try_init()
            .map_err(|e| {
                log::trace!("Env logger for testing was probably already initialized: {e:?}")
            })
            .ok();
    }

    #[tokio::test]
    async fn test_mark_processed_has_single_winner() {
        initialize_env_logger();
        let dbp = SqliteDatabaseProvider::open_in_memory()
            .unwrap()
            .as_database_provider();
        let ledger = dbp.dedup_ledger_facade();
        assert!(!ledger.is_duplicate("orders", "evt-001").await.unwrap());
        assert!(ledger.mark_processed("orders", "evt-001").await.unwrap());
        assert!(ledger.is_duplicate("orders", "evt-001").await.unwrap());
        assert!(!ledger.mark_processed("orders", "evt-001").await.unwrap());
        assert_eq!(dbp.ledger_query_facade().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_same_event_id_in_different_topics() {
        let dbp = SqliteDatabaseProvider::open_in_memory()
            .unwrap()
            .as_database_provider();
        let ledger = dbp.dedup_ledger_facade();
        assert!(ledger.mark_processed("topic.a", "X").await.unwrap());
        assert!(ledger.mark_processed("topic.b", "X").await.unwrap());
        assert_eq!(
            dbp.ledger_query_facade().list_topics().await.unwrap(),
            vec!["topic.a".to_string(), "topic.b".to_string()]
        );
    }

    #[tokio::test]
    async fn test_marks_survive_reopen() {
        initialize_env_logger();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("dedup.db");
        {
            let dbp = SqliteDatabaseProvider::open(&path)
                .unwrap()
                .as_database_provider();
            assert!(
                dbp.dedup_ledger_facade()
                    .mark_processed("t", "e")
                    .await
                    .unwrap()
            );
        }
        let sqlite_provider = SqliteDatabaseProvider::open(&path).unwrap();
        assert_eq!(sqlite_provider.location(), path.display().to_string());
        let dbp = sqlite_provider.as_database_provider();
        assert!(dbp.dedup_ledger_facade().is_duplicate("t", "e").await.unwrap());
        assert!(!dbp.dedup_ledger_facade().mark_processed("t", "e").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_filter_count_and_clear() {
        let dbp = SqliteDatabaseProvider::open_in_memory()
            .unwrap()
            .as_database_provider();
        let ledger = dbp.dedup_ledger_facade();
        for (topic, event_id) in [("topic.a", "1"), ("topic.b", "1"), ("topic.a", "2")] {
            assert!(ledger.mark_processed(topic, event_id).await.unwrap());
        }
        let query = dbp.ledger_query_facade();
        let only_a = query.list_events(Some("topic.a")).await.unwrap();
        assert_eq!(only_a.len(), 2);
        assert!(only_a.iter().all(|key| key.topic() == "topic.a"));
        let mut all = query.list_events(None).await.unwrap();
        all.sort();
        assert_eq!(
            all,
            vec![
                DedupKey::new("topic.a", "1"),
                DedupKey::new("topic.a", "2"),
                DedupKey::new("topic.b", "1"),
            ]
        );
        assert!(query.list_events(Some("topic.c")).await.unwrap().is_empty());
        assert_eq!(query.count().await.unwrap(), 3);
        ledger.clear().await.unwrap();
        assert_eq!(query.count().await.unwrap(), 0);
        assert!(query.list_topics().await.unwrap().is_empty());
        assert!(!ledger.is_duplicate("topic.a", "1").await.unwrap());
        assert!(ledger.mark_processed("topic.a", "1").await.unwrap());
    }

    /// Two providers on the same file behave like two processes sharing the
    /// ledger.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writers_on_shared_file() {
        initialize_env_logger();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shared.db");
        let providers = [
            Arc::new(SqliteDatabaseProvider::open(&path).unwrap().as_database_provider()),
            Arc::new(SqliteDatabaseProvider::open(&path).unwrap().as_database_provider()),
        ];
        let mut tasks = vec![];
        for attempt in 0..4 {
            for key in 0..25 {
                let dbp = Arc::clone(&providers[attempt % providers.len()]);
                tasks.push(tokio::spawn(async move {
                    dbp.dedup_ledger_facade()
                        .mark_processed("race", &format!("evt-{key}"))
                        .await
                        .unwrap()
                }));
            }
        }
        let mut winners = 0;
        for task in tasks {
            if task.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 25);
        assert_eq!(providers[0].ledger_query_facade().count().await.unwrap(), 25);
    }
}
