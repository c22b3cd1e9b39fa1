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

//! Ephemeral in-memory implementation of [DatabaseProvider].

mod inmem_facades;
mod inmem_ledger_mark;

use self::inmem_facades::InMemProviderFacades;
use self::inmem_ledger_mark::InMemLedgerMark;
use crossbeam_skiplist::SkipMap;
use ledgerline_dbp::dbp::DatabaseProvider;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;

/// Ephemeral in-memory implementation of [DatabaseProvider].
pub struct InMemoryDatabaseProvider {
    /// Ledger entries ordered by `(topic, event_id)`.
    processed: SkipMap<(String, String), InMemLedgerMark>,
    /// Source of claim tokens for concurrent inserts.
    next_claim: AtomicU64,
}

impl InMemoryDatabaseProvider {
    /// Return a new instance.
    pub fn new() -> Arc<Self> {
        if log::log_enabled!(log::Level::Trace) {
            log::trace!("Using in-mem db provider.");
        }
        Arc::new(Self {
            processed: SkipMap::default(),
            next_claim: AtomicU64::new(1),
        })
    }

    /// Get [DatabaseProvider] instance.
    pub fn as_database_provider(self: &Arc<Self>) -> DatabaseProvider {
        DatabaseProvider::new(Arc::new(InMemProviderFacades::new(self)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerline_dbp::dbp::facades::DatabaseProviderFacades;
    use ledgerline_dbp::ingest::DedupKey;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_mark_processed_has_one_winner() {
        let dbp = Arc::new(InMemoryDatabaseProvider::new().as_database_provider());
        let mut tasks = vec![];
        for _ in 0..16 {
            let dbp = Arc::clone(&dbp);
            tasks.push(tokio::spawn(async move {
                let mut won = 0u32;
                for key in 0..100 {
                    if dbp
                        .dedup_ledger_facade()
                        .mark_processed("race", &format!("evt-{key}"))
                        .await
                        .unwrap()
                    {
                        won += 1;
                    }
                }
                won
            }));
        }
        let mut winners = 0;
        for task in tasks {
            winners += task.await.unwrap();
        }
        assert_eq!(winners, 100);
        assert_eq!(dbp.ledger_query_facade().count().await.unwrap(), 100);
    }

    #[tokio::test]
    async fn test_topics_are_isolated_and_listed_once() {
        let dbp = InMemoryDatabaseProvider::new().as_database_provider();
        let ledger = dbp.dedup_ledger_facade();
        assert!(ledger.mark_processed("topic.b", "X").await.unwrap());
        assert!(ledger.mark_processed("topic.a", "X").await.unwrap());
        assert!(ledger.mark_processed("topic.a", "Y").await.unwrap());
        assert!(!ledger.mark_processed("topic.a", "X").await.unwrap());
        let query = dbp.ledger_query_facade();
        assert_eq!(
            query.list_topics().await.unwrap(),
            vec!["topic.a".to_string(), "topic.b".to_string()]
        );
        let mut only_a = query.list_events(Some("topic.a")).await.unwrap();
        only_a.sort();
        assert_eq!(
            only_a,
            vec![DedupKey::new("topic.a", "X"), DedupKey::new("topic.a", "Y")]
        );
        // A topic that is a prefix of another must not leak entries.
        assert!(ledger.mark_processed("topic", "Z").await.unwrap());
        assert_eq!(query.list_events(Some("topic")).await.unwrap().len(), 1);
        assert_eq!(query.list_events(None).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_clear() {
        let dbp = InMemoryDatabaseProvider::new().as_database_provider();
        let ledger = dbp.dedup_ledger_facade();
        assert!(ledger.mark_processed("t", "e").await.unwrap());
        ledger.clear().await.unwrap();
        assert_eq!(dbp.ledger_query_facade().count().await.unwrap(), 0);
        assert!(!ledger.is_duplicate("t", "e").await.unwrap());
    }
}
