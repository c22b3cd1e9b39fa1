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

//! Ephemeral in-memory implementation of [LedgerQueryFacade].

use crate::InMemoryDatabaseProvider;
use ledgerline_dbp::dbp::facades::LedgerQueryFacade;
use ledgerline_dbp::ingest::DedupKey;
use ledgerline_dbp::ingest::IngestError;
use std::sync::Arc;

/// Ephemeral in-memory implementation of [LedgerQueryFacade].
pub struct InMemLedgerQueryFacade {
    inmem_provider: Arc<InMemoryDatabaseProvider>,
}

impl InMemLedgerQueryFacade {
    /// Return a new instance.
    pub fn new(inmem_provider: &Arc<InMemoryDatabaseProvider>) -> Self {
        Self {
            inmem_provider: Arc::clone(inmem_provider),
        }
    }
}

#[async_trait::async_trait]
impl LedgerQueryFacade for InMemLedgerQueryFacade {
    async fn list_topics(&self) -> Result<Vec<String>, IngestError> {
        let mut topics: Vec<String> = Vec::new();
        // Keys are ordered by topic, so duplicates are always adjacent.
        for entry in self.inmem_provider.processed.iter() {
            let topic = &entry.key().0;
            if topics.last() != Some(topic) {
                topics.push(topic.to_owned());
            }
        }
        Ok(topics)
    }

    async fn list_events(
        &self,
        topic_filter: Option<&str>,
    ) -> Result<Vec<DedupKey>, IngestError> {
        let mut entries = if let Some(topic) = topic_filter {
            let start = (topic.to_owned(), String::new());
            self.inmem_provider
                .processed
                .range(start..)
                .take_while(|entry| entry.key().0 == topic)
                .map(|entry| (entry.value().processed_at_micros(), entry.key().to_owned()))
                .collect::<Vec<_>>()
        } else {
            self.inmem_provider
                .processed
                .iter()
                .map(|entry| (entry.value().processed_at_micros(), entry.key().to_owned()))
                .collect::<Vec<_>>()
        };
        // Same order as the durable provider: oldest mark first.
        entries.sort_by(|(a_ts, a_key), (b_ts, b_key)| a_ts.cmp(b_ts).then(a_key.cmp(b_key)));
        Ok(entries
            .into_iter()
            .map(|(_, key)| DedupKey::from(key))
            .collect())
    }

    async fn count(&self) -> Result<u64, IngestError> {
        Ok(u64::try_from(self.inmem_provider.processed.len()).unwrap_or(u64::MAX))
    }
}
