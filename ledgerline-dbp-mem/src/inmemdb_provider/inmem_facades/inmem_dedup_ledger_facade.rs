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

//! Ephemeral in-memory implementation of [DedupLedgerFacade].

use crate::InMemoryDatabaseProvider;
use crate::inmemdb_provider::InMemLedgerMark;
use ledgerline_dbp::dbp::facades::DedupLedgerFacade;
use ledgerline_dbp::ingest::IngestError;
use std::sync::Arc;
use std::sync::atomic::Ordering;

/// Ephemeral in-memory implementation of [DedupLedgerFacade].
pub struct InMemDedupLedgerFacade {
    inmem_provider: Arc<InMemoryDatabaseProvider>,
}

impl InMemDedupLedgerFacade {
    /// Return a new instance.
    pub fn new(inmem_provider: &Arc<InMemoryDatabaseProvider>) -> Self {
        Self {
            inmem_provider: Arc::clone(inmem_provider),
        }
    }
}

#[async_trait::async_trait]
impl DedupLedgerFacade for InMemDedupLedgerFacade {
    async fn is_duplicate(&self, topic: &str, event_id: &str) -> Result<bool, IngestError> {
        Ok(self
            .inmem_provider
            .processed
            .contains_key(&(topic.to_owned(), event_id.to_owned())))
    }

    async fn mark_processed(&self, topic: &str, event_id: &str) -> Result<bool, IngestError> {
        let claim = self.inmem_provider.next_claim.fetch_add(1, Ordering::Relaxed);
        // get_or_insert keeps an existing entry, so only one caller will find
        // its own claim token in the returned entry.
        let entry = self.inmem_provider.processed.get_or_insert(
            (topic.to_owned(), event_id.to_owned()),
            InMemLedgerMark::new(claim, ledgerline_dbp::time::get_timestamp_micros()),
        );
        Ok(entry.value().is_claimed_by(claim))
    }

    async fn clear(&self) -> Result<(), IngestError> {
        let mut removed = 0usize;
        while self.inmem_provider.processed.pop_front().is_some() {
            removed += 1;
        }
        log::warn!("Deduplication ledger cleared. {removed} entries removed.");
        Ok(())
    }
}
