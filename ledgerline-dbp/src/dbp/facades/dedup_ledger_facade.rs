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

//! Database facade for the check-and-set operations of the deduplication
//! ledger.

use crate::ingest::IngestError;

/// Database facade for the check-and-set operations of the deduplication
/// ledger.
///
/// The ledger maps the dedup key `(topic, event_id)` to a processed marker.
/// Implementations must enforce key uniqueness in the storage layer itself so
/// that concurrent writers, possibly in different processes, have exactly one
/// winner.
#[async_trait::async_trait]
pub trait DedupLedgerFacade: Send + Sync {
    /// Return `true` if the key has already been marked as processed.
    ///
    /// This is advisory only. Use [Self::mark_processed] to decide who gets to
    /// process an event.
    async fn is_duplicate(&self, topic: &str, event_id: &str) -> Result<bool, IngestError>;

    /// Durably record the key as processed.
    ///
    /// Return `true` if this call created the record and `false` if the record
    /// already existed. A uniqueness violation is never reported as an error.
    /// The record must be committed to storage before `true` is returned.
    async fn mark_processed(&self, topic: &str, event_id: &str) -> Result<bool, IngestError>;

    /// Remove all entries from the ledger.
    ///
    /// Administrative operation for tests and operations.
    async fn clear(&self) -> Result<(), IngestError>;
}
