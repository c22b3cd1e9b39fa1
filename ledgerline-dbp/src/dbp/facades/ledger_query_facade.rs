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

//! Database facade for read-only queries of the deduplication ledger.

use crate::ingest::DedupKey;
use crate::ingest::IngestError;

/// Database facade for read-only queries of the deduplication ledger.
#[async_trait::async_trait]
pub trait LedgerQueryFacade: Send + Sync {
    /// Return the distinct topics with at least one entry in sorted order.
    async fn list_topics(&self) -> Result<Vec<String>, IngestError>;

    /// Return all entries or only the entries of `topic_filter` when present.
    async fn list_events(&self, topic_filter: Option<&str>)
    -> Result<Vec<DedupKey>, IngestError>;

    /// Return the total number of distinct entries.
    async fn count(&self) -> Result<u64, IngestError>;
}
