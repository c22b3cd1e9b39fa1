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

//! Read-only views over the counters and the ledger.

use super::InboundBuffer;
use super::IngestCounters;
use super::ProcessingLoop;
use ledgerline_dbp::dbp::DatabaseProvider;
use ledgerline_dbp::dbp::facades::DatabaseProviderFacades;
use ledgerline_dbp::ingest::DedupKey;
use ledgerline_dbp::ingest::IngestError;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Snapshot of the processing counters and the known topics.
#[derive(Debug, Clone, Serialize)]
pub struct IngestStats {
    received: u64,
    unique_processed: u64,
    duplicate_dropped: u64,
    topics: Vec<String>,
    /// Seconds since the pipeline was created.
    uptime: f64,
}

impl IngestStats {
    /// Number of events popped by the processing loop.
    pub fn received(&self) -> u64 {
        self.received
    }

    /// Number of events that won the dedup decision.
    pub fn unique_processed(&self) -> u64 {
        self.unique_processed
    }

    /// Number of events dropped as duplicates.
    pub fn duplicate_dropped(&self) -> u64 {
        self.duplicate_dropped
    }

    /// Sorted distinct topics present in the ledger.
    pub fn topics(&self) -> &[String] {
        &self.topics
    }

    /// Seconds since the pipeline was created.
    pub fn uptime(&self) -> f64 {
        self.uptime
    }
}

/// Liveness view of the pipeline.
#[derive(Debug, Clone)]
pub struct IngestHealth {
    running: bool,
    queue_size: usize,
    unique_processed: u64,
    uptime: Duration,
}

impl IngestHealth {
    /// `true` while the processing loop is running.
    pub fn running(&self) -> bool {
        self.running
    }

    /// Current depth of the inbound buffer.
    pub fn queue_size(&self) -> usize {
        self.queue_size
    }

    /// Number of events that won the dedup decision.
    pub fn unique_processed(&self) -> u64 {
        self.unique_processed
    }

    /// Time since the pipeline was created.
    pub fn uptime(&self) -> Duration {
        self.uptime
    }
}

/// Read-only access to counters and ledger content.
///
/// Values are eventually consistent with respect to the event in flight.
pub struct StatsFacade {
    dbp: Arc<DatabaseProvider>,
    counters: Arc<IngestCounters>,
    inbound_buffer: Arc<InboundBuffer>,
    processing_loop: Arc<ProcessingLoop>,
}

impl StatsFacade {
    /// Return a new instance.
    pub fn new(
        dbp: &Arc<DatabaseProvider>,
        counters: &Arc<IngestCounters>,
        inbound_buffer: &Arc<InboundBuffer>,
        processing_loop: &Arc<ProcessingLoop>,
    ) -> Self {
        Self {
            dbp: Arc::clone(dbp),
            counters: Arc::clone(counters),
            inbound_buffer: Arc::clone(inbound_buffer),
            processing_loop: Arc::clone(processing_loop),
        }
    }

    /// Return a snapshot of the counters and the topics in the ledger.
    pub async fn get_stats(&self) -> Result<IngestStats, IngestError> {
        let topics = self.dbp.ledger_query_facade().list_topics().await?;
        Ok(IngestStats {
            received: self.counters.received(),
            unique_processed: self.counters.unique_processed(),
            duplicate_dropped: self.counters.duplicate_dropped(),
            topics,
            uptime: self.counters.uptime().as_secs_f64(),
        })
    }

    /// Return ledger entries, optionally limited to a single topic.
    pub async fn get_events(&self, topic_filter: Option<&str>) -> Result<Vec<DedupKey>, IngestError> {
        self.dbp
            .ledger_query_facade()
            .list_events(topic_filter)
            .await
    }

    /// Return the liveness view. Never touches the ledger.
    pub fn health(&self) -> IngestHealth {
        IngestHealth {
            running: self.processing_loop.is_running(),
            queue_size: self.inbound_buffer.len(),
            unique_processed: self.counters.unique_processed(),
            uptime: self.counters.uptime(),
        }
    }
}
