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

//! Deduplicating ingestion pipeline.

mod event_processor;
mod inbound_buffer;
mod ingest_counters;
mod processing_loop;
mod stats_facade;

pub use self::event_processor::EventProcessor;
pub use self::event_processor::LoggingEventProcessor;
pub use self::inbound_buffer::InboundBuffer;
pub use self::ingest_counters::IngestCounters;
pub use self::processing_loop::ProcessingLoop;
pub use self::stats_facade::IngestHealth;
pub use self::stats_facade::IngestStats;
pub use self::stats_facade::StatsFacade;

use crate::conf::AppConfig;
use ledgerline_dbp::dbp::DatabaseProvider;
use ledgerline_dbp::dbp::facades::DatabaseProviderFacades;
use ledgerline_dbp::ingest::DedupKey;
use ledgerline_dbp::ingest::Event;
use ledgerline_dbp::ingest::IngestError;
use ledgerline_dbp::ingest::IngestErrorKind;
use ledgerline_dbp_mem::InMemoryDatabaseProvider;
use ledgerline_dbp_sqlite::SqliteDatabaseProvider;
use std::sync::Arc;
use std::time::Duration;

/** Deduplicating ingestion pipeline.

Owns the dedup ledger, the inbound buffer, the single processing loop and the
counters. Constructed once at startup and shared with the ingress adapter.

Accepting an event only means that it was queued. Whether it was unique or a
duplicate is visible through [get_stats](Self::get_stats).
*/
pub struct IngestPipeline {
    dbp: Arc<DatabaseProvider>,
    inbound_buffer: Arc<InboundBuffer>,
    processing_loop: Arc<ProcessingLoop>,
    stats_facade: StatsFacade,
}

impl IngestPipeline {
    /// Return a new instance using the configured ledger backend and the
    /// [LoggingEventProcessor].
    ///
    /// The processing loop is not started.
    pub fn new(app_config: &Arc<AppConfig>) -> Result<Arc<Self>, IngestError> {
        let dbp = match app_config.backend.implementation() {
            "sqlite" => {
                let sqlite_provider = SqliteDatabaseProvider::open(app_config.backend.path())?;
                log::info!("Dedup ledger opened at '{}'.", sqlite_provider.location());
                Arc::new(sqlite_provider.as_database_provider())
            }
            "mem" => {
                let inmem_provider = InMemoryDatabaseProvider::new();
                Arc::new(inmem_provider.as_database_provider())
            }
            unknown_provider => {
                return Err(IngestErrorKind::Unspecified.error_with_msg(format!(
                    "Unknown database provider type '{unknown_provider}'."
                )));
            }
        };
        log::info!(
            "Dedup ledger backend '{}' is ready.",
            app_config.backend.implementation()
        );
        let event_processor =
            LoggingEventProcessor::new(app_config.ingest.processing_delay());
        Ok(Self::with_processor(
            dbp,
            event_processor,
            app_config.ingest.poll_interval(),
            app_config.ingest.processor_timeout(),
        ))
    }

    /// Return a new instance with an explicit ledger and [EventProcessor].
    pub fn with_processor(
        dbp: Arc<DatabaseProvider>,
        event_processor: Arc<dyn EventProcessor>,
        poll_interval: Duration,
        processor_timeout: Option<Duration>,
    ) -> Arc<Self> {
        let inbound_buffer = InboundBuffer::new();
        let counters = IngestCounters::new();
        let processing_loop = ProcessingLoop::new(
            &dbp,
            &inbound_buffer,
            event_processor,
            &counters,
            poll_interval,
            processor_timeout,
        );
        let stats_facade = StatsFacade::new(&dbp, &counters, &inbound_buffer, &processing_loop);
        Arc::new(Self {
            dbp,
            inbound_buffer,
            processing_loop,
            stats_facade,
        })
    }

    /// Validate and queue events for processing.
    ///
    /// Nothing is queued unless every event is valid. Returns the number of
    /// queued events.
    pub fn submit(&self, events: Vec<Event>) -> Result<usize, IngestError> {
        if events.is_empty() {
            return Err(IngestErrorKind::MalformedEvent.error_with_msg("No events were submitted."));
        }
        for (index, event) in events.iter().enumerate() {
            event.validate().map_err(|e| {
                IngestErrorKind::MalformedEvent
                    .error_with_msg(format!("Event at index {index} is invalid: {e}"))
            })?;
        }
        let count = events.len();
        for event in events {
            self.inbound_buffer.push(event);
        }
        if log::log_enabled!(log::Level::Trace) {
            log::trace!("Queued {count} event(s).");
        }
        Ok(count)
    }

    /// Start the processing loop. Does nothing if already started.
    pub fn start(&self) {
        self.processing_loop.start();
    }

    /// Stop the processing loop after the current event. Does nothing unless
    /// running.
    pub async fn stop(&self) {
        self.processing_loop.stop().await;
    }

    /// Return `true` while the processing loop is running.
    pub fn is_running(&self) -> bool {
        self.processing_loop.is_running()
    }

    /// Return `true` once the processing loop has been started.
    pub fn is_health_started(&self) -> bool {
        self.processing_loop.is_started()
    }

    /// Return `true` if the app is ready to recieve requests.
    pub fn is_health_ready(&self) -> bool {
        self.processing_loop.is_running() && self.is_health_live()
    }

    /// Return `true` if the app is functioning as expected and `false` if it
    /// needs to be restarted.
    pub fn is_health_live(&self) -> bool {
        self.processing_loop.is_alive()
    }

    /// See [StatsFacade::get_stats].
    pub async fn get_stats(&self) -> Result<IngestStats, IngestError> {
        self.stats_facade.get_stats().await
    }

    /// See [StatsFacade::get_events].
    pub async fn get_events(&self, topic_filter: Option<&str>) -> Result<Vec<DedupKey>, IngestError> {
        self.stats_facade.get_events(topic_filter).await
    }

    /// See [StatsFacade::health].
    pub fn health(&self) -> IngestHealth {
        self.stats_facade.health()
    }

    /// Administrative wipe of the dedup ledger. Counters are left as is.
    pub async fn clear_ledger(&self) -> Result<(), IngestError> {
        self.dbp.dedup_ledger_facade().clear().await
    }

    /// Invoked on graceful shutdowns.
    ///
    /// Stops the processing loop. Events left in the inbound buffer are
    /// dropped and rely on redelivery.
    pub async fn exit_hook(&self) {
        self.stop().await;
        self.inbound_buffer.close();
        let queued = self.inbound_buffer.len();
        if queued > 0 {
            log::warn!("Shutting down with {queued} unprocessed event(s) in the inbound buffer.");
        }
    }
}
