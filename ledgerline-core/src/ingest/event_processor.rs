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

//! Processor of events that won the dedup decision.

use ledgerline_dbp::ingest::Event;
use ledgerline_dbp::ingest::IngestError;
use std::sync::Arc;
use std::time::Duration;

/// Processing side-effect invoked exactly once per unique dedup key.
///
/// Failures are logged by the processing loop. They do not revert the ledger
/// entry and the event is not processed again.
#[async_trait::async_trait]
pub trait EventProcessor: Send + Sync + 'static {
    /// Handle an event that has been marked as processed in the ledger.
    async fn process_event(&self, event: &Event) -> Result<(), IngestError>;
}

/// Default [EventProcessor] that simulates some I/O and logs the payload.
pub struct LoggingEventProcessor {
    processing_delay: Duration,
}

impl LoggingEventProcessor {
    /// Return a new instance.
    pub fn new(processing_delay: Duration) -> Arc<Self> {
        Arc::new(Self { processing_delay })
    }
}

#[async_trait::async_trait]
impl EventProcessor for LoggingEventProcessor {
    async fn process_event(&self, event: &Event) -> Result<(), IngestError> {
        if !self.processing_delay.is_zero() {
            tokio::time::sleep(self.processing_delay).await;
        }
        if log::log_enabled!(log::Level::Debug) {
            log::debug!(
                "Processing payload of '{}/{}': {:?}",
                event.topic(),
                event.event_id(),
                event.payload()
            );
        }
        Ok(())
    }
}
