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

//! The single consumer of the inbound buffer.

use super::EventProcessor;
use super::InboundBuffer;
use super::IngestCounters;
use crate::util::LogScopeDuration;
use futures::FutureExt;
use ledgerline_dbp::dbp::DatabaseProvider;
use ledgerline_dbp::dbp::facades::DatabaseProviderFacades;
use ledgerline_dbp::ingest::Event;
use ledgerline_dbp::ingest::IngestError;
use ledgerline_dbp::ingest::IngestErrorKind;
use parking_lot::Mutex;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::AtomicU8;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

/// Result of the dedup decision for a single event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProcessingOutcome {
    /// This event won the dedup decision and was handed to the
    /// [EventProcessor].
    Unique,
    /// The dedup key was already marked. No side-effect was invoked.
    Duplicate,
    /// The ledger failed. The event was dropped without being marked and is
    /// expected to be redelivered by the producer.
    StorageFault,
}

/** The single consumer of the [InboundBuffer].

For each event the loop atomically checks-and-marks the dedup key in the
ledger and invokes the [EventProcessor] only if this was the first mark. At
most one event is in flight at any time.

Lifecycle: `Initial` -> [start](Self::start) -> `Running` ->
[stop](Self::stop) -> `Stopped`. A stopped loop cannot be restarted.
*/
pub struct ProcessingLoop {
    dbp: Arc<DatabaseProvider>,
    inbound_buffer: Arc<InboundBuffer>,
    event_processor: Arc<dyn EventProcessor>,
    counters: Arc<IngestCounters>,
    poll_interval: Duration,
    processor_timeout: Option<Duration>,
    state: AtomicU8,
    /// Closed to wake up the loop when a stop is requested.
    stop_signal: Semaphore,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ProcessingLoop {
    const STATE_INITIAL: u8 = 0;
    const STATE_RUNNING: u8 = 1;
    const STATE_STOPPED: u8 = 2;

    /// Return a new instance.
    pub fn new(
        dbp: &Arc<DatabaseProvider>,
        inbound_buffer: &Arc<InboundBuffer>,
        event_processor: Arc<dyn EventProcessor>,
        counters: &Arc<IngestCounters>,
        poll_interval: Duration,
        processor_timeout: Option<Duration>,
    ) -> Arc<Self> {
        Arc::new(Self {
            dbp: Arc::clone(dbp),
            inbound_buffer: Arc::clone(inbound_buffer),
            event_processor,
            counters: Arc::clone(counters),
            poll_interval,
            processor_timeout,
            state: AtomicU8::new(Self::STATE_INITIAL),
            stop_signal: Semaphore::new(0),
            task: Mutex::new(None),
        })
    }

    /// Return `true` while the loop is running.
    pub fn is_running(&self) -> bool {
        self.state.load(Ordering::Acquire) == Self::STATE_RUNNING
    }

    /// Return `true` once [start](Self::start) has been invoked.
    pub fn is_started(&self) -> bool {
        self.state.load(Ordering::Acquire) != Self::STATE_INITIAL
    }

    /// Return `false` if the loop task ended while the loop should be
    /// running.
    pub fn is_alive(&self) -> bool {
        !self.is_running()
            || self
                .task
                .lock()
                .as_ref()
                .is_none_or(|handle| !handle.is_finished())
    }

    /// Start consuming the inbound buffer in a background task.
    ///
    /// Does nothing unless the loop is in its initial state.
    pub fn start(self: &Arc<Self>) {
        // Held until the handle is stored so a concurrent stop always finds it.
        let mut task = self.task.lock();
        if self
            .state
            .compare_exchange(
                Self::STATE_INITIAL,
                Self::STATE_RUNNING,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            log::debug!("Ignoring start request. Processing loop was already started.");
            return;
        }
        let self_clone = Arc::clone(self);
        *task = Some(tokio::spawn(async move { self_clone.run().await }));
        log::info!("Processing loop started.");
    }

    /// Stop the loop and wait for the event in flight (if any) to finish.
    ///
    /// Events still in the inbound buffer are left unprocessed. Does nothing
    /// unless the loop is running.
    pub async fn stop(&self) {
        if self
            .state
            .compare_exchange(
                Self::STATE_RUNNING,
                Self::STATE_STOPPED,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            log::debug!("Ignoring stop request. Processing loop is not running.");
            return;
        }
        self.stop_signal.close();
        let handle = self.task.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                log::error!("Processing loop task failed: {e}");
            }
        }
        log::info!(
            "Processing loop stopped with {} event(s) left in the inbound buffer.",
            self.inbound_buffer.len()
        );
    }

    async fn run(&self) {
        while self.is_running() {
            // A pop is only cancelled before it takes an event from the buffer.
            let event_opt = tokio::select! {
                biased;
                _ = self.stop_signal.acquire() => None,
                event_opt = self.inbound_buffer.pop(self.poll_interval) => event_opt,
            };
            if let Some(event) = event_opt {
                let outcome = self.process_event(event).await;
                log::trace!("Processing outcome: {outcome:?}");
            }
        }
    }

    /// Make the dedup decision for a single event and invoke the
    /// [EventProcessor] if it won.
    async fn process_event(&self, event: Event) -> ProcessingOutcome {
        let _scope =
            LogScopeDuration::for_event(log::Level::Trace, module_path!(), "process_event", &event);
        self.counters.inc_received();
        let outcome = self.check_and_mark(&event).await;
        match outcome {
            ProcessingOutcome::Unique => {
                self.counters.inc_unique_processed();
                log::info!(
                    "Event processed: topic={}, event_id={}, source={}",
                    event.topic(),
                    event.event_id(),
                    event.source()
                );
                self.invoke_event_processor(&event).await;
            }
            ProcessingOutcome::Duplicate => {
                self.counters.inc_duplicate_dropped();
            }
            ProcessingOutcome::StorageFault => {}
        }
        outcome
    }

    /// Consult the ledger. `mark_processed` is authoritative, the
    /// `is_duplicate` fast path only saves a write for obvious repeats.
    async fn check_and_mark(&self, event: &Event) -> ProcessingOutcome {
        let ledger = self.dbp.dedup_ledger_facade();
        let result = match ledger.is_duplicate(event.topic(), event.event_id()).await {
            Ok(true) => {
                log::info!(
                    "Duplicate event dropped: topic={}, event_id={}, source={}",
                    event.topic(),
                    event.event_id(),
                    event.source()
                );
                Ok(false)
            }
            Ok(false) => ledger
                .mark_processed(event.topic(), event.event_id())
                .await
                .inspect(|marked| {
                    if !marked {
                        log::info!(
                            "Duplicate event (lost race): topic={}, event_id={}, source={}",
                            event.topic(),
                            event.event_id(),
                            event.source()
                        );
                    }
                }),
            Err(e) => Err(e),
        };
        match result {
            Ok(true) => ProcessingOutcome::Unique,
            Ok(false) => ProcessingOutcome::Duplicate,
            Err(e) => {
                log::error!(
                    "Dropped event without marking it: topic={}, event_id={}. Relying on redelivery. {e}",
                    event.topic(),
                    event.event_id(),
                );
                ProcessingOutcome::StorageFault
            }
        }
    }

    /// Invoke the side-effect. Failures, panics and timeouts are logged and
    /// never undo the dedup decision.
    async fn invoke_event_processor(&self, event: &Event) {
        let processing = AssertUnwindSafe(self.event_processor.process_event(event)).catch_unwind();
        let result = if let Some(processor_timeout) = self.processor_timeout {
            tokio::time::timeout(processor_timeout, processing)
                .await
                .unwrap_or_else(|_elapsed| {
                    Ok(Err(IngestErrorKind::ProcessorFailure.error_with_msg(format!(
                        "Processing did not finish within {} ms.",
                        processor_timeout.as_millis()
                    ))))
                })
        } else {
            processing.await
        };
        match result {
            Ok(Ok(())) => {
                if log::log_enabled!(log::Level::Trace) {
                    log::trace!(
                        "Processing of '{}/{}' completed.",
                        event.topic(),
                        event.event_id()
                    );
                }
            }
            Ok(Err(e)) => Self::log_processor_failure(event, &e),
            Err(_panic) => Self::log_processor_failure(
                event,
                &IngestErrorKind::ProcessorFailure.error_with_msg("Event processor panicked."),
            ),
        }
    }

    fn log_processor_failure(event: &Event, e: &IngestError) {
        log::warn!(
            "Processing of '{}/{}' failed. The event stays marked as processed. {e}",
            event.topic(),
            event.event_id()
        );
    }
}
