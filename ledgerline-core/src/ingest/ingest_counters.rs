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

//! Process-lifetime counters of the processing loop.

use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;
use std::time::Instant;

/** Process-lifetime counters of the processing loop.

Only the processing loop increments the counters. Readers get relaxed,
eventually consistent values. Counters start at zero and are never persisted.
*/
pub struct IngestCounters {
    received: AtomicU64,
    unique_processed: AtomicU64,
    duplicate_dropped: AtomicU64,
    start_time: Instant,
}

impl IngestCounters {
    /// Return a new instance.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            received: AtomicU64::default(),
            unique_processed: AtomicU64::default(),
            duplicate_dropped: AtomicU64::default(),
            start_time: Instant::now(),
        })
    }

    /// Number of events popped from the inbound buffer.
    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    /// Number of events that won the dedup decision.
    pub fn unique_processed(&self) -> u64 {
        self.unique_processed.load(Ordering::Relaxed)
    }

    /// Number of events dropped as duplicates.
    pub fn duplicate_dropped(&self) -> u64 {
        self.duplicate_dropped.load(Ordering::Relaxed)
    }

    /// Time since the counters were created.
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub(crate) fn inc_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_unique_processed(&self) {
        self.unique_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_duplicate_dropped(&self) {
        self.duplicate_dropped.fetch_add(1, Ordering::Relaxed);
    }
}
