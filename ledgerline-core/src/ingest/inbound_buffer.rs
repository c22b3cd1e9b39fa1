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

//! Buffer of events between submission and processing.

use crossbeam_skiplist::SkipMap;
use ledgerline_dbp::ingest::Event;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::sync::Semaphore;

/** Unbounded, ordered hand-off queue of pending [Event]s.

Any number of producers may [push](Self::push) concurrently without blocking.
Events from a single producer are popped in submission order.

The semaphore holds exactly one permit per queued event, so a consumer that
acquired a permit is guaranteed to find an event to pop.
*/
pub struct InboundBuffer {
    events: SkipMap<u64, Event>,
    next_sequence: AtomicU64,
    available: Semaphore,
}

impl InboundBuffer {
    /// Return a new instance.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            events: SkipMap::new(),
            next_sequence: AtomicU64::default(),
            available: Semaphore::new(0),
        })
    }

    /// Queue an event for processing.
    pub fn push(&self, event: Event) {
        let sequence = self.next_sequence.fetch_add(1, Ordering::Relaxed);
        self.events.insert(sequence, event);
        self.available.add_permits(1);
    }

    /// Return the oldest queued event or `None` if nothing arrived before the
    /// `timeout` or the buffer was closed.
    pub async fn pop(&self, timeout: Duration) -> Option<Event> {
        match tokio::time::timeout(timeout, self.available.acquire()).await {
            Ok(Ok(permit)) => {
                permit.forget();
                self.events
                    .pop_front()
                    .map(|entry| entry.value().to_owned())
            }
            Ok(Err(_closed)) => None,
            Err(_elapsed) => None,
        }
    }

    /// Wake up waiting consumers and make further [Self::pop] calls return
    /// `None` right away. Queued events are kept.
    pub fn close(&self) {
        self.available.close();
    }

    /// Return a guesstimate of the number of queued events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Return `true` if no events are queued.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn event(topic: &str, event_id: &str) -> Event {
        Event::new(topic, event_id, "2025-01-01T00:00:00Z", "test", Map::new())
    }

    #[tokio::test]
    async fn test_fifo_for_single_producer() {
        let buffer = InboundBuffer::new();
        for i in 0..10 {
            buffer.push(event("t", &format!("evt-{i}")));
        }
        assert_eq!(buffer.len(), 10);
        for i in 0..10 {
            let popped = buffer.pop(Duration::from_millis(10)).await.unwrap();
            assert_eq!(popped.event_id(), format!("evt-{i}"));
        }
        assert!(buffer.is_empty());
    }

    #[tokio::test]
    async fn test_pop_times_out_when_empty() {
        let buffer = InboundBuffer::new();
        assert!(buffer.pop(Duration::from_millis(20)).await.is_none());
    }

    #[tokio::test]
    async fn test_pop_waits_for_push() {
        let buffer = InboundBuffer::new();
        let buffer_clone = Arc::clone(&buffer);
        let consumer =
            tokio::spawn(async move { buffer_clone.pop(Duration::from_secs(5)).await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        buffer.push(event("t", "late"));
        let popped = consumer.await.unwrap().unwrap();
        assert_eq!(popped.event_id(), "late");
    }

    #[tokio::test]
    async fn test_close_releases_consumer() {
        let buffer = InboundBuffer::new();
        buffer.push(event("t", "queued"));
        let _ = buffer.pop(Duration::from_millis(10)).await;
        let buffer_clone = Arc::clone(&buffer);
        let consumer =
            tokio::spawn(async move { buffer_clone.pop(Duration::from_secs(30)).await });
        buffer.close();
        let popped = tokio::time::timeout(Duration::from_secs(5), consumer)
            .await
            .unwrap()
            .unwrap();
        assert!(popped.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_producers_keep_per_producer_order() {
        let buffer = InboundBuffer::new();
        let producers = (0..4)
            .map(|producer| {
                let buffer = Arc::clone(&buffer);
                tokio::spawn(async move {
                    for i in 0..250 {
                        buffer.push(event(&format!("p{producer}"), &i.to_string()));
                    }
                })
            })
            .collect::<Vec<_>>();
        for producer in producers {
            producer.await.unwrap();
        }
        let mut last_seen = std::collections::HashMap::<String, i64>::new();
        let mut popped_count = 0;
        while let Some(popped) = buffer.pop(Duration::from_millis(10)).await {
            let id = popped.event_id().parse::<i64>().unwrap();
            let last = last_seen.entry(popped.topic().to_owned()).or_insert(-1);
            assert!(id > *last);
            *last = id;
            popped_count += 1;
        }
        assert_eq!(popped_count, 1000);
    }
}
