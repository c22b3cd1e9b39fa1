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

//! Deduplication key.

use serde::Deserialize;
use serde::Serialize;

/// The `(topic, event_id)` pair identifying a logically unique event.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DedupKey {
    topic: String,
    event_id: String,
}

impl DedupKey {
    /// Return a new instance.
    pub fn new(topic: &str, event_id: &str) -> Self {
        Self {
            topic: topic.to_owned(),
            event_id: event_id.to_owned(),
        }
    }

    /// Return the topic.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Return the producer assigned event identifier.
    pub fn event_id(&self) -> &str {
        &self.event_id
    }
}

impl From<(String, String)> for DedupKey {
    fn from((topic, event_id): (String, String)) -> Self {
        Self { topic, event_id }
    }
}
