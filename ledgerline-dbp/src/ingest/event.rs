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

//! Event model.

use crate::ingest::DedupKey;
use crate::ingest::IngestError;
use crate::ingest::IngestErrorKind;
use chrono::DateTime;
use chrono::NaiveDate;
use chrono::NaiveTime;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

/** A unit of work to be processed exactly once.

The pair `(topic, event_id)` is the only dedup key. The `timestamp` and
`source` are advisory and the `payload` is passed through unmodified to the
processing side-effect.
*/
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    topic: String,
    event_id: String,
    timestamp: String,
    source: String,
    #[serde(default)]
    payload: Map<String, Value>,
}

impl Event {
    /// Max number of characters in `topic`, `event_id` and `source`.
    pub const MAX_FIELD_CHARS: usize = 255;

    /// Return a new instance.
    pub fn new(
        topic: &str,
        event_id: &str,
        timestamp: &str,
        source: &str,
        payload: Map<String, Value>,
    ) -> Self {
        Self {
            topic: topic.to_owned(),
            event_id: event_id.to_owned(),
            timestamp: timestamp.to_owned(),
            source: source.to_owned(),
            payload,
        }
    }

    /// Return the topic that partitions the idempotency namespace.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Return the producer assigned identifier that is unique within the topic.
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    /// Return the producer supplied date-time string.
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Return the producer identity.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Return the opaque payload.
    pub fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }

    /// Return the dedup key of this event.
    pub fn dedup_key(&self) -> DedupKey {
        DedupKey::new(&self.topic, &self.event_id)
    }

    /// Validate the shape of the event.
    pub fn validate(&self) -> Result<(), IngestError> {
        Self::assert_bounded_non_empty("topic", &self.topic)?;
        Self::assert_bounded_non_empty("event_id", &self.event_id)?;
        Self::assert_bounded_non_empty("source", &self.source)?;
        if !Self::is_iso8601(&self.timestamp) {
            Err(IngestErrorKind::MalformedEvent.error_with_msg(format!(
                "'timestamp' must be in ISO-8601 format. Got '{}'.",
                self.timestamp
            )))?;
        }
        Ok(())
    }

    fn assert_bounded_non_empty(name: &str, value: &str) -> Result<(), IngestError> {
        if value.is_empty() {
            Err(IngestErrorKind::MalformedEvent.error_with_msg(format!("'{name}' is empty.")))
        } else if value.chars().count() > Self::MAX_FIELD_CHARS {
            Err(IngestErrorKind::MalformedEvent.error_with_msg(format!(
                "'{name}' exceeds {} characters.",
                Self::MAX_FIELD_CHARS
            )))
        } else {
            Ok(())
        }
    }

    /// Return `true` if the value is an ISO-8601 calendar date, optionally
    /// followed by a time of day and a UTC offset.
    ///
    /// The time of day may be `HH`, `HH:MM` or `HH:MM:SS[.fraction]`, the
    /// separator `T` or a space and the offset `Z`, `±HH:MM`, `±HHMM` or
    /// `±HH:MM:SS`.
    fn is_iso8601(value: &str) -> bool {
        if DateTime::parse_from_rfc3339(value).is_ok() {
            return true;
        }
        let Some((date, rest)) = value.split_at_checked(10) else {
            return false;
        };
        if NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
            return false;
        }
        let mut chars = rest.chars();
        match chars.next() {
            None => true,
            Some('T' | 't' | ' ') => Self::is_iso8601_time(chars.as_str()),
            Some(_) => false,
        }
    }

    fn is_iso8601_time(value: &str) -> bool {
        let (time, offset) = value
            .find(['Z', 'z', '+', '-'])
            .map(|index| value.split_at(index))
            .unwrap_or((value, ""));
        Self::is_time_of_day(time) && Self::is_utc_offset(offset)
    }

    fn is_time_of_day(value: &str) -> bool {
        if value.len() == 2 {
            // Hour only
            return NaiveTime::parse_from_str(&format!("{value}:00"), "%H:%M").is_ok();
        }
        NaiveTime::parse_from_str(value, "%H:%M:%S%.f").is_ok()
            || NaiveTime::parse_from_str(value, "%H:%M").is_ok()
    }

    fn is_utc_offset(value: &str) -> bool {
        let mut chars = value.chars();
        match chars.next() {
            None => true,
            Some('Z' | 'z') => chars.as_str().is_empty(),
            Some('+' | '-') => {
                let offset = chars.as_str();
                ["%H:%M", "%H%M", "%H:%M:%S%.f"]
                    .iter()
                    .any(|format| NaiveTime::parse_from_str(offset, format).is_ok())
            }
            Some(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event_with(topic: &str, event_id: &str, timestamp: &str, source: &str) -> Event {
        Event::new(topic, event_id, timestamp, source, Map::new())
    }

    #[test]
    fn accepts_well_formed_event() {
        let event = event_with("application.logs", "evt-1", "2025-10-25T10:30:00Z", "svc");
        assert!(event.validate().is_ok());
    }

    #[test]
    fn accepts_iso8601_variants() {
        for timestamp in [
            "2025-10-25T10:30:00Z",
            "2025-10-25T10:30:00.123456+02:00",
            "2025-10-25T10:30:00",
            "2025-10-25T10:30:00.5",
            "2025-10-25 10:30:00",
            "2025-10-25T10:30",
            "2025-10-25T10:30+02:00",
            "2025-10-25T10:30-0530",
            "2025-10-25T10:30:00+0200",
            "2025-10-25T10:30:00.250Z",
            "2025-10-25T10",
            "2025-10-25T10Z",
            "2025-10-25 10:30:00+01:00:30",
            "2025-10-25",
        ] {
            let event = event_with("t", "e", timestamp, "s");
            assert!(event.validate().is_ok(), "rejected '{timestamp}'");
        }
    }

    #[test]
    fn rejects_invalid_timestamp() {
        for timestamp in [
            "",
            "yesterday",
            "2025-13-01T00:00:00Z",
            "25/10/2025",
            "2025-10-25T25",
            "2025-10-25T10:30+25:00",
            "2025-10-25T10:30Zulu",
            "2025-10-25X10:30",
            "2025-10-25T",
        ] {
            let err = event_with("t", "e", timestamp, "s").validate().unwrap_err();
            assert_eq!(err.kind(), &IngestErrorKind::MalformedEvent);
        }
    }

    #[test]
    fn rejects_empty_and_oversized_fields() {
        let long = "x".repeat(Event::MAX_FIELD_CHARS + 1);
        let max = "x".repeat(Event::MAX_FIELD_CHARS);
        assert!(event_with("", "e", "2025-01-01", "s").validate().is_err());
        assert!(event_with("t", "", "2025-01-01", "s").validate().is_err());
        assert!(event_with("t", "e", "2025-01-01", "").validate().is_err());
        assert!(event_with(&long, "e", "2025-01-01", "s").validate().is_err());
        assert!(event_with("t", &long, "2025-01-01", "s").validate().is_err());
        assert!(event_with("t", "e", "2025-01-01", &long).validate().is_err());
        assert!(event_with(&max, &max, "2025-01-01", &max).validate().is_ok());
    }

    #[test]
    fn payload_defaults_to_empty_object() {
        let event: Event = serde_json::from_str(
            r#"{"topic":"t","event_id":"e","timestamp":"2025-01-01T00:00:00Z","source":"s"}"#,
        )
        .unwrap();
        assert!(event.payload().is_empty());
        assert_eq!(event.dedup_key(), DedupKey::new("t", "e"));
    }

    #[test]
    fn payload_is_passed_through() {
        let event: Event = serde_json::from_str(
            r#"{"topic":"t","event_id":"e","timestamp":"2025-01-01T00:00:00Z","source":"s",
                "payload":{"level":"INFO","nested":{"n":[1,2,3]}}}"#,
        )
        .unwrap();
        assert_eq!(event.payload()["level"], "INFO");
        assert_eq!(event.payload()["nested"]["n"][2], 3);
    }
}
