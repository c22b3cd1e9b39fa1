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

//! Logging of how long a request or an event took to handle.

use ledgerline_dbp::ingest::Event;
use std::time::Duration;
use std::time::Instant;

/// Log the time spent in a scope when the instance is dropped.
///
/// Nothing is allocated or measured unless `level` is enabled for the
/// `module_path` target.
pub struct LogScopeDuration<'a> {
    level: log::Level,
    module_path: &'a str,
    scope: String,
    started: Instant,
    threshold: Duration,
}

impl<'a> LogScopeDuration<'a> {
    /// Measure a named scope. Durations below `threshold` are not logged.
    ///
    /// You can retrieve the module path of the caller using the `module_path!()` macro.
    pub fn new(
        level: log::Level,
        module_path: &'a str,
        scope_name: &str,
        threshold: Duration,
    ) -> Option<Self> {
        Self::with_scope(level, module_path, threshold, || scope_name.to_owned())
    }

    /// Measure handling of a single event. The dedup key is part of the
    /// logged scope.
    pub fn for_event(
        level: log::Level,
        module_path: &'a str,
        scope_name: &str,
        event: &Event,
    ) -> Option<Self> {
        Self::with_scope(level, module_path, Duration::ZERO, || {
            format!("{scope_name} {}/{}", event.topic(), event.event_id())
        })
    }

    fn with_scope<F: FnOnce() -> String>(
        level: log::Level,
        module_path: &'a str,
        threshold: Duration,
        scope: F,
    ) -> Option<Self> {
        log::log_enabled!(target: module_path, level).then(|| Self {
            level,
            module_path,
            scope: scope(),
            started: Instant::now(),
            threshold,
        })
    }

    /// The logged name of the scope.
    pub fn scope(&self) -> &str {
        &self.scope
    }
}

impl Drop for LogScopeDuration<'_> {
    fn drop(&mut self) {
        let elapsed = self.started.elapsed();
        if elapsed >= self.threshold {
            log::log!(
                target: self.module_path,
                self.level,
                "'{}' took {} µs.",
                self.scope,
                elapsed.as_micros()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    /// Initialize logging.
    pub fn init_logger() {
        let _ = env_logger::builder()
            .is_test(true)
            .filter_level(log::LevelFilter::Debug)
            .try_init();
    }

    #[test]
    fn test_event_scope_carries_dedup_key() {
        init_logger();
        let event = Event::new("orders", "evt-7", "2025-01-01", "shop", Map::new());
        let scope = LogScopeDuration::for_event(log::Level::Debug, module_path!(), "process", &event);
        assert_eq!(
            scope.as_ref().map(LogScopeDuration::scope),
            Some("process orders/evt-7")
        );
    }

    #[test]
    fn test_disabled_level_is_not_measured() {
        init_logger();
        let filtered = LogScopeDuration::new(
            log::Level::Trace,
            module_path!(),
            "filtered by log level",
            Duration::ZERO,
        );
        assert!(filtered.is_none());
    }
}
