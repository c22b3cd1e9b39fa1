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

//! Parsing of configuration for the processing loop.

use config::ConfigBuilder;
use config::ConfigError;
use config::builder::BuilderState;
use serde::Deserialize;
use serde::Serialize;
use std::time::Duration;

use super::AppConfigDefaults;

/// Configuration for the processing loop.
#[derive(Debug, Deserialize, Serialize)]
pub struct IngestConfig {
    /// See [Self::poll_interval()].
    pollintervalmillis: u64,
    /// See [Self::processing_delay()].
    processingdelaymicros: u64,
    /// See [Self::processor_timeout()].
    processortimeoutmillis: u64,
}

impl AppConfigDefaults for IngestConfig {
    /// Provide defaults for this part of the configuration
    fn set_defaults<T: BuilderState>(
        config_builder: ConfigBuilder<T>,
        prefix: &str,
    ) -> Result<ConfigBuilder<T>, ConfigError> {
        config_builder
            .set_default(prefix.to_string() + "." + "pollintervalmillis", "1000")?
            .set_default(prefix.to_string() + "." + "processingdelaymicros", "1000")?
            .set_default(prefix.to_string() + "." + "processortimeoutmillis", "0")
    }
}

impl IngestConfig {
    /// Max time the processing loop waits for the next event before it checks
    /// for a stop request again.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(std::cmp::max(1, self.pollintervalmillis))
    }

    /// Simulated I/O time of the default event processor.
    pub fn processing_delay(&self) -> Duration {
        Duration::from_micros(self.processingdelaymicros)
    }

    /// Max time the event processor may spend on a single event. `None` when
    /// configured as `0`.
    pub fn processor_timeout(&self) -> Option<Duration> {
        (self.processortimeoutmillis > 0).then(|| Duration::from_millis(self.processortimeoutmillis))
    }
}
