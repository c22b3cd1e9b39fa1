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

//! Parsing of configuration for resource limits.

use config::ConfigBuilder;
use config::ConfigError;
use config::builder::BuilderState;
use serde::Deserialize;
use serde::Serialize;

use super::AppConfigDefaults;

/// Resource detection and configuration overrides.
#[derive(Debug, Deserialize, Serialize)]
pub struct ResourceLimitsConfig {
    /// Number of CPUs available to the application. `0` means auto-detect.
    cpus: f64,
}

impl AppConfigDefaults for ResourceLimitsConfig {
    /// Provide defaults for this part of the configuration
    fn set_defaults<T: BuilderState>(
        config_builder: ConfigBuilder<T>,
        prefix: &str,
    ) -> Result<ConfigBuilder<T>, ConfigError> {
        config_builder.set_default(prefix.to_string() + "." + "cpus", "0")
    }
}

impl ResourceLimitsConfig {
    /// Configured number of CPUs. `0` when detection is used.
    pub fn cpus(&self) -> f64 {
        self.cpus
    }

    /// Number of worker threads to use. Fractional CPU limits are rounded up.
    pub fn available_parallelism(&self) -> usize {
        if self.cpus > 0.0 {
            std::cmp::max(1, self.cpus.ceil() as usize)
        } else {
            std::thread::available_parallelism()
                .map(usize::from)
                .unwrap_or(1)
        }
    }
}
