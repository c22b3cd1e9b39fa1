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

//! Parsing of application configuration.

mod api_config;
mod backend_config;
mod ingest_config;
mod limits_config;

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use config::builder::BuilderState;
use serde::Deserialize;
use serde::Serialize;

pub use self::api_config::ApiConfig;
pub use self::backend_config::BackendConfig;
pub use self::ingest_config::IngestConfig;
pub use self::limits_config::ResourceLimitsConfig;

/// Package name reported by Cargo at build time.
const CARGO_PKG_NAME: &str = env!("CARGO_PKG_NAME");
/// Package version reported by Cargo at build time.
const CARGO_PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Static trait for tracking implementations.
trait AppConfigDefaults {
    fn set_defaults<T: BuilderState>(
        config_builder: ConfigBuilder<T>,
        prefix: &str,
    ) -> Result<ConfigBuilder<T>, ConfigError>;
}

/**
Application configration root.

The application name defaults to the Rust package name, but can be overridden
with the environment variable `APP_NAME`.

Configuration will be loaded from

1. the file `{application name}.json` in the current working directory.
2. environment variable overrides in the form
   `{APPLICATION_NAME}_MODULE_CONFIGKEYWITHOUTSPACES`
 */
#[derive(Debug, Deserialize, Serialize)]
pub struct AppConfig {
    /// Configuration of the exposed REST API.
    pub api: ApiConfig,
    /// Configuration for the deduplication ledger backend.
    pub backend: BackendConfig,
    /// Configuration of the processing loop.
    pub ingest: IngestConfig,
    /// Resource detection and configuration overrides.
    pub limits: ResourceLimitsConfig,

    /// Lower case application name. Ignored when loading configuration.
    #[serde(skip_deserializing)]
    app_name: String,
    /// Time of application startup in epoch microseconds
    #[serde(skip_deserializing)]
    startup_ts_micros: u64,
}

impl AppConfig {
    /// The application name defaults to the Rust package name, but can be
    /// overridden with the environment variable `APP_NAME`.
    fn read_app_name_lowercase(cargo_pkg_name: &str) -> String {
        std::env::var("APP_NAME")
            .map_err(|e| {
                log::debug!(
                    "Environment variable APP_NAME: {e:?} -> Default app name '{cargo_pkg_name}' will be used."
                );
            })
            .ok()
            .map(|value| value.to_lowercase())
            .unwrap_or(cargo_pkg_name.to_owned())
    }

    /// Lower case application name.
    pub fn app_name_lowercase(&self) -> &str {
        &self.app_name
    }

    /// SemVer application version derived fromt the Rust package version.
    pub fn app_version(&self) -> &'static str {
        CARGO_PKG_VERSION
    }

    /// Time of application startup in epoch microseconds
    pub fn startup_ts_micros(&self) -> u64 {
        self.startup_ts_micros
    }

    /** Creates a new instance pre-populated with defaults, an optional
    configurations file and environment variable overrides.

    Use `env!("CARGO_PKG_NAME")` as `cargo_pkg_name`.
    */
    pub fn new(cargo_pkg_name: &str, startup_ts_micros: u64) -> Result<Self, ConfigError> {
        let app_name = Self::read_app_name_lowercase(cargo_pkg_name);
        let config_filename = app_name.to_owned() + ".json";
        let config_env_prefix = &app_name.to_uppercase();
        let conf_file = std::env::current_dir()
            .map_err(|e| ConfigError::Foreign(Box::new(e)))?
            .join(config_filename);
        if log::log_enabled!(log::Level::Debug) {
            log::debug!(
                "Will load '{}' configuration if present.",
                conf_file.display()
            );
        }
        let config = Self::defaults()?
            .add_source(File::from(conf_file).required(false))
            .add_source(
                Environment::with_prefix(config_env_prefix)
                    .separator("_")
                    .list_separator(","),
            )
            .build()?;
        let app_config = Self::from_config(config, app_name, startup_ts_micros)?;
        log::info!("Running with configuration: {app_config:?}");
        if log::log_enabled!(log::Level::Trace)
            && let Ok(json) = serde_json::to_string(&app_config)
        {
            log::trace!("Running with configuration: {json}");
        }
        Ok(app_config)
    }

    /// Return a configuration made of defaults only.
    pub fn with_defaults() -> Result<Self, ConfigError> {
        let config = Self::defaults()?.build()?;
        Self::from_config(config, CARGO_PKG_NAME.to_owned(), 0)
    }

    fn defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        let mut config_builder = Config::builder();
        config_builder = ApiConfig::set_defaults(config_builder, "api")?;
        config_builder = BackendConfig::set_defaults(config_builder, "backend")?;
        config_builder = IngestConfig::set_defaults(config_builder, "ingest")?;
        config_builder = ResourceLimitsConfig::set_defaults(config_builder, "limits")?;
        Ok(config_builder)
    }

    fn from_config(
        config: Config,
        app_name: String,
        startup_ts_micros: u64,
    ) -> Result<Self, ConfigError> {
        let mut app_config: AppConfig = config.try_deserialize()?;
        app_config.app_name = app_name;
        app_config.startup_ts_micros = startup_ts_micros;
        Ok(app_config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_defaults() {
        let app_config = AppConfig::with_defaults().unwrap();
        assert_eq!(app_config.api.bind_address(), "0.0.0.0");
        assert_eq!(app_config.api.bind_port(), 8080);
        assert_eq!(app_config.backend.implementation(), "sqlite");
        assert_eq!(
            app_config.backend.path(),
            std::path::Path::new("data/dedup.db")
        );
        assert_eq!(app_config.ingest.poll_interval(), Duration::from_millis(1000));
        assert_eq!(app_config.ingest.processing_delay(), Duration::from_micros(1000));
        assert_eq!(app_config.ingest.processor_timeout(), None);
        assert!(app_config.limits.available_parallelism() >= 1);
    }

    #[test]
    fn test_overrides_are_parsed_from_strings() {
        let config = AppConfig::defaults()
            .unwrap()
            .set_override("backend.implementation", "mem")
            .unwrap()
            .set_override("ingest.processortimeoutmillis", "250")
            .unwrap()
            .set_override("limits.cpus", "2.5")
            .unwrap()
            .build()
            .unwrap();
        let app_config = AppConfig::from_config(config, "test".to_owned(), 42).unwrap();
        assert_eq!(app_config.backend.implementation(), "mem");
        assert_eq!(
            app_config.ingest.processor_timeout(),
            Some(Duration::from_millis(250))
        );
        assert_eq!(app_config.limits.available_parallelism(), 3);
        assert_eq!(app_config.app_name_lowercase(), "test");
        assert_eq!(app_config.startup_ts_micros(), 42);
    }
}
