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

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

pub use ledgerline_core::conf::AppConfig;
pub use ledgerline_core::ingest::IngestPipeline;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::signal::unix::SignalKind;
use tokio::signal::unix::signal;

/// Application main entrypoint.
fn main() -> ExitCode {
    let startup_ts_micros = ledgerline_core::time::get_timestamp_micros();
    if let Err(e) = init_logger() {
        println!("Failed to initialize logging: {e:?}");
        return ExitCode::FAILURE;
    }
    #[cfg(feature = "tracing")]
    let _tracing_guard = {
        // Enable tracing via the RUST_LOG environment variable. Example:
        //
        // ```
        // RUST_LOG="actix_server=trace,actix_http=trace"
        // ```
        let (non_blocking, guard) = tracing_appender::non_blocking(std::io::stdout());
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
            .with_writer(non_blocking)
            .init();
        guard
    };
    let app_config = match AppConfig::new(env!("CARGO_PKG_NAME"), startup_ts_micros) {
        Ok(app_config) => Arc::new(app_config),
        Err(e) => {
            log::error!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    let runtime = if app_config.limits.cpus() > 0.0 {
        tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .worker_threads(app_config.limits.available_parallelism())
            .build()
    } else {
        // Defaults to using one thread per core when no limit is set.
        tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
    };
    match runtime {
        Ok(runtime) => runtime.block_on(run_async(app_config)),
        Err(e) => {
            log::error!("Failed to build async runtime: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initialize the logging system and apply filters.
fn init_logger() -> Result<(), log::SetLoggerError> {
    env_logger::builder()
        // Set default log level
        .filter_level(log::LevelFilter::Debug)
        // Customize logging for dependencies
        .filter(Some("actix_server::builder"), log::LevelFilter::Warn)
        .filter(Some("actix_http::h1"), log::LevelFilter::Debug)
        .filter(Some("mio::poll"), log::LevelFilter::Debug)
        .filter(Some("ledgerline_core::ingest"), log::LevelFilter::Debug)
        .filter(
            Some("ledgerline_core::ingest::processing_loop"),
            log::LevelFilter::Info,
        )
        .filter(
            Some("ledgerline_dbp_sqlite::sqlite_provider"),
            log::LevelFilter::Debug,
        )
        .write_style(env_logger::fmt::WriteStyle::Auto)
        .target(env_logger::fmt::Target::Stdout)
        .is_test(false)
        .parse_env(
            env_logger::Env::new()
                .filter("LOG_LEVEL")
                .write_style("LOG_STYLE"),
        )
        .try_init()
}

/// Async code entry point.
pub async fn run_async(app_config: Arc<AppConfig>) -> ExitCode {
    let pipeline = match IngestPipeline::new(&app_config) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            log::error!("Failed to create ingestion pipeline: {e}");
            return ExitCode::FAILURE;
        }
    };
    pipeline.start();
    log::info!(
        "Ready after {} micros.",
        ledgerline_core::time::get_timestamp_micros()
            .saturating_sub(app_config.startup_ts_micros())
    );
    let app_future = ledgerline_api::rest_api::run_http_server(&app_config, &pipeline);
    let res = tokio::select! {
        res = app_future => {
            log::trace!("app_future finished");
            res
        },
        res = block_until_signaled() => {
            log::trace!("signals_future finished");
            res
        },
    }
    .map_err(|e| log::error!("{e}"));
    pipeline.exit_hook().await;
    if res.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Block until SIGTERM or SIGINT is recieved.
async fn block_until_signaled() -> Result<(), Box<dyn core::error::Error>> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        _ = sigterm.recv() => {
            log::debug!("SIGTERM recieved.")
        },
        _ = sigint.recv() => {
            log::debug!("SIGINT recieved.")
        },
    };
    Ok(())
}
