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

//! REST API server and resources.
//!
//! Ingress of events and read-only views of the ingestion state.

mod http_resources {
    //! API resources

    pub mod events_resource;
    pub mod publish_resource;
    pub mod stats_resource;
}
mod common {
    //! Common REST API resources and utils.

    mod api_error_mapper;

    pub use api_error_mapper::*;
}
mod health_resources;

use actix_web::App;
use actix_web::HttpResponse;
use actix_web::HttpServer;
use actix_web::Responder;
use actix_web::get;
use actix_web::http::header::ContentType;
use actix_web::web;
use ledgerline_core::conf::AppConfig;
use ledgerline_core::ingest::IngestPipeline;
use std::sync::Arc;
use utoipa::OpenApi;

/// Number of parallel requests the can be served for each assigned CPU core.
const WORKERS_PER_CORE: usize = 1024;

/// Shared state between requests.
#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<IngestPipeline>,
    app_name: String,
    app_version: String,
}

impl AppState {
    /// Return a new instance wrapped for use as Actix-web app data.
    pub fn new_app_data(
        pipeline: &Arc<IngestPipeline>,
        app_name: &str,
        app_version: &str,
    ) -> web::Data<Self> {
        web::Data::new(Self {
            pipeline: Arc::clone(pipeline),
            app_name: app_name.to_owned(),
            app_version: app_version.to_owned(),
        })
    }
}

/// Register all API resources.
///
/// [AppState] must be registered as app data.
pub fn configure_services(cfg: &mut web::ServiceConfig) {
    cfg.service(get_openapi)
        .service(http_resources::publish_resource::publish_events)
        .service(http_resources::events_resource::processed_events)
        .service(http_resources::stats_resource::ingest_stats)
        .service(health_resources::root)
        .service(health_resources::health)
        .service(health_resources::health_live)
        .service(health_resources::health_ready)
        .service(health_resources::health_started);
}

/// Run HTTP server.
pub async fn run_http_server(
    app_config: &Arc<AppConfig>,
    pipeline: &Arc<IngestPipeline>,
) -> Result<(), Box<dyn core::error::Error>> {
    let workers = app_config.limits.available_parallelism();
    let max_connections = WORKERS_PER_CORE * workers;
    log::info!(
        "API described by http://{}:{}/openapi.json allows {max_connections} concurrent connections.",
        &app_config.api.bind_address(),
        &app_config.api.bind_port(),
    );
    let app_data = AppState::new_app_data(
        pipeline,
        app_config.app_name_lowercase(),
        app_config.app_version(),
    );
    HttpServer::new(move || {
        App::new()
            .app_data(app_data.clone())
            .configure(configure_services)
    })
    .workers(workers)
    .backlog(u32::try_from(max_connections / 2).unwrap_or(2048))
    .worker_max_blocking_threads(max_connections)
    .max_connections(max_connections)
    .bind_auto_h2c((app_config.api.bind_address(), app_config.api.bind_port()))?
    .disable_signals()
    .shutdown_timeout(5) // Default 30
    .run()
    .await?;
    Ok(())
}

/// Serve Open API documentation.
#[get("/openapi.json")]
async fn get_openapi() -> impl Responder {
    HttpResponse::Ok()
        .content_type(ContentType::json())
        .body(openapi_as_string())
}

/// Get the OpenAPI definition as a pretty JSON String.
pub fn openapi_as_string() -> String {
    #[derive(OpenApi)]
    #[openapi(
        // Use Cargo.toml as source for the "info" section
        paths(
            http_resources::publish_resource::publish_events,
            http_resources::events_resource::processed_events,
            http_resources::stats_resource::ingest_stats,
            health_resources::root,
            health_resources::health,
            health_resources::health_live,
            health_resources::health_ready,
            health_resources::health_started,
        )
    )]
    struct ApiDoc;
    ApiDoc::openapi().to_pretty_json().unwrap_or_else(|e| {
        log::error!("Failed to serialize OpenAPI document: {e}");
        String::from("{}")
    })
}
