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

//! Service banner and health check resources.
//!
//! The probes follow the Kubernetes conventions: `200 OK` when the check
//! passes and `503 Service Unavailable` otherwise.

use crate::rest_api::AppState;
use actix_web::HttpResponse;
use actix_web::Responder;
use actix_web::get;
use actix_web::http::StatusCode;
use actix_web::web::Data;
use serde_json::json;

/// Service banner.
#[utoipa::path(
    tag = "health",
    responses(
        (status = 200, description = "Ok. `{service, status, version}`", content_type = "application/json"),
    ),
)]
#[get("/")]
pub async fn root(app_state: Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(json!({
        "service": app_state.app_name,
        "status": "running",
        "version": app_state.app_version,
    }))
}

/// Liveness summary of the ingestion pipeline.
#[utoipa::path(
    tag = "health",
    responses(
        (
            status = 200,
            description = "Ok. `{status, consumer_running, queue_size, unique_processed, uptime}`",
            content_type = "application/json",
        ),
    ),
)]
#[get("/health")]
pub async fn health(app_state: Data<AppState>) -> impl Responder {
    let health = app_state.pipeline.health();
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "consumer_running": health.running(),
        "queue_size": health.queue_size(),
        "unique_processed": health.unique_processed(),
        "uptime": health.uptime().as_secs_f64(),
    }))
}

/// Liveness probe. Fails if the processing loop died unexpectedly.
#[utoipa::path(
    tag = "health",
    responses(
        (status = 200, description = "Ok. App is alive."),
        (status = 503, description = "Service Unavailable. App needs to be restarted."),
    ),
)]
#[get("/health/live")]
pub async fn health_live(app_state: Data<AppState>) -> impl Responder {
    probe_response(app_state.pipeline.is_health_live())
}

/// Readiness probe. Passes while the processing loop is running.
#[utoipa::path(
    tag = "health",
    responses(
        (status = 200, description = "Ok. App is ready to receive requests."),
        (status = 503, description = "Service Unavailable."),
    ),
)]
#[get("/health/ready")]
pub async fn health_ready(app_state: Data<AppState>) -> impl Responder {
    probe_response(app_state.pipeline.is_health_ready())
}

/// Startup probe. Passes once the processing loop has been started.
#[utoipa::path(
    tag = "health",
    responses(
        (status = 200, description = "Ok. App has started."),
        (status = 503, description = "Service Unavailable."),
    ),
)]
#[get("/health/started")]
pub async fn health_started(app_state: Data<AppState>) -> impl Responder {
    probe_response(app_state.pipeline.is_health_started())
}

fn probe_response(healthy: bool) -> HttpResponse {
    if healthy {
        HttpResponse::build(StatusCode::OK).finish()
    } else {
        HttpResponse::build(StatusCode::SERVICE_UNAVAILABLE).finish()
    }
}
