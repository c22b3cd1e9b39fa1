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

//! API resource for ingestion statistics.

use crate::rest_api::AppState;
use crate::rest_api::common::ApiErrorMapper;
use actix_web::Error;
use actix_web::HttpResponse;
use actix_web::get;
use actix_web::http::StatusCode;
use actix_web::web::Data;

/// Return counters and known topics.
///
/// `received`, `unique_processed` and `duplicate_dropped` are reset on
/// restart while `topics` reflects the durable ledger.
#[utoipa::path(
    tag = "http",
    responses(
        (
            status = 200,
            description = "Ok. `{received, unique_processed, duplicate_dropped, topics, uptime}`",
            content_type = "application/json",
        ),
        (status = 500, description = "Internal server error."),
    ),
)]
#[get("/stats")]
pub async fn ingest_stats(app_state: Data<AppState>) -> Result<HttpResponse, Error> {
    let stats = app_state
        .pipeline
        .get_stats()
        .await
        .map_err(ApiErrorMapper::from_ingest_error)?;
    Ok(HttpResponse::build(StatusCode::OK).json(stats))
}
