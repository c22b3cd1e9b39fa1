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

//! API resource for listing processed events.

use crate::rest_api::AppState;
use crate::rest_api::common::ApiErrorMapper;
use actix_web::Error;
use actix_web::HttpResponse;
use actix_web::get;
use actix_web::http::StatusCode;
use actix_web::web::Data;
use actix_web::web::Query;
use ledgerline_core::DedupKey;
use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    /// Only list events of this topic.
    topic: Option<String>,
}

#[derive(Debug, Serialize)]
struct EventsResponse {
    count: usize,
    topic: Option<String>,
    events: Vec<DedupKey>,
}

/// List the dedup keys of all events that have been processed.
#[utoipa::path(
    tag = "http",
    params(
        (
            "topic" = Option<String>,
            Query,
            description = "Only list events of this topic."
        ),
    ),
    responses(
        (
            status = 200,
            description = "Ok. `{count, topic, events:[{topic,event_id}]}`",
            content_type = "application/json",
        ),
        (status = 500, description = "Internal server error."),
    ),
)]
#[get("/events")]
pub async fn processed_events(
    app_state: Data<AppState>,
    query: Query<EventsQuery>,
) -> Result<HttpResponse, Error> {
    let topic = query.into_inner().topic;
    let events = app_state
        .pipeline
        .get_events(topic.as_deref())
        .await
        .map_err(ApiErrorMapper::from_ingest_error)?;
    Ok(HttpResponse::build(StatusCode::OK).json(EventsResponse {
        count: events.len(),
        topic,
        events,
    }))
}
