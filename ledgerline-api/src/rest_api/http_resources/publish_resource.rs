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

//! API resource for publishing events.

use crate::rest_api::AppState;
use crate::rest_api::common::ApiErrorMapper;
use actix_web::Error;
use actix_web::HttpRequest;
use actix_web::HttpResponse;
use actix_web::error;
use actix_web::http::StatusCode;
use actix_web::post;
use actix_web::web;
use actix_web::web::Data;
use actix_web::web::Payload;
use futures::StreamExt;
use ledgerline_core::Event;
use ledgerline_core::util::LogScopeDuration;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

/// Max accepted size of a publish request body (5 MiB).
const MAX_DOCUMENT_SIZE: usize = 5 * 1024 * 1024;

/// A batch of events or a single event.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PublishRequest {
    Batch { events: Vec<Event> },
    Single(Event),
}

impl PublishRequest {
    fn into_events(self) -> Vec<Event> {
        match self {
            Self::Batch { events } => events,
            Self::Single(event) => vec![event],
        }
    }
}

#[derive(Debug, Serialize)]
struct PublishResponse {
    status: &'static str,
    count: usize,
    message: String,
}

/// Publish a single event or a batch of events.
///
/// Accepted events are queued for processing. Duplicates are accepted just
/// like unique events and the outcome is only visible through `/stats`.
///
/// Request body is either an event object
///
/// ```json
/// {"topic":"orders","event_id":"evt-001","timestamp":"2025-06-01T12:00:00Z","source":"shop","payload":{}}
/// ```
///
/// or a batch `{"events":[...]}` with at least one event.
#[utoipa::path(
    tag = "http",
    responses(
        (
            status = 202,
            description = "Accepted. The events were queued for processing.",
            content_type = "application/json",
        ),
        (status = 400, description = "Bad Request: Body is not a JSON document or too large."),
        (status = 422, description = "Unprocessable Entity: An event failed validation or the batch was empty."),
        (status = 500, description = "Internal server error."),
    ),
)]
#[post("/publish")]
pub async fn publish_events(
    app_state: Data<AppState>,
    payload: Payload,
    http_request: HttpRequest,
) -> Result<HttpResponse, Error> {
    let _scope = LogScopeDuration::new(
        log::Level::Trace,
        module_path!(),
        "publish_events",
        Duration::ZERO,
    );
    let content_length_estimate = assert_declared_content_length(&http_request, MAX_DOCUMENT_SIZE)?;
    let body = read_full_body(content_length_estimate, payload).await?;
    let document = serde_json::from_slice::<Value>(&body).map_err(|e| {
        log::debug!("Failed to parse publish request: {e}");
        error::ErrorBadRequest("invalid_document")
    })?;
    let events = serde_json::from_value::<PublishRequest>(document)
        .map_err(|e| {
            log::debug!("Publish request is neither an event nor a batch: {e}");
            error::ErrorUnprocessableEntity("invalid_event")
        })?
        .into_events();
    let count = app_state
        .pipeline
        .submit(events)
        .map_err(ApiErrorMapper::from_ingest_error)?;
    log::info!("Accepted {count} event(s) for processing.");
    Ok(HttpResponse::build(StatusCode::ACCEPTED).json(PublishResponse {
        status: "accepted",
        count,
        message: format!("{count} event(s) queued for processing"),
    }))
}

/// Assert that the declared content-length header (if present) is within the
/// max_size limit.
fn assert_declared_content_length(
    http_request: &HttpRequest,
    max_size: usize,
) -> Result<usize, Error> {
    let content_length_estimate = http_request
        .headers()
        .get("content-length")
        .and_then(|header_value| header_value.to_str().ok())
        .and_then(|header_value_str| header_value_str.parse::<usize>().ok())
        .unwrap_or(1024);
    if content_length_estimate > max_size {
        Err(error::ErrorBadRequest("overflow"))?
    } else {
        Ok(content_length_estimate)
    }
}

async fn read_full_body(
    content_length_estimate: usize,
    mut payload: Payload,
) -> Result<web::Bytes, Error> {
    let mut body = web::BytesMut::with_capacity(content_length_estimate);
    while let Some(chunk) = payload.next().await {
        let chunk = chunk?;
        // limit max size of in-memory payload
        if (body.len() + chunk.len()) > MAX_DOCUMENT_SIZE {
            Err(error::ErrorBadRequest("overflow"))?;
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body.freeze())
}
