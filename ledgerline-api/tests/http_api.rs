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

//! HTTP level tests of the REST API.

use actix_web::App;
use actix_web::http::StatusCode;
use actix_web::test;
use ledgerline_api::rest_api::AppState;
use ledgerline_api::rest_api::configure_services;
use ledgerline_core::IngestPipeline;
use ledgerline_core::ingest::LoggingEventProcessor;
use ledgerline_dbp_mem::InMemoryDatabaseProvider;
use serde_json::Value;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

/// Initialize logging.
fn init_logger() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Debug)
        .try_init();
}

fn new_pipeline() -> Arc<IngestPipeline> {
    let dbp = Arc::new(InMemoryDatabaseProvider::new().as_database_provider());
    IngestPipeline::with_processor(
        dbp,
        LoggingEventProcessor::new(Duration::ZERO),
        Duration::from_millis(20),
        None,
    )
}

fn event_json(topic: &str, event_id: &str) -> Value {
    json!({
        "topic": topic,
        "event_id": event_id,
        "timestamp": "2025-06-01T12:00:00Z",
        "source": "http-test",
        "payload": {"amount": 42},
    })
}

macro_rules! init_app {
    ($pipeline:expr) => {
        test::init_service(
            App::new()
                .app_data(AppState::new_app_data(&$pipeline, "ledgerline", "0.0.0"))
                .configure(configure_services),
        )
        .await
    };
}

async fn await_received(pipeline: &IngestPipeline, expected: u64) {
    for _ in 0..500 {
        if pipeline.get_stats().await.unwrap().received() >= expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("Pipeline did not receive {expected} events in time.");
}

#[actix_web::test]
async fn test_publish_single_and_batch() {
    init_logger();
    let pipeline = new_pipeline();
    pipeline.start();
    let app = init_app!(pipeline);
    let req = test::TestRequest::post()
        .uri("/publish")
        .set_json(event_json("orders", "evt-001"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::ACCEPTED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "accepted");
    assert_eq!(body["count"], 1);
    let req = test::TestRequest::post()
        .uri("/publish")
        .set_json(json!({"events": [
            event_json("orders", "evt-001"),
            event_json("orders", "evt-002"),
            event_json("payments", "evt-001"),
        ]}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::ACCEPTED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["count"], 3);
    await_received(&pipeline, 4).await;
    let req = test::TestRequest::get().uri("/stats").to_request();
    let stats: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(stats["received"], 4);
    assert_eq!(stats["unique_processed"], 3);
    assert_eq!(stats["duplicate_dropped"], 1);
    assert_eq!(stats["topics"], json!(["orders", "payments"]));
    let req = test::TestRequest::get()
        .uri("/events?topic=orders")
        .to_request();
    let events: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(events["count"], 2);
    assert_eq!(events["topic"], "orders");
    assert_eq!(events["events"][0]["event_id"], "evt-001");
    let req = test::TestRequest::get().uri("/events").to_request();
    let events: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(events["count"], 3);
    assert_eq!(events["topic"], Value::Null);
    pipeline.stop().await;
}

#[actix_web::test]
async fn test_publish_rejects_bad_requests() {
    init_logger();
    let pipeline = new_pipeline();
    let app = init_app!(pipeline);
    let req = test::TestRequest::post()
        .uri("/publish")
        .insert_header(("content-type", "application/json"))
        .set_payload("{not json")
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::BAD_REQUEST
    );
    let req = test::TestRequest::post()
        .uri("/publish")
        .set_json(json!({"topic": "orders"}))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNPROCESSABLE_ENTITY
    );
    let req = test::TestRequest::post()
        .uri("/publish")
        .set_json(json!({"events": []}))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNPROCESSABLE_ENTITY
    );
    let mut invalid_timestamp = event_json("orders", "evt-003");
    invalid_timestamp["timestamp"] = json!("yesterday");
    let req = test::TestRequest::post()
        .uri("/publish")
        .set_json(json!({"events": [event_json("orders", "evt-002"), invalid_timestamp]}))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNPROCESSABLE_ENTITY
    );
    // Nothing of the partially invalid batch was queued.
    assert_eq!(pipeline.health().queue_size(), 0);
}

#[actix_web::test]
async fn test_health_probes_follow_lifecycle() {
    init_logger();
    let pipeline = new_pipeline();
    let app = init_app!(pipeline);
    let status_of = |uri: &'static str| test::TestRequest::get().uri(uri).to_request();
    assert_eq!(
        test::call_service(&app, status_of("/health/started")).await.status(),
        StatusCode::SERVICE_UNAVAILABLE
    );
    assert_eq!(
        test::call_service(&app, status_of("/health/ready")).await.status(),
        StatusCode::SERVICE_UNAVAILABLE
    );
    assert_eq!(
        test::call_service(&app, status_of("/health/live")).await.status(),
        StatusCode::OK
    );
    pipeline.start();
    assert_eq!(
        test::call_service(&app, status_of("/health/ready")).await.status(),
        StatusCode::OK
    );
    let health: Value = test::call_and_read_body_json(&app, status_of("/health")).await;
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["consumer_running"], true);
    assert_eq!(health["queue_size"], 0);
    assert_eq!(health["unique_processed"], 0);
    assert!(health["uptime"].as_f64().unwrap() >= 0.0);
    pipeline.stop().await;
    assert_eq!(
        test::call_service(&app, status_of("/health/ready")).await.status(),
        StatusCode::SERVICE_UNAVAILABLE
    );
    assert_eq!(
        test::call_service(&app, status_of("/health/started")).await.status(),
        StatusCode::OK
    );
    let health: Value = test::call_and_read_body_json(&app, status_of("/health")).await;
    assert_eq!(health["consumer_running"], false);
}

#[actix_web::test]
async fn test_banner_and_openapi() {
    init_logger();
    let pipeline = new_pipeline();
    let app = init_app!(pipeline);
    let req = test::TestRequest::get().uri("/").to_request();
    let banner: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(banner["service"], "ledgerline");
    assert_eq!(banner["status"], "running");
    let req = test::TestRequest::get().uri("/openapi.json").to_request();
    let openapi: Value = test::call_and_read_body_json(&app, req).await;
    assert!(openapi["paths"]["/publish"]["post"].is_object());
    assert!(openapi["paths"]["/health/ready"]["get"].is_object());
}
