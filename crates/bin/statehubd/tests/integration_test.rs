//! End-to-end tests for the full statehubd stack.
//!
//! Each test wires the complete pipeline (in-memory `SQLite`, real repos,
//! real router, rule engine and services, real axum router) around a
//! recording transport, so no broker and no TCP port are needed.

use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use statehub_adapter_http_axum::router;
use statehub_adapter_http_axum::state::AppState;
use statehub_adapter_storage_sqlite_sqlx::{
    Config, SqliteDeviceRepository, SqliteEventStore, SqliteRuleRepository,
};
use statehub_app::event_router::{Disposition, EventRouter};
use statehub_app::ports::{DeviceRepository, EventStore, Transport};
use statehub_app::rule_engine::RuleEngine;
use statehub_app::services::device_service::DeviceService;
use statehub_app::services::event_service::EventService;
use statehub_app::services::rule_service::RuleService;
use statehub_domain::error::HubError;
use statehub_domain::event::Event;
use statehub_domain::id::DeviceId;
use statehub_domain::topic::BaseTopic;
use tower::ServiceExt;

/// Transport double that records every publish.
#[derive(Clone, Default)]
struct RecordingTransport {
    published: Arc<Mutex<Vec<(String, String)>>>,
}

impl RecordingTransport {
    fn published(&self) -> Vec<(String, String)> {
        self.published.lock().unwrap().clone()
    }
}

impl Transport for RecordingTransport {
    fn publish(&self, topic: &str, payload: &str, _retain: bool) -> Result<(), HubError> {
        self.published
            .lock()
            .unwrap()
            .push((topic.to_string(), payload.to_string()));
        Ok(())
    }

    fn subscribe(&self, _pattern: &str) -> Result<(), HubError> {
        Ok(())
    }
}

type Pipeline = EventRouter<SqliteDeviceRepository, SqliteEventStore, RecordingTransport>;

struct Stack {
    app: axum::Router,
    pipeline: Arc<Pipeline>,
    transport: RecordingTransport,
    devices: SqliteDeviceRepository,
    events: SqliteEventStore,
}

/// Wire everything the daemon wires, minus the broker.
async fn stack() -> Stack {
    let db = Config {
        database_url: "sqlite::memory:".to_string(),
    }
    .build()
    .await
    .expect("in-memory database should initialise");
    let pool = db.pool().clone();

    let devices = SqliteDeviceRepository::new(pool.clone());
    let events = SqliteEventStore::new(pool.clone());
    let rules = SqliteRuleRepository::new(pool);
    let transport = RecordingTransport::default();

    let pipeline = Arc::new(EventRouter::new(
        BaseTopic::new("base/g/p").unwrap(),
        devices.clone(),
        events.clone(),
        transport.clone(),
    ));
    let engine = Arc::new(RuleEngine::new(rules.clone(), pipeline.controller()));
    engine.reload_rules().await.unwrap();
    pipeline.register_listener(engine.clone());
    pipeline.start().unwrap();

    let state = AppState::from_arcs(
        Arc::new(DeviceService::new(devices.clone())),
        Arc::new(EventService::new(events.clone())),
        Arc::new(RuleService::new(rules, engine)),
        pipeline.controller(),
    );

    Stack {
        app: router::build(state),
        pipeline,
        transport,
        devices,
        events,
    }
}

async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let resp = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_return_ok_when_health_check_called() {
    let stack = stack().await;

    let resp = stack
        .app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Ingestion
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_record_status_of_registered_device() {
    let stack = stack().await;
    let (status, _) = send(
        &stack.app,
        "POST",
        "/api/devices",
        Some(json!({"device_id": "sensorTest", "device_type": "sensor"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let disposition = stack
        .pipeline
        .route("base/g/p/sensorTest/status", "22.5")
        .await;
    assert!(disposition.is_accepted());

    let (status, body) = send(&stack.app, "GET", "/api/devices/sensorTest/state", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["last_state"], "22.5");

    let (_, events) = send(&stack.app, "GET", "/api/events?device_id=sensorTest", None).await;
    let events = events.as_array().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["device_id"], "sensorTest");
    assert_eq!(events[0]["payload"], "22.5");
}

#[tokio::test]
async fn should_ignore_status_of_unregistered_device() {
    let stack = stack().await;
    let calls = Arc::new(Mutex::new(0_usize));
    let counter = Arc::clone(&calls);
    stack
        .pipeline
        .register_listener(Arc::new(move |_: &Event| -> Result<(), HubError> {
            *counter.lock().unwrap() += 1;
            Ok(())
        }));

    let disposition = stack
        .pipeline
        .route("base/g/p/no_existe/status", "1")
        .await;

    assert_eq!(disposition, Disposition::UnregisteredDevice);
    assert!(stack
        .devices
        .get_by_id(&DeviceId::new("no_existe").unwrap())
        .await
        .unwrap()
        .is_none());
    assert!(stack.events.get_recent(10).await.unwrap().is_empty());
    assert_eq!(*calls.lock().unwrap(), 0);
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_fire_rule_created_through_api() {
    let stack = stack().await;
    send(
        &stack.app,
        "POST",
        "/api/devices",
        Some(json!({"device_id": "sensorTest"})),
    )
    .await;
    let (status, _) = send(
        &stack.app,
        "POST",
        "/api/rules",
        Some(json!({
            "name": "boiler guard",
            "condition": "float(event.payload) > 25",
            "action": "controller.sendCommand('boiler','OFF')"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    stack
        .pipeline
        .route("base/g/p/sensorTest/status", "20.0")
        .await;
    assert!(stack.transport.published().is_empty());

    stack
        .pipeline
        .route("base/g/p/sensorTest/status", "30.0")
        .await;
    assert_eq!(
        stack.transport.published(),
        [("base/g/p/boiler/set".to_string(), "OFF".to_string())]
    );
}

#[tokio::test]
async fn should_stop_firing_after_rule_deleted() {
    let stack = stack().await;
    send(
        &stack.app,
        "POST",
        "/api/devices",
        Some(json!({"device_id": "lamp"})),
    )
    .await;
    let (_, rule) = send(
        &stack.app,
        "POST",
        "/api/rules",
        Some(json!({
            "name": "echo",
            "condition": "event.payload == 'ON'",
            "action": "controller.requestStatus(event.device_id)"
        })),
    )
    .await;
    let id = rule["id"].as_str().unwrap().to_string();

    let (status, _) = send(&stack.app, "DELETE", &format!("/api/rules/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    stack.pipeline.route("base/g/p/lamp/status", "ON").await;

    assert!(stack.transport.published().is_empty());
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_publish_command_and_status_request_from_api() {
    let stack = stack().await;
    send(
        &stack.app,
        "POST",
        "/api/devices",
        Some(json!({"device_id": "boiler", "device_type": "switch"})),
    )
    .await;

    let (status, _) = send(
        &stack.app,
        "POST",
        "/api/devices/boiler/command",
        Some(json!({"payload": "ON"})),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    let (status, _) = send(&stack.app, "POST", "/api/devices/boiler/status-request", None).await;
    assert_eq!(status, StatusCode::ACCEPTED);

    assert_eq!(
        stack.transport.published(),
        [
            ("base/g/p/boiler/set".to_string(), "ON".to_string()),
            ("base/g/p/boiler".to_string(), "GET_STATE".to_string()),
        ]
    );
}
