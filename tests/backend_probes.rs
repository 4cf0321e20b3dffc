//! Probe behavior against an in-process mock backend: an axum router serving
//! the health, WHIP and signaling endpoints the harness expects.

use std::net::SocketAddr;

use axum::extract::ws::{Message as WsMessage, WebSocketUpgrade};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use voicepulse::config::HarnessConfig;
use voicepulse::engine::Harness;
use voicepulse::models::ProbeStatus;

async fn spawn_backend(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock backend");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve mock backend");
    });
    addr
}

fn config_for(addr: SocketAddr) -> HarnessConfig {
    HarnessConfig {
        media_server_base: format!("http://{}", addr),
        orchestrator_ws_url: format!("ws://{}/ws", addr),
        signaling_timeout_ms: 200,
        ai_timeout_ms: 400,
        iteration_pause_ms: 10,
        ..HarnessConfig::default()
    }
}

async fn healthy() -> Json<Value> {
    Json(json!({"phase": "2", "ai_enabled": true, "kafka": "connected"}))
}

async fn whip_accept(headers: HeaderMap) -> StatusCode {
    match headers.get(header::CONTENT_TYPE) {
        Some(ct) if ct == "application/sdp" => StatusCode::CREATED,
        _ => StatusCode::UNSUPPORTED_MEDIA_TYPE,
    }
}

async fn ws_ack(ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(|mut socket| async move {
        if let Some(Ok(WsMessage::Text(_))) = socket.recv().await {
            let _ = socket
                .send(WsMessage::Text(r#"{"type":"ack"}"#.to_string()))
                .await;
        }
    })
}

async fn ws_close_without_reply(ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(|mut socket| async move {
        let _ = socket.recv().await;
        let _ = socket.send(WsMessage::Close(None)).await;
    })
}

async fn ws_ping_then_ack(ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(|mut socket| async move {
        if let Some(Ok(WsMessage::Text(_))) = socket.recv().await {
            let _ = socket.send(WsMessage::Ping(Vec::new())).await;
            let _ = socket
                .send(WsMessage::Text(r#"{"type":"ack"}"#.to_string()))
                .await;
        }
    })
}

async fn ws_mute(ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(|mut socket| async move {
        // Accept frames but never reply.
        while let Some(Ok(_)) = socket.recv().await {}
    })
}

fn full_backend() -> Router {
    Router::new()
        .route("/health", get(healthy))
        .route("/whip", post(whip_accept))
        .route("/ws", get(ws_ack))
}

#[tokio::test]
async fn health_probe_derives_readiness_flags() {
    let addr = spawn_backend(full_backend()).await;
    let harness = Harness::new(config_for(addr));

    let result = harness.probe_health().await;
    assert_eq!(result.status, ProbeStatus::Success);
    assert!(result.elapsed_ms >= 0.0);
    assert_eq!(result.extra["phase_2_enabled"], json!(true));
    assert_eq!(result.extra["ai_enabled"], json!(true));
    assert_eq!(result.extra["kafka_connected"], json!(true));
    assert_eq!(result.extra["data"]["phase"], json!("2"));
}

#[tokio::test]
async fn health_probe_reports_http_errors() {
    let app = Router::new().route("/health", get(|| async { StatusCode::SERVICE_UNAVAILABLE }));
    let addr = spawn_backend(app).await;
    let harness = Harness::new(config_for(addr));

    let result = harness.probe_health().await;
    assert_eq!(result.status, ProbeStatus::Error);
    assert_eq!(result.error.as_deref(), Some("HTTP 503"));
    assert!(result.elapsed_ms >= 0.0);
}

#[tokio::test]
async fn health_probe_against_closed_port_fails_fast() {
    // Bind and immediately drop to get a port nothing listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let harness = Harness::new(config_for(addr));
    let result = harness.probe_health().await;

    assert_eq!(result.status, ProbeStatus::Error);
    let message = result.error.expect("error message present");
    assert!(!message.is_empty());
    // Connection refusal is near-instant, well under the signaling timeouts.
    assert!(result.elapsed_ms >= 0.0);
    assert!(result.elapsed_ms < 5000.0);
}

#[tokio::test]
async fn whip_probe_accepts_201() {
    let addr = spawn_backend(full_backend()).await;
    let harness = Harness::new(config_for(addr));

    let result = harness.probe_media_ingest().await;
    assert_eq!(result.status, ProbeStatus::Success);
    assert_eq!(result.extra["http_status"], json!(201));
    assert!(result.elapsed_ms >= 0.0);
}

#[tokio::test]
async fn whip_probe_rejects_other_statuses() {
    let app = Router::new().route("/whip", post(|| async { StatusCode::NOT_FOUND }));
    let addr = spawn_backend(app).await;
    let harness = Harness::new(config_for(addr));

    let result = harness.probe_media_ingest().await;
    assert_eq!(result.status, ProbeStatus::Error);
    assert_eq!(result.error.as_deref(), Some("HTTP 404"));
}

#[tokio::test]
async fn signaling_probe_round_trips() {
    let addr = spawn_backend(full_backend()).await;
    let harness = Harness::new(config_for(addr));

    let result = harness.probe_signaling().await;
    assert_eq!(result.status, ProbeStatus::Success);
    assert_eq!(result.extra["response"], json!(r#"{"type":"ack"}"#));
    assert!(result.extra["connection_time_ms"].as_f64().unwrap() >= 0.0);
}

#[tokio::test]
async fn silent_signaling_server_yields_warning_not_error() {
    let app = Router::new().route("/ws", get(ws_mute));
    let addr = spawn_backend(app).await;
    let harness = Harness::new(config_for(addr));

    let result = harness.probe_signaling().await;
    assert_eq!(result.status, ProbeStatus::Warning);
    assert_eq!(result.error.as_deref(), Some("No response received (timeout)"));
    // The configured 200ms wait must actually elapse.
    assert!(result.elapsed_ms >= 200.0);
}

#[tokio::test]
async fn ai_pipeline_uses_longer_timeout() {
    let app = Router::new().route("/ws", get(ws_mute));
    let addr = spawn_backend(app).await;
    let harness = Harness::new(config_for(addr));

    let result = harness.probe_ai_pipeline().await;
    assert_eq!(result.status, ProbeStatus::Warning);
    assert_eq!(result.error.as_deref(), Some("AI response timeout"));
    assert!(result.elapsed_ms >= 400.0);
}

#[tokio::test]
async fn close_without_reply_is_an_error_not_a_success() {
    let app = Router::new().route("/ws", get(ws_close_without_reply));
    let addr = spawn_backend(app).await;
    let harness = Harness::new(config_for(addr));

    let result = harness.probe_signaling().await;
    assert_eq!(result.status, ProbeStatus::Error);
    assert_eq!(result.error.as_deref(), Some("Connection closed before reply"));
    assert!(result.extra.get("response").is_none());
}

#[tokio::test]
async fn control_frames_are_not_mistaken_for_the_reply() {
    let app = Router::new().route("/ws", get(ws_ping_then_ack));
    let addr = spawn_backend(app).await;
    let harness = Harness::new(config_for(addr));

    let result = harness.probe_signaling().await;
    assert_eq!(result.status, ProbeStatus::Success);
    assert_eq!(result.extra["response"], json!(r#"{"type":"ack"}"#));
}

#[tokio::test]
async fn signaling_connect_failure_is_an_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let harness = Harness::new(config_for(addr));
    let result = harness.probe_signaling().await;
    assert_eq!(result.status, ProbeStatus::Error);
    assert!(result.error.is_some());
}

#[tokio::test]
async fn kafka_probe_follows_health_payload() {
    let addr = spawn_backend(full_backend()).await;
    let harness = Harness::new(config_for(addr));

    let result = harness.probe_kafka().await;
    assert_eq!(result.status, ProbeStatus::Success);
    assert_eq!(result.extra["kafka_status"], json!("connected"));
}

#[tokio::test]
async fn kafka_probe_reports_disconnected_broker() {
    let app = Router::new().route(
        "/health",
        get(|| async { Json(json!({"phase": "2", "ai_enabled": true, "kafka": "disconnected"})) }),
    );
    let addr = spawn_backend(app).await;
    let harness = Harness::new(config_for(addr));

    let result = harness.probe_kafka().await;
    assert_eq!(result.status, ProbeStatus::Error);
    assert_eq!(result.extra["kafka_status"], json!("disconnected"));
}

#[tokio::test]
async fn kafka_probe_distinguishes_unreachable_media_server() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let harness = Harness::new(config_for(addr));
    let result = harness.probe_kafka().await;
    assert_eq!(result.status, ProbeStatus::Error);
    assert_eq!(
        result.error.as_deref(),
        Some("Cannot test Kafka - Media Server unavailable")
    );
}

#[tokio::test]
async fn full_run_builds_complete_tree() {
    let addr = spawn_backend(full_backend()).await;
    let mut config = config_for(addr);
    config.health_iterations = 2;
    config.websocket_iterations = 2;
    config.ai_iterations = 2;
    let harness = Harness::new(config);

    let tree = harness.run().await;

    let service_names: Vec<_> = tree.services.keys().cloned().collect();
    assert_eq!(service_names, vec!["media_server", "orchestrator"]);

    let protocol_names: Vec<_> = tree.protocols.keys().cloned().collect();
    assert_eq!(protocol_names, vec!["ai_pipeline", "kafka", "websocket", "whip"]);

    let metric_names: Vec<_> = tree.performance.keys().cloned().collect();
    assert_eq!(
        metric_names,
        vec!["ai_pipeline_latency", "media_server_latency", "websocket_latency"]
    );
    for stats in tree.performance.values() {
        assert_eq!(stats.samples.len(), 2);
        assert!(stats.min_latency_ms <= stats.max_latency_ms);
    }

    assert_eq!(tree.summary.services_healthy, 2);
    assert_eq!(tree.summary.protocols_working, 4);
    assert_eq!(tree.summary.overall_success_rate, 1.0);
    assert!(tree.summary.total_test_time_seconds > 0.0);
}

#[tokio::test]
async fn failed_probes_never_abort_the_run() {
    // Health and WHIP are down; only signaling answers.
    let app = Router::new().route("/ws", get(ws_ack));
    let addr = spawn_backend(app).await;
    let mut config = config_for(addr);
    config.health_iterations = 1;
    config.websocket_iterations = 1;
    config.ai_iterations = 1;
    let harness = Harness::new(config);

    let tree = harness.run().await;

    // Every slot is still populated even though most probes failed.
    assert_eq!(tree.services.len(), 2);
    assert_eq!(tree.protocols.len(), 4);
    assert_eq!(tree.performance.len(), 3);
    assert!(tree.summary.overall_success_rate < 1.0);
    assert!(tree.summary.overall_success_rate > 0.0);
}
