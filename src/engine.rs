use std::time::{Duration, Instant};

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{info, warn};

use crate::config::HarnessConfig;
use crate::models::{ProbeResult, ResultTree};
use crate::stats::measure_latency;

/// Audio-only SDP offer used to exercise the WHIP endpoint. The media server
/// only has to accept the offer; no RTP ever flows.
const SDP_OFFER: &str = "v=0\n\
o=- 0 2 IN IP4 127.0.0.1\n\
s=-\n\
t=0 0\n\
m=audio 9 UDP/TLS/RTP/SAVPF 111\n\
c=IN IP4 0.0.0.0\n\
a=mid:audio\n\
a=sendonly\n\
a=rtpmap:111 opus/48000/2\n\
a=fmtp:111 minptime=10;useinbandfec=1\n";

pub struct Harness {
    config: HarnessConfig,
    http_client: reqwest::Client,
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

impl Harness {
    pub fn new(config: HarnessConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    /// GET `{media_server_base}/health` and derive the backend readiness
    /// flags from the JSON body.
    pub async fn probe_health(&self) -> ProbeResult {
        info!("Probing media server health...");
        let start = Instant::now();
        let url = format!("{}/health", self.config.media_server_base);

        let response = match self.http_client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Media server unreachable: {}", e);
                return ProbeResult::failure(elapsed_ms(start), e.to_string());
            }
        };

        let http_status = response.status().as_u16();
        if http_status != 200 {
            return ProbeResult::failure(elapsed_ms(start), format!("HTTP {}", http_status));
        }

        match response.json::<Value>().await {
            Ok(data) => {
                info!("Media server health: {}", data);
                let phase_2_enabled = data.get("phase").and_then(Value::as_str) == Some("2");
                let ai_enabled = data
                    .get("ai_enabled")
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                let kafka_connected = data.get("kafka").and_then(Value::as_str) == Some("connected");

                ProbeResult::success(elapsed_ms(start))
                    .with("data", data)
                    .with("phase_2_enabled", json!(phase_2_enabled))
                    .with("ai_enabled", json!(ai_enabled))
                    .with("kafka_connected", json!(kafka_connected))
            }
            Err(e) => ProbeResult::failure(elapsed_ms(start), format!("Invalid health body: {}", e)),
        }
    }

    /// Open a signaling connection, send one control message and wait for a
    /// single reply within the generic timeout.
    pub async fn probe_signaling(&self) -> ProbeResult {
        info!("Probing orchestrator signaling...");
        let request = json!({
            "type": "test",
            "session_id": "test_session",
            "message": "Hello AI",
        });
        self.signaling_round_trip(
            request,
            self.config.signaling_timeout(),
            "No response received (timeout)",
        )
        .await
    }

    /// Full AI round trip over the same signaling channel: a transcript goes
    /// in and a generated response is expected back. Slower than plain
    /// signaling, so it gets its own timeout.
    pub async fn probe_ai_pipeline(&self) -> ProbeResult {
        info!("Probing AI pipeline...");
        let request = json!({
            "type": "ai_test",
            "session_id": "test_ai_session",
            "transcript": "Hello, how are you today?",
        });
        self.signaling_round_trip(request, self.config.ai_timeout(), "AI response timeout")
            .await
    }

    async fn signaling_round_trip(
        &self,
        request: Value,
        wait: Duration,
        timeout_message: &str,
    ) -> ProbeResult {
        let start = Instant::now();

        let (mut socket, _) = match connect_async(self.config.orchestrator_ws_url.as_str()).await {
            Ok(connection) => connection,
            Err(e) => {
                warn!("Signaling connection failed: {}", e);
                return ProbeResult::failure(elapsed_ms(start), e.to_string());
            }
        };
        let connection_time_ms = elapsed_ms(start);

        if let Err(e) = socket.send(Message::Text(request.to_string())).await {
            return ProbeResult::failure(elapsed_ms(start), e.to_string())
                .with("connection_time_ms", json!(connection_time_ms));
        }

        // Only a data frame counts as the reply. Control frames are skipped
        // (still inside the timeout) and a close handshake means the server
        // hung up without answering.
        let reply = timeout(wait, async {
            loop {
                match socket.next().await {
                    Some(Ok(Message::Text(text))) => break Some(Ok(text)),
                    Some(Ok(Message::Binary(bytes))) => {
                        break Some(Ok(String::from_utf8_lossy(&bytes).into_owned()))
                    }
                    Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => continue,
                    Some(Ok(Message::Close(_))) | None => break None,
                    Some(Err(e)) => break Some(Err(e)),
                }
            }
        })
        .await;

        let result = match reply {
            Ok(Some(Ok(reply))) => {
                info!("Signaling reply: {}", reply);
                ProbeResult::success(elapsed_ms(start)).with("response", json!(reply))
            }
            Ok(Some(Err(e))) => ProbeResult::failure(elapsed_ms(start), e.to_string()),
            Ok(None) => ProbeResult::failure(
                elapsed_ms(start),
                "Connection closed before reply".to_string(),
            ),
            Err(_) => {
                warn!("Signaling reply timed out after {:?}", wait);
                ProbeResult::warning(elapsed_ms(start), timeout_message)
            }
        };

        let _ = socket.close(None).await;
        result.with("connection_time_ms", json!(connection_time_ms))
    }

    /// POST an SDP offer to the WHIP endpoint; 200 and 201 both count as an
    /// accepted ingest session.
    pub async fn probe_media_ingest(&self) -> ProbeResult {
        info!("Probing WHIP media ingest...");
        let start = Instant::now();
        let url = format!("{}/whip", self.config.media_server_base);

        match self
            .http_client
            .post(&url)
            .header("Content-Type", "application/sdp")
            .body(SDP_OFFER)
            .send()
            .await
        {
            Ok(response) => {
                let http_status = response.status().as_u16();
                if http_status == 200 || http_status == 201 {
                    info!("WHIP offer accepted: HTTP {}", http_status);
                    ProbeResult::success(elapsed_ms(start)).with("http_status", json!(http_status))
                } else {
                    ProbeResult::failure(elapsed_ms(start), format!("HTTP {}", http_status))
                        .with("http_status", json!(http_status))
                }
            }
            Err(e) => {
                warn!("WHIP request failed: {}", e);
                ProbeResult::failure(elapsed_ms(start), e.to_string())
            }
        }
    }

    /// Kafka connectivity as reported by the media server health payload.
    /// A failed health probe is reported distinctly from a disconnected
    /// broker: the former means no verdict could be obtained at all.
    pub async fn probe_kafka(&self) -> ProbeResult {
        info!("Probing Kafka connectivity via media server...");
        let start = Instant::now();
        let health = self.probe_health().await;

        if !health.is_success() {
            return ProbeResult::failure(
                elapsed_ms(start),
                "Cannot test Kafka - Media Server unavailable",
            );
        }

        let details = health.extra.get("data").cloned().unwrap_or(Value::Null);
        let kafka_status = details
            .get("kafka")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string();

        let result = if kafka_status == "connected" {
            ProbeResult::success(elapsed_ms(start))
        } else {
            ProbeResult::failure(
                elapsed_ms(start),
                format!("Kafka not connected (status: {})", kafka_status),
            )
        };
        result
            .with("kafka_status", json!(kafka_status))
            .with("details", details)
    }

    /// Run every probe in fixed order, then the latency measurements, then
    /// the summary. A failing probe never blocks the ones after it.
    pub async fn run(&self) -> ResultTree {
        info!("Starting backend probe run...");
        let started = Instant::now();
        let mut tree = ResultTree::default();

        tree.services
            .insert("media_server".into(), self.probe_health().await);
        tree.services
            .insert("orchestrator".into(), self.probe_signaling().await);

        tree.protocols
            .insert("whip".into(), self.probe_media_ingest().await);
        tree.protocols
            .insert("websocket".into(), self.probe_signaling().await);
        tree.protocols.insert("kafka".into(), self.probe_kafka().await);
        tree.protocols
            .insert("ai_pipeline".into(), self.probe_ai_pipeline().await);

        let pause = self.config.iteration_pause();
        tree.performance.insert(
            "media_server_latency".into(),
            measure_latency(|| self.probe_health(), self.config.health_iterations, pause).await,
        );
        tree.performance.insert(
            "websocket_latency".into(),
            measure_latency(
                || self.probe_signaling(),
                self.config.websocket_iterations,
                pause,
            )
            .await,
        );
        tree.performance.insert(
            "ai_pipeline_latency".into(),
            measure_latency(|| self.probe_ai_pipeline(), self.config.ai_iterations, pause).await,
        );

        tree.summarize(started.elapsed().as_secs_f64());
        info!(
            "Probe run completed in {:.2}s, overall success rate {:.1}%",
            tree.summary.total_test_time_seconds,
            tree.summary.overall_success_rate * 100.0
        );
        tree
    }
}
