use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Endpoints and timing knobs for one probe run. The defaults target a
/// local backend deployment; there are no CLI flags or environment lookups.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HarnessConfig {
    #[serde(default = "default_media_server_base")]
    pub media_server_base: String,
    #[serde(default = "default_orchestrator_ws_url")]
    pub orchestrator_ws_url: String,
    #[serde(default = "default_signaling_timeout_ms")]
    pub signaling_timeout_ms: u64,
    #[serde(default = "default_ai_timeout_ms")]
    pub ai_timeout_ms: u64,
    #[serde(default = "default_iteration_pause_ms")]
    pub iteration_pause_ms: u64,
    #[serde(default = "default_health_iterations")]
    pub health_iterations: usize,
    #[serde(default = "default_websocket_iterations")]
    pub websocket_iterations: usize,
    #[serde(default = "default_ai_iterations")]
    pub ai_iterations: usize,
    #[serde(default = "default_output_path")]
    pub output_path: String,
}

fn default_media_server_base() -> String { "http://localhost:8080".into() }
fn default_orchestrator_ws_url() -> String { "ws://localhost:8001/ws".into() }
fn default_signaling_timeout_ms() -> u64 { 5000 }
fn default_ai_timeout_ms() -> u64 { 10_000 }
fn default_iteration_pause_ms() -> u64 { 100 }
fn default_health_iterations() -> usize { 5 }
fn default_websocket_iterations() -> usize { 3 }
fn default_ai_iterations() -> usize { 3 }
fn default_output_path() -> String { "phase2-backend-test-results.json".into() }

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            media_server_base: default_media_server_base(),
            orchestrator_ws_url: default_orchestrator_ws_url(),
            signaling_timeout_ms: default_signaling_timeout_ms(),
            ai_timeout_ms: default_ai_timeout_ms(),
            iteration_pause_ms: default_iteration_pause_ms(),
            health_iterations: default_health_iterations(),
            websocket_iterations: default_websocket_iterations(),
            ai_iterations: default_ai_iterations(),
            output_path: default_output_path(),
        }
    }
}

impl HarnessConfig {
    pub fn signaling_timeout(&self) -> Duration {
        Duration::from_millis(self.signaling_timeout_ms)
    }

    pub fn ai_timeout(&self) -> Duration {
        Duration::from_millis(self.ai_timeout_ms)
    }

    pub fn iteration_pause(&self) -> Duration {
        Duration::from_millis(self.iteration_pause_ms)
    }
}
