use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    Success,
    Warning,
    Error,
}

impl fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProbeStatus::Success => "success",
            ProbeStatus::Warning => "warning",
            ProbeStatus::Error => "error",
        })
    }
}

/// Outcome of one bounded network operation against the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeResult {
    pub status: ProbeStatus,
    pub elapsed_ms: f64,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProbeResult {
    fn new(status: ProbeStatus, elapsed_ms: f64, error: Option<String>) -> Self {
        Self {
            status,
            elapsed_ms,
            timestamp: Utc::now(),
            error,
            extra: Map::new(),
        }
    }

    pub fn success(elapsed_ms: f64) -> Self {
        Self::new(ProbeStatus::Success, elapsed_ms, None)
    }

    pub fn warning(elapsed_ms: f64, error: impl Into<String>) -> Self {
        Self::new(ProbeStatus::Warning, elapsed_ms, Some(error.into()))
    }

    pub fn failure(elapsed_ms: f64, error: impl Into<String>) -> Self {
        Self::new(ProbeStatus::Error, elapsed_ms, Some(error.into()))
    }

    pub fn with(mut self, key: &str, value: Value) -> Self {
        self.extra.insert(key.to_string(), value);
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == ProbeStatus::Success
    }
}

/// Latency statistics over N sequential invocations of one probe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatencyStats {
    pub min_latency_ms: f64,
    pub max_latency_ms: f64,
    pub avg_latency_ms: f64,
    pub median_latency_ms: f64,
    pub std_deviation_ms: f64,
    pub success_rate: f64,
    pub samples: Vec<ProbeResult>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub total_test_time_seconds: f64,
    pub services_healthy: usize,
    pub protocols_working: usize,
    pub overall_success_rate: f64,
}

/// Full structured output of one harness run, persisted as the report file.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ResultTree {
    pub services: BTreeMap<String, ProbeResult>,
    pub protocols: BTreeMap<String, ProbeResult>,
    pub performance: BTreeMap<String, LatencyStats>,
    pub summary: RunSummary,
}

impl ResultTree {
    /// Overall success rate across service and protocol probes.
    /// Performance measurements are excluded; a warning does not count.
    pub fn overall_success_rate(&self) -> f64 {
        let total = self.services.len() + self.protocols.len();
        if total == 0 {
            return 0.0;
        }
        let successful = self
            .services
            .values()
            .chain(self.protocols.values())
            .filter(|r| r.is_success())
            .count();
        successful as f64 / total as f64
    }

    pub fn summarize(&mut self, total_test_time_seconds: f64) {
        self.summary = RunSummary {
            total_test_time_seconds,
            services_healthy: self.services.values().filter(|r| r.is_success()).count(),
            protocols_working: self.protocols.values().filter(|r| r.is_success()).count(),
            overall_success_rate: self.overall_success_rate(),
        };
    }
}
