//! Probe harness for the voice-agent backend. Issues a fixed sequence of
//! health, signaling, WHIP and AI-pipeline probes against a running
//! deployment, measures latencies, and renders a console + JSON report.

pub mod config;
pub mod engine;
pub mod models;
pub mod report;
pub mod stats;
pub mod utils;
