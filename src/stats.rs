use std::future::Future;
use std::time::{Duration, Instant};

use tracing::info;

use crate::models::{LatencyStats, ProbeResult};

/// Invoke `probe` `iterations` times sequentially and aggregate the elapsed
/// wall times. A fixed pause between invocations keeps the target from being
/// hammered; there is no concurrency and no retry.
pub async fn measure_latency<F, Fut>(probe: F, iterations: usize, pause: Duration) -> LatencyStats
where
    F: Fn() -> Fut,
    Fut: Future<Output = ProbeResult>,
{
    let mut latencies = Vec::with_capacity(iterations);
    let mut samples = Vec::with_capacity(iterations);

    for i in 0..iterations {
        let start = Instant::now();
        let result = probe().await;
        latencies.push(start.elapsed().as_secs_f64() * 1000.0);
        samples.push(result);

        if i + 1 < iterations {
            tokio::time::sleep(pause).await;
        }
    }

    let successes = samples.iter().filter(|r| r.is_success()).count();
    let success_rate = if iterations == 0 {
        0.0
    } else {
        successes as f64 / iterations as f64
    };

    let mut sorted = latencies.clone();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let stats = LatencyStats {
        min_latency_ms: sorted.first().copied().unwrap_or(0.0),
        max_latency_ms: sorted.last().copied().unwrap_or(0.0),
        avg_latency_ms: mean(&latencies),
        median_latency_ms: median(&sorted),
        std_deviation_ms: sample_stddev(&latencies),
        success_rate,
        samples,
    };
    info!(
        "Latency over {} iterations: avg {:.2}ms, min {:.2}ms, max {:.2}ms",
        iterations, stats.avg_latency_ms, stats.min_latency_ms, stats.max_latency_ms
    );
    stats
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Median of an already sorted slice, interpolating between the two middle
/// values for even counts.
fn median(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    match n {
        0 => 0.0,
        _ if n % 2 == 1 => sorted[n / 2],
        _ => (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0,
    }
}

/// Sample standard deviation; zero when fewer than two values exist.
fn sample_stddev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let avg = mean(values);
    let variance = values
        .iter()
        .map(|v| (v - avg).powi(2))
        .sum::<f64>()
        / (values.len() - 1) as f64;
    variance.sqrt()
}
