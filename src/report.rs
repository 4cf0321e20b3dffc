use anyhow::{Context, Result};
use tracing::info;

use crate::models::{ProbeResult, ResultTree};
use crate::utils::{status_icon, title_case};

const RULE_WIDTH: usize = 60;

/// Sectioned console report: services, protocols, performance, summary and a
/// readiness recommendation.
pub fn print_report(tree: &ResultTree) {
    println!("\n{}", "=".repeat(RULE_WIDTH));
    println!("\u{1f3af} PHASE 2 BACKEND TEST RESULTS");
    println!("{}", "=".repeat(RULE_WIDTH));

    println!("\n\u{1f4ca} SERVICE STATUS:");
    for (name, result) in &tree.services {
        print_status_line(name, result);
    }

    println!("\n\u{1f517} PROTOCOL STATUS:");
    for (name, result) in &tree.protocols {
        print_status_line(name, result);
    }

    println!("\n\u{1f4c8} PERFORMANCE METRICS:");
    for (name, stats) in &tree.performance {
        println!("  \u{1f4ca} {}:", title_case(name));
        println!("     Average: {:.2}ms", stats.avg_latency_ms);
        println!("     Min: {:.2}ms", stats.min_latency_ms);
        println!("     Max: {:.2}ms", stats.max_latency_ms);
        println!("     Success Rate: {:.1}%", stats.success_rate * 100.0);
    }

    let summary = &tree.summary;
    println!("\n\u{1f3af} SUMMARY:");
    println!("  Total Test Time: {:.2}s", summary.total_test_time_seconds);
    println!("  Services Healthy: {}", summary.services_healthy);
    println!("  Protocols Working: {}", summary.protocols_working);
    println!(
        "  Overall Success Rate: {:.1}%",
        summary.overall_success_rate * 100.0
    );

    println!("\n\u{1f4a1} RECOMMENDATIONS:");
    if summary.overall_success_rate >= 0.9 {
        println!("  \u{1f389} Phase 2 backend is ready for production testing!");
    } else if summary.overall_success_rate >= 0.7 {
        println!("  \u{26a0}\u{fe0f}  Phase 2 backend is mostly ready, some issues to address");
    } else {
        println!("  \u{274c} Phase 2 backend needs significant fixes before testing");
    }
    println!("{}", "=".repeat(RULE_WIDTH));
}

fn print_status_line(name: &str, result: &ProbeResult) {
    println!(
        "  {} {}: {}",
        status_icon(result.status),
        title_case(name),
        result.status
    );
    println!("     Response Time: {:.2}ms", result.elapsed_ms);
}

/// Persist the full result tree as indented JSON.
pub fn save_report(tree: &ResultTree, path: &str) -> Result<()> {
    let json = serde_json::to_string_pretty(tree).context("Failed to serialize results")?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path))?;
    info!("Results saved to {}", path);
    println!("\n\u{1f4c4} Results saved to: {}", path);
    Ok(())
}
