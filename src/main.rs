use anyhow::Result;
use tracing::info;

use voicepulse::config::HarnessConfig;
use voicepulse::engine::Harness;
use voicepulse::{report, utils};

#[tokio::main]
async fn main() -> Result<()> {
    utils::setup_console();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_ansi(true)
        .init();

    let config = HarnessConfig::default();
    info!(
        "Probing media server at {} and orchestrator at {}",
        config.media_server_base, config.orchestrator_ws_url
    );

    let harness = Harness::new(config.clone());
    let results = harness.run().await;

    report::print_report(&results);
    report::save_report(&results, &config.output_path)?;

    Ok(())
}
