//! Signal Visualizer - Main Entry Point

use anyhow::Context;
use api::{init_logging, run_server};
use stream_registry::{RegistryLoader, VisualizerConfig};
use tracing::info;

const DEFAULT_CONFIG_PATH: &str = "./visualizer_config.conf";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("VISUALIZER_CONFIG").ok())
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    let config = VisualizerConfig::load(&config_path)
        .with_context(|| format!("loading configuration from {config_path}"))?;
    init_logging(&config.server.log_level)?;

    info!("=== Signal Visualizer v{} ===", env!("CARGO_PKG_VERSION"));
    info!(
        "Loaded configuration from {} (modalities: {})",
        config_path,
        config.modalities().join(", ")
    );

    // Every extractor runs here; nothing is served until all streams are ready
    let registry = RegistryLoader::new()
        .load(&config)
        .context("loading recordings")?;

    run_server(&config.server.address, registry).await
}
