//! Coins Config - app config generator
//!
//! Usage:
//!   coins_config              full run: scan, generate, spritemap
//!   coins_config no-scan      reuse the saved electrum scan report
//!   coins_config spritemap    spritemap only when the config files exist
//!
//! Environment: see `GeneratorConfig`

use coins_config::utils::constants::APP_VERSION;
use coins_config::{run, GeneratorConfig, RunOptions};

use eyre::Result;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    let options = RunOptions::from_args(std::env::args().skip(1));
    let config = GeneratorConfig::default();
    info!(
        "🚀 coins_config v{}: generating from {} into {}",
        APP_VERSION,
        config.repo_path.display(),
        config.output_dir.display()
    );

    run(&config, options).await?;

    info!("✅ Done");
    Ok(())
}
