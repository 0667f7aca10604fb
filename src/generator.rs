//! Generator run
//!
//! Wires the registry, the liveness scan, the pipeline and the artifact
//! writers together for the `coins_config` binary.

use eyre::Result;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::core::{generate, PipelineContext};
use crate::models::config::{GeneratorConfig, PipelinePolicy, ProtocolTables};
use crate::models::types::LivenessReport;
use crate::providers::binance::refresh_binance_ids;
use crate::providers::output::{write_generation, write_json};
use crate::providers::registry::{load_json, Registry};
use crate::providers::scanner::LivenessScanner;
use crate::utils::constants::{
    COINS_FILE, CONFIG_FILE, ICONS_DIR, SCAN_REPORT_FILE, SSL_CONFIG_FILE, TCP_CONFIG_FILE,
    WSS_CONFIG_FILE,
};
use crate::utils::spritemap::generate_spritemap;

/// Command line switches of the generator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Reuse the saved liveness report instead of scanning
    pub skip_scan: bool,
    /// Only rebuild the spritemap when the config files are usable
    pub spritemap_only: bool,
}

impl RunOptions {
    /// Parse the arguments after the program name
    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args: Vec<S> = args.into_iter().collect();
        Self {
            skip_scan: args.first().map(|a| a.as_ref() == "no-scan").unwrap_or(false),
            spritemap_only: args.iter().any(|a| a.as_ref() == "spritemap"),
        }
    }
}

/// Whether the previously written config files can stand in for a full run
fn cached_configs_usable(config: &GeneratorConfig) -> bool {
    let files = [CONFIG_FILE, SSL_CONFIG_FILE, TCP_CONFIG_FILE, WSS_CONFIG_FILE];

    let missing: Vec<&str> = files
        .iter()
        .copied()
        .filter(|f| !config.output_path(f).exists())
        .collect();
    if !missing.is_empty() {
        warn!("⚠️ Missing config files {:?}, running full scan", missing);
        return false;
    }

    let mut maps = Vec::with_capacity(files.len());
    for file in files {
        match load_json::<Map<String, Value>>(&config.output_path(file)) {
            Ok(map) => maps.push(map),
            Err(e) => {
                warn!("⚠️ Error reading config files ({}), running full scan", e);
                return false;
            }
        }
    }

    let usable = !maps[0].is_empty() && maps[1..].iter().any(|m| !m.is_empty());
    if !usable {
        warn!("⚠️ Config files exist but appear to be empty, running full scan");
    }
    usable
}

fn run_spritemap(config: &GeneratorConfig, coins: &[Value]) -> Result<()> {
    let icons_dir = config.repo_path.join(ICONS_DIR);
    let now = chrono::Utc::now().timestamp();
    match generate_spritemap(&icons_dir, &config.output_dir, coins, now)? {
        Some(index) => info!("✅ Spritemap holds {} icons", index.metadata.total_icons),
        None => warn!("⚠️ No spritemap generated"),
    }
    Ok(())
}

async fn liveness_report(config: &GeneratorConfig, registry: &Registry, skip_scan: bool) -> Result<LivenessReport> {
    let path = config.output_path(SCAN_REPORT_FILE);

    if skip_scan {
        info!("⏭️ Skipping scan, using {}", path.display());
        return Ok(load_json(&path)?);
    }

    let previous = if path.exists() {
        load_json(&path).unwrap_or_else(|e| {
            warn!("⚠️ Ignoring unreadable scan report: {}", e);
            LivenessReport::default()
        })
    } else {
        LivenessReport::default()
    };

    let scanner = LivenessScanner::from_config(config)?;
    let report = scanner
        .scan(registry, &previous, chrono::Utc::now().timestamp())
        .await;
    write_json(&path, &report)?;
    Ok(report)
}

/// One generator run
pub async fn run(config: &GeneratorConfig, options: RunOptions) -> Result<()> {
    if options.spritemap_only {
        if cached_configs_usable(config) {
            info!("🖼️ Generating spritemap using existing config files...");
            let coins: Vec<Value> = load_json(&config.repo_path.join(COINS_FILE))?;
            return run_spritemap(config, &coins);
        }
        info!("Falling back to a full run before the spritemap");
    }

    let registry = Registry::load(&config.repo_path)?;
    let report = liveness_report(config, &registry, options.skip_scan).await?;

    let tables = ProtocolTables::default();
    let policy = PipelinePolicy::default();
    let ctx = PipelineContext {
        registry: &registry,
        report: &report,
        tables: &tables,
        policy: &policy,
        now: chrono::Utc::now().timestamp(),
        freshness_secs: config.freshness_secs,
    };

    let output = generate(&ctx);
    write_generation(config, &output)?;

    if config.refresh_binance_ids {
        if let Err(e) = refresh_binance_ids(config, &output.unfiltered, &policy).await {
            warn!("⚠️ Binance id refresh failed, keeping the previous file: {}", e);
        }
    }

    output.log_summary();
    run_spritemap(config, &registry.coins)
}
