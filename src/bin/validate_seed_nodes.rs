//! Seed node validator
//!
//! Usage:
//!   validate_seed_nodes [seed-nodes.json] [seed_nodes_schema.json]
//!
//! Exits 0 when the registry matches the schema and every node answers,
//! 1 otherwise.

use coins_config::utils::constants::{SEED_NODES_FILE, SEED_NODES_SCHEMA_FILE};
use coins_config::{run_validation, SeedValidatorConfig};

use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

fn print_usage() {
    println!("Usage: validate_seed_nodes [NODES_FILE] [SCHEMA_FILE]");
    println!();
    println!("  NODES_FILE   seed node registry (default: {})", SEED_NODES_FILE);
    println!("  SCHEMA_FILE  JSON schema (default: {})", SEED_NODES_SCHEMA_FILE);
    println!();
    println!("Checks the registry against the schema, then probes every node");
    println!("over TCP and, when it declares wss, over secure websocket.");
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .compact()
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return ExitCode::SUCCESS;
    }

    let nodes_path = args
        .first()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(SEED_NODES_FILE));
    let schema_path = args
        .get(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(SEED_NODES_SCHEMA_FILE));

    let config = SeedValidatorConfig::default();
    match run_validation(&config, &nodes_path, &schema_path).await {
        Ok(report) if report.passed() => {
            info!("✅ All {} seed nodes passed", report.nodes.len());
            ExitCode::SUCCESS
        }
        Ok(report) => {
            error!(
                "❌ {} of {} probes failed",
                report.failures().count(),
                report.probes.len()
            );
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("❌ Validation failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
