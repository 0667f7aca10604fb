//! Seed Node Validator
//!
//! Checks `seed-nodes.json` against its schema, derives each node's ports
//! from its netid and probes every node for reachability. A single failing
//! probe fails the whole run.

pub mod ports;
pub mod probe;
pub mod schema;

pub use ports::*;
pub use probe::*;
pub use schema::*;

use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use tracing::{error, info};

use crate::models::config::SeedValidatorConfig;
use crate::models::errors::{AppError, AppResult};
use crate::providers::registry::load_json;

/// One entry of the seed node registry
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SeedNode {
    pub name: String,
    pub host: String,
    /// `domain` or `ip`
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub wss: bool,
    pub netid: u16,
    #[serde(default)]
    pub contact: Vec<Value>,
}

impl SeedNode {
    pub fn summary_line(&self, index: usize) -> String {
        format!(
            "{}. {} ({}) - netid: {} - {} contact(s)",
            index,
            self.name,
            self.host,
            self.netid,
            self.contact.len()
        )
    }
}

/// Outcome of a validator run
#[derive(Debug, Clone, PartialEq)]
pub struct SeedReport {
    pub nodes: Vec<SeedNode>,
    pub probes: Vec<ProbeOutcome>,
}

impl SeedReport {
    pub fn failures(&self) -> impl Iterator<Item = &ProbeOutcome> {
        self.probes.iter().filter(|p| !p.passed())
    }

    pub fn passed(&self) -> bool {
        self.failures().next().is_none()
    }
}

/// Load both documents, check the schema and validate the registry against
/// it. Returns the parsed nodes.
pub fn load_and_check(nodes_path: &Path, schema_path: &Path) -> AppResult<Vec<SeedNode>> {
    let schema: Value = load_json(schema_path)?;
    let document: Value = load_json(nodes_path)?;

    check_schema(&schema)?;
    info!("✓ Schema is valid");

    validate(&document, &schema)?;
    let nodes: Vec<SeedNode> = serde_json::from_value(document)
        .map_err(|e| AppError::schema_invalid(format!("{}: {}", nodes_path.display(), e)))?;
    info!("✓ Seed nodes file is valid, {} nodes", nodes.len());

    for (i, node) in nodes.iter().enumerate() {
        info!("  {}", node.summary_line(i + 1));
    }
    Ok(nodes)
}

/// Full validation: schema, port layout and reachability
pub async fn run_validation(
    config: &SeedValidatorConfig,
    nodes_path: &Path,
    schema_path: &Path,
) -> AppResult<SeedReport> {
    info!("Validating: {}", nodes_path.display());
    info!("Schema: {}", schema_path.display());

    let nodes = load_and_check(nodes_path, schema_path)?;
    let probes = probe_nodes(&nodes, config).await?;

    let report = SeedReport { nodes, probes };
    for failure in report.failures() {
        error!(
            "❌ {} ({}) unreachable over {} port {}",
            failure.node, failure.host, failure.kind, failure.port
        );
    }
    Ok(report)
}
