//! Core Module - Record derivation & server reconciliation
//!
//! Builder → Reconciler → exclusion → Partitioner. Everything in here is a
//! pure function of a `PipelineContext`; file and network I/O live in
//! `providers`.

pub mod builder;
pub mod partition;
pub mod pipeline;
pub mod reconciler;

pub use builder::*;
pub use partition::*;
pub use pipeline::*;
pub use reconciler::*;

use crate::models::config::{PipelinePolicy, ProtocolTables};
use crate::models::types::LivenessReport;
use crate::providers::registry::Registry;

/// Immutable inputs shared by every pipeline stage
#[derive(Debug, Clone, Copy)]
pub struct PipelineContext<'a> {
    pub registry: &'a Registry,
    /// Liveness snapshot; never mutated by the pipeline
    pub report: &'a LivenessReport,
    pub tables: &'a ProtocolTables,
    pub policy: &'a PipelinePolicy,
    /// Unix time the run is evaluated at
    pub now: i64,
    /// Freshness window for liveness observations (seconds)
    pub freshness_secs: i64,
}
