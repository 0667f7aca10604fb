//! Coins Config Library
//!
//! Aggregates the coin registry (coin definitions, Electrum/RPC server
//! lists, explorers, external ids) into the app config files:
//! - Reconciles static server lists against a liveness scan
//! - Partitions the result into SSL, TCP and WSS views
//! - Packs coin icons into a spritemap
//! - Validates the seed node registry and probes its nodes

pub mod core;
pub mod generator;
pub mod models;
pub mod providers;
pub mod seed;
pub mod utils;

pub use crate::core::{generate, GenerationOutput, PipelineContext, ProtocolViews};
pub use generator::{run, RunOptions};
pub use models::config::{GeneratorConfig, PipelinePolicy, ProtocolTables, SeedValidatorConfig};
pub use models::errors::{AppError, AppResult, ErrorCode};
pub use models::types::{CoinMap, CoinRecord, ElectrumServer, LivenessReport, Transport};
pub use providers::registry::Registry;
pub use seed::{run_validation, SeedReport};
