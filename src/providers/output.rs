//! Artifact writer
//!
//! Every generated JSON file is pretty-printed with a 4-space indent and
//! overwritten in full.

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::core::pipeline::GenerationOutput;
use crate::models::config::GeneratorConfig;
use crate::models::errors::{AppError, AppResult, ErrorCode};
use crate::utils::constants::{
    CONFIG_FILE, SSL_CONFIG_FILE, TCP_CONFIG_FILE, UNFILTERED_CONFIG_FILE, WSS_CONFIG_FILE,
};

/// Serialize with a 4-space indent
pub fn to_pretty_json<T: Serialize>(value: &T) -> AppResult<Vec<u8>> {
    let mut buf = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut serializer)?;
    Ok(buf)
}

/// Write `value` to `path`, creating parent directories
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> AppResult<()> {
    let bytes = to_pretty_json(value)?;

    let write_failed = |e: std::io::Error| {
        AppError::with_source(
            ErrorCode::OutputWriteFailed,
            format!("Failed to write {}", path.display()),
            e,
        )
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_failed)?;
    }
    fs::write(path, bytes).map_err(write_failed)
}

/// Write the unfiltered, canonical and per-protocol config files
pub fn write_generation(config: &GeneratorConfig, output: &GenerationOutput) -> AppResult<()> {
    let artifacts = [
        (UNFILTERED_CONFIG_FILE, &output.unfiltered),
        (CONFIG_FILE, &output.canonical),
        (SSL_CONFIG_FILE, &output.views.ssl),
        (TCP_CONFIG_FILE, &output.views.tcp),
        (WSS_CONFIG_FILE, &output.views.wss),
    ];

    for (file, coins) in artifacts {
        let path = config.output_path(file);
        write_json(&path, coins)?;
        info!("💾 Wrote {} coins to {}", coins.len(), path.display());
    }
    Ok(())
}
