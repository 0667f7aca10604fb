//! Source Registry Loader
//!
//! Reads the static JSON fact tables of the coins repository into memory.
//! The pipeline only ever sees the in-memory `Registry`, so tests can build
//! one by hand.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::models::errors::{AppError, AppResult};
use crate::models::types::{ContractData, ElectrumServer};
use crate::utils::constants::{
    COINGECKO_IDS_FILE, COINPAPRIKA_IDS_FILE, COINS_FILE, ELECTRUMS_DIR, ETHEREUM_DIR,
    EXPLORERS_DIR, EXPLORER_PATHS_FILE, FOREX_IDS_FILE, LIGHT_WALLET_DIR,
    LIVECOINWATCH_IDS_FILE, BINANCE_IDS_FILE, TENDERMINT_DIR,
};

/// External price/aggregator id tables
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExternalIds {
    pub forex: BTreeMap<String, String>,
    pub livecoinwatch: BTreeMap<String, String>,
    pub binance: BTreeMap<String, String>,
    pub coingecko: BTreeMap<String, String>,
    pub coinpaprika: BTreeMap<String, String>,
}

/// Everything the generator reads from the repository
#[derive(Debug, Clone, Default)]
pub struct Registry {
    /// Raw entries of the `coins` file
    pub coins: Vec<Value>,
    /// `electrums/<ticker>`
    pub electrums: BTreeMap<String, Vec<ElectrumServer>>,
    /// `ethereum/<ticker>`
    pub ethereum: BTreeMap<String, ContractData>,
    /// `tendermint/<ticker>`
    pub tendermint: BTreeMap<String, ContractData>,
    /// `explorers/<ticker>`
    pub explorers: BTreeMap<String, Vec<String>>,
    /// `light_wallet_d/<ticker>`
    pub light_wallet: BTreeMap<String, Vec<String>>,
    /// Explorer URL fragment -> URL path templates, in file order
    pub explorer_paths: Map<String, Value>,
    pub ids: ExternalIds,
}

impl Registry {
    /// Load the whole registry rooted at `repo_path`.
    /// Missing required files and malformed JSON are fatal.
    pub fn load(repo_path: &Path) -> AppResult<Self> {
        info!("📂 Loading coins registry from {}", repo_path.display());

        let registry = Self {
            coins: load_json(&repo_path.join(COINS_FILE))?,
            electrums: load_dir(&repo_path.join(ELECTRUMS_DIR))?,
            ethereum: load_dir(&repo_path.join(ETHEREUM_DIR))?,
            tendermint: load_dir(&repo_path.join(TENDERMINT_DIR))?,
            explorers: load_dir(&repo_path.join(EXPLORERS_DIR))?,
            light_wallet: load_dir(&repo_path.join(LIGHT_WALLET_DIR))?,
            explorer_paths: load_json(&repo_path.join(EXPLORER_PATHS_FILE))?,
            ids: ExternalIds {
                forex: load_json(&repo_path.join(FOREX_IDS_FILE))?,
                livecoinwatch: load_json(&repo_path.join(LIVECOINWATCH_IDS_FILE))?,
                binance: load_json(&repo_path.join(BINANCE_IDS_FILE))?,
                coingecko: load_json(&repo_path.join(COINGECKO_IDS_FILE))?,
                coinpaprika: load_json(&repo_path.join(COINPAPRIKA_IDS_FILE))?,
            },
        };

        info!(
            "📊 Registry: {} coins, {} electrum lists, {} ethereum, {} tendermint, {} explorer lists",
            registry.coins.len(),
            registry.electrums.len(),
            registry.ethereum.len(),
            registry.tendermint.len(),
            registry.explorers.len()
        );

        Ok(registry)
    }

    pub fn has_electrums(&self, ticker: &str) -> bool {
        self.electrums.contains_key(ticker)
    }
}

/// Read and parse one JSON file
pub fn load_json<T: DeserializeOwned>(path: &Path) -> AppResult<T> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::missing_file(path.display()))
        }
        Err(e) => return Err(e.into()),
    };
    serde_json::from_str(&text).map_err(|e| AppError::malformed_json(path.display(), e))
}

/// Load every per-ticker file of a directory (file name = ticker).
/// A missing directory is treated as empty; `.json` side files such as
/// `explorer_paths.json` are not per-ticker data and are skipped.
pub fn load_dir<T: DeserializeOwned>(dir: &Path) -> AppResult<BTreeMap<String, T>> {
    let mut out = BTreeMap::new();

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("⚠️ Directory {} not found, treating as empty", dir.display());
            return Ok(out);
        }
        Err(e) => return Err(e.into()),
    };

    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') || name.ends_with(".json") {
            debug!("Skipping {} in {}", name, dir.display());
            continue;
        }
        out.insert(name, load_json(&entry.path())?);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::errors::ErrorCode;

    #[test]
    fn test_load_dir_skips_side_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("BTC"), r#"["https://blockstream.info/"]"#).unwrap();
        fs::write(dir.path().join("explorer_paths.json"), r#"{"x": {}}"#).unwrap();
        fs::write(dir.path().join(".hidden"), "garbage").unwrap();

        let explorers: BTreeMap<String, Vec<String>> = load_dir(dir.path()).unwrap();
        assert_eq!(explorers.len(), 1);
        assert_eq!(explorers["BTC"], vec!["https://blockstream.info/".to_string()]);
    }

    #[test]
    fn test_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let loaded: BTreeMap<String, Vec<String>> =
            load_dir(&dir.path().join("light_wallet_d")).unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_missing_and_malformed_files_are_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_json::<Vec<Value>>(&dir.path().join("coins")).unwrap_err();
        assert_eq!(err.code, ErrorCode::RegistryMissingFile);

        fs::write(dir.path().join("coins"), "[{").unwrap();
        let err = load_json::<Vec<Value>>(&dir.path().join("coins")).unwrap_err();
        assert_eq!(err.code, ErrorCode::RegistryMalformedJson);
    }
}
