//! Configuration module for the coins config generator
//!
//! Paths and tunables come from the environment; lookup tables come from
//! `utils/constants.rs` but are carried as values so the pipeline can be
//! driven with substitute tables.

use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

use crate::utils::constants::{
    BINANCE_DELISTED_COINS, BINANCE_QUOTE_TICKERS, BINANCE_TICKER_URL,
    CLAIMABLE_COINS, DEFAULT_FRESHNESS_SECS, DEFAULT_RPC_PORT, DEFAULT_SCAN_CONCURRENCY,
    DEFAULT_SCAN_TIMEOUT_SECS, DEFAULT_SEED_PROBE_TIMEOUT_SECS, MAINNET_PROTOCOLS,
    OFF_NETWORK_TYPES, TESTNET_PROTOCOLS,
};

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("⚠️ Ignoring invalid {}={}", key, raw);
            default
        }),
        Err(_) => default,
    }
}

// ============================================
// GENERATOR CONFIG
// ============================================

/// Configuration of a generator run
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Root of the coins repository (`coins`, `electrums/`, ...)
    pub repo_path: PathBuf,
    /// Where generated artifacts are written
    pub output_dir: PathBuf,
    /// Liveness freshness window (seconds)
    pub freshness_secs: i64,
    /// Per-probe timeout of the liveness scan
    pub scan_timeout: Duration,
    /// Maximum concurrent scan probes
    pub scan_concurrency: usize,
    /// Binance ticker source
    pub binance_url: String,
    /// Refresh `api_ids/binance_ids.json` after generation
    pub refresh_binance_ids: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        let repo_path = std::env::var("COINS_REPO_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."));
        let output_dir = std::env::var("COINS_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| repo_path.join("utils"));

        Self {
            repo_path,
            output_dir,
            freshness_secs: env_parse("COINS_FRESHNESS_SECS", DEFAULT_FRESHNESS_SECS),
            scan_timeout: Duration::from_secs(env_parse(
                "COINS_SCAN_TIMEOUT_SECS",
                DEFAULT_SCAN_TIMEOUT_SECS,
            )),
            scan_concurrency: env_parse("COINS_SCAN_CONCURRENCY", DEFAULT_SCAN_CONCURRENCY).max(1),
            binance_url: std::env::var("COINS_BINANCE_URL")
                .unwrap_or_else(|_| BINANCE_TICKER_URL.to_string()),
            refresh_binance_ids: std::env::var("COINS_SKIP_BINANCE").is_err(),
        }
    }
}

impl GeneratorConfig {
    /// Config rooted at `repo_path` with every other value at its default
    pub fn for_repo(repo_path: impl Into<PathBuf>) -> Self {
        let repo_path = repo_path.into();
        Self {
            output_dir: repo_path.join("utils"),
            repo_path,
            freshness_secs: DEFAULT_FRESHNESS_SECS,
            scan_timeout: Duration::from_secs(DEFAULT_SCAN_TIMEOUT_SECS),
            scan_concurrency: DEFAULT_SCAN_CONCURRENCY,
            binance_url: BINANCE_TICKER_URL.to_string(),
            refresh_binance_ids: false,
        }
    }

    pub fn output_path(&self, file: &str) -> PathBuf {
        self.output_dir.join(file)
    }
}

// ============================================
// FAMILY TAG TABLES
// ============================================

/// Ordered ticker -> family tag tables
#[derive(Debug, Clone, PartialEq)]
pub struct ProtocolTables {
    pub mainnet: Vec<(String, String)>,
    pub testnet: Vec<(String, String)>,
}

impl Default for ProtocolTables {
    fn default() -> Self {
        let owned = |table: &[(&str, &str)]| {
            table
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        };
        Self {
            mainnet: owned(MAINNET_PROTOCOLS),
            testnet: owned(TESTNET_PROTOCOLS),
        }
    }
}

impl ProtocolTables {
    pub fn table(&self, testnet: bool) -> &[(String, String)] {
        if testnet {
            &self.testnet
        } else {
            &self.mainnet
        }
    }

    /// Family tag of a platform ticker in the given network's table
    pub fn family_of(&self, ticker: &str, testnet: bool) -> Option<&str> {
        self.table(testnet)
            .iter()
            .find(|(k, _)| k == ticker)
            .map(|(_, v)| v.as_str())
    }

    /// Family tag of a ticker in either table, mainnet first
    pub fn family_in_any(&self, ticker: &str) -> Option<&str> {
        self.family_of(ticker, false)
            .or_else(|| self.family_of(ticker, true))
    }

    pub fn contains_ticker(&self, ticker: &str, testnet: bool) -> bool {
        self.table(testnet).iter().any(|(k, _)| k == ticker)
    }

    /// Reverse lookup: first platform ticker whose family tag matches.
    /// Several tickers can share a tag (ATOM/OSMO/IRIS); the first wins.
    pub fn platform_for_family(&self, family: &str, testnet: bool) -> Option<&str> {
        self.table(testnet)
            .iter()
            .find(|(_, v)| v == family)
            .map(|(k, _)| k.as_str())
    }
}

// ============================================
// PIPELINE POLICY
// ============================================

/// Static policy lists consulted by the pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct PipelinePolicy {
    /// Declared types without scanned servers (get a marker or static nodes)
    pub off_network_types: Vec<String>,
    /// Ticker -> minimal claim amount
    pub claimable_coins: Vec<(String, String)>,
    pub binance_quote_tickers: Vec<String>,
    pub binance_delisted: Vec<String>,
}

impl Default for PipelinePolicy {
    fn default() -> Self {
        let owned = |list: &[&str]| list.iter().map(|s| s.to_string()).collect();
        Self {
            off_network_types: owned(OFF_NETWORK_TYPES),
            claimable_coins: CLAIMABLE_COINS
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            binance_quote_tickers: owned(BINANCE_QUOTE_TICKERS),
            binance_delisted: owned(BINANCE_DELISTED_COINS),
        }
    }
}

impl PipelinePolicy {
    pub fn is_off_network(&self, declared_type: &str) -> bool {
        self.off_network_types.iter().any(|t| t == declared_type)
    }

    pub fn minimal_claim_amount(&self, ticker: &str) -> Option<&str> {
        self.claimable_coins
            .iter()
            .find(|(k, _)| k == ticker)
            .map(|(_, v)| v.as_str())
    }
}

// ============================================
// SEED VALIDATOR CONFIG
// ============================================

/// Configuration of the seed-node validator
#[derive(Debug, Clone)]
pub struct SeedValidatorConfig {
    /// Per-probe timeout
    pub probe_timeout: Duration,
    /// Base RPC port the node ports are derived from
    pub rpc_port: u16,
}

impl Default for SeedValidatorConfig {
    fn default() -> Self {
        Self {
            probe_timeout: Duration::from_secs(env_parse(
                "SEED_PROBE_TIMEOUT_SECS",
                DEFAULT_SEED_PROBE_TIMEOUT_SECS,
            )),
            rpc_port: DEFAULT_RPC_PORT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reverse_lookup_first_match_wins() {
        let tables = ProtocolTables::default();
        assert_eq!(tables.platform_for_family("ERC-20", false), Some("ETH"));
        assert_eq!(tables.platform_for_family("TENDERMINT", false), Some("ATOM"));
        assert_eq!(tables.platform_for_family("TENDERMINT", true), Some("IRISTEST"));
        assert_eq!(tables.platform_for_family("Unknown", false), None);
    }

    #[test]
    fn test_family_lookup_per_network() {
        let tables = ProtocolTables::default();
        assert_eq!(tables.family_of("BNB", false), Some("BEP-20"));
        assert_eq!(tables.family_of("BNB", true), None);
        assert_eq!(tables.family_of("BNBT", true), Some("BEP-20"));
        assert_eq!(tables.family_in_any("tQTUM"), Some("QRC-20"));
        assert_eq!(tables.family_in_any("MATICTEST"), Some("Matic"));
    }

    #[test]
    fn test_policy_defaults() {
        let policy = PipelinePolicy::default();
        assert!(policy.is_off_network("SIA"));
        assert!(!policy.is_off_network("UTXO"));
        assert_eq!(policy.minimal_claim_amount("KMD"), Some("10"));
        assert!(policy.binance_delisted.iter().any(|c| c == "BUSD"));
    }

    #[test]
    fn test_for_repo_paths() {
        let config = GeneratorConfig::for_repo("/tmp/coins");
        assert_eq!(
            config.output_path("coins_config.json"),
            PathBuf::from("/tmp/coins/utils/coins_config.json")
        );
        assert_eq!(config.freshness_secs, 604_800);
    }
}
