//! Constants Module - Single Source of Truth
//!
//! Static lookup tables and file names. Nothing here is read directly by
//! the pipeline: the tables are turned into `ProtocolTables` /
//! `PipelinePolicy` values in `models::config` and passed in explicitly.

// ============================================
// APPLICATION CONSTANTS
// ============================================

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// User-Agent for HTTP requests
pub const USER_AGENT: &str = concat!("coins_config/", env!("CARGO_PKG_VERSION"));

// ============================================
// INPUT LAYOUT (relative to the repo root)
// ============================================

pub const COINS_FILE: &str = "coins";
pub const ELECTRUMS_DIR: &str = "electrums";
pub const ETHEREUM_DIR: &str = "ethereum";
pub const TENDERMINT_DIR: &str = "tendermint";
pub const EXPLORERS_DIR: &str = "explorers";
pub const LIGHT_WALLET_DIR: &str = "light_wallet_d";
pub const ICONS_DIR: &str = "icons";
pub const EXPLORER_PATHS_FILE: &str = "explorers/explorer_paths.json";
pub const FOREX_IDS_FILE: &str = "api_ids/forex_ids.json";
pub const LIVECOINWATCH_IDS_FILE: &str = "api_ids/livecoinwatch_ids.json";
pub const BINANCE_IDS_FILE: &str = "api_ids/binance_ids.json";
pub const COINGECKO_IDS_FILE: &str = "api_ids/coingecko_ids.json";
pub const COINPAPRIKA_IDS_FILE: &str = "api_ids/coinpaprika_ids.json";

// ============================================
// OUTPUT ARTIFACTS (relative to the output dir)
// ============================================

pub const SCAN_REPORT_FILE: &str = "electrum_scan_report.json";
pub const UNFILTERED_CONFIG_FILE: &str = "coins_config_unfiltered.json";
pub const CONFIG_FILE: &str = "coins_config.json";
pub const SSL_CONFIG_FILE: &str = "coins_config_ssl.json";
pub const TCP_CONFIG_FILE: &str = "coins_config_tcp.json";
pub const WSS_CONFIG_FILE: &str = "coins_config_wss.json";
pub const SPRITEMAP_IMAGE_FILE: &str = "spritemap.png";
pub const SPRITEMAP_JSON_FILE: &str = "spritemap.json";
pub const SPRITEMAP_UNMATCHED_FILE: &str = "spritemap_unmatched_report.json";

// ============================================
// RECONCILIATION
// ============================================

/// One week grace period for liveness observations (seconds)
pub const DEFAULT_FRESHNESS_SECS: i64 = 604_800;

/// Default per-probe timeout of the liveness scan (seconds)
pub const DEFAULT_SCAN_TIMEOUT_SECS: u64 = 10;

/// Default number of concurrent scan probes
pub const DEFAULT_SCAN_CONCURRENCY: usize = 64;

/// Client name sent in `server.version`
pub const ELECTRUM_CLIENT_NAME: &str = "coins_config";

/// Electrum protocol version sent in `server.version`
pub const ELECTRUM_PROTOCOL_VERSION: &str = "1.4";

// ============================================
// FAMILY TAG TABLES
// ============================================

/// Mainnet platform ticker -> family tag (order matters for reverse lookup)
pub const MAINNET_PROTOCOLS: &[(&str, &str)] = &[
    ("AVAX", "AVX-20"),
    ("BNB", "BEP-20"),
    ("ETC", "Ethereum Classic"),
    ("ETH", "ERC-20"),
    ("ETH-ARB20", "Arbitrum"),
    ("EWT", "EWT"),
    ("FTM", "FTM-20"),
    ("GLMR", "Moonbeam"),
    ("HT", "HecoChain"),
    ("KCS", "KRC-20"),
    ("MATIC", "Matic"),
    ("MOVR", "Moonriver"),
    ("ONE", "HRC-20"),
    ("QTUM", "QRC-20"),
    ("RBTC", "RSK Smart Bitcoin"),
    ("SBCH", "SmartBCH"),
    ("ATOM", "TENDERMINT"),
    ("OSMO", "TENDERMINT"),
    ("IRIS", "TENDERMINT"),
    ("UBQ", "Ubiq"),
];

/// Testnet platform ticker -> family tag
pub const TESTNET_PROTOCOLS: &[(&str, &str)] = &[
    ("AVAXT", "AVX-20"),
    ("BNBT", "BEP-20"),
    ("FTMT", "FTM-20"),
    ("tQTUM", "QRC-20"),
    ("IRISTEST", "TENDERMINT"),
    ("NUCLEUSTEST", "TENDERMINT"),
    ("MATICTEST", "Matic"),
    ("UBQ", "Ubiq"),
];

/// Declared types whose coins are their own parent
pub const SELF_PARENT_TYPES: &[&str] = &["UTXO", "ZHTLC", "BCH", "QTUM"];

/// Declared types resolved through the family tables by ticker/parent
pub const PLATFORM_COIN_TYPES: &[&str] = &["ETH", "QTUM"];

/// Tendermint declared types
pub const TENDERMINT_TYPES: &[&str] = &["TENDERMINT", "TENDERMINTTOKEN"];

/// Tendermint testnet chains (matched as ticker substrings)
pub const TENDERMINT_TESTNET_PARENTS: &[&str] = &["IRISTEST", "NUCLEUSTEST"];

/// IBC token prefixes; the parent is the prefix without `IBC_`
pub const IBC_PREFIXES: &[&str] = &["IBC_IRIS", "IBC_ATOM", "IBC_OSMO"];

/// Declared types that carry a `sign_message_prefix`
pub const SIGN_MESSAGE_TYPES: &[&str] = &["UTXO", "QRC20", "QTUM", "SIA"];

/// Declared types that need `protocol_data.chain_id` mirrored
pub const CHAIN_ID_TYPES: &[&str] = &["ETH", "AVAX", "MATIC", "BNB", "KCS", "FTM", "HT"];

/// Declared types without scanned Electrum servers
pub const OFF_NETWORK_TYPES: &[&str] = &["SIA"];

/// Komodo smart chains sign with this prefix
pub const SMART_CHAIN_SIGN_PREFIX: &str = "Komodo Signed Message:\n";

/// Coins with claimable rewards: (ticker, minimal claim amount)
pub const CLAIMABLE_COINS: &[(&str, &str)] = &[("KMD", "10")];

// ============================================
// BINANCE
// ============================================

/// Binance ticker price endpoint (proxied)
pub const BINANCE_TICKER_URL: &str = "https://defi-stats.komodo.earth/api/v3/binance/ticker_price";

/// Binance quote currencies used to split a trading symbol
pub const BINANCE_QUOTE_TICKERS: &[&str] = &[
    "BTC", "ETH", "BNB", "USDT", "USDC", "TUSD", "XRP", "TRX", "TRY", "EUR", "BRL", "GBP", "AUD",
    "RUB", "NGN", "UAH",
];

/// Coins delisted from Binance; never mapped even when a pair still shows up
pub const BINANCE_DELISTED_COINS: &[&str] = &[
    "AGIX", "ANT", "BAL", "BIDR", "BTT", "BUSD", "ELF", "FIRO", "GFT", "GRS", "IRIS", "LOOM", "MC",
    "MDX", "MIR", "NAV", "OCEAN", "OMG", "PAX", "QI", "REN", "REP", "SNT", "SRM", "VGX", "VIA",
    "WAVES", "YFII",
];

// ============================================
// SPRITEMAP
// ============================================

/// Spritemap cell size in pixels
pub const ICON_SIZE: u32 = 128;

/// Target width/height ratio of the spritemap
pub const SPRITEMAP_ASPECT_RATIO: f64 = 1.2;

/// Protocol suffixes stripped when matching icon names
pub const ICON_NAME_SUFFIXES: &[&str] = &[
    "-bep20", "-erc20", "-plg20", "-avx20", "-krc20", "-ftm20", "-hrc20", "-qrc20", "-arb20",
    "-test", "-testnet", "_bep20", "_erc20", "_plg20", "_avx20", "_krc20", "_ftm20", "_hrc20",
    "_qrc20", "_arb20", "_test", "_testnet",
];

// ============================================
// SEED NODES
// ============================================

/// Default KDF RPC port; all seed ports derive from it
pub const DEFAULT_RPC_PORT: u16 = 7783;

/// Default per-probe timeout of the seed validator (seconds)
pub const DEFAULT_SEED_PROBE_TIMEOUT_SECS: u64 = 15;

pub const SEED_NODES_FILE: &str = "seed-nodes.json";
pub const SEED_NODES_SCHEMA_FILE: &str = "utils/seed_nodes_schema.json";

/// Look up a key in an ordered `(key, value)` table
pub fn table_get<'a>(table: &'a [(&str, &str)], key: &str) -> Option<&'a str> {
    table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_lookup() {
        assert_eq!(table_get(MAINNET_PROTOCOLS, "ETH"), Some("ERC-20"));
        assert_eq!(table_get(TESTNET_PROTOCOLS, "tQTUM"), Some("QRC-20"));
        assert_eq!(table_get(MAINNET_PROTOCOLS, "DOGE"), None);
    }

    #[test]
    fn test_quote_tickers_unique() {
        let mut quotes = BINANCE_QUOTE_TICKERS.to_vec();
        quotes.sort_unstable();
        quotes.dedup();
        assert_eq!(quotes.len(), BINANCE_QUOTE_TICKERS.len());
    }
}
