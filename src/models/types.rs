//! Type definitions for the coins config generator
//! Raw coin definitions, generated records, server entries and the
//! liveness scan report.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

use crate::models::errors::{AppError, AppResult};

fn is_false(value: &bool) -> bool {
    !*value
}

// ============================================
// TRANSPORT
// ============================================

/// Transport protocol observed for an Electrum endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Transport {
    #[serde(rename = "TCP", alias = "tcp")]
    Tcp,
    #[serde(rename = "SSL", alias = "ssl")]
    Ssl,
    #[serde(rename = "WSS", alias = "wss")]
    Wss,
}

impl Transport {
    /// Fixed order in which liveness observations are matched
    pub const PREFERENCE: [Transport; 3] = [Transport::Tcp, Transport::Ssl, Transport::Wss];

    pub fn as_str(&self) -> &'static str {
        match self {
            Transport::Tcp => "TCP",
            Transport::Ssl => "SSL",
            Transport::Wss => "WSS",
        }
    }

    /// Key used for this transport inside the liveness report
    pub fn report_key(&self) -> &'static str {
        match self {
            Transport::Tcp => "tcp",
            Transport::Ssl => "ssl",
            Transport::Wss => "wss",
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Network domain of an endpoint: an optional `scheme://` is skipped, then
/// everything up to the first `:` or `/`.
pub fn domain_of(url: &str) -> &str {
    let rest = url.split_once("://").map(|(_, r)| r).unwrap_or(url);
    rest.split([':', '/']).next().unwrap_or(rest)
}

// ============================================
// SERVER ENTRIES
// ============================================

/// Electrum-style server entry
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ElectrumServer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Secondary websocket endpoint of the same host
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ws_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<Transport>,
    /// Web-only proxy endpoint, unusable by native clients
    #[serde(rename = "komodo_proxy", default, skip_serializing_if = "is_false")]
    pub proxy_only: bool,
    /// Pass-through fields (contact, disable_cert_verification, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ElectrumServer {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Default::default()
        }
    }

    pub fn websocket(ws_url: impl Into<String>) -> Self {
        Self {
            ws_url: Some(ws_url.into()),
            ..Default::default()
        }
    }

    pub fn with_protocol(mut self, protocol: Transport) -> Self {
        self.protocol = Some(protocol);
        self
    }

    pub fn domain(&self) -> Option<&str> {
        self.url.as_deref().map(domain_of)
    }

    /// True when both entries point at the same primary or websocket URL
    pub fn same_endpoint(&self, other: &ElectrumServer) -> bool {
        let same_url = matches!((&self.url, &other.url), (Some(a), Some(b)) if a == b);
        let same_ws = matches!((&self.ws_url, &other.ws_url), (Some(a), Some(b)) if a == b);
        same_url || same_ws
    }
}

/// RPC node entry (EVM `nodes`, Tendermint `rpc_urls`)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RpcNode {
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ws_url: Option<String>,
    #[serde(rename = "komodo_proxy", default, skip_serializing_if = "is_false")]
    pub proxy_only: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RpcNode {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn is_https(&self) -> bool {
        self.url.starts_with("https")
    }
}

/// Entry of a `nodes` list: a real node, or the classification marker of a
/// coin without network servers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeEntry {
    Node(RpcNode),
    Marker(String),
}

impl NodeEntry {
    pub fn as_node(&self) -> Option<&RpcNode> {
        match self {
            NodeEntry::Node(node) => Some(node),
            NodeEntry::Marker(_) => None,
        }
    }
}

/// Swap contract file (`ethereum/<ticker>`, `tendermint/<ticker>`)
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ContractData {
    #[serde(default)]
    pub swap_contract_address: Option<String>,
    #[serde(default)]
    pub fallback_swap_contract: Option<String>,
    #[serde(default)]
    pub rpc_nodes: Option<Vec<RpcNode>>,
}

// ============================================
// RAW COIN DEFINITION
// ============================================

/// One entry of the `coins` file
#[derive(Debug, Clone, PartialEq)]
pub struct RawCoin {
    /// `coin` with any `-TEST` marker removed
    pub ticker: String,
    /// `protocol.type`
    pub declared_type: String,
    pub fields: Map<String, Value>,
}

impl RawCoin {
    /// Validate the structurally required fields
    pub fn from_value(value: Value) -> AppResult<Self> {
        let fields = match value {
            Value::Object(map) => map,
            other => {
                return Err(AppError::invalid_coin(format!(
                    "coin entry is not an object: {}",
                    other
                )))
            }
        };

        let coin = fields
            .get("coin")
            .and_then(Value::as_str)
            .ok_or_else(|| AppError::invalid_coin("coin entry without `coin` ticker"))?;

        let declared_type = fields
            .get("protocol")
            .and_then(|p| p.get("type"))
            .and_then(Value::as_str)
            .ok_or_else(|| AppError::invalid_coin(format!("{}: missing protocol.type", coin)))?
            .to_string();

        Ok(Self {
            ticker: coin.replace("-TEST", ""),
            declared_type,
            fields,
        })
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    pub fn is_testnet(&self) -> bool {
        self.fields
            .get("is_testnet")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn protocol_data(&self) -> Option<&Map<String, Value>> {
        self.fields
            .get("protocol")
            .and_then(|p| p.get("protocol_data"))
            .and_then(Value::as_object)
    }

    /// Ticker used for file and id lookups (`-segwit` variants share data)
    pub fn lookup_ticker(&self) -> String {
        self.ticker.replace("-segwit", "")
    }

    /// Ticker before the first `-`
    pub fn base_ticker(&self) -> &str {
        self.ticker.split('-').next().unwrap_or(&self.ticker)
    }
}

// ============================================
// GENERATED RECORD
// ============================================

/// Generated configuration record of one coin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinRecord {
    pub coin: String,
    #[serde(rename = "type")]
    pub coin_type: String,
    pub name: String,
    pub coinpaprika_id: String,
    pub coingecko_id: String,
    pub livecoinwatch_id: String,
    pub explorer_url: String,
    pub explorer_tx_url: String,
    pub explorer_address_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explorer_block_url: Option<String>,
    pub supported: Vec<Value>,
    pub active: bool,
    pub is_testnet: bool,
    pub currently_enabled: bool,
    pub wallet_only: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_coin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swap_contract_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_swap_contract: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forex_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binance_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub electrum: Option<Vec<ElectrumServer>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodes: Option<Vec<NodeEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpc_urls: Option<Vec<RpcNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub light_wallet_d_servers: Option<Vec<String>>,
    /// Declared fields passed through verbatim plus derived extras
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CoinRecord {
    /// Field names owned by the typed struct; never copied into `extra`
    pub const TYPED_FIELDS: &'static [&'static str] = &[
        "coin",
        "type",
        "name",
        "coinpaprika_id",
        "coingecko_id",
        "livecoinwatch_id",
        "explorer_url",
        "explorer_tx_url",
        "explorer_address_url",
        "explorer_block_url",
        "supported",
        "active",
        "is_testnet",
        "currently_enabled",
        "wallet_only",
        "parent_coin",
        "contract_address",
        "swap_contract_address",
        "fallback_swap_contract",
        "forex_id",
        "binance_id",
        "electrum",
        "nodes",
        "rpc_urls",
        "light_wallet_d_servers",
    ];

    /// Record with every default a freshly seen coin starts from
    pub fn new(ticker: impl Into<String>, is_testnet: bool) -> Self {
        Self {
            coin: ticker.into(),
            coin_type: String::new(),
            name: String::new(),
            coinpaprika_id: String::new(),
            coingecko_id: String::new(),
            livecoinwatch_id: String::new(),
            explorer_url: String::new(),
            explorer_tx_url: String::new(),
            explorer_address_url: String::new(),
            explorer_block_url: None,
            supported: Vec::new(),
            active: false,
            is_testnet,
            currently_enabled: false,
            wallet_only: false,
            parent_coin: None,
            contract_address: None,
            swap_contract_address: None,
            fallback_swap_contract: None,
            forex_id: None,
            binance_id: None,
            electrum: None,
            nodes: None,
            rpc_urls: None,
            light_wallet_d_servers: None,
            extra: Map::new(),
        }
    }

    /// True when no server list at all is attached
    pub fn has_server_list(&self) -> bool {
        self.electrum.is_some() || self.nodes.is_some() || self.rpc_urls.is_some()
    }

    /// True when some attached server list is empty
    pub fn has_empty_server_list(&self) -> bool {
        self.electrum.as_ref().is_some_and(Vec::is_empty)
            || self.nodes.as_ref().is_some_and(Vec::is_empty)
            || self.rpc_urls.as_ref().is_some_and(Vec::is_empty)
            || self.light_wallet_d_servers.as_ref().is_some_and(Vec::is_empty)
    }
}

/// Ticker -> record, sorted for deterministic output
pub type CoinMap = BTreeMap<String, CoinRecord>;

// ============================================
// LIVENESS SCAN REPORT
// ============================================

fn de_timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|secs| secs as i64))
        .ok_or_else(|| serde::de::Error::custom("last_connection must be a number"))
}

/// Outcome of the latest probe of one endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Unix time of the last successful connection (0 = never)
    #[serde(default, deserialize_with = "de_timestamp")]
    pub last_connection: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
}

impl Observation {
    pub fn is_fresh(&self, now: i64, window_secs: i64) -> bool {
        now.saturating_sub(self.last_connection) < window_secs
    }
}

/// Observations of one coin grouped by transport
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoinLiveness {
    #[serde(default)]
    pub tcp: BTreeMap<String, Observation>,
    #[serde(default)]
    pub ssl: BTreeMap<String, Observation>,
    #[serde(default)]
    pub wss: BTreeMap<String, Observation>,
}

impl CoinLiveness {
    pub fn by_transport(&self, transport: Transport) -> &BTreeMap<String, Observation> {
        match transport {
            Transport::Tcp => &self.tcp,
            Transport::Ssl => &self.ssl,
            Transport::Wss => &self.wss,
        }
    }

    pub fn by_transport_mut(&mut self, transport: Transport) -> &mut BTreeMap<String, Observation> {
        match transport {
            Transport::Tcp => &mut self.tcp,
            Transport::Ssl => &mut self.ssl,
            Transport::Wss => &mut self.wss,
        }
    }
}

/// Ticker -> transport -> endpoint URL -> observation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LivenessReport {
    pub coins: BTreeMap<String, CoinLiveness>,
}

impl LivenessReport {
    pub fn get(&self, ticker: &str) -> Option<&CoinLiveness> {
        self.coins.get(ticker)
    }

    /// Record a successful connection at `now`
    pub fn record(&mut self, ticker: &str, transport: Transport, url: &str, now: i64) {
        self.coins
            .entry(ticker.to_string())
            .or_default()
            .by_transport_mut(transport)
            .insert(
                url.to_string(),
                Observation {
                    last_connection: now,
                    result: Some("Passed".to_string()),
                },
            );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_domain_of() {
        assert_eq!(domain_of("electrum1.cipig.net:10001"), "electrum1.cipig.net");
        assert_eq!(domain_of("ssl://x.com:50002"), "x.com");
        assert_eq!(domain_of("wss://node.example/ws"), "node.example");
        assert_eq!(domain_of("plainhost"), "plainhost");
    }

    #[test]
    fn test_transport_serde() {
        let server: ElectrumServer =
            serde_json::from_value(json!({"url": "a:1", "protocol": "ssl"})).unwrap();
        assert_eq!(server.protocol, Some(Transport::Ssl));
        let out = serde_json::to_value(&server).unwrap();
        assert_eq!(out, json!({"url": "a:1", "protocol": "SSL"}));
    }

    #[test]
    fn test_electrum_extra_fields_survive() {
        let raw = json!({
            "url": "a:1",
            "contact": [{"email": "ops@example.com"}],
            "komodo_proxy": true
        });
        let server: ElectrumServer = serde_json::from_value(raw.clone()).unwrap();
        assert!(server.proxy_only);
        assert_eq!(serde_json::to_value(&server).unwrap(), raw);
    }

    #[test]
    fn test_node_entry_marker() {
        let nodes: Vec<NodeEntry> =
            serde_json::from_value(json!(["SIA", {"url": "https://n"}])).unwrap();
        assert_eq!(nodes[0], NodeEntry::Marker("SIA".into()));
        assert!(nodes[1].as_node().is_some_and(RpcNode::is_https));
    }

    #[test]
    fn test_raw_coin_requires_ticker_and_type() {
        assert!(RawCoin::from_value(json!({"protocol": {"type": "UTXO"}})).is_err());
        assert!(RawCoin::from_value(json!({"coin": "KMD"})).is_err());

        let coin = RawCoin::from_value(json!({
            "coin": "BTC-TEST-segwit",
            "protocol": {"type": "UTXO"}
        }))
        .unwrap();
        assert_eq!(coin.ticker, "BTC-segwit");
        assert_eq!(coin.lookup_ticker(), "BTC");
        assert_eq!(coin.base_ticker(), "BTC");
    }

    #[test]
    fn test_observation_accepts_float_timestamps() {
        let obs: Observation =
            serde_json::from_value(json!({"last_connection": 1700000000.75})).unwrap();
        assert_eq!(obs.last_connection, 1_700_000_000);
        assert!(obs.is_fresh(1_700_000_100, 604_800));
        assert!(!obs.is_fresh(1_700_000_000 + 604_800, 604_800));
    }

    #[test]
    fn test_observation_freshness_saturates() {
        let obs: Observation = serde_json::from_value(json!({"last_connection": -1e30})).unwrap();
        assert_eq!(obs.last_connection, i64::MIN);
        assert!(!obs.is_fresh(1_700_000_000, 604_800));

        let obs = Observation {
            last_connection: i64::MIN,
            ..Default::default()
        };
        assert!(!obs.is_fresh(i64::MAX, 604_800));
    }

    #[test]
    fn test_record_serialization_skips_absent_lists() {
        let record = CoinRecord::new("KMD", false);
        let value = serde_json::to_value(&record).unwrap();
        assert!(value.get("electrum").is_none());
        assert_eq!(value["type"], json!(""));
        assert_eq!(value["supported"], json!([]));
    }
}
