//! Coin Record Builder
//!
//! Derives a normalized `CoinRecord` from one raw coin definition. The
//! derivation is a fixed sequence of stages, each taking the record by
//! value and returning the patched record. Declared fields are merged
//! first so every later stage overrides generic values, never the reverse.
//! Server lists are attached afterwards by the reconciler.

use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use super::PipelineContext;
use crate::models::config::ProtocolTables;
use crate::models::types::{CoinRecord, ContractData, RawCoin};
use crate::providers::registry::Registry;
use crate::utils::constants::{
    CHAIN_ID_TYPES, IBC_PREFIXES, PLATFORM_COIN_TYPES, SELF_PARENT_TYPES, SIGN_MESSAGE_TYPES,
    SMART_CHAIN_SIGN_PREFIX, TENDERMINT_TESTNET_PARENTS, TENDERMINT_TYPES,
};

/// Tickers whose parent is not derivable from the family tables
const PARENT_OVERRIDES: &[(&str, &str)] = &[("RBTC", "RSK")];

/// One derivation step
type Stage = fn(CoinRecord, &RawCoin, &PipelineContext<'_>) -> CoinRecord;

/// Derivation order. `merge_declared_fields` must stay first.
const STAGES: &[Stage] = &[
    merge_declared_fields,
    normalize_chain_id,
    apply_sign_message_prefix,
    apply_protocol_data,
    resolve_classification,
    apply_name,
    attach_swap_contracts,
    attach_explorers,
    apply_smart_chain,
    apply_wallet_only,
    apply_address_format,
    apply_rewards,
    attach_external_ids,
];

/// Build the server-less record of one coin
pub fn build_record(raw: &RawCoin, ctx: &PipelineContext<'_>) -> CoinRecord {
    let seed = CoinRecord::new(&raw.ticker, raw.is_testnet());
    STAGES.iter().fold(seed, |record, stage| stage(record, raw, ctx))
}

fn is_tendermint(declared_type: &str) -> bool {
    TENDERMINT_TYPES.contains(&declared_type)
}

/// Parent ticker used for file lookups: the resolved parent, or the coin itself
pub fn lookup_parent(record: &CoinRecord) -> &str {
    record.parent_coin.as_deref().unwrap_or(&record.coin)
}

// ============================================
// GENERIC FIELDS
// ============================================

/// Copy every declared field. Fields the typed record owns seed the typed
/// value; later stages replace it only when they derive one of their own.
fn merge_declared_fields(mut record: CoinRecord, raw: &RawCoin, _ctx: &PipelineContext<'_>) -> CoinRecord {
    for (key, value) in &raw.fields {
        if CoinRecord::TYPED_FIELDS.contains(&key.as_str()) {
            seed_typed_field(&mut record, key, value);
        } else {
            record.extra.insert(key.clone(), value.clone());
        }
    }
    record
}

fn typed<T: DeserializeOwned>(key: &str, value: &Value) -> Option<T> {
    match serde_json::from_value(value.clone()) {
        Ok(typed) => Some(typed),
        Err(e) => {
            debug!("Ignoring declared {}: {}", key, e);
            None
        }
    }
}

/// `coin`, `type` and `is_testnet` are derived from the raw entry itself
fn seed_typed_field(record: &mut CoinRecord, key: &str, value: &Value) {
    let text = || value.as_str().map(str::to_string);
    let set_text = |slot: &mut String| {
        if let Some(v) = value.as_str() {
            *slot = v.to_string();
        }
    };
    let set_flag = |slot: &mut bool| {
        if let Some(v) = value.as_bool() {
            *slot = v;
        }
    };

    match key {
        "name" => set_text(&mut record.name),
        "coinpaprika_id" => set_text(&mut record.coinpaprika_id),
        "coingecko_id" => set_text(&mut record.coingecko_id),
        "livecoinwatch_id" => set_text(&mut record.livecoinwatch_id),
        "explorer_url" => set_text(&mut record.explorer_url),
        "explorer_tx_url" => set_text(&mut record.explorer_tx_url),
        "explorer_address_url" => set_text(&mut record.explorer_address_url),
        "explorer_block_url" => record.explorer_block_url = text(),
        "parent_coin" => record.parent_coin = text(),
        "contract_address" => record.contract_address = text(),
        "swap_contract_address" => record.swap_contract_address = text(),
        "fallback_swap_contract" => record.fallback_swap_contract = text(),
        "forex_id" => record.forex_id = text(),
        "binance_id" => record.binance_id = text(),
        "active" => set_flag(&mut record.active),
        "currently_enabled" => set_flag(&mut record.currently_enabled),
        "wallet_only" => set_flag(&mut record.wallet_only),
        "supported" => record.supported = typed(key, value).unwrap_or_default(),
        "electrum" => record.electrum = typed(key, value),
        "nodes" => record.nodes = typed(key, value),
        "rpc_urls" => record.rpc_urls = typed(key, value),
        "light_wallet_d_servers" => record.light_wallet_d_servers = typed(key, value),
        _ => {}
    }
}

/// Mirror a top-level `chain_id` into `protocol.protocol_data.chain_id`
fn normalize_chain_id(mut record: CoinRecord, raw: &RawCoin, _ctx: &PipelineContext<'_>) -> CoinRecord {
    if !CHAIN_ID_TYPES.contains(&raw.declared_type.as_str()) {
        return record;
    }
    let Some(chain_id) = raw.get("chain_id").cloned() else {
        return record;
    };
    if let Some(Value::Object(protocol)) = record.extra.get_mut("protocol") {
        let data = protocol
            .entry("protocol_data")
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(data) = data {
            data.insert("chain_id".to_string(), chain_id);
        }
    }
    record
}

fn apply_sign_message_prefix(mut record: CoinRecord, raw: &RawCoin, _ctx: &PipelineContext<'_>) -> CoinRecord {
    if !SIGN_MESSAGE_TYPES.contains(&raw.declared_type.as_str()) {
        return record;
    }
    match raw.get("sign_message_prefix") {
        Some(Value::String(prefix)) if !prefix.is_empty() => {
            record
                .extra
                .insert("sign_message_prefix".to_string(), json!(prefix));
        }
        Some(_) => {
            record
                .extra
                .insert("sign_message_prefix".to_string(), json!(""));
        }
        None => debug!("{}: sign message prefix not found", record.coin),
    }
    record
}

/// Token contract and ZHTLC checkpoint fields
fn apply_protocol_data(mut record: CoinRecord, raw: &RawCoin, _ctx: &PipelineContext<'_>) -> CoinRecord {
    let Some(data) = raw.protocol_data() else {
        return record;
    };

    if let Some(checkpoint) = data.get("check_point_block") {
        if let Some(height) = checkpoint.get("height") {
            record
                .extra
                .insert("checkpoint_height".to_string(), height.clone());
        }
        if let Some(time) = checkpoint.get("time") {
            record
                .extra
                .insert("checkpoint_blocktime".to_string(), time.clone());
        }
    } else if data.contains_key("platform") {
        if let Some(address) = data.get("contract_address").and_then(Value::as_str) {
            record.contract_address = Some(address.to_string());
        }
    }
    record
}

// ============================================
// CLASSIFICATION & PARENT
// ============================================

/// Resolve the family tag and parent coin
fn resolve_classification(mut record: CoinRecord, raw: &RawCoin, ctx: &PipelineContext<'_>) -> CoinRecord {
    let declared = raw.declared_type.as_str();

    record.coin_type = declared.to_string();
    let platform = raw
        .protocol_data()
        .and_then(|data| data.get("platform"))
        .and_then(Value::as_str);
    if let Some(platform) = platform {
        match ctx.tables.family_of(platform, record.is_testnet) {
            Some(family) => record.coin_type = family.to_string(),
            None => warn!(
                "⚠️ {}: platform {} has no family tag, keeping declared type {}",
                record.coin, platform, declared
            ),
        }
    }

    let (parent, testnet_chain) =
        resolve_parent(&record.coin, declared, &record.coin_type, record.is_testnet, ctx.tables);
    if testnet_chain {
        record.is_testnet = true;
    }
    if let Some(parent) = parent {
        record.parent_coin = (parent != record.coin).then_some(parent);
    }

    if PLATFORM_COIN_TYPES.contains(&declared) {
        let family = ctx.tables.family_in_any(&record.coin).or_else(|| {
            record
                .parent_coin
                .as_deref()
                .and_then(|parent| ctx.tables.family_in_any(parent))
        });
        match family {
            Some(family) => record.coin_type = family.to_string(),
            None => {
                warn!(
                    "⚠️ {}: no family tag for ticker or parent, keeping declared type {}",
                    record.coin, declared
                );
                record.coin_type = declared.to_string();
            }
        }
    } else if is_tendermint(declared) {
        record.coin_type = declared.to_string();
    }

    record
}

/// Parent coin of a ticker and whether the ticker belongs to a testnet chain.
///
/// Several platform tickers can share one family tag; the reverse lookup
/// returns the first one in table order.
pub fn resolve_parent(
    ticker: &str,
    declared_type: &str,
    family: &str,
    is_testnet: bool,
    tables: &ProtocolTables,
) -> (Option<String>, bool) {
    if let Some((_, parent)) = PARENT_OVERRIDES.iter().find(|(t, _)| *t == ticker) {
        return (Some(parent.to_string()), false);
    }

    if is_tendermint(declared_type) {
        if let Some(chain) = TENDERMINT_TESTNET_PARENTS.iter().find(|c| ticker.contains(**c)) {
            return (Some(chain.to_string()), true);
        }
        if let Some(prefix) = IBC_PREFIXES.iter().find(|p| ticker.contains(**p)) {
            return (Some(prefix.trim_start_matches("IBC_").to_string()), false);
        }
    }

    if SELF_PARENT_TYPES.contains(&declared_type) {
        return (Some(ticker.to_string()), false);
    }

    if tables.contains_ticker(ticker, is_testnet) {
        return (Some(ticker.to_string()), false);
    }

    match tables.platform_for_family(family, is_testnet) {
        Some(parent) => (Some(parent.to_string()), false),
        None => {
            warn!("⚠️ {}: family {} not in the {} table", ticker, family, if is_testnet { "testnet" } else { "mainnet" });
            (None, false)
        }
    }
}

// ============================================
// DISPLAY & CONTRACTS
// ============================================

fn apply_name(mut record: CoinRecord, raw: &RawCoin, _ctx: &PipelineContext<'_>) -> CoinRecord {
    match raw.str_field("fname") {
        Some(fname) => record.name = fname.to_string(),
        None => warn!("⚠️ {}: no fname, name left empty", record.coin),
    }
    record
}

/// Swap contract file that applies to a record, if any
pub fn contract_source<'r>(record: &CoinRecord, registry: &'r Registry) -> Option<&'r ContractData> {
    if let Some(own) = registry.ethereum.get(&record.coin) {
        return Some(own);
    }
    if is_tendermint(&record.coin_type) {
        return registry.tendermint.get(lookup_parent(record));
    }
    if !registry.has_electrums(&record.coin) {
        if let Some(parent) = record.parent_coin.as_deref() {
            return registry.ethereum.get(parent);
        }
    }
    None
}

fn attach_swap_contracts(mut record: CoinRecord, _raw: &RawCoin, ctx: &PipelineContext<'_>) -> CoinRecord {
    if let Some(contract) = contract_source(&record, ctx.registry) {
        if contract.swap_contract_address.is_some() {
            record.swap_contract_address = contract.swap_contract_address.clone();
        }
        if contract.fallback_swap_contract.is_some() {
            record.fallback_swap_contract = contract.fallback_swap_contract.clone();
        }
    }
    record
}

// ============================================
// EXPLORERS
// ============================================

fn merge_explorer_template(record: &mut CoinRecord, template: &Value) {
    let Some(template) = template.as_object() else {
        return;
    };
    for (key, value) in template {
        let text = value.as_str().map(str::to_string);
        match (key.as_str(), text) {
            ("explorer_tx_url", Some(v)) => record.explorer_tx_url = v,
            ("explorer_address_url", Some(v)) => record.explorer_address_url = v,
            ("explorer_block_url", Some(v)) => record.explorer_block_url = Some(v),
            _ => {
                record.extra.insert(key.clone(), value.clone());
            }
        }
    }
}

fn attach_explorers(mut record: CoinRecord, raw: &RawCoin, ctx: &PipelineContext<'_>) -> CoinRecord {
    let registry = ctx.registry;
    let explorers = registry.explorers.get(&raw.lookup_ticker()).or_else(|| {
        record
            .parent_coin
            .as_ref()
            .and_then(|parent| registry.explorers.get(parent))
    });
    let Some(explorers) = explorers.filter(|list| !list.is_empty()) else {
        return record;
    };

    for url in explorers {
        if let Some((_, template)) = registry
            .explorer_paths
            .iter()
            .find(|(fragment, _)| url.contains(fragment.as_str()))
        {
            merge_explorer_template(&mut record, template);
        }
    }

    record.explorer_url = explorers[0].clone();
    if record.explorer_tx_url.is_empty() {
        record.explorer_tx_url = "tx/".to_string();
    }
    if record.explorer_address_url.is_empty() {
        record.explorer_address_url = "address/".to_string();
    }
    if record.explorer_block_url.as_deref().map_or(true, str::is_empty) {
        record.explorer_block_url = Some("block/".to_string());
    }
    record
}

// ============================================
// FLAGS
// ============================================

fn apply_smart_chain(mut record: CoinRecord, raw: &RawCoin, _ctx: &PipelineContext<'_>) -> CoinRecord {
    if raw.str_field("sign_message_prefix") == Some(SMART_CHAIN_SIGN_PREFIX) {
        record.coin_type = "Smart Chain".to_string();
    }
    record
}

fn apply_wallet_only(mut record: CoinRecord, raw: &RawCoin, _ctx: &PipelineContext<'_>) -> CoinRecord {
    if let Some(wallet_only) = raw.get("wallet_only").and_then(Value::as_bool) {
        record.wallet_only = wallet_only;
    }
    record
}

fn apply_address_format(mut record: CoinRecord, _raw: &RawCoin, _ctx: &PipelineContext<'_>) -> CoinRecord {
    if record.coin.contains("-segwit") {
        record
            .extra
            .insert("address_format".to_string(), json!({"format": "segwit"}));
    }
    record
}

fn apply_rewards(mut record: CoinRecord, _raw: &RawCoin, ctx: &PipelineContext<'_>) -> CoinRecord {
    if let Some(amount) = ctx.policy.minimal_claim_amount(&record.coin) {
        record.extra.insert("is_claimable".to_string(), json!(true));
        record
            .extra
            .insert("minimal_claim_amount".to_string(), json!(amount));
    }
    record
}

// ============================================
// EXTERNAL IDS
// ============================================

fn attach_external_ids(mut record: CoinRecord, raw: &RawCoin, ctx: &PipelineContext<'_>) -> CoinRecord {
    let ids = &ctx.registry.ids;
    let lookup = raw.lookup_ticker();
    let base = raw.base_ticker();

    if let Some(id) = ids.forex.get(&lookup) {
        record.forex_id = Some(id.clone());
    }
    if let Some(id) = ids.coinpaprika.get(&lookup) {
        record.coinpaprika_id = id.clone();
    }
    if let Some(id) = ids.coingecko.get(&lookup) {
        record.coingecko_id = id.clone();
    }
    if let Some(id) = ids.livecoinwatch.get(base) {
        record.livecoinwatch_id = id.clone();
    }
    if let Some(id) = ids.binance.get(base) {
        record.binance_id = Some(id.clone());
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::PipelinePolicy;
    use crate::models::types::LivenessReport;
    use serde_json::json;

    struct Fixture {
        registry: Registry,
        report: LivenessReport,
        tables: ProtocolTables,
        policy: PipelinePolicy,
    }

    impl Fixture {
        fn new(registry: Registry) -> Self {
            Self {
                registry,
                report: LivenessReport::default(),
                tables: ProtocolTables::default(),
                policy: PipelinePolicy::default(),
            }
        }

        fn ctx(&self) -> PipelineContext<'_> {
            PipelineContext {
                registry: &self.registry,
                report: &self.report,
                tables: &self.tables,
                policy: &self.policy,
                now: 1_700_000_000,
                freshness_secs: 604_800,
            }
        }

        fn build(&self, value: Value) -> CoinRecord {
            build_record(&RawCoin::from_value(value).unwrap(), &self.ctx())
        }
    }

    #[test]
    fn test_utxo_coin_is_own_parent() {
        let fixture = Fixture::new(Registry::default());
        let record = fixture.build(json!({
            "coin": "KMD",
            "fname": "Komodo",
            "protocol": {"type": "UTXO"},
            "sign_message_prefix": "Komodo Signed Message:\n",
            "mm2": 1
        }));
        assert_eq!(record.parent_coin, None);
        assert_eq!(record.coin_type, "Smart Chain");
        assert_eq!(record.name, "Komodo");
        assert_eq!(record.extra["mm2"], json!(1));
        assert_eq!(record.extra["is_claimable"], json!(true));
        assert_eq!(record.extra["minimal_claim_amount"], json!("10"));
    }

    #[test]
    fn test_token_family_and_parent_from_platform() {
        let fixture = Fixture::new(Registry::default());
        let record = fixture.build(json!({
            "coin": "USDC-BEP20",
            "fname": "USD Coin",
            "protocol": {
                "type": "ERC20",
                "protocol_data": {"platform": "BNB", "contract_address": "0xabc"}
            }
        }));
        assert_eq!(record.coin_type, "BEP-20");
        assert_eq!(record.parent_coin.as_deref(), Some("BNB"));
        assert_eq!(record.contract_address.as_deref(), Some("0xabc"));
    }

    #[test]
    fn test_unknown_platform_keeps_declared_type() {
        let fixture = Fixture::new(Registry::default());
        let record = fixture.build(json!({
            "coin": "FOO-XYZ",
            "fname": "Foo",
            "protocol": {"type": "ERC20", "protocol_data": {"platform": "XYZ"}}
        }));
        assert_eq!(record.coin_type, "ERC20");
        assert_eq!(record.parent_coin, None);
    }

    #[test]
    fn test_testnet_table_used_for_testnet_tokens() {
        let fixture = Fixture::new(Registry::default());
        let record = fixture.build(json!({
            "coin": "QRC20T",
            "fname": "Test token",
            "is_testnet": true,
            "protocol": {"type": "QRC20", "protocol_data": {"platform": "tQTUM"}}
        }));
        assert_eq!(record.coin_type, "QRC-20");
        assert_eq!(record.parent_coin.as_deref(), Some("tQTUM"));
        assert!(record.is_testnet);
    }

    #[test]
    fn test_platform_coin_type_from_ticker() {
        let fixture = Fixture::new(Registry::default());
        let record = fixture.build(json!({
            "coin": "ETH",
            "fname": "Ethereum",
            "chain_id": 1,
            "protocol": {"type": "ETH"}
        }));
        assert_eq!(record.coin_type, "ERC-20");
        assert_eq!(record.parent_coin, None);
        assert_eq!(record.extra["protocol"]["protocol_data"]["chain_id"], json!(1));
    }

    #[test]
    fn test_tendermint_parents() {
        let fixture = Fixture::new(Registry::default());
        let ibc = fixture.build(json!({
            "coin": "USDC-IBC_OSMO",
            "fname": "USD Coin",
            "protocol": {"type": "TENDERMINTTOKEN", "protocol_data": {"platform": "OSMO"}}
        }));
        assert_eq!(ibc.coin_type, "TENDERMINTTOKEN");
        assert_eq!(ibc.parent_coin.as_deref(), Some("OSMO"));

        let test_chain = fixture.build(json!({
            "coin": "IRISTEST",
            "fname": "Iris testnet",
            "protocol": {"type": "TENDERMINT"}
        }));
        assert!(test_chain.is_testnet);
        assert_eq!(test_chain.parent_coin, None);
    }

    #[test]
    fn test_declared_fields_never_override_derived() {
        let fixture = Fixture::new(Registry::default());
        let record = fixture.build(json!({
            "coin": "BTC-segwit",
            "fname": "Bitcoin",
            "protocol": {"type": "UTXO"},
            "address_format": {"format": "legacy"},
            "sign_message_prefix": null,
            "wallet_only": true
        }));
        assert_eq!(record.coin, "BTC-segwit");
        assert_eq!(record.extra["address_format"], json!({"format": "segwit"}));
        assert_eq!(record.extra["sign_message_prefix"], json!(""));
        assert!(record.wallet_only);
        assert!(!record.extra.contains_key("coin"));
    }

    #[test]
    fn test_explorers_and_templates() {
        let mut registry = Registry::default();
        registry.explorers.insert(
            "ETH".into(),
            vec!["https://etherscan.io/".into(), "https://other.example/".into()],
        );
        registry.explorer_paths = json!({
            "etherscan": {"explorer_address_url": "address/", "explorer_tx_url": "tx/"},
            "blockbook": {"explorer_tx_url": "tx-bb/"}
        })
        .as_object()
        .cloned()
        .unwrap();
        let fixture = Fixture::new(registry);

        let token = fixture.build(json!({
            "coin": "LINK-ERC20",
            "fname": "Chainlink",
            "protocol": {"type": "ERC20", "protocol_data": {"platform": "ETH"}}
        }));
        assert_eq!(token.explorer_url, "https://etherscan.io/");
        assert_eq!(token.explorer_tx_url, "tx/");
        assert_eq!(token.explorer_block_url.as_deref(), Some("block/"));
    }

    #[test]
    fn test_external_ids() {
        let mut registry = Registry::default();
        registry.ids.coingecko.insert("BTC".into(), "bitcoin".into());
        registry.ids.livecoinwatch.insert("BTC".into(), "BTC".into());
        registry.ids.binance.insert("BTC".into(), "BTC".into());
        registry.ids.forex.insert("BTC".into(), "XBT".into());
        let fixture = Fixture::new(registry);

        let record = fixture.build(json!({
            "coin": "BTC-segwit",
            "fname": "Bitcoin",
            "protocol": {"type": "UTXO"}
        }));
        assert_eq!(record.coingecko_id, "bitcoin");
        assert_eq!(record.livecoinwatch_id, "BTC");
        assert_eq!(record.binance_id.as_deref(), Some("BTC"));
        assert_eq!(record.forex_id.as_deref(), Some("XBT"));
        assert_eq!(record.coinpaprika_id, "");
    }

    #[test]
    fn test_swap_contracts_from_parent() {
        let mut registry = Registry::default();
        registry.ethereum.insert(
            "ETH".into(),
            serde_json::from_value(json!({
                "swap_contract_address": "0xswap",
                "fallback_swap_contract": "0xfallback",
                "rpc_nodes": [{"url": "https://node"}]
            }))
            .unwrap(),
        );
        let fixture = Fixture::new(registry);
        let record = fixture.build(json!({
            "coin": "LINK-ERC20",
            "fname": "Chainlink",
            "protocol": {"type": "ERC20", "protocol_data": {"platform": "ETH"}}
        }));
        assert_eq!(record.swap_contract_address.as_deref(), Some("0xswap"));
        assert_eq!(record.fallback_swap_contract.as_deref(), Some("0xfallback"));
        assert!(record.nodes.is_none(), "servers are attached by the reconciler");
    }

    #[test]
    fn test_declared_typed_fields_kept_without_derived_value() {
        let fixture = Fixture::new(Registry::default());
        let record = fixture.build(json!({
            "coin": "FOO",
            "fname": "Foo",
            "protocol": {"type": "UTXO"},
            "binance_id": "FOOX",
            "forex_id": "FOOF",
            "coingecko_id": "foo-coin",
            "explorer_block_url": "blocks/",
            "swap_contract_address": "0xdeclared",
            "currently_enabled": true
        }));
        assert_eq!(record.binance_id.as_deref(), Some("FOOX"));
        assert_eq!(record.forex_id.as_deref(), Some("FOOF"));
        assert_eq!(record.coingecko_id, "foo-coin");
        assert_eq!(record.explorer_block_url.as_deref(), Some("blocks/"));
        assert_eq!(record.swap_contract_address.as_deref(), Some("0xdeclared"));
        assert!(record.currently_enabled);
        assert!(!record.extra.contains_key("binance_id"));
    }

    #[test]
    fn test_derived_values_replace_declared_ones() {
        let mut registry = Registry::default();
        registry.ids.binance.insert("FOO".into(), "FOOBIN".into());
        let fixture = Fixture::new(registry);
        let record = fixture.build(json!({
            "coin": "FOO-BEP20",
            "fname": "Foo",
            "binance_id": "STALE",
            "parent_coin": "ETH",
            "protocol": {"type": "ERC20", "protocol_data": {"platform": "BNB", "contract_address": "0xfoo"}},
            "contract_address": "0xold"
        }));
        assert_eq!(record.binance_id.as_deref(), Some("FOOBIN"));
        assert_eq!(record.parent_coin.as_deref(), Some("BNB"));
        assert_eq!(record.contract_address.as_deref(), Some("0xfoo"));
    }

    #[test]
    fn test_zhtlc_checkpoint() {
        let fixture = Fixture::new(Registry::default());
        let record = fixture.build(json!({
            "coin": "ARRR",
            "fname": "Pirate",
            "protocol": {
                "type": "ZHTLC",
                "protocol_data": {
                    "check_point_block": {"height": 2_010_000, "time": 1_658_000_000, "hash": "ab"}
                }
            }
        }));
        assert_eq!(record.extra["checkpoint_height"], json!(2_010_000));
        assert_eq!(record.extra["checkpoint_blocktime"], json!(1_658_000_000));
        assert!(record.contract_address.is_none());
        assert_eq!(record.parent_coin, None);
    }
}
