//! Server List Reconciler
//!
//! Attaches server lists to a built record: RPC nodes from the contract
//! files, lightwallet servers for ZHTLC coins, and Electrum servers matched
//! against the liveness report.

use std::collections::HashSet;
use tracing::{debug, warn};

use super::builder::contract_source;
use super::PipelineContext;
use crate::models::types::{
    CoinLiveness, CoinRecord, ElectrumServer, NodeEntry, RawCoin, RpcNode, Transport,
};
use crate::providers::registry::Registry;
use crate::utils::constants::TENDERMINT_TYPES;

/// Attach every server list that applies to the record
pub fn attach_servers(record: CoinRecord, raw: &RawCoin, ctx: &PipelineContext<'_>) -> CoinRecord {
    let record = attach_rpc_nodes(record, ctx);
    let record = attach_light_wallet_servers(record, raw, ctx);
    attach_electrums(record, raw, ctx)
}

fn attach_rpc_nodes(mut record: CoinRecord, ctx: &PipelineContext<'_>) -> CoinRecord {
    let Some(nodes) = contract_source(&record, ctx.registry).and_then(|c| c.rpc_nodes.clone())
    else {
        return record;
    };

    let mut nodes = nodes;
    nodes.sort_by(|a, b| a.url.cmp(&b.url));

    if TENDERMINT_TYPES.contains(&record.coin_type.as_str()) {
        record.rpc_urls = Some(nodes);
    } else {
        record.nodes = Some(nodes.into_iter().map(NodeEntry::Node).collect());
    }
    record
}

fn attach_light_wallet_servers(mut record: CoinRecord, raw: &RawCoin, ctx: &PipelineContext<'_>) -> CoinRecord {
    if raw.declared_type != "ZHTLC" {
        return record;
    }
    match ctx.registry.light_wallet.get(&record.coin) {
        Some(servers) => record.light_wallet_d_servers = Some(servers.clone()),
        None => {
            warn!("⚠️ {}: no lightwallet servers configured", record.coin);
            record.light_wallet_d_servers.get_or_insert_with(Vec::new);
        }
    }
    record
}

/// Electrum file (and liveness report key) a record draws its servers from.
/// Tokens without their own file use the parent's (QRC-20 -> QTUM/tQTUM).
pub fn electrum_key(record: &CoinRecord, raw: &RawCoin, registry: &Registry) -> String {
    let own = raw.lookup_ticker();
    if registry.has_electrums(&own) {
        return own;
    }
    match record.parent_coin.as_deref() {
        Some(parent) if registry.has_electrums(parent) => parent.to_string(),
        _ => own,
    }
}

fn attach_electrums(mut record: CoinRecord, raw: &RawCoin, ctx: &PipelineContext<'_>) -> CoinRecord {
    let key = electrum_key(&record, raw, ctx.registry);
    let static_list = ctx.registry.electrums.get(&key);

    match ctx.report.get(&key) {
        Some(liveness) => {
            let servers = reconcile_electrums(
                static_list.map(Vec::as_slice).unwrap_or_default(),
                liveness,
                ctx.now,
                ctx.freshness_secs,
            );
            debug!("{}: {} fresh electrum entries", record.coin, servers.len());
            record.electrum = Some(servers);
        }
        None if ctx.policy.is_off_network(&raw.declared_type) => {
            let nodes = match static_list {
                Some(list) => list.iter().map(off_network_node).collect(),
                None => vec![NodeEntry::Marker(raw.declared_type.clone())],
            };
            record.nodes = Some(nodes);
        }
        None => {
            if static_list.is_some() {
                debug!("{}: no liveness data, static servers dropped", record.coin);
            }
        }
    }
    record
}

fn off_network_node(server: &ElectrumServer) -> NodeEntry {
    NodeEntry::Node(RpcNode {
        url: server.url.clone().unwrap_or_default(),
        ws_url: server.ws_url.clone(),
        proxy_only: server.proxy_only,
        extra: server.extra.clone(),
    })
}

/// Match static servers against fresh liveness observations.
///
/// Transports are visited in `Transport::PREFERENCE` order. An observed URL
/// equal to a server's `url` yields that server tagged with the observed
/// transport; one equal to its `ws_url` yields a WSS entry whose `url` is
/// the websocket URL. `ws_url` is dropped from every emitted entry.
pub fn reconcile_electrums(
    static_list: &[ElectrumServer],
    liveness: &CoinLiveness,
    now: i64,
    freshness_secs: i64,
) -> Vec<ElectrumServer> {
    let mut out: Vec<ElectrumServer> = Vec::new();

    for transport in Transport::PREFERENCE {
        let fresh = liveness
            .by_transport(transport)
            .iter()
            .filter(|(_, obs)| obs.is_fresh(now, freshness_secs))
            .map(|(url, _)| url);

        for observed in fresh {
            for server in static_list {
                if server.url.as_deref() == Some(observed.as_str()) {
                    push_unique(&mut out, bind(server, observed, transport));
                }
                if server.ws_url.as_deref() == Some(observed.as_str()) {
                    push_unique(&mut out, bind(server, observed, Transport::Wss));
                }
            }
        }
    }

    out.sort_by(|a, b| (&a.url, a.protocol).cmp(&(&b.url, b.protocol)));
    out
}

fn bind(server: &ElectrumServer, url: &str, transport: Transport) -> ElectrumServer {
    let mut entry = server.clone();
    entry.url = Some(url.to_string());
    entry.ws_url = None;
    entry.protocol = Some(transport);
    entry
}

fn push_unique(out: &mut Vec<ElectrumServer>, entry: ElectrumServer) {
    if !out.contains(&entry) {
        out.push(entry);
    }
}

/// Domain dedup: for a domain offering both SSL and TCP entries, drop its
/// TCP entries. Entries without a URL or protocol pass through. Idempotent.
pub fn dedup_domains(servers: Vec<ElectrumServer>) -> Vec<ElectrumServer> {
    let has = |domain: &str, transport: Transport| {
        servers
            .iter()
            .any(|s| s.protocol == Some(transport) && s.domain() == Some(domain))
    };
    let shadowed: HashSet<String> = servers
        .iter()
        .filter_map(ElectrumServer::domain)
        .filter(|domain| has(*domain, Transport::Ssl) && has(*domain, Transport::Tcp))
        .map(str::to_string)
        .collect();

    if shadowed.is_empty() {
        return servers;
    }

    let mut servers = servers;
    servers.retain(|s| {
        !(s.protocol == Some(Transport::Tcp)
            && s.domain().is_some_and(|domain| shadowed.contains(domain)))
    });
    servers
}
