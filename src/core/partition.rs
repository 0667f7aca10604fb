//! Protocol Partitioner
//!
//! Builds the TLS, plaintext TCP and secure-websocket views of the
//! canonical coin map. Every view works on its own clone of the records.

use tracing::{debug, warn};

use super::reconciler::dedup_domains;
use crate::models::types::{CoinMap, CoinRecord, ElectrumServer, NodeEntry, Transport};

/// The three transport-filtered views
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProtocolViews {
    pub ssl: CoinMap,
    pub tcp: CoinMap,
    pub wss: CoinMap,
}

/// Build all three views from the canonical map
pub fn partition(canonical: &CoinMap) -> ProtocolViews {
    let ssl = tls_view(canonical);
    let tcp = tcp_view(canonical, &ssl);
    let wss = wss_view(canonical);

    debug!(
        "Views: {} SSL, {} TCP, {} WSS of {} coins",
        ssl.len(),
        tcp.len(),
        wss.len(),
        canonical.len()
    );
    ProtocolViews { ssl, tcp, wss }
}

fn is_https(url: &str) -> bool {
    url.starts_with("https")
}

/// True when any list present on the record is empty
fn lost_all_servers(record: &CoinRecord) -> bool {
    record.has_empty_server_list()
}

// ============================================
// TLS VIEW
// ============================================

fn tls_record(mut record: CoinRecord) -> Option<CoinRecord> {
    if let Some(electrum) = record.electrum.take() {
        let ssl: Vec<ElectrumServer> = electrum
            .into_iter()
            .filter(|s| s.protocol == Some(Transport::Ssl))
            .collect();
        record.electrum = Some(dedup_domains(ssl));
    }
    if let Some(nodes) = record.nodes.as_mut() {
        nodes.retain(|entry| entry.as_node().is_some_and(|node| node.is_https()));
    }
    if let Some(rpc_urls) = record.rpc_urls.as_mut() {
        rpc_urls.retain(|node| node.is_https());
    }
    if let Some(servers) = record.light_wallet_d_servers.as_mut() {
        servers.retain(|url| is_https(url));
    }

    if lost_all_servers(&record) {
        debug!("{}: no TLS endpoints, dropped from SSL view", record.coin);
        return None;
    }
    Some(record)
}

/// Records restricted to SSL Electrum entries and HTTPS endpoints
pub fn tls_view(canonical: &CoinMap) -> CoinMap {
    canonical
        .iter()
        .filter_map(|(ticker, record)| tls_record(record.clone()).map(|r| (ticker.clone(), r)))
        .collect()
}

// ============================================
// TCP VIEW
// ============================================

fn tcp_record(mut record: CoinRecord, tls: Option<&CoinRecord>) -> Option<CoinRecord> {
    if let Some(nodes) = record.nodes.as_mut() {
        nodes.retain(|entry| match entry {
            NodeEntry::Node(node) => !node.proxy_only,
            NodeEntry::Marker(_) => true,
        });
    }

    if let Some(electrum) = record.electrum.take() {
        let mut servers: Vec<ElectrumServer> = tls
            .and_then(|r| r.electrum.clone())
            .unwrap_or_default();
        servers.retain(|s| !s.proxy_only);

        for server in electrum {
            if server.proxy_only || server.protocol == Some(Transport::Wss) {
                continue;
            }
            if !servers.iter().any(|s| s.same_endpoint(&server)) {
                servers.push(server);
            }
        }
        record.electrum = Some(dedup_domains(servers));
    }

    if lost_all_servers(&record) {
        debug!("{}: no native endpoints, dropped from TCP view", record.coin);
        return None;
    }
    Some(record)
}

/// Records usable by native clients: TLS entries first, then every
/// remaining non-WSS, non-proxy entry, domain-deduplicated
pub fn tcp_view(canonical: &CoinMap, tls: &CoinMap) -> CoinMap {
    canonical
        .iter()
        .filter_map(|(ticker, record)| {
            tcp_record(record.clone(), tls.get(ticker)).map(|r| (ticker.clone(), r))
        })
        .collect()
}

// ============================================
// WSS VIEW
// ============================================

fn wss_record(mut record: CoinRecord) -> Option<CoinRecord> {
    if let Some(electrum) = record.electrum.as_mut() {
        for server in electrum.iter().filter(|s| s.protocol.is_none()) {
            warn!("⚠️ {}: electrum entry without protocol {:?}", record.coin, server.url);
        }
        electrum.retain(|s| s.protocol == Some(Transport::Wss));
        return (!electrum.is_empty()).then_some(record);
    }

    if let Some(nodes) = record.nodes.as_mut() {
        nodes.retain(|entry| entry.as_node().is_some_and(|node| node.ws_url.is_some()));
        return (!nodes.is_empty()).then_some(record);
    }

    warn!("⚠️ {} not checked by the WSS filter, included as is", record.coin);
    Some(record)
}

/// Records restricted to WSS Electrum entries or websocket-capable nodes
pub fn wss_view(canonical: &CoinMap) -> CoinMap {
    canonical
        .iter()
        .filter_map(|(ticker, record)| wss_record(record.clone()).map(|r| (ticker.clone(), r)))
        .collect()
}
