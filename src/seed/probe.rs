//! Seed node reachability probes
//!
//! One TCP connect per node and, for nodes that declare `wss`, a TLS
//! handshake plus websocket upgrade. Each probe has its own timeout; no
//! retries.

use futures_util::future::join_all;
use std::fmt;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::client_async;
use tracing::{debug, error, info};

use super::ports::NodePorts;
use super::SeedNode;
use crate::models::config::SeedValidatorConfig;
use crate::models::errors::{AppError, AppResult, ErrorCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeKind {
    Tcp,
    Wss,
}

impl fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeKind::Tcp => f.write_str("TCP"),
            ProbeKind::Wss => f.write_str("WSS"),
        }
    }
}

/// Result of one reachability probe
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeOutcome {
    pub node: String,
    pub host: String,
    pub kind: ProbeKind,
    pub port: u16,
    /// `None` when the node answered
    pub error: Option<String>,
}

impl ProbeOutcome {
    pub fn passed(&self) -> bool {
        self.error.is_none()
    }
}

/// Open and drop a TCP connection
pub async fn probe_tcp(host: &str, port: u16, limit: Duration) -> AppResult<()> {
    let endpoint = format!("{}:{}", host, port);
    match timeout(limit, TcpStream::connect(endpoint.as_str())).await {
        Ok(Ok(_stream)) => Ok(()),
        Ok(Err(e)) => Err(AppError::with_source(ErrorCode::SeedUnreachable, endpoint, e)),
        Err(_) => Err(AppError::unreachable(format!("{} timed out", endpoint))),
    }
}

/// TLS handshake with certificate inspection, then a websocket upgrade
pub async fn probe_wss(host: &str, port: u16, limit: Duration) -> AppResult<()> {
    let endpoint = format!("{}:{}", host, port);
    let attempt = async {
        let stream = TcpStream::connect(endpoint.as_str())
            .await
            .map_err(|e| AppError::with_source(ErrorCode::SeedUnreachable, endpoint.as_str(), e))?;

        let connector = native_tls::TlsConnector::new()
            .map_err(|e| AppError::with_source(ErrorCode::SeedUnreachable, "TLS setup failed", e))?;
        let tls = tokio_native_tls::TlsConnector::from(connector)
            .connect(host, stream)
            .await
            .map_err(|e| AppError::with_source(ErrorCode::SeedUnreachable, format!("{} TLS handshake", endpoint), e))?;

        let certificate = tls
            .get_ref()
            .peer_certificate()
            .map_err(|e| AppError::with_source(ErrorCode::SeedUnreachable, format!("{} certificate", endpoint), e))?
            .ok_or_else(|| AppError::unreachable(format!("{} presented no certificate", endpoint)))?;
        let der = certificate
            .to_der()
            .map_err(|e| AppError::with_source(ErrorCode::SeedUnreachable, format!("{} certificate", endpoint), e))?;
        debug!("{}: peer certificate {} bytes", endpoint, der.len());

        let (mut ws, response) = client_async(format!("wss://{}", endpoint), tls)
            .await
            .map_err(|e| AppError::with_source(ErrorCode::SeedUnreachable, format!("{} websocket upgrade", endpoint), e))?;
        debug!("{}: websocket upgrade {}", endpoint, response.status());
        let _ = ws.close(None).await;
        Ok::<(), AppError>(())
    };

    match timeout(limit, attempt).await {
        Ok(result) => result,
        Err(_) => Err(AppError::unreachable(format!("{} timed out", endpoint))),
    }
}

async fn run_probe(node: &SeedNode, kind: ProbeKind, port: u16, limit: Duration) -> ProbeOutcome {
    let result = match kind {
        ProbeKind::Tcp => probe_tcp(&node.host, port, limit).await,
        ProbeKind::Wss => probe_wss(&node.host, port, limit).await,
    };
    match &result {
        Ok(()) => info!("  ✓ {} {} {}:{}", node.name, kind, node.host, port),
        Err(e) => error!("  ✗ {} {} {}:{} - {}", node.name, kind, node.host, port, e),
    }
    ProbeOutcome {
        node: node.name.clone(),
        host: node.host.clone(),
        kind,
        port,
        error: result.err().map(|e| e.to_string()),
    }
}

/// Probe every node concurrently: TCP always, WSS when declared
pub async fn probe_nodes(nodes: &[SeedNode], config: &SeedValidatorConfig) -> AppResult<Vec<ProbeOutcome>> {
    let mut probes = Vec::new();
    for node in nodes {
        let ports = NodePorts::for_netid(node.netid, config.rpc_port)?;
        probes.push(run_probe(node, ProbeKind::Tcp, ports.tcp, config.probe_timeout));
        if node.wss {
            probes.push(run_probe(node, ProbeKind::Wss, ports.wss, config.probe_timeout));
        }
    }

    info!("🔍 Probing {} endpoints", probes.len());
    Ok(join_all(probes).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_tcp_probe_open_and_closed() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        assert!(probe_tcp("127.0.0.1", port, Duration::from_secs(2)).await.is_ok());

        drop(listener);
        let err = probe_tcp("127.0.0.1", port, Duration::from_secs(2)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::SeedUnreachable);
    }

    #[tokio::test]
    async fn test_wss_probe_fails_against_plain_tcp() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                drop(stream);
            }
        });
        assert!(probe_wss("127.0.0.1", port, Duration::from_secs(2)).await.is_err());
    }

    #[tokio::test]
    async fn test_probe_nodes_rejects_bad_netid() {
        let node = SeedNode {
            name: "bad".into(),
            host: "127.0.0.1".into(),
            kind: None,
            wss: false,
            netid: 20_000,
            contact: Vec::new(),
        };
        let config = SeedValidatorConfig::default();
        let err = probe_nodes(&[node], &config).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::SeedNetidOutOfRange);
    }
}
