//! Electrum liveness scanner
//!
//! Probes every configured Electrum endpoint with a `server.version` call
//! over its transport (plain TCP, TLS or secure websocket) and records the
//! outcome in a `LivenessReport`. Probes run concurrently, bounded by a
//! semaphore, each under its own timeout.

use futures_util::future::join_all;
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info};

use crate::models::config::GeneratorConfig;
use crate::models::errors::{AppError, AppResult, ErrorCode};
use crate::models::types::{domain_of, LivenessReport, Observation, Transport};
use crate::providers::registry::Registry;
use crate::utils::constants::{ELECTRUM_CLIENT_NAME, ELECTRUM_PROTOCOL_VERSION};

/// One endpoint to probe
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ScanTarget {
    /// Electrum file the endpoint comes from
    pub ticker: String,
    pub transport: Transport,
    pub url: String,
}

/// Every endpoint listed in the registry's Electrum files.
/// `url` is probed over its declared protocol (TCP when absent), `ws_url`
/// over WSS.
pub fn scan_targets(registry: &Registry) -> Vec<ScanTarget> {
    let mut targets = Vec::new();
    for (ticker, servers) in &registry.electrums {
        for server in servers {
            if let Some(url) = &server.url {
                targets.push(ScanTarget {
                    ticker: ticker.clone(),
                    transport: server.protocol.unwrap_or(Transport::Tcp),
                    url: url.clone(),
                });
            }
            if let Some(ws_url) = &server.ws_url {
                targets.push(ScanTarget {
                    ticker: ticker.clone(),
                    transport: Transport::Wss,
                    url: ws_url.clone(),
                });
            }
        }
    }
    targets.sort();
    targets.dedup();
    targets
}

fn version_request() -> String {
    json!({
        "jsonrpc": "2.0",
        "id": 0,
        "method": "server.version",
        "params": [ELECTRUM_CLIENT_NAME, ELECTRUM_PROTOCOL_VERSION],
    })
    .to_string()
}

/// Check a JSON-RPC reply to `server.version`
fn check_reply(url: &str, reply: &str) -> AppResult<()> {
    let value: Value = serde_json::from_str(reply.trim()).map_err(|e| {
        AppError::with_source(
            ErrorCode::ScanInvalidResponse,
            format!("{}: reply is not JSON", url),
            e,
        )
    })?;
    match value.get("result") {
        Some(result) if !result.is_null() => Ok(()),
        _ => Err(AppError::new(
            ErrorCode::ScanInvalidResponse,
            format!("{}: no result in reply {}", url, value),
        )),
    }
}

/// Host and port of an endpoint without a scheme
fn host_port(url: &str) -> &str {
    url.split_once("://").map(|(_, rest)| rest).unwrap_or(url)
}

/// Send one request line and read one reply line
async fn exchange<S: AsyncRead + AsyncWrite + Unpin>(stream: S, url: &str) -> AppResult<()> {
    let mut stream = BufReader::new(stream);
    let mut request = version_request();
    request.push('\n');
    stream.get_mut().write_all(request.as_bytes()).await?;
    stream.get_mut().flush().await?;

    let mut line = String::new();
    if stream.read_line(&mut line).await? == 0 {
        return Err(AppError::scan_failed(format!("{}: connection closed", url)));
    }
    check_reply(url, &line)
}

/// Liveness scanner
#[derive(Clone)]
pub struct LivenessScanner {
    probe_timeout: Duration,
    semaphore: Arc<Semaphore>,
    tls: tokio_native_tls::TlsConnector,
}

impl LivenessScanner {
    pub fn new(probe_timeout: Duration, concurrency: usize) -> AppResult<Self> {
        // Electrum servers commonly run self-signed certificates
        let tls = native_tls::TlsConnector::builder()
            .danger_accept_invalid_certs(true)
            .danger_accept_invalid_hostnames(true)
            .build()
            .map_err(|e| AppError::with_source(ErrorCode::ScanConnectionFailed, "TLS setup failed", e))?;

        Ok(Self {
            probe_timeout,
            semaphore: Arc::new(Semaphore::new(concurrency.max(1))),
            tls: tokio_native_tls::TlsConnector::from(tls),
        })
    }

    pub fn from_config(config: &GeneratorConfig) -> AppResult<Self> {
        Self::new(config.scan_timeout, config.scan_concurrency)
    }

    /// Probe one endpoint over its transport
    pub async fn probe(&self, transport: Transport, url: &str) -> AppResult<()> {
        let attempt = async {
            match transport {
                Transport::Tcp => self.probe_tcp(url).await,
                Transport::Ssl => self.probe_ssl(url).await,
                Transport::Wss => self.probe_wss(url).await,
            }
        };
        match timeout(self.probe_timeout, attempt).await {
            Ok(result) => result,
            Err(_) => Err(AppError::scan_timeout(url)),
        }
    }

    async fn probe_tcp(&self, url: &str) -> AppResult<()> {
        let stream = TcpStream::connect(host_port(url))
            .await
            .map_err(|e| AppError::with_source(ErrorCode::ScanConnectionFailed, url, e))?;
        exchange(stream, url).await
    }

    async fn probe_ssl(&self, url: &str) -> AppResult<()> {
        let stream = TcpStream::connect(host_port(url))
            .await
            .map_err(|e| AppError::with_source(ErrorCode::ScanConnectionFailed, url, e))?;
        let stream = self
            .tls
            .connect(domain_of(url), stream)
            .await
            .map_err(|e| AppError::with_source(ErrorCode::ScanConnectionFailed, url, e))?;
        exchange(stream, url).await
    }

    async fn probe_wss(&self, url: &str) -> AppResult<()> {
        let ws_url = if url.contains("://") {
            url.to_string()
        } else {
            format!("wss://{}", url)
        };
        let (mut ws, _) = connect_async(ws_url.as_str())
            .await
            .map_err(|e| AppError::with_source(ErrorCode::ScanConnectionFailed, url, e))?;

        ws.send(Message::Text(version_request()))
            .await
            .map_err(|e| AppError::with_source(ErrorCode::ScanConnectionFailed, url, e))?;

        while let Some(message) = ws.next().await {
            let message =
                message.map_err(|e| AppError::with_source(ErrorCode::ScanConnectionFailed, url, e))?;
            match message {
                Message::Text(text) => {
                    let _ = ws.close(None).await;
                    return check_reply(url, &text);
                }
                Message::Close(_) => break,
                _ => continue,
            }
        }
        Err(AppError::scan_failed(format!("{}: websocket closed without reply", url)))
    }

    /// Probe every endpoint of the registry.
    ///
    /// Endpoints that answer get `last_connection = now`; failing ones keep
    /// their previous timestamp (0 when never seen) so the freshness window
    /// decides when they fall out.
    pub async fn scan(&self, registry: &Registry, previous: &LivenessReport, now: i64) -> LivenessReport {
        let targets = scan_targets(registry);
        info!("🔍 Scanning {} electrum endpoints", targets.len());

        let probes = targets.iter().map(|target| async move {
            let _permit = self.semaphore.acquire().await.ok();
            let outcome = self.probe(target.transport, &target.url).await;
            (target, outcome)
        });
        let outcomes = join_all(probes).await;

        let mut report = LivenessReport::default();
        let mut passed = 0usize;
        for (target, outcome) in outcomes {
            let observation = match outcome {
                Ok(()) => {
                    passed += 1;
                    Observation {
                        last_connection: now,
                        result: Some("Passed".to_string()),
                    }
                }
                Err(e) => {
                    debug!("{} {} {}: {}", target.ticker, target.transport, target.url, e);
                    Observation {
                        last_connection: previous_connection(previous, target),
                        result: Some(e.to_string()),
                    }
                }
            };
            report
                .coins
                .entry(target.ticker.clone())
                .or_default()
                .by_transport_mut(target.transport)
                .insert(target.url.clone(), observation);
        }

        info!("📡 Scan finished: {}/{} endpoints answered", passed, targets.len());
        report
    }
}

fn previous_connection(previous: &LivenessReport, target: &ScanTarget) -> i64 {
    previous
        .get(&target.ticker)
        .and_then(|coin| coin.by_transport(target.transport).get(&target.url))
        .map(|obs| obs.last_connection)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::types::ElectrumServer;
    use tokio::net::TcpListener;

    async fn fake_electrum(reply: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let mut stream = BufReader::new(stream);
                let mut line = String::new();
                if stream.read_line(&mut line).await.is_ok() {
                    let _ = stream.get_mut().write_all(reply.as_bytes()).await;
                }
            }
        });
        addr
    }

    async fn closed_port() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);
        addr
    }

    fn scanner() -> LivenessScanner {
        LivenessScanner::new(Duration::from_secs(2), 4).unwrap()
    }

    #[test]
    fn test_scan_targets() {
        let mut registry = Registry::default();
        let mut server = ElectrumServer::new("a.example:50002").with_protocol(Transport::Ssl);
        server.ws_url = Some("a.example:30002".into());
        registry.electrums.insert(
            "BTC".into(),
            vec![server, ElectrumServer::new("b.example:50001")],
        );

        let targets = scan_targets(&registry);
        let summary: Vec<_> = targets
            .iter()
            .map(|t| (t.transport, t.url.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (Transport::Tcp, "b.example:50001"),
                (Transport::Ssl, "a.example:50002"),
                (Transport::Wss, "a.example:30002"),
            ]
        );
    }

    #[test]
    fn test_check_reply() {
        assert!(check_reply("x", r#"{"jsonrpc":"2.0","id":0,"result":["ElectrumX","1.4"]}"#).is_ok());
        assert!(check_reply("x", r#"{"jsonrpc":"2.0","id":0,"error":{"code":1}}"#).is_err());
        assert!(check_reply("x", "garbage").is_err());
    }

    #[tokio::test]
    async fn test_tcp_probe() {
        let ok = fake_electrum("{\"id\":0,\"result\":[\"ElectrumX 1.16\",\"1.4\"]}\n").await;
        assert!(scanner().probe(Transport::Tcp, &ok).await.is_ok());

        let bad = fake_electrum("{\"id\":0,\"error\":\"unsupported\"}\n").await;
        let err = scanner().probe(Transport::Tcp, &bad).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ScanInvalidResponse);
    }

    #[tokio::test]
    async fn test_scan_keeps_previous_timestamp_on_failure() {
        let ok = fake_electrum("{\"id\":0,\"result\":[\"x\",\"1.4\"]}\n").await;
        let down = closed_port().await;

        let mut registry = Registry::default();
        registry.electrums.insert(
            "KMD".into(),
            vec![ElectrumServer::new(ok.clone()), ElectrumServer::new(down.clone())],
        );
        let mut previous = LivenessReport::default();
        previous.record("KMD", Transport::Tcp, &down, 1_000);

        let report = scanner().scan(&registry, &previous, 2_000).await;
        let tcp = &report.get("KMD").unwrap().tcp;
        assert_eq!(tcp[&ok].last_connection, 2_000);
        assert_eq!(tcp[&ok].result.as_deref(), Some("Passed"));
        assert_eq!(tcp[&down].last_connection, 1_000);
        assert_ne!(tcp[&down].result.as_deref(), Some("Passed"));
    }
}
