//! Binance id refresher
//!
//! Maps generated tickers to Binance asset ids using the list of tradable
//! symbols and writes `api_ids/binance_ids.json`.
//!
//! API: https://defi-stats.komodo.earth/api/v3/binance/ticker_price
//! (proxy of Binance `/api/v3/ticker/price`)

use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;
use tracing::{info, warn};

use crate::models::config::{GeneratorConfig, PipelinePolicy};
use crate::models::errors::{AppError, AppResult};
use crate::models::types::CoinMap;
use crate::providers::output::write_json;
use crate::utils::constants::{BINANCE_IDS_FILE, USER_AGENT};

/// One entry of the ticker price endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct TickerPrice {
    pub symbol: String,
}

/// Split a trading symbol into (base, quote) using the known quote
/// tickers, checked in order: a symbol starting with a quote ticker is
/// quote-first, one ending with it is quote-last.
pub fn split_symbol(symbol: &str, quotes: &[String]) -> Option<(String, String)> {
    for quote in quotes {
        if let Some(rest) = symbol.strip_prefix(quote.as_str()) {
            return Some((quote.clone(), rest.to_string()));
        }
        if let Some(rest) = symbol.strip_suffix(quote.as_str()) {
            return Some((rest.to_string(), quote.clone()));
        }
    }
    None
}

/// Ticker -> Binance id for every coin whose base ticker trades on Binance
/// and is not delisted
pub fn map_binance_ids<'a>(
    tickers: impl IntoIterator<Item = &'a str>,
    symbols: &[String],
    policy: &PipelinePolicy,
) -> BTreeMap<String, String> {
    let mut known: BTreeSet<String> = BTreeSet::new();
    let mut unknown = Vec::new();
    for symbol in symbols {
        match split_symbol(symbol, &policy.binance_quote_tickers) {
            Some((base, quote)) => {
                known.insert(base);
                known.insert(quote);
            }
            None => unknown.push(symbol.as_str()),
        }
    }
    if !unknown.is_empty() {
        warn!("⚠️ Unknown Binance symbols: {:?}", unknown);
    }

    tickers
        .into_iter()
        .filter_map(|ticker| {
            let base = ticker.split('-').next().unwrap_or(ticker);
            let tradable = known.contains(base);
            let delisted = policy.binance_delisted.iter().any(|d| d == base);
            (tradable && !delisted).then(|| (ticker.to_string(), base.to_string()))
        })
        .collect()
}

/// Client for the ticker price endpoint
pub struct BinanceClient {
    client: reqwest::Client,
    url: String,
}

impl BinanceClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    /// Fetch every listed trading symbol
    pub async fn fetch_symbols(&self) -> AppResult<Vec<String>> {
        info!("🔍 Binance: fetching ticker symbols");

        let response = self
            .client
            .get(&self.url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .timeout(Duration::from_secs(30))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::api(format!(
                "Binance ticker endpoint returned {}",
                response.status()
            )));
        }

        let tickers: Vec<TickerPrice> = response.json().await?;
        info!("📊 Binance: {} symbols", tickers.len());
        Ok(tickers.into_iter().map(|t| t.symbol).collect())
    }
}

/// Rewrite `api_ids/binance_ids.json` for the generated coins.
/// Returns the number of mapped coins.
pub async fn refresh_binance_ids(
    config: &GeneratorConfig,
    coins: &CoinMap,
    policy: &PipelinePolicy,
) -> AppResult<usize> {
    let symbols = BinanceClient::new(config.binance_url.as_str())
        .fetch_symbols()
        .await?;
    let ids = map_binance_ids(coins.keys().map(String::as_str), &symbols, policy);

    let path = config.repo_path.join(BINANCE_IDS_FILE);
    write_json(&path, &ids)?;
    info!("💾 Wrote {} Binance ids to {}", ids.len(), path.display());
    Ok(ids.len())
}
