//! Generation pipeline
//!
//! coins → records → server lists → exclusion → protocol views

use std::collections::BTreeSet;
use tracing::{info, warn};

use super::builder::build_record;
use super::partition::{partition, ProtocolViews};
use super::reconciler::attach_servers;
use super::PipelineContext;
use crate::models::types::{CoinMap, CoinRecord, RawCoin};

/// Everything one generation run produces
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationOutput {
    /// Every coin, including the ones without usable servers
    pub unfiltered: CoinMap,
    /// Coins left out of the canonical map
    pub excluded: BTreeSet<String>,
    /// `unfiltered` minus `excluded`
    pub canonical: CoinMap,
    pub views: ProtocolViews,
}

impl GenerationOutput {
    /// `[SSL b] [TCP b] [WSS b]` line of one coin
    pub fn view_line(&self, ticker: &str) -> String {
        format!(
            "{}: [SSL {}] [TCP {}] [WSS {}]",
            ticker,
            self.views.ssl.contains_key(ticker),
            self.views.tcp.contains_key(ticker),
            self.views.wss.contains_key(ticker)
        )
    }

    fn in_every_view(&self, ticker: &str) -> bool {
        self.views.ssl.contains_key(ticker)
            && self.views.tcp.contains_key(ticker)
            && self.views.wss.contains_key(ticker)
    }

    /// Log per-coin view membership and the totals
    pub fn log_summary(&self) {
        for ticker in self.canonical.keys() {
            if self.in_every_view(ticker) {
                info!("{}", self.view_line(ticker));
            } else {
                warn!("{}", self.view_line(ticker));
            }
        }
        for ticker in &self.excluded {
            warn!("{}: [SSL false] [TCP false] [WSS false]", ticker);
        }

        info!("📊 Total coins: {}", self.canonical.len());
        info!("   With SSL: {}", self.views.ssl.len());
        info!("   With TCP: {}", self.views.tcp.len());
        info!("   With WSS: {}", self.views.wss.len());
    }
}

/// Build the record of every coin definition. Entries without a ticker or
/// protocol type are reported and skipped.
pub fn build_coin_map(ctx: &PipelineContext<'_>) -> CoinMap {
    let mut coins = CoinMap::new();

    for value in &ctx.registry.coins {
        let raw = match RawCoin::from_value(value.clone()) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("⚠️ Skipping coin entry: {}", e);
                continue;
            }
        };

        let record = attach_servers(build_record(&raw, ctx), &raw, ctx);
        if coins.insert(raw.ticker.clone(), record).is_some() {
            warn!("⚠️ Duplicate ticker {}, keeping the last definition", raw.ticker);
        }
    }

    coins
}

/// Whether a record lacks usable server data
pub fn lacks_server_data(record: &CoinRecord) -> bool {
    record.has_empty_server_list() || !record.has_server_list()
}

/// Tickers to leave out of the canonical map
pub fn find_excluded(coins: &CoinMap) -> BTreeSet<String> {
    for record in coins.values().filter(|r| r.explorer_url.is_empty()) {
        warn!("⚠️ {} has no explorers!", record.coin);
    }

    let excluded: BTreeSet<String> = coins
        .values()
        .filter(|r| lacks_server_data(r))
        .map(|r| r.coin.clone())
        .collect();

    if !excluded.is_empty() {
        warn!(
            "⚠️ {} coins are missing server data or failing connections and will not be included: {:?}",
            excluded.len(),
            excluded
        );
    }
    excluded
}

/// Run the whole pipeline over an immutable context
pub fn generate(ctx: &PipelineContext<'_>) -> GenerationOutput {
    let unfiltered = build_coin_map(ctx);
    let excluded = find_excluded(&unfiltered);

    let canonical: CoinMap = unfiltered
        .iter()
        .filter(|(ticker, _)| !excluded.contains(*ticker))
        .map(|(ticker, record)| (ticker.clone(), record.clone()))
        .collect();
    let views = partition(&canonical);

    info!(
        "✅ Generated {} coins ({} excluded)",
        canonical.len(),
        excluded.len()
    );

    GenerationOutput {
        unfiltered,
        excluded,
        canonical,
        views,
    }
}
