//! End-to-end generator runs over a scratch coins repository

use coins_config::utils::constants::*;
use coins_config::{run, GeneratorConfig, RunOptions};
use image::{Rgba, RgbaImage};
use serde_json::{json, Value};
use std::fs;
use std::path::Path;

fn write(path: &Path, value: Value) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, serde_json::to_string_pretty(&value).unwrap()).unwrap();
}

fn read(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

/// BTC with live SSL + WSS endpoints, LTC never scanned
fn scratch_repo(root: &Path) {
    write(
        &root.join(COINS_FILE),
        json!([
            {"coin": "BTC", "fname": "Bitcoin", "protocol": {"type": "UTXO"}},
            {"coin": "LTC", "fname": "Litecoin", "protocol": {"type": "UTXO"}}
        ]),
    );
    write(
        &root.join(ELECTRUMS_DIR).join("BTC"),
        json!([
            {"url": "electrum.example:50002", "protocol": "SSL", "ws_url": "electrum.example:30002"},
            {"url": "electrum.example:50001", "protocol": "TCP"}
        ]),
    );
    write(
        &root.join(ELECTRUMS_DIR).join("LTC"),
        json!([{"url": "ltc.example:50001"}]),
    );
    write(
        &root.join(EXPLORERS_DIR).join("BTC"),
        json!(["https://blockstream.info/"]),
    );
    write(&root.join(EXPLORER_PATHS_FILE), json!({}));
    for file in [
        FOREX_IDS_FILE,
        LIVECOINWATCH_IDS_FILE,
        BINANCE_IDS_FILE,
        COINPAPRIKA_IDS_FILE,
    ] {
        write(&root.join(file), json!({}));
    }
    write(&root.join(COINGECKO_IDS_FILE), json!({"BTC": "bitcoin"}));

    let icons = root.join(ICONS_DIR);
    fs::create_dir_all(&icons).unwrap();
    RgbaImage::from_pixel(128, 128, Rgba([247, 147, 26, 255]))
        .save(icons.join("btc.png"))
        .unwrap();
}

fn fresh_report(config: &GeneratorConfig) {
    let now = chrono::Utc::now().timestamp();
    write(
        &config.output_path(SCAN_REPORT_FILE),
        json!({
            "BTC": {
                "ssl": {"electrum.example:50002": {"last_connection": now - 60, "result": "Passed"}},
                "tcp": {"electrum.example:50001": {"last_connection": 0, "result": "timed out"}},
                "wss": {"electrum.example:30002": {"last_connection": now - 60, "result": "Passed"}}
            }
        }),
    );
}

#[tokio::test]
async fn test_no_scan_run_writes_every_artifact() {
    let dir = tempfile::tempdir().unwrap();
    scratch_repo(dir.path());
    let config = GeneratorConfig::for_repo(dir.path());
    fresh_report(&config);

    run(&config, RunOptions::from_args(["no-scan"])).await.unwrap();

    let unfiltered = read(&config.output_path(UNFILTERED_CONFIG_FILE));
    assert!(unfiltered.get("LTC").is_some());

    let canonical = read(&config.output_path(CONFIG_FILE));
    assert!(canonical.get("LTC").is_none());
    let btc = &canonical["BTC"];
    assert_eq!(btc["coingecko_id"], "bitcoin");
    assert_eq!(btc["explorer_url"], "https://blockstream.info/");
    assert_eq!(
        btc["electrum"],
        json!([
            {"url": "electrum.example:30002", "protocol": "WSS"},
            {"url": "electrum.example:50002", "protocol": "SSL"}
        ])
    );

    let ssl = read(&config.output_path(SSL_CONFIG_FILE));
    assert_eq!(ssl["BTC"]["electrum"], json!([{"url": "electrum.example:50002", "protocol": "SSL"}]));
    let wss = read(&config.output_path(WSS_CONFIG_FILE));
    assert_eq!(wss["BTC"]["electrum"], json!([{"url": "electrum.example:30002", "protocol": "WSS"}]));
    assert!(read(&config.output_path(TCP_CONFIG_FILE)).get("BTC").is_some());

    let spritemap = read(&config.output_path(SPRITEMAP_JSON_FILE));
    assert_eq!(spritemap["metadata"]["total_icons"], 1);
    assert_eq!(spritemap["coordinates"]["btc"], json!({"x": 0, "y": 0, "width": 128, "height": 128}));
    assert!(config.output_path(SPRITEMAP_IMAGE_FILE).exists());

    let unmatched = read(&config.output_path(SPRITEMAP_UNMATCHED_FILE));
    assert_eq!(unmatched["coin_values_without_direct_icons_match"], json!(["ltc"]));
}

#[tokio::test]
async fn test_no_scan_without_report_fails() {
    let dir = tempfile::tempdir().unwrap();
    scratch_repo(dir.path());
    let config = GeneratorConfig::for_repo(dir.path());

    assert!(run(&config, RunOptions::from_args(["no-scan"])).await.is_err());
    assert!(!config.output_path(CONFIG_FILE).exists());
}

#[tokio::test]
async fn test_spritemap_fast_path_reuses_configs() {
    let dir = tempfile::tempdir().unwrap();
    scratch_repo(dir.path());
    let config = GeneratorConfig::for_repo(dir.path());

    write(&config.output_path(CONFIG_FILE), json!({"BTC": {"coin": "BTC"}}));
    write(&config.output_path(SSL_CONFIG_FILE), json!({"BTC": {"coin": "BTC"}}));
    write(&config.output_path(TCP_CONFIG_FILE), json!({}));
    write(&config.output_path(WSS_CONFIG_FILE), json!({}));

    run(&config, RunOptions::from_args(["spritemap"])).await.unwrap();

    assert!(config.output_path(SPRITEMAP_JSON_FILE).exists());
    assert!(!config.output_path(UNFILTERED_CONFIG_FILE).exists());
}
