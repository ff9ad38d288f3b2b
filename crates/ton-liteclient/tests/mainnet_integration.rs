//! Integration tests against live TON liteservers.
//!
//! Point TON_GLOBAL_CONFIG at a downloaded global-config.json, then run:
//! cargo test -p ton-liteclient --features mainnet-tests --test mainnet_integration

#![cfg(feature = "mainnet-tests")]

use std::time::Duration;

use ton_liteclient::{GlobalConfig, ProofCheckPolicy, TonClient};

fn load_config() -> GlobalConfig {
    let path = std::env::var("TON_GLOBAL_CONFIG")
        .expect("set TON_GLOBAL_CONFIG to a global-config.json path");
    GlobalConfig::from_file(path).expect("failed to load config")
}

fn connect() -> TonClient {
    let config = load_config();
    assert!(!config.liteservers.is_empty(), "no liteservers in config");

    let mut client =
        TonClient::from_config(&config, ProofCheckPolicy::Fast).expect("client construction");
    client.set_query_timeout(Duration::from_secs(10));
    client
}

#[tokio::test]
async fn test_get_masterchain_info() {
    let client = connect();
    let info = client.get_masterchain_info().await.expect("query failed");

    assert!(info.last.is_masterchain());
    assert!(info.last.seqno > 0);
    println!("last masterchain block: {}", info.last);
}

#[tokio::test]
async fn test_get_time() {
    let client = connect();
    let now = client.get_time().await.expect("query failed");

    // Sometime after 2024.
    assert!(now > 1_700_000_000);
    println!("server time: {}", now);
}

#[tokio::test]
async fn test_wait_current_seqno_returns_immediately() {
    let client = connect();
    let info = client.get_masterchain_info().await.expect("query failed");

    let waited = client
        .wait_masterchain_seqno(info.last.seqno, 5_000)
        .await
        .expect("wait failed");
    assert!(waited.last.seqno >= info.last.seqno);
}
