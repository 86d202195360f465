//! Unit tests for configuration management
//!
//! These tests verify network parsing, per-family validation, TOML
//! deserialization (including the per-network decimal tables), and the
//! snapshot cache.

use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;

use reconciler::config::{Config, ConfigService};
use reconciler::{Error, Network};

#[path = "mod.rs"]
mod test_helpers;
use test_helpers::{build_test_config, cosmos_config, hedera_config, USDT_CONTRACT_BSC};

// ============================================================================
// TESTS
// ============================================================================

/// Test that default configuration creates a valid empty structure
/// Why: tests build on the default and add the networks they exercise
#[test]
fn test_default_config_creation() {
    let config = Config::default();
    assert_eq!(config.api.host, "127.0.0.1");
    assert!(config.configured_networks().is_empty());
    assert_eq!(config.reconciler.intent_ttl_minutes, 30);
    assert_eq!(config.reconciler.config_cache_ttl_secs, 300);
    assert!(config.validate().is_ok());
}

/// Test network name parsing and the closed network set
/// Why: unsupported network names must fail loudly at the API boundary
#[test]
fn test_network_from_str() {
    assert_eq!(Network::from_str("ethereum").unwrap(), Network::Ethereum);
    assert_eq!(Network::from_str("BSC").unwrap(), Network::Bsc);
    assert_eq!(Network::from_str("hedera").unwrap(), Network::Hedera);
    assert!(matches!(
        Network::from_str("solana"),
        Err(Error::Config(_))
    ));
}

/// Test that memo matching is a Hedera-only property
/// Why: the matching engine's reference check branches on it
#[test]
fn test_memo_matching_support() {
    assert!(Network::Hedera.supports_memo_matching());
    assert!(!Network::Ethereum.supports_memo_matching());
    assert!(!Network::Cosmos.supports_memo_matching());
}

/// Test that validation rejects a network missing a required field
/// Why: config errors must be fatal at load time, not during sweeps
#[test]
fn test_validate_rejects_missing_merchant() {
    let mut config = build_test_config();
    config.networks.ethereum.as_mut().unwrap().merchant_address = String::new();
    let result = config.validate();
    assert!(matches!(result, Err(Error::Config(_))));
    let message = result.unwrap_err().to_string();
    assert!(
        message.contains("merchant_address"),
        "error should name the missing field: {}",
        message
    );
}

/// Test that validation rejects Cosmos without a REST endpoint
/// Why: the Cosmos family requires rpc + rest + chain_id
#[test]
fn test_validate_rejects_cosmos_without_rest() {
    let mut config = Config::default();
    let mut cosmos = cosmos_config("http://127.0.0.1:1");
    cosmos.rest_url = String::new();
    config.networks.cosmos = Some(cosmos);
    assert!(matches!(config.validate(), Err(Error::Config(_))));
}

/// Test that validation rejects Hedera without an operator id
/// Why: the Hedera family requires operator/merchant accounts and a mirror
/// node
#[test]
fn test_validate_rejects_hedera_without_operator() {
    let mut config = Config::default();
    let mut hedera = hedera_config("http://127.0.0.1:1");
    hedera.operator_id = "  ".to_string();
    config.networks.hedera = Some(hedera);
    assert!(matches!(config.validate(), Err(Error::Config(_))));
}

/// Test TOML parsing of per-network sections with their decimal tables
/// Why: BSC USDT is 18 decimals while Ethereum USDT is 6, so the table must
/// come from config, never from code
#[test]
fn test_toml_parse_decimal_tables() {
    let toml = format!(
        r#"
[api]
host = "127.0.0.1"
port = 3344

[networks.ethereum]
name = "Ethereum"
chain_id = 1
rpc_url = "http://127.0.0.1:8545"
explorer_url = "http://127.0.0.1:8545/api"
merchant_address = "0x1111111111111111111111111111111111111111"
native_symbol = "ETH"
required_confirmations = 12
max_gas_price_gwei = "150"
min_merchant_balance = "0.1"

[[networks.ethereum.tokens]]
symbol = "USDT"
id = "0xdAC17F958D2ee523a2206206994597C13D831ec7"
decimals = 6

[networks.bsc]
name = "BNB Smart Chain"
chain_id = 56
rpc_url = "http://127.0.0.1:8546"
explorer_url = "http://127.0.0.1:8546/api"
merchant_address = "0x1111111111111111111111111111111111111111"
native_symbol = "BNB"
required_confirmations = 5
max_gas_price_gwei = "10"
min_merchant_balance = "0.1"

[[networks.bsc.tokens]]
symbol = "USDT"
id = "{}"
decimals = 18
"#,
        USDT_CONTRACT_BSC
    );

    let config: Config = toml::from_str(&toml).expect("TOML should parse");
    assert!(config.validate().is_ok());
    assert_eq!(
        config.configured_networks(),
        vec![Network::Ethereum, Network::Bsc]
    );

    let ethereum = config.evm(Network::Ethereum).unwrap();
    assert_eq!(ethereum.tokens[0].decimals, 6);
    assert_eq!(ethereum.native_decimals, 18, "default native decimals");

    let bsc = config.evm(Network::Bsc).unwrap();
    assert_eq!(bsc.tokens[0].decimals, 18, "BSC USDT uses 18 decimals");
    assert_eq!(bsc.max_gas_price_gwei, Decimal::from(10));
}

/// Test snapshot currency resolution for native and token currencies
/// Why: intent creation and matching both depend on this lookup
#[tokio::test]
async fn test_snapshot_currency_resolution() {
    let config = Arc::new(build_test_config());
    let service = ConfigService::new(config).expect("config service");

    let snapshot = service
        .network_config(Network::Ethereum)
        .await
        .expect("snapshot");

    let native = snapshot.currency("ETH").expect("native currency");
    assert!(native.id.is_none());
    assert_eq!(native.decimals, 18);

    let usdt = snapshot.currency("usdt").expect("token lookup is case-insensitive");
    assert_eq!(usdt.decimals, 6);
    assert!(usdt.id.is_some());

    assert!(matches!(snapshot.currency("DOGE"), Err(Error::Config(_))));
}

/// Test that snapshots for unconfigured networks fail
/// Why: the scheduler must see a Config error, not a panic
#[tokio::test]
async fn test_snapshot_unconfigured_network_fails() {
    let config = Arc::new(Config::default());
    let service = ConfigService::new(config).expect("config service");
    let result = service.network_config(Network::Polygon).await;
    assert!(matches!(result, Err(Error::Config(_))));
}

/// Test that invalidation forces a snapshot rebuild
/// Why: endpoint failures invalidate the cached snapshot; the next lookup
/// must rebuild rather than serve the stale copy
#[tokio::test]
async fn test_snapshot_invalidate_rebuilds() {
    let config = Arc::new(build_test_config());
    let service = ConfigService::new(config).expect("config service");

    let first = service.network_config(Network::Hedera).await.expect("snapshot");
    service.invalidate(Network::Hedera).await;
    let second = service.network_config(Network::Hedera).await.expect("snapshot");

    // Same content, distinct cache entries.
    assert_eq!(first.merchant_address, second.merchant_address);
    assert!(!Arc::ptr_eq(&first, &second));
}
