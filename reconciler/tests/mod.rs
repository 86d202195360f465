//! Shared test helpers for unit tests
//!
//! This module provides helper functions used by the reconciler test
//! files: configuration builders (with and without mock-server URLs),
//! snapshot builders, and default intent/candidate creators.

use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;

use reconciler::config::{
    Config, CosmosNetworkConfig, EvmNetworkConfig, HederaNetworkConfig, TokenConfig, TokenInfo,
};
use reconciler::registry::{current_timestamp, IntentStatus, PaymentIntent};
use reconciler::{CandidateTransaction, Network, NetworkSnapshot};

// ============================================================================
// CONSTANTS
// ============================================================================

#[allow(dead_code)]
/// USDT contract on Ethereum (6 decimals)
pub const USDT_CONTRACT_ETH: &str = "0xdAC17F958D2ee523a2206206994597C13D831ec7";

/// USDT contract on BSC (18 decimals)
#[allow(dead_code)]
pub const USDT_CONTRACT_BSC: &str = "0x55d398326f99059fF775485246999027B3197955";

#[allow(dead_code)]
/// Dummy merchant address (EVM format, 20 bytes)
pub const MERCHANT_EVM: &str = "0x1111111111111111111111111111111111111111";

/// Dummy payer address (EVM format, 20 bytes)
#[allow(dead_code)]
pub const SENDER_EVM: &str = "0x2222222222222222222222222222222222222222";

#[allow(dead_code)]
/// Dummy merchant account (Hedera entity format)
pub const MERCHANT_HEDERA: &str = "0.0.600000";

/// USDT token ID on Hedera (6 decimals)
#[allow(dead_code)]
pub const HEDERA_USDT_TOKEN: &str = "0.0.456858";

/// Dummy merchant address (Cosmos bech32 format)
#[allow(dead_code)]
pub const MERCHANT_COSMOS: &str = "cosmos1merchantxxxxxxxxxxxxxxxxxxxxxxxxxxx";

// ============================================================================
// CONFIGURATION BUILDERS
// ============================================================================

#[allow(dead_code)]
/// Ethereum network section pointing at the given mock endpoints.
pub fn ethereum_config(explorer_url: &str, rpc_url: &str) -> EvmNetworkConfig {
    EvmNetworkConfig {
        name: "Ethereum".to_string(),
        chain_id: 1,
        rpc_url: rpc_url.to_string(),
        fallback_rpc: None,
        explorer_url: explorer_url.to_string(),
        fallback_explorer: None,
        explorer_api_key: None,
        merchant_address: MERCHANT_EVM.to_string(),
        native_symbol: "ETH".to_string(),
        native_decimals: 18,
        tokens: vec![TokenConfig {
            symbol: "USDT".to_string(),
            id: USDT_CONTRACT_ETH.to_string(),
            decimals: 6,
        }],
        required_confirmations: 12,
        max_gas_price_gwei: Decimal::from(150),
        min_merchant_balance: Decimal::from_str("0.1").unwrap(),
    }
}

#[allow(dead_code)]
/// Hedera network section pointing at the given mock mirror node.
pub fn hedera_config(mirror_url: &str) -> HederaNetworkConfig {
    HederaNetworkConfig {
        name: "Hedera".to_string(),
        network: "mainnet".to_string(),
        operator_id: "0.0.500000".to_string(),
        merchant_account: MERCHANT_HEDERA.to_string(),
        mirror_node_url: mirror_url.to_string(),
        fallback_mirror: None,
        native_symbol: "HBAR".to_string(),
        native_decimals: 8,
        tokens: vec![TokenConfig {
            symbol: "USDT".to_string(),
            id: HEDERA_USDT_TOKEN.to_string(),
            decimals: 6,
        }],
        required_confirmations: 1,
        min_merchant_balance: Decimal::from(100),
    }
}

/// Cosmos network section pointing at the given mock LCD.
#[allow(dead_code)]
pub fn cosmos_config(rest_url: &str) -> CosmosNetworkConfig {
    CosmosNetworkConfig {
        name: "Cosmos Hub".to_string(),
        chain_id: "cosmoshub-4".to_string(),
        rpc_url: rest_url.to_string(),
        rest_url: rest_url.to_string(),
        fallback_rest: None,
        merchant_address: MERCHANT_COSMOS.to_string(),
        native_symbol: "ATOM".to_string(),
        native_denom: "uatom".to_string(),
        native_decimals: 6,
        tokens: Vec::new(),
        required_confirmations: 2,
        min_merchant_balance: Decimal::from(1),
    }
}

/// Config with an Ethereum and a Hedera section pointing at placeholder
/// URLs. Tests that talk to mock servers swap the URLs in.
#[allow(dead_code)]
pub fn build_test_config() -> Config {
    let mut config = Config::default();
    config.networks.ethereum = Some(ethereum_config(
        "http://127.0.0.1:1/api",
        "http://127.0.0.1:1",
    ));
    config.networks.hedera = Some(hedera_config("http://127.0.0.1:1"));
    config
}

// ============================================================================
// SNAPSHOT BUILDERS
// ============================================================================

#[allow(dead_code)]
/// Ethereum snapshot with USDT at 6 decimals.
pub fn ethereum_snapshot() -> NetworkSnapshot {
    let mut tokens = HashMap::new();
    tokens.insert(
        "USDT".to_string(),
        TokenInfo {
            id: Some(USDT_CONTRACT_ETH.to_string()),
            decimals: 6,
        },
    );
    NetworkSnapshot {
        network: Network::Ethereum,
        merchant_address: MERCHANT_EVM.to_string(),
        required_confirmations: 12,
        native_symbol: "ETH".to_string(),
        native_decimals: 18,
        tokens,
        memo_matching: false,
        gas_ceiling_gwei: Some(Decimal::from(150)),
        min_merchant_balance: Decimal::from_str("0.1").unwrap(),
    }
}

/// Hedera snapshot with USDT at 6 decimals and memo matching on.
#[allow(dead_code)]
pub fn hedera_snapshot() -> NetworkSnapshot {
    let mut tokens = HashMap::new();
    tokens.insert(
        "USDT".to_string(),
        TokenInfo {
            id: Some(HEDERA_USDT_TOKEN.to_string()),
            decimals: 6,
        },
    );
    NetworkSnapshot {
        network: Network::Hedera,
        merchant_address: MERCHANT_HEDERA.to_string(),
        required_confirmations: 1,
        native_symbol: "HBAR".to_string(),
        native_decimals: 8,
        tokens,
        memo_matching: true,
        gas_ceiling_gwei: None,
        min_merchant_balance: Decimal::from(100),
    }
}

// ============================================================================
// DEFAULT INTENT/CANDIDATE CREATORS
// ============================================================================

#[allow(dead_code)]
/// A pending 10 USDT intent on Ethereum, created now with a 30 minute
/// window.
pub fn usdt_intent_ethereum() -> PaymentIntent {
    let now = current_timestamp();
    PaymentIntent {
        reference: "CRYPTO_abc123".to_string(),
        network: Network::Ethereum,
        currency: "USDT".to_string(),
        expected_amount: Decimal::from(10),
        recipient_address: MERCHANT_EVM.to_string(),
        token_id: Some(USDT_CONTRACT_ETH.to_string()),
        memo: None,
        plan: Some("basic".to_string()),
        status: IntentStatus::Pending,
        created_at: now,
        expires_at: now + 1800,
        matched_transaction_hash: None,
    }
}

/// A pending 10 USDT intent on Hedera with the reference memo set.
#[allow(dead_code)]
pub fn usdt_intent_hedera() -> PaymentIntent {
    let now = current_timestamp();
    PaymentIntent {
        reference: "CRYPTO_abc123".to_string(),
        network: Network::Hedera,
        currency: "USDT".to_string(),
        expected_amount: Decimal::from(10),
        recipient_address: MERCHANT_HEDERA.to_string(),
        token_id: Some(HEDERA_USDT_TOKEN.to_string()),
        memo: Some("Payment:CRYPTO_abc123".to_string()),
        plan: Some("pro".to_string()),
        status: IntentStatus::Pending,
        created_at: now,
        expires_at: now + 1800,
        matched_transaction_hash: None,
    }
}

#[allow(dead_code)]
/// A confirmed candidate paying the Ethereum USDT intent exactly.
pub fn usdt_candidate_ethereum() -> CandidateTransaction {
    CandidateTransaction {
        hash: "0xmatch".to_string(),
        network: Network::Ethereum,
        sender_address: SENDER_EVM.to_string(),
        recipient_address: MERCHANT_EVM.to_string(),
        token_id: Some(USDT_CONTRACT_ETH.to_string()),
        raw_amount: 10_000_000,
        memo: None,
        confirmations: 20,
        timestamp: current_timestamp(),
    }
}
