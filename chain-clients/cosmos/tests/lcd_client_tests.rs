//! Unit tests for the Cosmos LCD client
//!
//! These tests verify transaction parsing (MsgSend extraction, code checks),
//! height queries, and balance lookups against a local mock server.

use chain_clients_cosmos::CosmosLcdClient;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

const MERCHANT: &str = "cosmos1merchantxxxxxxxxxxxxxxxxxxxxxxxxxxx";
const SENDER: &str = "cosmos1senderxxxxxxxxxxxxxxxxxxxxxxxxxxxxx";
const TX_HASH: &str = "A1B2C3D4E5F6";

fn client_for(server: &MockServer) -> CosmosLcdClient {
    CosmosLcdClient::new(&server.uri(), Duration::from_secs(5))
        .expect("Failed to create CosmosLcdClient")
}

fn tx_body(amount: &str) -> serde_json::Value {
    json!({
        "body": {
            "messages": [{
                "@type": "/cosmos.bank.v1beta1.MsgSend",
                "from_address": SENDER,
                "to_address": MERCHANT,
                "amount": [{ "denom": "uatom", "amount": amount }]
            }],
            "memo": ""
        }
    })
}

fn tx_response(code: u32) -> serde_json::Value {
    json!({
        "txhash": TX_HASH,
        "code": code,
        "height": "18000000",
        "timestamp": "2023-11-14T22:13:20Z"
    })
}

// ============================================================================
// TESTS
// ============================================================================

/// Test that tx_by_hash extracts MsgSend amounts from a successful tx
/// Why: uatom send amounts are the raw values matched against intents
#[tokio::test]
async fn test_tx_by_hash_parses_msg_send() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/cosmos/tx/v1beta1/txs/{}", TX_HASH)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tx": tx_body("10000000"),
            "tx_response": tx_response(0)
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let tx = client
        .tx_by_hash(TX_HASH)
        .await
        .expect("tx query should succeed")
        .expect("tx should be found");

    assert_eq!(tx.code, 0);
    assert_eq!(tx.height, 18_000_000);
    assert_eq!(tx.timestamp, 1_700_000_000);
    assert_eq!(tx.sends.len(), 1);
    assert_eq!(tx.sends[0].to_address, MERCHANT);
    assert_eq!(tx.sends[0].amounts[0].denom, "uatom");
    assert_eq!(tx.sends[0].amounts[0].amount, "10000000");
}

/// Test that a failed transaction keeps its nonzero code
/// Why: only code-0 transactions actually moved funds
#[tokio::test]
async fn test_tx_by_hash_keeps_failure_code() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/cosmos/tx/v1beta1/txs/{}", TX_HASH)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tx": tx_body("10000000"),
            "tx_response": tx_response(5)
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let tx = client
        .tx_by_hash(TX_HASH)
        .await
        .expect("tx query should succeed")
        .expect("tx should be found");
    assert_eq!(tx.code, 5);
}

/// Test that tx_by_hash maps 404 to None
/// Why: unknown hashes are an expected outcome, not an error
#[tokio::test]
async fn test_tx_by_hash_missing_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/cosmos/tx/v1beta1/txs/{}", TX_HASH)))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "code": 5, "message": "tx not found", "details": []
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let tx = client.tx_by_hash(TX_HASH).await.expect("404 maps to None");
    assert!(tx.is_none());
}

/// Test that txs_by_recipient pairs txs with their responses
/// Why: sweeps discover candidate payments through recipient search
#[tokio::test]
async fn test_txs_by_recipient_pairs_responses() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cosmos/tx/v1beta1/txs"))
        .and(query_param(
            "events",
            format!("transfer.recipient='{}'", MERCHANT),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "txs": [tx_body("2500000")],
            "tx_responses": [tx_response(0)]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let txs = client
        .txs_by_recipient(MERCHANT, 50)
        .await
        .expect("search should succeed");
    assert_eq!(txs.len(), 1);
    assert_eq!(txs[0].sends[0].amounts[0].amount, "2500000");
}

/// Test that latest_height parses the block header height string
/// Why: confirmation depth is latest height minus inclusion height
#[tokio::test]
async fn test_latest_height_parses_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cosmos/base/tendermint/v1beta1/blocks/latest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "block": { "header": { "height": "18000005" } }
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let height = client.latest_height().await.expect("height query");
    assert_eq!(height, 18_000_005);
}

/// Test that balance reads the by_denom response
/// Why: merchant balance thresholds are checked during health sweeps
#[tokio::test]
async fn test_balance_parses_amount() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!(
            "/cosmos/bank/v1beta1/balances/{}/by_denom",
            MERCHANT
        )))
        .and(query_param("denom", "uatom"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "balance": { "denom": "uatom", "amount": "3000000" }
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let balance = client.balance(MERCHANT, "uatom").await.expect("balance query");
    assert_eq!(balance, 3_000_000);
}
