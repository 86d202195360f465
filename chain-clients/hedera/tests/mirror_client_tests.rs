//! Unit tests for the Hedera mirror-node client
//!
//! These tests verify transaction listing parsing, base64 memo decoding, and
//! balance queries against a local mock server.

use chain_clients_hedera::HederaMirrorClient;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

const MERCHANT_ACCOUNT: &str = "0.0.123456";
const USDT_TOKEN_ID: &str = "0.0.456858";

fn client_for(server: &MockServer) -> HederaMirrorClient {
    HederaMirrorClient::new(&server.uri(), Duration::from_secs(5))
        .expect("Failed to create HederaMirrorClient")
}

/// A successful CRYPTOTRANSFER with a USDT token leg and a payment memo.
/// "UGF5bWVudDpDUllQVE9fYWJjMTIz" is base64 for "Payment:CRYPTO_abc123".
fn token_payment_transaction() -> serde_json::Value {
    json!({
        "transaction_id": "0.0.999-1700000000-000000001",
        "consensus_timestamp": "1700000000.123456789",
        "result": "SUCCESS",
        "name": "CRYPTOTRANSFER",
        "memo_base64": "UGF5bWVudDpDUllQVE9fYWJjMTIz",
        "transfers": [
            { "account": "0.0.999", "amount": -200000 },
            { "account": "0.0.3", "amount": 200000 }
        ],
        "token_transfers": [
            { "token_id": USDT_TOKEN_ID, "account": "0.0.999", "amount": -10000000 },
            { "token_id": USDT_TOKEN_ID, "account": MERCHANT_ACCOUNT, "amount": 10000000 }
        ]
    })
}

// ============================================================================
// TESTS
// ============================================================================

/// Test that account_transactions parses token transfers and decodes memos
/// Why: memo text is the primary matching key for Hedera payments
#[tokio::test]
async fn test_account_transactions_decodes_memo() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/transactions"))
        .and(query_param("account.id", MERCHANT_ACCOUNT))
        .and(query_param("transactiontype", "CRYPTOTRANSFER"))
        .and(query_param("result", "SUCCESS"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "transactions": [token_payment_transaction()]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let txs = client
        .account_transactions(MERCHANT_ACCOUNT, None, 100)
        .await
        .expect("transactions query should succeed");

    assert_eq!(txs.len(), 1);
    assert_eq!(txs[0].memo().as_deref(), Some("Payment:CRYPTO_abc123"));
    assert_eq!(txs[0].consensus_seconds(), 1_700_000_000);
    assert_eq!(txs[0].token_transfers.len(), 2);
    assert_eq!(txs[0].token_transfers[1].account, MERCHANT_ACCOUNT);
    assert_eq!(txs[0].token_transfers[1].amount, 10_000_000);
}

/// Test that the since parameter becomes a gte timestamp filter
/// Why: sweeps only ask for transactions after the oldest pending intent
#[tokio::test]
async fn test_account_transactions_since_filter() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/transactions"))
        .and(query_param("timestamp", "gte:1700000000.000000000"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "transactions": [] })),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let txs = client
        .account_transactions(MERCHANT_ACCOUNT, Some(1_700_000_000), 100)
        .await
        .expect("transactions query should succeed");
    assert!(txs.is_empty());
}

/// Test that a missing or empty memo decodes to None
/// Why: HBAR transfers without memos must not match memo-keyed intents
#[tokio::test]
async fn test_empty_memo_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/transactions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "transactions": [{
                "transaction_id": "0.0.999-1700000001-000000002",
                "consensus_timestamp": "1700000001.000000000",
                "result": "SUCCESS",
                "name": "CRYPTOTRANSFER",
                "memo_base64": "",
                "transfers": [
                    { "account": MERCHANT_ACCOUNT, "amount": 500000000 }
                ],
                "token_transfers": []
            }]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let txs = client
        .account_transactions(MERCHANT_ACCOUNT, None, 100)
        .await
        .expect("transactions query should succeed");
    assert_eq!(txs[0].memo(), None);
}

/// Test that account_balance reads the nested balance field
/// Why: merchant balance thresholds are checked during health sweeps
#[tokio::test]
async fn test_account_balance_parses_tinybars() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/api/v1/accounts/{}", MERCHANT_ACCOUNT)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "account": MERCHANT_ACCOUNT,
            "balance": { "balance": 12_500_000_000u64, "timestamp": "1700000000.0" }
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let balance = client
        .account_balance(MERCHANT_ACCOUNT)
        .await
        .expect("balance query should succeed");
    assert_eq!(balance, 12_500_000_000);
}

/// Test that transaction_by_id returns None on 404
/// Why: unknown transaction IDs are an expected lookup outcome, not an error
#[tokio::test]
async fn test_transaction_by_id_missing_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/transactions/0.0.1-2-3"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "_status": { "messages": [{ "message": "Not found" }] }
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let tx = client
        .transaction_by_id("0.0.1-2-3")
        .await
        .expect("404 should map to None");
    assert!(tx.is_none());
}
