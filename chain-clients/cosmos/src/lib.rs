//! Cosmos LCD Client Library
//!
//! This crate provides a client for the Cosmos SDK LCD (REST) API, covering
//! transaction lookup and search, block height, sync status, and bank
//! balances. A transaction only counts as applied when `tx_response.code`
//! is zero; amounts inside `MsgSend` messages are in the denom's smallest
//! units (e.g. `uatom`).

use anyhow::{Context, Result};
use chrono::DateTime;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

// ============================================================================
// API RESPONSE STRUCTURES
// ============================================================================

#[derive(Debug, Deserialize)]
struct TxLookupResponse {
    tx: LcdTxBody,
    tx_response: LcdTxResponse,
}

#[derive(Debug, Deserialize)]
struct TxSearchResponse {
    #[serde(default)]
    txs: Vec<LcdTxBody>,
    #[serde(default)]
    tx_responses: Vec<LcdTxResponse>,
}

#[derive(Debug, Deserialize)]
struct LcdTxBody {
    body: LcdTxBodyInner,
}

#[derive(Debug, Deserialize)]
struct LcdTxBodyInner {
    #[serde(default)]
    messages: Vec<serde_json::Value>,
    #[serde(default)]
    memo: String,
}

#[derive(Debug, Deserialize)]
struct LcdTxResponse {
    txhash: String,
    /// Execution result; 0 = success
    code: u32,
    /// Inclusion height (decimal string)
    height: String,
    /// RFC 3339 block timestamp
    timestamp: String,
}

#[derive(Debug, Deserialize)]
struct LatestBlockResponse {
    block: BlockInfo,
}

#[derive(Debug, Deserialize)]
struct BlockInfo {
    header: BlockHeader,
}

#[derive(Debug, Deserialize)]
struct BlockHeader {
    height: String,
}

#[derive(Debug, Deserialize)]
struct SyncingResponse {
    syncing: bool,
}

#[derive(Debug, Deserialize)]
struct BalanceResponse {
    balance: CoinAmount,
}

/// A denom/amount pair as used across bank and tx messages.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CoinAmount {
    /// Denomination in smallest units (e.g. "uatom")
    pub denom: String,
    /// Amount as a decimal string
    pub amount: String,
}

// ============================================================================
// PARSED TRANSACTION SHAPE
// ============================================================================

/// One bank send extracted from a transaction's messages.
#[derive(Debug, Clone, Serialize)]
pub struct BankSend {
    /// Sending address
    pub from_address: String,
    /// Receiving address
    pub to_address: String,
    /// Transferred coins, one entry per denom
    pub amounts: Vec<CoinAmount>,
}

/// A transaction reduced to the fields reconciliation cares about.
#[derive(Debug, Clone, Serialize)]
pub struct CosmosTx {
    /// Transaction hash
    pub hash: String,
    /// Execution result; only code 0 transactions transferred funds
    pub code: u32,
    /// Inclusion height
    pub height: u64,
    /// Block timestamp as unix seconds
    pub timestamp: u64,
    /// Transaction memo (free text)
    pub memo: Option<String>,
    /// Bank sends contained in the transaction
    pub sends: Vec<BankSend>,
}

const MSG_SEND_TYPE: &str = "/cosmos.bank.v1beta1.MsgSend";

fn parse_tx(body: LcdTxBody, response: LcdTxResponse) -> CosmosTx {
    let mut sends = Vec::new();
    for message in &body.body.messages {
        if message.get("@type").and_then(|t| t.as_str()) != Some(MSG_SEND_TYPE) {
            continue;
        }
        let from_address = message
            .get("from_address")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        let to_address = message
            .get("to_address")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        let amounts = message
            .get("amount")
            .and_then(|v| serde_json::from_value::<Vec<CoinAmount>>(v.clone()).ok())
            .unwrap_or_default();
        sends.push(BankSend {
            from_address,
            to_address,
            amounts,
        });
    }

    let timestamp = DateTime::parse_from_rfc3339(&response.timestamp)
        .map(|dt| dt.timestamp().max(0) as u64)
        .unwrap_or(0);

    CosmosTx {
        hash: response.txhash,
        code: response.code,
        height: response.height.parse().unwrap_or(0),
        timestamp,
        memo: if body.body.memo.is_empty() {
            None
        } else {
            Some(body.body.memo.clone())
        },
        sends,
    }
}

// ============================================================================
// LCD CLIENT IMPLEMENTATION
// ============================================================================

/// Client for a Cosmos SDK LCD (REST) endpoint.
pub struct CosmosLcdClient {
    /// HTTP client for making requests
    client: Client,
    /// LCD base URL (e.g. "https://lcd-cosmoshub.keplr.app")
    base_url: String,
}

impl CosmosLcdClient {
    /// Creates a new LCD client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - LCD base URL
    /// * `timeout` - Per-request timeout
    ///
    /// # Returns
    ///
    /// * `Ok(CosmosLcdClient)` - Successfully created client
    /// * `Err(anyhow::Error)` - Failed to build the HTTP client
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetches one transaction by hash.
    ///
    /// # Arguments
    ///
    /// * `hash` - Transaction hash
    ///
    /// # Returns
    ///
    /// * `Ok(Some(CosmosTx))` - Transaction found
    /// * `Ok(None)` - Unknown hash (404)
    /// * `Err(anyhow::Error)` - LCD unreachable or errored
    pub async fn tx_by_hash(&self, hash: &str) -> Result<Option<CosmosTx>> {
        let url = format!("{}/cosmos/tx/v1beta1/txs/{}", self.base_url, hash);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to query {}", url))?;
        if response.status().as_u16() == 404 {
            return Ok(None);
        }
        if !response.status().is_success() {
            anyhow::bail!("LCD {} returned status {}", url, response.status());
        }

        let lookup: TxLookupResponse = response
            .json()
            .await
            .context("Failed to parse LCD transaction response")?;
        Ok(Some(parse_tx(lookup.tx, lookup.tx_response)))
    }

    /// Searches transactions by transfer recipient, newest first.
    ///
    /// # Arguments
    ///
    /// * `recipient` - bech32 address credited by the transfer
    /// * `limit` - Maximum number of transactions to return
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<CosmosTx>)` - Matching transactions
    /// * `Err(anyhow::Error)` - LCD unreachable or errored
    pub async fn txs_by_recipient(&self, recipient: &str, limit: u32) -> Result<Vec<CosmosTx>> {
        let url = format!("{}/cosmos/tx/v1beta1/txs", self.base_url);
        let events = format!("transfer.recipient='{}'", recipient);
        let limit = limit.to_string();
        let params = [
            ("events", events.as_str()),
            ("order_by", "ORDER_BY_DESC"),
            ("pagination.limit", limit.as_str()),
        ];

        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .with_context(|| format!("Failed to query {}", url))?;
        if !response.status().is_success() {
            anyhow::bail!("LCD {} returned status {}", url, response.status());
        }

        let search: TxSearchResponse = response
            .json()
            .await
            .context("Failed to parse LCD tx search response")?;
        debug!(
            "LCD returned {} transaction(s) for {}",
            search.tx_responses.len(),
            recipient
        );
        Ok(search
            .txs
            .into_iter()
            .zip(search.tx_responses)
            .map(|(tx, tx_response)| parse_tx(tx, tx_response))
            .collect())
    }

    /// Gets the latest block height.
    ///
    /// # Returns
    ///
    /// * `Ok(u64)` - Latest height
    /// * `Err(anyhow::Error)` - LCD unreachable or errored
    pub async fn latest_height(&self) -> Result<u64> {
        let url = format!(
            "{}/cosmos/base/tendermint/v1beta1/blocks/latest",
            self.base_url
        );
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to query {}", url))?;
        if !response.status().is_success() {
            anyhow::bail!("LCD {} returned status {}", url, response.status());
        }

        let latest: LatestBlockResponse = response
            .json()
            .await
            .context("Failed to parse LCD latest block response")?;
        latest
            .block
            .header
            .height
            .parse()
            .context("Failed to parse block height")
    }

    /// Probes node sync status.
    ///
    /// # Returns
    ///
    /// * `Ok(bool)` - true when the node reports it is still syncing
    /// * `Err(anyhow::Error)` - LCD unreachable or errored
    pub async fn syncing(&self) -> Result<bool> {
        let url = format!("{}/cosmos/base/tendermint/v1beta1/syncing", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to query {}", url))?;
        if !response.status().is_success() {
            anyhow::bail!("LCD {} returned status {}", url, response.status());
        }

        let syncing: SyncingResponse = response
            .json()
            .await
            .context("Failed to parse LCD syncing response")?;
        Ok(syncing.syncing)
    }

    /// Queries an address balance for one denom.
    ///
    /// # Arguments
    ///
    /// * `address` - bech32 address
    /// * `denom` - Denomination in smallest units (e.g. "uatom")
    ///
    /// # Returns
    ///
    /// * `Ok(u128)` - Balance in smallest units
    /// * `Err(anyhow::Error)` - LCD unreachable or errored
    pub async fn balance(&self, address: &str, denom: &str) -> Result<u128> {
        let url = format!(
            "{}/cosmos/bank/v1beta1/balances/{}/by_denom",
            self.base_url, address
        );
        let response = self
            .client
            .get(&url)
            .query(&[("denom", denom)])
            .send()
            .await
            .with_context(|| format!("Failed to query {}", url))?;
        if !response.status().is_success() {
            anyhow::bail!("LCD {} returned status {}", url, response.status());
        }

        let balance: BalanceResponse = response
            .json()
            .await
            .context("Failed to parse LCD balance response")?;
        balance
            .balance
            .amount
            .parse()
            .with_context(|| format!("Failed to parse balance '{}'", balance.balance.amount))
    }

    /// Returns the base URL of this client.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}
