//! EVM Chain Client Library
//!
//! This crate provides a client for EVM-compatible chains (Ethereum, BSC,
//! Polygon) combining two transports:
//!
//! - a block-explorer HTTP API (Etherscan/BscScan/PolygonScan style) for
//!   transaction listings, receipt status, gas oracle, and balances
//! - the chain's JSON-RPC endpoint for block height and liveness probes
//!
//! Explorer listing endpoints return raw amounts as decimal strings while
//! proxy endpoints return 0x-hex quantities; both forms are handled.

use anyhow::{Context, Result};
use chain_clients_common::parse_hex_quantity;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

// ============================================================================
// API RESPONSE STRUCTURES
// ============================================================================

/// Explorer API envelope: {"status": "1", "message": "OK", "result": ...}
///
/// `result` is an array for listing endpoints but a plain string for error
/// responses and balance queries, so it is kept as a raw JSON value and
/// interpreted per endpoint.
#[derive(Debug, Deserialize)]
struct ExplorerEnvelope {
    status: String,
    message: String,
    result: serde_json::Value,
}

/// Token transfer entry from the explorer `account/tokentx` action.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenTransferEntry {
    /// Transaction hash
    pub hash: String,
    /// Sender address
    pub from: String,
    /// Recipient address
    pub to: String,
    /// Raw transfer amount in smallest token units (decimal string)
    pub value: String,
    /// ERC-20 contract address
    #[serde(rename = "contractAddress")]
    pub contract_address: String,
    /// Token decimal count as reported by the explorer (decimal string)
    #[serde(rename = "tokenDecimal", default)]
    pub token_decimal: String,
    /// Block number the transfer was included in (decimal string)
    #[serde(rename = "blockNumber")]
    pub block_number: String,
    /// Unix timestamp of the containing block (decimal string)
    #[serde(rename = "timeStamp")]
    pub time_stamp: String,
    /// Confirmation count at query time (decimal string)
    pub confirmations: String,
}

/// Native transaction entry from the explorer `account/txlist` action.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NativeTxEntry {
    /// Transaction hash
    pub hash: String,
    /// Sender address
    pub from: String,
    /// Recipient address (empty for contract creation)
    pub to: String,
    /// Transfer amount in wei (decimal string)
    pub value: String,
    /// Block number (decimal string)
    #[serde(rename = "blockNumber")]
    pub block_number: String,
    /// Unix timestamp of the containing block (decimal string)
    #[serde(rename = "timeStamp")]
    pub time_stamp: String,
    /// Confirmation count at query time (decimal string)
    pub confirmations: String,
    /// "1" when the transaction errored during execution
    #[serde(rename = "isError", default)]
    pub is_error: String,
    /// Receipt status: "1" success, "0" failure, empty pre-Byzantium
    #[serde(rename = "txreceipt_status", default)]
    pub txreceipt_status: String,
}

/// Transaction details from the explorer `proxy/eth_getTransactionByHash`
/// action (JSON-RPC shape, hex-quantity fields).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProxyTransaction {
    /// Transaction hash
    pub hash: String,
    /// Block number (hex string, None while pending)
    #[serde(rename = "blockNumber")]
    pub block_number: Option<String>,
    /// Sender address
    pub from: String,
    /// Recipient address (None for contract creation)
    pub to: Option<String>,
    /// Transfer value in wei (hex string)
    pub value: String,
}

/// Gas oracle readings from the explorer `gastracker/gasoracle` action.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GasOracle {
    /// Safe gas price in Gwei (decimal string)
    #[serde(rename = "SafeGasPrice")]
    pub safe_gas_price: String,
    /// Proposed gas price in Gwei (decimal string)
    #[serde(rename = "ProposeGasPrice")]
    pub propose_gas_price: String,
    /// Fast gas price in Gwei (decimal string)
    #[serde(rename = "FastGasPrice")]
    pub fast_gas_price: String,
}

/// EVM JSON-RPC request wrapper
#[derive(Debug, Serialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    method: String,
    params: Vec<serde_json::Value>,
    id: u64,
}

/// EVM JSON-RPC response wrapper
#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

// ============================================================================
// EVM CLIENT IMPLEMENTATION
// ============================================================================

/// Client for one EVM network, speaking both the explorer API and JSON-RPC.
pub struct EvmScanClient {
    /// HTTP client for making requests
    client: Client,
    /// Explorer API base URL (e.g. "https://api.etherscan.io/api")
    explorer_url: String,
    /// JSON-RPC endpoint URL
    rpc_url: String,
    /// Explorer API key (appended to every explorer call when present)
    api_key: Option<String>,
}

impl EvmScanClient {
    /// Creates a new EVM client.
    ///
    /// # Arguments
    ///
    /// * `explorer_url` - Explorer API base URL (e.g. "https://api.etherscan.io/api")
    /// * `rpc_url` - JSON-RPC endpoint URL
    /// * `api_key` - Optional explorer API key
    /// * `timeout` - Per-request timeout for all calls made by this client
    ///
    /// # Returns
    ///
    /// * `Ok(EvmScanClient)` - Successfully created client
    /// * `Err(anyhow::Error)` - Failed to build the HTTP client
    pub fn new(
        explorer_url: &str,
        rpc_url: &str,
        api_key: Option<&str>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            explorer_url: explorer_url.to_string(),
            rpc_url: rpc_url.to_string(),
            api_key: api_key.map(|k| k.to_string()),
        })
    }

    /// Queries ERC-20 transfers involving an address for one token contract.
    ///
    /// Uses the explorer `account/tokentx` action, newest first. The explorer
    /// reports "No transactions found" as a status-0 response with an empty
    /// result array, which is returned as an empty list rather than an error.
    ///
    /// # Arguments
    ///
    /// * `contract_address` - ERC-20 contract to filter on
    /// * `address` - Address whose transfers are listed
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<TokenTransferEntry>)` - Transfers, newest first
    /// * `Err(anyhow::Error)` - Transport failure or explorer error
    pub async fn token_transfers(
        &self,
        contract_address: &str,
        address: &str,
    ) -> Result<Vec<TokenTransferEntry>> {
        let params = [
            ("module", "account"),
            ("action", "tokentx"),
            ("contractaddress", contract_address),
            ("address", address),
            ("page", "1"),
            ("offset", "100"),
            ("sort", "desc"),
        ];
        let envelope = self.explorer_get(&params).await?;
        Self::parse_listing(envelope, "tokentx")
    }

    /// Queries native-currency transactions involving an address.
    ///
    /// Uses the explorer `account/txlist` action, newest first.
    ///
    /// # Arguments
    ///
    /// * `address` - Address whose transactions are listed
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<NativeTxEntry>)` - Transactions, newest first
    /// * `Err(anyhow::Error)` - Transport failure or explorer error
    pub async fn native_transactions(&self, address: &str) -> Result<Vec<NativeTxEntry>> {
        let params = [
            ("module", "account"),
            ("action", "txlist"),
            ("address", address),
            ("page", "1"),
            ("offset", "100"),
            ("sort", "desc"),
        ];
        let envelope = self.explorer_get(&params).await?;
        Self::parse_listing(envelope, "txlist")
    }

    /// Queries the receipt status of a transaction.
    ///
    /// Uses the explorer `transaction/gettxreceiptstatus` action.
    ///
    /// # Arguments
    ///
    /// * `hash` - Transaction hash
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - Receipt present with status "1"
    /// * `Ok(false)` - Receipt present with any other status
    /// * `Err(anyhow::Error)` - Transport failure or explorer error
    pub async fn receipt_status(&self, hash: &str) -> Result<bool> {
        let params = [
            ("module", "transaction"),
            ("action", "gettxreceiptstatus"),
            ("txhash", hash),
        ];
        let envelope = self.explorer_get(&params).await?;

        #[derive(Debug, Deserialize)]
        struct ReceiptStatus {
            status: String,
        }

        let status: ReceiptStatus = serde_json::from_value(envelope.result)
            .context("Failed to parse gettxreceiptstatus result")?;
        Ok(status.status == "1")
    }

    /// Queries transaction details by hash through the explorer proxy.
    ///
    /// # Arguments
    ///
    /// * `hash` - Transaction hash (with or without 0x prefix)
    ///
    /// # Returns
    ///
    /// * `Ok(Some(ProxyTransaction))` - Transaction information
    /// * `Ok(None)` - Transaction not known to the node
    /// * `Err(anyhow::Error)` - Transport failure or explorer error
    pub async fn transaction_by_hash(&self, hash: &str) -> Result<Option<ProxyTransaction>> {
        let hash = if hash.starts_with("0x") {
            hash.to_string()
        } else {
            format!("0x{}", hash)
        };
        let params = [
            ("module", "proxy"),
            ("action", "eth_getTransactionByHash"),
            ("txhash", hash.as_str()),
        ];

        let mut request = self.client.get(&self.explorer_url).query(&params);
        if let Some(key) = &self.api_key {
            request = request.query(&[("apikey", key.as_str())]);
        }
        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to query {}", self.explorer_url))?;
        if !response.status().is_success() {
            anyhow::bail!(
                "Explorer {} returned status {}",
                self.explorer_url,
                response.status()
            );
        }

        // Proxy actions use the JSON-RPC envelope, not the explorer envelope.
        let body: JsonRpcResponse<ProxyTransaction> = response
            .json()
            .await
            .context("Failed to parse eth_getTransactionByHash response")?;
        if let Some(error) = body.error {
            anyhow::bail!(
                "JSON-RPC error from {}: {} (code: {})",
                self.explorer_url,
                error.message,
                error.code
            );
        }
        Ok(body.result)
    }

    /// Queries the explorer gas oracle.
    ///
    /// # Returns
    ///
    /// * `Ok(GasOracle)` - Current gas price readings in Gwei
    /// * `Err(anyhow::Error)` - Transport failure or explorer error
    pub async fn gas_oracle(&self) -> Result<GasOracle> {
        let params = [("module", "gastracker"), ("action", "gasoracle")];
        let envelope = self.explorer_get(&params).await?;
        if envelope.status != "1" {
            anyhow::bail!("Gas oracle error: {}", envelope.message);
        }
        serde_json::from_value(envelope.result).context("Failed to parse gasoracle result")
    }

    /// Queries the native-currency balance of an address in wei.
    ///
    /// # Arguments
    ///
    /// * `address` - Address to query
    ///
    /// # Returns
    ///
    /// * `Ok(u128)` - Balance in wei
    /// * `Err(anyhow::Error)` - Transport failure or explorer error
    pub async fn address_balance(&self, address: &str) -> Result<u128> {
        let params = [
            ("module", "account"),
            ("action", "balance"),
            ("address", address),
            ("tag", "latest"),
        ];
        let envelope = self.explorer_get(&params).await?;
        if envelope.status != "1" {
            anyhow::bail!("Balance query error: {}", envelope.message);
        }
        let raw = envelope
            .result
            .as_str()
            .context("Balance result was not a string")?;
        raw.parse::<u128>()
            .with_context(|| format!("Failed to parse balance '{}'", raw))
    }

    /// Gets the current block number from the JSON-RPC endpoint.
    ///
    /// # Returns
    ///
    /// * `Ok(u64)` - Current block number
    /// * `Err(anyhow::Error)` - Failed to query block number
    pub async fn block_number(&self) -> Result<u64> {
        let result: String = self.rpc_call("eth_blockNumber", vec![]).await?;
        let block = parse_hex_quantity(&result)
            .with_context(|| format!("Failed to parse block number '{}'", result))?;
        Ok(block as u64)
    }

    /// Probes the JSON-RPC endpoint with `net_version`.
    ///
    /// Used as a lightweight liveness check.
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - Network ID reported by the node
    /// * `Err(anyhow::Error)` - Endpoint unreachable or errored
    pub async fn net_version(&self) -> Result<String> {
        self.rpc_call("net_version", vec![]).await
    }

    /// Returns the explorer base URL of this client.
    pub fn explorer_url(&self) -> &str {
        &self.explorer_url
    }

    // ------------------------------------------------------------------
    // internal helpers
    // ------------------------------------------------------------------

    /// Performs an explorer GET, retrying once after a short pause when the
    /// explorer reports a rate limit (free API keys allow 5 req/s).
    async fn explorer_get(&self, params: &[(&str, &str)]) -> Result<ExplorerEnvelope> {
        let envelope = self.explorer_get_once(params).await?;
        if envelope.status == "0" && envelope.message.contains("rate limit") {
            debug!("Explorer rate limit hit, retrying once");
            tokio::time::sleep(Duration::from_millis(250)).await;
            return self.explorer_get_once(params).await;
        }
        Ok(envelope)
    }

    async fn explorer_get_once(&self, params: &[(&str, &str)]) -> Result<ExplorerEnvelope> {
        let mut request = self.client.get(&self.explorer_url).query(params);
        if let Some(key) = &self.api_key {
            request = request.query(&[("apikey", key.as_str())]);
        }
        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to query {}", self.explorer_url))?;
        if !response.status().is_success() {
            anyhow::bail!(
                "Explorer {} returned status {}",
                self.explorer_url,
                response.status()
            );
        }
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse explorer response from {}", self.explorer_url))
    }

    /// Interprets a listing envelope: status "1" parses the result array,
    /// status "0" with an empty array means "no transactions found".
    fn parse_listing<T: serde::de::DeserializeOwned>(
        envelope: ExplorerEnvelope,
        action: &str,
    ) -> Result<Vec<T>> {
        match envelope.result {
            serde_json::Value::Array(items) => items
                .into_iter()
                .map(|item| {
                    serde_json::from_value(item)
                        .with_context(|| format!("Failed to parse {} entry", action))
                })
                .collect(),
            _ if envelope.status == "0" => {
                anyhow::bail!("Explorer {} error: {}", action, envelope.message)
            }
            other => anyhow::bail!("Unexpected {} result shape: {}", action, other),
        }
    }

    /// Sends a JSON-RPC request to the RPC endpoint.
    async fn rpc_call<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<serde_json::Value>,
    ) -> Result<T> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
            id: 1,
        };

        let response: JsonRpcResponse<T> = self
            .client
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await
            .with_context(|| format!("Failed to send {} request to {}", method, self.rpc_url))?
            .json()
            .await
            .with_context(|| format!("Failed to parse {} response from {}", method, self.rpc_url))?;

        if let Some(error) = response.error {
            anyhow::bail!(
                "JSON-RPC error from {}: {} (code: {})",
                self.rpc_url,
                error.message,
                error.code
            );
        }

        response
            .result
            .ok_or_else(|| anyhow::anyhow!("No result in {} response", method))
    }
}
