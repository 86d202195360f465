//! Hedera Mirror Node Client Library
//!
//! This crate provides a client for the Hedera mirror-node REST API. The
//! mirror node only reports transactions that have reached consensus, so a
//! transaction's presence is already final and there is no confirmation
//! depth to track.
//!
//! Transaction memos arrive base64-encoded (`memo_base64`) and are decoded
//! here before callers match payment references against them.

use anyhow::{Context, Result};
use base64::{engine::general_purpose, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

// ============================================================================
// API RESPONSE STRUCTURES
// ============================================================================

/// Envelope for the `/api/v1/transactions` listing.
#[derive(Debug, Deserialize)]
struct TransactionsPage {
    transactions: Vec<MirrorTransaction>,
}

/// One transaction as reported by the mirror node.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MirrorTransaction {
    /// Transaction ID (e.g. "0.0.123-1700000000-000000001")
    pub transaction_id: String,
    /// Consensus timestamp in "seconds.nanoseconds" form
    pub consensus_timestamp: String,
    /// Result string; "SUCCESS" for applied transactions
    pub result: String,
    /// Transaction type name (e.g. "CRYPTOTRANSFER")
    pub name: String,
    /// Memo, base64-encoded on the wire
    #[serde(default)]
    pub memo_base64: Option<String>,
    /// HBAR transfer legs in tinybars (negative = debit)
    #[serde(default)]
    pub transfers: Vec<HbarTransfer>,
    /// Token transfer legs in the token's smallest units
    #[serde(default)]
    pub token_transfers: Vec<TokenTransfer>,
}

/// One HBAR transfer leg.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HbarTransfer {
    /// Account ID (e.g. "0.0.123")
    pub account: String,
    /// Amount in tinybars; negative for the paying side
    pub amount: i64,
}

/// One token transfer leg.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenTransfer {
    /// Token ID (e.g. "0.0.456858")
    pub token_id: String,
    /// Account ID
    pub account: String,
    /// Amount in the token's smallest units; negative for the paying side
    pub amount: i64,
}

/// Account details from `/api/v1/accounts/{id}`.
#[derive(Debug, Deserialize)]
struct AccountInfo {
    balance: AccountBalance,
}

#[derive(Debug, Deserialize)]
struct AccountBalance {
    balance: u64,
}

impl MirrorTransaction {
    /// Decodes the base64 memo into text, if present and decodable.
    pub fn memo(&self) -> Option<String> {
        let encoded = self.memo_base64.as_deref()?;
        if encoded.is_empty() {
            return None;
        }
        let bytes = general_purpose::STANDARD.decode(encoded).ok()?;
        Some(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Consensus timestamp truncated to whole unix seconds.
    pub fn consensus_seconds(&self) -> u64 {
        self.consensus_timestamp
            .split('.')
            .next()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0)
    }
}

// ============================================================================
// MIRROR NODE CLIENT IMPLEMENTATION
// ============================================================================

/// Client for a Hedera mirror-node REST endpoint.
pub struct HederaMirrorClient {
    /// HTTP client for making requests
    client: Client,
    /// Mirror node base URL (e.g. "https://mainnet-public.mirrornode.hedera.com")
    base_url: String,
}

impl HederaMirrorClient {
    /// Creates a new mirror-node client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Mirror node base URL, without the /api/v1 suffix
    /// * `timeout` - Per-request timeout
    ///
    /// # Returns
    ///
    /// * `Ok(HederaMirrorClient)` - Successfully created client
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

    /// Lists successful CRYPTOTRANSFER transactions touching an account,
    /// newest first.
    ///
    /// # Arguments
    ///
    /// * `account_id` - Account to filter on (e.g. "0.0.123")
    /// * `since` - Optional lower bound on consensus timestamp (unix seconds)
    /// * `limit` - Maximum number of transactions to return
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<MirrorTransaction>)` - Matching transactions
    /// * `Err(anyhow::Error)` - Mirror node unreachable or errored
    pub async fn account_transactions(
        &self,
        account_id: &str,
        since: Option<u64>,
        limit: u32,
    ) -> Result<Vec<MirrorTransaction>> {
        let url = format!("{}/api/v1/transactions", self.base_url);
        let limit = limit.to_string();
        let mut params = vec![
            ("account.id", account_id.to_string()),
            ("transactiontype", "CRYPTOTRANSFER".to_string()),
            ("result", "SUCCESS".to_string()),
            ("limit", limit),
            ("order", "desc".to_string()),
        ];
        if let Some(since) = since {
            params.push(("timestamp", format!("gte:{}.000000000", since)));
        }

        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .with_context(|| format!("Failed to query {}", url))?;
        if !response.status().is_success() {
            anyhow::bail!("Mirror node {} returned status {}", url, response.status());
        }

        let page: TransactionsPage = response
            .json()
            .await
            .context("Failed to parse mirror node transactions response")?;
        debug!(
            "Mirror node returned {} transaction(s) for {}",
            page.transactions.len(),
            account_id
        );
        Ok(page.transactions)
    }

    /// Fetches one transaction by its transaction ID.
    ///
    /// # Arguments
    ///
    /// * `transaction_id` - Mirror-node transaction ID
    ///
    /// # Returns
    ///
    /// * `Ok(Some(MirrorTransaction))` - Transaction found
    /// * `Ok(None)` - Unknown transaction (404)
    /// * `Err(anyhow::Error)` - Mirror node unreachable or errored
    pub async fn transaction_by_id(
        &self,
        transaction_id: &str,
    ) -> Result<Option<MirrorTransaction>> {
        let url = format!("{}/api/v1/transactions/{}", self.base_url, transaction_id);
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
            anyhow::bail!("Mirror node {} returned status {}", url, response.status());
        }

        let page: TransactionsPage = response
            .json()
            .await
            .context("Failed to parse mirror node transaction response")?;
        Ok(page.transactions.into_iter().next())
    }

    /// Queries the HBAR balance of an account in tinybars.
    ///
    /// # Arguments
    ///
    /// * `account_id` - Account to query
    ///
    /// # Returns
    ///
    /// * `Ok(u64)` - Balance in tinybars
    /// * `Err(anyhow::Error)` - Mirror node unreachable or errored
    pub async fn account_balance(&self, account_id: &str) -> Result<u64> {
        let url = format!("{}/api/v1/accounts/{}", self.base_url, account_id);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to query {}", url))?;
        if !response.status().is_success() {
            anyhow::bail!("Mirror node {} returned status {}", url, response.status());
        }

        let info: AccountInfo = response
            .json()
            .await
            .context("Failed to parse mirror node account response")?;
        Ok(info.balance.balance)
    }

    /// Probes mirror-node liveness via the network-nodes endpoint.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Mirror node responded 2xx
    /// * `Err(anyhow::Error)` - Unreachable or non-2xx
    pub async fn ping(&self) -> Result<()> {
        let url = format!("{}/api/v1/network/nodes", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("limit", "1")])
            .send()
            .await
            .with_context(|| format!("Failed to query {}", url))?;
        if !response.status().is_success() {
            anyhow::bail!("Mirror node {} returned status {}", url, response.status());
        }
        Ok(())
    }

    /// Returns the base URL of this client.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}
