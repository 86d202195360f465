//! EVM adapter
//!
//! Serves Ethereum, BSC, and Polygon through one implementation,
//! parameterized by the network's explorer/RPC endpoints. Candidates come
//! from explorer listings (`tokentx` for ERC-20 intents, `txlist` for
//! native-currency intents); confirmation depth is the distance between the
//! current block and the transaction's block.

use chain_clients_common::{normalize_evm_address, parse_amount};
use chain_clients_evm::EvmScanClient;
use std::time::Duration;
use tracing::warn;

use super::{unavailable, CandidateTransaction, NetworkAdapter};
use crate::config::{EvmNetworkConfig, Network};
use crate::error::Error;

/// Adapter for one EVM-compatible network.
pub struct EvmAdapter {
    network: Network,
    primary: EvmScanClient,
    /// Built when a fallback explorer or RPC is configured; absent halves
    /// reuse the primary endpoint.
    fallback: Option<EvmScanClient>,
}

impl EvmAdapter {
    /// Creates an adapter from the network's configuration.
    ///
    /// # Arguments
    ///
    /// * `network` - Which EVM network this adapter serves
    /// * `config` - The network's configuration section
    /// * `timeout` - Per-request timeout
    ///
    /// # Returns
    ///
    /// * `Ok(EvmAdapter)` - Ready adapter
    /// * `Err(Error::Config)` - HTTP client construction failed
    pub fn new(
        network: Network,
        config: &EvmNetworkConfig,
        timeout: Duration,
    ) -> Result<Self, Error> {
        let api_key = config.explorer_api_key.as_deref();
        let primary = EvmScanClient::new(&config.explorer_url, &config.rpc_url, api_key, timeout)
            .map_err(|e| Error::Config(format!("{}: {}", network, e)))?;

        let fallback = if config.fallback_explorer.is_some() || config.fallback_rpc.is_some() {
            let explorer = config
                .fallback_explorer
                .as_deref()
                .unwrap_or(&config.explorer_url);
            let rpc = config.fallback_rpc.as_deref().unwrap_or(&config.rpc_url);
            Some(
                EvmScanClient::new(explorer, rpc, api_key, timeout)
                    .map_err(|e| Error::Config(format!("{}: {}", network, e)))?,
            )
        } else {
            None
        };

        Ok(Self {
            network,
            primary,
            fallback,
        })
    }

    async fn token_candidates(
        &self,
        recipient: &str,
        contract: &str,
        since: u64,
    ) -> Result<Vec<CandidateTransaction>, Error> {
        let entries = match self.primary.token_transfers(contract, recipient).await {
            Ok(entries) => entries,
            Err(primary_err) => match &self.fallback {
                Some(fallback) => {
                    warn!(
                        "{} primary explorer failed ({:#}), using fallback",
                        self.network, primary_err
                    );
                    fallback
                        .token_transfers(contract, recipient)
                        .await
                        .map_err(|e| unavailable(self.network, e))?
                }
                None => return Err(unavailable(self.network, primary_err)),
            },
        };

        let recipient = normalize_evm_address(recipient);
        let candidates = entries
            .into_iter()
            .filter(|entry| normalize_evm_address(&entry.to) == recipient)
            .filter_map(|entry| {
                let timestamp: u64 = entry.time_stamp.parse().ok()?;
                if timestamp < since {
                    return None;
                }
                Some(CandidateTransaction {
                    hash: entry.hash,
                    network: self.network,
                    sender_address: normalize_evm_address(&entry.from),
                    recipient_address: recipient.clone(),
                    token_id: Some(normalize_evm_address(&entry.contract_address)),
                    raw_amount: parse_amount(&entry.value)?,
                    memo: None,
                    confirmations: entry.confirmations.parse().unwrap_or(0),
                    timestamp,
                })
            })
            .collect();
        Ok(candidates)
    }

    async fn native_candidates(
        &self,
        recipient: &str,
        since: u64,
    ) -> Result<Vec<CandidateTransaction>, Error> {
        let entries = match self.primary.native_transactions(recipient).await {
            Ok(entries) => entries,
            Err(primary_err) => match &self.fallback {
                Some(fallback) => {
                    warn!(
                        "{} primary explorer failed ({:#}), using fallback",
                        self.network, primary_err
                    );
                    fallback
                        .native_transactions(recipient)
                        .await
                        .map_err(|e| unavailable(self.network, e))?
                }
                None => return Err(unavailable(self.network, primary_err)),
            },
        };

        let recipient = normalize_evm_address(recipient);
        let candidates = entries
            .into_iter()
            // Reverted transactions still appear in txlist.
            .filter(|entry| entry.is_error != "1" && entry.txreceipt_status != "0")
            .filter(|entry| normalize_evm_address(&entry.to) == recipient)
            .filter_map(|entry| {
                let timestamp: u64 = entry.time_stamp.parse().ok()?;
                if timestamp < since {
                    return None;
                }
                Some(CandidateTransaction {
                    hash: entry.hash,
                    network: self.network,
                    sender_address: normalize_evm_address(&entry.from),
                    recipient_address: recipient.clone(),
                    token_id: None,
                    raw_amount: parse_amount(&entry.value)?,
                    memo: None,
                    confirmations: entry.confirmations.parse().unwrap_or(0),
                    timestamp,
                })
            })
            .collect();
        Ok(candidates)
    }
}

#[async_trait::async_trait]
impl NetworkAdapter for EvmAdapter {
    fn network(&self) -> Network {
        self.network
    }

    async fn find_candidates(
        &self,
        recipient: &str,
        token_id: Option<&str>,
        since: u64,
    ) -> Result<Vec<CandidateTransaction>, Error> {
        match token_id {
            Some(contract) => self.token_candidates(recipient, contract, since).await,
            None => self.native_candidates(recipient, since).await,
        }
    }

    async fn confirmation_depth(&self, hash: &str) -> Result<u64, Error> {
        let tx = match self.primary.transaction_by_hash(hash).await {
            Ok(tx) => tx,
            Err(primary_err) => match &self.fallback {
                Some(fallback) => {
                    warn!(
                        "{} primary explorer failed ({:#}), using fallback",
                        self.network, primary_err
                    );
                    fallback
                        .transaction_by_hash(hash)
                        .await
                        .map_err(|e| unavailable(self.network, e))?
                }
                None => return Err(unavailable(self.network, primary_err)),
            },
        };

        let tx_block = tx
            .and_then(|tx| tx.block_number)
            .and_then(|hex| chain_clients_common::parse_hex_quantity(&hex));
        let tx_block = match tx_block {
            Some(block) => block as u64,
            // Unknown or still pending: zero depth, reconsidered next sweep.
            None => return Ok(0),
        };

        let current = match self.primary.block_number().await {
            Ok(current) => current,
            Err(primary_err) => match &self.fallback {
                Some(fallback) => fallback
                    .block_number()
                    .await
                    .map_err(|e| unavailable(self.network, e))?,
                None => return Err(unavailable(self.network, primary_err)),
            },
        };

        Ok(current.saturating_sub(tx_block))
    }
}
