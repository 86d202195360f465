//! Cosmos adapter
//!
//! Candidates come from an LCD transaction search on the transfer
//! recipient. Only transactions with `tx_response.code == 0` transferred
//! funds; amounts inside `MsgSend` messages are in smallest units (uatom
//! for the native currency). Confirmation depth is the distance between the
//! latest block height and the transaction's inclusion height.

use chain_clients_cosmos::{CosmosLcdClient, CosmosTx};
use std::time::Duration;
use tracing::warn;

use super::{unavailable, CandidateTransaction, NetworkAdapter};
use crate::config::{CosmosNetworkConfig, Network};
use crate::error::Error;

/// Adapter for the Cosmos Hub network.
pub struct CosmosAdapter {
    primary: CosmosLcdClient,
    fallback: Option<CosmosLcdClient>,
    /// Native denom in smallest units (e.g. "uatom"); the denom a native
    /// intent matches on
    native_denom: String,
}

impl CosmosAdapter {
    /// Creates an adapter from the network's configuration.
    ///
    /// # Arguments
    ///
    /// * `config` - Cosmos configuration section
    /// * `timeout` - Per-request timeout
    ///
    /// # Returns
    ///
    /// * `Ok(CosmosAdapter)` - Ready adapter
    /// * `Err(Error::Config)` - HTTP client construction failed
    pub fn new(config: &CosmosNetworkConfig, timeout: Duration) -> Result<Self, Error> {
        let primary = CosmosLcdClient::new(&config.rest_url, timeout)
            .map_err(|e| Error::Config(format!("cosmos: {}", e)))?;
        let fallback = config
            .fallback_rest
            .as_deref()
            .map(|url| CosmosLcdClient::new(url, timeout))
            .transpose()
            .map_err(|e| Error::Config(format!("cosmos: {}", e)))?;

        Ok(Self {
            primary,
            fallback,
            native_denom: config.native_denom.clone(),
        })
    }

    async fn search(&self, recipient: &str) -> Result<Vec<CosmosTx>, Error> {
        match self.primary.txs_by_recipient(recipient, 50).await {
            Ok(txs) => Ok(txs),
            Err(primary_err) => match &self.fallback {
                Some(fallback) => {
                    warn!(
                        "cosmos primary LCD failed ({:#}), using fallback",
                        primary_err
                    );
                    fallback
                        .txs_by_recipient(recipient, 50)
                        .await
                        .map_err(|e| unavailable(Network::Cosmos, e))
                }
                None => Err(unavailable(Network::Cosmos, primary_err)),
            },
        }
    }

    async fn height(&self) -> Result<u64, Error> {
        match self.primary.latest_height().await {
            Ok(height) => Ok(height),
            Err(primary_err) => match &self.fallback {
                Some(fallback) => fallback
                    .latest_height()
                    .await
                    .map_err(|e| unavailable(Network::Cosmos, e)),
                None => Err(unavailable(Network::Cosmos, primary_err)),
            },
        }
    }

    /// Builds one candidate per send crediting the recipient in the
    /// requested denom.
    fn candidates_from(
        &self,
        tx: &CosmosTx,
        recipient: &str,
        denom: &str,
        latest_height: u64,
    ) -> Vec<CandidateTransaction> {
        let mut candidates = Vec::new();
        for send in &tx.sends {
            if send.to_address != recipient {
                continue;
            }
            let raw_amount: u128 = send
                .amounts
                .iter()
                .filter(|coin| coin.denom == denom)
                .filter_map(|coin| coin.amount.parse::<u128>().ok())
                .sum();
            if raw_amount == 0 {
                continue;
            }
            candidates.push(CandidateTransaction {
                hash: tx.hash.clone(),
                network: Network::Cosmos,
                sender_address: send.from_address.clone(),
                recipient_address: recipient.to_string(),
                token_id: (denom != self.native_denom).then(|| denom.to_string()),
                raw_amount,
                memo: tx.memo.clone(),
                confirmations: latest_height.saturating_sub(tx.height),
                timestamp: tx.timestamp,
            });
        }
        candidates
    }
}

#[async_trait::async_trait]
impl NetworkAdapter for CosmosAdapter {
    fn network(&self) -> Network {
        Network::Cosmos
    }

    async fn find_candidates(
        &self,
        recipient: &str,
        token_id: Option<&str>,
        since: u64,
    ) -> Result<Vec<CandidateTransaction>, Error> {
        let denom = token_id.unwrap_or(&self.native_denom).to_string();
        let transactions = self.search(recipient).await?;
        let latest_height = self.height().await?;

        Ok(transactions
            .iter()
            .filter(|tx| tx.code == 0)
            .filter(|tx| tx.timestamp >= since)
            .flat_map(|tx| self.candidates_from(tx, recipient, &denom, latest_height))
            .collect())
    }

    async fn confirmation_depth(&self, hash: &str) -> Result<u64, Error> {
        let tx = match self.primary.tx_by_hash(hash).await {
            Ok(tx) => tx,
            Err(primary_err) => match &self.fallback {
                Some(fallback) => fallback
                    .tx_by_hash(hash)
                    .await
                    .map_err(|e| unavailable(Network::Cosmos, e))?,
                None => return Err(unavailable(Network::Cosmos, primary_err)),
            },
        };
        let tx = match tx {
            Some(tx) => tx,
            None => return Ok(0),
        };
        let latest_height = self.height().await?;
        Ok(latest_height.saturating_sub(tx.height))
    }
}
