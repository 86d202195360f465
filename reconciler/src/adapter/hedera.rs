//! Hedera adapter
//!
//! Candidates come from the mirror node's transaction listing for the
//! merchant account. The mirror node only reports transactions that reached
//! consensus, so presence is already final: every candidate carries a
//! confirmation depth of 1 and the network's required depth is 1.
//!
//! Memos are decoded from `memo_base64` and carried on the candidate; the
//! matching engine checks them for the intent reference.

use chain_clients_hedera::{HederaMirrorClient, MirrorTransaction};
use std::time::Duration;
use tracing::warn;

use super::{unavailable, CandidateTransaction, NetworkAdapter};
use crate::config::{HederaNetworkConfig, Network};
use crate::error::Error;

/// Adapter for the Hedera network.
pub struct HederaAdapter {
    primary: HederaMirrorClient,
    fallback: Option<HederaMirrorClient>,
}

impl HederaAdapter {
    /// Creates an adapter from the network's configuration.
    ///
    /// # Arguments
    ///
    /// * `config` - Hedera configuration section
    /// * `timeout` - Per-request timeout
    ///
    /// # Returns
    ///
    /// * `Ok(HederaAdapter)` - Ready adapter
    /// * `Err(Error::Config)` - HTTP client construction failed
    pub fn new(config: &HederaNetworkConfig, timeout: Duration) -> Result<Self, Error> {
        let primary = HederaMirrorClient::new(&config.mirror_node_url, timeout)
            .map_err(|e| Error::Config(format!("hedera: {}", e)))?;
        let fallback = config
            .fallback_mirror
            .as_deref()
            .map(|url| HederaMirrorClient::new(url, timeout))
            .transpose()
            .map_err(|e| Error::Config(format!("hedera: {}", e)))?;

        Ok(Self { primary, fallback })
    }

    async fn list_transactions(
        &self,
        recipient: &str,
        since: u64,
    ) -> Result<Vec<MirrorTransaction>, Error> {
        let since = (since > 0).then_some(since);
        match self.primary.account_transactions(recipient, since, 100).await {
            Ok(txs) => Ok(txs),
            Err(primary_err) => match &self.fallback {
                Some(fallback) => {
                    warn!(
                        "hedera primary mirror failed ({:#}), using fallback",
                        primary_err
                    );
                    fallback
                        .account_transactions(recipient, since, 100)
                        .await
                        .map_err(|e| unavailable(Network::Hedera, e))
                }
                None => Err(unavailable(Network::Hedera, primary_err)),
            },
        }
    }

    /// Builds a candidate from the transfer legs crediting the recipient.
    ///
    /// A CRYPTOTRANSFER includes fee legs; the candidate amount is the sum
    /// of positive legs to the recipient (token legs when a token is
    /// requested, HBAR legs otherwise), and the sender is the account with
    /// the largest debit.
    fn candidate_from(
        tx: &MirrorTransaction,
        recipient: &str,
        token_id: Option<&str>,
    ) -> Option<CandidateTransaction> {
        let (credited, sender, token) = match token_id {
            Some(token_id) => {
                let credited: i64 = tx
                    .token_transfers
                    .iter()
                    .filter(|t| t.token_id == token_id && t.account == recipient && t.amount > 0)
                    .map(|t| t.amount)
                    .sum();
                let sender = tx
                    .token_transfers
                    .iter()
                    .filter(|t| t.token_id == token_id && t.amount < 0)
                    .min_by_key(|t| t.amount)
                    .map(|t| t.account.clone());
                (credited, sender, Some(token_id.to_string()))
            }
            None => {
                let credited: i64 = tx
                    .transfers
                    .iter()
                    .filter(|t| t.account == recipient && t.amount > 0)
                    .map(|t| t.amount)
                    .sum();
                let sender = tx
                    .transfers
                    .iter()
                    .filter(|t| t.amount < 0)
                    .min_by_key(|t| t.amount)
                    .map(|t| t.account.clone());
                (credited, sender, None)
            }
        };

        if credited <= 0 {
            return None;
        }

        Some(CandidateTransaction {
            hash: tx.transaction_id.clone(),
            network: Network::Hedera,
            sender_address: sender.unwrap_or_default(),
            recipient_address: recipient.to_string(),
            token_id: token,
            raw_amount: credited as u128,
            memo: tx.memo(),
            confirmations: 1,
            timestamp: tx.consensus_seconds(),
        })
    }
}

#[async_trait::async_trait]
impl NetworkAdapter for HederaAdapter {
    fn network(&self) -> Network {
        Network::Hedera
    }

    async fn find_candidates(
        &self,
        recipient: &str,
        token_id: Option<&str>,
        since: u64,
    ) -> Result<Vec<CandidateTransaction>, Error> {
        let transactions = self.list_transactions(recipient, since).await?;
        Ok(transactions
            .iter()
            .filter(|tx| tx.result == "SUCCESS")
            .filter_map(|tx| Self::candidate_from(tx, recipient, token_id))
            .collect())
    }

    async fn confirmation_depth(&self, hash: &str) -> Result<u64, Error> {
        let tx = match self.primary.transaction_by_id(hash).await {
            Ok(tx) => tx,
            Err(primary_err) => match &self.fallback {
                Some(fallback) => fallback
                    .transaction_by_id(hash)
                    .await
                    .map_err(|e| unavailable(Network::Hedera, e))?,
                None => return Err(unavailable(Network::Hedera, primary_err)),
            },
        };
        // Present on the mirror node means consensus was reached.
        Ok(if tx.is_some() { 1 } else { 0 })
    }
}
