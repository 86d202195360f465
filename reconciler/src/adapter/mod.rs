//! Network Adapter Module
//!
//! Adapters translate chain-native API responses into the common
//! [`CandidateTransaction`] shape the matching engine consumes. One
//! implementation exists per chain family (EVM covering Ethereum, BSC, and
//! Polygon; Hedera; Cosmos), selected through a registry keyed by
//! [`Network`], so
//! adding a network never grows a central switch.
//!
//! Every adapter call tries the primary endpoint and falls over to the
//! configured fallback for that single call; when both fail the call
//! returns [`Error::AdapterUnavailable`] so the sweep can skip the network
//! and keep the others progressing.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{Config, Network};
use crate::error::Error;

mod cosmos;
mod evm;
mod hedera;

pub use cosmos::CosmosAdapter;
pub use evm::EvmAdapter;
pub use hedera::HederaAdapter;

// ============================================================================
// COMMON CANDIDATE SHAPE
// ============================================================================

/// A transaction discovered on-chain, proposed as a possible match for a
/// pending intent. Consumed immediately by the matching engine, never
/// persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateTransaction {
    /// Transaction hash or ID in the chain's native format
    pub hash: String,
    /// Network the transaction was observed on
    pub network: Network,
    /// Paying address/account
    pub sender_address: String,
    /// Credited address/account
    pub recipient_address: String,
    /// Token contract/ID/denom; None for a native-currency transfer
    pub token_id: Option<String>,
    /// Amount in the chain's smallest units
    pub raw_amount: u128,
    /// Free-text memo, where the chain has one
    pub memo: Option<String>,
    /// Confirmation depth at observation time
    pub confirmations: u64,
    /// Unix timestamp the transaction was included at
    pub timestamp: u64,
}

// ============================================================================
// ADAPTER CONTRACT
// ============================================================================

/// Common contract implemented once per chain family.
#[async_trait]
pub trait NetworkAdapter: Send + Sync {
    /// The network this adapter instance serves.
    fn network(&self) -> Network;

    /// Finds transactions crediting `recipient` that could satisfy pending
    /// intents.
    ///
    /// # Arguments
    ///
    /// * `recipient` - Merchant address/account to search for
    /// * `token_id` - Token to filter on; None lists native transfers
    /// * `since` - Ignore transactions included before this unix timestamp
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<CandidateTransaction>)` - Candidates, possibly empty
    /// * `Err(Error::AdapterUnavailable)` - Both endpoints failed this call
    async fn find_candidates(
        &self,
        recipient: &str,
        token_id: Option<&str>,
        since: u64,
    ) -> Result<Vec<CandidateTransaction>, Error>;

    /// Current confirmation depth of a transaction.
    ///
    /// # Arguments
    ///
    /// * `hash` - Transaction hash/ID
    ///
    /// # Returns
    ///
    /// * `Ok(u64)` - Depth; 0 while pending or unknown
    /// * `Err(Error::AdapterUnavailable)` - Both endpoints failed this call
    async fn confirmation_depth(&self, hash: &str) -> Result<u64, Error>;
}

// ============================================================================
// ADAPTER REGISTRY
// ============================================================================

/// Holds one adapter per configured network.
pub struct AdapterRegistry {
    adapters: HashMap<Network, Arc<dyn NetworkAdapter>>,
}

impl AdapterRegistry {
    /// Builds adapters for every configured network.
    ///
    /// Construction validates the per-family configuration; a missing
    /// required field is a fatal [`Error::Config`] here, not a per-sweep
    /// failure.
    ///
    /// # Arguments
    ///
    /// * `config` - Validated service configuration
    ///
    /// # Returns
    ///
    /// * `Ok(AdapterRegistry)` - One adapter per configured network
    /// * `Err(Error::Config)` - Adapter construction failed
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let mut adapters: HashMap<Network, Arc<dyn NetworkAdapter>> = HashMap::new();
        let timeout = config.adapter_timeout();

        for network in config.configured_networks() {
            let adapter: Arc<dyn NetworkAdapter> = match network {
                Network::Ethereum | Network::Bsc | Network::Polygon => {
                    let evm = config.evm(network).expect("configured EVM network");
                    Arc::new(EvmAdapter::new(network, evm, timeout)?)
                }
                Network::Cosmos => {
                    let cosmos = config.networks.cosmos.as_ref().expect("configured cosmos");
                    Arc::new(CosmosAdapter::new(cosmos, timeout)?)
                }
                Network::Hedera => {
                    let hedera = config.networks.hedera.as_ref().expect("configured hedera");
                    Arc::new(HederaAdapter::new(hedera, timeout)?)
                }
            };
            adapters.insert(network, adapter);
        }

        Ok(Self { adapters })
    }

    /// The adapter for a network, if one is configured.
    pub fn get(&self, network: Network) -> Option<Arc<dyn NetworkAdapter>> {
        self.adapters.get(&network).cloned()
    }

    /// Networks with a configured adapter.
    pub fn networks(&self) -> Vec<Network> {
        let mut networks: Vec<Network> = self.adapters.keys().copied().collect();
        networks.sort_by_key(|n| Network::ALL.iter().position(|m| m == n));
        networks
    }
}

/// Maps a client-level failure to `AdapterUnavailable` for one network.
pub(crate) fn unavailable(network: Network, err: anyhow::Error) -> Error {
    Error::AdapterUnavailable {
        network,
        reason: format!("{:#}", err),
    }
}
