//! Configuration Management Module
//!
//! This module handles loading and managing configuration for the payment
//! reconciliation service: per-network endpoints (with fallbacks), merchant
//! addresses, token tables with decimal precision, confirmation depths, and
//! service-level settings (sweep interval, intent TTL, timeouts).
//!
//! Decimal precision is configuration, never hardcoded: USDT carries 6
//! decimals on Ethereum and Polygon but 18 on BSC, HBAR carries 8, ATOM 6.
//! Adapters and the matching engine look these up from the loaded config.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::warn;

use crate::error::Error;

// ============================================================================
// NETWORK IDENTIFIERS
// ============================================================================

/// Closed set of supported payment networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Ethereum,
    Bsc,
    Polygon,
    Cosmos,
    Hedera,
}

/// Chain family a network belongs to; each family has one adapter
/// implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainFamily {
    Evm,
    Cosmos,
    Hedera,
}

impl Network {
    /// All supported networks, in display order.
    pub const ALL: [Network; 5] = [
        Network::Ethereum,
        Network::Bsc,
        Network::Polygon,
        Network::Cosmos,
        Network::Hedera,
    ];

    /// The chain family this network belongs to.
    pub fn family(&self) -> ChainFamily {
        match self {
            Network::Ethereum | Network::Bsc | Network::Polygon => ChainFamily::Evm,
            Network::Cosmos => ChainFamily::Cosmos,
            Network::Hedera => ChainFamily::Hedera,
        }
    }

    /// Whether this network propagates a free-text memo the payment
    /// reference can be embedded in. Only Hedera does; EVM and Cosmos
    /// matches fall back to the (recipient, token, amount, time-window)
    /// tuple, a documented weaker guarantee.
    pub fn supports_memo_matching(&self) -> bool {
        matches!(self, Network::Hedera)
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Network::Ethereum => "ethereum",
            Network::Bsc => "bsc",
            Network::Polygon => "polygon",
            Network::Cosmos => "cosmos",
            Network::Hedera => "hedera",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Network {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ethereum" => Ok(Network::Ethereum),
            "bsc" => Ok(Network::Bsc),
            "polygon" => Ok(Network::Polygon),
            "cosmos" => Ok(Network::Cosmos),
            "hedera" => Ok(Network::Hedera),
            other => Err(Error::Config(format!("Unsupported network: {}", other))),
        }
    }
}

// ============================================================================
// CONFIGURATION STRUCTURES
// ============================================================================

/// Main configuration structure containing all service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Reconciliation scheduler settings
    #[serde(default)]
    pub reconciler: ReconcilerConfig,
    /// API server configuration (host, port, CORS settings)
    pub api: ApiConfig,
    /// Per-network configuration; unconfigured networks are not swept
    #[serde(default)]
    pub networks: NetworksConfig,
}

/// Scheduler and timeout settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcilerConfig {
    /// Seconds between reconciliation sweeps
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    /// Minutes a payment intent stays open before expiring
    #[serde(default = "default_intent_ttl_minutes")]
    pub intent_ttl_minutes: u64,
    /// Timeout for adapter HTTP calls in milliseconds
    #[serde(default = "default_adapter_timeout_ms")]
    pub adapter_timeout_ms: u64,
    /// Timeout for endpoint liveness probes in milliseconds
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
    /// Seconds a cached network-config snapshot stays valid
    #[serde(default = "default_config_cache_ttl_secs")]
    pub config_cache_ttl_secs: u64,
    /// Seconds between health-check rounds
    #[serde(default = "default_health_interval_secs")]
    pub health_interval_secs: u64,
}

fn default_sweep_interval_secs() -> u64 {
    45
}
fn default_intent_ttl_minutes() -> u64 {
    30
}
fn default_adapter_timeout_ms() -> u64 {
    10_000
}
fn default_probe_timeout_ms() -> u64 {
    5_000
}
fn default_config_cache_ttl_secs() -> u64 {
    300
}
fn default_health_interval_secs() -> u64 {
    300
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: default_sweep_interval_secs(),
            intent_ttl_minutes: default_intent_ttl_minutes(),
            adapter_timeout_ms: default_adapter_timeout_ms(),
            probe_timeout_ms: default_probe_timeout_ms(),
            config_cache_ttl_secs: default_config_cache_ttl_secs(),
            health_interval_secs: default_health_interval_secs(),
        }
    }
}

/// API server configuration for external communication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host address to bind the API server to
    pub host: String,
    /// Port number to bind the API server to
    pub port: u16,
    /// Allowed CORS origins for cross-origin requests
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

/// Per-network configuration sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworksConfig {
    #[serde(default)]
    pub ethereum: Option<EvmNetworkConfig>,
    #[serde(default)]
    pub bsc: Option<EvmNetworkConfig>,
    #[serde(default)]
    pub polygon: Option<EvmNetworkConfig>,
    #[serde(default)]
    pub cosmos: Option<CosmosNetworkConfig>,
    #[serde(default)]
    pub hedera: Option<HederaNetworkConfig>,
}

/// One payable token on a network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Currency symbol as presented to payers (e.g. "USDT")
    pub symbol: String,
    /// Chain-native token identifier: ERC-20 contract address, Hedera token
    /// ID ("0.0.456858"), or Cosmos denom
    pub id: String,
    /// Decimal places of the token's smallest unit
    pub decimals: u32,
}

/// Configuration for an EVM-compatible network (Ethereum, BSC, Polygon).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvmNetworkConfig {
    /// Human-readable name for the network
    pub name: String,
    /// EVM chain ID (1 for Ethereum, 56 for BSC, 137 for Polygon)
    pub chain_id: u64,
    /// JSON-RPC endpoint URL
    pub rpc_url: String,
    /// Fallback JSON-RPC endpoint, tried when the primary fails
    #[serde(default)]
    pub fallback_rpc: Option<String>,
    /// Block-explorer API base URL (e.g. "https://api.etherscan.io/api")
    pub explorer_url: String,
    /// Fallback explorer API base URL
    #[serde(default)]
    pub fallback_explorer: Option<String>,
    /// Explorer API key
    #[serde(default)]
    pub explorer_api_key: Option<String>,
    /// Merchant address payments are sent to
    pub merchant_address: String,
    /// Native currency symbol (ETH, BNB, MATIC)
    pub native_symbol: String,
    /// Native currency decimals (18 on all supported EVM networks)
    #[serde(default = "default_evm_decimals")]
    pub native_decimals: u32,
    /// Payable tokens on this network
    #[serde(default)]
    pub tokens: Vec<TokenConfig>,
    /// Blocks a transaction must be buried under before it counts as final
    pub required_confirmations: u64,
    /// Alert ceiling for the safe gas price, in Gwei
    pub max_gas_price_gwei: Decimal,
    /// Alert floor for the merchant's native balance, in human units
    pub min_merchant_balance: Decimal,
}

fn default_evm_decimals() -> u32 {
    18
}

/// Configuration for the Cosmos Hub network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CosmosNetworkConfig {
    /// Human-readable name for the network
    pub name: String,
    /// Chain ID string (e.g. "cosmoshub-4")
    pub chain_id: String,
    /// Tendermint RPC endpoint URL
    pub rpc_url: String,
    /// LCD (REST) endpoint URL; transaction queries go here
    pub rest_url: String,
    /// Fallback LCD endpoint
    #[serde(default)]
    pub fallback_rest: Option<String>,
    /// Merchant bech32 address payments are sent to
    pub merchant_address: String,
    /// Native currency symbol
    pub native_symbol: String,
    /// Native denom in smallest units (e.g. "uatom")
    pub native_denom: String,
    /// Native currency decimals (6 for ATOM)
    pub native_decimals: u32,
    /// Payable tokens (IBC denoms) on this network
    #[serde(default)]
    pub tokens: Vec<TokenConfig>,
    /// Blocks before a transaction counts as final
    pub required_confirmations: u64,
    /// Alert floor for the merchant's native balance, in human units
    pub min_merchant_balance: Decimal,
}

/// Configuration for the Hedera network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HederaNetworkConfig {
    /// Human-readable name for the network
    pub name: String,
    /// Hedera network name ("mainnet" or "testnet")
    pub network: String,
    /// Operator account ID used by the paying application
    pub operator_id: String,
    /// Merchant account ID payments are sent to
    pub merchant_account: String,
    /// Mirror node base URL
    pub mirror_node_url: String,
    /// Fallback mirror node base URL
    #[serde(default)]
    pub fallback_mirror: Option<String>,
    /// Native currency symbol
    pub native_symbol: String,
    /// Native currency decimals (8 for HBAR tinybars)
    pub native_decimals: u32,
    /// Payable HTS tokens on this network
    #[serde(default)]
    pub tokens: Vec<TokenConfig>,
    /// Mirror-node presence is final; kept configurable for symmetry
    #[serde(default = "default_hedera_confirmations")]
    pub required_confirmations: u64,
    /// Alert floor for the merchant's HBAR balance, in human units
    pub min_merchant_balance: Decimal,
}

fn default_hedera_confirmations() -> u64 {
    1
}

// ============================================================================
// CONFIGURATION LOADING AND VALIDATION
// ============================================================================

impl Config {
    /// Loads configuration from the TOML file.
    ///
    /// The path defaults to `config/reconciler.toml` and can be overridden
    /// with the `RECONCILER_CONFIG_PATH` environment variable (used by
    /// tests).
    ///
    /// # Returns
    ///
    /// * `Ok(Config)` - Successfully loaded and validated configuration
    /// * `Err(anyhow::Error)` - Missing file, parse error, or invalid config
    pub fn load() -> anyhow::Result<Self> {
        let config_path = std::env::var("RECONCILER_CONFIG_PATH")
            .unwrap_or_else(|_| "config/reconciler.toml".to_string());

        if !std::path::Path::new(&config_path).exists() {
            return Err(anyhow::anyhow!(
                "Configuration file '{}' not found. Please copy the template:\n\
                cp config/reconciler.template.toml config/reconciler.toml\n\
                Then edit config/reconciler.toml with your actual values.",
                config_path
            ));
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Creates a default configuration with no networks configured.
    ///
    /// Suitable as a base for tests, which add the network sections they
    /// exercise.
    pub fn default() -> Self {
        Self {
            reconciler: ReconcilerConfig::default(),
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 3344,
                cors_origins: vec!["http://localhost:3344".to_string()],
            },
            networks: NetworksConfig::default(),
        }
    }

    /// Validates required fields for every configured network.
    ///
    /// Requirements per family: EVM networks need RPC + explorer URLs, a
    /// merchant address, and gas limits; Cosmos needs RPC + REST + chain ID
    /// + merchant address; Hedera needs operator/merchant accounts and a
    /// mirror node. Missing fields are fatal at load time, never per sweep.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - All configured networks are complete
    /// * `Err(Error::Config)` - First missing field found
    pub fn validate(&self) -> Result<(), Error> {
        for network in self.configured_networks() {
            match network.family() {
                ChainFamily::Evm => {
                    let evm = self.evm(network).expect("configured EVM network");
                    require(network, "rpc_url", &evm.rpc_url)?;
                    require(network, "explorer_url", &evm.explorer_url)?;
                    require(network, "merchant_address", &evm.merchant_address)?;
                    require(network, "native_symbol", &evm.native_symbol)?;
                    for token in &evm.tokens {
                        require(network, "token id", &token.id)?;
                    }
                }
                ChainFamily::Cosmos => {
                    let cosmos = self.networks.cosmos.as_ref().expect("configured cosmos");
                    require(network, "rpc_url", &cosmos.rpc_url)?;
                    require(network, "rest_url", &cosmos.rest_url)?;
                    require(network, "chain_id", &cosmos.chain_id)?;
                    require(network, "merchant_address", &cosmos.merchant_address)?;
                    require(network, "native_denom", &cosmos.native_denom)?;
                }
                ChainFamily::Hedera => {
                    let hedera = self.networks.hedera.as_ref().expect("configured hedera");
                    require(network, "network", &hedera.network)?;
                    require(network, "operator_id", &hedera.operator_id)?;
                    require(network, "merchant_account", &hedera.merchant_account)?;
                    require(network, "mirror_node_url", &hedera.mirror_node_url)?;
                    for token in &hedera.tokens {
                        require(network, "token id", &token.id)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Networks present in the configuration, in canonical order.
    pub fn configured_networks(&self) -> Vec<Network> {
        let mut networks = Vec::new();
        for network in Network::ALL {
            let configured = match network {
                Network::Ethereum => self.networks.ethereum.is_some(),
                Network::Bsc => self.networks.bsc.is_some(),
                Network::Polygon => self.networks.polygon.is_some(),
                Network::Cosmos => self.networks.cosmos.is_some(),
                Network::Hedera => self.networks.hedera.is_some(),
            };
            if configured {
                networks.push(network);
            }
        }
        networks
    }

    /// EVM section for a network, if it is an EVM network and configured.
    pub fn evm(&self, network: Network) -> Option<&EvmNetworkConfig> {
        match network {
            Network::Ethereum => self.networks.ethereum.as_ref(),
            Network::Bsc => self.networks.bsc.as_ref(),
            Network::Polygon => self.networks.polygon.as_ref(),
            _ => None,
        }
    }

    /// Intent TTL as a Duration.
    pub fn intent_ttl(&self) -> Duration {
        Duration::from_secs(self.reconciler.intent_ttl_minutes * 60)
    }

    /// Adapter call timeout as a Duration.
    pub fn adapter_timeout(&self) -> Duration {
        Duration::from_millis(self.reconciler.adapter_timeout_ms)
    }
}

fn require(network: Network, field: &str, value: &str) -> Result<(), Error> {
    if value.trim().is_empty() {
        return Err(Error::Config(format!(
            "{}: missing required field '{}'",
            network, field
        )));
    }
    Ok(())
}

// ============================================================================
// RUNTIME NETWORK SNAPSHOTS
// ============================================================================

/// Resolved token identity: on-chain ID and decimal precision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    /// Contract address / token ID / denom; None for the native currency
    pub id: Option<String>,
    /// Decimal places
    pub decimals: u32,
}

/// Cached per-network view handed to the matching engine and intent
/// creation. Rebuilt from the source-of-truth [`Config`] when the cache TTL
/// lapses or after an explicit invalidation.
#[derive(Debug, Clone)]
pub struct NetworkSnapshot {
    pub network: Network,
    /// Address payments must arrive at
    pub merchant_address: String,
    /// Confirmation depth required before a candidate counts as final
    pub required_confirmations: u64,
    /// Native currency symbol
    pub native_symbol: String,
    /// Native currency decimals
    pub native_decimals: u32,
    /// Payable tokens keyed by uppercase symbol
    pub tokens: HashMap<String, TokenInfo>,
    /// Whether the network carries the payment reference in a memo
    pub memo_matching: bool,
    /// Gas price alert ceiling in Gwei (EVM networks only)
    pub gas_ceiling_gwei: Option<Decimal>,
    /// Merchant balance alert floor in human units
    pub min_merchant_balance: Decimal,
}

impl NetworkSnapshot {
    /// Resolves a currency symbol to its token identity on this network.
    ///
    /// The native symbol resolves to `TokenInfo { id: None, .. }`; any other
    /// symbol must appear in the token table.
    ///
    /// # Arguments
    ///
    /// * `currency` - Currency symbol (case-insensitive)
    ///
    /// # Returns
    ///
    /// * `Ok(TokenInfo)` - Resolved identity
    /// * `Err(Error::Config)` - Currency not payable on this network
    pub fn currency(&self, currency: &str) -> Result<TokenInfo, Error> {
        let symbol = currency.to_uppercase();
        if symbol == self.native_symbol.to_uppercase() {
            return Ok(TokenInfo {
                id: None,
                decimals: self.native_decimals,
            });
        }
        self.tokens.get(&symbol).cloned().ok_or_else(|| {
            Error::Config(format!(
                "Currency {} is not payable on {}",
                currency, self.network
            ))
        })
    }
}

struct CachedSnapshot {
    snapshot: Arc<NetworkSnapshot>,
    refreshed_at: Instant,
}

/// Serves cached [`NetworkSnapshot`]s and endpoint selection with liveness
/// fallback.
///
/// Fallback endpoints are promoted for a single lookup only; the snapshot
/// cache never records a fallback as the new primary.
pub struct ConfigService {
    config: Arc<Config>,
    ttl: Duration,
    cache: RwLock<HashMap<Network, CachedSnapshot>>,
    probe_client: reqwest::Client,
}

impl ConfigService {
    /// Creates a config service over a loaded configuration.
    ///
    /// # Arguments
    ///
    /// * `config` - Validated service configuration
    ///
    /// # Returns
    ///
    /// * `Ok(ConfigService)` - Ready to serve snapshots
    /// * `Err(Error::Config)` - Probe HTTP client could not be built
    pub fn new(config: Arc<Config>) -> Result<Self, Error> {
        let probe_client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.reconciler.probe_timeout_ms))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create probe client: {}", e)))?;

        Ok(Self {
            ttl: Duration::from_secs(config.reconciler.config_cache_ttl_secs),
            config,
            cache: RwLock::new(HashMap::new()),
            probe_client,
        })
    }

    /// The underlying source-of-truth configuration.
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// Returns the snapshot for a network, rebuilding it when the cached
    /// copy is older than the TTL.
    ///
    /// # Arguments
    ///
    /// * `network` - Network to resolve
    ///
    /// # Returns
    ///
    /// * `Ok(Arc<NetworkSnapshot>)` - Cached or freshly built snapshot
    /// * `Err(Error::Config)` - Network not configured
    pub async fn network_config(&self, network: Network) -> Result<Arc<NetworkSnapshot>, Error> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.get(&network) {
                if cached.refreshed_at.elapsed() < self.ttl {
                    return Ok(Arc::clone(&cached.snapshot));
                }
            }
        }

        let snapshot = Arc::new(self.build_snapshot(network)?);
        let mut cache = self.cache.write().await;
        cache.insert(
            network,
            CachedSnapshot {
                snapshot: Arc::clone(&snapshot),
                refreshed_at: Instant::now(),
            },
        );
        Ok(snapshot)
    }

    /// Drops the cached snapshot for a network so the next lookup rebuilds
    /// it. Called after endpoint failures.
    pub async fn invalidate(&self, network: Network) {
        let mut cache = self.cache.write().await;
        cache.remove(&network);
    }

    /// Selects a live RPC/REST endpoint for a network.
    ///
    /// Probes the primary endpoint first; when it fails the probe, the
    /// configured fallback is probed and returned for this lookup only,
    /// with a warning logged.
    ///
    /// # Arguments
    ///
    /// * `network` - Network to select an endpoint for
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - A responding endpoint URL
    /// * `Err(Error::AdapterUnavailable)` - Neither endpoint responded
    /// * `Err(Error::Config)` - Network not configured
    pub async fn rpc_url(&self, network: Network) -> Result<String, Error> {
        let (primary, fallback) = self.endpoints(network)?;

        if self.probe(network, &primary).await {
            return Ok(primary);
        }
        if let Some(fallback) = fallback {
            if self.probe(network, &fallback).await {
                warn!("Using fallback endpoint for {}", network);
                return Ok(fallback);
            }
        }
        Err(Error::AdapterUnavailable {
            network,
            reason: "no available RPC endpoint".to_string(),
        })
    }

    fn endpoints(&self, network: Network) -> Result<(String, Option<String>), Error> {
        match network.family() {
            ChainFamily::Evm => {
                let evm = self
                    .config
                    .evm(network)
                    .ok_or_else(|| not_configured(network))?;
                Ok((evm.rpc_url.clone(), evm.fallback_rpc.clone()))
            }
            ChainFamily::Cosmos => {
                let cosmos = self
                    .config
                    .networks
                    .cosmos
                    .as_ref()
                    .ok_or_else(|| not_configured(network))?;
                Ok((cosmos.rest_url.clone(), cosmos.fallback_rest.clone()))
            }
            ChainFamily::Hedera => {
                let hedera = self
                    .config
                    .networks
                    .hedera
                    .as_ref()
                    .ok_or_else(|| not_configured(network))?;
                Ok((hedera.mirror_node_url.clone(), hedera.fallback_mirror.clone()))
            }
        }
    }

    /// Lightweight liveness probe: JSON-RPC `net_version` for EVM
    /// endpoints, a cheap GET for REST endpoints.
    async fn probe(&self, network: Network, url: &str) -> bool {
        let result = match network.family() {
            ChainFamily::Evm => {
                self.probe_client
                    .post(url)
                    .json(&serde_json::json!({
                        "jsonrpc": "2.0",
                        "method": "net_version",
                        "params": [],
                        "id": 1
                    }))
                    .send()
                    .await
            }
            ChainFamily::Cosmos => {
                let probe_url =
                    format!("{}/cosmos/base/tendermint/v1beta1/syncing", url.trim_end_matches('/'));
                self.probe_client.get(&probe_url).send().await
            }
            ChainFamily::Hedera => {
                let probe_url =
                    format!("{}/api/v1/network/nodes?limit=1", url.trim_end_matches('/'));
                self.probe_client.get(&probe_url).send().await
            }
        };
        match result {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    fn build_snapshot(&self, network: Network) -> Result<NetworkSnapshot, Error> {
        match network.family() {
            ChainFamily::Evm => {
                let evm = self
                    .config
                    .evm(network)
                    .ok_or_else(|| not_configured(network))?;
                Ok(NetworkSnapshot {
                    network,
                    merchant_address: evm.merchant_address.clone(),
                    required_confirmations: evm.required_confirmations,
                    native_symbol: evm.native_symbol.clone(),
                    native_decimals: evm.native_decimals,
                    tokens: token_table(&evm.tokens),
                    memo_matching: network.supports_memo_matching(),
                    gas_ceiling_gwei: Some(evm.max_gas_price_gwei),
                    min_merchant_balance: evm.min_merchant_balance,
                })
            }
            ChainFamily::Cosmos => {
                let cosmos = self
                    .config
                    .networks
                    .cosmos
                    .as_ref()
                    .ok_or_else(|| not_configured(network))?;
                Ok(NetworkSnapshot {
                    network,
                    merchant_address: cosmos.merchant_address.clone(),
                    required_confirmations: cosmos.required_confirmations,
                    native_symbol: cosmos.native_symbol.clone(),
                    native_decimals: cosmos.native_decimals,
                    tokens: token_table(&cosmos.tokens),
                    memo_matching: network.supports_memo_matching(),
                    gas_ceiling_gwei: None,
                    min_merchant_balance: cosmos.min_merchant_balance,
                })
            }
            ChainFamily::Hedera => {
                let hedera = self
                    .config
                    .networks
                    .hedera
                    .as_ref()
                    .ok_or_else(|| not_configured(network))?;
                Ok(NetworkSnapshot {
                    network,
                    merchant_address: hedera.merchant_account.clone(),
                    required_confirmations: hedera.required_confirmations,
                    native_symbol: hedera.native_symbol.clone(),
                    native_decimals: hedera.native_decimals,
                    tokens: token_table(&hedera.tokens),
                    memo_matching: network.supports_memo_matching(),
                    gas_ceiling_gwei: None,
                    min_merchant_balance: hedera.min_merchant_balance,
                })
            }
        }
    }
}

fn not_configured(network: Network) -> Error {
    Error::Config(format!("Network {} is not configured", network))
}

fn token_table(tokens: &[TokenConfig]) -> HashMap<String, TokenInfo> {
    tokens
        .iter()
        .map(|token| {
            (
                token.symbol.to_uppercase(),
                TokenInfo {
                    id: Some(token.id.clone()),
                    decimals: token.decimals,
                },
            )
        })
        .collect()
}
