//! Health Monitoring Module
//!
//! Periodic per-network health checks: endpoint liveness, chain-stall
//! detection on EVM networks, gas price against the configured ceiling, and
//! merchant balance against the configured floor. Unhealthy networks emit
//! structured [`HealthAlert`] events on a channel consumed by an external
//! alerting collaborator once a failure streak is reached; the core never
//! formats emails or UI.

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch, RwLock};
use tracing::{error, info, warn};

use chain_clients_cosmos::CosmosLcdClient;
use chain_clients_evm::EvmScanClient;
use chain_clients_hedera::HederaMirrorClient;

use crate::config::{ChainFamily, ConfigService, Network};
use crate::registry::current_timestamp;
use crate::units;

/// Consecutive unhealthy rounds before alerts are emitted.
const ALERT_THRESHOLD: u32 = 3;

/// Rounds an EVM block number may stay unchanged before the chain counts
/// as stalled.
const STALL_ROUNDS: u32 = 2;

// ============================================================================
// REPORT AND ALERT SHAPES
// ============================================================================

/// Kinds of structured alerts the core emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// Endpoint unreachable or erroring
    NetworkDown,
    /// Gas price above the configured ceiling
    GasPriceAboveCeiling,
    /// Merchant balance below the configured floor
    BalanceBelowMinimum,
    /// No new blocks observed across consecutive rounds
    ChainStalled,
}

/// Structured alert event for the external alerting collaborator.
#[derive(Debug, Clone, Serialize)]
pub struct HealthAlert {
    pub network: Network,
    pub kind: AlertKind,
    pub message: String,
    pub timestamp: u64,
}

/// One problem found during a check round.
#[derive(Debug, Clone, Serialize)]
pub struct HealthIssue {
    pub kind: AlertKind,
    pub message: String,
}

/// Health of one network at one check round.
#[derive(Debug, Clone, Serialize)]
pub struct NetworkHealth {
    pub network: Network,
    pub healthy: bool,
    pub issues: Vec<HealthIssue>,
    pub checked_at: u64,
}

// ============================================================================
// HEALTH SERVICE IMPLEMENTATION
// ============================================================================

/// Periodic health checker for every configured network.
pub struct HealthService {
    config_service: Arc<ConfigService>,
    alerts: mpsc::Sender<HealthAlert>,
    /// Latest report, shared with the API's /health endpoint
    latest: Arc<RwLock<Vec<NetworkHealth>>>,
    /// Consecutive-failure counters per network
    failure_streaks: RwLock<HashMap<Network, u32>>,
    /// Last observed EVM block and how many rounds it has been unchanged
    last_blocks: RwLock<HashMap<Network, (u64, u32)>>,
    timeout: Duration,
}

impl HealthService {
    /// Creates a health service.
    ///
    /// # Arguments
    ///
    /// * `config_service` - Network configuration provider
    /// * `alerts` - Channel the alerting collaborator consumes
    pub fn new(config_service: Arc<ConfigService>, alerts: mpsc::Sender<HealthAlert>) -> Self {
        let timeout =
            Duration::from_millis(config_service.config().reconciler.probe_timeout_ms);
        Self {
            config_service,
            alerts,
            latest: Arc::new(RwLock::new(Vec::new())),
            failure_streaks: RwLock::new(HashMap::new()),
            last_blocks: RwLock::new(HashMap::new()),
            timeout,
        }
    }

    /// Handle to the latest report, for the API layer.
    pub fn latest_report(&self) -> Arc<RwLock<Vec<NetworkHealth>>> {
        Arc::clone(&self.latest)
    }

    /// Runs health rounds until shutdown is signalled.
    ///
    /// # Arguments
    ///
    /// * `shutdown` - Flips to true when the service is stopping
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let interval = Duration::from_secs(
            self.config_service.config().reconciler.health_interval_secs,
        );
        info!("Starting health checks every {:?}", interval);
        loop {
            let report = self.run_health_check().await;
            *self.latest.write().await = report;

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("Shutdown signalled, stopping health checks");
                        return;
                    }
                }
            }
        }
    }

    /// Runs one health round over every configured network.
    pub async fn run_health_check(&self) -> Vec<NetworkHealth> {
        let mut report = Vec::new();
        for network in self.config_service.config().configured_networks() {
            let health = self.check_network(network).await;
            if !health.healthy {
                self.process_unhealthy(&health).await;
            } else {
                self.failure_streaks.write().await.remove(&network);
            }
            report.push(health);
        }
        report
    }

    /// Checks one network: liveness plus family-specific checks.
    pub async fn check_network(&self, network: Network) -> NetworkHealth {
        let issues = match network.family() {
            ChainFamily::Evm => self.check_evm(network).await,
            ChainFamily::Cosmos => self.check_cosmos().await,
            ChainFamily::Hedera => self.check_hedera().await,
        };
        let issues: Vec<HealthIssue> = issues
            .into_iter()
            .map(|(kind, message)| HealthIssue { kind, message })
            .collect();
        NetworkHealth {
            network,
            healthy: issues.is_empty(),
            issues,
            checked_at: current_timestamp(),
        }
    }

    // ------------------------------------------------------------------
    // family checks
    // ------------------------------------------------------------------

    async fn check_evm(&self, network: Network) -> Vec<(AlertKind, String)> {
        let mut issues = Vec::new();
        let config = self.config_service.config();
        let evm = match config.evm(network) {
            Some(evm) => evm,
            None => return issues,
        };

        // Endpoint selection probes the primary and promotes the fallback
        // for this round only.
        let rpc_url = match self.config_service.rpc_url(network).await {
            Ok(url) => url,
            Err(e) => {
                issues.push((AlertKind::NetworkDown, e.to_string()));
                return issues;
            }
        };

        let client = match EvmScanClient::new(
            &evm.explorer_url,
            &rpc_url,
            evm.explorer_api_key.as_deref(),
            self.timeout,
        ) {
            Ok(client) => client,
            Err(e) => {
                issues.push((AlertKind::NetworkDown, format!("{}: {}", network, e)));
                return issues;
            }
        };

        // Liveness + stall detection through the block number.
        match client.block_number().await {
            Ok(block) => {
                let mut last_blocks = self.last_blocks.write().await;
                let entry = last_blocks.entry(network).or_insert((block, 0));
                if entry.0 == block {
                    entry.1 += 1;
                    if entry.1 >= STALL_ROUNDS {
                        issues.push((
                            AlertKind::ChainStalled,
                            format!("{} chain might be stalled at block {}", network, block),
                        ));
                    }
                } else {
                    *entry = (block, 0);
                }
            }
            Err(e) => {
                issues.push((
                    AlertKind::NetworkDown,
                    format!("{} RPC connection failed: {:#}", network, e),
                ));
            }
        }

        // Gas price against the ceiling.
        match client.gas_oracle().await {
            Ok(oracle) => {
                if let Ok(safe) = Decimal::from_str(&oracle.safe_gas_price) {
                    if safe > evm.max_gas_price_gwei {
                        issues.push((
                            AlertKind::GasPriceAboveCeiling,
                            format!(
                                "{} gas price ({} Gwei) exceeds threshold ({} Gwei)",
                                network, safe, evm.max_gas_price_gwei
                            ),
                        ));
                    }
                }
            }
            Err(e) => {
                warn!("{} gas price check failed: {:#}", network, e);
            }
        }

        // Merchant balance against the floor.
        match client.address_balance(&evm.merchant_address).await {
            Ok(raw) => {
                if let Some(balance) = units::from_raw(raw, evm.native_decimals) {
                    if balance < evm.min_merchant_balance {
                        issues.push((
                            AlertKind::BalanceBelowMinimum,
                            format!(
                                "{} merchant balance ({} {}) below minimum ({})",
                                network, balance, evm.native_symbol, evm.min_merchant_balance
                            ),
                        ));
                    }
                }
            }
            Err(e) => {
                warn!("{} balance check failed: {:#}", network, e);
            }
        }

        issues
    }

    async fn check_cosmos(&self) -> Vec<(AlertKind, String)> {
        let mut issues = Vec::new();
        let config = self.config_service.config();
        let cosmos = match config.networks.cosmos.as_ref() {
            Some(cosmos) => cosmos,
            None => return issues,
        };
        let client = match CosmosLcdClient::new(&cosmos.rest_url, self.timeout) {
            Ok(client) => client,
            Err(e) => {
                issues.push((AlertKind::NetworkDown, format!("cosmos: {}", e)));
                return issues;
            }
        };

        match client.syncing().await {
            Ok(true) => {
                issues.push((
                    AlertKind::NetworkDown,
                    "cosmos node is still syncing".to_string(),
                ));
            }
            Ok(false) => {}
            Err(e) => {
                issues.push((
                    AlertKind::NetworkDown,
                    format!("cosmos REST API unavailable: {:#}", e),
                ));
            }
        }

        match client
            .balance(&cosmos.merchant_address, &cosmos.native_denom)
            .await
        {
            Ok(raw) => {
                if let Some(balance) = units::from_raw(raw, cosmos.native_decimals) {
                    if balance < cosmos.min_merchant_balance {
                        issues.push((
                            AlertKind::BalanceBelowMinimum,
                            format!(
                                "cosmos merchant balance ({} {}) below minimum ({})",
                                balance, cosmos.native_symbol, cosmos.min_merchant_balance
                            ),
                        ));
                    }
                }
            }
            Err(e) => {
                warn!("cosmos balance check failed: {:#}", e);
            }
        }

        issues
    }

    async fn check_hedera(&self) -> Vec<(AlertKind, String)> {
        let mut issues = Vec::new();
        let config = self.config_service.config();
        let hedera = match config.networks.hedera.as_ref() {
            Some(hedera) => hedera,
            None => return issues,
        };
        let client = match HederaMirrorClient::new(&hedera.mirror_node_url, self.timeout) {
            Ok(client) => client,
            Err(e) => {
                issues.push((AlertKind::NetworkDown, format!("hedera: {}", e)));
                return issues;
            }
        };

        if let Err(e) = client.ping().await {
            issues.push((
                AlertKind::NetworkDown,
                format!("hedera mirror node unavailable: {:#}", e),
            ));
        }

        match client.account_balance(&hedera.merchant_account).await {
            Ok(raw) => {
                if let Some(balance) = units::from_raw(raw as u128, hedera.native_decimals) {
                    if balance < hedera.min_merchant_balance {
                        issues.push((
                            AlertKind::BalanceBelowMinimum,
                            format!(
                                "hedera merchant balance ({} {}) below minimum ({})",
                                balance, hedera.native_symbol, hedera.min_merchant_balance
                            ),
                        ));
                    }
                }
            }
            Err(e) => {
                warn!("hedera balance check failed: {:#}", e);
            }
        }

        issues
    }

    // ------------------------------------------------------------------
    // alerting
    // ------------------------------------------------------------------

    /// Counts a failure round; at the streak threshold, emits one alert per
    /// issue and resets the counter.
    async fn process_unhealthy(&self, health: &NetworkHealth) {
        let streak = {
            let mut streaks = self.failure_streaks.write().await;
            let streak = streaks.entry(health.network).or_insert(0);
            *streak += 1;
            *streak
        };
        if streak < ALERT_THRESHOLD {
            return;
        }
        self.failure_streaks.write().await.remove(&health.network);

        error!(
            "Network {} health check failed {} times: {:?}",
            health.network, streak, health.issues
        );
        for issue in &health.issues {
            let alert = HealthAlert {
                network: health.network,
                kind: issue.kind,
                message: issue.message.clone(),
                timestamp: current_timestamp(),
            };
            if let Err(err) = self.alerts.send(alert).await {
                error!("Failed to deliver health alert: {}", err);
            }
        }
    }
}
