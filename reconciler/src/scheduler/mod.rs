//! Reconciliation Scheduler Module
//!
//! Drives the recurring sweep over pending payment intents. One sweep runs
//! at a time per process; within a sweep, network groups are processed
//! concurrently since adapters for different networks are independent HTTP
//! clients. Within a group, one candidate fetch serves every intent sharing
//! a (recipient, token) pair, respecting third-party rate limits.
//!
//! Adapter failures never fail intents: an unavailable network is skipped
//! for the cycle and its intents stay pending. Only TTL expiry produces the
//! `Expired` terminal state.

use futures::future::join_all;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use crate::adapter::{AdapterRegistry, CandidateTransaction};
use crate::config::{ConfigService, Network};
use crate::error::Error;
use crate::matching::{self, MatchContext, MatchOutcome};
use crate::registry::{current_timestamp, IntentRegistry, IntentStatus, PaymentIntent};

// ============================================================================
// EVENTS AND SUMMARIES
// ============================================================================

/// Emitted exactly once per completed intent, consumed by the external
/// subscription-activation collaborator. Fire-and-forget: a delivery
/// failure is logged and never reverses the completed payment.
#[derive(Debug, Clone, Serialize)]
pub struct ActivationEvent {
    /// Reference of the completed intent
    pub reference: String,
    /// Subscription plan to activate
    pub plan: Option<String>,
    /// Always "crypto" for this core
    pub payment_method: String,
    /// Network the payment arrived on
    pub network: Network,
    /// Hash of the matched transaction
    pub transaction_hash: String,
}

/// Per-sweep accounting, logged after each cycle.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SweepSummary {
    /// Intents expired at the start of the sweep
    pub expired: usize,
    /// Intents completed this sweep
    pub completed: usize,
    /// Intents with a candidate still awaiting confirmations
    pub held: usize,
    /// Networks skipped because their adapter was unavailable
    pub skipped_networks: Vec<Network>,
}

// ============================================================================
// SCHEDULER IMPLEMENTATION
// ============================================================================

/// Recurring reconciliation sweep over pending intents.
pub struct ReconciliationScheduler {
    registry: Arc<IntentRegistry>,
    adapters: Arc<AdapterRegistry>,
    config_service: Arc<ConfigService>,
    activations: mpsc::Sender<ActivationEvent>,
    sweep_interval: Duration,
}

impl ReconciliationScheduler {
    /// Creates a scheduler.
    ///
    /// # Arguments
    ///
    /// * `registry` - Payment intent store
    /// * `adapters` - One adapter per configured network
    /// * `config_service` - Network snapshot provider
    /// * `activations` - Channel the activation collaborator consumes
    pub fn new(
        registry: Arc<IntentRegistry>,
        adapters: Arc<AdapterRegistry>,
        config_service: Arc<ConfigService>,
        activations: mpsc::Sender<ActivationEvent>,
    ) -> Self {
        let sweep_interval = Duration::from_secs(
            config_service.config().reconciler.sweep_interval_secs,
        );
        Self {
            registry,
            adapters,
            config_service,
            activations,
            sweep_interval,
        }
    }

    /// Runs sweeps until shutdown is signalled.
    ///
    /// Graceful shutdown: the in-flight sweep finishes its network groups;
    /// no new sweep starts afterwards.
    ///
    /// # Arguments
    ///
    /// * `shutdown` - Flips to true when the service is stopping
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            "Starting reconciliation sweeps every {:?}",
            self.sweep_interval
        );
        loop {
            let summary = self.sweep().await;
            if summary.completed > 0 || summary.expired > 0 || !summary.skipped_networks.is_empty()
            {
                info!(
                    "Sweep done: {} completed, {} expired, {} held, skipped {:?}",
                    summary.completed, summary.expired, summary.held, summary.skipped_networks
                );
            } else {
                debug!("Sweep done: nothing to reconcile");
            }

            tokio::select! {
                _ = tokio::time::sleep(self.sweep_interval) => {}
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("Shutdown signalled, stopping reconciliation sweeps");
                        return;
                    }
                }
            }
        }
    }

    /// Runs one sweep: expire stale intents, then reconcile every network
    /// group concurrently.
    pub async fn sweep(&self) -> SweepSummary {
        let mut summary = SweepSummary {
            expired: self.registry.expire_stale().await,
            ..Default::default()
        };

        let groups = self.registry.pending_by_network().await;
        if groups.is_empty() {
            return summary;
        }

        let tasks = groups
            .into_iter()
            .map(|(network, intents)| self.process_network(network, intents));
        for result in join_all(tasks).await {
            match result {
                Ok(stats) => {
                    summary.completed += stats.completed;
                    summary.held += stats.held;
                }
                Err((network, err)) => {
                    warn!("Skipping {} this sweep: {}", network, err);
                    summary.skipped_networks.push(network);
                }
            }
        }
        summary
    }

    /// Reconciles one intent immediately (the on-demand path behind the
    /// status-check endpoint).
    ///
    /// # Arguments
    ///
    /// * `reference` - Intent to reconcile
    ///
    /// # Returns
    ///
    /// * `Ok(PaymentIntent)` - The intent after reconciliation
    /// * `Err(Error::NotFound)` - Unknown reference
    /// * `Err(Error::IntentExpired)` - Payment window closed without a match
    /// * `Err(Error::AdapterUnavailable)` - The network's endpoints are down
    pub async fn reconcile_intent(&self, reference: &str) -> Result<PaymentIntent, Error> {
        let intent = self
            .registry
            .get(reference)
            .await
            .ok_or_else(|| Error::NotFound {
                reference: reference.to_string(),
            })?;

        if intent.status == IntentStatus::Expired {
            return Err(Error::IntentExpired {
                reference: reference.to_string(),
            });
        }
        if intent.status.is_terminal() {
            return Ok(intent);
        }
        if intent.is_past_expiry(current_timestamp()) {
            self.registry
                .transition(reference, IntentStatus::Expired, None)
                .await?;
            return Err(Error::IntentExpired {
                reference: reference.to_string(),
            });
        }

        let adapter = self
            .adapters
            .get(intent.network)
            .ok_or_else(|| Error::Config(format!("Network {} is not configured", intent.network)))?;
        let candidates = adapter
            .find_candidates(
                &intent.recipient_address,
                intent.token_id.as_deref(),
                intent.created_at,
            )
            .await;
        let candidates = match candidates {
            Ok(candidates) => candidates,
            Err(err) => {
                self.config_service.invalidate(intent.network).await;
                return Err(err);
            }
        };

        let ctx = self.match_context(&intent).await?;
        for candidate in &candidates {
            if matching::evaluate(&intent, candidate, &ctx) == MatchOutcome::Matched {
                return self.complete(&intent, candidate).await;
            }
        }
        self.registry
            .get(reference)
            .await
            .ok_or_else(|| Error::NotFound {
                reference: reference.to_string(),
            })
    }

    // ------------------------------------------------------------------
    // internal
    // ------------------------------------------------------------------

    async fn process_network(
        &self,
        network: Network,
        intents: Vec<PaymentIntent>,
    ) -> Result<NetworkSweepStats, (Network, Error)> {
        let adapter = match self.adapters.get(network) {
            Some(adapter) => adapter,
            None => {
                return Err((
                    network,
                    Error::Config(format!("Network {} is not configured", network)),
                ))
            }
        };

        // One fetch per (recipient, token) pair serves every intent that
        // shares the pair.
        let mut pairs: HashMap<(String, Option<String>), Vec<&PaymentIntent>> = HashMap::new();
        for intent in &intents {
            pairs
                .entry((intent.recipient_address.clone(), intent.token_id.clone()))
                .or_default()
                .push(intent);
        }

        let mut stats = NetworkSweepStats::default();
        for ((recipient, token_id), group) in pairs {
            let since = group.iter().map(|i| i.created_at).min().unwrap_or(0);
            let candidates = match adapter
                .find_candidates(&recipient, token_id.as_deref(), since)
                .await
            {
                Ok(candidates) => candidates,
                Err(err) => {
                    // Endpoint trouble also invalidates the cached config
                    // snapshot so the next sweep rebuilds it.
                    self.config_service.invalidate(network).await;
                    return Err((network, err));
                }
            };
            debug!(
                "{}: {} candidates for {} intents at {}",
                network,
                candidates.len(),
                group.len(),
                recipient
            );

            for intent in group {
                match self.reconcile_against(intent, &candidates).await {
                    Ok(Some(MatchOutcome::Matched)) => stats.completed += 1,
                    Ok(Some(MatchOutcome::Pending)) => stats.held += 1,
                    Ok(_) => {}
                    Err(err) => {
                        // Snapshot/config trouble for one intent should not
                        // stall the rest of the group.
                        warn!("Failed to reconcile {}: {}", intent.reference, err);
                    }
                }
            }
        }
        Ok(stats)
    }

    /// Evaluates one intent against fetched candidates; completes it on the
    /// first full match.
    ///
    /// Returns the strongest outcome seen (Matched > Pending > None).
    async fn reconcile_against(
        &self,
        intent: &PaymentIntent,
        candidates: &[CandidateTransaction],
    ) -> Result<Option<MatchOutcome>, Error> {
        let ctx = self.match_context(intent).await?;
        let mut held = false;
        for candidate in candidates {
            match matching::evaluate(intent, candidate, &ctx) {
                MatchOutcome::Matched => {
                    self.complete(intent, candidate).await?;
                    return Ok(Some(MatchOutcome::Matched));
                }
                MatchOutcome::Pending => held = true,
                MatchOutcome::NoMatch => {}
            }
        }
        Ok(held.then_some(MatchOutcome::Pending))
    }

    async fn match_context(&self, intent: &PaymentIntent) -> Result<MatchContext, Error> {
        let snapshot = self.config_service.network_config(intent.network).await?;
        let token = snapshot.currency(&intent.currency)?;
        Ok(MatchContext {
            decimals: token.decimals,
            required_confirmations: snapshot.required_confirmations,
            memo_matching: snapshot.memo_matching,
        })
    }

    /// Transitions an intent to completed and emits the activation event.
    ///
    /// The registry's compare-and-set makes this exactly-once: if another
    /// sweep won the race, the transition fails and no event is emitted
    /// here.
    async fn complete(
        &self,
        intent: &PaymentIntent,
        candidate: &CandidateTransaction,
    ) -> Result<PaymentIntent, Error> {
        let completed = match self
            .registry
            .transition(
                &intent.reference,
                IntentStatus::Completed,
                Some(candidate.hash.clone()),
            )
            .await
        {
            Ok(completed) => completed,
            Err(err @ Error::InvalidTransition { .. }) => {
                // Double-processing guard tripped; the first completion
                // already emitted the activation.
                error!("Completion race on {}: {}", intent.reference, err);
                return Err(err);
            }
            Err(err) => return Err(err),
        };

        info!(
            "Intent {} completed by {} on {}",
            completed.reference, candidate.hash, completed.network
        );
        let event = ActivationEvent {
            reference: completed.reference.clone(),
            plan: completed.plan.clone(),
            payment_method: "crypto".to_string(),
            network: completed.network,
            transaction_hash: candidate.hash.clone(),
        };
        if let Err(err) = self.activations.send(event).await {
            // Fire-and-forget: the payment stays completed; activation is
            // surfaced for manual follow-up.
            error!(
                "Failed to deliver activation for {}: {}",
                completed.reference, err
            );
        }
        Ok(completed)
    }
}

#[derive(Debug, Default)]
struct NetworkSweepStats {
    completed: usize,
    held: usize,
}
