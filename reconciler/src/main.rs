//! Payment Reconciliation Service
//!
//! Verifies that on-chain transactions satisfy pending payment intents
//! across EVM chains, Hedera, and Cosmos.
//!
//! ## Overview
//!
//! The service:
//! 1. Accepts payment-intent creation through its REST API
//! 2. Sweeps pending intents on an interval, querying each network's
//!    public API for matching transactions
//! 3. Transitions matched intents to completed and emits activation events
//!    for the subscription collaborator
//! 4. Monitors endpoint health and emits structured alerts

use anyhow::Result;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};

use reconciler::api::ApiServer;
use reconciler::config::{Config, ConfigService};
use reconciler::health::HealthService;
use reconciler::{AdapterRegistry, IntentRegistry, ReconciliationScheduler};

// ============================================================================
// MAIN APPLICATION ENTRY POINT
// ============================================================================

/// Main application entry point.
///
/// This function:
/// 1. Initializes logging and tracing
/// 2. Loads and validates configuration from TOML
/// 3. Builds the registry, adapters, scheduler, and health service
/// 4. Spawns the sweep and health loops and the collaborator consumers
/// 5. Serves the REST API until Ctrl-C, then shuts down gracefully
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    info!("Starting Payment Reconciliation Service");

    let config = Arc::new(Config::load()?);
    info!(
        "Configuration loaded: {} network(s) configured",
        config.configured_networks().len()
    );

    let config_service = Arc::new(ConfigService::new(Arc::clone(&config))?);
    let registry = Arc::new(IntentRegistry::new(config.intent_ttl().as_secs()));
    let adapters = Arc::new(AdapterRegistry::from_config(&config)?);

    // Channels to the external collaborators. The consumers below are the
    // process boundary: activation and alerting are delivered elsewhere.
    let (activation_tx, mut activation_rx) = mpsc::channel::<reconciler::ActivationEvent>(64);
    let (alert_tx, mut alert_rx) = mpsc::channel::<reconciler::health::HealthAlert>(64);

    tokio::spawn(async move {
        while let Some(event) = activation_rx.recv().await {
            info!(
                "Subscription activation: plan={:?} payment_method={} reference={}",
                event.plan, event.payment_method, event.reference
            );
        }
    });
    tokio::spawn(async move {
        while let Some(alert) = alert_rx.recv().await {
            warn!(
                "Health alert [{}] {:?}: {}",
                alert.network, alert.kind, alert.message
            );
        }
    });

    let scheduler = Arc::new(ReconciliationScheduler::new(
        Arc::clone(&registry),
        adapters,
        Arc::clone(&config_service),
        activation_tx,
    ));
    let health = Arc::new(HealthService::new(Arc::clone(&config_service), alert_tx));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let scheduler_task = {
        let scheduler = Arc::clone(&scheduler);
        let shutdown = shutdown_rx.clone();
        tokio::spawn(async move { scheduler.run(shutdown).await })
    };
    let health_task = {
        let health = Arc::clone(&health);
        let shutdown = shutdown_rx.clone();
        tokio::spawn(async move { health.run(shutdown).await })
    };

    let api_server = ApiServer::new(
        registry,
        scheduler,
        config_service,
        health.latest_report(),
    );
    let api_task = tokio::spawn(api_server.run(shutdown_rx));

    info!("All components started");

    tokio::signal::ctrl_c().await?;
    info!("Ctrl-C received, shutting down");
    let _ = shutdown_tx.send(true);

    // The sweep in flight finishes its network groups before exiting.
    if let Err(e) = scheduler_task.await {
        error!("Scheduler task failed: {}", e);
    }
    if let Err(e) = health_task.await {
        error!("Health task failed: {}", e);
    }
    if let Err(e) = api_task.await {
        error!("API task failed: {}", e);
    }

    info!("Shutdown complete");
    Ok(())
}
