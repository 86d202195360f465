//! REST API Server Module
//!
//! This module exposes the payment-initiation and status surface consumed
//! by the external web application:
//!
//! - `POST /api/v1/payments` creates a payment intent and returns the
//!   payload the caller displays to the payer (address, amount, reference,
//!   memo, wallet deep links)
//! - `GET /api/v1/payments/{reference}` returns intent status
//! - `POST /api/v1/payments/{reference}/check` reconciles one intent on
//!   demand
//! - `GET /health` returns the latest per-network health report
//!
//! The broader CRUD/dashboard surface stays in the external application;
//! this API is only the contract the reconciliation core owns.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use tracing::info;
use warp::http::StatusCode;
use warp::{Filter, Reply};

use crate::config::{ConfigService, Network};
use crate::error::Error;
use crate::health::NetworkHealth;
use crate::registry::{IntentRegistry, PaymentIntent};
use crate::scheduler::ReconciliationScheduler;

// ============================================================================
// REQUEST/RESPONSE STRUCTURES
// ============================================================================

/// Standardized response structure for all API endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the request was successful
    pub success: bool,
    /// Response data (if successful)
    pub data: Option<T>,
    /// Error message (if failed)
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> warp::reply::Json {
        warp::reply::json(&ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

fn error_reply(message: String) -> warp::reply::Json {
    warp::reply::json(&ApiResponse::<()> {
        success: false,
        data: None,
        error: Some(message),
    })
}

/// Body of the payment-initiation request.
#[derive(Debug, Deserialize)]
pub struct CreatePaymentRequest {
    /// Network the payer will send on
    pub network: String,
    /// Plan-derived amount in human units
    pub amount: Decimal,
    /// Currency symbol (native or token)
    pub currency: String,
    /// Subscription plan to activate on completion
    #[serde(default)]
    pub plan: Option<String>,
}

/// Wallet deep links for networks that support them.
#[derive(Debug, Clone, Serialize)]
pub struct DeepLinks {
    pub hashpack: String,
    pub metamask: String,
}

/// Payment details returned to the caller for display to the payer.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentDetails {
    pub reference: String,
    pub network: Network,
    pub currency: String,
    pub amount: Decimal,
    pub payment_address: String,
    pub token_id: Option<String>,
    pub memo: Option<String>,
    pub expires_at: u64,
    pub deep_links: Option<DeepLinks>,
}

impl PaymentDetails {
    fn from_intent(intent: &PaymentIntent) -> Self {
        let deep_links = intent.memo.as_deref().map(|memo| {
            DeepLinks {
                hashpack: wallet_deep_link("hashpack", intent, memo),
                metamask: wallet_deep_link("metamask", intent, memo),
            }
        });
        Self {
            reference: intent.reference.clone(),
            network: intent.network,
            currency: intent.currency.clone(),
            amount: intent.expected_amount,
            payment_address: intent.recipient_address.clone(),
            token_id: intent.token_id.clone(),
            memo: intent.memo.clone(),
            expires_at: intent.expires_at,
            deep_links,
        }
    }
}

/// Builds a wallet deep link of the form
/// `hashpack://transfer?recipient=...&amount=...&tokenId=...&memo=...`.
fn wallet_deep_link(scheme: &str, intent: &PaymentIntent, memo: &str) -> String {
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    query.append_pair("recipient", &intent.recipient_address);
    query.append_pair("amount", &intent.expected_amount.to_string());
    if let Some(token_id) = &intent.token_id {
        query.append_pair("tokenId", token_id);
    }
    query.append_pair("memo", memo);
    query.append_pair("network", "mainnet");
    format!("{}://transfer?{}", scheme, query.finish())
}

// ============================================================================
// API SERVER
// ============================================================================

/// REST API server wiring the registry, scheduler, and health report into
/// warp routes.
pub struct ApiServer {
    registry: Arc<IntentRegistry>,
    scheduler: Arc<ReconciliationScheduler>,
    config_service: Arc<ConfigService>,
    health_report: Arc<RwLock<Vec<NetworkHealth>>>,
}

impl ApiServer {
    /// Creates a new API server.
    pub fn new(
        registry: Arc<IntentRegistry>,
        scheduler: Arc<ReconciliationScheduler>,
        config_service: Arc<ConfigService>,
        health_report: Arc<RwLock<Vec<NetworkHealth>>>,
    ) -> Self {
        Self {
            registry,
            scheduler,
            config_service,
            health_report,
        }
    }

    /// Runs the server until shutdown is signalled.
    ///
    /// # Arguments
    ///
    /// * `shutdown` - Flips to true when the service is stopping
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let api_config = self.config_service.config().api.clone();
        let addr: std::net::SocketAddr = format!("{}:{}", api_config.host, api_config.port)
            .parse()
            .expect("invalid API host/port");

        let routes = self.routes();
        info!("Starting API server on {}", addr);
        let (_, server) = warp::serve(routes).bind_with_graceful_shutdown(addr, async move {
            loop {
                if shutdown.changed().await.is_err() || *shutdown.borrow() {
                    break;
                }
            }
            info!("Shutdown signalled, stopping API server");
        });
        server.await;
    }

    /// Builds the route tree. Public for integration tests.
    pub fn routes(
        &self,
    ) -> impl Filter<Extract = (impl Reply,), Error = warp::Rejection> + Clone {
        let registry = Arc::clone(&self.registry);
        let scheduler = Arc::clone(&self.scheduler);
        let config_service = Arc::clone(&self.config_service);
        let health_report = Arc::clone(&self.health_report);

        let create = warp::path!("api" / "v1" / "payments")
            .and(warp::post())
            .and(warp::body::json())
            .and(with(Arc::clone(&registry)))
            .and(with(config_service))
            .and_then(create_payment_handler);

        let status = warp::path!("api" / "v1" / "payments" / String)
            .and(warp::get())
            .and(with(registry))
            .and_then(get_payment_handler);

        let check = warp::path!("api" / "v1" / "payments" / String / "check")
            .and(warp::post())
            .and(with(scheduler))
            .and_then(check_payment_handler);

        let health = warp::path!("health")
            .and(warp::get())
            .and(with(health_report))
            .and_then(health_handler);

        create.or(status).or(check).or(health)
    }
}

fn with<T: Clone + Send>(
    value: T,
) -> impl Filter<Extract = (T,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || value.clone())
}

// ============================================================================
// HANDLERS
// ============================================================================

/// Handler for the payment-initiation endpoint.
///
/// Resolves the network and currency, creates a pending intent, and
/// returns the display payload.
async fn create_payment_handler(
    request: CreatePaymentRequest,
    registry: Arc<IntentRegistry>,
    config_service: Arc<ConfigService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let network = match Network::from_str(&request.network) {
        Ok(network) => network,
        Err(e) => {
            return Ok(warp::reply::with_status(
                error_reply(e.to_string()),
                StatusCode::BAD_REQUEST,
            ))
        }
    };

    let snapshot = match config_service.network_config(network).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            return Ok(warp::reply::with_status(
                error_reply(e.to_string()),
                StatusCode::BAD_REQUEST,
            ))
        }
    };

    match registry
        .create(&snapshot, request.amount, &request.currency, request.plan)
        .await
    {
        Ok(intent) => {
            info!(
                "Created payment intent {} for {} {} on {}",
                intent.reference, intent.expected_amount, intent.currency, intent.network
            );
            Ok(warp::reply::with_status(
                ApiResponse::ok(PaymentDetails::from_intent(&intent)),
                StatusCode::CREATED,
            ))
        }
        Err(e) => Ok(warp::reply::with_status(
            error_reply(e.to_string()),
            StatusCode::BAD_REQUEST,
        )),
    }
}

/// Handler for the intent-status endpoint.
async fn get_payment_handler(
    reference: String,
    registry: Arc<IntentRegistry>,
) -> Result<impl warp::Reply, warp::Rejection> {
    match registry.get(&reference).await {
        Some(intent) => Ok(warp::reply::with_status(
            ApiResponse::ok(intent),
            StatusCode::OK,
        )),
        None => Ok(warp::reply::with_status(
            error_reply(format!("payment intent not found: {}", reference)),
            StatusCode::NOT_FOUND,
        )),
    }
}

/// Handler for the on-demand reconciliation endpoint.
///
/// Transient adapter failures map to 503 and leave the intent pending;
/// they are retried by the next sweep regardless.
async fn check_payment_handler(
    reference: String,
    scheduler: Arc<ReconciliationScheduler>,
) -> Result<impl warp::Reply, warp::Rejection> {
    match scheduler.reconcile_intent(&reference).await {
        Ok(intent) => Ok(warp::reply::with_status(
            ApiResponse::ok(intent),
            StatusCode::OK,
        )),
        Err(Error::NotFound { .. }) => Ok(warp::reply::with_status(
            error_reply(format!("payment intent not found: {}", reference)),
            StatusCode::NOT_FOUND,
        )),
        Err(Error::IntentExpired { .. }) => Ok(warp::reply::with_status(
            error_reply("payment window closed".to_string()),
            StatusCode::GONE,
        )),
        Err(e @ Error::AdapterUnavailable { .. }) => Ok(warp::reply::with_status(
            error_reply(e.to_string()),
            StatusCode::SERVICE_UNAVAILABLE,
        )),
        Err(e) => Ok(warp::reply::with_status(
            error_reply(e.to_string()),
            StatusCode::INTERNAL_SERVER_ERROR,
        )),
    }
}

/// Handler for the health-report endpoint.
async fn health_handler(
    health_report: Arc<RwLock<Vec<NetworkHealth>>>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let report = health_report.read().await.clone();
    Ok(warp::reply::with_status(
        ApiResponse::ok(report),
        StatusCode::OK,
    ))
}
