//! Error taxonomy for the reconciliation core
//!
//! Three distinct failure classes flow through the service:
//!
//! - configuration problems are fatal at startup or adapter construction
//! - adapter unavailability is transient and retried on the next sweep
//! - invalid intent transitions indicate a scheduling or concurrency bug
//!   and are never swallowed
//!
//! Match outcomes (`Matched`/`Pending`/`NoMatch`) are ordinary values, not
//! errors; see [`crate::matching::MatchOutcome`].

use crate::config::Network;
use crate::registry::IntentStatus;
use thiserror::Error;

/// Errors produced by the reconciliation core.
#[derive(Debug, Error)]
pub enum Error {
    /// Fatal configuration problem: missing required field, unsupported
    /// network or currency. Raised at startup or adapter construction,
    /// never per sweep.
    #[error("configuration error: {0}")]
    Config(String),

    /// A network's endpoints (primary and fallback) could not serve a call
    /// this cycle. Retried on the next sweep; other networks keep
    /// progressing.
    #[error("{network} adapter unavailable: {reason}")]
    AdapterUnavailable { network: Network, reason: String },

    /// Attempted an illegal intent state transition. Terminal states are
    /// never left, so this is a bug signal from the caller's side.
    #[error("invalid transition for intent {reference}: {from:?} -> {to:?}")]
    InvalidTransition {
        reference: String,
        from: IntentStatus,
        to: IntentStatus,
    },

    /// No intent exists under the given reference.
    #[error("payment intent not found: {reference}")]
    NotFound { reference: String },

    /// The intent aged past its TTL before a match was found. Surfaced to
    /// the caller as "payment window closed".
    #[error("payment intent {reference} expired before a match was found")]
    IntentExpired { reference: String },
}

impl Error {
    /// Whether this error is transient and safe to retry next sweep.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::AdapterUnavailable { .. })
    }
}
