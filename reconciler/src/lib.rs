//! Payment Reconciliation Service Library
//!
//! This crate verifies that on-chain transactions satisfy pending payment
//! intents across EVM chains (Ethereum, BSC, Polygon), Hedera, and Cosmos.
//! Adapters translate chain-native API responses into a common candidate
//! shape, a pure matching engine judges candidates against intents, and a
//! recurring scheduler transitions intents and notifies the subscription
//! activation collaborator.

pub mod adapter;
pub mod api;
pub mod config;
pub mod error;
pub mod health;
pub mod matching;
pub mod registry;
pub mod scheduler;
pub mod units;

// Re-export commonly used types
pub use adapter::{AdapterRegistry, CandidateTransaction, NetworkAdapter};
pub use config::{Config, ConfigService, Network, NetworkSnapshot};
pub use error::Error;
pub use matching::{MatchContext, MatchOutcome};
pub use registry::{IntentRegistry, IntentStatus, PaymentIntent};
pub use scheduler::{ActivationEvent, ReconciliationScheduler};
