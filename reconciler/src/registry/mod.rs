//! Payment Intent Registry Module
//!
//! This module provides in-memory storage for payment intents. An intent
//! records what a payer owes (amount, currency, network, recipient) and
//! waits for an on-chain transaction that satisfies it.
//!
//! The registry's `transition` is the sole mutation point for intent
//! status: the current-status check and the write happen under one lock
//! acquisition, so two sweeps can never complete the same intent twice or
//! race terminal states.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::{Network, NetworkSnapshot};
use crate::error::Error;

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Status of a payment intent.
///
/// `Completed`, `Failed`, and `Expired` are terminal: no transition ever
/// leaves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntentStatus {
    /// Awaiting an on-chain transaction
    Pending,
    /// Satisfied by a matched transaction
    Completed,
    /// Administratively failed
    Failed,
    /// Aged past the payment window without a match
    Expired,
}

impl IntentStatus {
    /// Whether this status can never be left.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, IntentStatus::Pending)
    }
}

/// A pending request for a specific amount of a specific asset on a
/// specific network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    /// Globally unique opaque reference, the primary matching key
    pub reference: String,
    /// Network the payment must arrive on
    pub network: Network,
    /// Currency symbol (native or token)
    pub currency: String,
    /// Expected amount in human units
    pub expected_amount: Decimal,
    /// Merchant address/account on the network
    pub recipient_address: String,
    /// Token contract/ID; None for the native currency
    pub token_id: Option<String>,
    /// Memo the payer is asked to attach, where the network supports one
    pub memo: Option<String>,
    /// Subscription plan this payment buys, passed through to activation
    pub plan: Option<String>,
    /// Current status
    pub status: IntentStatus,
    /// Creation time (unix seconds)
    pub created_at: u64,
    /// Expiry time (unix seconds); invalid for matching once passed
    pub expires_at: u64,
    /// Hash of the matched transaction; set only on completion
    pub matched_transaction_hash: Option<String>,
}

impl PaymentIntent {
    /// Whether the intent's payment window has closed.
    pub fn is_past_expiry(&self, now: u64) -> bool {
        now >= self.expires_at
    }
}

// ============================================================================
// REGISTRY IMPLEMENTATION
// ============================================================================

/// In-memory store of payment intents.
///
/// Uses a HashMap for O(1) lookup by reference, thread-safe via RwLock.
pub struct IntentRegistry {
    intents: RwLock<HashMap<String, PaymentIntent>>,
    ttl_secs: u64,
}

impl IntentRegistry {
    /// Creates a new registry with the given intent TTL.
    ///
    /// # Arguments
    ///
    /// * `ttl_secs` - Seconds an intent stays open before expiring
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            intents: RwLock::new(HashMap::new()),
            ttl_secs,
        }
    }

    /// Creates a new pending intent.
    ///
    /// The recipient address, token identity, and memo are derived from the
    /// network snapshot; the reference is generated and collision-checked
    /// against existing intents.
    ///
    /// # Arguments
    ///
    /// * `snapshot` - Network configuration snapshot
    /// * `amount` - Expected amount in human units
    /// * `currency` - Currency symbol
    /// * `plan` - Subscription plan to activate on completion
    ///
    /// # Returns
    ///
    /// * `Ok(PaymentIntent)` - Stored pending intent
    /// * `Err(Error::Config)` - Currency not payable on the network
    pub async fn create(
        &self,
        snapshot: &NetworkSnapshot,
        amount: Decimal,
        currency: &str,
        plan: Option<String>,
    ) -> Result<PaymentIntent, Error> {
        let token = snapshot.currency(currency)?;
        let now = current_timestamp();

        let mut intents = self.intents.write().await;
        let reference = loop {
            let candidate = format!("CRYPTO_{}", Uuid::new_v4().simple());
            if !intents.contains_key(&candidate) {
                break candidate;
            }
        };

        let memo = snapshot
            .memo_matching
            .then(|| format!("Payment:{}", reference));

        let intent = PaymentIntent {
            reference: reference.clone(),
            network: snapshot.network,
            currency: currency.to_uppercase(),
            expected_amount: amount,
            recipient_address: snapshot.merchant_address.clone(),
            token_id: token.id,
            memo,
            plan,
            status: IntentStatus::Pending,
            created_at: now,
            expires_at: now + self.ttl_secs,
            matched_transaction_hash: None,
        };
        intents.insert(reference, intent.clone());
        Ok(intent)
    }

    /// Gets an intent by reference.
    ///
    /// # Arguments
    ///
    /// * `reference` - The intent reference
    ///
    /// # Returns
    ///
    /// * `Some(PaymentIntent)` if found
    /// * `None` if not found
    pub async fn get(&self, reference: &str) -> Option<PaymentIntent> {
        let intents = self.intents.read().await;
        intents.get(reference).cloned()
    }

    /// Transitions an intent to a new status.
    ///
    /// The legality check and the write happen under one write-lock
    /// acquisition: concurrent callers racing on the same intent see
    /// exactly one winner, the loser receives `InvalidTransition`.
    ///
    /// # Arguments
    ///
    /// * `reference` - The intent reference
    /// * `new_status` - Target status; must not be `Pending`
    /// * `matched_hash` - Transaction hash; required for `Completed`,
    ///   rejected otherwise
    ///
    /// # Returns
    ///
    /// * `Ok(PaymentIntent)` - Updated intent
    /// * `Err(Error::NotFound)` - Unknown reference
    /// * `Err(Error::InvalidTransition)` - Intent already terminal or the
    ///   transition shape is illegal
    pub async fn transition(
        &self,
        reference: &str,
        new_status: IntentStatus,
        matched_hash: Option<String>,
    ) -> Result<PaymentIntent, Error> {
        let mut intents = self.intents.write().await;
        let intent = intents.get_mut(reference).ok_or_else(|| Error::NotFound {
            reference: reference.to_string(),
        })?;

        let legal = !intent.status.is_terminal()
            && new_status != IntentStatus::Pending
            && (new_status == IntentStatus::Completed) == matched_hash.is_some();
        if !legal {
            return Err(Error::InvalidTransition {
                reference: reference.to_string(),
                from: intent.status,
                to: new_status,
            });
        }

        intent.status = new_status;
        intent.matched_transaction_hash = matched_hash;
        Ok(intent.clone())
    }

    /// Expires every pending intent past its expiry time.
    ///
    /// Idempotent: a second call right after the first changes nothing.
    ///
    /// # Returns
    ///
    /// Number of intents moved to `Expired`
    pub async fn expire_stale(&self) -> usize {
        let now = current_timestamp();
        let mut intents = self.intents.write().await;
        let mut expired = 0;
        for intent in intents.values_mut() {
            if intent.status == IntentStatus::Pending && intent.is_past_expiry(now) {
                intent.status = IntentStatus::Expired;
                expired += 1;
            }
        }
        expired
    }

    /// Returns pending, unexpired intents grouped by network.
    ///
    /// Sweep input: intents already past expiry are left for
    /// [`expire_stale`](Self::expire_stale) and excluded here.
    pub async fn pending_by_network(&self) -> HashMap<Network, Vec<PaymentIntent>> {
        let now = current_timestamp();
        let intents = self.intents.read().await;
        let mut groups: HashMap<Network, Vec<PaymentIntent>> = HashMap::new();
        for intent in intents.values() {
            if intent.status == IntentStatus::Pending && !intent.is_past_expiry(now) {
                groups.entry(intent.network).or_default().push(intent.clone());
            }
        }
        groups
    }

    /// Number of stored intents, regardless of status.
    pub async fn len(&self) -> usize {
        self.intents.read().await.len()
    }

    /// Whether the registry holds no intents.
    pub async fn is_empty(&self) -> bool {
        self.intents.read().await.is_empty()
    }
}

/// Get current Unix timestamp.
pub fn current_timestamp() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}
