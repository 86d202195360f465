//! Matching Engine Module
//!
//! Pure decision logic: given a payment intent and a candidate transaction
//! discovered on-chain, decide whether the transaction satisfies the
//! intent. No I/O happens here; adapters fetch, this module judges.
//!
//! Reference matching differs by network. Hedera carries the payment
//! reference in the transaction memo, giving a strong link. EVM and Cosmos
//! transfers have no reliable reference propagation, so a match rests on
//! the (recipient, token, amount, time-window) tuple, a weaker guarantee.

use chain_clients_common::addresses_equal;

use crate::adapter::CandidateTransaction;
use crate::registry::PaymentIntent;
use crate::units;

// ============================================================================
// MATCH OUTCOME
// ============================================================================

/// Result of evaluating one candidate against one intent.
///
/// `Pending` and `NoMatch` are expected outcomes, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    /// Candidate satisfies the intent and is sufficiently confirmed
    Matched,
    /// Candidate satisfies the intent but lacks confirmations; reconsider
    /// next sweep
    Pending,
    /// Candidate does not satisfy the intent
    NoMatch,
}

/// Per-network facts the engine needs alongside the intent and candidate.
#[derive(Debug, Clone)]
pub struct MatchContext {
    /// Decimal places of the intent's currency on its network
    pub decimals: u32,
    /// Confirmation depth required before finality
    pub required_confirmations: u64,
    /// Whether the network carries the reference in a memo
    pub memo_matching: bool,
}

// ============================================================================
// EVALUATION
// ============================================================================

/// Evaluates a candidate transaction against a payment intent.
///
/// Checks, in order: network identity, token identity, amount (overpayment
/// accepted, underpayment rejected, no tolerance band), reference (memo
/// substring where supported, recipient/token/amount/time-window tuple
/// elsewhere), and finality (insufficient confirmations hold the candidate
/// as `Pending` rather than rejecting it).
///
/// # Arguments
///
/// * `intent` - The pending payment intent
/// * `candidate` - A transaction discovered on-chain
/// * `ctx` - Decimals, confirmation requirement, and memo support
///
/// # Returns
///
/// * `MatchOutcome::Matched` - All checks passed
/// * `MatchOutcome::Pending` - Everything but finality passed
/// * `MatchOutcome::NoMatch` - Some check failed
pub fn evaluate(
    intent: &PaymentIntent,
    candidate: &CandidateTransaction,
    ctx: &MatchContext,
) -> MatchOutcome {
    // 1. Network must be identical.
    if intent.network != candidate.network {
        return MatchOutcome::NoMatch;
    }

    // 2. Token identity: a token intent needs the exact token, a native
    //    intent needs a native transfer.
    match (&intent.token_id, &candidate.token_id) {
        (Some(expected), Some(actual)) => {
            if !addresses_equal(expected, actual) {
                return MatchOutcome::NoMatch;
            }
        }
        (None, None) => {}
        _ => return MatchOutcome::NoMatch,
    }

    // 3. Amount: candidate must cover the expected amount exactly or more.
    let candidate_amount = match units::from_raw(candidate.raw_amount, ctx.decimals) {
        Some(amount) => amount,
        None => return MatchOutcome::NoMatch,
    };
    if candidate_amount < intent.expected_amount {
        return MatchOutcome::NoMatch;
    }

    // 4. Reference. The recipient must be ours on every network; beyond
    //    that, memo networks carry the reference in the memo text, the rest
    //    rely on the time-window side of the tuple.
    if !addresses_equal(&candidate.recipient_address, &intent.recipient_address) {
        return MatchOutcome::NoMatch;
    }
    if ctx.memo_matching {
        let memo_contains_reference = candidate
            .memo
            .as_deref()
            .map(|memo| memo.contains(&intent.reference))
            .unwrap_or(false);
        if !memo_contains_reference {
            return MatchOutcome::NoMatch;
        }
    } else if candidate.timestamp < intent.created_at {
        return MatchOutcome::NoMatch;
    }

    // 5. Finality: unconfirmed candidates are held, not rejected.
    if candidate.confirmations < ctx.required_confirmations {
        return MatchOutcome::Pending;
    }

    MatchOutcome::Matched
}
