//! Unit tests for the matching engine
//!
//! These tests cover the five matching checks (network, token, amount,
//! reference, finality) with the decimal layouts the supported chains use.

use rust_decimal::Decimal;
use std::str::FromStr;

use reconciler::matching::{evaluate, MatchContext, MatchOutcome};
use reconciler::Network;

#[path = "mod.rs"]
mod test_helpers;
use test_helpers::{
    usdt_candidate_ethereum, usdt_intent_ethereum, usdt_intent_hedera, HEDERA_USDT_TOKEN,
    MERCHANT_HEDERA, USDT_CONTRACT_BSC,
};

fn ethereum_usdt_ctx() -> MatchContext {
    MatchContext {
        decimals: 6,
        required_confirmations: 12,
        memo_matching: false,
    }
}

fn hedera_usdt_ctx() -> MatchContext {
    MatchContext {
        decimals: 6,
        required_confirmations: 1,
        memo_matching: true,
    }
}

// ============================================================================
// TESTS
// ============================================================================

/// Test that a 10 USDT intent matches a raw 10000000 candidate at 6 decimals
/// Why: the exact-amount path is the common successful case
#[test]
fn test_exact_amount_matches() {
    let intent = usdt_intent_ethereum();
    let candidate = usdt_candidate_ethereum();
    assert_eq!(
        evaluate(&intent, &candidate, &ethereum_usdt_ctx()),
        MatchOutcome::Matched
    );
}

/// Test that a candidate on another network never matches
/// Why: the same payer sending BSC USDT (18 decimals) must not complete an
/// Ethereum intent even when the raw amount looks plausible
#[test]
fn test_wrong_network_is_no_match() {
    let intent = usdt_intent_ethereum();
    let mut candidate = usdt_candidate_ethereum();
    candidate.network = Network::Bsc;
    candidate.token_id = Some(USDT_CONTRACT_BSC.to_string());
    candidate.raw_amount = 10_000_000_000_000_000_000; // 10 USDT at 18 decimals
    assert_eq!(
        evaluate(&intent, &candidate, &ethereum_usdt_ctx()),
        MatchOutcome::NoMatch
    );
}

/// Test that a token intent rejects a native transfer and vice versa
/// Why: token identity must be exact, not merely same-network
#[test]
fn test_token_identity_is_exact() {
    let intent = usdt_intent_ethereum();
    let mut native = usdt_candidate_ethereum();
    native.token_id = None;
    native.raw_amount = 10_000_000_000_000_000_000;
    assert_eq!(
        evaluate(&intent, &native, &ethereum_usdt_ctx()),
        MatchOutcome::NoMatch
    );

    let mut wrong_contract = usdt_candidate_ethereum();
    wrong_contract.token_id = Some("0x3333333333333333333333333333333333333333".to_string());
    assert_eq!(
        evaluate(&intent, &wrong_contract, &ethereum_usdt_ctx()),
        MatchOutcome::NoMatch
    );
}

/// Test that contract comparison ignores case
/// Why: explorers return mixed-case (checksummed) addresses
#[test]
fn test_token_match_is_case_insensitive() {
    let intent = usdt_intent_ethereum();
    let mut candidate = usdt_candidate_ethereum();
    candidate.token_id = Some(candidate.token_id.unwrap().to_lowercase());
    assert_eq!(
        evaluate(&intent, &candidate, &ethereum_usdt_ctx()),
        MatchOutcome::Matched
    );
}

/// Test that underpayment by one cent is rejected
/// Why: there is no tolerance band below the expected amount
#[test]
fn test_underpayment_is_rejected() {
    let mut intent = usdt_intent_ethereum();
    intent.expected_amount = Decimal::from(10);
    let mut candidate = usdt_candidate_ethereum();
    candidate.raw_amount = 9_990_000; // 9.99 USDT
    assert_eq!(
        evaluate(&intent, &candidate, &ethereum_usdt_ctx()),
        MatchOutcome::NoMatch
    );
}

/// Test that 1.5x overpayment is accepted
/// Why: payers sometimes round up; overpayment satisfies the intent
#[test]
fn test_overpayment_is_accepted() {
    let intent = usdt_intent_ethereum();
    let mut candidate = usdt_candidate_ethereum();
    candidate.raw_amount = 15_000_000; // 15 USDT
    assert_eq!(
        evaluate(&intent, &candidate, &ethereum_usdt_ctx()),
        MatchOutcome::Matched
    );
}

/// Test that fractional amounts compare exactly
/// Why: decimal conversion must not round 10.000001 down to 10
#[test]
fn test_fractional_amount_compares_exactly() {
    let mut intent = usdt_intent_ethereum();
    intent.expected_amount = Decimal::from_str("10.000001").unwrap();
    let mut candidate = usdt_candidate_ethereum();
    candidate.raw_amount = 10_000_000; // 10 USDT, one smallest unit short
    assert_eq!(
        evaluate(&intent, &candidate, &ethereum_usdt_ctx()),
        MatchOutcome::NoMatch
    );
    candidate.raw_amount = 10_000_001;
    assert_eq!(
        evaluate(&intent, &candidate, &ethereum_usdt_ctx()),
        MatchOutcome::Matched
    );
}

/// Test that a Hedera memo containing the reference passes the memo check
/// Why: memo text like "Payment:CRYPTO_abc123" carries the reference as a
/// substring, not an exact match
#[test]
fn test_hedera_memo_substring_passes() {
    let intent = usdt_intent_hedera();
    let mut candidate = usdt_candidate_ethereum();
    candidate.network = Network::Hedera;
    candidate.recipient_address = MERCHANT_HEDERA.to_string();
    candidate.token_id = Some(HEDERA_USDT_TOKEN.to_string());
    candidate.confirmations = 1;
    candidate.memo = Some("Payment:CRYPTO_abc123".to_string());
    assert_eq!(
        evaluate(&intent, &candidate, &hedera_usdt_ctx()),
        MatchOutcome::Matched
    );
}

/// Test that a Hedera candidate without the reference memo never matches
/// Why: on memo networks the memo is the matching key, amounts alone are
/// not enough
#[test]
fn test_hedera_missing_memo_is_no_match() {
    let intent = usdt_intent_hedera();
    let mut candidate = usdt_candidate_ethereum();
    candidate.network = Network::Hedera;
    candidate.recipient_address = MERCHANT_HEDERA.to_string();
    candidate.token_id = Some(HEDERA_USDT_TOKEN.to_string());
    candidate.confirmations = 1;
    candidate.memo = Some("Payment:CRYPTO_other".to_string());
    assert_eq!(
        evaluate(&intent, &candidate, &hedera_usdt_ctx()),
        MatchOutcome::NoMatch
    );

    candidate.memo = None;
    assert_eq!(
        evaluate(&intent, &candidate, &hedera_usdt_ctx()),
        MatchOutcome::NoMatch
    );
}

/// Test that a candidate predating the intent is rejected on tuple networks
/// Why: without memos the time window is part of the matching tuple; an old
/// transfer of the right size must not satisfy a new intent
#[test]
fn test_candidate_before_intent_creation_is_no_match() {
    let intent = usdt_intent_ethereum();
    let mut candidate = usdt_candidate_ethereum();
    candidate.timestamp = intent.created_at - 600;
    assert_eq!(
        evaluate(&intent, &candidate, &ethereum_usdt_ctx()),
        MatchOutcome::NoMatch
    );
}

/// Test that a wrong recipient is rejected
/// Why: candidates are fetched per recipient, but the engine still guards
/// the tuple's recipient leg
#[test]
fn test_wrong_recipient_is_no_match() {
    let intent = usdt_intent_ethereum();
    let mut candidate = usdt_candidate_ethereum();
    candidate.recipient_address = "0x4444444444444444444444444444444444444444".to_string();
    assert_eq!(
        evaluate(&intent, &candidate, &ethereum_usdt_ctx()),
        MatchOutcome::NoMatch
    );
}

/// Test that an underconfirmed candidate is held, not rejected
/// Why: finality is the only check that yields Pending; the candidate is
/// reconsidered on the next sweep once it is buried deep enough
#[test]
fn test_underconfirmed_candidate_is_held() {
    let intent = usdt_intent_ethereum();
    let mut candidate = usdt_candidate_ethereum();
    candidate.confirmations = 3; // required is 12
    assert_eq!(
        evaluate(&intent, &candidate, &ethereum_usdt_ctx()),
        MatchOutcome::Pending
    );

    candidate.confirmations = 12;
    assert_eq!(
        evaluate(&intent, &candidate, &ethereum_usdt_ctx()),
        MatchOutcome::Matched
    );
}
