//! Commitment properties over real extracted factor sets.

use std::sync::Arc;

use alloy_primitives::keccak256;
use ccs_core::merkle::{FactorTree, commit, commit_factors};
use ccs_core::params::ChainParams;
use ccs_core::types::{FactorValue, FactorsRoot, WalletFactors};
use ccs_factors::{ExtractionContext, FactorExtractor};
use ccs_tests::helpers::*;
use proptest::prelude::*;

async fn reference_factors() -> WalletFactors {
    FactorExtractor::new(Arc::new(ChainParams::mainnet()))
        .extract(
            &WALLET,
            &FakeExplorer::reference_scenario(),
            ExtractionContext::new(NOW).with_eth_usd(2_500.0),
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn reversed_pairs_commit_identically() {
    let f = reference_factors().await;
    let mut pairs = f.factor_pairs();
    pairs.reverse();
    assert_eq!(commit(pairs), commit_factors(&f));
}

#[tokio::test]
async fn detail_does_not_affect_commitment() {
    let f = reference_factors().await;
    let mut stripped = f.clone();
    stripped.detail = Default::default();
    assert_eq!(commit_factors(&stripped), commit_factors(&f));
}

#[tokio::test]
async fn every_factor_has_a_valid_proof() {
    let f = reference_factors().await;
    let tree = FactorTree::build(f.factor_pairs());
    let root = commit_factors(&f);
    assert_eq!(tree.root(), root);
    for (key, _) in f.factor_pairs() {
        let proof = tree.proof(key).unwrap();
        assert!(proof.verify(&root), "proof for {key} failed");
    }
}

#[tokio::test]
async fn proof_rejects_altered_value() {
    let f = reference_factors().await;
    let tree = FactorTree::build(f.factor_pairs());
    let mut proof = tree.proof("default_count").unwrap();
    assert_eq!(proof.value, "2");
    proof.value = "0".to_string();
    assert!(!proof.verify(&tree.root()));
}

#[test]
fn empty_set_is_zero_sentinel() {
    let root = commit(Vec::<(&str, FactorValue)>::new());
    assert_eq!(root, FactorsRoot::ZERO);
    assert_ne!(root.0, keccak256(b""));
}

fn arb_value() -> impl Strategy<Value = FactorValue> {
    prop_oneof![
        any::<u64>().prop_map(FactorValue::Int),
        (-1e9f64..1e9).prop_map(FactorValue::Float),
    ]
}

proptest! {
    #[test]
    fn any_permutation_commits_identically(
        entries in prop::collection::btree_map("[a-z_]{1,12}", arb_value(), 1..16),
        seed in any::<u64>(),
    ) {
        let pairs: Vec<(String, FactorValue)> = entries.into_iter().collect();
        let mut shuffled = pairs.clone();
        // Deterministic rotation + reversal driven by `seed`.
        let len = shuffled.len();
        shuffled.rotate_left((seed as usize) % len);
        if seed % 2 == 1 {
            shuffled.reverse();
        }
        prop_assert_eq!(commit(pairs), commit(shuffled));
    }

    #[test]
    fn changing_one_integer_changes_root(
        entries in prop::collection::btree_map("[a-z_]{1,12}", any::<u32>(), 1..16),
        pick in any::<usize>(),
    ) {
        let pairs: Vec<(String, FactorValue)> = entries
            .into_iter()
            .map(|(k, v)| (k, FactorValue::Int(u64::from(v))))
            .collect();
        let mut altered = pairs.clone();
        let i = pick % altered.len();
        if let FactorValue::Int(v) = altered[i].1 {
            altered[i].1 = FactorValue::Int(v + 1);
        }
        prop_assert_ne!(commit(pairs), commit(altered));
    }
}
