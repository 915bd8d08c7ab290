//! Keccak-256 Merkle commitment over a wallet's factor set.
//!
//! - Leaf hash: `keccak256(key || ":" || canonical_value)`
//! - Internal node: `keccak256(left || right)`
//!
//! Leaves are ordered by key before hashing, so the root does not depend
//! on the order the factors were supplied in. Odd-length layers are padded
//! by duplicating the last element. Empty sets produce [`FactorsRoot::ZERO`].

use alloy_primitives::{B256, keccak256};
use serde::{Deserialize, Serialize};

use crate::types::{FactorValue, FactorsRoot, WalletFactors};

/// Compute a leaf hash: `keccak256(key || ":" || value)`.
pub fn leaf_hash(key: &str, value: &str) -> B256 {
    let mut buf = Vec::with_capacity(key.len() + 1 + value.len());
    buf.extend_from_slice(key.as_bytes());
    buf.push(b':');
    buf.extend_from_slice(value.as_bytes());
    keccak256(&buf)
}

/// Compute an internal node hash: `keccak256(left || right)`.
pub fn node_hash(left: &B256, right: &B256) -> B256 {
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(left.as_slice());
    buf[32..].copy_from_slice(right.as_slice());
    keccak256(buf)
}

/// Render and sort `(key, value)` pairs into canonical leaf order.
///
/// Sorted by key, then by rendered value so duplicate keys still order
/// deterministically.
fn canonical_pairs<K, I>(pairs: I) -> Vec<(String, String)>
where
    K: AsRef<str>,
    I: IntoIterator<Item = (K, FactorValue)>,
{
    let mut rendered: Vec<(String, String)> = pairs
        .into_iter()
        .map(|(k, v)| (k.as_ref().to_string(), v.canonical_string()))
        .collect();
    rendered.sort();
    rendered
}

/// Compute the next layer of the tree from the current one.
///
/// Pairs adjacent hashes with [`node_hash`]. Duplicates the last element
/// when the layer has an odd number of entries.
fn next_layer(layer: &[B256]) -> Vec<B256> {
    layer
        .chunks(2)
        .map(|pair| match pair {
            [left, right] => node_hash(left, right),
            [last] => node_hash(last, last),
            _ => unreachable!("chunks(2) yields one or two elements"),
        })
        .collect()
}

/// Fold already-hashed leaves up to a root.
pub fn merkle_root(leaves: &[B256]) -> FactorsRoot {
    if leaves.is_empty() {
        return FactorsRoot::ZERO;
    }
    let mut current = leaves.to_vec();
    while current.len() > 1 {
        current = next_layer(&current);
    }
    FactorsRoot(current[0])
}

/// Commit to an unordered factor mapping.
///
/// Any permutation of the same pairs yields the same root.
pub fn commit<K, I>(pairs: I) -> FactorsRoot
where
    K: AsRef<str>,
    I: IntoIterator<Item = (K, FactorValue)>,
{
    let leaves: Vec<B256> = canonical_pairs(pairs)
        .iter()
        .map(|(k, v)| leaf_hash(k, v))
        .collect();
    merkle_root(&leaves)
}

/// Commit to the scored factors of a [`WalletFactors`]. `detail` is not committed.
pub fn commit_factors(factors: &WalletFactors) -> FactorsRoot {
    commit(factors.factor_pairs())
}

/// Full factor tree supporting single-factor disclosure proofs.
#[derive(Clone, Debug)]
pub struct FactorTree {
    /// Canonical `(key, value)` pairs in leaf order.
    pairs: Vec<(String, String)>,
    /// `layers[0]` = leaf hashes, `layers[last]` = `[root]`.
    layers: Vec<Vec<B256>>,
}

impl FactorTree {
    pub fn build<K, I>(pairs: I) -> Self
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, FactorValue)>,
    {
        let pairs = canonical_pairs(pairs);
        if pairs.is_empty() {
            return Self {
                pairs,
                layers: Vec::new(),
            };
        }

        let leaves: Vec<B256> = pairs.iter().map(|(k, v)| leaf_hash(k, v)).collect();
        let mut layers = vec![leaves];
        while let Some(top) = layers.last().filter(|l| l.len() > 1) {
            let next = next_layer(top);
            layers.push(next);
        }

        Self { pairs, layers }
    }

    /// Equal to [`commit`] over the same pairs.
    pub fn root(&self) -> FactorsRoot {
        self.layers
            .last()
            .and_then(|l| l.first())
            .map(|h| FactorsRoot(*h))
            .unwrap_or(FactorsRoot::ZERO)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Disclosure proof for the first factor named `key`.
    pub fn proof(&self, key: &str) -> Option<FactorProof> {
        let index = self.pairs.iter().position(|(k, _)| k == key)?;

        let mut path = Vec::new();
        let mut pos = index;
        for layer in &self.layers[..self.layers.len() - 1] {
            let sibling_pos = pos ^ 1;
            // Odd layer: last element's sibling is itself.
            let sibling = layer.get(sibling_pos).unwrap_or(&layer[pos]);
            let side = if pos % 2 == 0 { Side::Right } else { Side::Left };
            path.push(ProofStep {
                hash: *sibling,
                side,
            });
            pos /= 2;
        }

        let (key, value) = self.pairs[index].clone();
        Some(FactorProof { key, value, path })
    }
}

/// Which side a sibling hash is on relative to the current node.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ProofStep {
    pub hash: B256,
    pub side: Side,
}

/// Proof that a single `key:value` factor is part of a committed set.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct FactorProof {
    pub key: String,
    /// Canonical rendering of the value.
    pub value: String,
    pub path: Vec<ProofStep>,
}

impl FactorProof {
    pub fn verify(&self, expected_root: &FactorsRoot) -> bool {
        let mut current = leaf_hash(&self.key, &self.value);
        for step in &self.path {
            current = match step.side {
                Side::Left => node_hash(&step.hash, &current),
                Side::Right => node_hash(&current, &step.hash),
            };
        }
        FactorsRoot(current) == *expected_root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FactorDetail;
    use proptest::prelude::*;

    fn sample_pairs() -> Vec<(&'static str, FactorValue)> {
        vec![
            ("on_time_repayment_rate", FactorValue::Float(0.5)),
            ("default_count", FactorValue::Int(2)),
            ("avg_tx_frequency", FactorValue::Float(0.0082)),
            ("stablecoin_ratio", FactorValue::Float(0.0136)),
            ("staking_amount_eth", FactorValue::Float(2.0)),
        ]
    }

    // --- Hash primitives ---

    #[test]
    fn leaf_hash_is_keccak_of_joined_bytes() {
        assert_eq!(leaf_hash("a", "1"), keccak256(b"a:1"));
    }

    #[test]
    fn node_hash_order_matters() {
        let a = B256::repeat_byte(1);
        let b = B256::repeat_byte(2);
        assert_ne!(node_hash(&a, &b), node_hash(&b, &a));
    }

    #[test]
    fn leaf_separator_prevents_key_value_shift() {
        assert_ne!(leaf_hash("ab", "c"), leaf_hash("a", "bc"));
    }

    // --- merkle_root ---

    #[test]
    fn empty_set_is_zero_sentinel() {
        assert_eq!(commit(Vec::<(&str, FactorValue)>::new()), FactorsRoot::ZERO);
        assert_eq!(merkle_root(&[]), FactorsRoot::ZERO);
    }

    #[test]
    fn single_pair_root_is_leaf() {
        let root = commit([("k", FactorValue::Int(7))]);
        assert_eq!(root.0, leaf_hash("k", "7"));
    }

    #[test]
    fn three_leaves_duplicate_last() {
        let root = commit([
            ("c", FactorValue::Int(3)),
            ("a", FactorValue::Int(1)),
            ("b", FactorValue::Int(2)),
        ]);
        let la = leaf_hash("a", "1");
        let lb = leaf_hash("b", "2");
        let lc = leaf_hash("c", "3");
        let expected = node_hash(&node_hash(&la, &lb), &node_hash(&lc, &lc));
        assert_eq!(root.0, expected);
    }

    #[test]
    fn reversed_input_same_root() {
        let pairs = sample_pairs();
        let mut reversed = pairs.clone();
        reversed.reverse();
        assert_eq!(commit(pairs), commit(reversed));
    }

    #[test]
    fn single_value_change_changes_root() {
        let pairs = sample_pairs();
        let mut changed = pairs.clone();
        changed[1].1 = FactorValue::Int(3);
        assert_ne!(commit(pairs), commit(changed));
    }

    #[test]
    fn int_and_float_render_differently() {
        let as_int = commit([("x", FactorValue::Int(2))]);
        let as_float = commit([("x", FactorValue::Float(2.0))]);
        assert_ne!(as_int, as_float);
    }

    #[test]
    fn commit_factors_ignores_detail() {
        let a = WalletFactors {
            default_count: 2,
            stablecoin_ratio: 0.25,
            ..WalletFactors::default()
        };
        let mut b = a.clone();
        b.detail = FactorDetail {
            stable_usd: 3500.0,
            ..FactorDetail::default()
        };
        assert_eq!(commit_factors(&a), commit_factors(&b));
    }

    #[test]
    fn commit_factors_matches_pairs() {
        let f = WalletFactors {
            on_time_repayment_rate: 1.0,
            staking_tenure_days: 12,
            ..WalletFactors::default()
        };
        assert_eq!(commit_factors(&f), commit(f.factor_pairs()));
        assert!(!commit_factors(&f).is_zero());
    }

    // --- FactorTree ---

    #[test]
    fn tree_root_matches_commit() {
        for n in 0..=8 {
            let pairs: Vec<(String, FactorValue)> = (0..n)
                .map(|i| (format!("k{i}"), FactorValue::Int(i as u64)))
                .collect();
            let tree = FactorTree::build(pairs.clone());
            assert_eq!(tree.root(), commit(pairs), "mismatch at n={n}");
            assert_eq!(tree.len(), n);
        }
    }

    #[test]
    fn every_factor_proof_verifies() {
        let tree = FactorTree::build(sample_pairs());
        let root = tree.root();
        for (key, _) in sample_pairs() {
            let proof = tree.proof(key).unwrap();
            assert_eq!(proof.key, key);
            assert!(proof.verify(&root), "proof failed for {key}");
        }
    }

    #[test]
    fn proof_for_unknown_key_is_none() {
        let tree = FactorTree::build(sample_pairs());
        assert!(tree.proof("debt_utilization").is_none());
        assert!(FactorTree::build(Vec::<(&str, FactorValue)>::new()).proof("x").is_none());
    }

    #[test]
    fn tampered_value_fails_verification() {
        let tree = FactorTree::build(sample_pairs());
        let mut proof = tree.proof("default_count").unwrap();
        proof.value = "0".into();
        assert!(!proof.verify(&tree.root()));
    }

    #[test]
    fn single_leaf_proof_has_empty_path() {
        let tree = FactorTree::build([("only", FactorValue::Float(1.5))]);
        let proof = tree.proof("only").unwrap();
        assert!(proof.path.is_empty());
        assert!(proof.verify(&tree.root()));
    }

    // --- proptest ---

    fn arb_value() -> impl Strategy<Value = FactorValue> {
        prop_oneof![
            any::<u64>().prop_map(FactorValue::Int),
            (0.0f64..1.0e9).prop_map(FactorValue::Float),
        ]
    }

    proptest! {
        #[test]
        fn root_invariant_under_permutation(
            map in proptest::collection::btree_map("[a-z_]{1,12}", arb_value(), 0..12),
            seed in any::<u64>(),
        ) {
            let pairs: Vec<(String, FactorValue)> = map.into_iter().collect();
            let mut shuffled = pairs.clone();
            // Deterministic Fisher-Yates driven by `seed`.
            let mut s = seed;
            for i in (1..shuffled.len()).rev() {
                s = s.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                let j = (s >> 33) as usize % (i + 1);
                shuffled.swap(i, j);
            }
            prop_assert_eq!(commit(pairs), commit(shuffled));
        }

        #[test]
        fn root_sensitive_to_any_single_int_change(
            map in proptest::collection::btree_map("[a-z]{1,8}", any::<u32>(), 1..10),
            pick in any::<prop::sample::Index>(),
        ) {
            let pairs: Vec<(String, FactorValue)> = map
                .iter()
                .map(|(k, v)| (k.clone(), FactorValue::Int(*v as u64)))
                .collect();
            let mut changed = pairs.clone();
            let i = pick.index(changed.len());
            if let FactorValue::Int(v) = changed[i].1 {
                changed[i].1 = FactorValue::Int(v + 1);
            }
            prop_assert_ne!(commit(pairs), commit(changed));
        }

        #[test]
        fn non_empty_root_never_zero(
            map in proptest::collection::btree_map("[a-z]{1,8}", arb_value(), 1..10),
        ) {
            prop_assert!(!commit(map).is_zero());
        }
    }
}
