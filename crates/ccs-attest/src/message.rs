//! The typed `Score` struct signed under the attestation domain, and the
//! verifier's `submit` call.

use alloy_primitives::U256;
use alloy_sol_types::sol;
use ccs_core::types::Attestation;

sol! {
    /// EIP-712 primary type. Field order and names are part of the type hash.
    #[derive(Debug, PartialEq, Eq)]
    struct Score {
        address wallet;
        uint256 score;
        bytes32 factorsRoot;
        uint256 validUntil;
        uint256 nonce;
    }

    /// Verifier entry point receiving a signed attestation.
    function submit(
        address wallet,
        uint256 score,
        bytes32 factorsRoot,
        uint256 validUntil,
        uint256 nonce,
        bytes signature
    ) external;
}

impl From<&Attestation> for Score {
    fn from(att: &Attestation) -> Self {
        Score {
            wallet: att.wallet,
            score: U256::from(att.score.value()),
            factorsRoot: att.factors_root.0,
            validUntil: U256::from(att.valid_until),
            nonce: att.nonce,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, B256, Bytes, keccak256};
    use alloy_sol_types::SolStruct;
    use ccs_core::types::{FactorsRoot, Score as CreditScore};

    #[test]
    fn type_string_matches_verifier() {
        let msg = Score::from(&Attestation {
            wallet: Address::ZERO,
            score: CreditScore::MIN,
            factors_root: FactorsRoot::ZERO,
            valid_until: 0,
            nonce: U256::ZERO,
            signature: Bytes::new(),
        });
        assert_eq!(
            Score::eip712_encode_type(),
            "Score(address wallet,uint256 score,bytes32 factorsRoot,uint256 validUntil,uint256 nonce)"
        );
        assert_eq!(msg.eip712_type_hash(), keccak256(Score::eip712_encode_type().as_bytes()));
    }

    #[test]
    fn fields_copied_from_attestation() {
        let att = Attestation {
            wallet: Address::repeat_byte(0x11),
            score: CreditScore::saturating(73),
            factors_root: FactorsRoot(B256::repeat_byte(0xab)),
            valid_until: 1_700_003_600,
            nonce: U256::from(42u64),
            signature: Bytes::new(),
        };
        let msg = Score::from(&att);
        assert_eq!(msg.wallet, att.wallet);
        assert_eq!(msg.score, U256::from(73u64));
        assert_eq!(msg.factorsRoot, att.factors_root.0);
        assert_eq!(msg.validUntil, U256::from(1_700_003_600u64));
        assert_eq!(msg.nonce, U256::from(42u64));
    }
}
