//! EIP-712 domain descriptor.

use std::borrow::Cow;

use alloy_primitives::{Address, U256};
use alloy_sol_types::Eip712Domain;
use ccs_core::constants::{
    DEFAULT_CHAIN_ID, DEFAULT_VERIFYING_CONTRACT, EIP712_DOMAIN_NAME, EIP712_DOMAIN_VERSION,
};
use serde::{Deserialize, Serialize};

/// Domain separation for attestations: a signature under one domain never
/// verifies under another chain or verifier contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttestationDomain {
    pub name: String,
    pub version: String,
    pub chain_id: u64,
    pub verifying_contract: Address,
}

impl Default for AttestationDomain {
    fn default() -> Self {
        Self {
            name: EIP712_DOMAIN_NAME.to_string(),
            version: EIP712_DOMAIN_VERSION.to_string(),
            chain_id: DEFAULT_CHAIN_ID,
            verifying_contract: DEFAULT_VERIFYING_CONTRACT,
        }
    }
}

impl AttestationDomain {
    pub fn to_eip712(&self) -> Eip712Domain {
        Eip712Domain::new(
            Some(Cow::Owned(self.name.clone())),
            Some(Cow::Owned(self.version.clone())),
            Some(U256::from(self.chain_id)),
            Some(self.verifying_contract),
            None,
        )
    }
}
