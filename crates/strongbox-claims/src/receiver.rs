use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use strongbox_core::types::{AccountId, ClaimId};

/// Answer of a recipient asked to acknowledge an incoming claim.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Receipt {
    /// Plain account; nothing to ask.
    NotAContract,
    Accepted,
    /// Contract-like recipient without (or refusing) the receipt capability.
    Rejected,
}

/// Receipt capability consulted by safe transfers.
///
/// Consulted before the registry opens its write overlay, so implementations
/// may call back into the registry or the vault.
pub trait ClaimReceiver: Send + Sync {
    fn on_claim_received(
        &self,
        operator: &AccountId,
        from: &AccountId,
        to: &AccountId,
        id: ClaimId,
        data: &[u8],
    ) -> Receipt;
}

/// Every account is a plain account.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoContracts;

impl ClaimReceiver for NoContracts {
    fn on_claim_received(&self, _: &AccountId, _: &AccountId, _: &AccountId, _: ClaimId, _: &[u8]) -> Receipt {
        Receipt::NotAContract
    }
}

/// In-memory table of contract-like accounts and whether each one
/// implements the receipt capability.
#[derive(Debug, Default)]
pub struct ReceiverRegistry {
    contracts: Mutex<HashMap<AccountId, bool>>,
}

impl ReceiverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, contract: AccountId, accepts_claims: bool) {
        self.contracts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(contract, accepts_claims);
    }
}

impl ClaimReceiver for ReceiverRegistry {
    fn on_claim_received(&self, _: &AccountId, _: &AccountId, to: &AccountId, _: ClaimId, _: &[u8]) -> Receipt {
        match self.contracts.lock().unwrap_or_else(PoisonError::into_inner).get(to) {
            None => Receipt::NotAContract,
            Some(true) => Receipt::Accepted,
            Some(false) => Receipt::Rejected,
        }
    }
}
