use serde::de::DeserializeOwned;
use serde::Serialize;
use strongbox_core::claim::ClaimEntry;
use strongbox_core::deposit::{DepositKey, DepositRecord};
use strongbox_core::error::StrongboxError;
use strongbox_core::types::{AccountId, ClaimId};

/// Named sled trees (analogous to column families).
///
///   deposits        — bincode(DepositKey) → bincode(DepositRecord)
///   claims          — ClaimId BE          → bincode(ClaimEntry)
///   claim_balances  — AccountId bytes     → u64 BE (claims held)
///   operators       — owner ‖ operator    → [1]
///   key_index       — seq BE              → bincode(DepositKey)
///   depositors      — seq BE              → AccountId bytes
///   depositor_seen  — AccountId bytes     → seq BE
///   meta            — utf8 counter name   → u64 BE
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tree {
    Deposits,
    Claims,
    ClaimBalances,
    Operators,
    KeyIndex,
    Depositors,
    DepositorSeen,
    Meta,
}

impl Tree {
    pub fn name(self) -> &'static str {
        match self {
            Tree::Deposits => "deposits",
            Tree::Claims => "claims",
            Tree::ClaimBalances => "claim_balances",
            Tree::Operators => "operators",
            Tree::KeyIndex => "key_index",
            Tree::Depositors => "depositors",
            Tree::DepositorSeen => "depositor_seen",
            Tree::Meta => "meta",
        }
    }
}

// ── Counter names in the `meta` tree ─────────────────────────────────────────

pub const NEXT_CLAIM_ID: &str = "next_claim_id";
pub const CLAIM_SUPPLY: &str = "claim_supply";
pub const NEXT_KEY_SEQ: &str = "next_key_seq";
pub const NEXT_DEPOSITOR_SEQ: &str = "next_depositor_seq";

// ── Encoding helpers ─────────────────────────────────────────────────────────

pub(crate) fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, StrongboxError> {
    bincode::serialize(value).map_err(|e| StrongboxError::Serialization(e.to_string()))
}

pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StrongboxError> {
    bincode::deserialize(bytes).map_err(|e| StrongboxError::Serialization(e.to_string()))
}

pub(crate) fn decode_u64(bytes: &[u8]) -> Result<u64, StrongboxError> {
    let arr: [u8; 8] = bytes
        .try_into()
        .map_err(|_| StrongboxError::Serialization(format!("expected 8 bytes, got {}", bytes.len())))?;
    Ok(u64::from_be_bytes(arr))
}

pub(crate) fn operator_key(owner: &AccountId, operator: &AccountId) -> [u8; 64] {
    let mut key = [0u8; 64];
    key[..32].copy_from_slice(owner.as_bytes());
    key[32..].copy_from_slice(operator.as_bytes());
    key
}

/// Typed reads over raw tree lookups. Implemented by the committed database
/// and by the staged overlay, so validation logic reads the same either way.
pub trait LedgerRead {
    fn raw(&self, tree: Tree, key: &[u8]) -> Result<Option<Vec<u8>>, StrongboxError>;

    fn deposit(&self, key: &DepositKey) -> Result<Option<DepositRecord>, StrongboxError> {
        match self.raw(Tree::Deposits, &key.storage_key()?)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn claim(&self, id: ClaimId) -> Result<Option<ClaimEntry>, StrongboxError> {
        match self.raw(Tree::Claims, &id.to_be_bytes())? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Number of claims held by `owner`.
    fn claim_balance(&self, owner: &AccountId) -> Result<u64, StrongboxError> {
        match self.raw(Tree::ClaimBalances, owner.as_bytes())? {
            Some(bytes) => decode_u64(&bytes),
            None => Ok(0),
        }
    }

    fn is_operator(&self, owner: &AccountId, operator: &AccountId) -> Result<bool, StrongboxError> {
        Ok(self.raw(Tree::Operators, &operator_key(owner, operator))?.is_some())
    }

    fn counter(&self, name: &str) -> Result<u64, StrongboxError> {
        match self.raw(Tree::Meta, name.as_bytes())? {
            Some(bytes) => decode_u64(&bytes),
            None => Ok(0),
        }
    }

    fn has_depositor(&self, account: &AccountId) -> Result<bool, StrongboxError> {
        Ok(self.raw(Tree::DepositorSeen, account.as_bytes())?.is_some())
    }
}
