use serde::{Deserialize, Serialize};
use std::fmt;

use crate::asset::AssetRef;
use crate::constants::SECONDS_PER_DAY;
use crate::error::StrongboxError;
use crate::types::{AccountId, Amount, ClaimId, FeedId, Timestamp};

// ── DepositKey ───────────────────────────────────────────────────────────────

/// Primary key of a deposit record.
///
/// Which shape a vault hands out is fixed by its slot policy: one record per
/// account, one per account and asset, or one per minted claim token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DepositKey {
    Account(AccountId),
    Holding { owner: AccountId, asset: AssetRef },
    Claim(ClaimId),
}

impl DepositKey {
    /// Canonical bytes used as the sled key.
    pub fn storage_key(&self) -> Result<Vec<u8>, StrongboxError> {
        bincode::serialize(self).map_err(|e| StrongboxError::Serialization(e.to_string()))
    }

    /// The account that controls the record directly, if the key names one.
    /// Claim-keyed records are controlled by whoever holds the claim.
    pub fn direct_owner(&self) -> Option<&AccountId> {
        match self {
            DepositKey::Account(owner) | DepositKey::Holding { owner, .. } => Some(owner),
            DepositKey::Claim(_) => None,
        }
    }

    pub fn claim_id(&self) -> Option<ClaimId> {
        match self {
            DepositKey::Claim(id) => Some(*id),
            _ => None,
        }
    }
}

impl fmt::Display for DepositKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DepositKey::Account(owner) => write!(f, "account:{}", owner),
            DepositKey::Holding { owner, asset } => write!(f, "holding:{}:{}", owner, asset),
            DepositKey::Claim(id) => write!(f, "claim:{}", id),
        }
    }
}

// ── DepositStatus ────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DepositStatus {
    /// Accepting deposits, awaiting the release condition.
    Locked,
    /// Paid out. Terminal; the record stays readable with a zero balance.
    Withdrawn { withdrawn_at: Timestamp },
}

// ── DepositRecord ────────────────────────────────────────────────────────────

/// One configured deposit, stored in the `deposits` sled tree.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DepositRecord {
    /// Account that configured the deposit. For claim-keyed records the
    /// current claimant is whoever holds the claim, not necessarily this one.
    pub creator: AccountId,
    pub asset: AssetRef,
    /// Locked quantity; `0`/`1` for non-fungible items.
    pub balance: Amount,
    /// Minimum holding period in days. Only ever increases.
    pub lock_for_days: u32,
    /// Set once at configuration.
    pub created_at: Timestamp,
    /// `None` disables the price condition.
    pub price_feed: Option<FeedId>,
    /// `0` means disabled, permanently.
    pub min_expected_price: u64,
    /// Divisor applied to raw feed answers.
    pub price_precision: u64,
    pub status: DepositStatus,
    /// Position in the `key_index` tree, used to prune enumeration on withdrawal.
    pub index_seq: u64,
}

impl DepositRecord {
    /// Timestamp from which the time condition alone releases the deposit.
    pub fn unlocks_at(&self) -> Timestamp {
        self.created_at
            .saturating_add((self.lock_for_days as i64).saturating_mul(SECONDS_PER_DAY))
    }

    /// True once the minimum holding period has elapsed at `now`.
    pub fn time_elapsed(&self, now: Timestamp) -> bool {
        now.saturating_sub(self.created_at)
            >= (self.lock_for_days as i64).saturating_mul(SECONDS_PER_DAY)
    }

    pub fn price_enabled(&self) -> bool {
        self.min_expected_price != 0
    }

    pub fn is_withdrawn(&self) -> bool {
        matches!(self.status, DepositStatus::Withdrawn { .. })
    }
}
