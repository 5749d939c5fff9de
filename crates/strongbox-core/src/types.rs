use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::StrongboxError;

/// Locked quantity of a fungible or native asset, in the asset's base unit.
/// Non-fungible deposits use `0` (absent) or `1` (held).
pub type Amount = u128;

/// Unix timestamp (seconds, UTC).
pub type Timestamp = i64;

// ── AccountId ────────────────────────────────────────────────────────────────

/// 32-byte account identifier. Covers both externally-owned accounts and
/// contract-like recipients (asset contracts, price feeds, receivers).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(pub [u8; 32]);

impl AccountId {
    /// The null account. Never a valid owner or transfer target.
    pub const ZERO: AccountId = AccountId([0u8; 32]);

    pub fn from_bytes(b: [u8; 32]) -> Self {
        Self(b)
    }

    /// Deterministic account derived as BLAKE3(label). Handy for fixtures
    /// and for naming well-known custody accounts.
    pub fn from_label(label: &str) -> Self {
        Self(*blake3::hash(label.as_bytes()).as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Base-58 encoded string representation.
    pub fn to_b58(&self) -> String {
        bs58::encode(&self.0).into_string()
    }

    /// Parse a base-58 account. Anything that does not decode to exactly
    /// 32 bytes is rejected.
    pub fn from_b58(s: &str) -> Result<Self, StrongboxError> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| StrongboxError::Serialization(format!("account {s:?}: {e}")))?;
        let arr: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
            StrongboxError::Serialization(format!("account {s:?}: expected 32 bytes, got {}", bytes.len()))
        })?;
        Ok(Self(arr))
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_b58())
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b58 = self.to_b58();
        write!(f, "AccountId({})", &b58[..b58.len().min(8)])
    }
}

// ── ClaimId ──────────────────────────────────────────────────────────────────

/// Sequential identifier of a claim token. Allocated from 0 upwards and never
/// reused after burn.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClaimId(pub u64);

impl ClaimId {
    /// Big-endian bytes, so sled iterates claims in mint order.
    pub fn to_be_bytes(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }
}

impl fmt::Display for ClaimId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Debug for ClaimId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClaimId({})", self.0)
    }
}

// ── FeedId ───────────────────────────────────────────────────────────────────

/// Handle of a price feed. The feed is addressed like any other account; an
/// account that does not answer price reads is simply not a feed.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Debug)]
pub struct FeedId(pub AccountId);

impl FeedId {
    pub fn to_hex(&self) -> String {
        hex::encode(self.0 .0)
    }
}

impl fmt::Display for FeedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "feed:{}", &self.to_hex()[..16])
    }
}
