use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::AccountId;

/// Identifies what a deposit holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetRef {
    /// The ledger's native currency.
    Native,
    /// A fungible token contract.
    Fungible(AccountId),
    /// One specific item of a non-fungible collection.
    Item { collection: AccountId, item_id: u64 },
}

/// Coarse asset class, used by vault configuration to accept or reject
/// whole families of assets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetKind {
    Native,
    Fungible,
    Item,
}

impl AssetKind {
    pub fn name(self) -> &'static str {
        match self {
            AssetKind::Native => "native",
            AssetKind::Fungible => "fungible",
            AssetKind::Item => "item",
        }
    }
}

impl AssetRef {
    pub fn kind(&self) -> AssetKind {
        match self {
            AssetRef::Native => AssetKind::Native,
            AssetRef::Fungible(_) => AssetKind::Fungible,
            AssetRef::Item { .. } => AssetKind::Item,
        }
    }

    pub fn is_item(&self) -> bool {
        matches!(self, AssetRef::Item { .. })
    }
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetRef::Native => write!(f, "native"),
            AssetRef::Fungible(token) => write!(f, "token:{}", token),
            AssetRef::Item { collection, item_id } => write!(f, "item:{}/{}", collection, item_id),
        }
    }
}
