//! strongbox-core::claim
//!
//! Records of the claim-token registry. A claim is the transferable right to
//! withdraw one deposit; ownership lives here, not on the deposit.

use serde::{Deserialize, Serialize};

use crate::error::StrongboxError;
use crate::types::{AccountId, ClaimId};

/// Transferability latch of a claim. Moves forward only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FreezeState {
    #[default]
    Unfrozen,
    /// No further transfers. Withdrawal is unaffected.
    Frozen,
}

impl FreezeState {
    /// The only transition: `Unfrozen -> Frozen`.
    pub fn freeze(self, id: ClaimId) -> Result<FreezeState, StrongboxError> {
        match self {
            FreezeState::Unfrozen => Ok(FreezeState::Frozen),
            FreezeState::Frozen => Err(StrongboxError::AlreadyFrozen(id)),
        }
    }

    pub fn is_frozen(self) -> bool {
        self == FreezeState::Frozen
    }
}

/// One live claim, stored in the `claims` sled tree under its big-endian id.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ClaimEntry {
    pub id: ClaimId,
    pub owner: AccountId,
    pub freeze: FreezeState,
    /// Single-claim delegate. Cleared on every transfer.
    pub approved: Option<AccountId>,
}

impl ClaimEntry {
    pub fn new(id: ClaimId, owner: AccountId) -> Self {
        Self { id, owner, freeze: FreezeState::Unfrozen, approved: None }
    }
}

/// Ownership/approval notification emitted by the registry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClaimEvent {
    /// `from == None` on mint, `to == None` on burn.
    Transfer { from: Option<AccountId>, to: Option<AccountId>, id: ClaimId },
    Approval { owner: AccountId, approved: Option<AccountId>, id: ClaimId },
    ApprovalForAll { owner: AccountId, operator: AccountId, approved: bool },
    Frozen { id: ClaimId },
}
