//! Asset movement between depositors and vault custody.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};

use strongbox_core::asset::AssetRef;
use strongbox_core::error::TransferError;
use strongbox_core::types::{AccountId, Amount};

/// Atomic transfer primitive for every asset kind. Either the whole move
/// happens or the call fails and nothing changes.
///
/// For [`AssetRef::Item`] the amount is the item count and is always `1`.
pub trait AssetTransfer: Send + Sync {
    fn move_in(
        &self,
        asset: &AssetRef,
        from: &AccountId,
        custody: &AccountId,
        amount: Amount,
    ) -> Result<(), TransferError>;

    fn move_out(
        &self,
        asset: &AssetRef,
        custody: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), TransferError>;
}

#[derive(Debug, Default)]
struct Books {
    native: HashMap<AccountId, Amount>,
    tokens: HashSet<AccountId>,
    token_balances: HashMap<(AccountId, AccountId), Amount>,
    /// (token, owner, spender) -> remaining allowance
    allowances: HashMap<(AccountId, AccountId, AccountId), Amount>,
    item_owners: HashMap<(AccountId, u64), AccountId>,
    item_approvals: HashMap<(AccountId, u64), AccountId>,
}

/// Move `amount` between two balances, checking both sides before
/// either is written.
fn shift<K: Copy + Eq + Hash>(
    balances: &mut HashMap<K, Amount>,
    from: K,
    to: K,
    amount: Amount,
) -> Result<(), TransferError> {
    let have = balances.get(&from).copied().unwrap_or(0);
    if have < amount {
        return Err(TransferError::InsufficientBalance { need: amount, have });
    }
    if from == to {
        return Ok(());
    }
    let held = balances.get(&to).copied().unwrap_or(0);
    let credited = held.checked_add(amount).ok_or(TransferError::BalanceOverflow { held, amount })?;
    balances.insert(from, have - amount);
    balances.insert(to, credited);
    Ok(())
}

impl Books {
    fn shift_token(&mut self, token: &AccountId, from: &AccountId, to: &AccountId, amount: Amount) -> Result<(), TransferError> {
        if !self.tokens.contains(token) {
            return Err(TransferError::UnknownAsset(token.to_string()));
        }
        shift(&mut self.token_balances, (*token, *from), (*token, *to), amount)
    }

    fn move_item(&mut self, collection: &AccountId, item_id: u64, from: &AccountId, to: &AccountId) -> Result<(), TransferError> {
        match self.item_owners.get(&(*collection, item_id)) {
            Some(owner) if owner == from => {}
            _ => return Err(TransferError::NotItemOwner),
        }
        self.item_owners.insert((*collection, item_id), *to);
        self.item_approvals.remove(&(*collection, item_id));
        Ok(())
    }
}

/// In-memory ledger of native balances, fungible tokens with allowances, and
/// non-fungible items with per-item approvals.
///
/// Pulling a fungible token into custody consumes exactly the moved amount
/// of the allowance the source granted to the custody account. Pulling an
/// item requires the custody account to be approved for it.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    books: Mutex<Books>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn books(&self) -> MutexGuard<'_, Books> {
        self.books.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Seeding ──────────────────────────────────────────────────────────────

    pub fn fund_native(&self, to: &AccountId, amount: Amount) {
        let mut books = self.books();
        let held = books.native.entry(*to).or_insert(0);
        *held = held.saturating_add(amount);
    }

    pub fn mint_tokens(&self, token: &AccountId, to: &AccountId, amount: Amount) {
        let mut books = self.books();
        books.tokens.insert(*token);
        let held = books.token_balances.entry((*token, *to)).or_insert(0);
        *held = held.saturating_add(amount);
    }

    pub fn mint_item(&self, collection: &AccountId, item_id: u64, to: &AccountId) {
        self.books().item_owners.insert((*collection, item_id), *to);
    }

    // ── Approvals ────────────────────────────────────────────────────────────

    /// Set (not add to) the allowance `owner` grants `spender` on `token`.
    pub fn approve_tokens(&self, token: &AccountId, owner: &AccountId, spender: &AccountId, amount: Amount) {
        self.books().allowances.insert((*token, *owner, *spender), amount);
    }

    pub fn approve_item(
        &self,
        collection: &AccountId,
        item_id: u64,
        owner: &AccountId,
        spender: &AccountId,
    ) -> Result<(), TransferError> {
        let mut books = self.books();
        if books.item_owners.get(&(*collection, item_id)) != Some(owner) {
            return Err(TransferError::NotItemOwner);
        }
        books.item_approvals.insert((*collection, item_id), *spender);
        Ok(())
    }

    // ── Reads ────────────────────────────────────────────────────────────────

    /// Holdings of `holder` in `asset`; `0`/`1` for items.
    pub fn balance(&self, asset: &AssetRef, holder: &AccountId) -> Amount {
        let books = self.books();
        match asset {
            AssetRef::Native => books.native.get(holder).copied().unwrap_or(0),
            AssetRef::Fungible(token) => books.token_balances.get(&(*token, *holder)).copied().unwrap_or(0),
            AssetRef::Item { collection, item_id } => {
                Amount::from(books.item_owners.get(&(*collection, *item_id)) == Some(holder))
            }
        }
    }

    pub fn allowance(&self, token: &AccountId, owner: &AccountId, spender: &AccountId) -> Amount {
        self.books().allowances.get(&(*token, *owner, *spender)).copied().unwrap_or(0)
    }

    pub fn item_owner(&self, collection: &AccountId, item_id: u64) -> Option<AccountId> {
        self.books().item_owners.get(&(*collection, item_id)).copied()
    }
}

impl AssetTransfer for InMemoryLedger {
    fn move_in(
        &self,
        asset: &AssetRef,
        from: &AccountId,
        custody: &AccountId,
        amount: Amount,
    ) -> Result<(), TransferError> {
        let mut books = self.books();
        match asset {
            AssetRef::Native => shift(&mut books.native, *from, *custody, amount)?,
            AssetRef::Fungible(token) => {
                let key = (*token, *from, *custody);
                let approved = books.allowances.get(&key).copied().unwrap_or(0);
                if approved < amount {
                    return Err(TransferError::InsufficientAllowance { need: amount, approved });
                }
                books.shift_token(token, from, custody, amount)?;
                books.allowances.insert(key, approved - amount);
            }
            AssetRef::Item { collection, item_id } => {
                if books.item_approvals.get(&(*collection, *item_id)) != Some(custody) {
                    return Err(TransferError::NotItemOwner);
                }
                books.move_item(collection, *item_id, from, custody)?;
            }
        }
        Ok(())
    }

    fn move_out(
        &self,
        asset: &AssetRef,
        custody: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), TransferError> {
        let mut books = self.books();
        match asset {
            AssetRef::Native => shift(&mut books.native, *custody, *to, amount)?,
            AssetRef::Fungible(token) => books.shift_token(token, custody, to, amount)?,
            AssetRef::Item { collection, item_id } => {
                books.move_item(collection, *item_id, custody, to)?;
            }
        }
        Ok(())
    }
}
