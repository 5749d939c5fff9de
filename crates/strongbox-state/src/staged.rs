use std::collections::BTreeMap;
use std::sync::MutexGuard;

use strongbox_core::claim::ClaimEntry;
use strongbox_core::deposit::{DepositKey, DepositRecord};
use strongbox_core::error::StrongboxError;
use strongbox_core::types::{AccountId, ClaimId};

use crate::db::StateDb;
use crate::ledger::{
    encode, operator_key, LedgerRead, Tree, NEXT_DEPOSITOR_SEQ, NEXT_KEY_SEQ,
};

/// Pending writes for one state-mutating call.
///
/// Reads through the overlay see its own writes first, then committed state.
/// Nothing reaches sled until [`Staged::commit`]; dropping the overlay
/// discards every change.
pub struct Staged<'a> {
    db: &'a StateDb,
    writes: BTreeMap<(Tree, Vec<u8>), Option<Vec<u8>>>,
    _writer: MutexGuard<'a, ()>,
}

impl<'a> Staged<'a> {
    pub(crate) fn new(db: &'a StateDb, writer: MutexGuard<'a, ()>) -> Self {
        Self { db, writes: BTreeMap::new(), _writer: writer }
    }

    fn put(&mut self, tree: Tree, key: Vec<u8>, value: Vec<u8>) {
        self.writes.insert((tree, key), Some(value));
    }

    fn delete(&mut self, tree: Tree, key: Vec<u8>) {
        self.writes.insert((tree, key), None);
    }

    // ── Deposits ─────────────────────────────────────────────────────────────

    pub fn put_deposit(&mut self, key: &DepositKey, record: &DepositRecord) -> Result<(), StrongboxError> {
        self.put(Tree::Deposits, key.storage_key()?, encode(record)?);
        Ok(())
    }

    /// Append `key` to the enumeration index; returns its sequence number.
    pub fn index_key(&mut self, key: &DepositKey) -> Result<u64, StrongboxError> {
        let seq = self.bump_counter(NEXT_KEY_SEQ)?;
        self.put(Tree::KeyIndex, seq.to_be_bytes().to_vec(), encode(key)?);
        Ok(seq)
    }

    pub fn unindex_key(&mut self, seq: u64) {
        self.delete(Tree::KeyIndex, seq.to_be_bytes().to_vec());
    }

    /// Record `account` as a depositor unless it already is one.
    pub fn note_depositor(&mut self, account: &AccountId) -> Result<(), StrongboxError> {
        if self.has_depositor(account)? {
            return Ok(());
        }
        let seq = self.bump_counter(NEXT_DEPOSITOR_SEQ)?;
        self.put(Tree::Depositors, seq.to_be_bytes().to_vec(), account.as_bytes().to_vec());
        self.put(Tree::DepositorSeen, account.as_bytes().to_vec(), seq.to_be_bytes().to_vec());
        Ok(())
    }

    // ── Claims ───────────────────────────────────────────────────────────────

    pub fn put_claim(&mut self, entry: &ClaimEntry) -> Result<(), StrongboxError> {
        self.put(Tree::Claims, entry.id.to_be_bytes().to_vec(), encode(entry)?);
        Ok(())
    }

    pub fn remove_claim(&mut self, id: ClaimId) {
        self.delete(Tree::Claims, id.to_be_bytes().to_vec());
    }

    pub fn set_claim_balance(&mut self, owner: &AccountId, count: u64) {
        if count == 0 {
            self.delete(Tree::ClaimBalances, owner.as_bytes().to_vec());
        } else {
            self.put(Tree::ClaimBalances, owner.as_bytes().to_vec(), count.to_be_bytes().to_vec());
        }
    }

    pub fn set_operator(&mut self, owner: &AccountId, operator: &AccountId, approved: bool) {
        let key = operator_key(owner, operator).to_vec();
        if approved {
            self.put(Tree::Operators, key, vec![1]);
        } else {
            self.delete(Tree::Operators, key);
        }
    }

    // ── Counters ─────────────────────────────────────────────────────────────

    pub fn set_counter(&mut self, name: &str, value: u64) {
        self.put(Tree::Meta, name.as_bytes().to_vec(), value.to_be_bytes().to_vec());
    }

    /// Returns the current value and stores its successor.
    pub fn bump_counter(&mut self, name: &str) -> Result<u64, StrongboxError> {
        let current = self.counter(name)?;
        let next = current.checked_add(1).ok_or(StrongboxError::Overflow)?;
        self.set_counter(name, next);
        Ok(current)
    }

    // ── Commit ───────────────────────────────────────────────────────────────

    /// Write everything in one sled transaction.
    pub fn commit(self) -> Result<(), StrongboxError> {
        self.db.commit(&self.writes)
    }
}

impl LedgerRead for Staged<'_> {
    fn raw(&self, tree: Tree, key: &[u8]) -> Result<Option<Vec<u8>>, StrongboxError> {
        match self.writes.get(&(tree, key.to_vec())) {
            Some(pending) => Ok(pending.clone()),
            None => self.db.raw(tree, key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strongbox_core::asset::AssetRef;
    use strongbox_core::deposit::DepositStatus;

    fn sample_record(creator: AccountId) -> DepositRecord {
        DepositRecord {
            creator,
            asset: AssetRef::Native,
            balance: 50,
            lock_for_days: 20,
            created_at: 1_000,
            price_feed: None,
            min_expected_price: 0,
            price_precision: 0,
            status: DepositStatus::Locked,
            index_seq: 0,
        }
    }

    #[test]
    fn overlay_reads_its_own_writes_before_commit() {
        let db = StateDb::temporary().unwrap();
        let alice = AccountId::from_label("alice");
        let key = DepositKey::Account(alice);

        let mut staged = db.stage();
        staged.put_deposit(&key, &sample_record(alice)).unwrap();
        assert_eq!(staged.deposit(&key).unwrap().unwrap().balance, 50);
        assert!(db.deposit(&key).unwrap().is_none(), "nothing visible before commit");

        staged.commit().unwrap();
        assert_eq!(db.deposit(&key).unwrap().unwrap().balance, 50);
    }

    #[test]
    fn dropped_overlay_leaves_no_trace() {
        let db = StateDb::temporary().unwrap();
        let alice = AccountId::from_label("alice");
        {
            let mut staged = db.stage();
            staged.put_deposit(&DepositKey::Account(alice), &sample_record(alice)).unwrap();
            staged.note_depositor(&alice).unwrap();
        }
        assert!(db.deposit(&DepositKey::Account(alice)).unwrap().is_none());
        assert!(db.depositors().unwrap().is_empty());
    }

    #[test]
    fn counters_start_at_zero_and_increment() {
        let db = StateDb::temporary().unwrap();
        let mut staged = db.stage();
        assert_eq!(staged.bump_counter("c").unwrap(), 0);
        assert_eq!(staged.bump_counter("c").unwrap(), 1);
        staged.commit().unwrap();
        assert_eq!(db.counter("c").unwrap(), 2);
    }

    #[test]
    fn enumeration_keeps_insertion_order_and_pruning() {
        let db = StateDb::temporary().unwrap();
        let alice = AccountId::from_label("alice");
        let bob = AccountId::from_label("bob");

        let mut staged = db.stage();
        let first = staged.index_key(&DepositKey::Account(bob)).unwrap();
        staged.index_key(&DepositKey::Account(alice)).unwrap();
        staged.note_depositor(&bob).unwrap();
        staged.note_depositor(&alice).unwrap();
        staged.note_depositor(&bob).unwrap();
        staged.commit().unwrap();

        assert_eq!(
            db.configured_keys().unwrap(),
            vec![DepositKey::Account(bob), DepositKey::Account(alice)]
        );
        assert_eq!(db.depositors().unwrap(), vec![bob, alice]);

        let mut staged = db.stage();
        staged.unindex_key(first);
        staged.commit().unwrap();
        assert_eq!(db.configured_keys().unwrap(), vec![DepositKey::Account(alice)]);
    }

    #[test]
    fn operator_flags_and_claim_balances() {
        let db = StateDb::temporary().unwrap();
        let alice = AccountId::from_label("alice");
        let bob = AccountId::from_label("bob");

        let mut staged = db.stage();
        staged.set_operator(&alice, &bob, true);
        staged.set_claim_balance(&alice, 3);
        staged.commit().unwrap();
        assert!(db.is_operator(&alice, &bob).unwrap());
        assert!(!db.is_operator(&bob, &alice).unwrap());
        assert_eq!(db.claim_balance(&alice).unwrap(), 3);

        let mut staged = db.stage();
        staged.set_operator(&alice, &bob, false);
        staged.set_claim_balance(&alice, 0);
        staged.commit().unwrap();
        assert!(!db.is_operator(&alice, &bob).unwrap());
        assert_eq!(db.claim_balance(&alice).unwrap(), 0);
    }
}
