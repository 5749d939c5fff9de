use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::Transactional;
use strongbox_core::deposit::DepositKey;
use strongbox_core::error::StrongboxError;
use strongbox_core::types::AccountId;
use tracing::debug;

use crate::ledger::{decode, LedgerRead, Tree};
use crate::staged::Staged;

fn storage(e: sled::Error) -> StrongboxError {
    StrongboxError::Storage(e.to_string())
}

/// Persistent state database backed by sled (pure-Rust, no C dependencies).
///
/// See [`Tree`] for the layout of the named trees.
pub struct StateDb {
    db: sled::Db,
    /// Held by every open [`Staged`] overlay; serializes mutating calls.
    writer: Mutex<()>,
    deposits: sled::Tree,
    claims: sled::Tree,
    claim_balances: sled::Tree,
    operators: sled::Tree,
    key_index: sled::Tree,
    depositors: sled::Tree,
    depositor_seen: sled::Tree,
    meta: sled::Tree,
}

impl StateDb {
    /// Open or create the state database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StrongboxError> {
        let db = sled::open(path).map_err(storage)?;
        Self::from_db(db)
    }

    /// Throwaway database, removed when dropped.
    pub fn temporary() -> Result<Self, StrongboxError> {
        let db = sled::Config::new().temporary(true).open().map_err(storage)?;
        Self::from_db(db)
    }

    fn from_db(db: sled::Db) -> Result<Self, StrongboxError> {
        Ok(Self {
            deposits: db.open_tree(Tree::Deposits.name()).map_err(storage)?,
            claims: db.open_tree(Tree::Claims.name()).map_err(storage)?,
            claim_balances: db.open_tree(Tree::ClaimBalances.name()).map_err(storage)?,
            operators: db.open_tree(Tree::Operators.name()).map_err(storage)?,
            key_index: db.open_tree(Tree::KeyIndex.name()).map_err(storage)?,
            depositors: db.open_tree(Tree::Depositors.name()).map_err(storage)?,
            depositor_seen: db.open_tree(Tree::DepositorSeen.name()).map_err(storage)?,
            meta: db.open_tree(Tree::Meta.name()).map_err(storage)?,
            db,
            writer: Mutex::new(()),
        })
    }

    fn tree(&self, tree: Tree) -> &sled::Tree {
        match tree {
            Tree::Deposits => &self.deposits,
            Tree::Claims => &self.claims,
            Tree::ClaimBalances => &self.claim_balances,
            Tree::Operators => &self.operators,
            Tree::KeyIndex => &self.key_index,
            Tree::Depositors => &self.depositors,
            Tree::DepositorSeen => &self.depositor_seen,
            Tree::Meta => &self.meta,
        }
    }

    /// Start a unit of work on top of the committed state.
    ///
    /// Blocks until any other open overlay is committed or dropped, so at most
    /// one mutating call is in flight. Do not open a second overlay on the same
    /// thread while one is held.
    pub fn stage(&self) -> Staged<'_> {
        let guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        Staged::new(self, guard)
    }

    // ── Enumeration ──────────────────────────────────────────────────────────

    /// Deposit keys in configuration order.
    pub fn configured_keys(&self) -> Result<Vec<DepositKey>, StrongboxError> {
        let mut keys = Vec::new();
        for item in self.key_index.iter() {
            let (_, value) = item.map_err(storage)?;
            keys.push(decode(&value)?);
        }
        Ok(keys)
    }

    /// Distinct configuring accounts in first-seen order.
    pub fn depositors(&self) -> Result<Vec<AccountId>, StrongboxError> {
        let mut accounts = Vec::new();
        for item in self.depositors.iter() {
            let (_, value) = item.map_err(storage)?;
            let arr: [u8; 32] = value.as_ref().try_into().map_err(|_| {
                StrongboxError::Serialization(format!("bad depositor entry ({} bytes)", value.len()))
            })?;
            accounts.push(AccountId::from_bytes(arr));
        }
        Ok(accounts)
    }

    // ── Commit ───────────────────────────────────────────────────────────────

    /// Apply staged writes atomically across all trees. `None` removes a key.
    pub(crate) fn commit(
        &self,
        writes: &BTreeMap<(Tree, Vec<u8>), Option<Vec<u8>>>,
    ) -> Result<(), StrongboxError> {
        if writes.is_empty() {
            return Ok(());
        }
        (
            &self.deposits,
            &self.claims,
            &self.claim_balances,
            &self.operators,
            &self.key_index,
            &self.depositors,
            &self.depositor_seen,
            &self.meta,
        )
            .transaction(
                |(deposits, claims, claim_balances, operators, key_index, depositors, depositor_seen, meta)| {
                    for ((tree, key), value) in writes {
                        let t = match tree {
                            Tree::Deposits => deposits,
                            Tree::Claims => claims,
                            Tree::ClaimBalances => claim_balances,
                            Tree::Operators => operators,
                            Tree::KeyIndex => key_index,
                            Tree::Depositors => depositors,
                            Tree::DepositorSeen => depositor_seen,
                            Tree::Meta => meta,
                        };
                        match value {
                            Some(v) => {
                                t.insert(key.as_slice(), v.as_slice())?;
                            }
                            None => {
                                t.remove(key.as_slice())?;
                            }
                        }
                    }
                    Ok::<(), ConflictableTransactionError<()>>(())
                },
            )
            .map_err(|e: TransactionError<()>| StrongboxError::Storage(format!("{e:?}")))?;
        debug!(writes = writes.len(), "committed staged writes");
        Ok(())
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> Result<(), StrongboxError> {
        self.db.flush().map_err(storage)?;
        Ok(())
    }
}

impl LedgerRead for StateDb {
    fn raw(&self, tree: Tree, key: &[u8]) -> Result<Option<Vec<u8>>, StrongboxError> {
        self.tree(tree)
            .get(key)
            .map(|v| v.map(|iv| iv.to_vec()))
            .map_err(storage)
    }
}
