//! strongbox-state
//!
//! Persistent ledger for deposit records and claim tokens, backed by sled.
//! Reads go through [`LedgerRead`]; writes are collected in a [`Staged`]
//! overlay and committed in a single transaction.

pub mod db;
pub mod ledger;
pub mod staged;

pub use db::StateDb;
pub use ledger::{LedgerRead, Tree};
pub use staged::Staged;
