//! strongbox-claims
//!
//! The claim token: a non-fungible, transferable receipt for one deposit.
//! Only the registry admin (the vault) mints and burns; holders transfer,
//! approve and freeze. Freezing is one-way and blocks transfers only.

pub mod receiver;
pub mod registry;

pub use receiver::{ClaimReceiver, NoContracts, Receipt, ReceiverRegistry};
pub use registry::ClaimRegistry;
