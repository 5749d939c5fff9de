//! strongbox-vault
//!
//! The lock-vault engine: deposits held under a time-or-price release
//! condition, optionally keyed by transferable claim tokens.
//!
//! Collaborators are traits ([`Clock`], [`PriceOracle`], [`AssetTransfer`])
//! with in-memory reference implementations for tests and simulations.

pub mod clock;
pub mod config;
pub mod custody;
pub mod oracle;
pub mod vault;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Enumeration, SlotPolicy, VaultConfig};
pub use custody::{AssetTransfer, InMemoryLedger};
pub use oracle::{normalize, FeedBoard, PriceOracle};
pub use vault::{ConfigureRequest, LockVault};
