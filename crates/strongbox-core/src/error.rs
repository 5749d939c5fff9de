use thiserror::Error;

use crate::types::{AccountId, ClaimId, FeedId};

/// Failure reported by a price feed read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleError {
    /// The handle does not answer price reads at all.
    #[error("{0} does not implement the price read capability")]
    NotAFeed(FeedId),

    /// The feed exists but its read failed.
    #[error("price feed {feed} failed: {reason}")]
    ReadFailed { feed: FeedId, reason: String },
}

/// Failure reported by the asset transfer primitive.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    #[error("insufficient balance: need {need}, have {have}")]
    InsufficientBalance { need: u128, have: u128 },

    #[error("insufficient allowance: need {need}, approved {approved}")]
    InsufficientAllowance { need: u128, approved: u128 },

    #[error("credit overflows recipient balance: holds {held}, receiving {amount}")]
    BalanceOverflow { held: u128, amount: u128 },

    #[error("caller is not token owner or approved")]
    NotItemOwner,

    #[error("unknown asset: {0}")]
    UnknownAsset(String),
}

#[derive(Debug, Error)]
pub enum StrongboxError {
    // ── Configuration errors ─────────────────────────────────────────────────
    #[error("deposit not configured")]
    NotConfigured,

    #[error("deposit already configured")]
    AlreadyConfigured,

    #[error("invalid price configuration: {0}")]
    InvalidPriceConfig(&'static str),

    #[error("invalid price feed: {0}")]
    InvalidPriceFeed(FeedId),

    #[error("price must not be negative (got {0})")]
    InvalidPrice(i128),

    #[error("invalid lockForDays value: {0}")]
    InvalidLockDays(u64),

    #[error("asset kind not accepted by this vault: {0}")]
    UnsupportedAsset(&'static str),

    // ── Increase errors ──────────────────────────────────────────────────────
    #[error("new value invalid: must be greater than current {current}")]
    InvalidIncrease { current: u128 },

    #[error("too long: maximum lock duration is {max_days} days")]
    TooLong { max_days: u32 },

    #[error("value overflows the stored numeric type")]
    Overflow,

    #[error("price condition disabled for this deposit; value invalid")]
    PriceDisabled,

    // ── Withdrawal errors ────────────────────────────────────────────────────
    #[error("cannot withdraw")]
    CannotWithdraw,

    #[error("deposit already withdrawn")]
    AlreadyWithdrawn,

    #[error("item already held for this deposit")]
    ItemAlreadyHeld,

    // ── Claim token errors ───────────────────────────────────────────────────
    #[error("Access denied")]
    AccessDenied,

    #[error("claim {0} is frozen")]
    Frozen(ClaimId),

    #[error("claim {0} already frozen")]
    AlreadyFrozen(ClaimId),

    #[error("invalid address: {0}")]
    InvalidAddress(AccountId),

    #[error("recipient {0} does not accept claim tokens")]
    UnsafeRecipient(AccountId),

    #[error("claim not found: {0}")]
    NotFound(ClaimId),

    // ── Collaborator failures ────────────────────────────────────────────────
    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error(transparent)]
    Transfer(#[from] TransferError),

    // ── Serialization / storage ──────────────────────────────────────────────
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("storage error: {0}")]
    Storage(String),
}
