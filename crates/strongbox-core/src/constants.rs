/// ─── Strongbox Constants ─────────────────────────────────────────────────────
///
/// Release-condition and claim-token parameters shared by every vault variant.

// ── Time ─────────────────────────────────────────────────────────────────────

/// Seconds in one lock day. Lock durations are whole days from `created_at`.
pub const SECONDS_PER_DAY: i64 = 86_400;

/// Minimum `lock_for_days` accepted at configuration.
pub const MIN_LOCK_DAYS: u32 = 1;

/// Ceiling on the total lock duration, at configuration and on increase.
pub const MAX_LOCK_DAYS: u32 = 10_000;

// ── Claim token ──────────────────────────────────────────────────────────────

/// Default claim-token collection name.
pub const DEFAULT_CLAIM_NAME: &str = "LockerPass";

/// Default claim-token ticker.
pub const DEFAULT_CLAIM_SYMBOL: &str = "LOP";
