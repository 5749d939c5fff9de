use std::sync::Arc;

use strongbox_claims::{ClaimReceiver, ClaimRegistry};
use strongbox_core::asset::AssetRef;
use strongbox_core::claim::ClaimEvent;
use strongbox_core::constants::{MAX_LOCK_DAYS, MIN_LOCK_DAYS};
use strongbox_core::deposit::{DepositKey, DepositRecord, DepositStatus};
use strongbox_core::error::{OracleError, StrongboxError};
use strongbox_core::types::{AccountId, Amount, FeedId};
use strongbox_state::{LedgerRead, Staged, StateDb};
use tracing::{info, warn};

use crate::clock::Clock;
use crate::config::{Enumeration, SlotPolicy, VaultConfig};
use crate::custody::AssetTransfer;
use crate::oracle::{normalize, PriceOracle};

// ── Requests ──────────────────────────────────────────────────────────────────

/// Parameters of a new deposit record, as supplied by the caller.
///
/// Numeric fields are wider than their stored form so that out-of-range input
/// is reported (`InvalidPrice`, `Overflow`, `TooLong`) instead of wrapping.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigureRequest {
    pub asset: AssetRef,
    pub lock_for_days: u64,
    /// `None` disables the price condition.
    pub price_feed: Option<FeedId>,
    pub min_expected_price: i128,
    pub price_precision: u64,
}

impl ConfigureRequest {
    /// Time condition only.
    pub fn time_lock(asset: AssetRef, lock_for_days: u64) -> Self {
        Self { asset, lock_for_days, price_feed: None, min_expected_price: 0, price_precision: 0 }
    }

    /// Add a price condition: release once `feed / precision >= min_expected_price`.
    pub fn with_price(mut self, feed: FeedId, min_expected_price: i128, price_precision: u64) -> Self {
        self.price_feed = Some(feed);
        self.min_expected_price = min_expected_price;
        self.price_precision = price_precision;
        self
    }
}

/// Validated numeric parameters in stored form.
struct Terms {
    lock_for_days: u32,
    min_expected_price: u64,
}

fn lock_days(days: u64) -> Result<u32, StrongboxError> {
    let days = u32::try_from(days).map_err(|_| StrongboxError::Overflow)?;
    if days > MAX_LOCK_DAYS {
        return Err(StrongboxError::TooLong { max_days: MAX_LOCK_DAYS });
    }
    Ok(days)
}

// ── LockVault ─────────────────────────────────────────────────────────────────

/// Release-condition engine and deposit ledger.
///
/// Every mutating call stages its writes, performs at most one external
/// asset movement, and commits only if that movement succeeded. A failure at
/// any step leaves records, claims and enumerations untouched.
pub struct LockVault {
    config: VaultConfig,
    db: Arc<StateDb>,
    claims: ClaimRegistry,
    custody: AccountId,
    clock: Arc<dyn Clock>,
    oracle: Arc<dyn PriceOracle>,
    assets: Arc<dyn AssetTransfer>,
}

impl LockVault {
    /// `custody` is the vault's own account: it holds deposited assets and is
    /// the admin of the claim registry.
    pub fn new(
        config: VaultConfig,
        db: Arc<StateDb>,
        custody: AccountId,
        clock: Arc<dyn Clock>,
        oracle: Arc<dyn PriceOracle>,
        assets: Arc<dyn AssetTransfer>,
    ) -> Self {
        let claims = ClaimRegistry::with_metadata(db.clone(), custody, &config.claim_name, &config.claim_symbol);
        Self { config, db, claims, custody, clock, oracle, assets }
    }

    pub fn with_receivers(mut self, receivers: Arc<dyn ClaimReceiver>) -> Self {
        self.claims = self.claims.with_receivers(receivers);
        self
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    pub fn custody(&self) -> &AccountId {
        &self.custody
    }

    /// Claim tokens handed out by this vault.
    pub fn claims(&self) -> &ClaimRegistry {
        &self.claims
    }

    // ── Configure ─────────────────────────────────────────────────────────────

    /// Create a record with zero balance. Claim vaults mint a new claim to
    /// `caller` and key the record by it.
    pub fn configure(&self, caller: &AccountId, req: &ConfigureRequest) -> Result<DepositKey, StrongboxError> {
        let terms = self.validate(req)?;
        let mut staged = self.db.stage();
        let mut events = Vec::new();
        let (key, record) = self.stage_configure(&mut staged, caller, req, terms, &mut events)?;
        staged.commit()?;
        self.claims.publish(events);
        info!(key = %key, creator = %caller, asset = %record.asset, lock_for_days = record.lock_for_days,
              unlocks_at = record.unlocks_at(), price_enabled = record.price_enabled(), "deposit configured");
        Ok(key)
    }

    /// Configure and fund in one step. Nothing is recorded if the asset
    /// movement fails.
    pub fn configure_with_deposit(
        &self,
        caller: &AccountId,
        req: &ConfigureRequest,
        amount: Amount,
    ) -> Result<DepositKey, StrongboxError> {
        let terms = self.validate(req)?;
        let mut staged = self.db.stage();
        let mut events = Vec::new();
        let (key, mut record) = self.stage_configure(&mut staged, caller, req, terms, &mut events)?;
        let moved = Self::credit(&mut record, amount)?;
        staged.put_deposit(&key, &record)?;
        self.assets.move_in(&record.asset, caller, &self.custody, moved)?;
        staged.commit()?;
        self.claims.publish(events);
        info!(key = %key, creator = %caller, asset = %record.asset, amount = moved,
              unlocks_at = record.unlocks_at(), "deposit configured and funded");
        Ok(key)
    }

    fn validate(&self, req: &ConfigureRequest) -> Result<Terms, StrongboxError> {
        let kind = req.asset.kind();
        if !self.config.accepts(kind) {
            return Err(StrongboxError::UnsupportedAsset(kind.name()));
        }
        if req.lock_for_days < u64::from(MIN_LOCK_DAYS) {
            return Err(StrongboxError::InvalidLockDays(req.lock_for_days));
        }
        let lock_for_days = lock_days(req.lock_for_days)?;

        if req.min_expected_price < 0 {
            return Err(StrongboxError::InvalidPrice(req.min_expected_price));
        }
        let min_expected_price = u64::try_from(req.min_expected_price).map_err(|_| StrongboxError::Overflow)?;

        match req.price_feed {
            None if min_expected_price != 0 => {
                return Err(StrongboxError::InvalidPriceConfig("minimum price requires a price feed"));
            }
            None => {}
            Some(_) if min_expected_price == 0 => {
                return Err(StrongboxError::InvalidPriceConfig("a price feed requires a non-zero minimum price"));
            }
            Some(_) if req.price_precision == 0 => {
                return Err(StrongboxError::InvalidPriceConfig("price precision must be non-zero"));
            }
            Some(feed) => {
                if let Err(e) = self.oracle.read(&feed) {
                    warn!(feed = %feed, error = %e, "price feed probe failed");
                    return Err(StrongboxError::InvalidPriceFeed(feed));
                }
            }
        }
        Ok(Terms { lock_for_days, min_expected_price })
    }

    fn stage_configure(
        &self,
        staged: &mut Staged<'_>,
        caller: &AccountId,
        req: &ConfigureRequest,
        terms: Terms,
        events: &mut Vec<ClaimEvent>,
    ) -> Result<(DepositKey, DepositRecord), StrongboxError> {
        let key = match self.config.slot_policy {
            SlotPolicy::Account => DepositKey::Account(*caller),
            SlotPolicy::AccountAsset => DepositKey::Holding { owner: *caller, asset: req.asset },
            SlotPolicy::Claim => DepositKey::Claim(self.claims.stage_mint(staged, &self.custody, caller, events)?),
        };
        if staged.deposit(&key)?.is_some() {
            return Err(StrongboxError::AlreadyConfigured);
        }

        let index_seq = staged.index_key(&key)?;
        staged.note_depositor(caller)?;
        let record = DepositRecord {
            creator: *caller,
            asset: req.asset,
            balance: 0,
            lock_for_days: terms.lock_for_days,
            created_at: self.clock.now(),
            price_feed: req.price_feed,
            min_expected_price: terms.min_expected_price,
            price_precision: if req.price_feed.is_some() { req.price_precision } else { 0 },
            status: DepositStatus::Locked,
            index_seq,
        };
        staged.put_deposit(&key, &record)?;
        Ok((key, record))
    }

    // ── Deposit ───────────────────────────────────────────────────────────────

    /// Pull `amount` of the record's asset from `caller` into custody.
    /// For items `amount` is ignored; the single item moves once.
    pub fn deposit(&self, caller: &AccountId, key: &DepositKey, amount: Amount) -> Result<(), StrongboxError> {
        let mut staged = self.db.stage();
        let mut record = Self::load(&staged, key)?;
        Self::authorize(&staged, key, caller)?;
        if record.is_withdrawn() {
            return Err(StrongboxError::AlreadyWithdrawn);
        }
        let moved = Self::credit(&mut record, amount)?;
        staged.put_deposit(key, &record)?;
        self.assets.move_in(&record.asset, caller, &self.custody, moved)?;
        staged.commit()?;
        info!(key = %key, from = %caller, amount = moved, balance = record.balance, "deposit received");
        Ok(())
    }

    /// Apply a deposit to the record; returns the quantity to move.
    fn credit(record: &mut DepositRecord, amount: Amount) -> Result<Amount, StrongboxError> {
        if record.asset.is_item() {
            if record.balance != 0 {
                return Err(StrongboxError::ItemAlreadyHeld);
            }
            record.balance = 1;
            return Ok(1);
        }
        record.balance = record.balance.checked_add(amount).ok_or(StrongboxError::Overflow)?;
        Ok(amount)
    }

    // ── Release condition ─────────────────────────────────────────────────────

    /// Whether the record's release condition holds now.
    ///
    /// Time is checked first and, once elapsed, the oracle is never read. A
    /// disabled price condition never reads it either. Otherwise a failed
    /// read is returned as an error.
    pub fn can_withdraw(&self, key: &DepositKey) -> Result<bool, StrongboxError> {
        let record = Self::load(self.db.as_ref(), key)?;
        self.release_condition(&record)
    }

    fn release_condition(&self, record: &DepositRecord) -> Result<bool, StrongboxError> {
        if record.is_withdrawn() {
            return Ok(false);
        }
        if record.time_elapsed(self.clock.now()) {
            return Ok(true);
        }
        if !record.price_enabled() {
            return Ok(false);
        }
        let feed = record
            .price_feed
            .ok_or(StrongboxError::InvalidPriceConfig("minimum price requires a price feed"))?;
        let raw = self.oracle.read(&feed).inspect_err(|e| {
            warn!(feed = %feed, error = %e, "price read failed during release check");
        })?;
        let price = normalize(raw, record.price_precision)?;
        Ok(price >= i128::from(record.min_expected_price))
    }

    // ── Withdraw ──────────────────────────────────────────────────────────────

    /// Pay the whole balance to `caller`, mark the record withdrawn and, for
    /// claim-keyed records, burn the claim. Returns the amount paid.
    pub fn withdraw(&self, caller: &AccountId, key: &DepositKey) -> Result<Amount, StrongboxError> {
        let mut staged = self.db.stage();
        let mut record = Self::load(&staged, key)?;
        Self::authorize(&staged, key, caller)?;
        if !self.release_condition(&record)? {
            return Err(StrongboxError::CannotWithdraw);
        }

        let amount = record.balance;
        record.balance = 0;
        record.status = DepositStatus::Withdrawn { withdrawn_at: self.clock.now() };
        staged.put_deposit(key, &record)?;
        if self.config.enumeration == Enumeration::PruneOnWithdraw {
            staged.unindex_key(record.index_seq);
        }
        let mut events = Vec::new();
        if let Some(id) = key.claim_id() {
            self.claims.stage_burn(&mut staged, &self.custody, id, &mut events)?;
        }

        if amount > 0 {
            self.assets.move_out(&record.asset, &self.custody, caller, amount)?;
        }
        staged.commit()?;
        self.claims.publish(events);
        info!(key = %key, to = %caller, amount, asset = %record.asset, "deposit withdrawn");
        Ok(amount)
    }

    // ── Increases ─────────────────────────────────────────────────────────────

    pub fn increase_lock_for_days(
        &self,
        caller: &AccountId,
        key: &DepositKey,
        new_value: u64,
    ) -> Result<(), StrongboxError> {
        let mut staged = self.db.stage();
        let mut record = self.load_for_update(&staged, key, caller)?;
        if new_value <= u64::from(record.lock_for_days) {
            return Err(StrongboxError::InvalidIncrease { current: u128::from(record.lock_for_days) });
        }
        record.lock_for_days = lock_days(new_value)?;
        staged.put_deposit(key, &record)?;
        staged.commit()?;
        info!(key = %key, lock_for_days = record.lock_for_days, unlocks_at = record.unlocks_at(),
              "lock duration increased");
        Ok(())
    }

    pub fn increase_min_expected_price(
        &self,
        caller: &AccountId,
        key: &DepositKey,
        new_value: i128,
    ) -> Result<(), StrongboxError> {
        let mut staged = self.db.stage();
        let mut record = self.load_for_update(&staged, key, caller)?;
        if !record.price_enabled() {
            return Err(StrongboxError::PriceDisabled);
        }
        if new_value < 0 {
            return Err(StrongboxError::InvalidPrice(new_value));
        }
        if new_value <= i128::from(record.min_expected_price) {
            return Err(StrongboxError::InvalidIncrease { current: u128::from(record.min_expected_price) });
        }
        record.min_expected_price = u64::try_from(new_value).map_err(|_| StrongboxError::Overflow)?;
        staged.put_deposit(key, &record)?;
        staged.commit()?;
        info!(key = %key, min_expected_price = record.min_expected_price, "minimum price increased");
        Ok(())
    }

    fn load_for_update(
        &self,
        staged: &Staged<'_>,
        key: &DepositKey,
        caller: &AccountId,
    ) -> Result<DepositRecord, StrongboxError> {
        let record = Self::load(staged, key)?;
        Self::authorize(staged, key, caller)?;
        if record.is_withdrawn() {
            return Err(StrongboxError::AlreadyWithdrawn);
        }
        Ok(record)
    }

    // ── Price reads ───────────────────────────────────────────────────────────

    /// Read `feed` and normalise by `precision`.
    pub fn check_price_feed(&self, feed: &FeedId, precision: u64) -> Result<i128, StrongboxError> {
        if precision == 0 {
            return Err(StrongboxError::InvalidPriceConfig("price precision must be non-zero"));
        }
        let raw = self.oracle.read(feed).map_err(|e| match e {
            OracleError::NotAFeed(feed) => StrongboxError::InvalidPriceFeed(feed),
            other => StrongboxError::Oracle(other),
        })?;
        normalize(raw, precision)
    }

    /// Current normalised price for the record's feed; `0` when its price
    /// condition is disabled.
    pub fn get_price(&self, key: &DepositKey) -> Result<i128, StrongboxError> {
        let record = Self::load(self.db.as_ref(), key)?;
        match record.price_feed {
            Some(feed) if record.price_enabled() => self.check_price_feed(&feed, record.price_precision),
            _ => Ok(0),
        }
    }

    // ── Reads ─────────────────────────────────────────────────────────────────

    pub fn record(&self, key: &DepositKey) -> Result<DepositRecord, StrongboxError> {
        Self::load(self.db.as_ref(), key)
    }

    /// Keys in configuration order. Withdrawn keys are listed unless the
    /// vault prunes on withdrawal.
    pub fn configured_keys(&self) -> Result<Vec<DepositKey>, StrongboxError> {
        self.db.configured_keys()
    }

    /// Every account that ever configured a record, first-seen order.
    pub fn depositors(&self) -> Result<Vec<AccountId>, StrongboxError> {
        self.db.depositors()
    }

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn load(view: &impl LedgerRead, key: &DepositKey) -> Result<DepositRecord, StrongboxError> {
        view.deposit(key)?.ok_or(StrongboxError::NotConfigured)
    }

    /// The controlling account is the key's owner, or the current holder of
    /// the claim for claim-keyed records.
    fn authorize(view: &impl LedgerRead, key: &DepositKey, caller: &AccountId) -> Result<(), StrongboxError> {
        let holder = match (key.claim_id(), key.direct_owner()) {
            (Some(id), _) => ClaimRegistry::owner_in(view, id)?,
            (None, Some(owner)) => *owner,
            (None, None) => return Err(StrongboxError::AccessDenied),
        };
        if holder != *caller {
            return Err(StrongboxError::AccessDenied);
        }
        Ok(())
    }
}
