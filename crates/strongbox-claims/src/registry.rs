use std::sync::{Arc, Mutex, PoisonError};

use strongbox_core::claim::{ClaimEntry, ClaimEvent};
use strongbox_core::constants::{DEFAULT_CLAIM_NAME, DEFAULT_CLAIM_SYMBOL};
use strongbox_core::error::StrongboxError;
use strongbox_core::types::{AccountId, ClaimId};
use strongbox_state::ledger::{CLAIM_SUPPLY, NEXT_CLAIM_ID};
use strongbox_state::{LedgerRead, Staged, StateDb};
use tracing::info;

use crate::receiver::{ClaimReceiver, NoContracts, Receipt};

/// How strictly a transfer authorizes its caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TransferMode {
    /// Owner, single-claim delegate or operator.
    Plain,
    /// Owner only; the claim is frozen afterwards.
    AndFreeze,
}

/// Claim-token registry.
///
/// Public mutators stage, commit and publish in one call. The `stage_*`
/// variants let the vault fold mint/burn into its own unit of work; events
/// they produce are published with [`ClaimRegistry::publish`] after commit.
pub struct ClaimRegistry {
    db: Arc<StateDb>,
    admin: AccountId,
    name: String,
    symbol: String,
    receivers: Arc<dyn ClaimReceiver>,
    journal: Mutex<Vec<ClaimEvent>>,
}

impl ClaimRegistry {
    pub fn new(db: Arc<StateDb>, admin: AccountId) -> Self {
        Self::with_metadata(db, admin, DEFAULT_CLAIM_NAME, DEFAULT_CLAIM_SYMBOL)
    }

    pub fn with_metadata(db: Arc<StateDb>, admin: AccountId, name: &str, symbol: &str) -> Self {
        Self {
            db,
            admin,
            name: name.to_string(),
            symbol: symbol.to_string(),
            receivers: Arc::new(NoContracts),
            journal: Mutex::new(Vec::new()),
        }
    }

    /// Replace the receipt capability consulted by safe transfers.
    pub fn with_receivers(mut self, receivers: Arc<dyn ClaimReceiver>) -> Self {
        self.receivers = receivers;
        self
    }

    // ── Reads ────────────────────────────────────────────────────────────────

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn admin(&self) -> &AccountId {
        &self.admin
    }

    pub fn total_supply(&self) -> Result<u64, StrongboxError> {
        self.db.counter(CLAIM_SUPPLY)
    }

    /// Id the next mint will allocate.
    pub fn next_id(&self) -> Result<ClaimId, StrongboxError> {
        Ok(ClaimId(self.db.counter(NEXT_CLAIM_ID)?))
    }

    pub fn owner_of(&self, id: ClaimId) -> Result<AccountId, StrongboxError> {
        Self::owner_in(self.db.as_ref(), id)
    }

    /// Owner of `id` as seen through `view` (committed state or an overlay).
    pub fn owner_in(view: &impl LedgerRead, id: ClaimId) -> Result<AccountId, StrongboxError> {
        Ok(Self::entry_in(view, id)?.owner)
    }

    fn entry_in(view: &impl LedgerRead, id: ClaimId) -> Result<ClaimEntry, StrongboxError> {
        view.claim(id)?.ok_or(StrongboxError::NotFound(id))
    }

    pub fn balance_of(&self, owner: &AccountId) -> Result<u64, StrongboxError> {
        if owner.is_zero() {
            return Err(StrongboxError::InvalidAddress(*owner));
        }
        self.db.claim_balance(owner)
    }

    pub fn is_frozen(&self, id: ClaimId) -> Result<bool, StrongboxError> {
        Ok(Self::entry_in(self.db.as_ref(), id)?.freeze.is_frozen())
    }

    pub fn get_approved(&self, id: ClaimId) -> Result<Option<AccountId>, StrongboxError> {
        Ok(Self::entry_in(self.db.as_ref(), id)?.approved)
    }

    pub fn is_approved_for_all(&self, owner: &AccountId, operator: &AccountId) -> Result<bool, StrongboxError> {
        self.db.is_operator(owner, operator)
    }

    // ── Events ───────────────────────────────────────────────────────────────

    /// Log and journal events of a committed unit of work.
    pub fn publish(&self, events: Vec<ClaimEvent>) {
        for event in &events {
            match event {
                ClaimEvent::Transfer { from, to, id } => {
                    info!(claim = %id, from = ?from, to = ?to, "claim transfer");
                }
                ClaimEvent::Approval { owner, approved, id } => {
                    info!(claim = %id, owner = %owner, approved = ?approved, "claim approval");
                }
                ClaimEvent::ApprovalForAll { owner, operator, approved } => {
                    info!(owner = %owner, operator = %operator, approved, "claim operator approval");
                }
                ClaimEvent::Frozen { id } => {
                    info!(claim = %id, "claim frozen");
                }
            }
        }
        self.journal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(events);
    }

    /// Drain the notification journal.
    pub fn take_events(&self) -> Vec<ClaimEvent> {
        std::mem::take(&mut *self.journal.lock().unwrap_or_else(PoisonError::into_inner))
    }

    fn commit(&self, staged: Staged<'_>, events: Vec<ClaimEvent>) -> Result<(), StrongboxError> {
        staged.commit()?;
        self.publish(events);
        Ok(())
    }

    // ── Admin: mint / burn ───────────────────────────────────────────────────

    pub fn mint(&self, caller: &AccountId, to: &AccountId) -> Result<ClaimId, StrongboxError> {
        let mut staged = self.db.stage();
        let mut events = Vec::new();
        let id = self.stage_mint(&mut staged, caller, to, &mut events)?;
        self.commit(staged, events)?;
        Ok(id)
    }

    pub fn stage_mint(
        &self,
        staged: &mut Staged<'_>,
        caller: &AccountId,
        to: &AccountId,
        events: &mut Vec<ClaimEvent>,
    ) -> Result<ClaimId, StrongboxError> {
        if *caller != self.admin {
            return Err(StrongboxError::AccessDenied);
        }
        if to.is_zero() {
            return Err(StrongboxError::InvalidAddress(*to));
        }
        let id = ClaimId(staged.bump_counter(NEXT_CLAIM_ID)?);
        staged.put_claim(&ClaimEntry::new(id, *to))?;
        let held = staged.claim_balance(to)?;
        staged.set_claim_balance(to, held + 1);
        staged.bump_counter(CLAIM_SUPPLY)?;
        events.push(ClaimEvent::Transfer { from: None, to: Some(*to), id });
        Ok(id)
    }

    pub fn burn(&self, caller: &AccountId, id: ClaimId) -> Result<(), StrongboxError> {
        let mut staged = self.db.stage();
        let mut events = Vec::new();
        self.stage_burn(&mut staged, caller, id, &mut events)?;
        self.commit(staged, events)
    }

    pub fn stage_burn(
        &self,
        staged: &mut Staged<'_>,
        caller: &AccountId,
        id: ClaimId,
        events: &mut Vec<ClaimEvent>,
    ) -> Result<(), StrongboxError> {
        if *caller != self.admin {
            return Err(StrongboxError::AccessDenied);
        }
        let entry = Self::entry_in(&*staged, id)?;
        staged.remove_claim(id);
        let held = staged.claim_balance(&entry.owner)?;
        staged.set_claim_balance(&entry.owner, held.saturating_sub(1));
        let supply = staged.counter(CLAIM_SUPPLY)?;
        staged.set_counter(CLAIM_SUPPLY, supply.saturating_sub(1));
        events.push(ClaimEvent::Transfer { from: Some(entry.owner), to: None, id });
        Ok(())
    }

    // ── Holder: transfers ────────────────────────────────────────────────────

    pub fn transfer_from(
        &self,
        caller: &AccountId,
        from: &AccountId,
        to: &AccountId,
        id: ClaimId,
    ) -> Result<(), StrongboxError> {
        self.transfer(caller, from, to, id, TransferMode::Plain, None)
    }

    pub fn safe_transfer_from(
        &self,
        caller: &AccountId,
        from: &AccountId,
        to: &AccountId,
        id: ClaimId,
    ) -> Result<(), StrongboxError> {
        self.transfer(caller, from, to, id, TransferMode::Plain, Some(&[]))
    }

    pub fn safe_transfer_from_with_data(
        &self,
        caller: &AccountId,
        from: &AccountId,
        to: &AccountId,
        id: ClaimId,
        data: &[u8],
    ) -> Result<(), StrongboxError> {
        self.transfer(caller, from, to, id, TransferMode::Plain, Some(data))
    }

    /// Owner-only transfer that freezes the claim in the same step, so the
    /// buyer of a claim cannot be front-run by a further transfer.
    pub fn transfer_from_and_freeze(
        &self,
        caller: &AccountId,
        from: &AccountId,
        to: &AccountId,
        id: ClaimId,
    ) -> Result<(), StrongboxError> {
        self.transfer(caller, from, to, id, TransferMode::AndFreeze, None)
    }

    pub fn safe_transfer_from_and_freeze(
        &self,
        caller: &AccountId,
        from: &AccountId,
        to: &AccountId,
        id: ClaimId,
    ) -> Result<(), StrongboxError> {
        self.transfer(caller, from, to, id, TransferMode::AndFreeze, Some(&[]))
    }

    /// `safe_data` is `Some` for safe transfers, carrying the bytes handed to
    /// the receipt capability.
    fn transfer(
        &self,
        caller: &AccountId,
        from: &AccountId,
        to: &AccountId,
        id: ClaimId,
        mode: TransferMode,
        safe_data: Option<&[u8]>,
    ) -> Result<(), StrongboxError> {
        // The receiver runs against committed state with no overlay open, so
        // it may call back into the registry. Checks are repeated under the
        // writer lock below.
        if let Some(data) = safe_data {
            Self::check_transfer(self.db.as_ref(), caller, from, to, id, mode)?;
            if self.receivers.on_claim_received(caller, from, to, id, data) == Receipt::Rejected {
                return Err(StrongboxError::UnsafeRecipient(*to));
            }
        }

        let mut staged = self.db.stage();
        let mut entry = Self::check_transfer(&staged, caller, from, to, id, mode)?;

        let mut events = vec![ClaimEvent::Transfer { from: Some(*from), to: Some(*to), id }];
        let from_held = staged.claim_balance(from)?;
        staged.set_claim_balance(from, from_held.saturating_sub(1));
        let to_held = staged.claim_balance(to)?;
        staged.set_claim_balance(to, to_held + 1);

        entry.owner = *to;
        entry.approved = None;
        if mode == TransferMode::AndFreeze {
            entry.freeze = entry.freeze.freeze(id)?;
            events.push(ClaimEvent::Frozen { id });
        }
        staged.put_claim(&entry)?;
        self.commit(staged, events)
    }

    fn check_transfer(
        view: &impl LedgerRead,
        caller: &AccountId,
        from: &AccountId,
        to: &AccountId,
        id: ClaimId,
        mode: TransferMode,
    ) -> Result<ClaimEntry, StrongboxError> {
        let entry = Self::entry_in(view, id)?;
        let authorized = match mode {
            TransferMode::AndFreeze => *caller == entry.owner,
            TransferMode::Plain => {
                *caller == entry.owner
                    || entry.approved.as_ref() == Some(caller)
                    || view.is_operator(&entry.owner, caller)?
            }
        };
        if !authorized || entry.owner != *from {
            return Err(StrongboxError::AccessDenied);
        }
        if entry.freeze.is_frozen() {
            return Err(StrongboxError::Frozen(id));
        }
        if to.is_zero() {
            return Err(StrongboxError::InvalidAddress(*to));
        }
        Ok(entry)
    }

    // ── Holder: freeze / approvals ───────────────────────────────────────────

    pub fn freeze(&self, caller: &AccountId, id: ClaimId) -> Result<(), StrongboxError> {
        let mut staged = self.db.stage();
        let mut entry = Self::entry_in(&staged, id)?;
        if *caller != entry.owner {
            return Err(StrongboxError::AccessDenied);
        }
        entry.freeze = entry.freeze.freeze(id)?;
        staged.put_claim(&entry)?;
        self.commit(staged, vec![ClaimEvent::Frozen { id }])
    }

    /// Grant (or with `None`, revoke) single-claim transfer rights.
    pub fn approve(
        &self,
        caller: &AccountId,
        spender: Option<AccountId>,
        id: ClaimId,
    ) -> Result<(), StrongboxError> {
        let mut staged = self.db.stage();
        let mut entry = Self::entry_in(&staged, id)?;
        if *caller != entry.owner {
            return Err(StrongboxError::AccessDenied);
        }
        entry.approved = spender;
        staged.put_claim(&entry)?;
        self.commit(
            staged,
            vec![ClaimEvent::Approval { owner: entry.owner, approved: spender, id }],
        )
    }

    pub fn set_approval_for_all(
        &self,
        caller: &AccountId,
        operator: &AccountId,
        approved: bool,
    ) -> Result<(), StrongboxError> {
        if operator.is_zero() {
            return Err(StrongboxError::InvalidAddress(*operator));
        }
        let mut staged = self.db.stage();
        staged.set_operator(caller, operator, approved);
        self.commit(
            staged,
            vec![ClaimEvent::ApprovalForAll { owner: *caller, operator: *operator, approved }],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::receiver::ReceiverRegistry;
    use std::sync::OnceLock;

    const TOKEN_ID: ClaimId = ClaimId(0);

    struct Fixture {
        reg: ClaimRegistry,
        admin: AccountId,
        user2: AccountId,
        user3: AccountId,
    }

    fn setup() -> Fixture {
        let admin = AccountId::from_label("admin");
        let db = Arc::new(StateDb::temporary().expect("temp db"));
        Fixture {
            reg: ClaimRegistry::new(db, admin),
            admin,
            user2: AccountId::from_label("user2"),
            user3: AccountId::from_label("user3"),
        }
    }

    // ── mint ─────────────────────────────────────────────────────────────────

    #[test]
    fn has_default_metadata() {
        let f = setup();
        assert_eq!(f.reg.name(), "LockerPass");
        assert_eq!(f.reg.symbol(), "LOP");
        assert_eq!(f.reg.admin(), &f.admin);
    }

    #[test]
    fn mint_only_by_admin() {
        let f = setup();
        let err = f.reg.mint(&f.user2, &f.user2).unwrap_err();
        assert!(matches!(err, StrongboxError::AccessDenied));
        f.reg.mint(&f.admin, &f.user2).unwrap();
    }

    #[test]
    fn mint_allocates_sequential_ids_and_counts_supply() {
        let f = setup();
        assert_eq!(f.reg.total_supply().unwrap(), 0);
        assert_eq!(f.reg.mint(&f.admin, &f.user2).unwrap(), ClaimId(0));
        assert_eq!(f.reg.mint(&f.admin, &f.user3).unwrap(), ClaimId(1));
        assert_eq!(f.reg.total_supply().unwrap(), 2);
        assert_eq!(f.reg.owner_of(ClaimId(1)).unwrap(), f.user3);
        assert_eq!(f.reg.balance_of(&f.user2).unwrap(), 1);
        assert_eq!(f.reg.next_id().unwrap(), ClaimId(2));
    }

    #[test]
    fn mint_emits_transfer_from_none() {
        let f = setup();
        f.reg.mint(&f.admin, &f.user2).unwrap();
        assert_eq!(
            f.reg.take_events(),
            vec![ClaimEvent::Transfer { from: None, to: Some(f.user2), id: TOKEN_ID }]
        );
    }

    #[test]
    fn mint_to_zero_rejected() {
        let f = setup();
        let err = f.reg.mint(&f.admin, &AccountId::ZERO).unwrap_err();
        assert!(matches!(err, StrongboxError::InvalidAddress(_)));
    }

    // ── burn ─────────────────────────────────────────────────────────────────

    #[test]
    fn burn_only_by_admin_and_only_existing() {
        let f = setup();
        f.reg.mint(&f.admin, &f.user2).unwrap();
        assert!(matches!(f.reg.burn(&f.user2, TOKEN_ID), Err(StrongboxError::AccessDenied)));
        assert!(matches!(
            f.reg.burn(&f.admin, ClaimId(1)),
            Err(StrongboxError::NotFound(ClaimId(1)))
        ));
    }

    #[test]
    fn burn_clears_ownership_and_supply_and_never_reuses_id() {
        let f = setup();
        f.reg.mint(&f.admin, &f.user2).unwrap();
        f.reg.take_events();
        f.reg.burn(&f.admin, TOKEN_ID).unwrap();

        assert!(matches!(f.reg.owner_of(TOKEN_ID), Err(StrongboxError::NotFound(_))));
        assert_eq!(f.reg.balance_of(&f.user2).unwrap(), 0);
        assert_eq!(f.reg.total_supply().unwrap(), 0);
        assert_eq!(
            f.reg.take_events(),
            vec![ClaimEvent::Transfer { from: Some(f.user2), to: None, id: TOKEN_ID }]
        );
        assert!(matches!(f.reg.burn(&f.admin, TOKEN_ID), Err(StrongboxError::NotFound(_))));
        assert_eq!(f.reg.mint(&f.admin, &f.user2).unwrap(), ClaimId(1));
    }

    // ── transfer_from ────────────────────────────────────────────────────────

    #[test]
    fn transfer_changes_owner_and_balances() {
        let f = setup();
        f.reg.mint(&f.admin, &f.user2).unwrap();
        f.reg.take_events();
        f.reg.transfer_from(&f.user2, &f.user2, &f.user3, TOKEN_ID).unwrap();

        assert_eq!(f.reg.owner_of(TOKEN_ID).unwrap(), f.user3);
        assert_eq!(f.reg.balance_of(&f.user2).unwrap(), 0);
        assert_eq!(f.reg.balance_of(&f.user3).unwrap(), 1);
        assert_eq!(
            f.reg.take_events(),
            vec![ClaimEvent::Transfer { from: Some(f.user2), to: Some(f.user3), id: TOKEN_ID }]
        );
    }

    #[test]
    fn transfer_by_stranger_denied() {
        let f = setup();
        f.reg.mint(&f.admin, &f.user2).unwrap();
        let err = f.reg.transfer_from(&f.user3, &f.user2, &f.user3, TOKEN_ID).unwrap_err();
        assert!(matches!(err, StrongboxError::AccessDenied));
    }

    #[test]
    fn transfer_with_wrong_from_denied() {
        let f = setup();
        f.reg.mint(&f.admin, &f.user2).unwrap();
        let err = f.reg.transfer_from(&f.user2, &f.user3, &f.user3, TOKEN_ID).unwrap_err();
        assert!(matches!(err, StrongboxError::AccessDenied));
    }

    #[test]
    fn transfer_to_zero_rejected() {
        let f = setup();
        f.reg.mint(&f.admin, &f.user2).unwrap();
        let err = f.reg.transfer_from(&f.user2, &f.user2, &AccountId::ZERO, TOKEN_ID).unwrap_err();
        assert!(matches!(err, StrongboxError::InvalidAddress(_)));
        assert_eq!(f.reg.owner_of(TOKEN_ID).unwrap(), f.user2);
    }

    #[test]
    fn frozen_claim_cannot_be_transferred() {
        let f = setup();
        f.reg.mint(&f.admin, &f.user2).unwrap();
        f.reg.freeze(&f.user2, TOKEN_ID).unwrap();
        let err = f.reg.safe_transfer_from(&f.user2, &f.user2, &f.user3, TOKEN_ID).unwrap_err();
        assert!(matches!(err, StrongboxError::Frozen(TOKEN_ID)));
        let err = f.reg.transfer_from(&f.user2, &f.user2, &f.user3, TOKEN_ID).unwrap_err();
        assert!(matches!(err, StrongboxError::Frozen(TOKEN_ID)));
    }

    #[test]
    fn self_transfer_keeps_balance() {
        let f = setup();
        f.reg.mint(&f.admin, &f.user2).unwrap();
        f.reg.transfer_from(&f.user2, &f.user2, &f.user2, TOKEN_ID).unwrap();
        assert_eq!(f.reg.balance_of(&f.user2).unwrap(), 1);
    }

    // ── transfer_from_and_freeze ─────────────────────────────────────────────

    #[test]
    fn transfer_and_freeze_only_by_direct_owner() {
        let f = setup();
        f.reg.mint(&f.admin, &f.user2).unwrap();

        let denied = |reg: &ClaimRegistry| {
            matches!(
                reg.transfer_from_and_freeze(&f.user3, &f.user2, &f.user3, TOKEN_ID),
                Err(StrongboxError::AccessDenied)
            ) && matches!(
                reg.safe_transfer_from_and_freeze(&f.user3, &f.user2, &f.user3, TOKEN_ID),
                Err(StrongboxError::AccessDenied)
            )
        };
        assert!(denied(&f.reg));
        f.reg.approve(&f.user2, Some(f.user3), TOKEN_ID).unwrap();
        assert!(denied(&f.reg));
        f.reg.set_approval_for_all(&f.user2, &f.user3, true).unwrap();
        assert!(denied(&f.reg));
    }

    #[test]
    fn transfer_and_freeze_moves_then_freezes() {
        let f = setup();
        f.reg.mint(&f.admin, &f.user2).unwrap();
        f.reg.transfer_from_and_freeze(&f.user2, &f.user2, &f.user3, TOKEN_ID).unwrap();
        assert_eq!(f.reg.owner_of(TOKEN_ID).unwrap(), f.user3);
        assert!(f.reg.is_frozen(TOKEN_ID).unwrap());

        let err = f.reg.transfer_from(&f.user3, &f.user3, &f.user2, TOKEN_ID).unwrap_err();
        assert!(matches!(err, StrongboxError::Frozen(_)));
    }

    #[test]
    fn safe_transfer_and_freeze_moves_then_freezes() {
        let f = setup();
        f.reg.mint(&f.admin, &f.user2).unwrap();
        f.reg.safe_transfer_from_and_freeze(&f.user2, &f.user2, &f.user3, TOKEN_ID).unwrap();
        assert_eq!(f.reg.balance_of(&f.user3).unwrap(), 1);
        assert!(f.reg.is_frozen(TOKEN_ID).unwrap());
    }

    // ── freeze ───────────────────────────────────────────────────────────────

    #[test]
    fn freeze_only_by_owner_and_only_once() {
        let f = setup();
        f.reg.mint(&f.admin, &f.user2).unwrap();
        assert!(matches!(f.reg.freeze(&f.user3, TOKEN_ID), Err(StrongboxError::AccessDenied)));
        assert!(!f.reg.is_frozen(TOKEN_ID).unwrap());
        f.reg.freeze(&f.user2, TOKEN_ID).unwrap();
        assert!(f.reg.is_frozen(TOKEN_ID).unwrap());
        assert!(matches!(
            f.reg.freeze(&f.user2, TOKEN_ID),
            Err(StrongboxError::AlreadyFrozen(TOKEN_ID))
        ));
    }

    // ── safe transfers ───────────────────────────────────────────────────────

    #[test]
    fn safe_transfer_checks_receipt_capability() {
        let admin = AccountId::from_label("admin");
        let user2 = AccountId::from_label("user2");
        let holder = AccountId::from_label("nft-holder");
        let non_holder = AccountId::from_label("nft-non-holder");
        let receivers = Arc::new(ReceiverRegistry::new());
        receivers.register(holder, true);
        receivers.register(non_holder, false);
        let reg = ClaimRegistry::new(Arc::new(StateDb::temporary().unwrap()), admin)
            .with_receivers(receivers);
        reg.mint(&admin, &user2).unwrap();

        let err = reg.safe_transfer_from(&user2, &user2, &non_holder, TOKEN_ID).unwrap_err();
        assert!(matches!(err, StrongboxError::UnsafeRecipient(_)));
        assert_eq!(reg.owner_of(TOKEN_ID).unwrap(), user2, "rejected transfer leaves owner unchanged");

        reg.safe_transfer_from_with_data(&user2, &user2, &holder, TOKEN_ID, b"0x").unwrap();
        assert_eq!(reg.owner_of(TOKEN_ID).unwrap(), holder);
    }

    /// Receiver that grants its own operator approval while accepting.
    struct SelfApprovingReceiver {
        registry: OnceLock<Arc<ClaimRegistry>>,
        operator: AccountId,
    }

    impl ClaimReceiver for SelfApprovingReceiver {
        fn on_claim_received(&self, _: &AccountId, _: &AccountId, to: &AccountId, _: ClaimId, _: &[u8]) -> Receipt {
            match self.registry.get() {
                Some(reg) if reg.set_approval_for_all(to, &self.operator, true).is_ok() => Receipt::Accepted,
                _ => Receipt::Rejected,
            }
        }
    }

    #[test]
    fn receiver_may_call_back_into_the_registry() {
        let admin = AccountId::from_label("admin");
        let user2 = AccountId::from_label("user2");
        let holder = AccountId::from_label("nft-holder");
        let operator = AccountId::from_label("operator");
        let receiver = Arc::new(SelfApprovingReceiver { registry: OnceLock::new(), operator });
        let reg = Arc::new(
            ClaimRegistry::new(Arc::new(StateDb::temporary().unwrap()), admin).with_receivers(receiver.clone()),
        );
        assert!(receiver.registry.set(reg.clone()).is_ok());
        reg.mint(&admin, &user2).unwrap();

        reg.safe_transfer_from(&user2, &user2, &holder, TOKEN_ID).unwrap();
        assert_eq!(reg.owner_of(TOKEN_ID).unwrap(), holder);
        assert!(reg.is_approved_for_all(&holder, &operator).unwrap());
    }

    #[test]
    fn safe_transfer_validates_before_asking_the_receiver() {
        let admin = AccountId::from_label("admin");
        let user2 = AccountId::from_label("user2");
        let user3 = AccountId::from_label("user3");
        let refuser = AccountId::from_label("nft-non-holder");
        let receivers = Arc::new(ReceiverRegistry::new());
        receivers.register(refuser, false);
        let reg = ClaimRegistry::new(Arc::new(StateDb::temporary().unwrap()), admin)
            .with_receivers(receivers);
        reg.mint(&admin, &user2).unwrap();

        let err = reg.safe_transfer_from(&user3, &user2, &refuser, TOKEN_ID).unwrap_err();
        assert!(matches!(err, StrongboxError::AccessDenied));
    }

    #[test]
    fn plain_transfer_skips_receipt_capability() {
        let admin = AccountId::from_label("admin");
        let user2 = AccountId::from_label("user2");
        let non_holder = AccountId::from_label("nft-non-holder");
        let receivers = Arc::new(ReceiverRegistry::new());
        receivers.register(non_holder, false);
        let reg = ClaimRegistry::new(Arc::new(StateDb::temporary().unwrap()), admin)
            .with_receivers(receivers);
        reg.mint(&admin, &user2).unwrap();
        reg.transfer_from(&user2, &user2, &non_holder, TOKEN_ID).unwrap();
        assert_eq!(reg.owner_of(TOKEN_ID).unwrap(), non_holder);
    }

    // ── approvals ────────────────────────────────────────────────────────────

    #[test]
    fn approve_grants_rights_to_one_claim_only() {
        let f = setup();
        f.reg.mint(&f.admin, &f.user2).unwrap();
        f.reg.mint(&f.admin, &f.user2).unwrap();

        assert!(matches!(
            f.reg.transfer_from(&f.user3, &f.user2, &f.user3, TOKEN_ID),
            Err(StrongboxError::AccessDenied)
        ));
        f.reg.take_events();
        f.reg.approve(&f.user2, Some(f.user3), TOKEN_ID).unwrap();
        assert_eq!(
            f.reg.take_events(),
            vec![ClaimEvent::Approval { owner: f.user2, approved: Some(f.user3), id: TOKEN_ID }]
        );
        assert_eq!(f.reg.get_approved(TOKEN_ID).unwrap(), Some(f.user3));

        f.reg.transfer_from(&f.user3, &f.user2, &f.user3, TOKEN_ID).unwrap();
        assert_eq!(f.reg.owner_of(TOKEN_ID).unwrap(), f.user3);
        assert_eq!(f.reg.get_approved(TOKEN_ID).unwrap(), None, "transfer clears approval");

        assert!(matches!(
            f.reg.transfer_from(&f.user3, &f.user2, &f.user3, ClaimId(1)),
            Err(StrongboxError::AccessDenied)
        ));
    }

    #[test]
    fn approve_only_by_owner() {
        let f = setup();
        f.reg.mint(&f.admin, &f.user2).unwrap();
        assert!(matches!(
            f.reg.approve(&f.user3, Some(f.user3), TOKEN_ID),
            Err(StrongboxError::AccessDenied)
        ));
    }

    #[test]
    fn get_approved_on_missing_claim_fails() {
        let f = setup();
        f.reg.mint(&f.admin, &f.user2).unwrap();
        assert!(matches!(f.reg.get_approved(ClaimId(1)), Err(StrongboxError::NotFound(_))));
    }

    #[test]
    fn operator_approval_covers_all_claims_and_can_be_revoked() {
        let f = setup();
        for _ in 0..3 {
            f.reg.mint(&f.admin, &f.user2).unwrap();
        }
        assert!(!f.reg.is_approved_for_all(&f.user2, &f.user3).unwrap());
        f.reg.take_events();
        f.reg.set_approval_for_all(&f.user2, &f.user3, true).unwrap();
        assert_eq!(
            f.reg.take_events(),
            vec![ClaimEvent::ApprovalForAll { owner: f.user2, operator: f.user3, approved: true }]
        );
        assert!(f.reg.is_approved_for_all(&f.user2, &f.user3).unwrap());

        f.reg.transfer_from(&f.user3, &f.user2, &f.user3, ClaimId(0)).unwrap();
        f.reg.transfer_from(&f.user3, &f.user2, &f.user3, ClaimId(1)).unwrap();
        f.reg.set_approval_for_all(&f.user2, &f.user3, false).unwrap();
        assert!(matches!(
            f.reg.transfer_from(&f.user3, &f.user2, &f.user3, ClaimId(2)),
            Err(StrongboxError::AccessDenied)
        ));
    }

    #[test]
    fn balance_of_zero_address_rejected() {
        let f = setup();
        assert!(matches!(
            f.reg.balance_of(&AccountId::ZERO),
            Err(StrongboxError::InvalidAddress(_))
        ));
    }
}
