//! Transfer coordinator - the two-phase send-money flow
//!
//! ```text
//! Draft --submit--> PendingConfirmation --confirm--> Committed
//!   ^                     |
//!   +-------cancel--------+
//! ```
//!
//! The coordinator belongs to one transfer screen. Dropping it discards any
//! pending transfer; nothing reaches the ledger before `confirm`.

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::domain::result::{Error, Result};
use crate::domain::transfer::{parse_amount, validate_recipient};
use crate::domain::{
    sanitize_text, ConfirmationSnapshot, ContactInput, PaymentRequest, Transaction,
    TransactionCandidate, TransferDraft, MAX_NAME_LENGTH, MIN_TRANSFER_AMOUNT,
};
use crate::services::favorites::FavoritesRegistry;
use crate::services::ledger::LedgerStore;
use crate::services::logging::{log_event, EventLog, LogEvent};

/// Longest description kept on a transaction
const MAX_DESCRIPTION_LENGTH: usize = 140;

/// Screens the transfer flow logs its events under
const ENTRY_SCREEN: &str = "transfer";
const CONFIRMATION_SCREEN: &str = "transfer_confirmation";

/// Stage of the transfer flow.
///
/// There is no cancelled state: backing out of the confirmation step returns
/// to `Draft` with the entered values and reports
/// [`NavigationSignal::Cancelled`] to the caller instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferState {
    Draft(TransferDraft),
    PendingConfirmation {
        draft: TransferDraft,
        snapshot: ConfirmationSnapshot,
        generation: u64,
    },
    Committed(Transaction),
}

impl TransferState {
    pub fn name(&self) -> &'static str {
        match self {
            TransferState::Draft(_) => "draft",
            TransferState::PendingConfirmation { .. } => "pending confirmation",
            TransferState::Committed(_) => "committed",
        }
    }
}

/// What the screen should do next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationSignal {
    Confirmed(Transaction),
    Cancelled,
}

pub struct TransferCoordinator {
    ledger: Arc<LedgerStore>,
    favorites: Arc<FavoritesRegistry>,
    minimum: Decimal,
    state: TransferState,
    /// Display name carried over from a scanned payment request
    contact_name: Option<String>,
    logger: EventLog,
}

impl TransferCoordinator {
    pub fn new(ledger: Arc<LedgerStore>, favorites: Arc<FavoritesRegistry>, logger: EventLog) -> Self {
        Self {
            ledger,
            favorites,
            minimum: Decimal::new(MIN_TRANSFER_AMOUNT, 0),
            state: TransferState::Draft(TransferDraft::default()),
            contact_name: None,
            logger,
        }
    }

    pub fn with_minimum(mut self, minimum: Decimal) -> Self {
        self.minimum = minimum;
        self
    }

    pub fn state(&self) -> &TransferState {
        &self.state
    }

    pub fn draft(&self) -> Option<&TransferDraft> {
        match &self.state {
            TransferState::Draft(draft) => Some(draft),
            TransferState::PendingConfirmation { draft, .. } => Some(draft),
            TransferState::Committed(_) => None,
        }
    }

    pub fn confirmation(&self) -> Option<&ConfirmationSnapshot> {
        match &self.state {
            TransferState::PendingConfirmation { snapshot, .. } => Some(snapshot),
            _ => None,
        }
    }

    fn draft_mut(&mut self, action: &'static str) -> Result<&mut TransferDraft> {
        match &mut self.state {
            TransferState::Draft(draft) => Ok(draft),
            other => Err(Error::invalid_transition(other.name(), action)),
        }
    }

    pub fn set_recipient(&mut self, recipient: impl Into<String>) -> Result<()> {
        self.draft_mut("edit the recipient")?.recipient = recipient.into();
        // A hand-typed recipient no longer matches the scanned name
        self.contact_name = None;
        Ok(())
    }

    pub fn set_amount(&mut self, amount: impl Into<String>) -> Result<()> {
        self.draft_mut("edit the amount")?.amount = amount.into();
        Ok(())
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> Result<()> {
        self.draft_mut("edit the description")?.description = description.into();
        Ok(())
    }

    /// Fill the draft from a decoded payment request
    pub fn prefill(&mut self, request: PaymentRequest) -> Result<()> {
        let draft = self.draft_mut("prefill")?;
        draft.recipient = request.recipient;
        draft.amount = request.amount.unwrap_or_default();
        draft.description = request.description.unwrap_or_default();

        let name = sanitize_text(&request.name, MAX_NAME_LENGTH);
        self.contact_name = Some(name).filter(|n| !n.is_empty());
        log_event(&self.logger, LogEvent::new("transfer_prefilled").with_screen(ENTRY_SCREEN));
        Ok(())
    }

    /// Validate the draft and stage it for confirmation.
    ///
    /// Checks run in order: recipient, minimum amount, balance. On failure the
    /// draft stays editable and unchanged.
    pub fn submit(&mut self) -> Result<&ConfirmationSnapshot> {
        let TransferState::Draft(draft) = &self.state else {
            return Err(Error::invalid_transition(self.state.name(), "submit"));
        };

        let recipient = validate_recipient(&draft.recipient)?;
        let amount = parse_amount(&draft.amount, self.minimum)?;
        let available = self.ledger.balance();
        if amount > available {
            return Err(Error::InsufficientFunds {
                requested: amount,
                available,
            });
        }

        let description = sanitize_text(&draft.description, MAX_DESCRIPTION_LENGTH);
        let snapshot = ConfirmationSnapshot {
            recipient,
            amount,
            description: Some(description).filter(|d| !d.is_empty()),
        };

        self.state = TransferState::PendingConfirmation {
            draft: draft.clone(),
            snapshot,
            generation: self.ledger.generation(),
        };
        log_event(&self.logger, LogEvent::new("transfer_submitted").with_screen(ENTRY_SCREEN));

        match &self.state {
            TransferState::PendingConfirmation { snapshot, .. } => Ok(snapshot),
            _ => Err(Error::Other("transfer was not staged".to_string())),
        }
    }

    /// Commit the staged transfer to the ledger.
    ///
    /// A ledger failure returns the coordinator to `Draft` with the original
    /// input. A reset since `submit` discards the transfer entirely.
    pub fn confirm(&mut self) -> Result<NavigationSignal> {
        let TransferState::PendingConfirmation {
            draft,
            snapshot,
            generation,
        } = &self.state
        else {
            return Err(Error::invalid_transition(self.state.name(), "confirm"));
        };

        let candidate = TransactionCandidate::outgoing(snapshot.recipient.clone(), snapshot.amount)
            .with_description(snapshot.description.clone());

        match self.ledger.commit_transfer(candidate, *generation) {
            Ok(tx) => {
                let recipient = snapshot.recipient.clone();
                self.remember_recipient(&recipient);
                self.state = TransferState::Committed(tx.clone());
                self.contact_name = None;
                log_event(
                    &self.logger,
                    LogEvent::new("transfer_committed").with_screen(CONFIRMATION_SCREEN),
                );
                Ok(NavigationSignal::Confirmed(tx))
            }
            Err(Error::TransferInvalidated) => {
                self.state = TransferState::Draft(TransferDraft::default());
                self.contact_name = None;
                log_event(
                    &self.logger,
                    LogEvent::new("transfer_invalidated").with_screen(CONFIRMATION_SCREEN),
                );
                Err(Error::TransferInvalidated)
            }
            Err(e) => {
                self.state = TransferState::Draft(draft.clone());
                log_event(
                    &self.logger,
                    LogEvent::new("transfer_failed")
                        .with_screen(CONFIRMATION_SCREEN)
                        .with_error(e.user_message()),
                );
                Err(e)
            }
        }
    }

    /// Back out of the confirmation step, keeping the entered values.
    ///
    /// Returns `None` when there was nothing to cancel.
    pub fn cancel(&mut self) -> Result<Option<NavigationSignal>> {
        match &self.state {
            TransferState::Draft(_) => Ok(None),
            TransferState::PendingConfirmation { draft, .. } => {
                self.state = TransferState::Draft(draft.clone());
                log_event(
                    &self.logger,
                    LogEvent::new("transfer_cancelled").with_screen(CONFIRMATION_SCREEN),
                );
                Ok(Some(NavigationSignal::Cancelled))
            }
            TransferState::Committed(_) => Err(Error::invalid_transition("committed", "cancel")),
        }
    }

    /// Start a fresh transfer after a commit
    pub fn start_new(&mut self) -> Result<()> {
        match &self.state {
            TransferState::Committed(_) => {
                self.state = TransferState::Draft(TransferDraft::default());
                Ok(())
            }
            TransferState::Draft(_) => Ok(()),
            other => Err(Error::invalid_transition(other.name(), "start a new transfer")),
        }
    }

    fn remember_recipient(&self, phone: &str) {
        let name = self
            .contact_name
            .clone()
            .or_else(|| self.favorites.find_by_phone(phone).map(|f| f.name))
            .unwrap_or_else(|| phone.to_string());
        // The transfer is already committed; a bad contact must not undo it
        if let Err(e) = self.favorites.add_recent_contact(ContactInput::phone(name, phone)) {
            log_event(
                &self.logger,
                LogEvent::new("recent_contact_failed")
                    .with_screen(CONFIRMATION_SCREEN)
                    .with_error(e.user_message()),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Wallet;

    fn dec(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    fn setup(balance: &str) -> (TransferCoordinator, Arc<LedgerStore>, Arc<FavoritesRegistry>) {
        let ledger = Arc::new(LedgerStore::in_memory(Wallet::seeded(dec(balance))));
        let favorites = Arc::new(FavoritesRegistry::in_memory());
        let coordinator = TransferCoordinator::new(ledger.clone(), favorites.clone(), None);
        (coordinator, ledger, favorites)
    }

    fn fill(coordinator: &mut TransferCoordinator, recipient: &str, amount: &str) {
        coordinator.set_recipient(recipient).unwrap();
        coordinator.set_amount(amount).unwrap();
    }

    #[test]
    fn test_submit_and_confirm() {
        let (mut coordinator, ledger, favorites) = setup("53000");
        fill(&mut coordinator, "555 123 45 67", "500");
        coordinator.set_description("Rent share").unwrap();

        let snapshot = coordinator.submit().unwrap().clone();
        assert_eq!(snapshot.recipient, "5551234567");
        assert_eq!(snapshot.amount, dec("500.00"));

        let signal = coordinator.confirm().unwrap();
        let NavigationSignal::Confirmed(tx) = signal else {
            panic!("expected a confirmation");
        };
        assert_eq!(tx.receiver, "5551234567");
        assert_eq!(tx.description.as_deref(), Some("Rent share"));
        assert_eq!(ledger.balance(), dec("52500.00"));
        assert_eq!(favorites.recents()[0].phone.as_deref(), Some("5551234567"));
        assert!(matches!(coordinator.state(), TransferState::Committed(_)));
    }

    #[test]
    fn test_validation_order() {
        let (mut coordinator, _, _) = setup("100");

        fill(&mut coordinator, "123", "5");
        assert!(matches!(coordinator.submit(), Err(Error::InvalidRecipient)));

        fill(&mut coordinator, "5551234567", "5");
        assert!(matches!(coordinator.submit(), Err(Error::AmountTooLow { .. })));

        fill(&mut coordinator, "5551234567", "abc");
        assert!(matches!(coordinator.submit(), Err(Error::AmountTooLow { .. })));

        fill(&mut coordinator, "5551234567", "150");
        assert!(matches!(
            coordinator.submit(),
            Err(Error::InsufficientFunds { .. })
        ));

        assert!(matches!(coordinator.state(), TransferState::Draft(_)));
        assert_eq!(coordinator.draft().unwrap().amount, "150");
    }

    #[test]
    fn test_cancel_restores_draft_and_is_idempotent() {
        let (mut coordinator, ledger, _) = setup("1000");
        fill(&mut coordinator, "05551234567", "12,5");
        coordinator.submit().unwrap();

        assert_eq!(
            coordinator.cancel().unwrap(),
            Some(NavigationSignal::Cancelled)
        );
        assert_eq!(coordinator.cancel().unwrap(), None);

        let draft = coordinator.draft().unwrap();
        assert_eq!(draft.recipient, "05551234567");
        assert_eq!(draft.amount, "12,5");
        assert_eq!(ledger.balance(), dec("1000"));
        assert!(ledger.transactions().is_empty());
    }

    #[test]
    fn test_edits_rejected_while_pending() {
        let (mut coordinator, _, _) = setup("1000");
        fill(&mut coordinator, "5551234567", "20");
        let before = coordinator.submit().unwrap().clone();

        assert!(matches!(
            coordinator.set_amount("999"),
            Err(Error::InvalidTransition { .. })
        ));
        assert!(matches!(
            coordinator.prefill(PaymentRequest::default()),
            Err(Error::InvalidTransition { .. })
        ));
        assert_eq!(coordinator.confirmation().unwrap(), &before);
    }

    #[test]
    fn test_confirm_from_draft_rejected() {
        let (mut coordinator, ledger, _) = setup("1000");
        assert!(matches!(
            coordinator.confirm(),
            Err(Error::InvalidTransition { .. })
        ));
        assert!(ledger.transactions().is_empty());
    }

    #[test]
    fn test_ledger_failure_returns_to_draft() {
        let (mut coordinator, ledger, _) = setup("100");
        fill(&mut coordinator, "5551234567", "80");
        coordinator.submit().unwrap();

        // Balance drops between submit and confirm
        ledger
            .apply_transaction(TransactionCandidate::outgoing("5550000000", dec("50")))
            .unwrap();

        assert!(matches!(
            coordinator.confirm(),
            Err(Error::InsufficientFunds { .. })
        ));
        assert_eq!(coordinator.draft().unwrap().amount, "80");
        assert_eq!(ledger.balance(), dec("50"));
    }

    #[test]
    fn test_reset_invalidates_pending_transfer() {
        let (mut coordinator, ledger, _) = setup("1000");
        fill(&mut coordinator, "5551234567", "20");
        coordinator.submit().unwrap();

        ledger.reset();

        assert!(matches!(
            coordinator.confirm(),
            Err(Error::TransferInvalidated)
        ));
        assert!(coordinator.draft().unwrap().is_empty());
        assert!(ledger.transactions().is_empty());
    }

    #[test]
    fn test_prefill_name_becomes_recent_contact() {
        let (mut coordinator, _, favorites) = setup("1000");
        coordinator
            .prefill(PaymentRequest {
                recipient: "5551234567".to_string(),
                amount: Some("25".to_string()),
                description: None,
                name: "Kemal".to_string(),
            })
            .unwrap();
        coordinator.submit().unwrap();
        coordinator.confirm().unwrap();

        assert_eq!(favorites.recents()[0].name, "Kemal");
    }

    #[test]
    fn test_start_new_after_commit() {
        let (mut coordinator, _, _) = setup("1000");
        fill(&mut coordinator, "5551234567", "20");
        coordinator.submit().unwrap();
        coordinator.confirm().unwrap();

        assert!(coordinator.cancel().is_err());
        coordinator.start_new().unwrap();
        assert!(coordinator.draft().unwrap().is_empty());
    }
}
