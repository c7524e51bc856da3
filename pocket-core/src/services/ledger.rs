//! Ledger store - the only writer of the wallet balance and history

use std::sync::{Mutex, MutexGuard};

use rust_decimal::Decimal;

use crate::domain::result::{Error, Result};
use crate::domain::{
    normalize_amount, SliceUpdate, Transaction, TransactionCandidate, TransactionType, Wallet,
};
use crate::services::logging::{log_event, EventLog, LogEvent};
use crate::services::persistence::PersistenceHandle;

struct LedgerState {
    wallet: Wallet,
    /// Bumped by `reset`; a transfer staged under an older generation is void
    generation: u64,
}

/// Owns the wallet. Every change is one atomic state replacement followed by a
/// write-through of the `wallet` slice.
pub struct LedgerStore {
    state: Mutex<LedgerState>,
    persistence: PersistenceHandle,
    logger: EventLog,
}

impl LedgerStore {
    pub fn new(wallet: Wallet, persistence: PersistenceHandle, logger: EventLog) -> Self {
        Self {
            state: Mutex::new(LedgerState {
                wallet,
                generation: 0,
            }),
            persistence,
            logger,
        }
    }

    /// Ledger without durable storage
    pub fn in_memory(wallet: Wallet) -> Self {
        Self::new(wallet, PersistenceHandle::disabled(), None)
    }

    fn lock(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn wallet(&self) -> Wallet {
        self.lock().wallet.clone()
    }

    pub fn balance(&self) -> Decimal {
        self.lock().wallet.balance
    }

    /// History, most recent first
    pub fn transactions(&self) -> Vec<Transaction> {
        self.lock().wallet.transactions.clone()
    }

    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// Record a credit or debit and return the updated wallet.
    ///
    /// Fails with `InsufficientFunds` for a debit larger than the balance. On
    /// any error the wallet is left exactly as it was.
    pub fn apply_transaction(&self, candidate: TransactionCandidate) -> Result<Wallet> {
        let mut state = self.lock();
        let (wallet, _) = self.apply_locked(&mut state, candidate)?;
        Ok(wallet)
    }

    /// Commit a transfer that was validated while the ledger was at
    /// `generation`. Fails with `TransferInvalidated` if a reset happened since.
    pub(crate) fn commit_transfer(
        &self,
        candidate: TransactionCandidate,
        generation: u64,
    ) -> Result<Transaction> {
        let mut state = self.lock();
        if state.generation != generation {
            return Err(Error::TransferInvalidated);
        }
        let (_, tx) = self.apply_locked(&mut state, candidate)?;
        Ok(tx)
    }

    fn apply_locked(
        &self,
        state: &mut LedgerState,
        candidate: TransactionCandidate,
    ) -> Result<(Wallet, Transaction)> {
        let amount = normalize_amount(candidate.amount);
        if amount <= Decimal::ZERO {
            return Err(Error::validation("Transaction amount must be positive"));
        }

        let current = &state.wallet;
        if candidate.kind == TransactionType::Outgoing && amount > current.balance {
            return Err(Error::InsufficientFunds {
                requested: amount,
                available: current.balance,
            });
        }

        let balance = current
            .balance
            .checked_add(match candidate.kind {
                TransactionType::Incoming => amount,
                TransactionType::Outgoing => -amount,
            })
            .ok_or_else(|| Error::validation("Amount is too large"))?;

        let mut id = Transaction::generate_id();
        while current.contains_id(&id) {
            id = Transaction::generate_id();
        }

        let tx = Transaction::from_candidate(
            id,
            TransactionCandidate {
                amount,
                ..candidate
            },
        );

        let mut next = current.clone();
        next.balance = normalize_amount(balance);
        next.transactions.insert(0, tx.clone());

        state.wallet = next.clone();
        self.persistence.submit(SliceUpdate::Wallet(next.clone()));
        log_event(
            &self.logger,
            LogEvent::new(format!("transaction_{}", tx.kind.as_str())),
        );

        Ok((next, tx))
    }

    /// Zero the wallet and drop its history (logout).
    ///
    /// Any transfer staged before the reset can no longer be committed.
    pub fn reset(&self) -> Wallet {
        let mut state = self.lock();
        state.wallet = Wallet::empty();
        state.generation += 1;
        self.persistence.submit(SliceUpdate::Wallet(state.wallet.clone()));
        log_event(&self.logger, LogEvent::new("ledger_reset"));
        state.wallet.clone()
    }

    /// Reconciliation override of the balance. History is left untouched.
    pub fn set_balance(&self, value: Decimal) -> Result<Wallet> {
        if value < Decimal::ZERO {
            return Err(Error::validation("Balance cannot be negative"));
        }
        let mut state = self.lock();
        state.wallet.balance = normalize_amount(value);
        self.persistence.submit(SliceUpdate::Wallet(state.wallet.clone()));
        log_event(&self.logger, LogEvent::new("balance_overridden"));
        Ok(state.wallet.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn dec(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    fn ledger(balance: &str) -> LedgerStore {
        LedgerStore::in_memory(Wallet::seeded(dec(balance)))
    }

    #[test]
    fn test_credit_that_overflows_balance_is_rejected() {
        let store = ledger("53000");
        let err = store
            .apply_transaction(TransactionCandidate::incoming("5551234567", Decimal::MAX))
            .unwrap_err();

        assert!(matches!(err, Error::Validation(_)));
        let wallet = store.wallet();
        assert_eq!(wallet.balance, dec("53000"));
        assert!(wallet.transactions.is_empty());

        // The largest credit that still fits is accepted
        let headroom = Decimal::MAX - dec("53000");
        let wallet = store
            .apply_transaction(TransactionCandidate::incoming("5551234567", headroom.trunc()))
            .unwrap();
        assert_eq!(wallet.transactions.len(), 1);
    }

    #[test]
    fn test_outgoing_debits_and_prepends() {
        let store = ledger("1000");
        store
            .apply_transaction(TransactionCandidate::outgoing("5551234567", dec("100")))
            .unwrap();
        let wallet = store
            .apply_transaction(
                TransactionCandidate::outgoing("5559876543", dec("50.5"))
                    .with_description(Some("Dinner".to_string())),
            )
            .unwrap();

        assert_eq!(wallet.balance, dec("849.50"));
        assert_eq!(wallet.transactions.len(), 2);
        assert_eq!(wallet.transactions[0].receiver, "5559876543");
        assert_eq!(wallet.transactions[0].description.as_deref(), Some("Dinner"));
        assert_eq!(wallet.transactions[1].receiver, "5551234567");
    }

    #[test]
    fn test_incoming_credits() {
        let store = ledger("0");
        let wallet = store
            .apply_transaction(TransactionCandidate::incoming("5551234567", dec("25")))
            .unwrap();
        assert_eq!(wallet.balance, dec("25.00"));
        assert_eq!(wallet.transactions[0].kind, TransactionType::Incoming);
    }

    #[test]
    fn test_insufficient_funds_leaves_wallet_untouched() {
        let store = ledger("100");
        let before = store.wallet();

        let err = store
            .apply_transaction(TransactionCandidate::outgoing("5551234567", dec("100.01")))
            .unwrap_err();

        assert!(matches!(err, Error::InsufficientFunds { .. }));
        assert_eq!(store.wallet(), before);
    }

    #[test]
    fn test_exact_balance_can_be_spent() {
        let store = ledger("100");
        let wallet = store
            .apply_transaction(TransactionCandidate::outgoing("5551234567", dec("100")))
            .unwrap();
        assert_eq!(wallet.balance, Decimal::ZERO);
    }

    #[test]
    fn test_non_positive_amount_rejected() {
        let store = ledger("100");
        for amount in ["0", "-5", "0.001"] {
            let err = store
                .apply_transaction(TransactionCandidate::incoming("x", dec(amount)))
                .unwrap_err();
            assert!(matches!(err, Error::Validation(_)));
        }
        assert!(store.transactions().is_empty());
    }

    #[test]
    fn test_balance_invariant_holds() {
        let seed = dec("53000");
        let store = LedgerStore::in_memory(Wallet::seeded(seed));
        store
            .apply_transaction(TransactionCandidate::outgoing("a", dec("500")))
            .unwrap();
        store
            .apply_transaction(TransactionCandidate::incoming("b", dec("120.25")))
            .unwrap();
        let _ = store.apply_transaction(TransactionCandidate::outgoing("c", dec("999999")));
        store
            .apply_transaction(TransactionCandidate::outgoing("d", dec("0.75")))
            .unwrap();

        let wallet = store.wallet();
        assert_eq!(wallet.implied_seed(), Some(seed));
        assert_eq!(wallet.balance, dec("52619.50"));
    }

    #[test]
    fn test_ids_are_unique() {
        let store = ledger("1000");
        for _ in 0..20 {
            store
                .apply_transaction(TransactionCandidate::outgoing("x", dec("10")))
                .unwrap();
        }
        let mut ids: Vec<_> = store.transactions().into_iter().map(|tx| tx.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 20);
    }

    #[test]
    fn test_reset_zeroes_and_bumps_generation() {
        let store = ledger("1000");
        store
            .apply_transaction(TransactionCandidate::outgoing("x", dec("10")))
            .unwrap();
        let generation = store.generation();

        let wallet = store.reset();
        assert_eq!(wallet.balance, Decimal::ZERO);
        assert!(wallet.transactions.is_empty());
        assert_eq!(store.generation(), generation + 1);
    }

    #[test]
    fn test_commit_from_stale_generation_is_refused() {
        let store = ledger("1000");
        let generation = store.generation();
        store.reset();

        let err = store
            .commit_transfer(TransactionCandidate::outgoing("x", dec("10")), generation)
            .unwrap_err();
        assert!(matches!(err, Error::TransferInvalidated));
        assert!(store.transactions().is_empty());
    }

    #[test]
    fn test_set_balance_override() {
        let store = ledger("1000");
        let wallet = store.set_balance(dec("42.1")).unwrap();
        assert_eq!(wallet.balance, dec("42.10"));
        assert!(store.set_balance(dec("-1")).is_err());
        assert_eq!(store.balance(), dec("42.10"));
    }

    #[test]
    fn test_concurrent_debits_never_overdraw() {
        let store = Arc::new(ledger("100"));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    store
                        .apply_transaction(TransactionCandidate::outgoing("x", dec("30")))
                        .is_ok()
                })
            })
            .collect();

        let succeeded = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert_eq!(succeeded, 3);
        assert_eq!(store.balance(), dec("10.00"));
    }
}
