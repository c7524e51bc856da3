//! Wallet domain model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::transaction::{normalize_amount, Transaction, TransactionType};

/// Balance given to a wallet on first launch
pub const DEFAULT_SEED_BALANCE: i64 = 53_000;

/// Balance plus transaction history, most recent first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub balance: Decimal,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

impl Default for Wallet {
    fn default() -> Self {
        Self::seeded(Decimal::new(DEFAULT_SEED_BALANCE, 0))
    }
}

impl Wallet {
    /// Fresh wallet holding the seed balance
    pub fn seeded(seed: Decimal) -> Self {
        Self {
            balance: normalize_amount(seed),
            transactions: Vec::new(),
        }
    }

    /// Signed-out wallet
    pub fn empty() -> Self {
        Self::seeded(Decimal::ZERO)
    }

    /// Sum of all amounts of one kind, saturating at `Decimal::MAX`
    pub fn total(&self, kind: TransactionType) -> Decimal {
        self.transactions
            .iter()
            .filter(|tx| tx.kind == kind)
            .fold(Decimal::ZERO, |acc, tx| acc.saturating_add(tx.amount))
    }

    /// Balance the wallet started from, derived from its history.
    ///
    /// `None` when replaying the history leaves the representable range.
    pub fn implied_seed(&self) -> Option<Decimal> {
        self.transactions
            .iter()
            .try_fold(self.balance, |acc, tx| acc.checked_sub(tx.signed_amount()))
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.transactions.iter().any(|tx| tx.id == id)
    }
}
