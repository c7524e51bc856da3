//! Transaction domain model

use chrono::Local;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Display format of the `date` field
pub const DATE_FORMAT: &str = "%d.%m.%Y %H:%M";

/// Direction of a transaction relative to the wallet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Incoming,
    Outgoing,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Incoming => "incoming",
            TransactionType::Outgoing => "outgoing",
        }
    }
}

/// A committed wallet transaction. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub receiver: String,
    /// Always positive, two decimal places
    pub amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Formatted with [`DATE_FORMAT`]
    pub date: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
}

/// A validated request to move money in or out of the ledger.
///
/// The ledger turns a candidate into a [`Transaction`] by assigning the id and
/// the timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionCandidate {
    pub receiver: String,
    pub amount: Decimal,
    pub description: Option<String>,
    pub kind: TransactionType,
}

impl TransactionCandidate {
    /// Money leaving the wallet
    pub fn outgoing(receiver: impl Into<String>, amount: Decimal) -> Self {
        Self {
            receiver: receiver.into(),
            amount,
            description: None,
            kind: TransactionType::Outgoing,
        }
    }

    /// Money arriving in the wallet
    pub fn incoming(sender: impl Into<String>, amount: Decimal) -> Self {
        Self {
            receiver: sender.into(),
            amount,
            description: None,
            kind: TransactionType::Incoming,
        }
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description.filter(|d| !d.trim().is_empty());
        self
    }
}

impl Transaction {
    /// Build a transaction from a candidate with the given id, stamped now
    pub fn from_candidate(id: String, candidate: TransactionCandidate) -> Self {
        Self {
            id,
            receiver: candidate.receiver,
            amount: normalize_amount(candidate.amount),
            description: candidate.description,
            date: Local::now().format(DATE_FORMAT).to_string(),
            kind: candidate.kind,
        }
    }

    /// Generate a fresh transaction id
    pub fn generate_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// Signed effect of this transaction on the balance
    pub fn signed_amount(&self) -> Decimal {
        match self.kind {
            TransactionType::Incoming => self.amount,
            TransactionType::Outgoing => -self.amount,
        }
    }
}

/// Round to two decimal places and pin the scale so the amount always renders
/// as `"500.00"`.
pub fn normalize_amount(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_serializes_with_two_decimals() {
        let tx = Transaction::from_candidate(
            "tx-1".to_string(),
            TransactionCandidate::outgoing("5551234567", Decimal::new(500, 0)),
        );
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["amount"], "500.00");
        assert_eq!(json["type"], "outgoing");
        assert_eq!(json["receiver"], "5551234567");
        assert!(json.get("description").is_none());
    }

    #[test]
    fn test_normalize_amount_rounds_half_away_from_zero() {
        assert_eq!(normalize_amount(Decimal::new(10005, 3)).to_string(), "10.01");
        assert_eq!(normalize_amount(Decimal::new(12, 0)).to_string(), "12.00");
    }

    #[test]
    fn test_signed_amount() {
        let out = Transaction::from_candidate(
            "a".to_string(),
            TransactionCandidate::outgoing("x", Decimal::new(25, 0)),
        );
        let inc = Transaction::from_candidate(
            "b".to_string(),
            TransactionCandidate::incoming("y", Decimal::new(25, 0)),
        );
        assert_eq!(out.signed_amount(), Decimal::new(-25, 0));
        assert_eq!(inc.signed_amount(), Decimal::new(25, 0));
    }

    #[test]
    fn test_blank_description_is_dropped() {
        let candidate = TransactionCandidate::outgoing("x", Decimal::ONE)
            .with_description(Some("   ".to_string()));
        assert!(candidate.description.is_none());
    }
}
