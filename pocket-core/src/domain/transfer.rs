//! Transfer intent: raw draft input, validation rules and the confirmation
//! snapshot

use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::result::{Error, Result};
use super::transaction::normalize_amount;

/// Smallest amount a transfer may move
pub const MIN_TRANSFER_AMOUNT: i64 = 10;

fn separators_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[ \-()]").expect("static pattern"))
}

/// Raw, unvalidated user input on the transfer screen
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferDraft {
    pub recipient: String,
    pub amount: String,
    pub description: String,
}

impl TransferDraft {
    pub fn is_empty(&self) -> bool {
        self.recipient.is_empty() && self.amount.is_empty() && self.description.is_empty()
    }
}

/// Decoded QR payment payload used to prefill a draft
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub recipient: String,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub name: String,
}

/// Validated transfer details shown to the user before commit.
///
/// Owned separately from the draft; later draft edits never reach it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationSnapshot {
    /// Cleaned phone number
    pub recipient: String,
    pub amount: Decimal,
    pub description: Option<String>,
}

/// Remove spaces, dashes and parentheses from a phone number
pub fn clean_recipient(raw: &str) -> String {
    separators_re().replace_all(raw, "").into_owned()
}

/// Validate a recipient phone number and return its cleaned form.
///
/// Accepted: 10 digits starting with `5`, or 11 digits starting with `0`.
pub fn validate_recipient(raw: &str) -> Result<String> {
    let cleaned = clean_recipient(raw);
    if cleaned.is_empty() || !cleaned.chars().all(|c| c.is_ascii_digit()) {
        return Err(Error::InvalidRecipient);
    }
    let valid = match cleaned.len() {
        10 => cleaned.starts_with('5'),
        11 => cleaned.starts_with('0'),
        _ => false,
    };
    if valid {
        Ok(cleaned)
    } else {
        Err(Error::InvalidRecipient)
    }
}

/// Parse a user-typed amount and enforce the minimum.
///
/// A comma is accepted as decimal separator. Anything that does not parse to a
/// number counts as below the minimum.
pub fn parse_amount(raw: &str, minimum: Decimal) -> Result<Decimal> {
    let normalized = raw.trim().replace(',', ".");
    let amount = Decimal::from_str(&normalized).map_err(|_| Error::AmountTooLow { minimum })?;
    // The minimum applies to the unrounded value
    if amount < minimum {
        return Err(Error::AmountTooLow { minimum });
    }
    Ok(normalize_amount(amount))
}
