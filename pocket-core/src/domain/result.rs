//! Result and error types for the core library

use rust_decimal::Decimal;
use thiserror::Error;

/// Message shown for failures that carry no user-actionable detail
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong, please try again.";

/// Core library error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid recipient phone number")]
    InvalidRecipient,

    #[error("Amount too low (minimum {minimum})")]
    AmountTooLow { minimum: Decimal },

    #[error("Insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds { requested: Decimal, available: Decimal },

    #[error("PIN confirmation does not match")]
    PinMismatch,

    #[error("Wrong PIN")]
    WrongPin,

    #[error("PIN must be exactly 4 digits")]
    InvalidPin,

    #[error("No PIN has been set")]
    PinNotSet,

    #[error("Biometric authentication unavailable")]
    BiometricUnavailable,

    #[error("Biometric authentication failed: {0}")]
    BiometricFailed(String),

    #[error("Cannot {action} while {state}")]
    InvalidTransition {
        state: &'static str,
        action: &'static str,
    },

    #[error("Pending transfer invalidated by a wallet reset")]
    TransferInvalidated,

    #[error("Persistence read failure: {0}")]
    PersistenceReadFailure(String),

    #[error("Persistence write failure: {0}")]
    PersistenceWriteFailure(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an invalid transition error
    pub fn invalid_transition(state: &'static str, action: &'static str) -> Self {
        Self::InvalidTransition { state, action }
    }

    /// Message suitable for showing to the user.
    ///
    /// Validation and authentication failures get a specific, actionable
    /// message. Everything else collapses into [`GENERIC_FAILURE_MESSAGE`] so
    /// internal details never reach the screen.
    pub fn user_message(&self) -> String {
        match self {
            Error::InvalidRecipient => {
                "Enter a valid phone number: 10 digits starting with 5, or 11 digits starting with 0."
                    .to_string()
            }
            Error::AmountTooLow { minimum } => {
                format!("Minimum transfer amount is {}.", minimum.normalize())
            }
            Error::InsufficientFunds { .. } => {
                "Insufficient balance for this transfer.".to_string()
            }
            Error::PinMismatch => "PINs do not match. Please enter a new PIN again.".to_string(),
            Error::WrongPin => "Wrong PIN. Please try again.".to_string(),
            Error::InvalidPin => "PIN must be 4 digits.".to_string(),
            Error::PinNotSet => "No PIN is set yet. Create one first.".to_string(),
            Error::BiometricUnavailable => {
                "Biometric unlock is not available on this device.".to_string()
            }
            Error::BiometricFailed(_) => {
                "Biometric check failed. Enter your PIN instead.".to_string()
            }
            Error::InvalidTransition { .. } => "This action is not available right now.".to_string(),
            Error::TransferInvalidated => {
                "This transfer is no longer valid. Please start again.".to_string()
            }
            Error::Validation(msg) => msg.clone(),
            Error::PersistenceReadFailure(_)
            | Error::PersistenceWriteFailure(_)
            | Error::Io(_)
            | Error::Json(_)
            | Error::Other(_) => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;
