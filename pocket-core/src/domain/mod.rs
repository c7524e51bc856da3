//! Core domain entities
//!
//! All business entities are defined here. These are pure data structures
//! with validation logic - no I/O or external dependencies.

mod contact;
mod pin;
mod preferences;
pub mod result;
pub mod snapshot;
mod transaction;
pub mod transfer;
mod user;
mod wallet;

pub use contact::{
    sanitize_text, ContactInput, ContactKey, FavoriteContact, RecentContact, MAX_IBAN_LENGTH,
    MAX_NAME_LENGTH, MAX_PHONE_LENGTH,
};
pub use pin::{Pin, PinBuffer, PIN_LENGTH};
pub use preferences::{BudgetState, ThemeMode, ThemeState};
pub use snapshot::{AppSnapshot, FavoritesState, Slice, SliceFallback, SliceUpdate};
pub use transaction::{
    normalize_amount, Transaction, TransactionCandidate, TransactionType, DATE_FORMAT,
};
pub use transfer::{ConfirmationSnapshot, PaymentRequest, TransferDraft, MIN_TRANSFER_AMOUNT};
pub use user::{AuthSession, AuthTokens, UserProfile};
pub use wallet::{Wallet, DEFAULT_SEED_BALANCE};
