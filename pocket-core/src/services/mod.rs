//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. Each store owns
//! one or more slices of the persisted snapshot and is the only writer of
//! them.

pub mod auth;
mod favorites;
mod ledger;
pub mod logging;
pub mod migration;
mod persistence;
mod preferences;
mod session;
pub mod transfer;

pub use auth::{AuthEffect, AuthError, AuthEvent, AuthGate, AuthMode, AuthState, PinStep};
pub use favorites::{FavoritesRegistry, MAX_FAVORITES, MAX_RECENTS};
pub use ledger::LedgerStore;
pub use logging::{
    log_event, EntryPoint, EventCount, EventLog, LogEntry, LogEvent, LoggingService,
};
pub use migration::{MigrationResult, MigrationService};
pub use persistence::{PersistenceHandle, PersistenceLayer, Rehydrated};
pub use preferences::PreferencesStore;
pub use session::SessionStore;
pub use transfer::{NavigationSignal, TransferCoordinator, TransferState};
