//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. The core domain
//! depends only on these traits, not on concrete implementations.

mod biometric;
mod secure_store;
mod snapshot_store;

pub use biometric::{BiometricProvider, BiometricResult};
pub use secure_store::{SecureStore, AUTH_TOKEN_KEY, PIN_KEY, REFRESH_TOKEN_KEY};
pub use snapshot_store::SnapshotStore;
