//! Pocket Core - wallet ledger, transfer flow and PIN gate
//!
//! This crate implements the core domain logic following hexagonal architecture:
//!
//! - **domain**: Core business entities (Wallet, Transaction, Pin, etc.)
//! - **ports**: Trait definitions for external dependencies (SnapshotStore, SecureStore, BiometricProvider)
//! - **services**: Stores, state machines and orchestration
//! - **adapters**: Concrete implementations (DuckDB, in-memory, biometric stubs)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod log_migrations;
pub mod migrations;
pub mod ports;
pub mod services;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::task::JoinHandle;

use adapters::biometric::UnavailableBiometrics;
use adapters::dir_lock::DataDirLock;
use adapters::duckdb::{DuckDbSecureStore, DuckDbSnapshotStore};
use config::Config;
use ports::{BiometricProvider, SecureStore, SnapshotStore};
use services::*;

// Re-export commonly used types at crate root
pub use domain::result::Error;
pub use domain::{
    AuthSession, ContactInput, FavoriteContact, PaymentRequest, RecentContact, Transaction,
    TransactionType, Wallet,
};

/// Storage and collaborators a context is built from
pub struct PocketParts {
    pub config: Config,
    pub snapshot_store: Arc<dyn SnapshotStore>,
    pub secure_store: Arc<dyn SecureStore>,
    pub biometrics: Arc<dyn BiometricProvider>,
    pub logger: EventLog,
}

/// Main context for Pocket operations
///
/// This is the primary entry point for all business logic. It rehydrates the
/// persisted snapshot, starts the persistence writer and holds every store.
pub struct PocketContext {
    pub config: Config,
    pub ledger: Arc<LedgerStore>,
    pub favorites: Arc<FavoritesRegistry>,
    pub session: Arc<SessionStore>,
    pub preferences: Arc<PreferencesStore>,
    pub secure_store: Arc<dyn SecureStore>,
    pub biometrics: Arc<dyn BiometricProvider>,
    pub logger: EventLog,
    pub persistence: PersistenceHandle,
    /// What rehydration found at startup
    pub rehydrated: Rehydrated,
    data_dir: Option<PathBuf>,
    writer: Option<JoinHandle<()>>,
    _lock: Option<DataDirLock>,
}

/// How long `close` waits for the writer to drain
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

impl PocketContext {
    /// Open the data directory with its DuckDB stores and event log
    ///
    /// Must be called from inside a tokio runtime.
    pub async fn open(data_dir: &Path, entry_point: EntryPoint) -> Result<Self> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create {}", data_dir.display()))?;
        let lock = DataDirLock::acquire(data_dir)?;
        let config = Config::load(data_dir)?;

        // Logging must never stop the app from starting
        let logger = match LoggingService::new(data_dir, entry_point, env!("CARGO_PKG_VERSION")) {
            Ok(service) => Some(Arc::new(service)),
            Err(e) => {
                eprintln!("[pocket] Event log unavailable: {}", e);
                None
            }
        };

        let snapshot_store = DuckDbSnapshotStore::new(&data_dir.join("pocket.duckdb"))
            .context("Failed to open state database")?;
        let secure_store = DuckDbSecureStore::new(&data_dir.join("secure.duckdb"))
            .context("Failed to open credential store")?;
        let biometrics = UnavailableBiometrics::new(config.biometric_opt_in);

        let mut context = Self::from_parts(PocketParts {
            config,
            snapshot_store: Arc::new(snapshot_store),
            secure_store: Arc::new(secure_store),
            biometrics: Arc::new(biometrics),
            logger,
        })
        .await;
        context.data_dir = Some(data_dir.to_path_buf());
        context._lock = Some(lock);
        Ok(context)
    }

    /// Build a context over arbitrary adapters (in-memory stores in tests)
    pub async fn from_parts(parts: PocketParts) -> Self {
        let PocketParts {
            config,
            snapshot_store,
            secure_store,
            biometrics,
            logger,
        } = parts;

        let layer = PersistenceLayer::new(snapshot_store, config.seed_balance, logger.clone());
        let rehydrated = layer.rehydrate().await;
        let snapshot = rehydrated.snapshot.clone();
        let (persistence, writer) = layer.spawn(snapshot.clone());

        let ledger = Arc::new(LedgerStore::new(
            snapshot.wallet,
            persistence.clone(),
            logger.clone(),
        ));
        let favorites = Arc::new(FavoritesRegistry::new(
            snapshot.favorites,
            persistence.clone(),
            logger.clone(),
        ));
        let session = Arc::new(SessionStore::new(
            snapshot.auth,
            persistence.clone(),
            logger.clone(),
        ));
        let preferences = Arc::new(PreferencesStore::new(
            snapshot.theme,
            snapshot.budget,
            persistence.clone(),
        ));

        log_event(&logger, LogEvent::new("app_started"));

        Self {
            config,
            ledger,
            favorites,
            session,
            preferences,
            secure_store,
            biometrics,
            logger,
            persistence,
            rehydrated,
            data_dir: None,
            writer: Some(writer),
            _lock: None,
        }
    }

    /// Data directory, if this context was opened from disk
    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    /// A PIN gate wired to this context's stores
    pub fn auth_gate(&self) -> AuthGate {
        AuthGate::new(
            Arc::clone(&self.secure_store),
            Arc::clone(&self.biometrics),
            Arc::clone(&self.session),
            Arc::clone(&self.ledger),
            self.logger.clone(),
        )
    }

    /// A fresh transfer flow for one screen
    pub fn transfer(&self) -> TransferCoordinator {
        TransferCoordinator::new(
            Arc::clone(&self.ledger),
            Arc::clone(&self.favorites),
            self.logger.clone(),
        )
        .with_minimum(self.config.min_transfer_amount)
    }

    /// Wait for every queued snapshot write
    pub async fn flush(&self) -> domain::result::Result<()> {
        self.persistence.flush().await
    }

    /// Flush, stop the writer and release the data directory.
    ///
    /// Gates and coordinators handed out by this context must be dropped
    /// first, since they keep the stores alive.
    pub async fn close(mut self) -> domain::result::Result<()> {
        let flushed = self.persistence.flush().await;
        let writer = self.writer.take();
        let lock = self._lock.take();
        log_event(&self.logger, LogEvent::new("app_closed"));
        drop(self);

        if let Some(writer) = writer {
            let _ = tokio::time::timeout(CLOSE_TIMEOUT, writer).await;
        }
        drop(lock);
        flushed
    }
}
