//! Persistence layer - rehydration and write-through of the app snapshot
//!
//! Startup reads the snapshot stored under [`ROOT_KEY`] and decodes it slice
//! by slice. After that, every store that owns a slice pushes its new value
//! through a [`PersistenceHandle`]. A single writer task merges the updates
//! into its own image of the snapshot and writes the whole record, so writes
//! never interleave.

use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::domain::result::{Error, Result};
use crate::domain::snapshot::ROOT_KEY;
use crate::domain::{AppSnapshot, Slice, SliceFallback, SliceUpdate};
use crate::ports::SnapshotStore;
use crate::services::logging::{log_event, EventLog, LogEvent};

enum WriterCommand {
    Update(SliceUpdate),
    Flush(oneshot::Sender<std::result::Result<(), String>>),
}

/// Sending side of the writer task. Cheap to clone.
#[derive(Clone)]
pub struct PersistenceHandle {
    tx: Option<mpsc::UnboundedSender<WriterCommand>>,
}

impl PersistenceHandle {
    /// Handle that drops every update (purely in-memory use)
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.tx.is_some()
    }

    /// Queue a slice update. Never blocks and never fails the caller.
    pub fn submit(&self, update: SliceUpdate) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(WriterCommand::Update(update));
        }
    }

    /// Wait until every update queued so far has been written.
    ///
    /// Returns the last write error if the snapshot could not be stored.
    pub async fn flush(&self) -> Result<()> {
        let Some(tx) = &self.tx else {
            return Ok(());
        };
        let (done_tx, done_rx) = oneshot::channel();
        if tx.send(WriterCommand::Flush(done_tx)).is_err() {
            return Err(Error::PersistenceWriteFailure("writer stopped".to_string()));
        }
        match done_rx.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(Error::PersistenceWriteFailure(e)),
            Err(_) => Err(Error::PersistenceWriteFailure("writer stopped".to_string())),
        }
    }
}

/// Snapshot read at startup
#[derive(Debug, Clone)]
pub struct Rehydrated {
    pub snapshot: AppSnapshot,
    /// Slices that were present but unreadable and took their default
    pub fallbacks: Vec<SliceFallback>,
    /// True when nothing was stored yet (first launch)
    pub first_launch: bool,
}

/// Reads and writes the whole-state snapshot
pub struct PersistenceLayer {
    store: Arc<dyn SnapshotStore>,
    seed_balance: Decimal,
    logger: EventLog,
}

impl PersistenceLayer {
    pub fn new(store: Arc<dyn SnapshotStore>, seed_balance: Decimal, logger: EventLog) -> Self {
        Self {
            store,
            seed_balance,
            logger,
        }
    }

    /// Load the stored snapshot.
    ///
    /// Never fails: an unreadable store or record yields the first-launch
    /// state for the affected slices, and each fallback is logged.
    pub async fn rehydrate(&self) -> Rehydrated {
        let raw = match self.store.read(ROOT_KEY).await {
            Ok(raw) => raw,
            Err(e) => {
                log_event(
                    &self.logger,
                    LogEvent::new("persistence_read_failed").with_error(e.to_string()),
                );
                return Rehydrated {
                    snapshot: AppSnapshot::initial(self.seed_balance),
                    fallbacks: Slice::ALL
                        .iter()
                        .map(|slice| SliceFallback {
                            slice: *slice,
                            reason: e.to_string(),
                        })
                        .collect(),
                    first_launch: false,
                };
            }
        };

        let Some(raw) = raw else {
            return Rehydrated {
                snapshot: AppSnapshot::initial(self.seed_balance),
                fallbacks: Vec::new(),
                first_launch: true,
            };
        };

        let (snapshot, fallbacks) = AppSnapshot::decode(&raw, self.seed_balance);
        for fallback in &fallbacks {
            // Decoder messages may quote stored values, so only the slice name is logged
            log_event(
                &self.logger,
                LogEvent::new("rehydrate_slice_fallback")
                    .with_error("slice could not be decoded")
                    .with_error_details(fallback.slice.as_str()),
            );
        }

        Rehydrated {
            snapshot,
            fallbacks,
            first_launch: false,
        }
    }

    /// Spawn the writer task, seeded with the rehydrated snapshot.
    ///
    /// Must be called from inside a tokio runtime.
    pub fn start(self, image: AppSnapshot) -> PersistenceHandle {
        self.spawn(image).0
    }

    /// Like [`start`](Self::start), also returning the writer task.
    ///
    /// The task ends once every handle has been dropped and the queue drained.
    pub fn spawn(self, image: AppSnapshot) -> (PersistenceHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let writer = tokio::spawn(run_writer(self.store, image, rx, self.logger));
        (PersistenceHandle { tx: Some(tx) }, writer)
    }

    /// Delete the stored snapshot
    pub async fn purge(&self) -> Result<()> {
        self.store.remove(ROOT_KEY).await
    }
}

async fn run_writer(
    store: Arc<dyn SnapshotStore>,
    mut image: AppSnapshot,
    mut rx: mpsc::UnboundedReceiver<WriterCommand>,
    logger: EventLog,
) {
    let mut dirty = false;
    let mut last_error: Option<String> = None;

    while let Some(command) = rx.recv().await {
        let mut waiters = Vec::new();
        absorb(command, &mut image, &mut dirty, &mut waiters);

        // Coalesce whatever queued up behind the first command into one write
        while let Ok(command) = rx.try_recv() {
            absorb(command, &mut image, &mut dirty, &mut waiters);
        }

        if dirty {
            let written = match image.to_json() {
                Ok(json) => store.write(ROOT_KEY, &json).await,
                Err(e) => Err(Error::from(e)),
            };
            match written {
                Ok(()) => {
                    dirty = false;
                    last_error = None;
                }
                Err(e) => {
                    // The image stays dirty and is rewritten on the next command
                    log_event(
                        &logger,
                        LogEvent::new("persistence_write_failed").with_error(e.to_string()),
                    );
                    last_error = Some(e.to_string());
                }
            }
        }

        for waiter in waiters {
            let _ = waiter.send(match &last_error {
                Some(e) => Err(e.clone()),
                None => Ok(()),
            });
        }
    }
}

fn absorb(
    command: WriterCommand,
    image: &mut AppSnapshot,
    dirty: &mut bool,
    waiters: &mut Vec<oneshot::Sender<std::result::Result<(), String>>>,
) {
    match command {
        WriterCommand::Update(update) => {
            image.apply(update);
            *dirty = true;
        }
        WriterCommand::Flush(done) => waiters.push(done),
    }
}
