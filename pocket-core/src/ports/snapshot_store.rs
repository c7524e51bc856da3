//! Snapshot store port - durable key-value storage for application state

use async_trait::async_trait;

use crate::domain::result::Result;

/// Durable key-value storage holding the serialized application snapshot
///
/// Implementations map their own failures to `PersistenceReadFailure` /
/// `PersistenceWriteFailure`.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Read the raw value stored under `key`, if any
    async fn read(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value stored under `key`
    async fn write(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`; removing a missing key is not an error
    async fn remove(&self, key: &str) -> Result<()>;
}
