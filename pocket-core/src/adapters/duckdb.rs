//! DuckDB key-value adapters for the snapshot and secure stores

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use duckdb::{params, Connection};

use crate::domain::result::{Error, Result as CoreResult};
use crate::migrations::{MIGRATIONS, SECURE_MIGRATIONS};
use crate::ports::{SecureStore, SnapshotStore};
use crate::services::MigrationService;

/// Maximum number of retries when database file is locked
const MAX_RETRIES: u32 = 5;

/// Initial retry delay in milliseconds (doubles each retry: 50, 100, 200, 400, 800ms)
const INITIAL_RETRY_DELAY_MS: u64 = 50;

/// Check if an error message indicates a file locking issue that should be retried
fn is_retryable_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    // Windows error messages
    lower.contains("being used by another process")
        || lower.contains("cannot access the file")
        // Unix/macOS error messages
        || lower.contains("resource temporarily unavailable")
        || lower.contains("database is locked")
        || lower.contains("file is already open")
}

/// Open a DuckDB file, retrying with exponential backoff on lock errors
fn open_with_retry(db_path: &Path) -> Result<Connection> {
    let mut last_error = None;

    for attempt in 0..MAX_RETRIES {
        match try_open_connection(db_path) {
            Ok(conn) => return Ok(conn),
            Err(e) => {
                let err_msg = e.to_string();
                if is_retryable_error(&err_msg) && attempt < MAX_RETRIES - 1 {
                    let delay = Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt));
                    eprintln!(
                        "[pocket] Database busy, retrying in {}ms (attempt {}/{}): {}",
                        delay.as_millis(),
                        attempt + 1,
                        MAX_RETRIES,
                        err_msg
                    );
                    thread::sleep(delay);
                    last_error = Some(e);
                    continue;
                }
                return Err(e);
            }
        }
    }

    Err(last_error
        .unwrap_or_else(|| anyhow!("Failed to open database after {} retries", MAX_RETRIES)))
}

fn try_open_connection(db_path: &Path) -> Result<Connection> {
    // Disable extension autoloading; nothing here needs extensions
    let config = duckdb::Config::default().enable_autoload_extension(false)?;
    Ok(Connection::open_with_flags(db_path, config)?)
}

/// One key-value table inside one DuckDB file
struct KvTable {
    conn: Mutex<Connection>,
    db_path: PathBuf,
    select_sql: String,
    upsert_sql: String,
    delete_sql: String,
}

impl KvTable {
    fn open(
        db_path: &Path,
        table: &str,
        migrations: &'static [(&'static str, &'static str)],
    ) -> Result<Self> {
        let conn = open_with_retry(db_path)?;
        MigrationService::new(&conn, migrations).run_pending()?;
        Ok(Self::with_connection(conn, db_path.to_path_buf(), table))
    }

    fn open_in_memory(
        table: &str,
        migrations: &'static [(&'static str, &'static str)],
    ) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        MigrationService::new(&conn, migrations).run_pending()?;
        Ok(Self::with_connection(conn, PathBuf::from(":memory:"), table))
    }

    fn with_connection(conn: Connection, db_path: PathBuf, table: &str) -> Self {
        Self {
            conn: Mutex::new(conn),
            db_path,
            select_sql: format!("SELECT value FROM {} WHERE key = ?", table),
            upsert_sql: format!(
                "INSERT OR REPLACE INTO {} (key, value, updated_at) VALUES (?, ?, current_timestamp)",
                table
            ),
            delete_sql: format!("DELETE FROM {} WHERE key = ?", table),
        }
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().map_err(|e| anyhow!("Lock poisoned: {}", e))?;
        match conn.query_row(&self.select_sql, [key], |row| row.get::<_, String>(0)) {
            Ok(value) => Ok(Some(value)),
            Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock().map_err(|e| anyhow!("Lock poisoned: {}", e))?;
        conn.execute(&self.upsert_sql, params![key, value])?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let conn = self.conn.lock().map_err(|e| anyhow!("Lock poisoned: {}", e))?;
        conn.execute(&self.delete_sql, [key])?;
        Ok(())
    }
}

/// Run a blocking table operation off the async executor
async fn blocking<T, F>(table: &Arc<KvTable>, op: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&KvTable) -> Result<T> + Send + 'static,
{
    let table = Arc::clone(table);
    tokio::task::spawn_blocking(move || op(&table))
        .await
        .map_err(|e| anyhow!("storage task failed: {}", e))?
}

/// Application snapshot storage in `pocket.duckdb`
pub struct DuckDbSnapshotStore {
    table: Arc<KvTable>,
}

impl DuckDbSnapshotStore {
    /// Open (or create) the state database and run its migrations
    pub fn new(db_path: &Path) -> Result<Self> {
        Ok(Self {
            table: Arc::new(KvTable::open(db_path, "sys_kv_store", MIGRATIONS)?),
        })
    }

    /// Non-durable store backed by an in-memory DuckDB
    pub fn in_memory() -> Result<Self> {
        Ok(Self {
            table: Arc::new(KvTable::open_in_memory("sys_kv_store", MIGRATIONS)?),
        })
    }

    pub fn db_path(&self) -> &Path {
        &self.table.db_path
    }
}

#[async_trait]
impl SnapshotStore for DuckDbSnapshotStore {
    async fn read(&self, key: &str) -> CoreResult<Option<String>> {
        let key = key.to_string();
        blocking(&self.table, move |t| t.get(&key))
            .await
            .map_err(|e| Error::PersistenceReadFailure(e.to_string()))
    }

    async fn write(&self, key: &str, value: &str) -> CoreResult<()> {
        let (key, value) = (key.to_string(), value.to_string());
        blocking(&self.table, move |t| t.put(&key, &value))
            .await
            .map_err(|e| Error::PersistenceWriteFailure(e.to_string()))
    }

    async fn remove(&self, key: &str) -> CoreResult<()> {
        let key = key.to_string();
        blocking(&self.table, move |t| t.delete(&key))
            .await
            .map_err(|e| Error::PersistenceWriteFailure(e.to_string()))
    }
}

/// Credential storage in its own file, `secure.duckdb`.
///
/// On Unix the file is restricted to its owner.
pub struct DuckDbSecureStore {
    table: Arc<KvTable>,
}

impl DuckDbSecureStore {
    pub fn new(db_path: &Path) -> Result<Self> {
        let table = KvTable::open(db_path, "sys_secure_items", SECURE_MIGRATIONS)?;
        restrict_permissions(db_path)?;
        Ok(Self {
            table: Arc::new(table),
        })
    }

    pub fn in_memory() -> Result<Self> {
        Ok(Self {
            table: Arc::new(KvTable::open_in_memory("sys_secure_items", SECURE_MIGRATIONS)?),
        })
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    if path.exists() {
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

#[async_trait]
impl SecureStore for DuckDbSecureStore {
    async fn get(&self, key: &str) -> CoreResult<Option<String>> {
        let key = key.to_string();
        blocking(&self.table, move |t| t.get(&key))
            .await
            .map_err(|e| Error::PersistenceReadFailure(e.to_string()))
    }

    async fn set(&self, key: &str, value: &str) -> CoreResult<()> {
        let (key, value) = (key.to_string(), value.to_string());
        blocking(&self.table, move |t| t.put(&key, &value))
            .await
            .map_err(|e| Error::PersistenceWriteFailure(e.to_string()))
    }

    async fn delete(&self, key: &str) -> CoreResult<()> {
        let key = key.to_string();
        blocking(&self.table, move |t| t.delete(&key))
            .await
            .map_err(|e| Error::PersistenceWriteFailure(e.to_string()))
    }
}
