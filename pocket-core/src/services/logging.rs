//! Logging service - structured event logging to DuckDB
//!
//! Provides a privacy-safe logging system that stores events in logs.duckdb.
//! No user data (amounts, balances, phone numbers, IBANs, PINs, names) is ever
//! logged; events carry only their name, the screen or command they came
//! from, and error text produced by the core itself.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, Result};
use duckdb::Connection;
use serde::{Deserialize, Serialize};

use crate::log_migrations::LOG_MIGRATIONS;
use crate::services::MigrationService;

/// Counter for generating unique IDs within the same millisecond
static ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a unique ID based on timestamp + counter
fn generate_id() -> u64 {
    // Use lower 48 bits for timestamp (good for ~8900 years)
    // Use upper 16 bits for counter (65536 unique IDs per millisecond)
    let counter = ID_COUNTER.fetch_add(1, Ordering::Relaxed) & 0xFFFF;
    ((now_ms() as u64) << 16) | counter
}

/// Get current unix timestamp in milliseconds
pub(crate) fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

/// Detect the current platform
fn detect_platform() -> &'static str {
    if cfg!(target_os = "android") {
        "android"
    } else if cfg!(target_os = "ios") {
        "ios"
    } else if cfg!(target_os = "macos") {
        "macos"
    } else if cfg!(target_os = "windows") {
        "windows"
    } else if cfg!(target_os = "linux") {
        "linux"
    } else {
        "unknown"
    }
}

/// Front end that opened the wallet, recorded on every entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryPoint {
    Cli,
}

impl EntryPoint {
    fn as_str(&self) -> &'static str {
        match self {
            EntryPoint::Cli => "cli",
        }
    }
}

/// A log event to be recorded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEvent {
    pub event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screen: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_details: Option<String>,
}

impl LogEvent {
    /// Create a new log event with just an event name
    pub fn new(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            screen: None,
            command: None,
            error_message: None,
            error_details: None,
        }
    }

    /// Set the screen of the flow that raised the event
    pub fn with_screen(mut self, screen: impl Into<String>) -> Self {
        self.screen = Some(screen.into());
        self
    }

    /// Set the command context (for CLI events)
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    /// Set error information
    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    /// Set error details (additional context)
    pub fn with_error_details(mut self, details: impl Into<String>) -> Self {
        self.error_details = Some(details.into());
        self
    }
}

/// A log entry as stored in the database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: u64,
    pub timestamp: i64,
    pub entry_point: String,
    pub app_version: String,
    pub platform: String,
    pub event: String,
    pub screen: Option<String>,
    pub command: Option<String>,
    pub error_message: Option<String>,
    pub error_details: Option<String>,
}

/// Per-event tally of the log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventCount {
    pub event: String,
    pub total: u64,
    pub errors: u64,
    pub last_seen: i64,
}

/// Optional logger handed to the stores. Logging never blocks an operation.
pub type EventLog = Option<Arc<LoggingService>>;

/// Record an event, ignoring any errors (logging should never break the app)
pub fn log_event(logger: &EventLog, event: LogEvent) {
    if let Some(l) = logger {
        let _ = l.log(event);
    }
}

/// Service for structured event logging
///
/// This service manages the logs.duckdb database and provides methods
/// for logging events and querying the log history.
pub struct LoggingService {
    conn: Mutex<Connection>,
    db_path: PathBuf,
    entry_point: EntryPoint,
    app_version: String,
    platform: &'static str,
}

impl LoggingService {
    /// Create a new logging service
    ///
    /// Opens or creates logs.duckdb in the data directory and runs
    /// any pending migrations.
    pub fn new(
        data_dir: &Path,
        entry_point: EntryPoint,
        app_version: impl Into<String>,
    ) -> Result<Self> {
        let db_path = data_dir.join("logs.duckdb");
        let conn = Connection::open(&db_path)?;
        Self::from_connection(conn, db_path, entry_point, app_version.into())
    }

    /// Logging service whose entries vanish with the process
    pub fn in_memory(entry_point: EntryPoint, app_version: impl Into<String>) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn, PathBuf::from(":memory:"), entry_point, app_version.into())
    }

    fn from_connection(
        conn: Connection,
        db_path: PathBuf,
        entry_point: EntryPoint,
        app_version: String,
    ) -> Result<Self> {
        MigrationService::new(&conn, LOG_MIGRATIONS).run_pending()?;
        Ok(Self {
            conn: Mutex::new(conn),
            db_path,
            entry_point,
            app_version,
            platform: detect_platform(),
        })
    }

    /// Log an event
    ///
    /// The entry_point, app_version, and platform are automatically added
    /// from the service configuration.
    pub fn log(&self, event: LogEvent) -> Result<()> {
        let conn = self.conn.lock().map_err(|e| anyhow!("Lock poisoned: {}", e))?;

        conn.execute(
            r#"
            INSERT INTO sys_logs (
                id, timestamp, entry_point, app_version, platform,
                event, screen, command, error_message, error_details
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            duckdb::params![
                generate_id(),
                now_ms(),
                self.entry_point.as_str(),
                &self.app_version,
                self.platform,
                &event.event,
                &event.screen,
                &event.command,
                &event.error_message,
                &event.error_details,
            ],
        )?;

        Ok(())
    }

    /// Log a CLI command execution
    pub fn log_command(&self, command: &str) -> Result<()> {
        self.log(LogEvent::new("command_executed").with_command(command))
    }

    fn query_entries<P: duckdb::Params>(&self, sql: &str, params: P) -> Result<Vec<LogEntry>> {
        let conn = self.conn.lock().map_err(|e| anyhow!("Lock poisoned: {}", e))?;
        let mut stmt = conn.prepare(sql)?;

        let entries = stmt
            .query_map(params, |row| {
                Ok(LogEntry {
                    id: row.get(0)?,
                    timestamp: row.get(1)?,
                    entry_point: row.get(2)?,
                    app_version: row.get(3)?,
                    platform: row.get(4)?,
                    event: row.get(5)?,
                    screen: row.get(6)?,
                    command: row.get(7)?,
                    error_message: row.get(8)?,
                    error_details: row.get(9)?,
                })
            })?
            .filter_map(|r| r.ok())
            .collect();

        Ok(entries)
    }

    /// Query recent log entries, newest first
    pub fn get_recent(&self, limit: usize) -> Result<Vec<LogEntry>> {
        self.query_entries(
            r#"
            SELECT id, timestamp, entry_point, app_version, platform,
                   event, screen, command, error_message, error_details
            FROM sys_logs
            ORDER BY id DESC
            LIMIT ?
            "#,
            [sql_limit(limit)],
        )
    }

    /// Query entries whose event name starts with `prefix`, newest first.
    ///
    /// `prefix` is matched literally, so `pin_` selects the PIN gate events.
    pub fn get_by_event(&self, prefix: &str, limit: usize) -> Result<Vec<LogEntry>> {
        self.query_entries(
            r#"
            SELECT id, timestamp, entry_point, app_version, platform,
                   event, screen, command, error_message, error_details
            FROM sys_logs
            WHERE starts_with(event, ?)
            ORDER BY id DESC
            LIMIT ?
            "#,
            duckdb::params![prefix, sql_limit(limit)],
        )
    }

    /// Query log entries with errors, newest first
    pub fn get_errors(&self, limit: usize) -> Result<Vec<LogEntry>> {
        self.query_entries(
            r#"
            SELECT id, timestamp, entry_point, app_version, platform,
                   event, screen, command, error_message, error_details
            FROM sys_logs
            WHERE error_message IS NOT NULL
            ORDER BY id DESC
            LIMIT ?
            "#,
            [sql_limit(limit)],
        )
    }

    /// Number of entries and errors per event name, most frequent first
    pub fn event_counts(&self) -> Result<Vec<EventCount>> {
        let conn = self.conn.lock().map_err(|e| anyhow!("Lock poisoned: {}", e))?;
        let mut stmt = conn.prepare(
            r#"
            SELECT event, COUNT(*), COUNT(error_message), MAX(timestamp)
            FROM sys_logs
            GROUP BY event
            ORDER BY COUNT(*) DESC, event
            "#,
        )?;

        let counts = stmt
            .query_map([], |row| {
                Ok(EventCount {
                    event: row.get(0)?,
                    total: row.get(1)?,
                    errors: row.get(2)?,
                    last_seen: row.get(3)?,
                })
            })?
            .filter_map(|r| r.ok())
            .collect();

        Ok(counts)
    }

    /// Get the total number of log entries
    pub fn count(&self) -> Result<u64> {
        let conn = self.conn.lock().map_err(|e| anyhow!("Lock poisoned: {}", e))?;
        let count: u64 = conn.query_row("SELECT COUNT(*) FROM sys_logs", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Delete logs older than the specified timestamp (unix ms)
    pub fn delete_before(&self, timestamp_ms: i64) -> Result<u64> {
        let conn = self.conn.lock().map_err(|e| anyhow!("Lock poisoned: {}", e))?;
        let deleted = conn.execute("DELETE FROM sys_logs WHERE timestamp < ?", [timestamp_ms])?;
        Ok(deleted as u64)
    }

    /// Get the path to the logs database
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn service() -> LoggingService {
        LoggingService::in_memory(EntryPoint::Cli, "1.0.0").unwrap()
    }

    #[test]
    fn test_logging_service_creation() {
        let dir = tempdir().unwrap();
        let service = LoggingService::new(dir.path(), EntryPoint::Cli, "1.0.0").unwrap();

        assert!(service.db_path().exists());
    }

    #[test]
    fn test_log_event() {
        let service = service();

        service.log(LogEvent::new("pin_verified")).unwrap();

        let entries = service.get_recent(10).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].event, "pin_verified");
        assert_eq!(entries[0].entry_point, "cli");
        assert_eq!(entries[0].app_version, "1.0.0");
    }

    #[test]
    fn test_log_command_and_screen() {
        let service = service();

        service.log_command("transfer").unwrap();
        service
            .log(LogEvent::new("transfer_committed").with_screen("transfer_confirmation"))
            .unwrap();

        let entries = service.get_recent(10).unwrap();
        assert_eq!(entries[0].event, "transfer_committed");
        assert_eq!(entries[0].screen, Some("transfer_confirmation".to_string()));
        assert_eq!(entries[0].command, None);
        assert_eq!(entries[1].event, "command_executed");
        assert_eq!(entries[1].command, Some("transfer".to_string()));
    }

    #[test]
    fn test_get_errors() {
        let service = service();

        service.log(LogEvent::new("app_started")).unwrap();
        service
            .log(
                LogEvent::new("rehydrate_slice_fallback")
                    .with_error("slice could not be decoded")
                    .with_error_details("wallet"),
            )
            .unwrap();

        let errors = service.get_errors(10).unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].event, "rehydrate_slice_fallback");
        assert_eq!(errors[0].error_message, Some("slice could not be decoded".to_string()));
        assert_eq!(errors[0].error_details, Some("wallet".to_string()));
    }

    #[test]
    fn test_get_by_event_prefix() {
        let service = service();

        for event in ["pin_verified", "transfer_submitted", "pin_rejected", "transfer_committed"] {
            service.log(LogEvent::new(event)).unwrap();
        }

        let pin: Vec<_> = service
            .get_by_event("pin_", 10)
            .unwrap()
            .into_iter()
            .map(|e| e.event)
            .collect();
        assert_eq!(pin, vec!["pin_rejected", "pin_verified"]);

        assert_eq!(service.get_by_event("transfer_", 1).unwrap().len(), 1);
        assert_eq!(service.get_by_event("transfer_", usize::MAX).unwrap().len(), 2);
        assert!(service.get_by_event("favorite_", 10).unwrap().is_empty());
    }

    #[test]
    fn test_get_by_event_matches_underscore_literally() {
        let service = service();

        service.log(LogEvent::new("pinXverified")).unwrap();
        service.log(LogEvent::new("pin_verified")).unwrap();

        let entries = service.get_by_event("pin_", 10).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].event, "pin_verified");
    }

    #[test]
    fn test_event_counts() {
        let service = service();

        service.log(LogEvent::new("transfer_committed")).unwrap();
        service.log(LogEvent::new("transfer_committed")).unwrap();
        service
            .log(LogEvent::new("transfer_failed").with_error("Insufficient funds"))
            .unwrap();

        let counts = service.event_counts().unwrap();
        assert_eq!(counts.len(), 2);
        assert_eq!(counts[0].event, "transfer_committed");
        assert_eq!(counts[0].total, 2);
        assert_eq!(counts[0].errors, 0);
        assert_eq!(counts[1].event, "transfer_failed");
        assert_eq!(counts[1].errors, 1);
        assert!(counts[1].last_seen > 0);
    }

    #[test]
    fn test_count_and_delete() {
        let service = service();

        for event in ["ledger_reset", "session_cleared", "logout"] {
            service.log(LogEvent::new(event)).unwrap();
        }
        assert_eq!(service.count().unwrap(), 3);

        let deleted = service.delete_before(now_ms() + 1000).unwrap();
        assert_eq!(deleted, 3);
        assert_eq!(service.count().unwrap(), 0);
    }

    #[test]
    fn test_log_event_helper_swallows_missing_logger() {
        let none: EventLog = None;
        log_event(&none, LogEvent::new("ignored"));

        let some: EventLog = Some(Arc::new(service()));
        log_event(&some, LogEvent::new("kept"));
        assert_eq!(some.as_ref().unwrap().count().unwrap(), 1);
    }
}
