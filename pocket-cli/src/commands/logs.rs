//! Logs command - inspect the wallet's event log
//!
//! Entries never carry amounts, phone numbers or PINs, so everything here is
//! safe to paste into a bug report.

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use dialoguer::Confirm;

use pocket_core::config;
use pocket_core::services::{EntryPoint, LogEntry, LoggingService};

use crate::output::{create_table, info, success};

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

#[derive(Subcommand)]
pub enum LogsCommands {
    /// Show recent wallet events
    List {
        /// Number of entries to show
        #[arg(short, long, default_value = "50")]
        limit: usize,
        /// Only events whose name starts with this (e.g. pin_, transfer_)
        #[arg(short, long)]
        event: Option<String>,
        /// Show only failures
        #[arg(long)]
        errors: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Count events per name and area
    Events {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete old entries
    Clear {
        /// Delete entries older than N days
        #[arg(long, default_value = "30")]
        older_than_days: u64,
        /// Skip confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Part of the wallet an event belongs to
fn area(event: &str) -> &'static str {
    const AREAS: &[(&str, &str)] = &[
        ("pin_", "lock"),
        ("biometric_", "lock"),
        ("session_", "lock"),
        ("logout", "lock"),
        ("transfer_", "transfer"),
        ("recent_contact_", "transfer"),
        ("transaction_", "ledger"),
        ("ledger_", "ledger"),
        ("balance_", "ledger"),
        ("favorite_", "favorites"),
        ("persistence_", "storage"),
        ("rehydrate_", "storage"),
        ("command_", "cli"),
        ("app_", "app"),
    ];
    AREAS
        .iter()
        .find(|(prefix, _)| event.starts_with(prefix))
        .map(|(_, area)| *area)
        .unwrap_or("other")
}

/// Screen for flow events, the command for CLI events
fn origin(entry: &LogEntry) -> String {
    match (&entry.screen, &entry.command) {
        (Some(screen), _) => screen.clone(),
        (None, Some(command)) => format!("pocket {}", command),
        (None, None) => String::new(),
    }
}

fn open_log() -> Result<LoggingService> {
    let pocket_dir = config::data_dir()?;
    std::fs::create_dir_all(&pocket_dir)?;
    LoggingService::new(&pocket_dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION"))
}

fn format_timestamp(timestamp_ms: i64) -> String {
    use chrono::{Local, TimeZone};
    Local
        .timestamp_millis_opt(timestamp_ms)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| timestamp_ms.to_string())
}

pub fn run(command: LogsCommands) -> Result<()> {
    match command {
        LogsCommands::List {
            limit,
            event,
            errors,
            json,
        } => list(limit, event.as_deref(), errors, json),
        LogsCommands::Events { json } => events(json),
        LogsCommands::Clear {
            older_than_days,
            force,
            json,
        } => clear(older_than_days, force, json),
    }
}

fn list(limit: usize, event: Option<&str>, errors: bool, json: bool) -> Result<()> {
    let log = open_log()?;
    let mut entries = match event {
        Some(prefix) => log.get_by_event(prefix, if errors { usize::MAX } else { limit })?,
        None if errors => log.get_errors(limit)?,
        None => log.get_recent(limit)?,
    };
    if errors {
        entries.retain(|e| e.error_message.is_some());
        entries.truncate(limit);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }
    if entries.is_empty() {
        info("No matching events.");
        return Ok(());
    }

    let mut table = create_table();
    table.set_header(vec!["Time", "Area", "Event", "Screen / command", "Error"]);
    for entry in &entries {
        let error = match &entry.error_message {
            Some(message) => message.red().to_string(),
            None => String::new(),
        };
        table.add_row(vec![
            format_timestamp(entry.timestamp),
            area(&entry.event).to_string(),
            entry.event.clone(),
            origin(entry),
            error,
        ]);
    }
    println!("{}", table);
    Ok(())
}

fn events(json: bool) -> Result<()> {
    let log = open_log()?;
    let counts = log.event_counts()?;

    if json {
        let rows: Vec<_> = counts
            .iter()
            .map(|c| {
                serde_json::json!({
                    "event": c.event,
                    "area": area(&c.event),
                    "total": c.total,
                    "errors": c.errors,
                    "last_seen": c.last_seen,
                })
            })
            .collect();
        println!(
            "{}",
            serde_json::json!({
                "database_path": log.db_path().to_string_lossy(),
                "events": rows,
            })
        );
        return Ok(());
    }
    if counts.is_empty() {
        info("The event log is empty.");
        return Ok(());
    }

    let mut table = create_table();
    table.set_header(vec!["Area", "Event", "Count", "Failures", "Last seen"]);
    for count in &counts {
        let failures = if count.errors > 0 {
            count.errors.to_string().red().to_string()
        } else {
            "0".dimmed().to_string()
        };
        table.add_row(vec![
            area(&count.event).to_string(),
            count.event.clone(),
            count.total.to_string(),
            failures,
            format_timestamp(count.last_seen),
        ]);
    }
    println!("{}", table);

    let total: u64 = counts.iter().map(|c| c.total).sum();
    println!(
        "\n{} events in {}",
        total,
        log.db_path().display().to_string().dimmed()
    );
    Ok(())
}

fn clear(older_than_days: u64, force: bool, json: bool) -> Result<()> {
    let log = open_log()?;
    let age_ms = i64::try_from(older_than_days)
        .unwrap_or(i64::MAX)
        .saturating_mul(DAY_MS);
    let cutoff_ms = chrono::Utc::now().timestamp_millis().saturating_sub(age_ms);

    if !force && !json {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete events older than {} days?", older_than_days))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("{}", "Cancelled".dimmed());
            return Ok(());
        }
    }

    let deleted = log.delete_before(cutoff_ms)?;
    if json {
        println!("{}", serde_json::json!({ "deleted": deleted }));
    } else {
        success(&format!("Deleted {} events", deleted));
    }
    Ok(())
}
