//! Pocket CLI - your wallet in the terminal

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{favorites, history, logout, logs, pin, preferences, receive, recents, status, transfer};
use pocket_core::services::{log_event, LogEvent};

/// Pocket - your wallet in the terminal
#[derive(Parser)]
#[command(name = "pocket", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show balance and wallet summary
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List recent transactions
    History {
        /// Number of transactions to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Send money to a phone number
    Transfer {
        /// Recipient phone number
        recipient: Option<String>,
        /// Amount (comma or dot decimal separator)
        amount: Option<String>,
        /// Optional note shown in the history
        #[arg(short, long)]
        description: Option<String>,
        /// Prefill from a decoded QR payment request (JSON)
        #[arg(long, conflicts_with_all = ["recipient", "amount"])]
        request: Option<String>,
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Record money received from someone
    Receive {
        /// Sender phone number
        sender: String,
        /// Amount received
        amount: String,
        /// Optional note
        #[arg(short, long)]
        description: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Set up, change or check the PIN
    Pin {
        #[command(subcommand)]
        command: pin::PinCommands,
    },

    /// Manage favorite contacts
    Favorites {
        #[command(subcommand)]
        command: favorites::FavoritesCommands,
    },

    /// Show recently used recipients
    Recents {
        /// Forget all recent recipients
        #[arg(long)]
        clear: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show or set the colour theme (light, dark, system)
    Theme {
        mode: Option<String>,
    },

    /// Show or set the monthly spending limit
    Budget {
        /// New monthly limit
        limit: Option<String>,
        /// Remove the limit
        #[arg(long, conflicts_with = "limit")]
        clear: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Sign out and reset the wallet (the PIN is kept)
    Logout {
        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },

    /// View and manage application logs
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Status { .. } => "status",
            Commands::History { .. } => "history",
            Commands::Transfer { .. } => "transfer",
            Commands::Receive { .. } => "receive",
            Commands::Pin { .. } => "pin",
            Commands::Favorites { .. } => "favorites",
            Commands::Recents { .. } => "recents",
            Commands::Theme { .. } => "theme",
            Commands::Budget { .. } => "budget",
            Commands::Logout { .. } => "logout",
            Commands::Logs { .. } => "logs",
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = run(cli).await;

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    // The log store is read directly; no wallet context needed
    if let Commands::Logs { command } = cli.command {
        return logs::run(command);
    }

    let name = cli.command.name();
    let ctx = commands::get_context().await?;
    if let Some(logger) = &ctx.logger {
        let _ = logger.log_command(name);
    }

    let result = match cli.command {
        Commands::Status { json } => status::run(&ctx, json).await,
        Commands::History { limit, json } => history::run(&ctx, limit, json),
        Commands::Transfer { recipient, amount, description, request, yes, json } => {
            transfer::run(&ctx, recipient, amount, description, request, yes, json).await
        }
        Commands::Receive { sender, amount, description, json } => {
            receive::run(&ctx, &sender, &amount, description, json).await
        }
        Commands::Pin { command } => pin::run(&ctx, command).await,
        Commands::Favorites { command } => favorites::run(&ctx, command),
        Commands::Recents { clear, json } => recents::run(&ctx, clear, json),
        Commands::Theme { mode } => preferences::run_theme(&ctx, mode.as_deref()),
        Commands::Budget { limit, clear, json } => {
            preferences::run_budget(&ctx, limit.as_deref(), clear, json)
        }
        Commands::Logout { force } => logout::run(&ctx, force).await,
        Commands::Logs { .. } => Ok(()),
    };

    if let Err(e) = &result {
        log_event(
            &ctx.logger,
            LogEvent::new("command_failed")
                .with_command(name)
                .with_error(e.to_string()),
        );
    }

    // Every queued write reaches disk before the process exits
    let closed = ctx.close().await;
    result?;
    closed.map_err(commands::user_error)
}
