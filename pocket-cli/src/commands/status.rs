//! Status command - show balance and wallet summary

use anyhow::Result;
use colored::Colorize;
use comfy_table::{Table, ContentArrangement};
use rust_decimal::Decimal;
use serde::Serialize;

use pocket_core::{PocketContext, TransactionType};

use super::user_error;
use crate::output::format_amount;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WalletStatus {
    balance: Decimal,
    transactions: usize,
    total_incoming: Decimal,
    total_outgoing: Decimal,
    favorites: usize,
    recents: usize,
    is_authenticated: bool,
    pin_set: bool,
    theme: String,
    monthly_limit: Option<Decimal>,
    data_dir: Option<String>,
}

pub async fn run(ctx: &PocketContext, json: bool) -> Result<()> {
    let wallet = ctx.ledger.wallet();
    let pin_set = ctx.auth_gate().has_pin().await.map_err(user_error)?;

    let status = WalletStatus {
        balance: wallet.balance,
        transactions: wallet.transactions.len(),
        total_incoming: wallet.total(TransactionType::Incoming),
        total_outgoing: wallet.total(TransactionType::Outgoing),
        favorites: ctx.favorites.favorites().len(),
        recents: ctx.favorites.recents().len(),
        is_authenticated: ctx.session.is_authenticated(),
        pin_set,
        theme: format!("{:?}", ctx.preferences.theme()).to_lowercase(),
        monthly_limit: ctx.preferences.budget().monthly_limit,
        data_dir: ctx.data_dir().map(|dir| dir.display().to_string()),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("{}", "Wallet Status".bold());
    println!();

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.add_row(vec!["Balance".to_string(), format_amount(status.balance)]);
    table.add_row(vec!["Transactions".to_string(), status.transactions.to_string()]);
    table.add_row(vec!["Received".to_string(), format_amount(status.total_incoming)]);
    table.add_row(vec!["Sent".to_string(), format_amount(status.total_outgoing)]);
    table.add_row(vec!["Favorites".to_string(), status.favorites.to_string()]);
    if let Some(limit) = status.monthly_limit {
        table.add_row(vec!["Monthly limit".to_string(), format_amount(limit)]);
    }

    println!("{}", table);
    println!();

    let session = if status.is_authenticated {
        "signed in".green()
    } else {
        "signed out".yellow()
    };
    let pin = if status.pin_set { "set".green() } else { "not set".yellow() };
    println!("Session: {}   PIN: {}   Theme: {}", session, pin, status.theme);

    if ctx.rehydrated.first_launch {
        println!();
        println!("{}", "First launch: wallet seeded with the starting balance.".dimmed());
    }
    for fallback in &ctx.rehydrated.fallbacks {
        println!(
            "{}",
            format!("Saved {} data could not be read and was reset.", fallback.slice.as_str()).yellow()
        );
    }

    Ok(())
}
