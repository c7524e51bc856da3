//! Transfer command - send money through the confirmation flow

use anyhow::{Context, Result};
use colored::Colorize;
use dialoguer::{Confirm, Input};

use pocket_core::domain::ConfirmationSnapshot;
use pocket_core::services::{NavigationSignal, TransferCoordinator};
use pocket_core::{Error, PaymentRequest, PocketContext};

use super::{unlock, user_error};
use crate::output::{create_table, format_amount, success, warning};

/// Interactive attempts at fixing invalid input
const MAX_EDITS: usize = 3;

pub async fn run(
    ctx: &PocketContext,
    recipient: Option<String>,
    amount: Option<String>,
    description: Option<String>,
    request: Option<String>,
    yes: bool,
    json: bool,
) -> Result<()> {
    let _gate = unlock(ctx).await?;
    let interactive = !json && atty::is(atty::Stream::Stdin);

    let mut flow = ctx.transfer();
    match request {
        Some(raw) => {
            let request: PaymentRequest =
                serde_json::from_str(&raw).context("Invalid payment request")?;
            flow.prefill(request).map_err(user_error)?;
        }
        None => {
            let recipient = match recipient {
                Some(r) => r,
                None if interactive => prompt("Recipient phone")?,
                None => anyhow::bail!("Recipient is required"),
            };
            let amount = match amount {
                Some(a) => a,
                None if interactive => prompt("Amount")?,
                None => anyhow::bail!("Amount is required"),
            };
            flow.set_recipient(recipient).map_err(user_error)?;
            flow.set_amount(amount).map_err(user_error)?;
        }
    }
    if let Some(description) = description {
        flow.set_description(description).map_err(user_error)?;
    }

    let snapshot = submit_with_edits(&mut flow, interactive)?;

    if !json {
        print_confirmation(&snapshot);
    }

    let go_ahead = yes
        || json
        || Confirm::new()
            .with_prompt("Send this transfer?")
            .default(false)
            .interact()?;
    if !go_ahead {
        flow.cancel().map_err(user_error)?;
        println!("{}", "Transfer cancelled".dimmed());
        return Ok(());
    }

    match flow.confirm().map_err(user_error)? {
        NavigationSignal::Confirmed(tx) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&tx)?);
            } else {
                success(&format!(
                    "Sent {} to {}",
                    format_amount(tx.amount),
                    tx.receiver
                ));
                println!("New balance: {}", format_amount(ctx.ledger.balance()));
            }
        }
        NavigationSignal::Cancelled => println!("{}", "Transfer cancelled".dimmed()),
    }

    Ok(())
}

fn prompt(label: &str) -> Result<String> {
    Ok(Input::new().with_prompt(label).interact_text()?)
}

/// Submit the draft, letting an interactive user fix the field that failed
fn submit_with_edits(flow: &mut TransferCoordinator, interactive: bool) -> Result<ConfirmationSnapshot> {
    let mut edits = 0;
    loop {
        let err = match flow.submit() {
            Ok(snapshot) => return Ok(snapshot.clone()),
            Err(e) => e,
        };
        if !interactive || edits >= MAX_EDITS {
            return Err(user_error(err));
        }
        edits += 1;

        warning(&err.user_message());
        match err {
            Error::InvalidRecipient => flow.set_recipient(prompt("Recipient phone")?),
            Error::AmountTooLow { .. } | Error::InsufficientFunds { .. } => {
                flow.set_amount(prompt("Amount")?)
            }
            other => return Err(user_error(other)),
        }
        .map_err(user_error)?;
    }
}

fn print_confirmation(snapshot: &ConfirmationSnapshot) {
    println!();
    println!("{}", "Confirm transfer".bold());
    let mut table = create_table();
    table.add_row(vec!["Recipient".to_string(), snapshot.recipient.clone()]);
    table.add_row(vec!["Amount".to_string(), format_amount(snapshot.amount)]);
    if let Some(description) = &snapshot.description {
        table.add_row(vec!["Description".to_string(), description.clone()]);
    }
    println!("{}", table);
}
