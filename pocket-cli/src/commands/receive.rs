//! Receive command - credit money sent by someone else

use anyhow::Result;

use pocket_core::domain::transfer::{parse_amount, validate_recipient};
use pocket_core::domain::TransactionCandidate;
use pocket_core::PocketContext;
use rust_decimal::Decimal;

use super::{unlock, user_error};
use crate::output::{format_amount, success};

pub async fn run(
    ctx: &PocketContext,
    sender: &str,
    amount: &str,
    description: Option<String>,
    json: bool,
) -> Result<()> {
    let _gate = unlock(ctx).await?;

    let sender = validate_recipient(sender).map_err(user_error)?;
    // Any positive amount may arrive; the minimum only applies to sending
    let amount = parse_amount(amount, Decimal::new(1, 2)).map_err(user_error)?;
    let candidate = TransactionCandidate::incoming(sender, amount).with_description(description);

    let wallet = ctx.ledger.apply_transaction(candidate).map_err(user_error)?;
    let tx = &wallet.transactions[0];

    if json {
        println!("{}", serde_json::to_string_pretty(tx)?);
    } else {
        success(&format!("Received {} from {}", format_amount(tx.amount), tx.receiver));
        println!("New balance: {}", format_amount(wallet.balance));
    }

    Ok(())
}
