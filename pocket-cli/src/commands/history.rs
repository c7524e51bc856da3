//! History command - list recent transactions

use anyhow::Result;

use pocket_core::PocketContext;

use crate::output::{create_table, info, signed_amount};

pub fn run(ctx: &PocketContext, limit: usize, json: bool) -> Result<()> {
    let transactions: Vec<_> = ctx.ledger.transactions().into_iter().take(limit).collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&transactions)?);
        return Ok(());
    }

    if transactions.is_empty() {
        info("No transactions yet.");
        return Ok(());
    }

    let mut table = create_table();
    table.set_header(vec!["Date", "Counterparty", "Amount", "Description"]);
    for tx in &transactions {
        table.add_row(vec![
            tx.date.clone(),
            tx.receiver.clone(),
            signed_amount(tx.amount, tx.kind),
            tx.description.clone().unwrap_or_default(),
        ]);
    }
    println!("{}", table);

    let total = ctx.ledger.transactions().len();
    if total > transactions.len() {
        println!("Showing {} of {} transactions", transactions.len(), total);
    }

    Ok(())
}
