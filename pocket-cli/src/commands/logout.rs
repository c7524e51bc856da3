//! Logout command - sign out and reset the wallet

use anyhow::Result;
use colored::Colorize;
use dialoguer::Confirm;

use pocket_core::PocketContext;

use super::user_error;

fn confirm_prompt(force: bool) -> Result<bool> {
    if force {
        return Ok(true);
    }
    println!(
        "\n{}",
        "Signing out clears the balance and transaction history on this device.".yellow()
    );
    println!("{}\n", "Your PIN is kept.".dimmed());

    Ok(Confirm::new()
        .with_prompt("Are you sure?")
        .default(false)
        .interact()?)
}

pub async fn run(ctx: &PocketContext, force: bool) -> Result<()> {
    if !confirm_prompt(force)? {
        println!("{}\n", "Cancelled".dimmed());
        return Ok(());
    }

    let mut gate = ctx.auth_gate();
    gate.logout().await.map_err(user_error)?;
    println!("\n{} Signed out\n", "✓".green());

    Ok(())
}
