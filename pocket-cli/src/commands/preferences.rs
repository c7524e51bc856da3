//! Theme and budget commands

use anyhow::{Context, Result};
use rust_decimal::Decimal;

use pocket_core::domain::ThemeMode;
use pocket_core::PocketContext;

use super::user_error;
use crate::output::{format_amount, info, success};

pub fn run_theme(ctx: &PocketContext, mode: Option<&str>) -> Result<()> {
    match mode {
        Some(raw) => {
            let mode: ThemeMode = raw.parse().map_err(|e: String| anyhow::anyhow!(e))?;
            ctx.preferences.set_theme(mode);
            success(&format!("Theme set to {}", raw.trim().to_lowercase()));
        }
        None => {
            println!("{}", format!("{:?}", ctx.preferences.theme()).to_lowercase());
        }
    }
    Ok(())
}

pub fn run_budget(ctx: &PocketContext, limit: Option<&str>, clear: bool, json: bool) -> Result<()> {
    let budget = if clear {
        ctx.preferences.set_monthly_limit(None).map_err(user_error)?
    } else if let Some(raw) = limit {
        let value: Decimal = raw
            .trim()
            .replace(',', ".")
            .parse()
            .with_context(|| format!("Invalid amount: {}", raw))?;
        ctx.preferences.set_monthly_limit(Some(value)).map_err(user_error)?
    } else {
        ctx.preferences.budget()
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&budget)?);
        return Ok(());
    }

    match budget.monthly_limit {
        Some(limit) => info(&format!("Monthly limit: {}", format_amount(limit))),
        None => info("No monthly limit set"),
    }
    Ok(())
}
