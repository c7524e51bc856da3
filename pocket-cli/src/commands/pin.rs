//! PIN command - set up, change or check the PIN

use anyhow::Result;
use clap::Subcommand;

use pocket_core::services::{AuthGate, AuthMode, AuthState, PinStep};
use pocket_core::PocketContext;

use super::{gate_failure, pin_from_env, read_pin, unlock, user_error};
use crate::output::{success, warning};

#[derive(Subcommand)]
pub enum PinCommands {
    /// Create the PIN (first use)
    Setup,
    /// Replace the PIN after entering the current one
    Change,
    /// Check a PIN without changing anything
    Verify,
}

pub async fn run(ctx: &PocketContext, command: PinCommands) -> Result<()> {
    match command {
        PinCommands::Setup => {
            let mut gate = ctx.auth_gate();
            if gate.has_pin().await.map_err(user_error)? {
                anyhow::bail!("A PIN is already set. Use `pocket pin change` to replace it.");
            }
            gate.begin(AuthMode::Setup).await;
            choose_new_pin(&mut gate).await?;
            success("PIN created");
        }
        PinCommands::Change => {
            // Prove the current PIN first; the change flow itself does not ask
            drop(unlock(ctx).await?);
            let mut gate = ctx.auth_gate();
            let locked = matches!(gate.begin(AuthMode::Change).await, AuthState::Locked(_));
            if locked {
                return Err(gate_failure(gate.state()));
            }
            choose_new_pin(&mut gate).await?;
            success("PIN changed");
        }
        PinCommands::Verify => {
            unlock(ctx).await?;
            success("PIN accepted");
        }
    }
    Ok(())
}

/// Drive the two-entry setup steps until the PIN is stored
async fn choose_new_pin(gate: &mut AuthGate) -> Result<()> {
    // With POCKET_PIN the same value is used for both entries, so a mismatch
    // cannot loop
    let rounds = if pin_from_env().is_some() { 1 } else { 3 };

    for _ in 0..rounds {
        let first = read_pin("New PIN")?;
        gate.enter(first.as_str()).await;
        let second = read_pin("Repeat new PIN")?;
        gate.enter(second.as_str()).await;

        match gate.state() {
            AuthState::Unlocked => return Ok(()),
            AuthState::EnteringPin(entry) if entry.step == PinStep::Setup1 => {
                // Mismatch: the gate is back at the first entry
                if let Some(err) = entry.error {
                    warning(&user_error(err.into()).to_string());
                }
            }
            other => return Err(gate_failure(other)),
        }
    }

    Err(gate_failure(gate.state()))
}
