//! CLI command implementations

pub mod favorites;
pub mod history;
pub mod logout;
pub mod logs;
pub mod pin;
pub mod preferences;
pub mod receive;
pub mod recents;
pub mod status;
pub mod transfer;

use anyhow::{Context, Result};
use dialoguer::Password;

use pocket_core::config::{self, PIN_ENV};
use pocket_core::domain::Pin;
use pocket_core::services::{AuthGate, AuthMode, AuthState, EntryPoint};
use pocket_core::{Error, PocketContext};

/// Interactive PIN attempts before giving up
const MAX_PIN_ATTEMPTS: usize = 3;

/// Open the wallet in the configured data directory
pub async fn get_context() -> Result<PocketContext> {
    let pocket_dir = config::data_dir()?;
    PocketContext::open(&pocket_dir, EntryPoint::Cli)
        .await
        .context("Failed to open wallet")
}

/// Turn a core error into the message a user should see
pub fn user_error(err: Error) -> anyhow::Error {
    anyhow::anyhow!(err.user_message())
}

/// Whether the PIN comes from `POCKET_PIN` rather than a prompt
pub fn pin_from_env() -> Option<String> {
    std::env::var(PIN_ENV).ok().filter(|pin| !pin.is_empty())
}

/// Read a 4-digit PIN from `POCKET_PIN` or a hidden prompt
pub fn read_pin(prompt: &str) -> Result<Pin> {
    let raw = match pin_from_env() {
        Some(pin) => pin,
        None => Password::new().with_prompt(prompt).interact()?,
    };
    Pin::parse(raw.trim()).map_err(user_error)
}

/// Describe a non-unlocked gate state
pub fn gate_failure(state: &AuthState) -> anyhow::Error {
    match state.error() {
        Some(err) => user_error(err.into()),
        None => anyhow::anyhow!("PIN entry was not completed"),
    }
}

/// Require the PIN before a wallet-changing command
///
/// Retries wrong entries interactively; with `POCKET_PIN` set there is a
/// single attempt.
pub async fn unlock(ctx: &PocketContext) -> Result<AuthGate> {
    let mut gate = ctx.auth_gate();
    let locked = matches!(gate.begin(AuthMode::Verify).await, AuthState::Locked(_));
    if locked {
        return Err(gate_failure(gate.state()));
    }

    let attempts = if pin_from_env().is_some() { 1 } else { MAX_PIN_ATTEMPTS };
    for attempt in 1..=attempts {
        let pin = read_pin("PIN")?;
        gate.enter(pin.as_str()).await;
        if gate.is_unlocked() {
            return Ok(gate);
        }
        let wrong_pin = matches!(
            gate.state(),
            AuthState::EnteringPin(entry) if entry.error.is_some()
        );
        if !wrong_pin || attempt == attempts {
            break;
        }
        crate::output::warning(&user_error(Error::WrongPin).to_string());
    }

    Err(gate_failure(gate.state()))
}
