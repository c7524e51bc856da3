//! Configuration management
//!
//! Settings live in `settings.json` inside the data directory:
//! ```json
//! {
//!   "wallet": { "seedBalance": 53000, "minTransferAmount": 10 },
//!   "security": { "biometricOptIn": false }
//! }
//! ```
//! Keys this crate does not manage are preserved on save.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{DEFAULT_SEED_BALANCE, MIN_TRANSFER_AMOUNT};

/// Environment variable overriding the data directory
pub const DIR_ENV: &str = "POCKET_DIR";
/// Environment variable overriding the first-launch balance
pub const SEED_BALANCE_ENV: &str = "POCKET_SEED_BALANCE";
/// Environment variable supplying the PIN to non-interactive CLI runs
pub const PIN_ENV: &str = "POCKET_PIN";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    wallet: WalletSettings,
    #[serde(default)]
    security: SecuritySettings,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WalletSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    seed_balance: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    min_transfer_amount: Option<Decimal>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SecuritySettings {
    #[serde(default)]
    biometric_opt_in: bool,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

/// Pocket configuration (simplified view of settings)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Balance a wallet receives on first launch
    pub seed_balance: Decimal,
    pub min_transfer_amount: Decimal,
    pub biometric_opt_in: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed_balance: Decimal::new(DEFAULT_SEED_BALANCE, 0),
            min_transfer_amount: Decimal::new(MIN_TRANSFER_AMOUNT, 0),
            biometric_opt_in: false,
        }
    }
}

/// Data directory: `POCKET_DIR`, else `~/.pocket`
pub fn data_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(DIR_ENV) {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".pocket"))
}

fn read_settings(path: &Path) -> Result<SettingsFile> {
    if !path.exists() {
        return Ok(SettingsFile::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    // A malformed file falls back to defaults rather than blocking startup
    Ok(serde_json::from_str(&content).unwrap_or_default())
}

impl Config {
    /// Load config from the data directory
    ///
    /// The seed balance can be overridden with `POCKET_SEED_BALANCE` (for
    /// demos and CI).
    pub fn load(data_dir: &Path) -> Result<Self> {
        let raw = read_settings(&data_dir.join("settings.json"))?;
        let defaults = Self::default();

        let env_seed = std::env::var(SEED_BALANCE_ENV)
            .ok()
            .and_then(|value| value.trim().parse::<Decimal>().ok())
            .filter(|value| *value >= Decimal::ZERO);

        let seed_balance = env_seed
            .or(raw.wallet.seed_balance.filter(|v| *v >= Decimal::ZERO))
            .unwrap_or(defaults.seed_balance);
        let min_transfer_amount = raw
            .wallet
            .min_transfer_amount
            .filter(|v| *v > Decimal::ZERO)
            .unwrap_or(defaults.min_transfer_amount);

        Ok(Self {
            seed_balance,
            min_transfer_amount,
            biometric_opt_in: raw.security.biometric_opt_in,
        })
    }

    /// Save config to the data directory
    /// Preserves other settings that this crate doesn't manage
    pub fn save(&self, data_dir: &Path) -> Result<()> {
        let settings_path = data_dir.join("settings.json");
        let mut settings = read_settings(&settings_path)?;

        settings.wallet.seed_balance = Some(self.seed_balance);
        settings.wallet.min_transfer_amount = Some(self.min_transfer_amount);
        settings.security.biometric_opt_in = self.biometric_opt_in;

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&settings_path, content)
            .with_context(|| format!("Failed to write {}", settings_path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.min_transfer_amount, Decimal::new(10, 0));
        assert!(!config.biometric_opt_in);
    }

    #[test]
    fn test_malformed_file_gives_defaults() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("settings.json"), "{ nope").unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert!(!config.biometric_opt_in);
        assert_eq!(config.min_transfer_amount, Decimal::new(10, 0));
    }

    #[test]
    fn test_save_preserves_unknown_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"wallet": {"currency": "TRY"}, "ui": {"compact": true}}"#,
        )
        .unwrap();

        let mut config = Config::load(dir.path()).unwrap();
        config.biometric_opt_in = true;
        config.min_transfer_amount = Decimal::new(25, 0);
        config.save(dir.path()).unwrap();

        let saved: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved["wallet"]["currency"], "TRY");
        assert_eq!(saved["ui"]["compact"], true);
        assert_eq!(saved["security"]["biometricOptIn"], true);

        let reloaded = Config::load(dir.path()).unwrap();
        assert!(reloaded.biometric_opt_in);
        assert_eq!(reloaded.min_transfer_amount, Decimal::new(25, 0));
    }
}
