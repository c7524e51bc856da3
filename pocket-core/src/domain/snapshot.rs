//! Durable application snapshot
//!
//! The whole persisted state lives in one JSON object under [`ROOT_KEY`], one
//! top-level entry per whitelisted slice:
//! ```json
//! {
//!   "auth": { "isAuthenticated": false, "user": null },
//!   "wallet": { "balance": "53000.00", "transactions": [] },
//!   "theme": { "mode": "system" },
//!   "favorites": { "favorites": [], "recents": [] },
//!   "budget": { "monthlyLimit": null }
//! }
//! ```

use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use super::contact::{FavoriteContact, RecentContact};
use super::preferences::{BudgetState, ThemeState};
use super::user::AuthSession;
use super::wallet::Wallet;

/// Key the snapshot is stored under
pub const ROOT_KEY: &str = "persist:root";

/// Names of the persisted slices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slice {
    Auth,
    Wallet,
    Theme,
    Favorites,
    Budget,
}

impl Slice {
    pub const ALL: [Slice; 5] = [
        Slice::Auth,
        Slice::Wallet,
        Slice::Theme,
        Slice::Favorites,
        Slice::Budget,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Slice::Auth => "auth",
            Slice::Wallet => "wallet",
            Slice::Theme => "theme",
            Slice::Favorites => "favorites",
            Slice::Budget => "budget",
        }
    }
}

/// Favorites plus recent recipients
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoritesState {
    #[serde(default)]
    pub favorites: Vec<FavoriteContact>,
    #[serde(default)]
    pub recents: Vec<RecentContact>,
}

/// A new value for one slice, produced by the store that owns it
#[derive(Debug, Clone, PartialEq)]
pub enum SliceUpdate {
    Auth(AuthSession),
    Wallet(Wallet),
    Theme(ThemeState),
    Favorites(FavoritesState),
    Budget(BudgetState),
}

impl SliceUpdate {
    pub fn slice(&self) -> Slice {
        match self {
            SliceUpdate::Auth(_) => Slice::Auth,
            SliceUpdate::Wallet(_) => Slice::Wallet,
            SliceUpdate::Theme(_) => Slice::Theme,
            SliceUpdate::Favorites(_) => Slice::Favorites,
            SliceUpdate::Budget(_) => Slice::Budget,
        }
    }
}

/// The full persisted state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSnapshot {
    pub auth: AuthSession,
    pub wallet: Wallet,
    pub theme: ThemeState,
    pub favorites: FavoritesState,
    pub budget: BudgetState,
}

/// A slice that could not be decoded and was replaced by its default
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SliceFallback {
    pub slice: Slice,
    pub reason: String,
}

impl AppSnapshot {
    /// First-launch state
    pub fn initial(seed_balance: Decimal) -> Self {
        Self {
            auth: AuthSession::default(),
            wallet: Wallet::seeded(seed_balance),
            theme: ThemeState::default(),
            favorites: FavoritesState::default(),
            budget: BudgetState::default(),
        }
    }

    pub fn apply(&mut self, update: SliceUpdate) {
        match update {
            SliceUpdate::Auth(auth) => self.auth = auth,
            SliceUpdate::Wallet(wallet) => self.wallet = wallet,
            SliceUpdate::Theme(theme) => self.theme = theme,
            SliceUpdate::Favorites(favorites) => self.favorites = favorites,
            SliceUpdate::Budget(budget) => self.budget = budget,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Decode a stored snapshot, slice by slice.
    ///
    /// A missing slice silently takes its default. A slice that is present but
    /// malformed also takes its default and is reported in the returned list.
    /// If the record is not a JSON object at all, every slice falls back.
    pub fn decode(raw: &str, seed_balance: Decimal) -> (Self, Vec<SliceFallback>) {
        let mut snapshot = Self::initial(seed_balance);
        let root: Map<String, JsonValue> = match serde_json::from_str::<JsonValue>(raw) {
            Ok(JsonValue::Object(map)) => map,
            Ok(_) => {
                return (snapshot, all_fallbacks("snapshot root is not an object"));
            }
            Err(e) => {
                return (snapshot, all_fallbacks(&e.to_string()));
            }
        };

        let mut fallbacks = Vec::new();
        for slice in Slice::ALL {
            let decoded = match slice {
                Slice::Auth => decode_slice(&root, slice).map(|v| v.map(SliceUpdate::Auth)),
                Slice::Wallet => decode_slice(&root, slice).map(|v| v.map(SliceUpdate::Wallet)),
                Slice::Theme => decode_slice(&root, slice).map(|v| v.map(SliceUpdate::Theme)),
                Slice::Favorites => {
                    decode_slice(&root, slice).map(|v| v.map(SliceUpdate::Favorites))
                }
                Slice::Budget => decode_slice(&root, slice).map(|v| v.map(SliceUpdate::Budget)),
            };
            match decoded {
                Ok(Some(update)) => snapshot.apply(update),
                Ok(None) => {}
                Err(reason) => fallbacks.push(SliceFallback { slice, reason }),
            }
        }

        (snapshot, fallbacks)
    }
}

fn all_fallbacks(reason: &str) -> Vec<SliceFallback> {
    Slice::ALL
        .iter()
        .map(|slice| SliceFallback {
            slice: *slice,
            reason: reason.to_string(),
        })
        .collect()
}

/// Slices may be stored as nested objects or as JSON-encoded strings
fn decode_slice<T: DeserializeOwned>(
    root: &Map<String, JsonValue>,
    slice: Slice,
) -> Result<Option<T>, String> {
    let Some(value) = root.get(slice.as_str()) else {
        return Ok(None);
    };
    let parsed = match value {
        JsonValue::Null => return Ok(None),
        JsonValue::String(encoded) => serde_json::from_str(encoded),
        other => serde_json::from_value(other.clone()),
    };
    parsed.map(Some).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::preferences::ThemeMode;

    fn seed() -> Decimal {
        Decimal::new(53000, 0)
    }

    #[test]
    fn test_round_trip() {
        let mut snapshot = AppSnapshot::initial(seed());
        snapshot.theme.mode = ThemeMode::Dark;
        let raw = snapshot.to_json().unwrap();

        let (decoded, fallbacks) = AppSnapshot::decode(&raw, seed());
        assert!(fallbacks.is_empty());
        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn test_malformed_root_falls_back_entirely() {
        let (decoded, fallbacks) = AppSnapshot::decode("{not json", seed());
        assert_eq!(decoded, AppSnapshot::initial(seed()));
        assert_eq!(fallbacks.len(), Slice::ALL.len());
    }

    #[test]
    fn test_bad_slice_falls_back_alone() {
        let raw = r#"{
            "wallet": {"balance": "oops", "transactions": 7},
            "theme": {"mode": "dark"}
        }"#;
        let (decoded, fallbacks) = AppSnapshot::decode(raw, seed());

        assert_eq!(decoded.wallet, Wallet::seeded(seed()));
        assert_eq!(decoded.theme.mode, ThemeMode::Dark);
        assert_eq!(fallbacks.len(), 1);
        assert_eq!(fallbacks[0].slice, Slice::Wallet);
    }

    #[test]
    fn test_string_encoded_slices_are_accepted() {
        let raw = r#"{"theme": "{\"mode\":\"light\"}"}"#;
        let (decoded, fallbacks) = AppSnapshot::decode(raw, seed());
        assert!(fallbacks.is_empty());
        assert_eq!(decoded.theme.mode, ThemeMode::Light);
    }
}
