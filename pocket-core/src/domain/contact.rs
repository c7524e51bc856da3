//! Contact domain models (favorites and recent recipients)

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MAX_NAME_LENGTH: usize = 50;
pub const MAX_PHONE_LENGTH: usize = 20;
pub const MAX_IBAN_LENGTH: usize = 34;

fn markup_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[<>{}]").expect("static pattern"))
}

/// Strip angle/curly braces, trim, and bound the length (in chars)
pub fn sanitize_text(input: &str, max_len: usize) -> String {
    let stripped = markup_re().replace_all(input, "");
    stripped.trim().chars().take(max_len).collect::<String>().trim_end().to_string()
}

fn sanitize_optional(input: Option<&str>, max_len: usize) -> Option<String> {
    input
        .map(|value| sanitize_text(value, max_len))
        .filter(|value| !value.is_empty())
}

/// Identity of a contact for deduplication
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContactKey {
    pub phone: Option<String>,
    pub iban: Option<String>,
}

/// Raw contact details as entered by the user or derived from a transfer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactInput {
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub iban: Option<String>,
}

impl ContactInput {
    pub fn phone(name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phone: Some(phone.into()),
            iban: None,
        }
    }

    /// Sanitized copy; free text never reaches storage unsanitized
    pub fn sanitized(&self) -> Self {
        Self {
            name: sanitize_text(&self.name, MAX_NAME_LENGTH),
            phone: sanitize_optional(self.phone.as_deref(), MAX_PHONE_LENGTH),
            iban: sanitize_optional(self.iban.as_deref(), MAX_IBAN_LENGTH),
        }
    }

    pub fn key(&self) -> ContactKey {
        ContactKey {
            phone: self.phone.clone(),
            iban: self.iban.clone(),
        }
    }
}

/// A curated contact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteContact {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub iban: Option<String>,
    pub added_at: DateTime<Utc>,
}

impl FavoriteContact {
    /// Build from an already sanitized input
    pub fn new(input: ContactInput) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: input.name,
            phone: input.phone,
            iban: input.iban,
            added_at: Utc::now(),
        }
    }

    pub fn key(&self) -> ContactKey {
        ContactKey {
            phone: self.phone.clone(),
            iban: self.iban.clone(),
        }
    }
}

/// A recently used transfer recipient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentContact {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub iban: Option<String>,
    pub last_used_at: DateTime<Utc>,
}

impl RecentContact {
    /// Build from an already sanitized input
    pub fn new(input: ContactInput) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: input.name,
            phone: input.phone,
            iban: input.iban,
            last_used_at: Utc::now(),
        }
    }

    pub fn key(&self) -> ContactKey {
        ContactKey {
            phone: self.phone.clone(),
            iban: self.iban.clone(),
        }
    }
}
