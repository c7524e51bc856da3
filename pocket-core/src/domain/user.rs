//! Signed-in user and authentication session

use serde::{Deserialize, Serialize};

/// Profile of the signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
}

impl UserProfile {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            phone: None,
        }
    }
}

/// Authentication state shared with every screen
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub is_authenticated: bool,
    #[serde(default)]
    pub user: Option<UserProfile>,
}

/// API tokens handed out at sign-in. Kept in the secure store only.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthTokens {
    pub auth_token: String,
    pub refresh_token: Option<String>,
}

impl std::fmt::Debug for AuthTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthTokens").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_serializes_camel_case() {
        let session = AuthSession {
            is_authenticated: true,
            user: Some(UserProfile::new("user-123", "Ahmet")),
        };
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["isAuthenticated"], true);
        assert_eq!(json["user"]["name"], "Ahmet");
    }

    #[test]
    fn test_tokens_debug_is_redacted() {
        let tokens = AuthTokens {
            auth_token: "secret-token".to_string(),
            refresh_token: None,
        };
        assert!(!format!("{:?}", tokens).contains("secret"));
    }
}
