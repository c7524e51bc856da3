//! Secure store port - credential storage kept apart from general state

use async_trait::async_trait;

use crate::domain::result::Result;

/// Key of the 4-digit PIN
pub const PIN_KEY: &str = "userPin";

/// Key of the API access token
pub const AUTH_TOKEN_KEY: &str = "authToken";

/// Key of the API refresh token
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// Restricted credential storage
///
/// Survives wallet resets and logout; only explicit `delete` removes an item.
#[async_trait]
pub trait SecureStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Deleting a missing key is not an error
    async fn delete(&self, key: &str) -> Result<()>;
}
