//! Biometric port - hardware-backed user verification

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Outcome of a single biometric prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BiometricResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BiometricResult {
    pub fn success() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Device biometric capability plus a single verification call.
///
/// Enrollment is managed by the platform, never by the core.
#[async_trait]
pub trait BiometricProvider: Send + Sync {
    async fn has_hardware(&self) -> bool;

    async fn has_enrolled_credential(&self) -> bool;

    /// Whether the user turned biometric unlock on in settings
    async fn is_opted_in(&self) -> bool;

    async fn authenticate(&self, prompt: &str) -> BiometricResult;

    /// Hardware present, a credential enrolled, and the user opted in
    async fn is_available(&self) -> bool {
        self.has_hardware().await && self.has_enrolled_credential().await && self.is_opted_in().await
    }
}
