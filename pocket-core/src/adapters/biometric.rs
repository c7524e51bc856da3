//! Biometric adapters
//!
//! Terminals have no biometric hardware, so the CLI uses
//! [`UnavailableBiometrics`]. [`ScriptedBiometrics`] replays a fixed outcome
//! for tests and demos.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::ports::{BiometricProvider, BiometricResult};

/// A device without biometric hardware
#[derive(Debug, Default, Clone)]
pub struct UnavailableBiometrics {
    opted_in: bool,
}

impl UnavailableBiometrics {
    pub fn new(opted_in: bool) -> Self {
        Self { opted_in }
    }
}

#[async_trait]
impl BiometricProvider for UnavailableBiometrics {
    async fn has_hardware(&self) -> bool {
        false
    }

    async fn has_enrolled_credential(&self) -> bool {
        false
    }

    async fn is_opted_in(&self) -> bool {
        self.opted_in
    }

    async fn authenticate(&self, _prompt: &str) -> BiometricResult {
        BiometricResult::failure("not_available")
    }
}

/// Biometric provider with fixed capabilities and a fixed answer
#[derive(Debug)]
pub struct ScriptedBiometrics {
    pub hardware: bool,
    pub enrolled: bool,
    pub opted_in: bool,
    pub outcome: BiometricResult,
    prompts: AtomicUsize,
}

impl ScriptedBiometrics {
    /// Fully available and always succeeds
    pub fn succeeding() -> Self {
        Self::new(true, true, true, BiometricResult::success())
    }

    /// Fully available and always fails with `error`
    pub fn failing(error: &str) -> Self {
        Self::new(true, true, true, BiometricResult::failure(error))
    }

    pub fn new(hardware: bool, enrolled: bool, opted_in: bool, outcome: BiometricResult) -> Self {
        Self {
            hardware,
            enrolled,
            opted_in,
            outcome,
            prompts: AtomicUsize::new(0),
        }
    }

    /// How many times the user was prompted
    pub fn prompt_count(&self) -> usize {
        self.prompts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BiometricProvider for ScriptedBiometrics {
    async fn has_hardware(&self) -> bool {
        self.hardware
    }

    async fn has_enrolled_credential(&self) -> bool {
        self.enrolled
    }

    async fn is_opted_in(&self) -> bool {
        self.opted_in
    }

    async fn authenticate(&self, _prompt: &str) -> BiometricResult {
        self.prompts.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone()
    }
}
