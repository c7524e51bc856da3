//! Authentication gate - PIN entry and biometric unlock
//!
//! Split in two layers:
//! - [`reduce`] is a pure state machine. It takes a state and an event and
//!   returns the next state plus the side effects to run.
//! - [`AuthGate`] runs those effects against the secure store, the biometric
//!   provider and the session, and feeds each outcome back in as an event.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::domain::result::{Error, Result};
use crate::domain::{AuthTokens, Pin, PinBuffer};
use crate::ports::{BiometricProvider, SecureStore, AUTH_TOKEN_KEY, PIN_KEY, REFRESH_TOKEN_KEY};
use crate::services::ledger::LedgerStore;
use crate::services::logging::{log_event, EventLog, LogEvent};
use crate::services::session::SessionStore;

/// Screen the lock gate logs its events under
const PIN_SCREEN: &str = "pin_entry";

/// Why the gate is showing an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    WrongPin,
    PinMismatch,
    PinNotSet,
    BiometricFailed,
    /// The credential store could not be read
    StoreUnavailable,
    /// The new PIN could not be saved
    StoreWriteFailed,
}

impl From<AuthError> for Error {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::WrongPin => Error::WrongPin,
            AuthError::PinMismatch => Error::PinMismatch,
            AuthError::PinNotSet => Error::PinNotSet,
            AuthError::BiometricFailed => Error::BiometricFailed("not recognized".to_string()),
            AuthError::StoreUnavailable => {
                Error::PersistenceReadFailure("credential store unavailable".to_string())
            }
            AuthError::StoreWriteFailed => {
                Error::PersistenceWriteFailure("could not save PIN".to_string())
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Verify,
    Setup,
    Change,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinStep {
    /// First entry of a new PIN
    Setup1,
    /// Confirmation of the new PIN
    Setup2,
    Verify,
}

/// Keypad state while a PIN is being typed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinEntry {
    pub mode: AuthMode,
    pub step: PinStep,
    pub input: PinBuffer,
    /// The first entry, held while the confirmation is typed
    first: Option<Pin>,
    /// A complete PIN is out for verification or storage
    pub awaiting: bool,
    pub error: Option<AuthError>,
}

impl PinEntry {
    fn new(mode: AuthMode, step: PinStep) -> Self {
        Self {
            mode,
            step,
            input: PinBuffer::new(),
            first: None,
            awaiting: false,
            error: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Idle,
    EnteringPin(PinEntry),
    Locked(AuthError),
    Unlocked,
}

impl AuthState {
    pub fn error(&self) -> Option<AuthError> {
        match self {
            AuthState::EnteringPin(entry) => entry.error,
            AuthState::Locked(err) => Some(*err),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    /// Start a flow; `pin_stored` tells whether a credential exists
    Begin { mode: AuthMode, pin_stored: bool },
    Digit(char),
    Backspace,
    PinAccepted,
    PinRejected,
    /// The stored credential vanished while verifying
    PinMissing,
    PinStored,
    BiometricSucceeded,
    BiometricFailed,
    StoreFailed,
    Logout,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEffect {
    VerifyPin(Pin),
    StorePin(Pin),
    MarkAuthenticated,
}

/// Pure transition function of the gate
pub fn reduce(state: AuthState, event: AuthEvent) -> (AuthState, Vec<AuthEffect>) {
    match (state, event) {
        (_, AuthEvent::Logout) => (AuthState::Idle, Vec::new()),

        (_, AuthEvent::Begin { mode, pin_stored }) => {
            let next = match mode {
                AuthMode::Setup => AuthState::EnteringPin(PinEntry::new(mode, PinStep::Setup1)),
                AuthMode::Change if pin_stored => {
                    AuthState::EnteringPin(PinEntry::new(mode, PinStep::Setup1))
                }
                AuthMode::Verify if pin_stored => {
                    AuthState::EnteringPin(PinEntry::new(mode, PinStep::Verify))
                }
                _ => AuthState::Locked(AuthError::PinNotSet),
            };
            (next, Vec::new())
        }

        (AuthState::Idle, AuthEvent::StoreFailed) => {
            (AuthState::Locked(AuthError::StoreUnavailable), Vec::new())
        }

        (AuthState::EnteringPin(entry), event) => reduce_entry(entry, event),

        (state, _) => (state, Vec::new()),
    }
}

fn reduce_entry(mut entry: PinEntry, event: AuthEvent) -> (AuthState, Vec<AuthEffect>) {
    match event {
        AuthEvent::Digit(c) if !entry.awaiting => {
            let input = entry.input.push(c);
            if input.len() == entry.input.len() {
                // Non-digit or full buffer
                return (AuthState::EnteringPin(entry), Vec::new());
            }
            entry.input = input;
            entry.error = None;
            let Some(pin) = entry.input.to_pin() else {
                return (AuthState::EnteringPin(entry), Vec::new());
            };
            complete_entry(entry, pin)
        }

        AuthEvent::Backspace if !entry.awaiting => {
            entry.input = entry.input.pop();
            (AuthState::EnteringPin(entry), Vec::new())
        }

        AuthEvent::PinAccepted if entry.awaiting && entry.step == PinStep::Verify => {
            (AuthState::Unlocked, vec![AuthEffect::MarkAuthenticated])
        }

        AuthEvent::PinRejected if entry.awaiting && entry.step == PinStep::Verify => {
            entry.awaiting = false;
            entry.input = PinBuffer::new();
            entry.error = Some(AuthError::WrongPin);
            (AuthState::EnteringPin(entry), Vec::new())
        }

        AuthEvent::PinMissing if entry.awaiting => {
            (AuthState::Locked(AuthError::PinNotSet), Vec::new())
        }

        AuthEvent::PinStored if entry.awaiting && entry.step == PinStep::Setup2 => {
            (AuthState::Unlocked, vec![AuthEffect::MarkAuthenticated])
        }

        AuthEvent::StoreFailed if entry.awaiting => {
            let error = match entry.step {
                PinStep::Setup2 => AuthError::StoreWriteFailed,
                _ => AuthError::StoreUnavailable,
            };
            (AuthState::Locked(error), Vec::new())
        }

        AuthEvent::BiometricSucceeded if entry.step == PinStep::Verify && !entry.awaiting => {
            (AuthState::Unlocked, vec![AuthEffect::MarkAuthenticated])
        }

        AuthEvent::BiometricFailed if entry.step == PinStep::Verify && !entry.awaiting => {
            entry.error = Some(AuthError::BiometricFailed);
            (AuthState::EnteringPin(entry), Vec::new())
        }

        _ => (AuthState::EnteringPin(entry), Vec::new()),
    }
}

/// A fourth digit was typed
fn complete_entry(mut entry: PinEntry, pin: Pin) -> (AuthState, Vec<AuthEffect>) {
    match entry.step {
        PinStep::Setup1 => {
            entry.first = Some(pin);
            entry.step = PinStep::Setup2;
            entry.input = PinBuffer::new();
            (AuthState::EnteringPin(entry), Vec::new())
        }
        PinStep::Setup2 => {
            if entry.first.as_ref() == Some(&pin) {
                entry.awaiting = true;
                (AuthState::EnteringPin(entry), vec![AuthEffect::StorePin(pin)])
            } else {
                entry.step = PinStep::Setup1;
                entry.first = None;
                entry.input = PinBuffer::new();
                entry.error = Some(AuthError::PinMismatch);
                (AuthState::EnteringPin(entry), Vec::new())
            }
        }
        PinStep::Verify => {
            entry.awaiting = true;
            (AuthState::EnteringPin(entry), vec![AuthEffect::VerifyPin(pin)])
        }
    }
}

/// Runs the reducer's effects against the outside world
pub struct AuthGate {
    secure: Arc<dyn SecureStore>,
    biometrics: Arc<dyn BiometricProvider>,
    session: Arc<SessionStore>,
    ledger: Arc<LedgerStore>,
    state: AuthState,
    logger: EventLog,
}

impl AuthGate {
    pub fn new(
        secure: Arc<dyn SecureStore>,
        biometrics: Arc<dyn BiometricProvider>,
        session: Arc<SessionStore>,
        ledger: Arc<LedgerStore>,
        logger: EventLog,
    ) -> Self {
        Self {
            secure,
            biometrics,
            session,
            ledger,
            state: AuthState::Idle,
            logger,
        }
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    pub fn is_unlocked(&self) -> bool {
        self.state == AuthState::Unlocked
    }

    /// Whether a PIN has been stored
    pub async fn has_pin(&self) -> Result<bool> {
        Ok(self.secure.get(PIN_KEY).await?.is_some())
    }

    /// Start a verify, setup or change flow. Also leaves `Locked`.
    pub async fn begin(&mut self, mode: AuthMode) -> &AuthState {
        let event = match self.has_pin().await {
            Ok(pin_stored) => AuthEvent::Begin { mode, pin_stored },
            Err(_) => {
                // Reset to Idle first so the failure maps to a read error
                self.state = AuthState::Idle;
                AuthEvent::StoreFailed
            }
        };
        self.dispatch(event).await;
        &self.state
    }

    pub async fn press(&mut self, key: char) -> &AuthState {
        self.dispatch(AuthEvent::Digit(key)).await;
        &self.state
    }

    pub async fn backspace(&mut self) -> &AuthState {
        self.dispatch(AuthEvent::Backspace).await;
        &self.state
    }

    /// Type a whole PIN, one key at a time
    pub async fn enter(&mut self, digits: &str) -> &AuthState {
        for key in digits.chars() {
            self.dispatch(AuthEvent::Digit(key)).await;
        }
        &self.state
    }

    pub async fn biometric_available(&self) -> bool {
        self.biometrics.is_available().await
    }

    /// Try biometric unlock instead of typing the PIN.
    ///
    /// Only offered on the verify step. The PIN itself is never touched.
    pub async fn authenticate_biometric(&mut self, prompt: &str) -> Result<()> {
        let on_verify_step = matches!(
            &self.state,
            AuthState::EnteringPin(entry) if entry.step == PinStep::Verify && !entry.awaiting
        );
        if !on_verify_step {
            return Err(Error::invalid_transition(self.state_name(), "use biometrics"));
        }
        if !self.biometrics.is_available().await {
            return Err(Error::BiometricUnavailable);
        }

        let outcome = self.biometrics.authenticate(prompt).await;
        if outcome.success {
            self.dispatch(AuthEvent::BiometricSucceeded).await;
            log_event(&self.logger, LogEvent::new("biometric_unlocked").with_screen(PIN_SCREEN));
            Ok(())
        } else {
            self.dispatch(AuthEvent::BiometricFailed).await;
            let reason = outcome.error.unwrap_or_else(|| "not recognized".to_string());
            log_event(
                &self.logger,
                LogEvent::new("biometric_failed")
                    .with_screen(PIN_SCREEN)
                    .with_error(reason.clone()),
            );
            Err(Error::BiometricFailed(reason))
        }
    }

    /// Save the API tokens handed out at sign-in
    pub async fn store_tokens(&self, tokens: &AuthTokens) -> Result<()> {
        self.secure.set(AUTH_TOKEN_KEY, &tokens.auth_token).await?;
        match &tokens.refresh_token {
            Some(refresh) => self.secure.set(REFRESH_TOKEN_KEY, refresh).await,
            None => self.secure.delete(REFRESH_TOKEN_KEY).await,
        }
    }

    /// Sign out: back to `Idle`, session cleared, wallet reset, tokens deleted.
    ///
    /// The PIN stays so the next sign-in can use it. Token deletion is
    /// attempted for both keys; the first failure is returned.
    pub async fn logout(&mut self) -> Result<()> {
        self.dispatch(AuthEvent::Logout).await;
        self.session.clear();
        self.ledger.reset();

        let auth = self.secure.delete(AUTH_TOKEN_KEY).await;
        let refresh = self.secure.delete(REFRESH_TOKEN_KEY).await;
        log_event(&self.logger, LogEvent::new("logout"));
        auth.and(refresh)
    }

    fn state_name(&self) -> &'static str {
        match &self.state {
            AuthState::Idle => "idle",
            AuthState::EnteringPin(_) => "entering PIN",
            AuthState::Locked(_) => "locked",
            AuthState::Unlocked => "unlocked",
        }
    }

    async fn dispatch(&mut self, event: AuthEvent) {
        let mut queue = VecDeque::from([event]);
        while let Some(event) = queue.pop_front() {
            let current = std::mem::replace(&mut self.state, AuthState::Idle);
            let (next, effects) = reduce(current, event);
            self.state = next;
            for effect in effects {
                if let Some(follow_up) = self.run(effect).await {
                    queue.push_back(follow_up);
                }
            }
        }
    }

    async fn run(&self, effect: AuthEffect) -> Option<AuthEvent> {
        match effect {
            AuthEffect::VerifyPin(pin) => match self.secure.get(PIN_KEY).await {
                Ok(Some(stored)) if pin.matches(&stored) => {
                    log_event(&self.logger, LogEvent::new("pin_verified").with_screen(PIN_SCREEN));
                    Some(AuthEvent::PinAccepted)
                }
                Ok(Some(_)) => {
                    log_event(&self.logger, LogEvent::new("pin_rejected").with_screen(PIN_SCREEN));
                    Some(AuthEvent::PinRejected)
                }
                Ok(None) => Some(AuthEvent::PinMissing),
                Err(e) => {
                    log_event(
                        &self.logger,
                        LogEvent::new("pin_read_failed")
                            .with_screen(PIN_SCREEN)
                            .with_error(e.to_string()),
                    );
                    Some(AuthEvent::StoreFailed)
                }
            },
            AuthEffect::StorePin(pin) => match self.secure.set(PIN_KEY, pin.as_str()).await {
                Ok(()) => {
                    log_event(&self.logger, LogEvent::new("pin_stored").with_screen(PIN_SCREEN));
                    Some(AuthEvent::PinStored)
                }
                Err(e) => {
                    log_event(
                        &self.logger,
                        LogEvent::new("pin_write_failed")
                            .with_screen(PIN_SCREEN)
                            .with_error(e.to_string()),
                    );
                    Some(AuthEvent::StoreFailed)
                }
            },
            AuthEffect::MarkAuthenticated => {
                self.session.mark_authenticated();
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::biometric::{ScriptedBiometrics, UnavailableBiometrics};
    use crate::adapters::memory::MemorySecureStore;
    use crate::domain::Wallet;
    use rust_decimal::Decimal;

    fn entering(mode: AuthMode, step: PinStep) -> AuthState {
        AuthState::EnteringPin(PinEntry::new(mode, step))
    }

    fn type_digits(mut state: AuthState, digits: &str) -> (AuthState, Vec<AuthEffect>) {
        let mut effects = Vec::new();
        for c in digits.chars() {
            let (next, mut emitted) = reduce(state, AuthEvent::Digit(c));
            state = next;
            effects.append(&mut emitted);
        }
        (state, effects)
    }

    #[test]
    fn test_reduce_setup_mismatch_clears_both_entries() {
        let state = entering(AuthMode::Setup, PinStep::Setup1);
        let (state, effects) = type_digits(state, "1234");
        assert!(effects.is_empty());
        let (state, effects) = type_digits(state, "4321");
        assert!(effects.is_empty());

        let AuthState::EnteringPin(entry) = state else {
            panic!("expected PIN entry");
        };
        assert_eq!(entry.step, PinStep::Setup1);
        assert_eq!(entry.error, Some(AuthError::PinMismatch));
        assert!(entry.input.is_empty());
        assert!(entry.first.is_none());
    }

    #[test]
    fn test_reduce_setup_match_emits_store() {
        let state = entering(AuthMode::Setup, PinStep::Setup1);
        let (state, _) = type_digits(state, "1234");
        let (state, effects) = type_digits(state, "1234");
        assert_eq!(effects, vec![AuthEffect::StorePin(Pin::parse("1234").unwrap())]);

        let (state, effects) = reduce(state, AuthEvent::PinStored);
        assert_eq!(state, AuthState::Unlocked);
        assert_eq!(effects, vec![AuthEffect::MarkAuthenticated]);
    }

    #[test]
    fn test_reduce_ignores_keys_while_awaiting() {
        let state = entering(AuthMode::Verify, PinStep::Verify);
        let (state, effects) = type_digits(state, "12345");
        assert_eq!(effects.len(), 1);
        let (state, effects) = reduce(state, AuthEvent::Backspace);
        assert!(effects.is_empty());
        let AuthState::EnteringPin(entry) = &state else {
            panic!("expected PIN entry");
        };
        assert!(entry.awaiting);
        assert_eq!(entry.input.len(), 4);
    }

    #[test]
    fn test_reduce_ignores_non_digits() {
        let state = entering(AuthMode::Verify, PinStep::Verify);
        let (state, _) = type_digits(state, "1a*2");
        let AuthState::EnteringPin(entry) = &state else {
            panic!("expected PIN entry");
        };
        assert_eq!(entry.input.len(), 2);
    }

    #[test]
    fn test_reduce_begin_without_pin_locks() {
        let (state, _) = reduce(
            AuthState::Idle,
            AuthEvent::Begin {
                mode: AuthMode::Verify,
                pin_stored: false,
            },
        );
        assert_eq!(state, AuthState::Locked(AuthError::PinNotSet));

        let (state, _) = reduce(
            state,
            AuthEvent::Begin {
                mode: AuthMode::Setup,
                pin_stored: false,
            },
        );
        assert!(matches!(state, AuthState::EnteringPin(_)));
    }

    struct Fixture {
        secure: Arc<MemorySecureStore>,
        session: Arc<SessionStore>,
        ledger: Arc<LedgerStore>,
    }

    fn gate_with(biometrics: Arc<dyn BiometricProvider>) -> (AuthGate, Fixture) {
        let secure = Arc::new(MemorySecureStore::new());
        let session = Arc::new(SessionStore::in_memory());
        let ledger = Arc::new(LedgerStore::in_memory(Wallet::seeded(Decimal::new(
            53000, 0,
        ))));
        let gate = AuthGate::new(
            secure.clone(),
            biometrics,
            session.clone(),
            ledger.clone(),
            None,
        );
        (
            gate,
            Fixture {
                secure,
                session,
                ledger,
            },
        )
    }

    fn gate() -> (AuthGate, Fixture) {
        gate_with(Arc::new(UnavailableBiometrics::new(false)))
    }

    #[tokio::test]
    async fn test_setup_then_verify_round_trip() {
        let (mut gate, fx) = gate();

        gate.begin(AuthMode::Setup).await;
        gate.enter("2468").await;
        gate.enter("2468").await;
        assert!(gate.is_unlocked());
        assert_eq!(fx.secure.peek(PIN_KEY).as_deref(), Some("2468"));
        assert!(fx.session.is_authenticated());

        gate.begin(AuthMode::Verify).await;
        gate.enter("1111").await;
        assert_eq!(gate.state().error(), Some(AuthError::WrongPin));
        gate.enter("2468").await;
        assert!(gate.is_unlocked());
    }

    #[tokio::test]
    async fn test_verify_without_pin_is_locked() {
        let (mut gate, _) = gate();
        let state = gate.begin(AuthMode::Verify).await;
        assert_eq!(state, &AuthState::Locked(AuthError::PinNotSet));
    }

    #[tokio::test]
    async fn test_store_read_failure_locks() {
        let (mut gate, fx) = gate();
        fx.secure.set_fail_reads(true);
        let state = gate.begin(AuthMode::Verify).await;
        assert_eq!(state, &AuthState::Locked(AuthError::StoreUnavailable));
    }

    #[tokio::test]
    async fn test_store_write_failure_locks() {
        let (mut gate, fx) = gate();
        fx.secure.set_fail_writes(true);
        gate.begin(AuthMode::Setup).await;
        gate.enter("1234").await;
        gate.enter("1234").await;
        assert_eq!(gate.state(), &AuthState::Locked(AuthError::StoreWriteFailed));
        assert!(!fx.session.is_authenticated());
    }

    #[tokio::test]
    async fn test_change_overwrites_pin() {
        let (mut gate, fx) = gate();
        fx.secure.set(PIN_KEY, "1234").await.unwrap();

        gate.begin(AuthMode::Change).await;
        gate.enter("9876").await;
        gate.enter("9876").await;
        assert!(gate.is_unlocked());
        assert_eq!(fx.secure.peek(PIN_KEY).as_deref(), Some("9876"));
    }

    #[tokio::test]
    async fn test_biometric_unlock_leaves_pin_alone() {
        let biometrics = Arc::new(ScriptedBiometrics::succeeding());
        let (mut gate, fx) = gate_with(biometrics.clone());
        fx.secure.set(PIN_KEY, "1234").await.unwrap();

        gate.begin(AuthMode::Verify).await;
        gate.authenticate_biometric("Unlock Pocket").await.unwrap();

        assert!(gate.is_unlocked());
        assert_eq!(biometrics.prompt_count(), 1);
        assert_eq!(fx.secure.peek(PIN_KEY).as_deref(), Some("1234"));
    }

    #[tokio::test]
    async fn test_biometric_failure_stays_on_verify() {
        let (mut gate, fx) = gate_with(Arc::new(ScriptedBiometrics::failing("lockout")));
        fx.secure.set(PIN_KEY, "1234").await.unwrap();

        gate.begin(AuthMode::Verify).await;
        let err = gate.authenticate_biometric("Unlock").await.unwrap_err();
        assert!(matches!(err, Error::BiometricFailed(_)));
        assert_eq!(gate.state().error(), Some(AuthError::BiometricFailed));

        gate.enter("1234").await;
        assert!(gate.is_unlocked());
    }

    #[tokio::test]
    async fn test_biometric_unavailable_or_wrong_step() {
        let (mut gate, fx) = gate();
        assert!(matches!(
            gate.authenticate_biometric("Unlock").await,
            Err(Error::InvalidTransition { .. })
        ));

        fx.secure.set(PIN_KEY, "1234").await.unwrap();
        gate.begin(AuthMode::Verify).await;
        assert!(matches!(
            gate.authenticate_biometric("Unlock").await,
            Err(Error::BiometricUnavailable)
        ));
    }

    #[tokio::test]
    async fn test_logout_resets_everything_but_pin() {
        let (mut gate, fx) = gate();
        fx.secure.set(PIN_KEY, "1234").await.unwrap();
        gate.store_tokens(&AuthTokens {
            auth_token: "access".to_string(),
            refresh_token: Some("refresh".to_string()),
        })
        .await
        .unwrap();

        gate.begin(AuthMode::Verify).await;
        gate.enter("1234").await;
        assert!(gate.is_unlocked());

        gate.logout().await.unwrap();

        assert_eq!(gate.state(), &AuthState::Idle);
        assert!(!fx.session.is_authenticated());
        assert_eq!(fx.ledger.balance(), Decimal::ZERO);
        assert!(fx.secure.peek(AUTH_TOKEN_KEY).is_none());
        assert!(fx.secure.peek(REFRESH_TOKEN_KEY).is_none());
        assert_eq!(fx.secure.peek(PIN_KEY).as_deref(), Some("1234"));
    }
}
