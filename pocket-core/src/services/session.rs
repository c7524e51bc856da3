//! Session store - owner of the `auth` slice

use std::sync::{Mutex, MutexGuard};

use crate::domain::{AuthSession, SliceUpdate, UserProfile};
use crate::services::logging::{log_event, EventLog, LogEvent};
use crate::services::persistence::PersistenceHandle;

pub struct SessionStore {
    session: Mutex<AuthSession>,
    persistence: PersistenceHandle,
    logger: EventLog,
}

impl SessionStore {
    pub fn new(session: AuthSession, persistence: PersistenceHandle, logger: EventLog) -> Self {
        Self {
            session: Mutex::new(session),
            persistence,
            logger,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(AuthSession::default(), PersistenceHandle::disabled(), None)
    }

    fn lock(&self) -> MutexGuard<'_, AuthSession> {
        self.session.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn update(&self, change: impl FnOnce(&mut AuthSession)) -> AuthSession {
        let mut session = self.lock();
        let before = session.clone();
        change(&mut session);
        if *session != before {
            self.persistence.submit(SliceUpdate::Auth(session.clone()));
        }
        session.clone()
    }

    pub fn session(&self) -> AuthSession {
        self.lock().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.lock().is_authenticated
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.lock().user.clone()
    }

    pub fn set_user(&self, user: Option<UserProfile>) -> AuthSession {
        self.update(|session| session.user = user)
    }

    /// Called once the PIN gate or biometrics unlocked the app
    pub fn mark_authenticated(&self) -> AuthSession {
        let session = self.update(|session| session.is_authenticated = true);
        log_event(&self.logger, LogEvent::new("session_authenticated"));
        session
    }

    /// Forget the signed-in user
    pub fn clear(&self) -> AuthSession {
        let session = self.update(|session| *session = AuthSession::default());
        log_event(&self.logger, LogEvent::new("session_cleared"));
        session
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_and_clear() {
        let store = SessionStore::in_memory();
        store.set_user(Some(UserProfile::new("u-1", "Deniz")));
        store.mark_authenticated();

        assert!(store.is_authenticated());
        assert_eq!(store.user().unwrap().name, "Deniz");

        let cleared = store.clear();
        assert_eq!(cleared, AuthSession::default());
        assert!(!store.is_authenticated());
    }
}
