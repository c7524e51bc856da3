//! Preferences store - owner of the `theme` and `budget` slices

use std::sync::{Mutex, MutexGuard};

use rust_decimal::Decimal;

use crate::domain::result::{Error, Result};
use crate::domain::{normalize_amount, BudgetState, SliceUpdate, ThemeMode, ThemeState};
use crate::services::persistence::PersistenceHandle;

struct Preferences {
    theme: ThemeState,
    budget: BudgetState,
}

pub struct PreferencesStore {
    state: Mutex<Preferences>,
    persistence: PersistenceHandle,
}

impl PreferencesStore {
    pub fn new(theme: ThemeState, budget: BudgetState, persistence: PersistenceHandle) -> Self {
        Self {
            state: Mutex::new(Preferences { theme, budget }),
            persistence,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(
            ThemeState::default(),
            BudgetState::default(),
            PersistenceHandle::disabled(),
        )
    }

    fn lock(&self) -> MutexGuard<'_, Preferences> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn theme(&self) -> ThemeMode {
        self.lock().theme.mode
    }

    pub fn set_theme(&self, mode: ThemeMode) {
        let mut state = self.lock();
        state.theme.mode = mode;
        self.persistence.submit(SliceUpdate::Theme(state.theme.clone()));
    }

    pub fn budget(&self) -> BudgetState {
        self.lock().budget.clone()
    }

    /// Set or clear the monthly spending limit
    pub fn set_monthly_limit(&self, limit: Option<Decimal>) -> Result<BudgetState> {
        if let Some(value) = limit {
            if value <= Decimal::ZERO {
                return Err(Error::validation("Monthly limit must be positive"));
            }
        }
        let mut state = self.lock();
        state.budget.monthly_limit = limit.map(normalize_amount);
        self.persistence.submit(SliceUpdate::Budget(state.budget.clone()));
        Ok(state.budget.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_and_budget() {
        let store = PreferencesStore::in_memory();
        assert_eq!(store.theme(), ThemeMode::System);

        store.set_theme(ThemeMode::Dark);
        assert_eq!(store.theme(), ThemeMode::Dark);

        let budget = store.set_monthly_limit(Some(Decimal::new(2500, 0))).unwrap();
        assert_eq!(budget.monthly_limit, Some(Decimal::new(250000, 2)));

        assert!(store.set_monthly_limit(Some(Decimal::ZERO)).is_err());
        assert!(store.set_monthly_limit(None).unwrap().monthly_limit.is_none());
    }
}
