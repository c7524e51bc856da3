//! Favorites registry - curated contacts plus the recent-recipient list

use std::sync::{Mutex, MutexGuard};

use chrono::Utc;

use crate::domain::result::{Error, Result};
use crate::domain::{
    ContactInput, ContactKey, FavoriteContact, FavoritesState, RecentContact, SliceUpdate,
};
use crate::services::logging::{log_event, EventLog, LogEvent};
use crate::services::persistence::PersistenceHandle;

/// Upper bound on stored favorites
pub const MAX_FAVORITES: usize = 20;

/// Length of the recent-recipient list
pub const MAX_RECENTS: usize = 10;

/// Owns the `favorites` slice
pub struct FavoritesRegistry {
    state: Mutex<FavoritesState>,
    persistence: PersistenceHandle,
    logger: EventLog,
}

impl FavoritesRegistry {
    pub fn new(state: FavoritesState, persistence: PersistenceHandle, logger: EventLog) -> Self {
        Self {
            state: Mutex::new(state),
            persistence,
            logger,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(FavoritesState::default(), PersistenceHandle::disabled(), None)
    }

    fn lock(&self) -> MutexGuard<'_, FavoritesState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn publish(&self, state: &FavoritesState) {
        self.persistence.submit(SliceUpdate::Favorites(state.clone()));
    }

    pub fn favorites(&self) -> Vec<FavoriteContact> {
        self.lock().favorites.clone()
    }

    /// Recent recipients, most recently used first
    pub fn recents(&self) -> Vec<RecentContact> {
        self.lock().recents.clone()
    }

    pub fn is_favorite(&self, phone: Option<&str>, iban: Option<&str>) -> bool {
        let key = ContactInput {
            name: String::new(),
            phone: phone.map(str::to_string),
            iban: iban.map(str::to_string),
        }
        .sanitized()
        .key();
        self.lock().favorites.iter().any(|f| f.key() == key)
    }

    /// Find a stored favorite by phone number
    pub fn find_by_phone(&self, phone: &str) -> Option<FavoriteContact> {
        self.lock()
            .favorites
            .iter()
            .find(|f| f.phone.as_deref() == Some(phone))
            .cloned()
    }

    /// Add a favorite at the head of the list.
    ///
    /// Returns `false` without changing anything when a contact with the same
    /// phone and IBAN already exists or the list is full.
    pub fn add_favorite(&self, contact: ContactInput) -> Result<bool> {
        let contact = contact.sanitized();
        validate_contact(&contact)?;
        let key = contact.key();

        let mut state = self.lock();
        if state.favorites.len() >= MAX_FAVORITES || contains(&state.favorites, &key) {
            return Ok(false);
        }

        state.favorites.insert(0, FavoriteContact::new(contact));
        self.publish(&state);
        log_event(&self.logger, LogEvent::new("favorite_added"));
        Ok(true)
    }

    /// Remove a favorite by id. Returns whether one was removed.
    pub fn remove_favorite(&self, id: &str) -> bool {
        let mut state = self.lock();
        let before = state.favorites.len();
        state.favorites.retain(|f| f.id != id);
        let removed = state.favorites.len() != before;
        if removed {
            self.publish(&state);
            log_event(&self.logger, LogEvent::new("favorite_removed"));
        }
        removed
    }

    /// Move a recipient to the head of the recent list.
    ///
    /// An existing entry with the same key is replaced, keeping its id, and the
    /// list is cut to [`MAX_RECENTS`].
    pub fn add_recent_contact(&self, contact: ContactInput) -> Result<RecentContact> {
        let contact = contact.sanitized();
        validate_contact(&contact)?;
        let key = contact.key();

        let mut state = self.lock();
        let position = state.recents.iter().position(|r| r.key() == key);
        let existing = position.map(|index| state.recents.remove(index));

        let recent = match existing {
            Some(mut previous) => {
                previous.name = contact.name;
                previous.last_used_at = Utc::now();
                previous
            }
            None => RecentContact::new(contact),
        };

        state.recents.insert(0, recent.clone());
        state.recents.truncate(MAX_RECENTS);
        self.publish(&state);
        Ok(recent)
    }

    /// Drop the recent-recipient list
    pub fn clear_recents(&self) {
        let mut state = self.lock();
        if !state.recents.is_empty() {
            state.recents.clear();
            self.publish(&state);
        }
    }
}

fn contains(favorites: &[FavoriteContact], key: &ContactKey) -> bool {
    favorites.iter().any(|f| &f.key() == key)
}

fn validate_contact(contact: &ContactInput) -> Result<()> {
    if contact.name.is_empty() {
        return Err(Error::validation("Contact name is required"));
    }
    if contact.phone.is_none() && contact.iban.is_none() {
        return Err(Error::validation("A phone number or IBAN is required"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phone_contact(name: &str, phone: &str) -> ContactInput {
        ContactInput::phone(name, phone)
    }

    #[test]
    fn test_add_favorite_prepends() {
        let registry = FavoritesRegistry::in_memory();
        assert!(registry.add_favorite(phone_contact("Ahmet", "5551111111")).unwrap());
        assert!(registry.add_favorite(phone_contact("Ayşe", "5552222222")).unwrap());

        let favorites = registry.favorites();
        assert_eq!(favorites[0].name, "Ayşe");
        assert_eq!(favorites[1].name, "Ahmet");
        assert_ne!(favorites[0].id, favorites[1].id);
    }

    #[test]
    fn test_duplicate_key_is_a_no_op() {
        let registry = FavoritesRegistry::in_memory();
        assert!(registry.add_favorite(phone_contact("Ahmet", "5551111111")).unwrap());
        assert!(!registry
            .add_favorite(phone_contact("Ahmet Bey", "5551111111"))
            .unwrap());

        assert_eq!(registry.favorites().len(), 1);
        assert_eq!(registry.favorites()[0].name, "Ahmet");
    }

    #[test]
    fn test_same_phone_different_iban_are_distinct() {
        let registry = FavoritesRegistry::in_memory();
        let mut with_iban = phone_contact("Ahmet", "5551111111");
        with_iban.iban = Some("TR330006100519786457841326".to_string());

        assert!(registry.add_favorite(phone_contact("Ahmet", "5551111111")).unwrap());
        assert!(registry.add_favorite(with_iban).unwrap());
        assert_eq!(registry.favorites().len(), 2);
    }

    #[test]
    fn test_capacity_is_twenty() {
        let registry = FavoritesRegistry::in_memory();
        for i in 0..MAX_FAVORITES {
            let added = registry
                .add_favorite(phone_contact("Friend", &format!("55500000{:02}", i)))
                .unwrap();
            assert!(added);
        }
        assert!(!registry
            .add_favorite(phone_contact("One too many", "5559999999"))
            .unwrap());
        assert_eq!(registry.favorites().len(), MAX_FAVORITES);
    }

    #[test]
    fn test_free_text_is_sanitized() {
        let registry = FavoritesRegistry::in_memory();
        registry
            .add_favorite(phone_contact("  <script>Mallory{}  ", "5551111111"))
            .unwrap();
        assert_eq!(registry.favorites()[0].name, "scriptMallory");
        assert!(registry.is_favorite(Some("5551111111"), None));
    }

    #[test]
    fn test_contact_without_phone_or_iban_rejected() {
        let registry = FavoritesRegistry::in_memory();
        let err = registry
            .add_favorite(ContactInput {
                name: "Nobody".to_string(),
                phone: None,
                iban: None,
            })
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_remove_favorite() {
        let registry = FavoritesRegistry::in_memory();
        registry.add_favorite(phone_contact("Ahmet", "5551111111")).unwrap();
        let id = registry.favorites()[0].id.clone();

        assert!(registry.remove_favorite(&id));
        assert!(!registry.remove_favorite(&id));
        assert!(registry.favorites().is_empty());
    }

    #[test]
    fn test_recents_move_to_front_without_duplicates() {
        let registry = FavoritesRegistry::in_memory();
        registry.add_recent_contact(phone_contact("A", "5550000001")).unwrap();
        registry.add_recent_contact(phone_contact("B", "5550000002")).unwrap();
        registry.add_recent_contact(phone_contact("A", "5550000001")).unwrap();

        let recents = registry.recents();
        assert_eq!(recents.len(), 2);
        assert_eq!(recents[0].phone.as_deref(), Some("5550000001"));
        assert_eq!(recents[1].phone.as_deref(), Some("5550000002"));
    }

    #[test]
    fn test_recents_bounded_to_ten() {
        let registry = FavoritesRegistry::in_memory();
        for i in 0..15 {
            registry
                .add_recent_contact(phone_contact("R", &format!("55500000{:02}", i)))
                .unwrap();
        }
        let recents = registry.recents();
        assert_eq!(recents.len(), MAX_RECENTS);
        assert_eq!(recents[0].phone.as_deref(), Some("5550000014"));
        assert_eq!(recents[9].phone.as_deref(), Some("5550000005"));
    }
}
