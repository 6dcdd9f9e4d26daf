use log::info;
use shared::{AfkStatus, PlayerId};
use std::collections::HashSet;

/// Authoritative identity → AFK status mapping. Only AFK identities are
/// stored; absence means Active, which keeps the store from ever holding two
/// values for one identity.
#[derive(Debug, Default)]
pub struct StatusStore {
    afk: HashSet<PlayerId>,
}

impl StatusStore {
    pub fn new() -> Self {
        Self { afk: HashSet::new() }
    }

    pub fn status(&self, player: &PlayerId) -> AfkStatus {
        if self.afk.contains(player) {
            AfkStatus::Afk
        } else {
            AfkStatus::Active
        }
    }

    pub fn is_afk(&self, player: &PlayerId) -> bool {
        self.afk.contains(player)
    }

    /// Marks the identity AFK. Returns false if it already was.
    pub fn set_afk(&mut self, player: PlayerId) -> bool {
        let inserted = self.afk.insert(player.clone());
        if inserted {
            info!("{} is now AFK", player);
        }
        inserted
    }

    /// Clears the identity back to Active. Returns false if it wasn't AFK.
    pub fn set_active(&mut self, player: &PlayerId) -> bool {
        let removed = self.afk.remove(player);
        if removed {
            info!("{} is no longer AFK", player);
        }
        removed
    }

    pub fn afk_ids(&self) -> Vec<PlayerId> {
        self.afk.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.afk.len()
    }

    pub fn is_empty(&self) -> bool {
        self.afk.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_status_is_active() {
        let store = StatusStore::new();
        assert_eq!(store.status(&PlayerId::new("steve")), AfkStatus::Active);
        assert!(!store.is_afk(&PlayerId::new("steve")));
    }

    #[test]
    fn test_set_and_clear() {
        let mut store = StatusStore::new();
        let steve = PlayerId::new("steve");

        assert!(store.set_afk(steve.clone()));
        assert_eq!(store.status(&steve), AfkStatus::Afk);

        // Setting again is a no-op; the mapping never holds duplicates.
        assert!(!store.set_afk(steve.clone()));
        assert_eq!(store.len(), 1);

        assert!(store.set_active(&steve));
        assert_eq!(store.status(&steve), AfkStatus::Active);
        assert!(!store.set_active(&steve));
        assert!(store.is_empty());
    }

    #[test]
    fn test_afk_ids() {
        let mut store = StatusStore::new();
        store.set_afk(PlayerId::new("steve"));
        store.set_afk(PlayerId::new("alex"));

        let mut ids = store.afk_ids();
        ids.sort();
        assert_eq!(ids, vec![PlayerId::new("alex"), PlayerId::new("steve")]);
    }
}
