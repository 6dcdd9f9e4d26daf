//! Opt-out registry: identities excluded from automatic idle detection

use log::info;
use shared::PlayerId;
use std::collections::HashSet;

/// Set of identities the idle sweep must skip. Manual toggling still works
/// for them. The registry itself is pure in-memory state; the service
/// persists `players()` to the settings store immediately after every
/// mutation that returns true.
#[derive(Debug, Default)]
pub struct OptOutRegistry {
    disabled: HashSet<PlayerId>,
}

impl OptOutRegistry {
    pub fn new() -> Self {
        Self {
            disabled: HashSet::new(),
        }
    }

    /// Rebuilds the registry from a persisted list, e.g. on load or reload.
    pub fn from_players(players: impl IntoIterator<Item = PlayerId>) -> Self {
        Self {
            disabled: players.into_iter().collect(),
        }
    }

    /// Excludes the identity from auto-AFK. Idempotent; returns whether the
    /// set actually changed.
    pub fn disable(&mut self, player: PlayerId) -> bool {
        let added = self.disabled.insert(player.clone());
        if added {
            info!("Auto-AFK disabled for {}", player);
        }
        added
    }

    /// Re-includes the identity in auto-AFK. Returns false when the identity
    /// was never disabled, which callers report as PlayerNotDisabled.
    pub fn enable(&mut self, player: &PlayerId) -> bool {
        let removed = self.disabled.remove(player);
        if removed {
            info!("Auto-AFK enabled for {}", player);
        }
        removed
    }

    pub fn is_disabled(&self, player: &PlayerId) -> bool {
        self.disabled.contains(player)
    }

    /// Stable snapshot for persistence.
    pub fn players(&self) -> Vec<PlayerId> {
        let mut players: Vec<PlayerId> = self.disabled.iter().cloned().collect();
        players.sort();
        players
    }

    pub fn len(&self) -> usize {
        self.disabled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.disabled.is_empty()
    }
}
