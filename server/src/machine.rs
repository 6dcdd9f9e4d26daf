//! AFK state machine: transition decisions and their side effects
//!
//! Each identity is either Active or Afk. Transitions come from four places:
//! the periodic sweep (auto-enter), presence signals (auto-exit), explicit
//! toggles (self or admin), and session lifecycle (connect normalization,
//! disconnect cleanup). The machine owns the activity tracker, status store
//! and opt-out registry, and expresses every side effect as a
//! [`HostCommand`] for the host to apply. It never touches world state or
//! renders messages itself beyond template substitution.

use crate::activity::ActivityTracker;
use crate::registry::OptOutRegistry;
use crate::status::StatusStore;
use log::{debug, info};
use shared::{
    render_template, AfkConfig, AfkStatus, HostCommand, PlayerId, PlayerMode,
};
use std::collections::HashSet;
use std::time::Instant;
use thiserror::Error;

/// Why a requested transition was refused. Both are user-visible outcomes,
/// not process failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("player '{0}' is not online")]
    NotOnline(PlayerId),
    /// Manual AFK entry refused while the target is inside the combat
    /// window and combat lockout is enabled. Leaving AFK is never blocked.
    #[error("player '{0}' is in combat")]
    CombatLockout(PlayerId),
}

pub struct AfkMachine {
    config: AfkConfig,
    tracker: ActivityTracker,
    statuses: StatusStore,
    registry: OptOutRegistry,
    /// Identities found in a legacy persisted AFK list at startup. They get
    /// a mode normalization and a login-reset notice on their next connect.
    legacy_afk: HashSet<PlayerId>,
}

impl AfkMachine {
    pub fn new(config: AfkConfig) -> Self {
        Self {
            config,
            tracker: ActivityTracker::new(),
            statuses: StatusStore::new(),
            registry: OptOutRegistry::new(),
            legacy_afk: HashSet::new(),
        }
    }

    pub fn config(&self) -> &AfkConfig {
        &self.config
    }

    /// Swaps in a new configuration on reload. Live statuses and activity
    /// records are untouched; only the thresholds and templates change.
    pub fn set_config(&mut self, config: AfkConfig) {
        self.config = config;
    }

    pub fn registry(&self) -> &OptOutRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut OptOutRegistry {
        &mut self.registry
    }

    /// Replaces the opt-out registry wholesale, e.g. after re-reading the
    /// persisted list on reload.
    pub fn set_registry(&mut self, registry: OptOutRegistry) {
        self.registry = registry;
    }

    /// Remembers identities from a legacy persisted AFK list so their mode
    /// can be normalized when they next connect.
    pub fn set_legacy_afk(&mut self, players: impl IntoIterator<Item = PlayerId>) {
        self.legacy_afk = players.into_iter().collect();
    }

    pub fn status(&self, player: &PlayerId) -> AfkStatus {
        self.statuses.status(player)
    }

    pub fn is_afk(&self, player: &PlayerId) -> bool {
        self.statuses.is_afk(player)
    }

    pub fn is_online(&self, player: &PlayerId) -> bool {
        self.tracker.is_tracked(player)
    }

    pub fn online_ids(&self) -> Vec<PlayerId> {
        self.tracker.tracked_ids()
    }

    /// Session established. Seeds the idle clock and guarantees the player
    /// starts Active: any stale AFK marker (left by a restart while they
    /// were AFK) is cleared silently, without the "no longer AFK" notice.
    pub fn on_connect(&mut self, player: PlayerId, now: Instant) -> Vec<HostCommand> {
        self.tracker.track(player.clone(), now);

        let mut commands = Vec::new();
        if self.statuses.set_active(&player) {
            info!("Silently reset stale AFK status for {}", player);
            commands.push(HostCommand::SetMode {
                player: player.clone(),
                mode: PlayerMode::Normal,
            });
        }
        if self.legacy_afk.remove(&player) {
            commands.push(HostCommand::SetMode {
                player: player.clone(),
                mode: PlayerMode::Normal,
            });
            commands.push(HostCommand::Notify {
                player: player.clone(),
                text: self.config.messages.login_reset.clone(),
            });
        }
        commands
    }

    /// Session gone. Clears any AFK status rather than leaving it dangling,
    /// restoring the underlying mode so the host's persisted player record
    /// is normal on its next load.
    pub fn on_disconnect(&mut self, player: &PlayerId) -> Vec<HostCommand> {
        self.tracker.forget(player);

        let mut commands = Vec::new();
        if self.statuses.set_active(player) {
            commands.push(HostCommand::SetMode {
                player: player.clone(),
                mode: PlayerMode::Normal,
            });
        }
        commands
    }

    /// Presence signal. Refreshes the idle clock and, if the player is AFK,
    /// exits immediately, independent of the sweep cadence.
    pub fn on_activity(&mut self, player: &PlayerId, now: Instant) -> Vec<HostCommand> {
        self.tracker.record_activity(player, now);

        if self.statuses.is_afk(player) {
            self.exit_afk(player, true)
        } else {
            Vec::new()
        }
    }

    /// Combat damage. Only refreshes the combat window; deliberately does
    /// not count as presence.
    pub fn on_damage(&mut self, player: &PlayerId, now: Instant) {
        self.tracker.record_damage(player, now);
    }

    /// One idle-scan tick: auto-enter for every connected, non-opted-out,
    /// currently-Active identity that has been idle past the timeout and is
    /// outside the combat window.
    pub fn sweep(&mut self, now: Instant) -> Vec<HostCommand> {
        if !self.config.auto_afk_enabled {
            return Vec::new();
        }

        let mut commands = Vec::new();
        let mut entered = 0usize;
        for player in self.tracker.tracked_ids() {
            if self.statuses.is_afk(&player) || self.registry.is_disabled(&player) {
                continue;
            }
            if self
                .tracker
                .in_combat(&player, now, self.config.combat_window)
            {
                continue;
            }
            if self.tracker.idle_duration(&player, now) >= self.config.idle_timeout {
                commands.extend(self.enter_afk(&player));
                entered += 1;
            }
        }

        if entered > 0 {
            debug!("Idle sweep set {} player(s) AFK", entered);
        }
        commands
    }

    /// Explicit toggle from the player or an admin. Entering AFK is gated by
    /// the combat lockout; leaving AFK never is. Returns the new status.
    pub fn toggle(
        &mut self,
        target: &PlayerId,
        now: Instant,
    ) -> Result<(AfkStatus, Vec<HostCommand>), TransitionError> {
        if !self.tracker.is_tracked(target) {
            return Err(TransitionError::NotOnline(target.clone()));
        }

        if self.statuses.is_afk(target) {
            return Ok((AfkStatus::Active, self.exit_afk(target, false)));
        }

        if self.config.combat_lockout_enabled
            && self
                .tracker
                .in_combat(target, now, self.config.combat_window)
        {
            return Err(TransitionError::CombatLockout(target.clone()));
        }

        Ok((AfkStatus::Afk, self.enter_afk(target)))
    }

    fn enter_afk(&mut self, player: &PlayerId) -> Vec<HostCommand> {
        if !self.statuses.set_afk(player.clone()) {
            return Vec::new();
        }
        vec![
            HostCommand::SetMode {
                player: player.clone(),
                mode: PlayerMode::Observer,
            },
            HostCommand::Notify {
                player: player.clone(),
                text: render_template(&self.config.messages.now_afk, player),
            },
        ]
    }

    fn exit_afk(&mut self, player: &PlayerId, via_movement: bool) -> Vec<HostCommand> {
        if !self.statuses.set_active(player) {
            return Vec::new();
        }
        let template = if via_movement {
            &self.config.messages.no_longer_afk_move
        } else {
            &self.config.messages.no_longer_afk
        };
        vec![
            HostCommand::SetMode {
                player: player.clone(),
                mode: PlayerMode::Normal,
            },
            HostCommand::Notify {
                player: player.clone(),
                text: render_template(template, player),
            },
        ]
    }
}
