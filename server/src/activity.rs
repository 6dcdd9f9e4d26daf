//! Per-session activity bookkeeping for idle and combat detection
//!
//! This module tracks, for every connected player, when we last saw a
//! presence signal from them and when they last took combat damage. It is
//! the single owner of those timestamps: the state machine reads them
//! through the query methods below and never keeps its own copy.
//!
//! The tracker performs no I/O and sends no notifications; it is plain
//! in-memory state mutated from the service's event loop.

use log::info;
use shared::PlayerId;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Timestamps recorded for one live session
///
/// Created when the session connects (or on the first signal observed for
/// it) and removed on disconnect. `last_damage` stays `None` until the
/// combat system reports damage for the player.
#[derive(Debug, Clone)]
pub struct ActivityRecord {
    /// Most recent positional/input event, seeded at connect time
    pub last_activity: Instant,
    /// Most recent combat damage received, if any
    pub last_damage: Option<Instant>,
}

impl ActivityRecord {
    fn new(now: Instant) -> Self {
        Self {
            last_activity: now,
            last_damage: None,
        }
    }
}

/// Records last-activity and last-damage times per connected player
///
/// The tracker doubles as the roster of live sessions: an identity is
/// considered online exactly while it has a record here. Queries about
/// unknown identities take the conservative path (zero idle time,
/// not in combat) so a just-connected player can never be swept AFK.
#[derive(Debug, Default)]
pub struct ActivityTracker {
    records: HashMap<PlayerId, ActivityRecord>,
}

impl ActivityTracker {
    pub fn new() -> Self {
        Self {
            records: HashMap::new(),
        }
    }

    /// Starts tracking a session, seeding its activity time
    ///
    /// Called on connect so that the idle clock starts at the moment the
    /// player joined rather than at some unrelated earlier instant. Re-track
    /// of an already-known identity resets both timestamps.
    pub fn track(&mut self, player: PlayerId, now: Instant) {
        info!("Tracking activity for {}", player);
        self.records.insert(player, ActivityRecord::new(now));
    }

    /// Records a presence signal, overwriting the previous activity time
    ///
    /// Multiple rapid signals collapse to most-recent-wins. A signal for an
    /// untracked identity creates the record, so ordering races between the
    /// connect event and the first movement packet are harmless.
    pub fn record_activity(&mut self, player: &PlayerId, now: Instant) {
        self.records
            .entry(player.clone())
            .or_insert_with(|| ActivityRecord::new(now))
            .last_activity = now;
    }

    /// Records combat damage received by the player
    pub fn record_damage(&mut self, player: &PlayerId, now: Instant) {
        self.records
            .entry(player.clone())
            .or_insert_with(|| ActivityRecord::new(now))
            .last_damage = Some(now);
    }

    /// Time elapsed since the last presence signal
    ///
    /// Returns zero for unknown identities: with no record the player is
    /// treated as just-active, never as infinitely idle.
    pub fn idle_duration(&self, player: &PlayerId, now: Instant) -> Duration {
        match self.records.get(player) {
            Some(record) => now.saturating_duration_since(record.last_activity),
            None => Duration::ZERO,
        }
    }

    /// Whether the player is inside the combat-lockout window
    ///
    /// True iff damage was recorded less than `window` ago. A zero window
    /// therefore never reports combat, and neither does an identity with no
    /// damage record.
    pub fn in_combat(&self, player: &PlayerId, now: Instant, window: Duration) -> bool {
        self.records
            .get(player)
            .and_then(|record| record.last_damage)
            .map(|last| now.saturating_duration_since(last) < window)
            .unwrap_or(false)
    }

    /// Drops all records for the identity; called on disconnect
    ///
    /// Idempotent: forgetting an unknown identity is a no-op. Returns
    /// whether a record was actually removed.
    pub fn forget(&mut self, player: &PlayerId) -> bool {
        if self.records.remove(player).is_some() {
            info!("Forgot activity records for {}", player);
            true
        } else {
            false
        }
    }

    /// Whether the identity currently has a live session
    pub fn is_tracked(&self, player: &PlayerId) -> bool {
        self.records.contains_key(player)
    }

    /// All currently tracked identities, for the periodic sweep
    pub fn tracked_ids(&self) -> Vec<PlayerId> {
        self.records.keys().cloned().collect()
    }

    /// Number of live sessions
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
