//! Durable settings store backing the opt-out registry and configuration
//!
//! A single JSON document with flat dotted keys (see [`SettingsDoc`]). All
//! writes are synchronous and best-effort: a failed write is logged and
//! swallowed, and the in-memory state stays authoritative for the running
//! session. There are no retries and no rollback.

use log::{info, warn};
use shared::{PlayerId, SettingsDoc};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub struct SettingsStore {
    path: PathBuf,
    doc: SettingsDoc,
}

impl SettingsStore {
    /// Opens the store at `path`. A missing file is seeded with a fully
    /// populated default document; an unreadable or corrupt one is logged
    /// and replaced in memory by defaults (the file itself is left alone
    /// until the next mutation persists over it).
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let doc = match fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(doc) => doc,
                Err(e) => {
                    warn!(
                        "Settings file {} is corrupt ({}); using defaults",
                        path.display(),
                        e
                    );
                    SettingsDoc::default()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(
                    "No settings file at {}; seeding defaults",
                    path.display()
                );
                let store = Self {
                    path: path.clone(),
                    doc: SettingsDoc::default(),
                };
                store.save();
                return store;
            }
            Err(e) => {
                warn!(
                    "Could not read settings file {} ({}); using defaults",
                    path.display(),
                    e
                );
                SettingsDoc::default()
            }
        };

        Self { path, doc }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn doc(&self) -> &SettingsDoc {
        &self.doc
    }

    /// Re-reads the document from disk, for reload-config.
    pub fn reload(&mut self) {
        *self = Self::open(self.path.clone());
    }

    /// Overwrites the persisted opt-out list and saves immediately.
    pub fn persist_disabled_players(&mut self, players: Vec<PlayerId>) {
        self.doc.disabled_players = players;
        self.save();
    }

    /// Drains the legacy persisted AFK list, flushing the stored copy to
    /// empty so no player can be stuck in observer mode by an old build's
    /// leftovers. Returns the identities that were listed.
    pub fn take_legacy_afk_players(&mut self) -> Vec<PlayerId> {
        if self.doc.afk_players.is_empty() {
            return Vec::new();
        }
        let players = std::mem::take(&mut self.doc.afk_players);
        info!(
            "Flushed {} legacy persisted AFK entr(ies) from {}",
            players.len(),
            self.path.display()
        );
        self.save();
        players
    }

    /// Best-effort synchronous write of the whole document.
    pub fn save(&self) {
        let text = match serde_json::to_string_pretty(&self.doc) {
            Ok(text) => text,
            Err(e) => {
                warn!("Could not serialize settings: {}", e);
                return;
            }
        };
        if let Err(e) = fs::write(&self.path, text) {
            warn!(
                "Could not persist settings to {}: {}",
                self.path.display(),
                e
            );
        }
    }
}
