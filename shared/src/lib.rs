use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_COMBAT_WINDOW_SECS: u64 = 30;
pub const DEFAULT_SCAN_INTERVAL_SECS: u64 = 1;

/// Stable unique key for a player, distinct from any mutable display name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for PlayerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Per-identity AFK classification. Absence from the status store means Active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfkStatus {
    Active,
    Afk,
}

/// Interaction mode the host applies to a player on our behalf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerMode {
    /// Regular interactive play.
    Normal,
    /// Restricted observer mode while AFK.
    Observer,
}

/// Who issued a command. The host resolves permissions; we only see the verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub player: PlayerId,
    pub admin: bool,
}

impl Actor {
    pub fn player(player: impl Into<PlayerId>) -> Self {
        Self {
            player: player.into(),
            admin: false,
        }
    }

    pub fn admin(player: impl Into<PlayerId>) -> Self {
        Self {
            player: player.into(),
            admin: true,
        }
    }
}

/// Events delivered from the host into the AFK service loop.
///
/// Every mutation of the shared state happens in response to one of these,
/// processed one at a time on a single logical sequencer. The periodic sweep
/// is delivered through the same channel so it cannot race the host events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AfkEvent {
    Connected { player: PlayerId },
    Disconnected { player: PlayerId },
    /// Any configured presence signal: movement, item selection, etc.
    Activity { player: PlayerId },
    /// The combat system reported the player took damage.
    Damage { player: PlayerId },
    Command { actor: Actor, line: String },
    /// Periodic idle-scan tick, injected by the scan driver.
    Sweep,
    Shutdown,
}

/// Directives sent back to the host for rendering and world-state changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCommand {
    SetMode { player: PlayerId, mode: PlayerMode },
    Notify { player: PlayerId, text: String },
}

/// Substitutes the `{player}` placeholder in a message template.
pub fn render_template(template: &str, player: &PlayerId) -> String {
    template.replace("{player}", player.as_str())
}

/// User-visible message templates, all overridable from the settings store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MessageTemplates {
    #[serde(default = "defaults::now_afk")]
    pub now_afk: String,
    #[serde(default = "defaults::no_longer_afk")]
    pub no_longer_afk: String,
    /// Variant used when movement (rather than a command) ended the AFK state.
    #[serde(default = "defaults::no_longer_afk_move")]
    pub no_longer_afk_move: String,
    #[serde(default = "defaults::combat_lockout")]
    pub combat_lockout: String,
    #[serde(default = "defaults::login_reset")]
    pub login_reset: String,
    #[serde(default = "defaults::disable_success")]
    pub disable_success: String,
    #[serde(default = "defaults::enable_success")]
    pub enable_success: String,
    #[serde(default = "defaults::player_not_disabled")]
    pub player_not_disabled: String,
    #[serde(default = "defaults::self_opt_out")]
    pub self_opt_out: String,
    #[serde(default = "defaults::self_opt_in")]
    pub self_opt_in: String,
    #[serde(default = "defaults::no_permission")]
    pub no_permission: String,
    #[serde(default = "defaults::not_online")]
    pub not_online: String,
    #[serde(default = "defaults::set_afk_other")]
    pub set_afk_other: String,
    #[serde(default = "defaults::set_active_other")]
    pub set_active_other: String,
    #[serde(default = "defaults::reload_success")]
    pub reload_success: String,
}

mod defaults {
    pub fn now_afk() -> String {
        "You are now AFK! Move to return.".to_string()
    }
    pub fn no_longer_afk() -> String {
        "You are no longer AFK!".to_string()
    }
    pub fn no_longer_afk_move() -> String {
        "You are no longer AFK (movement detected).".to_string()
    }
    pub fn combat_lockout() -> String {
        "You cannot go AFK while in combat!".to_string()
    }
    pub fn login_reset() -> String {
        "Your AFK status has been reset upon login.".to_string()
    }
    pub fn disable_success() -> String {
        "Auto-AFK disabled for: {player}".to_string()
    }
    pub fn enable_success() -> String {
        "Auto-AFK enabled for: {player}".to_string()
    }
    pub fn player_not_disabled() -> String {
        "Player '{player}' was not disabled.".to_string()
    }
    pub fn self_opt_out() -> String {
        "You have disabled auto-AFK for yourself.".to_string()
    }
    pub fn self_opt_in() -> String {
        "You have enabled auto-AFK for yourself.".to_string()
    }
    pub fn no_permission() -> String {
        "You do not have permission to use this command.".to_string()
    }
    pub fn not_online() -> String {
        "Player '{player}' is not online.".to_string()
    }
    pub fn set_afk_other() -> String {
        "Set {player} to AFK.".to_string()
    }
    pub fn set_active_other() -> String {
        "Set {player} to not AFK.".to_string()
    }
    pub fn reload_success() -> String {
        "AFK configuration reloaded.".to_string()
    }

    pub fn enabled() -> bool {
        true
    }
    pub fn idle_timeout_secs() -> u64 {
        super::DEFAULT_IDLE_TIMEOUT_SECS
    }
    pub fn combat_window_secs() -> u64 {
        super::DEFAULT_COMBAT_WINDOW_SECS
    }
    pub fn scan_interval_secs() -> u64 {
        super::DEFAULT_SCAN_INTERVAL_SECS
    }
}

impl Default for MessageTemplates {
    fn default() -> Self {
        Self {
            now_afk: defaults::now_afk(),
            no_longer_afk: defaults::no_longer_afk(),
            no_longer_afk_move: defaults::no_longer_afk_move(),
            combat_lockout: defaults::combat_lockout(),
            login_reset: defaults::login_reset(),
            disable_success: defaults::disable_success(),
            enable_success: defaults::enable_success(),
            player_not_disabled: defaults::player_not_disabled(),
            self_opt_out: defaults::self_opt_out(),
            self_opt_in: defaults::self_opt_in(),
            no_permission: defaults::no_permission(),
            not_online: defaults::not_online(),
            set_afk_other: defaults::set_afk_other(),
            set_active_other: defaults::set_active_other(),
            reload_success: defaults::reload_success(),
        }
    }
}

/// On-disk settings document: a flat key/value layout with dotted keys,
/// fully functional when the file is empty or missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsDoc {
    #[serde(rename = "auto-afk.enabled", default = "defaults::enabled")]
    pub auto_afk_enabled: bool,
    #[serde(rename = "auto-afk.timeout", default = "defaults::idle_timeout_secs")]
    pub auto_afk_timeout_secs: u64,
    #[serde(
        rename = "auto-afk.scan-interval",
        default = "defaults::scan_interval_secs"
    )]
    pub scan_interval_secs: u64,
    #[serde(rename = "combatlog.enabled", default = "defaults::enabled")]
    pub combat_lockout_enabled: bool,
    #[serde(rename = "combatlog.duration", default = "defaults::combat_window_secs")]
    pub combat_window_secs: u64,
    #[serde(rename = "disabled-players", default)]
    pub disabled_players: Vec<PlayerId>,
    /// Legacy key from builds that persisted AFK status. Read once at startup
    /// and flushed back to empty; never written to otherwise.
    #[serde(rename = "afk-players", default)]
    pub afk_players: Vec<PlayerId>,
    #[serde(default)]
    pub messages: MessageTemplates,
    /// Unknown keys are preserved so a hand-edited file survives a rewrite.
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl Default for SettingsDoc {
    fn default() -> Self {
        Self {
            auto_afk_enabled: defaults::enabled(),
            auto_afk_timeout_secs: defaults::idle_timeout_secs(),
            scan_interval_secs: defaults::scan_interval_secs(),
            combat_lockout_enabled: defaults::enabled(),
            combat_window_secs: defaults::combat_window_secs(),
            disabled_players: Vec::new(),
            afk_players: Vec::new(),
            messages: MessageTemplates::default(),
            extra: HashMap::new(),
        }
    }
}

impl SettingsDoc {
    /// Typed view of the numeric settings, for the state machine.
    pub fn config(&self) -> AfkConfig {
        AfkConfig {
            auto_afk_enabled: self.auto_afk_enabled,
            idle_timeout: Duration::from_secs(self.auto_afk_timeout_secs),
            scan_interval: Duration::from_secs(self.scan_interval_secs.max(1)),
            combat_lockout_enabled: self.combat_lockout_enabled,
            combat_window: Duration::from_secs(self.combat_window_secs),
            messages: self.messages.clone(),
        }
    }
}

/// Runtime configuration for the state machine, derived from [`SettingsDoc`].
#[derive(Debug, Clone, PartialEq)]
pub struct AfkConfig {
    pub auto_afk_enabled: bool,
    pub idle_timeout: Duration,
    pub scan_interval: Duration,
    pub combat_lockout_enabled: bool,
    pub combat_window: Duration,
    pub messages: MessageTemplates,
}

impl Default for AfkConfig {
    fn default() -> Self {
        SettingsDoc::default().config()
    }
}
