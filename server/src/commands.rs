//! Control-surface parsing: subcommands, authorization tags, suggestions
//!
//! Grammar (tokens after the command name itself):
//!
//! ```text
//! (nothing)                  toggle own AFK status
//! <player>                   admin: toggle another player's status
//! disable <player>           admin: exclude a player from auto-AFK
//! enable <player>            admin: re-include a player in auto-AFK
//! auto <enable|disable>      self-service opt-in/out, no permission needed
//! reload                     re-read configuration and opt-out list
//! ```
//!
//! Parsing never mutates state; malformed or trailing arguments yield a
//! usage error and nothing else happens.

use crate::machine::TransitionError;
use shared::PlayerId;
use thiserror::Error;

pub const USAGE: &str =
    "Usage: afk [<player> | disable <player> | enable <player> | auto <enable|disable> | reload]";

const SUBCOMMANDS: [&str; 4] = ["auto", "disable", "enable", "reload"];

/// A parsed, not-yet-authorized control command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    ToggleSelf,
    ToggleOther { target: PlayerId },
    /// `opt_out: true` excludes the target from auto-AFK (`disable`),
    /// false re-includes them (`enable`).
    SetOptOut { target: PlayerId, opt_out: bool },
    SelfOptOut { opt_out: bool },
    Reload,
}

impl Command {
    /// Whether the actor needs the admin right for this command.
    pub fn requires_admin(&self) -> bool {
        matches!(
            self,
            Command::ToggleOther { .. } | Command::SetOptOut { .. } | Command::Reload
        )
    }
}

/// User-visible failure of a control command. None of these are fatal and
/// none change any state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("permission denied")]
    PermissionDenied,
    /// `enable` on an identity that was never disabled; a no-op.
    #[error("player '{0}' was not disabled")]
    PlayerNotDisabled(PlayerId),
    #[error("{}", USAGE)]
    Usage,
}

/// Parses the argument string of a control command.
pub fn parse(line: &str) -> Result<Command, CommandError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();

    match tokens.as_slice() {
        [] => Ok(Command::ToggleSelf),
        [first] if first.eq_ignore_ascii_case("reload") => Ok(Command::Reload),
        [first, target] if first.eq_ignore_ascii_case("disable") => Ok(Command::SetOptOut {
            target: PlayerId::new(*target),
            opt_out: true,
        }),
        [first, target] if first.eq_ignore_ascii_case("enable") => Ok(Command::SetOptOut {
            target: PlayerId::new(*target),
            opt_out: false,
        }),
        [first, option] if first.eq_ignore_ascii_case("auto") => {
            if option.eq_ignore_ascii_case("disable") {
                Ok(Command::SelfOptOut { opt_out: true })
            } else if option.eq_ignore_ascii_case("enable") {
                Ok(Command::SelfOptOut { opt_out: false })
            } else {
                Err(CommandError::Usage)
            }
        }
        [target] if !is_subcommand(target) => Ok(Command::ToggleOther {
            target: PlayerId::new(*target),
        }),
        // Bare subcommand keywords missing their argument, or any trailing
        // arguments, fall through to a usage message.
        _ => Err(CommandError::Usage),
    }
}

fn is_subcommand(token: &str) -> bool {
    SUBCOMMANDS
        .iter()
        .any(|sub| token.eq_ignore_ascii_case(sub))
}

/// Completion suggestions for a partially typed command.
///
/// One token: matching subcommand names, plus matching online identities for
/// admins (the bare toggle-other position). Two tokens: identities after
/// `disable`/`enable`, the enable/disable options after `auto`.
pub fn suggest(args: &[&str], admin: bool, online: &[PlayerId]) -> Vec<String> {
    let mut suggestions = Vec::new();

    match args {
        [] => suggestions.extend(complete_first("", admin, online)),
        [partial] => suggestions.extend(complete_first(partial, admin, online)),
        [first, partial] => {
            if first.eq_ignore_ascii_case("disable") || first.eq_ignore_ascii_case("enable") {
                suggestions.extend(matching_players(partial, online));
            } else if first.eq_ignore_ascii_case("auto") {
                for option in ["disable", "enable"] {
                    if option.starts_with(&partial.to_ascii_lowercase()) {
                        suggestions.push(option.to_string());
                    }
                }
            }
        }
        _ => {}
    }

    suggestions.sort();
    suggestions.dedup();
    suggestions
}

fn complete_first(partial: &str, admin: bool, online: &[PlayerId]) -> Vec<String> {
    let lower = partial.to_ascii_lowercase();
    let mut out: Vec<String> = SUBCOMMANDS
        .iter()
        .filter(|sub| sub.starts_with(&lower))
        .map(|sub| sub.to_string())
        .collect();
    if admin {
        out.extend(matching_players(partial, online));
    }
    out
}

fn matching_players(partial: &str, online: &[PlayerId]) -> Vec<String> {
    let lower = partial.to_ascii_lowercase();
    online
        .iter()
        .filter(|p| p.as_str().to_ascii_lowercase().starts_with(&lower))
        .map(|p| p.as_str().to_string())
        .collect()
}
