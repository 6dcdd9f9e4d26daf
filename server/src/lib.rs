//! # AFK Tracking Library
//!
//! Server-side subsystem that watches player activity and automatically
//! marks inactive players as "away from keyboard", switching them between
//! normal interactive play and a restricted observer mode.
//!
//! ## Core Responsibilities
//!
//! ### Idle Detection
//! Every connected player has a last-activity timestamp, refreshed by any
//! configured presence signal. A periodic sweep promotes players to AFK once
//! they have been idle past the configured timeout, unless they opted out
//! of automatic detection or recently took combat damage.
//!
//! ### State Authority
//! The AFK classification lives in one place and is mutated from one place.
//! Host events and the sweep tick are funneled through a single mpsc channel
//! and handled to completion one at a time, so the check-idle-then-set-AFK
//! sequence can never interleave with a movement event for the same player.
//!
//! ### Host Boundary
//! The library never touches world state or renders UI. Everything the host
//! must do on our behalf (switch a player's mode, show a message) leaves
//! the loop as a [`shared::HostCommand`] directive on an outbound channel.
//!
//! ## Module Organization
//!
//! - [`activity`]: per-session last-activity/last-damage bookkeeping
//! - [`status`]: the authoritative identity → AFK status store
//! - [`registry`]: persisted opt-out set for automatic detection
//! - [`machine`]: transition rules tying the three stores together
//! - [`commands`]: control-surface parsing and completion suggestions
//! - [`persistence`]: best-effort JSON settings store
//! - [`scheduler`]: cancellable repeating jobs for the idle sweep
//! - [`service`]: the event loop wiring it all to a host
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::persistence::SettingsStore;
//! use server::service::AfkService;
//! use shared::{AfkEvent, PlayerId};
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let (host_tx, mut host_rx) = mpsc::unbounded_channel();
//!     let mut service = AfkService::new(SettingsStore::open("afk-settings.json"), host_tx);
//!     let events = service.events();
//!
//!     tokio::spawn(async move { service.run().await });
//!
//!     // Host wiring: deliver events, apply the directives that come back.
//!     events
//!         .send(AfkEvent::Connected { player: PlayerId::new("steve") })
//!         .unwrap();
//!     while let Some(directive) = host_rx.recv().await {
//!         println!("{:?}", directive);
//!     }
//! }
//! ```

pub mod activity;
pub mod commands;
pub mod machine;
pub mod persistence;
pub mod registry;
pub mod scheduler;
pub mod service;
pub mod status;
