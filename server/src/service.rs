//! Service loop funneling every event source through one sequencer
//!
//! Host events (connect, disconnect, movement, damage, commands) and the
//! periodic sweep tick all arrive on a single mpsc channel and are handled
//! one at a time, to completion, so no read-modify-write on the shared state
//! can interleave. Side effects leave through a second channel as
//! [`HostCommand`] directives for the host to apply. This is the same
//! two-channel split the rest of the server uses between its network tasks
//! and its main loop.

use crate::commands::{self, Command, CommandError};
use crate::machine::{AfkMachine, TransitionError};
use crate::persistence::SettingsStore;
use crate::registry::OptOutRegistry;
use crate::scheduler::{spawn_repeating, JobHandle};
use log::{info, warn};
use shared::{render_template, Actor, AfkEvent, AfkStatus, HostCommand, PlayerId};
use std::time::Instant;
use tokio::sync::mpsc;

pub struct AfkService {
    machine: AfkMachine,
    settings: SettingsStore,
    events_tx: mpsc::UnboundedSender<AfkEvent>,
    events_rx: mpsc::UnboundedReceiver<AfkEvent>,
    host_tx: mpsc::UnboundedSender<HostCommand>,
    sweep_job: Option<JobHandle>,
}

impl AfkService {
    /// Builds the service from an opened settings store. Loads the opt-out
    /// registry from the persisted list and flushes any legacy persisted
    /// AFK entries so every session starts Active.
    pub fn new(
        mut settings: SettingsStore,
        host_tx: mpsc::UnboundedSender<HostCommand>,
    ) -> Self {
        let mut machine = AfkMachine::new(settings.doc().config());
        machine.set_registry(OptOutRegistry::from_players(
            settings.doc().disabled_players.clone(),
        ));
        machine.set_legacy_afk(settings.take_legacy_afk_players());

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            machine,
            settings,
            events_tx,
            events_rx,
            host_tx,
            sweep_job: None,
        }
    }

    /// Sender half for the host wiring; all events flow in through this.
    pub fn events(&self) -> mpsc::UnboundedSender<AfkEvent> {
        self.events_tx.clone()
    }

    pub fn machine(&self) -> &AfkMachine {
        &self.machine
    }

    /// Completion suggestions for a partially typed control command.
    pub fn suggest(&self, args: &[&str], actor: &Actor) -> Vec<String> {
        commands::suggest(args, actor.admin, &self.machine.online_ids())
    }

    /// Main loop. Runs until a Shutdown event arrives or every event sender
    /// is dropped, then cancels the sweep job exactly once.
    pub async fn run(&mut self) {
        self.start_sweep_job();
        info!("AFK service started");

        while let Some(event) = self.events_rx.recv().await {
            if matches!(event, AfkEvent::Shutdown) {
                break;
            }
            self.dispatch(event, Instant::now());
        }

        self.stop_sweep_job();
        info!("AFK service stopped");
    }

    fn dispatch(&mut self, event: AfkEvent, now: Instant) {
        match event {
            AfkEvent::Connected { player } => {
                let commands = self.machine.on_connect(player, now);
                self.emit(commands);
            }
            AfkEvent::Disconnected { player } => {
                let commands = self.machine.on_disconnect(&player);
                self.emit(commands);
            }
            AfkEvent::Activity { player } => {
                let commands = self.machine.on_activity(&player, now);
                self.emit(commands);
            }
            AfkEvent::Damage { player } => {
                self.machine.on_damage(&player, now);
            }
            AfkEvent::Command { actor, line } => {
                self.handle_command(actor, &line, now);
            }
            AfkEvent::Sweep => {
                let commands = self.machine.sweep(now);
                self.emit(commands);
            }
            AfkEvent::Shutdown => {}
        }
    }

    fn handle_command(&mut self, actor: Actor, line: &str, now: Instant) {
        match self.execute(&actor, line, now) {
            Ok(Some(reply)) => self.notify(&actor.player, reply),
            Ok(None) => {}
            Err(err) => {
                let text = self.error_text(&err);
                self.notify(&actor.player, text);
            }
        }
    }

    fn execute(
        &mut self,
        actor: &Actor,
        line: &str,
        now: Instant,
    ) -> Result<Option<String>, CommandError> {
        let command = commands::parse(line)?;
        if command.requires_admin() && !actor.admin {
            return Err(CommandError::PermissionDenied);
        }

        let messages = self.machine.config().messages.clone();
        match command {
            Command::ToggleSelf => {
                // The transition itself notifies the player; no extra reply.
                let (_, commands) = self.machine.toggle(&actor.player, now)?;
                self.emit(commands);
                Ok(None)
            }
            Command::ToggleOther { target } => {
                let (status, commands) = self.machine.toggle(&target, now)?;
                self.emit(commands);
                let template = match status {
                    AfkStatus::Afk => &messages.set_afk_other,
                    AfkStatus::Active => &messages.set_active_other,
                };
                Ok(Some(render_template(template, &target)))
            }
            Command::SetOptOut { target, opt_out } => {
                if opt_out {
                    if self.machine.registry_mut().disable(target.clone()) {
                        self.persist_registry();
                    }
                    Ok(Some(render_template(&messages.disable_success, &target)))
                } else if self.machine.registry_mut().enable(&target) {
                    self.persist_registry();
                    Ok(Some(render_template(&messages.enable_success, &target)))
                } else {
                    Err(CommandError::PlayerNotDisabled(target))
                }
            }
            Command::SelfOptOut { opt_out } => {
                let player = actor.player.clone();
                if opt_out {
                    if self.machine.registry_mut().disable(player) {
                        self.persist_registry();
                    }
                    Ok(Some(messages.self_opt_out))
                } else {
                    if self.machine.registry_mut().enable(&player) {
                        self.persist_registry();
                    }
                    Ok(Some(messages.self_opt_in))
                }
            }
            Command::Reload => {
                self.reload();
                Ok(Some(self.machine.config().messages.reload_success.clone()))
            }
        }
    }

    /// reload-config: re-read the settings file, re-apply the opt-out
    /// registry from the persisted list, and restart the sweep with the new
    /// parameters. Live AFK statuses and activity records are untouched.
    pub fn reload(&mut self) {
        self.settings.reload();
        self.machine.set_config(self.settings.doc().config());
        self.machine.set_registry(OptOutRegistry::from_players(
            self.settings.doc().disabled_players.clone(),
        ));
        self.start_sweep_job();
        info!("Configuration reloaded from {}", self.settings.path().display());
    }

    fn persist_registry(&mut self) {
        self.settings
            .persist_disabled_players(self.machine.registry().players());
    }

    /// Starts (or restarts) the sweep job. Always cancels any existing job
    /// first so there are never two live timers, and schedules nothing at
    /// all while auto-AFK is disabled.
    fn start_sweep_job(&mut self) {
        if let Some(job) = self.sweep_job.take() {
            job.cancel();
        }

        let config = self.machine.config();
        if !config.auto_afk_enabled {
            info!("Auto-AFK is disabled; idle sweep not scheduled");
            return;
        }

        let events = self.events_tx.clone();
        info!(
            "Idle sweep scheduled every {:?} (timeout {:?})",
            config.scan_interval, config.idle_timeout
        );
        self.sweep_job = Some(spawn_repeating(config.scan_interval, move || {
            // Send failure means the service is gone; the job dies with it.
            let _ = events.send(AfkEvent::Sweep);
        }));
    }

    fn stop_sweep_job(&mut self) {
        if let Some(job) = self.sweep_job.take() {
            job.cancel();
            info!("Idle sweep cancelled");
        }
    }

    fn error_text(&self, err: &CommandError) -> String {
        let messages = &self.machine.config().messages;
        match err {
            CommandError::Transition(TransitionError::NotOnline(player)) => {
                render_template(&messages.not_online, player)
            }
            CommandError::Transition(TransitionError::CombatLockout(_)) => {
                messages.combat_lockout.clone()
            }
            CommandError::PermissionDenied => messages.no_permission.clone(),
            CommandError::PlayerNotDisabled(player) => {
                render_template(&messages.player_not_disabled, player)
            }
            CommandError::Usage => err.to_string(),
        }
    }

    fn notify(&self, player: &PlayerId, text: String) {
        self.emit(vec![HostCommand::Notify {
            player: player.clone(),
            text,
        }]);
    }

    fn emit(&self, commands: Vec<HostCommand>) {
        for command in commands {
            if self.host_tx.send(command).is_err() {
                warn!("Host command channel closed; dropping directives");
                break;
            }
        }
    }
}
