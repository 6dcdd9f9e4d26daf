//! Integration tests for the AFK tracking workspace
//!
//! These tests validate cross-component behavior: the state machine driving
//! the activity tracker, status store and opt-out registry together, the
//! service loop end to end over real channels, and persistence across
//! instances.

use server::machine::AfkMachine;
use server::persistence::SettingsStore;
use server::service::AfkService;
use shared::{Actor, AfkEvent, AfkStatus, HostCommand, PlayerId, PlayerMode};
use std::fs;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::time::timeout;

fn id(name: &str) -> PlayerId {
    PlayerId::new(name)
}

/// STATE MACHINE SCENARIO TESTS
mod state_machine_tests {
    use super::*;
    use shared::AfkConfig;

    fn config(idle_secs: u64, combat_secs: u64) -> AfkConfig {
        let mut config = AfkConfig::default();
        config.idle_timeout = Duration::from_secs(idle_secs);
        config.combat_window = Duration::from_secs(combat_secs);
        config
    }

    /// Full lifecycle: connect, idle out, return by moving, disconnect.
    #[test]
    fn idle_then_movement_lifecycle() {
        let mut machine = AfkMachine::new(config(5, 0));
        let start = Instant::now();

        machine.on_connect(id("p"), start);
        assert_eq!(machine.status(&id("p")), AfkStatus::Active);

        // Sweeps before the timeout leave the player alone.
        for s in 1..5 {
            assert!(machine.sweep(start + Duration::from_secs(s)).is_empty());
        }

        let directives = machine.sweep(start + Duration::from_secs(5));
        assert_eq!(machine.status(&id("p")), AfkStatus::Afk);
        assert!(directives.iter().any(|d| matches!(
            d,
            HostCommand::SetMode {
                mode: PlayerMode::Observer,
                ..
            }
        )));

        // Movement an instant later exits immediately, between sweeps.
        let directives =
            machine.on_activity(&id("p"), start + Duration::from_millis(5001));
        assert_eq!(machine.status(&id("p")), AfkStatus::Active);
        assert!(directives.iter().any(|d| matches!(
            d,
            HostCommand::SetMode {
                mode: PlayerMode::Normal,
                ..
            }
        )));

        let directives = machine.on_disconnect(&id("p"));
        assert!(directives.is_empty());
        assert!(!machine.is_online(&id("p")));
    }

    /// Combat lockout delays auto-AFK until the window has elapsed.
    #[test]
    fn combat_window_delays_auto_enter() {
        let mut machine = AfkMachine::new(config(60, 30));
        let start = Instant::now();

        machine.on_connect(id("p"), start);
        machine.on_damage(&id("p"), start + Duration::from_secs(10));

        // Inside the lockout window nothing happens even when idle enough.
        assert!(machine.sweep(start + Duration::from_secs(39)).is_empty());

        // Lockout ended at t=40s; at t=65s idle duration is 65s >= 60s.
        assert!(!machine.sweep(start + Duration::from_secs(65)).is_empty());
        assert_eq!(machine.status(&id("p")), AfkStatus::Afk);
    }

    /// Opt-out survives disconnect/reconnect and long idling.
    #[test]
    fn opted_out_player_never_auto_transitions() {
        let mut machine = AfkMachine::new(config(60, 0));
        let start = Instant::now();

        machine.on_connect(id("p"), start);
        machine.registry_mut().disable(id("p"));

        machine.on_disconnect(&id("p"));
        machine.on_connect(id("p"), start + Duration::from_secs(30));

        // Ten minutes of idle sweeps, once per second.
        for s in 31..630 {
            assert!(machine.sweep(start + Duration::from_secs(s)).is_empty());
        }
        assert_eq!(machine.status(&id("p")), AfkStatus::Active);
    }

    /// Status is exactly one of Active/Afk for any identity at any time.
    #[test]
    fn status_is_always_single_valued() {
        let mut machine = AfkMachine::new(config(1, 0));
        let start = Instant::now();

        for name in ["a", "b", "c"] {
            machine.on_connect(id(name), start);
        }
        machine.toggle(&id("b"), start).unwrap();
        machine.sweep(start + Duration::from_secs(2));

        for name in ["a", "b", "c", "never-seen"] {
            let status = machine.status(&id(name));
            assert!(status == AfkStatus::Active || status == AfkStatus::Afk);
        }
    }
}

/// SERVICE LOOP TESTS
mod service_tests {
    use super::*;

    fn open_service(
        dir: &tempfile::TempDir,
        settings_json: &str,
    ) -> (AfkService, mpsc::UnboundedReceiver<HostCommand>) {
        let path = dir.path().join("afk-settings.json");
        fs::write(&path, settings_json).unwrap();
        let (host_tx, host_rx) = mpsc::unbounded_channel();
        (AfkService::new(SettingsStore::open(path), host_tx), host_rx)
    }

    /// Drives the real service loop: the scheduled sweep alone must promote
    /// an idle player, and a movement event must bring them back.
    #[tokio::test]
    async fn auto_afk_round_trip_through_the_loop() {
        let dir = tempfile::tempdir().unwrap();
        let (mut service, mut host_rx) = open_service(
            &dir,
            r#"{"auto-afk.timeout": 0, "combatlog.duration": 0, "auto-afk.scan-interval": 1}"#,
        );
        let events = service.events();

        let worker = tokio::spawn(async move {
            service.run().await;
        });

        events.send(AfkEvent::Connected { player: id("p") }).unwrap();

        let entered = timeout(Duration::from_secs(5), async {
            loop {
                match host_rx.recv().await {
                    Some(HostCommand::SetMode {
                        mode: PlayerMode::Observer,
                        ..
                    }) => break true,
                    Some(_) => continue,
                    None => break false,
                }
            }
        })
        .await
        .unwrap();
        assert!(entered);

        events.send(AfkEvent::Activity { player: id("p") }).unwrap();
        let exited = timeout(Duration::from_secs(5), async {
            loop {
                match host_rx.recv().await {
                    Some(HostCommand::SetMode {
                        mode: PlayerMode::Normal,
                        ..
                    }) => break true,
                    Some(_) => continue,
                    None => break false,
                }
            }
        })
        .await
        .unwrap();
        assert!(exited);

        events.send(AfkEvent::Shutdown).unwrap();
        timeout(Duration::from_secs(1), worker)
            .await
            .unwrap()
            .unwrap();
    }

    /// Admin toggles another player through the command surface.
    #[tokio::test]
    async fn admin_toggle_other_through_the_loop() {
        let dir = tempfile::tempdir().unwrap();
        let (mut service, mut host_rx) =
            open_service(&dir, r#"{"auto-afk.enabled": false}"#);
        let events = service.events();

        let worker = tokio::spawn(async move {
            service.run().await;
        });

        events
            .send(AfkEvent::Connected { player: id("target") })
            .unwrap();
        events
            .send(AfkEvent::Command {
                actor: Actor::admin("ops"),
                line: "target".to_string(),
            })
            .unwrap();

        let mut saw_observer = false;
        let mut saw_admin_reply = false;
        timeout(Duration::from_secs(2), async {
            while let Some(directive) = host_rx.recv().await {
                match directive {
                    HostCommand::SetMode {
                        player,
                        mode: PlayerMode::Observer,
                    } => {
                        assert_eq!(player, id("target"));
                        saw_observer = true;
                    }
                    HostCommand::Notify { player, text } if player == id("ops") => {
                        assert_eq!(text, "Set target to AFK.");
                        saw_admin_reply = true;
                    }
                    _ => {}
                }
                if saw_observer && saw_admin_reply {
                    break;
                }
            }
        })
        .await
        .unwrap();
        assert!(saw_observer && saw_admin_reply);

        events.send(AfkEvent::Shutdown).unwrap();
        timeout(Duration::from_secs(1), worker)
            .await
            .unwrap()
            .unwrap();
    }

    /// Suggestion surface offers subcommands and connected identities.
    #[tokio::test]
    async fn suggestions_reflect_connected_players() {
        let dir = tempfile::tempdir().unwrap();
        let (mut service, _host_rx) =
            open_service(&dir, r#"{"auto-afk.enabled": false}"#);
        let events = service.events();

        // Feed the connect through the loop, then stop it so we can inspect.
        let worker = tokio::spawn(async move {
            service.run().await;
            service
        });
        events
            .send(AfkEvent::Connected { player: id("steve") })
            .unwrap();
        events.send(AfkEvent::Shutdown).unwrap();
        let service = timeout(Duration::from_secs(1), worker)
            .await
            .unwrap()
            .unwrap();

        let admin = Actor::admin("ops");
        assert_eq!(
            service.suggest(&["st"], &admin),
            vec!["steve".to_string()]
        );
        assert_eq!(
            service.suggest(&["disable", "s"], &admin),
            vec!["steve".to_string()]
        );
        assert_eq!(
            service.suggest(&["re"], &admin),
            vec!["reload".to_string()]
        );
    }
}

/// PERSISTENCE TESTS
mod persistence_tests {
    use super::*;

    /// Opt-out mutations written by one instance are visible to the next,
    /// the way a server restart would see them.
    #[tokio::test]
    async fn opt_out_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("afk-settings.json");

        {
            let (host_tx, _host_rx) = mpsc::unbounded_channel();
            let mut service = AfkService::new(SettingsStore::open(&path), host_tx);
            let events = service.events();
            let worker = tokio::spawn(async move {
                service.run().await;
            });
            events
                .send(AfkEvent::Command {
                    actor: Actor::admin("ops"),
                    line: "disable steve".to_string(),
                })
                .unwrap();
            events.send(AfkEvent::Shutdown).unwrap();
            timeout(Duration::from_secs(1), worker)
                .await
                .unwrap()
                .unwrap();
        }

        let (host_tx, _host_rx) = mpsc::unbounded_channel();
        let service = AfkService::new(SettingsStore::open(&path), host_tx);
        assert!(service.machine().registry().is_disabled(&id("steve")));
    }

    /// AFK status itself is never persisted: a restart always comes up with
    /// an empty status store, even if the previous process had players AFK.
    #[tokio::test]
    async fn afk_status_does_not_survive_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("afk-settings.json");

        {
            let (host_tx, _host_rx) = mpsc::unbounded_channel();
            let mut service = AfkService::new(SettingsStore::open(&path), host_tx);
            let events = service.events();
            let worker = tokio::spawn(async move {
                service.run().await;
            });
            events.send(AfkEvent::Connected { player: id("p") }).unwrap();
            events
                .send(AfkEvent::Command {
                    actor: Actor::player("p"),
                    line: String::new(),
                })
                .unwrap();
            events.send(AfkEvent::Shutdown).unwrap();
            timeout(Duration::from_secs(1), worker)
                .await
                .unwrap()
                .unwrap();
        }

        let (host_tx, _host_rx) = mpsc::unbounded_channel();
        let service = AfkService::new(SettingsStore::open(&path), host_tx);
        assert!(!service.machine().is_afk(&id("p")));

        let text = fs::read_to_string(&path).unwrap();
        assert!(!text.contains("\"p\""));
    }
}
