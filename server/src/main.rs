use clap::Parser;
use log::{error, info};
use server::persistence::SettingsStore;
use server::service::AfkService;
use shared::{Actor, AfkEvent, HostCommand, PlayerId, PlayerMode};
use std::path::PathBuf;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;

const CONSOLE_USAGE: &str = "\
commands:
  connect <player>       establish a session
  disconnect <player>    drop a session
  move <player>          presence signal
  damage <player>        combat damage report
  afk <player> [...]     run the afk command as <player>
  quit                   shut down";

/// Console host for the AFK service.
/// Feeds line-based events into the service loop and prints the mode/notify
/// directives that come back, standing in for a real game server's dispatch.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Command line arguments
    #[derive(Parser, Debug)]
    #[clap(author, version, about)]
    struct Args {
        /// Path to the JSON settings store
        #[clap(short, long, default_value = "afk-settings.json")]
        settings: PathBuf,
        /// Identities granted the admin right on this console
        #[clap(long, value_delimiter = ',')]
        admins: Vec<String>,
    }

    env_logger::init();
    let args = Args::parse();

    let (host_tx, mut host_rx) = mpsc::unbounded_channel();
    let mut service = AfkService::new(SettingsStore::open(&args.settings), host_tx);
    let events = service.events();

    // Render outbound directives to the console.
    let render_handle = tokio::spawn(async move {
        while let Some(directive) = host_rx.recv().await {
            match directive {
                HostCommand::SetMode { player, mode } => {
                    let mode = match mode {
                        PlayerMode::Normal => "normal",
                        PlayerMode::Observer => "observer",
                    };
                    println!("[mode] {} -> {}", player, mode);
                }
                HostCommand::Notify { player, text } => {
                    println!("[msg] {}: {}", player, text);
                }
            }
        }
    });

    let service_handle = tokio::spawn(async move {
        service.run().await;
    });

    // Feed console lines into the event channel.
    let stdin_events = events.clone();
    let admins = args.admins;
    let stdin_handle = tokio::spawn(async move {
        let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if line.trim().is_empty() {
                continue;
            }
            match parse_console_line(&line, &admins) {
                Some(event) => {
                    if stdin_events.send(event).is_err() {
                        break;
                    }
                }
                None => eprintln!("{}", CONSOLE_USAGE),
            }
        }
    });

    info!("Console host started");

    tokio::select! {
        result = service_handle => {
            if let Err(e) = result {
                error!("Service task panicked: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down gracefully...");
            let _ = events.send(AfkEvent::Shutdown);
        }
    }

    stdin_handle.abort();
    render_handle.abort();
    Ok(())
}

fn parse_console_line(line: &str, admins: &[String]) -> Option<AfkEvent> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    match tokens.as_slice() {
        ["connect", player] => Some(AfkEvent::Connected {
            player: PlayerId::new(*player),
        }),
        ["disconnect", player] => Some(AfkEvent::Disconnected {
            player: PlayerId::new(*player),
        }),
        ["move", player] => Some(AfkEvent::Activity {
            player: PlayerId::new(*player),
        }),
        ["damage", player] => Some(AfkEvent::Damage {
            player: PlayerId::new(*player),
        }),
        ["afk", player, rest @ ..] => {
            let actor = if admins.iter().any(|a| a == player) {
                Actor::admin(*player)
            } else {
                Actor::player(*player)
            };
            Some(AfkEvent::Command {
                actor,
                line: rest.join(" "),
            })
        }
        ["quit"] | ["exit"] => Some(AfkEvent::Shutdown),
        _ => None,
    }
}
