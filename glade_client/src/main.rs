//! Standalone client binary.
//!
//! Usage:
//!   cargo run -p glade_client -- [--addr 127.0.0.1:4000] [--room global] [--name Alice]
//!
//! Connects to the relay, joins a room, runs the frame loop headless and
//! prints chat/scoreboard state on demand. A real deployment wires the same
//! `GameClient` to a renderer and input capture instead.
//!
//! Console commands:
//!   say <message>   - Send chat
//!   shoot           - Fire (visual broadcast)
//!   status          - Show client status
//!   players         - List known players
//!   scoreboard      - Show the scoreboard
//!   quit            - Exit client

use std::env;
use std::io::{BufRead, Write};
use std::time::Duration;

use anyhow::Context;
use glade_client::input::InputState;
use glade_client::GameClient;
use glade_shared::config::GameConfig;
use tokio::sync::mpsc;
use tracing::info;

struct Args {
    cfg: GameConfig,
    room: String,
}

fn parse_args() -> Args {
    let mut cfg = GameConfig::default();
    let mut room = cfg.default_room.clone();
    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--addr" if i + 1 < args.len() => {
                cfg.listen_addr = args[i + 1].clone();
                i += 2;
            }
            "--room" if i + 1 < args.len() => {
                room = args[i + 1].clone();
                i += 2;
            }
            "--name" if i + 1 < args.len() => {
                cfg.player_name = args[i + 1].clone();
                i += 2;
            }
            _ => i += 1,
        }
    }
    Args { cfg, room }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = parse_args();
    info!(relay = %args.cfg.listen_addr, room = %args.room, "Starting client");

    let mut client = GameClient::connect(&args.cfg).await.context("connect")?;
    client.join(&args.room).await?;

    // Set up console input channel.
    let (console_tx, mut console_rx) = mpsc::channel::<String>(32);

    // Spawn stdin reader thread.
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();
        loop {
            print!("] ");
            let _ = stdout.flush();
            let mut line = String::new();
            if stdin.lock().read_line(&mut line).is_err() {
                break;
            }
            let line = line.trim().to_string();
            if !line.is_empty() && console_tx.blocking_send(line).is_err() {
                break;
            }
        }
    });

    println!("Client connected. Type 'status' for info, 'quit' to exit.");
    println!();

    let frame = Duration::from_millis(16);
    let mut input = InputState::default();
    let mut chat_seen = 0usize;

    loop {
        // Process console commands.
        while let Ok(line) = console_rx.try_recv() {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            match tokens.first().copied() {
                Some("say") => {
                    let msg = tokens[1..].join(" ");
                    client.say(&msg).await?;
                }
                Some("shoot") => {
                    client.shoot().await?;
                }
                Some("status") => {
                    println!("Player ID: {}", client.id);
                    if let Some(room) = &client.room {
                        println!("Room: {room}");
                    }
                    println!("Health: {}", client.health);
                    let p = client.kinematics.position;
                    println!("Position: ({:.1}, {:.1}, {:.1})", p.x, p.y, p.z);
                    println!("Tracked entities: {}", client.interp.len());
                }
                Some("players") => {
                    for player in client.players.values() {
                        println!(
                            "  {} {} at ({:.1}, {:.1}, {:.1})",
                            player.id, player.name, player.x, player.y, player.z
                        );
                    }
                }
                Some("scoreboard") => {
                    for player in &client.scoreboard {
                        println!("  {}: {} kills / {} deaths", player.name, player.kills, player.deaths);
                    }
                }
                Some("quit") | Some("exit") => {
                    client.leave().await.ok();
                    return Ok(());
                }
                Some(other) => {
                    println!("Unknown command '{other}'.");
                }
                None => {}
            }
        }

        // Apply pending relay events, then run one frame step.
        client.poll().await?;
        client.frame(frame.as_secs_f32(), &mut input).await?;

        // Print chat as it arrives.
        for line in client.chat_since(chat_seen) {
            println!("[chat] {}: {}", line.id, line.message);
        }
        chat_seen = client.chat_log.len();

        tokio::time::sleep(frame).await;
    }
}
