//! Standalone relay binary.
//!
//! Usage:
//!   cargo run -p glade_server -- [--addr 127.0.0.1:4000] [--world terrain|dungeon]
//!                                [--tick-ms 100] [--animals 20] [--trees 200]
//!
//! The relay listens for client connections, creates a room per join code,
//! runs each room's animal tick, and fans events out to room members.
//!
//! Console commands:
//!   status  - Show room/player counts
//!   quit    - Shutdown relay

use std::env;
use std::io::{BufRead, Write};

use glade_server::Relay;
use glade_shared::config::GameConfig;
use tokio::sync::mpsc;
use tracing::info;

fn parse_args() -> GameConfig {
    let mut cfg = GameConfig::default();
    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--addr" if i + 1 < args.len() => {
                cfg.listen_addr = args[i + 1].clone();
                i += 2;
            }
            "--world" if i + 1 < args.len() => {
                if let Ok(kind) = args[i + 1].parse() {
                    cfg.world = kind;
                }
                i += 2;
            }
            "--tick-ms" if i + 1 < args.len() => {
                cfg.tick_ms = args[i + 1].parse().unwrap_or(100);
                i += 2;
            }
            "--animals" if i + 1 < args.len() => {
                cfg.animal_count = args[i + 1].parse().unwrap_or(cfg.animal_count);
                i += 2;
            }
            "--trees" if i + 1 < args.len() => {
                cfg.tree_count = args[i + 1].parse().unwrap_or(cfg.tree_count);
                i += 2;
            }
            _ => i += 1,
        }
    }
    cfg
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cfg = parse_args();
    info!(addr = %cfg.listen_addr, world = ?cfg.world, tick_ms = cfg.tick_ms, "Starting relay");

    let relay = Relay::bind(cfg).await?;
    let registry = relay.registry();

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

    // Console command task.
    tokio::spawn(async move {
        while let Some(line) = console_rx.recv().await {
            match line.as_str() {
                "status" => {
                    for line in registry.status_lines().await {
                        println!("{line}");
                    }
                }
                "quit" | "exit" => {
                    info!("Relay shutting down");
                    std::process::exit(0);
                }
                other => {
                    println!("Unknown command '{other}'. Try 'status' or 'quit'.");
                }
            }
        }
    });

    println!("Relay ready. Type 'status' for info, 'quit' to exit.");
    println!();

    relay.run().await
}
