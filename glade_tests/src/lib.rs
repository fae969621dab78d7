//! Shared harness for socket-level tests.

use std::sync::Arc;
use std::time::Duration;

use glade_client::GameClient;
use glade_server::registry::RoomRegistry;
use glade_server::relay::bind_ephemeral;
use glade_shared::config::{GameConfig, WorldKind};

/// Small worlds keep generation fast in tests.
pub fn test_config(world: WorldKind) -> GameConfig {
    GameConfig {
        world,
        grid_size: 16,
        world_size: 160.0,
        animal_count: 5,
        tree_count: 20,
        tick_ms: 50,
        ..GameConfig::default()
    }
}

/// Binds a relay on an ephemeral port and runs it in the background.
/// Returns the effective config (with the real address) and the registry
/// handle for state assertions.
pub async fn start_relay(cfg: GameConfig) -> anyhow::Result<(GameConfig, Arc<RoomRegistry>)> {
    let (relay, cfg) = bind_ephemeral(cfg).await?;
    let registry = relay.registry();
    tokio::spawn(async move {
        let _ = relay.run().await;
    });
    Ok((cfg, registry))
}

/// Pumps relay events into `client` until `pred` holds or the deadline
/// passes. Returns whether the predicate was satisfied.
pub async fn wait_for<F>(
    client: &mut GameClient,
    deadline: Duration,
    mut pred: F,
) -> anyhow::Result<bool>
where
    F: FnMut(&GameClient) -> bool,
{
    let start = tokio::time::Instant::now();
    while start.elapsed() < deadline {
        if pred(client) {
            return Ok(true);
        }
        client.next_event(Duration::from_millis(25)).await?;
    }
    Ok(pred(client))
}

/// Installs a test-friendly tracing subscriber, once.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("info")
        .with_test_writer()
        .try_init();
}
