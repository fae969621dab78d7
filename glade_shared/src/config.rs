//! Configuration system.
//!
//! Loads game configuration from JSON strings/files (file IO left to app).

use serde::{Deserialize, Serialize};

/// Which world shape the relay generates for new rooms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WorldKind {
    /// Open noise terrain with animals and trees.
    #[default]
    Terrain,
    /// Room/corridor dungeon.
    Dungeon,
}

impl std::str::FromStr for WorldKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "terrain" => Ok(WorldKind::Terrain),
            "dungeon" => Ok(WorldKind::Dungeon),
            other => Err(format!("unknown world kind '{other}'")),
        }
    }
}

/// Root configuration shared by client/relay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Relay listen address, e.g. `127.0.0.1:4000`.
    pub listen_addr: String,
    /// World shape for newly created rooms.
    #[serde(default)]
    pub world: WorldKind,
    /// Animal AI tick period in milliseconds.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    /// Terrain grid resolution (`grid_size + 1` samples per side).
    #[serde(default = "default_grid_size")]
    pub grid_size: usize,
    /// World extent in world units.
    #[serde(default = "default_world_size")]
    pub world_size: f32,
    /// Animals per open-terrain room.
    #[serde(default = "default_animal_count")]
    pub animal_count: usize,
    /// Tree scatter attempts per open-terrain room.
    #[serde(default = "default_tree_count")]
    pub tree_count: usize,
    /// Room code used when the client does not specify one.
    #[serde(default = "default_room")]
    pub default_room: String,
    /// Player display name (client only); empty lets the relay assign
    /// `Player N`.
    #[serde(default)]
    pub player_name: String,
}

fn default_tick_ms() -> u64 {
    100
}

fn default_grid_size() -> usize {
    100
}

fn default_world_size() -> f32 {
    1000.0
}

fn default_animal_count() -> usize {
    20
}

fn default_tree_count() -> usize {
    200
}

fn default_room() -> String {
    "global".to_string()
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:4000".to_string(),
            world: WorldKind::default(),
            tick_ms: default_tick_ms(),
            grid_size: default_grid_size(),
            world_size: default_world_size(),
            animal_count: default_animal_count(),
            tree_count: default_tree_count(),
            default_room: default_room(),
            player_name: String::new(),
        }
    }
}

impl GameConfig {
    /// Parses config from JSON.
    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }
}
