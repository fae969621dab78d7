//! Player records and the scoreboard.

use serde::{Deserialize, Serialize};

use crate::protocol::{MoveUpdate, PlayerId};

pub const MAX_HEALTH: i32 = 100;
/// Health removed per hit event.
pub const HIT_DAMAGE: i32 = 10;

/// Authoritative per-player record held by a session.
///
/// The transform fields mirror whatever the owning client last reported; the
/// relay never recomputes them. Health, kills and deaths are the shared facts
/// the relay does arbitrate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// Yaw in radians.
    pub rotation: f32,
    /// Pitch in radians.
    pub rx: f32,
    pub health: i32,
    #[serde(default)]
    pub kills: u32,
    #[serde(default)]
    pub deaths: u32,
    pub name: String,
}

impl Player {
    pub fn new(id: PlayerId, name: String, x: f32, y: f32, z: f32) -> Self {
        Self {
            id,
            x,
            y,
            z,
            rotation: 0.0,
            rx: 0.0,
            health: MAX_HEALTH,
            kills: 0,
            deaths: 0,
            name,
        }
    }

    /// Overwrites the transform verbatim from a client report.
    pub fn apply_move(&mut self, update: &MoveUpdate) {
        self.x = update.x;
        self.y = update.y;
        self.z = update.z;
        self.rotation = update.rotation;
        self.rx = update.rx;
    }
}

/// Players ordered by kills, descending. Ties keep insertion order.
pub fn scoreboard<'a>(players: impl Iterator<Item = &'a Player>) -> Vec<Player> {
    let mut board: Vec<Player> = players.cloned().collect();
    board.sort_by(|a, b| b.kills.cmp(&a.kills));
    board
}
