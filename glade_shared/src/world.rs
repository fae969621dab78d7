//! Generated worlds.
//!
//! A session owns exactly one world: either an open height-field terrain or
//! a dungeon graph. Both answer elevation queries through [`HeightSource`],
//! which is what the client kinematics and the animal simulator walk on.

use rand::Rng;

use crate::config::{GameConfig, WorldKind};
use crate::dungeon::{DungeonGenerator, DungeonGraph};
use crate::math::Vec3;
use crate::protocol::{TerrainPayload, WorldPayload};
use crate::terrain::{HeightField, TerrainGenerator};

/// Anything an entity can stand on.
pub trait HeightSource {
    fn height_at(&self, x: f32, z: f32) -> f32;

    /// Surface normal for slope-aware orientation. Flat sources report up.
    fn normal_at(&self, _x: f32, _z: f32) -> Vec3 {
        Vec3::UP
    }
}

impl HeightSource for HeightField {
    fn height_at(&self, x: f32, z: f32) -> f32 {
        HeightField::height_at(self, x, z)
    }

    fn normal_at(&self, x: f32, z: f32) -> Vec3 {
        HeightField::normal_at(self, x, z)
    }
}

impl HeightSource for DungeonGraph {
    fn height_at(&self, x: f32, z: f32) -> f32 {
        self.floor_at(x, z)
    }
}

/// One session's world.
#[derive(Debug, Clone)]
pub enum World {
    Terrain(HeightField),
    Dungeon(DungeonGraph),
}

impl World {
    pub fn generate(cfg: &GameConfig, rng: &mut impl Rng) -> Self {
        match cfg.world {
            WorldKind::Terrain => World::Terrain(TerrainGenerator::default().generate(
                cfg.grid_size,
                cfg.world_size,
                rng,
            )),
            WorldKind::Dungeon => {
                World::Dungeon(DungeonGenerator.generate(cfg.world_size, rng))
            }
        }
    }

    pub fn to_payload(&self) -> WorldPayload {
        match self {
            World::Terrain(field) => WorldPayload::Terrain(TerrainPayload::from(field)),
            World::Dungeon(graph) => WorldPayload::Dungeon(graph.clone()),
        }
    }

    pub fn terrain(&self) -> Option<&HeightField> {
        match self {
            World::Terrain(field) => Some(field),
            World::Dungeon(_) => None,
        }
    }
}

impl From<WorldPayload> for World {
    fn from(payload: WorldPayload) -> Self {
        match payload {
            WorldPayload::Terrain(t) => World::Terrain(HeightField::from(t)),
            WorldPayload::Dungeon(d) => World::Dungeon(d),
        }
    }
}

impl HeightSource for World {
    fn height_at(&self, x: f32, z: f32) -> f32 {
        match self {
            World::Terrain(field) => field.height_at(x, z),
            World::Dungeon(graph) => graph.floor_at(x, z),
        }
    }

    fn normal_at(&self, x: f32, z: f32) -> Vec3 {
        match self {
            World::Terrain(field) => field.normal_at(x, z),
            World::Dungeon(_) => Vec3::UP,
        }
    }
}
