//! Dungeon layout generation.
//!
//! Produces a room/corridor chain with matching wall apertures. The core's
//! only structural obligation is that the two apertures sharing a corridor
//! agree on width and height; wall meshes with cutouts are built downstream
//! by the renderer. Rooms are not collision-checked against each other, so
//! overlap is possible and accepted.

use rand::Rng;
use serde::{Deserialize, Serialize};

const ROOM_COUNT: usize = 10;
const MIN_ROOM_SIZE: f32 = 5.0;
const MAX_ROOM_SIZE: f32 = 15.0;
const CORRIDOR_WIDTH: f32 = 4.0;
const CORRIDOR_HEIGHT: f32 = 4.0;
/// Chance that a new room's vertical level shifts by [`LEVEL_STEP`].
const LEVEL_SHIFT_CHANCE: f64 = 0.3;
const LEVEL_STEP: f32 = 5.0;
/// Floor queries sit slightly above the slab so entities do not z-fight it.
const FLOOR_LIFT: f32 = 0.1;
/// Elevation reported outside every room and corridor footprint.
const VOID_HEIGHT: f32 = -100.0;

/// Axis-aligned direction a corridor extends in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    PosX,
    NegX,
    PosZ,
    NegZ,
}

impl Direction {
    pub fn sample(rng: &mut impl Rng) -> Self {
        match rng.gen_range(0..4) {
            0 => Direction::PosX,
            1 => Direction::NegX,
            2 => Direction::PosZ,
            _ => Direction::NegZ,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::PosX => Direction::NegX,
            Direction::NegX => Direction::PosX,
            Direction::PosZ => Direction::NegZ,
            Direction::NegZ => Direction::PosZ,
        }
    }

    /// Unit offset on the XZ plane.
    pub fn offset(self) -> (f32, f32) {
        match self {
            Direction::PosX => (1.0, 0.0),
            Direction::NegX => (-1.0, 0.0),
            Direction::PosZ => (0.0, 1.0),
            Direction::NegZ => (0.0, -1.0),
        }
    }

    fn along_x(self) -> bool {
        matches!(self, Direction::PosX | Direction::NegX)
    }
}

/// Rectangular wall opening where a corridor meets a room.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aperture {
    pub x: f32,
    pub z: f32,
    pub width: f32,
    pub height: f32,
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub width: f32,
    pub height: f32,
    pub depth: f32,
    pub connections: Vec<Aperture>,
}

impl Room {
    fn contains_xz(&self, x: f32, z: f32) -> bool {
        x >= self.x - self.width / 2.0
            && x <= self.x + self.width / 2.0
            && z >= self.z - self.depth / 2.0
            && z <= self.z + self.depth / 2.0
    }

    pub fn floor_height(&self) -> f32 {
        self.y - self.height / 2.0 + FLOOR_LIFT
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Corridor {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub width: f32,
    pub height: f32,
    pub length: f32,
    pub direction: Direction,
}

impl Corridor {
    /// Footprint extents on the XZ plane: length runs along the corridor
    /// axis, width across it.
    fn extents_xz(&self) -> (f32, f32) {
        if self.direction.along_x() {
            (self.length, self.width)
        } else {
            (self.width, self.length)
        }
    }

    fn contains_xz(&self, x: f32, z: f32) -> bool {
        let (ex, ez) = self.extents_xz();
        x >= self.x - ex / 2.0
            && x <= self.x + ex / 2.0
            && z >= self.z - ez / 2.0
            && z <= self.z + ez / 2.0
    }

    pub fn floor_height(&self) -> f32 {
        self.y - self.height / 2.0 + FLOOR_LIFT
    }
}

/// A generated dungeon: the world payload for room-coded dungeon sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DungeonGraph {
    pub rooms: Vec<Room>,
    pub corridors: Vec<Corridor>,
}

impl DungeonGraph {
    /// Floor elevation under `(x, z)`: the containing room wins, then
    /// corridors, otherwise [`VOID_HEIGHT`]. Multi-level overlaps resolve to
    /// whichever piece appears first; acceptable for this layout style.
    pub fn floor_at(&self, x: f32, z: f32) -> f32 {
        for room in &self.rooms {
            if room.contains_xz(x, z) {
                return room.floor_height();
            }
        }
        for corridor in &self.corridors {
            if corridor.contains_xz(x, z) {
                return corridor.floor_height();
            }
        }
        VOID_HEIGHT
    }
}

/// Chain-style dungeon generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct DungeonGenerator;

impl DungeonGenerator {
    /// Builds a fixed-count room chain. `_target_size` is accepted for API
    /// symmetry with terrain generation; the layout is bounded by the chain
    /// itself rather than by covered area.
    pub fn generate(&self, _target_size: f32, rng: &mut impl Rng) -> DungeonGraph {
        let mut rooms = Vec::with_capacity(ROOM_COUNT);
        let mut corridors = Vec::with_capacity(ROOM_COUNT - 1);

        rooms.push(Room {
            id: 0,
            x: 0.0,
            y: 0.0,
            z: 0.0,
            width: 10.0,
            height: 5.0,
            depth: 10.0,
            connections: Vec::new(),
        });

        for i in 1..ROOM_COUNT as u32 {
            let direction = Direction::sample(rng);
            let corridor_length = rng.gen_range(5..15) as f32;
            let (dx, dz) = direction.offset();

            let prev = rooms.last_mut().expect("chain starts non-empty");
            let prev_extent = if direction.along_x() {
                prev.width / 2.0
            } else {
                prev.depth / 2.0
            };

            let cx = prev.x + dx * (prev_extent + corridor_length / 2.0);
            let cy = prev.y;
            let cz = prev.z + dz * (prev_extent + corridor_length / 2.0);

            // Outgoing aperture on the previous room's wall.
            prev.connections.push(Aperture {
                x: cx - dx * corridor_length / 2.0,
                z: cz - dz * corridor_length / 2.0,
                width: CORRIDOR_WIDTH,
                height: CORRIDOR_HEIGHT,
                direction,
            });

            corridors.push(Corridor {
                id: format!("c_{i}"),
                x: cx,
                y: cy,
                z: cz,
                width: CORRIDOR_WIDTH,
                height: CORRIDOR_HEIGHT,
                length: corridor_length,
                direction,
            });

            let width = rng.gen_range(MIN_ROOM_SIZE..MAX_ROOM_SIZE);
            let depth = rng.gen_range(MIN_ROOM_SIZE..MAX_ROOM_SIZE);
            let height = rng.gen_range(5.0..10.0f32);

            let room_extent = if direction.along_x() {
                width / 2.0
            } else {
                depth / 2.0
            };
            let rx = cx + dx * (corridor_length / 2.0 + room_extent);
            let rz = cz + dz * (corridor_length / 2.0 + room_extent);
            let mut ry = cy;
            if rng.gen_bool(LEVEL_SHIFT_CHANCE) {
                ry += if rng.gen_bool(0.5) {
                    LEVEL_STEP
                } else {
                    -LEVEL_STEP
                };
            }

            // Incoming aperture on the new room's facing wall.
            let entry = Aperture {
                x: rx - dx * room_extent,
                z: rz - dz * room_extent,
                width: CORRIDOR_WIDTH,
                height: CORRIDOR_HEIGHT,
                direction: direction.opposite(),
            };

            rooms.push(Room {
                id: i,
                x: rx,
                y: ry,
                z: rz,
                width,
                height,
                depth,
                connections: vec![entry],
            });
        }

        DungeonGraph { rooms, corridors }
    }
}
