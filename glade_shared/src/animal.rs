//! Animal wander AI.
//!
//! Animals are created once per world and live until session teardown. Each
//! runs a two-state machine: wait in place, then walk to a random point near
//! its spawn anchor. Targets are always chosen relative to the anchor rather
//! than the current position, so a herd cannot drift across the map over
//! time.
//!
//! The simulator advances on a fixed-rate tick with a fixed delta; wall-clock
//! jitter never changes step size. Only animals that moved during a tick are
//! reported, so clients must not expect heartbeats for idle ones.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::terrain::HeightField;

/// Walk speed in world units per second.
const WALK_SPEED: f32 = 3.0;
/// Half-extent of the square wander area around the spawn anchor.
const WANDER_RADIUS: f32 = 20.0;
/// Idle cooldown range in seconds after reaching a target.
const WAIT_MIN: f32 = 2.0;
const WAIT_SPAN: f32 = 3.0;
/// Spawn placement rejects terrain at or below this elevation (deep water).
const SPAWN_MIN_HEIGHT: f32 = -8.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimalState {
    Idle,
    Moving,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Animal {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub spawn_x: f32,
    pub spawn_z: f32,
    pub target_x: f32,
    pub target_z: f32,
    pub rotation: f32,
    pub state: AnimalState,
    pub wait_timer: f32,
}

/// Per-tick report for one animal that moved.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnimalMovement {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub rotation: f32,
}

/// All animals of one session, keyed by id. A `BTreeMap` keeps broadcast
/// order stable across ticks.
#[derive(Debug, Clone, Default)]
pub struct AnimalSet {
    animals: BTreeMap<u32, Animal>,
}

impl AnimalSet {
    /// Scatters `count` animals over the terrain, resampling any position
    /// that lands in deep water.
    pub fn populate(count: usize, field: &HeightField, rng: &mut impl Rng) -> Self {
        let half = field.world_size() / 2.0;
        let mut animals = BTreeMap::new();
        for id in 0..count as u32 {
            let (x, y, z) = loop {
                let x = rng.gen_range(-half..half);
                let z = rng.gen_range(-half..half);
                let y = field.height_at(x, z);
                if y > SPAWN_MIN_HEIGHT {
                    break (x, y, z);
                }
            };
            animals.insert(
                id,
                Animal {
                    id,
                    x,
                    y,
                    z,
                    spawn_x: x,
                    spawn_z: z,
                    target_x: x,
                    target_z: z,
                    rotation: rng.gen_range(0.0..std::f32::consts::TAU),
                    state: AnimalState::Idle,
                    wait_timer: 0.0,
                },
            );
        }
        Self { animals }
    }

    pub fn is_empty(&self) -> bool {
        self.animals.is_empty()
    }

    pub fn len(&self) -> usize {
        self.animals.len()
    }

    pub fn snapshot(&self) -> BTreeMap<u32, Animal> {
        self.animals.clone()
    }

    pub fn get(&self, id: u32) -> Option<&Animal> {
        self.animals.get(&id)
    }

    #[cfg(test)]
    pub fn get_mut(&mut self, id: u32) -> Option<&mut Animal> {
        self.animals.get_mut(&id)
    }

    /// Advances every animal by `dt` seconds and returns the movement of each
    /// animal that walked this tick. Idle animals report nothing.
    pub fn step(
        &mut self,
        dt: f32,
        field: &HeightField,
        rng: &mut impl Rng,
    ) -> Vec<AnimalMovement> {
        let mut moved = Vec::new();
        for animal in self.animals.values_mut() {
            match animal.state {
                AnimalState::Idle => {
                    animal.wait_timer -= dt;
                    if animal.wait_timer <= 0.0 {
                        animal.target_x =
                            animal.spawn_x + rng.gen_range(-WANDER_RADIUS..WANDER_RADIUS);
                        animal.target_z =
                            animal.spawn_z + rng.gen_range(-WANDER_RADIUS..WANDER_RADIUS);
                        animal.state = AnimalState::Moving;
                    }
                }
                AnimalState::Moving => {
                    let step = WALK_SPEED * dt;
                    let dx = animal.target_x - animal.x;
                    let dz = animal.target_z - animal.z;
                    let dist = (dx * dx + dz * dz).sqrt();

                    if dist < step {
                        // Land exactly on the target; no overshoot.
                        animal.x = animal.target_x;
                        animal.z = animal.target_z;
                        animal.state = AnimalState::Idle;
                        animal.wait_timer = WAIT_MIN + rng.gen_range(0.0..WAIT_SPAN);
                    } else {
                        let heading = dx.atan2(dz);
                        animal.x += heading.sin() * step;
                        animal.z += heading.cos() * step;
                        animal.rotation = heading;
                    }

                    // Animals always ride the terrain.
                    animal.y = field.height_at(animal.x, animal.z);

                    // The snap tick flips to Idle above and is not reported;
                    // peers only hear from animals still on the move.
                    if animal.state == AnimalState::Moving {
                        moved.push(AnimalMovement {
                            id: animal.id,
                            x: animal.x,
                            y: animal.y,
                            z: animal.z,
                            rotation: animal.rotation,
                        });
                    }
                }
            }
        }
        moved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    const DT: f32 = 0.1;

    fn flat_field() -> HeightField {
        HeightField::from_samples(vec![vec![1.5; 11]; 11], 10, 1000.0)
    }

    fn single_animal(field: &HeightField) -> AnimalSet {
        let mut rng = StdRng::seed_from_u64(9);
        AnimalSet::populate(1, field, &mut rng)
    }

    #[test]
    fn populate_rejects_deep_water() {
        // Half the grid is far below the spawn threshold.
        let mut samples = vec![vec![5.0f32; 11]; 11];
        for row in samples.iter_mut().take(5) {
            row.iter_mut().for_each(|h| *h = -50.0);
        }
        let field = HeightField::from_samples(samples, 10, 1000.0);
        let mut rng = StdRng::seed_from_u64(0);
        let set = AnimalSet::populate(40, &field, &mut rng);
        assert_eq!(set.len(), 40);
        for animal in set.snapshot().values() {
            assert!(field.height_at(animal.x, animal.z) > -8.0);
        }
    }

    #[test]
    fn idle_timer_expiry_transitions_to_moving_once() {
        let field = flat_field();
        let mut set = single_animal(&field);
        let mut rng = StdRng::seed_from_u64(1);

        set.get_mut(0).unwrap().wait_timer = 0.25;

        // Two ticks: timer 0.25 -> 0.15 -> 0.05, still idle.
        set.step(DT, &field, &mut rng);
        set.step(DT, &field, &mut rng);
        assert_eq!(set.get(0).unwrap().state, AnimalState::Idle);

        // Third tick crosses zero: exactly one transition.
        set.step(DT, &field, &mut rng);
        assert_eq!(set.get(0).unwrap().state, AnimalState::Moving);
    }

    #[test]
    fn wander_target_stays_near_spawn_anchor() {
        let field = flat_field();
        let mut set = single_animal(&field);
        let mut rng = StdRng::seed_from_u64(2);

        for _ in 0..200 {
            let animal = set.get_mut(0).unwrap();
            animal.state = AnimalState::Idle;
            animal.wait_timer = 0.0;
            set.step(DT, &field, &mut rng);
            let animal = set.get(0).unwrap();
            assert!((animal.target_x - animal.spawn_x).abs() <= WANDER_RADIUS);
            assert!((animal.target_z - animal.spawn_z).abs() <= WANDER_RADIUS);
        }
    }

    #[test]
    fn moving_animal_lands_exactly_on_target() {
        let field = flat_field();
        let mut set = single_animal(&field);
        let mut rng = StdRng::seed_from_u64(3);

        {
            let animal = set.get_mut(0).unwrap();
            animal.state = AnimalState::Moving;
            animal.target_x = animal.x + 0.2;
            animal.target_z = animal.z;
        }

        // 0.2 < one tick's travel (0.3): snap, no overshoot.
        set.step(DT, &field, &mut rng);
        let animal = set.get(0).unwrap();
        assert_eq!(animal.x, animal.target_x);
        assert_eq!(animal.z, animal.target_z);
        assert_eq!(animal.state, AnimalState::Idle);
        assert!(animal.wait_timer >= WAIT_MIN && animal.wait_timer < WAIT_MIN + WAIT_SPAN);
    }

    #[test]
    fn moving_animal_advances_at_walk_speed_with_heading() {
        let field = flat_field();
        let mut set = single_animal(&field);
        let mut rng = StdRng::seed_from_u64(4);

        let (start_x, start_z) = {
            let animal = set.get_mut(0).unwrap();
            animal.state = AnimalState::Moving;
            animal.target_x = animal.x + 10.0;
            animal.target_z = animal.z;
            (animal.x, animal.z)
        };

        set.step(DT, &field, &mut rng);
        let animal = set.get(0).unwrap();
        // Heading atan2(dx, dz) with dz = 0 points along +x.
        assert!((animal.rotation - std::f32::consts::FRAC_PI_2).abs() < 1e-5);
        assert!((animal.x - (start_x + WALK_SPEED * DT)).abs() < 1e-4);
        assert!((animal.z - start_z).abs() < 1e-4);
        // Riding the flat terrain.
        assert_eq!(animal.y, 1.5);
    }

    #[test]
    fn only_moving_animals_are_reported() {
        let field = flat_field();
        let mut rng = StdRng::seed_from_u64(5);
        let mut set = AnimalSet::populate(3, &field, &mut rng);

        for id in 0..3 {
            set.get_mut(id).unwrap().wait_timer = 100.0;
        }
        {
            let animal = set.get_mut(1).unwrap();
            animal.state = AnimalState::Moving;
            animal.target_x = animal.x + 50.0;
        }

        let moved = set.step(DT, &field, &mut rng);
        assert_eq!(moved.len(), 1);
        assert_eq!(moved[0].id, 1);
    }
}
