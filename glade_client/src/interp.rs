//! Remote-entity interpolation.
//!
//! The relay reports discrete transforms; the client renders at its own rate
//! and eases each tracked entity toward its latest report. Interpolation
//! state is an explicit record keyed by entity id, owned here and
//! independent of any rendering scene graph.
//!
//! Yaw always takes the shortest angular path, and slope-aligned entities
//! rebuild their orientation every frame as the quaternion composition
//! tilt * yaw. Composing (rather than adding Euler angles) is what keeps
//! animals upright-looking on steep slopes.

use std::collections::HashMap;

use glade_shared::math::{wrap_angle_near, Quat, Vec3};
use glade_shared::protocol::PlayerId;
use glade_shared::world::HeightSource;

/// Fraction of the remaining distance covered per second.
const BASE_RATE: f32 = 10.0;

/// Identity of a tracked remote entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackedId {
    Player(PlayerId),
    Animal(u32),
}

/// Interpolation record for one remote entity.
#[derive(Debug, Clone)]
pub struct InterpState {
    pub position: Vec3,
    pub target_position: Vec3,
    pub yaw: f32,
    pub target_yaw: f32,
    /// Reported pitch, displayed as-is rather than eased.
    pub pitch: f32,
    /// Whether orientation follows the terrain normal.
    pub align_to_slope: bool,
}

#[derive(Debug, Default)]
pub struct Interpolator {
    entities: HashMap<TrackedId, InterpState>,
}

impl Interpolator {
    /// Records a fresh transform report. A first report snaps the entity
    /// straight to its target; later reports only move the target.
    pub fn update_target(
        &mut self,
        id: TrackedId,
        position: Vec3,
        yaw: f32,
        pitch: f32,
        align_to_slope: bool,
    ) {
        match self.entities.get_mut(&id) {
            Some(state) => {
                state.target_position = position;
                state.target_yaw = yaw;
                state.pitch = pitch;
            }
            None => {
                self.entities.insert(
                    id,
                    InterpState {
                        position,
                        target_position: position,
                        yaw,
                        target_yaw: yaw,
                        pitch,
                        align_to_slope,
                    },
                );
            }
        }
    }

    pub fn remove(&mut self, id: TrackedId) {
        self.entities.remove(&id);
    }

    pub fn clear(&mut self) {
        self.entities.clear();
    }

    pub fn get(&self, id: TrackedId) -> Option<&InterpState> {
        self.entities.get(&id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Live positions of tracked animals, in id order; the dynamic obstacle
    /// set for the local kinematics.
    pub fn animal_positions(&self) -> Vec<Vec3> {
        let mut animals: Vec<(u32, Vec3)> = self
            .entities
            .iter()
            .filter_map(|(id, state)| match id {
                TrackedId::Animal(n) => Some((*n, state.position)),
                TrackedId::Player(_) => None,
            })
            .collect();
        animals.sort_by_key(|(n, _)| *n);
        animals.into_iter().map(|(_, p)| p).collect()
    }

    /// Eases every entity toward its target. The per-frame factor caps at
    /// one, so a long frame lands exactly on the target instead of
    /// overshooting past it.
    pub fn advance(&mut self, dt: f32) {
        let t = (BASE_RATE * dt).min(1.0);
        for state in self.entities.values_mut() {
            state.position = state.position.lerp(state.target_position, t);

            let target = wrap_angle_near(state.yaw, state.target_yaw);
            state.yaw += (target - state.yaw) * t;
        }
    }

    /// Display orientation for one entity: yaw about world-up, preceded by a
    /// tilt carrying world-up onto the local surface normal when the entity
    /// aligns to slopes.
    pub fn orientation(&self, id: TrackedId, ground: Option<&dyn HeightSource>) -> Option<Quat> {
        let state = self.entities.get(&id)?;
        let yaw = Quat::from_axis_angle(Vec3::UP, state.yaw);
        if !state.align_to_slope {
            return Some(yaw);
        }
        let normal = match ground {
            Some(ground) => ground.normal_at(state.position.x, state.position.z),
            None => Vec3::UP,
        };
        let tilt = Quat::from_rotation_arc(Vec3::UP, normal);
        Some(tilt * yaw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glade_shared::terrain::HeightField;
    use std::f32::consts::PI;

    const DT: f32 = 0.016;

    fn animal(id: u32) -> TrackedId {
        TrackedId::Animal(id)
    }

    #[test]
    fn first_report_snaps_later_reports_retarget() {
        let mut interp = Interpolator::default();
        interp.update_target(animal(0), Vec3::new(5.0, 1.0, 5.0), 0.3, 0.0, true);
        let state = interp.get(animal(0)).unwrap();
        assert_eq!(state.position, Vec3::new(5.0, 1.0, 5.0));
        assert_eq!(state.yaw, 0.3);

        interp.update_target(animal(0), Vec3::new(9.0, 1.0, 5.0), 1.0, 0.0, true);
        let state = interp.get(animal(0)).unwrap();
        assert_eq!(state.position, Vec3::new(5.0, 1.0, 5.0), "no snap on update");
        assert_eq!(state.target_position, Vec3::new(9.0, 1.0, 5.0));
    }

    #[test]
    fn position_converges_to_fixed_target() {
        let mut interp = Interpolator::default();
        interp.update_target(animal(0), Vec3::ZERO, 0.0, 0.0, false);
        interp.update_target(animal(0), Vec3::new(10.0, 0.0, -4.0), 0.0, 0.0, false);

        for _ in 0..200 {
            interp.advance(DT);
        }
        let state = interp.get(animal(0)).unwrap();
        assert!((state.position - state.target_position).length() < 1e-3);
    }

    #[test]
    fn long_frame_lands_exactly_on_target() {
        let mut interp = Interpolator::default();
        interp.update_target(animal(0), Vec3::ZERO, 0.0, 0.0, false);
        interp.update_target(animal(0), Vec3::new(3.0, 0.0, 0.0), 2.0, 0.0, false);

        // dt of half a second: factor clamps to 1.
        interp.advance(0.5);
        let state = interp.get(animal(0)).unwrap();
        assert_eq!(state.position, Vec3::new(3.0, 0.0, 0.0));
        assert!((state.yaw - 2.0).abs() < 1e-5);
    }

    #[test]
    fn yaw_takes_shortest_path_through_wrap() {
        let mut interp = Interpolator::default();
        interp.update_target(animal(0), Vec3::ZERO, 3.0, 0.0, false);
        interp.update_target(animal(0), Vec3::ZERO, -3.0, 0.0, false);

        // Shortest path from 3.0 to -3.0 goes forward through pi, so yaw
        // must increase, never swing back through zero.
        let mut prev = 3.0f32;
        for _ in 0..100 {
            interp.advance(DT);
            let yaw = interp.get(animal(0)).unwrap().yaw;
            assert!(yaw >= prev - 1e-6);
            assert!((yaw - prev).abs() <= PI + 1e-6);
            prev = yaw;
        }
        // Converged to -3.0 modulo a full turn.
        let diff = (prev - (2.0 * PI - 3.0)).abs();
        assert!(diff < 1e-2, "yaw settled at {prev}");
    }

    #[test]
    fn angular_error_tends_to_zero() {
        let mut interp = Interpolator::default();
        interp.update_target(animal(0), Vec3::ZERO, -2.9, 0.0, false);
        interp.update_target(animal(0), Vec3::ZERO, 3.1, 0.0, false);

        for _ in 0..400 {
            interp.advance(DT);
        }
        let yaw = interp.get(animal(0)).unwrap().yaw;
        let err = (yaw - 3.1).rem_euclid(2.0 * PI);
        let err = err.min(2.0 * PI - err);
        assert!(err < 1e-2);
    }

    #[test]
    fn flat_ground_orientation_is_pure_yaw() {
        let field = HeightField::from_samples(vec![vec![0.0; 5]; 5], 4, 40.0);
        let mut interp = Interpolator::default();
        interp.update_target(animal(0), Vec3::ZERO, 1.2, 0.0, true);

        let q = interp.orientation(animal(0), Some(&field)).unwrap();
        let expected = Quat::from_axis_angle(Vec3::UP, 1.2);
        assert!((q.x - expected.x).abs() < 1e-5);
        assert!((q.y - expected.y).abs() < 1e-5);
        assert!((q.z - expected.z).abs() < 1e-5);
        assert!((q.w - expected.w).abs() < 1e-5);
    }

    #[test]
    fn sloped_orientation_carries_up_onto_the_normal() {
        // Uniform ramp along x.
        let samples: Vec<Vec<f32>> = (0..=4).map(|x| vec![x as f32 * 4.0; 5]).collect();
        let field = HeightField::from_samples(samples, 4, 40.0);
        let mut interp = Interpolator::default();
        interp.update_target(animal(0), Vec3::new(0.0, 0.0, 0.0), 2.4, 0.0, true);

        let q = interp.orientation(animal(0), Some(&field)).unwrap();
        let normal = field.normal_at(0.0, 0.0);
        // tilt * yaw applied to world-up ignores the yaw factor and lands on
        // the surface normal.
        let up = q.rotate(Vec3::UP);
        assert!((up.x - normal.x).abs() < 1e-4);
        assert!((up.y - normal.y).abs() < 1e-4);
        assert!((up.z - normal.z).abs() < 1e-4);
    }

    #[test]
    fn players_never_tilt() {
        let samples: Vec<Vec<f32>> = (0..=4).map(|x| vec![x as f32 * 4.0; 5]).collect();
        let field = HeightField::from_samples(samples, 4, 40.0);
        let mut interp = Interpolator::default();
        let id = TrackedId::Player(PlayerId(1));
        interp.update_target(id, Vec3::ZERO, 0.7, 0.1, false);

        let q = interp.orientation(id, Some(&field)).unwrap();
        let expected = Quat::from_axis_angle(Vec3::UP, 0.7);
        assert_eq!(q, expected);
    }

    #[test]
    fn animal_positions_excludes_players() {
        let mut interp = Interpolator::default();
        interp.update_target(TrackedId::Player(PlayerId(1)), Vec3::ZERO, 0.0, 0.0, false);
        interp.update_target(animal(7), Vec3::new(1.0, 0.0, 1.0), 0.0, 0.0, true);
        let positions = interp.animal_positions();
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0], Vec3::new(1.0, 0.0, 1.0));
    }
}
