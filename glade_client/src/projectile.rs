//! View-only projectiles.
//!
//! Shots are pure visualization: a tracer spawned locally from a shoot
//! event, advanced each frame, and culled once it flies far enough out.
//! Hit arbitration happens through `Hit` events, never through these.

use glade_shared::math::Vec3;

pub const PROJECTILE_SPEED: f32 = 50.0;
/// Tracers start this far in front of the muzzle.
const FORWARD_OFFSET: f32 = 2.0;
/// Tracers past this distance from the world origin are dropped.
const CULL_DISTANCE: f32 = 2000.0;

/// Aim direction for a yaw/pitch pair, looking down -z at zero.
pub fn direction_from_view(yaw: f32, pitch: f32) -> Vec3 {
    let (sy, cy) = yaw.sin_cos();
    let (sp, cp) = pitch.sin_cos();
    Vec3::new(-sy * cp, sp, -cy * cp)
}

#[derive(Debug, Clone, Copy)]
pub struct Projectile {
    pub position: Vec3,
    velocity: Vec3,
}

#[derive(Debug, Default)]
pub struct ProjectileSet {
    projectiles: Vec<Projectile>,
}

impl ProjectileSet {
    /// Spawns a tracer from a viewpoint.
    pub fn spawn_from_view(&mut self, origin: Vec3, yaw: f32, pitch: f32) {
        let dir = direction_from_view(yaw, pitch);
        self.projectiles.push(Projectile {
            position: origin + dir * FORWARD_OFFSET,
            velocity: dir * PROJECTILE_SPEED,
        });
    }

    /// Advances all tracers and culls the ones that flew away.
    pub fn advance(&mut self, dt: f32) {
        for p in &mut self.projectiles {
            p.position = p.position + p.velocity * dt;
        }
        self.projectiles
            .retain(|p| p.position.length() <= CULL_DISTANCE);
    }

    pub fn len(&self) -> usize {
        self.projectiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projectiles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Projectile> {
        self.projectiles.iter()
    }

    pub fn clear(&mut self) {
        self.projectiles.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_view_aims_forward() {
        let dir = direction_from_view(0.0, 0.0);
        assert!((dir.x).abs() < 1e-6);
        assert!((dir.y).abs() < 1e-6);
        assert!((dir.z - -1.0).abs() < 1e-6);
    }

    #[test]
    fn pitch_up_lifts_the_aim() {
        let dir = direction_from_view(0.0, 0.5);
        assert!(dir.y > 0.0);
        assert!((dir.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn tracer_travels_at_fixed_speed() {
        let mut set = ProjectileSet::default();
        set.spawn_from_view(Vec3::ZERO, 0.0, 0.0);
        set.advance(1.0);
        let p = set.iter().next().unwrap();
        // Offset 2 plus one second of travel.
        assert!((p.position.z - -(FORWARD_OFFSET + PROJECTILE_SPEED)).abs() < 1e-4);
    }

    #[test]
    fn distant_tracers_are_culled() {
        let mut set = ProjectileSet::default();
        set.spawn_from_view(Vec3::ZERO, 0.0, 0.0);
        for _ in 0..50 {
            set.advance(1.0);
        }
        assert!(set.is_empty());
    }
}
