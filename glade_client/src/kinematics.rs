//! Local player kinematics.
//!
//! Runs once per rendered frame with the wall-clock delta. The model is
//! deliberately game-y rather than physical: exponential friction, constant
//! gravity, view-relative acceleration, circle push-out collision, and a
//! ground snap that keeps the viewpoint riding the terrain. The result is
//! what gets self-reported to the relay; nothing here is validated
//! server-side.

use glade_shared::math::Vec3;
use glade_shared::world::HeightSource;

use crate::input::InputState;

/// Extra snap band above the strict ground threshold. With downward or zero
/// vertical velocity inside this band the viewpoint sticks to the ground,
/// which stops hop oscillation on noisy terrain.
const NEAR_GROUND_SNAP: f32 = 1.0;
/// Push-out is skipped below this separation to avoid dividing by ~zero.
const MIN_SEPARATION: f32 = 0.001;

#[derive(Debug, Clone, Copy)]
pub struct KinematicConfig {
    pub gravity: f32,
    pub jump_impulse: f32,
    /// Horizontal acceleration from directional input.
    pub accel: f32,
    pub friction: f32,
    /// Viewpoint height above the ground surface.
    pub eye_height: f32,
    pub player_radius: f32,
}

impl Default for KinematicConfig {
    fn default() -> Self {
        Self {
            gravity: 100.0,
            jump_impulse: 30.0,
            accel: 400.0,
            friction: 10.0,
            eye_height: 2.0,
            player_radius: 1.0,
        }
    }
}

/// A static circular obstacle on the XZ plane.
#[derive(Debug, Clone, Copy)]
pub struct Obstacle {
    pub x: f32,
    pub z: f32,
    pub radius: f32,
}

/// Per-frame integrator for the locally controlled viewpoint.
#[derive(Debug)]
pub struct KinematicModel {
    pub position: Vec3,
    pub velocity: Vec3,
    pub grounded: bool,
    cfg: KinematicConfig,
    statics: Vec<Obstacle>,
}

impl KinematicModel {
    pub fn new(cfg: KinematicConfig) -> Self {
        Self {
            position: Vec3::new(0.0, cfg.eye_height, 0.0),
            velocity: Vec3::ZERO,
            grounded: false,
            cfg,
            statics: Vec::new(),
        }
    }

    pub fn config(&self) -> &KinematicConfig {
        &self.cfg
    }

    pub fn set_statics(&mut self, obstacles: Vec<Obstacle>) {
        self.statics = obstacles;
    }

    /// Hard position set (respawn); velocity is left alone, the next ground
    /// snap absorbs any leftover fall speed.
    pub fn teleport(&mut self, x: f32, y: f32, z: f32) {
        self.position = Vec3::new(x, y, z);
    }

    /// Advances one frame.
    ///
    /// `dynamics` are the live positions of tracked mobile entities, all
    /// sharing `dynamic_radius`. `ground` is whatever the current world
    /// stands on; with no world yet, vertical motion still integrates but
    /// nothing snaps.
    pub fn step(
        &mut self,
        dt: f32,
        input: &mut InputState,
        yaw: f32,
        dynamics: &[Vec3],
        dynamic_radius: f32,
        ground: Option<&dyn HeightSource>,
    ) {
        // Exponential decay of horizontal velocity.
        self.velocity.x -= self.velocity.x * self.cfg.friction * dt;
        self.velocity.z -= self.velocity.z * self.cfg.friction * dt;

        self.velocity.y -= self.cfg.gravity * dt;

        let (ix, iz) = input.direction();
        if ix != 0.0 || iz != 0.0 {
            self.velocity.z -= iz * self.cfg.accel * dt;
            self.velocity.x -= ix * self.cfg.accel * dt;
        }

        // Horizontal displacement happens in view-relative space; vertical
        // displacement below is in world space.
        self.displace_view_relative(yaw, -self.velocity.x * dt, -self.velocity.z * dt);

        for obstacle in &self.statics {
            Self::push_out(
                &mut self.position,
                obstacle.x,
                obstacle.z,
                self.cfg.player_radius + obstacle.radius,
            );
        }
        for entity in dynamics {
            Self::push_out(
                &mut self.position,
                entity.x,
                entity.z,
                self.cfg.player_radius + dynamic_radius,
            );
        }

        self.position.y += self.velocity.y * dt;

        if let Some(ground) = ground {
            self.follow_ground(ground, input);
        }
    }

    /// Moves on the XZ plane along the view's right and forward axes.
    fn displace_view_relative(&mut self, yaw: f32, right_amount: f32, forward_amount: f32) {
        let (sin, cos) = yaw.sin_cos();
        // Right is (cos, -sin), forward is (-sin, -cos): looking down -z at
        // zero yaw.
        self.position.x += cos * right_amount - sin * forward_amount;
        self.position.z += -sin * right_amount - cos * forward_amount;
    }

    fn push_out(position: &mut Vec3, ox: f32, oz: f32, min_dist: f32) {
        let dx = position.x - ox;
        let dz = position.z - oz;
        let dist = (dx * dx + dz * dz).sqrt();
        if dist < min_dist && dist > MIN_SEPARATION {
            let overlap = min_dist - dist;
            position.x += dx / dist * overlap;
            position.z += dz / dist * overlap;
        }
    }

    fn follow_ground(&mut self, ground: &dyn HeightSource, input: &mut InputState) {
        let floor = ground.height_at(self.position.x, self.position.z) + self.cfg.eye_height;

        if self.position.y < floor {
            // Below the surface: snap up.
            self.velocity.y = 0.0;
            self.position.y = floor;
            self.land(input);
        } else if self.velocity.y <= 0.0 && self.position.y < floor + NEAR_GROUND_SNAP {
            // Descending within the snap band: stick to the ground.
            self.velocity.y = 0.0;
            self.position.y = floor;
            self.land(input);
        } else {
            self.grounded = false;
        }
    }

    fn land(&mut self, input: &mut InputState) {
        self.grounded = true;
        if input.jump {
            self.velocity.y = self.cfg.jump_impulse;
            self.grounded = false;
            input.jump = false;
        }
    }
}
