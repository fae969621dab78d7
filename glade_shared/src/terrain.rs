//! Terrain generation and sampling.
//!
//! The relay generates one height field per open-terrain room and ships the
//! raw grid to clients, so both sides sample elevation through the same
//! bilinear code path. Placement on the server and terrain-follow on the
//! client must agree exactly; any drift between the two shows up as floating
//! trees and sunken animals.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::math::Vec3;

/// Offset used for the central-difference normal, in world units.
const NORMAL_EPSILON: f32 = 0.5;

/// Square grid of sampled elevations, `grid_size + 1` samples per side,
/// centered on the world origin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeightField {
    samples: Vec<Vec<f32>>,
    grid_size: usize,
    world_size: f32,
}

impl HeightField {
    /// Wraps an existing sample grid. `samples` is indexed `[x][z]` and must
    /// be `(grid_size + 1) x (grid_size + 1)`.
    pub fn from_samples(samples: Vec<Vec<f32>>, grid_size: usize, world_size: f32) -> Self {
        debug_assert_eq!(samples.len(), grid_size + 1);
        Self {
            samples,
            grid_size,
            world_size,
        }
    }

    pub fn grid_size(&self) -> usize {
        self.grid_size
    }

    pub fn world_size(&self) -> f32 {
        self.world_size
    }

    pub fn samples(&self) -> &Vec<Vec<f32>> {
        &self.samples
    }

    /// Bilinear elevation at world coordinates. Out-of-range queries clamp to
    /// the grid edge; they never error.
    pub fn height_at(&self, x: f32, z: f32) -> f32 {
        let size = self.grid_size as f32;
        let half = self.world_size / 2.0;
        let segment = self.world_size / size;

        let gx = ((x + half) / segment).clamp(0.0, size - 0.001);
        let gz = ((z + half) / segment).clamp(0.0, size - 0.001);

        let x0 = gx as usize;
        let z0 = gz as usize;
        let x1 = (x0 + 1).min(self.grid_size);
        let z1 = (z0 + 1).min(self.grid_size);

        let tx = gx - x0 as f32;
        let tz = gz - z0 as f32;

        let h00 = self.samples[x0][z0];
        let h10 = self.samples[x1][z0];
        let h01 = self.samples[x0][z1];
        let h11 = self.samples[x1][z1];

        let h0 = h00 * (1.0 - tx) + h10 * tx;
        let h1 = h01 * (1.0 - tx) + h11 * tx;

        h0 * (1.0 - tz) + h1 * tz
    }

    /// Surface normal from central differences. Used for slope-aware entity
    /// orientation only, never for collision response.
    pub fn normal_at(&self, x: f32, z: f32) -> Vec3 {
        let e = NORMAL_EPSILON;
        let h_l = self.height_at(x - e, z);
        let h_r = self.height_at(x + e, z);
        let h_d = self.height_at(x, z + e);
        let h_u = self.height_at(x, z - e);

        let tangent_x = Vec3::new(2.0 * e, h_r - h_l, 0.0);
        let tangent_z = Vec3::new(0.0, h_d - h_u, 2.0 * e);

        tangent_z.cross(tangent_x).normalize_or_up()
    }
}

/// Coherent-noise terrain generator.
///
/// Each call to [`generate`](Self::generate) draws a fresh seed, so repeated
/// generations differ. Reproducible worlds are a product decision that has
/// not been made; do not thread a fixed seed through without one.
#[derive(Debug, Clone, Copy)]
pub struct TerrainGenerator {
    pub frequency: f32,
    pub amplitude: f32,
}

impl Default for TerrainGenerator {
    fn default() -> Self {
        Self {
            frequency: 0.05,
            amplitude: 60.0,
        }
    }
}

impl TerrainGenerator {
    pub fn generate(&self, grid_size: usize, world_size: f32, rng: &mut impl Rng) -> HeightField {
        let seed: u64 = rng.gen();
        let mut samples = Vec::with_capacity(grid_size + 1);
        for x in 0..=grid_size {
            let mut row = Vec::with_capacity(grid_size + 1);
            for z in 0..=grid_size {
                let val = perlin_2d(
                    x as f32 * self.frequency,
                    z as f32 * self.frequency,
                    seed,
                );
                row.push(val * self.amplitude);
            }
            samples.push(row);
        }
        HeightField::from_samples(samples, grid_size, world_size)
    }
}

// ─── Gradient noise ───

fn hash_2d(x: i32, z: i32, seed: u64) -> u64 {
    let mut h = seed;
    h = h.wrapping_add(x as u64).wrapping_mul(6364136223846793005);
    h = h.wrapping_add(z as u64).wrapping_mul(6364136223846793005);
    h ^= h >> 33;
    h = h.wrapping_mul(0xff51afd7ed558ccd);
    h ^= h >> 33;
    h
}

fn grad_dot(hash: u64, fx: f32, fz: f32) -> f32 {
    match hash & 3 {
        0 => fx + fz,
        1 => -fx + fz,
        2 => fx - fz,
        _ => -fx - fz,
    }
}

fn perlin_2d(x: f32, z: f32, seed: u64) -> f32 {
    let x0 = x.floor() as i32;
    let z0 = z.floor() as i32;
    let fx = x - x0 as f32;
    let fz = z - z0 as f32;

    // Smoothstep fade.
    let u = fx * fx * (3.0 - 2.0 * fx);
    let v = fz * fz * (3.0 - 2.0 * fz);

    let n00 = grad_dot(hash_2d(x0, z0, seed), fx, fz);
    let n10 = grad_dot(hash_2d(x0 + 1, z0, seed), fx - 1.0, fz);
    let n01 = grad_dot(hash_2d(x0, z0 + 1, seed), fx, fz - 1.0);
    let n11 = grad_dot(hash_2d(x0 + 1, z0 + 1, seed), fx - 1.0, fz - 1.0);

    let nx0 = n00 + u * (n10 - n00);
    let nx1 = n01 + u * (n11 - n01);
    nx0 + v * (nx1 - nx0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_field(height: f32) -> HeightField {
        let samples = vec![vec![height; 5]; 5];
        HeightField::from_samples(samples, 4, 40.0)
    }

    fn ramp_field() -> HeightField {
        // Height equals the x grid index: a uniform slope along x.
        let samples: Vec<Vec<f32>> = (0..=4).map(|x| vec![x as f32; 5]).collect();
        HeightField::from_samples(samples, 4, 40.0)
    }

    #[test]
    fn exact_sample_at_grid_points() {
        let mut samples = vec![vec![0.0f32; 5]; 5];
        samples[2][3] = 7.25;
        let field = HeightField::from_samples(samples, 4, 40.0);
        // Grid point (2, 3) sits at world (-20 + 2*10, -20 + 3*10).
        assert_eq!(field.height_at(0.0, 10.0), 7.25);
    }

    #[test]
    fn continuous_across_cell_boundary() {
        let field = ramp_field();
        let eps = 1e-3;
        // World x = 0.0 is the boundary between cells 1 and 2.
        let left = field.height_at(-eps, 0.0);
        let right = field.height_at(eps, 0.0);
        assert!((left - right).abs() < 1e-2, "left={left} right={right}");
    }

    #[test]
    fn out_of_range_clamps_to_edge() {
        let field = ramp_field();
        let edge = field.height_at(20.0, 0.0);
        let beyond = field.height_at(500.0, 0.0);
        assert!((edge - beyond).abs() < 1e-2);

        let far_corner = field.height_at(-10_000.0, -10_000.0);
        assert!(far_corner.is_finite());
    }

    #[test]
    fn bilinear_midpoint_of_cell() {
        let mut samples = vec![vec![0.0f32; 5]; 5];
        samples[0][0] = 4.0;
        let field = HeightField::from_samples(samples, 4, 40.0);
        // Center of the first cell averages its four corners.
        assert!((field.height_at(-15.0, -15.0) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn flat_field_normal_is_up() {
        let field = flat_field(3.0);
        let n = field.normal_at(1.0, -2.0);
        assert!((n.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn ramp_normal_leans_against_slope() {
        let field = ramp_field();
        let n = field.normal_at(0.0, 0.0);
        // Height rises with +x, so the normal tips toward -x.
        assert!(n.x < 0.0);
        assert!(n.y > 0.0);
    }

    #[test]
    fn generate_produces_finite_grid() {
        let gen = TerrainGenerator::default();
        let field = gen.generate(16, 160.0, &mut rand::thread_rng());
        assert_eq!(field.samples().len(), 17);
        for row in field.samples() {
            assert_eq!(row.len(), 17);
            assert!(row.iter().all(|h| h.is_finite()));
        }
        assert!(field
            .samples()
            .iter()
            .flatten()
            .all(|h| h.abs() <= gen.amplitude * 1.5));
    }
}
