//! Seeded 1D value noise
//!
//! A fixed table of uniform randoms, interpolated with a cubic smoothstep
//! between neighbouring integer lattice points. Output is remapped to [-1, 1].

use rand::Rng;

/// Number of lattice values (must be a power of two)
pub const NOISE_TABLE_SIZE: usize = 256;
const NOISE_TABLE_MASK: i64 = NOISE_TABLE_SIZE as i64 - 1;

#[derive(Debug, Clone)]
pub struct NoiseSource {
    table: [f32; NOISE_TABLE_SIZE],
}

impl NoiseSource {
    /// Draw a fresh lattice from `rng`
    pub fn new<R: Rng>(rng: &mut R) -> Self {
        let mut table = [0.0; NOISE_TABLE_SIZE];
        for value in table.iter_mut() {
            *value = rng.random::<f32>();
        }
        Self { table }
    }

    /// Redraw the lattice, discarding the old one
    pub fn configure<R: Rng>(&mut self, rng: &mut R) {
        *self = Self::new(rng);
    }

    /// Smoothed noise at `x`, in [-1, 1]
    pub fn sample(&self, x: f32) -> f32 {
        let x_floor = x.floor();
        let t = x - x_floor;
        let blend = t * t * (3.0 - 2.0 * t);

        let lo = (x_floor as i64 & NOISE_TABLE_MASK) as usize;
        let hi = (lo + 1) & NOISE_TABLE_MASK as usize;

        let value = self.table[lo] * (1.0 - blend) + self.table[hi] * blend;
        value * 2.0 - 1.0
    }
}
