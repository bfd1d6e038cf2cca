//! Procedural cave surfaces
//!
//! The cave midline follows a lazily grown path of junctures: waypoints
//! produced by a bounded random walk that always advances in x. The walls
//! sit half an aperture above and below that path, roughened by layered
//! noise. Nothing is materialized ahead of the query frontier, so the cave
//! extends forever to the right at O(1) amortized cost per new meter.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::noise::NoiseSource;
use crate::config::CaveConfig;
use crate::{mix, smoothstep};

/// Offset into the noise lattice used by the aperture modulation, so it
/// does not correlate with the wall roughness.
const APERTURE_NOISE_OFFSET: f32 = 128.0;

#[derive(Debug, Clone)]
pub struct CaveGenerator {
    seed: u64,
    config: CaveConfig,
    noise: NoiseSource,
    rng: Pcg32,
    /// Strictly increasing in x, append-only
    junctures: Vec<Vec2>,
}

impl CaveGenerator {
    pub fn new(seed: u64, config: CaveConfig) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let noise = NoiseSource::new(&mut rng);
        let junctures = vec![
            Vec2::new(-config.bootstrap_x, config.bootstrap_y),
            Vec2::new(config.bootstrap_x, config.bootstrap_y),
        ];

        Self {
            seed,
            config,
            noise,
            rng,
            junctures,
        }
    }

    /// Throw away the current cave and start a new one from `seed`
    pub fn regenerate(&mut self, seed: u64) {
        log::debug!(
            "Regenerating cave: seed {} -> {} ({} junctures dropped)",
            self.seed,
            seed,
            self.junctures.len()
        );
        *self = Self::new(seed, self.config.clone());
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn junctures(&self) -> &[Vec2] {
        &self.junctures
    }

    /// Rightmost x the path is currently generated to
    pub fn frontier_x(&self) -> f32 {
        self.junctures.last().map_or(f32::NEG_INFINITY, |j| j.x)
    }

    /// Height of the cave ceiling at `x`
    pub fn top_surface_y(&mut self, x: f32) -> f32 {
        self.path_y(x) + self.aperture_height(x) / 2.0 + self.surface_noise(x)
    }

    /// Height of the cave floor at `x`
    pub fn bottom_surface_y(&mut self, x: f32) -> f32 {
        self.top_surface_y(x) - self.aperture_height(x)
    }

    /// Both walls at `x` as `(top, bottom)`
    pub fn surfaces_at(&mut self, x: f32) -> (f32, f32) {
        let top = self.top_surface_y(x);
        (top, top - self.aperture_height(x))
    }

    /// Vertical gap between the walls at `x`, always within
    /// `[min_aperture, max_aperture]`
    pub fn aperture_height(&self, x: f32) -> f32 {
        let cfg = &self.config;
        let phase = x / cfg.aperture_period * std::f32::consts::TAU;
        let wobble = self
            .noise
            .sample(x * cfg.aperture_noise_scale + APERTURE_NOISE_OFFSET)
            * cfg.aperture_noise_strength;
        let ratio = smoothstep(-1.0, 1.0, phase.cos() + wobble);

        mix(cfg.min_aperture, cfg.max_aperture, ratio)
    }

    /// Midline height at `x`, interpolated between the surrounding junctures
    pub fn path_y(&mut self, x: f32) -> f32 {
        let first_x = self.junctures[0].x;
        assert!(
            x >= first_x,
            "cave queried at x = {x}, before the first juncture at x = {first_x}"
        );

        while self.frontier_x() < x {
            self.push_juncture();
        }

        // Walk backward: queries cluster near the frontier
        let mut prior_index = 0;
        for (i, juncture) in self.junctures.iter().enumerate().rev() {
            if juncture.x <= x {
                prior_index = i;
                break;
            }
        }

        let prior = self.junctures[prior_index];
        let Some(&following) = self.junctures.get(prior_index + 1) else {
            // x sits exactly on the frontier juncture
            return prior.y;
        };

        let proportion = (x - prior.x) / (following.x - prior.x);
        prior.y + (following.y - prior.y) * proportion
    }

    /// Wall roughness: a squared low-frequency swell that gets rougher in
    /// tight passages, plus two finer, smaller layers.
    fn surface_noise(&self, x: f32) -> f32 {
        let cfg = &self.config;
        let span = cfg.max_aperture - cfg.min_aperture;
        let tightness = if span > 0.0 {
            1.0 - (self.aperture_height(x) - cfg.min_aperture) / span
        } else {
            1.0
        };
        let swell = mix(cfg.roughness_wide, cfg.roughness_narrow, tightness);

        self.noise.sample(x / 3.0).powi(2) * swell
            + self.noise.sample(x * 2.0) / 2.5
            + self.noise.sample(x * 8.0) / 7.0
    }

    /// Random-walk one step from the last juncture. The step angle stays
    /// within the configured bound of horizontal, so x always advances.
    fn push_juncture(&mut self) {
        let cfg = &self.config;
        let last = self.junctures[self.junctures.len() - 1];
        let length = self.rng.random_range(cfg.juncture_min_step..cfg.juncture_max_step);
        let angle = self
            .rng
            .random_range(-cfg.juncture_max_angle..cfg.juncture_max_angle);
        let next = last + Vec2::from_angle(angle) * length;

        assert!(next.x > last.x, "juncture walk stalled at x = {}", last.x);
        log::trace!("New juncture #{} at ({:.2}, {:.2})", self.junctures.len(), next.x, next.y);
        self.junctures.push(next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn generator(seed: u64) -> CaveGenerator {
        CaveGenerator::new(seed, CaveConfig::default())
    }

    #[test]
    fn test_bootstrap_junctures() {
        let cave = generator(1);
        assert_eq!(cave.junctures(), &[Vec2::new(-100.0, 5.0), Vec2::new(100.0, 5.0)]);
        assert_eq!(cave.frontier_x(), 100.0);
    }

    #[test]
    fn test_path_is_flat_between_bootstrap_junctures() {
        let mut cave = generator(1);
        for x in [-100.0, -12.5, 0.0, 64.0, 100.0] {
            assert!((cave.path_y(x) - 5.0).abs() < 1e-5);
        }
        assert_eq!(cave.junctures().len(), 2);
    }

    #[test]
    fn test_queries_past_frontier_grow_path() {
        let mut cave = generator(9);
        cave.top_surface_y(1000.0);
        assert!(cave.frontier_x() >= 1000.0);
        // At least (1000 - 100) / max step new junctures
        assert!(cave.junctures().len() >= 2 + 36);

        let count = cave.junctures().len();
        cave.top_surface_y(500.0);
        assert_eq!(cave.junctures().len(), count, "backward query must not generate");
    }

    #[test]
    fn test_junctures_respect_walk_bounds() {
        let mut cave = generator(5);
        cave.path_y(2000.0);
        let cfg = CaveConfig::default();
        for pair in cave.junctures()[1..].windows(2) {
            let step = pair[1] - pair[0];
            assert!(step.x > 0.0);
            assert!(step.length() >= cfg.juncture_min_step - 1e-3);
            assert!(step.length() <= cfg.juncture_max_step + 1e-3);
            assert!(step.y.abs() <= step.x + 1e-3, "step steeper than 45 degrees");
        }
    }

    #[test]
    fn test_bottom_is_top_minus_aperture() {
        let mut cave = generator(2);
        for i in 0..200 {
            let x = i as f32 * 1.7;
            let top = cave.top_surface_y(x);
            let bottom = cave.bottom_surface_y(x);
            assert!((top - bottom - cave.aperture_height(x)).abs() < 1e-4);
            assert_eq!(cave.surfaces_at(x), (top, bottom));
        }
    }

    #[test]
    fn test_determinism_given_seed() {
        let mut a = generator(1234);
        let mut b = generator(1234);
        let queries = [3.0, 50.0, 49.0, 250.0, 612.5, 100.0, 1300.25];
        for &x in &queries {
            assert_eq!(a.top_surface_y(x), b.top_surface_y(x));
            assert_eq!(a.bottom_surface_y(x), b.bottom_surface_y(x));
        }
        assert_eq!(a.junctures(), b.junctures());
    }

    #[test]
    fn test_query_order_does_not_change_shape() {
        let mut jumpy = generator(77);
        let mut steady = generator(77);
        let far = jumpy.top_surface_y(900.0);
        for i in 0..900 {
            steady.top_surface_y(i as f32);
        }
        assert_eq!(steady.top_surface_y(900.0), far);
    }

    #[test]
    fn test_different_seeds_differ() {
        let mut a = generator(1);
        let mut b = generator(2);
        let differs = (0..50).any(|i| {
            let x = i as f32 * 10.0;
            a.top_surface_y(x) != b.top_surface_y(x)
        });
        assert!(differs);
    }

    #[test]
    fn test_regenerate_resets_junctures() {
        let mut cave = generator(3);
        cave.top_surface_y(800.0);
        cave.regenerate(4);
        assert_eq!(cave.seed(), 4);
        assert_eq!(cave.junctures().len(), 2);
        let mut fresh = generator(4);
        assert_eq!(cave.top_surface_y(300.0), fresh.top_surface_y(300.0));
    }

    #[test]
    fn test_continuity_across_junctures() {
        let mut cave = generator(42);
        cave.path_y(400.0);
        let crossings: Vec<f32> = cave.junctures()[1..6].iter().map(|j| j.x).collect();
        for jx in crossings {
            let mut x = jx - 0.5;
            let mut prev = cave.top_surface_y(x);
            while x < jx + 0.5 {
                x += 0.001;
                let next = cave.top_surface_y(x);
                assert!((next - prev).abs() < 0.1, "jump of {} at x = {x}", next - prev);
                prev = next;
            }
        }
    }

    #[test]
    #[should_panic(expected = "before the first juncture")]
    fn test_query_below_bootstrap_panics() {
        generator(1).top_surface_y(-150.0);
    }

    proptest! {
        #[test]
        fn prop_aperture_bounded(seed in any::<u64>(), x in -100.0f32..5000.0) {
            let cave = generator(seed);
            let aperture = cave.aperture_height(x);
            prop_assert!(aperture >= MIN_APERTURE_BOUND - 1e-4 && aperture <= MAX_APERTURE_BOUND + 1e-4);
        }

        #[test]
        fn prop_junctures_strictly_increasing(seed in any::<u64>(), steps in prop::collection::vec(0.0f32..60.0, 1..40)) {
            let mut cave = generator(seed);
            let mut x = 0.0;
            let mut last_len = cave.junctures().len();
            for step in steps {
                x += step;
                cave.bottom_surface_y(x);
                prop_assert!(cave.junctures().len() >= last_len);
                last_len = cave.junctures().len();
                prop_assert!(cave.frontier_x() >= x);
            }
            prop_assert!(cave.junctures().windows(2).all(|w| w[0].x < w[1].x));
        }

        #[test]
        fn prop_walls_never_cross(seed in any::<u64>(), x in 0.0f32..3000.0) {
            let mut cave = generator(seed);
            let (top, bottom) = cave.surfaces_at(x);
            prop_assert!(top - bottom >= MIN_APERTURE_BOUND - 1e-3);
        }
    }

    const MIN_APERTURE_BOUND: f32 = crate::consts::MIN_APERTURE;
    const MAX_APERTURE_BOUND: f32 = crate::consts::MAX_APERTURE;
}
