//! Undergame - a worm flying through an endless procedural cave
//!
//! Core modules:
//! - `sim`: Deterministic simulation (cave generation, physics, events, transients)
//! - `projection`: Render-facing snapshot of the simulation
//! - `audio`: Named sound cues fired at event-handling sites
//! - `config`: Data-driven game tuning
//! - `platform`: Browser shell bindings
//!
//! All world-space quantities are meters; the renderer boundary converts
//! through `pixels_per_meter`.

pub mod audio;
pub mod config;
pub mod platform;
pub mod projection;
pub mod sim;

pub use audio::SoundCue;
pub use config::{CaveConfig, ConfigError, GameConfig};
pub use projection::{FrameUniforms, RenderProjection};
pub use sim::Simulation;

/// Game configuration constants (defaults for [`GameConfig`])
pub mod consts {
    /// Display refresh step used by the native runner and tests
    pub const FRAME_DT: f32 = 1.0 / 60.0;

    /// World to screen scale
    pub const PIXELS_PER_METER: f32 = 50.0;
    /// Horizontal pixel spacing between cave height samples
    pub const CAVE_SAMPLE_STRIDE: u32 = 4;
    /// Length of the worm Y-history ring buffer (one slot per pixel column)
    pub const Y_HISTORY_LENGTH: usize = 5000;
    /// World-space spacing between trailing worm segments
    pub const WORM_BLOCK_SPACING: f32 = 0.8;
    /// Head plus trailing segments
    pub const WORM_SEGMENT_COUNT: usize = 6;

    /// Points earned per second just for staying alive
    pub const BASE_POINTS_PER_SEC: f32 = 3.0;

    /// Worm body
    pub const WORM_MASS: f32 = 40.0;
    pub const WORM_VELOCITY_CAP: (f32, f32) = (6.5, 10.0);
    pub const WORM_COLLISION_SIZE: (f32, f32) = (0.4, 0.4); // meters
    pub const WORM_COLLISION_SAMPLES: usize = 3;

    /// Newtonian gravity constants (force = G * M * m / R²)
    pub const GRAVITY_CONSTANT: f32 = 6.673e-11;
    pub const EARTH_MASS: f32 = 5.98e24;
    pub const EARTH_RADIUS: f32 = 6.38e6;

    /// Thrust forces (newtons)
    pub const FORWARD_THRUST: f32 = 100.0;
    pub const ASCEND_THRUST: f32 = 1000.0;
    /// Gravity and ascend thrust ramp in over this many game-seconds
    pub const INTRO_RAMP_SECS: f32 = 2.5;

    /// Camera follows a point this far ahead of the worm
    pub const CAMERA_LEAD: f32 = 5.0;
    /// Exponential smoothing divisor applied per tick
    pub const CAMERA_SMOOTHING: f32 = 10.0;

    /// Transient durations (seconds)
    pub const DYING_DURATION: f32 = 1.5;
    pub const RESET_TRANSITION_DURATION: f32 = 1.5;
    /// Deferred action delays (seconds of host time)
    pub const CAVE_REGEN_DELAY: f64 = 0.4;
    pub const CAVE_SHUT_CUE_DELAY: f64 = 1.15;
    pub const CAVE_OPEN_CUE_DELAY: f64 = 1.0;

    /// Point zone half-height grows from min to max over the growth time
    pub const POINT_ZONE_MIN_HEIGHT: f32 = 1.5;
    pub const POINT_ZONE_MAX_HEIGHT: f32 = 2.5;
    pub const POINT_ZONE_GROWTH_SECS: f32 = 3.0;
    /// Zone intensity rises to 1 over this many seconds in zone
    pub const ZONE_INTENSITY_RISE_SECS: f32 = 3.0;
    /// Zone intensity lost per second out of zone
    pub const ZONE_INTENSITY_DECAY_RATE: f32 = 1.0;

    /// Cave shape
    pub const MIN_APERTURE: f32 = 4.0;
    pub const MAX_APERTURE: f32 = 8.5;
    pub const APERTURE_PERIOD: f32 = 60.0;
    pub const JUNCTURE_MIN_STEP: f32 = 5.0;
    pub const JUNCTURE_MAX_STEP: f32 = 25.0;
    pub const JUNCTURE_MAX_ANGLE: f32 = std::f32::consts::FRAC_PI_4;
    pub const BOOTSTRAP_JUNCTURE_X: f32 = 100.0;
    pub const BOOTSTRAP_JUNCTURE_Y: f32 = 5.0;
}

/// Hermite interpolation of `value` between `edge0` and `edge1`, clamped to [0, 1]
#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, value: f32) -> f32 {
    let t = ((value - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Linear blend from `x` to `y` by `a`
#[inline]
pub fn mix(x: f32, y: f32, a: f32) -> f32 {
    x * (1.0 - a) + y * a
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smoothstep_clamps_and_is_symmetric() {
        assert_eq!(smoothstep(0.0, 1.0, -3.0), 0.0);
        assert_eq!(smoothstep(0.0, 1.0, 4.0), 1.0);
        assert!((smoothstep(0.0, 1.0, 0.5) - 0.5).abs() < 1e-6);
        assert!((smoothstep(0.0, 3.0, 1.0) + smoothstep(0.0, 3.0, 2.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_mix_endpoints() {
        assert_eq!(mix(1.5, 2.5, 0.0), 1.5);
        assert_eq!(mix(1.5, 2.5, 1.0), 2.5);
    }
}
