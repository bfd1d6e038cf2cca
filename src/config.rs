//! Game tuning
//!
//! Every gameplay number lives here so a host can override it from JSON.
//! Missing fields fall back to the defaults in [`crate::consts`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Reasons a configuration is rejected
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config field `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

fn invalid(field: &'static str, reason: &'static str) -> ConfigError {
    ConfigError::Invalid { field, reason }
}

/// Cave shape parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaveConfig {
    /// Narrowest vertical gap between the walls (meters)
    pub min_aperture: f32,
    /// Widest vertical gap between the walls (meters)
    pub max_aperture: f32,
    /// Horizontal distance of one narrow/wide cycle (meters)
    pub aperture_period: f32,
    /// Frequency of the noise that perturbs the aperture cycle
    pub aperture_noise_scale: f32,
    /// How far the noise can push the aperture cycle (in sinusoid units)
    pub aperture_noise_strength: f32,
    /// Random-walk step length range for new junctures
    pub juncture_min_step: f32,
    pub juncture_max_step: f32,
    /// Max deviation from horizontal of a random-walk step (radians)
    pub juncture_max_angle: f32,
    /// The two bootstrap junctures sit at (-x, y) and (x, y)
    pub bootstrap_x: f32,
    pub bootstrap_y: f32,
    /// Amplitude of the low-frequency wall roughness at the widest and narrowest aperture
    pub roughness_wide: f32,
    pub roughness_narrow: f32,
}

impl Default for CaveConfig {
    fn default() -> Self {
        Self {
            min_aperture: MIN_APERTURE,
            max_aperture: MAX_APERTURE,
            aperture_period: APERTURE_PERIOD,
            aperture_noise_scale: 1.0 / 15.0,
            aperture_noise_strength: 0.6,
            juncture_min_step: JUNCTURE_MIN_STEP,
            juncture_max_step: JUNCTURE_MAX_STEP,
            juncture_max_angle: JUNCTURE_MAX_ANGLE,
            bootstrap_x: BOOTSTRAP_JUNCTURE_X,
            bootstrap_y: BOOTSTRAP_JUNCTURE_Y,
            roughness_wide: 2.0,
            roughness_narrow: 4.0,
        }
    }
}

impl CaveConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.min_aperture > 0.0) {
            return Err(invalid("cave.min_aperture", "must be positive"));
        }
        if !(self.max_aperture >= self.min_aperture) {
            return Err(invalid("cave.max_aperture", "must be >= min_aperture"));
        }
        if !(self.aperture_period > 0.0) {
            return Err(invalid("cave.aperture_period", "must be positive"));
        }
        if !(self.juncture_min_step > 0.0) {
            return Err(invalid("cave.juncture_min_step", "must be positive"));
        }
        if !(self.juncture_max_step > self.juncture_min_step) {
            return Err(invalid("cave.juncture_max_step", "must exceed juncture_min_step"));
        }
        if !(self.juncture_max_angle > 0.0 && self.juncture_max_angle < std::f32::consts::FRAC_PI_2) {
            return Err(invalid("cave.juncture_max_angle", "must be within (0, pi/2)"));
        }
        if !(self.bootstrap_x > 0.0) {
            return Err(invalid("cave.bootstrap_x", "must be positive"));
        }
        Ok(())
    }
}

/// Full game tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    // === Viewport ===
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub pixels_per_meter: f32,
    pub cave_sample_stride: u32,

    // === Worm ===
    pub worm_mass: f32,
    pub worm_velocity_cap: (f32, f32),
    pub worm_collision_size: (f32, f32),
    pub worm_segment_count: usize,
    pub worm_block_spacing: f32,
    pub y_history_length: usize,
    pub forward_thrust: f32,
    pub ascend_thrust: f32,
    pub intro_ramp_secs: f32,
    /// Input flag names that count as "ascend held"
    pub ascend_keys: Vec<String>,

    // === Camera ===
    pub camera_lead: f32,
    pub camera_smoothing: f32,

    // === Scoring ===
    pub base_points_per_sec: f32,
    pub point_zone_min_height: f32,
    pub point_zone_max_height: f32,
    pub point_zone_growth_secs: f32,
    pub zone_intensity_rise_secs: f32,
    pub zone_intensity_decay_rate: f32,

    // === Death / rebirth timing ===
    pub dying_duration: f32,
    pub reset_transition_duration: f32,
    pub cave_regen_delay: f64,
    pub cave_shut_cue_delay: f64,
    pub cave_open_cue_delay: f64,

    pub cave: CaveConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            viewport_width: 1280,
            viewport_height: 720,
            pixels_per_meter: PIXELS_PER_METER,
            cave_sample_stride: CAVE_SAMPLE_STRIDE,

            worm_mass: WORM_MASS,
            worm_velocity_cap: WORM_VELOCITY_CAP,
            worm_collision_size: WORM_COLLISION_SIZE,
            worm_segment_count: WORM_SEGMENT_COUNT,
            worm_block_spacing: WORM_BLOCK_SPACING,
            y_history_length: Y_HISTORY_LENGTH,
            forward_thrust: FORWARD_THRUST,
            ascend_thrust: ASCEND_THRUST,
            intro_ramp_secs: INTRO_RAMP_SECS,
            ascend_keys: vec!["ArrowUp".to_string(), "Touch".to_string()],

            camera_lead: CAMERA_LEAD,
            camera_smoothing: CAMERA_SMOOTHING,

            base_points_per_sec: BASE_POINTS_PER_SEC,
            point_zone_min_height: POINT_ZONE_MIN_HEIGHT,
            point_zone_max_height: POINT_ZONE_MAX_HEIGHT,
            point_zone_growth_secs: POINT_ZONE_GROWTH_SECS,
            zone_intensity_rise_secs: ZONE_INTENSITY_RISE_SECS,
            zone_intensity_decay_rate: ZONE_INTENSITY_DECAY_RATE,

            dying_duration: DYING_DURATION,
            reset_transition_duration: RESET_TRANSITION_DURATION,
            cave_regen_delay: CAVE_REGEN_DELAY,
            cave_shut_cue_delay: CAVE_SHUT_CUE_DELAY,
            cave_open_cue_delay: CAVE_OPEN_CUE_DELAY,

            cave: CaveConfig::default(),
        }
    }
}

impl GameConfig {
    /// Parse and validate a JSON config
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON config, falling back to defaults when it is rejected
    pub fn from_json_or_default(json: &str) -> Self {
        match Self::from_json(json) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Rejected config ({e}), using defaults");
                Self::default()
            }
        }
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.viewport_width == 0 || self.viewport_height == 0 {
            return Err(invalid("viewport", "width and height must be non-zero"));
        }
        if !(self.pixels_per_meter > 0.0) {
            return Err(invalid("pixels_per_meter", "must be positive"));
        }
        // Half the viewport left of the camera must stay inside the bootstrap range
        if self.to_meters(self.viewport_width as f32) / 2.0 >= self.cave.bootstrap_x {
            return Err(invalid("viewport_width", "wider than the cave's bootstrap range"));
        }
        if self.cave_sample_stride == 0 {
            return Err(invalid("cave_sample_stride", "must be at least 1"));
        }
        if !(self.worm_mass > 0.0) {
            return Err(invalid("worm_mass", "must be positive"));
        }
        if !(self.worm_velocity_cap.0 >= 0.0 && self.worm_velocity_cap.1 >= 0.0) {
            return Err(invalid("worm_velocity_cap", "must be non-negative"));
        }
        if self.worm_segment_count == 0 || self.worm_segment_count > crate::projection::MAX_WORM_SEGMENTS {
            return Err(invalid("worm_segment_count", "must be within 1..=8"));
        }
        if self.y_history_length == 0 {
            return Err(invalid("y_history_length", "must be non-zero"));
        }
        if !(self.dying_duration > 0.0 && self.reset_transition_duration > 0.0) {
            return Err(invalid("transition durations", "must be positive"));
        }
        if !(self.camera_smoothing >= 1.0) {
            return Err(invalid("camera_smoothing", "must be at least 1"));
        }
        if !(self.point_zone_max_height >= self.point_zone_min_height) {
            return Err(invalid("point_zone_max_height", "must be >= point_zone_min_height"));
        }
        if !(self.zone_intensity_rise_secs > 0.0) {
            return Err(invalid("zone_intensity_rise_secs", "must be positive"));
        }
        self.cave.validate()
    }

    #[inline]
    pub fn to_pixels(&self, meters: f32) -> f32 {
        meters * self.pixels_per_meter
    }

    #[inline]
    pub fn to_meters(&self, pixels: f32) -> f32 {
        pixels / self.pixels_per_meter
    }

    /// Absolute pixel column containing world `x`
    #[inline]
    pub fn pixel_column(&self, x: f32) -> i64 {
        self.to_pixels(x).floor() as i64
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.viewport_width as f32 / self.viewport_height as f32
    }

    /// Number of cave height samples across the viewport
    pub fn cave_sample_count(&self) -> usize {
        (self.viewport_width / self.cave_sample_stride) as usize
    }

    /// Newtonian surface gravity on a body of `mass`
    pub fn gravity_force(&self, mass: f32) -> f32 {
        GRAVITY_CONSTANT * EARTH_MASS * mass / (EARTH_RADIUS * EARTH_RADIUS)
    }

    /// Half-height of the point zone after `time_in_zone` seconds
    pub fn point_zone_height(&self, time_in_zone: f32) -> f32 {
        crate::mix(
            self.point_zone_min_height,
            self.point_zone_max_height,
            crate::smoothstep(0.0, self.point_zone_growth_secs, time_in_zone),
        )
    }
}
