//! Render projection
//!
//! The renderer is a pure consumer: once per tick the simulation writes a
//! flat set of named values here, already transformed into the
//! camera-relative, aspect-corrected space a full-screen fragment shader
//! expects. Nothing in here feeds back into gameplay.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use crate::config::GameConfig;
use crate::sim::cave::CaveGenerator;
use crate::sim::state::GameState;
use crate::smoothstep;

/// Two packed groups of four segment slots
pub const MAX_WORM_SEGMENTS: usize = 8;

// ============================================================================
// GPU DATA (must match shader)
// ============================================================================

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct FrameUniforms {
    pub resolution: [f32; 2],  // offset 0
    pub aspect_ratio: f32,     // offset 8
    pub time: f32,             // offset 12
    pub camera_pos: [f32; 2],  // offset 16
    pub worm_death_rebirth: f32,
    pub bg_death_rebirth: f32,
    pub cave_shut_death_rebirth: f32, // offset 32
    pub cave_pattern_death_rebirth: f32,
    pub reset_transition: f32,
    pub point_zone_height: f32,
    pub point_zone_intensity: f32, // offset 48
    pub _pad: [f32; 3],
    /// Per segment: x, y, rotation, unused
    pub worm_data: [[f32; 4]; 4], // offset 64
    pub worm_data2: [[f32; 4]; 4], // offset 128
}

impl FrameUniforms {
    pub fn segment(&self, index: usize) -> [f32; 4] {
        if index < 4 {
            self.worm_data[index]
        } else {
            self.worm_data2[index - 4]
        }
    }

    fn set_segment(&mut self, index: usize, position: Vec2, rotation: f32) {
        let slot = if index < 4 {
            &mut self.worm_data[index]
        } else {
            &mut self.worm_data2[index - 4]
        };
        *slot = [position.x, position.y, rotation, 0.0];
    }
}

/// World (meters) to normalized screen space around a camera
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub pixels_per_meter: f32,
}

impl Viewport {
    pub fn from_config(config: &GameConfig) -> Self {
        Self {
            width: config.viewport_width as f32,
            height: config.viewport_height as f32,
            pixels_per_meter: config.pixels_per_meter,
        }
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width / self.height
    }

    /// Camera-relative position: y in [0, 1] bottom to top, x scaled by
    /// the aspect ratio so the units are square.
    pub fn to_screen(&self, world: Vec2, camera: Vec2) -> Vec2 {
        let shifted = world * self.pixels_per_meter - camera * self.pixels_per_meter
            + Vec2::new(self.width, self.height) / 2.0;
        Vec2::new(shifted.x / self.height, shifted.y / self.height)
    }

    /// Only the y half of [`Viewport::to_screen`], for wall heights
    pub fn screen_y(&self, world_y: f32, camera_y: f32) -> f32 {
        (world_y * self.pixels_per_meter - camera_y * self.pixels_per_meter + self.height / 2.0) / self.height
    }

    /// Camera position in the scrolling UV space of the background
    pub fn camera_uv(&self, camera: Vec2) -> Vec2 {
        let px = camera * self.pixels_per_meter;
        Vec2::new(px.x / self.width * self.aspect_ratio(), px.y / self.height)
    }
}

/// Forward-then-reverse animation curves for death and rebirth, as
/// `[worm, background, cave_shut, cave_pattern]`.
pub fn death_rebirth_curves(death: f32, reset: f32) -> [f32; 4] {
    [
        smoothstep(0.0, 0.35, death) - smoothstep(0.75, 1.0, reset),
        smoothstep(0.0, 0.4, death) - reset,
        smoothstep(0.0, 0.4, death.powi(4)) - smoothstep(0.5, 1.0, reset),
        death - smoothstep(0.5, 1.0, reset.powi(2)),
    ]
}

/// Everything the renderer reads for one frame
#[derive(Debug, Clone)]
pub struct RenderProjection {
    pub uniforms: FrameUniforms,
    /// Ceiling heights across the viewport, screen space
    pub top_heights: Vec<f32>,
    /// Floor heights across the viewport, screen space
    pub bottom_heights: Vec<f32>,
    /// Whole points for the HUD
    pub points: u64,
}

impl RenderProjection {
    pub fn new(config: &GameConfig) -> Self {
        let samples = config.cave_sample_count();
        Self {
            uniforms: FrameUniforms::zeroed(),
            top_heights: vec![0.0; samples],
            bottom_heights: vec![0.0; samples],
            points: 0,
        }
    }

    /// Resize the height arrays after a viewport change
    pub fn resize(&mut self, config: &GameConfig) {
        let samples = config.cave_sample_count();
        self.top_heights.resize(samples, 0.0);
        self.bottom_heights.resize(samples, 0.0);
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(&self.uniforms)
    }

    /// Sample both walls every `stride` pixels across the visible span
    pub fn sample_cave(&mut self, cave: &mut CaveGenerator, camera: Vec2, config: &GameConfig) {
        let viewport = Viewport::from_config(config);
        let stride = config.cave_sample_stride as i64;
        let left_px = (camera.x * viewport.pixels_per_meter).floor() as i64
            - (viewport.width / 2.0).floor() as i64;

        for (i, (top, bottom)) in self
            .top_heights
            .iter_mut()
            .zip(self.bottom_heights.iter_mut())
            .enumerate()
        {
            let x = config.to_meters((i as i64 * stride + left_px) as f32);
            let (top_y, bottom_y) = cave.surfaces_at(x);
            *top = viewport.screen_y(top_y, camera.y);
            *bottom = viewport.screen_y(bottom_y, camera.y);
        }
    }

    /// Map the game state to uniforms. `spawn_y` backfills trailing
    /// segments over history slots that were never written.
    pub fn publish(&mut self, state: &GameState, config: &GameConfig, spawn_y: f32) {
        let viewport = Viewport::from_config(config);
        let aspect = viewport.aspect_ratio();
        let camera = state.camera.position;
        let u = &mut self.uniforms;

        u.resolution = [viewport.width, viewport.height];
        u.aspect_ratio = aspect;
        u.time = state.time as f32;
        u.camera_pos = viewport.camera_uv(camera).to_array();

        // Latched: keeps its last value until the next reset
        if let Some(transition) = &state.reset_transition {
            u.reset_transition = transition.completion;
        }

        u.point_zone_intensity = smoothstep(0.1, 1.0, state.point_zone_intensity);
        u.point_zone_height = config.to_pixels(config.point_zone_height(state.time_in_zone))
            / viewport.height
            / aspect
            * u.point_zone_intensity;

        let death = state.worm.dying.as_ref().map_or(0.0, |t| t.completion);
        let [worm, bg, cave_shut, cave_pattern] = death_rebirth_curves(death, u.reset_transition);
        u.worm_death_rebirth = worm;
        u.bg_death_rebirth = bg;
        u.cave_shut_death_rebirth = cave_shut;
        u.cave_pattern_death_rebirth = cave_pattern;

        let head = state.worm.position();
        for i in 0..config.worm_segment_count.min(MAX_WORM_SEGMENTS) {
            let x = head.x - config.worm_block_spacing * i as f32;
            let y = state
                .y_history
                .get(config.pixel_column(x))
                .unwrap_or(spawn_y);
            u.set_segment(i, viewport.to_screen(Vec2::new(x, y), camera), state.worm.rotation);
        }

        self.points = state.points.max(0.0).floor() as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::evolve::Transient;
    use crate::sim::state::TransientPayload;

    #[test]
    fn test_uniform_layout() {
        assert_eq!(std::mem::size_of::<FrameUniforms>(), 192);
        let projection = RenderProjection::new(&GameConfig::default());
        assert_eq!(projection.as_bytes().len(), 192);
        assert_eq!(projection.top_heights.len(), 320);
    }

    #[test]
    fn test_camera_centre_maps_to_screen_centre() {
        let viewport = Viewport::from_config(&GameConfig::default());
        let camera = Vec2::new(12.0, -3.0);
        let screen = viewport.to_screen(camera, camera);
        assert!((screen.y - 0.5).abs() < 1e-6);
        assert!((screen.x - 0.5 * viewport.aspect_ratio()).abs() < 1e-5);
        assert!((viewport.screen_y(-3.0, -3.0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_death_rebirth_curves() {
        assert_eq!(death_rebirth_curves(0.0, 0.0), [0.0; 4]);
        // Fully dead, transition not yet started: everything at full effect
        assert_eq!(death_rebirth_curves(1.0, 0.0), [1.0, 1.0, 1.0, 1.0]);
        // Worm gone, transition finished: back to rest
        assert_eq!(death_rebirth_curves(0.0, 1.0), [-1.0, -1.0, -1.0, -1.0]);
    }

    #[test]
    fn test_publish_backfills_segments_with_spawn_height() {
        let config = GameConfig::default();
        let spawn = Vec2::new(2.56, 4.0);
        let state = GameState::new(&config, spawn, 0.0);
        let mut projection = RenderProjection::new(&config);
        projection.publish(&state, &config, spawn.y);

        let viewport = Viewport::from_config(&config);
        for i in 0..6 {
            let seg = projection.uniforms.segment(i);
            assert!((seg[1] - viewport.screen_y(spawn.y, spawn.y)).abs() < 1e-6);
        }
        // Segments trail to the left of the head
        assert!(projection.uniforms.segment(5)[0] < projection.uniforms.segment(0)[0]);
        assert_eq!(projection.uniforms.segment(6), [0.0; 4]);
    }

    #[test]
    fn test_reset_ratio_is_latched() {
        let config = GameConfig::default();
        let mut state = GameState::new(&config, Vec2::ZERO, 0.0);
        let mut projection = RenderProjection::new(&config);

        let mut transition = Transient::new(0.0, 1.5, TransientPayload::None);
        transition.completion = 0.8;
        state.reset_transition = Some(transition);
        projection.publish(&state, &config, 0.0);
        assert_eq!(projection.uniforms.reset_transition, 0.8);

        state.reset_transition = None;
        projection.publish(&state, &config, 0.0);
        assert_eq!(projection.uniforms.reset_transition, 0.8);
    }

    #[test]
    fn test_sample_cave_is_centred_on_camera() {
        let config = GameConfig::default();
        let mut cave = CaveGenerator::new(8, config.cave.clone());
        let mut projection = RenderProjection::new(&config);
        let camera = Vec2::new(20.0, 5.0);
        projection.sample_cave(&mut cave, camera, &config);

        // The middle sample sits at the camera's x
        let mid = projection.top_heights.len() / 2;
        let (top, bottom) = cave.surfaces_at(camera.x);
        let viewport = Viewport::from_config(&config);
        assert!((projection.top_heights[mid] - viewport.screen_y(top, camera.y)).abs() < 1e-4);
        assert!((projection.bottom_heights[mid] - viewport.screen_y(bottom, camera.y)).abs() < 1e-4);
        assert!(projection
            .top_heights
            .iter()
            .zip(&projection.bottom_heights)
            .all(|(t, b)| t > b));
    }
}
