//! Platform abstraction layer
//!
//! The browser shell owns the canvas, the shader, Web Audio and the
//! animation-frame loop. It drives the core through [`WebGame`]:
//! - Time: `update(time_ms)` once per animation frame
//! - Input: `set_key` from keydown/keyup and touchstart/touchend
//! - Visibility/focus: `set_focused` from window focus and blur
//! - Output: uniforms, wall heights and queued sound cue names

#[cfg(target_arch = "wasm32")]
mod web {
    use wasm_bindgen::prelude::*;

    use crate::config::GameConfig;
    use crate::sim::Simulation;

    /// Longest frame the shell may report; longer gaps (tab switches,
    /// debugger pauses) are clamped
    const MAX_FRAME_DT: f32 = 0.1;

    #[wasm_bindgen]
    pub struct WebGame {
        sim: Simulation,
        last_time_ms: Option<f64>,
    }

    #[wasm_bindgen]
    impl WebGame {
        /// Create a game for a canvas of `width` x `height` pixels.
        /// `config_json` may be empty; invalid configs fall back to defaults.
        #[wasm_bindgen(constructor)]
        pub fn new(seed: u32, width: u32, height: u32, config_json: &str) -> WebGame {
            console_error_panic_hook::set_once();
            // A second game on the page finds the logger already installed
            let _ = console_log::init_with_level(log::Level::Info);

            let mut config = if config_json.trim().is_empty() {
                GameConfig::default()
            } else {
                GameConfig::from_json_or_default(config_json)
            };
            config.viewport_width = width.max(1);
            config.viewport_height = height.max(1);
            if let Err(e) = config.validate() {
                log::warn!("Canvas size rejected ({e}), using default viewport");
                let defaults = GameConfig::default();
                config.viewport_width = defaults.viewport_width;
                config.viewport_height = defaults.viewport_height;
            }

            log::info!("Undergame starting ({}x{}, seed {})", width, height, seed);
            WebGame {
                sim: Simulation::new(config, seed as u64),
                last_time_ms: None,
            }
        }

        /// Advance one animation frame; `time_ms` is the rAF timestamp
        pub fn update(&mut self, time_ms: f64) {
            let dt = match self.last_time_ms {
                Some(last) => (((time_ms - last) / 1000.0) as f32).clamp(0.0, MAX_FRAME_DT),
                None => 0.0,
            };
            self.last_time_ms = Some(time_ms);
            self.sim.update(time_ms / 1000.0, dt);
        }

        /// Input flag change, e.g. `("ArrowUp", true)` or `("Touch", false)`
        pub fn set_key(&mut self, name: &str, held: bool) {
            self.sim.set_input(name, held);
        }

        pub fn set_focused(&mut self, focused: bool) {
            self.sim.set_focused(focused);
        }

        pub fn resize(&mut self, width: u32, height: u32) {
            self.sim.resize(width, height);
        }

        /// Uniform block as floats, laid out as the shader's uniform struct
        pub fn uniforms(&self) -> Vec<f32> {
            bytemuck::cast_slice(self.sim.projection().as_bytes()).to_vec()
        }

        pub fn top_heights(&self) -> Vec<f32> {
            self.sim.projection().top_heights.clone()
        }

        pub fn bottom_heights(&self) -> Vec<f32> {
            self.sim.projection().bottom_heights.clone()
        }

        /// Packed `x, y, rotation, 0` per segment
        pub fn worm_data(&self) -> Vec<f32> {
            let uniforms = &self.sim.projection().uniforms;
            (0..self.sim.config().worm_segment_count)
                .flat_map(|i| uniforms.segment(i))
                .collect()
        }

        pub fn points(&self) -> f64 {
            self.sim.projection().points as f64
        }

        /// Names of the cues queued since the last call
        pub fn take_cues(&mut self) -> js_sys::Array {
            self.sim
                .drain_cues()
                .into_iter()
                .map(|cue| JsValue::from_str(cue.as_str()))
                .collect()
        }

        /// Volume for the looping point-zone hum
        pub fn hum_volume(&self) -> f32 {
            if self.sim.cues().is_hum_playing() {
                self.sim.projection().uniforms.point_zone_intensity
            } else {
                0.0
            }
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::WebGame;
