//! Per-frame simulation step
//!
//! [`Simulation`] owns the authoritative game state and advances it once per
//! display refresh: forces, kinematics, camera, wall/zone detection, cave
//! sampling, worm history, evolvers and transients, then the render
//! projection. It is also the only consumer of its event bus, and drives the
//! flight → death → transition → rebirth sequence from the events it handles.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::cave::CaveGenerator;
use super::events::{EventBus, GameEvent};
use super::evolve::{ContingentEvolver, EvolveEngine};
use super::schedule::{DeferredAction, DeferredQueue};
use super::state::{GameState, TransientPayload, TransientSlot};
use crate::audio::{CueQueue, SoundCue};
use crate::config::GameConfig;
use crate::consts::WORM_COLLISION_SAMPLES;
use crate::projection::RenderProjection;
use crate::smoothstep;

// ============================================================================
// CONTINGENT EVOLVERS
// ============================================================================

/// While in the point zone: zone time and intensity rise, bonus points
/// accrue superlinearly with intensity.
struct InZoneScoring {
    rise_secs: f32,
}

impl ContingentEvolver<GameState> for InZoneScoring {
    fn condition(&self, state: &GameState) -> bool {
        state.in_zone
    }

    fn evolve(&self, state: &mut GameState, dt: f32) {
        state.time_in_zone += dt;
        state.point_zone_intensity = (state.point_zone_intensity + dt / self.rise_secs).min(1.0);
        state.points += dt * (state.point_zone_intensity * 5.0 + 1.0).powi(2);
    }
}

/// Outside the point zone intensity decays linearly
struct OutOfZoneDecay {
    decay_rate: f32,
}

impl ContingentEvolver<GameState> for OutOfZoneDecay {
    fn condition(&self, state: &GameState) -> bool {
        !state.in_zone
    }

    fn evolve(&self, state: &mut GameState, dt: f32) {
        state.time_out_of_zone += dt;
        state.point_zone_intensity = (state.point_zone_intensity - dt * self.decay_rate).max(0.0);
    }
}

/// Base points for staying alive
struct SurvivalScoring {
    points_per_sec: f32,
}

impl ContingentEvolver<GameState> for SurvivalScoring {
    fn condition(&self, state: &GameState) -> bool {
        !state.worm.is_dying()
    }

    fn evolve(&self, state: &mut GameState, dt: f32) {
        state.points += self.points_per_sec * dt;
    }
}

/// The evolvers registered on every reset
pub fn scoring_evolvers(config: &GameConfig) -> Vec<Box<dyn ContingentEvolver<GameState>>> {
    vec![
        Box::new(InZoneScoring {
            rise_secs: config.zone_intensity_rise_secs,
        }),
        Box::new(OutOfZoneDecay {
            decay_rate: config.zone_intensity_decay_rate,
        }),
        Box::new(SurvivalScoring {
            points_per_sec: config.base_points_per_sec,
        }),
    ]
}

// ============================================================================
// SIMULATION
// ============================================================================

pub struct Simulation {
    config: GameConfig,
    state: GameState,
    cave: CaveGenerator,
    events: EventBus<GameEvent>,
    evolve: EvolveEngine<GameState>,
    deferred: DeferredQueue<DeferredAction>,
    cues: CueQueue,
    projection: RenderProjection,
    /// Source of per-cave seeds, so a whole run replays from one seed
    seeds: Pcg32,
    focused: bool,
    /// Simulation clock: advances only while focused
    clock: f64,
    /// Host clock from the latest update call, drives deferred actions
    host_time: f64,
    deaths: u32,
}

impl Simulation {
    pub fn new(config: GameConfig, seed: u64) -> Self {
        let mut seeds = Pcg32::seed_from_u64(seed);
        let mut cave = CaveGenerator::new(seeds.random(), config.cave.clone());
        let spawn = initial_worm_position(&mut cave, &config);

        let mut sim = Self {
            state: GameState::new(&config, spawn, 0.0),
            evolve: EvolveEngine::new(scoring_evolvers(&config), 0.0),
            projection: RenderProjection::new(&config),
            cave,
            events: EventBus::new(),
            deferred: DeferredQueue::new(),
            cues: CueQueue::new(),
            seeds,
            focused: true,
            clock: 0.0,
            host_time: 0.0,
            deaths: 0,
            config,
        };
        log::info!("Simulation created with seed {}", seed);
        sim.reset();
        sim
    }

    pub fn with_defaults(seed: u64) -> Self {
        Self::new(GameConfig::default(), seed)
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn cave(&self) -> &CaveGenerator {
        &self.cave
    }

    pub fn cave_mut(&mut self) -> &mut CaveGenerator {
        &mut self.cave
    }

    pub fn events(&self) -> &EventBus<GameEvent> {
        &self.events
    }

    pub fn projection(&self) -> &RenderProjection {
        &self.projection
    }

    pub fn deaths(&self) -> u32 {
        self.deaths
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Losing focus freezes the simulation clock; nothing advances until
    /// focus returns. Held inputs are released since their key-up will
    /// never arrive.
    pub fn set_focused(&mut self, focused: bool) {
        if focused != self.focused {
            log::debug!("Focus {}", if focused { "gained" } else { "lost" });
        }
        if !focused {
            self.state.input.release_all();
        }
        self.focused = focused;
    }

    pub fn set_input(&mut self, name: &str, held: bool) {
        self.state.input.set(name, held);
    }

    /// Viewport change from the host. Sizes the config rejects are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        let mut resized = self.config.clone();
        resized.viewport_width = width;
        resized.viewport_height = height;
        if let Err(e) = resized.validate() {
            log::warn!("Ignoring resize to {}x{}: {}", width, height, e);
            return;
        }
        self.config = resized;
        self.projection.resize(&self.config);
    }

    /// Cues queued since the last drain
    pub fn drain_cues(&mut self) -> Vec<SoundCue> {
        self.cues.drain()
    }

    pub fn cues(&self) -> &CueQueue {
        &self.cues
    }

    pub fn cues_mut(&mut self) -> &mut CueQueue {
        &mut self.cues
    }

    /// Centre of the cave opening at a tenth of the viewport width
    pub fn initial_worm_position(&mut self) -> Vec2 {
        initial_worm_position(&mut self.cave, &self.config)
    }

    /// Advance one frame. `time` is the host clock in seconds, `dt` the
    /// frame delta.
    pub fn update(&mut self, time: f64, dt: f32) {
        if !dt.is_finite() || dt < 0.0 {
            log::warn!("Ignoring tick with delta {}", dt);
            return;
        }

        self.host_time = time;
        self.run_deferred();

        if !self.focused {
            return;
        }

        self.clock += dt as f64;
        self.process_events();

        self.assign_environmental_forces();
        self.update_kinematics(dt);
        self.update_camera();
        self.run_environmental_event_generators();
        self.projection
            .sample_cave(&mut self.cave, self.state.camera.position, &self.config);
        self.update_worm_history();
        self.evolve
            .update(&mut self.state, self.clock, dt, &mut self.events);

        self.state.game_time += dt;
        self.state.time = self.clock;

        let spawn_y = self.initial_worm_position().y;
        self.projection.publish(&self.state, &self.config, spawn_y);
    }

    /// Drain the bus in order, including events enqueued by handlers
    pub fn process_events(&mut self) {
        while let Some(event) = self.events.dequeue() {
            self.handle_event(event);
        }
    }

    pub fn handle_event(&mut self, event: GameEvent) {
        log::debug!("Handling {}", event.name());

        match event {
            GameEvent::WormCaveCollision { worm_position, .. } => {
                if self.state.worm_ignores_kinematics() {
                    return;
                }
                self.deaths += 1;
                log::info!(
                    "Worm hit the cave at ({:.2}, {:.2}) with {} points",
                    worm_position.x,
                    worm_position.y,
                    self.state.points.floor()
                );

                self.state.clear_zone_tracking();
                self.evolve.run_transient(
                    &mut self.state,
                    TransientSlot::WormDying,
                    TransientPayload::Dying { worm_position },
                    self.config.dying_duration,
                    &mut self.events,
                );

                self.cues.push(SoundCue::PointZoneStop);
                self.cues.push(SoundCue::Death);
                self.defer(self.config.cave_shut_cue_delay, DeferredAction::Cue(SoundCue::CaveShut));
            }
            GameEvent::TransientFinished {
                slot: TransientSlot::WormDying,
                ..
            } => {
                self.evolve.run_transient(
                    &mut self.state,
                    TransientSlot::ResetTransition,
                    TransientPayload::None,
                    self.config.reset_transition_duration,
                    &mut self.events,
                );

                // Swap the cave while the transition hides it
                self.defer(self.config.cave_regen_delay, DeferredAction::RegenerateCave);
                self.defer(self.config.cave_open_cue_delay, DeferredAction::Cue(SoundCue::CaveOpen));
            }
            GameEvent::TransientFinished {
                slot: TransientSlot::ResetTransition,
                ..
            } => {
                self.reset();
            }
            GameEvent::PointZoneEntry => {
                self.state.time_out_of_zone = 0.0;
                self.state.time_in_zone = 0.0;
                if !self.state.worm_ignores_kinematics() {
                    self.state.in_zone = true;
                    self.cues.push(SoundCue::PointZoneStart);
                }
            }
            GameEvent::PointZoneExit => {
                self.state.time_in_zone = 0.0;
                self.state.time_out_of_zone = 0.0;
                self.state.in_zone = false;
            }
            GameEvent::TransientStarted { .. } => {}
        }
    }

    /// Start a new life: fresh state and evolvers, score back to zero.
    /// Held input flags carry over.
    pub fn reset(&mut self) {
        let spawn = self.initial_worm_position();
        let input = std::mem::take(&mut self.state.input);

        self.state = GameState::new(&self.config, spawn, self.clock);
        self.state.input = input;
        self.evolve = EvolveEngine::new(scoring_evolvers(&self.config), self.evolve.last_time());
        self.projection = RenderProjection::new(&self.config);
        // A regeneration still pending from the last life would move the new worm
        self.deferred
            .retain(|action| !matches!(action, DeferredAction::RegenerateCave));

        self.cues.push(SoundCue::Birth);
        log::info!(
            "New life in cave seed {} at ({:.2}, {:.2})",
            self.cave.seed(),
            spawn.x,
            spawn.y
        );
    }

    fn defer(&mut self, delay: f64, action: DeferredAction) {
        self.deferred.schedule(self.host_time + delay, action);
    }

    fn run_deferred(&mut self) {
        for action in self.deferred.take_due(self.host_time) {
            match action {
                DeferredAction::RegenerateCave => self.regenerate_cave(),
                DeferredAction::Cue(cue) => self.cues.push(cue),
            }
        }
    }

    fn regenerate_cave(&mut self) {
        let seed = self.seeds.random();
        self.cave.regenerate(seed);
        let spawn = self.initial_worm_position();
        self.state.worm.body.position = spawn;
        self.state.camera.position = spawn;
        log::info!("Cave regenerated with seed {}", seed);
    }

    fn assign_environmental_forces(&mut self) {
        let config = &self.config;
        let state = &mut self.state;

        // Gravity and lift are weak for the first few seconds
        let intro_scale = smoothstep(0.0, config.intro_ramp_secs, state.game_time);
        let ascending = state.input.any_held(config.ascend_keys.as_slice());
        let worm = &mut state.worm.body;

        worm.apply_force(Vec2::new(0.0, -config.gravity_force(worm.mass) * intro_scale));
        worm.apply_force(Vec2::new(config.forward_thrust, 0.0));
        if ascending {
            worm.apply_force(Vec2::new(0.0, config.ascend_thrust * intro_scale));
        }
    }

    fn update_kinematics(&mut self, dt: f32) {
        if !self.state.worm_ignores_kinematics() {
            self.state.worm.body.integrate(dt);
            self.state.worm.update_rotation();
        }
        self.state.worm.body.clear_forces();
    }

    fn update_camera(&mut self) {
        if self.state.worm.is_dying() {
            return;
        }
        let target = self.state.worm.position() + Vec2::new(self.config.camera_lead, 0.0);
        self.state
            .camera
            .ease_toward(target, self.config.camera_smoothing);
    }

    fn run_environmental_event_generators(&mut self) {
        let test_points = self
            .state
            .worm
            .collision_test_points(WORM_COLLISION_SAMPLES);

        self.detect_worm_cave_collision(&test_points);
        self.detect_point_zone_events(&test_points);
    }

    /// At most one collision per tick; never while dying or resetting
    fn detect_worm_cave_collision(&mut self, test_points: &[Vec2]) {
        if self.state.worm_ignores_kinematics() {
            return;
        }

        for &point in test_points {
            let (top, bottom) = self.cave.surfaces_at(point.x);
            if point.y < bottom || point.y > top {
                self.events.enqueue(GameEvent::WormCaveCollision {
                    collision_point: point,
                    worm_position: self.state.worm.position(),
                });
                return;
            }
        }
    }

    /// The point zone is a band along each wall whose depth grows the
    /// longer the worm stays in it.
    fn detect_point_zone_events(&mut self, test_points: &[Vec2]) {
        let zone_height = self.config.point_zone_height(self.state.time_in_zone);
        let mut in_zone_count = 0;

        for &point in test_points {
            let (top, bottom) = self.cave.surfaces_at(point.x);
            if point.y < bottom + zone_height || point.y > top - zone_height {
                in_zone_count += 1;
            }
        }

        if in_zone_count > 0 && !self.state.in_zone {
            self.events.enqueue(GameEvent::PointZoneEntry);
        } else if in_zone_count == 0 && self.state.in_zone {
            self.events.enqueue(GameEvent::PointZoneExit);
        }
    }

    fn update_worm_history(&mut self) {
        let position = self.state.worm.position();
        let column = self.config.pixel_column(position.x);
        self.state.y_history.record(column, position.y);
    }
}

fn initial_worm_position(cave: &mut CaveGenerator, config: &GameConfig) -> Vec2 {
    let x = config.to_meters(config.viewport_width as f32 * 0.1);
    let (top, bottom) = cave.surfaces_at(x);
    Vec2::new(x, (top + bottom) / 2.0)
}
