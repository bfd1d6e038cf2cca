//! Game state and core simulation types
//!
//! Everything the simulation mutates per tick lives here. The whole
//! [`GameState`] is rebuilt on reset rather than patched.

use std::collections::HashMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::evolve::{Transient, TransientHost};
use crate::config::GameConfig;

/// Well-known transient slots on the game state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransientSlot {
    /// `worm.dying`: the worm hit a wall and is disintegrating
    WormDying,
    /// `resetTransition`: the cave closes, regenerates and reopens
    ResetTransition,
}

impl TransientSlot {
    /// Dotted path used in event names
    pub fn path(&self) -> &'static str {
        match self {
            TransientSlot::WormDying => "worm.dying",
            TransientSlot::ResetTransition => "resetTransition",
        }
    }
}

/// Data carried by a transient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TransientPayload {
    None,
    /// Where the worm was when it died
    Dying { worm_position: Vec2 },
}

/// A point mass pushed around by forces
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KinematicBody {
    pub position: Vec2,
    pub velocity: Vec2,
    pub mass: f32,
    /// Forces accumulated this tick, cleared after integration
    pub active_forces: Vec<Vec2>,
    /// Per-axis speed limit (sign preserved when clamping)
    pub velocity_cap: Vec2,
}

impl KinematicBody {
    pub fn new(position: Vec2, mass: f32, velocity_cap: Vec2) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            mass,
            active_forces: Vec::new(),
            velocity_cap,
        }
    }

    pub fn apply_force(&mut self, force: Vec2) {
        self.active_forces.push(force);
    }

    /// Semi-implicit Euler step. Velocity is capped per axis before the
    /// position update.
    pub fn integrate(&mut self, dt: f32) {
        let total_force: Vec2 = self.active_forces.iter().copied().sum();
        let acceleration = total_force / self.mass;

        self.velocity += acceleration * dt;
        let cap = self.velocity_cap.abs();
        self.velocity = self.velocity.clamp(-cap, cap);
        self.position += self.velocity * dt;
    }

    pub fn clear_forces(&mut self) {
        self.active_forces.clear();
    }

    /// Move a `1 / smoothing` fraction of the way toward `target`
    pub fn ease_toward(&mut self, target: Vec2, smoothing: f32) {
        self.position += (target - self.position) / smoothing;
    }
}

/// The player's worm head
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Worm {
    pub body: KinematicBody,
    /// Heading in radians, [0, 2π)
    pub rotation: f32,
    /// Collision box (width, height) centred on the head
    pub collision_bounds: Vec2,
    /// Present while the death animation plays
    pub dying: Option<Transient<TransientPayload>>,
}

impl Worm {
    pub fn new(config: &GameConfig, position: Vec2) -> Self {
        let (cap_x, cap_y) = config.worm_velocity_cap;
        let (width, height) = config.worm_collision_size;
        Self {
            body: KinematicBody::new(position, config.worm_mass, Vec2::new(cap_x, cap_y)),
            rotation: 0.0,
            collision_bounds: Vec2::new(width, height),
            dying: None,
        }
    }

    pub fn position(&self) -> Vec2 {
        self.body.position
    }

    pub fn is_dying(&self) -> bool {
        self.dying.is_some()
    }

    /// Heading derived from velocity
    pub fn update_rotation(&mut self) {
        let heading = self.body.velocity.normalize_or_zero();
        self.rotation = heading.y.atan2(heading.x).rem_euclid(std::f32::consts::TAU);
    }

    /// Sample points along the top and bottom edges of the collision box,
    /// ordered left to right, top before bottom.
    pub fn collision_test_points(&self, samples: usize) -> Vec<Vec2> {
        let half = self.collision_bounds / 2.0;
        let pos = self.body.position;
        let top_y = pos.y + half.y;
        let bottom_y = pos.y - half.y;
        let start_x = pos.x - half.x;
        let increment = if samples > 1 {
            self.collision_bounds.x / (samples - 1) as f32
        } else {
            0.0
        };

        let mut points = Vec::with_capacity(samples * 2);
        for i in 0..samples {
            let x = if samples > 1 { start_x + increment * i as f32 } else { pos.x };
            points.push(Vec2::new(x, top_y));
            points.push(Vec2::new(x, bottom_y));
        }
        points
    }
}

/// Named boolean input flags ("ArrowUp" held, ...), filled in by the host
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputState {
    flags: HashMap<String, bool>,
}

impl InputState {
    pub fn set(&mut self, name: &str, held: bool) {
        self.flags.insert(name.to_string(), held);
    }

    pub fn is_held(&self, name: &str) -> bool {
        self.flags.get(name).copied().unwrap_or(false)
    }

    pub fn any_held<S: AsRef<str>>(&self, names: &[S]) -> bool {
        names.iter().any(|name| self.is_held(name.as_ref()))
    }

    pub fn release_all(&mut self) {
        self.flags.clear();
    }
}

/// Ring buffer of past worm head heights, one slot per pixel column.
///
/// Trailing body segments read the height the head had when it passed
/// their column, so the body retraces the exact path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YHistory {
    values: Vec<Option<f32>>,
    index: usize,
}

impl YHistory {
    pub fn new(length: usize) -> Self {
        Self {
            values: vec![None; length.max(1)],
            index: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Most recently written slot
    pub fn index(&self) -> usize {
        self.index
    }

    /// Slot for an absolute pixel column
    pub fn slot_for(&self, column: i64) -> usize {
        column.rem_euclid(self.values.len() as i64) as usize
    }

    /// Record `y` for every slot after the last written one up to and
    /// including `column`'s slot, wrapping past the end of the buffer.
    pub fn record(&mut self, column: i64, y: f32) {
        let target = self.slot_for(column);

        if self.index > target {
            for slot in self.values[self.index + 1..].iter_mut() {
                *slot = Some(y);
            }
            for slot in self.values[..=target].iter_mut() {
                *slot = Some(y);
            }
        } else {
            for slot in self.values[self.index + 1..=target].iter_mut() {
                *slot = Some(y);
            }
        }
        self.index = target;
    }

    /// Height recorded for `column`, `None` if that slot was never written
    pub fn get(&self, column: i64) -> Option<f32> {
        self.values[self.slot_for(column)]
    }
}

/// Complete game state for one life of the worm
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Simulation clock at the last tick (seconds), frozen while unfocused
    pub time: f64,
    /// Playable time elapsed since reset (seconds)
    pub game_time: f32,
    pub worm: Worm,
    pub camera: KinematicBody,
    pub input: InputState,
    pub y_history: YHistory,
    pub time_in_zone: f32,
    pub time_out_of_zone: f32,
    pub in_zone: bool,
    /// Ramps toward 1 while in the point zone, decays outside
    pub point_zone_intensity: f32,
    pub points: f32,
    pub reset_transition: Option<Transient<TransientPayload>>,
}

impl GameState {
    /// Fresh state with the worm and camera at `spawn`
    pub fn new(config: &GameConfig, spawn: Vec2, time: f64) -> Self {
        Self {
            time,
            game_time: 0.0,
            worm: Worm::new(config, spawn),
            camera: KinematicBody::new(spawn, 1.0, Vec2::splat(f32::MAX)),
            input: InputState::default(),
            y_history: YHistory::new(config.y_history_length),
            time_in_zone: 0.0,
            time_out_of_zone: 0.0,
            in_zone: false,
            point_zone_intensity: 0.0,
            points: 0.0,
            reset_transition: None,
        }
    }

    /// The worm is frozen while dying or while the cave resets
    pub fn worm_ignores_kinematics(&self) -> bool {
        self.worm.is_dying() || self.reset_transition.is_some()
    }

    pub fn clear_zone_tracking(&mut self) {
        self.in_zone = false;
        self.point_zone_intensity = 0.0;
        self.time_in_zone = 0.0;
    }
}

impl TransientHost for GameState {
    type Slot = TransientSlot;
    type Payload = TransientPayload;

    fn transient_slot(&mut self, slot: TransientSlot) -> &mut Option<Transient<TransientPayload>> {
        match slot {
            TransientSlot::WormDying => &mut self.worm.dying,
            TransientSlot::ResetTransition => &mut self.reset_transition,
        }
    }
}
