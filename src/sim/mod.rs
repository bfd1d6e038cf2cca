//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - One seed drives every cave and noise table
//! - Events are handled in FIFO order, once per tick
//! - No rendering or platform dependencies (the host feeds input, time and
//!   focus, and reads back the projection and sound cues)

pub mod cave;
pub mod events;
pub mod evolve;
pub mod noise;
pub mod schedule;
pub mod state;
pub mod tick;

pub use cave::CaveGenerator;
pub use events::{EventBus, GameEvent};
pub use evolve::{ContingentEvolver, EvolveEngine, Transient, TransientHost};
pub use noise::NoiseSource;
pub use state::{GameState, InputState, KinematicBody, TransientPayload, TransientSlot, Worm, YHistory};
pub use tick::Simulation;
