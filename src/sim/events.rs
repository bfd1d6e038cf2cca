//! Event bus and the game's event vocabulary
//!
//! Detection code enqueues; the simulation drains the bus once per tick.
//! Handlers may enqueue more events while draining and those are seen in
//! the same pass.

use std::collections::VecDeque;

use glam::Vec2;

use super::evolve::{Transient, TransientEvent};
use super::state::{TransientPayload, TransientSlot};

/// Plain FIFO queue. No priorities, no dedup.
#[derive(Debug, Clone)]
pub struct EventBus<E> {
    queue: VecDeque<E>,
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> EventBus<E> {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }

    /// Append to the tail
    pub fn enqueue(&mut self, event: E) {
        self.queue.push_back(event);
    }

    /// Remove the head, `None` when empty
    pub fn dequeue(&mut self) -> Option<E> {
        self.queue.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Pending events, head first
    pub fn iter(&self) -> impl Iterator<Item = &E> {
        self.queue.iter()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

/// Everything the simulation reacts to
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// A worm collision-test point left the cave
    WormCaveCollision {
        collision_point: Vec2,
        worm_position: Vec2,
    },
    /// At least one test point entered the point zone
    PointZoneEntry,
    /// No test point remains in the point zone
    PointZoneExit,
    /// A transient slot was attached
    TransientStarted {
        slot: TransientSlot,
        payload: TransientPayload,
    },
    /// A transient ran to completion and was detached
    TransientFinished {
        slot: TransientSlot,
        transient: Transient<TransientPayload>,
    },
}

impl GameEvent {
    /// Stable event name (`worm_cave_collision`, `worm.dying_finished`, ...)
    pub fn name(&self) -> String {
        match self {
            GameEvent::WormCaveCollision { .. } => "worm_cave_collision".to_string(),
            GameEvent::PointZoneEntry => "point_zone_entry".to_string(),
            GameEvent::PointZoneExit => "point_zone_exit".to_string(),
            GameEvent::TransientStarted { slot, .. } => format!("{}_started", slot.path()),
            GameEvent::TransientFinished { slot, .. } => format!("{}_finished", slot.path()),
        }
    }
}

impl From<TransientEvent<TransientSlot, TransientPayload>> for GameEvent {
    fn from(event: TransientEvent<TransientSlot, TransientPayload>) -> Self {
        match event {
            TransientEvent::Started { slot, payload } => GameEvent::TransientStarted { slot, payload },
            TransientEvent::Finished { slot, transient } => {
                GameEvent::TransientFinished { slot, transient }
            }
        }
    }
}
