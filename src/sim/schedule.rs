//! Deferred actions on the host clock
//!
//! Used to offset cave regeneration and sound cues from the visual midpoint
//! of a transition. Actions fire against the host time passed to
//! `Simulation::update`, independently of the simulation clock, so they
//! still fire while the game is unfocused.

/// Something the simulation will do later
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeferredAction {
    /// Swap in a freshly seeded cave and move worm and camera to its opening
    RegenerateCave,
    /// Fire a sound cue
    Cue(crate::audio::SoundCue),
}

#[derive(Debug, Clone)]
struct Scheduled<A> {
    due: f64,
    action: A,
}

/// Actions waiting for their due time, fired in due order (ties in
/// scheduling order)
#[derive(Debug, Clone)]
pub struct DeferredQueue<A> {
    pending: Vec<Scheduled<A>>,
}

impl<A> Default for DeferredQueue<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> DeferredQueue<A> {
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
        }
    }

    pub fn schedule(&mut self, due: f64, action: A) {
        // Insert after every entry due at or before `due` to keep ties stable
        let index = self.pending.partition_point(|s| s.due <= due);
        self.pending.insert(index, Scheduled { due, action });
    }

    /// Remove and return every action due at or before `now`
    pub fn take_due(&mut self, now: f64) -> Vec<A> {
        let ready = self.pending.partition_point(|s| s.due <= now);
        self.pending.drain(..ready).map(|s| s.action).collect()
    }

    /// Drop pending actions for which `keep` returns false
    pub fn retain(&mut self, mut keep: impl FnMut(&A) -> bool) {
        self.pending.retain(|s| keep(&s.action));
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
