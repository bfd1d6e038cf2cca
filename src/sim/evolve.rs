//! Transient states and contingent evolvers
//!
//! Two small mechanisms for evolving a state object over time:
//!
//! - *Transient states* are time-boxed slots on the state. Once attached
//!   they track their own completion ratio and, when it reaches 1, are
//!   detached and announced with a `Finished` event.
//! - *Contingent evolvers* are per-tick mutations that only run while
//!   their condition holds.
//!
//! The engine knows nothing about the game; the state type exposes its
//! slots through [`TransientHost`].

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use super::events::EventBus;

/// A time-boxed sub-state with an arbitrary payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transient<P> {
    /// Engine time when the transient was attached (seconds)
    pub start_time: f64,
    pub duration: f32,
    /// Progress in [0, 1]
    pub completion: f32,
    pub payload: P,
}

impl<P> Transient<P> {
    pub fn new(start_time: f64, duration: f32, payload: P) -> Self {
        Self {
            start_time,
            duration,
            completion: 0.0,
            payload,
        }
    }

    /// Completion at `time`, clamped to [0, 1]
    pub fn completion_at(&self, time: f64) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        (((time - self.start_time) / self.duration as f64) as f32).clamp(0.0, 1.0)
    }
}

/// Notifications emitted by the engine
#[derive(Debug, Clone, PartialEq)]
pub enum TransientEvent<K, P> {
    Started { slot: K, payload: P },
    Finished { slot: K, transient: Transient<P> },
}

/// A state object with well-known transient slots
pub trait TransientHost {
    type Slot: Copy + Eq + Debug;
    type Payload: Clone;

    fn transient_slot(&mut self, slot: Self::Slot) -> &mut Option<Transient<Self::Payload>>;
}

/// A conditional per-tick mutation
pub trait ContingentEvolver<S> {
    fn condition(&self, state: &S) -> bool;
    fn evolve(&self, state: &mut S, dt: f32);
}

pub struct EvolveEngine<S: TransientHost> {
    evolvers: Vec<Box<dyn ContingentEvolver<S>>>,
    active: Vec<S::Slot>,
    last_time: f64,
}

impl<S: TransientHost> EvolveEngine<S> {
    /// Create an engine whose logical clock starts at `time`
    pub fn new(evolvers: Vec<Box<dyn ContingentEvolver<S>>>, time: f64) -> Self {
        Self {
            evolvers,
            active: Vec::new(),
            last_time: time,
        }
    }

    /// Time of the most recent update
    pub fn last_time(&self) -> f64 {
        self.last_time
    }

    pub fn is_tracking(&self, slot: S::Slot) -> bool {
        self.active.contains(&slot)
    }

    /// Attach a transient at `slot`, stamped with the engine's current time,
    /// and announce it with a `Started` event.
    pub fn run_transient<E>(
        &mut self,
        state: &mut S,
        slot: S::Slot,
        payload: S::Payload,
        duration: f32,
        bus: &mut EventBus<E>,
    ) where
        E: From<TransientEvent<S::Slot, S::Payload>>,
    {
        log::debug!("Transient {:?} started ({}s)", slot, duration);
        *state.transient_slot(slot) = Some(Transient::new(self.last_time, duration, payload.clone()));
        if !self.active.contains(&slot) {
            self.active.push(slot);
        }
        bus.enqueue(TransientEvent::Started { slot, payload }.into());
    }

    /// Run every evolver whose condition holds, then advance transients.
    /// Finished transients are detached before their event is enqueued.
    pub fn update<E>(&mut self, state: &mut S, time: f64, dt: f32, bus: &mut EventBus<E>)
    where
        E: From<TransientEvent<S::Slot, S::Payload>>,
    {
        // Conditions are all evaluated against the pre-evolve state
        let ready: Vec<usize> = self
            .evolvers
            .iter()
            .enumerate()
            .filter(|(_, evolver)| evolver.condition(&*state))
            .map(|(i, _)| i)
            .collect();
        for i in ready {
            self.evolvers[i].evolve(state, dt);
        }

        self.active.retain(|&slot| {
            let entry = state.transient_slot(slot);
            let Some(transient) = entry.as_mut() else {
                // Detached from outside (state was replaced)
                return false;
            };

            transient.completion = transient.completion.max(transient.completion_at(time));
            if transient.completion < 1.0 {
                return true;
            }

            if let Some(transient) = entry.take() {
                log::debug!("Transient {:?} finished", slot);
                bus.enqueue(TransientEvent::Finished { slot, transient }.into());
            }
            false
        });

        self.last_time = time;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Slot {
        Fade,
        Flash,
    }

    #[derive(Default)]
    struct Counter {
        value: f32,
        enabled: bool,
        fade: Option<Transient<u32>>,
        flash: Option<Transient<u32>>,
    }

    impl TransientHost for Counter {
        type Slot = Slot;
        type Payload = u32;

        fn transient_slot(&mut self, slot: Slot) -> &mut Option<Transient<u32>> {
            match slot {
                Slot::Fade => &mut self.fade,
                Slot::Flash => &mut self.flash,
            }
        }
    }

    struct AccrueWhileEnabled;

    impl ContingentEvolver<Counter> for AccrueWhileEnabled {
        fn condition(&self, state: &Counter) -> bool {
            state.enabled
        }

        fn evolve(&self, state: &mut Counter, dt: f32) {
            state.value += dt;
        }
    }

    /// Turns itself off: the second evolver must still see the old condition
    struct DisableOnce;

    impl ContingentEvolver<Counter> for DisableOnce {
        fn condition(&self, state: &Counter) -> bool {
            state.enabled
        }

        fn evolve(&self, state: &mut Counter, _dt: f32) {
            state.enabled = false;
        }
    }

    type Event = TransientEvent<Slot, u32>;

    #[test]
    fn test_evolver_runs_only_when_condition_holds() {
        let mut state = Counter::default();
        let mut bus: EventBus<Event> = EventBus::new();
        let mut engine: EvolveEngine<Counter> = EvolveEngine::new(vec![Box::new(AccrueWhileEnabled)], 0.0);

        engine.update(&mut state, 0.5, 0.5, &mut bus);
        assert_eq!(state.value, 0.0);

        state.enabled = true;
        engine.update(&mut state, 1.0, 0.5, &mut bus);
        engine.update(&mut state, 1.5, 0.5, &mut bus);
        assert_eq!(state.value, 1.0);
    }

    #[test]
    fn test_conditions_are_evaluated_before_any_evolve() {
        let mut state = Counter {
            enabled: true,
            ..Default::default()
        };
        let mut bus: EventBus<Event> = EventBus::new();
        let mut engine: EvolveEngine<Counter> = EvolveEngine::new(
            vec![Box::new(DisableOnce), Box::new(AccrueWhileEnabled)],
            0.0,
        );
        engine.update(&mut state, 0.25, 0.25, &mut bus);
        assert!(!state.enabled);
        assert_eq!(state.value, 0.25);
    }

    #[test]
    fn test_transient_lifecycle() {
        let mut state = Counter::default();
        let mut bus: EventBus<Event> = EventBus::new();
        let mut engine: EvolveEngine<Counter> = EvolveEngine::new(Vec::new(), 10.0);

        engine.run_transient(&mut state, Slot::Fade, 7, 1.0, &mut bus);
        assert_eq!(bus.dequeue(), Some(TransientEvent::Started { slot: Slot::Fade, payload: 7 }));
        let fade = state.fade.as_ref().unwrap();
        assert_eq!(fade.start_time, 10.0);
        assert_eq!(fade.completion, 0.0);

        let mut last = 0.0;
        let mut time = 10.0;
        while state.fade.is_some() {
            time += 1.0 / 60.0;
            engine.update(&mut state, time, 1.0 / 60.0, &mut bus);
            if let Some(fade) = &state.fade {
                assert!(fade.completion >= last);
                assert!(fade.completion < 1.0);
                last = fade.completion;
            }
        }

        match bus.dequeue() {
            Some(TransientEvent::Finished { slot, transient }) => {
                assert_eq!(slot, Slot::Fade);
                assert_eq!(transient.completion, 1.0);
                assert_eq!(transient.payload, 7);
            }
            other => panic!("expected Finished, got {other:?}"),
        }
        assert!(bus.is_empty());
        assert!(!engine.is_tracking(Slot::Fade));

        // Nothing more fires on later ticks
        engine.update(&mut state, time + 1.0, 1.0, &mut bus);
        assert!(bus.is_empty());
    }

    #[test]
    fn test_concurrent_transients_are_independent() {
        let mut state = Counter::default();
        let mut bus: EventBus<Event> = EventBus::new();
        let mut engine: EvolveEngine<Counter> = EvolveEngine::new(Vec::new(), 0.0);

        engine.run_transient(&mut state, Slot::Fade, 1, 2.0, &mut bus);
        engine.run_transient(&mut state, Slot::Flash, 2, 0.5, &mut bus);
        bus.clear();

        engine.update(&mut state, 1.0, 1.0, &mut bus);
        assert!(state.flash.is_none());
        assert_eq!(state.fade.as_ref().map(|t| t.completion), Some(0.5));
        assert!(matches!(bus.dequeue(), Some(TransientEvent::Finished { slot: Slot::Flash, .. })));

        engine.update(&mut state, 2.0, 1.0, &mut bus);
        assert!(state.fade.is_none());
        assert!(matches!(bus.dequeue(), Some(TransientEvent::Finished { slot: Slot::Fade, .. })));
    }

    #[test]
    fn test_externally_cleared_slot_is_forgotten() {
        let mut state = Counter::default();
        let mut bus: EventBus<Event> = EventBus::new();
        let mut engine: EvolveEngine<Counter> = EvolveEngine::new(Vec::new(), 0.0);

        engine.run_transient(&mut state, Slot::Fade, 0, 1.0, &mut bus);
        bus.clear();
        state.fade = None;
        engine.update(&mut state, 5.0, 5.0, &mut bus);
        assert!(bus.is_empty());
        assert!(!engine.is_tracking(Slot::Fade));
    }

    #[test]
    fn test_zero_duration_finishes_next_update() {
        let transient = Transient::new(3.0, 0.0, ());
        assert_eq!(transient.completion_at(3.0), 1.0);
    }
}
