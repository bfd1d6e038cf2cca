//! Sound cues
//!
//! The core holds no audio state. It queues named cues where events are
//! handled; the host drains them into whatever plays sound.

use serde::{Deserialize, Serialize};

/// Sound cue types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundCue {
    /// A new life begins
    Birth,
    /// Worm hit a wall
    Death,
    /// Cave walls slam shut during the death animation
    CaveShut,
    /// Cave opens again on the new seed
    CaveOpen,
    /// Start the looping point-zone hum
    PointZoneStart,
    /// Stop the point-zone hum
    PointZoneStop,
}

impl SoundCue {
    pub fn as_str(&self) -> &'static str {
        match self {
            SoundCue::Birth => "birth",
            SoundCue::Death => "death",
            SoundCue::CaveShut => "cave_shut",
            SoundCue::CaveOpen => "cave_open",
            SoundCue::PointZoneStart => "point_zone_start",
            SoundCue::PointZoneStop => "point_zone_stop",
        }
    }
}

/// Anything that can play cues (Web Audio, a native mixer, a test log)
pub trait AudioSink {
    fn play(&mut self, cue: SoundCue);

    /// Volume of the looping point-zone hum, 0.0 - 1.0
    fn set_hum_volume(&mut self, _volume: f32) {}
}

/// Cues queued since the host last drained
#[derive(Debug, Clone, Default)]
pub struct CueQueue {
    cues: Vec<SoundCue>,
    /// Tracks whether the hum is running so it is not restarted
    hum_playing: bool,
}

impl CueQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, cue: SoundCue) {
        match cue {
            SoundCue::PointZoneStart if self.hum_playing => return,
            SoundCue::PointZoneStart => self.hum_playing = true,
            SoundCue::PointZoneStop => self.hum_playing = false,
            _ => {}
        }
        self.cues.push(cue);
    }

    pub fn is_hum_playing(&self) -> bool {
        self.hum_playing
    }

    pub fn drain(&mut self) -> Vec<SoundCue> {
        std::mem::take(&mut self.cues)
    }

    /// Play every queued cue on `sink` and update the hum volume
    pub fn dispatch(&mut self, sink: &mut dyn AudioSink, hum_volume: f32) {
        for cue in self.drain() {
            sink.play(cue);
        }
        sink.set_hum_volume(if self.hum_playing { hum_volume } else { 0.0 });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        played: Vec<SoundCue>,
        volume: f32,
    }

    impl AudioSink for Recorder {
        fn play(&mut self, cue: SoundCue) {
            self.played.push(cue);
        }

        fn set_hum_volume(&mut self, volume: f32) {
            self.volume = volume;
        }
    }

    #[test]
    fn test_hum_is_not_restarted() {
        let mut queue = CueQueue::new();
        queue.push(SoundCue::PointZoneStart);
        queue.push(SoundCue::PointZoneStart);
        assert_eq!(queue.drain(), vec![SoundCue::PointZoneStart]);

        queue.push(SoundCue::PointZoneStop);
        queue.push(SoundCue::PointZoneStart);
        assert_eq!(queue.drain(), vec![SoundCue::PointZoneStop, SoundCue::PointZoneStart]);
    }

    #[test]
    fn test_dispatch_plays_and_sets_volume() {
        let mut queue = CueQueue::new();
        let mut sink = Recorder::default();
        queue.push(SoundCue::Birth);
        queue.push(SoundCue::PointZoneStart);
        queue.dispatch(&mut sink, 0.7);
        assert_eq!(sink.played, vec![SoundCue::Birth, SoundCue::PointZoneStart]);
        assert_eq!(sink.volume, 0.7);

        queue.push(SoundCue::PointZoneStop);
        queue.dispatch(&mut sink, 0.7);
        assert_eq!(sink.volume, 0.0);
        assert_eq!(SoundCue::CaveShut.as_str(), "cave_shut");
    }
}
