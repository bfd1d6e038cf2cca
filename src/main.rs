//! Undergame entry point
//!
//! On the web the browser shell drives `undergame::platform::WebGame`
//! directly. Natively there is no window: this runs a headless autopilot
//! flight and logs deaths, sound cues and the score.
//!
//! Usage: `undergame [seconds] [seed]`

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use undergame::audio::AudioSink;
    use undergame::consts::FRAME_DT;
    use undergame::{GameConfig, SoundCue, Simulation};

    /// Looks this far ahead of the worm when steering
    const LOOKAHEAD: f32 = 1.5;

    /// Logs cues instead of playing them
    struct LogSink;

    impl AudioSink for LogSink {
        fn play(&mut self, cue: SoundCue) {
            log::info!("♪ {}", cue.as_str());
        }
    }

    /// Climb whenever the worm is below the cave midline just ahead
    fn autopilot(sim: &mut Simulation) -> bool {
        let worm = sim.state().worm.position();
        let (top, bottom) = sim.cave_mut().surfaces_at(worm.x + LOOKAHEAD);
        worm.y < (top + bottom) / 2.0
    }

    pub fn run(seconds: f32, seed: u64) {
        log::info!("Undergame (native) starting: {seconds}s of autopilot, seed {seed}");

        let mut sim = Simulation::new(GameConfig::default(), seed);
        let mut sink = LogSink;
        let ticks = (seconds / FRAME_DT).ceil() as u64;
        let mut best = 0u64;
        let mut deaths = 0;

        for tick in 1..=ticks {
            let held = autopilot(&mut sim);
            sim.set_input("ArrowUp", held);
            sim.update(tick as f64 * FRAME_DT as f64, FRAME_DT);

            let hum = sim.projection().uniforms.point_zone_intensity;
            sim.cues_mut().dispatch(&mut sink, hum);

            best = best.max(sim.projection().points);
            if sim.deaths() != deaths {
                deaths = sim.deaths();
                log::info!(
                    "Death #{} at x = {:.1} m",
                    deaths,
                    sim.state().worm.position().x
                );
            }
        }

        log::info!(
            "Flew {:.1} m in the current life, {} points now, best {}, {} deaths",
            sim.state().worm.position().x,
            sim.projection().points,
            best,
            deaths
        );
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let seconds = args.next().and_then(|s| s.parse().ok()).unwrap_or(60.0);
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(42);
    headless::run(seconds, seed);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The browser shell constructs WebGame itself, this is just to satisfy the compiler
}
