//! Astro Fling headless driver
//!
//! Plays one Progression run with a simple autopilot and logs every event.
//! Run with `RUST_LOG=info` to watch the level lifecycle.

use astro_fling::assets::AssetManifest;
use astro_fling::audio::AudioMixer;
use astro_fling::consts::*;
use astro_fling::persistence::{FileStore, KeyValueStore, MemoryStore};
use astro_fling::session::RunPhase;
use astro_fling::sim::{Cue, LevelEvent, LevelPhase};
use astro_fling::{PlayMode, RunChoice, Session, SessionEvent, Tuning};

/// Seconds of simulated time before the driver gives up
const MAX_RUN_SECONDS: f32 = 600.0;
/// Levels to play before choosing to end the run
const LEVELS_TO_PLAY: u32 = 5;
/// Seconds between autopilot flings
const FLING_INTERVAL: f32 = 0.75;

fn open_store() -> Box<dyn KeyValueStore> {
    match std::env::var("ASTRO_FLING_SAVE_DIR") {
        Ok(dir) => match FileStore::new(dir) {
            Ok(store) => Box::new(store),
            Err(e) => {
                log::warn!("Save directory unavailable ({e}), using memory store");
                Box::new(MemoryStore::new())
            }
        },
        Err(_) => Box::new(MemoryStore::new()),
    }
}

/// Aim at the astronaut, leaning against gravity
fn autopilot(session: &Session) -> Option<glam::Vec2> {
    let scene = &session.scene;
    if scene.phase != LevelPhase::Active {
        return None;
    }
    let rocket = scene.rocket_body()?;
    let target = scene.astronaut_body()?.pos;
    let aim = (target - rocket.pos).normalize_or_zero() - scene.world.gravity.normalize_or_zero() * 0.3;
    Some(aim.normalize_or_zero() * MAX_FLING_IMPULSE * 0.5 - rocket.vel * 0.5)
}

fn main() {
    env_logger::init();
    log::info!("Astro Fling (headless) starting...");

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(0xA57F_11C6);
    let store = open_store();
    let tuning = Tuning::load(&*store);
    let catalog = AssetManifest::complete();
    let mut session = Session::new(tuning, seed, store, Box::new(catalog.clone()));
    let mixer = AudioMixer::from_settings(session.settings());

    let mut events = session.start_run(PlayMode::Progression);
    let mut elapsed = 0.0;
    let mut since_fling = 0.0;

    while elapsed < MAX_RUN_SECONDS {
        for event in events.drain(..) {
            match event {
                SessionEvent::Level(LevelEvent::TimerTick(s)) => log::debug!("{s}s left"),
                SessionEvent::Level(LevelEvent::Cue(Cue::Sound(effect))) => {
                    if let Some(play) = mixer.resolve(effect, &catalog) {
                        log::debug!("play {:?} at {:.2}", play.source, play.volume);
                    }
                }
                SessionEvent::Level(LevelEvent::Cue(cue)) => log::debug!("cue {cue:?}"),
                other => log::info!("{other:?}"),
            }
        }

        match session.phase {
            RunPhase::Over | RunPhase::Idle => break,
            RunPhase::Interstitial { level, .. } => {
                let choice = if level >= LEVELS_TO_PLAY {
                    RunChoice::EndRun
                } else {
                    RunChoice::NextLevel
                };
                events = session.choose(choice);
                continue;
            }
            RunPhase::Playing => {}
        }

        since_fling += SIM_DT;
        if since_fling >= FLING_INTERVAL {
            if let Some(impulse) = autopilot(&session) {
                session.fling(impulse);
                since_fling = 0.0;
            }
        }

        events = session.update(SIM_DT);
        elapsed += SIM_DT;
    }

    if session.phase != RunPhase::Over {
        session.end_run();
        for event in session.update(SIM_DT) {
            log::info!("{event:?}");
        }
    }

    println!(
        "Run finished: {} stars over {} levels, wallet {}",
        session.run.stars,
        session.run.levels_completed,
        session.wallet.balance()
    );
}
