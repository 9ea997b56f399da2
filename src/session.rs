//! Run/session controller
//!
//! Owns the level scene and everything that outlives a single level: the
//! spawn-corner cycle, the run score, the Timed-Attempts window, pause state,
//! high scores and the wallet. Hosts drive it with [`Session::update`] and
//! read back [`SessionEvent`]s.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::assets::{AssetCatalog, resolve_level_assets};
use crate::highscores::HighScores;
use crate::persistence::KeyValueStore;
use crate::settings::{Settings, Tuning};
use crate::sim::{
    Cue, LevelEvent, LevelPhase, LevelRequest, LevelScene, LevelTimer, SpawnCorner, SpawnCycle,
    TickInput, load_level, tick,
};
use crate::wallet::Wallet;

/// Game modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayMode {
    /// Levels 1, 2, 3, ... until a timeout or the player stops
    Progression,
    /// Rescue as many astronauts as possible inside a fixed window
    TimedAttempts,
}

/// Player's answer at the between-levels interstitial
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunChoice {
    NextLevel,
    EndRun,
}

/// Where the run is
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RunPhase {
    /// No run started yet
    Idle,
    Playing,
    /// Progression only: waiting for [`RunChoice`]
    Interstitial { stars: u8, level: u32 },
    Over,
}

/// Running totals for the current run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunState {
    pub mode: PlayMode,
    /// Stars earned this run
    pub stars: u64,
    pub levels_completed: u32,
    /// Current attempt number (Timed-Attempts)
    pub attempts: u32,
}

impl RunState {
    fn new(mode: PlayMode) -> Self {
        Self {
            mode,
            stars: 0,
            levels_completed: 0,
            attempts: 0,
        }
    }

    /// Score recorded at run end: stars in Progression, rescues in Timed-Attempts
    pub fn score(&self) -> i64 {
        match self.mode {
            PlayMode::Progression => self.stars as i64,
            PlayMode::TimedAttempts => self.levels_completed as i64,
        }
    }
}

/// Events produced by the session
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionEvent {
    /// Passed through from the level scene
    Level(LevelEvent),
    LevelStarted { level: u32, corner: SpawnCorner },
    /// Progression: the player must pick a [`RunChoice`]
    AwaitingChoice { stars: u8, level: u32 },
    /// Timed-Attempts window countdown
    RunTimerTick(u32),
    RunOver {
        mode: PlayMode,
        score: i64,
        /// Levels loaded during the run, retries included
        attempts: u32,
        rank: Option<usize>,
    },
}

/// One player's play session
pub struct Session {
    pub scene: LevelScene,
    pub phase: RunPhase,
    pub run: RunState,
    pub high_scores: HighScores,
    pub wallet: Wallet,
    tuning: Tuning,
    settings: Settings,
    spawn_cycle: SpawnCycle,
    run_seed: u64,
    level_loads: u64,
    /// Timed-Attempts window
    run_timer: Option<LevelTimer>,
    paused: bool,
    /// Signals forwarded to the scene on the next update
    pending: TickInput,
    ending: bool,
    store: Box<dyn KeyValueStore>,
    catalog: Box<dyn AssetCatalog>,
}

impl Session {
    /// Create a session, loading scores, wallet and settings from `store`
    pub fn new(
        tuning: Tuning,
        seed: u64,
        store: Box<dyn KeyValueStore>,
        catalog: Box<dyn AssetCatalog>,
    ) -> Self {
        let high_scores = HighScores::load(&*store);
        let wallet = Wallet::load(&*store);
        let settings = Settings::load(&*store);
        Self {
            scene: LevelScene::new(tuning.clone()),
            phase: RunPhase::Idle,
            run: RunState::new(PlayMode::Progression),
            high_scores,
            wallet,
            tuning,
            settings,
            spawn_cycle: SpawnCycle::new(),
            run_seed: seed,
            level_loads: 0,
            run_timer: None,
            paused: false,
            pending: TickInput::default(),
            ending: false,
            store,
            catalog,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Replace the player settings and persist them
    pub fn set_settings(&mut self, settings: Settings) {
        self.settings = settings.sanitized();
        self.settings.save(&mut *self.store);
    }

    /// Whether the player wants this cue delivered
    fn cue_enabled(&self, cue: &Cue) -> bool {
        match cue {
            Cue::Haptic => self.settings.haptics,
            Cue::Particles { .. } => self.settings.particles,
            Cue::Sound(_) => true,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Seconds left in the Timed-Attempts window
    pub fn run_time_remaining(&self) -> Option<u32> {
        self.run_timer.as_ref().map(|t| t.remaining)
    }

    /// Begin a run; the spawn-corner cycle carries on from earlier runs
    pub fn start_run(&mut self, mode: PlayMode) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        log::info!("Starting {:?} run", mode);
        self.run = RunState::new(mode);
        self.phase = RunPhase::Playing;
        self.ending = false;
        self.pending = TickInput {
            pause: Some(self.paused),
            ..Default::default()
        };
        self.run_timer = match mode {
            PlayMode::Progression => None,
            PlayMode::TimedAttempts => {
                let mut timer = LevelTimer::new(self.tuning.timed_run_seconds);
                if !self.paused {
                    timer.start();
                }
                Some(timer)
            }
        };
        self.start_level(1, &mut events);
        events
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
        self.pending.pause = Some(paused);
        if let Some(timer) = self.run_timer.as_mut() {
            if paused {
                timer.stop();
            } else if self.phase == RunPhase::Playing {
                timer.start();
            }
        }
    }

    /// Queue a fling for the next update
    pub fn fling(&mut self, impulse: Vec2) {
        self.pending.fling = Some(impulse);
    }

    /// Request the run to end; takes effect on the next update
    pub fn end_run(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        match self.phase {
            RunPhase::Interstitial { .. } => self.finish_run(&mut events),
            RunPhase::Playing => {
                self.ending = true;
                self.pending.end_run = true;
            }
            RunPhase::Idle | RunPhase::Over => {}
        }
        events
    }

    /// Answer the Progression interstitial
    pub fn choose(&mut self, choice: RunChoice) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        let RunPhase::Interstitial { level, .. } = self.phase else {
            log::warn!("No choice pending");
            return events;
        };
        match choice {
            RunChoice::NextLevel => {
                self.phase = RunPhase::Playing;
                self.start_level(level + 1, &mut events);
            }
            RunChoice::EndRun => self.finish_run(&mut events),
        }
        events
    }

    /// Advance by `dt` seconds of real time
    pub fn update(&mut self, dt: f32) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        if matches!(self.phase, RunPhase::Idle | RunPhase::Over) {
            return events;
        }

        let input = std::mem::take(&mut self.pending);
        for event in tick(&mut self.scene, &input, dt) {
            if let LevelEvent::Cue(cue) = &event {
                if !self.cue_enabled(cue) {
                    continue;
                }
            }
            events.push(SessionEvent::Level(event));
            match event {
                LevelEvent::LevelSuccess { stars, level } => {
                    self.on_level_success(stars, level, &mut events)
                }
                LevelEvent::LevelOrRunOver => self.on_level_over(&mut events),
                LevelEvent::TimerTick(_) | LevelEvent::Cue(_) => {}
            }
        }

        if self.phase == RunPhase::Playing && !self.paused {
            let ticks = self
                .run_timer
                .as_mut()
                .map(|t| t.advance(dt))
                .unwrap_or_default();
            for remaining in ticks {
                events.push(SessionEvent::RunTimerTick(remaining));
                if remaining == 0 {
                    // Stop whatever level was in flight
                    let stop = TickInput {
                        end_run: true,
                        ..Default::default()
                    };
                    for event in tick(&mut self.scene, &stop, 0.0) {
                        events.push(SessionEvent::Level(event));
                    }
                    self.finish_run(&mut events);
                    break;
                }
            }
        }
        events
    }

    fn start_level(&mut self, level: u32, events: &mut Vec<SessionEvent>) {
        let corner = self.spawn_cycle.next_corner();
        let seed = self.run_seed ^ self.level_loads.wrapping_mul(0x9E37_79B9_7F4A_7C15);
        self.level_loads += 1;
        self.run.attempts += 1;

        let assets = resolve_level_assets(&*self.catalog, level);
        load_level(
            &mut self.scene,
            LevelRequest {
                level,
                corner,
                seed,
                assets,
            },
        );
        events.push(SessionEvent::LevelStarted { level, corner });
    }

    fn on_level_success(&mut self, stars: u8, level: u32, events: &mut Vec<SessionEvent>) {
        if self.phase != RunPhase::Playing {
            return;
        }
        self.run.stars += u64::from(stars);
        self.run.levels_completed += 1;
        self.wallet.deposit(u64::from(stars));

        if self.ending {
            self.finish_run(events);
            return;
        }
        match self.run.mode {
            PlayMode::Progression => {
                self.phase = RunPhase::Interstitial { stars, level };
                events.push(SessionEvent::AwaitingChoice { stars, level });
            }
            PlayMode::TimedAttempts => {
                let next = self.run.levels_completed + 1;
                self.start_level(next, events);
            }
        }
    }

    fn on_level_over(&mut self, events: &mut Vec<SessionEvent>) {
        if self.phase != RunPhase::Playing {
            return;
        }
        let aborted = self.scene.phase == LevelPhase::Aborted;
        match self.run.mode {
            PlayMode::TimedAttempts if !aborted && !self.ending => {
                // Fresh attempt at the same level
                let level = self.run.levels_completed + 1;
                self.start_level(level, events);
            }
            _ => self.finish_run(events),
        }
    }

    fn finish_run(&mut self, events: &mut Vec<SessionEvent>) {
        self.phase = RunPhase::Over;
        self.ending = false;
        self.pending = TickInput::default();
        if let Some(timer) = self.run_timer.as_mut() {
            timer.stop();
        }

        let mode = self.run.mode;
        let score = self.run.score();
        let rank = self.high_scores.add_score(mode, score);
        self.high_scores.save(&mut *self.store);
        self.wallet.save(&mut *self.store);

        let attempts = self.run.attempts;
        log::info!(
            "{:?} run over: score {}, {} levels in {} attempts, rank {:?}",
            mode,
            score,
            self.run.levels_completed,
            attempts,
            rank
        );
        events.push(SessionEvent::RunOver {
            mode,
            score,
            attempts,
            rank,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetManifest;
    use crate::consts::SIM_DT;
    use crate::persistence::MemoryStore;

    fn session() -> Session {
        session_with(Tuning::default(), MemoryStore::new())
    }

    fn session_with(tuning: Tuning, store: MemoryStore) -> Session {
        Session::new(
            tuning,
            42,
            Box::new(store),
            Box::new(AssetManifest::complete().without_image(crate::assets::ASTRONAUT_SPRITE)),
        )
    }

    fn run_until_active(session: &mut Session) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        for _ in 0..600 {
            if session.scene.phase == LevelPhase::Active {
                break;
            }
            events.extend(session.update(SIM_DT));
        }
        events
    }

    /// Park the rocket so only the clock can end the level
    fn park_rocket(session: &mut Session) {
        let id = session.scene.rocket.as_ref().unwrap().body;
        session.scene.world.freeze(id).unwrap();
    }

    /// Drop the rocket onto the astronaut and let the next step report it
    fn rescue(session: &mut Session) -> Vec<SessionEvent> {
        let target = session.scene.astronaut_body().unwrap().pos;
        let id = session.scene.rocket.as_ref().unwrap().body;
        session.scene.world.set_position(id, target).unwrap();
        session.update(SIM_DT)
    }

    fn run_over(events: &[SessionEvent]) -> Option<(i64, Option<usize>)> {
        events.iter().find_map(|e| match e {
            SessionEvent::RunOver { score, rank, .. } => Some((*score, *rank)),
            _ => None,
        })
    }

    #[test]
    fn test_progression_success_then_next_level() {
        let mut s = session();
        let events = s.start_run(PlayMode::Progression);
        assert_eq!(
            events,
            vec![SessionEvent::LevelStarted {
                level: 1,
                corner: SpawnCorner::BottomLeft
            }]
        );

        run_until_active(&mut s);
        let events = rescue(&mut s);
        assert!(events.contains(&SessionEvent::AwaitingChoice { stars: 5, level: 1 }));
        assert_eq!(s.phase, RunPhase::Interstitial { stars: 5, level: 1 });
        assert_eq!(s.wallet.balance(), 5);

        let events = s.choose(RunChoice::NextLevel);
        assert_eq!(
            events,
            vec![SessionEvent::LevelStarted {
                level: 2,
                corner: SpawnCorner::BottomRight
            }]
        );
        assert_eq!(s.phase, RunPhase::Playing);
    }

    #[test]
    fn test_progression_timeout_ends_run() {
        let mut s = session();
        s.start_run(PlayMode::Progression);
        run_until_active(&mut s);
        rescue(&mut s);
        s.choose(RunChoice::NextLevel);
        run_until_active(&mut s);
        park_rocket(&mut s);

        let mut events = Vec::new();
        for _ in 0..20 {
            events.extend(s.update(1.0));
        }
        assert_eq!(run_over(&events), Some((5, Some(1))));
        assert_eq!(s.phase, RunPhase::Over);
        assert_eq!(s.high_scores.progression, vec![5]);
        let attempts = events.iter().find_map(|e| match e {
            SessionEvent::RunOver { attempts, .. } => Some(*attempts),
            _ => None,
        });
        assert_eq!(attempts, Some(2));
    }

    #[test]
    fn test_choose_end_run_records_score() {
        let mut s = session();
        s.start_run(PlayMode::Progression);
        run_until_active(&mut s);
        rescue(&mut s);
        let events = s.choose(RunChoice::EndRun);
        assert_eq!(run_over(&events), Some((5, Some(1))));
    }

    #[test]
    fn test_end_run_mid_reveal() {
        let mut s = session();
        s.start_run(PlayMode::Progression);
        s.update(0.5);
        s.end_run();

        let mut events = Vec::new();
        for _ in 0..200 {
            events.extend(s.update(SIM_DT));
        }
        let overs = events
            .iter()
            .filter(|e| **e == SessionEvent::Level(LevelEvent::LevelOrRunOver))
            .count();
        assert_eq!(overs, 1);
        // Zero is never recorded in Progression
        assert_eq!(run_over(&events), Some((0, None)));
        assert_eq!(s.scene.phase, LevelPhase::Aborted);
        assert!(!s.scene.physics_active);
    }

    #[test]
    fn test_timed_attempts_cycle() {
        let mut s = session();
        s.start_run(PlayMode::TimedAttempts);
        run_until_active(&mut s);
        let events = rescue(&mut s);
        assert!(events.iter().any(|e| matches!(
            e,
            SessionEvent::LevelStarted { level: 2, .. }
        )));
        assert_eq!(s.run.levels_completed, 1);

        // Let an attempt time out: a fresh attempt at the same level
        run_until_active(&mut s);
        park_rocket(&mut s);
        let mut events = Vec::new();
        for _ in 0..16 {
            events.extend(s.update(1.0));
        }
        assert!(events.iter().any(|e| matches!(
            e,
            SessionEvent::LevelStarted { level: 2, .. }
        )));
        assert_eq!(s.phase, RunPhase::Playing);

        // Then the window closes
        let mut events = Vec::new();
        for _ in 0..120 {
            events.extend(s.update(1.0));
            if s.phase == RunPhase::Over {
                break;
            }
        }
        assert_eq!(s.phase, RunPhase::Over);
        let (score, _) = run_over(&events).unwrap();
        assert!(score >= 1);
        assert!(events.contains(&SessionEvent::RunTimerTick(0)));
    }

    #[test]
    fn test_timed_window_expiry_reports_level_over() {
        let tuning = Tuning {
            timed_run_seconds: 3.0,
            ..Default::default()
        };
        let mut s = session_with(tuning, MemoryStore::new());
        s.start_run(PlayMode::TimedAttempts);

        let mut events = Vec::new();
        for _ in 0..400 {
            events.extend(s.update(SIM_DT));
            if s.phase == RunPhase::Over {
                break;
            }
        }
        assert_eq!(s.phase, RunPhase::Over);
        let overs = events
            .iter()
            .filter(|e| **e == SessionEvent::Level(LevelEvent::LevelOrRunOver))
            .count();
        assert_eq!(overs, 1);
        let over_at = events
            .iter()
            .position(|e| *e == SessionEvent::Level(LevelEvent::LevelOrRunOver));
        let run_over_at = events
            .iter()
            .position(|e| matches!(e, SessionEvent::RunOver { .. }));
        assert!(over_at.is_some() && over_at < run_over_at);
        assert_eq!(s.scene.phase, LevelPhase::Aborted);
    }

    #[test]
    fn test_cues_follow_settings() {
        let mut store = MemoryStore::new();
        Settings {
            haptics: false,
            particles: false,
            ..Default::default()
        }
        .save(&mut store);
        let mut s = session_with(Tuning::default(), store);
        assert!(!s.settings().haptics);

        s.start_run(PlayMode::Progression);
        run_until_active(&mut s);
        let events = rescue(&mut s);
        assert!(events.contains(&SessionEvent::Level(LevelEvent::Cue(Cue::Sound(
            crate::audio::SoundEffect::Success
        )))));
        assert!(!events.iter().any(|e| matches!(
            e,
            SessionEvent::Level(LevelEvent::Cue(Cue::Haptic | Cue::Particles { .. }))
        )));

        let mut s = session();
        s.start_run(PlayMode::Progression);
        run_until_active(&mut s);
        let events = rescue(&mut s);
        assert!(events.contains(&SessionEvent::Level(LevelEvent::Cue(Cue::Haptic))));
    }

    #[test]
    fn test_settings_changes_persist() {
        let mut s = session();
        s.set_settings(Settings {
            particles: false,
            sfx_volume: 4.0,
            ..Default::default()
        });
        assert_eq!(s.settings().sfx_volume, 1.0);

        let Session { store, .. } = s;
        let settings = Settings::load(&*store);
        assert!(!settings.particles);
    }

    #[test]
    fn test_timed_zero_score_recorded() {
        let mut s = session();
        s.start_run(PlayMode::TimedAttempts);
        s.end_run();
        let events = s.update(SIM_DT);
        assert_eq!(run_over(&events), Some((0, Some(1))));
        assert_eq!(s.high_scores.timed_attempts, vec![0]);
    }

    #[test]
    fn test_pause_freezes_run_window() {
        let mut s = session();
        s.start_run(PlayMode::TimedAttempts);
        s.update(2.0);
        let before = s.run_time_remaining();
        s.set_paused(true);
        for _ in 0..10 {
            s.update(1.0);
        }
        assert_eq!(s.run_time_remaining(), before);
        assert!(s.scene.paused);
    }

    #[test]
    fn test_spawn_cycle_continues_across_runs() {
        let mut s = session();
        s.start_run(PlayMode::Progression);
        s.end_run();
        s.update(SIM_DT);
        let events = s.start_run(PlayMode::Progression);
        assert_eq!(
            events,
            vec![SessionEvent::LevelStarted {
                level: 1,
                corner: SpawnCorner::BottomRight
            }]
        );
    }

    #[test]
    fn test_scores_persist_between_sessions() {
        let mut s = session();
        s.start_run(PlayMode::Progression);
        run_until_active(&mut s);
        rescue(&mut s);
        s.choose(RunChoice::EndRun);

        let Session { store, .. } = s;
        let reopened = Session::new(
            Tuning::default(),
            1,
            store,
            Box::new(AssetManifest::complete()),
        );
        assert_eq!(reopened.high_scores.progression, vec![5]);
        assert_eq!(reopened.wallet.balance(), 5);
    }
}
