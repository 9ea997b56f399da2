//! Player settings and designer tuning
//!
//! Both are persisted as JSON through the host's key-value store. Missing
//! fields fall back to defaults so older saves keep loading.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::persistence::KeyValueStore;
use crate::sim::gravity::DEFAULT_ROTATION_RATE;

/// Player-facing preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Audio ===
    /// Music volume (0.0 - 1.0)
    pub music_volume: f64,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f64,
    /// Mute everything
    pub muted: bool,

    // === Feedback ===
    /// Haptic pulse on rescue
    pub haptics: bool,
    /// Success particle burst
    pub particles: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            music_volume: 0.7,
            sfx_volume: 1.0,
            muted: false,
            haptics: true,
            particles: true,
        }
    }
}

impl Settings {
    const STORAGE_KEY: &'static str = "astro_fling_settings";

    /// Volumes clamped to [0, 1]
    pub fn sanitized(mut self) -> Self {
        self.music_volume = self.music_volume.clamp(0.0, 1.0);
        self.sfx_volume = self.sfx_volume.clamp(0.0, 1.0);
        self
    }

    /// Load settings, falling back to defaults
    pub fn load(store: &dyn KeyValueStore) -> Self {
        match store.load_json::<Settings>(Self::STORAGE_KEY) {
            Ok(Some(settings)) => {
                log::info!("Loaded settings");
                settings.sanitized()
            }
            Ok(None) => {
                log::info!("Using default settings");
                Self::default()
            }
            Err(e) => {
                log::warn!("Settings unreadable ({e}), using defaults");
                Self::default()
            }
        }
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) {
        match store.save_json(Self::STORAGE_KEY, self) {
            Ok(()) => log::info!("Settings saved"),
            Err(e) => log::warn!("Failed to save settings: {e}"),
        }
    }
}

/// Designer-facing knobs for the level engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Multiplier on the physics step (timers run in real time)
    pub sim_speed: f32,
    /// Chance that a sticky obstacle moves
    pub sticky_moving_chance: f64,
    /// Seconds on each level clock
    pub level_duration: f32,
    /// Global gravity strength (units/s²)
    pub gravity_magnitude: f32,
    /// Gravity sweep rate (radians per second)
    pub gravity_rotation_rate: f32,
    /// Speed range given to moving obstacles at activation
    pub obstacle_speed_min: f32,
    pub obstacle_speed_max: f32,
    pub rocket_max_speed: f32,
    pub obstacle_max_speed: f32,
    /// Pull at the centre of a gravity well (units/s²)
    pub gravity_well_strength: f32,
    /// Well reach as a multiple of the obstacle radius
    pub gravity_well_reach: f32,
    /// Rocket velocity kept per second
    pub rocket_damping: f32,
    /// Overall window for Timed-Attempts runs (seconds)
    pub timed_run_seconds: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            sim_speed: 0.4,
            sticky_moving_chance: 2.0 / 3.0,
            level_duration: LEVEL_DURATION,
            gravity_magnitude: 60.0,
            gravity_rotation_rate: DEFAULT_ROTATION_RATE,
            obstacle_speed_min: 30.0,
            obstacle_speed_max: 60.0,
            rocket_max_speed: ROCKET_MAX_SPEED,
            obstacle_max_speed: OBSTACLE_MAX_SPEED,
            gravity_well_strength: 140.0,
            gravity_well_reach: 3.5,
            rocket_damping: 0.9,
            timed_run_seconds: 60.0,
        }
    }
}

impl Tuning {
    const STORAGE_KEY: &'static str = "astro_fling_tuning";

    /// Parse tuning from JSON; unspecified fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn load(store: &dyn KeyValueStore) -> Self {
        match store.load_json::<Tuning>(Self::STORAGE_KEY) {
            Ok(Some(tuning)) => tuning,
            Ok(None) => Self::default(),
            Err(e) => {
                log::warn!("Tuning unreadable ({e}), using defaults");
                Self::default()
            }
        }
    }
}
