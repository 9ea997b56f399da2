//! Astro Fling - rescue a drifting astronaut under rotating gravity
//!
//! Core modules:
//! - `sim`: Deterministic level engine (physics, layout, lifecycle, contacts)
//! - `session`: Run controller for Progression and Timed-Attempts play
//! - `highscores` / `wallet`: Persisted scores and currency
//! - `persistence`: Key-value storage seam provided by the host
//! - `assets` / `audio`: Logical asset lookups and sound cue resolution
//! - `settings`: Player settings and designer tuning

pub mod assets;
pub mod audio;
pub mod error;
pub mod highscores;
pub mod persistence;
pub mod session;
pub mod settings;
pub mod sim;
pub mod wallet;

pub use error::{PhysicsError, StoreError, WalletError};
pub use highscores::HighScores;
pub use session::{PlayMode, RunChoice, Session, SessionEvent};
pub use settings::{Settings, Tuning};
pub use wallet::Wallet;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;

    /// Scene dimensions (origin bottom-left, y up)
    pub const SCENE_WIDTH: f32 = 400.0;
    pub const SCENE_HEIGHT: f32 = 800.0;
    /// Inset of the rocket spawn corners from the scene edges
    pub const SPAWN_CORNER_INSET: f32 = 60.0;

    /// Rocket body
    pub const ROCKET_RADIUS: f32 = 18.0;
    pub const ROCKET_MASS: f32 = 1.0;
    /// Rocket speed clamp (units/s, enforced every step)
    pub const ROCKET_MAX_SPEED: f32 = 300.0;
    /// Largest single fling impulse accepted from input
    pub const MAX_FLING_IMPULSE: f32 = 220.0;

    /// Astronaut contact region
    pub const ASTRONAUT_RADIUS: f32 = 24.0;
    /// Mass given to the astronaut once it is attached to a sticky obstacle
    pub const ATTACHED_ASTRONAUT_MASS: f32 = 0.001;

    /// Obstacle speed clamp (units/s, enforced every step)
    pub const OBSTACLE_MAX_SPEED: f32 = 150.0;

    /// Seconds on the level clock
    pub const LEVEL_DURATION: f32 = 15.0;

    /// Reveal sequence timings (seconds)
    pub const FADE_IN_DURATION: f32 = 0.4;
    pub const REVEAL_GAP: f32 = 0.3;
    pub const ACTIVATION_PAUSE: f32 = 0.2;
    pub const COUNTDOWN_PAUSE: f32 = 0.1;
    pub const TEARDOWN_FADE_DURATION: f32 = 0.3;
    /// Astronaut collection animation length
    pub const COLLECT_DURATION: f32 = 0.65;

    /// Number of distinct level backgrounds
    pub const BACKGROUND_COUNT: u32 = 10;
}

/// Normalize an angle to [0, 2π)
#[inline]
pub fn wrap_angle(angle: f32) -> f32 {
    angle.rem_euclid(std::f32::consts::TAU)
}

/// Unit vector for an angle in radians
#[inline]
pub fn direction(theta: f32) -> Vec2 {
    Vec2::new(theta.cos(), theta.sin())
}

/// Centre of the scene, where the astronaut waits
#[inline]
pub fn scene_center() -> Vec2 {
    Vec2::new(consts::SCENE_WIDTH / 2.0, consts::SCENE_HEIGHT / 2.0)
}
