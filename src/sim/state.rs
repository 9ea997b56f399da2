//! Level state and core simulation types
//!
//! Everything a host needs to draw a level lives here as plain data: bodies
//! come from the physics world, fades and sprite transforms are explicit
//! fields, and the current lifecycle phase is a value.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::body::{Body, BodyId, category};
use super::gravity::RotatingGravity;
use super::world::{JointId, PhysicsWorld};
use crate::consts::*;
use crate::settings::Tuning;

/// One of the four rocket spawn corners
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpawnCorner {
    BottomLeft,
    BottomRight,
    TopRight,
    TopLeft,
}

impl SpawnCorner {
    pub const ALL: [SpawnCorner; 4] = [
        SpawnCorner::BottomLeft,
        SpawnCorner::BottomRight,
        SpawnCorner::TopRight,
        SpawnCorner::TopLeft,
    ];

    /// Corner for a monotonically increasing spawn index
    pub fn from_index(index: u64) -> Self {
        Self::ALL[(index % 4) as usize]
    }

    /// Rocket spawn position for this corner
    pub fn position(&self) -> Vec2 {
        let (lo_x, hi_x) = (SPAWN_CORNER_INSET, SCENE_WIDTH - SPAWN_CORNER_INSET);
        let (lo_y, hi_y) = (SPAWN_CORNER_INSET, SCENE_HEIGHT - SPAWN_CORNER_INSET);
        match self {
            SpawnCorner::BottomLeft => Vec2::new(lo_x, lo_y),
            SpawnCorner::BottomRight => Vec2::new(hi_x, lo_y),
            SpawnCorner::TopRight => Vec2::new(hi_x, hi_y),
            SpawnCorner::TopLeft => Vec2::new(lo_x, hi_y),
        }
    }
}

/// Spawn-corner counter owned by the run controller
///
/// Successive level loads cycle through the corners in order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpawnCycle {
    next_index: u64,
}

impl SpawnCycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the next corner and advance the counter
    pub fn next_corner(&mut self) -> SpawnCorner {
        let corner = SpawnCorner::from_index(self.next_index);
        self.next_index += 1;
        corner
    }

    /// Index the next call to [`Self::next_corner`] will use
    pub fn peek_index(&self) -> u64 {
        self.next_index
    }
}

/// Obstacle variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObstacleKind {
    Normal,
    Sticky,
    Bouncy,
    GravityWell,
}

impl ObstacleKind {
    pub const ALL: [ObstacleKind; 4] = [
        ObstacleKind::Normal,
        ObstacleKind::Sticky,
        ObstacleKind::Bouncy,
        ObstacleKind::GravityWell,
    ];

    /// Logical image name
    pub fn asset_name(&self) -> &'static str {
        match self {
            ObstacleKind::Normal => "obstacle_normal",
            ObstacleKind::Sticky => "obstacle_sticky",
            ObstacleKind::Bouncy => "obstacle_bouncy",
            ObstacleKind::GravityWell => "obstacle_gravity_well",
        }
    }

    /// Weight in the level's type bag
    pub fn weight(&self, level: u32) -> u32 {
        match self {
            ObstacleKind::Normal => 4u32.saturating_sub(level / 3).max(1),
            ObstacleKind::Sticky | ObstacleKind::Bouncy => (level / 2 + 1).min(3),
            ObstacleKind::GravityWell => (level / 3).min(2),
        }
    }

    pub fn restitution(&self) -> f32 {
        match self {
            ObstacleKind::Normal => 0.8,
            ObstacleKind::Sticky => 0.05,
            ObstacleKind::Bouncy => 1.2,
            ObstacleKind::GravityWell => 0.3,
        }
    }

    /// Category bits carried by obstacles of this kind
    pub fn category_bits(&self) -> u32 {
        match self {
            ObstacleKind::Normal => category::OBSTACLE | category::NORMAL_OBSTACLE,
            ObstacleKind::Sticky => category::OBSTACLE | category::STICKY_OBSTACLE,
            _ => category::OBSTACLE,
        }
    }

    /// Categories this kind bounces off
    pub fn collision_bits(&self) -> u32 {
        match self {
            ObstacleKind::GravityWell => category::ROCKET,
            _ => category::ROCKET | category::OBSTACLE,
        }
    }

    /// Categories whose touch is reported
    pub fn contact_bits(&self) -> u32 {
        match self {
            ObstacleKind::Normal => category::ROCKET,
            ObstacleKind::Sticky => category::ASTRONAUT,
            _ => category::NONE,
        }
    }
}

/// How an obstacle behaves once physics activates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObstacleStatus {
    /// Turned dynamic and pushed by its stored impulse
    Moving,
    /// Stays static
    Static,
    /// Placed at a fixed safe coordinate after random placement starved; static
    Fallback,
}

/// An obstacle in the level
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    pub body: BodyId,
    pub kind: ObstacleKind,
    pub status: ObstacleStatus,
    pub radius: f32,
    /// Fade-in opacity (0 = invisible)
    pub alpha: f32,
}

/// Impulse waiting for physics activation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QueuedImpulse {
    pub obstacle: BodyId,
    pub impulse: Vec2,
}

/// The player's rocket
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rocket {
    pub body: BodyId,
    pub corner: SpawnCorner,
    pub alpha: f32,
    /// Fling waiting for the next physics step
    pub pending_fling: Option<Vec2>,
}

/// Cosmetic astronaut sprite
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sprite {
    pub pos: Vec2,
    pub scale: f32,
    pub alpha: f32,
}

/// Link between the astronaut and a sticky obstacle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub joint: JointId,
    pub obstacle: BodyId,
}

/// The rescue target: a contact region plus an optional sprite
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Astronaut {
    pub body: BodyId,
    /// `None` when the sprite asset is missing
    pub sprite: Option<Sprite>,
    /// Contact region opacity, used when no sprite is drawn
    pub alpha: f32,
    pub attachment: Option<Attachment>,
}

/// Level backdrop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Background {
    /// 1-based background number
    pub index: u32,
    pub asset: String,
    /// Follows the gravity angle
    pub rotation: f32,
    pub alpha: f32,
}

/// Background number for a level: `(level - 1) mod 10 + 1`
pub fn background_index(level: u32) -> u32 {
    level.saturating_sub(1) % BACKGROUND_COUNT + 1
}

/// Number of obstacles a level asks for: `min(10, level + 1)`, none for level 0
pub fn obstacle_target(level: u32) -> usize {
    if level == 0 {
        return 0;
    }
    (level as usize + 1).min(10)
}

/// Previous level's content fading out before removal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transient {
    pub bodies: Vec<Body>,
    pub background: Option<Background>,
    pub alpha: f32,
}

/// Stars for the fraction of the clock left at the moment of success
pub fn stars_for_fraction(remaining_fraction: f64) -> u8 {
    if remaining_fraction >= 0.8 {
        5
    } else if remaining_fraction >= 0.6 {
        4
    } else if remaining_fraction >= 0.4 {
        3
    } else if remaining_fraction >= 0.2 {
        2
    } else if remaining_fraction > 0.0 {
        1
    } else {
        0
    }
}

/// Whole-second level countdown
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelTimer {
    pub remaining: u32,
    pub total: u32,
    /// Sub-second time accumulated toward the next tick
    accum: f32,
    pub running: bool,
}

impl LevelTimer {
    pub fn new(duration_secs: f32) -> Self {
        let total = duration_secs.round().max(1.0) as u32;
        Self {
            remaining: total,
            total,
            accum: 0.0,
            running: false,
        }
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    /// Stop without losing the partial second
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Advance by `dt`; returns the remaining-seconds value of every whole
    /// second that elapsed
    pub fn advance(&mut self, dt: f32) -> Vec<u32> {
        let mut ticks = Vec::new();
        if !self.running || self.remaining == 0 {
            return ticks;
        }
        self.accum += dt;
        while self.accum >= 1.0 && self.remaining > 0 {
            self.accum -= 1.0;
            self.remaining -= 1;
            ticks.push(self.remaining);
        }
        ticks
    }

    pub fn remaining_fraction(&self) -> f64 {
        self.remaining as f64 / self.total as f64
    }

    pub fn expired(&self) -> bool {
        self.remaining == 0
    }
}

/// Staged reveal steps, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RevealStep {
    AstronautFadeIn,
    RocketFadeIn,
    ObstaclesFadeIn,
    /// Pause before the bodies go live
    PhysicsActivation,
    /// Pause before the clock starts
    CountdownStart,
}

impl RevealStep {
    /// Time spent in this step before moving on
    pub fn duration(&self) -> f32 {
        match self {
            RevealStep::AstronautFadeIn | RevealStep::RocketFadeIn => FADE_IN_DURATION + REVEAL_GAP,
            RevealStep::ObstaclesFadeIn => FADE_IN_DURATION,
            RevealStep::PhysicsActivation => ACTIVATION_PAUSE,
            RevealStep::CountdownStart => COUNTDOWN_PAUSE,
        }
    }

    pub fn next(&self) -> Option<RevealStep> {
        match self {
            RevealStep::AstronautFadeIn => Some(RevealStep::RocketFadeIn),
            RevealStep::RocketFadeIn => Some(RevealStep::ObstaclesFadeIn),
            RevealStep::ObstaclesFadeIn => Some(RevealStep::PhysicsActivation),
            RevealStep::PhysicsActivation => Some(RevealStep::CountdownStart),
            RevealStep::CountdownStart => None,
        }
    }
}

/// Lifecycle phase of the level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LevelPhase {
    /// Nothing loaded
    Idle,
    /// Previous content fading out
    TearingDown { elapsed: f32 },
    /// New content being built (instantaneous)
    Building,
    /// Staged fade-in and activation
    Reveal { step: RevealStep, elapsed: f32 },
    /// Clock running, rocket live
    Active,
    /// Astronaut flying into the rocket before success is reported
    Collecting {
        elapsed: f32,
        stars: u8,
        from: Vec2,
    },
    Succeeded { stars: u8 },
    TimedOut,
    Aborted,
}

impl LevelPhase {
    /// Whether the level has reached a terminal state
    pub fn is_concluded(&self) -> bool {
        matches!(
            self,
            LevelPhase::Succeeded { .. } | LevelPhase::TimedOut | LevelPhase::Aborted
        )
    }
}

/// Assets resolved for a level before it is built
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelAssets {
    /// Background image name, if present
    pub background: Option<String>,
    pub astronaut_sprite: bool,
    /// Obstacle kinds whose image exists
    pub obstacle_kinds: Vec<ObstacleKind>,
}

impl Default for LevelAssets {
    fn default() -> Self {
        Self {
            background: None,
            astronaut_sprite: true,
            obstacle_kinds: ObstacleKind::ALL.to_vec(),
        }
    }
}

/// A level load waiting for teardown to finish
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelRequest {
    pub level: u32,
    pub corner: SpawnCorner,
    pub seed: u64,
    pub assets: LevelAssets,
}

/// Complete state of the level scene
#[derive(Debug)]
pub struct LevelScene {
    /// Current level number (1-based; 0 before the first load)
    pub level: u32,
    pub phase: LevelPhase,
    pub world: PhysicsWorld,
    pub rocket: Option<Rocket>,
    pub astronaut: Option<Astronaut>,
    /// Sorted by body id
    pub obstacles: Vec<Obstacle>,
    pub background: Option<Background>,
    pub transient: Option<Transient>,
    pub pending_impulses: Vec<QueuedImpulse>,
    pub gravity: RotatingGravity,
    pub timer: LevelTimer,
    /// One-way latch per level instance
    pub game_over: bool,
    pub paused: bool,
    /// Set once the reveal sequence has turned the bodies live
    pub physics_active: bool,
    pub tuning: Tuning,
    pub(crate) pending_load: Option<LevelRequest>,
    pub(crate) rng: Pcg32,
}

impl LevelScene {
    /// An empty scene; call [`super::load_level`] to start a level
    pub fn new(tuning: Tuning) -> Self {
        Self {
            level: 0,
            phase: LevelPhase::Idle,
            world: PhysicsWorld::new(Vec2::ZERO, Vec2::new(SCENE_WIDTH, SCENE_HEIGHT)),
            rocket: None,
            astronaut: None,
            obstacles: Vec::new(),
            background: None,
            transient: None,
            pending_impulses: Vec::new(),
            gravity: RotatingGravity::new(tuning.gravity_magnitude, tuning.gravity_rotation_rate),
            timer: LevelTimer::new(tuning.level_duration),
            game_over: false,
            paused: false,
            physics_active: false,
            tuning,
            pending_load: None,
            rng: Pcg32::seed_from_u64(0),
        }
    }

    pub fn rocket_body(&self) -> Option<Body> {
        self.rocket.as_ref().and_then(|r| self.world.body(r.body))
    }

    pub fn astronaut_body(&self) -> Option<Body> {
        self.astronaut.as_ref().and_then(|a| self.world.body(a.body))
    }

    pub fn obstacle(&self, body: BodyId) -> Option<&Obstacle> {
        self.obstacles.iter().find(|o| o.body == body)
    }

    /// Whether the rocket has been switched to dynamic
    pub fn rocket_is_dynamic(&self) -> bool {
        self.rocket_body().is_some_and(|b| b.dynamic)
    }

    /// Whether any content is on screen that must fade before a rebuild
    pub fn has_transient_content(&self) -> bool {
        self.rocket.is_some()
            || self.astronaut.is_some()
            || !self.obstacles.is_empty()
            || self.background.is_some()
    }
}
