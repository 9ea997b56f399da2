//! Deterministic simulation module
//!
//! All level logic lives here. This module must be pure and deterministic:
//! - Time only advances through `tick`
//! - Seeded RNG only
//! - Stable iteration order (by body ID)
//! - No rendering or storage dependencies

pub mod body;
pub mod collision;
pub mod contact;
pub mod gravity;
pub mod layout;
pub mod lifecycle;
pub mod state;
pub mod world;

pub use body::{Body, BodyId, RadialField};
pub use collision::CollisionResult;
pub use contact::resolve_contact;
pub use gravity::RotatingGravity;
pub use layout::{LayoutRequest, ObstaclePlan, generate_layout};
pub use lifecycle::{Cue, LevelEvent, TickInput, load_level, tick};
pub use state::{
    LevelAssets, LevelPhase, LevelRequest, LevelScene, LevelTimer, Obstacle, ObstacleKind,
    ObstacleStatus, RevealStep, SpawnCorner, SpawnCycle, stars_for_fraction,
};
pub use world::{Contact, FixedJoint, JointId, PhysicsWorld};
