//! Rotating global gravity
//!
//! The field starts on one of four diagonals picked from the rocket's spawn
//! corner and sweeps counter-clockwise at a constant rate while the level is live.

use std::f32::consts::{FRAC_PI_4, PI};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::SpawnCorner;
use crate::{direction, wrap_angle};

/// Default sweep rate (radians per second)
pub const DEFAULT_ROTATION_RATE: f32 = PI / 10.0;

/// Base angle for a spawn corner
///
/// Each corner's base is the diagonal a quarter turn counter-clockwise from the
/// direction pointing at the scene centre, so the first push is sideways
/// relative to the target rather than toward or away from it.
pub fn base_angle_for(corner: SpawnCorner) -> f32 {
    match corner {
        // Centre lies at 45°
        SpawnCorner::BottomLeft => 3.0 * FRAC_PI_4,
        // Centre lies at 135°
        SpawnCorner::BottomRight => 5.0 * FRAC_PI_4,
        // Centre lies at 225°
        SpawnCorner::TopRight => 7.0 * FRAC_PI_4,
        // Centre lies at 315°
        SpawnCorner::TopLeft => FRAC_PI_4,
    }
}

/// The global field vector and its sweep state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RotatingGravity {
    /// Current angle (radians, [0, 2π))
    pub angle: f32,
    /// Sweep rate (radians per second)
    pub rate: f32,
    /// Field strength (units/s²)
    pub magnitude: f32,
    /// Whether the sweep has been started for this level
    pub active: bool,
}

impl RotatingGravity {
    pub fn new(magnitude: f32, rate: f32) -> Self {
        Self {
            angle: 0.0,
            rate,
            magnitude,
            active: false,
        }
    }

    /// Begin the sweep from the base angle of `corner`
    pub fn start(&mut self, corner: SpawnCorner) {
        self.angle = base_angle_for(corner);
        self.active = true;
    }

    pub fn stop(&mut self) {
        self.active = false;
    }

    /// Advance the sweep; no-op until started
    pub fn advance(&mut self, dt: f32) {
        if self.active {
            self.angle = wrap_angle(self.angle + self.rate * dt);
        }
    }

    /// Field vector `(cos θ, sin θ) × magnitude`, zero while inactive
    pub fn vector(&self) -> Vec2 {
        if self.active {
            direction(self.angle) * self.magnitude
        } else {
            Vec2::ZERO
        }
    }
}
