//! Circle geometry queries
//!
//! Used by the layout generator for placement and by the physics world to
//! locate the point where two bodies met.

use glam::Vec2;

/// Result of a collision check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether a collision occurred
    pub hit: bool,
    /// Contact point (if hit)
    pub point: Vec2,
    /// Surface normal at contact, pointing from the first shape toward the second
    pub normal: Vec2,
    /// Penetration depth (for position correction)
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            point: Vec2::ZERO,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// Check overlap between two circles
///
/// The normal points from `a` toward `b`; the contact point sits on the
/// surface of `a` along that normal.
pub fn circle_circle_collision(a_pos: Vec2, a_radius: f32, b_pos: Vec2, b_radius: f32) -> CollisionResult {
    let delta = b_pos - a_pos;
    let dist_sq = delta.length_squared();
    let reach = a_radius + b_radius;

    if dist_sq >= reach * reach {
        return CollisionResult::miss();
    }

    let dist = dist_sq.sqrt();
    // Concentric circles: pick an arbitrary but stable axis
    let normal = if dist > 1e-4 { delta / dist } else { Vec2::X };

    CollisionResult {
        hit: true,
        point: a_pos + normal * a_radius,
        normal,
        penetration: reach - dist,
    }
}

/// Whether a circle overlaps an axis-aligned box
pub fn circle_intersects_rect(pos: Vec2, radius: f32, min: Vec2, max: Vec2) -> bool {
    let closest = pos.clamp(min, max);
    pos.distance_squared(closest) < radius * radius
}
