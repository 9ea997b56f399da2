//! Procedural obstacle layout
//!
//! Obstacles are scattered over a 4×5 grid, one per cell, with a weighted mix
//! of kinds that shifts toward hazards as levels climb. Placement never fails:
//! when random attempts starve, a few fixed safe spots are tried and whatever
//! fits is accepted.

use glam::Vec2;
use rand::Rng;

use super::collision::circle_intersects_rect;
use super::state::{ObstacleKind, ObstacleStatus, obstacle_target};
use crate::direction;

pub const GRID_COLUMNS: usize = 4;
pub const GRID_ROWS: usize = 5;
/// Random attempts per requested obstacle
pub const ATTEMPTS_PER_OBSTACLE: usize = 15;

pub const MIN_RADIUS: f32 = 28.0;
pub const BASE_MAX_RADIUS: f32 = 49.0;
/// Cap on the level-driven radius bonus
pub const MAX_RADIUS_BONUS: f32 = 15.0;

/// Inset of candidate positions from their cell walls
pub const CELL_PADDING: f32 = 8.0;
/// Margin added around accepted obstacles' bounding boxes
pub const OVERLAP_MARGIN: f32 = 12.0;
/// Keep-out radius around the astronaut
pub const TARGET_SAFE_RADIUS: f32 = 90.0;
/// Keep-out radius around the rocket spawn
pub const SPAWN_SAFE_RADIUS: f32 = 100.0;
/// Extra gap between an obstacle and the scene edges
pub const EDGE_PADDING: f32 = 5.0;

pub const FALLBACK_RADIUS: f32 = 32.0;
/// Fallback spots as fractions of the scene size
pub const FALLBACK_SPOTS: [(f32, f32); 3] = [(0.25, 0.3), (0.75, 0.7), (0.75, 0.25)];

/// Mass of an obstacle body, scaled by area relative to the smallest radius
pub fn obstacle_mass(radius: f32) -> f32 {
    (radius / MIN_RADIUS).powi(2)
}

/// Largest radius a level may roll: `49 + min(15, 2 × level)`
pub fn max_radius(level: u32) -> f32 {
    BASE_MAX_RADIUS + (2.0 * level as f32).min(MAX_RADIUS_BONUS)
}

/// Everything the generator needs to know about the level
#[derive(Debug, Clone)]
pub struct LayoutRequest<'a> {
    pub level: u32,
    pub spawn: Vec2,
    pub target: Vec2,
    pub bounds_min: Vec2,
    pub bounds_max: Vec2,
    /// Kinds that may be placed (missing artwork removes a kind)
    pub kinds: &'a [ObstacleKind],
    /// Probability that a sticky obstacle moves
    pub sticky_moving_chance: f64,
    /// Speed range given to moving obstacles by their impulse
    pub impulse_speed: (f32, f32),
}

/// One placed obstacle, ready to become a body
#[derive(Debug, Clone, PartialEq)]
pub struct ObstaclePlan {
    pub kind: ObstacleKind,
    pub status: ObstacleStatus,
    pub pos: Vec2,
    pub radius: f32,
    /// Applied at physics activation for moving obstacles
    pub impulse: Option<Vec2>,
}

/// Weighted bag of kinds for a level, restricted to `available`
pub fn kind_bag(level: u32, available: &[ObstacleKind]) -> Vec<ObstacleKind> {
    let mut bag = Vec::new();
    for kind in ObstacleKind::ALL {
        if !available.contains(&kind) {
            continue;
        }
        for _ in 0..kind.weight(level) {
            bag.push(kind);
        }
    }
    bag
}

/// Grid cell rectangle (min, max)
fn cell_rect(req: &LayoutRequest, index: usize) -> (Vec2, Vec2) {
    let size = req.bounds_max - req.bounds_min;
    let cell = Vec2::new(size.x / GRID_COLUMNS as f32, size.y / GRID_ROWS as f32);
    let col = index % GRID_COLUMNS;
    let row = index / GRID_COLUMNS;
    let min = req.bounds_min + Vec2::new(col as f32 * cell.x, row as f32 * cell.y);
    (min, min + cell)
}

/// Whether a candidate circle is clear of edges, safe zones and accepted obstacles
fn fits(req: &LayoutRequest, placed: &[ObstaclePlan], pos: Vec2, radius: f32) -> bool {
    let pad = radius + EDGE_PADDING;
    if pos.x - pad < req.bounds_min.x
        || pos.x + pad > req.bounds_max.x
        || pos.y - pad < req.bounds_min.y
        || pos.y + pad > req.bounds_max.y
    {
        return false;
    }

    if pos.distance(req.target) < radius + TARGET_SAFE_RADIUS {
        return false;
    }
    if pos.distance(req.spawn) < radius + SPAWN_SAFE_RADIUS {
        return false;
    }

    placed.iter().all(|other| {
        let reach = Vec2::splat(other.radius + OVERLAP_MARGIN);
        !circle_intersects_rect(pos, radius, other.pos - reach, other.pos + reach)
    })
}

/// Roll movement for a freshly placed obstacle
fn roll_motion<R: Rng + ?Sized>(
    req: &LayoutRequest,
    kind: ObstacleKind,
    radius: f32,
    rng: &mut R,
) -> (ObstacleStatus, Option<Vec2>) {
    let moving = match kind {
        ObstacleKind::Normal | ObstacleKind::Bouncy => true,
        ObstacleKind::Sticky => rng.random_bool(req.sticky_moving_chance.clamp(0.0, 1.0)),
        ObstacleKind::GravityWell => false,
    };
    if !moving {
        return (ObstacleStatus::Static, None);
    }

    let (lo, hi) = req.impulse_speed;
    let speed = if hi > lo { rng.random_range(lo..=hi) } else { lo };
    let heading = direction(rng.random_range(0.0..std::f32::consts::TAU));
    (
        ObstacleStatus::Moving,
        Some(heading * speed * obstacle_mass(radius)),
    )
}

/// Try the fixed safe spots until `minimum` obstacles exist
///
/// Fallbacks are static Normal obstacles; spots that overlap are skipped.
pub fn place_fallbacks(req: &LayoutRequest, placed: &mut Vec<ObstaclePlan>, minimum: usize) {
    let size = req.bounds_max - req.bounds_min;
    for (fx, fy) in FALLBACK_SPOTS {
        if placed.len() >= minimum {
            break;
        }
        let pos = req.bounds_min + Vec2::new(fx * size.x, fy * size.y);
        if fits(req, placed, pos, FALLBACK_RADIUS) {
            placed.push(ObstaclePlan {
                kind: ObstacleKind::Normal,
                status: ObstacleStatus::Fallback,
                pos,
                radius: FALLBACK_RADIUS,
                impulse: None,
            });
        } else {
            log::debug!("Fallback spot {pos} rejected");
        }
    }
}

/// Place obstacles for a level
///
/// Returns at most `min(10, level + 1)` non-overlapping plans. Never fails;
/// starvation yields fewer obstacles (possibly none).
pub fn generate_layout<R: Rng + ?Sized>(req: &LayoutRequest, rng: &mut R) -> Vec<ObstaclePlan> {
    let target = obstacle_target(req.level);
    let mut placed: Vec<ObstaclePlan> = Vec::with_capacity(target);
    if target == 0 {
        return placed;
    }

    let bag = kind_bag(req.level, req.kinds);
    let max_r = max_radius(req.level);
    let mut occupied = [false; GRID_COLUMNS * GRID_ROWS];
    let mut rejected = 0u32;

    if bag.is_empty() {
        log::warn!("Level {}: no obstacle kinds available", req.level);
    } else {
        for _ in 0..ATTEMPTS_PER_OBSTACLE * target {
            if placed.len() >= target {
                break;
            }

            let free: Vec<usize> = (0..occupied.len()).filter(|&i| !occupied[i]).collect();
            if free.is_empty() {
                break;
            }
            let cell = free[rng.random_range(0..free.len())];
            let (cell_min, cell_max) = cell_rect(req, cell);

            let lo = cell_min + Vec2::splat(CELL_PADDING);
            let hi = (cell_max - Vec2::splat(CELL_PADDING)).max(lo);
            let pos = Vec2::new(
                lo.x + rng.random::<f32>() * (hi.x - lo.x),
                lo.y + rng.random::<f32>() * (hi.y - lo.y),
            );
            let radius = rng.random_range(MIN_RADIUS..=max_r);
            let kind = bag[rng.random_range(0..bag.len())];

            if !fits(req, &placed, pos, radius) {
                rejected += 1;
                continue;
            }

            let (status, impulse) = roll_motion(req, kind, radius, rng);
            occupied[cell] = true;
            placed.push(ObstaclePlan {
                kind,
                status,
                pos,
                radius,
                impulse,
            });
        }
    }

    let minimum = target.min(2);
    if placed.len() < minimum && req.kinds.contains(&ObstacleKind::Normal) {
        place_fallbacks(req, &mut placed, minimum);
    }

    log::debug!(
        "Level {}: placed {}/{} obstacles ({} rejected candidates)",
        req.level,
        placed.len(),
        target,
        rejected
    );
    placed
}
