//! Level lifecycle tick
//!
//! Drives a level through teardown, build, the staged reveal, live play and
//! its conclusion. Every timed stage is an elapsed-time accumulator advanced
//! by [`tick`]; outcomes come back as [`LevelEvent`]s instead of callbacks.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::body::{Body, RadialField, category, field};
use super::contact::resolve_contact;
use super::gravity::RotatingGravity;
use super::layout::{LayoutRequest, generate_layout, obstacle_mass};
use super::state::{
    Astronaut, Background, LevelPhase, LevelRequest, LevelScene, LevelTimer, Obstacle,
    ObstacleKind, ObstacleStatus, QueuedImpulse, RevealStep, Rocket, Sprite, Transient,
    background_index,
};
use crate::audio::SoundEffect;
use crate::consts::*;
use crate::scene_center;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Directional impulse for the rocket
    pub fling: Option<Vec2>,
    /// Requested pause state (`None` = unchanged)
    pub pause: Option<bool>,
    /// External "end run" signal
    pub end_run: bool,
}

/// Feedback the host may render or play
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cue {
    Particles { pos: Vec2 },
    Haptic,
    Sound(SoundEffect),
}

/// Outbound events produced by one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LevelEvent {
    /// A whole second elapsed; carries the seconds remaining
    TimerTick(u32),
    /// The astronaut was rescued
    LevelSuccess { stars: u8, level: u32 },
    /// Timed out or aborted
    LevelOrRunOver,
    Cue(Cue),
}

/// Request a level; old content fades out first if any is on screen
pub fn load_level(scene: &mut LevelScene, request: LevelRequest) {
    // A new level instance starts here
    scene.game_over = false;
    scene.timer.stop();
    scene.gravity.stop();
    scene.physics_active = false;

    // Already fading out: the newest request wins once the fade completes
    if matches!(scene.phase, LevelPhase::TearingDown { .. }) {
        log::info!("Level {} requested during teardown", request.level);
        scene.pending_load = Some(request);
        return;
    }

    if !scene.has_transient_content() {
        build_level(scene, request);
        return;
    }

    let mut bodies = Vec::new();
    let ids = scene
        .rocket
        .take()
        .map(|r| r.body)
        .into_iter()
        .chain(scene.astronaut.take().map(|a| a.body))
        .chain(scene.obstacles.drain(..).map(|o| o.body));
    for id in ids {
        if let Some(body) = scene.world.body(id) {
            bodies.push(body);
        }
    }
    scene.world.clear();
    scene.pending_impulses.clear();

    log::info!("Tearing down level {} ({} bodies)", scene.level, bodies.len());
    scene.transient = Some(Transient {
        bodies,
        background: scene.background.take(),
        alpha: 1.0,
    });
    scene.pending_load = Some(request);
    scene.phase = LevelPhase::TearingDown { elapsed: 0.0 };
}

/// Build fresh content for a level and start its reveal
fn build_level(scene: &mut LevelScene, request: LevelRequest) {
    scene.phase = LevelPhase::Building;
    scene.transient = None;
    scene.pending_load = None;
    scene.level = request.level;
    scene.rng = Pcg32::seed_from_u64(request.seed);

    scene.world.clear();
    scene.world.gravity = Vec2::ZERO;
    scene.obstacles.clear();
    scene.pending_impulses.clear();
    scene.game_over = false;
    scene.physics_active = false;
    scene.timer = LevelTimer::new(scene.tuning.level_duration);
    scene.gravity = RotatingGravity::new(
        scene.tuning.gravity_magnitude,
        scene.tuning.gravity_rotation_rate,
    );

    if scene.background.is_none() {
        scene.background = request.assets.background.clone().map(|asset| Background {
            index: background_index(request.level),
            asset,
            rotation: 0.0,
            alpha: 0.0,
        });
    }

    // Astronaut contact region + sprite
    let center = scene_center();
    let astronaut_id = scene.world.next_body_id();
    scene.world.insert(
        Body::circle(astronaut_id, center, ASTRONAUT_RADIUS).with_category(
            category::ASTRONAUT,
            category::NONE,
            category::ROCKET | category::STICKY_OBSTACLE,
        ),
    );
    scene.astronaut = Some(Astronaut {
        body: astronaut_id,
        sprite: request.assets.astronaut_sprite.then_some(Sprite {
            pos: center,
            scale: 1.0,
            alpha: 0.0,
        }),
        alpha: 0.0,
        attachment: None,
    });

    // Rocket, kinematic until activation
    let spawn = request.corner.position();
    let rocket_id = scene.world.next_body_id();
    scene.world.insert(
        Body::circle(rocket_id, spawn, ROCKET_RADIUS)
            .with_category(
                category::ROCKET,
                category::OBSTACLE,
                category::ASTRONAUT | category::NORMAL_OBSTACLE,
            )
            .with_fields(field::GLOBAL_GRAVITY | field::GRAVITY_WELL)
            .with_mass(ROCKET_MASS)
            .with_restitution(0.6)
            .with_damping(scene.tuning.rocket_damping)
            .with_max_speed(scene.tuning.rocket_max_speed),
    );
    scene.rocket = Some(Rocket {
        body: rocket_id,
        corner: request.corner,
        alpha: 0.0,
        pending_fling: None,
    });

    let layout = LayoutRequest {
        level: request.level,
        spawn,
        target: center,
        bounds_min: scene.world.bounds_min,
        bounds_max: scene.world.bounds_max,
        kinds: &request.assets.obstacle_kinds,
        sticky_moving_chance: scene.tuning.sticky_moving_chance,
        impulse_speed: (scene.tuning.obstacle_speed_min, scene.tuning.obstacle_speed_max),
    };
    let plans = generate_layout(&layout, &mut scene.rng);

    for plan in plans {
        let id = scene.world.next_body_id();
        scene.world.insert(
            Body::circle(id, plan.pos, plan.radius)
                .with_category(
                    plan.kind.category_bits(),
                    plan.kind.collision_bits(),
                    plan.kind.contact_bits(),
                )
                .with_mass(obstacle_mass(plan.radius))
                .with_restitution(plan.kind.restitution())
                .with_max_speed(scene.tuning.obstacle_max_speed),
        );
        if plan.kind == ObstacleKind::GravityWell {
            scene.world.add_field(RadialField {
                anchor: id,
                strength: scene.tuning.gravity_well_strength,
                radius: plan.radius * scene.tuning.gravity_well_reach,
                mask: field::GRAVITY_WELL,
            });
        }
        if let Some(impulse) = plan.impulse {
            scene.pending_impulses.push(QueuedImpulse {
                obstacle: id,
                impulse,
            });
        }
        scene.obstacles.push(Obstacle {
            body: id,
            kind: plan.kind,
            status: plan.status,
            radius: plan.radius,
            alpha: 0.0,
        });
    }

    log::info!(
        "Level {} built: corner {:?}, {} obstacles",
        request.level,
        request.corner,
        scene.obstacles.len()
    );
    scene.phase = LevelPhase::Reveal {
        step: RevealStep::AstronautFadeIn,
        elapsed: 0.0,
    };
}

/// Advance the level by `dt` seconds of real time
pub fn tick(scene: &mut LevelScene, input: &TickInput, dt: f32) -> Vec<LevelEvent> {
    let mut events = Vec::new();

    if input.end_run {
        abort(scene, &mut events);
    }
    if let Some(paused) = input.pause {
        set_paused(scene, paused);
    }
    if let Some(impulse) = input.fling {
        queue_fling(scene, impulse, &mut events);
    }

    // A countdown started mid-tick begins counting on the next tick
    let counting = scene.timer.running;

    match scene.phase {
        LevelPhase::TearingDown { .. } => advance_teardown(scene, dt),
        LevelPhase::Reveal { .. } => advance_reveal(scene, dt),
        _ => {}
    }

    if scene.physics_active && !scene.paused {
        step_physics(scene, dt, &mut events);
    }

    if matches!(scene.phase, LevelPhase::Collecting { .. }) && !scene.paused {
        advance_collect(scene, dt, &mut events);
    }

    if counting {
        advance_timer(scene, dt, &mut events);
    }
    events
}

fn abort(scene: &mut LevelScene, events: &mut Vec<LevelEvent>) {
    if scene.game_over || matches!(scene.phase, LevelPhase::Idle) {
        return;
    }
    scene.game_over = true;
    scene.timer.stop();
    scene.pending_load = None;
    scene.transient = None;
    scene.phase = LevelPhase::Aborted;
    log::info!("Level {} aborted", scene.level);
    events.push(LevelEvent::LevelOrRunOver);
}

fn set_paused(scene: &mut LevelScene, paused: bool) {
    if scene.paused == paused {
        return;
    }
    scene.paused = paused;
    if paused {
        scene.timer.stop();
        log::info!("Paused");
    } else {
        // No catch-up: the countdown restarts only for a live level
        if scene.rocket_is_dynamic() && !scene.game_over {
            scene.timer.start();
        }
        log::info!("Resumed");
    }
}

fn queue_fling(scene: &mut LevelScene, impulse: Vec2, events: &mut Vec<LevelEvent>) {
    if scene.paused || scene.game_over || !scene.rocket_is_dynamic() {
        log::debug!("Fling ignored");
        return;
    }
    let Some(rocket) = scene.rocket.as_mut() else {
        return;
    };
    rocket.pending_fling = Some(impulse.clamp_length_max(MAX_FLING_IMPULSE));
    events.push(LevelEvent::Cue(Cue::Sound(SoundEffect::Fling)));
}

fn advance_teardown(scene: &mut LevelScene, dt: f32) {
    let LevelPhase::TearingDown { elapsed } = scene.phase else {
        return;
    };
    let elapsed = elapsed + dt;
    if elapsed < TEARDOWN_FADE_DURATION {
        if let Some(transient) = scene.transient.as_mut() {
            transient.alpha = 1.0 - elapsed / TEARDOWN_FADE_DURATION;
        }
        scene.phase = LevelPhase::TearingDown { elapsed };
        return;
    }

    scene.transient = None;
    match scene.pending_load.take() {
        Some(request) => build_level(scene, request),
        None => scene.phase = LevelPhase::Idle,
    }
}

fn advance_reveal(scene: &mut LevelScene, dt: f32) {
    let LevelPhase::Reveal { mut step, elapsed } = scene.phase else {
        return;
    };
    let mut elapsed = elapsed + dt;

    loop {
        apply_fade(scene, step, elapsed);
        let duration = step.duration();
        if elapsed < duration {
            break;
        }
        // Overflow carries into the next step
        elapsed -= duration;
        complete_step(scene, step);
        match step.next() {
            Some(next) => step = next,
            None => {
                scene.phase = LevelPhase::Active;
                log::info!("Level {} active", scene.level);
                return;
            }
        }
    }
    scene.phase = LevelPhase::Reveal { step, elapsed };
}

fn apply_fade(scene: &mut LevelScene, step: RevealStep, elapsed: f32) {
    let alpha = (elapsed / FADE_IN_DURATION).clamp(0.0, 1.0);
    match step {
        RevealStep::AstronautFadeIn => {
            if let Some(astronaut) = scene.astronaut.as_mut() {
                astronaut.alpha = alpha;
                if let Some(sprite) = astronaut.sprite.as_mut() {
                    sprite.alpha = alpha;
                }
            }
            if let Some(background) = scene.background.as_mut() {
                background.alpha = background.alpha.max(alpha);
            }
        }
        RevealStep::RocketFadeIn => {
            if let Some(rocket) = scene.rocket.as_mut() {
                rocket.alpha = alpha;
            }
        }
        RevealStep::ObstaclesFadeIn => {
            for obstacle in &mut scene.obstacles {
                obstacle.alpha = alpha;
            }
        }
        RevealStep::PhysicsActivation | RevealStep::CountdownStart => {}
    }
}

fn complete_step(scene: &mut LevelScene, step: RevealStep) {
    match step {
        RevealStep::AstronautFadeIn | RevealStep::RocketFadeIn | RevealStep::ObstaclesFadeIn => {
            apply_fade(scene, step, FADE_IN_DURATION);
        }
        RevealStep::PhysicsActivation => activate_physics(scene),
        RevealStep::CountdownStart => {
            if !scene.paused && !scene.game_over {
                scene.timer.start();
                log::info!("Level {} countdown started", scene.level);
            }
        }
    }
}

fn activate_physics(scene: &mut LevelScene) {
    let Some(rocket) = scene.rocket.as_ref() else {
        return;
    };
    scene.physics_active = true;
    scene.gravity.start(rocket.corner);
    scene.world.gravity = scene.gravity.vector();

    let rocket_live = scene
        .world
        .set_dynamic(rocket.body, true)
        .and_then(|()| scene.world.set_gravity_enabled(rocket.body, true));
    if let Err(e) = rocket_live {
        log::warn!("Rocket activation failed: {e}");
    }

    for obstacle in &scene.obstacles {
        let moving = obstacle.status == ObstacleStatus::Moving;
        if let Err(e) = scene.world.set_dynamic(obstacle.body, moving) {
            log::warn!("Obstacle activation failed: {e}");
        }
    }
    for queued in std::mem::take(&mut scene.pending_impulses) {
        if let Err(e) = scene.world.apply_impulse(queued.obstacle, queued.impulse) {
            log::warn!("Obstacle impulse dropped: {e}");
        }
    }

    log::info!(
        "Level {} physics active, gravity at {:.0}°",
        scene.level,
        scene.gravity.angle.to_degrees()
    );
}

fn step_physics(scene: &mut LevelScene, dt: f32, events: &mut Vec<LevelEvent>) {
    if !scene.game_over {
        scene.gravity.advance(dt);
    }
    scene.world.gravity = scene.gravity.vector();
    if let Some(background) = scene.background.as_mut() {
        background.rotation = scene.gravity.angle;
    }

    if let Some(rocket) = scene.rocket.as_mut() {
        if let Some(impulse) = rocket.pending_fling.take() {
            if let Err(e) = scene.world.apply_impulse(rocket.body, impulse) {
                log::warn!("Fling dropped: {e}");
            }
        }
    }

    let contacts = scene.world.step(dt * scene.tuning.sim_speed.max(0.0));
    for contact in contacts {
        resolve_contact(scene, contact, events);
    }

    // Sprite rides the joint while attached
    if let Some(astronaut) = scene.astronaut.as_mut() {
        let joint_pos = astronaut
            .attachment
            .and_then(|a| scene.world.joint_position(a.joint));
        if let (Some(pos), Some(sprite)) = (joint_pos, astronaut.sprite.as_mut()) {
            sprite.pos = pos;
        }
    }
}

fn advance_collect(scene: &mut LevelScene, dt: f32, events: &mut Vec<LevelEvent>) {
    let LevelPhase::Collecting {
        elapsed,
        stars,
        from,
    } = scene.phase
    else {
        return;
    };
    let elapsed = elapsed + dt;
    let t = (elapsed / COLLECT_DURATION).min(1.0);
    let target = scene.rocket_body().map_or(from, |b| b.pos);

    if let Some(sprite) = scene.astronaut.as_mut().and_then(|a| a.sprite.as_mut()) {
        sprite.pos = from.lerp(target, t);
        sprite.scale = 1.0 - 0.8 * t;
        sprite.alpha = 1.0 - t;
    }

    if t < 1.0 {
        scene.phase = LevelPhase::Collecting {
            elapsed,
            stars,
            from,
        };
        return;
    }

    scene.phase = LevelPhase::Succeeded { stars };
    log::info!("Level {} complete: {} stars", scene.level, stars);
    events.push(LevelEvent::LevelSuccess {
        stars,
        level: scene.level,
    });
}

fn advance_timer(scene: &mut LevelScene, dt: f32, events: &mut Vec<LevelEvent>) {
    if scene.paused || scene.game_over {
        return;
    }
    for remaining in scene.timer.advance(dt) {
        events.push(LevelEvent::TimerTick(remaining));
        if remaining == 0 {
            scene.game_over = true;
            scene.timer.stop();
            scene.phase = LevelPhase::TimedOut;
            log::info!("Level {} timed out", scene.level);
            events.push(LevelEvent::Cue(Cue::Sound(SoundEffect::Failure)));
            events.push(LevelEvent::LevelOrRunOver);
            break;
        }
    }
}
