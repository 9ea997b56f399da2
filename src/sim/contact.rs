//! Contact resolver
//!
//! Turns begin-contact pairs from the physics world into level outcomes:
//! - rocket meets astronaut: rescue (checked first, short-circuits)
//! - rocket meets a normal obstacle: bounce cue
//! - astronaut meets a sticky obstacle: attach with a fixed joint

use glam::Vec2;

use super::body::BodyId;
use super::lifecycle::{Cue, LevelEvent};
use super::state::{Attachment, LevelPhase, LevelScene, ObstacleKind, stars_for_fraction};
use super::world::Contact;
use crate::audio::SoundEffect;
use crate::consts::ATTACHED_ASTRONAUT_MASS;

/// Interpret one contact; a no-op once the level is over
pub fn resolve_contact(scene: &mut LevelScene, contact: Contact, events: &mut Vec<LevelEvent>) {
    let (Some(rocket), Some(astronaut)) = (
        scene.rocket.as_ref().map(|r| r.body),
        scene.astronaut.as_ref().map(|a| a.body),
    ) else {
        return;
    };

    if contact.other(rocket) == Some(astronaut) {
        if scene.rocket_is_dynamic() && !scene.game_over {
            rescue(scene, events);
        }
        return;
    }

    if scene.game_over {
        return;
    }

    if let Some(other) = contact.other(rocket) {
        if scene.obstacle(other).is_some_and(|o| o.kind == ObstacleKind::Normal) {
            events.push(LevelEvent::Cue(Cue::Sound(SoundEffect::Bounce)));
        }
        return;
    }

    if let Some(other) = contact.other(astronaut) {
        if scene.obstacle(other).is_some_and(|o| o.kind == ObstacleKind::Sticky) {
            attach(scene, astronaut, other, contact.point);
        }
    }
}

fn rescue(scene: &mut LevelScene, events: &mut Vec<LevelEvent>) {
    scene.game_over = true;
    scene.timer.stop();

    let mut rocket_pos = Vec2::ZERO;
    if let Some(rocket) = scene.rocket.as_mut() {
        rocket.pending_fling = None;
        if let Err(e) = scene.world.freeze(rocket.body) {
            log::warn!("Rocket not frozen: {e}");
        }
        if let Some(body) = scene.world.body(rocket.body) {
            rocket_pos = body.pos;
        }
    }

    let mut sprite_pos = None;
    if let Some(astronaut) = scene.astronaut.as_mut() {
        if let Some(attachment) = astronaut.attachment.take() {
            scene.world.remove_joint(attachment.joint);
        }
        if let Err(e) = scene.world.freeze(astronaut.body) {
            log::warn!("Astronaut not frozen: {e}");
        }
        sprite_pos = astronaut.sprite.map(|s| s.pos);
    }

    let stars = stars_for_fraction(scene.timer.remaining_fraction());
    log::info!(
        "Astronaut rescued on level {} with {}/{}s left",
        scene.level,
        scene.timer.remaining,
        scene.timer.total
    );

    events.push(LevelEvent::Cue(Cue::Particles { pos: rocket_pos }));
    events.push(LevelEvent::Cue(Cue::Haptic));
    events.push(LevelEvent::Cue(Cue::Sound(SoundEffect::Success)));

    match sprite_pos {
        Some(from) => {
            scene.phase = LevelPhase::Collecting {
                elapsed: 0.0,
                stars,
                from,
            };
        }
        None => {
            scene.phase = LevelPhase::Succeeded { stars };
            events.push(LevelEvent::LevelSuccess {
                stars,
                level: scene.level,
            });
        }
    }
}

fn attach(scene: &mut LevelScene, astronaut_id: BodyId, obstacle_id: BodyId, point: Vec2) {
    if scene.astronaut.as_ref().is_none_or(|a| a.attachment.is_some()) {
        return;
    }
    let either_dynamic = [astronaut_id, obstacle_id]
        .iter()
        .any(|&id| scene.world.body(id).is_some_and(|b| b.dynamic));
    if !either_dynamic {
        return;
    }

    let Some(saved) = scene.world.body(astronaut_id) else {
        return;
    };
    let configured = scene
        .world
        .set_dynamic(astronaut_id, true)
        .and_then(|()| scene.world.set_gravity_enabled(astronaut_id, false))
        .and_then(|()| scene.world.set_mass(astronaut_id, ATTACHED_ASTRONAUT_MASS));
    if let Err(e) = configured {
        log::warn!("Attachment aborted: {e}");
        return;
    }

    match scene.world.create_fixed_joint(obstacle_id, astronaut_id, point) {
        Ok(joint) => {
            if let Some(astronaut) = scene.astronaut.as_mut() {
                astronaut.attachment = Some(Attachment {
                    joint,
                    obstacle: obstacle_id,
                });
            }
            log::info!("Astronaut stuck to obstacle {:?}", obstacle_id);
        }
        Err(e) => {
            let restored = scene
                .world
                .set_dynamic(astronaut_id, saved.dynamic)
                .and_then(|()| scene.world.set_gravity_enabled(astronaut_id, saved.affected_by_gravity))
                .and_then(|()| scene.world.set_mass(astronaut_id, saved.mass));
            if let Err(restore) = restored {
                log::warn!("Astronaut state not restored: {restore}");
            }
            log::warn!("Attachment aborted: {e}");
        }
    }
}
