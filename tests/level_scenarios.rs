//! End-to-end level scenarios driven through the public tick API

use astro_fling::assets::AssetManifest;
use astro_fling::consts::SIM_DT;
use astro_fling::persistence::MemoryStore;
use astro_fling::sim::state::obstacle_target;
use astro_fling::sim::{
    LevelAssets, LevelEvent, LevelPhase, LevelRequest, LevelScene, SpawnCorner, TickInput,
    load_level, tick,
};
use astro_fling::{PlayMode, Session, SessionEvent, Tuning};

fn no_sprite() -> LevelAssets {
    LevelAssets {
        astronaut_sprite: false,
        ..Default::default()
    }
}

fn scene_with(tuning: Tuning, level: u32, corner: SpawnCorner) -> LevelScene {
    let mut scene = LevelScene::new(tuning);
    load_level(
        &mut scene,
        LevelRequest {
            level,
            corner,
            seed: 2024,
            assets: no_sprite(),
        },
    );
    scene
}

fn idle() -> TickInput {
    TickInput::default()
}

fn pause(paused: bool) -> TickInput {
    TickInput {
        pause: Some(paused),
        ..Default::default()
    }
}

fn run_reveal(scene: &mut LevelScene) {
    for _ in 0..600 {
        if scene.phase == LevelPhase::Active {
            return;
        }
        tick(scene, &idle(), SIM_DT);
    }
    panic!("reveal never finished");
}

fn set_rocket_dynamic(scene: &mut LevelScene, dynamic: bool) {
    let id = scene.rocket.as_ref().unwrap().body;
    if dynamic {
        scene.world.set_dynamic(id, true).unwrap();
    } else {
        scene.world.freeze(id).unwrap();
    }
}

/// Put the live rocket on the astronaut and step once
fn touch_astronaut(scene: &mut LevelScene) -> Vec<LevelEvent> {
    set_rocket_dynamic(scene, true);
    let target = scene.astronaut_body().unwrap().pos;
    let id = scene.rocket.as_ref().unwrap().body;
    scene.world.set_position(id, target).unwrap();
    tick(scene, &idle(), SIM_DT)
}

fn successes(events: &[LevelEvent]) -> Vec<(u8, u32)> {
    events
        .iter()
        .filter_map(|e| match e {
            LevelEvent::LevelSuccess { stars, level } => Some((*stars, *level)),
            _ => None,
        })
        .collect()
}

fn count(events: &[LevelEvent], wanted: LevelEvent) -> usize {
    events.iter().filter(|e| **e == wanted).count()
}

#[test]
fn level_three_places_at_most_four_without_overlap() {
    assert_eq!(obstacle_target(3), 4);
    for corner in SpawnCorner::ALL {
        let scene = scene_with(Tuning::default(), 3, corner);
        assert!(scene.obstacles.len() <= 4);
        for (i, a) in scene.obstacles.iter().enumerate() {
            let pa = scene.world.body(a.body).unwrap().pos;
            for b in &scene.obstacles[i + 1..] {
                let pb = scene.world.body(b.body).unwrap().pos;
                assert!(pa.distance(pb) >= a.radius + b.radius);
            }
        }
    }
}

#[test]
fn success_at_eighty_percent_earns_five_stars() {
    let mut scene = scene_with(Tuning::default(), 2, SpawnCorner::BottomLeft);
    run_reveal(&mut scene);
    set_rocket_dynamic(&mut scene, false);
    for _ in 0..3 {
        tick(&mut scene, &idle(), 1.0);
    }
    assert_eq!(scene.timer.remaining, 12);

    let events = touch_astronaut(&mut scene);
    assert_eq!(successes(&events), vec![(5, 2)]);
}

#[test]
fn success_at_nineteen_percent_earns_one_star() {
    let tuning = Tuning {
        level_duration: 100.0,
        ..Default::default()
    };
    let mut scene = scene_with(tuning, 4, SpawnCorner::TopRight);
    run_reveal(&mut scene);
    set_rocket_dynamic(&mut scene, false);
    for _ in 0..81 {
        tick(&mut scene, &idle(), 1.0);
    }
    assert_eq!(scene.timer.remaining, 19);

    let events = touch_astronaut(&mut scene);
    assert_eq!(successes(&events), vec![(1, 4)]);
}

#[test]
fn zero_time_left_is_a_timeout_not_a_success() {
    let mut scene = scene_with(Tuning::default(), 1, SpawnCorner::TopLeft);
    run_reveal(&mut scene);
    set_rocket_dynamic(&mut scene, false);

    let mut events = Vec::new();
    for _ in 0..15 {
        events.extend(tick(&mut scene, &idle(), 1.0));
    }
    assert_eq!(scene.phase, LevelPhase::TimedOut);
    assert_eq!(count(&events, LevelEvent::LevelOrRunOver), 1);

    let late = touch_astronaut(&mut scene);
    assert!(successes(&late).is_empty());
    assert_eq!(scene.phase, LevelPhase::TimedOut);
}

#[test]
fn pause_freezes_the_countdown() {
    let mut scene = scene_with(Tuning::default(), 1, SpawnCorner::BottomRight);
    run_reveal(&mut scene);
    tick(&mut scene, &idle(), 1.0);
    tick(&mut scene, &idle(), 1.0);
    assert_eq!(scene.timer.remaining, 13);

    let mut events = tick(&mut scene, &pause(true), 1.0);
    for _ in 0..5 {
        events.extend(tick(&mut scene, &idle(), 1.0));
    }
    assert_eq!(scene.timer.remaining, 13);
    assert!(!events.iter().any(|e| matches!(e, LevelEvent::TimerTick(_))));

    // Resuming with a live rocket restarts the clock without catch-up
    let events = tick(&mut scene, &pause(false), 1.0);
    assert_eq!(events, vec![LevelEvent::TimerTick(12)]);
}

#[test]
fn resume_before_activation_keeps_timer_stopped() {
    let mut scene = scene_with(Tuning::default(), 1, SpawnCorner::BottomLeft);
    tick(&mut scene, &idle(), 0.2);
    tick(&mut scene, &pause(true), 0.2);
    tick(&mut scene, &pause(false), 0.1);
    assert!(!scene.rocket_is_dynamic());
    assert!(!scene.timer.running);

    run_reveal(&mut scene);
    assert!(scene.timer.running);
}

#[test]
fn activation_while_paused_waits_for_resume() {
    let mut scene = scene_with(Tuning::default(), 1, SpawnCorner::TopRight);
    tick(&mut scene, &pause(true), SIM_DT);
    tick(&mut scene, &idle(), 3.0);
    assert_eq!(scene.phase, LevelPhase::Active);
    assert!(scene.rocket_is_dynamic());
    assert!(!scene.timer.running);

    let spawn = SpawnCorner::TopRight.position();
    assert_eq!(scene.rocket_body().unwrap().pos, spawn);

    tick(&mut scene, &pause(false), SIM_DT);
    assert!(scene.timer.running);
}

#[test]
fn end_run_mid_reveal_aborts_once() {
    let mut scene = scene_with(Tuning::default(), 5, SpawnCorner::BottomLeft);
    tick(&mut scene, &idle(), 1.0);
    assert!(matches!(scene.phase, LevelPhase::Reveal { .. }));

    let end = TickInput {
        end_run: true,
        ..Default::default()
    };
    let mut events = tick(&mut scene, &end, SIM_DT);
    events.extend(tick(&mut scene, &end, SIM_DT));
    for _ in 0..300 {
        events.extend(tick(&mut scene, &idle(), SIM_DT));
    }

    assert_eq!(scene.phase, LevelPhase::Aborted);
    assert_eq!(count(&events, LevelEvent::LevelOrRunOver), 1);
    assert!(!scene.physics_active);
    assert!(!scene.timer.running);
    assert!(scene.obstacles.iter().all(|o| o.alpha == 0.0));
}

#[test]
fn nothing_happens_after_success() {
    let mut scene = scene_with(Tuning::default(), 1, SpawnCorner::BottomLeft);
    run_reveal(&mut scene);
    let first = touch_astronaut(&mut scene);
    assert_eq!(successes(&first).len(), 1);
    let remaining = scene.timer.remaining;

    let mut later = touch_astronaut(&mut scene);
    later.extend(tick(
        &mut scene,
        &TickInput {
            end_run: true,
            fling: Some(glam::Vec2::new(50.0, 50.0)),
            ..Default::default()
        },
        SIM_DT,
    ));
    for _ in 0..30 {
        later.extend(tick(&mut scene, &idle(), 1.0));
    }
    assert!(later.is_empty(), "{later:?}");
    assert_eq!(scene.timer.remaining, remaining);
    assert!(matches!(scene.phase, LevelPhase::Succeeded { .. }));
}

#[test]
fn spawn_corners_cycle_across_loads() {
    let mut session = Session::new(
        Tuning::default(),
        9,
        Box::new(MemoryStore::new()),
        Box::new(AssetManifest::complete()),
    );
    let mut corners = Vec::new();
    for _ in 0..5 {
        for event in session.start_run(PlayMode::TimedAttempts) {
            if let SessionEvent::LevelStarted { corner, .. } = event {
                corners.push(corner);
            }
        }
        session.end_run();
        session.update(SIM_DT);
    }
    assert_eq!(
        corners,
        vec![
            SpawnCorner::BottomLeft,
            SpawnCorner::BottomRight,
            SpawnCorner::TopRight,
            SpawnCorner::TopLeft,
            SpawnCorner::BottomLeft,
        ]
    );
}
