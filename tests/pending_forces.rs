use glam::Vec2;
use part_sandbox::config::AppConfig;
use part_sandbox::forces::PendingForces;
use part_sandbox::inspector::PropertyEdit;
use part_sandbox::scene::MemoryBlobStore;
use part_sandbox::schema::FORCE_KEY;
use part_sandbox::{RunMode, Sandbox};
use std::time::Duration;

fn sandbox() -> Sandbox {
    Sandbox::with_store(AppConfig::default(), Box::new(MemoryBlobStore::default()))
}

#[test]
fn entering_run_mode_applies_queued_force_once() {
    let mut sandbox = sandbox();
    let ball = sandbox.spawn_part("Ball", Vec2::new(640.0, 360.0)).expect("spawn ball");
    sandbox.select(Some(ball));
    sandbox.edit_selected(FORCE_KEY, PropertyEdit::Vector(Vec2::new(0.05, -0.1))).expect("queue force");
    assert_eq!(sandbox.pending_forces().get(ball), Some(Vec2::new(0.05, -0.1)));

    assert_eq!(sandbox.toggle_run(), RunMode::Run);
    let velocity = sandbox.world().velocity(ball).expect("velocity");
    assert!(velocity.x > 0.0, "pushed right, got {velocity:?}");
    assert!(velocity.y < 0.0, "pushed up, got {velocity:?}");
    assert!(sandbox.pending_forces().is_empty());
    assert!((sandbox.world().gravity().y - 980.0).abs() < 1e-3);

    sandbox.toggle_run();
    sandbox.world_mut().set_velocity(ball, Vec2::ZERO);
    assert_eq!(sandbox.toggle_run(), RunMode::Run);
    assert_eq!(sandbox.world().velocity(ball), Some(Vec2::ZERO));
}

#[test]
fn later_force_replaces_earlier_one() {
    let mut sandbox = sandbox();
    let ball = sandbox.spawn_part("Ball", Vec2::new(640.0, 360.0)).expect("spawn ball");
    sandbox.edit(ball, FORCE_KEY, PropertyEdit::Vector(Vec2::new(1.0, 0.0))).expect("first");
    sandbox.edit(ball, FORCE_KEY, PropertyEdit::Vector(Vec2::new(-0.2, 0.0))).expect("second");
    assert_eq!(sandbox.pending_forces().len(), 1);

    sandbox.toggle_run();
    let velocity = sandbox.world().velocity(ball).expect("velocity");
    assert!(velocity.x < 0.0, "only the later vector fires, got {velocity:?}");
}

#[test]
fn stale_entries_are_skipped() {
    let mut sandbox = sandbox();
    let gone = sandbox.spawn_part("Box", Vec2::new(300.0, 300.0)).expect("spawn box");
    let kept = sandbox.spawn_part("Ball", Vec2::new(700.0, 300.0)).expect("spawn ball");

    let mut forces = PendingForces::default();
    forces.set(gone, Vec2::new(0.1, 0.0));
    forces.set(kept, Vec2::new(0.1, 0.0));
    assert!(sandbox.world_mut().despawn_part(gone));

    assert_eq!(forces.flush(sandbox.world_mut(), 1000.0), 1);
    assert!(forces.is_empty());
    assert_eq!(forces.flush(sandbox.world_mut(), 1000.0), 0);
}

#[test]
fn forces_are_dropped_with_their_part() {
    let mut sandbox = sandbox();
    let ball = sandbox.spawn_part("Ball", Vec2::new(640.0, 360.0)).expect("spawn ball");
    sandbox.select(Some(ball));
    sandbox.edit_selected(FORCE_KEY, PropertyEdit::Vector(Vec2::new(0.3, 0.0))).expect("queue force");
    assert!(sandbox.remove_selected());
    assert!(sandbox.pending_forces().is_empty());
}

#[test]
fn run_mode_steps_parts_under_gravity() {
    let mut sandbox = sandbox();
    let ball = sandbox.spawn_part("Ball", Vec2::new(640.0, 200.0)).expect("spawn ball");
    let start = sandbox.world().position(ball).expect("position");

    sandbox.toggle_run();
    let dt = 1.0 / 60.0;
    let mut now = Duration::ZERO;
    for _ in 0..20 {
        now += Duration::from_secs_f32(dt);
        sandbox.tick(now, dt);
    }
    let end = sandbox.world().position(ball).expect("position");
    assert!(end.y > start.y, "ball should fall toward +y, {start:?} -> {end:?}");
}

#[test]
fn pinned_parts_do_not_count_as_pushed() {
    let mut sandbox = sandbox();
    let pinned = sandbox.spawn_part("Box", Vec2::new(300.0, 300.0)).expect("spawn box");
    let loose = sandbox.spawn_part("Ball", Vec2::new(700.0, 300.0)).expect("spawn ball");
    sandbox.edit(pinned, "isStatic", PropertyEdit::Flag(true)).expect("pin");

    let mut forces = PendingForces::default();
    forces.set(pinned, Vec2::new(0.1, 0.0));
    forces.set(loose, Vec2::new(0.1, 0.0));
    assert_eq!(forces.flush(sandbox.world_mut(), 1000.0), 1);
    assert!(forces.is_empty());
    assert_eq!(sandbox.world().velocity(pinned), Some(Vec2::ZERO));

    sandbox.edit(pinned, FORCE_KEY, PropertyEdit::Vector(Vec2::new(0.5, 0.0))).expect("queue force");
    sandbox.toggle_run();
    assert!(sandbox.pending_forces().is_empty());
    assert!(!sandbox.notices().iter().any(|notice| notice.message.starts_with("Applied")));
}
