use bevy_ecs::prelude::Entity;
use glam::Vec2;
use part_sandbox::config::AppConfig;
use part_sandbox::ecs::{ConnectionEnd, Highlight};
use part_sandbox::inspector::PropertyEdit;
use part_sandbox::interaction::{InteractionOutcome, InteractionState};
use part_sandbox::scene::MemoryBlobStore;
use part_sandbox::Sandbox;
use std::time::Duration;

fn sandbox() -> Sandbox {
    Sandbox::with_store(AppConfig::default(), Box::new(MemoryBlobStore::default()))
}

fn two_boxes(sandbox: &mut Sandbox) -> (Entity, Entity) {
    let a = sandbox.spawn_part("Box", Vec2::new(300.0, 300.0)).expect("spawn a");
    let b = sandbox.spawn_part("Box", Vec2::new(700.0, 300.0)).expect("spawn b");
    (a, b)
}

fn click(sandbox: &mut Sandbox, entity: Entity, now: Duration) -> InteractionOutcome {
    let point = sandbox.world().position(entity).expect("position");
    sandbox.pointer_down(point, now)
}

#[test]
fn two_picks_create_one_connection() {
    let mut sandbox = sandbox();
    let (a, b) = two_boxes(&mut sandbox);
    assert_eq!(sandbox.activate_part("Rope"), None);
    assert!(matches!(sandbox.interaction_state(), InteractionState::ConnectPending { first: None, .. }));

    assert_eq!(click(&mut sandbox, a, Duration::ZERO), InteractionOutcome::FirstPicked(a));
    assert_eq!(
        sandbox.world().render_hints(a).and_then(|hints| hints.highlight),
        Some(Highlight::ConnectSource)
    );

    // Picking the same part again keeps waiting for a second one.
    assert_eq!(click(&mut sandbox, a, Duration::from_millis(300)), InteractionOutcome::Ignored);
    assert!(matches!(sandbox.interaction_state(), InteractionState::ConnectPending { first: Some(_), .. }));

    let outcome = click(&mut sandbox, b, Duration::from_millis(600));
    let InteractionOutcome::Connected { connection, first, second } = outcome else {
        panic!("expected a connection, got {outcome:?}");
    };
    assert_eq!((first, second), (a, b));
    assert_eq!(sandbox.interaction_state(), &InteractionState::Idle);
    assert_eq!(sandbox.world().render_hints(a).and_then(|hints| hints.highlight), None);
    assert_eq!(sandbox.world().joint_count(), 1);

    let stored = sandbox.world().connection(connection).expect("connection entity");
    assert_eq!(stored.tool, "Rope");
    assert_eq!(stored.second, ConnectionEnd::Entity(b));

    // The deadline has been cancelled; ticking past it must not hang anything.
    sandbox.tick(Duration::from_secs(5), 0.0);
    assert_eq!(sandbox.world().joint_count(), 1);
}

#[test]
fn lone_pick_auto_hangs_after_delay() {
    let mut sandbox = sandbox();
    let (a, _) = two_boxes(&mut sandbox);
    let origin = sandbox.world().position(a).expect("position");
    sandbox.activate_part("Rope");
    click(&mut sandbox, a, Duration::ZERO);

    sandbox.tick(Duration::from_millis(1900), 0.0);
    assert_eq!(sandbox.world().joint_count(), 0);
    assert!(matches!(sandbox.interaction_state(), InteractionState::ConnectPending { .. }));

    sandbox.tick(Duration::from_millis(2000), 0.0);
    assert_eq!(sandbox.world().joint_count(), 1);
    assert_eq!(sandbox.interaction_state(), &InteractionState::Idle);

    let connections = sandbox.world_mut().connections();
    assert_eq!(connections.len(), 1);
    let (_, connection) = &connections[0];
    assert_eq!(connection.first, a);
    match connection.second {
        ConnectionEnd::Anchor(anchor) => {
            assert!((anchor - (origin - Vec2::new(0.0, 100.0))).length() < 1e-3, "anchor at {anchor:?}")
        }
        other => panic!("expected a world anchor, got {other:?}"),
    }
    assert!(sandbox.notices().iter().any(|notice| notice.message.contains("hung")));
}

#[test]
fn static_parts_and_walls_are_not_connectable() {
    let mut sandbox = sandbox();
    let (a, b) = two_boxes(&mut sandbox);
    sandbox.edit(b, "isStatic", PropertyEdit::Flag(true)).expect("pin b");
    sandbox.activate_part("Rope");

    assert_eq!(click(&mut sandbox, b, Duration::ZERO), InteractionOutcome::Ignored);
    assert!(matches!(sandbox.interaction_state(), InteractionState::ConnectPending { first: None, .. }));

    click(&mut sandbox, a, Duration::from_millis(100));
    assert_eq!(click(&mut sandbox, b, Duration::from_millis(200)), InteractionOutcome::Ignored);
    let wall = Vec2::new(640.0, -10.0);
    assert_eq!(sandbox.pointer_down(wall, Duration::from_millis(300)), InteractionOutcome::Ignored);
    assert_eq!(sandbox.world().joint_count(), 0);
}

#[test]
fn vanished_first_pick_returns_to_idle() {
    let mut sandbox = sandbox();
    let (a, _) = two_boxes(&mut sandbox);
    sandbox.activate_part("Rope");
    click(&mut sandbox, a, Duration::ZERO);

    assert!(sandbox.world_mut().despawn_part(a));
    sandbox.tick(Duration::from_millis(2500), 0.0);
    assert_eq!(sandbox.interaction_state(), &InteractionState::Idle);
    assert_eq!(sandbox.world().joint_count(), 0);
}

#[test]
fn removing_a_part_drops_its_connections() {
    let mut sandbox = sandbox();
    let (a, b) = two_boxes(&mut sandbox);
    sandbox.activate_part("Rope");
    click(&mut sandbox, a, Duration::ZERO);
    click(&mut sandbox, b, Duration::from_millis(100));
    assert_eq!(sandbox.world().joint_count(), 1);

    sandbox.select(Some(b));
    assert!(sandbox.remove_selected());
    assert_eq!(sandbox.world().joint_count(), 0);
    assert!(sandbox.world_mut().connections().is_empty());
    assert_eq!(sandbox.selected(), None);
}

#[test]
fn clicking_selects_topmost_part() {
    let mut sandbox = sandbox();
    let lower = sandbox.spawn_part("Box", Vec2::new(400.0, 400.0)).expect("spawn lower");
    let upper = sandbox.spawn_part("Ball", Vec2::new(420.0, 400.0)).expect("spawn upper");

    assert_eq!(sandbox.pointer_down(Vec2::new(410.0, 400.0), Duration::ZERO), InteractionOutcome::Selected(upper));
    assert_eq!(sandbox.selected(), Some(upper));
    assert_eq!(sandbox.pointer_down(Vec2::new(365.0, 400.0), Duration::ZERO), InteractionOutcome::Selected(lower));
    assert_eq!(sandbox.pointer_down(Vec2::new(900.0, 600.0), Duration::ZERO), InteractionOutcome::Deselected);
    assert_eq!(sandbox.selected(), None);
}
