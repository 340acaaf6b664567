use glam::Vec2;
use part_sandbox::config::AppConfig;
use part_sandbox::ecs::BodyShape;
use part_sandbox::inspector::{ControlValue, PropertyEdit};
use part_sandbox::scene::MemoryBlobStore;
use part_sandbox::Sandbox;

fn sandbox() -> Sandbox {
    Sandbox::with_store(AppConfig::default(), Box::new(MemoryBlobStore::default()))
}

fn rect_size(sandbox: &Sandbox, entity: bevy_ecs::prelude::Entity) -> (f32, f32) {
    match sandbox.world().shape(entity) {
        Some(BodyShape::Rectangle { width, height }) => (width, height),
        other => panic!("expected a rectangle, got {other:?}"),
    }
}

#[test]
fn sequential_width_edits_land_on_last_value() {
    let mut sandbox = sandbox();
    let entity = sandbox.spawn_part("Box", Vec2::new(400.0, 100.0)).expect("spawn box");
    sandbox.select(Some(entity));

    sandbox.edit_selected("width", PropertyEdit::Number(160.0)).expect("width -> 160");
    let (width, _) = rect_size(&sandbox, entity);
    assert!((width - 160.0).abs() < 1e-3, "width after first edit {width}");

    sandbox.edit_selected("width", PropertyEdit::Number(120.0)).expect("width -> 120");
    let (width, height) = rect_size(&sandbox, entity);
    assert!((width - 120.0).abs() < 1e-3, "width after second edit {width}");
    assert!((height - 80.0).abs() < 1e-3, "height untouched {height}");

    let baselines = sandbox.world().baselines(entity).expect("baselines");
    assert_eq!(baselines.width, Some(120.0));
    let panel = sandbox.inspector().expect("panel");
    assert_eq!(panel.row("width").map(|row| row.value.clone()), Some(ControlValue::Number(120.0)));
}

#[test]
fn sequential_edits_match_a_single_direct_edit() {
    let mut sandbox = sandbox();
    let stepped = sandbox.spawn_part("Box", Vec2::new(300.0, 300.0)).expect("spawn stepped");
    let direct = sandbox.spawn_part("Box", Vec2::new(700.0, 300.0)).expect("spawn direct");

    for value in [200.0, 35.0, 410.0, 90.0, 260.0] {
        sandbox.edit(stepped, "height", PropertyEdit::Number(value)).expect("stepped edit");
    }
    sandbox.edit(direct, "height", PropertyEdit::Number(260.0)).expect("direct edit");

    let (_, stepped_height) = rect_size(&sandbox, stepped);
    let (_, direct_height) = rect_size(&sandbox, direct);
    assert!((stepped_height - direct_height).abs() < 1e-2, "{stepped_height} vs {direct_height}");
    let stepped_mass = sandbox.world().mass(stepped).expect("mass");
    let direct_mass = sandbox.world().mass(direct).expect("mass");
    assert!((stepped_mass - direct_mass).abs() < 1e-3);
}

#[test]
fn radius_edit_scales_circle_and_resets_mass_to_density() {
    let mut sandbox = sandbox();
    let ball = sandbox.spawn_part("Ball", Vec2::new(640.0, 200.0)).expect("spawn ball");
    sandbox.edit(ball, "mass", PropertyEdit::Number(20.0)).expect("mass edit");
    sandbox.edit(ball, "radius", PropertyEdit::Number(80.0)).expect("radius edit");

    match sandbox.world().shape(ball) {
        Some(BodyShape::Circle { radius }) => assert!((radius - 80.0).abs() < 1e-3),
        other => panic!("expected a circle, got {other:?}"),
    }
    let expected = 0.001 * std::f32::consts::PI * 80.0 * 80.0;
    let mass = sandbox.world().mass(ball).expect("mass");
    assert!((mass - expected).abs() < 1e-2, "mass {mass} expected {expected}");
}

#[test]
fn non_positive_target_is_rejected_without_change() {
    let mut sandbox = sandbox();
    let entity = sandbox.spawn_part("Box", Vec2::new(400.0, 300.0)).expect("spawn box");
    assert!(sandbox.edit(entity, "width", PropertyEdit::Number(-5.0)).is_err());
    assert!(sandbox.edit(entity, "width", PropertyEdit::Number(0.0)).is_err());
    let (width, _) = rect_size(&sandbox, entity);
    assert!((width - 80.0).abs() < 1e-3);
    assert_eq!(sandbox.world().baselines(entity).and_then(|b| b.width), Some(80.0));
}
