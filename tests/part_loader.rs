use glam::Vec2;
use part_sandbox::config::AppConfig;
use part_sandbox::notice::NoticeKind;
use part_sandbox::parts::{ModuleResolutionError, PartLoader, PartModule};
use part_sandbox::scene::MemoryBlobStore;
use part_sandbox::Sandbox;
use std::fs;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

const PLANK: &str = r#"{
    "kind": "body",
    "label": "Plank",
    "name_prefix": "Plank",
    "shape": { "rectangle": { "width": 240, "height": 20 } }
}"#;

fn sandbox_in(dir: &Path) -> Sandbox {
    let mut config = AppConfig::default();
    config.storage.parts_dir = dir.to_path_buf();
    Sandbox::with_store(config, Box::new(MemoryBlobStore::default()))
}

fn wait_for_imports(sandbox: &mut Sandbox) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while sandbox.imports_in_flight() > 0 {
        assert!(Instant::now() < deadline, "import did not finish in time");
        thread::sleep(Duration::from_millis(10));
        sandbox.tick(Duration::ZERO, 0.0);
    }
}

#[test]
fn invalid_identifiers_never_reach_the_worker() {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut sandbox = sandbox_in(dir.path());
    let parts_before = sandbox.registry().len();

    for bad in ["../secrets", "", "with space"] {
        assert!(!sandbox.import_part(bad), "{bad:?} should be refused");
    }
    assert_eq!(sandbox.imports_in_flight(), 0);
    assert_eq!(sandbox.registry().len(), parts_before);
    assert_eq!(sandbox.notices().latest().map(|notice| notice.kind), Some(NoticeKind::Warning));
}

#[test]
fn imported_part_registers_and_spawns() {
    let dir = tempfile::tempdir().expect("temp dir");
    fs::write(dir.path().join("Plank.json"), PLANK).expect("write module");
    let mut sandbox = sandbox_in(dir.path());
    assert!(!sandbox.registry().contains("Plank"));

    assert!(sandbox.import_part("Plank"));
    wait_for_imports(&mut sandbox);
    assert!(sandbox.registry().contains("Plank"));
    assert_eq!(sandbox.notices().latest().map(|notice| notice.kind), Some(NoticeKind::Success));
    assert!(sandbox.spawn_controls().iter().any(|control| control.id == "Plank" && !control.is_connection));

    let entity = sandbox.activate_part("Plank").expect("spawn plank");
    assert_eq!(sandbox.world().provenance(entity), Some("Plank"));
    assert!(sandbox.world().display_name(entity).is_some_and(|name| name.starts_with("Plank ")));
    let spawned_at = sandbox.world().position(entity).expect("position");
    assert!((spawned_at - Vec2::new(640.0, 100.0)).length() < 1e-3, "dropped at {spawned_at:?}");
}

#[test]
fn reimport_replaces_the_registration() {
    let dir = tempfile::tempdir().expect("temp dir");
    fs::write(dir.path().join("Plank.json"), PLANK).expect("write module");
    let mut sandbox = sandbox_in(dir.path());
    sandbox.import_part("Plank");
    wait_for_imports(&mut sandbox);

    fs::write(dir.path().join("Plank.json"), PLANK.replace("\"label\": \"Plank\"", "\"label\": \"Long plank\""))
        .expect("rewrite module");
    sandbox.import_part("Plank");
    wait_for_imports(&mut sandbox);

    let label = sandbox.registry().resolve("Plank").map(|part| part.label().to_string()).expect("registered");
    assert_eq!(label, "Long plank");
    assert!(sandbox.notices().latest().is_some_and(|notice| notice.message.starts_with("Reloaded")));
}

#[test]
fn malformed_module_leaves_registry_unchanged() {
    let dir = tempfile::tempdir().expect("temp dir");
    fs::write(dir.path().join("Broken.json"), "{ \"kind\": \"body\", ").expect("write module");
    let mut sandbox = sandbox_in(dir.path());
    let parts_before = sandbox.registry().len();

    assert!(sandbox.import_part("Broken"));
    wait_for_imports(&mut sandbox);
    assert_eq!(sandbox.registry().len(), parts_before);
    let latest = sandbox.notices().latest().expect("notice");
    assert_eq!(latest.kind, NoticeKind::Error);
    assert!(latest.message.contains("malformed"), "{}", latest.message);
}

#[test]
fn blocking_load_distinguishes_missing_from_malformed() {
    let dir = tempfile::tempdir().expect("temp dir");
    fs::write(dir.path().join("Broken.json"), "[1, 2").expect("write module");
    fs::write(dir.path().join("Plank.json"), PLANK).expect("write module");
    let loader = PartLoader::new(dir.path());

    assert!(matches!(loader.load_blocking("Nowhere"), Err(ModuleResolutionError::Missing { .. })));
    assert!(matches!(loader.load_blocking("Broken"), Err(ModuleResolutionError::Malformed { .. })));
    assert!(matches!(loader.load_blocking("Plank"), Ok(PartModule::Body(_))));
    assert_eq!(loader.available(), vec!["Broken".to_string(), "Plank".to_string()]);
}

#[test]
fn shipped_part_modules_parse() {
    let loader = PartLoader::new(Path::new(env!("CARGO_MANIFEST_DIR")).join("assets/parts"));
    for id in ["Plank", "Spring", "Bumper"] {
        let module = loader.load_blocking(id).unwrap_or_else(|err| panic!("{id}: {err}"));
        assert!(!module.label().is_empty(), "{id} has a label");
    }
    assert!(matches!(loader.load_blocking("Spring"), Ok(PartModule::Connection(_))));
}
