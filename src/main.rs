use anyhow::{Context, Result};
use clap::Parser;
use glam::Vec2;
use part_sandbox::cli::{Cli, Command};
use part_sandbox::config::AppConfig;
use part_sandbox::inspector::PropertyEdit;
use part_sandbox::scene::{BlobStore, FileBlobStore, SceneRecord, SCENE_BLOB_KEY};
use part_sandbox::schema::FORCE_KEY;
use part_sandbox::Sandbox;
use std::thread;
use std::time::{Duration, Instant};

const IMPORT_WAIT: Duration = Duration::from_secs(5);

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        log::error!("{err:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = AppConfig::load_or_default(&cli.config);
    let overrides = cli.config_overrides();
    if !overrides.is_empty() {
        log::info!("[cli] overriding {}", overrides.applied_fields().join(", "));
    }
    config.apply_overrides(&overrides);

    match cli.command {
        Command::Parts => list_parts(config),
        Command::Show => show_scene(&config),
        Command::Demo => build_demo(config),
        Command::Simulate { steps, dt, save } => simulate(config, steps, dt, save),
    }
}

fn list_parts(config: AppConfig) -> Result<()> {
    let sandbox = Sandbox::new(config);
    for control in sandbox.spawn_controls() {
        let kind = if control.is_connection { "connection" } else { "body" };
        println!("{:<16} {:<10} {}", control.id, kind, control.label);
    }
    let loader = sandbox.loader();
    for id in loader.available() {
        if sandbox.registry().contains(&id) {
            continue;
        }
        match loader.load_blocking(&id) {
            Ok(module) => println!("{id:<16} importable {}", module.label()),
            Err(err) => println!("{id:<16} broken     {err}"),
        }
    }
    Ok(())
}

fn show_scene(config: &AppConfig) -> Result<()> {
    let store = FileBlobStore::new(config.storage.scene_dir.clone());
    let Some(blob) = store.get(SCENE_BLOB_KEY)? else {
        println!("no saved scene under {}", store.root().display());
        return Ok(());
    };
    let records: Vec<SceneRecord> = serde_json::from_str(&blob).context("Parsing saved scene")?;
    for record in &records {
        println!(
            "{:<8} {:<14} pos=({:7.1}, {:7.1}) vel=({:6.1}, {:6.1}) mass={:6.2} angle={:5.2} static={}",
            record.provenance_tag,
            record.display_name,
            record.x,
            record.y,
            record.vx,
            record.vy,
            record.mass,
            record.angle,
            record.is_static
        );
    }
    println!("{} record(s)", records.len());
    Ok(())
}

fn build_demo(config: AppConfig) -> Result<()> {
    let mut sandbox = Sandbox::new(config);
    let crate_box = sandbox.spawn_part("Box", Vec2::new(500.0, 300.0)).context("Spawning box")?;
    let ball = sandbox.spawn_part("Ball", Vec2::new(700.0, 300.0)).context("Spawning ball")?;

    sandbox.activate_part("Rope");
    let mut now = Duration::ZERO;
    for target in [crate_box, ball] {
        let position = sandbox.world().position(target).context("Reading part position")?;
        sandbox.pointer_down(position, now);
        now += Duration::from_millis(100);
    }

    sandbox.select(Some(ball));
    sandbox.edit_selected(FORCE_KEY, PropertyEdit::Vector(Vec2::new(0.05, -0.1)))?;
    sandbox.toggle_run();
    let dt = 1.0 / 60.0;
    for _ in 0..30 {
        now += Duration::from_secs_f32(dt);
        sandbox.tick(now, dt);
    }
    sandbox.toggle_run();

    let saved = sandbox.save_scene().context("Saving demo scene")?;
    println!("demo scene saved with {saved} part(s) and {} connection(s)", sandbox.world().joint_count());
    Ok(())
}

/// Pumps the session until every queued part import has landed, or gives up after a few seconds.
fn settle_imports(sandbox: &mut Sandbox) {
    let deadline = Instant::now() + IMPORT_WAIT;
    while sandbox.imports_in_flight() > 0 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(10));
        sandbox.tick(Duration::ZERO, 0.0);
    }
    if sandbox.deferred_restores() > 0 {
        log::warn!("[simulate] {} saved part(s) are still waiting on imports", sandbox.deferred_restores());
    }
}

fn simulate(config: AppConfig, steps: u32, dt: f32, save: bool) -> Result<()> {
    let mut sandbox = Sandbox::new(config);
    let report = sandbox.load_scene().context("Loading scene")?;
    if report.deferred_count() > 0 {
        settle_imports(&mut sandbox);
    }
    log::info!("[simulate] restored {} part(s)", sandbox.world_mut().part_entities().len());
    sandbox.toggle_run();
    let mut now = Duration::ZERO;
    for _ in 0..steps {
        now += Duration::from_secs_f32(dt.max(0.0));
        sandbox.tick(now, dt);
    }
    let entities = sandbox.world_mut().part_entities();
    for entity in entities {
        if let Some(info) = sandbox.world().entity_info(entity) {
            println!(
                "{:<14} pos=({:7.1}, {:7.1}) vel=({:6.1}, {:6.1})",
                info.display_name.unwrap_or_default(),
                info.position.x,
                info.position.y,
                info.velocity.x,
                info.velocity.y
            );
        }
    }
    if save {
        sandbox.toggle_run();
        sandbox.save_scene().context("Saving simulated scene")?;
    }
    Ok(())
}
