use crate::config::AppConfig;
use crate::ecs::{PhysicsParams, SandboxWorld, WorldBounds};
use crate::forces::PendingForces;
use crate::interaction::{Interaction, InteractionOutcome, InteractionSettings, InteractionState};
use crate::notice::{Notice, NoticeLog};
use crate::parts::{PartLoader, PartRegistry};
use crate::scene::{BlobStore, FileBlobStore, SceneRecord};
use bevy_ecs::prelude::Entity;
use glam::Vec2;
use std::collections::BTreeMap;
use std::time::Duration;

mod inspector_tooling;
mod part_tooling;
mod scene_tooling;

pub use part_tooling::SpawnControl;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    #[default]
    Edit,
    Run,
}

impl RunMode {
    pub fn label(self) -> &'static str {
        match self {
            RunMode::Edit => "edit",
            RunMode::Run => "run",
        }
    }
}

/// One editing session: the world plus everything that acts on it.
pub struct Sandbox {
    config: AppConfig,
    world: SandboxWorld,
    registry: PartRegistry,
    loader: PartLoader,
    interaction: Interaction,
    forces: PendingForces,
    notices: NoticeLog,
    store: Box<dyn BlobStore>,
    /// Saved records waiting on an import of their part, keyed by part id.
    deferred_restores: BTreeMap<String, Vec<SceneRecord>>,
    mode: RunMode,
    #[cfg_attr(not(feature = "editor"), allow(dead_code))]
    force_draft: Vec2,
}

impl Sandbox {
    pub fn new(config: AppConfig) -> Self {
        let store = Box::new(FileBlobStore::new(config.storage.scene_dir.clone()));
        Self::with_store(config, store)
    }

    pub fn with_store(config: AppConfig, store: Box<dyn BlobStore>) -> Self {
        let bounds = WorldBounds {
            min: Vec2::ZERO,
            max: Vec2::new(config.viewport.width as f32, config.viewport.height as f32),
            thickness: config.viewport.wall_thickness,
        };
        let world = SandboxWorld::new(bounds, PhysicsParams { gravity: Vec2::ZERO });
        let settings = InteractionSettings {
            auto_hang_delay: Duration::from_millis(config.editor.auto_hang_delay_ms),
            auto_hang_height: config.editor.auto_hang_height,
        };
        let loader = PartLoader::new(config.storage.parts_dir.clone());
        Self {
            world,
            registry: PartRegistry::with_builtins(),
            loader,
            interaction: Interaction::new(settings),
            forces: PendingForces::default(),
            notices: NoticeLog::default(),
            store,
            deferred_restores: BTreeMap::new(),
            mode: RunMode::Edit,
            force_draft: Vec2::ZERO,
            config,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn world(&self) -> &SandboxWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut SandboxWorld {
        &mut self.world
    }

    pub fn registry(&self) -> &PartRegistry {
        &self.registry
    }

    pub fn loader(&self) -> &PartLoader {
        &self.loader
    }

    pub fn interaction_state(&self) -> &InteractionState {
        self.interaction.state()
    }

    pub fn selected(&self) -> Option<Entity> {
        self.interaction.selected()
    }

    pub fn pending_forces(&self) -> &PendingForces {
        &self.forces
    }

    pub fn notices(&self) -> &NoticeLog {
        &self.notices
    }

    pub fn mode(&self) -> RunMode {
        self.mode
    }

    pub(crate) fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    pub fn select(&mut self, entity: Option<Entity>) {
        self.interaction.select(&mut self.world, entity);
    }

    pub fn pointer_down(&mut self, point: Vec2, now: Duration) -> InteractionOutcome {
        match self.interaction.pointer_down(&mut self.world, &self.registry, point, now) {
            Ok(outcome) => {
                self.announce(&outcome);
                outcome
            }
            Err(err) => {
                self.notify(Notice::error(format!("Connection failed: {err:#}")));
                InteractionOutcome::Cancelled
            }
        }
    }

    fn announce(&mut self, outcome: &InteractionOutcome) {
        match outcome {
            InteractionOutcome::Connected { first, second, .. } => {
                self.notify(Notice::success(format!("Connected {} and {}", first.index(), second.index())));
            }
            InteractionOutcome::AutoHung { entity, .. } => {
                self.notify(Notice::info(format!("No second part picked; hung {} in place", entity.index())));
            }
            _ => {}
        }
    }

    /// Flips between editing and running. Entering run mode fires the queued forces once.
    pub fn toggle_run(&mut self) -> RunMode {
        self.mode = match self.mode {
            RunMode::Edit => {
                self.world.set_gravity(Vec2::new(0.0, self.config.physics.run_gravity));
                let applied = self.forces.flush(&mut self.world, self.config.physics.impulse_scale);
                if applied > 0 {
                    self.notify(Notice::info(format!("Applied {applied} queued force(s)")));
                }
                RunMode::Run
            }
            RunMode::Run => {
                self.world.set_gravity(Vec2::ZERO);
                RunMode::Edit
            }
        };
        log::info!("[sandbox] mode -> {}", self.mode.label());
        self.mode
    }

    /// Event-loop pump: finished imports, the auto-hang deadline, then one physics step.
    pub fn tick(&mut self, now: Duration, dt: f32) {
        self.drain_imports();
        match self.interaction.tick(&mut self.world, &self.registry, now) {
            Ok(Some(outcome)) => self.announce(&outcome),
            Ok(None) => {}
            Err(err) => self.notify(Notice::error(format!("Auto-hang failed: {err:#}"))),
        }
        if dt > 0.0 {
            self.world.step(dt);
        }
        for event in self.world.drain_events() {
            log::debug!("[sandbox] {event}");
        }
    }
}
