use super::Sandbox;
use crate::notice::Notice;
use crate::parts::PartKind;
use bevy_ecs::prelude::Entity;
use glam::Vec2;

/// A button in the part palette.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnControl {
    pub id: String,
    pub label: String,
    pub is_connection: bool,
}

impl Sandbox {
    pub fn spawn_controls(&self) -> Vec<SpawnControl> {
        self.registry
            .iter()
            .map(|(id, part)| SpawnControl {
                id: id.to_string(),
                label: part.label().to_string(),
                is_connection: part.is_connection(),
            })
            .collect()
    }

    /// Spawns a body part at the drop point, or arms a connection tool.
    pub fn activate_part(&mut self, id: &str) -> Option<Entity> {
        let part = match self.registry.resolve(id) {
            Ok(part) => part.clone(),
            Err(err) => {
                self.notify(Notice::warning(err.to_string()));
                return None;
            }
        };
        match part {
            PartKind::Connection(tool) => {
                self.interaction.activate_tool(&mut self.world, id);
                self.notify(Notice::info(format!("{}: pick two parts to connect", tool.label())));
                None
            }
            PartKind::Body(_) => {
                self.interaction.cancel(&mut self.world);
                self.spawn_part(id, self.drop_point())
            }
        }
    }

    pub fn spawn_part(&mut self, id: &str, position: Vec2) -> Option<Entity> {
        match self.registry.spawn(id, &mut self.world, position) {
            Ok(entity) => Some(entity),
            Err(err) => {
                self.notify(Notice::error(format!("Could not spawn '{id}': {err:#}")));
                None
            }
        }
    }

    pub(super) fn drop_point(&self) -> Vec2 {
        Vec2::new(self.config.viewport.width as f32 * 0.5, self.config.editor.spawn_height)
    }

    /// Starts a background load of `<parts_dir>/<id>.json`. Returns whether a load was queued.
    pub fn import_part(&mut self, id: &str) -> bool {
        match self.loader.request(id.trim()) {
            Ok(part_id) => {
                self.notify(Notice::info(format!("Importing '{part_id}'...")));
                true
            }
            Err(err) => {
                self.notify(Notice::warning(err.to_string()));
                false
            }
        }
    }

    pub fn imports_in_flight(&self) -> usize {
        self.loader.in_flight()
    }

    pub(super) fn drain_imports(&mut self) {
        for loaded in self.loader.drain() {
            match loaded.result {
                Ok(module) => {
                    let label = module.label().to_string();
                    let replaced = self.registry.register(loaded.id.clone(), module.into_kind()).is_some();
                    let verb = if replaced { "Reloaded" } else { "Imported" };
                    self.notify(Notice::success(format!("{verb} '{}' ({label})", loaded.id)));
                    self.finish_deferred_restores(&loaded.id);
                }
                Err(err) => {
                    let chain = anyhow::Error::from(err);
                    self.notify(Notice::error(format!("Import of '{}' failed: {chain:#}", loaded.id)));
                    self.drop_deferred_restores(&loaded.id);
                }
            }
        }
    }
}
