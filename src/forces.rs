use crate::ecs::SandboxWorld;
use bevy_ecs::prelude::Entity;
use glam::Vec2;
use std::collections::HashMap;

/// Force vectors queued in edit mode, applied once when the simulation starts.
#[derive(Debug, Default)]
pub struct PendingForces {
    entries: HashMap<Entity, Vec2>,
}

impl PendingForces {
    /// A later vector for the same entity replaces the earlier one.
    pub fn set(&mut self, entity: Entity, force: Vec2) {
        self.entries.insert(entity, force);
    }

    pub fn get(&self, entity: Entity) -> Option<Vec2> {
        self.entries.get(&entity).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear_entity(&mut self, entity: Entity) -> Option<Vec2> {
        self.entries.remove(&entity)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Applies every entry as an impulse and empties the table. Returns how many landed.
    ///
    /// Pinned parts cannot take impulses, so their entries are dropped without counting.
    pub fn flush(&mut self, world: &mut SandboxWorld, impulse_scale: f32) -> usize {
        let mut entries: Vec<(Entity, Vec2)> = self.entries.drain().collect();
        entries.sort_by_key(|(entity, _)| entity.index());
        let mut applied = 0;
        for (entity, force) in entries {
            if world.is_static(entity) {
                log::debug!("[forces] skipping pending force for pinned entity {entity:?}");
                continue;
            }
            if world.apply_impulse(entity, force * impulse_scale) {
                applied += 1;
            } else {
                log::debug!("[forces] skipping pending force for missing entity {entity:?}");
            }
        }
        applied
    }
}
