mod builtin;
mod definition;
mod loader;

pub use builtin::{builtin_modules, register_builtins};
pub use definition::{BodyDefinition, ConnectionDefinition, PartModule};
pub use loader::{LoadedPart, ModuleResolutionError, PartId, PartLoader};

use crate::ecs::{ConnectionEnd, SandboxWorld};
use crate::schema::PropertySchema;
use anyhow::{anyhow, Result};
use bevy_ecs::prelude::Entity;
use glam::Vec2;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Builds a body part at a world position.
pub trait PartFactory: Send + Sync {
    fn label(&self) -> &str;

    /// The returned entity carries its property schema and default scale baselines.
    fn create(&self, world: &mut SandboxWorld, position: Vec2) -> Result<Entity>;
}

/// Joins a part to another part or to a fixed anchor point.
pub trait ConnectionFactory: Send + Sync {
    fn label(&self) -> &str;

    fn schema(&self) -> PropertySchema;

    fn connect(&self, world: &mut SandboxWorld, first: Entity, second: ConnectionEnd) -> Result<Entity>;
}

#[derive(Clone)]
pub enum PartKind {
    Body(Arc<dyn PartFactory>),
    Connection(Arc<dyn ConnectionFactory>),
}

impl PartKind {
    pub fn label(&self) -> &str {
        match self {
            PartKind::Body(factory) => factory.label(),
            PartKind::Connection(factory) => factory.label(),
        }
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, PartKind::Connection(_))
    }
}

impl fmt::Debug for PartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartKind::Body(factory) => write!(f, "Body({})", factory.label()),
            PartKind::Connection(factory) => write!(f, "Connection({})", factory.label()),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("part '{0}' is not registered")]
    NotFound(String),
    #[error("part '{0}' is a connection tool, not a body")]
    NotABody(String),
}

/// Part ids mapped to their factories.
#[derive(Clone, Default)]
pub struct PartRegistry {
    parts: BTreeMap<String, PartKind>,
}

impl PartRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        register_builtins(&mut registry);
        registry
    }

    /// Re-registering an id replaces the factory and hands back the previous one.
    pub fn register(&mut self, id: impl Into<String>, part: PartKind) -> Option<PartKind> {
        let id = id.into();
        let previous = self.parts.insert(id.clone(), part);
        if previous.is_some() {
            log::debug!("[parts] '{id}' re-registered");
        }
        previous
    }

    pub fn resolve(&self, id: &str) -> Result<&PartKind, RegistryError> {
        self.parts.get(id).ok_or_else(|| RegistryError::NotFound(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.parts.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.parts.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PartKind)> {
        self.parts.iter().map(|(id, part)| (id.as_str(), part))
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Runs the body factory for `id` and tags the result with its provenance.
    pub fn spawn(&self, id: &str, world: &mut SandboxWorld, position: Vec2) -> Result<Entity> {
        let factory = match self.resolve(id)? {
            PartKind::Body(factory) => Arc::clone(factory),
            PartKind::Connection(_) => return Err(RegistryError::NotABody(id.to_string()).into()),
        };
        let entity = factory.create(world, position)?;
        if !world.tag_provenance(entity, id) {
            return Err(anyhow!("factory for '{id}' returned an entity that is not in the world"));
        }
        Ok(entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_returns_previous_entry() {
        let mut registry = PartRegistry::with_builtins();
        let replacement = PartKind::Body(Arc::new(BodyDefinition::rectangle("Crate", 40.0, 40.0)));
        let previous = registry.register("Box", replacement).expect("Box was built in");
        assert!(!previous.is_connection());
        assert_eq!(registry.resolve("Box").map(PartKind::label), Ok("Crate"));
    }

    #[test]
    fn resolve_unknown_id_is_not_found() {
        let registry = PartRegistry::with_builtins();
        assert_eq!(registry.resolve("Plank").err(), Some(RegistryError::NotFound("Plank".to_string())));
    }

    #[test]
    fn spawn_tags_provenance_and_rejects_tools() {
        let registry = PartRegistry::with_builtins();
        let mut world = SandboxWorld::default();
        let entity = registry.spawn("Ball", &mut world, Vec2::new(200.0, 100.0)).expect("spawn ball");
        assert_eq!(world.provenance(entity), Some("Ball"));
        assert!(registry.spawn("Rope", &mut world, Vec2::ZERO).is_err());
    }
}
