use super::{ConnectionFactory, PartFactory, PartKind};
use crate::ecs::{BodyShape, BodySpawn, ConnectionEnd, PartMaterial, SandboxWorld, SpringParams};
use crate::schema::{
    PropertyDescriptor, PropertySchema, ScaleAxis, DAMPING_KEY, FORCE_KEY, FRICTION_KEY, LENGTH_KEY, MASS_KEY,
    NAME_KEY, RESTITUTION_KEY, STATIC_KEY, STIFFNESS_KEY,
};
use anyhow::{anyhow, Result};
use bevy_ecs::prelude::Entity;
use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Contents of a part module file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PartModule {
    Body(BodyDefinition),
    Connection(ConnectionDefinition),
}

impl PartModule {
    pub fn label(&self) -> &str {
        match self {
            PartModule::Body(definition) => &definition.label,
            PartModule::Connection(definition) => &definition.label,
        }
    }

    pub fn into_kind(self) -> PartKind {
        match self {
            PartModule::Body(definition) => PartKind::Body(Arc::new(definition)),
            PartModule::Connection(definition) => PartKind::Connection(Arc::new(definition)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyDefinition {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_prefix: Option<String>,
    pub shape: BodyShape,
    #[serde(default)]
    pub material: PartMaterial,
    /// Editable properties; derived from the shape when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<PropertySchema>,
}

impl BodyDefinition {
    pub fn rectangle(label: impl Into<String>, width: f32, height: f32) -> Self {
        Self {
            label: label.into(),
            name_prefix: None,
            shape: BodyShape::Rectangle { width, height },
            material: PartMaterial::default(),
            properties: None,
        }
    }

    pub fn circle(label: impl Into<String>, radius: f32) -> Self {
        Self {
            label: label.into(),
            name_prefix: None,
            shape: BodyShape::Circle { radius },
            material: PartMaterial::default(),
            properties: None,
        }
    }

    pub fn with_material(mut self, friction: f32, restitution: f32) -> Self {
        self.material.friction = friction;
        self.material.restitution = restitution;
        self
    }

    pub fn schema(&self) -> PropertySchema {
        match &self.properties {
            Some(schema) => schema.clone().sanitized(),
            None => default_body_schema(&self.shape),
        }
    }

    fn display_name(&self) -> String {
        let prefix = self.name_prefix.as_deref().unwrap_or(&self.label);
        let suffix: u32 = rand::thread_rng().gen_range(0..100);
        format!("{prefix} {suffix}")
    }
}

fn default_body_schema(shape: &BodyShape) -> PropertySchema {
    let schema = PropertySchema::new().with(NAME_KEY, "Name", PropertyDescriptor::Text);
    let schema = match shape {
        BodyShape::Rectangle { .. } => schema
            .with("width", "Width (px)", PropertyDescriptor::scale_range(20.0, 500.0, 10.0, ScaleAxis::Width))
            .with("height", "Height (px)", PropertyDescriptor::scale_range(20.0, 500.0, 10.0, ScaleAxis::Height)),
        BodyShape::Circle { .. } => schema.with(
            "radius",
            "Radius (px)",
            PropertyDescriptor::scale_range(10.0, 300.0, 5.0, ScaleAxis::Radius),
        ),
    };
    schema
        .with(FRICTION_KEY, "Friction", PropertyDescriptor::range(0.0, 1.0, 0.05))
        .with(RESTITUTION_KEY, "Bounciness", PropertyDescriptor::range(0.0, 1.2, 0.1))
        .with(MASS_KEY, "Mass", PropertyDescriptor::range(0.1, 100.0, 0.1))
        .with(STATIC_KEY, "Pinned", PropertyDescriptor::Toggle)
        .with(FORCE_KEY, "Apply force", PropertyDescriptor::Action)
}

impl PartFactory for BodyDefinition {
    fn label(&self) -> &str {
        &self.label
    }

    fn create(&self, world: &mut SandboxWorld, position: Vec2) -> Result<Entity> {
        let valid = match self.shape {
            BodyShape::Rectangle { width, height } => width > 0.0 && height > 0.0,
            BodyShape::Circle { radius } => radius > 0.0,
        };
        if !valid || self.material.density <= 0.0 {
            return Err(anyhow!("part '{}' has a degenerate shape or density", self.label));
        }
        Ok(world.spawn_body_part(BodySpawn {
            position,
            shape: self.shape,
            material: self.material,
            display_name: self.display_name(),
            schema: self.schema(),
        }))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionDefinition {
    pub label: String,
    #[serde(default = "ConnectionDefinition::default_stiffness")]
    pub stiffness: f32,
    #[serde(default = "ConnectionDefinition::default_length")]
    pub length: f32,
    #[serde(default = "ConnectionDefinition::default_damping")]
    pub damping: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<PropertySchema>,
}

impl ConnectionDefinition {
    pub const fn default_stiffness() -> f32 {
        0.5
    }

    pub const fn default_length() -> f32 {
        150.0
    }

    pub const fn default_damping() -> f32 {
        0.1
    }

    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            stiffness: Self::default_stiffness(),
            length: Self::default_length(),
            damping: Self::default_damping(),
            properties: None,
        }
    }

    pub fn params(&self) -> SpringParams {
        SpringParams { stiffness: self.stiffness, length: self.length, damping: self.damping }
    }
}

impl ConnectionFactory for ConnectionDefinition {
    fn label(&self) -> &str {
        &self.label
    }

    fn schema(&self) -> PropertySchema {
        match &self.properties {
            Some(schema) => schema.clone().sanitized(),
            None => PropertySchema::new()
                .with(STIFFNESS_KEY, "Stiffness (0-1)", PropertyDescriptor::range(0.01, 1.0, 0.01))
                .with(LENGTH_KEY, "Length", PropertyDescriptor::range(10.0, 500.0, 10.0))
                .with(DAMPING_KEY, "Damping", PropertyDescriptor::range(0.0, 1.0, 0.05)),
        }
    }

    fn connect(&self, world: &mut SandboxWorld, first: Entity, second: ConnectionEnd) -> Result<Entity> {
        world
            .spawn_connection(&self.label, first, second, self.params(), self.schema())
            .ok_or_else(|| anyhow!("{} cannot join {first:?} to {second:?}", self.label))
    }
}
