use crate::schema::ScaleAxis;
use bevy_ecs::prelude::*;
use glam::Vec2;
use rapier2d::prelude::{ColliderHandle, ImpulseJointHandle, RigidBodyHandle};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Component, Clone, Copy)]
pub struct RapierBody {
    pub handle: RigidBodyHandle,
}

#[derive(Component, Clone, Copy)]
pub struct RapierCollider {
    pub handle: ColliderHandle,
}

/// Monotonic spawn position; entity indices are recycled so they cannot order parts.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct SpawnOrder(pub u64);

#[derive(Resource, Default)]
pub struct SpawnSequence {
    next: u64,
}

impl SpawnSequence {
    pub fn issue(&mut self) -> SpawnOrder {
        let order = SpawnOrder(self.next);
        self.next += 1;
        order
    }
}

/// Id of the factory that created the entity. Only tagged entities are persisted.
#[derive(Component, Clone, Debug, PartialEq, Eq)]
pub struct Provenance(pub String);

impl Provenance {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Component, Clone, Debug, Default, PartialEq, Eq)]
pub struct DisplayName(pub String);

/// Last-known absolute measurements for scale-flagged attributes.
#[derive(Component, Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScaleBaselines {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f32>,
}

impl ScaleBaselines {
    pub fn get(&self, axis: ScaleAxis) -> Option<f32> {
        match axis {
            ScaleAxis::Width => self.width,
            ScaleAxis::Height => self.height,
            ScaleAxis::Radius => self.radius,
        }
    }

    pub fn get_or_nominal(&self, axis: ScaleAxis) -> f32 {
        self.get(axis).filter(|value| *value > 0.0).unwrap_or_else(|| axis.nominal_baseline())
    }

    pub fn set(&mut self, axis: ScaleAxis, value: f32) {
        let slot = match axis {
            ScaleAxis::Width => &mut self.width,
            ScaleAxis::Height => &mut self.height,
            ScaleAxis::Radius => &mut self.radius,
        };
        *slot = Some(value);
    }

    pub fn present(&self) -> impl Iterator<Item = (ScaleAxis, f32)> + '_ {
        ScaleAxis::ALL.into_iter().filter_map(|axis| self.get(axis).map(|value| (axis, value)))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyShape {
    Rectangle { width: f32, height: f32 },
    Circle { radius: f32 },
}

impl BodyShape {
    /// Rectangles resize along width and height, circles along their radius.
    pub fn has_axis(&self, axis: ScaleAxis) -> bool {
        matches!(
            (self, axis),
            (BodyShape::Rectangle { .. }, ScaleAxis::Width | ScaleAxis::Height)
                | (BodyShape::Circle { .. }, ScaleAxis::Radius)
        )
    }

    /// Default baselines a freshly created body carries for its shape.
    pub fn default_baselines(&self) -> ScaleBaselines {
        match *self {
            BodyShape::Rectangle { width, height } => {
                ScaleBaselines { width: Some(width), height: Some(height), radius: None }
            }
            BodyShape::Circle { radius } => ScaleBaselines { width: None, height: None, radius: Some(radius) },
        }
    }
}

#[derive(Component, Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartMaterial {
    pub density: f32,
    pub friction: f32,
    pub restitution: f32,
}

impl Default for PartMaterial {
    fn default() -> Self {
        Self { density: 0.001, friction: 0.1, restitution: 0.5 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Highlight {
    ConnectSource,
}

/// Presentation hints read by whatever draws the world.
#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct RenderHints {
    pub opacity: f32,
    pub highlight: Option<Highlight>,
}

impl Default for RenderHints {
    fn default() -> Self {
        Self { opacity: 1.0, highlight: None }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum AttributeValue {
    Number(f32),
    Text(String),
    Flag(bool),
}

/// Attributes a schema declares that have no engine-side meaning.
#[derive(Component, Clone, Debug, Default)]
pub struct AttributeBag(pub BTreeMap<String, AttributeValue>);

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ConnectionEnd {
    Entity(Entity),
    Anchor(Vec2),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpringParams {
    pub stiffness: f32,
    pub length: f32,
    pub damping: f32,
}

/// A constraint between a part and another part or a fixed anchor.
#[derive(Component, Clone, Debug)]
pub struct Connection {
    pub tool: String,
    pub first: Entity,
    pub second: ConnectionEnd,
    pub params: SpringParams,
    pub joint: ImpulseJointHandle,
    pub anchor_body: Option<RigidBodyHandle>,
}

impl Connection {
    pub fn involves(&self, entity: Entity) -> bool {
        self.first == entity || self.second == ConnectionEnd::Entity(entity)
    }
}

#[derive(Clone, Debug)]
pub struct EntityInfo {
    pub provenance: Option<String>,
    pub display_name: Option<String>,
    pub position: Vec2,
    pub velocity: Vec2,
    pub angle: f32,
    pub mass: f32,
    pub is_static: bool,
    pub baselines: ScaleBaselines,
}
