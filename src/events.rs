use bevy_ecs::prelude::{Entity, Resource};
use glam::Vec2;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum SandboxEvent {
    PartSpawned { entity: Entity, part: String },
    PartDespawned { entity: Entity },
    ConnectionCreated { entity: Entity, first: Entity, second: Option<Entity> },
    ConnectionRemoved { entity: Entity },
    ImpulseApplied { entity: Entity, impulse: Vec2 },
    SceneCleared { removed: usize },
}

impl SandboxEvent {
    pub fn connection_created(entity: Entity, first: Entity, second: Option<Entity>) -> Self {
        SandboxEvent::ConnectionCreated { entity, first, second }
    }
}

impl fmt::Display for SandboxEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SandboxEvent::PartSpawned { entity, part } => {
                write!(f, "PartSpawned entity={} part={}", entity.index(), part)
            }
            SandboxEvent::PartDespawned { entity } => write!(f, "PartDespawned entity={}", entity.index()),
            SandboxEvent::ConnectionCreated { entity, first, second: Some(second) } => write!(
                f,
                "ConnectionCreated entity={} first={} second={}",
                entity.index(),
                first.index(),
                second.index()
            ),
            SandboxEvent::ConnectionCreated { entity, first, second: None } => {
                write!(f, "ConnectionCreated entity={} first={} anchor", entity.index(), first.index())
            }
            SandboxEvent::ConnectionRemoved { entity } => {
                write!(f, "ConnectionRemoved entity={}", entity.index())
            }
            SandboxEvent::ImpulseApplied { entity, impulse } => write!(
                f,
                "ImpulseApplied entity={} impulse=({:.2}, {:.2})",
                entity.index(),
                impulse.x,
                impulse.y
            ),
            SandboxEvent::SceneCleared { removed } => write!(f, "SceneCleared removed={removed}"),
        }
    }
}

#[derive(Default, Resource)]
pub struct EventBus {
    events: Vec<SandboxEvent>,
}

impl EventBus {
    pub fn push(&mut self, event: SandboxEvent) {
        self.events.push(event);
    }

    pub fn drain(&mut self) -> Vec<SandboxEvent> {
        self.events.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
